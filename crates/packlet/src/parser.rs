//! Parsing collaborator over the oxc toolchain.
//!
//! The bundler core treats the parser as a black box: source text goes in,
//! a syntax tree comes out, and any diagnostic aborts the whole build.

use std::{
    fmt,
    path::{Path, PathBuf},
};

use oxc_allocator::Allocator;
use oxc_ast::ast::Program;
use oxc_parser::Parser;
use oxc_span::SourceType;

/// Syntax error produced while parsing one source file.
///
/// Carries every diagnostic the parser reported so the operator sees the
/// full picture, not just the first failure.
#[derive(Debug)]
pub struct ParseError {
    path: PathBuf,
    messages: Vec<String>,
}

impl ParseError {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "syntax error in {}", self.path.display())?;
        for message in &self.messages {
            write!(f, "\n  {message}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ParseError {}

/// Parse `source` as an ES module.
///
/// The returned tree borrows from both the allocator and the source text,
/// so callers keep all three alive together for the duration of one asset's
/// processing.
pub fn parse<'a>(
    allocator: &'a Allocator,
    source: &'a str,
    path: &Path,
) -> Result<Program<'a>, ParseError> {
    let source_type = SourceType::default().with_module(true);
    let ret = Parser::new(allocator, source, source_type).parse();

    if ret.errors.is_empty() {
        Ok(ret.program)
    } else {
        Err(ParseError {
            path: path.to_path_buf(),
            messages: ret.errors.iter().map(ToString::to_string).collect(),
        })
    }
}
