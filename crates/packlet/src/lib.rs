//! Packlet bundles a graph of ES modules into a single self-contained script.
//!
//! The pipeline: load configuration, build the dependency graph breadth-first
//! from the entry module, downlevel each module's import/export syntax to
//! CommonJS-style code, and serialize everything into one artifact carrying a
//! minimal module loader.

pub mod code_generator;
pub mod config;
pub mod graph;
pub mod orchestrator;
pub mod parser;
pub mod resolver;
pub mod transform;
