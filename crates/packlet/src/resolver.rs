//! Import specifier resolution.
//!
//! Only relative specifiers are in scope: a specifier resolves against the
//! importing file's directory, lexically. There is no symlink
//! canonicalization and no extension inference — the specifier names the
//! file, and the same file reached through the same normalized path gets
//! the same canonical key.

use std::path::{Component, Path, PathBuf};

use anyhow::{Result, bail};

/// Resolve `specifier` against the directory of the importing file.
pub fn resolve(specifier: &str, importer_dir: &Path) -> Result<PathBuf> {
    if !is_relative(specifier) {
        bail!(
            "cannot resolve import {specifier:?}: only relative specifiers (\"./\", \"../\") are supported"
        );
    }
    Ok(normalize(&importer_dir.join(specifier)))
}

pub fn is_relative(specifier: &str) -> bool {
    specifier.starts_with("./") || specifier.starts_with("../")
}

/// Absolutize a configured path against the invocation directory.
pub fn absolutize(path: &Path, base: &Path) -> PathBuf {
    if path.is_absolute() {
        normalize(path)
    } else {
        normalize(&base.join(path))
    }
}

/// Lexical path normalization: drops `.` components and folds `..` into the
/// preceding normal component. `..` at the root stays at the root.
pub fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match normalized.components().next_back() {
                Some(Component::Normal(_)) => {
                    normalized.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => normalized.push(Component::ParentDir),
            },
            part => normalized.push(part),
        }
    }
    normalized
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn resolves_sibling_imports() {
        let resolved = resolve("./b.js", Path::new("/project/src")).unwrap();
        assert_eq!(resolved, PathBuf::from("/project/src/b.js"));
    }

    #[test]
    fn resolves_parent_directory_imports() {
        let resolved = resolve("../shared/util.js", Path::new("/project/src/pages")).unwrap();
        assert_eq!(resolved, PathBuf::from("/project/src/shared/util.js"));
    }

    #[test]
    fn folds_inner_dot_segments() {
        let resolved = resolve("./a/./b/../c.js", Path::new("/root")).unwrap();
        assert_eq!(resolved, PathBuf::from("/root/a/c.js"));
    }

    #[test]
    fn rejects_bare_specifiers() {
        let err = resolve("lodash", Path::new("/project")).unwrap_err();
        assert!(err.to_string().contains("lodash"));
    }

    #[test]
    fn rejects_absolute_specifiers() {
        assert!(resolve("/etc/passwd", Path::new("/project")).is_err());
    }

    #[test]
    fn parent_of_root_stays_at_root() {
        assert_eq!(
            normalize(Path::new("/../a.js")),
            PathBuf::from("/a.js")
        );
    }

    #[test]
    fn absolutize_leaves_absolute_paths_alone() {
        assert_eq!(
            absolutize(Path::new("/abs/entry.js"), Path::new("/cwd")),
            PathBuf::from("/abs/entry.js")
        );
        assert_eq!(
            absolutize(Path::new("src/entry.js"), Path::new("/cwd")),
            PathBuf::from("/cwd/src/entry.js")
        );
    }
}
