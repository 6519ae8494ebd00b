//! File system primitives used by the operations.
//!
//! Every failure is mapped to `ReadError`/`WriteError` with the path it
//! concerns. Writes never leave a half-written destination behind: new files
//! are created exclusively and removed again if the write fails, existing
//! files are replaced by renaming a fully written temporary file over them.

use crate::error::{Error, Result};
use crate::operation::Pattern;
use globset::GlobBuilder;
use log::debug;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

/// How `write_file` treats an existing destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Fail with `FileExistsError` if the file already exists.
    CreateNew,
    /// Replace the file (or create it) atomically.
    Replace,
}

pub fn read_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|source| Error::ReadError { path: path.to_path_buf(), source })
}

/// Reads `path`, returning `None` when it does not exist.
pub fn read_optional(path: &Path) -> Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(Error::ReadError { path: path.to_path_buf(), source }),
    }
}

/// Creates `path` and its parents. An existing directory is not an error.
pub fn ensure_dir(path: &Path) -> Result<()> {
    match fs::create_dir_all(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists && path.is_dir() => Ok(()),
        Err(source) => Err(Error::WriteError { path: path.to_path_buf(), source }),
    }
}

/// Ensures the parent directory of `path` exists.
pub fn ensure_parent(path: &Path) -> Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => ensure_dir(parent),
        _ => Ok(()),
    }
}

pub fn write_file(path: &Path, content: &str, mode: WriteMode) -> Result<()> {
    match mode {
        WriteMode::CreateNew => write_new(path, content),
        WriteMode::Replace => write_replace(path, content),
    }
}

fn write_new(path: &Path, content: &str) -> Result<()> {
    let mut file = OpenOptions::new().write(true).create_new(true).open(path).map_err(|e| {
        if e.kind() == io::ErrorKind::AlreadyExists {
            Error::FileExistsError { path: path.to_path_buf() }
        } else {
            Error::WriteError { path: path.to_path_buf(), source: e }
        }
    })?;

    let written = file.write_all(content.as_bytes()).and_then(|()| file.sync_all());
    drop(file);
    if let Err(source) = written {
        let _ = fs::remove_file(path);
        return Err(Error::WriteError { path: path.to_path_buf(), source });
    }
    Ok(())
}

fn write_replace(path: &Path, content: &str) -> Result<()> {
    let temp_path = temp_path_for(path);
    let written = File::create(&temp_path)
        .and_then(|mut file| file.write_all(content.as_bytes()).and_then(|()| file.sync_all()))
        .and_then(|()| fs::rename(&temp_path, path));

    written.map_err(|source| {
        let _ = fs::remove_file(&temp_path);
        Error::WriteError { path: path.to_path_buf(), source }
    })
}

fn temp_path_for(target: &Path) -> PathBuf {
    let name = target.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
    target.with_file_name(format!(".{name}.kiln.tmp"))
}

/// Substitutes every match of `pattern` in the file at `path`.
///
/// Literal patterns insert `replacement` verbatim, regex patterns expand `$1`.
/// Returns `false` without touching the file when nothing changed.
pub fn replace_in_file(path: &Path, pattern: &Pattern, replacement: &str) -> Result<bool> {
    let content = read_file(path)?;
    let replaced = pattern.replace(&content, 0, replacement)?;
    if replaced == content {
        return Ok(false);
    }
    write_file(path, &replaced, WriteMode::Replace)?;
    Ok(true)
}

fn is_glob_component(component: &str) -> bool {
    component.contains(['*', '?', '[', ']', '{', '}'])
}

/// Splits a glob into the directory holding its literal prefix and the
/// remaining pattern, e.g. `templates/*/*.j2` into `templates` and `*/*.j2`.
pub fn split_glob(pattern: &str) -> (PathBuf, String) {
    let mut root = if pattern.starts_with('/') { PathBuf::from("/") } else { PathBuf::new() };
    let mut rest = Vec::new();
    for component in pattern.split('/').filter(|c| !c.is_empty()) {
        if rest.is_empty() && !is_glob_component(component) {
            root.push(component);
        } else {
            rest.push(component);
        }
    }
    (root, rest.join("/"))
}

/// Expands `pattern` relative to `base_dir` into the matching files, sorted by path.
///
/// A pattern without wildcards matches the single file it names, if it exists.
pub fn glob_files(pattern: &str, base_dir: &Path) -> Result<Vec<PathBuf>> {
    let (literal, rest) = split_glob(pattern);
    let root = base_dir.join(literal);

    if rest.is_empty() {
        return Ok(if root.is_file() { vec![root] } else { Vec::new() });
    }
    if !root.is_dir() {
        debug!("Glob root '{}' does not exist", root.display());
        return Ok(Vec::new());
    }

    let matcher = GlobBuilder::new(&rest)
        .literal_separator(true)
        .build()
        .map_err(|source| Error::GlobPatternError { pattern: pattern.to_string(), source })?
        .compile_matcher();

    let mut matches = Vec::new();
    for entry in WalkDir::new(&root).sort_by_file_name() {
        let entry = entry.map_err(|e| Error::ReadError { path: root.clone(), source: e.into() })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = match entry.path().strip_prefix(&root) {
            Ok(relative) => relative,
            Err(_) => continue,
        };
        if matcher.is_match(relative) {
            matches.push(entry.into_path());
        }
    }
    Ok(matches)
}

/// Renders a relative path with forward slashes, independent of platform.
pub fn slash_path(path: &Path) -> String {
    path.components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            Component::ParentDir => Some(String::from("..")),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_glob() {
        assert_eq!(split_glob("templates/*.j2"), (PathBuf::from("templates"), "*.j2".to_string()));
        assert_eq!(
            split_glob("a/b/**/c/*.txt"),
            (PathBuf::from("a/b"), "**/c/*.txt".to_string())
        );
        assert_eq!(split_glob("plain/file.txt"), (PathBuf::from("plain/file.txt"), String::new()));
        assert_eq!(split_glob("*.md"), (PathBuf::new(), "*.md".to_string()));
    }

    #[test]
    fn test_temp_path_for() {
        let temp = temp_path_for(Path::new("/some/dir/file.txt"));
        assert_eq!(temp, PathBuf::from("/some/dir/.file.txt.kiln.tmp"));
    }

    #[test]
    fn test_slash_path() {
        assert_eq!(slash_path(Path::new("a/b/c.txt")), "a/b/c.txt");
        assert_eq!(slash_path(Path::new("./a/c.txt")), "a/c.txt");
    }

    #[test]
    fn test_replace_in_file_keeps_literal_dollar() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("price.txt");
        fs::write(&path, "price: X\n").unwrap();

        assert!(replace_in_file(&path, &Pattern::Literal("X".into()), "$5").unwrap());
        assert_eq!(fs::read_to_string(&path).unwrap(), "price: $5\n");
    }
}
