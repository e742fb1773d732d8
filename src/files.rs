//! Project file tree built from file actions.
//!
//! Replays every file action of a conversation in order, so a later write to
//! the same path replaces the earlier one. Paths are kept rooted (`/src/a.js`)
//! regardless of how the model spelled them.

use crate::model::{Action, Artifact};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("refusing to write outside the target directory: {0}")]
    UnsafePath(String),

    #[error("{file} is written as a file but {nested} needs it as a directory")]
    PathClash { file: String, nested: String },

    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileTree {
    files: BTreeMap<String, String>,
}

impl FileTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_artifacts(artifacts: &[Artifact]) -> Self {
        let mut tree = Self::new();
        for artifact in artifacts {
            tree.apply(artifact);
        }
        tree
    }

    /// Replay one artifact's file actions. Shell actions are ignored.
    pub fn apply(&mut self, artifact: &Artifact) {
        for action in &artifact.actions {
            if let Action::File(file) = action {
                self.files
                    .insert(normalize(&file.file_path), file.content.clone());
            }
        }
    }

    pub fn get(&self, path: &str) -> Option<&str> {
        self.files.get(&normalize(path)).map(String::as_str)
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.files.iter().map(|(p, c)| (p.as_str(), c.as_str()))
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Write every file under `dir`, creating parent directories.
    ///
    /// Paths are checked against escapes and against each other before
    /// anything is written. Conflicts with what already exists under `dir`
    /// surface as [`ExtractError::Io`] while writing. Returns the number of
    /// files written.
    pub fn write_to(&self, dir: &Path) -> Result<usize, ExtractError> {
        let mut relatives = Vec::with_capacity(self.files.len());
        for (path, content) in &self.files {
            relatives.push((path, relative(path)?, content));
        }
        check_clashes(&relatives)?;

        let targets: Vec<_> = relatives
            .into_iter()
            .map(|(_, rel, content)| (dir.join(rel), content))
            .collect();

        for (target, content) in &targets {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent).map_err(|source| ExtractError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
            fs::write(target, content).map_err(|source| ExtractError::Io {
                path: target.clone(),
                source,
            })?;
            debug!(path = %target.display(), bytes = content.len(), "wrote file");
        }
        Ok(targets.len())
    }
}

/// All shell commands across `artifacts`, in order.
pub fn shell_commands(artifacts: &[Artifact]) -> Vec<&str> {
    artifacts
        .iter()
        .flat_map(|a| &a.actions)
        .filter_map(|action| match action {
            Action::Shell(shell) => Some(shell.command.as_str()),
            Action::File(_) => None,
        })
        .collect()
}

/// Fail when one file's path is a parent directory of another's.
fn check_clashes(relatives: &[(&String, PathBuf, &String)]) -> Result<(), ExtractError> {
    let files: BTreeMap<&Path, &String> = relatives
        .iter()
        .map(|(path, rel, _)| (rel.as_path(), *path))
        .collect();
    let mut seen = BTreeSet::new();
    for (path, rel, _) in relatives {
        for parent in rel.ancestors().skip(1) {
            if !seen.insert(parent) {
                continue;
            }
            if let Some(file) = files.get(parent) {
                return Err(ExtractError::PathClash {
                    file: file.to_string(),
                    nested: path.to_string(),
                });
            }
        }
    }
    Ok(())
}

/// "src/a.js" → "/src/a.js"
fn normalize(path: &str) -> String {
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{}", path)
    }
}

/// Strip the leading `/` and reject anything that is not a plain relative path.
fn relative(path: &str) -> Result<PathBuf, ExtractError> {
    let rel = Path::new(path.trim_start_matches('/'));
    let mut out = PathBuf::new();
    for component in rel.components() {
        match component {
            Component::Normal(part) => out.push(part),
            Component::CurDir => {}
            _ => return Err(ExtractError::UnsafePath(path.to_string())),
        }
    }
    if out.as_os_str().is_empty() {
        return Err(ExtractError::UnsafePath(path.to_string()));
    }
    Ok(out)
}
