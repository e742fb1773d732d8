//! Data model for extracted artifacts — format-agnostic.
//!
//! Field names serialize in the same camelCase vocabulary the model writes
//! in its tags (`filePath`, `contentType`), so JSON output reads like the
//! source markup.

use serde::Serialize;

/// A named bundle of actions produced by one `<boltArtifact>` block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Artifact {
    pub id: String,
    pub title: String,
    /// Actions in source order.
    pub actions: Vec<Action>,
}

/// A single `<boltAction>` the artifact asks for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Action {
    File(FileAction),
    Shell(ShellAction),
}

/// Create or overwrite `file_path` with `content`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileAction {
    pub file_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    /// Inner text of the tag, trimmed at both ends.
    pub content: String,
}

/// Run `command` in a shell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShellAction {
    pub command: String,
}

impl Action {
    /// The tag's `type` attribute value for this action.
    pub fn kind(&self) -> &'static str {
        match self {
            Action::File(_) => "file",
            Action::Shell(_) => "shell",
        }
    }
}

/// Narration plus the artifacts resolved so far.
///
/// `message` is the input with every emitted artifact block cut out. For a
/// live stream it also carries the unresolved tail of the buffer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParseResult {
    pub message: String,
    pub artifacts: Vec<Artifact>,
}

/// One piece of an assistant turn, in source order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum Segment {
    /// Narration between artifacts.
    Text(String),
    /// Index into the turn's artifact list.
    Artifact(usize),
}

/// Final state of a finished stream.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Transcript {
    pub message: String,
    pub artifacts: Vec<Artifact>,
    pub segments: Vec<Segment>,
    /// The stream ended inside an opened but unclosed artifact.
    pub truncated: bool,
}

impl From<Transcript> for ParseResult {
    fn from(t: Transcript) -> Self {
        ParseResult {
            message: t.message,
            artifacts: t.artifacts,
        }
    }
}
