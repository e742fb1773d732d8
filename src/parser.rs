//! Whole-buffer parser for complete assistant messages.
//!
//! Parsing is lenient: a block that cannot be understood is dropped and the
//! scan moves on. Nothing here returns an error.

use crate::model::*;
use crate::scan::{self, Tag};
use crate::stream::StreamParser;
use tracing::debug;

/// Artifact id used when the opening tag carries none.
pub const DEFAULT_ID: &str = "default-id";
/// Artifact title used when the opening tag carries none.
pub const DEFAULT_TITLE: &str = "default-title";

/// Parse the first complete artifact out of `buffer`.
///
/// `message` is the buffer with that artifact block cut out. An artifact
/// that is opened but never closed is not emitted and stays in `message`.
pub fn parse(buffer: &str) -> ParseResult {
    let Some(block) = scan::find_block(buffer, Tag::Artifact, 0) else {
        return ParseResult {
            message: buffer.to_string(),
            artifacts: Vec::new(),
        };
    };

    let artifact = parse_artifact(block.attrs, block.inner);
    let mut message = String::with_capacity(buffer.len() - (block.end - block.start));
    message.push_str(&buffer[..block.start]);
    message.push_str(&buffer[block.end..]);

    ParseResult {
        message,
        artifacts: vec![artifact],
    }
}

/// Parse every sibling artifact out of `buffer`.
///
/// Same result as feeding the whole buffer to a fresh [`StreamParser`].
pub fn parse_all(buffer: &str) -> ParseResult {
    let mut parser = StreamParser::new();
    parser.push(buffer);
    parser.finish().into()
}

/// Build an artifact from the attribute text and body of one
/// `<boltArtifact>` block.
pub fn parse_artifact(attrs: &str, body: &str) -> Artifact {
    let attributes = scan::parse_attributes(attrs);
    let actions = scan::blocks(body, Tag::Action)
        .filter_map(|block| parse_action(block.attrs, block.inner))
        .collect();

    Artifact {
        id: attributes.non_empty("id").unwrap_or(DEFAULT_ID).to_string(),
        title: attributes
            .non_empty("title")
            .unwrap_or(DEFAULT_TITLE)
            .to_string(),
        actions,
    }
}

fn parse_action(attrs: &str, inner: &str) -> Option<Action> {
    let attributes = scan::parse_attributes(attrs);
    match attributes.get("type") {
        Some("file") => {
            let Some(file_path) = attributes.non_empty("filePath") else {
                debug!("dropping file action without filePath");
                return None;
            };
            Some(Action::File(FileAction {
                file_path: file_path.to_string(),
                content_type: attributes.non_empty("contentType").map(str::to_string),
                content: inner.trim().to_string(),
            }))
        }
        Some("shell") => Some(Action::Shell(ShellAction {
            command: inner.trim().to_string(),
        })),
        other => {
            debug!(action_type = ?other, "dropping action of unknown type");
            None
        }
    }
}
