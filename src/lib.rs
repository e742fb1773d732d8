//! Extract `boltArtifact` blocks from LLM output.
//!
//! A model writing code answers with narration plus artifacts in a small
//! XML-like format:
//!
//! ```text
//! <boltArtifact id="..." title="...">
//!   <boltAction type="file" filePath="..." contentType="...">...</boltAction>
//!   <boltAction type="shell">...</boltAction>
//! </boltArtifact>
//! ```
//!
//! - [`parse`] takes the first artifact out of a complete message.
//! - [`parse_all`] takes every sibling artifact.
//! - [`StreamParser`] resolves artifacts as chunks arrive, emitting each one
//!   only after its closing tag.
//! - [`FileTree`] replays file actions into a path-to-content map.

pub mod files;
pub mod model;
pub mod parser;
pub mod scan;
pub mod stream;

pub use files::{shell_commands, ExtractError, FileTree};
pub use model::{Action, Artifact, FileAction, ParseResult, Segment, ShellAction, Transcript};
pub use parser::{parse, parse_all};
pub use stream::StreamParser;
