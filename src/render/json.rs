//! JSON renderer — structured output for tooling integration.
//!
//! Serializes the transcript as-is: message, artifacts, segments and the
//! truncation flag.

use crate::render::Renderer;
use anyhow::{Context, Result};
use bolt_artifacts::Transcript;

pub struct JsonRenderer;

impl Renderer for JsonRenderer {
    fn render(&self, transcript: &Transcript) -> Result<String> {
        let mut out =
            serde_json::to_string_pretty(transcript).context("failed to serialize transcript")?;
        out.push('\n');
        Ok(out)
    }

    fn file_extension(&self) -> &str {
        "json"
    }
}
