//! Incremental parser for a response that arrives in chunks.
//!
//! The parser owns one growing buffer per assistant turn. Each chunk is
//! appended, then every complete artifact block at the front of the buffer
//! is resolved and drained, so already-resolved text is never scanned again.
//! Block matching only reruns once a new closing tag has arrived.
//! An artifact is emitted only once its closing tag has fully arrived, and
//! emitted artifacts are never revisited.

use crate::model::*;
use crate::parser::parse_artifact;
use crate::scan::{self, Tag};
use tracing::{debug, trace, warn};

#[derive(Debug, Default)]
pub struct StreamParser {
    /// Text not yet resolved into narration or an artifact.
    buffer: String,
    /// Narration resolved so far, artifact blocks removed.
    message: String,
    artifacts: Vec<Artifact>,
    segments: Vec<Segment>,
    /// No closing tag can start before this offset of `buffer`.
    close_from: usize,
}

impl StreamParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk and return the state so far.
    ///
    /// `message` includes the unresolved tail, which may hold a partially
    /// received artifact tag until a later chunk closes it.
    pub fn feed(&mut self, chunk: &str) -> ParseResult {
        self.push(chunk);
        ParseResult {
            message: format!("{}{}", self.message, self.buffer),
            artifacts: self.artifacts.clone(),
        }
    }

    /// Append a chunk without building a snapshot. Returns how many artifacts
    /// the chunk completed.
    pub fn push(&mut self, chunk: &str) -> usize {
        self.buffer.push_str(chunk);
        trace!(chunk = chunk.len(), pending = self.buffer.len(), "buffered chunk");
        self.resolve()
    }

    fn resolve(&mut self) -> usize {
        let mut resolved = 0;
        while scan::has_close_tag(&self.buffer, Tag::Artifact, self.close_from) {
            let Some(block) = scan::find_block(&self.buffer, Tag::Artifact, 0) else {
                break;
            };
            let artifact = parse_artifact(block.attrs, block.inner);
            let (start, end) = (block.start, block.end);

            let before = &self.buffer[..start];
            if !before.is_empty() {
                self.message.push_str(before);
                self.segments.push(Segment::Text(before.to_string()));
            }

            debug!(
                id = %artifact.id,
                actions = artifact.actions.len(),
                "resolved artifact"
            );
            self.segments.push(Segment::Artifact(self.artifacts.len()));
            self.artifacts.push(artifact);
            self.buffer.drain(..end);
            self.close_from = 0;
            resolved += 1;
        }

        // a close tag still arriving starts at the last `<` with no `>` after it
        let tail = &self.buffer[self.close_from..];
        self.close_from += match tail.rfind('<') {
            Some(i) if !tail[i..].contains('>') => i,
            _ => tail.len(),
        };
        resolved
    }

    /// Artifacts resolved so far, in closing-tag order.
    pub fn artifacts(&self) -> &[Artifact] {
        &self.artifacts
    }

    /// Resolved narration, without the pending tail.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Text received but not yet resolved.
    pub fn pending(&self) -> &str {
        &self.buffer
    }

    /// Resolved segments, without the pending tail.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Whether the pending text opens an artifact that has not been closed.
    pub fn is_truncated(&self) -> bool {
        scan::has_open_tag(&self.buffer, Tag::Artifact)
    }

    /// End the turn. The pending tail becomes trailing narration.
    pub fn finish(mut self) -> Transcript {
        let truncated = self.is_truncated();
        if truncated {
            warn!(
                pending = self.buffer.len(),
                "stream ended inside an unclosed artifact"
            );
        }
        if !self.buffer.is_empty() {
            self.message.push_str(&self.buffer);
            self.segments.push(Segment::Text(std::mem::take(&mut self.buffer)));
        }
        Transcript {
            message: self.message,
            artifacts: self.artifacts,
            segments: self.segments,
            truncated,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_ARTIFACTS: &str = concat!(
        "Setting up.\n",
        r#"<boltArtifact id="setup" title="Setup">"#,
        r#"<boltAction type="shell">npm init -y</boltAction>"#,
        "</boltArtifact>",
        "\nNow the code.\n",
        r#"<boltArtifact id="code" title="Code">"#,
        r#"<boltAction type="file" filePath="/index.js">console.log(1)</boltAction>"#,
        "</boltArtifact>",
        "\nDone."
    );

    #[test]
    fn split_open_tag_resolves_on_second_chunk() {
        let mut parser = StreamParser::new();
        let first = parser.feed("Hello <boltArt");
        assert!(first.artifacts.is_empty());
        assert_eq!(first.message, "Hello <boltArt");

        let second = parser.feed(
            "ifact id=\"x3\" title=\"T\"><boltAction type=\"file\" filePath=\"/b.js\">code</boltAction></boltArtifact> done",
        );
        assert_eq!(second.artifacts.len(), 1);
        assert_eq!(second.artifacts[0].id, "x3");
        assert_eq!(second.message, "Hello  done");
    }

    #[test]
    fn no_artifact_before_close_tag() {
        let mut parser = StreamParser::new();
        let result = parser.feed(r#"<boltArtifact id="a" title="T"><boltAction type="shell">ls</boltAction></boltArtifact"#);
        assert!(result.artifacts.is_empty());
        assert!(parser.is_truncated());

        let result = parser.feed(">");
        assert_eq!(result.artifacts.len(), 1);
        assert!(!parser.is_truncated());
    }

    #[test]
    fn several_artifacts_in_one_chunk() {
        let mut parser = StreamParser::new();
        assert_eq!(parser.push(TWO_ARTIFACTS), 2);
        let ids: Vec<_> = parser.artifacts().iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["setup", "code"]);
        assert_eq!(parser.message(), "Setting up.\n\nNow the code.\n");
        assert_eq!(parser.pending(), "\nDone.");
    }

    #[test]
    fn artifacts_are_never_repeated() {
        let mut parser = StreamParser::new();
        let mut seen = Vec::new();
        for chunk in TWO_ARTIFACTS.split_inclusive('>') {
            let before = parser.artifacts().len();
            let result = parser.feed(chunk);
            assert!(result.artifacts.len() >= before);
            assert_eq!(&result.artifacts[..before], &seen[..]);
            seen = result.artifacts;
        }
        assert_eq!(seen.len(), 2);
    }

    #[test]
    fn segments_interleave_narration_and_artifacts() {
        let mut parser = StreamParser::new();
        parser.push(TWO_ARTIFACTS);
        let transcript = parser.finish();
        assert_eq!(
            transcript.segments,
            vec![
                Segment::Text("Setting up.\n".to_string()),
                Segment::Artifact(0),
                Segment::Text("\nNow the code.\n".to_string()),
                Segment::Artifact(1),
                Segment::Text("\nDone.".to_string()),
            ]
        );
        assert_eq!(transcript.message, "Setting up.\n\nNow the code.\n\nDone.");
        assert!(!transcript.truncated);
    }

    #[test]
    fn adjacent_artifacts_have_no_empty_text_segment() {
        let mut parser = StreamParser::new();
        parser.push("<boltArtifact id=\"a\"></boltArtifact><boltArtifact id=\"b\"></boltArtifact>");
        assert_eq!(
            parser.segments(),
            &[Segment::Artifact(0), Segment::Artifact(1)]
        );
    }

    #[test]
    fn finish_reports_truncation() {
        let mut parser = StreamParser::new();
        parser.push(TWO_ARTIFACTS);
        parser.push(r#"<boltArtifact id="cut" title="Cut"><boltAction type="shell">npm run"#);
        let transcript = parser.finish();
        assert!(transcript.truncated);
        assert_eq!(transcript.artifacts.len(), 2);
        assert!(transcript.message.ends_with("npm run"));
    }

    #[test]
    fn close_tag_split_inside_whitespace() {
        let mut parser = StreamParser::new();
        parser.push(r#"<boltArtifact id="a"><boltAction type="shell">ls</boltAction></boltArtifact  "#);
        assert!(parser.artifacts().is_empty());
        parser.push("  ");
        assert!(parser.artifacts().is_empty());
        assert_eq!(parser.push(">"), 1);
    }

    #[test]
    fn stray_close_tag_is_not_rescanned() {
        let mut parser = StreamParser::new();
        parser.push("A lone </boltArtifact> here. ");
        assert!(parser.artifacts().is_empty());
        assert_eq!(parser.close_from, parser.pending().len());

        parser.push(r#"<boltArtifact id="a"><boltAction type="shell">ls</boltAction>"#);
        assert!(parser.artifacts().is_empty());
        parser.push("</boltArtifact>");
        assert_eq!(parser.artifacts()[0].id, "a");
        assert_eq!(parser.message(), "A lone </boltArtifact> here. ");
    }

    #[test]
    fn long_body_scan_offset_tracks_the_tail() {
        let mut parser = StreamParser::new();
        parser.push(r#"<boltArtifact id="big"><boltAction type="file" filePath="/big.txt">"#);
        for _ in 0..2000 {
            parser.push("line of text\n");
            assert!(parser.close_from + "line of text\n".len() >= parser.pending().len());
        }
        parser.push("</boltAction></boltArt");
        assert_eq!(&parser.pending()[parser.close_from..], "</boltArt");
        parser.push("ifact>");
        let Action::File(file) = &parser.artifacts()[0].actions[0] else {
            panic!("expected file action");
        };
        assert_eq!(file.content.lines().count(), 2000);
        assert_eq!(parser.close_from, 0);
    }

    #[test]
    fn empty_feed() {
        let mut parser = StreamParser::new();
        assert_eq!(parser.feed(""), ParseResult::default());
        let transcript = parser.finish();
        assert_eq!(transcript, Transcript::default());
    }
}
