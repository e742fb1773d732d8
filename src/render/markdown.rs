//! Markdown renderer — narration with artifacts inlined where they occurred.
//!
//! Each artifact becomes a `###` heading followed by its actions: file
//! writes as fenced code blocks tagged by extension, shell commands as `sh`
//! blocks.

use crate::render::Renderer;
use anyhow::Result;
use bolt_artifacts::{Action, Artifact, Segment, Transcript};

pub struct MarkdownRenderer;

impl Renderer for MarkdownRenderer {
    fn render(&self, transcript: &Transcript) -> Result<String> {
        let mut out = String::new();

        for segment in &transcript.segments {
            match segment {
                Segment::Text(text) => {
                    if out.ends_with("\n\n") {
                        out.push_str(text.trim_start_matches('\n'));
                    } else {
                        out.push_str(text);
                    }
                }
                Segment::Artifact(index) => {
                    if let Some(artifact) = transcript.artifacts.get(*index) {
                        ensure_blank_line(&mut out);
                        render_artifact(&mut out, artifact);
                    }
                }
            }
        }

        if transcript.truncated {
            ensure_blank_line(&mut out);
            out.push_str("> **warning:** response ended inside an unclosed artifact\n");
        }

        if !out.is_empty() && !out.ends_with('\n') {
            out.push('\n');
        }
        Ok(out)
    }

    fn file_extension(&self) -> &str {
        "md"
    }
}

fn render_artifact(out: &mut String, artifact: &Artifact) {
    out.push_str(&format!("### {}\n\n", artifact.title));
    for action in &artifact.actions {
        match action {
            Action::File(file) => {
                out.push_str(&format!("**create** `{}`\n\n", file.file_path));
                push_fence(out, language(&file.file_path), &file.content);
            }
            Action::Shell(shell) => {
                out.push_str("**run**\n\n");
                push_fence(out, "sh", &shell.command);
            }
        }
    }
}

fn ensure_blank_line(out: &mut String) {
    if out.is_empty() {
        return;
    }
    while !out.ends_with("\n\n") {
        out.push('\n');
    }
}

fn push_fence(out: &mut String, lang: &str, body: &str) {
    let fence = fence_for(body);
    out.push_str(&format!("{fence}{lang}\n{body}\n{fence}\n\n"));
}

/// A backtick fence longer than any backtick run inside `body`.
fn fence_for(body: &str) -> String {
    let mut longest = 0;
    let mut run = 0;
    for c in body.chars() {
        if c == '`' {
            run += 1;
            longest = longest.max(run);
        } else {
            run = 0;
        }
    }
    "`".repeat((longest + 1).max(3))
}

/// Code fence language for a file path, from its extension.
fn language(path: &str) -> &str {
    let ext = match path.rsplit_once('.') {
        Some((stem, ext)) if !stem.ends_with('/') && !ext.contains('/') => ext,
        _ => return "",
    };
    match ext {
        "js" | "mjs" | "cjs" => "javascript",
        "jsx" => "jsx",
        "ts" => "typescript",
        "tsx" => "tsx",
        "rs" => "rust",
        "py" => "python",
        "sh" | "bash" => "sh",
        "md" | "mdx" => "markdown",
        "yml" | "yaml" => "yaml",
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bolt_artifacts::StreamParser;

    fn render(input: &str) -> String {
        let mut parser = StreamParser::new();
        parser.push(input);
        MarkdownRenderer.render(&parser.finish()).unwrap()
    }

    #[test]
    fn narration_and_shell_action() {
        let out = render(
            "Intro\n<boltArtifact id=\"a\" title=\"Setup\"><boltAction type=\"shell\">npm i</boltAction></boltArtifact>\nBye",
        );
        assert_eq!(
            out,
            "Intro\n\n### Setup\n\n**run**\n\n```sh\nnpm i\n```\n\nBye\n"
        );
    }

    #[test]
    fn file_action_uses_extension_language() {
        let out = render(
            r#"<boltArtifact id="a" title="App"><boltAction type="file" filePath="/src/App.tsx">export default 1</boltAction></boltArtifact>"#,
        );
        assert!(out.starts_with("### App\n\n"));
        assert!(out.contains("**create** `/src/App.tsx`\n\n```tsx\nexport default 1\n```\n"));
    }

    #[test]
    fn truncated_turn_gets_warning() {
        let out = render(r#"Working <boltArtifact id="a" title="T"><boltAction type="shell">ls"#);
        assert!(out.contains("> **warning:** response ended inside an unclosed artifact"));
    }

    #[test]
    fn plain_text_passes_through() {
        assert_eq!(render("just text"), "just text\n");
        assert_eq!(render(""), "");
    }

    #[test]
    fn fence_outgrows_backticks_in_body() {
        assert_eq!(fence_for("plain"), "```");
        assert_eq!(fence_for("has ``` inside"), "````");
    }

    #[test]
    fn language_from_path() {
        assert_eq!(language("/index.js"), "javascript");
        assert_eq!(language("styles.css"), "css");
        assert_eq!(language("/Makefile"), "");
        assert_eq!(language("/.config/file"), "");
        assert_eq!(language("/src/.env"), "");
    }
}
