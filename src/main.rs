//! bolt-artifacts — pull file and shell actions out of LLM responses.
//!
//! Every input is one assistant turn. It is fed through the streaming
//! parser (optionally in small chunks, as it would arrive over the wire) and
//! rendered as narration plus artifacts:
//!
//! - **stdout mode**: `bolt-artifacts < response.txt`
//! - **file mode**: `bolt-artifacts -f json -o out/ responses/*.txt`
//! - **extract**: `bolt-artifacts -x project/ response.txt` writes the file actions

mod render;

use anyhow::{bail, Context, Result};
use bolt_artifacts::{shell_commands, FileTree, StreamParser, Transcript};
use clap::Parser;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "bolt-artifacts",
    about = "Extract boltArtifact file and shell actions from LLM responses"
)]
struct Cli {
    /// Input files (glob patterns supported). If omitted, reads from stdin.
    files: Vec<String>,

    /// Output directory: write one rendered file per input instead of stdout
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// Output format: markdown (default), json
    #[arg(short = 'f', long, default_value = "markdown")]
    format: String,

    /// Feed each input to the parser in chunks of this many bytes
    #[arg(long, value_name = "BYTES")]
    chunk_size: Option<usize>,

    /// Write the merged file actions of all inputs into this directory
    #[arg(short = 'x', long, value_name = "DIR")]
    extract: Option<PathBuf>,

    /// Print only the shell commands, one per line
    #[arg(long)]
    commands: bool,

    /// Fail when a response ends inside an unclosed artifact
    #[arg(long)]
    strict: bool,

    /// Log parser decisions to stderr (RUST_LOG overrides)
    #[arg(short = 'v', long)]
    verbose: bool,
}

/// One parsed input.
struct Turn {
    source: String,
    transcript: Transcript,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let turns: Vec<Turn> = read_inputs(&cli.files)?
        .into_iter()
        .map(|(source, text)| Turn {
            transcript: run_turn(&text, cli.chunk_size),
            source,
        })
        .collect();

    if cli.commands {
        for turn in &turns {
            for command in shell_commands(&turn.transcript.artifacts) {
                println!("{}", command);
            }
        }
    } else {
        write_rendered(&cli, &turns)?;
    }

    if let Some(ref dir) = cli.extract {
        let mut tree = FileTree::new();
        for turn in &turns {
            for artifact in &turn.transcript.artifacts {
                tree.apply(artifact);
            }
        }
        let written = tree
            .write_to(dir)
            .with_context(|| format!("failed to extract files into {}", dir.display()))?;
        info!(files = written, dir = %dir.display(), "extracted files");
    }

    if cli.strict {
        let truncated: Vec<&str> = turns
            .iter()
            .filter(|turn| turn.transcript.truncated)
            .map(|turn| turn.source.as_str())
            .collect();
        if !truncated.is_empty() {
            bail!(
                "response ended inside an unclosed artifact: {}",
                truncated.join(", ")
            );
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "bolt_artifacts=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

/// Parse one turn, feeding it in `chunk_size` pieces when requested.
fn run_turn(text: &str, chunk_size: Option<usize>) -> Transcript {
    let mut parser = StreamParser::new();
    match chunk_size {
        Some(size) if size > 0 => {
            for chunk in chunks(text, size) {
                parser.push(chunk);
            }
        }
        _ => {
            parser.push(text);
        }
    }
    parser.finish()
}

/// Split `text` into pieces of about `size` bytes, never inside a char.
fn chunks(text: &str, size: usize) -> impl Iterator<Item = &str> {
    let mut rest = text;
    std::iter::from_fn(move || {
        if rest.is_empty() {
            return None;
        }
        let mut end = size.min(rest.len());
        while !rest.is_char_boundary(end) {
            end += 1;
        }
        let (head, tail) = rest.split_at(end);
        rest = tail;
        Some(head)
    })
}

fn write_rendered(cli: &Cli, turns: &[Turn]) -> Result<()> {
    let renderer = render::create_renderer(&cli.format)?;

    let Some(ref output_dir) = cli.output else {
        let multiple = turns.len() > 1;
        for turn in turns {
            if multiple {
                println!("==> {} <==", turn.source);
            }
            print!("{}", renderer.render(&turn.transcript)?);
        }
        return Ok(());
    };

    fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create output directory: {}", output_dir.display()))?;

    for turn in turns {
        let name = derive_output_name(&turn.source);
        let out_path = output_dir.join(format!("{}.{}", name, renderer.file_extension()));
        let rendered = renderer.render(&turn.transcript)?;
        fs::write(&out_path, rendered)
            .with_context(|| format!("failed to write {}", out_path.display()))?;
    }
    Ok(())
}

/// Read stdin, or every file the patterns name, as (source, text) pairs.
fn read_inputs(patterns: &[String]) -> Result<Vec<(String, String)>> {
    if patterns.is_empty() {
        let mut input = String::new();
        io::stdin()
            .read_to_string(&mut input)
            .context("failed to read stdin")?;
        return Ok(vec![("stdin".to_string(), input)]);
    }

    let mut inputs = Vec::new();
    for path in expand_globs(patterns)? {
        let text = fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        inputs.push((path.to_string_lossy().to_string(), text));
    }
    if inputs.is_empty() {
        bail!("no input files matched");
    }
    Ok(inputs)
}

/// Expand glob patterns into a list of real file paths.
/// Bare directory paths contribute every regular file directly inside them.
fn expand_globs(patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for pattern in patterns {
        let path = Path::new(pattern);
        if path.is_file() {
            files.push(path.to_path_buf());
            continue;
        }
        if path.is_dir() {
            let entries = fs::read_dir(path)
                .with_context(|| format!("failed to read directory: {}", path.display()))?;
            files.extend(
                entries
                    .flatten()
                    .map(|entry| entry.path())
                    .filter(|p| p.is_file()),
            );
            continue;
        }
        let matches: Vec<_> = glob::glob(pattern)
            .with_context(|| format!("invalid glob pattern: {}", pattern))?
            .filter_map(|r| r.ok())
            .filter(|p| p.is_file())
            .collect();
        if matches.is_empty() {
            warn!("no files matched: {}", pattern);
        }
        files.extend(matches);
    }
    // Sort for deterministic output
    files.sort();
    files.dedup();
    Ok(files)
}

/// "responses/turn1.txt" → "turn1"
fn derive_output_name(source: &str) -> String {
    Path::new(source)
        .file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .unwrap_or_else(|| source.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_name_strips_directory_and_extension() {
        assert_eq!(derive_output_name("responses/turn1.txt"), "turn1");
        assert_eq!(derive_output_name("turn2.md"), "turn2");
        assert_eq!(derive_output_name("stdin"), "stdin");
    }

    #[test]
    fn chunks_cover_input() {
        let parts: Vec<_> = chunks("abcdefg", 3).collect();
        assert_eq!(parts, vec!["abc", "def", "g"]);
    }

    #[test]
    fn chunks_respect_char_boundaries() {
        // "é" is two bytes; a 1-byte chunk must not split it
        let parts: Vec<_> = chunks("aéb", 1).collect();
        assert_eq!(parts, vec!["a", "é", "b"]);
    }

    #[test]
    fn chunking_does_not_change_result() {
        let input = concat!(
            "Sure.\n",
            r#"<boltArtifact id="p" title="Project">"#,
            r#"<boltAction type="file" filePath="/a.txt">ä</boltAction>"#,
            r#"<boltAction type="shell">cat a.txt</boltAction>"#,
            "</boltArtifact>\nDone."
        );
        let whole = run_turn(input, None);
        for size in [1, 2, 5, 17, 64] {
            assert_eq!(run_turn(input, Some(size)), whole, "chunk size {size}");
        }
    }
}
