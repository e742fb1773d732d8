//! Tag scanner for the `boltArtifact` micro-format.
//!
//! Every search takes an explicit byte offset and returns offsets into the
//! haystack, so callers own all cursor state. Attribute values may contain
//! `>` when quoted, but an opening tag never spans a `<`; block bodies end at
//! the nearest matching close tag.

use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

// -- Regex patterns -----------------------------------------------------------

static RE_ARTIFACT_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<boltArtifact((?:\s(?:[^<>"']|"[^<"]*"|'[^<']*')*)?)>(.*?)</boltArtifact\s*>"#)
        .unwrap()
});

static RE_ACTION_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<boltAction((?:\s(?:[^<>"']|"[^<"]*"|'[^<']*')*)?)>(.*?)</boltAction\s*>"#)
        .unwrap()
});

static RE_ARTIFACT_CLOSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"</boltArtifact\s*>").unwrap());

static RE_ACTION_CLOSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"</boltAction\s*>").unwrap());

// name="value" or name='value'; anything else between pairs is skipped
static RE_ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?:^|\s)([A-Za-z_][A-Za-z0-9_:.-]*)\s*=\s*(?:"([^"]*)"|'([^']*)')"#).unwrap()
});

// -- Tags ---------------------------------------------------------------------

/// The two block kinds of the format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    Artifact,
    Action,
}

impl Tag {
    fn open_marker(self) -> &'static str {
        match self {
            Tag::Artifact => "<boltArtifact",
            Tag::Action => "<boltAction",
        }
    }

    fn block_re(self) -> &'static Regex {
        match self {
            Tag::Artifact => &*RE_ARTIFACT_BLOCK,
            Tag::Action => &*RE_ACTION_BLOCK,
        }
    }

    fn close_re(self) -> &'static Regex {
        match self {
            Tag::Artifact => &*RE_ARTIFACT_CLOSE,
            Tag::Action => &*RE_ACTION_CLOSE,
        }
    }
}

// -- Blocks -------------------------------------------------------------------

/// A complete `<tag attrs>inner</tag>` match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block<'a> {
    /// Byte offset of the opening `<`.
    pub start: usize,
    /// Byte offset one past the closing `>`.
    pub end: usize,
    /// Raw attribute text of the opening tag.
    pub attrs: &'a str,
    /// Untrimmed text between the tags.
    pub inner: &'a str,
}

/// Find the leftmost complete `tag` block starting at or after `from`.
///
/// `from` must lie on a char boundary of `buf`.
pub fn find_block(buf: &str, tag: Tag, from: usize) -> Option<Block<'_>> {
    let caps = tag.block_re().captures_at(buf, from)?;
    let whole = caps.get(0)?;
    Some(Block {
        start: whole.start(),
        end: whole.end(),
        attrs: caps.get(1).map_or("", |m| m.as_str()),
        inner: caps.get(2).map_or("", |m| m.as_str()),
    })
}

/// Iterate over non-overlapping `tag` blocks, left to right.
pub fn blocks(buf: &str, tag: Tag) -> Blocks<'_> {
    Blocks {
        buf,
        tag,
        cursor: 0,
    }
}

pub struct Blocks<'a> {
    buf: &'a str,
    tag: Tag,
    cursor: usize,
}

impl<'a> Iterator for Blocks<'a> {
    type Item = Block<'a>;

    fn next(&mut self) -> Option<Block<'a>> {
        if self.cursor >= self.buf.len() {
            return None;
        }
        let block = find_block(self.buf, self.tag, self.cursor)?;
        self.cursor = block.end;
        Some(block)
    }
}

/// Whether a complete closing tag for `tag` starts at or after `from`.
///
/// Every block ends in one, so a buffer without it cannot hold a new block.
pub fn has_close_tag(buf: &str, tag: Tag, from: usize) -> bool {
    tag.close_re().is_match_at(buf, from)
}

/// Whether `buf` contains an opening marker for `tag`, complete or cut off
/// right after the tag name.
pub fn has_open_tag(buf: &str, tag: Tag) -> bool {
    let marker = tag.open_marker();
    buf.match_indices(marker).any(|(i, m)| {
        match buf[i + m.len()..].chars().next() {
            None => true,
            Some(c) => c == '>' || c.is_whitespace(),
        }
    })
}

// -- Attributes ---------------------------------------------------------------

/// Attribute map of one opening tag. Unknown names are kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes(BTreeMap<String, String>);

impl Attributes {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Like [`get`](Self::get), but treats an empty value as absent.
    pub fn non_empty(&self, name: &str) -> Option<&str> {
        self.get(name).filter(|v| !v.is_empty())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Parse `name="value"` / `name='value'` pairs out of an opening tag.
///
/// Malformed pairs (unquoted or unterminated values) are skipped. When a name
/// repeats, the last occurrence wins.
pub fn parse_attributes(text: &str) -> Attributes {
    let mut map = BTreeMap::new();
    for caps in RE_ATTRIBUTE.captures_iter(text) {
        let value = caps.get(2).or_else(|| caps.get(3)).map_or("", |m| m.as_str());
        map.insert(caps[1].to_string(), value.to_string());
    }
    Attributes(map)
}
