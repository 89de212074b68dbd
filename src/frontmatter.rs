//! Frontmatter extraction for skill and agent documents.
//!
//! Only the restricted subset used across the plugin tree is understood:
//! flat `key: value` lines, inline or bare comma lists, and values folded over
//! indented continuation lines (`description: >`). Anything else is left as a
//! raw string in [`Metadata::fields`].

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use tracing::debug;

const DELIMITER: &str = "---";

/// Result of parsing a document's frontmatter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frontmatter {
    Parsed(Metadata),
    /// No frontmatter, an unterminated block, or an unreadable file.
    Empty,
}

impl Frontmatter {
    pub fn is_empty(&self) -> bool {
        matches!(self, Frontmatter::Empty)
    }

    /// Collapse into metadata, treating `Empty` as a document with no fields.
    pub fn into_metadata(self) -> Metadata {
        match self {
            Frontmatter::Parsed(meta) => meta,
            Frontmatter::Empty => Metadata::default(),
        }
    }
}

/// Typed view over the fields of one frontmatter block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    pub name: Option<String>,
    pub status: Option<String>,
    pub description: Option<String>,
    pub use_when: Option<String>,
    pub requires: Vec<String>,
    pub tags: Vec<String>,
    pub model: Option<String>,
    pub version: Option<String>,
    pub category: Option<String>,
    /// Every non-empty field as written, after folding and quote stripping.
    pub fields: BTreeMap<String, String>,
}

impl Metadata {
    fn from_fields(fields: BTreeMap<String, String>) -> Self {
        let get = |key: &str| fields.get(key).cloned();
        Self {
            name: get("name"),
            status: get("status"),
            description: get("description"),
            use_when: get("use-when"),
            requires: fields.get("requires").map(|v| parse_list(v)).unwrap_or_default(),
            tags: fields.get("tags").map(|v| parse_list(v)).unwrap_or_default(),
            model: get("model"),
            version: get("version"),
            category: get("category"),
            fields,
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    pub fn is_deprecated(&self) -> bool {
        self.status.as_deref() == Some("deprecated")
    }

    /// Routing text: `use-when` (metadata.md convention) wins over `description`.
    pub fn summary(&self) -> Option<&str> {
        self.use_when
            .as_deref()
            .or(self.description.as_deref())
            .filter(|s| !s.is_empty())
    }
}

/// Split a document into its raw frontmatter block and body.
fn split(text: &str) -> Option<(&str, &str)> {
    if !text.starts_with(DELIMITER) {
        return None;
    }
    let rest = &text[DELIMITER.len()..];
    let end = rest.find("\n---")?;
    let block = &rest[..end];
    let body = &rest[end + "\n---".len()..];
    Some((block, body))
}

/// Parse the frontmatter of a document. Never fails: malformed input is `Empty`.
pub fn parse(text: &str) -> Frontmatter {
    let Some((block, _)) = split(text) else {
        return Frontmatter::Empty;
    };

    let mut fields: BTreeMap<String, String> = BTreeMap::new();
    // Key currently accepting continuation lines, with its collected parts.
    let mut open: Option<(String, Vec<String>)> = None;

    for line in block.trim_matches(|c| c == '\n' || c == '\r').lines() {
        let is_continuation = line.starts_with("  ") || line.starts_with('\t');
        if is_continuation {
            if let Some((_, parts)) = open.as_mut() {
                let trimmed = line.trim();
                if let Some(item) = trimmed.strip_prefix("- ") {
                    parts.push(format!("{},", item.trim()));
                } else if !trimmed.is_empty() {
                    parts.push(trimmed.to_string());
                }
                continue;
            }
        }

        if let Some((key, parts)) = open.take() {
            store(&mut fields, key, parts);
        }

        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim();
        if key.is_empty() || is_continuation {
            continue;
        }
        let first = clean_scalar(value);
        let parts = if first.is_empty() {
            Vec::new()
        } else {
            vec![first.to_string()]
        };
        open = Some((key.to_string(), parts));
    }

    if let Some((key, parts)) = open.take() {
        store(&mut fields, key, parts);
    }

    Frontmatter::Parsed(Metadata::from_fields(fields))
}

fn store(fields: &mut BTreeMap<String, String>, key: String, parts: Vec<String>) {
    let value = parts.join(" ");
    let value = value.trim().trim_end_matches(',').trim();
    if !value.is_empty() {
        fields.insert(key, value.to_string());
    }
}

/// Strip quotes and a leading block-scalar marker (`>`, `|`, `>-`, ...).
fn clean_scalar(raw: &str) -> &str {
    let value = raw.trim().trim_matches('"').trim_matches('\'').trim();
    for marker in [">-", ">+", "|-", "|+", ">", "|"] {
        if let Some(rest) = value.strip_prefix(marker) {
            if rest.is_empty() || rest.starts_with(char::is_whitespace) {
                return rest.trim().trim_matches('"').trim_matches('\'');
            }
        }
    }
    value
}

/// Parse `[a, b, c]` or `a, b, c` into trimmed, non-empty tokens in order.
pub fn parse_list(raw: &str) -> Vec<String> {
    raw.trim()
        .trim_matches(|c| c == '[' || c == ']')
        .split(',')
        .map(|item| item.trim().trim_matches('"').trim_matches('\'').trim())
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// Document text with the frontmatter block removed, trimmed.
pub fn body(text: &str) -> &str {
    match split(text) {
        Some((_, body)) => body.trim(),
        None => text.trim(),
    }
}

/// Read and parse a file; unreadable files contribute no metadata.
pub fn read(path: &Path) -> Frontmatter {
    match fs::read_to_string(path) {
        Ok(text) => parse(&text),
        Err(e) => {
            debug!("Could not read {}: {}", path.display(), e);
            Frontmatter::Empty
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_frontmatter_is_empty() {
        assert_eq!(parse("# Title\nbody"), Frontmatter::Empty);
        assert_eq!(parse(""), Frontmatter::Empty);
    }

    #[test]
    fn test_unterminated_frontmatter_is_empty() {
        let text = "---\nname: foo\nrequires: [a]\n";
        assert!(parse(text).is_empty());
    }

    #[test]
    fn test_flat_fields() {
        let text = "---\nname: devops-deploy\nstatus: deprecated\nmodel: opus\n---\nbody\n";
        let meta = parse(text).into_metadata();
        assert_eq!(meta.name.as_deref(), Some("devops-deploy"));
        assert!(meta.is_deprecated());
        assert_eq!(meta.model.as_deref(), Some("opus"));
        assert!(meta.requires.is_empty());
    }

    #[test]
    fn test_empty_value_is_absent() {
        let meta = parse("---\nname: x\nversion:   \n---\n").into_metadata();
        assert!(meta.version.is_none());
        assert!(meta.get("version").is_none());
    }

    #[test]
    fn test_requires_bracketed_and_bare_are_equivalent() {
        let bracketed = parse("---\nrequires: [a, b , c]\n---\n").into_metadata();
        let bare = parse("---\nrequires: a,b,  c,\n---\n").into_metadata();
        assert_eq!(bracketed.requires, vec!["a", "b", "c"]);
        assert_eq!(bracketed.requires, bare.requires);
    }

    #[test]
    fn test_requires_keeps_order_and_duplicates() {
        let meta = parse("---\nrequires: [z, a, z]\n---\n").into_metadata();
        assert_eq!(meta.requires, vec!["z", "a", "z"]);
    }

    #[test]
    fn test_folded_block_scalar() {
        let text = "---\nname: x\nuse-when: >\n  When the user asks\n  for a deploy.\nmodel: sonnet\n---\n";
        let meta = parse(text).into_metadata();
        assert_eq!(
            meta.use_when.as_deref(),
            Some("When the user asks for a deploy.")
        );
        assert_eq!(meta.model.as_deref(), Some("sonnet"));
    }

    #[test]
    fn test_continuation_after_inline_value() {
        let text = "---\ndescription: \"First part\"\n\tsecond part\n---\n";
        let meta = parse(text).into_metadata();
        assert_eq!(meta.description.as_deref(), Some("First part second part"));
    }

    #[test]
    fn test_marker_only_field_is_absent() {
        let meta = parse("---\ndescription: >\nname: x\n---\n").into_metadata();
        assert!(meta.description.is_none());
        assert_eq!(meta.name.as_deref(), Some("x"));
    }

    #[test]
    fn test_comparison_value_not_treated_as_marker() {
        let meta = parse("---\nversion: >=1.2\n---\n").into_metadata();
        assert_eq!(meta.version.as_deref(), Some(">=1.2"));
    }

    #[test]
    fn test_block_sequence_requires() {
        let meta = parse("---\nrequires:\n  - alpha\n  - beta\n---\n").into_metadata();
        assert_eq!(meta.requires, vec!["alpha", "beta"]);
    }

    #[test]
    fn test_quoted_scalar() {
        let meta = parse("---\nname: 'quoted'\ntags: [\"a\", 'b']\n---\n").into_metadata();
        assert_eq!(meta.name.as_deref(), Some("quoted"));
        assert_eq!(meta.tags, vec!["a", "b"]);
    }

    #[test]
    fn test_summary_prefers_use_when() {
        let meta = parse("---\ndescription: d\nuse-when: u\n---\n").into_metadata();
        assert_eq!(meta.summary(), Some("u"));
        let meta = parse("---\ndescription: d\n---\n").into_metadata();
        assert_eq!(meta.summary(), Some("d"));
    }

    #[test]
    fn test_body_strips_frontmatter() {
        assert_eq!(body("---\nname: x\n---\n\n## Step 1\n"), "## Step 1");
        assert_eq!(body("no frontmatter\n"), "no frontmatter");
        assert_eq!(body("---\nname: x\n---\n"), "");
    }

    #[test]
    fn test_read_missing_file_is_empty() {
        assert!(read(Path::new("/nonexistent/skill-factory/SKILL.md")).is_empty());
    }

    #[test]
    fn test_parse_list_strips_brackets() {
        assert_eq!(parse_list("[]"), Vec::<String>::new());
        assert_eq!(parse_list("[one]"), vec!["one"]);
    }
}
