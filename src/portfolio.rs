//! The portfolio lookup table embedded in the proposal page.
//!
//! The page declares `const portfolioData = { … }` inside an inline script
//! (wrapped in an IIFE, so it is not reachable as a global). The table maps a
//! project name, as shown in each card's `.portfolio-name`, to the long-form
//! narrative that only the PDF shows.
//!
//! The literal is JavaScript, not JSON: unquoted keys, single quotes and
//! trailing commas are all legal. We therefore only *locate* it here and
//! hand the text to the browser to evaluate; the evaluated value comes back
//! as JSON and is deserialised into a [`PortfolioTable`].

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;

static DECLARATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:const|let|var)\s+portfolioData\s*=\s*\{").expect("static regex")
});

static SCRIPT_OPEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<script\b([^>]*)>").expect("static regex"));

static SCRIPT_CLOSE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)</script\s*>").expect("static regex"));

static EXTERNAL_SRC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bsrc\s*=").expect("static regex"));

/// Long-form content for one portfolio card.
///
/// Fields are lenient: `null` or a value of the wrong type reads as empty,
/// so one sloppy entry never costs the other cards their expansion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortfolioEntry {
    #[serde(default, deserialize_with = "lenient_text")]
    pub narrative: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub relevance: String,
    /// RFP section references rendered as tags.
    #[serde(default, deserialize_with = "lenient_refs")]
    pub refs: Vec<String>,
}

/// Project name → entry. Ordered so logs and tests are deterministic.
pub type PortfolioTable = BTreeMap<String, PortfolioEntry>;

fn scalar_text(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn lenient_text<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(scalar_text(Value::deserialize(d)?).unwrap_or_default())
}

fn lenient_refs<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::Array(items) => items.into_iter().filter_map(scalar_text).collect(),
        Value::String(s) if !s.is_empty() => vec![s],
        _ => Vec::new(),
    })
}

/// Build a table from the evaluated `portfolioData` value.
///
/// Entries that are not objects are skipped; a value that is not an object
/// gives an empty table.
pub fn table_from_value(value: Value) -> PortfolioTable {
    let Value::Object(map) = value else {
        debug!("portfolioData is not an object");
        return PortfolioTable::new();
    };
    map.into_iter()
        .filter_map(|(name, entry)| match serde_json::from_value(entry) {
            Ok(entry) => Some((name, entry)),
            Err(e) => {
                debug!("Skipping portfolio entry '{}': {}", name, e);
                None
            }
        })
        .collect()
}

/// Return the `{ … }` object literal assigned to `portfolioData` in an
/// inline `<script>`, or `None` when no inline script declares it or the
/// literal never closes.
///
/// Scripts with a `src` attribute and markup outside `<script>` (comments,
/// attribute values) are not searched. Brace matching skips string literals
/// (all three quote styles, with escapes) and comments, so a `}` inside
/// narrative text does not end the literal early.
pub fn extract_portfolio_literal(source: &str) -> Option<&str> {
    inline_scripts(source).into_iter().find_map(|body| {
        let m = DECLARATION.find(body)?;
        let start = m.end() - 1;
        let end = matching_brace(body.as_bytes(), start)?;
        Some(&body[start..=end])
    })
}

/// Bodies of `<script>` elements without `src`, in document order. An
/// unclosed script runs to the end of the source.
fn inline_scripts(source: &str) -> Vec<&str> {
    let mut bodies = Vec::new();
    let mut pos = 0;
    while let Some(open) = SCRIPT_OPEN.captures_at(source, pos) {
        let (Some(tag), Some(attrs)) = (open.get(0), open.get(1)) else {
            break;
        };
        let body_end = SCRIPT_CLOSE
            .find_at(source, tag.end())
            .map_or(source.len(), |m| m.start());
        if !EXTERNAL_SRC.is_match(attrs.as_str()) {
            bodies.push(&source[tag.end()..body_end]);
        }
        pos = body_end;
    }
    bodies
}

/// Index of the `}` closing the `{` at `open`.
fn matching_brace(bytes: &[u8], open: usize) -> Option<usize> {
    debug_assert_eq!(bytes[open], b'{');
    let mut depth = 0usize;
    let mut i = open;
    while i < bytes.len() {
        match bytes[i] {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            quote @ (b'"' | b'\'' | b'`') => {
                i = skip_string(bytes, i, quote)?;
            }
            b'/' if bytes.get(i + 1) == Some(&b'/') => {
                while i < bytes.len() && bytes[i] != b'\n' {
                    i += 1;
                }
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                i += 2;
                while i + 1 < bytes.len() && !(bytes[i] == b'*' && bytes[i + 1] == b'/') {
                    i += 1;
                }
                i += 1;
            }
            _ => {}
        }
        i += 1;
    }
    None
}

/// Index of the closing quote of the string opened at `open`.
fn skip_string(bytes: &[u8], open: usize, quote: u8) -> Option<usize> {
    let mut i = open + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 1,
            b if b == quote => return Some(i),
            _ => {}
        }
        i += 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
<script>
(function () {
  const portfolioData = {
    'Canadian Heritage': {
      narrative: "Rebuilt the {legacy} portal",
      relevance: 'Bilingual content at scale',
      refs: ['RFP 3.1', `RFP 4.2`],
    },
    // a comment with a stray }
    "Ottawa Art Gallery": { narrative: 'It\'s a gallery', relevance: "", refs: [] },
  };
  document.querySelectorAll('.portfolio-card').forEach(() => {});
})();
</script>"#;

    #[test]
    fn extracts_balanced_literal() {
        let lit = extract_portfolio_literal(PAGE).expect("literal found");
        assert!(lit.starts_with('{'));
        assert!(lit.ends_with('}'));
        assert!(lit.contains("Ottawa Art Gallery"));
        assert!(!lit.contains("querySelectorAll"));
    }

    #[test]
    fn braces_inside_strings_and_comments_are_ignored() {
        let lit = extract_portfolio_literal(PAGE).unwrap();
        assert!(lit.contains("{legacy}"));
        assert!(lit.contains("a comment with a stray }"));
        assert!(lit.trim_end_matches('}').trim_end().ends_with("},"));
    }

    #[test]
    fn missing_declaration_is_none() {
        assert_eq!(extract_portfolio_literal("<script>const other = {};</script>"), None);
    }

    #[test]
    fn unterminated_literal_is_none() {
        assert_eq!(
            extract_portfolio_literal("<script>const portfolioData = { a: { b: 1 }</script>"),
            None
        );
    }

    #[test]
    fn tolerates_let_and_spacing() {
        let lit = extract_portfolio_literal("<SCRIPT>let portfolioData={x:{}}</SCRIPT>").unwrap();
        assert_eq!(lit, "{x:{}}");
    }

    #[test]
    fn entry_deserialises_with_missing_refs() {
        let table: PortfolioTable = serde_json::from_str(
            r#"{"Canadian Heritage": {"narrative": "n", "relevance": "r"}}"#,
        )
        .unwrap();
        let entry = &table["Canadian Heritage"];
        assert_eq!(entry.narrative, "n");
        assert!(entry.refs.is_empty());
    }

    #[test]
    fn null_and_odd_fields_read_as_empty() {
        let table = table_from_value(serde_json::json!({
            "Canadian Heritage": {"narrative": "n", "relevance": "r", "refs": ["RFP 3.1"]},
            "Ottawa Art Gallery": {"narrative": null, "relevance": 7, "refs": null},
            "National Arts Centre": {"narrative": "x", "refs": ["RFP 2", null, 4]},
        }));
        assert_eq!(table.len(), 3);
        assert_eq!(table["Canadian Heritage"].refs, vec!["RFP 3.1".to_string()]);
        let gallery = &table["Ottawa Art Gallery"];
        assert_eq!(gallery.narrative, "");
        assert_eq!(gallery.relevance, "7");
        assert!(gallery.refs.is_empty());
        assert_eq!(
            table["National Arts Centre"].refs,
            vec!["RFP 2".to_string(), "4".to_string()]
        );
    }

    #[test]
    fn refs_null_does_not_reject_the_table() {
        let table: PortfolioTable = serde_json::from_str(
            r#"{"A": {"narrative": "a", "refs": ["RFP 1"]},
                "B": {"narrative": "b", "refs": null}}"#,
        )
        .unwrap();
        assert_eq!(table["A"].refs.len(), 1);
        assert!(table["B"].refs.is_empty());
    }

    #[test]
    fn non_object_entries_are_skipped() {
        let table = table_from_value(serde_json::json!({
            "Good": {"narrative": "kept"},
            "Broken": null,
            "Also broken": "text",
        }));
        assert_eq!(table.keys().collect::<Vec<_>>(), vec!["Good"]);
        assert!(table_from_value(serde_json::json!([1, 2])).is_empty());
    }

    #[test]
    fn declaration_outside_inline_scripts_is_ignored() {
        let page = r#"
<!-- const portfolioData = { "Stale": {} } -->
<div data-x="const portfolioData = { Attr: {} }"></div>
<script src="vendor.js">const portfolioData = { External: {} }</script>
<script type="module">
  const portfolioData = { Live: { narrative: 'yes' } };
</script>"#;
        assert_eq!(
            extract_portfolio_literal(page),
            Some("{ Live: { narrative: 'yes' } }")
        );
    }

    #[test]
    fn page_without_inline_declaration_is_none() {
        assert_eq!(
            extract_portfolio_literal("<!-- const portfolioData = {a:{}} -->\n<p>none</p>"),
            None
        );
    }
}
