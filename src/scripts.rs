//! JavaScript evaluated inside the proposal page during stage 1.
//!
//! Every snippet is a self-invoking arrow function so it can be sent as a
//! plain `Runtime.evaluate` expression. Values crossing from Rust into the
//! page are embedded as JSON literals (via `serde_json`), which are valid
//! JavaScript and need no further escaping.

use crate::portfolio::PortfolioTable;
use crate::stylesheet::{EXPANDED_CARD_CLASS, SECTION_BREAK_CLASS};

/// Heading placed above the relevance paragraph of an expanded card.
pub const RELEVANCE_LABEL: &str = "Relevance to RHF Project";

/// Strip `loading="lazy"` from every image and re-assign `src` so the
/// browser fetches it now. Returns the number of images touched.
pub const FIX_LAZY_IMAGES: &str = r#"(() => {
  let count = 0;
  document.querySelectorAll('img[loading="lazy"]').forEach(img => {
    img.removeAttribute('loading');
    const src = img.src;
    img.src = '';
    img.src = src;
    count++;
  });
  return count;
})()"#;

/// Append `css` (a complete `<style>` block) to `document.head`.
pub fn inject_css(css: &str) -> String {
    format!(
        "(() => {{ document.head.insertAdjacentHTML('beforeend', {}); return true; }})()",
        js_string(css)
    )
}

/// Add the section-break class to each element in `ids`, then to the first
/// gradient section if it is not already marked. Missing IDs are skipped.
/// Returns the number of elements marked.
pub fn mark_section_breaks(ids: &[String]) -> String {
    let ids = serde_json::to_string(ids).unwrap_or_else(|_| "[]".to_string());
    format!(
        r#"(() => {{
  const breakIds = {ids};
  const cls = {cls};
  let marked = 0;
  breakIds.forEach(id => {{
    const el = document.getElementById(id);
    if (el) {{
      el.classList.add(cls);
      marked++;
    }}
  }});
  const gradient = document.querySelector('section[style*="linear-gradient"]');
  if (gradient && !gradient.classList.contains(cls)) {{
    gradient.classList.add(cls);
    marked++;
  }}
  return marked;
}})()"#,
        cls = js_string(SECTION_BREAK_CLASS),
    )
}

/// Evaluate the portfolio object literal and return it as a JSON value.
///
/// The round-trip through `JSON.stringify` drops anything that is not plain
/// data (functions, `undefined`) before the value leaves the page.
pub fn evaluate_literal(literal: &str) -> String {
    format!("(() => JSON.parse(JSON.stringify(({literal}))))()")
}

/// Expand every `.portfolio-card` whose name appears in `table`. Returns the
/// number of cards expanded.
pub fn expand_portfolio_cards(table: &PortfolioTable) -> String {
    let data = serde_json::to_string(table).unwrap_or_else(|_| "{}".to_string());
    format!(
        r#"(() => {{
  const portfolioData = {data};
  const expandedClass = {expanded};
  const relevanceLabel = {label};
  const div = (cls, text) => {{
    const el = document.createElement('div');
    el.className = cls;
    el.textContent = text;
    return el;
  }};
  let count = 0;
  document.querySelectorAll('.portfolio-card').forEach(card => {{
    const nameEl = card.querySelector('.portfolio-name');
    if (!nameEl) return;
    const data = portfolioData[nameEl.textContent.trim()];
    if (!data) return;

    card.classList.add(expandedClass);

    const info = card.querySelector('.portfolio-info');
    if (!info) return;

    info.appendChild(div('pdf-narrative', data.narrative));
    info.appendChild(div('pdf-relevance-label', relevanceLabel));
    info.appendChild(div('pdf-relevance', data.relevance));

    if (data.refs && data.refs.length) {{
      const refs = document.createElement('div');
      refs.className = 'pdf-refs';
      data.refs.forEach(r => {{
        const tag = document.createElement('span');
        tag.className = 'pdf-ref-tag';
        tag.textContent = r;
        refs.appendChild(tag);
      }});
      info.appendChild(refs);
    }}
    count++;
  }});
  return count;
}})()"#,
        expanded = js_string(EXPANDED_CARD_CLASS),
        label = js_string(RELEVANCE_LABEL),
    )
}

/// Quote `s` as a JavaScript string literal.
fn js_string(s: &str) -> String {
    // A JSON string is a valid JS string literal; serialising a &str cannot fail.
    serde_json::to_string(s).unwrap_or_else(|_| String::from("\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::portfolio::PortfolioEntry;

    #[test]
    fn snippets_are_iifes() {
        let ids = vec!["approach".to_string()];
        for js in [
            FIX_LAZY_IMAGES.to_string(),
            inject_css("<style></style>"),
            mark_section_breaks(&ids),
            evaluate_literal("{a: 1}"),
            expand_portfolio_cards(&PortfolioTable::new()),
        ] {
            assert!(js.starts_with("(() =>"), "not an IIFE: {js}");
            assert!(js.trim_end().ends_with(")()"), "not invoked: {js}");
        }
    }

    #[test]
    fn css_is_embedded_as_escaped_literal() {
        let js = inject_css("<style>\n  a { content: \"x\"; }\n</style>");
        assert!(js.contains(r#""<style>\n  a { content: \"x\"; }\n</style>""#), "got: {js}");
        assert!(js.contains("insertAdjacentHTML('beforeend'"));
    }

    #[test]
    fn section_ids_become_a_json_array() {
        let ids = vec!["approach".to_string(), "next-steps".to_string()];
        let js = mark_section_breaks(&ids);
        assert!(js.contains(r#"const breakIds = ["approach","next-steps"];"#));
        assert!(js.contains(r#"const cls = "pdf-section-break";"#));
        assert!(js.contains("linear-gradient"));
    }

    #[test]
    fn portfolio_table_is_inlined() {
        let mut table = PortfolioTable::new();
        table.insert(
            "Canadian Heritage".into(),
            PortfolioEntry {
                narrative: "Rebuilt </script> safely".into(),
                relevance: "Bilingual".into(),
                refs: vec!["RFP 3.1".into()],
            },
        );
        let js = expand_portfolio_cards(&table);
        assert!(js.contains(r#""Canadian Heritage":{"narrative":"Rebuilt </script> safely""#));
        assert!(js.contains(r#"const relevanceLabel = "Relevance to RHF Project";"#));
        assert!(js.contains(r#"const expandedClass = "pdf-expanded";"#));
    }
}
