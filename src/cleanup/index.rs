use tracing::debug;

use crate::parser::markup::find_elements;
use crate::parser::names::slug;

/// Rebuild the `<h2>` section titled `section` as a list of linked `<h3>`
/// headings, one per heading the section held. The section runs to the
/// next `<h2>` or the end of the document. `None` when there is no such
/// section.
pub fn rebuild(html: &str, section: &str, link_base: &str) -> Option<String> {
    let headings = find_elements(html, "h2");
    let pos = headings
        .iter()
        .position(|h| h.text().eq_ignore_ascii_case(section.trim()))?;
    let heading = &headings[pos];
    let end = headings
        .iter()
        .skip(pos + 1)
        .find(|h| h.start >= heading.end)
        .map_or(html.len(), |h| h.start);
    let body = &html[heading.end..end];

    let mut names: Vec<String> = Vec::new();
    for h3 in find_elements(body, "h3") {
        let name = h3.text();
        if name.is_empty() || names.last() == Some(&name) {
            continue;
        }
        names.push(name);
    }
    debug!(section, headings = names.len(), "rebuilding index section");

    let mut lines = vec![heading.outer.to_string()];
    for name in &names {
        lines.extend(linked_heading(name, link_base));
    }
    let tail = &html[end..];
    let sep = if tail.is_empty() { "\n" } else { "\n\n" };

    Some(format!(
        "{}{}{sep}{tail}",
        &html[..heading.start],
        lines.join("\n")
    ))
}

/// The exporter's line-broken layout of a linked heading.
fn linked_heading(name: &str, link_base: &str) -> [String; 9] {
    [
        "<h3>".to_string(),
        "  <b".to_string(),
        "    ><a".to_string(),
        format!("      href=\"{link_base}{}\"", slug(name)),
        "      target=\"_blank\"".to_string(),
        format!("      >{name}</a"),
        "    ></b".to_string(),
        "  >".to_string(),
        "</h3>".to_string(),
    ]
}
