use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use super::markup::{self, flatten_text, Node, TokenKind};

static LEADING_INT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[-+]?\d+").unwrap());

/// How a labeled value is found inside a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// `<b>Range:</b> 30 ft` — text after the bold label up to the next tag.
    Inline(&'static str),
    /// `<p><b>Reload</b> 2 actions</p>` — rest of the paragraph the label leads.
    Paragraph(&'static str),
    /// `<td><b>STR</b> -1</td>` — first integer after the label in a cell.
    Cell(&'static str),
    /// `<p>Ref: 13</p>` — digits of a `Label: N` paragraph.
    Defense(&'static str),
}

impl Rule {
    pub fn apply(self, body: &str) -> String {
        match self {
            Rule::Inline(label) => inline_value(body, label),
            Rule::Paragraph(label) => paragraph_value(body, label),
            Rule::Cell(label) => cell_value(body, label),
            Rule::Defense(label) => defense_value(body, label),
        }
    }
}

/// Extracted values by field name. Missing labels read as `""`.
#[derive(Debug, Default)]
pub struct Fields(HashMap<&'static str, String>);

impl Fields {
    pub fn take(&mut self, field: &str) -> String {
        self.0.remove(field).unwrap_or_default()
    }
}

pub fn extract_fields(body: &str, table: &[(&'static str, Rule)]) -> Fields {
    Fields(
        table
            .iter()
            .map(|(field, rule)| (*field, rule.apply(body)))
            .collect(),
    )
}

/// `Base:` matches `base`, `Base` and `BASE :`.
pub fn label_matches(found: &str, label: &str) -> bool {
    found
        .trim()
        .trim_end_matches(':')
        .trim_end()
        .eq_ignore_ascii_case(label)
}

pub fn inline_value(body: &str, label: &str) -> String {
    let tokens = markup::tokenize(body);
    for (i, token) in tokens.iter().enumerate() {
        if token.kind != TokenKind::Open || !(token.name == "b" || token.name == "strong") {
            continue;
        }
        let Some(close) = markup::matching_close(&tokens, i) else {
            continue;
        };
        if !label_matches(&flatten_text(&body[token.end..tokens[close].start]), label) {
            continue;
        }
        let value = match tokens.get(close + 1) {
            Some(next) if next.kind == TokenKind::Text => flatten_text(next.raw),
            _ => String::new(),
        };
        if !value.is_empty() {
            return value;
        }
    }
    String::new()
}

pub fn paragraph_value(body: &str, label: &str) -> String {
    markup::find_elements(body, "p")
        .iter()
        .find_map(|p| led_by(p, label))
        .unwrap_or_default()
}

pub fn cell_value(body: &str, label: &str) -> String {
    markup::find_elements(body, "td")
        .iter()
        .find_map(|td| led_by(td, label))
        .and_then(|rest| leading_int(&rest))
        .unwrap_or_default()
}

pub fn defense_value(body: &str, label: &str) -> String {
    markup::find_elements(body, "p")
        .iter()
        .find_map(|p| {
            let text = p.text();
            let (head, tail) = text.split_once(':')?;
            let digits = tail.trim();
            (head.trim().eq_ignore_ascii_case(label)
                && !digits.is_empty()
                && digits.chars().all(|c| c.is_ascii_digit()))
            .then(|| digits.to_string())
        })
        .unwrap_or_default()
}

/// Flattened remainder of an element whose leading bold text is `label`.
pub fn led_by(node: &Node, label: &str) -> Option<String> {
    let (found, rest) = node.lead_bold()?;
    label_matches(&found, label).then(|| flatten_text(rest))
}

pub fn leading_int(s: &str) -> Option<String> {
    LEADING_INT_RE.find(s.trim()).map(|m| m.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIEGE: &str = "<p>A huge arm.</p>\
        <p><b>Ammunition:</b> 1 boulder</p>\
        <p><b>Reload</b> 2 actions</p>\
        <p><b>HP:</b> 40 <em>(wood)</em></p>";

    #[test]
    fn inline_reads_up_to_next_tag() {
        let body = "<p><b>Base: </b>Plate</p><p><b>Range:</b> 30/60 ft<br />x</p>";
        assert_eq!(inline_value(body, "Base"), "Plate");
        assert_eq!(inline_value(body, "Range"), "30/60 ft");
        assert_eq!(inline_value(body, "APC"), "");
    }

    #[test]
    fn inline_skips_label_followed_by_markup() {
        let body = "<b>Hit:</b><em>x</em> <b>Hit:</b> 2d6 fire";
        assert_eq!(inline_value(body, "Hit"), "2d6 fire");
    }

    #[test]
    fn paragraph_with_and_without_colon() {
        assert_eq!(paragraph_value(SIEGE, "Ammunition"), "1 boulder");
        assert_eq!(paragraph_value(SIEGE, "reload"), "2 actions");
        assert_eq!(paragraph_value(SIEGE, "HP"), "40 (wood)");
        assert_eq!(paragraph_value(SIEGE, "AR"), "");
    }

    #[test]
    fn cell_stats() {
        let table = "<table><tr>\
            <td><b>STR<br /></b>-1</td>\
            <td><b>INT</b><p>2</p></td>\
            <td><b>CHA</b></td>\
            </tr></table>";
        assert_eq!(cell_value(table, "STR"), "-1");
        assert_eq!(cell_value(table, "INT"), "2");
        assert_eq!(cell_value(table, "CHA"), "");
        assert_eq!(cell_value(table, "DEX"), "");
    }

    #[test]
    fn defenses() {
        let body = "<td><p>Ref: 13</p><p>Fort:14</p><p>Will: high</p></td>";
        assert_eq!(defense_value(body, "Ref"), "13");
        assert_eq!(defense_value(body, "fort"), "14");
        assert_eq!(defense_value(body, "Will"), "");
    }

    #[test]
    fn table_driven_extraction_defaults_missing() {
        let table = [
            ("ammunition", Rule::Paragraph("Ammunition")),
            ("armor_rating", Rule::Paragraph("AR")),
        ];
        let mut fields = extract_fields(SIEGE, &table);
        assert_eq!(fields.take("ammunition"), "1 boulder");
        assert_eq!(fields.take("armor_rating"), "");
        assert_eq!(fields.take("not_in_table"), "");
    }
}
