use std::sync::LazyLock;

use regex::Regex;

static POSSESSIVE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"'S\b").unwrap());

/// Word capitalization as the chapter headings are written in caps:
/// the first letter after any non-letter is uppercased, the rest lowercased.
/// `BASILISK-EYE GOO` → `Basilisk-Eye Goo`, `ACIDWALKER'S` → `Acidwalker'S`.
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_cased = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if prev_cased {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_cased = true;
        } else {
            out.push(c);
            prev_cased = false;
        }
    }
    out
}

/// Store key for a raw heading: title case with possessives repaired
/// (`ACIDWALKER'S ARMOR` → `Acidwalker's Armor`).
pub fn display_name(heading: &str) -> String {
    POSSESSIVE_RE
        .replace_all(&title_case(heading.trim()), "'s")
        .into_owned()
}

/// The spelling an older run may have stored for `key` before the
/// possessive repair existed, mapped forward: `X'S Y` → `X's Y`,
/// `X'S` → `X's`.
pub fn repaired_possessive(key: &str) -> String {
    POSSESSIVE_RE.replace_all(key, "'s").into_owned()
}

/// Link target for a heading: each word capitalized, spaces as `%20`.
/// `AMULET OF THIRST` → `Amulet%20Of%20Thirst`.
pub fn slug(name: &str) -> String {
    name.split_whitespace()
        .map(capitalize)
        .collect::<Vec<_>>()
        .join("%20")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}
