const HEADER: &str = "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n  <meta charset=\"UTF-8\" />\n  <title></title>\n</head>\n<body>\n";
const FOOTER: &str = "\n</body>\n</html>\n";

/// JSON string escapes left in pasted exports.
const ESCAPES: &[(&str, &str)] = &[
    ("\\\"", "\""),
    ("\\n", "\n"),
    ("\\u2019", "'"),
    ("\\u00bd", "½"),
    ("\\u201c", "\""),
    ("\\u201d", "\""),
];

pub fn unescape(s: &str) -> String {
    ESCAPES
        .iter()
        .fold(s.to_string(), |acc, (from, to)| acc.replace(from, to))
}

/// Unescape an export and make it a complete HTML5 document.
pub fn wrap(raw: &str) -> String {
    let body = unescape(raw.trim());
    if body.starts_with("<!DOCTYPE") {
        if body.ends_with("</html>") {
            return format!("{body}\n");
        }
        return format!("{body}{FOOTER}");
    }
    format!("{HEADER}{body}{FOOTER}")
}
