//! Escaping for markup attributes and inline scripts.

use serde_json::Value;

/// Escapes text for use in HTML content or a quoted attribute.
#[must_use]
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for character in text.chars() {
        match character {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Renders `text` as a JavaScript string literal that is safe inside a
/// `<script>` element.
#[must_use]
pub fn escape_script(text: &str) -> String {
    script_safe(&Value::from(text).to_string())
}

/// Neutralises `</` so JSON embedded in a script cannot close the element.
pub(crate) fn script_safe(json: &str) -> String {
    json.replace("</", "<\\/")
}
