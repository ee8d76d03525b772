//! HTML escaping for string fields decoded with the `escape` option.

/// Escapes the five HTML-significant characters.
///
/// Quotes use numeric references: `"` becomes `&#34;`, `'` becomes `&#39;`.
pub fn html_escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&#34;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}
