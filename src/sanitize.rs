//! HTML-escaping sanitization for free-text fields.
//!
//! Escapes the five HTML-significant characters before a submission is
//! handed to the delivery sink or logged. Runs exactly once, on the final
//! value: validation must see the raw input so length and character-class
//! checks stay exact, and repeated application is not guaranteed lossless.

/// Escape `<`, `>`, `"`, `'` and `/` to their entity equivalents.
pub fn sanitize(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            '/' => out.push_str("&#x2F;"),
            _ => out.push(c),
        }
    }
    out
}
