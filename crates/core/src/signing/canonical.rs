//! Canonical request string
//!
//! Layout, reproduced byte-for-byte because the server recomputes it:
//!
//! ```text
//! <METHOD> <path>\n
//! <"Key: Value" lines, ordinal sort, joined by \n>\n
//! \n
//! <body or empty>
//! ```
//!
//! The sort is over the formatted `"Key: Value"` strings, not over header
//! names alone, and it is case-sensitive.

/// Build the canonical string that gets signed for a request.
pub fn build_canonical_string<I, K, V>(
    method: &str,
    path: &str,
    headers: I,
    body: Option<&str>,
) -> String
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut lines: Vec<String> = headers
        .into_iter()
        .map(|(name, value)| format!("{}: {}", name.as_ref(), value.as_ref()))
        .collect();
    lines.sort_unstable();

    format!("{} {}\n{}\n\n{}", method.to_uppercase(), path, lines.join("\n"), body.unwrap_or(""))
}
