//! Single-line quoting of decoded text

/// Quotes text as a JSON string literal
///
/// Quotes, backslashes and control characters are escaped so the result is always one line.
pub fn quote_str(source: &str) -> String {
    serde_json::Value::String(source.to_owned()).to_string()
}

/// Escapes arbitrary bytes as printable ASCII
pub fn escape_bytes(bytes: &[u8]) -> String {
    bytes
        .iter()
        .flat_map(|byte| std::ascii::escape_default(*byte))
        .map(char::from)
        .collect()
}
