//! Address input normalization

/// Normalize raw address-bar input into a navigable URL.
///
/// Empty or whitespace-only input yields `None` (callers issue no
/// navigation). Input without an `http://` or `https://` scheme is
/// prefixed with `https://`; scheme-carrying input passes through
/// unchanged.
pub fn normalize(input: &str) -> Option<String> {
    let input = input.trim();

    if input.is_empty() {
        return None;
    }

    if input.starts_with("http://") || input.starts_with("https://") {
        Some(input.to_string())
    } else {
        Some(format!("https://{}", input))
    }
}
