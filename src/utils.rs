//! Small string helpers shared across the engine.

/// Truncate a string for logging purposes.
///
/// Long strings are truncated to `max` bytes with an ellipsis and a
/// byte-count indicator appended, keeping log lines bounded when a
/// collaborator returns a large malformed response.
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    // Back the cut off to a char boundary; slicing mid-character panics.
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
}

/// Capitalize the first character of a string.
///
/// Used to turn a registered-domain label into a company name
/// (e.g., "sysdig" -> "Sysdig").
pub fn upcase(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_for_log_short_string() {
        assert_eq!(truncate_for_log("Hello, world!", 100), "Hello, world!");
    }

    #[test]
    fn test_truncate_for_log_long_string() {
        let s = "a".repeat(500);
        let result = truncate_for_log(&s, 100);
        assert!(result.starts_with(&"a".repeat(100)));
        assert!(result.contains("…(+400 bytes)"));
    }

    #[test]
    fn test_truncate_for_log_multibyte_boundary() {
        // Byte 300 lands inside a '€' (3 bytes each after the ASCII run-up).
        let s = format!("{}{}", "a".repeat(298), "€".repeat(5));
        let result = truncate_for_log(&s, 300);
        assert!(result.starts_with(&"a".repeat(298)));
        assert!(result.contains("bytes)"));

        // Fully multibyte input, tiny limit.
        let s = "€€€€";
        assert_eq!(truncate_for_log(s, 1), format!("…(+{} bytes)", s.len()));
    }

    #[test]
    fn test_upcase() {
        assert_eq!(upcase("sysdig"), "Sysdig");
        assert_eq!(upcase(""), "");
        assert_eq!(upcase("a"), "A");
    }
}
