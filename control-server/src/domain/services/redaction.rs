const VISIBLE_CHARS: usize = 8;

/// Shorten a trigger payload for logs and responses: the first eight
/// characters followed by `...`.
pub fn redact(payload: &str) -> String {
    let visible: String = payload.chars().take(VISIBLE_CHARS).collect();
    format!("{}...", visible)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_long_payload_is_truncated() {
        assert_eq!(redact("abcdefghijklmnop"), "abcdefgh...");
    }

    #[test]
    fn test_short_payload_keeps_suffix() {
        assert_eq!(redact("abc"), "abc...");
    }

    #[test]
    fn test_multibyte_payload() {
        assert_eq!(redact("ääääääääää"), "ääääääää...");
    }
}
