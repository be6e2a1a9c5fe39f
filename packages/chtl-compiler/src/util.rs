//! Small shared helpers used across the pipeline stages.

/// Escape characters with special meaning in regular expressions. Used when
/// a selector or literal string has to be embedded in a generated `Regex`
/// pattern (e.g. building the combinator regex for `&` resolution).
pub fn escape_regex(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for ch in s.chars() {
        if matches!(
            ch,
            '.' | '*' | '+' | '?' | '^' | '=' | '!' | ':' | '$' | '{' | '}' | '(' | ')' | '|'
                | '[' | ']' | '/' | '\\'
        ) {
            result.push('\\');
        }
        result.push(ch);
    }
    result
}

/// UTF-8 encode a string into raw bytes, used by the source map base64
/// writer (spec §6.6).
pub fn utf8_encode(s: &str) -> Vec<u8> {
    s.as_bytes().to_vec()
}

/// `true` if every char is whitespace (including the empty string).
pub fn is_blank(s: &str) -> bool {
    s.chars().all(char::is_whitespace)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_regex_metacharacters() {
        assert_eq!(escape_regex("a.b*c"), r"a\.b\*c");
    }

    #[test]
    fn blank_detects_whitespace_only() {
        assert!(is_blank("   \t\n"));
        assert!(!is_blank(" x "));
    }
}
