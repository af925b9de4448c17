//! Deterministic username derivation
//!
//! Output always matches `[a-z][a-z0-9._-]{0,21}`, whatever the input.

/// Maximum username length accepted by the host directory.
pub const MAX_LEN: usize = 22;

/// Prepended when the sanitized value is empty or starts with a non-letter.
const PREFIX: char = 'u';

/// Username for a first-time user, derived from the local part of `email`.
pub fn generate(email: &str) -> String {
    let local = email.split_once('@').map_or(email, |(local, _)| local);
    sanitize(local)
}

/// Normalize any candidate (e.g. a provider `preferred_username`) into a
/// valid username.
pub fn sanitize(candidate: &str) -> String {
    let mut name: String = candidate
        .chars()
        .flat_map(char::to_lowercase)
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '.' | '_' | '-'))
        .collect();

    if !name.starts_with(|c: char| c.is_ascii_lowercase()) {
        name.insert(0, PREFIX);
    }
    // ASCII only at this point, so byte truncation is a char boundary
    name.truncate(MAX_LEN);
    name
}

/// Sanitized preferred username, or the email-derived one when the
/// preferred value is absent or has no usable characters.
pub fn choose(preferred: Option<&str>, email: &str) -> String {
    preferred
        .filter(|p| has_usable_chars(p))
        .map(sanitize)
        .unwrap_or_else(|| generate(email))
}

fn has_usable_chars(candidate: &str) -> bool {
    candidate
        .chars()
        .flat_map(char::to_lowercase)
        .any(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '.' | '_' | '-'))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_valid(name: &str) -> bool {
        let mut chars = name.chars();
        matches!(chars.next(), Some(c) if c.is_ascii_lowercase())
            && name.len() <= MAX_LEN
            && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || ".-_".contains(c))
    }

    #[test]
    fn plus_addressed_mixed_case_email() {
        let name = generate("Jane.Doe+1@Example.com");
        assert_eq!(name, "jane.doe1");
        assert!(is_valid(&name));
    }

    #[test]
    fn leading_digit_gets_prefix() {
        assert_eq!(generate("42answers@example.com"), "u42answers");
    }

    #[test]
    fn leading_punctuation_gets_prefix() {
        assert_eq!(generate("_admin@example.com"), "u_admin");
    }

    #[test]
    fn empty_local_part_becomes_prefix() {
        assert_eq!(generate("@example.com"), "u");
        assert_eq!(generate(""), "u");
        assert_eq!(generate("+++@example.com"), "u");
    }

    #[test]
    fn missing_at_uses_whole_input() {
        assert_eq!(generate("Operator"), "operator");
    }

    #[test]
    fn long_local_part_is_truncated() {
        let name = generate("averyveryverylonglocalpartname@example.com");
        assert_eq!(name.len(), MAX_LEN);
        assert_eq!(name, "averyveryverylonglocal");
    }

    #[test]
    fn prefix_counts_toward_length() {
        let name = generate("1234567890123456789012345@example.com");
        assert_eq!(name.len(), MAX_LEN);
        assert!(name.starts_with('u'));
    }

    #[test]
    fn non_ascii_is_stripped() {
        assert_eq!(generate("Ünïcödé@example.com"), "ncd");
        assert_eq!(generate("日本@example.com"), "u");
    }

    #[test]
    fn generation_is_deterministic() {
        assert_eq!(generate("a.b@c.d"), generate("a.b@c.d"));
    }

    #[test]
    fn generated_names_are_always_valid() {
        let inputs = [
            "",
            "@",
            "@@@",
            "x",
            "Z@z",
            "..@x",
            "-leading.dash@x",
            "tab\tand space@x",
            "emoji😀user@example.com",
            "ÀÉÎÕÜ@example.com",
            "0000000000000000000000000000000@x",
            "a-b_c.d@x",
            "İstanbul@example.com",
        ];
        for input in inputs {
            let name = generate(input);
            assert!(is_valid(&name), "{input:?} produced invalid {name:?}");
        }
    }

    #[test]
    fn preferred_username_is_sanitized() {
        assert_eq!(choose(Some("J.Doe"), "jane@example.com"), "j.doe");
        assert_eq!(choose(Some("007"), "jane@example.com"), "u007");
    }

    #[test]
    fn unusable_preferred_username_falls_back_to_email() {
        assert_eq!(choose(Some("   "), "jane@example.com"), "jane");
        assert_eq!(choose(Some("!!!"), "jane@example.com"), "jane");
        assert_eq!(choose(None, "jane@example.com"), "jane");
    }
}
