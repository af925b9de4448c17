//! Profile fields derived from identity claims

use identity::IdentityClaims;

/// Display name, else `given family` when both are present, else `None`.
/// Blank claims count as absent.
pub fn full_name(claims: &IdentityClaims) -> Option<String> {
    if let Some(name) = non_blank(claims.display_name.as_deref()) {
        return Some(name.to_owned());
    }
    match (
        non_blank(claims.given_name.as_deref()),
        non_blank(claims.family_name.as_deref()),
    ) {
        (Some(given), Some(family)) => Some(format!("{given} {family}")),
        _ => None,
    }
}

pub fn position(claims: &IdentityClaims) -> Option<String> {
    non_blank(claims.position.as_deref()).map(str::to_owned)
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(name: Option<&str>, given: Option<&str>, family: Option<&str>) -> IdentityClaims {
        IdentityClaims {
            email: "jane@example.com".into(),
            display_name: name.map(Into::into),
            given_name: given.map(Into::into),
            family_name: family.map(Into::into),
            preferred_username: None,
            position: None,
        }
    }

    #[test]
    fn display_name_wins() {
        let c = claims(Some("Dr. Jane Doe"), Some("Jane"), Some("Doe"));
        assert_eq!(full_name(&c).as_deref(), Some("Dr. Jane Doe"));
    }

    #[test]
    fn given_and_family_are_joined() {
        let c = claims(None, Some("Jane"), Some("Doe"));
        assert_eq!(full_name(&c).as_deref(), Some("Jane Doe"));
    }

    #[test]
    fn one_name_part_is_not_enough() {
        assert_eq!(full_name(&claims(None, Some("Jane"), None)), None);
        assert_eq!(full_name(&claims(None, None, Some("Doe"))), None);
        assert_eq!(full_name(&claims(None, None, None)), None);
    }

    #[test]
    fn blank_display_name_falls_through() {
        let c = claims(Some("  "), Some("Jane"), Some("Doe"));
        assert_eq!(full_name(&c).as_deref(), Some("Jane Doe"));
    }

    #[test]
    fn position_is_trimmed() {
        let mut c = claims(None, None, None);
        c.position = Some(" Engineer ".into());
        assert_eq!(position(&c).as_deref(), Some("Engineer"));
        c.position = Some("".into());
        assert_eq!(position(&c), None);
    }
}
