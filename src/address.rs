/// Structural validation of an email address: a non-empty domain must
/// follow the last `@`. Accepts both a bare `local@domain` and the
/// directory display form `Name <local@domain>`. No DNS or deliverability
/// checks are performed.
pub fn is_valid(address: &str) -> bool {
    let candidate = address.trim();
    let candidate = match (candidate.rfind('<'), candidate.ends_with('>')) {
        (Some(start), true) => &candidate[start + 1..candidate.len() - 1],
        _ => candidate,
    };

    match candidate.rsplit_once('@') {
        Some((_, domain)) => !domain.is_empty(),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_address_is_valid() {
        assert!(is_valid("user@domain.com"));
    }

    #[test]
    fn missing_at_sign_is_invalid() {
        assert!(!is_valid("user.domain.com"));
        assert!(!is_valid(""));
        assert!(!is_valid("just some words"));
    }

    #[test]
    fn empty_domain_is_invalid() {
        assert!(!is_valid("user@"));
    }

    #[test]
    fn display_form_is_unwrapped() {
        assert!(is_valid("Jane Doe <jane@example.org>"));
        assert!(!is_valid("Jane Doe <jane@>"));
    }

    #[test]
    fn surrounding_whitespace_is_ignored() {
        assert!(is_valid("  user@domain.com  "));
    }
}
