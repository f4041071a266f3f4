use rand::{distr::Alphanumeric, Rng};

/// Length of public document slugs
pub const SLUG_LENGTH: usize = 7;

/// How many fresh slugs to try before giving up on an insert
pub const MAX_SLUG_ATTEMPTS: u32 = 5;

/// Random `[A-Za-z0-9]` slug from the thread-local CSPRNG
pub fn generate_slug() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(SLUG_LENGTH)
        .map(char::from)
        .collect()
}

/// Cheap shape check before a slug reaches the database
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty() && slug.len() <= 64 && slug.chars().all(|c| c.is_ascii_alphanumeric())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn slugs_are_alphanumeric_and_fixed_length() {
        for _ in 0..100 {
            let slug = generate_slug();
            assert_eq!(slug.len(), SLUG_LENGTH);
            assert!(is_valid_slug(&slug), "bad slug {}", slug);
        }
    }

    #[test]
    fn slugs_do_not_repeat_in_practice() {
        let slugs: HashSet<String> = (0..1000).map(|_| generate_slug()).collect();
        assert_eq!(slugs.len(), 1000);
    }

    #[test]
    fn rejects_odd_slugs() {
        assert!(!is_valid_slug(""));
        assert!(!is_valid_slug("abc-def"));
        assert!(!is_valid_slug("../etc"));
        assert!(!is_valid_slug(&"a".repeat(65)));
        assert!(is_valid_slug("FDfa931"));
    }
}
