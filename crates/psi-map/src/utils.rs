//! Utility functions for mapping operations.

/// Collapses a header to its comparable core: lowercase, with spaces,
/// underscores and hyphens removed. "LV Breakers" and "LVBreakers" normalize
/// to the same value.
pub fn normalize_identifier(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
        .flat_map(char::to_lowercase)
        .collect()
}

/// Case-insensitive key used for exact header comparisons.
pub fn header_key(raw: &str) -> String {
    raw.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_separators_and_case() {
        assert_eq!(normalize_identifier("LV Breakers"), "lvbreakers");
        assert_eq!(normalize_identifier("LVBreakers"), "lvbreakers");
        assert_eq!(normalize_identifier("Trip_Unit-Type"), "tripunittype");
    }

    #[test]
    fn header_key_ignores_case_and_padding() {
        assert_eq!(header_key("  BusName "), header_key("busname"));
    }
}
