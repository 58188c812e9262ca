//! String distance primitives.
//!
//! All functions operate on Unicode scalar values. Similarities are in
//! `[0.0, 1.0]`; distances are edit counts.

use crate::error::MatchError;

/// Default Winkler prefix scale.
pub const DEFAULT_PREFIX_SCALE: f64 = 0.1;
/// Largest prefix scale that keeps Jaro-Winkler within `[0, 1]`.
pub const MAX_PREFIX_SCALE: f64 = 0.25;
/// Number of leading characters considered for the prefix boost.
const MAX_PREFIX_LEN: usize = 4;

fn chars(s: &str, case_sensitive: bool) -> Vec<char> {
    if case_sensitive {
        s.chars().collect()
    } else {
        s.to_lowercase().chars().collect()
    }
}

/// Levenshtein distance with unit costs.
///
/// Uses two rolling rows sized by the shorter input.
pub fn edit_distance(a: &str, b: &str, case_sensitive: bool) -> usize {
    let a = chars(a, case_sensitive);
    let b = chars(b, case_sensitive);
    let (long, short) = if a.len() >= b.len() { (a, b) } else { (b, a) };

    if short.is_empty() {
        return long.len();
    }
    if long == short {
        return 0;
    }

    let mut previous: Vec<usize> = (0..=short.len()).collect();
    let mut current = vec![0usize; short.len() + 1];

    for (i, lc) in long.iter().enumerate() {
        current[0] = i + 1;
        for (j, sc) in short.iter().enumerate() {
            let substitution = previous[j] + usize::from(lc != sc);
            let deletion = previous[j + 1] + 1;
            let insertion = current[j] + 1;
            current[j + 1] = substitution.min(deletion).min(insertion);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[short.len()]
}

/// `1 - distance / max(len)`, case-insensitive.
pub fn edit_similarity(a: &str, b: &str) -> f64 {
    match (a.is_empty(), b.is_empty()) {
        (true, true) => return 1.0,
        (true, false) | (false, true) => return 0.0,
        _ => {}
    }
    let max_len = a
        .to_lowercase()
        .chars()
        .count()
        .max(b.to_lowercase().chars().count());
    let distance = edit_distance(a, b, false);
    1.0 - distance as f64 / max_len as f64
}

/// Jaro similarity, case-insensitive.
///
/// The match window is `max(len) / 2 - 1`, never less than 1.
pub fn jaro_similarity(a: &str, b: &str) -> f64 {
    match (a.is_empty(), b.is_empty()) {
        (true, true) => return 1.0,
        (true, false) | (false, true) => return 0.0,
        _ => {}
    }
    let a = chars(a, false);
    let b = chars(b, false);
    jaro(&a, &b)
}

fn jaro(a: &[char], b: &[char]) -> f64 {
    let window = (a.len().max(b.len()) / 2).saturating_sub(1).max(1);

    let mut a_matched = vec![false; a.len()];
    let mut b_matched = vec![false; b.len()];
    let mut matches = 0usize;

    for (i, ca) in a.iter().enumerate() {
        let start = i.saturating_sub(window);
        let end = (i + window + 1).min(b.len());
        for j in start..end {
            if !b_matched[j] && b[j] == *ca {
                a_matched[i] = true;
                b_matched[j] = true;
                matches += 1;
                break;
            }
        }
    }

    if matches == 0 {
        return 0.0;
    }

    let a_seq = a.iter().zip(&a_matched).filter(|(_, m)| **m).map(|(c, _)| c);
    let b_seq = b.iter().zip(&b_matched).filter(|(_, m)| **m).map(|(c, _)| c);
    let transpositions = a_seq.zip(b_seq).filter(|(x, y)| x != y).count();

    let m = matches as f64;
    let t = transpositions as f64 / 2.0;
    (m / a.len() as f64 + m / b.len() as f64 + (m - t) / m) / 3.0
}

/// Jaro-Winkler similarity with the default prefix scale.
pub fn prefix_weighted_similarity(a: &str, b: &str) -> f64 {
    jaro_winkler(a, b, DEFAULT_PREFIX_SCALE)
}

/// Jaro-Winkler similarity with a caller-supplied prefix scale.
///
/// The scale must lie in `[0, 0.25]`.
pub fn prefix_weighted_similarity_with_scale(
    a: &str,
    b: &str,
    prefix_scale: f64,
) -> Result<f64, MatchError> {
    if !(0.0..=MAX_PREFIX_SCALE).contains(&prefix_scale) {
        return Err(MatchError::InvalidPrefixScale(prefix_scale));
    }
    Ok(jaro_winkler(a, b, prefix_scale))
}

fn jaro_winkler(a: &str, b: &str, prefix_scale: f64) -> f64 {
    match (a.is_empty(), b.is_empty()) {
        (true, true) => return 1.0,
        (true, false) | (false, true) => return 0.0,
        _ => {}
    }
    let a = chars(a, false);
    let b = chars(b, false);
    if a == b {
        return 1.0;
    }

    let jaro = jaro(&a, &b);
    let prefix = a
        .iter()
        .zip(&b)
        .take(MAX_PREFIX_LEN)
        .take_while(|(x, y)| x == y)
        .count();
    let boosted = jaro + prefix as f64 * prefix_scale * (1.0 - jaro);
    boosted.min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_basics() {
        assert_eq!(edit_distance("", "abc", false), 3);
        assert_eq!(edit_distance("abc", "", true), 3);
        assert_eq!(edit_distance("kitten", "sitting", true), 3);
        assert_eq!(edit_distance("Voltage", "VOLTAGE", false), 0);
        assert_eq!(edit_distance("Voltage", "VOLTAGE", true), 6);
    }

    #[test]
    fn similarity_edges() {
        assert_eq!(edit_similarity("", ""), 1.0);
        assert_eq!(edit_similarity("", "x"), 0.0);
        assert!((edit_similarity("kitten", "sitting") - (1.0 - 3.0 / 7.0)).abs() < 1e-9);
    }

    #[test]
    fn jaro_winkler_known_values() {
        assert!((jaro_similarity("MARTHA", "MARHTA") - 0.944_444).abs() < 1e-5);
        assert!((prefix_weighted_similarity("MARTHA", "MARHTA") - 0.961_111).abs() < 1e-5);
        assert_eq!(prefix_weighted_similarity("Id", "ID"), 1.0);
        assert_eq!(prefix_weighted_similarity("", ""), 1.0);
        assert_eq!(prefix_weighted_similarity("a", ""), 0.0);
    }

    #[test]
    fn short_strings_use_a_window_of_one() {
        // With a zero window "ab" and "ba" would share no matches.
        assert!(jaro_similarity("ab", "ba") > 0.0);
    }

    #[test]
    fn prefix_scale_is_validated() {
        assert!(prefix_weighted_similarity_with_scale("a", "b", 0.3).is_err());
        assert!(prefix_weighted_similarity_with_scale("a", "b", f64::NAN).is_err());
        assert!(prefix_weighted_similarity_with_scale("a", "b", 0.0).is_ok());
    }
}
