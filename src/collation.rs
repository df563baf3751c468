// 🔤 Collation - Locale-aware ordering of display labels
// "Álvarez" and "alvarez" belong next to each other, before "Bravo".
//
// Ordering uses the Unicode root collation (CLDR) through ICU4X; search
// matching uses canonical decomposition so precomposed and decomposed
// input compare the same.

use icu_collator::options::CollatorOptions;
use icu_collator::{Collator, CollatorBorrowed, CollatorPreferences};
use icu_normalizer::DecomposingNormalizerBorrowed;
use std::cmp::Ordering;
use std::ops::RangeInclusive;
use tracing::warn;

/// Combining Diacritical Marks block, dropped after NFD for search
const COMBINING_MARKS: RangeInclusive<char> = '\u{0300}'..='\u{036F}';

thread_local! {
    static ROOT_COLLATOR: Option<CollatorBorrowed<'static>> = build_collator();
}

fn build_collator() -> Option<CollatorBorrowed<'static>> {
    match Collator::try_new(CollatorPreferences::default(), CollatorOptions::default()) {
        Ok(collator) => Some(collator),
        Err(err) => {
            warn!(error = ?err, "root collator unavailable, falling back to code point order");
            None
        }
    }
}

/// Compare two labels the way the picker displays them
///
/// Primary: root collation (base letter, then accents, then case with
/// lowercase first). Canonically equivalent labels fall back to the raw
/// string, so the order is total and never changes between refreshes.
pub fn compare_labels(a: &str, b: &str) -> Ordering {
    let collated = ROOT_COLLATOR.with(|collator| match collator {
        Some(collator) => collator.compare(a, b),
        None => Ordering::Equal,
    });
    collated.then_with(|| a.cmp(b))
}

/// Search form of a label: NFD, combining accents dropped, lowercased
pub fn search_key(text: &str) -> String {
    DecomposingNormalizerBorrowed::new_nfd()
        .normalize(text)
        .chars()
        .filter(|c| !COMBINING_MARKS.contains(c))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Case- and accent-insensitive substring test used by picker search
pub fn folded_contains(haystack: &str, needle: &str) -> bool {
    let needle = search_key(needle.trim());
    if needle.is_empty() {
        return true;
    }
    search_key(haystack).contains(&needle)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sorted<'a>(mut labels: Vec<&'a str>) -> Vec<&'a str> {
        labels.sort_by(|a, b| compare_labels(a, b));
        labels
    }

    #[test]
    fn test_alphabetical_order() {
        let labels = sorted(vec!["Zapata, Ana", "Alvarez, Ben"]);
        assert_eq!(labels, vec!["Alvarez, Ben", "Zapata, Ana"]);
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(compare_labels("bravo", "Charlie"), Ordering::Less);
        assert_eq!(compare_labels("Bravo", "alpha"), Ordering::Greater);
    }

    #[test]
    fn test_accent_insensitive() {
        assert_eq!(sorted(vec!["Bravo", "Álvarez", "Avila"]), vec!["Álvarez", "Avila", "Bravo"]);
    }

    #[test]
    fn test_enye_sorts_after_n() {
        assert_eq!(compare_labels("Muñoz", "Munoz"), Ordering::Greater);
        assert_eq!(compare_labels("Muñoz", "Muzo"), Ordering::Less);
    }

    #[test]
    fn test_decomposed_accent_sorts_with_base_letter() {
        assert_eq!(sorted(vec!["Josefa", "Jose\u{301}"]), vec!["Jose\u{301}", "Josefa"]);
    }

    #[test]
    fn test_letters_outside_latin_1() {
        assert_eq!(sorted(vec!["Zapata", "Łukasz"]), vec!["Łukasz", "Zapata"]);
        assert_eq!(sorted(vec!["Zapata", "Ørsted"]), vec!["Ørsted", "Zapata"]);
    }

    #[test]
    fn test_ties_are_deterministic() {
        assert_eq!(compare_labels("ana", "Ana"), Ordering::Less);
        assert_eq!(compare_labels("Ana", "Ana"), Ordering::Equal);
        assert_ne!(compare_labels("Jos\u{e9}", "Jose\u{301}"), Ordering::Equal);
    }

    #[test]
    fn test_folded_contains() {
        assert!(folded_contains("Pérez, José", "jose"));
        assert!(folded_contains("Pérez, José", "  PER "));
        assert!(folded_contains("anything", ""));
        assert!(!folded_contains("Pérez, José", "juan"));
    }

    #[test]
    fn test_search_matches_decomposed_input() {
        assert!(folded_contains("Pérez, Jose\u{301}", "jose"));
        assert!(folded_contains("Pérez, José", "Jose\u{301}"));
        assert_eq!(search_key("MUÑOZ"), "munoz");
    }
}
