//! Property-based tests for locale normalization

use portal_realtime::shared::Locale;
use proptest::prelude::*;

proptest! {
    #[test]
    fn test_normalize_never_leaves_supported_set(candidate in ".*") {
        let locale = Locale::normalize(Some(&candidate), Locale::En);
        prop_assert!(matches!(locale, Locale::En | Locale::Is));
    }

    #[test]
    fn test_region_suffix_is_ignored(region in "[A-Za-z]{2}", sep in "[-_]") {
        let candidate = format!("is{}{}", sep, region);
        prop_assert_eq!(Locale::normalize(Some(&candidate), Locale::En), Locale::Is);
    }
}
