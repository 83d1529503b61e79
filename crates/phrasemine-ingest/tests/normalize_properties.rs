use phrasemine_ingest::normalize;
use proptest::prelude::*;

proptest! {
    #[test]
    fn normalize_is_idempotent(s in ".{0,200}") {
        let once = normalize(&s);
        prop_assert_eq!(normalize(&once), once);
    }

    #[test]
    fn output_has_no_digits_newlines_or_double_spaces(s in "[a-zA-Z0-9 \n\t'.,;:!?-]{0,200}") {
        let out = normalize(&s);
        prop_assert!(!out.chars().any(|c| c.is_ascii_digit()), "digit in {:?}", out);
        prop_assert!(!out.contains('\n'));
        prop_assert!(!out.contains("  "), "double space in {:?}", out);
    }

    #[test]
    fn unicode_output_has_no_decimal_digits(s in "\\PC{0,100}") {
        let out = normalize(&s);
        prop_assert!(!out.chars().any(|c| c.is_numeric() && c.to_digit(10).is_some()));
        prop_assert!(!out.contains("  "));
    }

    #[test]
    fn output_is_lowercase(s in "[A-Za-z ]{0,100}") {
        let out = normalize(&s);
        prop_assert_eq!(out.clone(), out.to_lowercase());
    }
}
