//! Property tests for schema validation and tag parsing.

use proptest::prelude::*;
use snapgram_core::{parse_tags, validate, Credentials, PostFields, POST, SIGN_IN};
use snapgram_testkit::strategies::{arb_raw_tags, arb_text, arb_valid_email};

proptest! {
    #[test]
    fn caption_length_is_counted_in_characters(caption in arb_text(0..40)) {
        let fields = PostFields {
            caption: caption.clone(),
            location: "Lima".into(),
            ..PostFields::default()
        };
        let result = validate(&POST, fields);
        let chars = caption.chars().count();
        prop_assert_eq!(result.is_ok(), chars >= 5);
    }

    #[test]
    fn location_bounds_are_inclusive(location in arb_text(0..120)) {
        let fields = PostFields {
            caption: "Un texto válido".into(),
            location: location.clone(),
            ..PostFields::default()
        };
        let len = location.chars().count();
        prop_assert_eq!(validate(&POST, fields).is_ok(), (2..=100).contains(&len));
    }

    #[test]
    fn well_formed_credentials_pass(email in arb_valid_email(), password in arb_text(8..30)) {
        prop_assert!(validate(&SIGN_IN, Credentials::new(email, password)).is_ok());
    }

    #[test]
    fn short_passwords_fail(email in arb_valid_email(), password in arb_text(0..8)) {
        let errors = validate(&SIGN_IN, Credentials::new(email, password)).unwrap_err();
        prop_assert_eq!(errors.len(), 1);
        prop_assert!(errors.for_field("password").is_some());
    }

    #[test]
    fn parsed_tags_are_trimmed_and_non_empty(raw in arb_raw_tags()) {
        for tag in parse_tags(&raw) {
            prop_assert!(!tag.is_empty());
            prop_assert_eq!(tag.trim(), tag.as_str());
        }
    }
}
