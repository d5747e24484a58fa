//! Property test strategies for form input.

use proptest::prelude::*;

pub use proptest;

/// Strings of exactly `len` characters, including multi-byte ones.
pub fn arb_text(len: std::ops::Range<usize>) -> impl Strategy<Value = String> {
    prop::collection::vec(prop::char::range('a', 'z').prop_union(prop::char::range('á', 'ú')), len)
        .prop_map(|chars| chars.into_iter().collect())
}

/// Emails the sign-up pattern accepts.
pub fn arb_valid_email() -> impl Strategy<Value = String> {
    ("[a-z]{1,12}", "[a-z]{1,12}", "[a-z]{2,6}").prop_map(|(user, host, tld)| format!("{user}@{host}.{tld}"))
}

/// Comma separated tags with random padding and empty segments.
pub fn arb_raw_tags() -> impl Strategy<Value = String> {
    prop::collection::vec(("[ ]{0,2}", "[a-z]{0,6}", "[ ]{0,2}"), 0..6).prop_map(|parts| {
        parts
            .into_iter()
            .map(|(l, t, r)| format!("{l}{t}{r}"))
            .collect::<Vec<_>>()
            .join(",")
    })
}
