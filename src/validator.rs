//! Character classes of [rfc6749 appendix A] used to check client supplied fields.
//!
//! Each predicate answers whether a present value conforms to its grammar. Absence of a value is
//! decided by the caller, the predicates never accept an empty string.
//!
//! [rfc6749 appendix A]: https://tools.ietf.org/html/rfc6749#appendix-A
use url::Url;

/// `NCHAR`, the characters of `response_type` and `grant_type` names.
pub fn nchar(value: &str) -> bool {
    !value.is_empty()
        && value
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '-' | '.' | '_' | '~'))
}

/// `NQCHAR`, a single scope token.
pub fn nqchar(value: &str) -> bool {
    !value.is_empty() && value.chars().all(is_nqchar)
}

/// `NQSCHAR`, a space separated list of scope tokens.
pub fn nqschar(value: &str) -> bool {
    !value.is_empty() && value.chars().all(|ch| ch == ' ' || is_nqchar(ch))
}

/// `VSCHAR`, visible ascii including the space, e.g. `client_id` and `state`.
pub fn vschar(value: &str) -> bool {
    !value.is_empty() && value.chars().all(|ch| ('\x20'..='\x7e').contains(&ch))
}

/// `UNICODECHARNOCRLF`, used for resource owner credentials.
pub fn uchar(value: &str) -> bool {
    !value.is_empty()
        && value.chars().all(|ch| match ch {
            '\t' => true,
            '\x20'..='\x7e' => true,
            '\u{80}'..='\u{d7ff}' => true,
            '\u{e000}'..='\u{fffd}' => true,
            '\u{10000}'..='\u{10ffff}' => true,
            _ => false,
        })
}

/// An absolute uri with a scheme.
pub fn uri(value: &str) -> bool {
    let mut chars = value.chars();
    let scheme_start = chars.next().map_or(false, |ch| ch.is_ascii_alphabetic());
    scheme_start && Url::parse(value).is_ok()
}

fn is_nqchar(ch: char) -> bool {
    match ch {
        '\x21' => true,
        '\x23'..='\x5b' => true,
        '\x5d'..='\x7e' => true,
        _ => false,
    }
}
