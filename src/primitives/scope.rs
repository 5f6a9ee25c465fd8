//! The scope-token set and its comparison.
use std::{cmp, fmt, str};

use std::collections::BTreeSet;

use crate::validator;

/// A set of scope-tokens encoded with separation by spaces.
///
/// Scopes are partially ordered by inclusion, `a <= b` when every token of `a` is also in `b`.
#[derive(PartialEq, Eq, Clone, Debug, Default)]
pub struct Scope {
    tokens: BTreeSet<String>,
}

impl Scope {
    /// Determines if this scope is covered by the scope on the right side. This operation is
    /// equivalent to comparision via `<=`.
    pub fn privileged_to(&self, rhs: &Scope) -> bool {
        self.tokens.is_subset(&rhs.tokens)
    }

    /// Iterate over the individual scope-tokens.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tokens.iter().map(String::as_str)
    }
}

/// Error returned from parsing a scope as encoded in a request.
#[derive(Debug, PartialEq, Eq)]
pub struct ParseScopeErr;

impl str::FromStr for Scope {
    type Err = ParseScopeErr;

    fn from_str(string: &str) -> Result<Scope, ParseScopeErr> {
        if !string.is_empty() && !validator::nqschar(string) {
            return Err(ParseScopeErr);
        }
        let tokens = string.split(' ').filter(|s| !s.is_empty());
        Ok(Scope {
            tokens: tokens.map(str::to_string).collect(),
        })
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        let output = self.iter().collect::<Vec<_>>().join(" ");
        fmt.write_str(&output)
    }
}

impl cmp::PartialOrd for Scope {
    fn partial_cmp(&self, rhs: &Self) -> Option<cmp::Ordering> {
        let intersect_count = self.tokens.intersection(&rhs.tokens).count();
        if intersect_count == self.tokens.len() && intersect_count == rhs.tokens.len() {
            Some(cmp::Ordering::Equal)
        } else if intersect_count == self.tokens.len() {
            Some(cmp::Ordering::Less)
        } else if intersect_count == rhs.tokens.len() {
            Some(cmp::Ordering::Greater)
        } else {
            None
        }
    }
}
