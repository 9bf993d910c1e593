// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypesError;

/// A Move identifier: module and function names, struct names.
///
/// Validated on construction, so downstream code can embed it in function ids
/// and type tags without re-checking.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Identifier(Box<str>);

/// First char must be a letter or `_`, the rest alphanumeric or `_`.
/// A lone `_` is reserved and rejected.
pub fn is_valid_identifier(s: &str) -> bool {
    if s == "_" {
        return false;
    }
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c == '_' || c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
}

impl Identifier {
    pub fn new(s: impl Into<Box<str>>) -> Result<Self, TypesError> {
        let s = s.into();
        if is_valid_identifier(&s) {
            Ok(Self(s))
        } else {
            Err(TypesError::InvalidIdentifier(s.into_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Identifier {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}
