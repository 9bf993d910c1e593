// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TypesError {
    #[error("invalid address: {0}")]
    InvalidAddress(String),
    #[error("invalid identifier: {0:?}")]
    InvalidIdentifier(String),
    #[error("invalid type tag: {0}")]
    InvalidTypeTag(String),
    #[error("invalid hash value: {0}")]
    InvalidHashValue(String),
}
