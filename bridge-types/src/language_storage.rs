// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::base_types::StarcoinAddress;
use crate::error::TypesError;
use crate::identifier::Identifier;

/// Move runtime type tags.
///
/// The variant order is the chain's canonical one; changing it would change
/// every BCS encoding that embeds a tag.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TypeTag {
    Bool,
    U8,
    U64,
    U128,
    Address,
    Signer,
    Vector(Box<TypeTag>),
    Struct(StructTag),
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StructTag {
    pub address: StarcoinAddress,
    pub module: Identifier,
    pub name: Identifier,
    pub type_params: Vec<TypeTag>,
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ModuleId {
    pub address: StarcoinAddress,
    pub name: Identifier,
}

impl ModuleId {
    pub fn new(address: StarcoinAddress, name: Identifier) -> Self {
        Self { address, name }
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.address, self.name)
    }
}

impl fmt::Display for StructTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}::{}", self.address, self.module, self.name)?;
        if let Some((first, rest)) = self.type_params.split_first() {
            write!(f, "<{first}")?;
            for t in rest {
                write!(f, ", {t}")?;
            }
            write!(f, ">")?;
        }
        Ok(())
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeTag::Bool => write!(f, "bool"),
            TypeTag::U8 => write!(f, "u8"),
            TypeTag::U64 => write!(f, "u64"),
            TypeTag::U128 => write!(f, "u128"),
            TypeTag::Address => write!(f, "address"),
            TypeTag::Signer => write!(f, "signer"),
            TypeTag::Vector(inner) => write!(f, "vector<{inner}>"),
            TypeTag::Struct(tag) => write!(f, "{tag}"),
        }
    }
}

/// Parse a type tag string: `u8`, `vector<u64>`, `0x1::STC::STC`,
/// `0x1::Token::Token<0x1::STC::STC>`.
pub fn parse_type_tag(s: &str) -> Result<TypeTag, TypesError> {
    let s = s.trim();
    match s {
        "bool" => return Ok(TypeTag::Bool),
        "u8" => return Ok(TypeTag::U8),
        "u64" => return Ok(TypeTag::U64),
        "u128" => return Ok(TypeTag::U128),
        "address" => return Ok(TypeTag::Address),
        "signer" => return Ok(TypeTag::Signer),
        _ => {}
    }
    if let Some(inner) = s.strip_prefix("vector<").and_then(|r| r.strip_suffix('>')) {
        return Ok(TypeTag::Vector(Box::new(parse_type_tag(inner)?)));
    }
    Ok(TypeTag::Struct(parse_struct_tag(s)?))
}

/// Parse `0xADDR::Module::Name` with optional `<...>` type parameters.
pub fn parse_struct_tag(s: &str) -> Result<StructTag, TypesError> {
    let s = s.trim();
    let (base, generics) = match s.find('<') {
        Some(open) => {
            let inner = s[open..]
                .strip_prefix('<')
                .and_then(|r| r.strip_suffix('>'))
                .ok_or_else(|| TypesError::InvalidTypeTag(s.to_string()))?;
            (&s[..open], Some(inner))
        }
        None => (s, None),
    };

    let mut parts = base.split("::");
    let address = parts
        .next()
        .ok_or_else(|| TypesError::InvalidTypeTag(s.to_string()))
        .and_then(StarcoinAddress::from_hex_literal)?;
    let module = parts
        .next()
        .ok_or_else(|| TypesError::InvalidTypeTag(s.to_string()))
        .and_then(Identifier::new)?;
    let name = parts
        .next()
        .ok_or_else(|| TypesError::InvalidTypeTag(s.to_string()))
        .and_then(Identifier::new)?;
    if parts.next().is_some() {
        return Err(TypesError::InvalidTypeTag(s.to_string()));
    }

    let type_params = match generics {
        None => vec![],
        Some(inner) => split_top_level(inner)
            .into_iter()
            .map(parse_type_tag)
            .collect::<Result<_, _>>()?,
    };

    Ok(StructTag {
        address,
        module,
        name,
        type_params,
    })
}

// Split on commas that are not nested inside `<...>`.
fn split_top_level(s: &str) -> Vec<&str> {
    let mut parts = vec![];
    let mut depth = 0usize;
    let mut start = 0usize;
    for (i, c) in s.char_indices() {
        match c {
            '<' => depth += 1,
            '>' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(&s[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&s[start..]);
    parts
}

impl From<StructTag> for TypeTag {
    fn from(tag: StructTag) -> Self {
        TypeTag::Struct(tag)
    }
}

impl FromStr for StructTag {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_struct_tag(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitive_tags_parse() {
        assert_eq!(parse_type_tag("u8").unwrap(), TypeTag::U8);
        assert_eq!(
            parse_type_tag("vector<u8>").unwrap(),
            TypeTag::Vector(Box::new(TypeTag::U8))
        );
    }

    #[test]
    fn struct_tag_round_trip() {
        let tag = parse_struct_tag("0x1::STC::STC").unwrap();
        assert_eq!(tag.module.as_str(), "STC");
        assert_eq!(
            tag.to_string(),
            "0x00000000000000000000000000000001::STC::STC"
        );
        let back = parse_struct_tag(&tag.to_string()).unwrap();
        assert_eq!(back, tag);
    }

    #[test]
    fn nested_generics_parse() {
        let tag =
            parse_struct_tag("0x1::Token::Token<0x1::Pair::Pair<0x1::STC::STC, u64>, bool>")
                .unwrap();
        assert_eq!(tag.type_params.len(), 2);
        let TypeTag::Struct(inner) = &tag.type_params[0] else {
            panic!("expected struct param");
        };
        assert_eq!(inner.module.as_str(), "Pair");
        assert_eq!(inner.type_params.len(), 2);
    }

    #[test]
    fn malformed_tags_rejected() {
        assert!(parse_struct_tag("0x1::STC").is_err());
        assert!(parse_struct_tag("STC::STC::STC").is_err());
        assert!(parse_struct_tag("0x1::STC::STC<").is_err());
        assert!(parse_struct_tag("0x1::STC::STC::extra").is_err());
    }

    #[test]
    fn bcs_variant_order_is_canonical() {
        // u8 is variant 1, vector is 6; a shifted enum would break every
        // script-function argument on chain.
        assert_eq!(bcs::to_bytes(&TypeTag::Bool).unwrap(), vec![0]);
        assert_eq!(bcs::to_bytes(&TypeTag::U8).unwrap(), vec![1]);
        assert_eq!(bcs::to_bytes(&TypeTag::Address).unwrap(), vec![4]);
        assert_eq!(
            bcs::to_bytes(&TypeTag::Vector(Box::new(TypeTag::U8))).unwrap(),
            vec![6, 1]
        );
    }
}
