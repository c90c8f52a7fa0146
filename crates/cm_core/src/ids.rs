//! crates/cm_core/src/ids.rs
//! Token ids for catalog entries plus the canonical output id.
//! Deterministic, ASCII-only, strict shapes; no I/O.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::CoreError;

const HEX64_LEN: usize = 64;
const TOKEN_MAX_LEN: usize = 64;

/// Lowercase hex (length must be exactly 64).
#[inline]
pub fn is_valid_sha256(s: &str) -> bool {
    s.len() == HEX64_LEN && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

/// Token for PartyId/DimensionId: ^[A-Za-z0-9_.:-]{1,64}$ (ASCII only)
#[inline]
pub fn is_valid_token(s: &str) -> bool {
    let len = s.len();
    if len == 0 || len > TOKEN_MAX_LEN {
        return false;
    }
    s.bytes().all(|b| {
        matches!(b,
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' |
            b'_' | b'.' | b':' | b'-'
        )
    })
}

macro_rules! def_token {
    ($(#[$m:meta])* $name:ident) => {
        $(#[$m])*
        #[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            #[inline] pub fn as_str(&self) -> &str { &self.0 }
        }

        impl fmt::Display for $name {
            #[inline]
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
        }

        impl FromStr for $name {
            type Err = CoreError;
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                if is_valid_token(s) { Ok(Self(s.to_string())) } else { Err(CoreError::InvalidToken(s.to_string())) }
            }
        }

        impl TryFrom<String> for $name {
            type Error = CoreError;
            fn try_from(s: String) -> Result<Self, Self::Error> {
                if is_valid_token(&s) { Ok(Self(s)) } else { Err(CoreError::InvalidToken(s)) }
            }
        }

        impl From<$name> for String {
            #[inline]
            fn from(v: $name) -> String { v.0 }
        }

        impl AsRef<str> for $name {
            #[inline]
            fn as_ref(&self) -> &str { &self.0 }
        }
    };
}

def_token!(
    /// Identifier of a political entity (e.g. `pvv`, `gl-pvda`).
    PartyId
);

def_token!(
    /// Name of one ideology dimension (e.g. `economic`, `european`).
    DimensionId
);

/// "RES:" + 64-hex (lowercase)
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ResultId(String);

impl ResultId {
    pub fn as_str(&self) -> &str { &self.0 }

    /// Build from a digest that is already known to be lowercase 64-hex.
    pub fn from_digest(hex64: &str) -> Result<Self, CoreError> {
        if is_valid_sha256(hex64) {
            Ok(Self(format!("RES:{hex64}")))
        } else {
            Err(CoreError::InvalidId(hex64.to_string()))
        }
    }

    /// The digest part without the `RES:` prefix.
    pub fn digest(&self) -> &str { &self.0[4..] }
}

impl fmt::Display for ResultId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ResultId {
    type Err = CoreError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rest = s.strip_prefix("RES:").ok_or_else(|| CoreError::InvalidId(s.to_string()))?;
        if is_valid_sha256(rest) { Ok(Self(s.to_string())) } else { Err(CoreError::InvalidId(s.to_string())) }
    }
}

impl TryFrom<String> for ResultId {
    type Error = CoreError;
    fn try_from(s: String) -> Result<Self, Self::Error> { s.parse() }
}

impl From<ResultId> for String {
    fn from(v: ResultId) -> String { v.0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_charset_and_length() {
        assert!("gl-pvda".parse::<PartyId>().is_ok());
        assert!("50PLUS".parse::<PartyId>().is_ok());
        assert!("".parse::<PartyId>().is_err());
        assert!("has space".parse::<PartyId>().is_err());
        assert!("x".repeat(65).parse::<DimensionId>().is_err());
    }

    #[test]
    fn result_id_shape() {
        let hex = "a".repeat(64);
        let id = ResultId::from_digest(&hex).unwrap();
        assert_eq!(id.as_str(), format!("RES:{hex}"));
        assert_eq!(id.digest(), hex);
        assert!("RES:ABC".parse::<ResultId>().is_err());
        assert!(ResultId::from_digest("A".repeat(64).as_str()).is_err());
    }

    #[test]
    fn party_id_serde_is_validated() {
        let ok: PartyId = serde_json::from_str("\"vvd\"").unwrap();
        assert_eq!(ok.as_str(), "vvd");
        assert!(serde_json::from_str::<PartyId>("\"v v d\"").is_err());
        assert_eq!(serde_json::to_string(&ok).unwrap(), "\"vvd\"");
    }
}
