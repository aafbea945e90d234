//! Identity primitives: module/user addresses, dispatch selectors,
//! jurisdiction tags, and registry categories.
//!
//! All three byte types parse from and render to `0x`-prefixed hex (the
//! jurisdiction tag additionally accepts a short ASCII code such as `"US"`)
//! and serialize as strings, so config files and JSON bodies stay readable.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Result, VerityError};

/// Width of an address in bytes.
pub const ADDRESS_LEN: usize = 20;
/// Width of a dispatch selector in bytes.
pub const SELECTOR_LEN: usize = 4;
/// Width of a jurisdiction tag in bytes.
pub const JURISDICTION_LEN: usize = 32;

fn strip_hex_prefix(s: &str) -> &str {
    s.strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s)
}

fn decode_fixed<const N: usize>(s: &str, what: &str) -> Result<[u8; N]> {
    let digits = strip_hex_prefix(s.trim());
    if digits.len() != N * 2 {
        return Err(VerityError::BadRequest(format!(
            "invalid {what}: {s} (expected {} hex digits)",
            N * 2
        )));
    }
    let mut out = [0u8; N];
    hex::decode_to_slice(digits, &mut out)
        .map_err(|e| VerityError::BadRequest(format!("invalid {what}: {s} ({e})")))?;
    Ok(out)
}

/// Externally-addressable identity (module or user).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Address([u8; ADDRESS_LEN]);

impl Address {
    /// The null identity.
    pub const ZERO: Address = Address([0u8; ADDRESS_LEN]);

    pub const fn new(bytes: [u8; ADDRESS_LEN]) -> Self {
        Self(bytes)
    }

    /// Address whose last byte is `n` and all others zero. Handy for fixtures.
    pub const fn from_low_u8(n: u8) -> Self {
        let mut bytes = [0u8; ADDRESS_LEN];
        bytes[ADDRESS_LEN - 1] = n;
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; ADDRESS_LEN] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; ADDRESS_LEN]
    }
}

impl FromStr for Address {
    type Err = VerityError;

    fn from_str(s: &str) -> Result<Self> {
        decode_fixed::<ADDRESS_LEN>(s, "address").map(Self)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({self})")
    }
}

/// Names which predicate to invoke on a module (4-byte function selector).
///
/// The all-zero selector is reserved for "absent" and is never accepted by
/// the registry.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Selector([u8; SELECTOR_LEN]);

impl Selector {
    /// Reserved "absent" value.
    pub const ZERO: Selector = Selector([0u8; SELECTOR_LEN]);

    /// `isCompliant(address)`
    pub const IS_COMPLIANT: Selector = Selector([0xa2, 0x00, 0xe5, 0xd0]);

    /// `isCompliant(address,bytes32)`
    pub const IS_COMPLIANT_IN_JURISDICTION: Selector = Selector([0xda, 0x70, 0x4e, 0xd6]);

    pub const fn new(bytes: [u8; SELECTOR_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; SELECTOR_LEN] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; SELECTOR_LEN]
    }
}

impl FromStr for Selector {
    type Err = VerityError;

    fn from_str(s: &str) -> Result<Self> {
        decode_fixed::<SELECTOR_LEN>(s, "selector").map(Self)
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Selector({self})")
    }
}

/// Opaque fixed-width jurisdiction tag.
///
/// Short codes are stored left-aligned and zero-padded, the way a `bytes32`
/// string literal is laid out, so `"US"` becomes `0x5553000...`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Jurisdiction([u8; JURISDICTION_LEN]);

impl Jurisdiction {
    pub const fn new(bytes: [u8; JURISDICTION_LEN]) -> Self {
        Self(bytes)
    }

    /// Build a tag from a short printable ASCII code (1..=32 bytes).
    pub fn from_code(code: &str) -> Result<Self> {
        let raw = code.as_bytes();
        if raw.is_empty() || raw.len() > JURISDICTION_LEN {
            return Err(VerityError::BadRequest(format!(
                "invalid jurisdiction code: {code:?} (expected 1..={JURISDICTION_LEN} bytes)"
            )));
        }
        if !raw.iter().all(|b| b.is_ascii_graphic()) {
            return Err(VerityError::BadRequest(format!(
                "invalid jurisdiction code: {code:?} (printable ascii only)"
            )));
        }
        let mut out = [0u8; JURISDICTION_LEN];
        out[..raw.len()].copy_from_slice(raw);
        Ok(Self(out))
    }

    pub fn as_bytes(&self) -> &[u8; JURISDICTION_LEN] {
        &self.0
    }

    /// The ASCII code if the tag is a left-aligned printable code.
    pub fn code(&self) -> Option<&str> {
        let end = self.0.iter().position(|b| *b == 0).unwrap_or(JURISDICTION_LEN);
        if end == 0 || self.0[end..].iter().any(|b| *b != 0) {
            return None;
        }
        let head = &self.0[..end];
        if !head.iter().all(|b| b.is_ascii_graphic()) {
            return None;
        }
        std::str::from_utf8(head).ok()
    }
}

impl FromStr for Jurisdiction {
    type Err = VerityError;

    fn from_str(s: &str) -> Result<Self> {
        let t = s.trim();
        if (t.starts_with("0x") || t.starts_with("0X")) && t.len() == 2 + JURISDICTION_LEN * 2 {
            return decode_fixed::<JURISDICTION_LEN>(t, "jurisdiction").map(Self);
        }
        Self::from_code(t)
    }
}

impl fmt::Display for Jurisdiction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code() {
            Some(code) => f.write_str(code),
            None => write!(f, "0x{}", hex::encode(self.0)),
        }
    }
}

impl fmt::Debug for Jurisdiction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Jurisdiction({self})")
    }
}

macro_rules! serde_via_str {
    ($($ty:ty),+) => {$(
        impl Serialize for $ty {
            fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                raw.parse().map_err(serde::de::Error::custom)
            }
        }
    )+};
}

serde_via_str!(Address, Selector, Jurisdiction);

/// The two independent module collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Predicate over `(user)`.
    General,
    /// Predicate over `(user, jurisdiction)`.
    #[serde(rename = "jurisdiction")]
    JurisdictionAware,
}

impl Category {
    pub const ALL: [Category; 2] = [Category::General, Category::JurisdictionAware];

    /// The well-known `isCompliant` overload for this category.
    pub fn default_selector(self) -> Selector {
        match self {
            Category::General => Selector::IS_COMPLIANT,
            Category::JurisdictionAware => Selector::IS_COMPLIANT_IN_JURISDICTION,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Category::General => "general",
            Category::JurisdictionAware => "jurisdiction",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A registered module: which identity to call and at which selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleEntry {
    pub identity: Address,
    pub selector: Selector,
}
