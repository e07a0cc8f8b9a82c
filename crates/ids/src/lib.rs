//! Chain and node identifiers.
//!
//! Both are fixed-size opaque byte strings. The benchlist only needs them to be
//! comparable and hashable; hex formatting is provided for logs.

use core::str::FromStr;

use alloy_primitives::{FixedBytes, hex::FromHexError};

/// Identifies a chain (32 bytes).
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    derive_more::Deref,
    derive_more::From,
    derive_more::Into,
    derive_more::Display,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct ChainId(FixedBytes<32>);

impl ChainId {
    /// Size of the identifier in bytes.
    pub const LEN: usize = 32;

    pub const ZERO: Self = Self(FixedBytes::ZERO);

    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(FixedBytes(bytes))
    }

    /// Identifier with every byte set to `byte`.
    pub const fn repeat_byte(byte: u8) -> Self {
        Self(FixedBytes::repeat_byte(byte))
    }

    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0.0
    }
}

impl FromStr for ChainId {
    type Err = FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FixedBytes::<32>::from_str(s).map(Self)
    }
}

/// Identifies a network peer (20 bytes).
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    derive_more::Deref,
    derive_more::From,
    derive_more::Into,
    derive_more::Display,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct NodeId(FixedBytes<20>);

impl NodeId {
    /// Size of the identifier in bytes.
    pub const LEN: usize = 20;

    pub const ZERO: Self = Self(FixedBytes::ZERO);

    pub const fn new(bytes: [u8; 20]) -> Self {
        Self(FixedBytes(bytes))
    }

    /// Identifier with every byte set to `byte`.
    pub const fn repeat_byte(byte: u8) -> Self {
        Self(FixedBytes::repeat_byte(byte))
    }

    pub const fn as_bytes(&self) -> &[u8; 20] {
        &self.0.0
    }
}

impl FromStr for NodeId {
    type Err = FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FixedBytes::<20>::from_str(s).map(Self)
    }
}
