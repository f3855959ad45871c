//! Ethereum data as seen by the oracle. Only the fields needed for fee
//! estimation are kept; everything else the node returns is dropped at the
//! boundary.

use {
    alloy::primitives::utils::Unit,
    bigdecimal::BigDecimal,
    num::{BigInt, ToPrimitive, bigint::Sign},
    std::fmt::{self, Display, Formatter},
};

pub use alloy::primitives::U256;

/// A block number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BlockNo(pub u64);

impl From<u64> for BlockNo {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<BlockNo> for u64 {
    fn from(value: BlockNo) -> Self {
        value.0
    }
}

impl Display for BlockNo {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// An amount of wei, the smallest unit of ether.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Wei(pub U256);

impl Wei {
    /// Lossless conversion into a signed arbitrary precision integer, so that
    /// differences between amounts can go negative.
    pub fn to_big_int(self) -> BigInt {
        BigInt::from_bytes_be(Sign::Plus, &self.0.to_be_bytes::<32>())
    }
}

impl From<U256> for Wei {
    fn from(value: U256) -> Self {
        Self(value)
    }
}

impl From<u64> for Wei {
    fn from(value: u64) -> Self {
        Self(U256::from(value))
    }
}

impl From<u128> for Wei {
    fn from(value: u128) -> Self {
        Self(U256::from(value))
    }
}

/// An exact decimal amount of gwei (1 gwei = 1e9 wei). Can be negative when it
/// is the result of a fee difference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gwei(BigDecimal);

impl Gwei {
    /// Converts a (signed) wei amount into gwei without any rounding.
    pub fn from_wei(wei: BigInt) -> Self {
        Self(BigDecimal::new(wei, i64::from(Unit::GWEI.get())))
    }

    pub fn as_decimal(&self) -> &BigDecimal {
        &self.0
    }

    /// The closest `f64`, or `None` if the amount does not fit into a finite
    /// one.
    pub fn to_f64(&self) -> Option<f64> {
        self.0.to_f64().filter(|value| value.is_finite())
    }
}

impl From<Wei> for Gwei {
    fn from(value: Wei) -> Self {
        Self::from_wei(value.to_big_int())
    }
}

impl Display for Gwei {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A new block header notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    /// Nodes always include the number, but a broken upstream might not.
    pub number: Option<BlockNo>,
}

/// A block body with its transactions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub number: BlockNo,
    /// Absent before the London hard fork.
    pub base_fee_per_gas: Option<Wei>,
    /// `None` when the node did not return full transaction objects.
    pub transactions: Option<Vec<Tx>>,
}

/// The part of a transaction that matters for fee estimation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tx {
    pub gas_price: Option<Wei>,
}
