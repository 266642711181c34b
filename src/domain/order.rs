// ============================================================================
// Order Domain Model
// ============================================================================

use super::TokenSymbol;
use crate::numeric::{Amount, Price};
use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

// ============================================================================
// Value Objects
// ============================================================================

/// Process-wide monotonic order identifier. The first issued id is 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OrderId(u64);

impl OrderId {
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of a trader (account address or handle)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TraderId(Arc<str>);

impl TraderId {
    pub fn new(id: impl Into<Arc<str>>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for TraderId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for TraderId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl fmt::Display for TraderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn opposite(&self) -> Side {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }

    /// Compare two prices by aggressiveness on this side.
    ///
    /// `Greater` means `a` belongs closer to the head of the book than `b`:
    /// a higher bid on the BUY side, a lower ask on the SELL side.
    #[inline]
    pub fn compare_aggressiveness(&self, a: Price, b: Price) -> Ordering {
        match self {
            Side::Buy => a.cmp(&b),
            Side::Sell => b.cmp(&a),
        }
    }

    /// True if `a` strictly outranks `b` on this side
    #[inline]
    pub fn is_more_aggressive(&self, a: Price, b: Price) -> bool {
        self.compare_aggressiveness(a, b) == Ordering::Greater
    }
}

// ============================================================================
// Order Entity
// ============================================================================

/// A resting limit order.
///
/// `sequence` is the insertion stamp used for time priority between orders
/// at the same price; it is refreshed when a price update moves the order
/// to a new level.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Order {
    pub id: OrderId,
    pub trader: TraderId,
    pub symbol: TokenSymbol,
    pub side: Side,
    pub amount: Amount,
    pub price: Price,
    pub sequence: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn new(
        id: OrderId,
        trader: TraderId,
        symbol: TokenSymbol,
        side: Side,
        amount: Amount,
        price: Price,
        sequence: u64,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            trader,
            symbol,
            side,
            amount,
            price,
            sequence,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_buy(&self) -> bool {
        self.side == Side::Buy
    }

    pub fn is_sell(&self) -> bool {
        self.side == Side::Sell
    }

    pub fn belongs_to(&self, trader: &TraderId) -> bool {
        &self.trader == trader
    }
}
