// ============================================================================
// Event Handler Interface
// Defines the contract for handling wallet, registry and order events
// ============================================================================

use crate::domain::{AssetRef, OrderId, Side, TokenSymbol, TraderId};
use crate::numeric::{Amount, Price};
use chrono::{DateTime, Utc};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Events emitted by the exchange after a state change is committed
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DexEvent {
    /// Funds credited to a trader's wallet
    Deposited {
        trader: TraderId,
        symbol: TokenSymbol,
        amount: Amount,
        timestamp: DateTime<Utc>,
    },

    /// Funds debited and sent back to the trader
    Withdrawn {
        trader: TraderId,
        symbol: TokenSymbol,
        amount: Amount,
        timestamp: DateTime<Utc>,
    },

    /// New tradable token listed by the owner
    TokenAdded {
        symbol: TokenSymbol,
        asset: AssetRef,
        timestamp: DateTime<Utc>,
    },

    /// Limit order admitted into the book
    OrderCreated {
        order_id: OrderId,
        trader: TraderId,
        symbol: TokenSymbol,
        side: Side,
        amount: Amount,
        price: Price,
        timestamp: DateTime<Utc>,
    },

    /// Limit order repriced or resized
    OrderUpdated {
        order_id: OrderId,
        amount: Amount,
        price: Price,
        timestamp: DateTime<Utc>,
    },

    /// Limit order removed by its owner
    OrderDeleted {
        order_id: OrderId,
        trader: TraderId,
        timestamp: DateTime<Utc>,
    },

    /// Order placement refused
    OrderRejected {
        trader: TraderId,
        symbol: TokenSymbol,
        side: Side,
        reason: String,
        timestamp: DateTime<Utc>,
    },
}

/// Event handler trait for processing exchange events
/// Implementations can handle logging, metrics, notifications, etc.
pub trait EventHandler: Send + Sync {
    /// Handle an exchange event
    fn on_event(&self, event: DexEvent);

    /// Batch event handler (optional optimization)
    fn on_events(&self, events: Vec<DexEvent>) {
        for event in events {
            self.on_event(event);
        }
    }
}

/// No-op event handler for testing
pub struct NoOpEventHandler;

impl EventHandler for NoOpEventHandler {
    fn on_event(&self, _event: DexEvent) {
        // Do nothing
    }
}

/// Logging event handler
pub struct LoggingEventHandler;

impl EventHandler for LoggingEventHandler {
    fn on_event(&self, event: DexEvent) {
        tracing::debug!("Exchange event: {:?}", event);
    }
}
