// ============================================================================
// Custodial DEX Library
// Per-trader custody wallets with price-ordered limit order books
// ============================================================================

//! # Custodial DEX
//!
//! A custodial limit-order book engine: traders deposit a custody asset and
//! listed tokens, then place and cancel limit orders backed by those balances.
//!
//! ## Features
//!
//! - **Custody wallet** with allowance-based token deposits and re-entrancy
//!   safe withdrawals through a pluggable [`interfaces::AssetCustody`]
//! - **Owner-curated token registry** keyed by fixed-width symbols
//! - **Price-ordered books** per (token, side) with time priority on ties
//! - **Check-only or reserving** admission of orders against balances
//! - **Event hooks** for audit and logging
//!
//! ## Example
//!
//! ```rust
//! use custodial_dex::prelude::*;
//! use std::sync::Arc;
//!
//! let owner = TraderId::from("owner");
//! let ledger = Arc::new(InMemoryCustody::new());
//! let config = DexConfig::new(owner.clone(), TraderId::from("dex")).unwrap();
//! let dex = Dex::new(config, ledger.clone(), Arc::new(NoOpEventHandler)).unwrap();
//!
//! let link = TokenSymbol::new("LINK").unwrap();
//! dex.add_token(&owner, link, AssetRef::from("0xlink")).unwrap();
//! dex.deposit_asset(&owner, 2000).unwrap();
//!
//! dex.create_limit_order(&owner, Side::Buy, link, 10, 1).unwrap();
//! assert_eq!(dex.get_order_book(link, Side::Buy).len(), 1);
//! ```

pub mod domain;
pub mod engine;
pub mod errors;
pub mod interfaces;
pub mod numeric;
pub mod utils;

// Re-exports for convenience
pub mod prelude {
    pub use crate::domain::{
        AssetRef, BookKey, DexConfig, FundingPolicy, Order, OrderBook, OrderBookSide, OrderId,
        Side, TokenSymbol, TraderId,
    };
    pub use crate::engine::{BalanceRecord, Dex, TokenRegistry, Wallet};
    pub use crate::errors::{DexError, DexResult};
    pub use crate::interfaces::{
        AssetCustody, CustodyError, DexEvent, EventHandler, InMemoryCustody, LoggingEventHandler,
        NoOpEventHandler,
    };
    pub use crate::numeric::{Amount, Price};
}
