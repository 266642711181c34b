// ============================================================================
// Domain Models Module
// Contains all core domain entities and value objects
// ============================================================================

pub mod config;
pub mod order;
pub mod order_book;
pub mod token;

pub use config::{DexConfig, FundingPolicy};
pub use order::{Order, OrderId, Side, TraderId};
pub use order_book::{BookKey, OrderBook, OrderBookSide};
pub use token::{AssetRef, TokenSymbol};
