// ============================================================================
// Engine Module
// Wallet, token registry and the exchange facade composing them
// ============================================================================

mod dex;
mod token_registry;
mod wallet;

pub use dex::Dex;
pub use token_registry::TokenRegistry;
pub use wallet::{BalanceRecord, Wallet};
