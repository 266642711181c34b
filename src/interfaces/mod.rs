// ============================================================================
// Interfaces Module
// Contains all trait definitions and contracts
// ============================================================================

mod asset_custody;
mod event_handler;

pub use asset_custody::{AssetCustody, CustodyError, InMemoryCustody};
pub use event_handler::{DexEvent, EventHandler, LoggingEventHandler, NoOpEventHandler};
