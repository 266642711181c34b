// ============================================================================
// Exchange Configuration
// Ownership, custody asset and funding policy for a Dex instance
// ============================================================================

use super::{AssetRef, TokenSymbol, TraderId};
use crate::errors::{DexError, DexResult};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Symbol under which the custody asset is tracked
pub const DEFAULT_NATIVE_SYMBOL: &str = "ETH";

/// Ledger reference of the custody asset
pub const DEFAULT_NATIVE_ASSET: &str = "native";

/// How placing an order interacts with the trader's balance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum FundingPolicy {
    /// Balance must cover the order at placement time but is not reserved.
    /// Several open orders may jointly exceed the balance.
    #[default]
    CheckOnly,

    /// The covering amount is locked while the order rests.
    /// Withdrawals and new orders only see the unlocked remainder.
    Reserve,
}

/// Configuration for a [`crate::engine::Dex`]
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DexConfig {
    /// Registry owner, the only identity allowed to list tokens
    pub owner: TraderId,

    /// The exchange's own account on the external ledger
    pub custodian: TraderId,

    /// Symbol the custody asset is tracked under in the wallet
    pub native_symbol: TokenSymbol,

    /// External reference of the custody asset
    pub native_asset: AssetRef,

    /// Check-only or reserving admission of orders
    pub funding_policy: FundingPolicy,

    /// Optional cap on open orders per (trader, token, side).
    /// None means unlimited
    pub max_open_orders_per_trader: Option<usize>,
}

impl DexConfig {
    /// Create a configuration with the default custody asset
    pub fn new(owner: TraderId, custodian: TraderId) -> DexResult<Self> {
        Ok(Self {
            owner,
            custodian,
            native_symbol: TokenSymbol::new(DEFAULT_NATIVE_SYMBOL)?,
            native_asset: AssetRef::new(DEFAULT_NATIVE_ASSET),
            funding_policy: FundingPolicy::default(),
            max_open_orders_per_trader: None,
        })
    }

    /// Builder method: Set the custody asset
    pub fn with_native_asset(mut self, symbol: TokenSymbol, asset: AssetRef) -> Self {
        self.native_symbol = symbol;
        self.native_asset = asset;
        self
    }

    /// Builder method: Set the funding policy
    pub fn with_funding_policy(mut self, policy: FundingPolicy) -> Self {
        self.funding_policy = policy;
        self
    }

    /// Builder method: Cap open orders per trader and book side
    pub fn with_max_open_orders(mut self, limit: usize) -> Self {
        self.max_open_orders_per_trader = Some(limit);
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> DexResult<()> {
        if self.owner.is_empty() {
            return Err(DexError::InvalidConfig("owner cannot be empty".to_string()));
        }

        if self.custodian.is_empty() {
            return Err(DexError::InvalidConfig(
                "custodian cannot be empty".to_string(),
            ));
        }

        if self.owner == self.custodian {
            return Err(DexError::InvalidConfig(
                "custodian account must differ from owner".to_string(),
            ));
        }

        if self.native_asset.as_str().is_empty() {
            return Err(DexError::InvalidConfig(
                "native asset reference cannot be empty".to_string(),
            ));
        }

        if self.max_open_orders_per_trader == Some(0) {
            return Err(DexError::InvalidConfig(
                "max open orders must be positive".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> DexConfig {
        DexConfig::new(TraderId::from("owner"), TraderId::from("dex")).unwrap()
    }

    #[test]
    fn test_config_creation() {
        let config = config();
        assert_eq!(config.native_symbol.as_str(), "ETH");
        assert_eq!(config.native_asset.as_str(), "native");
        assert_eq!(config.funding_policy, FundingPolicy::CheckOnly);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_pattern() {
        let config = config()
            .with_funding_policy(FundingPolicy::Reserve)
            .with_max_open_orders(16)
            .with_native_asset(TokenSymbol::new("WETH").unwrap(), AssetRef::from("0xweth"));

        assert_eq!(config.funding_policy, FundingPolicy::Reserve);
        assert_eq!(config.max_open_orders_per_trader, Some(16));
        assert_eq!(config.native_symbol.as_str(), "WETH");
    }

    #[test]
    fn test_validation() {
        let config = DexConfig::new(TraderId::from("owner"), TraderId::from("owner")).unwrap();
        assert!(matches!(config.validate(), Err(DexError::InvalidConfig(_))));

        let config = DexConfig::new(TraderId::from(""), TraderId::from("dex")).unwrap();
        assert!(config.validate().is_err());

        let config = self::config().with_max_open_orders(0);
        assert!(config.validate().is_err());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_config_serializes() {
        let json = serde_json::to_string(&config()).unwrap();
        assert!(json.contains("\"funding_policy\":\"CheckOnly\""));
    }
}
