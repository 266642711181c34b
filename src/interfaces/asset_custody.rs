// ============================================================================
// Asset Custody Interface
// Defines the contract with the external ledger that actually holds assets
// ============================================================================

use crate::domain::{AssetRef, TraderId};
use crate::numeric::Amount;
use parking_lot::RwLock;
use std::collections::HashMap;
use thiserror::Error;

/// Failures reported by the external ledger
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CustodyError {
    #[error("allowance too small: required {required}, approved {approved}")]
    InsufficientAllowance { required: Amount, approved: Amount },

    #[error("ledger balance too small: required {required}, available {available}")]
    InsufficientFunds { required: Amount, available: Amount },

    #[error("transfer rejected: {0}")]
    Rejected(String),
}

/// Capability interface for moving assets on the external ledger.
///
/// The wallet pulls deposits with `transfer_from` (the owner must have
/// approved the spender beforehand) and pushes withdrawals with `transfer`.
pub trait AssetCustody: Send + Sync {
    /// Move `amount` of `asset` from `owner` to `spender`, consuming
    /// `amount` of the allowance `owner` granted to `spender`.
    fn transfer_from(
        &self,
        asset: &AssetRef,
        owner: &TraderId,
        spender: &TraderId,
        amount: Amount,
    ) -> Result<(), CustodyError>;

    /// Move `amount` of `asset` from `from` to `to`
    fn transfer(
        &self,
        asset: &AssetRef,
        from: &TraderId,
        to: &TraderId,
        amount: Amount,
    ) -> Result<(), CustodyError>;

    /// Ledger balance of `account`
    fn balance_of(&self, asset: &AssetRef, account: &TraderId) -> Amount;
}

#[derive(Default)]
struct LedgerState {
    balances: HashMap<(AssetRef, TraderId), Amount>,
    allowances: HashMap<(AssetRef, TraderId, TraderId), Amount>,
}

impl LedgerState {
    fn balance(&self, asset: &AssetRef, account: &TraderId) -> Amount {
        self.balances
            .get(&(asset.clone(), account.clone()))
            .copied()
            .unwrap_or(0)
    }

    fn move_funds(
        &mut self,
        asset: &AssetRef,
        from: &TraderId,
        to: &TraderId,
        amount: Amount,
    ) -> Result<(), CustodyError> {
        let available = self.balance(asset, from);
        if available < amount {
            return Err(CustodyError::InsufficientFunds {
                required: amount,
                available,
            });
        }
        if from == to {
            return Ok(());
        }
        let credited = self
            .balance(asset, to)
            .checked_add(amount)
            .ok_or_else(|| CustodyError::Rejected("recipient balance overflow".to_string()))?;

        self.balances
            .insert((asset.clone(), from.clone()), available - amount);
        self.balances.insert((asset.clone(), to.clone()), credited);
        Ok(())
    }
}

/// In-process ledger with ERC-20 style balances and allowances
#[derive(Default)]
pub struct InMemoryCustody {
    state: RwLock<LedgerState>,
}

impl InMemoryCustody {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create `amount` of `asset` out of thin air for `account`
    pub fn mint(&self, asset: &AssetRef, account: &TraderId, amount: Amount) {
        let mut state = self.state.write();
        let entry = state
            .balances
            .entry((asset.clone(), account.clone()))
            .or_insert(0);
        *entry = entry.saturating_add(amount);
    }

    /// Let `spender` pull up to `amount` of `asset` from `owner`.
    /// Replaces any previous approval.
    pub fn approve(&self, asset: &AssetRef, owner: &TraderId, spender: &TraderId, amount: Amount) {
        self.state
            .write()
            .allowances
            .insert((asset.clone(), owner.clone(), spender.clone()), amount);
    }

    pub fn allowance(&self, asset: &AssetRef, owner: &TraderId, spender: &TraderId) -> Amount {
        self.state
            .read()
            .allowances
            .get(&(asset.clone(), owner.clone(), spender.clone()))
            .copied()
            .unwrap_or(0)
    }
}

impl AssetCustody for InMemoryCustody {
    fn transfer_from(
        &self,
        asset: &AssetRef,
        owner: &TraderId,
        spender: &TraderId,
        amount: Amount,
    ) -> Result<(), CustodyError> {
        let mut state = self.state.write();
        let key = (asset.clone(), owner.clone(), spender.clone());
        let approved = state.allowances.get(&key).copied().unwrap_or(0);
        if approved < amount {
            return Err(CustodyError::InsufficientAllowance {
                required: amount,
                approved,
            });
        }

        state.move_funds(asset, owner, spender, amount)?;
        state.allowances.insert(key, approved - amount);
        Ok(())
    }

    fn transfer(
        &self,
        asset: &AssetRef,
        from: &TraderId,
        to: &TraderId,
        amount: Amount,
    ) -> Result<(), CustodyError> {
        self.state.write().move_funds(asset, from, to, amount)
    }

    fn balance_of(&self, asset: &AssetRef, account: &TraderId) -> Amount {
        self.state.read().balance(asset, account)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link() -> AssetRef {
        AssetRef::from("0xlink")
    }

    #[test]
    fn test_transfer_from_consumes_allowance() {
        let ledger = InMemoryCustody::new();
        let owner = TraderId::from("owner");
        let dex = TraderId::from("dex");
        ledger.mint(&link(), &owner, 1000);
        ledger.approve(&link(), &owner, &dex, 300);

        ledger.transfer_from(&link(), &owner, &dex, 100).unwrap();
        assert_eq!(ledger.balance_of(&link(), &owner), 900);
        assert_eq!(ledger.balance_of(&link(), &dex), 100);
        assert_eq!(ledger.allowance(&link(), &owner, &dex), 200);
    }

    #[test]
    fn test_transfer_from_without_allowance() {
        let ledger = InMemoryCustody::new();
        let owner = TraderId::from("owner");
        let dex = TraderId::from("dex");
        ledger.mint(&link(), &owner, 1000);

        let err = ledger.transfer_from(&link(), &owner, &dex, 1).unwrap_err();
        assert_eq!(
            err,
            CustodyError::InsufficientAllowance {
                required: 1,
                approved: 0
            }
        );
        assert_eq!(ledger.balance_of(&link(), &owner), 1000);
    }

    #[test]
    fn test_transfer_insufficient_funds_is_clean() {
        let ledger = InMemoryCustody::new();
        let owner = TraderId::from("owner");
        let dex = TraderId::from("dex");
        ledger.mint(&link(), &owner, 10);
        ledger.approve(&link(), &owner, &dex, 50);

        assert!(matches!(
            ledger.transfer_from(&link(), &owner, &dex, 20),
            Err(CustodyError::InsufficientFunds { .. })
        ));
        assert_eq!(ledger.allowance(&link(), &owner, &dex), 50);
        assert_eq!(ledger.balance_of(&link(), &owner), 10);
    }
}
