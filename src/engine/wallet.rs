// ============================================================================
// Wallet
// Custodial ledger of per-trader balances for the custody asset and tokens
// ============================================================================

use crate::domain::{AssetRef, TokenSymbol, TraderId};
use crate::engine::TokenRegistry;
use crate::errors::{DexError, DexResult};
use crate::interfaces::{AssetCustody, CustodyError};
use crate::numeric::{checked_credit, checked_debit, Amount};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Tracked balance of one (trader, asset).
///
/// `locked` is the part committed to resting orders when funds are
/// reserved; it never exceeds `total`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BalanceRecord {
    pub total: Amount,
    pub locked: Amount,
}

impl BalanceRecord {
    pub fn available(&self) -> Amount {
        self.total - self.locked
    }
}

/// Per-trader custody ledger.
///
/// Balances are created lazily on first deposit and never deleted. Deposits
/// of tokens pull funds through the injected [`AssetCustody`]; withdrawals
/// debit the tracked balance first and only then push funds out, so a call
/// that re-enters the wallet from inside the outbound transfer already sees
/// the reduced balance.
pub struct Wallet {
    custody: Arc<dyn AssetCustody>,
    registry: Arc<TokenRegistry>,
    custodian: TraderId,
    native_symbol: TokenSymbol,
    native_asset: AssetRef,
    accounts: RwLock<HashMap<(TraderId, TokenSymbol), BalanceRecord>>,
}

impl Wallet {
    pub fn new(
        custody: Arc<dyn AssetCustody>,
        registry: Arc<TokenRegistry>,
        custodian: TraderId,
        native_symbol: TokenSymbol,
        native_asset: AssetRef,
    ) -> Self {
        Self {
            custody,
            registry,
            custodian,
            native_symbol,
            native_asset,
            accounts: RwLock::new(HashMap::new()),
        }
    }

    pub fn native_symbol(&self) -> TokenSymbol {
        self.native_symbol
    }

    // ========================================================================
    // Deposits
    // ========================================================================

    /// Credit custody asset sent along with the call. Returns the new balance.
    pub fn deposit_asset(&self, trader: &TraderId, amount: Amount) -> DexResult<Amount> {
        let balance = self.credit(trader, self.native_symbol, amount)?;
        tracing::info!(trader = %trader, amount, balance, "custody asset deposited");
        Ok(balance)
    }

    /// Pull `amount` of `symbol` from the trader's external account and
    /// credit it. Returns the new balance.
    ///
    /// # Errors
    /// `UnknownToken` for an unlisted symbol, `InsufficientAllowance` if the
    /// trader has not approved the custodian for at least `amount`.
    pub fn deposit_token(
        &self,
        trader: &TraderId,
        amount: Amount,
        symbol: TokenSymbol,
    ) -> DexResult<Amount> {
        let asset = self.registry.resolve(symbol)?;

        // Reject before pulling funds that could not be credited.
        checked_credit(self.balance_of(trader, symbol), amount)?;

        self.custody
            .transfer_from(&asset, trader, &self.custodian, amount)
            .map_err(|err| match err {
                CustodyError::InsufficientAllowance { required, approved } => {
                    DexError::InsufficientAllowance {
                        symbol,
                        required,
                        approved,
                    }
                }
                other => DexError::Custody(other),
            })?;

        let balance = self.credit(trader, symbol, amount)?;
        tracing::info!(trader = %trader, symbol = %symbol, amount, balance, "token deposited");
        Ok(balance)
    }

    // ========================================================================
    // Withdrawals
    // ========================================================================

    /// Withdraw custody asset back to the trader. Returns the new balance.
    pub fn withdraw_asset(&self, trader: &TraderId, amount: Amount) -> DexResult<Amount> {
        let asset = self.native_asset.clone();
        self.withdraw(trader, self.native_symbol, &asset, amount)
    }

    /// Withdraw `amount` of `symbol` back to the trader. Returns the new balance.
    pub fn withdraw_token(
        &self,
        trader: &TraderId,
        amount: Amount,
        symbol: TokenSymbol,
    ) -> DexResult<Amount> {
        let asset = self.registry.resolve(symbol)?;
        self.withdraw(trader, symbol, &asset, amount)
    }

    fn withdraw(
        &self,
        trader: &TraderId,
        symbol: TokenSymbol,
        asset: &AssetRef,
        amount: Amount,
    ) -> DexResult<Amount> {
        let balance = {
            let mut accounts = self.accounts.write();
            let key = (trader.clone(), symbol);
            let available = accounts
                .get(&key)
                .map(BalanceRecord::available)
                .unwrap_or(0);
            if available < amount {
                tracing::warn!(trader = %trader, symbol = %symbol, amount, available, "withdrawal exceeds balance");
                return Err(DexError::InsufficientBalance {
                    symbol,
                    required: amount,
                    available,
                });
            }
            let record = accounts.entry(key).or_default();
            record.total = checked_debit(record.total, amount)?;
            record.total
        };

        // The debit is committed and the lock released before funds leave.
        if let Err(err) = self.custody.transfer(asset, &self.custodian, trader, amount) {
            tracing::warn!(trader = %trader, symbol = %symbol, amount, error = %err, "outbound transfer failed, restoring balance");
            let mut accounts = self.accounts.write();
            let record = accounts.entry((trader.clone(), symbol)).or_default();
            record.total = record.total.saturating_add(amount);
            return Err(DexError::Custody(err));
        }

        tracing::info!(trader = %trader, symbol = %symbol, amount, balance, "withdrawn");
        Ok(balance)
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// Tracked balance, 0 if never touched
    pub fn balance_of(&self, trader: &TraderId, symbol: TokenSymbol) -> Amount {
        self.record(trader, symbol).total
    }

    /// Balance not committed to resting orders
    pub fn available_balance(&self, trader: &TraderId, symbol: TokenSymbol) -> Amount {
        self.record(trader, symbol).available()
    }

    pub fn record(&self, trader: &TraderId, symbol: TokenSymbol) -> BalanceRecord {
        self.accounts
            .read()
            .get(&(trader.clone(), symbol))
            .copied()
            .unwrap_or_default()
    }

    // ========================================================================
    // Reservations
    // ========================================================================

    /// Commit `amount` of the available balance to a resting order.
    pub fn lock_funds(&self, trader: &TraderId, symbol: TokenSymbol, amount: Amount) -> DexResult<()> {
        let mut accounts = self.accounts.write();
        let record = accounts.entry((trader.clone(), symbol)).or_default();
        if record.available() < amount {
            return Err(DexError::InsufficientBalance {
                symbol,
                required: amount,
                available: record.available(),
            });
        }
        record.locked = checked_credit(record.locked, amount)?;
        Ok(())
    }

    /// Return previously locked funds to the available balance.
    pub fn release_funds(&self, trader: &TraderId, symbol: TokenSymbol, amount: Amount) -> DexResult<()> {
        let mut accounts = self.accounts.write();
        let record = accounts.entry((trader.clone(), symbol)).or_default();
        record.locked = checked_debit(record.locked, amount)?;
        Ok(())
    }

    /// Swap a lock of `from` for a lock of `to` in one step.
    pub fn relock_funds(
        &self,
        trader: &TraderId,
        symbol: TokenSymbol,
        from: Amount,
        to: Amount,
    ) -> DexResult<()> {
        let mut accounts = self.accounts.write();
        let record = accounts.entry((trader.clone(), symbol)).or_default();
        let unlocked = checked_debit(record.locked, from)?;
        let free = record.total - unlocked;
        if free < to {
            return Err(DexError::InsufficientBalance {
                symbol,
                required: to,
                available: free,
            });
        }
        record.locked = unlocked + to;
        Ok(())
    }

    fn credit(&self, trader: &TraderId, symbol: TokenSymbol, amount: Amount) -> DexResult<Amount> {
        let mut accounts = self.accounts.write();
        let record = accounts.entry((trader.clone(), symbol)).or_default();
        record.total = checked_credit(record.total, amount)?;
        Ok(record.total)
    }
}
