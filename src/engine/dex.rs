// ============================================================================
// Dex
// Public operation set composing Wallet, TokenRegistry and OrderBook
// ============================================================================

use crate::domain::{
    AssetRef, DexConfig, FundingPolicy, Order, OrderBook, OrderId, Side, TokenSymbol, TraderId,
};
use crate::engine::{TokenRegistry, Wallet};
use crate::errors::{DexError, DexResult};
use crate::interfaces::{AssetCustody, DexEvent, EventHandler};
use crate::numeric::{notional, Amount, Price};
use chrono::Utc;
use parking_lot::ReentrantMutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Custodial limit-order exchange.
///
/// Every mutating operation runs under one sequencer lock, so each either
/// completes entirely or fails without effect before the next begins. The
/// lock is re-entrant: a custody callback that calls back into the exchange
/// on the same thread proceeds and observes the state committed so far.
/// Reads go straight to the wallet and books.
pub struct Dex {
    config: DexConfig,
    registry: Arc<TokenRegistry>,
    wallet: Wallet,
    book: OrderBook,
    event_handler: Arc<dyn EventHandler>,
    order_id_counter: AtomicU64,
    sequencer: ReentrantMutex<()>,
}

impl Dex {
    /// Create an exchange from a validated configuration
    pub fn new(
        config: DexConfig,
        custody: Arc<dyn AssetCustody>,
        event_handler: Arc<dyn EventHandler>,
    ) -> DexResult<Self> {
        config.validate()?;

        let registry = Arc::new(TokenRegistry::new(
            config.owner.clone(),
            config.native_symbol,
        ));
        let wallet = Wallet::new(
            custody,
            Arc::clone(&registry),
            config.custodian.clone(),
            config.native_symbol,
            config.native_asset.clone(),
        );

        tracing::info!(
            owner = %config.owner,
            custodian = %config.custodian,
            native = %config.native_symbol,
            policy = ?config.funding_policy,
            "exchange created"
        );

        Ok(Self {
            config,
            registry,
            wallet,
            book: OrderBook::new(),
            event_handler,
            order_id_counter: AtomicU64::new(1),
            sequencer: ReentrantMutex::new(()),
        })
    }

    pub fn owner(&self) -> &TraderId {
        self.registry.owner()
    }

    pub fn config(&self) -> &DexConfig {
        &self.config
    }

    // ========================================================================
    // Token registry
    // ========================================================================

    /// List a tradable token. Only the owner may call this.
    pub fn add_token(&self, caller: &TraderId, symbol: TokenSymbol, asset: AssetRef) -> DexResult<()> {
        let _guard = self.sequencer.lock();
        self.registry.add_token(caller, symbol, asset.clone())?;
        self.emit(DexEvent::TokenAdded {
            symbol,
            asset,
            timestamp: Utc::now(),
        });
        Ok(())
    }

    /// Registered symbols in registration order
    pub fn get_token_list(&self) -> Vec<TokenSymbol> {
        self.registry.list_tokens()
    }

    // ========================================================================
    // Wallet
    // ========================================================================

    /// Deposit the custody asset. Returns the caller's new balance.
    pub fn deposit_asset(&self, caller: &TraderId, amount: Amount) -> DexResult<Amount> {
        let _guard = self.sequencer.lock();
        let balance = self.wallet.deposit_asset(caller, amount)?;
        self.emit_deposit(caller, self.config.native_symbol, amount);
        Ok(balance)
    }

    /// Deposit a listed token previously approved for the custodian.
    /// Returns the caller's new balance.
    pub fn deposit_token(&self, caller: &TraderId, amount: Amount, symbol: TokenSymbol) -> DexResult<Amount> {
        let _guard = self.sequencer.lock();
        let balance = self.wallet.deposit_token(caller, amount, symbol)?;
        self.emit_deposit(caller, symbol, amount);
        Ok(balance)
    }

    /// Withdraw the custody asset. Returns the caller's new balance.
    pub fn withdraw_asset(&self, caller: &TraderId, amount: Amount) -> DexResult<Amount> {
        let _guard = self.sequencer.lock();
        let balance = self.wallet.withdraw_asset(caller, amount)?;
        self.emit_withdrawal(caller, self.config.native_symbol, amount);
        Ok(balance)
    }

    /// Withdraw a listed token. Returns the caller's new balance.
    pub fn withdraw_token(&self, caller: &TraderId, amount: Amount, symbol: TokenSymbol) -> DexResult<Amount> {
        let _guard = self.sequencer.lock();
        let balance = self.wallet.withdraw_token(caller, amount, symbol)?;
        self.emit_withdrawal(caller, symbol, amount);
        Ok(balance)
    }

    /// Tracked balance of `trader` in `symbol` (the custody symbol included)
    pub fn balance_of(&self, trader: &TraderId, symbol: TokenSymbol) -> Amount {
        self.wallet.balance_of(trader, symbol)
    }

    /// The caller's own tracked balance
    pub fn get_my_balance(&self, caller: &TraderId, symbol: TokenSymbol) -> Amount {
        self.wallet.balance_of(caller, symbol)
    }

    /// Balance not committed to resting orders. Equals `balance_of` unless
    /// funds are reserved.
    pub fn available_balance(&self, trader: &TraderId, symbol: TokenSymbol) -> Amount {
        self.wallet.available_balance(trader, symbol)
    }

    // ========================================================================
    // Orders
    // ========================================================================

    /// Place a limit order.
    ///
    /// A BUY must be covered by `amount * price` of the custody asset, a SELL
    /// by `amount` of the token.
    ///
    /// # Errors
    /// `InvalidOrder` for a zero amount or price, `UnknownToken`,
    /// `OrderLimitExceeded`, `InsufficientEthBalance` (BUY) or
    /// `InsufficientTokenBalance` (SELL).
    pub fn create_limit_order(
        &self,
        caller: &TraderId,
        side: Side,
        symbol: TokenSymbol,
        amount: Amount,
        price: Price,
    ) -> DexResult<OrderId> {
        let _guard = self.sequencer.lock();
        match self.admit_order(caller, side, symbol, amount, price) {
            Ok(order_id) => Ok(order_id),
            Err(err) => {
                tracing::warn!(trader = %caller, symbol = %symbol, side = ?side, amount, price, error = %err, "limit order rejected");
                self.emit(DexEvent::OrderRejected {
                    trader: caller.clone(),
                    symbol,
                    side,
                    reason: err.to_string(),
                    timestamp: Utc::now(),
                });
                Err(err)
            }
        }
    }

    /// Delete one of the caller's open orders. Returns the removed order.
    ///
    /// # Errors
    /// `OrderNotFound` or `NotOwner`; the book is unchanged on error.
    pub fn delete_limit_order(&self, caller: &TraderId, order_id: OrderId) -> DexResult<Order> {
        let _guard = self.sequencer.lock();
        let order = self.book.remove(order_id, caller)?;

        if self.config.funding_policy == FundingPolicy::Reserve {
            let (funding, held) = self.required_funding(order.side, order.symbol, order.amount, order.price)?;
            self.wallet.release_funds(caller, funding, held)?;
        }

        tracing::info!(order_id = %order_id, trader = %caller, "limit order deleted");
        self.emit(DexEvent::OrderDeleted {
            order_id,
            trader: caller.clone(),
            timestamp: Utc::now(),
        });
        Ok(order)
    }

    /// Change price and amount of one of the caller's open orders.
    ///
    /// The new requirement must be covered by the caller's balance. A price
    /// change sends the order to the back of its new price level; an
    /// amount-only change keeps its place. Returns the updated order.
    pub fn update_limit_order(
        &self,
        caller: &TraderId,
        order_id: OrderId,
        new_amount: Amount,
        new_price: Price,
    ) -> DexResult<Order> {
        Self::validate_terms(new_amount, new_price)?;
        let _guard = self.sequencer.lock();

        let (_, updated) = self.book.update(order_id, caller, new_price, new_amount, |current| {
            let (funding, required) =
                self.required_funding(current.side, current.symbol, new_amount, new_price)?;
            match self.config.funding_policy {
                FundingPolicy::CheckOnly => {
                    let available = self.wallet.available_balance(caller, funding);
                    Self::ensure_covered(current.side, current.symbol, required, available)
                }
                FundingPolicy::Reserve => {
                    let (_, held) = self.required_funding(
                        current.side,
                        current.symbol,
                        current.amount,
                        current.price,
                    )?;
                    let available = self.wallet.available_balance(caller, funding) + held;
                    Self::ensure_covered(current.side, current.symbol, required, available)?;
                    self.wallet.relock_funds(caller, funding, held, required)
                }
            }
        })?;

        tracing::info!(order_id = %order_id, amount = new_amount, price = new_price, "limit order updated");
        self.emit(DexEvent::OrderUpdated {
            order_id,
            amount: updated.amount,
            price: updated.price,
            timestamp: Utc::now(),
        });
        Ok(updated)
    }

    /// One side of a token's book, best price first
    pub fn get_order_book(&self, symbol: TokenSymbol, side: Side) -> Vec<Order> {
        self.book.by_token(symbol, side)
    }

    /// One trader's orders on one side of a token's book, in book order
    pub fn get_trader_order_book(&self, trader: &TraderId, symbol: TokenSymbol, side: Side) -> Vec<Order> {
        self.book.by_trader(trader, symbol, side)
    }

    pub fn get_order(&self, order_id: OrderId) -> Option<Order> {
        self.book.get(order_id)
    }

    /// Number of open (BUY, SELL) orders for `symbol`
    pub fn depth(&self, symbol: TokenSymbol) -> (usize, usize) {
        self.book.depth(symbol)
    }

    pub fn best_price(&self, symbol: TokenSymbol, side: Side) -> Option<Price> {
        self.book.best_price(symbol, side)
    }

    // ========================================================================
    // Private methods
    // ========================================================================

    fn admit_order(
        &self,
        caller: &TraderId,
        side: Side,
        symbol: TokenSymbol,
        amount: Amount,
        price: Price,
    ) -> DexResult<OrderId> {
        Self::validate_terms(amount, price)?;
        self.registry.resolve(symbol)?;

        if let Some(limit) = self.config.max_open_orders_per_trader {
            if self.book.count_for_trader(caller, symbol, side) >= limit {
                return Err(DexError::OrderLimitExceeded {
                    trader: caller.clone(),
                    symbol,
                    side,
                    limit,
                });
            }
        }

        let (funding, required) = self.required_funding(side, symbol, amount, price)?;
        let available = self.wallet.available_balance(caller, funding);
        Self::ensure_covered(side, symbol, required, available)?;

        if self.config.funding_policy == FundingPolicy::Reserve {
            self.wallet.lock_funds(caller, funding, required)?;
        }

        let order_id = OrderId::from_raw(self.order_id_counter.fetch_add(1, Ordering::AcqRel));
        let order = Order::new(order_id, caller.clone(), symbol, side, amount, price, 0);
        let position = self.book.insert(order);

        tracing::info!(
            order_id = %order_id,
            trader = %caller,
            symbol = %symbol,
            side = ?side,
            amount,
            price,
            position,
            "limit order created"
        );
        self.emit(DexEvent::OrderCreated {
            order_id,
            trader: caller.clone(),
            symbol,
            side,
            amount,
            price,
            timestamp: Utc::now(),
        });
        Ok(order_id)
    }

    /// Asset and amount that must back an order
    fn required_funding(
        &self,
        side: Side,
        symbol: TokenSymbol,
        amount: Amount,
        price: Price,
    ) -> DexResult<(TokenSymbol, Amount)> {
        match side {
            Side::Buy => Ok((self.config.native_symbol, notional(amount, price)?)),
            Side::Sell => Ok((symbol, amount)),
        }
    }

    fn ensure_covered(side: Side, symbol: TokenSymbol, required: Amount, available: Amount) -> DexResult<()> {
        if available >= required {
            return Ok(());
        }
        Err(match side {
            Side::Buy => DexError::InsufficientEthBalance { required, available },
            Side::Sell => DexError::InsufficientTokenBalance {
                symbol,
                required,
                available,
            },
        })
    }

    fn validate_terms(amount: Amount, price: Price) -> DexResult<()> {
        if amount == 0 {
            return Err(DexError::InvalidOrder("amount must be positive"));
        }
        if price == 0 {
            return Err(DexError::InvalidOrder("price must be positive"));
        }
        Ok(())
    }

    fn emit_deposit(&self, trader: &TraderId, symbol: TokenSymbol, amount: Amount) {
        self.emit(DexEvent::Deposited {
            trader: trader.clone(),
            symbol,
            amount,
            timestamp: Utc::now(),
        });
    }

    fn emit_withdrawal(&self, trader: &TraderId, symbol: TokenSymbol, amount: Amount) {
        self.emit(DexEvent::Withdrawn {
            trader: trader.clone(),
            symbol,
            amount,
            timestamp: Utc::now(),
        });
    }

    fn emit(&self, event: DexEvent) {
        self.event_handler.on_event(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interfaces::{CustodyError, InMemoryCustody, NoOpEventHandler};
    use parking_lot::Mutex;
    use std::thread;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<DexEvent>>);

    impl EventHandler for Recorder {
        fn on_event(&self, event: DexEvent) {
            self.0.lock().push(event);
        }
    }

    fn link() -> TokenSymbol {
        TokenSymbol::new("LINK").unwrap()
    }

    fn eth() -> TokenSymbol {
        TokenSymbol::new("ETH").unwrap()
    }

    fn owner() -> TraderId {
        TraderId::from("owner")
    }

    fn dex_with(policy: FundingPolicy, handler: Arc<dyn EventHandler>) -> (Arc<InMemoryCustody>, Dex) {
        let ledger = Arc::new(InMemoryCustody::new());
        let config = DexConfig::new(owner(), TraderId::from("dex"))
            .unwrap()
            .with_funding_policy(policy);
        let dex = Dex::new(config, ledger.clone(), handler).unwrap();
        dex.add_token(&owner(), link(), AssetRef::from("0xlink")).unwrap();
        ledger.mint(&AssetRef::from("0xlink"), &owner(), 1000);
        ledger.approve(&AssetRef::from("0xlink"), &owner(), &TraderId::from("dex"), 1000);
        (ledger, dex)
    }

    fn funded(policy: FundingPolicy) -> Dex {
        let (_, dex) = dex_with(policy, Arc::new(NoOpEventHandler));
        dex.deposit_asset(&owner(), 1000).unwrap();
        dex.deposit_token(&owner(), 100, link()).unwrap();
        dex
    }

    fn book_prices(dex: &Dex, side: Side) -> Vec<Price> {
        dex.get_order_book(link(), side).iter().map(|o| o.price).collect()
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = DexConfig::new(owner(), owner()).unwrap();
        let result = Dex::new(
            config,
            Arc::new(InMemoryCustody::new()),
            Arc::new(NoOpEventHandler),
        );
        assert!(matches!(result, Err(DexError::InvalidConfig(_))));
    }

    #[test]
    fn test_order_ids_are_monotonic() {
        let dex = funded(FundingPolicy::CheckOnly);
        let a = dex.create_limit_order(&owner(), Side::Buy, link(), 1, 10).unwrap();
        let b = dex.create_limit_order(&owner(), Side::Sell, link(), 1, 10).unwrap();
        let c = dex.create_limit_order(&owner(), Side::Buy, link(), 1, 20).unwrap();

        assert_eq!(a, OrderId::from_raw(1));
        assert!(a < b && b < c);
    }

    #[test]
    fn test_unknown_token_and_zero_terms() {
        let dex = funded(FundingPolicy::CheckOnly);
        let doge = TokenSymbol::new("DOGE").unwrap();

        assert_eq!(
            dex.create_limit_order(&owner(), Side::Buy, doge, 1, 1),
            Err(DexError::UnknownToken(doge))
        );
        assert!(matches!(
            dex.create_limit_order(&owner(), Side::Buy, link(), 0, 1),
            Err(DexError::InvalidOrder(_))
        ));
        assert!(matches!(
            dex.create_limit_order(&owner(), Side::Sell, link(), 1, 0),
            Err(DexError::InvalidOrder(_))
        ));
        assert_eq!(dex.depth(link()), (0, 0));
    }

    #[test]
    fn test_buy_notional_overflow_rejected() {
        let dex = funded(FundingPolicy::CheckOnly);
        assert!(matches!(
            dex.create_limit_order(&owner(), Side::Buy, link(), Amount::MAX, 2),
            Err(DexError::Numeric(_))
        ));
    }

    #[test]
    fn test_check_only_allows_overcommitment() {
        let dex = funded(FundingPolicy::CheckOnly);
        // Each order alone is covered by the 1000 balance
        dex.create_limit_order(&owner(), Side::Buy, link(), 10, 100).unwrap();
        dex.create_limit_order(&owner(), Side::Buy, link(), 10, 100).unwrap();

        assert_eq!(dex.balance_of(&owner(), eth()), 1000);
        assert_eq!(dex.available_balance(&owner(), eth()), 1000);
        assert_eq!(dex.depth(link()), (2, 0));
    }

    #[test]
    fn test_reserve_locks_and_releases() {
        let dex = funded(FundingPolicy::Reserve);
        let first = dex.create_limit_order(&owner(), Side::Buy, link(), 6, 100).unwrap();
        assert_eq!(dex.available_balance(&owner(), eth()), 400);

        assert_eq!(
            dex.create_limit_order(&owner(), Side::Buy, link(), 5, 100),
            Err(DexError::InsufficientEthBalance {
                required: 500,
                available: 400
            })
        );
        assert!(matches!(
            dex.withdraw_asset(&owner(), 500),
            Err(DexError::InsufficientBalance { available: 400, .. })
        ));

        dex.delete_limit_order(&owner(), first).unwrap();
        assert_eq!(dex.available_balance(&owner(), eth()), 1000);
        // The custodian holds no native funds on this ledger, so the payout
        // fails and the debit is rolled back.
        assert_eq!(
            dex.withdraw_asset(&owner(), 1000),
            Err(DexError::Custody(CustodyError::InsufficientFunds {
                required: 1000,
                available: 0
            }))
        );
        assert_eq!(dex.balance_of(&owner(), eth()), 1000);
    }

    #[test]
    fn test_reserve_sell_and_update() {
        let dex = funded(FundingPolicy::Reserve);
        let id = dex.create_limit_order(&owner(), Side::Sell, link(), 60, 5).unwrap();
        assert_eq!(dex.available_balance(&owner(), link()), 40);

        // Growing beyond balance fails and leaves the lock alone
        assert!(matches!(
            dex.update_limit_order(&owner(), id, 101, 5),
            Err(DexError::InsufficientTokenBalance { available: 100, .. })
        ));
        assert_eq!(dex.available_balance(&owner(), link()), 40);

        dex.update_limit_order(&owner(), id, 90, 5).unwrap();
        assert_eq!(dex.available_balance(&owner(), link()), 10);

        dex.update_limit_order(&owner(), id, 20, 7).unwrap();
        assert_eq!(dex.available_balance(&owner(), link()), 80);
    }

    #[test]
    fn test_update_resorts_book() {
        let dex = funded(FundingPolicy::CheckOnly);
        let ids: Vec<OrderId> = [40, 30, 20, 10]
            .iter()
            .map(|&p| dex.create_limit_order(&owner(), Side::Buy, link(), 1, p).unwrap())
            .collect();

        // Middle order lowered moves toward the tail
        dex.update_limit_order(&owner(), ids[1], 1, 15).unwrap();
        assert_eq!(book_prices(&dex, Side::Buy), vec![40, 20, 15, 10]);

        // Tail order raised moves to the head
        dex.update_limit_order(&owner(), ids[3], 1, 50).unwrap();
        assert_eq!(book_prices(&dex, Side::Buy), vec![50, 40, 20, 15]);

        // Head order raised stays put
        dex.update_limit_order(&owner(), ids[3], 1, 60).unwrap();
        assert_eq!(book_prices(&dex, Side::Buy), vec![60, 40, 20, 15]);

        let updated = dex.get_order(ids[3]).unwrap();
        assert_eq!(updated.price, 60);
    }

    #[test]
    fn test_update_checks_ownership_and_balance() {
        let dex = funded(FundingPolicy::CheckOnly);
        let id = dex.create_limit_order(&owner(), Side::Buy, link(), 10, 10).unwrap();
        let stranger = TraderId::from("stranger");

        assert!(matches!(
            dex.update_limit_order(&stranger, id, 1, 1),
            Err(DexError::NotOwner { .. })
        ));
        assert_eq!(
            dex.update_limit_order(&owner(), OrderId::from_raw(999), 1, 1),
            Err(DexError::OrderNotFound(OrderId::from_raw(999)))
        );
        assert_eq!(
            dex.update_limit_order(&owner(), id, 11, 100),
            Err(DexError::InsufficientEthBalance {
                required: 1100,
                available: 1000
            })
        );

        let order = dex.get_order(id).unwrap();
        assert_eq!((order.amount, order.price), (10, 10));
    }

    #[test]
    fn test_open_order_limit() {
        let ledger = Arc::new(InMemoryCustody::new());
        let config = DexConfig::new(owner(), TraderId::from("dex"))
            .unwrap()
            .with_max_open_orders(2);
        let limited = Dex::new(config, ledger, Arc::new(NoOpEventHandler)).unwrap();
        limited.add_token(&owner(), link(), AssetRef::from("0xlink")).unwrap();
        limited.deposit_asset(&owner(), 100).unwrap();

        limited.create_limit_order(&owner(), Side::Buy, link(), 1, 1).unwrap();
        limited.create_limit_order(&owner(), Side::Buy, link(), 1, 1).unwrap();
        assert!(matches!(
            limited.create_limit_order(&owner(), Side::Buy, link(), 1, 1),
            Err(DexError::OrderLimitExceeded { limit: 2, .. })
        ));
        assert!(limited
            .create_limit_order(&owner(), Side::Sell, link(), 1, 1)
            .is_err_and(|e| matches!(e, DexError::InsufficientTokenBalance { .. })));
    }

    #[test]
    fn test_events_emitted() {
        let recorder = Arc::new(Recorder::default());
        let (_, dex) = dex_with(FundingPolicy::CheckOnly, recorder.clone());
        dex.deposit_asset(&owner(), 100).unwrap();
        let id = dex.create_limit_order(&owner(), Side::Buy, link(), 1, 10).unwrap();
        dex.create_limit_order(&owner(), Side::Sell, link(), 1, 10).unwrap_err();
        dex.delete_limit_order(&owner(), id).unwrap();

        let events = recorder.0.lock();
        assert!(matches!(events[0], DexEvent::TokenAdded { .. }));
        assert!(matches!(events[1], DexEvent::Deposited { amount: 100, .. }));
        assert!(matches!(events[2], DexEvent::OrderCreated { order_id, .. } if order_id == id));
        assert!(matches!(events[3], DexEvent::OrderRejected { side: Side::Sell, .. }));
        assert!(matches!(events[4], DexEvent::OrderDeleted { order_id, .. } if order_id == id));
        assert_eq!(events.len(), 5);
    }

    #[test]
    fn test_concurrent_traders() {
        let (_, dex) = dex_with(FundingPolicy::Reserve, Arc::new(NoOpEventHandler));
        let dex = Arc::new(dex);

        let handles: Vec<_> = (0..4)
            .map(|t| {
                let dex = Arc::clone(&dex);
                thread::spawn(move || {
                    let trader = TraderId::new(format!("trader{t}"));
                    dex.deposit_asset(&trader, 1000).unwrap();
                    for i in 1..=10u128 {
                        dex.create_limit_order(&trader, Side::Buy, link(), 1, i * 10)
                            .unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let book = dex.get_order_book(link(), Side::Buy);
        assert_eq!(book.len(), 40);
        assert!(book.windows(2).all(|w| w[0].price >= w[1].price));
        // 10 + 20 + ... + 100 locked per trader
        assert_eq!(dex.available_balance(&TraderId::from("trader0"), eth()), 450);
    }
}
