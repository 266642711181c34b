// ============================================================================
// Order Book Domain Model
// ============================================================================

use parking_lot::RwLock;
use std::cmp::Ordering as CmpOrdering;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::{Order, OrderId, Side, TokenSymbol, TraderId};
use crate::errors::{DexError, DexResult};
use crate::numeric::{Amount, Price};
use chrono::Utc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Key of one book side: a (token, side) pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BookKey {
    pub symbol: TokenSymbol,
    pub side: Side,
}

impl BookKey {
    pub fn new(symbol: TokenSymbol, side: Side) -> Self {
        Self { symbol, side }
    }
}

// ============================================================================
// Order Book Side
// ============================================================================

/// Price-ordered sequence of open orders for one (token, side).
///
/// BUY sides are non-increasing in price from head to tail, SELL sides are
/// non-decreasing. Orders at the same price keep their insertion order.
/// Positions are maintained with adjacent swaps, so an insert or a reprice
/// costs O(n) in the distance the order travels.
#[derive(Debug, Clone)]
pub struct OrderBookSide {
    pub side: Side,
    orders: Vec<Order>,
}

impl OrderBookSide {
    pub fn new(side: Side) -> Self {
        Self {
            side,
            orders: Vec::new(),
        }
    }

    /// Append at the tail and bubble toward the head while strictly more
    /// aggressive than the left neighbour. Returns the final index.
    pub fn insert(&mut self, order: Order) -> usize {
        debug_assert_eq!(order.side, self.side);
        self.orders.push(order);
        let idx = self.orders.len() - 1;
        self.bubble_toward_head(idx)
    }

    /// Remove the order at `idx`. Remaining orders keep their relative order.
    pub fn remove_at(&mut self, idx: usize) -> Order {
        self.orders.remove(idx)
    }

    /// Change price and amount of the order at `idx` and restore ordering.
    ///
    /// A more aggressive price walks the order toward the head, a less
    /// aggressive one walks it toward the tail. Either way it ends up behind
    /// every order already resting at its new price. An unchanged price
    /// leaves the order where it is. Returns the final index.
    pub fn reprice(&mut self, idx: usize, price: Price, amount: Amount, sequence: u64) -> usize {
        let side = self.side;
        let order = &mut self.orders[idx];
        let direction = side.compare_aggressiveness(price, order.price);

        order.amount = amount;
        order.updated_at = Utc::now();
        if direction == CmpOrdering::Equal {
            return idx;
        }
        order.price = price;
        order.sequence = sequence;

        match direction {
            CmpOrdering::Greater => self.bubble_toward_head(idx),
            _ => self.bubble_toward_tail(idx),
        }
    }

    pub fn position(&self, order_id: OrderId) -> Option<usize> {
        self.orders.iter().position(|o| o.id == order_id)
    }

    pub fn get(&self, idx: usize) -> Option<&Order> {
        self.orders.get(idx)
    }

    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    /// Orders belonging to `trader`, in book order
    pub fn by_trader<'a>(&'a self, trader: &'a TraderId) -> impl Iterator<Item = &'a Order> + 'a {
        self.orders.iter().filter(move |o| o.belongs_to(trader))
    }

    /// Best (head-of-book) price
    pub fn best_price(&self) -> Option<Price> {
        self.orders.first().map(|o| o.price)
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// True if prices are monotone for this side and equal prices are in
    /// sequence order.
    pub fn is_well_ordered(&self) -> bool {
        self.orders.windows(2).all(|pair| {
            match self.side.compare_aggressiveness(pair[0].price, pair[1].price) {
                CmpOrdering::Greater => true,
                CmpOrdering::Equal => pair[0].sequence < pair[1].sequence,
                CmpOrdering::Less => false,
            }
        })
    }

    fn bubble_toward_head(&mut self, mut idx: usize) -> usize {
        while idx > 0
            && self
                .side
                .is_more_aggressive(self.orders[idx].price, self.orders[idx - 1].price)
        {
            self.orders.swap(idx, idx - 1);
            idx -= 1;
        }
        idx
    }

    fn bubble_toward_tail(&mut self, mut idx: usize) -> usize {
        while idx + 1 < self.orders.len()
            && !self
                .side
                .is_more_aggressive(self.orders[idx].price, self.orders[idx + 1].price)
        {
            self.orders.swap(idx, idx + 1);
            idx += 1;
        }
        idx
    }
}

// ============================================================================
// Order Book
// ============================================================================

/// All open orders, one [`OrderBookSide`] per (token, side).
///
/// Each side sits behind its own lock, so operations on different keys do
/// not contend. An id index maps every open order to the side holding it.
/// Lock order is index before side.
pub struct OrderBook {
    sides: RwLock<HashMap<BookKey, Arc<RwLock<OrderBookSide>>>>,
    index: RwLock<HashMap<OrderId, BookKey>>,
    sequence_counter: AtomicU64,
}

impl OrderBook {
    pub fn new() -> Self {
        Self {
            sides: RwLock::new(HashMap::new()),
            index: RwLock::new(HashMap::new()),
            sequence_counter: AtomicU64::new(0),
        }
    }

    /// Insert an order into its side, stamping it with a fresh sequence.
    /// Returns the order's position in the side after insertion.
    pub fn insert(&self, mut order: Order) -> usize {
        let key = BookKey::new(order.symbol, order.side);
        order.sequence = self.next_sequence();
        let order_id = order.id;

        let side = self.side_or_create(key);
        let mut index = self.index.write();
        let position = side.write().insert(order);
        index.insert(order_id, key);

        tracing::debug!(
            order_id = %order_id,
            symbol = %key.symbol,
            side = ?key.side,
            position,
            "order inserted into book"
        );
        position
    }

    /// Remove `order_id` on behalf of `requester`.
    ///
    /// # Errors
    /// `OrderNotFound` if no open order has this id, `NotOwner` if it belongs
    /// to someone else. The book is unchanged on error.
    pub fn remove(&self, order_id: OrderId, requester: &TraderId) -> DexResult<Order> {
        let mut index = self.index.write();
        let key = *index.get(&order_id).ok_or(DexError::OrderNotFound(order_id))?;
        let side = self.side(key).ok_or(DexError::OrderNotFound(order_id))?;
        let mut side = side.write();

        let idx = side
            .position(order_id)
            .ok_or(DexError::OrderNotFound(order_id))?;
        if !side.orders()[idx].belongs_to(requester) {
            return Err(DexError::NotOwner {
                order_id,
                requester: requester.clone(),
            });
        }

        let removed = side.remove_at(idx);
        index.remove(&order_id);
        tracing::debug!(order_id = %order_id, symbol = %key.symbol, side = ?key.side, "order removed from book");
        Ok(removed)
    }

    /// Change price and amount of `order_id` on behalf of `requester` and
    /// restore the side's ordering. Returns the order as it was before and
    /// after the update.
    ///
    /// `check` runs against the current order after ownership is verified
    /// and before anything is mutated; an error from it aborts the update.
    pub fn update<F>(
        &self,
        order_id: OrderId,
        requester: &TraderId,
        new_price: Price,
        new_amount: Amount,
        check: F,
    ) -> DexResult<(Order, Order)>
    where
        F: FnOnce(&Order) -> DexResult<()>,
    {
        let index = self.index.read();
        let key = *index.get(&order_id).ok_or(DexError::OrderNotFound(order_id))?;
        let side = self.side(key).ok_or(DexError::OrderNotFound(order_id))?;
        let mut side = side.write();

        let idx = side
            .position(order_id)
            .ok_or(DexError::OrderNotFound(order_id))?;
        let before = side.orders()[idx].clone();
        if !before.belongs_to(requester) {
            return Err(DexError::NotOwner {
                order_id,
                requester: requester.clone(),
            });
        }
        check(&before)?;

        let sequence = if new_price == before.price {
            before.sequence
        } else {
            self.next_sequence()
        };
        let position = side.reprice(idx, new_price, new_amount, sequence);
        let after = side.orders()[position].clone();

        tracing::debug!(
            order_id = %order_id,
            from = idx,
            to = position,
            "order repriced in book"
        );
        Ok((before, after))
    }

    /// Snapshot of one side in book order
    pub fn by_token(&self, symbol: TokenSymbol, side: Side) -> Vec<Order> {
        self.with_side(BookKey::new(symbol, side), |s| s.orders().to_vec())
            .unwrap_or_default()
    }

    /// Snapshot of one trader's orders on one side, in book order
    pub fn by_trader(&self, trader: &TraderId, symbol: TokenSymbol, side: Side) -> Vec<Order> {
        self.with_side(BookKey::new(symbol, side), |s| {
            s.by_trader(trader).cloned().collect()
        })
        .unwrap_or_default()
    }

    pub fn count_for_trader(&self, trader: &TraderId, symbol: TokenSymbol, side: Side) -> usize {
        self.with_side(BookKey::new(symbol, side), |s| s.by_trader(trader).count())
            .unwrap_or(0)
    }

    pub fn get(&self, order_id: OrderId) -> Option<Order> {
        let index = self.index.read();
        let key = *index.get(&order_id)?;
        self.with_side(key, |s| {
            s.position(order_id).and_then(|idx| s.get(idx).cloned())
        })
        .flatten()
    }

    pub fn best_price(&self, symbol: TokenSymbol, side: Side) -> Option<Price> {
        self.with_side(BookKey::new(symbol, side), OrderBookSide::best_price)
            .flatten()
    }

    /// Number of open (BUY, SELL) orders for `symbol`
    pub fn depth(&self, symbol: TokenSymbol) -> (usize, usize) {
        let len = |side| {
            self.with_side(BookKey::new(symbol, side), OrderBookSide::len)
                .unwrap_or(0)
        };
        (len(Side::Buy), len(Side::Sell))
    }

    /// Total number of open orders across all sides
    pub fn open_orders(&self) -> usize {
        self.index.read().len()
    }

    fn next_sequence(&self) -> u64 {
        self.sequence_counter.fetch_add(1, Ordering::AcqRel)
    }

    fn side(&self, key: BookKey) -> Option<Arc<RwLock<OrderBookSide>>> {
        self.sides.read().get(&key).cloned()
    }

    fn with_side<R>(&self, key: BookKey, f: impl FnOnce(&OrderBookSide) -> R) -> Option<R> {
        let side = self.side(key)?;
        let guard = side.read();
        Some(f(&guard))
    }

    fn side_or_create(&self, key: BookKey) -> Arc<RwLock<OrderBookSide>> {
        if let Some(side) = self.side(key) {
            return side;
        }
        let mut sides = self.sides.write();
        Arc::clone(
            sides
                .entry(key)
                .or_insert_with(|| Arc::new(RwLock::new(OrderBookSide::new(key.side)))),
        )
    }
}

impl Default for OrderBook {
    fn default() -> Self {
        Self::new()
    }
}
