// ============================================================================
// Token Registry
// Owner-curated list of tradable token symbols
// ============================================================================

use crate::domain::{AssetRef, TokenSymbol, TraderId};
use crate::errors::{DexError, DexResult};
use parking_lot::RwLock;
use std::collections::HashMap;

#[derive(Default)]
struct Listing {
    /// Registration order
    symbols: Vec<TokenSymbol>,
    assets: HashMap<TokenSymbol, AssetRef>,
}

/// Maps token symbols to their external asset references.
///
/// Only the owner fixed at construction may list tokens. The custody asset's
/// symbol is reserved and can never be listed as a token.
pub struct TokenRegistry {
    owner: TraderId,
    reserved: TokenSymbol,
    listing: RwLock<Listing>,
}

impl TokenRegistry {
    pub fn new(owner: TraderId, reserved: TokenSymbol) -> Self {
        Self {
            owner,
            reserved,
            listing: RwLock::new(Listing::default()),
        }
    }

    pub fn owner(&self) -> &TraderId {
        &self.owner
    }

    /// List a new tradable token.
    ///
    /// # Errors
    /// `Unauthorized` unless `caller` is the owner, `DuplicateSymbol` if the
    /// symbol is already listed or is the reserved custody symbol.
    pub fn add_token(
        &self,
        caller: &TraderId,
        symbol: TokenSymbol,
        asset: AssetRef,
    ) -> DexResult<()> {
        if caller != &self.owner {
            return Err(DexError::Unauthorized {
                caller: caller.clone(),
            });
        }
        if symbol == self.reserved {
            return Err(DexError::DuplicateSymbol(symbol));
        }

        let mut listing = self.listing.write();
        if listing.assets.contains_key(&symbol) {
            return Err(DexError::DuplicateSymbol(symbol));
        }
        listing.assets.insert(symbol, asset.clone());
        listing.symbols.push(symbol);

        tracing::info!(symbol = %symbol, asset = %asset, "token listed");
        Ok(())
    }

    /// Registered symbols in registration order
    pub fn list_tokens(&self) -> Vec<TokenSymbol> {
        self.listing.read().symbols.clone()
    }

    pub fn resolve(&self, symbol: TokenSymbol) -> DexResult<AssetRef> {
        self.listing
            .read()
            .assets
            .get(&symbol)
            .cloned()
            .ok_or(DexError::UnknownToken(symbol))
    }

    pub fn is_listed(&self, symbol: TokenSymbol) -> bool {
        self.listing.read().assets.contains_key(&symbol)
    }
}
