// ============================================================================
// Basic Usage Example
// ============================================================================

use custodial_dex::prelude::*;
use custodial_dex::utils::init_tracing;
use std::sync::Arc;

fn print_side(dex: &Dex, symbol: TokenSymbol, side: Side) {
    println!("\n{:?} book for {}:", side, symbol);
    for order in dex.get_order_book(symbol, side) {
        println!(
            "  #{} {} x {} @ {}",
            order.id, order.trader, order.amount, order.price
        );
    }
}

fn main() -> Result<(), DexError> {
    init_tracing(tracing::Level::INFO);
    println!("=== Custodial DEX Example ===\n");

    let owner = TraderId::from("owner");
    let custodian = TraderId::from("dex");
    let link_asset = AssetRef::from("0x514910771af9ca656af840dff83e8264ecf986ca");
    let link = TokenSymbol::new("LINK")?;

    // External ledger holding the real token balances
    let ledger = Arc::new(InMemoryCustody::new());
    let config = DexConfig::new(owner.clone(), custodian.clone())?;
    let dex = Dex::new(config, ledger.clone(), Arc::new(LoggingEventHandler))?;

    dex.add_token(&owner, link, link_asset.clone())?;
    println!("Listed tokens: {:?}", dex.get_token_list());

    // Fund two traders with ETH and LINK
    let traders = [TraderId::from("alice"), TraderId::from("bob")];
    for trader in &traders {
        ledger.mint(&link_asset, trader, 500);
        ledger.approve(&link_asset, trader, &custodian, 200);
        dex.deposit_asset(trader, 1_000)?;
        dex.deposit_token(trader, 200, link)?;
    }
    println!(
        "alice holds {} ETH and {} LINK inside the exchange",
        dex.balance_of(&traders[0], TokenSymbol::new("ETH")?),
        dex.balance_of(&traders[0], link)
    );

    // Place a ladder of orders on both sides
    println!("\nPlacing orders...");
    for (i, trader) in traders.iter().enumerate() {
        let offset = i as Price;
        dex.create_limit_order(trader, Side::Buy, link, 10, 8 + offset)?;
        dex.create_limit_order(trader, Side::Buy, link, 5, 6 + offset)?;
        dex.create_limit_order(trader, Side::Sell, link, 20, 12 + offset)?;
    }
    print_side(&dex, link, Side::Buy);
    print_side(&dex, link, Side::Sell);

    // Over-sized orders are rejected and leave the book alone
    println!("\n=== Rejected Order ===");
    if let Err(err) = dex.create_limit_order(&traders[0], Side::Buy, link, 1_000, 10) {
        println!("  {}", err);
    }

    // Reprice and cancel
    println!("\n=== Update and Delete ===");
    let alice_buys = dex.get_trader_order_book(&traders[0], link, Side::Buy);
    let worst = alice_buys.last().map(|o| o.id);
    if let Some(order_id) = worst {
        let updated = dex.update_limit_order(&traders[0], order_id, 5, 11)?;
        println!("  repriced #{} to {}", updated.id, updated.price);
    }
    let bob_sells = dex.get_trader_order_book(&traders[1], link, Side::Sell);
    if let Some(order) = bob_sells.first() {
        dex.delete_limit_order(&traders[1], order.id)?;
        println!("  deleted #{}", order.id);
    }
    print_side(&dex, link, Side::Buy);
    print_side(&dex, link, Side::Sell);

    let (bids, asks) = dex.depth(link);
    println!("\nDepth: {} bids, {} asks", bids, asks);
    println!(
        "Best bid: {:?}, best ask: {:?}",
        dex.best_price(link, Side::Buy),
        dex.best_price(link, Side::Sell)
    );

    // Tokens leave the exchange back to the external ledger
    dex.withdraw_token(&traders[1], 50, link)?;
    println!(
        "\nbob: {} LINK in exchange, {} LINK on ledger",
        dex.get_my_balance(&traders[1], link),
        ledger.balance_of(&link_asset, &traders[1])
    );

    Ok(())
}
