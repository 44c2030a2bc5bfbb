//! Command handlers - call the engine, format the result
//!
//! All presentation concerns live here: card numbers are masked and
//! timestamps rendered for display. The engine hands back raw UTC rows.

use cexbank_core::WhitelistStatus;
use cexbank_engine::Engine;
use rust_decimal::Decimal;
use std::str::FromStr;

pub async fn register(engine: &Engine, email: &str) -> anyhow::Result<()> {
    let user = engine.register(email).await?;
    println!("✅ Registered user {} ({}), status: {}", user.id, user.email, user.status);
    Ok(())
}

pub async fn kyc(
    engine: &Engine,
    user: i64,
    full_name: &str,
    national_id: &str,
) -> anyhow::Result<()> {
    let user = engine.submit_kyc(user, full_name, national_id).await?;
    println!("✅ User {} activated ({})", user.id, user.email);
    Ok(())
}

pub async fn balance(engine: &Engine, user: i64) -> anyhow::Result<()> {
    let balance = engine.balance_of(user).await?;
    println!("Balance for user {}: {}", user, balance);
    Ok(())
}

pub async fn deposit_fiat(engine: &Engine, user: i64, amount: Decimal) -> anyhow::Result<()> {
    let receipt = engine.deposit_fiat(user, amount).await?;
    println!(
        "✅ Fiat deposit credited (tx: {}), new balance: {}",
        receipt.transaction.id, receipt.balance
    );
    Ok(())
}

pub async fn deposit_web3(engine: &Engine, user: i64, amount: Decimal) -> anyhow::Result<()> {
    let receipt = engine.deposit_web3(user, amount).await?;
    println!(
        "✅ Web3 deposit credited (tx: {}), new balance: {}",
        receipt.transaction.id, receipt.balance
    );
    Ok(())
}

pub fn deposit_address(engine: &Engine) -> anyhow::Result<()> {
    println!("Deposit address: {}", engine.deposit_address());
    Ok(())
}

/// Payee details for the simulated fiat rail. In production these come from
/// operator configuration, not from the ledger.
pub fn deposit_fiat_info() -> anyhow::Result<()> {
    println!("Payee name: Cexbank Exchange Ltd.");
    println!("Payee id:   payments@cexbank.example");
    Ok(())
}

pub async fn transfer(
    engine: &Engine,
    user: i64,
    recipient_email: &str,
    amount: Decimal,
) -> anyhow::Result<()> {
    let receipt = engine.transfer(user, recipient_email, amount).await?;
    println!(
        "✅ Transferred {} to {} (tx: {}), new balance: {}",
        amount, recipient_email, receipt.transaction.id, receipt.balance
    );
    Ok(())
}

pub async fn withdraw_bank(
    engine: &Engine,
    user: i64,
    card: i64,
    amount: Decimal,
) -> anyhow::Result<()> {
    let receipt = engine.withdraw_bank(user, card, amount).await?;
    println!(
        "✅ Bank withdrawal settled (tx: {}), new balance: {}",
        receipt.transaction.id, receipt.balance
    );
    Ok(())
}

pub async fn withdraw_web3(
    engine: &Engine,
    user: i64,
    address: &str,
    amount: Decimal,
) -> anyhow::Result<()> {
    let receipt = engine.withdraw_web3(user, address, amount).await?;
    println!(
        "✅ Web3 withdrawal settled, hash: {} (tx: {}), new balance: {}",
        receipt.transaction.tx_hash.as_deref().unwrap_or("-"),
        receipt.transaction.id,
        receipt.balance
    );
    Ok(())
}

pub async fn history(engine: &Engine, user: i64) -> anyhow::Result<()> {
    let rows = engine.history(user).await?;
    if rows.is_empty() {
        println!("No transactions for user {}", user);
        return Ok(());
    }

    for tx in rows {
        let completed = tx
            .completed_at
            .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
            .unwrap_or_else(|| "-".to_string());
        let mut line = format!(
            "#{:<5} {:<18} {:>16}  {:<9}  created {}  completed {}",
            tx.id,
            tx.kind,
            tx.amount,
            tx.status,
            tx.created_at.format("%Y-%m-%d %H:%M:%S UTC"),
            completed,
        );
        if let Some(email) = &tx.recipient_email {
            line.push_str(&format!("  -> {}", email));
        }
        if let Some(address) = &tx.recipient_address {
            line.push_str(&format!("  -> {}", address));
        }
        if let (Some(bank), Some(card)) = (&tx.bank_name, &tx.card_number) {
            line.push_str(&format!("  -> {} {}", bank, mask_card(card)));
        }
        if let Some(hash) = &tx.tx_hash {
            line.push_str(&format!("  hash {}", hash));
        }
        println!("{}", line);
    }
    Ok(())
}

pub async fn card_add(
    engine: &Engine,
    user: i64,
    holder_name: &str,
    bank_name: &str,
    card_number: &str,
) -> anyhow::Result<()> {
    let card = engine
        .add_card(user, holder_name, bank_name, card_number)
        .await?;
    println!(
        "✅ Card {} added: {} {}",
        card.id,
        card.bank_name,
        mask_card(&card.card_number)
    );
    Ok(())
}

pub async fn card_list(engine: &Engine, user: i64) -> anyhow::Result<()> {
    let cards = engine.list_cards(user).await?;
    if cards.is_empty() {
        println!("No cards for user {}", user);
        return Ok(());
    }
    for card in cards {
        println!(
            "#{:<5} {} {} ({})",
            card.id,
            card.bank_name,
            mask_card(&card.card_number),
            card.holder_name
        );
    }
    Ok(())
}

pub async fn whitelist_list(engine: &Engine) -> anyhow::Result<()> {
    let entries = engine.whitelist_list().await?;
    if entries.is_empty() {
        println!("Whitelist is empty");
        return Ok(());
    }
    for entry in entries {
        let frozen = entry
            .frozen_at
            .map(|t| format!(" (frozen since {})", t.format("%Y-%m-%d %H:%M:%S UTC")))
            .unwrap_or_default();
        println!(
            "#{:<5} {:<8} {}  {}{}",
            entry.id, entry.status, entry.address, entry.label, frozen
        );
    }
    Ok(())
}

pub async fn whitelist_add(engine: &Engine, label: &str, address: &str) -> anyhow::Result<()> {
    let entry = engine.whitelist_add(label, address).await?;
    println!("✅ Whitelisted {} as \"{}\" (id: {})", entry.address, entry.label, entry.id);
    Ok(())
}

pub async fn whitelist_set_status(
    engine: &Engine,
    id: i64,
    status: &str,
) -> anyhow::Result<()> {
    let status = WhitelistStatus::from_str(status)
        .map_err(|_| anyhow::anyhow!("status must be 'normal' or 'frozen', got {status:?}"))?;
    let entry = engine.whitelist_set_status(id, status).await?;
    println!("✅ Whitelist entry {} is now {}", entry.id, entry.status);
    Ok(())
}

/// Mask a card number for display, keeping the last four digits.
fn mask_card(card: &str) -> String {
    if card.len() > 4 {
        format!("**** **** **** {}", &card[card.len() - 4..])
    } else {
        card.to_string()
    }
}
