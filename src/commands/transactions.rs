//! Register, remove and list command handlers.

use crate::args::{RegisterArgs, RemoveArgs};
use crate::commands::{signed_in_user, Out};
use crate::error::{ErrorType, IntoResult};
use crate::format;
use crate::model::{find_category, NewTransaction, TransactionRecord, TransactionType};
use crate::{Config, Result};
use anyhow::Context;
use serde::Serialize;

/// Validates the form values in `args` and appends the transaction to the signed-in user's list.
///
/// # Errors
/// - `ErrorType::Auth` if nobody is signed in.
/// - `ErrorType::Validation` if a value is missing or invalid.
/// - `ErrorType::Storage` if the transaction could not be saved.
pub async fn register(config: &Config, args: &RegisterArgs) -> Result<Out<TransactionRecord>> {
    let user = signed_in_user(config).await?;
    let new = NewTransaction::new(args.name(), args.amount(), args.kind(), args.category())
        .pub_result(ErrorType::Validation)?;
    let record = config
        .transactions()
        .append(&user, new)
        .await
        .pub_result(ErrorType::Storage)?;
    Ok(Out::new(
        format!("Registered '{}' with id {}", record.name(), record.id()),
        record,
    ))
}

/// Removes the transaction with the id in `args`.
///
/// # Errors
/// - `ErrorType::Validation` if no transaction has that id.
pub async fn remove(config: &Config, args: &RemoveArgs) -> Result<Out<TransactionRecord>> {
    let user = signed_in_user(config).await?;
    let removed = config
        .transactions()
        .remove(&user, args.id())
        .await
        .pub_result(ErrorType::Storage)?
        .with_context(|| format!("No transaction with id '{}' was found", args.id()))
        .pub_result(ErrorType::Validation)?;
    Ok(Out::new(format!("Removed '{}'", removed.name()), removed))
}

/// One line of the transaction listing, formatted for display.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct TransactionRow {
    pub id: String,
    pub name: String,
    /// e.g. `R$ 100,00`, or `- R$ 40,00` for an expense.
    pub amount: String,
    pub kind: TransactionType,
    /// The category's display name, or its key if it is not a known category.
    pub category: String,
    /// e.g. `10/06/21`
    pub date: String,
}

impl From<&TransactionRecord> for TransactionRow {
    fn from(r: &TransactionRecord) -> Self {
        let amount = format::currency(r.amount().value());
        let amount = match r.kind() {
            TransactionType::Positive => amount,
            TransactionType::Negative => format!("- {amount}"),
        };
        Self {
            id: r.id().to_string(),
            name: r.name().to_string(),
            amount,
            kind: r.kind(),
            category: find_category(r.category())
                .map(|c| c.name.to_string())
                .unwrap_or_else(|| r.category().to_string()),
            date: format::list_date(&r.date()),
        }
    }
}

/// Lists the signed-in user's transactions in the order they were registered.
pub async fn list(config: &Config) -> Result<Out<Vec<TransactionRow>>> {
    let user = signed_in_user(config).await?;
    let records = config
        .transactions()
        .load(&user)
        .await
        .pub_result(ErrorType::Storage)?;
    let rows: Vec<TransactionRow> = records.iter().map(TransactionRow::from).collect();
    if rows.is_empty() {
        return Ok(Out::new(format!("Listagem\n{}", crate::aggregate::NO_TRANSACTIONS), rows));
    }
    let mut message = String::from("Listagem");
    for row in &rows {
        message.push_str(&format!(
            "\n{}  {:<24} {:>16}  {:<12} {}",
            row.date, row.name, row.amount, row.category, row.id
        ));
    }
    Ok(Out::new(message, rows))
}
