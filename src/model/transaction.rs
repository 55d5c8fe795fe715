use crate::model::{find_category, Amount};
use crate::Result;
use anyhow::{bail, ensure};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Whether a transaction brings money in or takes it out.
#[derive(
    Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    /// An entry (income).
    #[value(alias = "income", alias = "entry")]
    Positive,
    /// An expense (outgoing).
    #[value(alias = "expense", alias = "outcome")]
    Negative,
}

serde_plain::derive_display_from_serialize!(TransactionType);
serde_plain::derive_fromstr_from_deserialize!(TransactionType);

/// A single recorded transaction. Records are never mutated once created; they are only appended
/// to a user's list or removed from it.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    id: String,
    name: String,
    amount: Amount,
    #[serde(rename = "type")]
    kind: TransactionType,
    category: String,
    date: DateTime<Utc>,
}

impl TransactionRecord {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        amount: Amount,
        kind: TransactionType,
        category: impl Into<String>,
        date: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            amount,
            kind,
            category: category.into(),
            date,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }

    pub fn kind(&self) -> TransactionType {
        self.kind
    }

    /// The key of the `CategoryDefinition` this transaction is tagged with.
    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn date(&self) -> DateTime<Utc> {
        self.date
    }
}

/// The largest amount a single transaction may carry, R$ 999.999.999.999,99. Sums of many such
/// amounts stay far below `Decimal::MAX`.
fn max_amount() -> Decimal {
    Decimal::new(99_999_999_999_999, 2)
}

/// A validated request to register a transaction. The id and date are assigned when it is stored.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct NewTransaction {
    name: String,
    amount: Amount,
    kind: TransactionType,
    category: String,
}

impl NewTransaction {
    /// Validates the raw form values.
    ///
    /// # Errors
    /// - `name` is blank.
    /// - `amount` is not a number, is not greater than zero, or is above `max_amount`.
    /// - `kind` was not chosen.
    /// - `category` was not chosen or is not a known category key.
    pub fn new(
        name: &str,
        amount: &str,
        kind: Option<TransactionType>,
        category: Option<&str>,
    ) -> Result<Self> {
        let name = name.trim();
        ensure!(!name.is_empty(), "Nome é obrigatório");

        let amount = match Amount::from_str(amount) {
            Ok(amount) => amount,
            Err(_) => bail!("Informe um valor numérico"),
        };
        ensure!(amount.is_positive(), "O valor deve ser positivo");
        ensure!(amount.value() <= max_amount(), "O valor é muito alto");

        let Some(kind) = kind else {
            bail!("Selecione o tipo da transação")
        };

        let category = match category.and_then(find_category) {
            Some(c) => c.key.to_string(),
            None => bail!("Selecione a categoria"),
        };

        Ok(Self {
            name: name.to_string(),
            amount,
            kind,
            category,
        })
    }

    /// Creates the record that will be persisted.
    pub(crate) fn into_record(self, id: String, date: DateTime<Utc>) -> TransactionRecord {
        TransactionRecord::new(id, self.name, self.amount, self.kind, self.category, date)
    }
}
