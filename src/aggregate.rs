//! Aggregation of transaction records for the dashboard and the monthly category summary.
//!
//! Everything here is a pure function of a slice of records plus an optional month filter. Nothing
//! computed here is persisted.

use crate::format;
use crate::model::{TransactionRecord, TransactionType, CATEGORIES};
use crate::{Error, Result};
use anyhow::{ensure, Context};
use chrono::{DateTime, Datelike, Months, NaiveDate, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Shown in place of a date when there are no matching transactions.
pub const NO_TRANSACTIONS: &str = "Não há transações";

/// Sums of entries and expenses.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Serialize)]
pub struct Totals {
    pub entries: Decimal,
    pub expenses: Decimal,
}

impl Totals {
    /// Entries minus expenses.
    pub fn net(&self) -> Decimal {
        saturating_add(self.entries, -self.expenses)
    }
}

/// Adds without panicking. Stored amounts are not bounded, so a sum that overflows is clamped to
/// `Decimal::MAX` or `Decimal::MIN`.
fn saturating_add(a: Decimal, b: Decimal) -> Decimal {
    match a.checked_add(b) {
        Some(sum) => sum,
        None if b.is_sign_negative() => Decimal::MIN,
        None => Decimal::MAX,
    }
}

fn saturating_sum(values: impl Iterator<Item = Decimal>) -> Decimal {
    values.fold(Decimal::ZERO, saturating_add)
}

/// Partitions `records` by type and sums each partition.
pub fn totals(records: &[TransactionRecord]) -> Totals {
    records.iter().fold(Totals::default(), |mut acc, r| {
        match r.kind() {
            TransactionType::Positive => {
                acc.entries = saturating_add(acc.entries, r.amount().value())
            }
            TransactionType::Negative => {
                acc.expenses = saturating_add(acc.expenses, r.amount().value())
            }
        }
        acc
    })
}

/// The most recent date among records of type `kind`, or `None` if there are none.
pub fn last_transaction_date(
    records: &[TransactionRecord],
    kind: TransactionType,
) -> Option<DateTime<Utc>> {
    records
        .iter()
        .filter(|r| r.kind() == kind)
        .map(|r| r.date())
        .max()
}

/// The earliest and latest dates across all of `records`.
pub fn interval(records: &[TransactionRecord]) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let first = records.iter().map(|r| r.date()).min()?;
    let last = records.iter().map(|r| r.date()).max()?;
    Some((first, last))
}

/// Describes the span of all `records`: `01 de jun ~ 10 de jun` when both ends fall in the same
/// year, otherwise `01 de dez. 2020 ~ 10 de jun. 2021`.
pub fn interval_label(records: &[TransactionRecord]) -> String {
    match interval(records) {
        None => NO_TRANSACTIONS.to_string(),
        Some((first, last)) if first.year() == last.year() => format!(
            "{} ~ {}",
            format::day_month_short(&first),
            format::day_month_short(&last)
        ),
        Some((first, last)) => format!(
            "{}. {} ~ {}. {}",
            format::day_month_short(&first),
            first.year(),
            format::day_month_short(&last),
            last.year()
        ),
    }
}

/// The three highlight cards of the dashboard.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct HighlightSummary {
    pub entries_total: Decimal,
    pub expenses_total: Decimal,
    pub net_total: Decimal,
    pub last_entry_date: Option<DateTime<Utc>>,
    pub last_expense_date: Option<DateTime<Utc>>,
    pub interval_label: String,
}

impl HighlightSummary {
    /// e.g. `Última entrada dia 01 de junho`
    pub fn entries_caption(&self) -> String {
        caption("Última entrada dia", self.last_entry_date)
    }

    /// e.g. `Última saída dia 10 de junho`
    pub fn expenses_caption(&self) -> String {
        caption("Última saída dia", self.last_expense_date)
    }
}

fn caption(prefix: &str, date: Option<DateTime<Utc>>) -> String {
    match date {
        Some(date) => format!("{prefix} {}", format::day_month_long(&date)),
        None => NO_TRANSACTIONS.to_string(),
    }
}

pub fn highlights(records: &[TransactionRecord]) -> HighlightSummary {
    let totals = totals(records);
    HighlightSummary {
        entries_total: totals.entries,
        expenses_total: totals.expenses,
        net_total: totals.net(),
        last_entry_date: last_transaction_date(records, TransactionType::Positive),
        last_expense_date: last_transaction_date(records, TransactionType::Negative),
        interval_label: interval_label(records),
    }
}

/// A calendar month used to filter the category summary.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize)]
pub struct MonthFilter {
    year: i32,
    month: u32,
}

impl MonthFilter {
    /// # Errors
    /// Returns an error unless `month` is in `1..=12` and the year is representable.
    pub fn new(year: i32, month: u32) -> Result<Self> {
        ensure!(
            (1..=12).contains(&month),
            "Month must be between 1 and 12, got {month}"
        );
        NaiveDate::from_ymd_opt(year, month, 1)
            .with_context(|| format!("The year {year} is out of range"))?;
        Ok(Self { year, month })
    }

    /// The month containing `date`.
    pub fn containing(date: &DateTime<Utc>) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// The current month.
    pub fn current() -> Self {
        Self::containing(&Utc::now())
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn contains(&self, date: &DateTime<Utc>) -> bool {
        date.year() == self.year && date.month() == self.month
    }

    pub fn next(&self) -> Self {
        self.shift(|d| d.checked_add_months(Months::new(1)))
    }

    pub fn previous(&self) -> Self {
        self.shift(|d| d.checked_sub_months(Months::new(1)))
    }

    fn first_day(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
    }

    // Stays put at the edge of the representable calendar.
    fn shift(&self, f: impl Fn(NaiveDate) -> Option<NaiveDate>) -> Self {
        match self.first_day().and_then(f) {
            Some(d) => Self {
                year: d.year(),
                month: d.month(),
            },
            None => *self,
        }
    }
}

impl Display for MonthFilter {
    /// e.g. `junho, 2021`
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.first_day() {
            Some(d) => f.write_str(&format::month_year(&d)),
            None => write!(f, "{:02}/{}", self.month, self.year),
        }
    }
}

impl FromStr for MonthFilter {
    type Err = Error;

    /// Parses `YYYY-MM`, e.g. `2021-06`.
    fn from_str(s: &str) -> Result<Self> {
        let (year, month) = s
            .trim()
            .split_once('-')
            .with_context(|| format!("Expected a month like 2021-06, got '{s}'"))?;
        let year = year
            .parse()
            .with_context(|| format!("Invalid year in '{s}'"))?;
        let month = month
            .parse()
            .with_context(|| format!("Invalid month in '{s}'"))?;
        Self::new(year, month)
    }
}

/// The expenses of one category within a month.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct CategoryAggregate {
    pub key: &'static str,
    pub name: &'static str,
    pub color: &'static str,
    pub total: Decimal,
    /// Share of the month's expenses, rounded to a whole percent.
    pub percent: Decimal,
}

impl CategoryAggregate {
    pub fn total_formatted(&self) -> String {
        format::currency(self.total)
    }

    /// e.g. `25%`
    pub fn percent_label(&self) -> String {
        format!("{}%", self.percent)
    }
}

/// Breaks down the expenses that fall within `month` by category.
///
/// Categories are returned in the order of `CATEGORIES` and only when their sum is positive.
/// Expenses tagged with an unknown category count toward the month's total but appear in no
/// category.
pub fn by_category(records: &[TransactionRecord], month: MonthFilter) -> Vec<CategoryAggregate> {
    let expenses: Vec<&TransactionRecord> = expenses_in(records, month).collect();
    let expenses_total = saturating_sum(expenses.iter().map(|r| r.amount().value()));

    CATEGORIES
        .iter()
        .filter_map(|category| {
            let total = saturating_sum(
                expenses
                    .iter()
                    .filter(|r| r.category() == category.key)
                    .map(|r| r.amount().value()),
            );
            if total <= Decimal::ZERO {
                return None;
            }
            Some(CategoryAggregate {
                key: category.key,
                name: category.name,
                color: category.color,
                total,
                percent: percent_of(total, expenses_total),
            })
        })
        .collect()
}

/// The sum of the expenses that fall within `month`, whatever their category.
pub fn month_expenses(records: &[TransactionRecord], month: MonthFilter) -> Decimal {
    saturating_sum(expenses_in(records, month).map(|r| r.amount().value()))
}

fn expenses_in(
    records: &[TransactionRecord],
    month: MonthFilter,
) -> impl Iterator<Item = &TransactionRecord> {
    records
        .iter()
        .filter(move |r| r.kind() == TransactionType::Negative && month.contains(&r.date()))
}

fn percent_of(part: Decimal, whole: Decimal) -> Decimal {
    if whole.is_zero() {
        return Decimal::ZERO;
    }
    part.checked_div(whole)
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .unwrap_or(Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .normalize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Amount;
    use chrono::TimeZone;
    use std::str::FromStr;

    fn record(
        amount: &str,
        kind: TransactionType,
        category: &str,
        (y, m, d): (i32, u32, u32),
    ) -> TransactionRecord {
        TransactionRecord::new(
            uuid::Uuid::new_v4().to_string(),
            "t",
            Amount::from_str(amount).unwrap(),
            kind,
            category,
            Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap(),
        )
    }

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    use TransactionType::{Negative, Positive};

    fn example() -> Vec<TransactionRecord> {
        vec![
            record("100", Positive, "salary", (2021, 6, 1)),
            record("40", Negative, "food", (2021, 6, 10)),
        ]
    }

    #[test]
    fn test_example_totals() {
        let h = highlights(&example());
        assert_eq!(h.entries_total, dec("100"));
        assert_eq!(h.expenses_total, dec("40"));
        assert_eq!(h.net_total, dec("60"));
        assert_eq!(h.entries_caption(), "Última entrada dia 01 de junho");
        assert_eq!(h.expenses_caption(), "Última saída dia 10 de junho");
        assert_eq!(h.interval_label, "01 de jun ~ 10 de jun");
    }

    #[test]
    fn test_example_categories() {
        let month = MonthFilter::new(2021, 6).unwrap();
        let cats = by_category(&example(), month);
        assert_eq!(cats.len(), 1);
        assert_eq!(cats[0].key, "food");
        assert_eq!(cats[0].total, dec("40"));
        assert_eq!(cats[0].percent_label(), "100%");
        assert_eq!(cats[0].total_formatted(), "R$ 40,00");
    }

    #[test]
    fn test_empty() {
        let h = highlights(&[]);
        assert_eq!(h.entries_total, Decimal::ZERO);
        assert_eq!(h.expenses_total, Decimal::ZERO);
        assert_eq!(h.net_total, Decimal::ZERO);
        assert_eq!(h.entries_caption(), NO_TRANSACTIONS);
        assert_eq!(h.expenses_caption(), NO_TRANSACTIONS);
        assert_eq!(h.interval_label, NO_TRANSACTIONS);
        assert!(by_category(&[], MonthFilter::new(2021, 6).unwrap()).is_empty());
    }

    #[test]
    fn test_net_is_entries_minus_expenses() {
        let records = vec![
            record("10.25", Positive, "salary", (2021, 1, 3)),
            record("3.10", Negative, "food", (2021, 1, 4)),
            record("7", Negative, "car", (2021, 2, 4)),
            record("1500", Positive, "salary", (2021, 2, 5)),
            record("0.65", Negative, "leisure", (2021, 3, 1)),
        ];
        let t = totals(&records);
        assert_eq!(t.entries, dec("1510.25"));
        assert_eq!(t.expenses, dec("10.75"));
        assert_eq!(t.net(), t.entries - t.expenses);
        assert_eq!(t.net(), dec("1499.50"));
    }

    #[test]
    fn test_only_expenses_gives_no_entry_date() {
        let records = vec![record("5", Negative, "food", (2021, 6, 2))];
        let h = highlights(&records);
        assert_eq!(h.entries_caption(), NO_TRANSACTIONS);
        assert!(h.last_expense_date.is_some());
    }

    #[test]
    fn test_last_transaction_date_ignores_order() {
        let records = vec![
            record("1", Negative, "food", (2021, 6, 20)),
            record("1", Negative, "food", (2021, 6, 2)),
            record("1", Positive, "salary", (2021, 7, 1)),
        ];
        assert_eq!(
            last_transaction_date(&records, Negative),
            Some(Utc.with_ymd_and_hms(2021, 6, 20, 12, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_interval_label_across_years() {
        let records = vec![
            record("1", Negative, "food", (2021, 6, 10)),
            record("1", Positive, "salary", (2020, 12, 1)),
        ];
        assert_eq!(
            interval_label(&records),
            "01 de dez. 2020 ~ 10 de jun. 2021"
        );
    }

    #[test]
    fn test_categories_filtered_to_month_and_ordered() {
        let records = vec![
            record("30", Negative, "leisure", (2021, 6, 5)),
            record("10", Negative, "purchases", (2021, 6, 6)),
            record("60", Negative, "food", (2021, 6, 7)),
            // other month
            record("999", Negative, "car", (2021, 5, 31)),
            // entries never count
            record("500", Positive, "salary", (2021, 6, 1)),
        ];
        let cats = by_category(&records, MonthFilter::new(2021, 6).unwrap());
        let keys: Vec<&str> = cats.iter().map(|c| c.key).collect();
        assert_eq!(keys, vec!["purchases", "food", "leisure"]);
        let percents: Vec<String> = cats.iter().map(|c| c.percent_label()).collect();
        assert_eq!(percents, vec!["10%", "60%", "30%"]);
    }

    #[test]
    fn test_percent_rounding_stays_near_one_hundred() {
        let records = vec![
            record("1", Negative, "purchases", (2021, 6, 5)),
            record("1", Negative, "food", (2021, 6, 5)),
            record("1", Negative, "car", (2021, 6, 5)),
        ];
        let cats = by_category(&records, MonthFilter::new(2021, 6).unwrap());
        assert_eq!(cats.len(), 3);
        assert!(cats.iter().all(|c| c.percent == dec("33")));
        let sum: Decimal = cats.iter().map(|c| c.percent).sum();
        let tolerance = Decimal::from(cats.len());
        assert!((sum - Decimal::ONE_HUNDRED).abs() <= tolerance);
    }

    #[test]
    fn test_unknown_category_counts_toward_total_only() {
        let records = vec![
            record("50", Negative, "food", (2021, 6, 5)),
            record("50", Negative, "mystery", (2021, 6, 5)),
        ];
        let cats = by_category(&records, MonthFilter::new(2021, 6).unwrap());
        assert_eq!(cats.len(), 1);
        assert_eq!(cats[0].percent_label(), "50%");
    }

    #[test]
    fn test_percent_of_zero_whole() {
        assert_eq!(percent_of(dec("5"), Decimal::ZERO), Decimal::ZERO);
    }

    #[test]
    fn test_month_filter_navigation() {
        let jan = MonthFilter::new(2021, 1).unwrap();
        assert_eq!(jan.previous(), MonthFilter::new(2020, 12).unwrap());
        let dec_ = MonthFilter::new(2021, 12).unwrap();
        assert_eq!(dec_.next(), MonthFilter::new(2022, 1).unwrap());
        assert_eq!(MonthFilter::new(2021, 6).unwrap().to_string(), "junho, 2021");
    }

    #[test]
    fn test_month_filter_rejects_bad_month() {
        assert!(MonthFilter::new(2021, 0).is_err());
        assert!(MonthFilter::new(2021, 13).is_err());
    }

    #[test]
    fn test_month_filter_from_str() {
        let june = MonthFilter::from_str("2021-06").unwrap();
        assert_eq!(june, MonthFilter::new(2021, 6).unwrap());
        assert!(MonthFilter::from_str("2021-13").is_err());
        assert!(MonthFilter::from_str("junho").is_err());
    }

    #[test]
    fn test_month_filter_contains() {
        let june = MonthFilter::new(2021, 6).unwrap();
        assert!(june.contains(&Utc.with_ymd_and_hms(2021, 6, 30, 23, 59, 59).unwrap()));
        assert!(!june.contains(&Utc.with_ymd_and_hms(2021, 7, 1, 0, 0, 0).unwrap()));
        assert!(!june.contains(&Utc.with_ymd_and_hms(2020, 6, 15, 0, 0, 0).unwrap()));
    }

    #[test]
    fn test_huge_stored_amounts_do_not_overflow() {
        let huge = "79228162514264337593543950335";
        let records = vec![
            record(huge, Positive, "salary", (2021, 6, 1)),
            record(huge, Positive, "salary", (2021, 6, 2)),
            record(huge, Negative, "food", (2021, 6, 3)),
            record(huge, Negative, "car", (2021, 6, 4)),
        ];
        let summary = highlights(&records);
        assert_eq!(summary.entries_total, Decimal::MAX);
        assert_eq!(summary.expenses_total, Decimal::MAX);
        assert_eq!(summary.net_total, Decimal::ZERO);

        let june = MonthFilter::new(2021, 6).unwrap();
        assert_eq!(month_expenses(&records, june), Decimal::MAX);
        let categories = by_category(&records, june);
        assert_eq!(categories.len(), 2);
        assert!(categories.iter().all(|c| c.percent == dec("100")));
    }
}
