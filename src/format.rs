//! pt-BR formatting of money and dates.

use chrono::{DateTime, Locale, NaiveDate, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

/// Formats `value` as Brazilian Real, e.g. `R$ 1.234,56` or `-R$ 40,00`.
pub fn currency(value: Decimal) -> String {
    let rounded = value
        .abs()
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    // format_num groups the en-US way; swap the separators for pt-BR.
    let grouped = format_num::format_num!(",.2", rounded.to_f64().unwrap_or_default());
    let number: String = grouped
        .chars()
        .map(|c| match c {
            ',' => '.',
            '.' => ',',
            other => other,
        })
        .collect();
    if value.is_sign_negative() && !rounded.is_zero() {
        format!("-R$ {number}")
    } else {
        format!("R$ {number}")
    }
}

/// The date shown on each row of the transaction listing, e.g. `10/06/21`.
pub fn list_date(date: &DateTime<Utc>) -> String {
    date.format("%d/%m/%y").to_string()
}

/// Day and full month name, e.g. `10 de junho`.
pub fn day_month_long(date: &DateTime<Utc>) -> String {
    date.format_localized("%d de %B", Locale::pt_BR).to_string()
}

/// Day and abbreviated month name, e.g. `10 de jun`.
pub fn day_month_short(date: &DateTime<Utc>) -> String {
    date.format_localized("%d de %b", Locale::pt_BR).to_string()
}

/// The heading of a month, e.g. `junho, 2021`.
pub fn month_year(first_of_month: &NaiveDate) -> String {
    first_of_month
        .format_localized("%B, %Y", Locale::pt_BR)
        .to_string()
}
