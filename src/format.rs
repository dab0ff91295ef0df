//! Presentation-time formatting of money, hours and dates.
//!
//! The cost model never rounds.  Rounding to minor units happens here, once, when
//! a value is turned into cell text.

use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};

/// Turns an exact amount into display text.
pub type CurrencyFormatter = Arc<dyn Fn(Decimal) -> String + Send + Sync>;

/// Supplies the date printed in the summary heading.
pub type DateProvider = Arc<dyn Fn() -> NaiveDate + Send + Sync>;

/// Default currency symbol used by [`format_currency`].
pub const DEFAULT_CURRENCY_SYMBOL: &str = "$";

const MINOR_UNIT_DIGITS: u32 = 2;

/// Formats `amount` with the default `$` symbol, two decimals and `,` grouping.
///
/// ```
/// use rust_decimal::Decimal;
/// assert_eq!(quote_report::format::format_currency(Decimal::new(123456789, 3)), "$123,456.79");
/// ```
pub fn format_currency(amount: Decimal) -> String {
    format_with_symbol(amount, DEFAULT_CURRENCY_SYMBOL)
}

/// Builds a formatter that uses `symbol` instead of `$`.
pub fn currency_formatter(symbol: impl Into<String>) -> CurrencyFormatter {
    let symbol = symbol.into();
    Arc::new(move |amount| format_with_symbol(amount, &symbol))
}

/// Returns the formatter used when none is configured.
pub fn default_currency_formatter() -> CurrencyFormatter {
    Arc::new(format_currency)
}

/// Builds a date provider that always returns `date`.
pub fn fixed_date(date: NaiveDate) -> DateProvider {
    Arc::new(move || date)
}

fn format_with_symbol(amount: Decimal, symbol: &str) -> String {
    let mut rounded =
        amount.round_dp_with_strategy(MINOR_UNIT_DIGITS, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(MINOR_UNIT_DIGITS);

    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let digits = rounded.abs().to_string();
    let (whole, fraction) = digits.split_once('.').unwrap_or((digits.as_str(), "00"));

    let sign = if negative { "-" } else { "" };
    format!("{sign}{symbol}{}.{fraction}", group_thousands(whole))
}

fn group_thousands(whole: &str) -> String {
    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (index, ch) in whole.chars().enumerate() {
        if index > 0 && (whole.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

/// Formats a labour hour figure without trailing zeros, e.g. `12.5`.
pub fn format_hours(hours: Decimal) -> String {
    hours.normalize().to_string()
}

/// Formats a date as `16-October-2026`.
pub fn format_long_date(date: NaiveDate) -> String {
    date.format("%d-%B-%Y").to_string()
}
