//! Error types raised while building and validating quotes.

use rust_decimal::Decimal;
use thiserror::Error;

/// A single value in a quote that violates the cost model's invariants.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// A quantity below zero, usually coming from raw column input.
    #[error("quantity must not be negative (got {value})")]
    NegativeQuantity {
        /// The rejected quantity.
        value: i64,
    },

    /// A quantity too large to be represented.
    #[error("quantity {value} is out of range")]
    QuantityOutOfRange {
        /// The rejected quantity.
        value: i64,
    },

    /// A unit cost, explicit cost, labour hours, extra cost or deduction below zero.
    #[error("{field} must not be negative (got {value})")]
    NegativeAmount {
        /// Name of the offending field.
        field: &'static str,
        /// The rejected amount.
        value: Decimal,
    },

    /// A product or sum too large for a decimal amount.
    #[error("{field} overflows the decimal range")]
    AmountOverflow {
        /// Name of the figure that overflowed.
        field: &'static str,
    },

    /// An explicit cost that disagrees with `quantity * unit cost`.
    #[error("{field} is {explicit} but quantity x unit cost is {derived}")]
    InconsistentCost {
        /// Name of the offending field.
        field: &'static str,
        /// The explicitly supplied cost.
        explicit: Decimal,
        /// The cost derived from quantity and unit cost.
        derived: Decimal,
    },
}

/// A quote that cannot be composed into a report.
///
/// Composition validates the whole quote before building any page, so a caller
/// either receives a complete document tree or one of these errors.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum MalformedQuoteError {
    /// Parallel section columns do not have the same number of entries.
    #[error("section '{section}': column '{column}' has {actual} entries, expected {expected}")]
    ColumnLengthMismatch {
        /// Title of the section being built.
        section: String,
        /// Name of the mismatched column.
        column: &'static str,
        /// Number of entries in the material type column.
        expected: usize,
        /// Number of entries in the mismatched column.
        actual: usize,
    },

    /// An entry of parallel section columns failed validation.
    #[error("section '{section}', entry {item}: {source}")]
    InvalidColumnItem {
        /// Title of the section being built.
        section: String,
        /// Zero-based index of the entry.
        item: usize,
        /// The underlying validation failure.
        #[source]
        source: ValidationError,
    },

    /// A line item failed validation.
    #[error("section {section} ('{title}'), item {item}: {source}")]
    InvalidItem {
        /// Zero-based index of the section within the quote.
        section: usize,
        /// Title of the section.
        title: String,
        /// Zero-based index of the item within the section.
        item: usize,
        /// The underlying validation failure.
        #[source]
        source: ValidationError,
    },

    /// The totals of a section cannot be represented.
    #[error("section {section} ('{title}'): {source}")]
    InvalidSection {
        /// Zero-based index of the section within the quote.
        section: usize,
        /// Title of the section.
        title: String,
        /// The underlying validation failure.
        #[source]
        source: ValidationError,
    },

    /// A quote-level amount failed validation.
    #[error("quote: {0}")]
    InvalidQuote(#[source] ValidationError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn messages_name_the_offending_value() {
        let err = ValidationError::NegativeAmount {
            field: "unit labour cost",
            value: dec!(-2.50),
        };
        assert_eq!(err.to_string(), "unit labour cost must not be negative (got -2.50)");

        let err = MalformedQuoteError::ColumnLengthMismatch {
            section: "Boiler room".into(),
            column: "quantities",
            expected: 3,
            actual: 4,
        };
        assert!(err.to_string().contains("'quantities' has 4 entries, expected 3"));
    }

    #[test]
    fn item_errors_expose_their_source() {
        use std::error::Error as _;

        let err = MalformedQuoteError::InvalidItem {
            section: 1,
            title: "Piping".into(),
            item: 0,
            source: ValidationError::NegativeQuantity { value: -1 },
        };
        let source = err.source().expect("item errors carry a source");
        assert_eq!(source.to_string(), "quantity must not be negative (got -1)");
    }
}
