//! Configuration passed once to the report composer.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::cost::CostCheck;
use crate::document::{PageMargins, Palette};
use crate::format::{self, CurrencyFormatter, DateProvider};

/// Name of the default body font family.
pub const DEFAULT_BODY_FONT_FAMILY: &str = "Roboto";

/// Fixed visual constants of a report.
///
/// Everything here is plain data, so a style can be kept in a settings file and
/// deserialized with any serde format.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportStyle {
    /// Border and shading colors.
    pub palette: Palette,
    /// Body font family name; renderers map it to font files.
    pub body_font_family: String,
    /// Widths of the summary table columns: number, hours, labour, material, section cost.
    pub summary_column_widths_mm: [f64; 5],
    /// Widths of the detail table columns: quantity, then the four price columns.
    pub detail_column_widths_mm: [f64; 5],
    /// Margins of the summary page.
    pub summary_margins: PageMargins,
    /// Margins of the section detail pages.
    pub detail_margins: PageMargins,
}

impl Default for ReportStyle {
    fn default() -> Self {
        Self {
            palette: Palette::default(),
            body_font_family: DEFAULT_BODY_FONT_FAMILY.to_owned(),
            summary_column_widths_mm: [12.0, 30.0, 40.0, 40.0, 40.0],
            detail_column_widths_mm: [15.0, 30.0, 30.0, 30.0, 30.0],
            summary_margins: PageMargins::symmetric(20.0, 25.0),
            detail_margins: PageMargins::symmetric(12.5, 40.0),
        }
    }
}

/// Sender details printed in the letterhead frame and the page footers.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Letterhead {
    /// Company name.
    pub name: String,
    /// Street address.
    pub street: String,
    /// City and region, shown in the footer.
    pub locality: String,
    /// Phone number or other contact.
    pub contact: String,
}

impl Letterhead {
    /// The compact sender line shown above the quote title.
    pub fn sender_line(&self) -> String {
        join_present(&[
            self.name.as_str(),
            self.street.as_str(),
            self.contact.as_str(),
        ])
    }

    /// The full line shown in every page footer.
    pub fn footer_line(&self) -> String {
        join_present(&[
            self.name.as_str(),
            self.street.as_str(),
            self.locality.as_str(),
            self.contact.as_str(),
        ])
    }
}

fn join_present(parts: &[&str]) -> String {
    parts
        .iter()
        .filter(|part| !part.trim().is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(" \u{25CF} ")
}

/// Options recognised by [`crate::compose::ReportComposer`].
#[derive(Clone)]
pub struct ComposerConfig {
    style: ReportStyle,
    currency_formatter: CurrencyFormatter,
    date_provider: Option<DateProvider>,
    letterhead: Option<Letterhead>,
    place: Option<String>,
    author: String,
    cost_check: CostCheck,
}

impl Default for ComposerConfig {
    fn default() -> Self {
        Self {
            style: ReportStyle::default(),
            currency_formatter: format::default_currency_formatter(),
            date_provider: None,
            letterhead: None,
            place: None,
            author: String::new(),
            cost_check: CostCheck::default(),
        }
    }
}

impl ComposerConfig {
    /// Creates a configuration with the default style, `$` formatting and no date.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole visual style.
    pub fn with_style(mut self, style: ReportStyle) -> Self {
        self.style = style;
        self
    }

    /// Replaces the palette.
    pub fn with_palette(mut self, palette: Palette) -> Self {
        self.style.palette = palette;
        self
    }

    /// Sets the body font family name.
    pub fn with_body_font_family(mut self, family: impl Into<String>) -> Self {
        self.style.body_font_family = family.into();
        self
    }

    /// Sets the function used to format every money value.
    pub fn with_currency_formatter<F>(mut self, formatter: F) -> Self
    where
        F: Fn(rust_decimal::Decimal) -> String + Send + Sync + 'static,
    {
        self.currency_formatter = std::sync::Arc::new(formatter);
        self
    }

    /// Sets the source of the date printed in the summary heading.
    pub fn with_date_provider(mut self, provider: impl Into<Option<DateProvider>>) -> Self {
        self.date_provider = provider.into();
        self
    }

    /// Pins the printed date.
    pub fn with_date(self, date: chrono::NaiveDate) -> Self {
        self.with_date_provider(format::fixed_date(date))
    }

    /// Sets the sender details.
    pub fn with_letterhead(mut self, letterhead: impl Into<Option<Letterhead>>) -> Self {
        self.letterhead = letterhead.into();
        self
    }

    /// Sets the place printed before the date, e.g. `Thunder Bay`.
    pub fn with_place(mut self, place: impl Into<String>) -> Self {
        self.place = Some(place.into());
        self
    }

    /// Prints the date without a place.
    pub fn without_place(mut self) -> Self {
        self.place = None;
        self
    }

    /// Sets the document author metadata.
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = author.into();
        self
    }

    /// Sets the policy for explicit costs that disagree with quantity x unit cost.
    pub fn with_cost_check(mut self, check: CostCheck) -> Self {
        self.cost_check = check;
        self
    }

    /// Returns the visual style.
    pub fn style(&self) -> &ReportStyle {
        &self.style
    }

    /// Formats `amount` with the configured formatter.
    pub fn format_currency(&self, amount: rust_decimal::Decimal) -> String {
        (self.currency_formatter)(amount)
    }

    /// Returns the date to print, asking the provider if one is configured.
    pub fn current_date(&self) -> Option<chrono::NaiveDate> {
        self.date_provider.as_ref().map(|provider| provider())
    }

    /// Returns the sender details, if any.
    pub fn letterhead(&self) -> Option<&Letterhead> {
        self.letterhead.as_ref()
    }

    /// Returns the place printed before the date, if any.
    pub fn place(&self) -> Option<&str> {
        self.place.as_deref()
    }

    /// Returns the document author.
    pub fn author(&self) -> &str {
        &self.author
    }

    /// Returns the cost consistency policy.
    pub fn cost_check(&self) -> CostCheck {
        self.cost_check
    }
}

impl fmt::Debug for ComposerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComposerConfig")
            .field("style", &self.style)
            .field("date_provider", &self.date_provider.is_some())
            .field("letterhead", &self.letterhead)
            .field("place", &self.place)
            .field("author", &self.author)
            .field("cost_check", &self.cost_check)
            .finish_non_exhaustive()
    }
}
