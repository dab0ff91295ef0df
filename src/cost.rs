//! Cost model for quotes: line items grouped into sections grouped into a quote.
//!
//! Every derived figure (section totals, quote subtotal and total) is computed on
//! demand from the current items, so a total can never lag behind an edit.  All
//! money uses [`Decimal`]; rounding to minor units is left to the presentation
//! layer in [`crate::format`].

use log::warn;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{MalformedQuoteError, ValidationError};

/// Largest difference tolerated between an explicit cost and `quantity * unit cost`.
fn cost_tolerance() -> Decimal {
    Decimal::new(5, 3)
}

/// Policy applied when an explicit cost disagrees with `quantity * unit cost`.
///
/// Explicit costs are always the values that get summed and printed.  The policy
/// only decides whether a disagreement is reported as an error.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostCheck {
    /// Accept the explicit value and log a warning.
    #[default]
    Lenient,
    /// Reject the item with [`ValidationError::InconsistentCost`].
    Strict,
}

/// One billable entry within a [`Section`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    description: String,
    quantity: u32,
    unit_labour_cost: Decimal,
    unit_material_cost: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    labour_cost: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    material_cost: Option<Decimal>,
    #[serde(default)]
    labour_hours: Decimal,
}

impl LineItem {
    /// Starts building a line item with the given material or labour description.
    pub fn builder(description: impl Into<String>) -> LineItemBuilder {
        LineItemBuilder::new(description)
    }

    /// Returns the material or labour type label.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the number of units.
    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    /// Returns the labour cost per unit.
    pub fn unit_labour_cost(&self) -> Decimal {
        self.unit_labour_cost
    }

    /// Returns the material cost per unit.
    pub fn unit_material_cost(&self) -> Decimal {
        self.unit_material_cost
    }

    /// Returns the labour hours booked against this item.
    pub fn labour_hours(&self) -> Decimal {
        self.labour_hours
    }

    /// Returns the explicitly supplied labour cost, if any.
    pub fn explicit_labour_cost(&self) -> Option<Decimal> {
        self.labour_cost
    }

    /// Returns the explicitly supplied material cost, if any.
    pub fn explicit_material_cost(&self) -> Option<Decimal> {
        self.material_cost
    }

    /// Returns `quantity * unit_labour_cost`.
    pub fn derived_labour_cost(&self) -> Decimal {
        Decimal::from(self.quantity) * self.unit_labour_cost
    }

    /// Returns `quantity * unit_material_cost`.
    pub fn derived_material_cost(&self) -> Decimal {
        Decimal::from(self.quantity) * self.unit_material_cost
    }

    /// Returns the labour cost: the explicit value when present, otherwise the derived one.
    pub fn labour_cost(&self) -> Decimal {
        self.labour_cost
            .unwrap_or_else(|| self.derived_labour_cost())
    }

    /// Returns the material cost: the explicit value when present, otherwise the derived one.
    pub fn material_cost(&self) -> Decimal {
        self.material_cost
            .unwrap_or_else(|| self.derived_material_cost())
    }

    /// Returns the labour plus material cost of the item.
    pub fn total_cost(&self) -> Decimal {
        self.labour_cost() + self.material_cost()
    }

    /// Checks non-negativity and, depending on `check`, cost consistency.
    pub fn validate(&self, check: CostCheck) -> Result<(), ValidationError> {
        non_negative("unit labour cost", self.unit_labour_cost)?;
        non_negative("unit material cost", self.unit_material_cost)?;
        non_negative("labour hours", self.labour_hours)?;

        let derived_labour = checked_product("labour cost", self.quantity, self.unit_labour_cost)?;
        let derived_material =
            checked_product("material cost", self.quantity, self.unit_material_cost)?;

        if let Some(explicit) = self.labour_cost {
            non_negative("labour cost", explicit)?;
            self.check_consistency("labour cost", explicit, derived_labour, check)?;
        }
        if let Some(explicit) = self.material_cost {
            non_negative("material cost", explicit)?;
            self.check_consistency("material cost", explicit, derived_material, check)?;
        }

        checked_sum("total cost", self.labour_cost(), self.material_cost())?;
        Ok(())
    }

    fn check_consistency(
        &self,
        field: &'static str,
        explicit: Decimal,
        derived: Decimal,
        check: CostCheck,
    ) -> Result<(), ValidationError> {
        if (explicit - derived).abs() <= cost_tolerance() {
            return Ok(());
        }

        match check {
            CostCheck::Strict => Err(ValidationError::InconsistentCost {
                field,
                explicit,
                derived,
            }),
            CostCheck::Lenient => {
                warn!(
                    "'{}': explicit {} {} differs from quantity x unit cost {}; using the explicit value",
                    self.description, field, explicit, derived
                );
                Ok(())
            }
        }
    }
}

fn non_negative(field: &'static str, value: Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(ValidationError::NegativeAmount { field, value });
    }
    Ok(())
}

fn checked_product(
    field: &'static str,
    quantity: u32,
    unit_cost: Decimal,
) -> Result<Decimal, ValidationError> {
    Decimal::from(quantity)
        .checked_mul(unit_cost)
        .ok_or(ValidationError::AmountOverflow { field })
}

fn checked_sum(field: &'static str, a: Decimal, b: Decimal) -> Result<Decimal, ValidationError> {
    a.checked_add(b)
        .ok_or(ValidationError::AmountOverflow { field })
}

/// Builder for [`LineItem`] values.
///
/// Costs left unset are derived from the quantity and unit cost.
#[derive(Clone, Debug, Default)]
pub struct LineItemBuilder {
    description: String,
    quantity: u32,
    unit_labour_cost: Decimal,
    unit_material_cost: Decimal,
    labour_cost: Option<Decimal>,
    material_cost: Option<Decimal>,
    labour_hours: Decimal,
}

impl LineItemBuilder {
    /// Creates a builder for an item with the given description.
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            ..Self::default()
        }
    }

    /// Sets the number of units.
    pub fn quantity(mut self, quantity: u32) -> Self {
        self.quantity = quantity;
        self
    }

    /// Sets the labour cost per unit.
    pub fn unit_labour_cost(mut self, cost: Decimal) -> Self {
        self.unit_labour_cost = cost;
        self
    }

    /// Sets the material cost per unit.
    pub fn unit_material_cost(mut self, cost: Decimal) -> Self {
        self.unit_material_cost = cost;
        self
    }

    /// Supplies the labour cost explicitly instead of deriving it.
    pub fn labour_cost(mut self, cost: impl Into<Option<Decimal>>) -> Self {
        self.labour_cost = cost.into();
        self
    }

    /// Supplies the material cost explicitly instead of deriving it.
    pub fn material_cost(mut self, cost: impl Into<Option<Decimal>>) -> Self {
        self.material_cost = cost.into();
        self
    }

    /// Sets the labour hours booked against the item.
    pub fn labour_hours(mut self, hours: Decimal) -> Self {
        self.labour_hours = hours;
        self
    }

    /// Builds the item, rejecting negative amounts.
    ///
    /// Explicit costs that disagree with the derived ones are accepted here; use
    /// [`LineItemBuilder::build_checked`] to apply a stricter [`CostCheck`].
    pub fn build(self) -> Result<LineItem, ValidationError> {
        self.build_checked(CostCheck::Lenient)
    }

    /// Builds the item and validates it with the given policy.
    pub fn build_checked(self, check: CostCheck) -> Result<LineItem, ValidationError> {
        let item = LineItem {
            description: self.description,
            quantity: self.quantity,
            unit_labour_cost: self.unit_labour_cost,
            unit_material_cost: self.unit_material_cost,
            labour_cost: self.labour_cost,
            material_cost: self.material_cost,
            labour_hours: self.labour_hours,
        };
        item.validate(check)?;
        Ok(item)
    }
}

/// Aggregated figures of a [`Section`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionTotals {
    /// Sum of the items' labour hours.
    pub total_labour_hours: Decimal,
    /// Sum of the items' labour costs.
    pub total_labour_cost: Decimal,
    /// Sum of the items' material costs.
    pub total_material_cost: Decimal,
    /// Labour plus material cost.
    pub total_cost: Decimal,
}

/// Computes the totals of `section` from its current items.
///
/// An empty section yields all-zero totals.
///
/// # Panics
///
/// Panics if a figure overflows the decimal range.  [`Quote::validate`] rejects
/// such quotes up front.
pub fn compute_section_totals(section: &Section) -> SectionTotals {
    let total_labour_hours: Decimal = section.items.iter().map(LineItem::labour_hours).sum();
    let total_labour_cost: Decimal = section.items.iter().map(LineItem::labour_cost).sum();
    let total_material_cost: Decimal = section.items.iter().map(LineItem::material_cost).sum();

    SectionTotals {
        total_labour_hours,
        total_labour_cost,
        total_material_cost,
        total_cost: total_labour_cost + total_material_cost,
    }
}

/// Parallel-column input for a section, as collected by simple data-entry forms.
///
/// `material_types`, `quantities`, `labour_unit_costs` and `material_unit_costs`
/// must all have the same length.  The explicit cost columns and the hours
/// column may be left empty, in which case costs are derived and hours are zero;
/// when filled they must match the other columns too.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SectionColumns {
    /// Description of each entry.
    pub material_types: Vec<String>,
    /// Quantity of each entry; negative values are rejected.
    pub quantities: Vec<i64>,
    /// Labour cost per unit of each entry.
    pub labour_unit_costs: Vec<Decimal>,
    /// Explicit labour cost of each entry, or empty.
    pub labour_costs: Vec<Decimal>,
    /// Material cost per unit of each entry.
    pub material_unit_costs: Vec<Decimal>,
    /// Explicit material cost of each entry, or empty.
    pub material_costs: Vec<Decimal>,
    /// Labour hours of each entry, or empty.
    pub labour_hours: Vec<Decimal>,
}

/// A named group of line items representing one job.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    title: String,
    #[serde(default)]
    items: Vec<LineItem>,
}

impl Section {
    /// Creates an empty section with the given title.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            items: Vec::new(),
        }
    }

    /// Builds a section from parallel columns, checking that they line up.
    pub fn from_columns(
        title: impl Into<String>,
        columns: SectionColumns,
    ) -> Result<Self, MalformedQuoteError> {
        let title = title.into();
        let expected = columns.material_types.len();

        let check_len = |column: &'static str, actual: usize, optional: bool| {
            if actual == expected || (optional && actual == 0) {
                Ok(())
            } else {
                Err(MalformedQuoteError::ColumnLengthMismatch {
                    section: title.clone(),
                    column,
                    expected,
                    actual,
                })
            }
        };
        check_len("quantities", columns.quantities.len(), false)?;
        check_len("labour_unit_costs", columns.labour_unit_costs.len(), false)?;
        check_len("material_unit_costs", columns.material_unit_costs.len(), false)?;
        check_len("labour_costs", columns.labour_costs.len(), true)?;
        check_len("material_costs", columns.material_costs.len(), true)?;
        check_len("labour_hours", columns.labour_hours.len(), true)?;

        let mut section = Section::new(title);
        for (index, description) in columns.material_types.into_iter().enumerate() {
            let invalid = |source| MalformedQuoteError::InvalidColumnItem {
                section: section.title.clone(),
                item: index,
                source,
            };

            let raw_quantity = columns.quantities[index];
            if raw_quantity < 0 {
                return Err(invalid(ValidationError::NegativeQuantity {
                    value: raw_quantity,
                }));
            }
            let quantity = u32::try_from(raw_quantity).map_err(|_| {
                invalid(ValidationError::QuantityOutOfRange {
                    value: raw_quantity,
                })
            })?;

            let item = LineItem::builder(description)
                .quantity(quantity)
                .unit_labour_cost(columns.labour_unit_costs[index])
                .unit_material_cost(columns.material_unit_costs[index])
                .labour_cost(columns.labour_costs.get(index).copied())
                .material_cost(columns.material_costs.get(index).copied())
                .labour_hours(columns.labour_hours.get(index).copied().unwrap_or_default())
                .build()
                .map_err(invalid)?;
            section.items.push(item);
        }

        Ok(section)
    }

    /// Returns the section title.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the items in presentation order.
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    /// Returns the items for in-place edits; totals follow automatically.
    pub fn items_mut(&mut self) -> &mut Vec<LineItem> {
        &mut self.items
    }

    /// Appends an item.
    pub fn push_item(&mut self, item: LineItem) {
        self.items.push(item);
    }

    /// Appends an item and returns the updated section.
    pub fn with_item(mut self, item: LineItem) -> Self {
        self.items.push(item);
        self
    }

    /// Extends the section with multiple items and returns the updated section.
    pub fn with_items<I>(mut self, items: I) -> Self
    where
        I: IntoIterator<Item = LineItem>,
    {
        self.items.extend(items);
        self
    }

    /// Removes and returns the item at `index`, if it exists.
    pub fn remove_item(&mut self, index: usize) -> Option<LineItem> {
        (index < self.items.len()).then(|| self.items.remove(index))
    }

    /// Computes the section totals from the current items.
    pub fn totals(&self) -> SectionTotals {
        compute_section_totals(self)
    }
}

/// Aggregated figures of a [`Quote`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteTotals {
    /// Sum of the sections' labour hours.
    pub total_labour_hours: Decimal,
    /// Sum of the sections' total costs.
    pub subtotal: Decimal,
    /// `subtotal + extra_costs - cost_deductions`.
    pub total_cost: Decimal,
}

/// Computes the totals of `quote`, recomputing every section bottom-up.
///
/// # Panics
///
/// Panics if a figure overflows the decimal range.  [`Quote::validate`] rejects
/// such quotes up front.
pub fn compute_quote_totals(quote: &Quote) -> QuoteTotals {
    let (total_labour_hours, subtotal) = quote
        .sections
        .iter()
        .map(Section::totals)
        .fold((Decimal::ZERO, Decimal::ZERO), |(hours, cost), totals| {
            (hours + totals.total_labour_hours, cost + totals.total_cost)
        });

    QuoteTotals {
        total_labour_hours,
        subtotal,
        total_cost: subtotal + quote.extra_costs - quote.cost_deductions,
    }
}

/// The top-level cost document: ordered sections plus flat adjustments.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    title: String,
    #[serde(default)]
    sections: Vec<Section>,
    #[serde(default)]
    extra_costs: Decimal,
    #[serde(default)]
    cost_deductions: Decimal,
}

impl Quote {
    /// Creates an empty quote with the given title.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Returns the quote title.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the sections in presentation order.
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Returns the sections for in-place edits; totals follow automatically.
    pub fn sections_mut(&mut self) -> &mut Vec<Section> {
        &mut self.sections
    }

    /// Appends a section.
    pub fn push_section(&mut self, section: Section) {
        self.sections.push(section);
    }

    /// Appends a section and returns the updated quote.
    pub fn with_section(mut self, section: Section) -> Self {
        self.sections.push(section);
        self
    }

    /// Returns the flat extra costs (delivery, admin fees).
    pub fn extra_costs(&self) -> Decimal {
        self.extra_costs
    }

    /// Returns the flat cost deductions (discounts).
    pub fn cost_deductions(&self) -> Decimal {
        self.cost_deductions
    }

    /// Sets the extra costs, rejecting negative amounts.
    pub fn set_extra_costs(&mut self, amount: Decimal) -> Result<(), ValidationError> {
        non_negative("extra costs", amount)?;
        self.extra_costs = amount;
        Ok(())
    }

    /// Sets the cost deductions, rejecting negative amounts.
    pub fn set_cost_deductions(&mut self, amount: Decimal) -> Result<(), ValidationError> {
        non_negative("cost deductions", amount)?;
        self.cost_deductions = amount;
        Ok(())
    }

    /// Computes the quote totals from the current sections.
    pub fn totals(&self) -> QuoteTotals {
        compute_quote_totals(self)
    }

    /// Validates every amount in the quote and checks that all totals fit.
    ///
    /// Quotes obtained through deserialization skip the builders, so composition
    /// calls this before producing any output.
    pub fn validate(&self, check: CostCheck) -> Result<(), MalformedQuoteError> {
        non_negative("extra costs", self.extra_costs).map_err(MalformedQuoteError::InvalidQuote)?;
        non_negative("cost deductions", self.cost_deductions)
            .map_err(MalformedQuoteError::InvalidQuote)?;

        let mut hours = Decimal::ZERO;
        let mut subtotal = Decimal::ZERO;
        for (section_index, section) in self.sections.iter().enumerate() {
            for (item_index, item) in section.items.iter().enumerate() {
                item.validate(check)
                    .map_err(|source| MalformedQuoteError::InvalidItem {
                        section: section_index,
                        title: section.title.clone(),
                        item: item_index,
                        source,
                    })?;
            }

            let totals = checked_section_totals(section).map_err(|source| {
                MalformedQuoteError::InvalidSection {
                    section: section_index,
                    title: section.title.clone(),
                    source,
                }
            })?;
            hours = checked_sum("quote labour hours", hours, totals.total_labour_hours)
                .map_err(MalformedQuoteError::InvalidQuote)?;
            subtotal = checked_sum("subtotal", subtotal, totals.total_cost)
                .map_err(MalformedQuoteError::InvalidQuote)?;
        }

        checked_sum("total cost", subtotal, self.extra_costs)
            .and_then(|total| {
                total
                    .checked_sub(self.cost_deductions)
                    .ok_or(ValidationError::AmountOverflow { field: "total cost" })
            })
            .map_err(MalformedQuoteError::InvalidQuote)?;

        Ok(())
    }
}

/// Same sums as [`compute_section_totals`], reporting overflow instead of panicking.
fn checked_section_totals(section: &Section) -> Result<SectionTotals, ValidationError> {
    let mut totals = SectionTotals::default();
    for item in &section.items {
        totals.total_labour_hours =
            checked_sum("section labour hours", totals.total_labour_hours, item.labour_hours)?;
        totals.total_labour_cost =
            checked_sum("section labour cost", totals.total_labour_cost, item.labour_cost())?;
        totals.total_material_cost = checked_sum(
            "section material cost",
            totals.total_material_cost,
            item.material_cost(),
        )?;
    }
    totals.total_cost = checked_sum(
        "section total cost",
        totals.total_labour_cost,
        totals.total_material_cost,
    )?;
    Ok(totals)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn item(quantity: u32, unit_labour: Decimal, unit_material: Decimal) -> LineItem {
        LineItem::builder("Copper pipe")
            .quantity(quantity)
            .unit_labour_cost(unit_labour)
            .unit_material_cost(unit_material)
            .build()
            .expect("valid item")
    }

    fn section_with_total(title: &str, total: Decimal) -> Section {
        Section::new(title).with_item(
            LineItem::builder("Lump sum")
                .quantity(1)
                .unit_material_cost(total)
                .build()
                .expect("valid item"),
        )
    }

    #[test]
    fn derived_costs_use_quantity_times_unit_cost() {
        let section = Section::new("Boiler").with_item(item(2, dec!(5), dec!(10)));
        let totals = section.totals();

        assert_eq!(totals.total_labour_cost, dec!(10));
        assert_eq!(totals.total_material_cost, dec!(20));
        assert_eq!(totals.total_cost, dec!(30));
    }

    #[test]
    fn empty_section_totals_are_zero() {
        assert_eq!(Section::new("Nothing").totals(), SectionTotals::default());
    }

    #[test]
    fn explicit_costs_are_authoritative() {
        let item = LineItem::builder("B")
            .quantity(2)
            .unit_labour_cost(dec!(10))
            .labour_cost(dec!(10))
            .unit_material_cost(dec!(20))
            .material_cost(dec!(20))
            .build()
            .expect("lenient build accepts explicit costs");

        assert_eq!(item.labour_cost(), dec!(10));
        assert_eq!(item.derived_labour_cost(), dec!(20));
        assert_eq!(item.total_cost(), dec!(30));
    }

    #[test]
    fn strict_check_rejects_inconsistent_costs() {
        let err = LineItem::builder("B")
            .quantity(2)
            .unit_labour_cost(dec!(10))
            .labour_cost(dec!(10))
            .build_checked(CostCheck::Strict)
            .unwrap_err();

        assert_eq!(
            err,
            ValidationError::InconsistentCost {
                field: "labour cost",
                explicit: dec!(10),
                derived: dec!(20),
            }
        );
    }

    #[test]
    fn strict_check_tolerates_rounding() {
        let item = LineItem::builder("Fittings")
            .quantity(3)
            .unit_material_cost(dec!(3.333))
            .material_cost(dec!(10.00))
            .build_checked(CostCheck::Strict);
        assert!(item.is_ok());
    }

    #[test]
    fn negative_unit_cost_is_rejected() {
        let err = LineItem::builder("Refund")
            .unit_labour_cost(dec!(-1))
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            ValidationError::NegativeAmount {
                field: "unit labour cost",
                ..
            }
        ));
    }

    #[test]
    fn quote_total_applies_extras_and_deductions() {
        let mut quote = Quote::new("Mechanical retrofit")
            .with_section(section_with_total("S1", dec!(900)))
            .with_section(section_with_total("S2", dec!(1100)));
        quote.set_extra_costs(dec!(55)).unwrap();
        quote.set_cost_deductions(dec!(10)).unwrap();

        let totals = quote.totals();
        assert_eq!(totals.subtotal, dec!(2000));
        assert_eq!(totals.total_cost, dec!(2045));
    }

    #[test]
    fn quote_totals_follow_item_edits() {
        let mut quote = Quote::new("Edits").with_section(section_with_total("S1", dec!(100)));
        assert_eq!(quote.totals().total_cost, dec!(100));

        quote.sections_mut()[0].push_item(item(1, dec!(25), dec!(0)));
        assert_eq!(quote.totals().total_cost, dec!(125));

        quote.sections_mut()[0].remove_item(0);
        assert_eq!(quote.totals().total_cost, dec!(25));
    }

    #[test]
    fn empty_quote_total_is_extras_minus_deductions() {
        let mut quote = Quote::new("X");
        quote.set_extra_costs(dec!(12.50)).unwrap();
        quote.set_cost_deductions(dec!(2.25)).unwrap();
        assert_eq!(quote.totals().total_cost, dec!(10.25));
        assert_eq!(quote.totals().subtotal, Decimal::ZERO);
    }

    #[test]
    fn negative_adjustments_are_rejected() {
        let mut quote = Quote::new("X");
        assert!(quote.set_cost_deductions(dec!(-5)).is_err());
        assert_eq!(quote.cost_deductions(), Decimal::ZERO);
    }

    #[test]
    fn labour_hours_roll_up() {
        let hours = |h| {
            LineItem::builder("Labour")
                .labour_hours(h)
                .build()
                .expect("valid item")
        };
        let quote = Quote::new("Hours")
            .with_section(Section::new("A").with_items([hours(dec!(1.5)), hours(dec!(2))]))
            .with_section(Section::new("B").with_item(hours(dec!(4))));

        assert_eq!(quote.sections()[0].totals().total_labour_hours, dec!(3.5));
        assert_eq!(quote.totals().total_labour_hours, dec!(7.5));
    }

    #[test]
    fn columns_build_items_in_order() {
        let section = Section::from_columns(
            "Job #0",
            SectionColumns {
                material_types: vec!["A".into(), "B".into()],
                quantities: vec![1, 2],
                labour_unit_costs: vec![dec!(5), dec!(10)],
                material_unit_costs: vec![dec!(10), dec!(20)],
                ..SectionColumns::default()
            },
        )
        .expect("columns line up");

        let descriptions: Vec<_> = section.items().iter().map(LineItem::description).collect();
        assert_eq!(descriptions, ["A", "B"]);
        assert_eq!(section.totals().total_labour_cost, dec!(25));
        assert_eq!(section.totals().total_material_cost, dec!(50));
    }

    #[test]
    fn mismatched_columns_are_malformed() {
        let err = Section::from_columns(
            "Job #1",
            SectionColumns {
                material_types: vec!["A".into(), "B".into(), "C".into()],
                quantities: vec![1, 2, 3, 4],
                labour_unit_costs: vec![dec!(5); 3],
                material_unit_costs: vec![dec!(10); 3],
                ..SectionColumns::default()
            },
        )
        .unwrap_err();

        assert_eq!(
            err,
            MalformedQuoteError::ColumnLengthMismatch {
                section: "Job #1".into(),
                column: "quantities",
                expected: 3,
                actual: 4,
            }
        );
    }

    #[test]
    fn partially_filled_optional_column_is_malformed() {
        let err = Section::from_columns(
            "Job #2",
            SectionColumns {
                material_types: vec!["A".into(), "B".into()],
                quantities: vec![1, 2],
                labour_unit_costs: vec![dec!(5); 2],
                material_unit_costs: vec![dec!(10); 2],
                labour_costs: vec![dec!(5)],
                ..SectionColumns::default()
            },
        )
        .unwrap_err();
        assert!(matches!(
            err,
            MalformedQuoteError::ColumnLengthMismatch {
                column: "labour_costs",
                ..
            }
        ));
    }

    #[test]
    fn negative_column_quantity_is_malformed() {
        let err = Section::from_columns(
            "Job #3",
            SectionColumns {
                material_types: vec!["A".into()],
                quantities: vec![-4],
                labour_unit_costs: vec![dec!(5)],
                material_unit_costs: vec![dec!(10)],
                ..SectionColumns::default()
            },
        )
        .unwrap_err();
        assert!(matches!(
            err,
            MalformedQuoteError::InvalidColumnItem {
                item: 0,
                source: ValidationError::NegativeQuantity { value: -4 },
                ..
            }
        ));
    }

    #[test]
    fn oversized_column_quantity_is_malformed() {
        let too_many = i64::from(u32::MAX) + 1;
        let err = Section::from_columns(
            "Job #4",
            SectionColumns {
                material_types: vec!["A".into()],
                quantities: vec![too_many],
                labour_unit_costs: vec![dec!(5)],
                material_unit_costs: vec![dec!(10)],
                ..SectionColumns::default()
            },
        )
        .unwrap_err();
        assert_eq!(
            err,
            MalformedQuoteError::InvalidColumnItem {
                section: "Job #4".into(),
                item: 0,
                source: ValidationError::QuantityOutOfRange { value: too_many },
            }
        );
    }

    #[test]
    fn overflowing_item_cost_is_rejected() {
        let err = LineItem::builder("Gold")
            .quantity(4_000_000_000)
            .unit_labour_cost(dec!(79228162514264337593543950))
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            ValidationError::AmountOverflow {
                field: "labour cost"
            }
        );
    }

    #[test]
    fn overflowing_section_sum_is_rejected() {
        let big = || {
            LineItem::builder("Lump sum")
                .quantity(1)
                .unit_material_cost(dec!(50000000000000000000000000000))
                .build()
                .expect("one item fits")
        };
        let quote = Quote::new("Huge").with_section(Section::new("S1").with_items([big(), big()]));

        let err = quote.validate(CostCheck::Lenient).unwrap_err();
        assert_eq!(
            err,
            MalformedQuoteError::InvalidSection {
                section: 0,
                title: "S1".into(),
                source: ValidationError::AmountOverflow {
                    field: "section material cost"
                },
            }
        );
    }

    #[test]
    fn overflowing_subtotal_is_rejected() {
        let quote = Quote::new("Huge")
            .with_section(section_with_total("S1", dec!(50000000000000000000000000000)))
            .with_section(section_with_total("S2", dec!(50000000000000000000000000000)));

        let err = quote.validate(CostCheck::Lenient).unwrap_err();
        assert_eq!(
            err,
            MalformedQuoteError::InvalidQuote(ValidationError::AmountOverflow {
                field: "subtotal"
            })
        );
    }

    #[test]
    fn validate_reports_section_and_item() {
        let json = r#"{
            "title": "Imported",
            "sections": [
                {"title": "Ok", "items": []},
                {"title": "Bad", "items": [
                    {"description": "A", "quantity": 1, "unit_labour_cost": "1", "unit_material_cost": "1"},
                    {"description": "B", "quantity": 1, "unit_labour_cost": "-3", "unit_material_cost": "1"}
                ]}
            ]
        }"#;
        let quote: Quote = serde_json::from_str(json).expect("quote parses");

        let err = quote.validate(CostCheck::Lenient).unwrap_err();
        assert!(matches!(
            err,
            MalformedQuoteError::InvalidItem {
                section: 1,
                item: 1,
                ..
            }
        ));
    }

    proptest! {
        #[test]
        fn section_totals_are_exact_sums(
            raw in prop::collection::vec((0u32..500, 0i64..100_000, 0i64..100_000), 0..40)
        ) {
            let items: Vec<LineItem> = raw
                .iter()
                .map(|&(qty, labour, material)| item(qty, Decimal::new(labour, 2), Decimal::new(material, 2)))
                .collect();
            let expected_labour: Decimal = items.iter().map(LineItem::labour_cost).sum();
            let expected_material: Decimal = items.iter().map(LineItem::material_cost).sum();

            let totals = Section::new("Prop").with_items(items).totals();

            prop_assert_eq!(totals.total_labour_cost, expected_labour);
            prop_assert_eq!(totals.total_material_cost, expected_material);
            prop_assert_eq!(totals.total_cost, expected_labour + expected_material);
        }

        #[test]
        fn quote_total_matches_definition(
            section_costs in prop::collection::vec(0i64..1_000_000, 0..12),
            extra in 0i64..10_000,
            deduction in 0i64..10_000,
        ) {
            let mut quote = Quote::new("Prop");
            for (index, cents) in section_costs.iter().enumerate() {
                quote.push_section(section_with_total(&format!("S{index}"), Decimal::new(*cents, 2)));
            }
            quote.set_extra_costs(Decimal::new(extra, 2)).unwrap();
            quote.set_cost_deductions(Decimal::new(deduction, 2)).unwrap();

            let subtotal: Decimal = section_costs.iter().map(|c| Decimal::new(*c, 2)).sum();
            let totals = quote.totals();
            prop_assert_eq!(totals.subtotal, subtotal);
            prop_assert_eq!(
                totals.total_cost,
                subtotal + Decimal::new(extra, 2) - Decimal::new(deduction, 2)
            );
        }
    }
}
