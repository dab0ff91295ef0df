//! Composition of a [`Quote`] into a [`DocumentTree`].
//!
//! The composer builds one summary page listing every section, followed by one
//! detail page per section listing its line items.  It holds nothing but its
//! configuration, so a single instance can be shared between threads and calling
//! [`ReportComposer::build`] twice on the same quote yields identical trees.

use chrono::NaiveDate;
use log::debug;
use rust_decimal::Decimal;

use crate::config::ComposerConfig;
use crate::cost::{LineItem, Quote, Section};
use crate::document::{
    BorderLine, Borders, Cell, CellValue, Column, DocumentInfo, DocumentTree, FramePlacement,
    HorizontalAlignment, Page, RichParagraph, RowKind, Table, TextFrame, VerticalAlignment,
};
use crate::error::MalformedQuoteError;
use crate::format::{format_hours, format_long_date};
use crate::richtext::{Span, StyleTag};

/// Title embedded in the document metadata.
pub const DOCUMENT_TITLE: &str = "Quote Document";

const SUMMARY_HEADING: &str = "QUOTE SUMMARY";
const COMMENTS_LABEL: &str = "Comments";
const COMMENT_BLANK_LINES: usize = 3;

const LETTERHEAD_LEFT_MM: f64 = 0.0;
const LETTERHEAD_TOP_MM: f64 = 15.0;
const LETTERHEAD_WIDTH_MM: f64 = 70.0;
const LETTERHEAD_HEIGHT_MM: f64 = 30.0;
const HEADING_SPACE_MM: f64 = 22.5;
const COMMENT_SPACE_MM: f64 = 10.0;

/// Number of physical columns in both table archetypes.
const COLUMN_COUNT: usize = 5;

/// Translates quotes into document trees.
#[derive(Clone, Debug, Default)]
pub struct ReportComposer {
    config: ComposerConfig,
}

impl ReportComposer {
    /// Creates a composer with the given configuration.
    pub fn new(config: ComposerConfig) -> Self {
        Self { config }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ComposerConfig {
        &self.config
    }

    /// Builds the summary page followed by one detail page per section.
    ///
    /// The quote is validated first; on error no tree is produced.
    pub fn build(&self, quote: &Quote) -> Result<DocumentTree, MalformedQuoteError> {
        quote.validate(self.config.cost_check())?;

        let style = self.config.style();
        let info = DocumentInfo {
            title: DOCUMENT_TITLE.to_owned(),
            subject: quote.title().to_owned(),
            author: self.config.author().to_owned(),
        };
        let mut tree = DocumentTree::new(info, style.body_font_family.clone(), style.palette);

        tree.push_page(self.summary_page(quote, self.config.current_date()));
        for section in quote.sections() {
            tree.push_page(self.section_page(section));
        }

        debug!(
            "composed quote '{}' into {} pages",
            quote.title(),
            tree.pages().len()
        );
        Ok(tree)
    }

    fn footer(&self) -> String {
        self.config
            .letterhead()
            .map(|letterhead| letterhead.footer_line())
            .unwrap_or_default()
    }

    fn summary_page(&self, quote: &Quote, date: Option<NaiveDate>) -> Page {
        let style = self.config.style();
        let mut page = Page::new(style.summary_margins, self.footer());

        let mut letterhead = TextFrame::new(FramePlacement::Absolute {
            left_mm: LETTERHEAD_LEFT_MM,
            top_mm: LETTERHEAD_TOP_MM,
        })
        .with_size(LETTERHEAD_WIDTH_MM, LETTERHEAD_HEIGHT_MM);
        if let Some(sender) = self.config.letterhead() {
            letterhead = letterhead.with_paragraph(RichParagraph::new(vec![Span::tagged(
                sender.sender_line(),
                StyleTag::Letterhead,
            )
            .bold()]));
        }
        page.push_frame(letterhead.with_paragraph(RichParagraph::new(vec![Span::new(
            quote.title(),
        )])));

        let mut heading = TextFrame::new(FramePlacement::BeforeTable)
            .with_space_before(HEADING_SPACE_MM)
            .with_paragraph(RichParagraph::new(vec![
                Span::tagged(SUMMARY_HEADING, StyleTag::Reference).bold(),
            ]));
        if let Some(date) = date {
            let place = self
                .config
                .place()
                .map(|place| format!("{place}, "))
                .unwrap_or_default();
            heading = heading.with_paragraph(
                RichParagraph::new(vec![Span::tagged(
                    format!("{place}{}", format_long_date(date)),
                    StyleTag::Reference,
                )])
                .with_alignment(HorizontalAlignment::Right),
            );
        }
        page.push_frame(heading);

        page.set_table(self.summary_table(quote));

        let mut comments = TextFrame::new(FramePlacement::AfterTable)
            .with_space_before(COMMENT_SPACE_MM)
            .with_border(BorderLine::Thick)
            .with_shading(style.palette.row_shade)
            .with_paragraph(RichParagraph::new(vec![Span::new(COMMENTS_LABEL)]));
        for _ in 0..COMMENT_BLANK_LINES {
            comments = comments.with_paragraph(RichParagraph::default());
        }
        page.push_frame(comments);

        page
    }

    fn summary_table(&self, quote: &Quote) -> Table {
        let widths = self.config.style().summary_column_widths_mm;
        let mut table = Table::new(columns(widths));
        self.push_header(
            &mut table,
            "Section No.",
            "Job Name",
            &["Labour Hours", "Labour Cost", "Material Cost"],
            Some("Section Cost"),
        );

        let row_shade = self.config.style().palette.row_shade;
        for (index, section) in quote.sections().iter().enumerate() {
            let totals = section.totals();
            let lead_index = table.rows().len();

            let lead = table.add_row(RowKind::SectionLead);
            text_cell(lead.cell_mut(0), (index + 1).to_string(), StyleTag::Table)
                .set_value(CellValue::Ordinal(index + 1))
                .set_shading(row_shade)
                .set_vertical_alignment(VerticalAlignment::Center)
                .set_merge_down(1);
            text_cell(lead.cell_mut(1), section.title(), StyleTag::Title)
                .set_alignment(HorizontalAlignment::Left)
                .set_merge_right(2);
            self.money_cell(lead.cell_mut(4), totals.total_cost)
                .set_shading(row_shade)
                .set_vertical_alignment(VerticalAlignment::Bottom)
                .set_merge_down(1);

            let detail = table.add_row(RowKind::SectionDetail);
            text_cell(
                detail.cell_mut(1),
                format!("{} hrs", format_hours(totals.total_labour_hours)),
                StyleTag::Table,
            )
            .set_value(CellValue::Hours(totals.total_labour_hours));
            self.money_cell(detail.cell_mut(2), totals.total_labour_cost);
            self.money_cell(detail.cell_mut(3), totals.total_material_cost);

            table.set_edge(0, lead_index, COLUMN_COUNT, 2, BorderLine::Thick);
        }

        table
            .add_row(RowKind::Spacer)
            .set_borders(Borders::hidden());

        let totals = quote.totals();
        let first_summary = table.rows().len();

        let hours = summary_row(&mut table, "Total Labour Hours");
        text_cell(hours, format_hours(totals.total_labour_hours), StyleTag::Table)
            .set_value(CellValue::Hours(totals.total_labour_hours));

        let extras = summary_row(&mut table, "Extra Costs");
        self.money_cell(extras, quote.extra_costs());

        let deductions = summary_row(&mut table, "Cost Deductions");
        let deducted = self.config.format_currency(quote.cost_deductions());
        text_cell(deductions, format!("-({deducted})"), StyleTag::Table)
            .set_value(CellValue::Amount(-quote.cost_deductions()));

        let total = summary_row(&mut table, "Total Cost");
        let formatted = self.config.format_currency(totals.total_cost);
        total
            .push_span(Span::tagged(formatted, StyleTag::Table).bold())
            .set_value(CellValue::Amount(totals.total_cost));

        table.set_edge(4, first_summary, 1, 4, BorderLine::Thick);
        debug!(
            "summary table: {} sections, {} rows",
            quote.sections().len(),
            table.rows().len()
        );
        table
    }

    fn section_page(&self, section: &Section) -> Page {
        let style = self.config.style();
        let mut page = Page::new(style.detail_margins, self.footer());

        page.push_frame(
            TextFrame::new(FramePlacement::BeforeTable)
                .with_space_before(HEADING_SPACE_MM)
                .with_paragraph(RichParagraph::new(vec![Span::tagged(
                    section.title(),
                    StyleTag::Reference,
                )
                .underline()])),
        );
        page.set_table(self.section_table(section));
        page
    }

    fn section_table(&self, section: &Section) -> Table {
        let widths = self.config.style().detail_column_widths_mm;
        let mut table = Table::new(columns(widths));
        self.push_header(
            &mut table,
            "Quantity",
            "Material Type",
            &[
                "Labour Unit Price",
                "Labour Price",
                "Material Unit Price",
                "Material Price",
            ],
            None,
        );

        for item in section.items() {
            self.push_item_rows(&mut table, item);
        }

        let totals = section.totals();
        let row_index = table.rows().len();
        let row = table.add_row(RowKind::Totals);
        for column in [0, 1, 3] {
            row.cell_mut(column).set_borders(Borders::hidden());
        }
        label_cell(row.cell_mut(0), "Labour Total").set_merge_right(1);
        self.money_cell(row.cell_mut(2), totals.total_labour_cost);
        label_cell(row.cell_mut(3), "Materials Total");
        self.money_cell(row.cell_mut(4), totals.total_material_cost);

        table.set_edge(2, row_index, 1, 1, BorderLine::Thick);
        table.set_edge(4, row_index, 1, 1, BorderLine::Thick);

        debug!(
            "detail table for '{}': {} items, {} rows",
            section.title(),
            section.items().len(),
            table.rows().len()
        );
        table
    }

    fn push_item_rows(&self, table: &mut Table, item: &LineItem) {
        let row_shade = self.config.style().palette.row_shade;
        let lead_index = table.rows().len();

        let lead = table.add_row(RowKind::ItemLead);
        text_cell(lead.cell_mut(0), item.quantity().to_string(), StyleTag::Table)
            .set_value(CellValue::Quantity(item.quantity()))
            .set_shading(row_shade)
            .set_vertical_alignment(VerticalAlignment::Center)
            .set_merge_down(1);
        text_cell(lead.cell_mut(1), item.description(), StyleTag::Title)
            .set_alignment(HorizontalAlignment::Left)
            .set_merge_right(3);

        let detail = table.add_row(RowKind::ItemDetail);
        self.unit_price_cell(detail.cell_mut(1), item.unit_labour_cost());
        self.money_cell(detail.cell_mut(2), item.labour_cost());
        self.unit_price_cell(detail.cell_mut(3), item.unit_material_cost());
        self.money_cell(detail.cell_mut(4), item.material_cost());

        table.set_edge(0, lead_index, COLUMN_COUNT, 2, BorderLine::Thick);
    }

    /// Appends the two shaded header rows shared by both table archetypes.
    ///
    /// `first` and `last` span both rows; `group` spans the caption columns of the
    /// first row and the captions fill the second row.
    fn push_header(
        &self,
        table: &mut Table,
        first: &str,
        group: &str,
        captions: &[&str],
        last: Option<&str>,
    ) {
        let header_shade = self.config.style().palette.header_shade;

        let top = table.add_row(RowKind::Header);
        top.set_heading(true).set_shading(header_shade);
        header_cell(top.cell_mut(0), first, false)
            .set_vertical_alignment(VerticalAlignment::Bottom)
            .set_merge_down(1);
        header_cell(top.cell_mut(1), group, true).set_merge_right(captions.len() - 1);
        if let Some(last) = last {
            header_cell(top.cell_mut(captions.len() + 1), last, true)
                .set_vertical_alignment(VerticalAlignment::Bottom)
                .set_merge_down(1);
        }

        let bottom = table.add_row(RowKind::Header);
        bottom.set_heading(true).set_shading(header_shade);
        for (offset, caption) in captions.iter().enumerate() {
            header_cell(bottom.cell_mut(offset + 1), caption, true);
        }

        let width = table.columns().len();
        table.set_edge(0, 0, width, 2, BorderLine::Thick);
    }

    fn money_cell<'c>(&self, cell: &'c mut Cell, amount: Decimal) -> &'c mut Cell {
        text_cell(cell, self.config.format_currency(amount), StyleTag::Table)
            .set_value(CellValue::Amount(amount))
    }

    fn unit_price_cell<'c>(&self, cell: &'c mut Cell, amount: Decimal) -> &'c mut Cell {
        let text = format!("{}/unit", self.config.format_currency(amount));
        text_cell(cell, text, StyleTag::Table).set_value(CellValue::Amount(amount))
    }
}

fn columns(widths: [f64; COLUMN_COUNT]) -> Vec<Column> {
    widths
        .iter()
        .enumerate()
        .map(|(index, &width)| {
            let alignment = if index == 0 {
                HorizontalAlignment::Center
            } else {
                HorizontalAlignment::Right
            };
            Column::new(width, alignment)
        })
        .collect()
}

fn text_cell(cell: &mut Cell, text: impl Into<String>, tag: StyleTag) -> &mut Cell {
    cell.push_span(Span::tagged(text, tag))
}

fn header_cell<'c>(cell: &'c mut Cell, text: &str, bold: bool) -> &'c mut Cell {
    cell.push_span(Span::tagged(text, StyleTag::Table).with_bold(bold))
        .set_alignment(HorizontalAlignment::Left)
}

fn label_cell<'c>(cell: &'c mut Cell, label: &str) -> &'c mut Cell {
    cell.push_span(Span::tagged(label, StyleTag::Table).bold())
        .set_alignment(HorizontalAlignment::Right)
}

/// Appends a labelled summary row and returns its value cell.
fn summary_row<'t>(table: &'t mut Table, label: &str) -> &'t mut Cell {
    let row = table.add_row(RowKind::Summary);
    for column in 0..COLUMN_COUNT - 1 {
        row.cell_mut(column).set_borders(Borders::hidden());
    }
    label_cell(row.cell_mut(0), label).set_merge_right(COLUMN_COUNT - 2);
    row.cell_mut(COLUMN_COUNT - 1)
}
