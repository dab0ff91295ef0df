//! Renderer-agnostic document tree produced by the report composer.
//!
//! The tree is the only contract between composition and rendering: pages carry
//! frames and at most one table, tables carry typed columns and rows, and every
//! cell states its own text, shading, borders and merge spans.  Nothing in here
//! knows about quotes or costs, and nothing references the rendering crate, so
//! the values can be serialized and handed to any adapter.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::richtext::Span;

/// An sRGB color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
}

impl Rgb {
    /// Creates a color from its channels.
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// The three named colors used by a report.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Palette {
    /// Color of table and frame borders.
    pub border: Rgb,
    /// Background of table header rows.
    pub header_shade: Rgb,
    /// Background of highlighted data cells and the comment box.
    pub row_shade: Rgb,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            border: Rgb::new(41, 111, 81),
            header_shade: Rgb::new(240, 249, 240),
            row_shade: Rgb::new(242, 242, 242),
        }
    }
}

/// Horizontal placement of text within its cell or frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HorizontalAlignment {
    /// Left aligned content.
    #[default]
    Left,
    /// Center aligned content.
    Center,
    /// Right aligned content.
    Right,
}

/// Vertical placement of text within a cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerticalAlignment {
    /// Top aligned content.
    #[default]
    Top,
    /// Vertically centered content.
    Center,
    /// Bottom aligned content.
    Bottom,
}

/// Weight of one cell edge.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BorderLine {
    /// No line is drawn.
    Hidden,
    /// The regular grid line.
    #[default]
    Thin,
    /// The heavier line used to box groups of rows.
    Thick,
}

impl BorderLine {
    /// Stroke width in points.
    pub fn width_pt(self) -> f64 {
        match self {
            BorderLine::Hidden => 0.0,
            BorderLine::Thin => 0.25,
            BorderLine::Thick => 0.75,
        }
    }

    /// Whether a line is drawn at all.
    pub fn is_visible(self) -> bool {
        self != BorderLine::Hidden
    }
}

/// The four edges of a cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Borders {
    /// Top edge.
    pub top: BorderLine,
    /// Right edge.
    pub right: BorderLine,
    /// Bottom edge.
    pub bottom: BorderLine,
    /// Left edge.
    pub left: BorderLine,
}

impl Borders {
    /// All four edges with the same line.
    pub const fn all(line: BorderLine) -> Self {
        Self {
            top: line,
            right: line,
            bottom: line,
            left: line,
        }
    }

    /// No visible edges.
    pub const fn hidden() -> Self {
        Self::all(BorderLine::Hidden)
    }

    /// Whether any edge is drawn.
    pub fn any_visible(&self) -> bool {
        [self.top, self.right, self.bottom, self.left]
            .iter()
            .any(|line| line.is_visible())
    }
}

/// The exact value behind a cell's formatted text.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum CellValue {
    /// A money amount, unrounded.
    Amount(Decimal),
    /// A labour hour figure.
    Hours(Decimal),
    /// A unit count.
    Quantity(u32),
    /// A 1-based position in a list.
    Ordinal(usize),
}

/// A paragraph built from styled spans.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RichParagraph {
    spans: Vec<Span>,
    #[serde(default)]
    alignment: HorizontalAlignment,
}

impl RichParagraph {
    /// Creates a paragraph from the provided spans using left alignment.
    pub fn new(spans: impl Into<Vec<Span>>) -> Self {
        Self {
            spans: spans.into(),
            ..Self::default()
        }
    }

    /// Returns the spans that make up the paragraph.
    pub fn spans(&self) -> &[Span] {
        &self.spans
    }

    /// Returns the configured alignment.
    pub fn alignment(&self) -> HorizontalAlignment {
        self.alignment
    }

    /// Returns the concatenated text of all spans.
    pub fn text(&self) -> String {
        self.spans.iter().map(Span::text).collect()
    }

    /// Sets the alignment and returns the updated paragraph.
    pub fn with_alignment(mut self, alignment: HorizontalAlignment) -> Self {
        self.alignment = alignment;
        self
    }
}

/// One table cell.
///
/// A cell with `merge_right = n` spans itself and the `n` cells to its right;
/// `merge_down = n` spans the `n` cells below.  Covered cells stay in the grid
/// and are left empty.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    spans: Vec<Span>,
    value: Option<CellValue>,
    alignment: Option<HorizontalAlignment>,
    vertical_alignment: VerticalAlignment,
    shading: Option<Rgb>,
    borders: Borders,
    merge_right: usize,
    merge_down: usize,
}

impl Cell {
    /// Returns the styled text of the cell.
    pub fn spans(&self) -> &[Span] {
        &self.spans
    }

    /// Returns the concatenated text of the cell.
    pub fn text(&self) -> String {
        self.spans.iter().map(Span::text).collect()
    }

    /// Returns the exact value behind the text, if the cell shows a figure.
    pub fn value(&self) -> Option<CellValue> {
        self.value
    }

    /// Returns the alignment override, if any; otherwise the column alignment applies.
    pub fn alignment(&self) -> Option<HorizontalAlignment> {
        self.alignment
    }

    /// Returns the vertical alignment.
    pub fn vertical_alignment(&self) -> VerticalAlignment {
        self.vertical_alignment
    }

    /// Returns the background color, if any.
    pub fn shading(&self) -> Option<Rgb> {
        self.shading
    }

    /// Returns the edges of the cell.
    pub fn borders(&self) -> Borders {
        self.borders
    }

    /// Number of additional columns spanned.
    pub fn merge_right(&self) -> usize {
        self.merge_right
    }

    /// Number of additional rows spanned.
    pub fn merge_down(&self) -> usize {
        self.merge_down
    }

    /// Appends a span.
    pub fn push_span(&mut self, span: Span) -> &mut Self {
        self.spans.push(span);
        self
    }

    /// Records the exact value behind the text.
    pub fn set_value(&mut self, value: CellValue) -> &mut Self {
        self.value = Some(value);
        self
    }

    /// Overrides the column alignment.
    pub fn set_alignment(&mut self, alignment: HorizontalAlignment) -> &mut Self {
        self.alignment = Some(alignment);
        self
    }

    /// Sets the vertical alignment.
    pub fn set_vertical_alignment(&mut self, alignment: VerticalAlignment) -> &mut Self {
        self.vertical_alignment = alignment;
        self
    }

    /// Sets the background color.
    pub fn set_shading(&mut self, color: Rgb) -> &mut Self {
        self.shading = Some(color);
        self
    }

    /// Replaces all four edges.
    pub fn set_borders(&mut self, borders: Borders) -> &mut Self {
        self.borders = borders;
        self
    }

    /// Returns the edges for in-place edits.
    pub fn borders_mut(&mut self) -> &mut Borders {
        &mut self.borders
    }

    /// Spans `columns` additional columns to the right.
    pub fn set_merge_right(&mut self, columns: usize) -> &mut Self {
        self.merge_right = columns;
        self
    }

    /// Spans `rows` additional rows downwards.
    pub fn set_merge_down(&mut self, rows: usize) -> &mut Self {
        self.merge_down = rows;
        self
    }
}

/// Role of a row within a report table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowKind {
    /// Column captions, repeated on every page by renderers that support it.
    Header,
    /// First row of a section entry on the summary page.
    SectionLead,
    /// Second row of a section entry on the summary page.
    SectionDetail,
    /// First row of a line item entry on a detail page.
    ItemLead,
    /// Second row of a line item entry on a detail page.
    ItemDetail,
    /// Empty row separating data from totals.
    Spacer,
    /// A labelled summary figure below the data.
    Summary,
    /// The closing totals row of a detail page.
    Totals,
}

/// One table row; always holds exactly one cell per column.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    kind: RowKind,
    heading: bool,
    cells: Vec<Cell>,
}

impl Row {
    fn new(kind: RowKind, columns: usize) -> Self {
        Self {
            kind,
            heading: false,
            cells: vec![Cell::default(); columns],
        }
    }

    /// Returns the role of the row.
    pub fn kind(&self) -> RowKind {
        self.kind
    }

    /// Whether the row repeats at the top of every page the table spans.
    pub fn is_heading(&self) -> bool {
        self.heading
    }

    /// Returns the cells.
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Returns the cell at `column`.
    ///
    /// # Panics
    ///
    /// Panics if `column` is outside the table.
    pub fn cell(&self, column: usize) -> &Cell {
        &self.cells[column]
    }

    /// Returns the cell at `column` for editing.
    ///
    /// # Panics
    ///
    /// Panics if `column` is outside the table.
    pub fn cell_mut(&mut self, column: usize) -> &mut Cell {
        &mut self.cells[column]
    }

    /// Marks the row as a heading row.
    pub fn set_heading(&mut self, heading: bool) -> &mut Self {
        self.heading = heading;
        self
    }

    /// Applies `borders` to every cell of the row.
    pub fn set_borders(&mut self, borders: Borders) -> &mut Self {
        for cell in &mut self.cells {
            cell.borders = borders;
        }
        self
    }

    /// Applies `color` as background of every cell of the row.
    pub fn set_shading(&mut self, color: Rgb) -> &mut Self {
        for cell in &mut self.cells {
            cell.shading = Some(color);
        }
        self
    }
}

/// A fixed-width table column.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Column {
    /// Width in millimetres.
    pub width_mm: f64,
    /// Default alignment of the column's cells.
    pub alignment: HorizontalAlignment,
}

impl Column {
    /// Creates a column.
    pub const fn new(width_mm: f64, alignment: HorizontalAlignment) -> Self {
        Self {
            width_mm,
            alignment,
        }
    }
}

/// A table with typed columns and a grid of rows.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Table {
    columns: Vec<Column>,
    rows: Vec<Row>,
}

impl Table {
    /// Creates an empty table with the given columns.
    pub fn new(columns: impl Into<Vec<Column>>) -> Self {
        Self {
            columns: columns.into(),
            rows: Vec::new(),
        }
    }

    /// Returns the columns.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Returns the rows.
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Appends a row of empty, thinly bordered cells and returns it for editing.
    pub fn add_row(&mut self, kind: RowKind) -> &mut Row {
        let row = Row::new(kind, self.columns.len());
        self.rows.push(row);
        let last = self.rows.len() - 1;
        &mut self.rows[last]
    }

    /// Draws `line` around the outside of a block of cells.
    ///
    /// The block starts at (`column`, `row`) and covers `columns` x `rows` cells;
    /// parts of the block outside the table are ignored.
    pub fn set_edge(
        &mut self,
        column: usize,
        row: usize,
        columns: usize,
        rows: usize,
        line: BorderLine,
    ) {
        if columns == 0 || rows == 0 {
            return;
        }
        let last_row = row + rows - 1;
        let last_column = column + columns - 1;

        for (row_index, table_row) in self.rows.iter_mut().enumerate() {
            if row_index < row || row_index > last_row {
                continue;
            }
            for (column_index, cell) in table_row.cells.iter_mut().enumerate() {
                if column_index < column || column_index > last_column {
                    continue;
                }
                if row_index == row {
                    cell.borders.top = line;
                }
                if row_index == last_row {
                    cell.borders.bottom = line;
                }
                if column_index == column {
                    cell.borders.left = line;
                }
                if column_index == last_column {
                    cell.borders.right = line;
                }
            }
        }
    }
}

/// Where a free-floating frame sits on its page.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "at", rename_all = "snake_case")]
pub enum FramePlacement {
    /// Fixed position relative to the page's top-left corner, in millimetres.
    Absolute {
        /// Distance from the left margin.
        left_mm: f64,
        /// Distance from the top edge of the page.
        top_mm: f64,
    },
    /// In the flow, above the table.
    BeforeTable,
    /// In the flow, below the table.
    AfterTable,
}

/// A block of paragraphs with optional size, border and background.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TextFrame {
    placement: FramePlacement,
    width_mm: Option<f64>,
    height_mm: Option<f64>,
    space_before_mm: f64,
    paragraphs: Vec<RichParagraph>,
    border: BorderLine,
    shading: Option<Rgb>,
}

impl TextFrame {
    /// Creates an unbordered frame without fixed size.
    pub fn new(placement: FramePlacement) -> Self {
        Self {
            placement,
            width_mm: None,
            height_mm: None,
            space_before_mm: 0.0,
            paragraphs: Vec::new(),
            border: BorderLine::Hidden,
            shading: None,
        }
    }

    /// Returns the placement.
    pub fn placement(&self) -> FramePlacement {
        self.placement
    }

    /// Returns the fixed width in millimetres, if any.
    pub fn width_mm(&self) -> Option<f64> {
        self.width_mm
    }

    /// Returns the fixed height in millimetres, if any.
    pub fn height_mm(&self) -> Option<f64> {
        self.height_mm
    }

    /// Returns the vertical gap above a flowing frame.
    pub fn space_before_mm(&self) -> f64 {
        self.space_before_mm
    }

    /// Returns the paragraphs.
    pub fn paragraphs(&self) -> &[RichParagraph] {
        &self.paragraphs
    }

    /// Returns the border line drawn around the frame.
    pub fn border(&self) -> BorderLine {
        self.border
    }

    /// Returns the background color, if any.
    pub fn shading(&self) -> Option<Rgb> {
        self.shading
    }

    /// Fixes the frame size and returns the updated frame.
    pub fn with_size(mut self, width_mm: f64, height_mm: f64) -> Self {
        self.width_mm = Some(width_mm);
        self.height_mm = Some(height_mm);
        self
    }

    /// Sets the gap above a flowing frame and returns the updated frame.
    pub fn with_space_before(mut self, space_mm: f64) -> Self {
        self.space_before_mm = space_mm;
        self
    }

    /// Appends a paragraph and returns the updated frame.
    pub fn with_paragraph(mut self, paragraph: RichParagraph) -> Self {
        self.paragraphs.push(paragraph);
        self
    }

    /// Sets the border and returns the updated frame.
    pub fn with_border(mut self, border: BorderLine) -> Self {
        self.border = border;
        self
    }

    /// Sets the background and returns the updated frame.
    pub fn with_shading(mut self, color: Rgb) -> Self {
        self.shading = Some(color);
        self
    }
}

/// Page margins in millimetres.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PageMargins {
    /// Top margin.
    pub top_mm: f64,
    /// Right margin.
    pub right_mm: f64,
    /// Bottom margin.
    pub bottom_mm: f64,
    /// Left margin.
    pub left_mm: f64,
}

impl PageMargins {
    /// Margins given as vertical and horizontal pairs.
    pub const fn symmetric(vertical_mm: f64, horizontal_mm: f64) -> Self {
        Self {
            top_mm: vertical_mm,
            right_mm: horizontal_mm,
            bottom_mm: vertical_mm,
            left_mm: horizontal_mm,
        }
    }
}

/// One page of the report.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Page {
    margins: PageMargins,
    footer: String,
    frames: Vec<TextFrame>,
    table: Option<Table>,
}

impl Page {
    /// Creates an empty page.
    pub fn new(margins: PageMargins, footer: impl Into<String>) -> Self {
        Self {
            margins,
            footer: footer.into(),
            frames: Vec::new(),
            table: None,
        }
    }

    /// Returns the page margins.
    pub fn margins(&self) -> PageMargins {
        self.margins
    }

    /// Returns the footer text.
    pub fn footer(&self) -> &str {
        &self.footer
    }

    /// Returns the frames in insertion order.
    pub fn frames(&self) -> &[TextFrame] {
        &self.frames
    }

    /// Returns the frames with the given placement.
    pub fn frames_at(&self, at: FramePlacement) -> impl Iterator<Item = &TextFrame> {
        self.frames.iter().filter(move |frame| {
            std::mem::discriminant(&frame.placement) == std::mem::discriminant(&at)
        })
    }

    /// Returns the table, if the page has one.
    pub fn table(&self) -> Option<&Table> {
        self.table.as_ref()
    }

    /// Adds a frame.
    pub fn push_frame(&mut self, frame: TextFrame) {
        self.frames.push(frame);
    }

    /// Sets the page's table, replacing any previous one.
    pub fn set_table(&mut self, table: Table) {
        self.table = Some(table);
    }
}

/// Descriptive metadata embedded by renderers that support it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentInfo {
    /// Document title.
    pub title: String,
    /// Document subject.
    pub subject: String,
    /// Document author.
    pub author: String,
}

/// A complete paginated report.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DocumentTree {
    info: DocumentInfo,
    font_family: String,
    palette: Palette,
    pages: Vec<Page>,
}

impl DocumentTree {
    /// Creates a tree without pages.
    pub fn new(info: DocumentInfo, font_family: impl Into<String>, palette: Palette) -> Self {
        Self {
            info,
            font_family: font_family.into(),
            palette,
            pages: Vec::new(),
        }
    }

    /// Returns the document metadata.
    pub fn info(&self) -> &DocumentInfo {
        &self.info
    }

    /// Returns the body font family name.
    pub fn font_family(&self) -> &str {
        &self.font_family
    }

    /// Returns the palette borders are drawn with.
    pub fn palette(&self) -> Palette {
        self.palette
    }

    /// Returns the pages in order.
    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    /// Appends a page.
    pub fn push_page(&mut self, page: Page) {
        self.pages.push(page);
    }

    /// Serializes the tree as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(rows: usize) -> Table {
        let mut table = Table::new(vec![
            Column::new(12.0, HorizontalAlignment::Center),
            Column::new(30.0, HorizontalAlignment::Right),
            Column::new(30.0, HorizontalAlignment::Right),
        ]);
        for _ in 0..rows {
            table.add_row(RowKind::ItemDetail);
        }
        table
    }

    #[test]
    fn rows_are_filled_with_thin_cells() {
        let table = grid(2);
        assert!(table.rows().iter().all(|row| row.cells().len() == 3));
        assert_eq!(table.rows()[1].cell(2).borders(), Borders::all(BorderLine::Thin));
    }

    #[test]
    fn set_edge_boxes_the_outline_only() {
        let mut table = grid(3);
        table.set_edge(1, 1, 2, 2, BorderLine::Thick);

        let inner = table.rows()[1].cell(1).borders();
        assert_eq!(inner.top, BorderLine::Thick);
        assert_eq!(inner.left, BorderLine::Thick);
        assert_eq!(inner.right, BorderLine::Thin);
        assert_eq!(inner.bottom, BorderLine::Thin);

        let corner = table.rows()[2].cell(2).borders();
        assert_eq!(corner.bottom, BorderLine::Thick);
        assert_eq!(corner.right, BorderLine::Thick);

        assert_eq!(table.rows()[0].cell(1).borders(), Borders::all(BorderLine::Thin));
        assert_eq!(table.rows()[1].cell(0).borders(), Borders::all(BorderLine::Thin));
    }

    #[test]
    fn set_edge_ignores_cells_outside_the_table() {
        let mut table = grid(1);
        table.set_edge(2, 0, 4, 4, BorderLine::Thick);
        let cell = table.rows()[0].cell(2).borders();
        assert_eq!(cell.left, BorderLine::Thick);
        assert_eq!(cell.top, BorderLine::Thick);
        assert_eq!(cell.right, BorderLine::Thin);
    }

    #[test]
    fn frames_filter_by_placement() {
        let mut page = Page::new(PageMargins::symmetric(20.0, 25.0), "footer");
        page.push_frame(TextFrame::new(FramePlacement::AfterTable));
        page.push_frame(TextFrame::new(FramePlacement::Absolute {
            left_mm: 0.0,
            top_mm: 15.0,
        }));

        assert_eq!(page.frames_at(FramePlacement::AfterTable).count(), 1);
        let absolute = FramePlacement::Absolute {
            left_mm: 1.0,
            top_mm: 1.0,
        };
        assert_eq!(page.frames_at(absolute).count(), 1);
    }

    #[test]
    fn cell_values_serialize_with_a_kind_tag() {
        let json = serde_json::to_string(&CellValue::Quantity(4)).expect("serializes");
        assert_eq!(json, r#"{"kind":"quantity","value":4}"#);
    }
}
