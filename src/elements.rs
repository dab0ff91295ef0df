//! Custom `genpdf` elements used by the PDF adapter.
//!
//! `genpdf` tables only know uniform frame decorations.  Report rows need a
//! different line weight on every cell edge, so each row of the document tree
//! is drawn by a [`GridRow`] that lays out its cells side by side and strokes
//! the edges itself.  The conversions from tree colors and spans to `genpdf`
//! styles live here as well.

use genpdf::elements::{Break, Paragraph};
use genpdf::error::Error;
use genpdf::style::{Color, LineStyle, Style, StyledString};
use genpdf::{render, Alignment, Element, Mm, Position, RenderResult, Size};

use crate::document::{BorderLine, Borders, Rgb};
use crate::richtext::Span;

const POINTS_PER_MM: f64 = 72.0 / 25.4;
const CELL_PADDING_MM: f64 = 1.0;
const DEFAULT_UNDERLINE_OFFSET_MM: f64 = 0.4;

pub(crate) fn mm_from_f64(value: f64) -> Mm {
    Mm::from(printpdf::Mm(value))
}

pub(crate) fn mm_to_f64(value: Mm) -> f64 {
    let mm: printpdf::Mm = value.into();
    mm.0
}

impl From<Rgb> for Color {
    fn from(color: Rgb) -> Self {
        Color::Rgb(color.r, color.g, color.b)
    }
}

fn span_style(span: &Span) -> Style {
    let mut style = Style::new();
    style.set_font_size(span.tag().font_size());
    if span.is_bold() {
        style.set_bold();
    }
    if span.is_italic() {
        style.set_italic();
    }
    style
}

/// Converts a span to a [`StyledString`], dropping the underline flag.
pub fn styled_string(span: &Span) -> StyledString {
    StyledString::new(span.text().to_owned(), span_style(span))
}

/// A styled string together with its underline flag.
#[derive(Clone, Debug)]
pub struct StyledSpan {
    /// The styled text fragment.
    pub string: StyledString,
    /// Whether the fragment should be rendered with an underline.
    pub underline: bool,
}

impl From<&Span> for StyledSpan {
    fn from(span: &Span) -> Self {
        StyledSpan {
            string: styled_string(span),
            underline: span.is_underlined(),
        }
    }
}

/// Converts spans into styled strings while keeping underline flags.
pub fn spans_to_styled_strings<'a, I>(spans: I) -> Vec<StyledSpan>
where
    I: IntoIterator<Item = &'a Span>,
{
    spans.into_iter().map(StyledSpan::from).collect()
}

fn line_style(line: BorderLine, color: Color) -> LineStyle {
    LineStyle::new()
        .with_color(color)
        .with_thickness(mm_from_f64(line.width_pt() / POINTS_PER_MM))
}

/// One cell of a [`GridRow`].
pub struct GridCell {
    content: Box<dyn Element>,
    width_mm: Option<f64>,
    borders: Borders,
}

impl GridCell {
    /// Creates a cell of fixed width.
    pub fn new(content: impl Element + 'static, width_mm: f64, borders: Borders) -> Self {
        Self {
            content: Box::new(content),
            width_mm: Some(width_mm),
            borders,
        }
    }

    /// Creates a cell that takes whatever width the fixed cells leave.
    pub fn stretched(content: impl Element + 'static, borders: Borders) -> Self {
        Self {
            content: Box::new(content),
            width_mm: None,
            borders,
        }
    }
}

/// A row of cells with individually weighted edges.
///
/// Fixed widths are scaled down proportionally when they exceed the available
/// width.  If a cell's content does not fit on the current page the row reports
/// `has_more` and the remaining content continues on the next page.
pub struct GridRow {
    cells: Vec<GridCell>,
    line_color: Color,
}

impl GridRow {
    /// Creates a row whose edges are stroked with `line_color`.
    pub fn new(cells: Vec<GridCell>, line_color: impl Into<Color>) -> Self {
        Self {
            cells,
            line_color: line_color.into(),
        }
    }

    fn cell_widths(&self, available: f64) -> Vec<f64> {
        let fixed: f64 = self.cells.iter().filter_map(|cell| cell.width_mm).sum();
        let stretched = self
            .cells
            .iter()
            .filter(|cell| cell.width_mm.is_none())
            .count();

        let scale = if fixed > available && fixed > 0.0 {
            available / fixed
        } else {
            1.0
        };
        let remaining = if stretched == 0 {
            0.0
        } else {
            (available - fixed * scale).max(0.0) / stretched as f64
        };

        self.cells
            .iter()
            .map(|cell| cell.width_mm.map_or(remaining, |width| width * scale))
            .collect()
    }

    fn stroke(&self, area: &render::Area<'_>, from: Position, to: Position, line: BorderLine) {
        if line.is_visible() {
            area.draw_line(vec![from, to], line_style(line, self.line_color));
        }
    }
}

impl Element for GridRow {
    fn render(
        &mut self,
        context: &genpdf::Context,
        area: render::Area<'_>,
        style: Style,
    ) -> Result<RenderResult, Error> {
        let mut result = RenderResult::default();
        let padding = mm_from_f64(CELL_PADDING_MM);
        if style.line_height(&context.font_cache) + padding + padding > area.size().height {
            result.has_more = true;
            return Ok(result);
        }

        let widths = self.cell_widths(mm_to_f64(area.size().width));
        let mut content_height = Mm::default();
        let mut x = 0.0;
        for (cell, width) in self.cells.iter_mut().zip(&widths) {
            let mut cell_area = area.clone();
            cell_area.add_offset(Position::new(mm_from_f64(x + CELL_PADDING_MM), padding));
            cell_area.set_width(mm_from_f64((width - 2.0 * CELL_PADDING_MM).max(0.0)));
            let height = cell_area.size().height;
            cell_area.set_height(height - padding);

            let rendered = cell.content.render(context, cell_area, style)?;
            content_height = content_height.max(rendered.size.height);
            result.has_more |= rendered.has_more;
            x += width;
        }

        let row_height = content_height + padding + padding;
        let mut left = 0.0;
        for (cell, width) in self.cells.iter().zip(&widths) {
            let x0 = mm_from_f64(left);
            let x1 = mm_from_f64(left + width);
            let top = Mm::default();
            let borders = cell.borders;
            self.stroke(&area, Position::new(x0, top), Position::new(x1, top), borders.top);
            self.stroke(&area, Position::new(x1, top), Position::new(x1, row_height), borders.right);
            self.stroke(
                &area,
                Position::new(x0, row_height),
                Position::new(x1, row_height),
                borders.bottom,
            );
            self.stroke(&area, Position::new(x0, top), Position::new(x0, row_height), borders.left);
            left += width;
        }

        result.size = Size::new(mm_from_f64(x), row_height);
        Ok(result)
    }
}

/// Text content of a cell or frame line.
pub enum TextBlock {
    /// Wrapped styled text.
    Plain(Paragraph),
    /// A single line with underlined spans.
    Underlined(UnderlinedText),
    /// An empty line.
    Blank(Break),
}

impl Element for TextBlock {
    fn render(
        &mut self,
        context: &genpdf::Context,
        area: render::Area<'_>,
        style: Style,
    ) -> Result<RenderResult, Error> {
        match self {
            TextBlock::Plain(paragraph) => paragraph.render(context, area, style),
            TextBlock::Underlined(line) => line.render(context, area, style),
            TextBlock::Blank(line) => line.render(context, area, style),
        }
    }
}

/// A single line of styled text whose underlined spans get a stroke below the glyphs.
pub struct UnderlinedText {
    spans: Vec<StyledSpan>,
    alignment: Alignment,
    underline_offset: Mm,
    done: bool,
}

impl UnderlinedText {
    /// Creates a left-aligned line from the provided spans.
    pub fn new(spans: Vec<StyledSpan>) -> Self {
        Self {
            spans,
            alignment: Alignment::Left,
            underline_offset: mm_from_f64(DEFAULT_UNDERLINE_OFFSET_MM),
            done: false,
        }
    }

    /// Sets the alignment and returns the updated element.
    pub fn with_alignment(mut self, alignment: Alignment) -> Self {
        self.alignment = alignment;
        self
    }
}

impl Element for UnderlinedText {
    fn render(
        &mut self,
        context: &genpdf::Context,
        area: render::Area<'_>,
        style: Style,
    ) -> Result<RenderResult, Error> {
        let mut result = RenderResult::default();
        if self.done {
            return Ok(result);
        }

        let mut prepared: Vec<(StyledString, bool, Mm)> = Vec::with_capacity(self.spans.len());
        let mut total_width = Mm::default();
        let mut line_height = style.line_height(&context.font_cache);
        let mut glyph_height = Mm::default();
        for span in &self.spans {
            let mut string = span.string.clone();
            string.style = style.and(string.style);
            let width = string.width(&context.font_cache);
            total_width += width;
            line_height = line_height.max(string.style.line_height(&context.font_cache));
            glyph_height = glyph_height.max(
                string
                    .style
                    .font(&context.font_cache)
                    .glyph_height(string.style.font_size()),
            );
            prepared.push((string, span.underline, width));
        }

        if line_height > area.size().height {
            result.has_more = true;
            return Ok(result);
        }

        let x_offset = match self.alignment {
            Alignment::Center => (area.size().width - total_width) / 2.0,
            Alignment::Right => area.size().width - total_width,
            Alignment::Left => Mm::default(),
        };

        match area.text_section(&context.font_cache, Position::new(x_offset, 0), style) {
            Some(mut section) => {
                for (string, _, _) in &prepared {
                    section.print_str(&string.s, string.style)?;
                }
            }
            None => {
                result.has_more = true;
                return Ok(result);
            }
        }

        let baseline = glyph_height + self.underline_offset;
        let mut cursor = x_offset;
        for (string, underline, width) in &prepared {
            if *underline {
                let mut stroke = LineStyle::new();
                if let Some(color) = string.style.color().or(style.color()) {
                    stroke = stroke.with_color(color);
                }
                area.draw_line(
                    vec![
                        Position::new(cursor, baseline),
                        Position::new(cursor + *width, baseline),
                    ],
                    stroke,
                );
            }
            cursor += *width;
        }

        self.done = true;
        result.size = Size::new(total_width, line_height);
        Ok(result)
    }
}
