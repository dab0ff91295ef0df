//! PDF rendering of document trees with `genpdf`.
//!
//! Every tree row becomes a [`GridRow`]: cells merged to the right are laid out as
//! one wider cell, and cells merged downwards keep their text in the first row
//! while the shared edge between the rows is left out.  Shading and vertical
//! alignment are not painted.

use genpdf::elements::{Break, LinearLayout, PaddedElement, PageBreak, Paragraph};
use genpdf::error::{Error as GenpdfError, ErrorKind};
use genpdf::{self, style, Alignment, Element, Margins, Mm, PageDecorator, PaperSize, Position, Size};
use log::{debug, warn};
use thiserror::Error;

use crate::adapter::RenderingAdapter;
use crate::document::{
    BorderLine, Borders, DocumentTree, FramePlacement, HorizontalAlignment, Page, PageMargins,
    Rgb, Table, TextFrame, VerticalAlignment,
};
use crate::elements::{
    mm_from_f64, spans_to_styled_strings, styled_string, GridCell, GridRow, TextBlock,
    UnderlinedText,
};
use crate::fonts;
use crate::richtext::{Span, StyleTag};

const FOOTER_HEIGHT_MM: f64 = 10.0;

/// Failure while turning a document tree into PDF bytes.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The body font family could not be loaded.
    #[error("failed to load fonts")]
    FontLoad(#[source] GenpdfError),
    /// The document could not be laid out or written.
    #[error("failed to lay out the document")]
    Layout(#[source] GenpdfError),
}

type ElementFactory = dyn Fn(usize) -> Box<dyn Element>;

/// Builder for `genpdf::Document` instances with a fixed font family, margins and footer.
pub struct DocumentBuilder {
    font_family: String,
    title: Option<String>,
    paper_size: Option<Size>,
    margins: Option<Margins>,
    footer: Option<FooterSpec>,
}

impl DocumentBuilder {
    /// Creates a builder that loads `font_family` when built.
    pub fn new(font_family: impl Into<String>) -> Self {
        Self {
            font_family: font_family.into(),
            title: None,
            paper_size: None,
            margins: None,
            footer: None,
        }
    }

    /// Sets the document title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Sets the paper size used for newly created documents.
    pub fn with_paper_size(mut self, paper_size: impl Into<Size>) -> Self {
        self.paper_size = Some(paper_size.into());
        self
    }

    /// Sets the margins applied through the page decorator.
    pub fn with_margins(mut self, margins: impl Into<Margins>) -> Self {
        self.margins = Some(margins.into());
        self
    }

    /// Configures a footer callback with a fixed height that is invoked for every page.
    pub fn with_footer<F, E>(mut self, height: impl Into<Mm>, footer: F) -> Self
    where
        F: Fn(usize) -> E + 'static,
        E: Element + 'static,
    {
        self.footer = Some(FooterSpec::new(height, footer));
        self
    }

    /// Loads the fonts and builds a configured `genpdf::Document`.
    pub fn build(self) -> Result<genpdf::Document, RenderError> {
        let family = fonts::font_family(&self.font_family).map_err(RenderError::FontLoad)?;
        let mut document = genpdf::Document::new(family);
        document.set_font_size(StyleTag::Normal.font_size());

        if let Some(title) = self.title {
            document.set_title(title);
        }
        if let Some(paper_size) = self.paper_size {
            document.set_paper_size(paper_size);
        }
        document.set_page_decorator(ConfiguredPageDecorator::new(self.margins, self.footer));

        Ok(document)
    }
}

/// Definition of a footer rendered through the page decorator.
pub struct FooterSpec {
    height: Mm,
    factory: Box<ElementFactory>,
}

impl FooterSpec {
    /// Creates a footer of fixed `height` built by `factory` for each page.
    pub fn new<F, E>(height: impl Into<Mm>, factory: F) -> Self
    where
        F: Fn(usize) -> E + 'static,
        E: Element + 'static,
    {
        Self {
            height: height.into(),
            factory: Box::new(move |page| Box::new(factory(page)) as Box<dyn Element>),
        }
    }
}

struct ConfiguredPageDecorator {
    page: usize,
    margins: Option<Margins>,
    footer: Option<FooterSpec>,
}

impl ConfiguredPageDecorator {
    fn new(margins: Option<Margins>, footer: Option<FooterSpec>) -> Self {
        Self {
            page: 0,
            margins,
            footer,
        }
    }
}

impl PageDecorator for ConfiguredPageDecorator {
    fn decorate_page<'a>(
        &mut self,
        context: &genpdf::Context,
        mut area: genpdf::render::Area<'a>,
        style: style::Style,
    ) -> Result<genpdf::render::Area<'a>, GenpdfError> {
        self.page += 1;

        if let Some(margins) = self.margins {
            area.add_margins(margins);
        }

        if let Some(footer) = &self.footer {
            let available = area.size().height;
            if footer.height > available {
                return Err(GenpdfError::new(
                    "Footer height exceeds available space",
                    ErrorKind::InvalidData,
                ));
            }

            let mut footer_area = area.clone();
            footer_area.add_offset(Position::new(0, available - footer.height));
            let mut element = (footer.factory)(self.page);
            let result = element.render(context, footer_area, style)?;
            if result.has_more {
                return Err(GenpdfError::new(
                    "Footer element does not fit into the reserved space",
                    ErrorKind::PageSizeExceeded,
                ));
            }

            area.set_height(available - footer.height);
        }

        Ok(area)
    }
}

/// Renders document trees to PDF bytes.
#[derive(Clone, Debug)]
pub struct PdfAdapter {
    paper_size: Size,
}

impl Default for PdfAdapter {
    fn default() -> Self {
        Self {
            paper_size: PaperSize::A4.into(),
        }
    }
}

impl PdfAdapter {
    /// Creates an adapter printing on A4 paper.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the paper size.
    pub fn with_paper_size(mut self, paper_size: impl Into<Size>) -> Self {
        self.paper_size = paper_size.into();
        self
    }
}

impl RenderingAdapter for PdfAdapter {
    type Error = RenderError;

    fn render(&self, tree: &DocumentTree) -> Result<Vec<u8>, RenderError> {
        for table in tree.pages().iter().filter_map(Page::table) {
            check_table_shape(table)?;
        }

        let base = base_margins(tree.pages());
        let mut builder = DocumentBuilder::new(tree.font_family())
            .with_title(tree.info().title.as_str())
            .with_paper_size(self.paper_size)
            .with_margins(to_margins(base));

        if let Some(first) = tree.pages().first() {
            if tree.pages().iter().any(|page| page.footer() != first.footer()) {
                debug!("pages carry different footers; printing the first one on every page");
            }
            if !first.footer().is_empty() {
                let footer = first.footer().to_owned();
                builder = builder.with_footer(mm_from_f64(FOOTER_HEIGHT_MM), move |_| {
                    let span = Span::tagged(footer.as_str(), StyleTag::Footer);
                    let mut paragraph = Paragraph::new(styled_string(&span));
                    paragraph.set_alignment(Alignment::Center);
                    paragraph
                });
            }
        }
        debug!(
            "document subject '{}' and author '{}' are not embedded",
            tree.info().subject,
            tree.info().author
        );

        let mut document = builder.build()?;
        let mut skipped = SkippedStyling::default();
        let line_color = tree.palette().border;
        for (index, page) in tree.pages().iter().enumerate() {
            if index > 0 {
                document.push(PageBreak::new());
            }
            document.push(page_element(page, base, line_color, &mut skipped));
        }
        skipped.report();

        let mut bytes = Vec::new();
        document.render(&mut bytes).map_err(RenderError::Layout)?;
        debug!(
            "rendered {} tree pages into {} bytes",
            tree.pages().len(),
            bytes.len()
        );
        Ok(bytes)
    }
}

/// Styling present in the tree that the PDF output leaves out.
#[derive(Default)]
struct SkippedStyling {
    shaded: usize,
    vertically_aligned: usize,
}

impl SkippedStyling {
    fn report(&self) {
        if self.shaded > 0 || self.vertically_aligned > 0 {
            warn!(
                "PDF output ignores shading on {} cells or frames and vertical alignment on {} cells",
                self.shaded, self.vertically_aligned
            );
        }
    }
}

fn base_margins(pages: &[Page]) -> PageMargins {
    pages
        .iter()
        .map(Page::margins)
        .reduce(|a, b| PageMargins {
            top_mm: a.top_mm.min(b.top_mm),
            right_mm: a.right_mm.min(b.right_mm),
            bottom_mm: a.bottom_mm.min(b.bottom_mm),
            left_mm: a.left_mm.min(b.left_mm),
        })
        .unwrap_or(PageMargins::symmetric(0.0, 0.0))
}

fn to_margins(margins: PageMargins) -> Margins {
    Margins::trbl(
        mm_from_f64(margins.top_mm),
        mm_from_f64(margins.right_mm),
        mm_from_f64(margins.bottom_mm),
        mm_from_f64(margins.left_mm),
    )
}

fn page_element(
    page: &Page,
    base: PageMargins,
    line_color: Rgb,
    skipped: &mut SkippedStyling,
) -> PaddedElement<LinearLayout> {
    let mut layout = LinearLayout::vertical();
    let (before, after): (Vec<&TextFrame>, Vec<&TextFrame>) = page
        .frames()
        .iter()
        .partition(|frame| frame.placement() != FramePlacement::AfterTable);

    for frame in before {
        layout.push(frame_element(frame, line_color, skipped));
    }
    if let Some(table) = page.table() {
        for row in grid_rows(table, line_color, skipped) {
            layout.push(row);
        }
    }
    for frame in after {
        layout.push(frame_element(frame, line_color, skipped));
    }

    let margins = page.margins();
    let extra = PageMargins {
        top_mm: margins.top_mm - base.top_mm,
        right_mm: margins.right_mm - base.right_mm,
        bottom_mm: margins.bottom_mm - base.bottom_mm,
        left_mm: margins.left_mm - base.left_mm,
    };
    PaddedElement::new(layout, to_margins(extra))
}

fn frame_element(
    frame: &TextFrame,
    line_color: Rgb,
    skipped: &mut SkippedStyling,
) -> PaddedElement<GridRow> {
    if frame.shading().is_some() {
        skipped.shaded += 1;
    }

    let mut content = LinearLayout::vertical();
    for paragraph in frame.paragraphs() {
        content.push(text_block(paragraph.spans(), paragraph.alignment()));
    }

    let borders = Borders::all(frame.border());
    let cell = match frame.width_mm() {
        Some(width) => GridCell::new(content, width, borders),
        None => GridCell::stretched(content, borders),
    };

    let left = match frame.placement() {
        FramePlacement::Absolute { left_mm, top_mm } => {
            debug!("frame placed at ({left_mm}mm, {top_mm}mm) is drawn in the page flow");
            left_mm
        }
        FramePlacement::BeforeTable | FramePlacement::AfterTable => 0.0,
    };
    PaddedElement::new(
        GridRow::new(vec![cell], line_color),
        Margins::trbl(
            mm_from_f64(frame.space_before_mm()),
            Mm::default(),
            Mm::default(),
            mm_from_f64(left),
        ),
    )
}

/// Rejects tables whose rows do not hold exactly one cell per column.
fn check_table_shape(table: &Table) -> Result<(), RenderError> {
    let columns = table.columns().len();
    match table
        .rows()
        .iter()
        .position(|row| row.cells().len() != columns)
    {
        Some(index) => Err(RenderError::Layout(GenpdfError::new(
            format!(
                "table row {} has {} cells, expected {}",
                index,
                table.rows()[index].cells().len(),
                columns
            ),
            ErrorKind::InvalidData,
        ))),
        None => Ok(()),
    }
}

fn grid_rows(table: &Table, line_color: Rgb, skipped: &mut SkippedStyling) -> Vec<GridRow> {
    let edges = resolved_borders(table);
    let columns = table.columns();

    table
        .rows()
        .iter()
        .zip(&edges)
        .map(|(row, row_edges)| {
            let mut cells = Vec::with_capacity(columns.len());
            let mut column = 0;
            while column < row.cells().len() {
                let cell = row.cell(column);
                let last = column
                    .saturating_add(cell.merge_right())
                    .min(row.cells().len() - 1);
                if cell.shading().is_some() {
                    skipped.shaded += 1;
                }
                if cell.vertical_alignment() != VerticalAlignment::Top {
                    skipped.vertically_aligned += 1;
                }

                let width = columns[column..=last]
                    .iter()
                    .map(|col| col.width_mm)
                    .sum::<f64>();
                let mut borders = row_edges[column];
                borders.right = row_edges[last].right;
                let alignment = cell.alignment().unwrap_or(columns[column].alignment);
                cells.push(GridCell::new(
                    text_block(cell.spans(), alignment),
                    width,
                    borders,
                ));
                column = last + 1;
            }
            GridRow::new(cells, line_color)
        })
        .collect()
}

/// Cell edges with the lines inside downward merges removed.
fn resolved_borders(table: &Table) -> Vec<Vec<Borders>> {
    let rows = table.rows();
    let mut edges: Vec<Vec<Borders>> = rows
        .iter()
        .map(|row| row.cells().iter().map(|cell| cell.borders()).collect())
        .collect();

    for (row_index, row) in rows.iter().enumerate() {
        for (column, cell) in row.cells().iter().enumerate() {
            let last_row = row_index
                .saturating_add(cell.merge_down())
                .min(rows.len() - 1);
            let last_column = column
                .saturating_add(cell.merge_right())
                .min(row.cells().len() - 1);
            for below in row_index + 1..=last_row {
                for covered in column..=last_column {
                    edges[below - 1][covered].bottom = BorderLine::Hidden;
                    edges[below][covered].top = BorderLine::Hidden;
                }
            }
        }
    }

    edges
}

fn text_block(spans: &[Span], alignment: HorizontalAlignment) -> TextBlock {
    let alignment = to_alignment(alignment);
    if spans.is_empty() {
        TextBlock::Blank(Break::new(1.0))
    } else if spans.iter().any(Span::is_underlined) {
        TextBlock::Underlined(
            UnderlinedText::new(spans_to_styled_strings(spans)).with_alignment(alignment),
        )
    } else {
        let mut paragraph = Paragraph::default();
        for span in spans {
            paragraph.push(styled_string(span));
        }
        paragraph.set_alignment(alignment);
        TextBlock::Plain(paragraph)
    }
}

fn to_alignment(alignment: HorizontalAlignment) -> Alignment {
    match alignment {
        HorizontalAlignment::Left => Alignment::Left,
        HorizontalAlignment::Center => Alignment::Center,
        HorizontalAlignment::Right => Alignment::Right,
    }
}
