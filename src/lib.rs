//! Cost aggregation for quotes and composition of paginated table reports.
//!
//! A [`Quote`] holds ordered [`Section`]s of [`LineItem`]s.  The
//! [`ReportComposer`] turns a quote into a renderer-agnostic [`DocumentTree`],
//! which a [`RenderingAdapter`] such as [`JsonAdapter`] or [`PdfAdapter`] turns
//! into bytes.

pub mod adapter;
pub mod builder;
pub mod compose;
pub mod config;
pub mod cost;
pub mod document;
pub mod elements;
pub mod error;
pub mod fonts;
pub mod format;
pub mod richtext;

pub use adapter::{render_quote, JsonAdapter, RenderingAdapter, ReportError};
pub use builder::{PdfAdapter, RenderError};
pub use compose::ReportComposer;
pub use config::{ComposerConfig, Letterhead, ReportStyle};
pub use cost::{
    compute_quote_totals, compute_section_totals, CostCheck, LineItem, Quote, QuoteTotals,
    Section, SectionColumns, SectionTotals,
};
pub use document::DocumentTree;
pub use error::{MalformedQuoteError, ValidationError};
