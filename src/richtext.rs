//! Styled text runs carried by document tree cells and frames.
//!
//! A [`Span`] is renderer-agnostic: it names a [`StyleTag`] (the role of the text,
//! such as a table value or a job title) plus inline decorations.  Adapters map
//! tags to concrete fonts; the PDF adapter does so in [`crate::elements`].

use serde::{Deserialize, Serialize};

/// Named text role, resolved to a concrete font size and weight by the renderer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StyleTag {
    /// Body text.
    #[default]
    Normal,
    /// Regular table content.
    Table,
    /// Emphasised names inside tables, such as job titles and materials.
    Title,
    /// Page headings above a table.
    Reference,
    /// Small print in the letterhead frame.
    Letterhead,
    /// Page footer text.
    Footer,
}

impl StyleTag {
    /// Font size in points used for the tag.
    pub fn font_size(self) -> u8 {
        match self {
            StyleTag::Normal | StyleTag::Reference => 10,
            StyleTag::Table | StyleTag::Title | StyleTag::Footer => 9,
            StyleTag::Letterhead => 7,
        }
    }

    /// Whether text with this tag is rendered bold regardless of span flags.
    pub fn is_bold(self) -> bool {
        matches!(self, StyleTag::Title)
    }
}

/// A slice of text together with its role and inline decorations.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    text: String,
    #[serde(default)]
    tag: StyleTag,
    #[serde(default)]
    bold: bool,
    #[serde(default)]
    italic: bool,
    #[serde(default)]
    underline: bool,
}

impl Span {
    /// Creates a new span with the provided text, the `Normal` tag and no decorations.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// Creates a span with the given tag.
    pub fn tagged(text: impl Into<String>, tag: StyleTag) -> Self {
        Self::new(text).with_tag(tag)
    }

    /// Returns the raw text contained in this span.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns the style tag.
    pub fn tag(&self) -> StyleTag {
        self.tag
    }

    /// Returns whether the span should be rendered in bold.
    pub fn is_bold(&self) -> bool {
        self.bold || self.tag.is_bold()
    }

    /// Returns whether the span should be rendered in italic.
    pub fn is_italic(&self) -> bool {
        self.italic
    }

    /// Returns whether the span is marked as underlined.
    pub fn is_underlined(&self) -> bool {
        self.underline
    }

    /// Sets the tag and returns the updated span.
    pub fn with_tag(mut self, tag: StyleTag) -> Self {
        self.tag = tag;
        self
    }

    /// Sets the bold flag and returns the updated span.
    pub fn with_bold(mut self, bold: bool) -> Self {
        self.bold = bold;
        self
    }

    /// Sets the underline flag and returns the updated span.
    pub fn with_underline(mut self, underline: bool) -> Self {
        self.underline = underline;
        self
    }

    /// Convenience shorthand that marks the span as bold.
    pub fn bold(self) -> Self {
        self.with_bold(true)
    }

    /// Convenience shorthand that marks the span as italic.
    pub fn italic(mut self) -> Self {
        self.italic = true;
        self
    }

    /// Convenience shorthand that marks the span as underlined.
    pub fn underline(self) -> Self {
        self.with_underline(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_tag_is_bold_and_table_sized() {
        let span = Span::tagged("Above Ground DMV", StyleTag::Title);
        assert!(span.is_bold());
        assert_eq!(span.tag().font_size(), 9);
    }

    #[test]
    fn flags_are_independent_of_the_tag() {
        let span = Span::new("Total Cost").bold().italic().underline();
        assert!(span.is_bold());
        assert!(span.is_italic());
        assert!(span.is_underlined());
        assert_eq!(span.tag().font_size(), 10);
    }

    #[test]
    fn spans_round_trip_through_json_with_defaults() {
        let span: Span = serde_json::from_str(r#"{"text":"Comments"}"#).expect("span parses");
        assert_eq!(span, Span::new("Comments"));
    }
}
