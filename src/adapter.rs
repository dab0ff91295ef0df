//! The narrow boundary between composition and rendering.

use thiserror::Error;

use crate::compose::ReportComposer;
use crate::cost::Quote;
use crate::document::DocumentTree;
use crate::error::MalformedQuoteError;

/// Turns a finished [`DocumentTree`] into bytes.
pub trait RenderingAdapter {
    /// Failure raised while rendering.
    type Error: std::error::Error + 'static;

    /// Renders the whole tree.
    fn render(&self, tree: &DocumentTree) -> Result<Vec<u8>, Self::Error>;
}

/// Writes the tree as pretty-printed JSON.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonAdapter;

impl RenderingAdapter for JsonAdapter {
    type Error = serde_json::Error;

    fn render(&self, tree: &DocumentTree) -> Result<Vec<u8>, Self::Error> {
        serde_json::to_vec_pretty(tree)
    }
}

/// Failure of [`render_quote`].
#[derive(Debug, Error)]
pub enum ReportError<E> {
    /// The quote could not be composed.
    #[error("failed to compose quote")]
    Compose(#[from] MalformedQuoteError),
    /// The adapter failed on a composed tree.
    #[error("failed to render report")]
    Render(#[source] E),
}

/// Composes `quote` and hands the tree to `adapter`.
pub fn render_quote<A>(
    composer: &ReportComposer,
    quote: &Quote,
    adapter: &A,
) -> Result<Vec<u8>, ReportError<A::Error>>
where
    A: RenderingAdapter + ?Sized,
{
    let tree = composer.build(quote)?;
    adapter.render(&tree).map_err(ReportError::Render)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cost::{LineItem, Section};
    use crate::error::ValidationError;
    use rust_decimal_macros::dec;
    use std::error::Error as _;

    #[test]
    fn json_adapter_round_trips_the_tree() {
        let quote = Quote::new("Retrofit").with_section(
            Section::new("Boiler Room").with_item(
                LineItem::builder("Flue")
                    .quantity(3)
                    .unit_labour_cost(dec!(1))
                    .build()
                    .expect("valid item"),
            ),
        );
        let composer = ReportComposer::default();

        let bytes = render_quote(&composer, &quote, &JsonAdapter).expect("renders");
        let tree: DocumentTree = serde_json::from_slice(&bytes).expect("tree parses");
        assert_eq!(tree, composer.build(&quote).expect("composes"));
    }

    #[test]
    fn compose_failures_keep_their_cause() {
        let quote: Quote =
            serde_json::from_str(r#"{"title": "Broken", "extra_costs": "-5"}"#).expect("parses");

        let err = render_quote(&ReportComposer::default(), &quote, &JsonAdapter).unwrap_err();
        assert!(matches!(
            err,
            ReportError::Compose(MalformedQuoteError::InvalidQuote(
                ValidationError::NegativeAmount { .. }
            ))
        ));
        assert!(err.source().is_some());
    }
}
