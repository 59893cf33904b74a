//! Attribution of fetched history to the connector that supplied it.

use crate::candle::Dataset;
use crate::market::Symbol;

/// A continuous span of timestamps [start..=end] that a connector contributed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    /// Inclusive start timestamp (seconds since epoch).
    pub start: i64,
    /// Inclusive end timestamp (seconds since epoch).
    pub end: i64,
}

/// Which connector supplied which timestamp spans of a dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribution {
    /// Symbol the attribution refers to.
    pub symbol: Symbol,
    /// Collected spans annotated by connector name.
    pub spans: Vec<(&'static str, Span)>,
}

impl Attribution {
    /// Create a new attribution container for a symbol.
    #[must_use]
    pub const fn new(symbol: Symbol) -> Self {
        Self {
            symbol,
            spans: vec![],
        }
    }

    /// Record a provider span contribution.
    pub fn push(&mut self, item: (&'static str, Span)) {
        self.spans.push(item);
    }

    /// Attribute the whole of `dataset` to one connector.
    #[must_use]
    pub fn whole(connector: &'static str, dataset: &Dataset) -> Self {
        let mut out = Self::new(dataset.symbol().clone());
        if let (Some(first), Some(last)) = (dataset.candles().first(), dataset.last()) {
            out.push((
                connector,
                Span {
                    start: first.ts.timestamp(),
                    end: last.ts.timestamp(),
                },
            ));
        }
        out
    }
}
