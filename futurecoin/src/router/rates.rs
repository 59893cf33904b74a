use std::sync::Arc;

use futurecoin_core::{
    Currency, FutureCoinConnector, FutureCoinError, RateRequest, RateTable, Symbol,
};

use crate::FutureCoin;

impl FutureCoin {
    /// Fetch daily exchange rates for `base -> quote` covering `days` calendar days.
    ///
    /// Only connectors reporting support for the pair are asked. A table with
    /// no positive samples counts as `NotFound` and moves on to the next provider.
    ///
    /// # Errors
    /// `InvalidArg` for a zero-day window; `Unsupported` when no connector
    /// serves the pair; otherwise the aggregated provider outcome.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            target = "futurecoin::router",
            name = "futurecoin::router::exchange_rates",
            skip(self),
        )
    )]
    pub async fn exchange_rates(
        &self,
        base: Currency,
        quote: Currency,
        days: u32,
    ) -> Result<RateTable, FutureCoinError> {
        if days == 0 {
            return Err(FutureCoinError::InvalidArg(
                "exchange rate window must cover at least one day".into(),
            ));
        }
        let req = RateRequest { base, quote, days };
        // Rates are not symbol-specific; the pair label keys priorities and messages.
        let pair = Symbol::new(&format!("{}{}", base.code(), quote.code()))?;
        let (_, table) = self
            .fetch_single(
                &pair,
                None,
                "exchange_rate",
                "exchange rate",
                move |c: Arc<dyn FutureCoinConnector>| {
                    let p = c.as_rate_provider()?;
                    if !p.supports_pair(base, quote) {
                        return None;
                    }
                    Some(async move {
                        let Some(p) = c.as_rate_provider() else {
                            return Err(FutureCoinError::connector(
                                c.name(),
                                "missing exchange_rate capability during call",
                            ));
                        };
                        let table = p.exchange_rates(req).await?;
                        if table.is_empty() {
                            return Err(FutureCoinError::not_found(format!(
                                "{base} to {quote} rates"
                            )));
                        }
                        Ok(table)
                    })
                },
            )
            .await?;
        Ok(table)
    }
}
