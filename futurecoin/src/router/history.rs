use std::sync::Arc;

use futurecoin_core::{
    Attribution, Dataset, FutureCoinConnector, FutureCoinError, HistoryRequest, IntervalClass,
    Symbol, sanitize_dataset,
};

use crate::FutureCoin;

impl FutureCoin {
    /// Reject symbols outside the configured set.
    pub(crate) fn ensure_supported(&self, symbol: &Symbol) -> Result<(), FutureCoinError> {
        if self.cfg.supports(symbol) {
            Ok(())
        } else {
            Err(FutureCoinError::validation(
                "unsupported_symbol",
                format!("symbol {symbol} is not supported"),
            ))
        }
    }

    /// Fetch the configured maximum lookback of candles for a symbol.
    ///
    /// # Errors
    /// See [`history_with_attribution`](Self::history_with_attribution).
    pub async fn history(
        &self,
        symbol: &Symbol,
        interval: IntervalClass,
    ) -> Result<Dataset, FutureCoinError> {
        let req = HistoryRequest::new(interval, self.cfg.limits.max_lookback(interval))?;
        let (ds, _attr) = self.history_with_attribution(symbol, req).await?;
        Ok(ds)
    }

    /// Fetch history and report which connector supplied it.
    ///
    /// Behavior:
    /// - Eligible connectors expose history for the requested interval class and
    ///   are tried in priority order (or raced under `FetchStrategy::Latency`).
    /// - The first successful non-empty dataset wins; there is no cross-provider
    ///   arbitration. Empty responses move on to the next provider.
    /// - Each connector receives `min(lookback, connector max)`.
    /// - Rows violating candle invariants are dropped and logged; a response
    ///   with no valid rows counts as a provider failure.
    ///
    /// The dataset is quoted in the supplying connector's native currency.
    ///
    /// # Errors
    /// - `Validation` for unsupported symbols or lookbacks above the configured maximum.
    /// - `Unsupported` when no connector serves the interval class.
    /// - `NotFound` when every provider returned nothing or `NotFound`.
    /// - `AllProvidersTimedOut` / `AllProvidersFailed` otherwise.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            target = "futurecoin::router",
            name = "futurecoin::router::history",
            skip(self),
            fields(symbol = %symbol, interval = %req.interval, lookback = req.lookback),
        )
    )]
    pub async fn history_with_attribution(
        &self,
        symbol: &Symbol,
        req: HistoryRequest,
    ) -> Result<(Dataset, Attribution), FutureCoinError> {
        self.ensure_supported(symbol)?;
        let max = self.cfg.limits.max_lookback(req.interval);
        if req.lookback > max {
            return Err(FutureCoinError::validation(
                "lookback_out_of_range",
                format!("lookback must be between 1 and {max}"),
            ));
        }

        let (name, ds) = self
            .fetch_single(
                symbol,
                Some(req.interval),
                "history",
                "history",
                move |c: Arc<dyn FutureCoinConnector>| {
                    let p = c.as_history_provider()?;
                    if !p.supported_intervals().contains(&req.interval) {
                        return None;
                    }
                    let capped = HistoryRequest {
                        lookback: req.lookback.min(p.max_lookback(req.interval)).max(1),
                        ..req
                    };
                    let symbol = symbol.clone();
                    Some(async move {
                        let Some(p) = c.as_history_provider() else {
                            return Err(FutureCoinError::connector(
                                c.name(),
                                "missing history capability during call",
                            ));
                        };
                        let ds = p.history(&symbol, capped).await?;
                        if ds.is_empty() {
                            return Err(FutureCoinError::not_found(format!(
                                "history for {symbol}"
                            )));
                        }
                        let (clean, dropped) = sanitize_dataset(ds);
                        if clean.is_empty() {
                            return Err(FutureCoinError::DataIntegrity(format!(
                                "no valid candles for {symbol} ({dropped} dropped)"
                            )));
                        }
                        Ok(clean)
                    })
                },
            )
            .await?;

        let attr = Attribution::whole(name, &ds);
        Ok((ds, attr))
    }
}
