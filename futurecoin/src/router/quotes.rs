use std::sync::Arc;

use futurecoin_core::{FutureCoinConnector, FutureCoinError, SpotPrice, Symbol};

use crate::FutureCoin;

impl FutureCoin {
    /// Fetch the latest spot price for a symbol.
    ///
    /// Honors the configured `FetchStrategy` and per-symbol priorities. Prices
    /// come back in the supplying connector's quote currency (USD or USDT).
    ///
    /// # Errors
    /// `Validation` for unsupported symbols; otherwise the aggregated provider
    /// outcome (`NotFound`, `AllProvidersTimedOut`, `AllProvidersFailed`, `Unsupported`).
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            target = "futurecoin::router",
            name = "futurecoin::router::spot_price",
            skip(self),
            fields(symbol = %symbol),
        )
    )]
    pub async fn spot_price(&self, symbol: &Symbol) -> Result<SpotPrice, FutureCoinError> {
        self.ensure_supported(symbol)?;
        let (_, price) = self
            .fetch_single(
                symbol,
                None,
                "quote",
                "quote",
                move |c: Arc<dyn FutureCoinConnector>| {
                    c.as_quote_provider()?;
                    let symbol = symbol.clone();
                    Some(async move {
                        match c.as_quote_provider() {
                            Some(p) => p.spot_price(&symbol).await,
                            None => Err(FutureCoinError::connector(
                                c.name(),
                                "missing quote capability during call",
                            )),
                        }
                    })
                },
            )
            .await?;
        Ok(price)
    }

    /// Fetch spot prices for several symbols concurrently.
    ///
    /// Returns `(prices, failures)`; one symbol failing never fails the batch.
    pub async fn spot_prices(
        &self,
        symbols: &[Symbol],
    ) -> (Vec<SpotPrice>, Vec<(Symbol, FutureCoinError)>) {
        let tasks = symbols.iter().map(|s| async move { (s.clone(), self.spot_price(s).await) });
        let results = futures::future::join_all(tasks).await;

        let mut ok: Vec<SpotPrice> = Vec::new();
        let mut failures: Vec<(Symbol, FutureCoinError)> = Vec::new();
        for (symbol, res) in results {
            match res {
                Ok(p) => ok.push(p),
                Err(e) => failures.push((symbol, e)),
            }
        }
        (ok, failures)
    }
}
