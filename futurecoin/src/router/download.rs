use std::collections::HashSet;

use futurecoin_core::{
    Currency, Dataset, DatasetStore, DownloadReport, FutureCoinError, HistoryRequest,
    IntervalClass, RateTable, Symbol, convert_dataset, merge_datasets,
};

use crate::FutureCoin;

/// Builder to orchestrate bulk history downloads for multiple symbols.
pub struct DownloadBuilder<'a> {
    pub(crate) fc: &'a FutureCoin,
    pub(crate) symbols: Vec<Symbol>,
    pub(crate) interval: IntervalClass,
    pub(crate) lookback: Option<u32>,
    pub(crate) target: Option<Currency>,
    pub(crate) store: Option<DatasetStore>,
    pub(crate) persist: bool,
}

impl<'a> DownloadBuilder<'a> {
    /// Create a new builder bound to a `FutureCoin` instance.
    ///
    /// Starts with no symbols, daily candles at the configured maximum
    /// lookback, no currency conversion, and the orchestrator's store.
    #[must_use]
    pub fn new(fc: &'a FutureCoin) -> Self {
        Self {
            fc,
            symbols: Vec::new(),
            interval: IntervalClass::Daily,
            lookback: None,
            target: None,
            store: fc.store.clone(),
            persist: true,
        }
    }

    /// Replace the symbol list.
    ///
    /// # Errors
    /// Returns `InvalidArg` if the list repeats a symbol.
    pub fn symbols(mut self, symbols: &[Symbol]) -> Result<Self, FutureCoinError> {
        let mut seen = HashSet::new();
        for s in symbols {
            if !seen.insert(s) {
                return Err(FutureCoinError::InvalidArg(format!(
                    "duplicate symbol '{s}' in symbols list"
                )));
            }
        }
        self.symbols = symbols.to_vec();
        Ok(self)
    }

    /// Add a single symbol.
    ///
    /// # Errors
    /// Returns `InvalidArg` if the symbol is already listed.
    pub fn add_symbol(mut self, symbol: Symbol) -> Result<Self, FutureCoinError> {
        if self.symbols.contains(&symbol) {
            return Err(FutureCoinError::InvalidArg(format!(
                "duplicate symbol '{symbol}' already exists in symbols list"
            )));
        }
        self.symbols.push(symbol);
        Ok(self)
    }

    /// Select the interval class.
    #[must_use]
    pub const fn interval(mut self, interval: IntervalClass) -> Self {
        self.interval = interval;
        self
    }

    /// Number of most recent candles per symbol; defaults to the configured maximum.
    #[must_use]
    pub const fn lookback(mut self, lookback: u32) -> Self {
        self.lookback = Some(lookback);
        self
    }

    /// Convert every dataset into `currency` before persisting and merging.
    #[must_use]
    pub const fn target_currency(mut self, currency: Currency) -> Self {
        self.target = Some(currency);
        self
    }

    /// Write into `store` instead of the orchestrator's store.
    #[must_use]
    pub fn store(mut self, store: DatasetStore) -> Self {
        self.store = Some(store);
        self
    }

    /// Skip writing files even when a store is configured.
    #[must_use]
    pub const fn dry_run(mut self) -> Self {
        self.persist = false;
        self
    }

    /// Rates window covering `lookback` candles of `interval`, padded for
    /// weekends and holidays without FX fixes.
    fn rate_days(&self, lookback: u32) -> u32 {
        let span = match self.interval {
            IntervalClass::Daily => lookback,
            IntervalClass::Hourly => lookback.div_ceil(24),
        };
        span.saturating_add(7)
    }

    /// Execute the download.
    ///
    /// Behavior:
    /// - Fetches every symbol concurrently through [`FutureCoin::history_with_attribution`].
    /// - With a target currency, fetches one rate table and converts each
    ///   dataset, dropping and counting candles without a rate. Datasets that
    ///   cannot be converted are reported as warnings.
    /// - Persists each dataset (merging with rows already on disk), merges
    ///   all datasets into one table sorted by `(timestamp, symbol)`, and
    ///   persists the merged table.
    /// - Per-symbol failures become warnings and never abort the batch.
    ///
    /// # Errors
    /// Returns an error only for an empty symbol list, duplicate symbols, an
    /// invalid lookback, or when the request deadline elapses.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            target = "futurecoin::router",
            name = "futurecoin::router::download",
            skip(self),
            fields(symbols = self.symbols.len(), interval = %self.interval),
        )
    )]
    pub async fn run(self) -> Result<DownloadReport, FutureCoinError> {
        if self.symbols.is_empty() {
            return Err(FutureCoinError::InvalidArg(
                "no symbols specified for download".into(),
            ));
        }
        let mut seen = HashSet::new();
        for s in &self.symbols {
            if !seen.insert(s) {
                return Err(FutureCoinError::InvalidArg(format!(
                    "duplicate symbol '{s}' detected in symbols list"
                )));
            }
        }
        let lookback = self
            .lookback
            .unwrap_or_else(|| self.fc.cfg.limits.max_lookback(self.interval));
        let req = HistoryRequest::new(self.interval, lookback)?;

        let fetch = async {
            let tasks = self.symbols.iter().map(|s| {
                let fc = self.fc;
                async move { (s.clone(), fc.history_with_attribution(s, req).await) }
            });
            let joined = futures::future::join_all(tasks).await;
            let rates = match self.target {
                Some(t) if !t.is_usd_pegged() => {
                    Some(self.fc.exchange_rates(Currency::Usd, t, self.rate_days(lookback)).await)
                }
                _ => None,
            };
            (joined, rates)
        };
        let (joined, rates) =
            crate::core::with_request_deadline(self.fc.cfg.request_timeout, fetch)
                .await
                .map_err(|_| FutureCoinError::request_timeout("download:history"))?;

        let mut report = DownloadReport::default();
        let table: Option<RateTable> = match rates {
            Some(Ok(t)) => Some(t),
            Some(Err(e)) => {
                report.warnings.push(e);
                None
            }
            None => None,
        };

        for (symbol, result) in joined {
            let ds = match result {
                Ok((ds, _attr)) => ds,
                Err(e) => {
                    #[cfg(feature = "tracing")]
                    tracing::warn!(symbol = %symbol, error = %e, "download failed for symbol");
                    #[cfg(not(feature = "tracing"))]
                    let _ = &symbol;
                    report.warnings.push(e);
                    continue;
                }
            };
            let ds = match self.target {
                Some(t) => match convert_dataset(ds, t, table.as_ref()) {
                    Ok(n) => {
                        report.dropped_without_rate += n.dropped;
                        n.dataset
                    }
                    Err(e) => {
                        report.warnings.push(e);
                        continue;
                    }
                },
                None => ds,
            };
            if ds.is_empty() {
                continue;
            }
            report.datasets.push(ds);
        }

        if report.datasets.is_empty() {
            return Ok(report);
        }

        match merge_datasets(self.interval, report.datasets.iter().cloned()) {
            Ok(merged) => report.merged = Some(merged),
            Err(e) => report.warnings.push(e),
        }

        if self.persist
            && let Some(store) = &self.store
        {
            persist(store, &mut report);
        }
        Ok(report)
    }
}

fn persist(store: &DatasetStore, report: &mut DownloadReport) {
    let written: Vec<Result<std::path::PathBuf, FutureCoinError>> = report
        .datasets
        .iter()
        .map(|ds: &Dataset| store.write(ds))
        .chain(report.merged.iter().map(|m| store.write_merged(m)))
        .collect();
    for res in written {
        match res {
            Ok(path) => report.files.push(path),
            Err(e) => report.warnings.push(e),
        }
    }
}

impl FutureCoin {
    /// Begin building a bulk download request.
    ///
    /// Typical usage: chain `symbols`/`interval`/`target_currency` then call `run()`.
    #[must_use]
    pub fn download(&'_ self) -> DownloadBuilder<'_> {
        DownloadBuilder::new(self)
    }
}
