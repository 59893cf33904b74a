//! Flat-file CSV persistence for datasets and merged tables.
//!
//! Files use the columns `Date|Datetime,Open,High,Low,Close,Volume,Symbol,Currency`.
//! Daily files carry a `Date` column formatted `YYYY-MM-DD`; hourly files carry
//! an RFC 3339 `Datetime`. Rows are sorted by timestamp then symbol.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use csv::{ReaderBuilder, StringRecord, Writer};
use rust_decimal::Decimal;

use crate::timeseries::merge::merge_candles_by_priority;
use crate::timeseries::validate::partition_valid;
use futurecoin_types::{Candle, Currency, Dataset, FutureCoinError, IntervalClass, MergedDataset, Symbol};

const VALUE_COLUMNS: [&str; 7] = ["Open", "High", "Low", "Close", "Volume", "Symbol", "Currency"];

/// Directory-backed CSV store keyed by symbol and interval class.
#[derive(Debug, Clone)]
pub struct DatasetStore {
    root: PathBuf,
}

impl DatasetStore {
    /// Store rooted at `root`; the directory is created on first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File path for one symbol's dataset, e.g. `btc_daily.csv`.
    #[must_use]
    pub fn path_for(&self, symbol: &Symbol, interval: IntervalClass) -> PathBuf {
        self.root.join(format!(
            "{}_{}.csv",
            symbol.as_str().to_ascii_lowercase(),
            interval.as_str()
        ))
    }

    /// File path for a merged table, e.g. `merged_hourly.csv`.
    #[must_use]
    pub fn merged_path(&self, interval: IntervalClass) -> PathBuf {
        self.root.join(format!("merged_{}.csv", interval.as_str()))
    }

    /// Persist a dataset, merging with any rows already on disk.
    ///
    /// Freshly fetched rows supersede stored rows with the same timestamp.
    /// The file is replaced atomically via a temporary sibling.
    ///
    /// # Errors
    /// Returns `Storage` on I/O or CSV failures and `DataIntegrity` when the
    /// stored file holds another currency than `ds`.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "futurecoin_core::storage::write",
            skip(self, ds),
            fields(symbol = %ds.symbol(), interval = %ds.interval(), rows = ds.len()),
        )
    )]
    pub fn write(&self, ds: &Dataset) -> Result<PathBuf, FutureCoinError> {
        let path = self.path_for(ds.symbol(), ds.interval());
        let existing = self.read(ds.symbol(), ds.interval())?;
        let rows = match existing {
            Some(old) if !old.is_empty() => {
                merge_candles_by_priority([ds.candles().to_vec(), old.into_candles()])?
            }
            _ => ds.candles().to_vec(),
        };
        write_rows(&path, ds.interval(), &rows)?;
        Ok(path)
    }

    /// Persist a merged table, replacing any previous file.
    ///
    /// # Errors
    /// Returns `Storage` on I/O or CSV failures.
    pub fn write_merged(&self, merged: &MergedDataset) -> Result<PathBuf, FutureCoinError> {
        let path = self.merged_path(merged.interval());
        write_rows(&path, merged.interval(), merged.rows())?;
        Ok(path)
    }

    /// Load one symbol's dataset; `Ok(None)` when no file exists.
    ///
    /// Rows that fail to parse or break candle invariants are dropped and
    /// logged.
    ///
    /// # Errors
    /// Returns `Storage` for unreadable files or missing columns and
    /// `DataIntegrity` when the file mixes symbols or currencies.
    pub fn read(
        &self,
        symbol: &Symbol,
        interval: IntervalClass,
    ) -> Result<Option<Dataset>, FutureCoinError> {
        let path = self.path_for(symbol, interval);
        if !path.exists() {
            return Ok(None);
        }
        let rows = read_rows(&path)?;
        let Some(currency) = rows.first().map(|c| c.currency) else {
            return Ok(Some(Dataset::empty(symbol.clone(), interval, Currency::Usd)));
        };
        if rows.iter().any(|c| c.currency != currency || c.symbol != *symbol) {
            return Err(FutureCoinError::DataIntegrity(format!(
                "{} mixes symbols or currencies",
                path.display()
            )));
        }
        Ok(Some(Dataset::new(symbol.clone(), interval, currency, rows)))
    }

    /// Load a merged table; `Ok(None)` when no file exists.
    ///
    /// # Errors
    /// Returns `Storage` or `DataIntegrity` as for [`DatasetStore::read`].
    pub fn read_merged(
        &self,
        interval: IntervalClass,
    ) -> Result<Option<MergedDataset>, FutureCoinError> {
        let path = self.merged_path(interval);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(MergedDataset::new(interval, read_rows(&path)?)))
    }
}

fn storage_err(path: &Path, e: impl std::fmt::Display) -> FutureCoinError {
    FutureCoinError::Storage(format!("{}: {e}", path.display()))
}

fn format_ts(ts: DateTime<Utc>, interval: IntervalClass) -> String {
    match interval {
        IntervalClass::Daily => ts.date_naive().format("%Y-%m-%d").to_string(),
        IntervalClass::Hourly => ts.to_rfc3339_opts(SecondsFormat::Secs, true),
    }
}

fn parse_ts(raw: &str) -> Result<DateTime<Utc>, FutureCoinError> {
    if let Ok(d) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return d
            .and_hms_opt(0, 0, 0)
            .map(|n| n.and_utc())
            .ok_or_else(|| FutureCoinError::DataIntegrity(format!("invalid date '{raw}'")));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%:z") {
        return Ok(dt.with_timezone(&Utc));
    }
    Ok(NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")?.and_utc())
}

fn write_rows(path: &Path, interval: IntervalClass, rows: &[Candle]) -> Result<(), FutureCoinError> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).map_err(|e| storage_err(dir, e))?;
    }
    let tmp = path.with_extension("csv.tmp");
    {
        let file = File::create(&tmp).map_err(|e| storage_err(&tmp, e))?;
        let mut writer = Writer::from_writer(file);
        let mut header = vec![interval.time_column()];
        header.extend(VALUE_COLUMNS);
        writer
            .write_record(&header)
            .map_err(|e| storage_err(&tmp, e))?;
        for c in rows {
            writer
                .write_record([
                    format_ts(c.ts, interval),
                    c.open.to_string(),
                    c.high.to_string(),
                    c.low.to_string(),
                    c.close.to_string(),
                    c.volume.to_string(),
                    c.symbol.to_string(),
                    c.currency.to_string(),
                ])
                .map_err(|e| storage_err(&tmp, e))?;
        }
        writer.flush().map_err(|e| storage_err(&tmp, e))?;
    }
    fs::rename(&tmp, path).map_err(|e| storage_err(path, e))
}

/// Parse every record, dropping and logging rows that fail to parse or that
/// break candle invariants. Only I/O and header problems fail the read.
fn read_rows(path: &Path) -> Result<Vec<Candle>, FutureCoinError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .map_err(|e| storage_err(path, e))?;
    let headers = reader.headers().map_err(|e| storage_err(path, e))?.clone();
    let col = |name: &str| -> Result<usize, FutureCoinError> {
        headers
            .iter()
            .position(|h| h.trim() == name)
            .ok_or_else(|| storage_err(path, format!("missing column '{name}'")))
    };
    let cols = Columns {
        ts: col("Datetime").or_else(|_| col("Date"))?,
        open: col("Open")?,
        high: col("High")?,
        low: col("Low")?,
        close: col("Close")?,
        volume: col("Volume")?,
        symbol: col("Symbol")?,
        currency: col("Currency").ok(),
    };

    let mut parsed = Vec::new();
    let mut unparsable = 0usize;
    for record in reader.records() {
        let row = match record {
            Ok(record) => cols.parse(&record),
            Err(e) if e.is_io_error() => return Err(storage_err(path, e)),
            Err(e) => Err(FutureCoinError::DataIntegrity(e.to_string())),
        };
        match row {
            Ok(c) => parsed.push(c),
            Err(_e) => {
                unparsable += 1;
                #[cfg(feature = "tracing")]
                tracing::warn!(path = %path.display(), error = %_e, "dropping unparsable row");
            }
        }
    }
    let (kept, rejected) = partition_valid(parsed);
    let _dropped = unparsable + rejected.len();
    #[cfg(feature = "tracing")]
    {
        for e in &rejected {
            tracing::warn!(path = %path.display(), error = %e, "dropping stored candle");
        }
        if _dropped > 0 {
            tracing::warn!(path = %path.display(), dropped = _dropped, "stored rows dropped on read");
        }
    }
    Ok(kept)
}

/// Column positions of a stored CSV file.
struct Columns {
    ts: usize,
    open: usize,
    high: usize,
    low: usize,
    close: usize,
    volume: usize,
    symbol: usize,
    currency: Option<usize>,
}

impl Columns {
    fn parse(&self, record: &StringRecord) -> Result<Candle, FutureCoinError> {
        let field = |i: usize| record.get(i).unwrap_or("").trim();
        let dec = |i: usize| -> Result<Decimal, FutureCoinError> {
            field(i)
                .parse::<Decimal>()
                .map_err(|e| FutureCoinError::DataIntegrity(format!("'{}': {e}", field(i))))
        };
        Ok(Candle {
            ts: parse_ts(field(self.ts))?,
            open: dec(self.open)?,
            high: dec(self.high)?,
            low: dec(self.low)?,
            close: dec(self.close)?,
            volume: dec(self.volume)?,
            symbol: Symbol::new(field(self.symbol))?,
            currency: match self.currency {
                Some(i) => field(i).parse()?,
                None => Currency::Usd,
            },
        })
    }
}
