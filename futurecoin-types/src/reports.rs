//! Report envelopes produced by orchestrators and helpers.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::candle::{Dataset, MergedDataset};
use crate::error::FutureCoinError;

/// Summary of a bulk history download.
///
/// Carries the merged table when at least one symbol succeeded, the
/// per-symbol datasets, the files written, and non-fatal warnings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct DownloadReport {
    /// All fetched rows merged and sorted by `(timestamp, symbol)`.
    pub merged: Option<MergedDataset>,
    /// Per-symbol datasets after normalization.
    pub datasets: Vec<Dataset>,
    /// Dataset files written to the store.
    pub files: Vec<PathBuf>,
    /// Candles dropped for lack of an exchange rate.
    pub dropped_without_rate: usize,
    /// Non-fatal issues encountered while building the report.
    pub warnings: Vec<FutureCoinError>,
}
