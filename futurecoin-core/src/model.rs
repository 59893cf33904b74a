//! Trained sequence models and the registry that resolves them.
//!
//! Models are stored one per file named `<type>_<symbol>_<timeframe>.<ext>`,
//! e.g. `lstm_btc_daily.json`. Only JSON linear sequence models are loadable;
//! other files matching the naming scheme are listed with a load error.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use futurecoin_types::{FutureCoinError, IntervalClass, Symbol};

/// A trained model that maps a window of recent prices to the next price.
pub trait SequenceModel: Send + Sync {
    /// Registry key, e.g. `lstm_btc_daily`.
    fn key(&self) -> &str;

    /// Model family label, e.g. `lstm`.
    fn model_type(&self) -> &str;

    /// Number of trailing observations the model consumes.
    fn sequence_length(&self) -> usize;

    /// Predict the value `steps` intervals after the end of `window`.
    ///
    /// `window` must hold exactly [`SequenceModel::sequence_length`] values,
    /// oldest first.
    ///
    /// # Errors
    /// Returns `InvalidArg` for a window of the wrong length or a zero step count.
    fn predict(&self, window: &[f64], steps: u32) -> Result<f64, FutureCoinError>;

    /// Confidence score from offline evaluation, in `[0, 1]`.
    fn confidence(&self) -> f64;

    /// Accuracy metric from offline evaluation, when recorded.
    fn accuracy(&self) -> Option<f64> {
        None
    }
}

/// Linear autoregressive model over min-max scaled closes.
///
/// The window is scaled to `[0, 1]`, combined with `weights` and `bias`, and
/// the output is mapped back to price space. Multi-step forecasts roll the
/// window forward one prediction at a time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearSequenceModel {
    /// Model family label.
    pub model_type: String,
    /// Asset the model was trained on.
    pub symbol: Symbol,
    /// Interval class the model was trained on.
    pub interval: IntervalClass,
    /// One weight per window position, oldest first.
    pub weights: Vec<f64>,
    /// Intercept in scaled space.
    #[serde(default)]
    pub bias: f64,
    /// Offline confidence score.
    pub confidence: f64,
    /// Offline accuracy metric.
    #[serde(default)]
    pub accuracy: Option<f64>,
    #[serde(skip)]
    key: String,
}

impl LinearSequenceModel {
    /// Build and validate a model.
    ///
    /// # Errors
    /// Returns `InvalidArg` for empty or non-finite weights, or a confidence
    /// outside `[0, 1]`.
    pub fn new(
        model_type: impl Into<String>,
        symbol: Symbol,
        interval: IntervalClass,
        weights: Vec<f64>,
        bias: f64,
        confidence: f64,
    ) -> Result<Self, FutureCoinError> {
        let mut m = Self {
            model_type: model_type.into(),
            symbol,
            interval,
            weights,
            bias,
            confidence,
            accuracy: None,
            key: String::new(),
        };
        m.check()?;
        Ok(m)
    }

    /// Attach an offline accuracy metric.
    #[must_use]
    pub const fn with_accuracy(mut self, accuracy: f64) -> Self {
        self.accuracy = Some(accuracy);
        self
    }

    /// Parse a model from its JSON file contents.
    ///
    /// # Errors
    /// Returns `InvalidArg` when the JSON is malformed or fails validation.
    pub fn from_json(raw: &str) -> Result<Self, FutureCoinError> {
        let mut m: Self = serde_json::from_str(raw)
            .map_err(|e| FutureCoinError::InvalidArg(format!("malformed model: {e}")))?;
        m.check()?;
        Ok(m)
    }

    fn check(&mut self) -> Result<(), FutureCoinError> {
        if self.weights.is_empty() {
            return Err(FutureCoinError::InvalidArg("model has no weights".into()));
        }
        if !self.weights.iter().all(|w| w.is_finite()) || !self.bias.is_finite() {
            return Err(FutureCoinError::InvalidArg(
                "model parameters must be finite".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.confidence) {
            return Err(FutureCoinError::InvalidArg(format!(
                "confidence {} outside [0, 1]",
                self.confidence
            )));
        }
        self.key = model_key(&self.model_type, &self.symbol, self.interval);
        Ok(())
    }

    fn step(&self, window: &[f64]) -> f64 {
        let (lo, hi) = window
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(*v), hi.max(*v))
            });
        let range = hi - lo;
        if range <= f64::EPSILON {
            return window.last().copied().unwrap_or(lo);
        }
        let scaled: f64 = self
            .weights
            .iter()
            .zip(window)
            .map(|(w, v)| w * (v - lo) / range)
            .sum::<f64>()
            + self.bias;
        (lo + scaled * range).max(0.0)
    }
}

impl SequenceModel for LinearSequenceModel {
    fn key(&self) -> &str {
        &self.key
    }

    fn model_type(&self) -> &str {
        &self.model_type
    }

    fn sequence_length(&self) -> usize {
        self.weights.len()
    }

    fn predict(&self, window: &[f64], steps: u32) -> Result<f64, FutureCoinError> {
        if window.len() != self.weights.len() {
            return Err(FutureCoinError::InvalidArg(format!(
                "{} expects {} observations, got {}",
                self.key,
                self.weights.len(),
                window.len()
            )));
        }
        if steps == 0 {
            return Err(FutureCoinError::InvalidArg("steps must be positive".into()));
        }
        let mut buf = window.to_vec();
        let mut next = self.step(&buf);
        for _ in 1..steps {
            buf.remove(0);
            buf.push(next);
            next = self.step(&buf);
        }
        Ok(next)
    }

    fn confidence(&self) -> f64 {
        self.confidence
    }

    fn accuracy(&self) -> Option<f64> {
        self.accuracy
    }
}

/// Registry key for a model: `<type>_<symbol>_<timeframe>` in lowercase.
#[must_use]
pub fn model_key(model_type: &str, symbol: &Symbol, interval: IntervalClass) -> String {
    format!(
        "{}_{}_{}",
        model_type.to_ascii_lowercase(),
        symbol.as_str().to_ascii_lowercase(),
        interval.as_str()
    )
}

/// Listing entry for one model file or registered model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelEntry {
    /// Registry key.
    pub key: String,
    /// Model family label.
    pub model_type: String,
    /// Asset served.
    pub symbol: Symbol,
    /// Interval class served.
    pub interval: IntervalClass,
    /// Whether the model is usable.
    pub loaded: bool,
    /// Window length, when loaded.
    pub sequence_length: Option<usize>,
    /// Load failure, when not loaded.
    pub error: Option<String>,
}

/// Summary counts of a registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryStatus {
    /// Model files or registrations seen.
    pub total: usize,
    /// Models usable for prediction.
    pub loaded: usize,
}

/// Read-only lookup of trained models by symbol and interval class.
///
/// Built once (typically by [`ModelRegistry::load_dir`]) and shared behind an `Arc`;
/// refreshing means building a new registry and swapping it in.
#[derive(Default, Clone)]
pub struct ModelRegistry {
    models: HashMap<(Symbol, IntervalClass), Arc<dyn SequenceModel>>,
    entries: Vec<ModelEntry>,
}

impl std::fmt::Debug for ModelRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelRegistry")
            .field("entries", &self.entries)
            .finish_non_exhaustive()
    }
}

impl ModelRegistry {
    /// Registry with no models; every lookup falls back.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Register a model for `(symbol, interval)`, replacing any previous one.
    #[must_use]
    pub fn with_model(
        mut self,
        symbol: Symbol,
        interval: IntervalClass,
        model: Arc<dyn SequenceModel>,
    ) -> Self {
        self.entries.retain(|e| !(e.symbol == symbol && e.interval == interval));
        self.entries.push(ModelEntry {
            key: model.key().to_string(),
            model_type: model.model_type().to_string(),
            symbol: symbol.clone(),
            interval,
            loaded: true,
            sequence_length: Some(model.sequence_length()),
            error: None,
        });
        self.models.insert((symbol, interval), model);
        self
    }

    /// Scan `dir` for model files.
    ///
    /// A missing directory yields an empty registry. Files that match the
    /// naming scheme but fail to load are listed with their error; files that
    /// do not match are ignored.
    ///
    /// # Errors
    /// Returns `Storage` when the directory exists but cannot be read.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "futurecoin_core::model::load_dir", skip(dir), fields(dir = %dir.as_ref().display()))
    )]
    pub fn load_dir(dir: impl AsRef<Path>) -> Result<Self, FutureCoinError> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            #[cfg(feature = "tracing")]
            tracing::info!("model directory absent; serving fallback predictions only");
            return Ok(Self::empty());
        }
        let mut paths: Vec<_> = fs::read_dir(dir)
            .map_err(|e| FutureCoinError::Storage(format!("{}: {e}", dir.display())))?
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|p| p.is_file())
            .collect();
        paths.sort();

        let mut out = Self::empty();
        for path in paths {
            let Some((model_type, symbol, interval)) = parse_model_file_name(&path) else {
                continue;
            };
            let key = model_key(&model_type, &symbol, interval);
            if out.models.contains_key(&(symbol.clone(), interval)) {
                out.entries.push(ModelEntry {
                    key,
                    model_type,
                    symbol,
                    interval,
                    loaded: false,
                    sequence_length: None,
                    error: Some("another model already serves this symbol and interval".into()),
                });
                continue;
            }
            match load_model_file(&path, &symbol, interval) {
                Ok(model) => {
                    #[cfg(feature = "tracing")]
                    tracing::info!(key = %key, "loaded model");
                    out = out.with_model(symbol, interval, Arc::new(model));
                }
                Err(e) => {
                    #[cfg(feature = "tracing")]
                    tracing::warn!(key = %key, error = %e, "model failed to load");
                    out.entries.push(ModelEntry {
                        key,
                        model_type,
                        symbol,
                        interval,
                        loaded: false,
                        sequence_length: None,
                        error: Some(e.to_string()),
                    });
                }
            }
        }
        Ok(out)
    }

    /// Resolve the model serving `(symbol, interval)`.
    ///
    /// # Errors
    /// Returns `ModelUnavailable` when none is loaded, carrying the recorded
    /// load failure if there was one.
    pub fn get(
        &self,
        symbol: &Symbol,
        interval: IntervalClass,
    ) -> Result<Arc<dyn SequenceModel>, FutureCoinError> {
        if let Some(m) = self.models.get(&(symbol.clone(), interval)) {
            return Ok(Arc::clone(m));
        }
        let failed = self
            .entries
            .iter()
            .find(|e| e.symbol == *symbol && e.interval == interval && !e.loaded);
        Err(match failed {
            Some(e) => FutureCoinError::model_unavailable(
                e.key.clone(),
                e.error.clone().unwrap_or_else(|| "load failed".into()),
            ),
            None => FutureCoinError::model_unavailable(
                format!("{}_{}", symbol.as_str().to_ascii_lowercase(), interval),
                "no model registered",
            ),
        })
    }

    /// Every model file or registration seen, in load order.
    #[must_use]
    pub fn list(&self) -> &[ModelEntry] {
        &self.entries
    }

    /// Counts of seen and usable models.
    #[must_use]
    pub fn status(&self) -> RegistryStatus {
        RegistryStatus {
            total: self.entries.len(),
            loaded: self.models.len(),
        }
    }
}

fn parse_model_file_name(path: &Path) -> Option<(String, Symbol, IntervalClass)> {
    let stem = path.file_stem()?.to_str()?;
    let mut parts = stem.rsplitn(3, '_');
    let interval = parts.next()?.parse::<IntervalClass>().ok()?;
    let symbol = Symbol::new(parts.next()?).ok()?;
    let model_type = parts.next()?.to_ascii_lowercase();
    if model_type.is_empty() {
        return None;
    }
    Some((model_type, symbol, interval))
}

fn load_model_file(
    path: &Path,
    symbol: &Symbol,
    interval: IntervalClass,
) -> Result<LinearSequenceModel, FutureCoinError> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    if !ext.eq_ignore_ascii_case("json") {
        return Err(FutureCoinError::Unsupported {
            capability: format!("model format '{ext}'"),
        });
    }
    let raw = fs::read_to_string(path)
        .map_err(|e| FutureCoinError::Storage(format!("{}: {e}", path.display())))?;
    let model = LinearSequenceModel::from_json(&raw)?;
    if model.symbol != *symbol || model.interval != interval {
        return Err(FutureCoinError::InvalidArg(format!(
            "file describes {} {} but is named for {symbol} {interval}",
            model.symbol, model.interval
        )));
    }
    Ok(model)
}
