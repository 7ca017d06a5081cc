//! Serializable backtest configuration.
//!
//! `BacktestConfig` is validated once, eagerly, and is immutable for the
//! duration of a run. Validation collects every bad field before failing so
//! the caller sees all problems at once.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use quantlab_core::CostModel;

/// One invalid field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigIssue {
    pub field: String,
    pub value: String,
    pub expected: String,
}

impl ConfigIssue {
    pub fn new(
        field: impl Into<String>,
        value: impl ToString,
        expected: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            value: value.to_string(),
            expected: expected.into(),
        }
    }
}

impl fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} = {} (expected {})",
            self.field, self.value, self.expected
        )
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("invalid configuration: {}", join_issues(.0))]
    Invalid(Vec<ConfigIssue>),

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error("failed to read config {path}: {reason}")]
    Io { path: String, reason: String },
}

impl ConfigError {
    pub fn single(issue: ConfigIssue) -> Self {
        ConfigError::Invalid(vec![issue])
    }

    /// Every invalid field; empty for parse and I/O failures.
    pub fn issues(&self) -> &[ConfigIssue] {
        match self {
            ConfigError::Invalid(issues) => issues,
            _ => &[],
        }
    }
}

fn join_issues(issues: &[ConfigIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Parameters for a single backtest, shared by every run in a batch or grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestConfig {
    pub initial_capital: f64,
    /// Fraction of available cash committed per BUY, in (0, 1].
    pub position_size_fraction: f64,
    pub commission_rate: f64,
    pub min_commission: f64,
    /// Benchmark ticker; `None` skips benchmark statistics.
    pub benchmark: Option<String>,
    /// Annual risk-free rate used by Sharpe and Sortino.
    pub risk_free_rate: f64,
    pub slippage_rate: f64,
    /// Minimum bars a run needs before it is simulated.
    pub min_bars: usize,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            initial_capital: 100_000.0,
            position_size_fraction: 0.1,
            commission_rate: 0.0,
            min_commission: 0.0,
            benchmark: Some("SPY".to_string()),
            risk_free_rate: 0.02,
            slippage_rate: 0.0,
            min_bars: 2,
        }
    }
}

impl BacktestConfig {
    /// Check every field and report all violations together.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut issues = Vec::new();

        if !(self.initial_capital.is_finite() && self.initial_capital > 0.0) {
            issues.push(ConfigIssue::new(
                "initial_capital",
                self.initial_capital,
                "a finite value > 0",
            ));
        }
        if !(self.position_size_fraction > 0.0 && self.position_size_fraction <= 1.0) {
            issues.push(ConfigIssue::new(
                "position_size_fraction",
                self.position_size_fraction,
                "a value in (0, 1]",
            ));
        }
        if !(0.0..=1.0).contains(&self.commission_rate) {
            issues.push(ConfigIssue::new(
                "commission_rate",
                self.commission_rate,
                "a value in [0, 1]",
            ));
        }
        if !(self.min_commission.is_finite() && self.min_commission >= 0.0) {
            issues.push(ConfigIssue::new(
                "min_commission",
                self.min_commission,
                "a finite value >= 0",
            ));
        }
        if !(0.0..1.0).contains(&self.slippage_rate) {
            issues.push(ConfigIssue::new(
                "slippage_rate",
                self.slippage_rate,
                "a value in [0, 1)",
            ));
        }
        if !self.risk_free_rate.is_finite() {
            issues.push(ConfigIssue::new(
                "risk_free_rate",
                self.risk_free_rate,
                "a finite value",
            ));
        }
        if self.min_bars < 2 {
            issues.push(ConfigIssue::new("min_bars", self.min_bars, "at least 2"));
        }
        if let Some(benchmark) = &self.benchmark {
            if benchmark.trim().is_empty() {
                issues.push(ConfigIssue::new(
                    "benchmark",
                    format!("{benchmark:?}"),
                    "a non-blank ticker or no benchmark",
                ));
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Invalid(issues))
        }
    }

    /// Parse TOML and validate. Missing fields take their defaults.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_toml_str(&content)
    }

    pub fn cost_model(&self) -> CostModel {
        CostModel::new(self.slippage_rate, self.commission_rate, self.min_commission)
    }

    /// Deterministic BLAKE3 hash of the canonical JSON form.
    ///
    /// Identical configs always produce the same fingerprint, so results
    /// from the same settings are recognisable across runs.
    pub fn fingerprint(&self) -> String {
        // Field order is fixed by the struct, so serde_json output is canonical.
        let json = serde_json::to_string(self).unwrap_or_default();
        blake3::hash(json.as_bytes()).to_hex().to_string()
    }
}
