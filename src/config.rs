use std::env::{self, VarError};
use std::{fs, path::Path};

use serde::Deserialize;
use thiserror::Error;

use crate::labeling::LabelWeight;

/// Settings consumed by the incremental labeling modes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Settings {
    smoothing: f64,
    label_weight: LabelWeight,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing setting: {0}")]
    Missing(&'static str),
    #[error("invalid value for {name}: {source}")]
    Invalid {
        name: &'static str,
        #[source]
        source: anyhow::Error,
    },
    #[error("unknown label_weight function: {0}")]
    UnknownLabelWeightScale(String),
    #[error("failed to read settings file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse settings: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// YAML shape. Both keys accept either numbers or strings, matching how
/// experiment settings files are usually written.
#[derive(Debug, Deserialize)]
struct RawSettings {
    smoothing: Option<serde_yaml::Value>,
    label_weight: Option<LabelWeight>,
}

impl Settings {
    /// # Errors
    /// Returns [`ConfigError::Invalid`] when `smoothing` is negative or not finite.
    pub fn new(smoothing: f64, label_weight: LabelWeight) -> Result<Self, ConfigError> {
        Ok(Self {
            smoothing: check_smoothing(smoothing)?,
            label_weight,
        })
    }

    /// Reads `CLASSTM_SMOOTHING` (default `0`) and `CLASSTM_LABEL_WEIGHT`
    /// (default `1`).
    ///
    /// # Errors
    /// Returns [`ConfigError`] when either value fails to parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        let smoothing = check_smoothing(parse_f64("CLASSTM_SMOOTHING", 0.0)?)?;
        let label_weight = match read_var("CLASSTM_LABEL_WEIGHT")? {
            Some(raw) => LabelWeight::parse(&raw)?,
            None => LabelWeight::default(),
        };
        Ok(Self {
            smoothing,
            label_weight,
        })
    }

    /// Parses settings from YAML with `smoothing` and `label_weight` keys.
    ///
    /// # Errors
    /// Returns [`ConfigError::Missing`] for an absent key and
    /// [`ConfigError::Yaml`]/[`ConfigError::Invalid`] for malformed values.
    pub fn from_yaml_str(raw: &str) -> Result<Self, ConfigError> {
        let raw: RawSettings = serde_yaml::from_str(raw)?;
        let smoothing = match raw.smoothing.ok_or(ConfigError::Missing("smoothing"))? {
            serde_yaml::Value::Number(number) => {
                number.as_f64().ok_or_else(|| ConfigError::Invalid {
                    name: "smoothing",
                    source: anyhow::anyhow!("not representable as f64: {number}"),
                })?
            }
            serde_yaml::Value::String(text) => {
                text.trim()
                    .parse::<f64>()
                    .map_err(|error| ConfigError::Invalid {
                        name: "smoothing",
                        source: anyhow::Error::new(error),
                    })?
            }
            other => {
                return Err(ConfigError::Invalid {
                    name: "smoothing",
                    source: anyhow::anyhow!("expected a number, got {other:?}"),
                });
            }
        };
        let label_weight = raw
            .label_weight
            .ok_or(ConfigError::Missing("label_weight"))?;
        Self::new(smoothing, label_weight)
    }

    /// # Errors
    /// Returns [`ConfigError::Io`] when the file cannot be read, otherwise the
    /// errors of [`Settings::from_yaml_str`].
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_yaml_str(&fs::read_to_string(path)?)
    }

    /// Pseudo-row value held by unlabeled documents.
    #[must_use]
    pub fn smoothing(&self) -> f64 {
        self.smoothing
    }

    #[must_use]
    pub fn label_weight(&self) -> LabelWeight {
        self.label_weight
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            smoothing: 0.0,
            label_weight: LabelWeight::default(),
        }
    }
}

fn check_smoothing(value: f64) -> Result<f64, ConfigError> {
    if value.is_sign_negative() || !value.is_finite() {
        return Err(ConfigError::Invalid {
            name: "smoothing",
            source: anyhow::anyhow!("smoothing must be a finite non-negative number: {value}"),
        });
    }
    Ok(value)
}

fn parse_f64(name: &'static str, default: f64) -> Result<f64, ConfigError> {
    let Some(raw) = read_var(name)? else {
        return Ok(default);
    };
    raw.trim().parse::<f64>().map_err(|error| ConfigError::Invalid {
        name,
        source: anyhow::Error::new(error),
    })
}

/// Unset variables read as `None`; values that are not valid UTF-8 are errors.
fn read_var(name: &'static str) -> Result<Option<String>, ConfigError> {
    match env::var(name) {
        Ok(raw) => Ok(Some(raw)),
        Err(VarError::NotPresent) => Ok(None),
        Err(error @ VarError::NotUnicode(_)) => Err(ConfigError::Invalid {
            name,
            source: anyhow::Error::new(error),
        }),
    }
}
