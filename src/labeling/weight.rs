//! Label weight policy: how much evidence a labeled document puts into its
//! class pseudo-row.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::config::ConfigError;

const SETTING_NAME: &str = "label_weight";

/// Weighting rule parsed from a `label_weight` setting.
///
/// Accepted forms:
/// * `doc:<v>` scales `v` by the document's real-word token count
/// * `corpus:<v>` scales `v` by the number of documents in the corpus
/// * `<v>` uses `v` as is
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LabelWeight {
    Fixed(f64),
    ScaledByDocLength(f64),
    ScaledByCorpusSize(f64),
}

impl LabelWeight {
    /// Weight assigned to the class pseudo-row of a labeled document.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn weight(&self, doc_token_count: f64, corpus_doc_count: usize) -> f64 {
        match *self {
            Self::Fixed(value) => value,
            Self::ScaledByDocLength(value) => value * doc_token_count,
            Self::ScaledByCorpusSize(value) => value * corpus_doc_count as f64,
        }
    }

    /// Parses the `label_weight` grammar.
    ///
    /// # Errors
    /// Returns [`ConfigError::UnknownLabelWeightScale`] when the prefix before
    /// `:` is neither `doc` nor `corpus`, and [`ConfigError::Invalid`] when the
    /// numeric part does not parse.
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let raw = raw.trim();
        match raw.split_once(':') {
            Some(("doc", value)) => parse_value(value).map(Self::ScaledByDocLength),
            Some(("corpus", value)) => parse_value(value).map(Self::ScaledByCorpusSize),
            Some((scale, _)) => Err(ConfigError::UnknownLabelWeightScale(scale.to_string())),
            None => parse_value(raw).map(Self::Fixed),
        }
    }
}

impl Default for LabelWeight {
    fn default() -> Self {
        Self::Fixed(1.0)
    }
}

fn parse_value(raw: &str) -> Result<f64, ConfigError> {
    let value = raw
        .trim()
        .parse::<f64>()
        .map_err(|error| ConfigError::Invalid {
            name: SETTING_NAME,
            source: anyhow::Error::new(error),
        })?;
    check_value(value)
}

fn check_value(value: f64) -> Result<f64, ConfigError> {
    if value.is_sign_negative() || !value.is_finite() {
        return Err(ConfigError::Invalid {
            name: SETTING_NAME,
            source: anyhow::anyhow!("label weight must be a finite non-negative number: {value}"),
        });
    }
    Ok(value)
}

impl FromStr for LabelWeight {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for LabelWeight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed(value) => write!(f, "{value}"),
            Self::ScaledByDocLength(value) => write!(f, "doc:{value}"),
            Self::ScaledByCorpusSize(value) => write!(f, "corpus:{value}"),
        }
    }
}

impl Serialize for LabelWeight {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for LabelWeight {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // YAML may hand us a bare number for the fixed form.
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(f64),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(value) => check_value(value)
                .map(Self::Fixed)
                .map_err(serde::de::Error::custom),
            Raw::Text(text) => Self::parse(&text).map_err(serde::de::Error::custom),
        }
    }
}
