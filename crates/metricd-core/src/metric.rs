//! The metric data model.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CodecError;

/// The two metric kinds. No third kind is ever valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    Counter,
    Gauge,
}

impl MetricKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Counter => "counter",
            MetricKind::Gauge => "gauge",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MetricKind {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "counter" => Ok(MetricKind::Counter),
            "gauge" => Ok(MetricKind::Gauge),
            other => Err(CodecError::UnknownKind(other.to_string())),
        }
    }
}

/// Kind-dependent payload of a metric.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MetricValue {
    /// Signed delta; the stored value is the sum of every delta applied.
    Counter(i64),
    /// Instantaneous reading; the latest write wins.
    Gauge(f64),
}

impl MetricValue {
    pub fn kind(&self) -> MetricKind {
        match self {
            MetricValue::Counter(_) => MetricKind::Counter,
            MetricValue::Gauge(_) => MetricKind::Gauge,
        }
    }
}

/// A named counter or gauge.
#[derive(Debug, Clone, PartialEq)]
pub struct Metric {
    pub id: String,
    pub value: MetricValue,
}

impl Metric {
    pub fn counter(id: impl Into<String>, delta: i64) -> Self {
        Self {
            id: id.into(),
            value: MetricValue::Counter(delta),
        }
    }

    pub fn gauge(id: impl Into<String>, value: f64) -> Self {
        Self {
            id: id.into(),
            value: MetricValue::Gauge(value),
        }
    }

    pub fn kind(&self) -> MetricKind {
        self.value.kind()
    }

    /// The counter delta, if this is a counter.
    pub fn delta(&self) -> Option<i64> {
        match self.value {
            MetricValue::Counter(d) => Some(d),
            MetricValue::Gauge(_) => None,
        }
    }

    /// The gauge value, if this is a gauge.
    pub fn gauge_value(&self) -> Option<f64> {
        match self.value {
            MetricValue::Gauge(v) => Some(v),
            MetricValue::Counter(_) => None,
        }
    }

    /// Render the bare payload, e.g. `10` or `2.75`.
    pub fn render_value(&self) -> String {
        match self.value {
            MetricValue::Counter(d) => d.to_string(),
            MetricValue::Gauge(v) => v.to_string(),
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}) = {}", self.id, self.kind(), self.render_value())
    }
}
