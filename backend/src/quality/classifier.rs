//! Signal quality tiers and threshold ladders.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Radio metric a ladder applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    /// Reference signal received power, dBm.
    Rsrp,
    /// Reference signal received quality, dB.
    Rsrq,
    /// Signal to interference plus noise ratio, dB.
    Sinr,
}

impl MetricKind {
    pub const ALL: [MetricKind; 3] = [MetricKind::Rsrp, MetricKind::Rsrq, MetricKind::Sinr];

    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Rsrp => "rsrp",
            MetricKind::Rsrq => "rsrq",
            MetricKind::Sinr => "sinr",
        }
    }
}

/// Ordered quality tier, best first.
///
/// Tier names that are not recognised are preserved as `Unknown` so they can
/// still be displayed; they always color neutral.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QualityTier {
    Excellent,
    Good,
    Fair,
    Poor,
    Unknown(String),
}

impl QualityTier {
    pub const KNOWN: [QualityTier; 4] = [
        QualityTier::Excellent,
        QualityTier::Good,
        QualityTier::Fair,
        QualityTier::Poor,
    ];

    /// Parse a producer tier name. `Moderate` is an alias of `Fair`.
    pub fn parse(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "excellent" => QualityTier::Excellent,
            "good" => QualityTier::Good,
            "fair" | "moderate" => QualityTier::Fair,
            "poor" => QualityTier::Poor,
            _ => QualityTier::Unknown(name.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            QualityTier::Excellent => "Excellent",
            QualityTier::Good => "Good",
            QualityTier::Fair => "Fair",
            QualityTier::Poor => "Poor",
            QualityTier::Unknown(name) => name,
        }
    }

    /// Position in the ordered tier set, `None` for unknown tiers.
    pub fn rank(&self) -> Option<usize> {
        Self::KNOWN.iter().position(|t| t == self)
    }

    pub fn description(&self) -> &'static str {
        match self {
            QualityTier::Excellent => "Excellent coverage and bitrates",
            QualityTier::Good => "Good signal strength",
            QualityTier::Fair => "Moderate signal quality",
            QualityTier::Poor => "Poor signal quality (cell edges)",
            QualityTier::Unknown(_) => "Unclassified",
        }
    }
}

impl fmt::Display for QualityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for QualityTier {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for QualityTier {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(QualityTier::parse(&name))
    }
}

/// Inclusive lower bounds for Excellent, Good and Fair. Anything below is Poor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityLadder {
    pub excellent: f64,
    pub good: f64,
    pub fair: f64,
}

impl QualityLadder {
    pub const RSRP: QualityLadder = QualityLadder {
        excellent: -80.0,
        good: -95.0,
        fair: -110.0,
    };
    pub const RSRQ: QualityLadder = QualityLadder {
        excellent: -10.0,
        good: -12.0,
        fair: -15.0,
    };
    pub const SINR: QualityLadder = QualityLadder {
        excellent: 20.0,
        good: 10.0,
        fair: 0.0,
    };

    pub fn builtin(kind: MetricKind) -> Self {
        match kind {
            MetricKind::Rsrp => Self::RSRP,
            MetricKind::Rsrq => Self::RSRQ,
            MetricKind::Sinr => Self::SINR,
        }
    }

    /// Tier for `value`. NaN falls through to Poor.
    pub fn classify(&self, value: f64) -> QualityTier {
        if value >= self.excellent {
            QualityTier::Excellent
        } else if value >= self.good {
            QualityTier::Good
        } else if value >= self.fair {
            QualityTier::Fair
        } else {
            QualityTier::Poor
        }
    }

    /// Thresholds must be strictly descending.
    pub fn is_ordered(&self) -> bool {
        self.excellent > self.good && self.good > self.fair
    }
}

/// Classify against the built-in ladder for `kind`.
pub fn classify(value: f64, kind: MetricKind) -> QualityTier {
    QualityLadder::builtin(kind).classify(value)
}
