//! Quality classification and palettes.
//!
//! [`QualityConfig`] is the single shared, versioned quality artifact: the
//! per-metric threshold ladders, the named color schemes and the neutral
//! color used for unrecognised tiers. It is loaded once and shared through an
//! `Arc` by every view; nothing mutates it afterwards.

pub mod classifier;
pub mod palette;

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ErrorContext, VizError};

pub use classifier::{classify, MetricKind, QualityLadder, QualityTier};
pub use palette::{color_for, Color, ColorScheme};

/// Version of the built-in quality configuration.
pub const QUALITY_CONFIG_VERSION: u32 = 1;

/// Name of the scheme used when none is requested.
pub const DEFAULT_SCHEME: &str = "default";

/// Threshold ladders for each metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ladders {
    #[serde(default = "default_rsrp")]
    pub rsrp: QualityLadder,
    #[serde(default = "default_rsrq")]
    pub rsrq: QualityLadder,
    #[serde(default = "default_sinr")]
    pub sinr: QualityLadder,
}

fn default_rsrp() -> QualityLadder {
    QualityLadder::RSRP
}

fn default_rsrq() -> QualityLadder {
    QualityLadder::RSRQ
}

fn default_sinr() -> QualityLadder {
    QualityLadder::SINR
}

impl Default for Ladders {
    fn default() -> Self {
        Self {
            rsrp: default_rsrp(),
            rsrq: default_rsrq(),
            sinr: default_sinr(),
        }
    }
}

impl Ladders {
    pub fn get(&self, kind: MetricKind) -> &QualityLadder {
        match kind {
            MetricKind::Rsrp => &self.rsrp,
            MetricKind::Rsrq => &self.rsrq,
            MetricKind::Sinr => &self.sinr,
        }
    }
}

fn default_version() -> u32 {
    QUALITY_CONFIG_VERSION
}

fn default_scheme_name() -> String {
    DEFAULT_SCHEME.to_string()
}

fn default_neutral() -> Color {
    Color::NEUTRAL
}

fn builtin_schemes() -> BTreeMap<String, ColorScheme> {
    BTreeMap::from([
        (DEFAULT_SCHEME.to_string(), ColorScheme::default_scheme()),
        ("viridis".to_string(), ColorScheme::viridis()),
        ("plasma".to_string(), ColorScheme::plasma()),
        ("cool".to_string(), ColorScheme::cool()),
    ])
}

/// Versioned quality ladders and color schemes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityConfig {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default = "default_scheme_name")]
    pub default_scheme: String,
    #[serde(default = "default_neutral")]
    pub neutral: Color,
    #[serde(default)]
    pub ladders: Ladders,
    #[serde(default = "builtin_schemes")]
    pub schemes: BTreeMap<String, ColorScheme>,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            default_scheme: default_scheme_name(),
            neutral: default_neutral(),
            ladders: Ladders::default(),
            schemes: builtin_schemes(),
        }
    }
}

impl QualityConfig {
    /// Load a quality configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, VizError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            VizError::configuration_with_context(
                format!("Failed to read quality config: {}", e),
                ErrorContext::new("load_quality_config").with_details(path.display().to_string()),
            )
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate a quality configuration.
    pub fn from_toml_str(content: &str) -> Result<Self, VizError> {
        let config: QualityConfig = toml::from_str(content).map_err(|e| {
            VizError::configuration(format!("Failed to parse quality config: {}", e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check ladder ordering and that the default scheme exists.
    pub fn validate(&self) -> Result<(), VizError> {
        for kind in MetricKind::ALL {
            if !self.ladders.get(kind).is_ordered() {
                return Err(VizError::configuration_with_context(
                    "Ladder thresholds must be strictly descending",
                    ErrorContext::new("validate_quality_config").with_entity_id(kind.as_str()),
                ));
            }
        }
        if !self.schemes.contains_key(&self.default_scheme) {
            return Err(VizError::configuration(format!(
                "Default scheme '{}' is not defined",
                self.default_scheme
            )));
        }
        Ok(())
    }

    /// Classify a measurement against the configured ladder.
    pub fn classify(&self, value: f64, kind: MetricKind) -> QualityTier {
        self.ladders.get(kind).classify(value)
    }

    pub fn scheme(&self, name: &str) -> Option<&ColorScheme> {
        self.schemes.get(name)
    }

    pub fn has_scheme(&self, name: &str) -> bool {
        self.schemes.contains_key(name)
    }

    pub fn scheme_names(&self) -> impl Iterator<Item = &str> {
        self.schemes.keys().map(String::as_str)
    }

    /// Color for `tier` in the named scheme.
    ///
    /// Unknown tiers are neutral. An unknown scheme falls back to the
    /// default scheme.
    pub fn color_for(&self, tier: &QualityTier, scheme: &str) -> Color {
        match self
            .schemes
            .get(scheme)
            .or_else(|| self.schemes.get(&self.default_scheme))
        {
            Some(s) => color_for(tier, s, self.neutral),
            None => self.neutral,
        }
    }
}
