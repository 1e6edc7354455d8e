//! Colors and named color schemes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::QualityTier;

/// Opaque RGB color, written as `#rrggbb`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const WHITE: Color = Color::rgb(0xff, 0xff, 0xff);
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const NEUTRAL: Color = Color::rgb(0x80, 0x80, 0x80);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl FromStr for Color {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.trim().trim_start_matches('#');
        if !hex.is_ascii() {
            return Err(format!("invalid color '{}': not hexadecimal", s));
        }
        let expanded: String = match hex.len() {
            3 => hex.chars().flat_map(|c| [c, c]).collect(),
            6 => hex.to_string(),
            _ => return Err(format!("invalid color '{}': expected #rgb or #rrggbb", s)),
        };
        let channel = |i: usize| {
            u8::from_str_radix(&expanded[i..i + 2], 16)
                .map_err(|_| format!("invalid color '{}': not hexadecimal", s))
        };
        Ok(Color::rgb(channel(0)?, channel(2)?, channel(4)?))
    }
}

impl TryFrom<String> for Color {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_string()
    }
}

/// One color per known tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorScheme {
    pub excellent: Color,
    pub good: Color,
    pub fair: Color,
    pub poor: Color,
}

impl ColorScheme {
    /// Color for `tier`, or `None` for unknown tiers.
    pub fn get(&self, tier: &QualityTier) -> Option<Color> {
        match tier {
            QualityTier::Excellent => Some(self.excellent),
            QualityTier::Good => Some(self.good),
            QualityTier::Fair => Some(self.fair),
            QualityTier::Poor => Some(self.poor),
            QualityTier::Unknown(_) => None,
        }
    }

    pub fn default_scheme() -> Self {
        Self {
            excellent: Color::rgb(0x33, 0xff, 0x57),
            good: Color::rgb(0x31, 0x86, 0xcc),
            fair: Color::rgb(0xff, 0x57, 0x33),
            poor: Color::rgb(0xff, 0x00, 0x00),
        }
    }

    pub fn viridis() -> Self {
        Self {
            excellent: Color::rgb(0x44, 0x01, 0x54),
            good: Color::rgb(0x31, 0x68, 0x8e),
            fair: Color::rgb(0x35, 0xb7, 0x79),
            poor: Color::rgb(0xfd, 0xe7, 0x24),
        }
    }

    pub fn plasma() -> Self {
        Self {
            excellent: Color::rgb(0x0d, 0x08, 0x87),
            good: Color::rgb(0x7e, 0x03, 0xa8),
            fair: Color::rgb(0xcc, 0x47, 0x78),
            poor: Color::rgb(0xf8, 0x95, 0x40),
        }
    }

    pub fn cool() -> Self {
        Self {
            excellent: Color::rgb(0x00, 0xff, 0xff),
            good: Color::rgb(0x00, 0x80, 0xff),
            fair: Color::rgb(0x80, 0x00, 0xff),
            poor: Color::rgb(0xff, 0x00, 0xff),
        }
    }
}

/// Color for `tier` in `scheme`, `neutral` when the tier is unknown.
pub fn color_for(tier: &QualityTier, scheme: &ColorScheme, neutral: Color) -> Color {
    scheme.get(tier).unwrap_or(neutral)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display_color() {
        let c: Color = "#33FF57".parse().unwrap();
        assert_eq!(c, Color::rgb(0x33, 0xff, 0x57));
        assert_eq!(c.to_string(), "#33ff57");
        let short: Color = "#fff".parse().unwrap();
        assert_eq!(short, Color::WHITE);
    }

    #[test]
    fn test_invalid_color_rejected() {
        assert!("#12345".parse::<Color>().is_err());
        assert!("#zzzzzz".parse::<Color>().is_err());
    }

    #[test]
    fn test_unknown_tier_is_neutral() {
        let scheme = ColorScheme::default_scheme();
        let tier = QualityTier::Unknown("Stellar".into());
        assert_eq!(color_for(&tier, &scheme, Color::NEUTRAL), Color::NEUTRAL);
        assert_eq!(
            color_for(&QualityTier::Poor, &scheme, Color::NEUTRAL),
            Color::rgb(0xff, 0, 0)
        );
    }

    #[test]
    fn test_color_serde_roundtrip_through_string() {
        let json = serde_json::to_string(&Color::rgb(1, 2, 3)).unwrap();
        assert_eq!(json, "\"#010203\"");
        let back: Color = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Color::rgb(1, 2, 3));
    }
}
