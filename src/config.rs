use std::fmt;
use std::path::Path;

use anyhow::{Result, ensure};
use serde::Deserialize;
use serde::de::{self, Deserializer, SeqAccess, Visitor};

use crate::error::Error;

/// Digit keys the speed presets are bound to, in order.
pub const SPEED_PRESET_KEYS: usize = 10;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct Configuration {
    /// Borderless fullscreen on the current monitor; a regular window otherwise.
    pub fullscreen: bool,
    /// Lock presentation to the display refresh.
    pub vsync: bool,
    /// Hide the pointer while it is over the window.
    pub hide_cursor: bool,
    /// Speed multipliers bound to the digit keys 1, 2, ..., 9, 0.
    pub speed_presets: Vec<f64>,
    /// Colour the surface is cleared to on a tick where a corner pick commits.
    pub pick_feedback_color: FeedbackColor,
    /// Upper bound on the uploaded texture's longest side; the device limit applies otherwise.
    pub max_texture_dimension: Option<u32>,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            fullscreen: true,
            vsync: true,
            hide_cursor: false,
            speed_presets: Self::default_speed_presets(),
            pick_feedback_color: FeedbackColor::default(),
            max_texture_dimension: None,
        }
    }
}

impl Configuration {
    pub fn default_speed_presets() -> Vec<f64> {
        vec![0.15, 0.25, 0.5, 0.6, 0.8, 1.2, 1.5, 1.8, 2.0, 2.5]
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, Error> {
        let s = std::fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&s)?)
    }

    /// Validate runtime invariants that cannot be expressed via serde defaults alone.
    pub fn validated(self) -> Result<Self> {
        ensure!(
            !self.speed_presets.is_empty(),
            "speed-presets must list at least one multiplier"
        );
        ensure!(
            self.speed_presets.len() <= SPEED_PRESET_KEYS,
            "speed-presets supports at most {} entries (one per digit key)",
            SPEED_PRESET_KEYS
        );
        for (idx, speed) in self.speed_presets.iter().enumerate() {
            ensure!(
                speed.is_finite() && *speed > 0.0,
                "speed-presets[{}] must be a positive finite number",
                idx
            );
        }
        if let Some(max) = self.max_texture_dimension {
            ensure!(max > 0, "max-texture-dimension must be greater than zero");
        }
        Ok(self)
    }
}

/// RGB colour given either as `[r, g, b]` or as a `#rrggbb` string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedbackColor(pub [u8; 3]);

impl Default for FeedbackColor {
    fn default() -> Self {
        Self([0, 255, 0])
    }
}

impl FeedbackColor {
    pub fn to_wgpu(self) -> wgpu::Color {
        let [r, g, b] = self.0;
        wgpu::Color {
            r: f64::from(r) / 255.0,
            g: f64::from(g) / 255.0,
            b: f64::from(b) / 255.0,
            a: 1.0,
        }
    }

    fn parse_hex(raw: &str) -> Option<Self> {
        let hex = raw.strip_prefix('#')?;
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        Some(Self([channel(0)?, channel(2)?, channel(4)?]))
    }
}

impl<'de> Deserialize<'de> for FeedbackColor {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(FeedbackColorVisitor)
    }
}

struct FeedbackColorVisitor;

impl<'de> Visitor<'de> for FeedbackColorVisitor {
    type Value = FeedbackColor;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("an [r, g, b] list or a \"#rrggbb\" string")
    }

    fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        FeedbackColor::parse_hex(value)
            .ok_or_else(|| de::Error::invalid_value(de::Unexpected::Str(value), &self))
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut rgb = [0u8; 3];
        for (idx, slot) in rgb.iter_mut().enumerate() {
            *slot = seq
                .next_element()?
                .ok_or_else(|| de::Error::invalid_length(idx, &self))?;
        }
        if seq.next_element::<u8>()?.is_some() {
            return Err(de::Error::invalid_length(4, &self));
        }
        Ok(FeedbackColor(rgb))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_color_parses() {
        assert_eq!(
            FeedbackColor::parse_hex("#ff8000"),
            Some(FeedbackColor([255, 128, 0]))
        );
        assert_eq!(FeedbackColor::parse_hex("ff8000"), None);
        assert_eq!(FeedbackColor::parse_hex("#ff80"), None);
    }

    #[test]
    fn default_presets_fill_every_digit() {
        assert_eq!(
            Configuration::default_speed_presets().len(),
            SPEED_PRESET_KEYS
        );
        assert!(Configuration::default().validated().is_ok());
    }
}
