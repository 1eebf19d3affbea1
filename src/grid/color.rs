use anyhow::{anyhow, bail, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const COLOR_MARKER: char = '#';

/// A single LED color, written `#rrggbb` everywhere outside the device wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PixelColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl PixelColor {
    pub const BLACK: PixelColor = PixelColor::rgb(0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn to_rgb_array(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }

    /// Hex digits without the leading marker, as the device expects them.
    pub fn to_wire(self) -> String {
        hex::encode(self.to_rgb_array())
    }

    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        let Some(digits) = trimmed.strip_prefix(COLOR_MARKER) else {
            bail!("color '{trimmed}' is missing the '{COLOR_MARKER}' marker");
        };
        if digits.len() != 6 {
            bail!("color '{trimmed}' must have exactly 6 hex digits");
        }
        let mut rgb = [0u8; 3];
        hex::decode_to_slice(digits, &mut rgb)
            .map_err(|err| anyhow!("color '{trimmed}' is not valid hex: {err}"))?;
        Ok(Self::rgb(rgb[0], rgb[1], rgb[2]))
    }
}

impl fmt::Display for PixelColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{COLOR_MARKER}{}", self.to_wire())
    }
}

impl FromStr for PixelColor {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for PixelColor {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<PixelColor> for String {
    fn from(color: PixelColor) -> Self {
        color.to_string()
    }
}

pub fn default_palette() -> Vec<PixelColor> {
    vec![
        PixelColor::rgb(0xff, 0x00, 0x00),
        PixelColor::rgb(0xff, 0x80, 0x00),
        PixelColor::rgb(0xff, 0xff, 0x00),
        PixelColor::rgb(0x00, 0xff, 0x00),
        PixelColor::rgb(0x00, 0xff, 0xff),
        PixelColor::rgb(0x00, 0x00, 0xff),
        PixelColor::rgb(0x80, 0x00, 0xff),
        PixelColor::rgb(0xff, 0x00, 0xff),
        PixelColor::rgb(0xff, 0xff, 0xff),
        PixelColor::BLACK,
    ]
}

pub fn default_current_color() -> PixelColor {
    PixelColor::rgb(0xff, 0x00, 0x00)
}

/// Join colors into the comma separated form used by the key-value store.
pub fn join_colors(colors: &[PixelColor]) -> String {
    colors
        .iter()
        .map(PixelColor::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

/// Split a comma separated color list. Entries that fail to parse become
/// black so positional data keeps its shape.
pub fn split_colors(raw: &str) -> Vec<PixelColor> {
    if raw.trim().is_empty() {
        return Vec::new();
    }
    raw.split(',')
        .map(|part| {
            PixelColor::parse(part).unwrap_or_else(|err| {
                tracing::warn!("replacing unreadable stored color with black: {err}");
                PixelColor::BLACK
            })
        })
        .collect()
}
