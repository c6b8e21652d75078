//! Color values.

use serde::Serialize;

use marten_common::warning::warn_once;

/// An sRGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ColorValue {
    /// Red channel (0-255).
    pub r: u8,
    /// Green channel (0-255).
    pub g: u8,
    /// Blue channel (0-255).
    pub b: u8,
    /// Alpha channel (0-255, 255 = fully opaque).
    pub a: u8,
}

impl ColorValue {
    /// Black (#000000)
    pub const BLACK: Self = Self::rgb(0, 0, 0);

    /// White (#ffffff)
    pub const WHITE: Self = Self::rgb(255, 255, 255);

    /// Light gray, used for the links bar.
    pub const LIGHT_GRAY: Self = Self::rgb(211, 211, 211);

    /// Opaque color from channels.
    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Parse `#rgb` or `#rrggbb`.
    #[must_use]
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        if !hex.is_ascii() {
            return None;
        }
        match hex.len() {
            3 => {
                let r = u8::from_str_radix(&hex[0..1].repeat(2), 16).ok()?;
                let g = u8::from_str_radix(&hex[1..2].repeat(2), 16).ok()?;
                let b = u8::from_str_radix(&hex[2..3].repeat(2), 16).ok()?;
                Some(Self::rgb(r, g, b))
            }
            6 => {
                let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
                let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
                let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
                Some(Self::rgb(r, g, b))
            }
            _ => None,
        }
    }

    /// Look up a color keyword.
    #[must_use]
    pub fn from_named(name: &str) -> Option<Self> {
        let color = match name.to_ascii_lowercase().as_str() {
            "black" => Self::BLACK,
            "white" => Self::WHITE,
            "red" => Self::rgb(255, 0, 0),
            "green" => Self::rgb(0, 128, 0),
            "blue" => Self::rgb(0, 0, 255),
            "yellow" => Self::rgb(255, 255, 0),
            "orange" => Self::rgb(255, 165, 0),
            "purple" => Self::rgb(128, 0, 128),
            "gray" | "grey" => Self::rgb(128, 128, 128),
            "lightgray" | "lightgrey" | "light gray" | "light grey" => Self::LIGHT_GRAY,
            "darkgray" | "darkgrey" | "dark gray" => Self::rgb(169, 169, 169),
            "lightblue" => Self::rgb(173, 216, 230),
            "lightgreen" => Self::rgb(144, 238, 144),
            _ => return None,
        };
        Some(color)
    }

    /// Resolve a `color`/`background-color` value for painting.
    ///
    /// Returns `None` when nothing should be painted: `transparent`, and the
    /// `rgba(...)`/`var(...)` forms this renderer does not evaluate. Anything
    /// else that is not a known color paints black.
    #[must_use]
    pub fn for_paint(value: &str) -> Option<Self> {
        let value = value.trim();
        if value.eq_ignore_ascii_case("transparent")
            || value.starts_with("rgba")
            || value.starts_with("var")
        {
            return None;
        }
        let parsed = if value.starts_with('#') {
            Self::from_hex(value)
        } else {
            Self::from_named(value)
        };
        Some(parsed.unwrap_or_else(|| {
            warn_once("Paint", &format!("unknown color '{value}', using black"));
            Self::BLACK
        }))
    }

    /// `#rrggbb` notation.
    #[must_use]
    pub fn to_hex_string(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}
