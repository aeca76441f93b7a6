//! RGB colors for particles.
//!
//! Components are stored as `f32` in `[0, 1]` in the same space as the
//! `#rrggbb` strings they are parsed from. Shaders convert to linear light
//! before writing to the HDR scene target.

use std::fmt;
use std::str::FromStr;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// An RGB color with components in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb::new(1.0, 1.0, 1.0);
    pub const BLACK: Rgb = Rgb::new(0.0, 0.0, 0.0);

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Parse a `#rrggbb` or `#rgb` hex string. The leading `#` is optional.
    pub fn from_hex(hex: &str) -> Result<Self, ConfigError> {
        let digits = hex.trim().trim_start_matches('#');
        let invalid = || ConfigError::InvalidColor(hex.to_string());

        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }

        let bytes = match digits.len() {
            6 => {
                let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16);
                [
                    channel(0).map_err(|_| invalid())?,
                    channel(2).map_err(|_| invalid())?,
                    channel(4).map_err(|_| invalid())?,
                ]
            }
            // Shorthand: each digit is doubled (#0f8 -> #00ff88).
            3 => {
                let channel = |i: usize| u8::from_str_radix(&digits[i..i + 1], 16).map(|v| v * 17);
                [
                    channel(0).map_err(|_| invalid())?,
                    channel(1).map_err(|_| invalid())?,
                    channel(2).map_err(|_| invalid())?,
                ]
            }
            _ => return Err(invalid()),
        };

        Ok(Self::from_srgb8(bytes))
    }

    /// Format as a lowercase `#rrggbb` string.
    pub fn to_hex(&self) -> String {
        let [r, g, b] = self.to_srgb8();
        format!("#{:02x}{:02x}{:02x}", r, g, b)
    }

    pub fn from_srgb8(bytes: [u8; 3]) -> Self {
        Self::new(
            bytes[0] as f32 / 255.0,
            bytes[1] as f32 / 255.0,
            bytes[2] as f32 / 255.0,
        )
    }

    pub fn to_srgb8(&self) -> [u8; 3] {
        let quantize = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        [quantize(self.r), quantize(self.g), quantize(self.b)]
    }

    /// Color from hue, saturation and lightness, all in `[0, 1]`.
    pub fn from_hsl(h: f32, s: f32, l: f32) -> Self {
        let h = h.rem_euclid(1.0);
        let s = s.clamp(0.0, 1.0);
        let l = l.clamp(0.0, 1.0);

        if s == 0.0 {
            return Self::new(l, l, l);
        }

        let q = if l <= 0.5 { l * (1.0 + s) } else { l + s - l * s };
        let p = 2.0 * l - q;

        Self::new(
            hue_to_channel(p, q, h + 1.0 / 3.0),
            hue_to_channel(p, q, h),
            hue_to_channel(p, q, h - 1.0 / 3.0),
        )
    }

    /// Linear interpolation toward `other`; `t = 0` returns `self` unchanged.
    pub fn lerp(self, other: Rgb, t: f32) -> Rgb {
        Rgb::from(Vec3::from(self).lerp(Vec3::from(other), t))
    }

    pub fn to_array(self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }

    /// Decode the sRGB transfer curve, giving linear-light components.
    pub fn to_linear(self) -> Rgb {
        let decode = |c: f32| {
            if c <= 0.04045 {
                c / 12.92
            } else {
                ((c + 0.055) / 1.055).powf(2.4)
            }
        };
        Rgb::new(decode(self.r), decode(self.g), decode(self.b))
    }
}

fn hue_to_channel(p: f32, q: f32, t: f32) -> f32 {
    let t = t.rem_euclid(1.0);
    if t < 1.0 / 6.0 {
        p + (q - p) * 6.0 * t
    } else if t < 0.5 {
        q
    } else if t < 2.0 / 3.0 {
        p + (q - p) * 6.0 * (2.0 / 3.0 - t)
    } else {
        p
    }
}

impl From<Rgb> for Vec3 {
    fn from(c: Rgb) -> Self {
        Vec3::new(c.r, c.g, c.b)
    }
}

impl From<Vec3> for Rgb {
    fn from(v: Vec3) -> Self {
        Rgb::new(v.x, v.y, v.z)
    }
}

impl FromStr for Rgb {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Rgb::from_hex(s)
    }
}

impl TryFrom<String> for Rgb {
    type Error = ConfigError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Rgb::from_hex(&s)
    }
}

impl From<Rgb> for String {
    fn from(c: Rgb) -> Self {
        c.to_hex()
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_default_tree_color() {
        let c = Rgb::from_hex("#00ff88").unwrap();
        assert_eq!(c.r, 0.0);
        assert_eq!(c.g, 1.0);
        assert!((c.b - 136.0 / 255.0).abs() < 1e-6);
    }

    #[test]
    fn test_parse_shorthand_and_missing_hash() {
        assert_eq!(Rgb::from_hex("0f8").unwrap(), Rgb::from_hex("#00ff88").unwrap());
        assert_eq!(Rgb::from_hex("FFFFFF").unwrap(), Rgb::WHITE);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for bad in ["", "#12345", "#gg0000", "#00ff88ff", "green", "#+1+1+1"] {
            assert!(
                matches!(Rgb::from_hex(bad), Err(ConfigError::InvalidColor(_))),
                "{bad:?} should not parse"
            );
        }
    }

    #[test]
    fn test_hex_formatting() {
        assert_eq!(Rgb::new(0.0, 1.0, 136.0 / 255.0).to_hex(), "#00ff88");
        assert_eq!(Rgb::WHITE.to_string(), "#ffffff");
    }

    #[test]
    fn test_lerp_endpoints() {
        let base = Rgb::from_hex("#00ff88").unwrap();
        assert_eq!(base.lerp(Rgb::WHITE, 0.0), base);
        let half = base.lerp(Rgb::WHITE, 0.5);
        assert!((half.r - 0.5).abs() < 1e-6);
        assert!((half.g - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_to_linear() {
        assert_eq!(Rgb::WHITE.to_linear(), Rgb::WHITE);
        assert_eq!(Rgb::BLACK.to_linear(), Rgb::BLACK);
        let bg = Rgb::from_hex("#050505").unwrap().to_linear();
        assert!((bg.r - 0.001518).abs() < 1e-5);
        let mid = Rgb::new(0.5, 0.5, 0.5).to_linear();
        assert!((mid.g - 0.214).abs() < 1e-3);
    }

    #[test]
    fn test_hsl_greys_and_primaries() {
        assert_eq!(Rgb::from_hsl(0.3, 0.0, 0.9), Rgb::new(0.9, 0.9, 0.9));

        let red = Rgb::from_hsl(0.0, 1.0, 0.5);
        assert!((red.r - 1.0).abs() < 1e-6 && red.g.abs() < 1e-6 && red.b.abs() < 1e-6);

        let green = Rgb::from_hsl(1.0 / 3.0, 1.0, 0.5);
        assert!(green.r.abs() < 1e-5 && (green.g - 1.0).abs() < 1e-5);
    }
}
