//! Tree configuration.
//!
//! [`TreeConfig`] is the snapshot of every tunable parameter. The settings
//! panel edits a copy and hands it to [`Scene::apply_config`](crate::Scene::apply_config),
//! which validates it before any particles are generated.
//!
//! # Example
//!
//! ```
//! use lumina_tree::{Rgb, TreeConfig};
//!
//! let config = TreeConfig::default()
//!     .with_particle_count(5_000)
//!     .with_tree_color(Rgb::from_hex("#ff3355").unwrap())
//!     .with_spiral_turns(6.0);
//!
//! assert!(config.validate().is_ok());
//! ```

use serde::{Deserialize, Serialize};

use crate::color::Rgb;
use crate::error::ConfigError;

/// Inclusive slider range for one numeric parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamRange {
    pub min: f32,
    pub max: f32,
    pub step: f32,
}

impl ParamRange {
    pub const fn new(min: f32, max: f32, step: f32) -> Self {
        Self { min, max, step }
    }

    pub fn clamp(&self, value: f32) -> f32 {
        value.clamp(self.min, self.max)
    }

    pub fn contains(&self, value: f32) -> bool {
        (self.min..=self.max).contains(&value)
    }

    /// Round `value` to the nearest step and clamp it into the range.
    ///
    /// Fractional steps divide by the whole number of steps per unit, so a
    /// value already on the grid (such as `0.15` with step `0.01`) comes back
    /// bit-for-bit unchanged.
    pub fn snap(&self, value: f32) -> f32 {
        let snapped = if self.step >= 1.0 {
            (value / self.step).round() * self.step
        } else {
            let per_unit = (1.0 / self.step).round();
            (value * per_unit).round() / per_unit
        };
        self.clamp(snapped)
    }
}

/// Hard cap on `particle_count`, well above the slider range.
///
/// At 28 bytes per tree vertex this stays under wgpu's default 256 MiB
/// `max_buffer_size`.
pub const MAX_PARTICLE_COUNT: u32 = 1_000_000;

pub const PARTICLE_COUNT_RANGE: ParamRange = ParamRange::new(500.0, 10_000.0, 100.0);
pub const PARTICLE_SIZE_RANGE: ParamRange = ParamRange::new(0.01, 0.5, 0.01);
pub const TREE_HEIGHT_RANGE: ParamRange = ParamRange::new(5.0, 20.0, 0.5);
pub const BASE_RADIUS_RANGE: ParamRange = ParamRange::new(1.0, 10.0, 0.5);
pub const SPIRAL_TURNS_RANGE: ParamRange = ParamRange::new(1.0, 10.0, 0.5);
pub const RANDOMNESS_RANGE: ParamRange = ParamRange::new(0.0, 2.0, 0.05);
pub const SPARKLE_SPEED_RANGE: ParamRange = ParamRange::new(0.0, 5.0, 0.1);
pub const BLOOM_INTENSITY_RANGE: ParamRange = ParamRange::new(0.0, 4.0, 0.1);

/// Every parameter that shapes the tree and its post-processing.
///
/// Serializes with camelCase keys and the color as a hex string:
///
/// ```json
/// { "particleCount": 3000, "treeColor": "#00ff88", "treeHeight": 12.0 }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TreeConfig {
    /// Number of particles in the tree.
    pub particle_count: u32,
    /// Point size in world-ish units; multiplied by 50 for the shader.
    pub particle_size: f32,
    /// Base color at the bottom of the tree.
    pub tree_color: Rgb,
    /// Total height, centered on the origin.
    pub tree_height: f32,
    /// Cone radius at the base.
    pub base_radius: f32,
    /// Number of full revolutions the spiral makes from base to apex.
    pub spiral_turns: f32,
    /// Chaos factor scaling the radius, angle and height jitter.
    pub randomness: f32,
    /// Multiplier on elapsed time for the sparkle oscillation.
    pub sparkle_speed: f32,
    /// Strength of the bloom glow.
    pub bloom_intensity: f32,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            particle_count: 3000,
            particle_size: 0.15,
            tree_color: Rgb::new(0.0, 1.0, 136.0 / 255.0),
            tree_height: 12.0,
            base_radius: 4.0,
            spiral_turns: 4.0,
            randomness: 0.5,
            sparkle_speed: 0.5,
            bloom_intensity: 1.5,
        }
    }
}

impl TreeConfig {
    pub fn with_particle_count(mut self, count: u32) -> Self {
        self.particle_count = count;
        self
    }

    pub fn with_particle_size(mut self, size: f32) -> Self {
        self.particle_size = size;
        self
    }

    pub fn with_tree_color(mut self, color: Rgb) -> Self {
        self.tree_color = color;
        self
    }

    pub fn with_tree_height(mut self, height: f32) -> Self {
        self.tree_height = height;
        self
    }

    pub fn with_base_radius(mut self, radius: f32) -> Self {
        self.base_radius = radius;
        self
    }

    pub fn with_spiral_turns(mut self, turns: f32) -> Self {
        self.spiral_turns = turns;
        self
    }

    pub fn with_randomness(mut self, randomness: f32) -> Self {
        self.randomness = randomness;
        self
    }

    pub fn with_sparkle_speed(mut self, speed: f32) -> Self {
        self.sparkle_speed = speed;
        self
    }

    pub fn with_bloom_intensity(mut self, intensity: f32) -> Self {
        self.bloom_intensity = intensity;
        self
    }

    /// Check the preconditions the generator relies on.
    ///
    /// Looser than the slider ranges: any finite, non-degenerate
    /// configuration up to [`MAX_PARTICLE_COUNT`] particles is accepted.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let floats = [
            ("particle size", self.particle_size),
            ("tree height", self.tree_height),
            ("base radius", self.base_radius),
            ("spiral turns", self.spiral_turns),
            ("randomness", self.randomness),
            ("sparkle speed", self.sparkle_speed),
            ("bloom intensity", self.bloom_intensity),
        ];
        for (field, value) in floats {
            if !value.is_finite() {
                return Err(ConfigError::NotFinite(field));
            }
        }

        let color = self.tree_color.to_array();
        if color.iter().any(|c| !c.is_finite() || !(0.0..=1.0).contains(c)) {
            return Err(ConfigError::InvalidColor(format!("{:?}", color)));
        }

        if self.tree_height <= 0.0 {
            return Err(ConfigError::NonPositiveHeight(self.tree_height));
        }
        if self.particle_count == 0 {
            return Err(ConfigError::EmptyField);
        }
        if self.particle_count > MAX_PARTICLE_COUNT {
            return Err(ConfigError::TooManyParticles {
                count: self.particle_count,
                max: MAX_PARTICLE_COUNT,
            });
        }

        for (field, value) in floats {
            if value < 0.0 {
                return Err(ConfigError::Negative { field, value });
            }
        }

        Ok(())
    }

    /// Snap every numeric field into its slider range.
    ///
    /// Non-finite values fall back to the default for that field.
    pub fn clamped(&self) -> Self {
        let defaults = Self::default();
        let fix = |value: f32, fallback: f32, range: ParamRange| {
            if value.is_finite() {
                range.clamp(value)
            } else {
                fallback
            }
        };

        Self {
            particle_count: self
                .particle_count
                .clamp(PARTICLE_COUNT_RANGE.min as u32, PARTICLE_COUNT_RANGE.max as u32),
            particle_size: fix(self.particle_size, defaults.particle_size, PARTICLE_SIZE_RANGE),
            tree_color: Rgb::new(
                clamp_unit(self.tree_color.r),
                clamp_unit(self.tree_color.g),
                clamp_unit(self.tree_color.b),
            ),
            tree_height: fix(self.tree_height, defaults.tree_height, TREE_HEIGHT_RANGE),
            base_radius: fix(self.base_radius, defaults.base_radius, BASE_RADIUS_RANGE),
            spiral_turns: fix(self.spiral_turns, defaults.spiral_turns, SPIRAL_TURNS_RANGE),
            randomness: fix(self.randomness, defaults.randomness, RANDOMNESS_RANGE),
            sparkle_speed: fix(self.sparkle_speed, defaults.sparkle_speed, SPARKLE_SPEED_RANGE),
            bloom_intensity: fix(
                self.bloom_intensity,
                defaults.bloom_intensity,
                BLOOM_INTENSITY_RANGE,
            ),
        }
    }

    /// Parse the camelCase JSON form. Missing keys take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

fn clamp_unit(v: f32) -> f32 {
    if v.is_finite() {
        v.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_documented_values() {
        let c = TreeConfig::default();
        assert_eq!(c.particle_count, 3000);
        assert_eq!(c.particle_size, 0.15);
        assert_eq!(c.tree_color.to_hex(), "#00ff88");
        assert_eq!(c.tree_height, 12.0);
        assert_eq!(c.base_radius, 4.0);
        assert_eq!(c.spiral_turns, 4.0);
        assert_eq!(c.randomness, 0.5);
        assert_eq!(c.sparkle_speed, 0.5);
        assert_eq!(c.bloom_intensity, 1.5);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_degenerate_height() {
        let zero = TreeConfig::default().with_tree_height(0.0);
        assert!(matches!(zero.validate(), Err(ConfigError::NonPositiveHeight(_))));

        let negative = TreeConfig::default().with_tree_height(-3.0);
        assert!(matches!(negative.validate(), Err(ConfigError::NonPositiveHeight(_))));
    }

    #[test]
    fn test_validate_rejects_empty_and_non_finite() {
        let empty = TreeConfig::default().with_particle_count(0);
        assert!(matches!(empty.validate(), Err(ConfigError::EmptyField)));

        let nan = TreeConfig::default().with_randomness(f32::NAN);
        assert!(matches!(nan.validate(), Err(ConfigError::NotFinite("randomness"))));

        let negative = TreeConfig::default().with_base_radius(-1.0);
        assert!(matches!(
            negative.validate(),
            Err(ConfigError::Negative { field: "base radius", .. })
        ));
    }

    #[test]
    fn test_validate_accepts_values_outside_slider_ranges() {
        // Tiny trees are unusual but well-defined.
        let config = TreeConfig::default()
            .with_particle_count(4)
            .with_tree_height(4.0)
            .with_base_radius(2.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_caps_particle_count() {
        let at_cap = TreeConfig::default().with_particle_count(MAX_PARTICLE_COUNT);
        assert!(at_cap.validate().is_ok());

        let over = TreeConfig::default().with_particle_count(MAX_PARTICLE_COUNT + 1);
        assert!(matches!(
            over.validate(),
            Err(ConfigError::TooManyParticles { count, max: MAX_PARTICLE_COUNT })
                if count == MAX_PARTICLE_COUNT + 1
        ));
    }

    #[test]
    fn test_json_rejects_huge_particle_count() {
        assert!(matches!(
            TreeConfig::from_json(r#"{ "particleCount": 4000000000 }"#),
            Err(ConfigError::TooManyParticles { count: 4_000_000_000, .. })
        ));
    }

    #[test]
    fn test_cap_fits_default_buffer_limit() {
        let bytes = MAX_PARTICLE_COUNT as u64 * std::mem::size_of::<crate::tree::TreeVertex>() as u64;
        assert!(bytes <= 256 << 20);
    }

    #[test]
    fn test_clamped_snaps_into_ranges() {
        let wild = TreeConfig {
            particle_count: 50,
            particle_size: 9.0,
            tree_color: Rgb::new(2.0, -1.0, 0.5),
            tree_height: 0.0,
            base_radius: f32::INFINITY,
            spiral_turns: 100.0,
            randomness: -0.5,
            sparkle_speed: 6.0,
            bloom_intensity: f32::NAN,
        };
        let c = wild.clamped();
        assert_eq!(c.particle_count, 500);
        assert_eq!(c.particle_size, 0.5);
        assert_eq!(c.tree_color, Rgb::new(1.0, 0.0, 0.5));
        assert_eq!(c.tree_height, 5.0);
        assert_eq!(c.base_radius, 4.0);
        assert_eq!(c.spiral_turns, 10.0);
        assert_eq!(c.randomness, 0.0);
        assert_eq!(c.sparkle_speed, 5.0);
        assert_eq!(c.bloom_intensity, 1.5);
        assert!(c.validate().is_ok());
        assert!(PARTICLE_SIZE_RANGE.contains(c.particle_size));
        assert!(!SPARKLE_SPEED_RANGE.contains(wild.sparkle_speed));
    }

    #[test]
    fn test_snap_keeps_defaults_exact() {
        let c = TreeConfig::default();
        assert_eq!(PARTICLE_SIZE_RANGE.snap(c.particle_size), c.particle_size);
        assert_eq!(TREE_HEIGHT_RANGE.snap(c.tree_height), c.tree_height);
        assert_eq!(BASE_RADIUS_RANGE.snap(c.base_radius), c.base_radius);
        assert_eq!(SPIRAL_TURNS_RANGE.snap(c.spiral_turns), c.spiral_turns);
        assert_eq!(RANDOMNESS_RANGE.snap(c.randomness), c.randomness);
        assert_eq!(SPARKLE_SPEED_RANGE.snap(c.sparkle_speed), c.sparkle_speed);
        assert_eq!(BLOOM_INTENSITY_RANGE.snap(c.bloom_intensity), c.bloom_intensity);
        assert_eq!(
            PARTICLE_COUNT_RANGE.snap(c.particle_count as f32),
            c.particle_count as f32
        );
    }

    #[test]
    fn test_snap_rounds_to_step_and_clamps() {
        assert_eq!(PARTICLE_SIZE_RANGE.snap(0.153), 0.15);
        assert_eq!(RANDOMNESS_RANGE.snap(0.62), 0.6);
        assert_eq!(TREE_HEIGHT_RANGE.snap(7.3), 7.5);
        assert_eq!(PARTICLE_COUNT_RANGE.snap(3049.0), 3000.0);
        assert_eq!(PARTICLE_COUNT_RANGE.snap(12_345.0), 10_000.0);
        assert_eq!(PARTICLE_SIZE_RANGE.snap(0.0), 0.01);
    }

    #[test]
    fn test_json_uses_camel_case_and_hex_color() {
        let json = TreeConfig::default().to_json().unwrap();
        assert!(json.contains("\"particleCount\": 3000"));
        assert!(json.contains("\"treeColor\": \"#00ff88\""));
        assert!(json.contains("\"bloomIntensity\""));

        let back = TreeConfig::from_json(&json).unwrap();
        assert_eq!(back, TreeConfig::default());
    }

    #[test]
    fn test_json_partial_object_fills_defaults() {
        let c = TreeConfig::from_json(r##"{ "treeColor": "#ffffff", "spiralTurns": 1 }"##).unwrap();
        assert_eq!(c.tree_color, Rgb::WHITE);
        assert_eq!(c.spiral_turns, 1.0);
        assert_eq!(c.particle_count, 3000);
    }

    #[test]
    fn test_json_rejects_bad_color_and_height() {
        assert!(matches!(
            TreeConfig::from_json(r#"{ "treeColor": "teal" }"#),
            Err(ConfigError::Json(_))
        ));
        assert!(matches!(
            TreeConfig::from_json(r#"{ "treeHeight": 0 }"#),
            Err(ConfigError::NonPositiveHeight(_))
        ));
    }
}
