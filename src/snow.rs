//! Falling snow.
//!
//! A fixed set of flakes scattered through a cube around the tree. Each flake
//! falls at its own constant speed and wraps back to the top once it drops
//! below the floor.

use glam::Vec3;
use rand::Rng;

use crate::animation::wrap_angle;
use crate::error::ConfigError;

/// Number of flakes in the default snow field.
pub const SNOW_COUNT: usize = 1000;

/// Side length of the cube the flakes start in.
pub const SNOW_EXTENT: f32 = 50.0;

/// Flakes below this height wrap to [`SNOW_CEILING`].
pub const SNOW_FLOOR: f32 = -20.0;
pub const SNOW_CEILING: f32 = 20.0;

/// Rotation added to the whole field every frame, in radians.
pub const SNOW_ROTATION_STEP: f32 = 0.0005;

const MIN_SPEED: f32 = 0.02;
const SPEED_SPREAD: f32 = 0.05;

/// Snow flakes and their fall speeds.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SnowField {
    pub positions: Vec<Vec3>,
    /// Units per tick, in `[0.02, 0.07)`. Never changes after creation.
    pub speeds: Vec<f32>,
    /// Rotation of the whole field around the Y axis, in `[0, 2π)`.
    pub rotation: f32,
}

impl SnowField {
    pub fn new<R: Rng + ?Sized>(count: usize, rng: &mut R) -> Self {
        let mut positions = Vec::with_capacity(count);
        let mut speeds = Vec::with_capacity(count);

        for _ in 0..count {
            positions.push(Vec3::new(
                (rng.gen::<f32>() - 0.5) * SNOW_EXTENT,
                (rng.gen::<f32>() - 0.5) * SNOW_EXTENT,
                (rng.gen::<f32>() - 0.5) * SNOW_EXTENT,
            ));
            speeds.push(rng.gen::<f32>() * SPEED_SPREAD + MIN_SPEED);
        }

        Self {
            positions,
            speeds,
            rotation: 0.0,
        }
    }

    /// Build a field from explicit flakes, one speed per position.
    pub fn from_parts(positions: Vec<Vec3>, speeds: Vec<f32>) -> Result<Self, ConfigError> {
        if positions.len() != speeds.len() {
            return Err(ConfigError::SnowMismatch {
                positions: positions.len(),
                speeds: speeds.len(),
            });
        }
        Ok(Self {
            positions,
            speeds,
            rotation: 0.0,
        })
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Move every flake down by its speed and spin the field.
    pub fn tick(&mut self) {
        for (pos, &speed) in self.positions.iter_mut().zip(&self.speeds) {
            pos.y -= speed;
            if pos.y < SNOW_FLOOR {
                pos.y = SNOW_CEILING;
            }
        }
        self.rotation = wrap_angle(self.rotation + SNOW_ROTATION_STEP);
    }

    /// Positions as a flat `[x0, y0, z0, ...]` slice.
    pub fn position_buffer(&self) -> &[f32] {
        bytemuck::cast_slice(&self.positions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_spawn_bounds() {
        let mut rng = StdRng::seed_from_u64(11);
        let snow = SnowField::new(SNOW_COUNT, &mut rng);

        assert_eq!(snow.len(), SNOW_COUNT);
        assert_eq!(snow.speeds.len(), SNOW_COUNT);
        let half = SNOW_EXTENT / 2.0;
        for p in &snow.positions {
            assert!(p.abs().max_element() <= half);
        }
        assert!(snow.speeds.iter().all(|s| (0.02..0.07).contains(s)));
    }

    #[test]
    fn test_flake_wraps_to_ceiling() {
        let mut snow = SnowField::from_parts(vec![Vec3::new(3.0, -20.005, -1.0)], vec![0.02]).unwrap();
        snow.tick();
        assert_eq!(snow.positions[0], Vec3::new(3.0, 20.0, -1.0));
    }

    #[test]
    fn test_flake_falls_by_its_speed() {
        let mut snow = SnowField::from_parts(vec![Vec3::ZERO], vec![0.02]).unwrap();
        snow.tick();
        assert_eq!(snow.positions[0].y, -0.02);
    }

    #[test]
    fn test_flake_exactly_on_floor_does_not_wrap() {
        let mut snow = SnowField::from_parts(vec![Vec3::new(0.0, -19.5, 0.0)], vec![0.5]).unwrap();
        snow.tick();
        assert_eq!(snow.positions[0].y, -20.0);
    }

    #[test]
    fn test_rotation_steps_each_tick() {
        let mut snow = SnowField::from_parts(Vec::new(), Vec::new()).unwrap();
        for _ in 0..4 {
            snow.tick();
        }
        assert!((snow.rotation - 4.0 * SNOW_ROTATION_STEP).abs() < 1e-7);
    }

    #[test]
    fn test_speeds_survive_ticks() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut snow = SnowField::new(64, &mut rng);
        let before = snow.speeds.clone();
        for _ in 0..5000 {
            snow.tick();
        }
        assert_eq!(snow.speeds, before);
        // 5000 ticks at >= 0.02 per tick is enough for every flake to wrap.
        assert!(snow
            .positions
            .iter()
            .all(|p| (SNOW_FLOOR..=SNOW_CEILING).contains(&p.y)));
    }

    #[test]
    fn test_from_parts_rejects_mismatched_lengths() {
        let result = SnowField::from_parts(vec![Vec3::ZERO, Vec3::ONE], vec![0.02]);
        assert!(matches!(
            result,
            Err(ConfigError::SnowMismatch { positions: 2, speeds: 1 })
        ));
    }
}
