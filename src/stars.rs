//! Background starfield.
//!
//! A thin shell of points far behind the tree. Stars are generated once; the
//! shader pulses their size over time and fades the edge of each sprite.

use std::f32::consts::TAU;

use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use rand::Rng;

use crate::color::Rgb;

/// Shape and look of the starfield.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StarSettings {
    /// Inner radius of the shell.
    pub radius: f32,
    /// Thickness of the shell.
    pub depth: f32,
    pub count: usize,
    /// Size multiplier applied to every star.
    pub factor: f32,
    /// HSL saturation. Zero gives grey stars.
    pub saturation: f32,
    /// Soften sprite edges.
    pub fade: bool,
    /// Speed of the size pulse.
    pub speed: f32,
}

impl Default for StarSettings {
    fn default() -> Self {
        Self {
            radius: 100.0,
            depth: 50.0,
            count: 5000,
            factor: 4.0,
            saturation: 0.0,
            fade: true,
            speed: 1.0,
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct StarVertex {
    pub position: [f32; 3],
    pub color: [f32; 3],
    pub size: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Starfield {
    pub settings: StarSettings,
    pub stars: Vec<StarVertex>,
}

impl Starfield {
    pub fn new<R: Rng + ?Sized>(settings: StarSettings, rng: &mut R) -> Self {
        let mut stars = Vec::with_capacity(settings.count);
        let mut r = settings.radius + settings.depth;
        let shrink = settings.depth / settings.count.max(1) as f32;

        for i in 0..settings.count {
            r -= shrink * rng.gen::<f32>();
            let direction = random_direction(rng);
            let color = Rgb::from_hsl(i as f32 / settings.count as f32, settings.saturation, 0.9);
            let size = (0.5 + 0.5 * rng.gen::<f32>()) * settings.factor;

            stars.push(StarVertex {
                position: (direction * r).to_array(),
                color: color.to_array(),
                size,
            });
        }

        Self { settings, stars }
    }

    pub fn len(&self) -> usize {
        self.stars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stars.is_empty()
    }
}

/// Uniformly distributed unit vector.
fn random_direction<R: Rng + ?Sized>(rng: &mut R) -> Vec3 {
    let phi = (1.0 - 2.0 * rng.gen::<f32>()).acos();
    let theta = TAU * rng.gen::<f32>();
    Vec3::new(
        phi.sin() * theta.sin(),
        phi.cos(),
        phi.sin() * theta.cos(),
    )
}

/// Size pulse multiplier at `time`.
#[inline]
pub fn pulse(time: f32, speed: f32) -> f32 {
    3.0 + (time * speed + 100.0).sin()
}

/// Opacity of a faded star sprite at `distance` from its center.
#[inline]
pub fn fade_alpha(distance: f32) -> f32 {
    1.0 / (1.0 + (16.0 * (distance - 0.25)).exp())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn field() -> Starfield {
        Starfield::new(StarSettings::default(), &mut StdRng::seed_from_u64(5))
    }

    #[test]
    fn test_stars_sit_inside_shell() {
        let stars = field();
        assert_eq!(stars.len(), 5000);
        for star in &stars.stars {
            let d = Vec3::from(star.position).length();
            assert!((99.9..=150.01).contains(&d), "star at distance {d}");
        }
    }

    #[test]
    fn test_grey_colors_and_sizes() {
        let stars = field();
        for star in &stars.stars {
            assert!(star.color.iter().all(|&c| (c - 0.9).abs() < 1e-6));
            assert!((2.0..=4.0).contains(&star.size));
        }
    }

    #[test]
    fn test_pulse_range() {
        for i in 0..100 {
            let p = pulse(i as f32 * 0.37, 1.0);
            assert!((2.0..=4.0).contains(&p));
        }
    }

    #[test]
    fn test_fade_is_half_at_quarter_radius() {
        assert!((fade_alpha(0.25) - 0.5).abs() < 1e-6);
        assert!(fade_alpha(0.0) > 0.98);
        assert!(fade_alpha(0.5) < 0.02);
    }

    #[test]
    fn test_zero_count() {
        let settings = StarSettings {
            count: 0,
            ..StarSettings::default()
        };
        assert!(Starfield::new(settings, &mut StdRng::seed_from_u64(1)).is_empty());
    }
}
