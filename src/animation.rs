//! Per-frame animation of the tree.
//!
//! [`tick`] produces the two values the renderer needs each frame: the
//! time-scaled sparkle driver and the accumulated tree rotation. The sparkle
//! and point-footprint helpers mirror the WGSL in `shaders/tree.wgsl` so the
//! visual contract can be checked on the CPU.

use std::f32::consts::TAU;

use crate::config::TreeConfig;

/// Rotation added to the tree every frame, in radians.
///
/// Applied per frame rather than per second, so the spin speed follows the
/// display refresh rate.
pub const TREE_ROTATION_STEP: f32 = 0.002;

/// Period of the shared sparkle oscillation `sin(sparkle_phase × 3)`.
pub const SPARKLE_PERIOD: f64 = std::f64::consts::TAU / 3.0;

/// Multiplier from `particle_size` to the shader's base point size.
pub const POINT_SIZE_SCALE: f32 = 50.0;

/// Perspective constant for point-size attenuation.
pub const SIZE_ATTENUATION: f32 = 20.0;

/// Animation values for one rendered frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameState {
    /// `elapsed × sparkle_speed`; drives every particle's twinkle.
    pub sparkle_phase: f64,
    /// Accumulated rotation of the tree around the Y axis, kept in `[0, 2π)`.
    pub rotation: f32,
}

/// Advance the animation by one frame.
pub fn tick(elapsed: f64, config: &TreeConfig, prior_rotation: f32) -> FrameState {
    FrameState {
        sparkle_phase: elapsed * config.sparkle_speed as f64,
        rotation: wrap_angle(prior_rotation + TREE_ROTATION_STEP),
    }
}

/// Sparkle driver for the shader, reduced modulo [`SPARKLE_PERIOD`].
///
/// Gives the same `sin(x × 3)` as the unreduced phase while keeping full
/// `f32` precision however long the viewer runs.
pub fn sparkle_driver(sparkle_phase: f64) -> f32 {
    sparkle_phase.rem_euclid(SPARKLE_PERIOD) as f32
}

/// Reduce an angle to `[0, 2π)`.
#[inline]
pub fn wrap_angle(angle: f32) -> f32 {
    let wrapped = angle.rem_euclid(TAU);
    // rem_euclid can round up to exactly TAU for tiny negative inputs.
    if wrapped >= TAU {
        0.0
    } else {
        wrapped
    }
}

/// Hermite interpolation between `edge0` and `edge1`, as in WGSL.
#[inline]
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Opacity of a particle with sparkle `phase` at the given sparkle driver.
///
/// Always in `[0.5, 1.0]`.
#[inline]
pub fn sparkle_alpha(sparkle_phase: f32, phase: f32) -> f32 {
    let raw = (sparkle_phase * 3.0 + phase * 10.0).sin();
    0.5 + 0.5 * smoothstep(0.4, 1.0, raw)
}

/// Point size passed to the shader as a uniform.
#[inline]
pub fn base_point_size(particle_size: f32) -> f32 {
    particle_size * POINT_SIZE_SCALE
}

/// On-screen point size in pixels for a point at view-space depth `view_z`.
///
/// `view_z` is negative in front of the camera.
#[inline]
pub fn attenuated_point_size(base_size: f32, view_z: f32) -> f32 {
    base_size * SIZE_ATTENUATION / -view_z
}

/// Alpha multiplier for a fragment `distance` away from the point center.
///
/// Distances are in point space, where the sprite spans `[-0.5, 0.5]`.
/// Returns `None` outside the disc.
#[inline]
pub fn disc_alpha(distance: f32) -> Option<f32> {
    if distance > 0.5 {
        None
    } else {
        Some((1.0 - distance * 2.0).powf(1.5))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_scales_time_and_steps_rotation() {
        let config = TreeConfig::default().with_sparkle_speed(2.0);
        let frame = tick(3.0, &config, 1.0);
        assert_eq!(frame.sparkle_phase, 6.0);
        assert_eq!(frame.rotation, 1.0 + TREE_ROTATION_STEP);
    }

    #[test]
    fn test_rotation_is_independent_of_elapsed_time() {
        let config = TreeConfig::default();
        let a = tick(0.016, &config, 0.5);
        let b = tick(100.0, &config, 0.5);
        assert_eq!(a.rotation, b.rotation);
    }

    #[test]
    fn test_rotation_wraps_after_full_turn() {
        let config = TreeConfig::default();
        let frame = tick(0.0, &config, TAU - TREE_ROTATION_STEP / 2.0);
        assert!(frame.rotation >= 0.0 && frame.rotation < TAU);
        assert!((frame.rotation - TREE_ROTATION_STEP / 2.0).abs() < 1e-5);
    }

    #[test]
    fn test_rotation_stays_precise_over_long_runs() {
        let config = TreeConfig::default();
        let mut rotation = 0.0;
        // About 14 hours at 60 fps.
        for _ in 0..3_000_000 {
            rotation = tick(0.0, &config, rotation).rotation;
        }
        assert!((0.0..TAU).contains(&rotation));
        let next = tick(0.0, &config, rotation).rotation;
        let step = wrap_angle(next - rotation);
        assert!((step - TREE_ROTATION_STEP).abs() < 1e-5, "step {step}");
    }

    #[test]
    fn test_sparkle_driver_matches_unreduced_phase() {
        let config = TreeConfig::default().with_sparkle_speed(1.3);
        // Ten days of elapsed time.
        let elapsed = 864_000.123_f64;
        let phase = tick(elapsed, &config, 0.0).sparkle_phase;
        let driver = sparkle_driver(phase);

        assert!((0.0..SPARKLE_PERIOD as f32 + 1e-6).contains(&driver));
        let exact = (phase * 3.0).sin();
        assert!((exact as f32 - (driver * 3.0).sin()).abs() < 1e-3);
    }

    #[test]
    fn test_sparkle_driver_is_identity_within_one_period() {
        assert_eq!(sparkle_driver(0.0), 0.0);
        assert_eq!(sparkle_driver(1.5), 1.5);
        assert!((sparkle_driver(3.0) - (3.0 - SPARKLE_PERIOD) as f32).abs() < 1e-6);
    }

    #[test]
    fn test_zero_sparkle_speed_freezes_twinkle() {
        let config = TreeConfig::default().with_sparkle_speed(0.0);
        assert_eq!(tick(42.0, &config, 0.0).sparkle_phase, 0.0);
    }

    #[test]
    fn test_smoothstep_edges() {
        assert_eq!(smoothstep(0.4, 1.0, 0.0), 0.0);
        assert_eq!(smoothstep(0.4, 1.0, 0.4), 0.0);
        assert_eq!(smoothstep(0.4, 1.0, 1.0), 1.0);
        assert!((smoothstep(0.4, 1.0, 0.7) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_sparkle_alpha_bounds() {
        for step in 0..200 {
            let t = step as f32 * 0.05;
            for phase in [0.0, 0.13, 0.5, 0.99] {
                let a = sparkle_alpha(t, phase);
                assert!((0.5..=1.0).contains(&a), "alpha {a} out of range");
            }
        }
    }

    #[test]
    fn test_sparkle_alpha_peaks_at_sine_crest() {
        // sin(pi/2) = 1 -> full sparkle.
        let phase = std::f32::consts::FRAC_PI_2 / 10.0;
        assert!((sparkle_alpha(0.0, phase) - 1.0).abs() < 1e-5);
        // sin(0) = 0 is below the 0.4 threshold -> resting alpha.
        assert_eq!(sparkle_alpha(0.0, 0.0), 0.5);
    }

    #[test]
    fn test_point_size_and_attenuation() {
        assert!((base_point_size(0.15) - 7.5).abs() < 1e-6);
        assert_eq!(attenuated_point_size(7.5, -20.0), 7.5);
        assert_eq!(attenuated_point_size(10.0, -10.0), 20.0);
    }

    #[test]
    fn test_disc_footprint() {
        assert_eq!(disc_alpha(0.0), Some(1.0));
        assert_eq!(disc_alpha(0.5), Some(0.0));
        assert_eq!(disc_alpha(0.51), None);
        let mid = disc_alpha(0.25).unwrap();
        assert!((mid - 0.5f32.powf(1.5)).abs() < 1e-6);
    }
}
