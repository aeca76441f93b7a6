//! Orbit camera with damping and auto-rotation.

use std::f32::consts::{PI, TAU};

use glam::{Mat4, Vec3};

/// Keeps the polar angle off the poles so `look_at` stays well-defined.
const POLE_EPSILON: f32 = 1e-6;

/// Orbit camera circling the origin.
///
/// Input is accumulated as pending rotation and drained by
/// [`update`](Self::update) once per frame, so drags keep gliding after the
/// mouse is released.
#[derive(Debug, Clone)]
pub struct OrbitCamera {
    /// Angle around the Y axis in radians. Zero looks down -Z from +Z.
    pub azimuth: f32,
    /// Angle from the +Y axis in radians.
    pub polar: f32,
    pub distance: f32,
    pub target: Vec3,

    pub fov_y: f32,
    pub near: f32,
    pub far: f32,

    pub min_distance: f32,
    pub max_distance: f32,
    pub min_polar: f32,
    pub max_polar: f32,
    /// Fraction of the pending rotation applied each frame.
    pub damping: f32,
    pub auto_rotate: bool,
    /// Auto-rotation speed; 1.0 is one revolution per minute at 60 fps.
    pub auto_rotate_speed: f32,

    pending_azimuth: f32,
    pending_polar: f32,
    pending_scale: f32,
}

impl OrbitCamera {
    pub fn new() -> Self {
        Self {
            azimuth: 0.0,
            polar: PI / 2.0,
            distance: 20.0,
            target: Vec3::ZERO,
            fov_y: 60f32.to_radians(),
            near: 0.1,
            far: 1000.0,
            min_distance: 5.0,
            max_distance: 40.0,
            min_polar: 0.0,
            max_polar: PI / 1.5,
            damping: 0.05,
            auto_rotate: true,
            auto_rotate_speed: 0.5,
            pending_azimuth: 0.0,
            pending_polar: 0.0,
            pending_scale: 1.0,
        }
    }

    pub fn position(&self) -> Vec3 {
        let sin_polar = self.polar.sin();
        self.target
            + Vec3::new(
                self.distance * sin_polar * self.azimuth.sin(),
                self.distance * self.polar.cos(),
                self.distance * sin_polar * self.azimuth.cos(),
            )
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position(), self.target, Vec3::Y)
    }

    pub fn projection(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, aspect, self.near, self.far)
    }

    /// Queue a drag of `dx`, `dy` pixels in a viewport `viewport_height` tall.
    ///
    /// A drag across the full viewport height turns the camera once around.
    pub fn drag(&mut self, dx: f32, dy: f32, viewport_height: f32) {
        let height = viewport_height.max(1.0);
        self.pending_azimuth -= TAU * dx / height;
        self.pending_polar -= TAU * dy / height;
    }

    /// Zoom by `notches` scroll steps. Positive moves closer.
    pub fn scroll(&mut self, notches: f32) {
        self.pending_scale *= 0.95f32.powf(notches);
    }

    /// Apply pending input, auto-rotation and limits. Call once per frame.
    pub fn update(&mut self) {
        if self.auto_rotate {
            self.pending_azimuth -= TAU / 60.0 / 60.0 * self.auto_rotate_speed;
        }

        self.azimuth += self.pending_azimuth * self.damping;
        self.polar += self.pending_polar * self.damping;
        self.polar = self
            .polar
            .clamp(self.min_polar, self.max_polar)
            .clamp(POLE_EPSILON, PI - POLE_EPSILON);

        self.distance = (self.distance * self.pending_scale).clamp(self.min_distance, self.max_distance);

        self.pending_azimuth *= 1.0 - self.damping;
        self.pending_polar *= 1.0 - self.damping;
        self.pending_scale = 1.0;
    }

    /// Return to the starting view, keeping limits and settings.
    pub fn reset_view(&mut self) {
        let fresh = Self::new();
        self.azimuth = fresh.azimuth;
        self.polar = fresh.polar;
        self.distance = fresh.distance;
        self.target = fresh.target;
        self.pending_azimuth = 0.0;
        self.pending_polar = 0.0;
        self.pending_scale = 1.0;
    }
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self::new()
    }
}
