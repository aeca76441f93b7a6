//! Error types for LuminaTree.
//!
//! Configuration errors are raised at the boundary before a tree is generated.
//! GPU and viewer errors cover window, surface and device setup.

use thiserror::Error;

/// A tree configuration that cannot be turned into a particle field.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The color string is not `#rrggbb` or `#rgb`.
    #[error("invalid color {0:?}: expected #rrggbb or #rgb")]
    InvalidColor(String),
    /// A numeric field is NaN or infinite.
    #[error("{0} must be a finite number")]
    NotFinite(&'static str),
    /// The tree height is zero or negative.
    #[error("tree height must be greater than zero, got {0}")]
    NonPositiveHeight(f32),
    /// The particle count is zero.
    #[error("particle count must be greater than zero")]
    EmptyField,
    /// More particles than a single vertex buffer is allowed to hold.
    #[error("particle count {count} exceeds the limit of {max}")]
    TooManyParticles { count: u32, max: u32 },
    /// Snow positions and speeds were given with different lengths.
    #[error("snow field has {positions} positions but {speeds} speeds")]
    SnowMismatch { positions: usize, speeds: usize },
    /// A field that only makes sense as a magnitude is negative.
    #[error("{field} must not be negative, got {value}")]
    Negative { field: &'static str, value: f32 },
    /// The JSON form of the configuration could not be read or written.
    #[error("invalid configuration JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors that can occur during GPU initialization.
#[derive(Debug, Error)]
pub enum GpuError {
    /// Failed to create a surface for rendering.
    #[error("failed to create GPU surface: {0}")]
    SurfaceCreation(#[from] wgpu::CreateSurfaceError),
    /// No compatible GPU adapter found.
    #[error("no compatible GPU adapter found; a GPU with Vulkan/Metal/DX12/WebGPU support is required")]
    NoAdapter,
    /// Failed to create GPU device.
    #[error("failed to create GPU device: {0}")]
    DeviceCreation(#[from] wgpu::RequestDeviceError),
    /// The surface reports no usable texture format.
    #[error("surface is not supported by the selected adapter")]
    UnsupportedSurface,
}

/// Errors that can occur when running the viewer.
#[derive(Debug, Error)]
pub enum ViewerError {
    /// Failed to create or run the event loop.
    #[error("event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
    /// Failed to create the window.
    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),
    /// GPU initialization failed.
    #[error("GPU error: {0}")]
    Gpu(#[from] GpuError),
    /// The starting configuration was rejected.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}
