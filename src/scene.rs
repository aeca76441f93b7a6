//! CPU-side scene state.
//!
//! [`Scene`] owns everything the renderer draws: the tree's particle field,
//! the snow and the starfield, plus the animation state that moves them. It
//! never touches the GPU, so every behavior here is testable headless.
//!
//! ```
//! use lumina_tree::{Scene, TreeConfig};
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! let mut rng = StdRng::seed_from_u64(1);
//! let mut scene = Scene::new(TreeConfig::default(), &mut rng).unwrap();
//!
//! let taller = TreeConfig::default().with_tree_height(18.0);
//! assert!(scene.apply_config(taller, &mut rng).unwrap());
//! assert_eq!(scene.generation(), 1);
//!
//! scene.advance(0.5);
//! assert_eq!(scene.frame().sparkle_phase, 0.25);
//! ```

use log::debug;
use rand::Rng;

use crate::animation::{self, FrameState};
use crate::config::TreeConfig;
use crate::error::ConfigError;
use crate::snow::{SnowField, SNOW_COUNT};
use crate::stars::{StarSettings, Starfield};
use crate::tree::{self, ParticleField};

#[derive(Debug, Clone)]
pub struct Scene {
    config: TreeConfig,
    field: ParticleField,
    snow: SnowField,
    stars: Starfield,
    frame: FrameState,
    elapsed: f64,
    generation: u64,
}

impl Scene {
    /// Validate `config` and build the tree, snow and stars from `rng`.
    pub fn new<R: Rng + ?Sized>(config: TreeConfig, rng: &mut R) -> Result<Self, ConfigError> {
        Self::with_stars(config, StarSettings::default(), rng)
    }

    pub fn with_stars<R: Rng + ?Sized>(
        config: TreeConfig,
        stars: StarSettings,
        rng: &mut R,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let field = tree::generate(&config, rng);
        let snow = SnowField::new(SNOW_COUNT, rng);
        let stars = Starfield::new(stars, rng);
        debug!(
            "Scene built: {} tree particles, {} flakes, {} stars",
            field.len(),
            snow.len(),
            stars.len()
        );

        Ok(Self {
            config,
            field,
            snow,
            stars,
            frame: FrameState::default(),
            elapsed: 0.0,
            generation: 0,
        })
    }

    /// Swap in a new configuration.
    ///
    /// Returns `Ok(false)` and leaves the scene untouched when `config` equals
    /// the current one. Otherwise the whole particle field is regenerated with
    /// fresh randomness and the generation counter advances. An invalid
    /// config leaves the previous field in place.
    pub fn apply_config<R: Rng + ?Sized>(
        &mut self,
        config: TreeConfig,
        rng: &mut R,
    ) -> Result<bool, ConfigError> {
        if config == self.config {
            return Ok(false);
        }
        config.validate()?;

        self.field = tree::generate(&config, rng);
        self.config = config;
        self.generation += 1;
        debug!(
            "Regenerated tree (generation {}, {} particles)",
            self.generation,
            self.field.len()
        );
        Ok(true)
    }

    /// Advance one frame: animate the tree and move the snow.
    ///
    /// `elapsed` is seconds since the viewer started, kept in `f64` so long
    /// sessions do not lose sparkle precision.
    pub fn advance(&mut self, elapsed: f64) {
        self.elapsed = elapsed;
        self.frame = animation::tick(elapsed, &self.config, self.frame.rotation);
        self.snow.tick();
    }

    pub fn config(&self) -> &TreeConfig {
        &self.config
    }

    pub fn field(&self) -> &ParticleField {
        &self.field
    }

    pub fn snow(&self) -> &SnowField {
        &self.snow
    }

    pub fn stars(&self) -> &Starfield {
        &self.stars
    }

    pub fn frame(&self) -> FrameState {
        self.frame
    }

    /// Elapsed time passed to the last [`advance`](Self::advance).
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    /// Base point size for the tree shader.
    pub fn point_size(&self) -> f32 {
        animation::base_point_size(self.config.particle_size)
    }

    /// Incremented every time the particle field is replaced.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}
