//! Settings panel and title overlay.
//!
//! The panel edits a draft copy of the [`TreeConfig`]; the viewer applies the
//! draft to the scene whenever [`SettingsPanel::show`] reports a change.
//! Drawing a frame without input never touches the draft.

use std::ops::RangeInclusive;

use egui::{Align2, Color32, RichText};

use crate::color::Rgb;
use crate::config::{
    ParamRange, TreeConfig, BASE_RADIUS_RANGE, BLOOM_INTENSITY_RANGE, PARTICLE_COUNT_RANGE,
    PARTICLE_SIZE_RANGE, RANDOMNESS_RANGE, SPARKLE_SPEED_RANGE, SPIRAL_TURNS_RANGE,
    TREE_HEIGHT_RANGE,
};

const PANEL_WIDTH: f32 = 280.0;

fn slider_range(range: ParamRange) -> RangeInclusive<f32> {
    range.min..=range.max
}

/// Collapsible right-hand settings panel.
#[derive(Debug, Clone)]
pub struct SettingsPanel {
    pub open: bool,
}

impl SettingsPanel {
    pub fn new() -> Self {
        Self { open: true }
    }

    pub fn toggle(&mut self) {
        self.open = !self.open;
    }

    /// Draw the panel (or its reopen button) and the title overlay.
    ///
    /// Returns true if any field of `config` was edited.
    pub fn show(&mut self, ctx: &egui::Context, config: &mut TreeConfig) -> bool {
        title_overlay(ctx, config.tree_color);

        if !self.open {
            egui::Area::new(egui::Id::new("settings_button"))
                .anchor(Align2::RIGHT_TOP, [-16.0, 16.0])
                .show(ctx, |ui| {
                    if ui.button("⚙ Settings").clicked() {
                        self.open = true;
                    }
                });
            return false;
        }

        let mut changed = false;
        egui::SidePanel::right("tree_settings")
            .resizable(false)
            .exact_width(PANEL_WIDTH)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("Tree Settings");
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.button("✕").on_hover_text("Hide (H)").clicked() {
                            self.open = false;
                        }
                    });
                });
                ui.separator();

                changed |= color_section(ui, config);
                changed |= structure_section(ui, config);
                changed |= particle_section(ui, config);

                ui.with_layout(egui::Layout::bottom_up(egui::Align::Center), |ui| {
                    ui.label(
                        RichText::new("Drag to rotate • Scroll to zoom")
                            .small()
                            .color(Color32::GRAY),
                    );
                });
            });

        changed
    }
}

impl Default for SettingsPanel {
    fn default() -> Self {
        Self::new()
    }
}

fn color_section(ui: &mut egui::Ui, config: &mut TreeConfig) -> bool {
    let mut changed = false;
    ui.label(RichText::new("Color & Light").strong());

    ui.horizontal(|ui| {
        let mut srgb = config.tree_color.to_srgb8();
        if ui.color_edit_button_srgb(&mut srgb).changed() && srgb != config.tree_color.to_srgb8() {
            config.tree_color = Rgb::from_srgb8(srgb);
            changed = true;
        }
        ui.monospace(config.tree_color.to_hex());
    });

    changed |= param_slider(ui, &mut config.bloom_intensity, BLOOM_INTENSITY_RANGE, "Bloom");

    ui.add_space(8.0);
    changed
}

fn structure_section(ui: &mut egui::Ui, config: &mut TreeConfig) -> bool {
    let mut changed = false;
    ui.label(RichText::new("Structure").strong());

    changed |= param_slider(ui, &mut config.tree_height, TREE_HEIGHT_RANGE, "Height");
    changed |= param_slider(ui, &mut config.base_radius, BASE_RADIUS_RANGE, "Base Radius");
    changed |= param_slider(ui, &mut config.spiral_turns, SPIRAL_TURNS_RANGE, "Spiral Turns");

    ui.add_space(8.0);
    changed
}

fn particle_section(ui: &mut egui::Ui, config: &mut TreeConfig) -> bool {
    let mut changed = false;
    ui.label(RichText::new("Particles").strong());

    changed |= count_slider(ui, &mut config.particle_count);
    changed |= param_slider(ui, &mut config.particle_size, PARTICLE_SIZE_RANGE, "Size");
    changed |= param_slider(ui, &mut config.randomness, RANDOMNESS_RANGE, "Chaos");
    changed |= param_slider(ui, &mut config.sparkle_speed, SPARKLE_SPEED_RANGE, "Twinkle Speed");

    changed
}

/// Slider over a copy of `value`; the field is written only when the user
/// moves the handle to a different step.
///
/// The slider neither clamps nor steps on its own, so drawing it never
/// rewrites a value that came from code or JSON.
fn param_slider(ui: &mut egui::Ui, value: &mut f32, range: ParamRange, label: &str) -> bool {
    let mut edited = *value;
    let response = ui.add(
        egui::Slider::new(&mut edited, slider_range(range))
            .clamping(egui::SliderClamping::Never)
            .text(label),
    );
    response.changed() && apply_edit(value, edited, range)
}

fn count_slider(ui: &mut egui::Ui, count: &mut u32) -> bool {
    let range = PARTICLE_COUNT_RANGE;
    let mut edited = *count;
    let response = ui.add(
        egui::Slider::new(&mut edited, range.min as u32..=range.max as u32)
            .clamping(egui::SliderClamping::Never)
            .text("Count"),
    );
    if !response.changed() {
        return false;
    }
    let mut value = *count as f32;
    if !apply_edit(&mut value, edited as f32, range) {
        return false;
    }
    *count = value as u32;
    true
}

/// Snap `edited` onto the range's grid and store it if it differs.
fn apply_edit(value: &mut f32, edited: f32, range: ParamRange) -> bool {
    let snapped = range.snap(edited);
    if snapped == *value {
        return false;
    }
    *value = snapped;
    true
}

/// "LuminaTree" wordmark in the bottom-left corner.
fn title_overlay(ctx: &egui::Context, accent: Rgb) {
    let [r, g, b] = accent.to_srgb8();
    egui::Area::new(egui::Id::new("title_overlay"))
        .anchor(Align2::LEFT_BOTTOM, [24.0, -24.0])
        .interactable(false)
        .show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.spacing_mut().item_spacing.x = 0.0;
                ui.label(RichText::new("Lumina").size(36.0).strong().color(Color32::WHITE));
                ui.label(
                    RichText::new("Tree")
                        .size(36.0)
                        .strong()
                        .color(Color32::from_rgb(r, g, b)),
                );
            });
            ui.label(
                RichText::new("Interactive Particle Simulation")
                    .size(14.0)
                    .color(Color32::GRAY),
            );
        });
}
