//! Terminal front end: dialoguer prompts for the controls, colored output
//! for the surface.

use super::controls::{float_steps, int_steps, Controls, PresetControls};
use super::surface::Surface;
use crate::error::{ExplorerError, Result};
use colored::*;
use dialoguer::console::{style, Style};
use dialoguer::theme::ColorfulTheme;
use dialoguer::Select;
use polars::prelude::*;
use tracing::warn;

// ─── Styling helpers ───────────────────────────────────────────────────────────

pub(crate) fn dim(s: &str) -> ColoredString {
    s.truecolor(100, 100, 100)
}

pub(crate) fn accent(s: &str) -> ColoredString {
    s.truecolor(120, 170, 255)
}

pub(crate) fn muted(s: &str) -> ColoredString {
    s.truecolor(140, 140, 140)
}

pub(crate) fn ok(s: &str) -> ColoredString {
    s.truecolor(100, 210, 120)
}

pub(crate) fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

pub(crate) fn theme() -> ColorfulTheme {
    ColorfulTheme {
        active_item_prefix: style("  ›".to_string()).for_stderr().cyan(),
        active_item_style: Style::new().for_stderr().white().bold(),
        inactive_item_prefix: style("   ".to_string()).for_stderr(),
        inactive_item_style: Style::new().for_stderr().color256(245),
        prompt_prefix: style("  ?".to_string()).for_stderr().color256(111),
        prompt_style: Style::new().for_stderr().white().bold(),
        ..ColorfulTheme::default()
    }
}

// ─── Controls ──────────────────────────────────────────────────────────────────

/// Controls answered through arrow-key selection lists. Sliders are offered
/// as the list of their discrete steps. Escape cancels with an
/// `Interaction` error.
///
/// Presets, e.g. from the configuration file, move the highlighted default.
pub struct TerminalControls {
    theme: ColorfulTheme,
    presets: PresetControls,
}

impl Default for TerminalControls {
    fn default() -> Self {
        Self::new()
    }
}

impl TerminalControls {
    pub fn new() -> Self {
        Self::with_presets(PresetControls::new())
    }

    pub fn with_presets(presets: PresetControls) -> Self {
        Self {
            theme: theme(),
            presets,
        }
    }

    fn choose(&self, label: &str, items: &[String], default: usize) -> Result<usize> {
        if items.is_empty() {
            return Err(ExplorerError::Interaction(format!("'{}' has no options", label)));
        }
        println!();
        Select::with_theme(&self.theme)
            .with_prompt(label)
            .items(items)
            .default(default.min(items.len() - 1))
            .interact_opt()?
            .ok_or_else(|| ExplorerError::Interaction(format!("'{}' cancelled", label)))
    }
}

/// The preset's answer when it is in bounds, the control's default otherwise
fn preset_or<T>(key: &str, preset: Result<T>, default: T) -> T {
    preset.unwrap_or_else(|e| {
        warn!(key = %key, error = %e, "Preset ignored as default");
        default
    })
}

impl Controls for TerminalControls {
    fn select(&mut self, key: &str, label: &str, options: &[String], default: usize) -> Result<usize> {
        let default = preset_or(key, self.presets.select(key, label, options, default), default);
        self.choose(label, options, default)
    }

    fn slider_int(
        &mut self,
        key: &str,
        label: &str,
        min: i64,
        max: i64,
        step: i64,
        default: i64,
    ) -> Result<i64> {
        let default = preset_or(
            key,
            self.presets.slider_int(key, label, min, max, step, default),
            default,
        );
        let steps = int_steps(min, max, step);
        let labels: Vec<String> = steps.iter().map(i64::to_string).collect();
        let default_idx = steps.iter().position(|&v| v == default).unwrap_or(0);
        let idx = self.choose(label, &labels, default_idx)?;
        Ok(steps[idx])
    }

    fn slider_float(
        &mut self,
        key: &str,
        label: &str,
        min: f64,
        max: f64,
        step: f64,
        default: f64,
    ) -> Result<f64> {
        let default = preset_or(
            key,
            self.presets.slider_float(key, label, min, max, step, default),
            default,
        );
        let steps = float_steps(min, max, step);
        let labels: Vec<String> = steps.iter().map(|v| v.to_string()).collect();
        let default_idx = steps
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| (*a - default).abs().total_cmp(&(*b - default).abs()))
            .map_or(0, |(i, _)| i);
        let idx = self.choose(label, &labels, default_idx)?;
        Ok(steps[idx])
    }

    fn select_slider(
        &mut self,
        key: &str,
        label: &str,
        options: &[String],
        default: usize,
    ) -> Result<usize> {
        let default = preset_or(
            key,
            self.presets.select_slider(key, label, options, default),
            default,
        );
        self.choose(label, options, default)
    }

    fn finish(&mut self) -> Result<()> {
        self.presets.finish()
    }
}

// ─── Surface ───────────────────────────────────────────────────────────────────

/// Surface printing to stdout
#[derive(Debug, Default)]
pub struct TerminalSurface;

impl TerminalSurface {
    pub fn new() -> Self {
        Self
    }
}

impl Surface for TerminalSurface {
    fn heading(&mut self, text: &str) {
        section(text);
    }

    fn text(&mut self, text: &str) {
        println!("  {}", text);
    }

    fn table(&mut self, frame: &DataFrame) {
        for line in frame.to_string().lines() {
            println!("  {}", line);
        }
    }

    fn preformatted(&mut self, text: &str) {
        for line in text.lines() {
            println!("  {}", line.white());
        }
    }

    fn error(&mut self, error: &ExplorerError) {
        println!("  {} {}", "✗".red(), error.to_string().red());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preset_moves_default() {
        let mut presets = PresetControls::new().with_value("max_depth", 6);
        let preset = presets.slider_int("max_depth", "Depth", 1, 20, 1, 1);
        assert_eq!(preset_or("max_depth", preset, 1), 6);
    }

    #[test]
    fn test_out_of_range_preset_keeps_default() {
        let mut presets = PresetControls::new().with_value("n_neighbors", 40);
        let preset = presets.slider_int("n_neighbors", "K", 1, 20, 1, 1);
        assert_eq!(preset_or("n_neighbors", preset, 1), 1);
    }
}
