//! Engine configuration.

use serde::{Deserialize, Serialize};

/// Tunables of the combat engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Longest frame `advance` will simulate; longer deltas are clamped.
    /// `None` simulates every delta in full.
    pub max_frame_delta: Option<f32>,
    /// Ceiling of an entity's shield pool.
    pub shield_cap: f32,
    /// Resistances clamp to `[-cap, cap]` after aggregation.
    pub resistance_cap: f32,
    /// Event bus capacity.
    pub event_capacity: usize,
    /// Apply hp/mana/stamina regeneration each frame.
    pub regen_enabled: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_frame_delta: None,
            shield_cap: 420.0,
            resistance_cap: 0.8,
            event_capacity: 4096,
            regen_enabled: true,
        }
    }
}

impl EngineConfig {
    /// Validate and clamp configuration values to sensible ranges.
    pub fn validate(&mut self) {
        self.max_frame_delta = self
            .max_frame_delta
            .filter(|d| d.is_finite() && *d > 0.0)
            .map(|d| d.min(10.0));
        if !self.shield_cap.is_finite() {
            self.shield_cap = 420.0;
        }
        self.shield_cap = self.shield_cap.max(0.0);
        if !self.resistance_cap.is_finite() {
            self.resistance_cap = 0.8;
        }
        self.resistance_cap = self.resistance_cap.clamp(0.0, 1.0);
        self.event_capacity = self.event_capacity.clamp(16, 1 << 20);
    }

    /// Frame delta actually simulated for a requested `dt`.
    #[must_use]
    pub fn effective_delta(&self, dt: f32) -> f32 {
        if !dt.is_finite() || dt <= 0.0 {
            return 0.0;
        }
        match self.max_frame_delta {
            Some(max) => dt.min(max),
            None => dt,
        }
    }
}
