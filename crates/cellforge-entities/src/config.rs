//! Tunables for entity task execution and self-evolution.
//!
//! These values live under the `entity` key of `cellforge-config.yaml`.
//! The [`EntityConfig`] struct bundles every tunable so that callers (tick
//! cycle, tests) can override defaults.

use serde::Deserialize;

/// Configuration for per-entity mechanics.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EntityConfig {
    /// Energy cost of a task for an entity with zero performance (default: 0.1).
    ///
    /// Actual cost is `base_cost * (1 - performance)`.
    pub base_cost: f64,

    /// Energy at or below which an entity goes to rest (default: 0.3).
    pub energy_threshold: f64,

    /// Minimum energy required to self-evolve, inclusive (default: 0.8).
    pub evolve_energy_min: f64,

    /// Evolution potential must be strictly above this to self-evolve (default: 0.7).
    pub evolve_potential_min: f64,

    /// Energy multiplier applied by a successful self-evolution (default: 0.9).
    pub evolve_energy_decay: f64,

    /// Performance gain from a successful self-evolution (default: 0.05).
    pub evolve_performance_gain: f64,
}

impl Default for EntityConfig {
    fn default() -> Self {
        Self {
            base_cost: 0.1,
            energy_threshold: 0.3,
            evolve_energy_min: 0.8,
            evolve_potential_min: 0.7,
            evolve_energy_decay: 0.9,
            evolve_performance_gain: 0.05,
        }
    }
}

impl EntityConfig {
    /// Energy cost of one task for a given performance trait.
    pub fn task_cost(&self, performance: f64) -> f64 {
        (self.base_cost * (1.0 - performance)).max(0.0)
    }

    /// Name of the first field holding an unusable value, if any.
    ///
    /// Every tunable is a proportion and must be a finite number in
    /// `[0.0, 1.0]`.
    pub fn invalid_field(&self) -> Option<&'static str> {
        [
            ("base_cost", self.base_cost),
            ("energy_threshold", self.energy_threshold),
            ("evolve_energy_min", self.evolve_energy_min),
            ("evolve_potential_min", self.evolve_potential_min),
            ("evolve_energy_decay", self.evolve_energy_decay),
            ("evolve_performance_gain", self.evolve_performance_gain),
        ]
        .into_iter()
        .find(|(_, value)| !(value.is_finite() && (0.0..=1.0).contains(value)))
        .map(|(name, _)| name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-12;

    #[test]
    fn default_config_values() {
        let cfg = EntityConfig::default();
        assert!((cfg.base_cost - 0.1).abs() < EPS);
        assert!((cfg.energy_threshold - 0.3).abs() < EPS);
        assert!((cfg.evolve_energy_min - 0.8).abs() < EPS);
        assert!((cfg.evolve_potential_min - 0.7).abs() < EPS);
        assert!(cfg.invalid_field().is_none());
    }

    #[test]
    fn task_cost_scales_with_missing_performance() {
        let cfg = EntityConfig::default();
        assert!((cfg.task_cost(0.0) - 0.1).abs() < EPS);
        assert!((cfg.task_cost(0.75) - 0.025).abs() < EPS);
        assert!(cfg.task_cost(1.0).abs() < EPS);
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let cfg: Result<EntityConfig, _> = serde_json::from_str(r#"{"base_cost": 0.2}"#);
        assert!(cfg.is_ok());
        if let Ok(cfg) = cfg {
            assert!((cfg.base_cost - 0.2).abs() < EPS);
            assert!((cfg.energy_threshold - 0.3).abs() < EPS);
        }
    }

    #[test]
    fn out_of_range_field_is_named() {
        let cfg = EntityConfig {
            energy_threshold: 1.5,
            ..EntityConfig::default()
        };
        assert_eq!(cfg.invalid_field(), Some("energy_threshold"));
    }
}
