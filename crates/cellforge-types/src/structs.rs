//! Core value types: energy, chromosomes, tasks, and audit records.
//!
//! Every float in the population model that represents a proportion lives
//! in `[0.0, 1.0]`. [`Energy`] enforces that range by construction; the
//! chromosome traits are clamped by their mutators and checked on restore.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::enums::{ComplianceStatus, Gene};

/// Clamp a value into `[0.0, 1.0]`. `NaN` maps to `0.0`.
pub fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

// ---------------------------------------------------------------------------
// Energy
// ---------------------------------------------------------------------------

/// Rejected attempt to build an [`Energy`] from an out-of-range float.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
#[error("energy {0} is outside [0.0, 1.0]")]
pub struct EnergyOutOfRange(pub f64);

/// Scalar resource held by the root and every entity.
///
/// All arithmetic saturates at the `[0.0, 1.0]` bounds. Deserialization is
/// strict: a persisted value outside the range is an error rather than
/// being silently clamped.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Energy(f64);

impl Energy {
    /// No energy.
    pub const EMPTY: Self = Self(0.0);

    /// Maximum energy.
    pub const FULL: Self = Self(1.0);

    /// Build an energy level, clamping into range.
    pub fn new(value: f64) -> Self {
        Self(clamp_unit(value))
    }

    /// The raw level.
    pub const fn value(self) -> f64 {
        self.0
    }

    /// Add `amount`, saturating at [`Energy::FULL`].
    #[must_use]
    pub fn saturating_add(self, amount: f64) -> Self {
        Self::new(self.0 + amount)
    }

    /// Subtract `amount`, saturating at [`Energy::EMPTY`].
    #[must_use]
    pub fn saturating_sub(self, amount: f64) -> Self {
        Self::new(self.0 - amount)
    }

    /// Multiply by `factor`, clamping the result.
    #[must_use]
    pub fn scale(self, factor: f64) -> Self {
        Self::new(self.0 * factor)
    }

    /// Returns `true` when nothing is left.
    pub fn is_depleted(self) -> bool {
        self.0 <= 0.0
    }
}

impl TryFrom<f64> for Energy {
    type Error = EnergyOutOfRange;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        if value.is_finite() && (0.0..=1.0).contains(&value) {
            Ok(Self(value))
        } else {
            Err(EnergyOutOfRange(value))
        }
    }
}

impl From<Energy> for f64 {
    fn from(energy: Energy) -> Self {
        energy.0
    }
}

impl core::fmt::Display for Energy {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:.3}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Chromosome
// ---------------------------------------------------------------------------

/// Trait vector that parameterizes an entity's behavior.
///
/// Serialized as an object keyed by gene name, e.g.
/// `{"performance": 0.7, "evolution_potential": 0.9, ...}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Chromosome {
    /// Lowers task cost: `cost = base_cost * (1 - performance)`.
    pub performance: f64,
    /// Must exceed the evolution gate for self-evolution to happen.
    pub evolution_potential: f64,
    /// Multiplies the random fitness draw during evaluation.
    pub learning: f64,
    /// Multiplies the random starting energy of a new child.
    pub energy_efficiency: f64,
    /// Opaque to the core; forwarded to collaborators.
    pub decision_speed: f64,
}

impl Chromosome {
    /// Build a chromosome by evaluating `f` for every gene. Values are clamped.
    pub fn from_fn(mut f: impl FnMut(Gene) -> f64) -> Self {
        Self {
            performance: clamp_unit(f(Gene::Performance)),
            evolution_potential: clamp_unit(f(Gene::EvolutionPotential)),
            learning: clamp_unit(f(Gene::Learning)),
            energy_efficiency: clamp_unit(f(Gene::EnergyEfficiency)),
            decision_speed: clamp_unit(f(Gene::DecisionSpeed)),
        }
    }

    /// Read one trait.
    pub const fn get(&self, gene: Gene) -> f64 {
        match gene {
            Gene::Performance => self.performance,
            Gene::EvolutionPotential => self.evolution_potential,
            Gene::Learning => self.learning,
            Gene::EnergyEfficiency => self.energy_efficiency,
            Gene::DecisionSpeed => self.decision_speed,
        }
    }

    /// Overwrite one trait, clamping into range.
    pub fn set(&mut self, gene: Gene, value: f64) {
        let value = clamp_unit(value);
        match gene {
            Gene::Performance => self.performance = value,
            Gene::EvolutionPotential => self.evolution_potential = value,
            Gene::Learning => self.learning = value,
            Gene::EnergyEfficiency => self.energy_efficiency = value,
            Gene::DecisionSpeed => self.decision_speed = value,
        }
    }

    /// Add `delta` to one trait, clamping into range. Returns the new value.
    pub fn boost(&mut self, gene: Gene, delta: f64) -> f64 {
        self.set(gene, self.get(gene) + delta);
        self.get(gene)
    }

    /// The first gene whose value is not a finite number in `[0.0, 1.0]`.
    pub fn out_of_range_gene(&self) -> Option<Gene> {
        Gene::ALL.into_iter().find(|&gene| {
            let value = self.get(gene);
            !(value.is_finite() && (0.0..=1.0).contains(&value))
        })
    }
}

// ---------------------------------------------------------------------------
// Task
// ---------------------------------------------------------------------------

/// An opaque task descriptor queued on an entity.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Task(String);

impl Task {
    /// Create a task descriptor.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The descriptor text.
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Task {
    fn from(name: &str) -> Self {
        Self(name.to_owned())
    }
}

impl core::fmt::Display for Task {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// One audit entry for a task outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplianceRecord {
    /// Position in the global recording order, across all entities.
    pub sequence: u64,
    /// The task the record is about.
    pub task: Task,
    /// Outcome of the task.
    pub status: ComplianceStatus,
    /// When the outcome was recorded.
    pub timestamp: DateTime<Utc>,
    /// Reason for a non-completed outcome.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

/// A successful root self-evolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvolutionRecord {
    /// When the evolution happened.
    pub timestamp: DateTime<Utc>,
    /// Evolution score after the step.
    pub score: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-12;

    #[test]
    fn energy_clamps_on_construction() {
        assert!((Energy::new(1.7).value() - 1.0).abs() < EPS);
        assert!(Energy::new(-0.2).value().abs() < EPS);
        assert!(Energy::new(f64::NAN).value().abs() < EPS);
    }

    #[test]
    fn energy_arithmetic_saturates() {
        let e = Energy::new(0.95);
        assert!((e.saturating_add(0.3).value() - 1.0).abs() < EPS);
        assert!(e.saturating_sub(2.0).is_depleted());
        assert!((e.scale(0.5).value() - 0.475).abs() < EPS);
    }

    #[test]
    fn energy_deserialization_is_strict() {
        let ok: Result<Energy, _> = serde_json::from_str("0.25");
        assert!(ok.is_ok());
        let too_high: Result<Energy, _> = serde_json::from_str("1.5");
        assert!(too_high.is_err());
        let negative: Result<Energy, _> = serde_json::from_str("-0.1");
        assert!(negative.is_err());
    }

    #[test]
    fn chromosome_boost_clamps() {
        let mut c = Chromosome::from_fn(|_| 0.98);
        let after = c.boost(Gene::Performance, 0.05);
        assert!((after - 1.0).abs() < EPS);
        assert!(c.out_of_range_gene().is_none());
    }

    #[test]
    fn chromosome_detects_bad_gene() {
        let mut c = Chromosome::from_fn(|_| 0.5);
        c.learning = 1.2;
        assert_eq!(c.out_of_range_gene(), Some(Gene::Learning));
    }

    #[test]
    fn chromosome_serializes_by_gene_name() {
        let c = Chromosome::from_fn(|_| 0.5);
        let json = serde_json::to_value(c).ok();
        let has_key = json
            .as_ref()
            .and_then(|v| v.get("evolution_potential"))
            .is_some();
        assert!(has_key);
    }

    #[test]
    fn compliance_record_omits_missing_error() {
        let record = ComplianceRecord {
            sequence: 0,
            task: Task::from("scan"),
            status: ComplianceStatus::Completed,
            timestamp: Utc::now(),
            error_message: None,
        };
        let json = serde_json::to_string(&record).unwrap_or_default();
        assert!(!json.contains("error_message"));
    }
}
