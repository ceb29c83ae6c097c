//! Random chromosome generation for new entities.
//!
//! Each gene is sampled independently and uniformly from its own
//! [`GeneRange`]. The generator holds no state of its own; the random
//! source is always passed in, so a seeded RNG reproduces the same
//! sequence of chromosomes.

use rand::Rng;
use serde::Deserialize;

use cellforge_types::{Chromosome, Gene, clamp_unit};

use crate::error::EntityError;

/// Inclusive sampling range for one gene.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct GeneRange {
    /// Lower bound.
    pub min: f64,
    /// Upper bound.
    pub max: f64,
}

impl GeneRange {
    /// Build a range, rejecting bounds that are inverted or outside `[0, 1]`.
    pub fn new(min: f64, max: f64) -> Result<Self, EntityError> {
        let range = Self { min, max };
        range.validate()?;
        Ok(range)
    }

    /// Check that both bounds are finite, in `[0, 1]`, and ordered.
    pub fn validate(&self) -> Result<(), EntityError> {
        let in_unit = |v: f64| v.is_finite() && (0.0..=1.0).contains(&v);
        if !in_unit(self.min) || !in_unit(self.max) || self.min > self.max {
            return Err(EntityError::InvalidArgument {
                reason: format!("gene range [{}, {}] is not a sub-range of [0, 1]", self.min, self.max),
            });
        }
        Ok(())
    }

    /// Draw one value. A degenerate range yields its single point.
    pub fn sample(&self, rng: &mut impl Rng) -> f64 {
        let lo = clamp_unit(self.min.min(self.max));
        let hi = clamp_unit(self.min.max(self.max));
        if lo < hi {
            rng.random_range(lo..=hi)
        } else {
            lo
        }
    }
}

/// Per-gene sampling ranges. Lives under the `genes` key of the config file.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct GeneRanges {
    /// Range for [`Gene::Performance`] (default: 0.5--1.0).
    pub performance: GeneRange,
    /// Range for [`Gene::EvolutionPotential`] (default: 0.6--1.0).
    pub evolution_potential: GeneRange,
    /// Range for [`Gene::Learning`] (default: 0.5--1.0).
    pub learning: GeneRange,
    /// Range for [`Gene::EnergyEfficiency`] (default: 0.7--1.0).
    pub energy_efficiency: GeneRange,
    /// Range for [`Gene::DecisionSpeed`] (default: 0.5--1.0).
    pub decision_speed: GeneRange,
}

impl Default for GeneRanges {
    fn default() -> Self {
        Self {
            performance: GeneRange { min: 0.5, max: 1.0 },
            evolution_potential: GeneRange { min: 0.6, max: 1.0 },
            learning: GeneRange { min: 0.5, max: 1.0 },
            energy_efficiency: GeneRange { min: 0.7, max: 1.0 },
            decision_speed: GeneRange { min: 0.5, max: 1.0 },
        }
    }
}

impl GeneRanges {
    /// The range configured for `gene`.
    pub const fn get(&self, gene: Gene) -> GeneRange {
        match gene {
            Gene::Performance => self.performance,
            Gene::EvolutionPotential => self.evolution_potential,
            Gene::Learning => self.learning,
            Gene::EnergyEfficiency => self.energy_efficiency,
            Gene::DecisionSpeed => self.decision_speed,
        }
    }

    /// Validate every range, naming the first bad gene in the error.
    pub fn validate(&self) -> Result<(), EntityError> {
        for gene in Gene::ALL {
            self.get(gene)
                .validate()
                .map_err(|e| EntityError::InvalidArgument {
                    reason: format!("{gene:?}: {e}"),
                })?;
        }
        Ok(())
    }
}

/// Produces bounded random chromosomes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChromosomeGenerator {
    ranges: GeneRanges,
}

impl ChromosomeGenerator {
    /// Create a generator over the given ranges.
    pub const fn new(ranges: GeneRanges) -> Self {
        Self { ranges }
    }

    /// The configured ranges.
    pub const fn ranges(&self) -> &GeneRanges {
        &self.ranges
    }

    /// Sample a fresh chromosome.
    pub fn generate(&self, rng: &mut impl Rng) -> Chromosome {
        Chromosome::from_fn(|gene| self.ranges.get(gene).sample(rng))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use super::*;

    #[test]
    fn generated_genes_stay_in_their_ranges() {
        let generator = ChromosomeGenerator::default();
        let mut rng = SmallRng::seed_from_u64(42);
        for _ in 0..500 {
            let chromosome = generator.generate(&mut rng);
            for gene in Gene::ALL {
                let range = generator.ranges().get(gene);
                let value = chromosome.get(gene);
                assert!(
                    value >= range.min && value <= range.max,
                    "{gene:?} = {value} outside [{}, {}]",
                    range.min,
                    range.max
                );
            }
        }
    }

    #[test]
    fn same_seed_same_chromosomes() {
        let generator = ChromosomeGenerator::default();
        let mut a = SmallRng::seed_from_u64(7);
        let mut b = SmallRng::seed_from_u64(7);
        for _ in 0..20 {
            assert_eq!(generator.generate(&mut a), generator.generate(&mut b));
        }
    }

    #[test]
    fn degenerate_range_yields_its_point() {
        let ranges = GeneRanges {
            learning: GeneRange { min: 0.4, max: 0.4 },
            ..GeneRanges::default()
        };
        let generator = ChromosomeGenerator::new(ranges);
        let mut rng = SmallRng::seed_from_u64(1);
        let chromosome = generator.generate(&mut rng);
        assert!((chromosome.learning - 0.4).abs() < 1e-12);
    }

    #[test]
    fn inverted_range_is_rejected() {
        assert!(GeneRange::new(0.9, 0.1).is_err());
        assert!(GeneRange::new(0.0, 1.5).is_err());
        assert!(GeneRange::new(0.2, 0.8).is_ok());

        let ranges = GeneRanges {
            decision_speed: GeneRange { min: 0.9, max: 0.1 },
            ..GeneRanges::default()
        };
        let err = ranges.validate().unwrap_err();
        assert!(err.to_string().contains("DecisionSpeed"));
    }

    #[test]
    fn partial_gene_config_keeps_defaults() {
        let parsed: Result<GeneRanges, _> =
            serde_json::from_str(r#"{"learning": {"min": 0.1, "max": 0.2}}"#);
        assert!(parsed.is_ok());
        if let Ok(ranges) = parsed {
            assert!((ranges.learning.max - 0.2).abs() < 1e-12);
            assert!((ranges.energy_efficiency.min - 0.7).abs() < 1e-12);
        }
    }
}
