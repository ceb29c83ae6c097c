//! Environment readings and the directives derived from them.
//!
//! | Reading | Condition | Directive |
//! |---------|-----------|-----------|
//! | temperature | > 30 | [`Directive::Cool`] |
//! | temperature | < 15 | [`Directive::Heat`] |
//! | light | high | [`Directive::OptimizeEnergy`] |
//! | light | low | [`Directive::IncreaseLighting`] |
//! | humidity | > 80 | [`Directive::Dehumidify`] |
//! | humidity | < 20 | [`Directive::Humidify`] |
//!
//! Directives are returned in table order. A reading that triggers none of
//! them yields [`Directive::NoActionNeeded`].

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Ambient light level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LightLevel {
    /// Dim.
    Low,
    /// Normal.
    Medium,
    /// Bright.
    High,
}

/// One sample of the surroundings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentReading {
    /// Degrees Celsius.
    pub temperature: f64,
    /// Light level.
    pub light: LightLevel,
    /// Relative humidity in percent.
    pub humidity: f64,
}

/// Action suggested by a reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Directive {
    /// Too hot.
    Cool,
    /// Too cold.
    Heat,
    /// Plenty of light; save energy.
    OptimizeEnergy,
    /// Too dark.
    IncreaseLighting,
    /// Too humid.
    Dehumidify,
    /// Too dry.
    Humidify,
    /// Everything is in range.
    NoActionNeeded,
}

impl EnvironmentReading {
    /// Draw a reading: temperature 10--35, humidity 0--100, any light level.
    pub fn sample(rng: &mut impl Rng) -> Self {
        let light = match rng.random_range(0..3u8) {
            0 => LightLevel::Low,
            1 => LightLevel::Medium,
            _ => LightLevel::High,
        };
        Self {
            temperature: f64::from(rng.random_range(10..=35_i32)),
            light,
            humidity: rng.random_range(0.0..=100.0),
        }
    }

    /// Directives for this reading, in table order.
    pub fn analyze(&self) -> Vec<Directive> {
        let mut directives = Vec::new();
        if self.temperature > 30.0 {
            directives.push(Directive::Cool);
        } else if self.temperature < 15.0 {
            directives.push(Directive::Heat);
        }
        match self.light {
            LightLevel::High => directives.push(Directive::OptimizeEnergy),
            LightLevel::Low => directives.push(Directive::IncreaseLighting),
            LightLevel::Medium => {}
        }
        if self.humidity > 80.0 {
            directives.push(Directive::Dehumidify);
        } else if self.humidity < 20.0 {
            directives.push(Directive::Humidify);
        }
        if directives.is_empty() {
            directives.push(Directive::NoActionNeeded);
        }
        directives
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use super::*;

    fn reading(temperature: f64, light: LightLevel, humidity: f64) -> EnvironmentReading {
        EnvironmentReading {
            temperature,
            light,
            humidity,
        }
    }

    #[test]
    fn mild_reading_needs_nothing() {
        assert_eq!(
            reading(22.0, LightLevel::Medium, 50.0).analyze(),
            vec![Directive::NoActionNeeded]
        );
    }

    #[test]
    fn hot_bright_humid_reading_lists_all_in_order() {
        assert_eq!(
            reading(33.0, LightLevel::High, 90.0).analyze(),
            vec![
                Directive::Cool,
                Directive::OptimizeEnergy,
                Directive::Dehumidify
            ]
        );
    }

    #[test]
    fn cold_dark_dry_reading() {
        assert_eq!(
            reading(5.0, LightLevel::Low, 10.0).analyze(),
            vec![
                Directive::Heat,
                Directive::IncreaseLighting,
                Directive::Humidify
            ]
        );
    }

    #[test]
    fn thresholds_are_exclusive() {
        assert_eq!(
            reading(30.0, LightLevel::Medium, 80.0).analyze(),
            vec![Directive::NoActionNeeded]
        );
        assert_eq!(
            reading(15.0, LightLevel::Medium, 20.0).analyze(),
            vec![Directive::NoActionNeeded]
        );
    }

    #[test]
    fn sampled_readings_stay_in_range() {
        let mut rng = SmallRng::seed_from_u64(9);
        for _ in 0..200 {
            let r = EnvironmentReading::sample(&mut rng);
            assert!((10.0..=35.0).contains(&r.temperature));
            assert!((0.0..=100.0).contains(&r.humidity));
        }
    }
}
