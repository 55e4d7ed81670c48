//! Uncertainty distributions attached to exchanges, factors and parameters.
use rand::Rng;
use rand_distr::{Distribution, LogNormal, Normal, Triangular, Uniform};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "distributionType", rename_all = "camelCase")]
pub enum Uncertainty {
    Normal { mean: f64, sd: f64 },
    /// Parameterized by the geometric mean and the geometric standard deviation.
    LogNormal { geom_mean: f64, geom_sd: f64 },
    Uniform { min: f64, max: f64 },
    Triangle { min: f64, mode: f64, max: f64 },
}

impl Uncertainty {
    /// The value used when no random number is drawn.
    pub fn expected(&self) -> f64 {
        match *self {
            Uncertainty::Normal { mean, .. } => mean,
            Uncertainty::LogNormal { geom_mean, .. } => geom_mean,
            Uncertainty::Uniform { min, max } => (min + max) / 2.0,
            Uncertainty::Triangle { min, mode, max } => (min + mode + max) / 3.0,
        }
    }

    /// Draws a value. Degenerate parameters (zero width, negative deviation)
    /// yield the expected value instead of a panic.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        match *self {
            Uncertainty::Normal { mean, sd } => Normal::new(mean, sd)
                .map(|d| d.sample(rng))
                .unwrap_or(mean),
            Uncertainty::LogNormal { geom_mean, geom_sd } => {
                if geom_mean <= 0.0 || geom_sd < 1.0 {
                    return geom_mean;
                }
                LogNormal::new(geom_mean.ln(), geom_sd.ln())
                    .map(|d| d.sample(rng))
                    .unwrap_or(geom_mean)
            }
            Uncertainty::Uniform { min, max } => {
                if !(min < max) {
                    return min;
                }
                Uniform::new(min, max).sample(rng)
            }
            Uncertainty::Triangle { min, mode, max } => {
                if !(min < max) {
                    return mode;
                }
                Triangular::new(min, max, mode)
                    .map(|d| d.sample(rng))
                    .unwrap_or(mode)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_uniform_stays_in_bounds() {
        let mut rng = StdRng::seed_from_u64(7);
        let u = Uncertainty::Uniform { min: 2.0, max: 3.0 };
        for _ in 0..1000 {
            let v = u.sample(&mut rng);
            assert!((2.0..3.0).contains(&v));
        }
    }

    #[test]
    fn test_degenerate_distributions_return_expected_value() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(Uncertainty::Uniform { min: 4.0, max: 4.0 }.sample(&mut rng), 4.0);
        assert_eq!(Uncertainty::Normal { mean: 3.0, sd: -1.0 }.sample(&mut rng), 3.0);
        assert_eq!(Uncertainty::LogNormal { geom_mean: 5.0, geom_sd: 0.5 }.sample(&mut rng), 5.0);
    }

    #[test]
    fn test_lognormal_is_positive_and_centered() {
        let mut rng = StdRng::seed_from_u64(42);
        let u = Uncertainty::LogNormal { geom_mean: 10.0, geom_sd: 1.2 };
        let n = 5000;
        let mut log_sum = 0.0;
        for _ in 0..n {
            let v = u.sample(&mut rng);
            assert!(v > 0.0);
            log_sum += v.ln();
        }
        let geo_mean = (log_sum / n as f64).exp();
        assert!((geo_mean - 10.0).abs() < 0.2, "geometric mean {}", geo_mean);
    }

    #[test]
    fn test_deserialize_from_tagged_json() {
        let json = r#"{"distributionType": "triangle", "min": 1.0, "mode": 2.0, "max": 4.0}"#;
        let u: Uncertainty = serde_json::from_str(json).unwrap();
        assert_eq!(u, Uncertainty::Triangle { min: 1.0, mode: 2.0, max: 4.0 });
    }
}
