use serde::{Deserialize, Serialize};

/// Summary statistics of the values of one result column over all runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation; 0 for a single value.
    pub sd: f64,
    pub min: f64,
    pub max: f64,
    pub median: f64,
    sorted: Vec<f64>,
}

impl Statistics {
    /// `None` for an empty slice. Non-finite values are ignored.
    pub fn of(values: &[f64]) -> Option<Self> {
        let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
        if sorted.is_empty() {
            return None;
        }
        sorted.sort_by(f64::total_cmp);
        let count = sorted.len();
        let mean = sorted.iter().sum::<f64>() / count as f64;
        let sd = if count > 1 {
            let ss: f64 = sorted.iter().map(|v| (v - mean) * (v - mean)).sum();
            (ss / (count - 1) as f64).sqrt()
        } else {
            0.0
        };
        Some(Self {
            count,
            mean,
            sd,
            min: sorted[0],
            max: sorted[count - 1],
            median: percentile_of_sorted(&sorted, 50.0),
            sorted,
        })
    }

    /// The `p`-th percentile (0..=100), linearly interpolated between ranks.
    pub fn percentile(&self, p: f64) -> f64 {
        percentile_of_sorted(&self.sorted, p)
    }
}

fn percentile_of_sorted(sorted: &[f64], p: f64) -> f64 {
    let n = sorted.len();
    if n == 1 {
        return sorted[0];
    }
    let rank = (p.clamp(0.0, 100.0) / 100.0) * (n - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let weight = rank - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * weight
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_empty_has_no_statistics() {
        assert!(Statistics::of(&[]).is_none());
        assert!(Statistics::of(&[f64::NAN]).is_none());
    }

    #[test]
    fn test_basic_statistics() {
        let stats = Statistics::of(&[4.0, 1.0, 3.0, 2.0]).unwrap();
        assert_eq!(stats.count, 4);
        assert_eq!(stats.mean, 2.5);
        assert_eq!(stats.min, 1.0);
        assert_eq!(stats.max, 4.0);
        assert_eq!(stats.median, 2.5);
        assert!((stats.sd - (5.0f64 / 3.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_constant_values_have_zero_deviation() {
        let stats = Statistics::of(&[7.0; 10]).unwrap();
        assert_eq!(stats.sd, 0.0);
        assert_eq!(stats.percentile(95.0), 7.0);
    }

    #[rstest]
    #[case(0.0, 10.0)]
    #[case(25.0, 20.0)]
    #[case(100.0, 50.0)]
    #[case(110.0, 50.0)]
    fn test_percentiles(#[case] p: f64, #[case] expected: f64) {
        let stats = Statistics::of(&[10.0, 20.0, 30.0, 40.0, 50.0]).unwrap();
        assert!((stats.percentile(p) - expected).abs() < 1e-12);
    }
}
