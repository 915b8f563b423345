use rand::Rng;
use rand_distr::{Distribution, Normal};

use super::error::PlanError;
use super::types::{EconomicScenario, ReturnModel};

pub const HISTORICAL_FIRST_YEAR: i32 = 1928;

/// S&P 500 total annual returns, 1928 through 2023.
pub const HISTORICAL_ANNUAL_RETURNS: &[f64] = &[
    0.4381, -0.0830, -0.2512, -0.4384, -0.0864, 0.4998, -0.0119, 0.4674, 0.3194, -0.3534, // 1928
    0.2928, -0.0110, -0.1067, -0.1277, 0.1917, 0.2506, 0.1903, 0.3582, -0.0843, 0.0520, // 1938
    0.0570, 0.1830, 0.3081, 0.2368, 0.1815, -0.0121, 0.5256, 0.3260, 0.0744, -0.1046, // 1948
    0.4372, 0.1206, 0.0034, 0.2664, -0.0881, 0.2261, 0.1642, 0.1240, -0.0997, 0.2380, // 1958
    0.1081, -0.0824, 0.0356, 0.1422, 0.1876, -0.1431, -0.2590, 0.3700, 0.2383, -0.0698, // 1968
    0.0651, 0.1852, 0.3174, -0.0470, 0.2042, 0.2234, 0.0615, 0.3124, 0.1849, 0.0581, // 1978
    0.1654, 0.3148, -0.0306, 0.3023, 0.0749, 0.0997, 0.0133, 0.3720, 0.2268, 0.3310, // 1988
    0.2834, 0.2089, -0.0903, -0.1185, -0.2197, 0.2836, 0.1074, 0.0483, 0.1561, 0.0548, // 1998
    -0.3655, 0.2594, 0.1482, 0.0210, 0.1589, 0.3215, 0.1352, 0.0138, 0.1177, 0.2161, // 2008
    -0.0423, 0.3121, 0.1802, 0.2847, -0.1804, 0.2606, // 2018
];

/// Draws annual portfolio returns for Monte Carlo trials.
#[derive(Debug, Clone)]
pub enum ReturnSampler {
    Historical,
    Parametric(Normal<f64>),
}

impl ReturnSampler {
    pub fn new(model: ReturnModel, scenario: &EconomicScenario) -> Result<Self, PlanError> {
        match model {
            ReturnModel::Historical => Ok(ReturnSampler::Historical),
            ReturnModel::Parametric => {
                Normal::new(scenario.investment_return_rate, scenario.return_volatility)
                    .map(ReturnSampler::Parametric)
                    .map_err(|err| PlanError::ReturnDistribution(err.to_string()))
            }
        }
    }

    /// One annual return. Never below -100%.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        match self {
            ReturnSampler::Historical => {
                HISTORICAL_ANNUAL_RETURNS[rng.random_range(0..HISTORICAL_ANNUAL_RETURNS.len())]
            }
            ReturnSampler::Parametric(normal) => normal.sample(rng).max(-1.0),
        }
    }
}

pub fn derive_seed(base_seed: u64, trial: u32) -> u64 {
    splitmix64(base_seed ^ ((trial as u64) << 32) ^ trial as u64)
}

fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E3779B97F4A7C15);
    let mut z = x;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
    z ^ (z >> 31)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    #[test]
    fn historical_series_spans_1928_to_2023() {
        assert_eq!(
            HISTORICAL_FIRST_YEAR + HISTORICAL_ANNUAL_RETURNS.len() as i32 - 1,
            2023
        );
        assert_eq!(HISTORICAL_ANNUAL_RETURNS[0], 0.4381);
        assert_eq!(HISTORICAL_ANNUAL_RETURNS[2008 - 1928], -0.3655);
    }

    #[test]
    fn historical_draws_come_from_the_series() {
        let sampler = ReturnSampler::new(ReturnModel::Historical, &EconomicScenario::moderate())
            .expect("historical sampler");
        let mut rng = ChaCha20Rng::seed_from_u64(11);
        for _ in 0..500 {
            let r = sampler.sample(&mut rng);
            assert!(HISTORICAL_ANNUAL_RETURNS.contains(&r), "{r} not in series");
        }
    }

    #[test]
    fn zero_volatility_parametric_draws_the_mean() {
        let mut scenario = EconomicScenario::moderate();
        scenario.return_volatility = 0.0;
        let sampler = ReturnSampler::new(ReturnModel::Parametric, &scenario).expect("sampler");
        let mut rng = ChaCha20Rng::seed_from_u64(3);
        for _ in 0..10 {
            assert_eq!(sampler.sample(&mut rng), 0.06);
        }
    }

    #[test]
    fn parametric_draws_are_floored_at_total_loss() {
        let mut scenario = EconomicScenario::moderate();
        scenario.investment_return_rate = -0.9;
        scenario.return_volatility = 2.0;
        let sampler = ReturnSampler::new(ReturnModel::Parametric, &scenario).expect("sampler");
        let mut rng = ChaCha20Rng::seed_from_u64(5);
        assert!((0..1_000).all(|_| sampler.sample(&mut rng) >= -1.0));
    }

    #[test]
    fn negative_volatility_is_rejected() {
        let mut scenario = EconomicScenario::moderate();
        scenario.return_volatility = -0.1;
        let err = ReturnSampler::new(ReturnModel::Parametric, &scenario).unwrap_err();
        assert!(matches!(err, PlanError::ReturnDistribution(_)));
    }

    #[test]
    fn derive_seed_changes_per_trial() {
        let a = derive_seed(42, 0);
        let b = derive_seed(42, 1);
        let c = derive_seed(43, 0);
        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_eq!(a, derive_seed(42, 0));
    }
}
