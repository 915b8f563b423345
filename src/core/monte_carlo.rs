use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use rayon::prelude::*;
use tracing::{info, warn};

use super::engine::{YearStep, build_year_flows, fold_years, percentile};
use super::error::PlanError;
use super::market::{ReturnSampler, derive_seed};
use super::types::{
    EconomicScenario, FinalNetWorth, Household, MonteCarloResult, MonteCarloSettings,
    PercentileBand,
};

pub const MAX_TRIALS: u32 = 1_000;

/// Repeats the yearly fold once per trial with sampled investment returns.
/// Everything except the return is shared across trials.
pub fn run_monte_carlo(
    household: &Household,
    scenario: &EconomicScenario,
    settings: &MonteCarloSettings,
) -> Result<MonteCarloResult, PlanError> {
    if settings.trials == 0 {
        return Err(PlanError::invalid("monteCarlo.trials", "must be at least 1"));
    }
    let trials = if settings.trials > MAX_TRIALS {
        warn!(
            requested = settings.trials,
            cap = MAX_TRIALS,
            "trial count capped"
        );
        MAX_TRIALS
    } else {
        settings.trials
    };

    let flows = build_year_flows(household, scenario)?;
    let sampler = ReturnSampler::new(settings.return_model, scenario)?;
    let seed = settings.seed.unwrap_or_else(rand::random);
    info!(
        trials,
        years = flows.len(),
        seed,
        model = ?settings.return_model,
        "running monte carlo"
    );

    let paths: Vec<Vec<YearStep>> = (0..trials)
        .into_par_iter()
        .map(|trial| {
            let mut rng = ChaCha20Rng::seed_from_u64(derive_seed(seed, trial));
            fold_years(&flows, household.starting_net_worth, |_| {
                sampler.sample(&mut rng)
            })
        })
        .collect();

    let years: Vec<i32> = flows.iter().map(|f| f.year).collect();
    let net_worth = matrix(&paths, |s| s.net_worth);
    let income = matrix(&paths, |s| s.total_income);
    let expenses = matrix(&paths, |s| s.total_expenses);
    let cashflow = matrix(&paths, |s| s.cashflow);

    let solvent = net_worth
        .iter()
        .filter(|row| row.iter().all(|nw| *nw >= 0.0))
        .count();
    let success_rate = solvent as f64 / trials as f64;

    let mut terminal: Vec<f64> = net_worth
        .iter()
        .filter_map(|row| row.last().copied())
        .collect();
    let final_net_worth = FinalNetWorth {
        p10: percentile(&mut terminal, 10.0),
        p50: percentile(&mut terminal, 50.0),
        p90: percentile(&mut terminal, 90.0),
    };

    info!(
        success_rate,
        final_p50 = final_net_worth.p50,
        "monte carlo complete"
    );

    Ok(MonteCarloResult {
        net_worth_bands: bands(&years, &net_worth),
        income_bands: bands(&years, &income),
        expense_bands: bands(&years, &expenses),
        cashflow_bands: bands(&years, &cashflow),
        years,
        trials,
        seed,
        net_worth,
        income,
        expenses,
        cashflow,
        success_rate,
        final_net_worth,
    })
}

fn matrix(paths: &[Vec<YearStep>], pick: impl Fn(&YearStep) -> f64) -> Vec<Vec<f64>> {
    paths
        .iter()
        .map(|path| path.iter().map(&pick).collect())
        .collect()
}

/// Percentiles of each year's column across trials.
fn bands(years: &[i32], rows: &[Vec<f64>]) -> Vec<PercentileBand> {
    years
        .iter()
        .enumerate()
        .map(|(idx, &year)| {
            let mut column: Vec<f64> = rows.iter().map(|row| row[idx]).collect();
            PercentileBand {
                year,
                p10: percentile(&mut column, 10.0),
                p25: percentile(&mut column, 25.0),
                p50: percentile(&mut column, 50.0),
                p75: percentile(&mut column, 75.0),
                p90: percentile(&mut column, 90.0),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::engine::run_projection;
    use crate::core::engine::tests::{flat_scenario, sample_household};
    use crate::core::types::{FamilyExpenses, ReturnModel};

    fn settings(trials: u32, model: ReturnModel, seed: u64) -> MonteCarloSettings {
        MonteCarloSettings {
            trials,
            return_model: model,
            seed: Some(seed),
        }
    }

    #[test]
    fn same_seed_reproduces_bit_identical_results() {
        let household = sample_household();
        let scenario = EconomicScenario::moderate();
        let s = settings(64, ReturnModel::Historical, 2024);
        let a = run_monte_carlo(&household, &scenario, &s).expect("first run");
        let b = run_monte_carlo(&household, &scenario, &s).expect("second run");
        assert_eq!(a, b);
        assert_eq!(a.seed, 2024);
    }

    #[test]
    fn different_seeds_give_different_paths() {
        let household = sample_household();
        let scenario = EconomicScenario::moderate();
        let a = run_monte_carlo(&household, &scenario, &settings(16, ReturnModel::Historical, 1))
            .expect("seed 1");
        let b = run_monte_carlo(&household, &scenario, &settings(16, ReturnModel::Historical, 2))
            .expect("seed 2");
        assert_ne!(a.net_worth, b.net_worth);
    }

    #[test]
    fn matrices_are_trials_by_years() {
        let household = sample_household();
        let result = run_monte_carlo(
            &household,
            &EconomicScenario::moderate(),
            &settings(20, ReturnModel::Parametric, 9),
        )
        .expect("run");
        let years = household.years().count();
        assert_eq!(result.years.len(), years);
        for m in [&result.net_worth, &result.income, &result.expenses, &result.cashflow] {
            assert_eq!(m.len(), 20);
            assert!(m.iter().all(|row| row.len() == years));
        }
        assert_eq!(result.net_worth_bands.len(), years);
    }

    #[test]
    fn bands_are_ordered_every_year() {
        let result = run_monte_carlo(
            &sample_household(),
            &EconomicScenario::aggressive(),
            &settings(200, ReturnModel::Historical, 77),
        )
        .expect("run");
        for band in result
            .net_worth_bands
            .iter()
            .chain(&result.income_bands)
            .chain(&result.cashflow_bands)
        {
            assert!(band.p10 <= band.p25, "{band:?}");
            assert!(band.p25 <= band.p50, "{band:?}");
            assert!(band.p50 <= band.p75, "{band:?}");
            assert!(band.p75 <= band.p90, "{band:?}");
        }
        assert!(result.final_net_worth.p10 <= result.final_net_worth.p50);
        assert!(result.final_net_worth.p50 <= result.final_net_worth.p90);
    }

    #[test]
    fn zero_volatility_matches_deterministic_projection() {
        let household = sample_household();
        let scenario = flat_scenario();
        let records = run_projection(&household, &scenario).expect("projection");
        let result = run_monte_carlo(
            &household,
            &scenario,
            &settings(5, ReturnModel::Parametric, 3),
        )
        .expect("run");
        for row in &result.net_worth {
            for (nw, record) in row.iter().zip(&records) {
                assert!((nw - record.net_worth).abs() <= 1e-6 * record.net_worth.abs().max(1.0));
            }
        }
        assert_eq!(result.success_rate, 1.0);
    }

    #[test]
    fn opening_year_is_identical_across_trials() {
        let household = sample_household();
        let result = run_monte_carlo(
            &household,
            &EconomicScenario::moderate(),
            &settings(30, ReturnModel::Historical, 5),
        )
        .expect("run");
        assert!(result.net_worth.iter().all(|row| row[0] == 500_000.0));
        let first = &result.net_worth_bands[0];
        assert_eq!((first.p10, first.p90), (500_000.0, 500_000.0));
    }

    #[test]
    fn overspending_household_never_succeeds() {
        let mut household = sample_household();
        household.family_expenses = FamilyExpenses::Fixed { annual: 1_000_000.0 };
        let result = run_monte_carlo(
            &household,
            &EconomicScenario::moderate(),
            &settings(25, ReturnModel::Historical, 8),
        )
        .expect("run");
        assert_eq!(result.success_rate, 0.0);
    }

    #[test]
    fn non_finite_paths_stay_in_the_batch_as_failures() {
        let mut household = sample_household();
        household.starting_net_worth = -1e300;
        let mut scenario = flat_scenario();
        scenario.investment_return_rate = 1e10;
        let result = run_monte_carlo(
            &household,
            &scenario,
            &settings(10, ReturnModel::Parametric, 4),
        )
        .expect("run completes");

        assert_eq!(result.net_worth.len(), 10);
        for row in &result.net_worth {
            assert_eq!(row[0], -1e300);
            assert!(row[1..].iter().all(|nw| *nw == f64::NEG_INFINITY));
        }
        assert_eq!(result.success_rate, 0.0);
        assert_eq!(result.final_net_worth.p50, f64::NEG_INFINITY);
        let last = result.net_worth_bands.last().expect("bands");
        assert_eq!(last.p90, f64::NEG_INFINITY);
    }

    #[test]
    fn trial_count_is_capped() {
        let result = run_monte_carlo(
            &sample_household(),
            &EconomicScenario::moderate(),
            &settings(5_000, ReturnModel::Historical, 1),
        )
        .expect("run");
        assert_eq!(result.trials, MAX_TRIALS);
        assert_eq!(result.net_worth.len(), MAX_TRIALS as usize);
    }

    #[test]
    fn zero_trials_is_rejected() {
        let err = run_monte_carlo(
            &sample_household(),
            &EconomicScenario::moderate(),
            &settings(0, ReturnModel::Historical, 1),
        )
        .unwrap_err();
        assert_eq!(err.field(), Some("monteCarlo.trials"));
    }

    #[test]
    fn invalid_household_fails_before_sampling() {
        let mut household = sample_household();
        household.parents[0].current_age = -3;
        let err = run_monte_carlo(
            &household,
            &EconomicScenario::moderate(),
            &settings(10, ReturnModel::Historical, 1),
        )
        .unwrap_err();
        assert_eq!(err.field(), Some("parents[0].currentAge"));
    }

    #[test]
    fn unseeded_run_reports_the_seed_it_used() {
        let household = sample_household();
        let scenario = EconomicScenario::moderate();
        let mut s = settings(8, ReturnModel::Historical, 0);
        s.seed = None;
        let first = run_monte_carlo(&household, &scenario, &s).expect("unseeded");
        let replay = run_monte_carlo(
            &household,
            &scenario,
            &settings(8, ReturnModel::Historical, first.seed),
        )
        .expect("replay");
        assert_eq!(first.net_worth, replay.net_worth);
    }
}
