use chrono::{Datelike, Local, Months, NaiveDate};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;

use super::error::SimulationError;
use super::observer::{LogObserver, SimulationObserver};
use super::sampler::normal_random;
use super::stats::reduce;
use super::types::{
    MonthRecord, SimulationOptions, SimulationParameters, SimulationResult, Trajectory,
};

const PROGRESS_INTERVAL: u32 = 100;

/// Per-month factors derived once from the annual parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonthlyRates {
    pub growth: f64,
    pub inflation: f64,
    pub volatility: f64,
}

impl MonthlyRates {
    pub fn from_params(params: &SimulationParameters) -> Self {
        Self {
            growth: (1.0 + params.annual_growth_rate).powf(1.0 / 12.0),
            inflation: (1.0 + params.annual_inflation_rate).powf(1.0 / 12.0),
            volatility: params.volatility / 12f64.sqrt(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MonteCarloRun {
    pub seed: u64,
    pub trajectories: Vec<Trajectory>,
}

/// Projects net worth with default options, logging through `log`.
pub fn predict_net_worth(
    params: &SimulationParameters,
) -> Result<SimulationResult, SimulationError> {
    predict_net_worth_with(params, &SimulationOptions::default(), &LogObserver)
}

pub fn predict_net_worth_with(
    params: &SimulationParameters,
    options: &SimulationOptions,
    observer: &dyn SimulationObserver,
) -> Result<SimulationResult, SimulationError> {
    let run = run_monte_carlo(params, options, observer)?;
    let mut result = reduce(&run.trajectories, params, options.probability_basis, observer)?;
    result.seed = Some(run.seed);
    Ok(result)
}

/// Runs `params.simulations` independent trials.
///
/// Trial `k` draws from its own ChaCha stream seeded by `derive_seed(seed, k)`,
/// so the output does not depend on `options.parallel`.
pub fn run_monte_carlo(
    params: &SimulationParameters,
    options: &SimulationOptions,
    observer: &dyn SimulationObserver,
) -> Result<MonteCarloRun, SimulationError> {
    validate_params(params)?;

    let seed = options.seed.unwrap_or_else(rand::random);
    let start_month = first_of_month(options.start_month.unwrap_or_else(current_month));
    let rates = MonthlyRates::from_params(params);
    let total = params.simulations;

    observer.on_start(params, seed);

    let run_trial = |trial: u32| {
        if trial % PROGRESS_INTERVAL == 0 {
            observer.on_progress(trial, total);
        }
        let mut rng = ChaCha8Rng::seed_from_u64(derive_seed(seed, trial));
        simulate_trajectory(params, rates, start_month, &mut rng)
    };

    let trajectories: Vec<Trajectory> = if options.parallel {
        (0..total).into_par_iter().map(run_trial).collect()
    } else {
        (0..total).map(run_trial).collect()
    };

    Ok(MonteCarloRun { seed, trajectories })
}

/// Simulates one trial: `params.months()` records starting at `start_month`.
pub fn simulate_trajectory<R: Rng + ?Sized>(
    params: &SimulationParameters,
    rates: MonthlyRates,
    start_month: NaiveDate,
    rng: &mut R,
) -> Trajectory {
    let months = params.months();
    let mut trajectory = Vec::with_capacity(months);
    if months == 0 {
        return trajectory;
    }

    let mut previous = MonthRecord {
        date_month: start_month,
        liquidity: params.initial_liquidity,
        inflation_adjusted_liquidity: params.initial_liquidity,
        investments: params.initial_investments,
        inflation_adjusted_investments: params.initial_investments,
        total_invested: 0.0,
        total: params.initial_liquidity + params.initial_investments,
        inflation_adjusted_total: params.initial_liquidity + params.initial_investments,
    };
    trajectory.push(previous);

    for _ in 1..months {
        let next = advance_month(&previous, params.monthly_contributions, rates, rng);
        trajectory.push(next);
        previous = next;
    }

    trajectory
}

// The contribution lands after the month's return, so it starts earning one
// month later.
fn advance_month<R: Rng + ?Sized>(
    previous: &MonthRecord,
    contribution: f64,
    rates: MonthlyRates,
    rng: &mut R,
) -> MonthRecord {
    let liquidity = previous.liquidity;
    let monthly_return = normal_random(rng, rates.growth, rates.volatility);
    let investments = previous.investments * monthly_return + contribution;
    let inflation_adjusted_liquidity = previous.inflation_adjusted_liquidity / rates.inflation;
    let inflation_adjusted_investments = investments / rates.inflation;

    MonthRecord {
        date_month: next_month(previous.date_month),
        liquidity,
        inflation_adjusted_liquidity,
        investments,
        inflation_adjusted_investments,
        total_invested: previous.total_invested + contribution,
        total: liquidity + investments,
        inflation_adjusted_total: inflation_adjusted_liquidity + inflation_adjusted_investments,
    }
}

pub fn validate_params(params: &SimulationParameters) -> Result<(), SimulationError> {
    if params.years == 0 {
        return Err(SimulationError::invalid("years", 0.0, "must be > 0"));
    }
    if params.simulations == 0 {
        return Err(SimulationError::invalid("simulations", 0.0, "must be > 0"));
    }

    for (name, value) in [
        ("initialLiquidity", params.initial_liquidity),
        ("initialInvestments", params.initial_investments),
        ("annualGrowthRate", params.annual_growth_rate),
        ("monthlyContributions", params.monthly_contributions),
        ("annualInflationRate", params.annual_inflation_rate),
        ("volatility", params.volatility),
    ] {
        if !value.is_finite() {
            return Err(SimulationError::invalid(name, value, "must be finite"));
        }
    }

    if params.annual_growth_rate < -1.0 {
        return Err(SimulationError::invalid(
            "annualGrowthRate",
            params.annual_growth_rate,
            "must be >= -1",
        ));
    }
    if params.annual_inflation_rate <= -1.0 {
        return Err(SimulationError::invalid(
            "annualInflationRate",
            params.annual_inflation_rate,
            "must be > -1",
        ));
    }
    if params.volatility < 0.0 {
        return Err(SimulationError::invalid(
            "volatility",
            params.volatility,
            "must be >= 0",
        ));
    }

    Ok(())
}

fn current_month() -> NaiveDate {
    Local::now().date_naive()
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

// Saturates at chrono's last representable month.
fn next_month(date: NaiveDate) -> NaiveDate {
    date.checked_add_months(Months::new(1)).unwrap_or(date)
}

fn derive_seed(base_seed: u64, trial: u32) -> u64 {
    splitmix64(base_seed ^ (((trial as u64) << 32) | trial as u64))
}

fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E3779B97F4A7C15);
    let mut z = x;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
    z ^ (z >> 31)
}
