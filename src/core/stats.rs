use super::error::SimulationError;
use super::observer::SimulationObserver;
use super::types::{
    FinalValues, MonthRecord, ProbabilityAnalysis, ProbabilityBasis, Scenarios,
    SimulationParameters, SimulationResult, Trajectory, final_inflation_adjusted_total,
};

const PESSIMISTIC_RANK: f64 = 0.10;
const REALISTIC_RANK: f64 = 0.50;
const OPTIMISTIC_RANK: f64 = 0.90;

/// Ranks trials by final inflation-adjusted total and summarises them.
///
/// The input slice is left in its original order; ranking works on a
/// separate list of `(index, final value)` pairs.
pub fn reduce(
    trajectories: &[Trajectory],
    params: &SimulationParameters,
    basis: ProbabilityBasis,
    observer: &dyn SimulationObserver,
) -> Result<SimulationResult, SimulationError> {
    if trajectories.is_empty() {
        return Err(SimulationError::invalid(
            "simulations",
            0.0,
            "at least one trajectory is required",
        ));
    }

    let mut ranked: Vec<(usize, f64)> = trajectories
        .iter()
        .enumerate()
        .map(|(idx, trajectory)| (idx, final_inflation_adjusted_total(trajectory)))
        .collect();
    ranked.sort_by(|a, b| a.1.total_cmp(&b.1));

    let sorted_finals: Vec<f64> = ranked.iter().map(|&(_, value)| value).collect();
    let scenario_at = |p: f64| trajectories[ranked[rank_index(ranked.len(), p)].0].clone();

    let scenarios = Scenarios {
        pessimistic: scenario_at(PESSIMISTIC_RANK),
        realistic: scenario_at(REALISTIC_RANK),
        optimistic: scenario_at(OPTIMISTIC_RANK),
    };

    check_scenario_order(
        final_inflation_adjusted_total(&scenarios.pessimistic),
        final_inflation_adjusted_total(&scenarios.realistic),
        final_inflation_adjusted_total(&scenarios.optimistic),
        observer,
    );

    let final_values = FinalValues {
        min: sorted_finals[0],
        max: sorted_finals[sorted_finals.len() - 1],
        median: percentile(&sorted_finals, 0.5),
        mean: sorted_finals.iter().sum::<f64>() / sorted_finals.len() as f64,
        percentile10: percentile(&sorted_finals, 0.1),
        percentile90: percentile(&sorted_finals, 0.9),
    };

    let probability_analysis = match basis {
        ProbabilityBasis::InflationAdjusted => probability_analysis(&sorted_finals, params),
        ProbabilityBasis::Nominal => {
            let nominal_finals: Vec<f64> = trajectories
                .iter()
                .map(|trajectory| final_nominal_total(trajectory))
                .collect();
            probability_analysis(&nominal_finals, params)
        }
    };

    Ok(SimulationResult {
        scenarios,
        final_values,
        probability_analysis,
        seed: None,
    })
}

/// `sorted[floor(n * p)]`, the nearest-rank rule used for both scenario
/// selection and the reported percentiles.
pub fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    sorted[rank_index(sorted.len(), p)]
}

// Advisory only. Selection by `total_cmp` rank keeps the finals ordered, so
// this does not fire for anything `reduce` picks itself.
fn check_scenario_order(
    pessimistic: f64,
    realistic: f64,
    optimistic: f64,
    observer: &dyn SimulationObserver,
) {
    if pessimistic > realistic || realistic > optimistic {
        observer.on_ordering_anomaly(pessimistic, realistic, optimistic);
    }
}

fn rank_index(n: usize, p: f64) -> usize {
    ((n as f64 * p).floor() as usize).min(n - 1)
}

fn probability_analysis(finals: &[f64], params: &SimulationParameters) -> ProbabilityAnalysis {
    let principal = params.principal();
    let n = finals.len() as f64;
    let losses = finals.iter().filter(|&&v| v < principal).count();
    let doublings = finals.iter().filter(|&&v| v >= principal * 2.0).count();

    ProbabilityAnalysis {
        chance_of_loss: losses as f64 / n,
        chance_of_doubling: doublings as f64 / n,
    }
}

fn final_nominal_total(trajectory: &[MonthRecord]) -> f64 {
    trajectory.last().map(|record| record.total).unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::observer::LogObserver;
    use crate::core::observer::testing::RecordingObserver;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn record(nominal: f64, real: f64) -> MonthRecord {
        MonthRecord {
            date_month: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            liquidity: 0.0,
            inflation_adjusted_liquidity: 0.0,
            investments: nominal,
            inflation_adjusted_investments: real,
            total_invested: 0.0,
            total: nominal,
            inflation_adjusted_total: real,
        }
    }

    fn trajectory_ending_at(real: f64) -> Trajectory {
        vec![record(100.0, 100.0), record(real, real)]
    }

    fn params_with_principal(principal: f64) -> SimulationParameters {
        let mut params = SimulationParameters::new(0.0, principal, 0.0, 1, 0.0);
        params.simulations = 10;
        params
    }

    #[test]
    fn scenarios_are_selected_by_rank_of_final_value() {
        // Finals 1..=10 in scrambled order.
        let finals = [7.0, 3.0, 10.0, 1.0, 5.0, 9.0, 2.0, 8.0, 4.0, 6.0];
        let trajectories: Vec<Trajectory> =
            finals.iter().map(|&v| trajectory_ending_at(v)).collect();
        let observer = RecordingObserver::default();

        let result = reduce(
            &trajectories,
            &params_with_principal(5.0),
            ProbabilityBasis::InflationAdjusted,
            &observer,
        )
        .unwrap();

        assert_eq!(final_inflation_adjusted_total(&result.scenarios.pessimistic), 2.0);
        assert_eq!(final_inflation_adjusted_total(&result.scenarios.realistic), 6.0);
        assert_eq!(final_inflation_adjusted_total(&result.scenarios.optimistic), 10.0);

        assert_eq!(result.final_values.min, 1.0);
        assert_eq!(result.final_values.max, 10.0);
        assert_eq!(result.final_values.percentile10, 2.0);
        assert_eq!(result.final_values.median, 6.0);
        assert_eq!(result.final_values.percentile90, 10.0);
        assert_relative_eq!(result.final_values.mean, 5.5);

        // Below 5: 1,2,3,4. At least 10: 10.
        assert_relative_eq!(result.probability_analysis.chance_of_loss, 0.4);
        assert_relative_eq!(result.probability_analysis.chance_of_doubling, 0.1);
        assert!(observer.anomalies.lock().unwrap().is_empty());
        assert_eq!(result.seed, None);
    }

    #[test]
    fn input_order_is_left_untouched() {
        let finals = [3.0, 1.0, 2.0];
        let trajectories: Vec<Trajectory> =
            finals.iter().map(|&v| trajectory_ending_at(v)).collect();
        let before = trajectories.clone();

        reduce(
            &trajectories,
            &params_with_principal(1.0),
            ProbabilityBasis::InflationAdjusted,
            &RecordingObserver::default(),
        )
        .unwrap();

        assert_eq!(trajectories, before);
    }

    #[test]
    fn single_trajectory_collapses_all_scenarios() {
        let trajectories = vec![trajectory_ending_at(42.0)];
        let result = reduce(
            &trajectories,
            &params_with_principal(10.0),
            ProbabilityBasis::InflationAdjusted,
            &RecordingObserver::default(),
        )
        .unwrap();

        assert_eq!(result.scenarios.pessimistic, result.scenarios.realistic);
        assert_eq!(result.scenarios.realistic, result.scenarios.optimistic);
        assert_eq!(result.final_values.min, 42.0);
        assert_eq!(result.final_values.max, 42.0);
        assert_eq!(result.final_values.median, 42.0);
        assert_eq!(result.final_values.mean, 42.0);
    }

    #[test]
    fn nominal_basis_compares_nominal_totals() {
        // Nominal final 150 on a principal of 100, but only 90 in real terms.
        let trajectories = vec![vec![record(100.0, 100.0), record(150.0, 90.0)]];
        let params = params_with_principal(100.0);

        let literal = reduce(
            &trajectories,
            &params,
            ProbabilityBasis::InflationAdjusted,
            &RecordingObserver::default(),
        )
        .unwrap();
        let nominal = reduce(
            &trajectories,
            &params,
            ProbabilityBasis::Nominal,
            &RecordingObserver::default(),
        )
        .unwrap();

        assert_eq!(literal.probability_analysis.chance_of_loss, 1.0);
        assert_eq!(nominal.probability_analysis.chance_of_loss, 0.0);
        // Summary statistics stay on the inflation-adjusted values either way.
        assert_eq!(nominal.final_values.median, 90.0);
    }

    #[test]
    fn doubling_threshold_is_inclusive() {
        let trajectories = vec![trajectory_ending_at(200.0), trajectory_ending_at(199.0)];
        let result = reduce(
            &trajectories,
            &params_with_principal(100.0),
            ProbabilityBasis::InflationAdjusted,
            &RecordingObserver::default(),
        )
        .unwrap();
        assert_eq!(result.probability_analysis.chance_of_doubling, 0.5);
        assert_eq!(result.probability_analysis.chance_of_loss, 0.0);
    }

    #[test]
    fn empty_population_is_rejected() {
        let err = reduce(
            &[],
            &params_with_principal(1.0),
            ProbabilityBasis::InflationAdjusted,
            &RecordingObserver::default(),
        )
        .expect_err("no trajectories");
        assert_eq!(err.parameter(), "simulations");
    }

    #[test]
    fn percentile_uses_nearest_rank_floor() {
        let sorted = [10.0, 20.0, 30.0, 40.0];
        assert_eq!(percentile(&sorted, 0.1), 10.0);
        assert_eq!(percentile(&sorted, 0.5), 30.0);
        assert_eq!(percentile(&sorted, 0.9), 40.0);
        assert_eq!(percentile(&[], 0.5), 0.0);
    }

    #[test]
    fn out_of_order_scenarios_are_reported_without_failing() {
        let observer = RecordingObserver::default();
        check_scenario_order(30.0, 20.0, 40.0, &observer);
        check_scenario_order(10.0, 20.0, 15.0, &observer);
        check_scenario_order(10.0, 10.0, 10.0, &observer);
        assert_eq!(
            *observer.anomalies.lock().unwrap(),
            vec![(30.0, 20.0, 40.0), (10.0, 20.0, 15.0)]
        );

        // The log-backed observer only warns.
        check_scenario_order(3.0, 2.0, 1.0, &LogObserver);
    }
}
