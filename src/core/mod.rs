mod chart;
mod engine;
mod error;
mod observer;
mod sampler;
mod stats;
mod types;

pub use chart::{ChartPoint, chart_series};
pub use engine::{
    MonteCarloRun, MonthlyRates, predict_net_worth, predict_net_worth_with, run_monte_carlo,
    simulate_trajectory, validate_params,
};
pub use error::SimulationError;
pub use observer::{LogObserver, NoopObserver, SimulationObserver};
pub use sampler::{BoxMuller, normal_random};
pub use stats::{percentile, reduce};
pub use types::{
    DEFAULT_ANNUAL_INFLATION_RATE, DEFAULT_SIMULATIONS, DEFAULT_VOLATILITY, FinalValues,
    MonthRecord, ProbabilityAnalysis, ProbabilityBasis, ScenarioKind, Scenarios,
    SimulationOptions, SimulationParameters, SimulationResult, Trajectory,
};
