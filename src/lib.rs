//! Monte Carlo projection of net worth: month-by-month liquidity and
//! investment trajectories under random market returns, ranked into
//! pessimistic, realistic and optimistic scenarios.

pub mod api;
pub mod core;

pub use crate::core::{
    SimulationError, SimulationOptions, SimulationParameters, SimulationResult,
    predict_net_worth, predict_net_worth_with,
};
