use chrono::NaiveDate;
use serde::Serialize;

pub const DEFAULT_ANNUAL_INFLATION_RATE: f64 = 0.02;
pub const DEFAULT_VOLATILITY: f64 = 0.15;
pub const DEFAULT_SIMULATIONS: u32 = 1_000;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScenarioKind {
    Pessimistic,
    Realistic,
    Optimistic,
}

/// Which final value the loss/doubling probabilities compare against the
/// starting principal.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProbabilityBasis {
    /// Final inflation-adjusted total against the undiscounted principal.
    #[default]
    InflationAdjusted,
    /// Final nominal total against the principal.
    Nominal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationParameters {
    pub initial_liquidity: f64,
    pub initial_investments: f64,
    pub annual_growth_rate: f64,
    pub years: u32,
    pub monthly_contributions: f64,
    pub annual_inflation_rate: f64,
    pub volatility: f64,
    pub simulations: u32,
}

impl SimulationParameters {
    pub fn new(
        initial_liquidity: f64,
        initial_investments: f64,
        annual_growth_rate: f64,
        years: u32,
        monthly_contributions: f64,
    ) -> Self {
        Self {
            initial_liquidity,
            initial_investments,
            annual_growth_rate,
            years,
            monthly_contributions,
            annual_inflation_rate: DEFAULT_ANNUAL_INFLATION_RATE,
            volatility: DEFAULT_VOLATILITY,
            simulations: DEFAULT_SIMULATIONS,
        }
    }

    pub fn months(&self) -> usize {
        self.years as usize * 12
    }

    pub fn principal(&self) -> f64 {
        self.initial_liquidity + self.initial_investments
    }
}

impl Default for SimulationParameters {
    fn default() -> Self {
        Self::new(5_000.0, 25_000.0, 0.07, 5, 1_000.0)
    }
}

#[derive(Debug, Clone)]
pub struct SimulationOptions {
    /// Base seed for the per-trial streams; `None` draws one from OS entropy.
    pub seed: Option<u64>,
    /// First month of every trajectory; `None` uses the current local month.
    pub start_month: Option<NaiveDate>,
    pub probability_basis: ProbabilityBasis,
    pub parallel: bool,
}

impl Default for SimulationOptions {
    fn default() -> Self {
        Self {
            seed: None,
            start_month: None,
            probability_basis: ProbabilityBasis::default(),
            parallel: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthRecord {
    pub date_month: NaiveDate,
    pub liquidity: f64,
    pub inflation_adjusted_liquidity: f64,
    pub investments: f64,
    pub inflation_adjusted_investments: f64,
    pub total_invested: f64,
    pub total: f64,
    pub inflation_adjusted_total: f64,
}

pub type Trajectory = Vec<MonthRecord>;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Scenarios {
    pub pessimistic: Trajectory,
    pub realistic: Trajectory,
    pub optimistic: Trajectory,
}

impl Scenarios {
    pub fn get(&self, kind: ScenarioKind) -> &[MonthRecord] {
        match kind {
            ScenarioKind::Pessimistic => &self.pessimistic,
            ScenarioKind::Realistic => &self.realistic,
            ScenarioKind::Optimistic => &self.optimistic,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalValues {
    pub min: f64,
    pub max: f64,
    pub median: f64,
    pub mean: f64,
    pub percentile10: f64,
    pub percentile90: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbabilityAnalysis {
    pub chance_of_loss: f64,
    pub chance_of_doubling: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationResult {
    pub scenarios: Scenarios,
    pub final_values: FinalValues,
    pub probability_analysis: ProbabilityAnalysis,
    /// Base seed the trials were drawn from, set by the Monte Carlo driver.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

pub(crate) fn final_inflation_adjusted_total(trajectory: &[MonthRecord]) -> f64 {
    trajectory
        .last()
        .map(|record| record.inflation_adjusted_total)
        .unwrap_or(0.0)
}
