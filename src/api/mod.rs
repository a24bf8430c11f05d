use axum::{
    Router,
    extract::{
        Json, Query,
        rejection::{JsonRejection, QueryRejection},
    },
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use log::error;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tokio::net::TcpListener;

use crate::core::{
    ChartPoint, LogObserver, ProbabilityBasis, ScenarioKind, SimulationOptions,
    SimulationParameters, SimulationResult, chart_series, predict_net_worth_with,
};

const MAX_YEARS: u32 = 100;
const MAX_SIMULATIONS: u32 = 100_000;
// Month records held in memory at once across all trials.
const MAX_RECORDS: u64 = 12_000_000;

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum CliScenario {
    Pessimistic,
    Realistic,
    Optimistic,
}

impl From<CliScenario> for ScenarioKind {
    fn from(value: CliScenario) -> Self {
        match value {
            CliScenario::Pessimistic => ScenarioKind::Pessimistic,
            CliScenario::Realistic => ScenarioKind::Realistic,
            CliScenario::Optimistic => ScenarioKind::Optimistic,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum CliProbabilityBasis {
    InflationAdjusted,
    Nominal,
}

impl From<CliProbabilityBasis> for ProbabilityBasis {
    fn from(value: CliProbabilityBasis) -> Self {
        match value {
            CliProbabilityBasis::InflationAdjusted => ProbabilityBasis::InflationAdjusted,
            CliProbabilityBasis::Nominal => ProbabilityBasis::Nominal,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum ApiScenario {
    #[serde(alias = "worst")]
    Pessimistic,
    #[serde(alias = "median", alias = "expected")]
    Realistic,
    #[serde(alias = "best")]
    Optimistic,
}

impl From<ApiScenario> for CliScenario {
    fn from(value: ApiScenario) -> Self {
        match value {
            ApiScenario::Pessimistic => CliScenario::Pessimistic,
            ApiScenario::Realistic => CliScenario::Realistic,
            ApiScenario::Optimistic => CliScenario::Optimistic,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum ApiProbabilityBasis {
    #[serde(
        alias = "inflationAdjusted",
        alias = "inflation_adjusted",
        alias = "real"
    )]
    InflationAdjusted,
    Nominal,
}

impl From<ApiProbabilityBasis> for CliProbabilityBasis {
    fn from(value: ApiProbabilityBasis) -> Self {
        match value {
            ApiProbabilityBasis::InflationAdjusted => CliProbabilityBasis::InflationAdjusted,
            ApiProbabilityBasis::Nominal => CliProbabilityBasis::Nominal,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct PredictPayload {
    initial_liquidity: Option<f64>,
    initial_investments: Option<f64>,
    annual_growth_rate: Option<f64>,
    years: Option<u32>,
    monthly_contributions: Option<f64>,
    annual_inflation_rate: Option<f64>,
    volatility: Option<f64>,
    simulations: Option<u32>,
    seed: Option<u64>,
    start_month: Option<NaiveDate>,
    scenario: Option<ApiScenario>,
    probability_basis: Option<ApiProbabilityBasis>,
}

#[derive(Parser, Debug)]
#[command(
    name = "networth",
    about = "Monte Carlo net-worth projection (liquidity + investments, inflation-adjusted scenarios)"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the JSON prediction API.
    Serve {
        #[arg(long, env = "NETWORTH_PORT", default_value_t = 8080)]
        port: u16,
    },
    /// Run one projection and print the JSON response.
    Predict(PredictArgs),
}

#[derive(Args, Debug, Clone)]
pub struct PredictArgs {
    #[arg(long, default_value_t = 5000.0, help = "Starting cash balance")]
    initial_liquidity: f64,
    #[arg(long, default_value_t = 25000.0, help = "Starting invested balance")]
    initial_investments: f64,
    #[arg(
        long,
        default_value_t = 0.07,
        allow_negative_numbers = true,
        help = "Expected annual return as a fraction, e.g. 0.07"
    )]
    annual_growth_rate: f64,
    #[arg(long, default_value_t = 5, help = "Projection horizon in years")]
    years: u32,
    #[arg(
        long,
        default_value_t = 1000.0,
        help = "Amount added to investments every month"
    )]
    monthly_contributions: f64,
    #[arg(
        long,
        default_value_t = 0.02,
        allow_negative_numbers = true,
        help = "Expected annual inflation as a fraction"
    )]
    annual_inflation_rate: f64,
    #[arg(
        long,
        default_value_t = 0.15,
        help = "Annualised standard deviation of returns"
    )]
    volatility: f64,
    #[arg(long, default_value_t = 1000)]
    simulations: u32,
    #[arg(long, help = "Base seed; a random one is drawn when omitted")]
    seed: Option<u64>,
    #[arg(
        long,
        help = "First projected month (YYYY-MM-DD), defaults to the current month"
    )]
    start_month: Option<NaiveDate>,
    #[arg(long, value_enum, default_value_t = CliScenario::Realistic)]
    scenario: CliScenario,
    #[arg(
        long,
        value_enum,
        default_value_t = CliProbabilityBasis::InflationAdjusted,
        help = "Final value compared against the principal for loss/doubling odds"
    )]
    probability_basis: CliProbabilityBasis,
    #[arg(long, help = "Run trials on the current thread only")]
    sequential: bool,
}

#[derive(Debug)]
struct PredictRequest {
    params: SimulationParameters,
    options: SimulationOptions,
    scenario: ScenarioKind,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictResponse {
    selected_scenario: ScenarioKind,
    probability_basis: ProbabilityBasis,
    seed: Option<u64>,
    result: SimulationResult,
    chart: Vec<ChartPoint>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

fn build_request(args: PredictArgs) -> Result<PredictRequest, String> {
    if args.years == 0 || args.years > MAX_YEARS {
        return Err(format!("--years must be between 1 and {MAX_YEARS}"));
    }

    if args.simulations == 0 || args.simulations > MAX_SIMULATIONS {
        return Err(format!(
            "--simulations must be between 1 and {MAX_SIMULATIONS}"
        ));
    }

    let records = u64::from(args.simulations) * u64::from(args.years) * 12;
    if records > MAX_RECORDS {
        return Err(format!(
            "--simulations x --years x 12 must be at most {MAX_RECORDS} (got {records})"
        ));
    }

    for (flag, value) in [
        ("--initial-liquidity", args.initial_liquidity),
        ("--initial-investments", args.initial_investments),
        ("--monthly-contributions", args.monthly_contributions),
        ("--volatility", args.volatility),
    ] {
        if !value.is_finite() || value < 0.0 {
            return Err(format!("{flag} must be a finite value >= 0"));
        }
    }

    if !args.annual_growth_rate.is_finite() || args.annual_growth_rate < -1.0 {
        return Err("--annual-growth-rate must be >= -1".to_string());
    }

    if !args.annual_inflation_rate.is_finite() || args.annual_inflation_rate <= -1.0 {
        return Err("--annual-inflation-rate must be > -1".to_string());
    }

    let params = SimulationParameters {
        initial_liquidity: args.initial_liquidity,
        initial_investments: args.initial_investments,
        annual_growth_rate: args.annual_growth_rate,
        years: args.years,
        monthly_contributions: args.monthly_contributions,
        annual_inflation_rate: args.annual_inflation_rate,
        volatility: args.volatility,
        simulations: args.simulations,
    };
    let options = SimulationOptions {
        seed: args.seed,
        start_month: args.start_month,
        probability_basis: args.probability_basis.into(),
        parallel: !args.sequential,
    };

    Ok(PredictRequest {
        params,
        options,
        scenario: args.scenario.into(),
    })
}

/// Runs one projection for the `predict` command.
pub fn run_predict(args: PredictArgs) -> Result<PredictResponse, String> {
    let request = build_request(args)?;
    simulate(&request)
}

fn simulate(request: &PredictRequest) -> Result<PredictResponse, String> {
    let result = predict_net_worth_with(&request.params, &request.options, &LogObserver)
        .map_err(|e| e.to_string())?;
    Ok(build_predict_response(request, result))
}

fn build_predict_response(
    request: &PredictRequest,
    mut result: SimulationResult,
) -> PredictResponse {
    let chart = chart_series(result.scenarios.get(request.scenario));
    PredictResponse {
        selected_scenario: request.scenario,
        probability_basis: request.options.probability_basis,
        seed: result.seed.take(),
        result,
        chart,
    }
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = router();

    let listener = TcpListener::bind(addr).await?;
    println!("Net worth API listening on http://{addr}");
    println!("Local access: http://127.0.0.1:{port}/api/predict");

    axum::serve(listener, app).await
}

fn router() -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route(
            "/api/predict",
            get(predict_get_handler).post(predict_post_handler),
        )
        .fallback(not_found_handler)
}

async fn health_handler() -> Response {
    json_response(StatusCode::OK, serde_json::json!({ "status": "ok" }))
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn predict_get_handler(
    payload: Result<Query<PredictPayload>, QueryRejection>,
) -> Response {
    match payload {
        Ok(Query(payload)) => predict_handler_impl(payload).await,
        Err(rejection) => error_response(StatusCode::BAD_REQUEST, &rejection.body_text()),
    }
}

async fn predict_post_handler(payload: Result<Json<PredictPayload>, JsonRejection>) -> Response {
    match payload {
        Ok(Json(payload)) => predict_handler_impl(payload).await,
        Err(rejection) => error_response(StatusCode::BAD_REQUEST, &rejection.body_text()),
    }
}

async fn predict_handler_impl(payload: PredictPayload) -> Response {
    let request = match api_request_from_payload(payload) {
        Ok(request) => request,
        Err(msg) => return error_response(StatusCode::BAD_REQUEST, &msg),
    };

    match tokio::task::spawn_blocking(move || simulate(&request)).await {
        Ok(Ok(response)) => json_response(StatusCode::OK, response),
        Ok(Err(msg)) => error_response(StatusCode::BAD_REQUEST, &msg),
        Err(e) => {
            error!("simulation task failed: {e}");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Simulation failed")
        }
    }
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
    );
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

#[cfg(test)]
fn api_request_from_json(json: &str) -> Result<PredictRequest, String> {
    let payload = serde_json::from_str::<PredictPayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    api_request_from_payload(payload)
}

fn api_request_from_payload(payload: PredictPayload) -> Result<PredictRequest, String> {
    let mut args = default_args_for_api();

    if let Some(v) = payload.initial_liquidity {
        args.initial_liquidity = v;
    }
    if let Some(v) = payload.initial_investments {
        args.initial_investments = v;
    }
    if let Some(v) = payload.annual_growth_rate {
        args.annual_growth_rate = v;
    }
    if let Some(v) = payload.years {
        args.years = v;
    }
    if let Some(v) = payload.monthly_contributions {
        args.monthly_contributions = v;
    }
    if let Some(v) = payload.annual_inflation_rate {
        args.annual_inflation_rate = v;
    }
    if let Some(v) = payload.volatility {
        args.volatility = v;
    }
    if let Some(v) = payload.simulations {
        args.simulations = v;
    }
    if let Some(v) = payload.seed {
        args.seed = Some(v);
    }
    if let Some(v) = payload.start_month {
        args.start_month = Some(v);
    }
    if let Some(v) = payload.scenario {
        args.scenario = v.into();
    }
    if let Some(v) = payload.probability_basis {
        args.probability_basis = v.into();
    }

    build_request(args)
}

fn default_args_for_api() -> PredictArgs {
    PredictArgs {
        initial_liquidity: 5_000.0,
        initial_investments: 25_000.0,
        annual_growth_rate: 0.07,
        years: 5,
        monthly_contributions: 1_000.0,
        annual_inflation_rate: 0.02,
        volatility: 0.15,
        simulations: 1_000,
        seed: None,
        start_month: None,
        scenario: CliScenario::Realistic,
        probability_basis: CliProbabilityBasis::InflationAdjusted,
        sequential: false,
    }
}
