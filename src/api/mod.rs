use axum::{
    Router,
    extract::{Json, Query},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::net::SocketAddr;
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

use crate::core::{
    Asset, Comparison, EnrichedParameters, Inputs, LineItem, MoveCostPolicy, RecurringItem,
    SimulationError, SimulationResult, buy_case, enrich, rent_case, simulate, summarize,
};

const EXTRA_ITEM_COLOR: &str = "#64748b";

#[derive(Debug, Error)]
pub enum ParameterError {
    #[error("{0}")]
    Invalid(String),

    #[error("invalid JSON payload: {0}")]
    Json(String),
}

#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Args(#[from] clap::Error),

    #[error(transparent)]
    Parameters(#[from] ParameterError),

    #[error(transparent)]
    Simulation(#[from] SimulationError),

    #[error("failed to encode output: {0}")]
    Encode(#[from] serde_json::Error),
}

fn invalid(msg: impl Into<String>) -> ParameterError {
    ParameterError::Invalid(msg.into())
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliMoveCostPolicy {
    LumpSum,
    Averaged,
}

impl From<CliMoveCostPolicy> for MoveCostPolicy {
    fn from(value: CliMoveCostPolicy) -> Self {
        match value {
            CliMoveCostPolicy::LumpSum => MoveCostPolicy::LumpSum,
            CliMoveCostPolicy::Averaged => MoveCostPolicy::Averaged,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum ApiMoveCostPolicy {
    #[serde(alias = "lumpSum", alias = "lump_sum", alias = "lump")]
    LumpSum,
    #[serde(alias = "average", alias = "spread")]
    Averaged,
}

impl From<ApiMoveCostPolicy> for CliMoveCostPolicy {
    fn from(value: ApiMoveCostPolicy) -> Self {
        match value {
            ApiMoveCostPolicy::LumpSum => CliMoveCostPolicy::LumpSum,
            ApiMoveCostPolicy::Averaged => CliMoveCostPolicy::Averaged,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExtraItemPayload {
    key: String,
    label: Option<String>,
    color: Option<String>,
    amount: f64,
    // percent
    growth: Option<f64>,
    asset: Option<Asset>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct SimulatePayload {
    num_years: Option<u32>,
    initial_savings: Option<f64>,

    property_price: Option<f64>,
    deposit: Option<f64>,
    interest_rate: Option<f64>,
    loan_term: Option<u32>,
    first_home_buyer: Option<bool>,
    capitalise_lmi: Option<bool>,
    legal_costs: Option<f64>,

    property_growth: Option<f64>,
    council_rates: Option<f64>,
    strata_fees: Option<f64>,
    home_insurance: Option<f64>,
    maintenance: Option<f64>,
    cost_inflation: Option<f64>,
    selling_agent: Option<f64>,

    weekly_rent: Option<f64>,
    rent_growth: Option<f64>,
    contents_insurance: Option<f64>,

    investment_return: Option<f64>,
    investment_tax: Option<f64>,

    removalist_cost: Option<f64>,
    rent_overlap_weeks: Option<f64>,
    move_interval: Option<i32>,
    move_cost_policy: Option<ApiMoveCostPolicy>,

    buy_extras: Option<Vec<ExtraItemPayload>>,
    rent_extras: Option<Vec<ExtraItemPayload>>,
}

#[derive(Parser, Debug, Clone, PartialEq)]
#[command(
    name = "rentbuy",
    about = "Year-by-year net worth of buying a home against renting and investing the difference"
)]
struct Cli {
    #[arg(long, default_value_t = 30, help = "Number of years to project")]
    num_years: u32,
    #[arg(
        long,
        default_value_t = 250000.0,
        help = "Cash available today, identical for both strategies"
    )]
    initial_savings: f64,
    #[arg(long, default_value_t = 900000.0)]
    property_price: f64,
    #[arg(long, default_value_t = 20.0, help = "Deposit in percent of the price")]
    deposit: f64,
    #[arg(
        long,
        default_value_t = 6.0,
        help = "Mortgage interest rate in percent"
    )]
    interest_rate: f64,
    #[arg(long, default_value_t = 30)]
    loan_term_years: u32,
    #[arg(long, help = "Apply the first home buyer transfer duty concession")]
    first_home_buyer: bool,
    #[arg(
        long,
        default_value_t = true,
        action = clap::ArgAction::Set,
        help = "Add mortgage insurance to the loan instead of paying it upfront"
    )]
    capitalise_lmi: bool,
    #[arg(long, default_value_t = 2500.0, help = "Conveyancing costs per purchase")]
    legal_costs: f64,
    #[arg(
        long,
        default_value_t = 4.0,
        allow_negative_numbers = true,
        help = "Annual property price growth in percent"
    )]
    property_growth_rate: f64,
    #[arg(long, default_value_t = 2000.0, help = "Annual council rates in today's money")]
    council_rates: f64,
    #[arg(long, default_value_t = 0.0, help = "Annual strata levies in today's money")]
    strata_fees: f64,
    #[arg(long, default_value_t = 1800.0, help = "Annual building insurance in today's money")]
    home_insurance: f64,
    #[arg(
        long,
        default_value_t = 1.0,
        help = "Annual maintenance in percent of the property's current value"
    )]
    maintenance_rate: f64,
    #[arg(
        long,
        default_value_t = 3.0,
        allow_negative_numbers = true,
        help = "Annual growth of owner and moving costs in percent"
    )]
    cost_inflation_rate: f64,
    #[arg(
        long,
        default_value_t = 2.0,
        help = "Selling agent commission in percent of the sale price"
    )]
    selling_agent_rate: f64,
    #[arg(long, default_value_t = 650.0)]
    weekly_rent: f64,
    #[arg(
        long,
        default_value_t = 3.5,
        allow_negative_numbers = true,
        help = "Annual rent growth in percent"
    )]
    rent_growth_rate: f64,
    #[arg(long, default_value_t = 400.0, help = "Annual renter's contents insurance")]
    contents_insurance: f64,
    #[arg(
        long,
        default_value_t = 7.0,
        allow_negative_numbers = true,
        help = "Annual return on invested cash in percent"
    )]
    investment_return_rate: f64,
    #[arg(
        long,
        default_value_t = 0.0,
        help = "Tax on investment returns in percent"
    )]
    investment_tax_rate: f64,
    #[arg(long, default_value_t = 2000.0, help = "Removalist cost per move")]
    removalist_cost: f64,
    #[arg(
        long,
        default_value_t = 1.0,
        help = "Weeks of double rent paid when moving between rentals"
    )]
    rent_overlap_weeks: f64,
    #[arg(
        long,
        default_value_t = 10,
        allow_negative_numbers = true,
        help = "Years between moves; 0, negative, or beyond the horizon disables moving"
    )]
    move_interval_years: i32,
    #[arg(long, value_enum, default_value_t = CliMoveCostPolicy::LumpSum)]
    move_cost_policy: CliMoveCostPolicy,
}

#[derive(Debug)]
struct ApiRequest {
    inputs: Inputs,
    buy_extras: Vec<RecurringItem>,
    rent_extras: Vec<RecurringItem>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulateResponse {
    pub params: EnrichedParameters,
    #[serde(flatten)]
    pub result: SimulationResult,
    pub comparison: Option<Comparison>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

fn build_inputs(cli: Cli) -> Result<Inputs, ParameterError> {
    if !(1..=100).contains(&cli.num_years) {
        return Err(invalid("--num-years must be between 1 and 100"));
    }

    if !cli.initial_savings.is_finite() || cli.initial_savings < 0.0 {
        return Err(invalid("--initial-savings must be >= 0"));
    }

    if !cli.property_price.is_finite() || cli.property_price <= 0.0 {
        return Err(invalid("--property-price must be > 0"));
    }

    if !(1..=50).contains(&cli.loan_term_years) {
        return Err(invalid("--loan-term-years must be between 1 and 50"));
    }

    if !cli.weekly_rent.is_finite() || cli.weekly_rent < 0.0 {
        return Err(invalid("--weekly-rent must be >= 0"));
    }

    if !(0.0..=52.0).contains(&cli.rent_overlap_weeks) {
        return Err(invalid("--rent-overlap-weeks must be between 0 and 52"));
    }

    for (name, rate) in [
        ("--deposit", cli.deposit),
        ("--interest-rate", cli.interest_rate),
        ("--maintenance-rate", cli.maintenance_rate),
        ("--selling-agent-rate", cli.selling_agent_rate),
        ("--investment-tax-rate", cli.investment_tax_rate),
    ] {
        if !(0.0..=100.0).contains(&rate) {
            return Err(invalid(format!("{name} must be between 0 and 100")));
        }
    }

    for (name, rate) in [
        ("--property-growth-rate", cli.property_growth_rate),
        ("--cost-inflation-rate", cli.cost_inflation_rate),
        ("--rent-growth-rate", cli.rent_growth_rate),
        ("--investment-return-rate", cli.investment_return_rate),
    ] {
        if !rate.is_finite() || rate <= -100.0 {
            return Err(invalid(format!("{name} must be > -100")));
        }
    }

    for (name, cost) in [
        ("--legal-costs", cli.legal_costs),
        ("--council-rates", cli.council_rates),
        ("--strata-fees", cli.strata_fees),
        ("--home-insurance", cli.home_insurance),
        ("--contents-insurance", cli.contents_insurance),
        ("--removalist-cost", cli.removalist_cost),
    ] {
        if !cost.is_finite() || cost < 0.0 {
            return Err(invalid(format!("{name} must be >= 0")));
        }
    }

    let inputs = Inputs {
        num_years: cli.num_years,
        initial_savings: cli.initial_savings,
        property_price: cli.property_price,
        deposit_rate: cli.deposit / 100.0,
        interest_rate: cli.interest_rate / 100.0,
        loan_term_years: cli.loan_term_years,
        first_home_buyer: cli.first_home_buyer,
        capitalise_lmi: cli.capitalise_lmi,
        legal_costs: cli.legal_costs,
        property_growth_rate: cli.property_growth_rate / 100.0,
        council_rates: cli.council_rates,
        strata_fees: cli.strata_fees,
        home_insurance: cli.home_insurance,
        maintenance_rate: cli.maintenance_rate / 100.0,
        cost_inflation_rate: cli.cost_inflation_rate / 100.0,
        selling_agent_rate: cli.selling_agent_rate / 100.0,
        weekly_rent: cli.weekly_rent,
        rent_growth_rate: cli.rent_growth_rate / 100.0,
        contents_insurance: cli.contents_insurance,
        investment_return_rate: cli.investment_return_rate / 100.0,
        investment_tax_rate: cli.investment_tax_rate / 100.0,
        removalist_cost: cli.removalist_cost,
        rent_overlap_weeks: cli.rent_overlap_weeks,
        move_interval_years: cli.move_interval_years,
        move_cost_policy: cli.move_cost_policy.into(),
    };

    let params = enrich(&inputs);
    if params.buy_invested_start < 0.0 {
        return Err(invalid(format!(
            "--initial-savings must cover the deposit and upfront purchase costs ({:.0} needed)",
            params.deposit + params.upfront_buy_costs
        )));
    }

    Ok(inputs)
}

fn build_extra_items(
    name: &str,
    extras: Vec<ExtraItemPayload>,
) -> Result<Vec<RecurringItem>, ParameterError> {
    extras
        .into_iter()
        .map(|extra| {
            if extra.key.trim().is_empty() {
                return Err(invalid(format!("{name} keys must not be empty")));
            }
            if !extra.amount.is_finite() {
                return Err(invalid(format!("{name}.{} amount must be finite", extra.key)));
            }
            let growth = extra.growth.unwrap_or(0.0);
            if !growth.is_finite() || growth <= -100.0 {
                return Err(invalid(format!("{name}.{} growth must be > -100", extra.key)));
            }
            Ok(RecurringItem {
                label: extra.label.unwrap_or_else(|| extra.key.clone()),
                color: extra
                    .color
                    .unwrap_or_else(|| EXTRA_ITEM_COLOR.to_string()),
                key: extra.key,
                amount: extra.amount,
                growth_rate: growth / 100.0,
                asset: extra.asset,
            })
        })
        .collect()
}

pub fn run_cli<I, T>(args: I) -> Result<String, RunError>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = Cli::try_parse_from(args)?;
    let request = ApiRequest {
        inputs: build_inputs(cli)?,
        buy_extras: Vec::new(),
        rent_extras: Vec::new(),
    };
    let response = build_simulate_response(&request)?;
    Ok(serde_json::to_string_pretty(&response)?)
}

fn router() -> Router {
    Router::new()
        .route(
            "/api/simulate",
            get(simulate_get_handler).post(simulate_post_handler),
        )
        .route("/api/defaults", get(defaults_handler))
        .fallback(not_found_handler)
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "rent-vs-buy API listening");
    info!("local access: http://127.0.0.1:{port}/api/simulate");

    axum::serve(listener, router()).await
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn defaults_handler() -> Response {
    match build_inputs(default_cli_for_api()) {
        Ok(inputs) => json_response(StatusCode::OK, enrich(&inputs)),
        Err(err) => error_response(StatusCode::INTERNAL_SERVER_ERROR, &err.to_string()),
    }
}

async fn simulate_get_handler(Query(payload): Query<SimulatePayload>) -> Response {
    simulate_handler_impl(payload).await
}

async fn simulate_post_handler(Json(payload): Json<SimulatePayload>) -> Response {
    simulate_handler_impl(payload).await
}

async fn simulate_handler_impl(payload: SimulatePayload) -> Response {
    let request = match api_request_from_payload(payload) {
        Ok(request) => request,
        Err(err) => {
            warn!(%err, "rejected simulate request");
            return error_response(StatusCode::BAD_REQUEST, &err.to_string());
        }
    };

    match build_simulate_response(&request) {
        Ok(response) => json_response(StatusCode::OK, response),
        Err(err) => {
            warn!(%err, "simulation refused case set");
            error_response(StatusCode::UNPROCESSABLE_ENTITY, &err.to_string())
        }
    }
}

fn with_cache_control<R: IntoResponse>(response: R) -> Response {
    let mut response = response.into_response();
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    with_cache_control((status, Json(body)))
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
fn api_request_from_json(json: &str) -> Result<ApiRequest, ParameterError> {
    let payload = serde_json::from_str::<SimulatePayload>(json)
        .map_err(|e| ParameterError::Json(e.to_string()))?;
    api_request_from_payload(payload)
}

fn api_request_from_payload(payload: SimulatePayload) -> Result<ApiRequest, ParameterError> {
    let mut cli = default_cli_for_api();

    if let Some(v) = payload.num_years {
        cli.num_years = v;
    }
    if let Some(v) = payload.initial_savings {
        cli.initial_savings = v;
    }

    if let Some(v) = payload.property_price {
        cli.property_price = v;
    }
    if let Some(v) = payload.deposit {
        cli.deposit = v;
    }
    if let Some(v) = payload.interest_rate {
        cli.interest_rate = v;
    }
    if let Some(v) = payload.loan_term {
        cli.loan_term_years = v;
    }
    if let Some(v) = payload.first_home_buyer {
        cli.first_home_buyer = v;
    }
    if let Some(v) = payload.capitalise_lmi {
        cli.capitalise_lmi = v;
    }
    if let Some(v) = payload.legal_costs {
        cli.legal_costs = v;
    }

    if let Some(v) = payload.property_growth {
        cli.property_growth_rate = v;
    }
    if let Some(v) = payload.council_rates {
        cli.council_rates = v;
    }
    if let Some(v) = payload.strata_fees {
        cli.strata_fees = v;
    }
    if let Some(v) = payload.home_insurance {
        cli.home_insurance = v;
    }
    if let Some(v) = payload.maintenance {
        cli.maintenance_rate = v;
    }
    if let Some(v) = payload.cost_inflation {
        cli.cost_inflation_rate = v;
    }
    if let Some(v) = payload.selling_agent {
        cli.selling_agent_rate = v;
    }

    if let Some(v) = payload.weekly_rent {
        cli.weekly_rent = v;
    }
    if let Some(v) = payload.rent_growth {
        cli.rent_growth_rate = v;
    }
    if let Some(v) = payload.contents_insurance {
        cli.contents_insurance = v;
    }

    if let Some(v) = payload.investment_return {
        cli.investment_return_rate = v;
    }
    if let Some(v) = payload.investment_tax {
        cli.investment_tax_rate = v;
    }

    if let Some(v) = payload.removalist_cost {
        cli.removalist_cost = v;
    }
    if let Some(v) = payload.rent_overlap_weeks {
        cli.rent_overlap_weeks = v;
    }
    if let Some(v) = payload.move_interval {
        cli.move_interval_years = v;
    }
    if let Some(v) = payload.move_cost_policy {
        cli.move_cost_policy = v.into();
    }

    let inputs = build_inputs(cli)?;
    let buy_extras = build_extra_items("buyExtras", payload.buy_extras.unwrap_or_default())?;
    let rent_extras = build_extra_items("rentExtras", payload.rent_extras.unwrap_or_default())?;

    Ok(ApiRequest {
        inputs,
        buy_extras,
        rent_extras,
    })
}

fn default_cli_for_api() -> Cli {
    Cli {
        num_years: 30,
        initial_savings: 250_000.0,
        property_price: 900_000.0,
        deposit: 20.0,
        interest_rate: 6.0,
        loan_term_years: 30,
        first_home_buyer: false,
        capitalise_lmi: true,
        legal_costs: 2_500.0,
        property_growth_rate: 4.0,
        council_rates: 2_000.0,
        strata_fees: 0.0,
        home_insurance: 1_800.0,
        maintenance_rate: 1.0,
        cost_inflation_rate: 3.0,
        selling_agent_rate: 2.0,
        weekly_rent: 650.0,
        rent_growth_rate: 3.5,
        contents_insurance: 400.0,
        investment_return_rate: 7.0,
        investment_tax_rate: 0.0,
        removalist_cost: 2_000.0,
        rent_overlap_weeks: 1.0,
        move_interval_years: 10,
        move_cost_policy: CliMoveCostPolicy::LumpSum,
    }
}

fn build_simulate_response(request: &ApiRequest) -> Result<SimulateResponse, SimulationError> {
    let params = enrich(&request.inputs);
    let cases = [
        buy_case().with_extra_items(request.buy_extras.iter().cloned().map(LineItem::Recurring)),
        rent_case().with_extra_items(request.rent_extras.iter().cloned().map(LineItem::Recurring)),
    ];

    let result = simulate(&params, &cases)?;
    let comparison = summarize(&result);
    if let Some(comparison) = &comparison {
        debug!(
            winner = %comparison.winner_key,
            margin = comparison.margin,
            "comparison complete"
        );
    }

    Ok(SimulateResponse {
        params,
        result,
        comparison,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{BUY_KEY, RENT_KEY, SURPLUS_KEY};

    const EPS: f64 = 1e-6;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn sample_cli() -> Cli {
        default_cli_for_api()
    }

    fn sample_request() -> ApiRequest {
        ApiRequest {
            inputs: build_inputs(sample_cli()).expect("valid inputs"),
            buy_extras: Vec::new(),
            rent_extras: Vec::new(),
        }
    }

    #[test]
    fn api_defaults_match_cli_defaults() {
        let parsed = Cli::try_parse_from(["rentbuy"]).expect("defaults parse");
        assert_eq!(parsed, default_cli_for_api());
    }

    #[test]
    fn cli_flags_override_defaults() {
        let parsed = Cli::try_parse_from([
            "rentbuy",
            "--first-home-buyer",
            "--capitalise-lmi",
            "false",
            "--move-interval-years",
            "-1",
            "--move-cost-policy",
            "averaged",
            "--property-growth-rate",
            "-2.5",
        ])
        .expect("flags parse");

        assert!(parsed.first_home_buyer);
        assert!(!parsed.capitalise_lmi);
        assert_eq!(parsed.move_interval_years, -1);
        assert_eq!(parsed.move_cost_policy, CliMoveCostPolicy::Averaged);
        assert_approx(parsed.property_growth_rate, -2.5);
    }

    #[test]
    fn build_inputs_converts_percentages() {
        let inputs = build_inputs(sample_cli()).expect("valid inputs");

        assert_approx(inputs.deposit_rate, 0.20);
        assert_approx(inputs.interest_rate, 0.06);
        assert_approx(inputs.property_growth_rate, 0.04);
        assert_approx(inputs.maintenance_rate, 0.01);
        assert_approx(inputs.rent_growth_rate, 0.035);
        assert_approx(inputs.investment_return_rate, 0.07);
        assert_approx(inputs.weekly_rent, 650.0);
        assert_eq!(inputs.move_cost_policy, MoveCostPolicy::LumpSum);
    }

    #[test]
    fn build_inputs_rejects_out_of_range_values() {
        let cases: [(fn(&mut Cli), &str); 7] = [
            (|cli| cli.num_years = 0, "--num-years"),
            (|cli| cli.deposit = 120.0, "--deposit"),
            (|cli| cli.property_price = 0.0, "--property-price"),
            (|cli| cli.rent_growth_rate = -100.0, "--rent-growth-rate"),
            (|cli| cli.council_rates = f64::NAN, "--council-rates"),
            (|cli| cli.loan_term_years = 0, "--loan-term-years"),
            (|cli| cli.rent_overlap_weeks = 60.0, "--rent-overlap-weeks"),
        ];

        for (mutate, flag) in cases {
            let mut cli = sample_cli();
            mutate(&mut cli);
            let err = build_inputs(cli).expect_err("must reject");
            assert!(err.to_string().contains(flag), "{err} should mention {flag}");
        }
    }

    #[test]
    fn build_inputs_requires_savings_to_cover_purchase() {
        let mut cli = sample_cli();
        cli.initial_savings = 100_000.0;

        let err = build_inputs(cli).expect_err("deposit alone exceeds savings");
        assert!(err.to_string().contains("--initial-savings"));
    }

    #[test]
    fn api_request_from_json_parses_web_keys() {
        let json = r#"{
          "numYears": 25,
          "initialSavings": 300000,
          "propertyPrice": 850000,
          "deposit": 25,
          "interestRate": 5.5,
          "loanTerm": 25,
          "firstHomeBuyer": true,
          "capitaliseLmi": false,
          "propertyGrowth": 3,
          "weeklyRent": 600,
          "rentGrowth": 4,
          "investmentReturn": 6,
          "investmentTax": 30,
          "moveInterval": 5,
          "moveCostPolicy": "averaged",
          "rentExtras": [
            { "key": "parking", "label": "Parking", "amount": -1200, "growth": 3 }
          ],
          "buyExtras": [
            { "key": "solarSavings", "amount": 900, "asset": "investedSurplus" }
          ]
        }"#;
        let request = api_request_from_json(json).expect("json should parse");
        let inputs = request.inputs;

        assert_eq!(inputs.num_years, 25);
        assert_approx(inputs.initial_savings, 300_000.0);
        assert_approx(inputs.property_price, 850_000.0);
        assert_approx(inputs.deposit_rate, 0.25);
        assert_approx(inputs.interest_rate, 0.055);
        assert_eq!(inputs.loan_term_years, 25);
        assert!(inputs.first_home_buyer);
        assert!(!inputs.capitalise_lmi);
        assert_approx(inputs.property_growth_rate, 0.03);
        assert_approx(inputs.weekly_rent, 600.0);
        assert_approx(inputs.rent_growth_rate, 0.04);
        assert_approx(inputs.investment_return_rate, 0.06);
        assert_approx(inputs.investment_tax_rate, 0.30);
        assert_eq!(inputs.move_interval_years, 5);
        assert_eq!(inputs.move_cost_policy, MoveCostPolicy::Averaged);

        assert_eq!(request.rent_extras.len(), 1);
        assert_eq!(request.rent_extras[0].label, "Parking");
        assert_approx(request.rent_extras[0].growth_rate, 0.03);
        assert_eq!(request.buy_extras[0].label, "solarSavings");
        assert_eq!(request.buy_extras[0].color, EXTRA_ITEM_COLOR);
        assert_eq!(request.buy_extras[0].asset, Some(Asset::InvestedSurplus));
    }

    #[test]
    fn api_request_from_json_accepts_policy_aliases() {
        for alias in ["lumpSum", "lump_sum", "lump-sum"] {
            let json = format!(r#"{{ "moveCostPolicy": "{alias}" }}"#);
            let request = api_request_from_json(&json).expect("alias should parse");
            assert_eq!(request.inputs.move_cost_policy, MoveCostPolicy::LumpSum);
        }
    }

    #[test]
    fn api_request_from_json_reports_bad_json() {
        let err = api_request_from_json("{ not json").expect_err("must reject");
        assert!(matches!(err, ParameterError::Json(_)));
    }

    #[test]
    fn extras_with_empty_keys_are_rejected() {
        let json = r#"{ "buyExtras": [ { "key": " ", "amount": 1 } ] }"#;
        let err = api_request_from_json(json).expect_err("must reject");
        assert!(err.to_string().contains("buyExtras"));
    }

    #[test]
    fn simulate_response_covers_both_cases() {
        let response = build_simulate_response(&sample_request()).expect("valid cases");

        assert_eq!(response.result.cases.len(), 2);
        for key in [BUY_KEY, RENT_KEY] {
            let case = &response.result.cases[key];
            assert_eq!(case.net_worth.len(), 30);
            assert_eq!(case.assets.len(), 30);
        }
        assert!(response.result.registry.contains_key(SURPLUS_KEY));
        assert!(response.comparison.is_some());
    }

    #[test]
    fn extras_join_their_case() {
        let mut request = sample_request();
        request.rent_extras.push(RecurringItem {
            key: "parking".to_string(),
            label: "Parking".to_string(),
            color: EXTRA_ITEM_COLOR.to_string(),
            amount: -1_000.0,
            growth_rate: 0.0,
            asset: None,
        });
        let response = build_simulate_response(&request).expect("valid cases");

        let rent = &response.result.cases[RENT_KEY];
        assert_approx(rent.breakdowns[3].get("parking"), -1_000.0);
        assert!(response.result.registry.contains_key("parking"));
    }

    #[test]
    fn extras_clashing_with_builtin_keys_are_refused() {
        let mut request = sample_request();
        request.buy_extras.push(RecurringItem {
            key: "rentPaid".to_string(),
            label: "Rent".to_string(),
            color: EXTRA_ITEM_COLOR.to_string(),
            amount: -1.0,
            growth_rate: 0.0,
            asset: None,
        });
        let err = build_simulate_response(&request).expect_err("must reject");
        assert!(matches!(err, SimulationError::DuplicateCalculatorKey { .. }));
    }

    #[test]
    fn response_serializes_camel_case_fields() {
        let response = build_simulate_response(&sample_request()).expect("valid cases");
        let json = serde_json::to_value(&response).expect("serializes");

        assert!(json["params"]["stampDuty"].is_number());
        assert!(json["params"]["weeklyRent"].is_number());
        assert!(json["cases"]["buy"]["netWorth"].is_array());
        assert!(json["cases"]["rent"]["breakdowns"][0]["surplusCashflow"].is_number());
        assert!(json["registry"]["rentPaid"]["label"].is_string());
        assert!(json["comparison"]["winnerKey"].is_string());
    }

    #[test]
    fn run_cli_renders_json() {
        let output = run_cli(["rentbuy", "--num-years", "5"]).expect("runs");
        let json: serde_json::Value = serde_json::from_str(&output).expect("valid json");

        assert_eq!(json["numYears"], 5);
        assert_eq!(json["cases"]["buy"]["netWorth"].as_array().map(Vec::len), Some(5));
    }

    #[test]
    fn run_cli_surfaces_parameter_errors() {
        let err = run_cli(["rentbuy", "--deposit", "150"]).expect_err("must reject");
        assert!(matches!(err, RunError::Parameters(_)));

        let err = run_cli(["rentbuy", "--no-such-flag"]).expect_err("must reject");
        assert!(matches!(err, RunError::Args(_)));
    }

    #[tokio::test]
    async fn simulate_handler_maps_errors_to_status_codes() {
        let ok = simulate_handler_impl(SimulatePayload::default()).await;
        assert_eq!(ok.status(), StatusCode::OK);
        assert_eq!(
            ok.headers().get(header::CACHE_CONTROL),
            Some(&HeaderValue::from_static("no-store"))
        );

        let bad = simulate_handler_impl(SimulatePayload {
            num_years: Some(0),
            ..SimulatePayload::default()
        })
        .await;
        assert_eq!(bad.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn defaults_handler_returns_enriched_defaults() {
        let response = defaults_handler().await;
        assert_eq!(response.status(), StatusCode::OK);
    }
}
