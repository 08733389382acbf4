use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MoveCostPolicy {
    /// Charge the whole cost in the year the move happens.
    LumpSum,
    /// Spread the cost of the next move evenly over every year of its cycle.
    Averaged,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Asset {
    HomeEquity,
    InvestedSurplus,
}

pub type AssetMap = BTreeMap<Asset, f64>;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Inputs {
    pub num_years: u32,
    pub initial_savings: f64,
    pub property_price: f64,
    pub deposit_rate: f64,
    pub interest_rate: f64,
    pub loan_term_years: u32,
    pub first_home_buyer: bool,
    pub capitalise_lmi: bool,
    pub legal_costs: f64,
    pub property_growth_rate: f64,
    pub council_rates: f64,
    pub strata_fees: f64,
    pub home_insurance: f64,
    pub maintenance_rate: f64,
    pub cost_inflation_rate: f64,
    pub selling_agent_rate: f64,
    pub weekly_rent: f64,
    pub rent_growth_rate: f64,
    pub contents_insurance: f64,
    pub investment_return_rate: f64,
    pub investment_tax_rate: f64,
    pub removalist_cost: f64,
    pub rent_overlap_weeks: f64,
    pub move_interval_years: i32,
    pub move_cost_policy: MoveCostPolicy,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedParameters {
    #[serde(flatten)]
    pub inputs: Inputs,
    pub deposit: f64,
    pub base_loan: f64,
    pub lvr: f64,
    pub stamp_duty: f64,
    pub lmi: f64,
    pub loan_amount: f64,
    pub upfront_buy_costs: f64,
    pub annual_repayment: f64,
    pub buy_invested_start: f64,
    pub buy_move_cost: f64,
    pub rent_move_cost: f64,
    pub moving_enabled: bool,
}

impl EnrichedParameters {
    /// Years between moves, or `None` when moving is disabled.
    pub fn move_interval(&self) -> Option<u32> {
        let interval = self.inputs.move_interval_years;
        if interval <= 0 || i64::from(interval) >= i64::from(self.inputs.num_years) {
            return None;
        }
        u32::try_from(interval).ok()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculatorMeta {
    pub key: String,
    pub label: String,
    pub color: String,
    pub asset: Option<Asset>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YearBreakdown {
    pub values: BTreeMap<String, f64>,
    #[serde(rename = "surplusCashflow")]
    pub surplus: f64,
    /// Per-bucket change booked by the rollup. Empty for year 0, which is a snapshot.
    #[serde(skip)]
    pub asset_deltas: AssetMap,
}

impl YearBreakdown {
    pub fn get(&self, key: &str) -> f64 {
        self.values.get(key).copied().unwrap_or(0.0)
    }

    pub fn gains(&self) -> f64 {
        self.values
            .values()
            .copied()
            .chain(std::iter::once(self.surplus))
            .filter(|v| *v > 0.0)
            .sum()
    }

    pub fn asset_delta(&self, asset: Asset) -> f64 {
        self.asset_deltas.get(&asset).copied().unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseResult {
    pub key: String,
    pub label: String,
    pub color: String,
    pub breakdowns: Vec<YearBreakdown>,
    pub net_worth: Vec<f64>,
    pub assets: Vec<AssetMap>,
}

impl CaseResult {
    pub fn final_net_worth(&self) -> Option<f64> {
        self.net_worth.last().copied()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationResult {
    pub num_years: u32,
    pub cases: BTreeMap<String, CaseResult>,
    pub registry: BTreeMap<String, CalculatorMeta>,
}

impl SimulationResult {
    pub fn case(&self, key: &str) -> Option<&CaseResult> {
        self.cases.get(key)
    }
}
