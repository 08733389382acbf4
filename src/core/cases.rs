use super::calculators::LineItem;
use super::types::{Asset, AssetMap, EnrichedParameters};

pub const BUY_KEY: &str = "buy";
pub const RENT_KEY: &str = "rent";

#[derive(Debug, Clone)]
pub struct Case {
    pub key: String,
    pub label: String,
    pub color: String,
    pub calculators: Vec<LineItem>,
    pub starting_assets: fn(&EnrichedParameters) -> AssetMap,
    pub starting_balance: fn(&EnrichedParameters) -> f64,
}

impl Case {
    pub fn with_extra_items(mut self, extra: impl IntoIterator<Item = LineItem>) -> Self {
        self.calculators.extend(extra);
        self
    }
}

pub fn buy_case() -> Case {
    Case {
        key: BUY_KEY.to_string(),
        label: "Buy".to_string(),
        color: "#2563eb".to_string(),
        calculators: vec![
            LineItem::MortgageRepayment,
            LineItem::PrincipalRepaid,
            LineItem::PropertyAppreciation,
            LineItem::CouncilRates,
            LineItem::StrataFees,
            LineItem::HomeInsurance,
            LineItem::Maintenance,
            LineItem::BuyMovingCosts,
            LineItem::BuyInvestmentReturns,
        ],
        starting_assets: buy_starting_assets,
        starting_balance: buy_starting_balance,
    }
}

pub fn rent_case() -> Case {
    Case {
        key: RENT_KEY.to_string(),
        label: "Rent and invest".to_string(),
        color: "#f59e0b".to_string(),
        calculators: vec![
            LineItem::RentPaid,
            LineItem::ContentsInsurance,
            LineItem::RentMovingCosts,
            LineItem::RentInvestmentReturns,
        ],
        starting_assets: rent_starting_assets,
        starting_balance: rent_starting_balance,
    }
}

pub fn default_cases() -> Vec<Case> {
    vec![buy_case(), rent_case()]
}

fn buy_starting_assets(params: &EnrichedParameters) -> AssetMap {
    AssetMap::from([
        (
            Asset::HomeEquity,
            params.inputs.property_price - params.loan_amount,
        ),
        (Asset::InvestedSurplus, params.buy_invested_start),
    ])
}

fn buy_starting_balance(params: &EnrichedParameters) -> f64 {
    buy_starting_assets(params).values().sum()
}

fn rent_starting_assets(params: &EnrichedParameters) -> AssetMap {
    AssetMap::from([(Asset::InvestedSurplus, params.inputs.initial_savings)])
}

fn rent_starting_balance(params: &EnrichedParameters) -> f64 {
    params.inputs.initial_savings
}
