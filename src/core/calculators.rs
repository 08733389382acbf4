use serde::{Deserialize, Serialize};

use super::enrich::annual_rent;
use super::finance::{compound, principal_paid_in_year};
use super::types::{Asset, CalculatorMeta, EnrichedParameters, MoveCostPolicy, YearBreakdown};

/// Breakdown key the engine reserves for the surplus it credits each case.
pub const SURPLUS_KEY: &str = "surplusCashflow";
pub const SURPLUS_LABEL: &str = "Surplus invested";
pub const SURPLUS_COLOR: &str = "#16a34a";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecurringItem {
    pub key: String,
    pub label: String,
    pub color: String,
    pub amount: f64,
    pub growth_rate: f64,
    pub asset: Option<Asset>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LineItem {
    MortgageRepayment,
    PrincipalRepaid,
    PropertyAppreciation,
    CouncilRates,
    StrataFees,
    HomeInsurance,
    Maintenance,
    BuyMovingCosts,
    BuyInvestmentReturns,
    RentPaid,
    ContentsInsurance,
    RentMovingCosts,
    RentInvestmentReturns,
    Recurring(RecurringItem),
}

impl LineItem {
    pub fn key(&self) -> &str {
        match self {
            LineItem::MortgageRepayment => "mortgageRepayment",
            LineItem::PrincipalRepaid => "principalRepaid",
            LineItem::PropertyAppreciation => "propertyAppreciation",
            LineItem::CouncilRates => "councilRates",
            LineItem::StrataFees => "strataFees",
            LineItem::HomeInsurance => "homeInsurance",
            LineItem::Maintenance => "maintenance",
            LineItem::BuyMovingCosts => "buyMovingCosts",
            LineItem::BuyInvestmentReturns => "buyInvestmentReturns",
            LineItem::RentPaid => "rentPaid",
            LineItem::ContentsInsurance => "contentsInsurance",
            LineItem::RentMovingCosts => "rentMovingCosts",
            LineItem::RentInvestmentReturns => "rentInvestmentReturns",
            LineItem::Recurring(item) => &item.key,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            LineItem::MortgageRepayment => "Mortgage repayments",
            LineItem::PrincipalRepaid => "Principal repaid",
            LineItem::PropertyAppreciation => "Property appreciation",
            LineItem::CouncilRates => "Council rates",
            LineItem::StrataFees => "Strata fees",
            LineItem::HomeInsurance => "Home insurance",
            LineItem::Maintenance => "Maintenance",
            LineItem::BuyMovingCosts => "Selling and rebuying",
            LineItem::BuyInvestmentReturns => "Investment returns",
            LineItem::RentPaid => "Rent",
            LineItem::ContentsInsurance => "Contents insurance",
            LineItem::RentMovingCosts => "Moving house",
            LineItem::RentInvestmentReturns => "Investment returns",
            LineItem::Recurring(item) => &item.label,
        }
    }

    pub fn color(&self) -> &str {
        match self {
            LineItem::MortgageRepayment => "#dc2626",
            LineItem::PrincipalRepaid => "#2563eb",
            LineItem::PropertyAppreciation => "#7c3aed",
            LineItem::CouncilRates => "#ea580c",
            LineItem::StrataFees => "#d97706",
            LineItem::HomeInsurance => "#ca8a04",
            LineItem::Maintenance => "#a16207",
            LineItem::BuyMovingCosts => "#be123c",
            LineItem::BuyInvestmentReturns => "#0d9488",
            LineItem::RentPaid => "#b91c1c",
            LineItem::ContentsInsurance => "#c2410c",
            LineItem::RentMovingCosts => "#9f1239",
            LineItem::RentInvestmentReturns => "#0891b2",
            LineItem::Recurring(item) => &item.color,
        }
    }

    pub fn asset(&self) -> Option<Asset> {
        match self {
            LineItem::PrincipalRepaid | LineItem::PropertyAppreciation => Some(Asset::HomeEquity),
            LineItem::BuyInvestmentReturns | LineItem::RentInvestmentReturns => {
                Some(Asset::InvestedSurplus)
            }
            LineItem::Recurring(item) => item.asset,
            _ => None,
        }
    }

    pub fn meta(&self) -> CalculatorMeta {
        CalculatorMeta {
            key: self.key().to_string(),
            label: self.label().to_string(),
            color: self.color().to_string(),
            asset: self.asset(),
        }
    }

    pub fn calculate_for_year(
        &self,
        params: &EnrichedParameters,
        year: u32,
        history: &[YearBreakdown],
    ) -> f64 {
        let inputs = &params.inputs;
        let value = match self {
            LineItem::MortgageRepayment => -mortgage_repayment(params, year),
            LineItem::PrincipalRepaid => principal_paid_in_year(
                params.loan_amount,
                inputs.interest_rate,
                inputs.loan_term_years,
                year,
            ),
            LineItem::PropertyAppreciation => {
                compound(inputs.property_price, inputs.property_growth_rate, year)
                    * inputs.property_growth_rate
            }
            LineItem::CouncilRates => -inflated(params, inputs.council_rates, year),
            LineItem::StrataFees => -inflated(params, inputs.strata_fees, year),
            LineItem::HomeInsurance => -inflated(params, inputs.home_insurance, year),
            LineItem::Maintenance => {
                -compound(inputs.property_price, inputs.property_growth_rate, year)
                    * inputs.maintenance_rate.max(0.0)
            }
            LineItem::BuyMovingCosts => {
                -moving_cost(params, params.buy_move_cost, inputs.property_growth_rate, year)
            }
            LineItem::BuyInvestmentReturns => {
                investment_return(params, params.buy_invested_start, year, history)
            }
            LineItem::RentPaid => -compound(annual_rent(inputs), inputs.rent_growth_rate, year),
            LineItem::ContentsInsurance => -inflated(params, inputs.contents_insurance, year),
            LineItem::RentMovingCosts => {
                -moving_cost(params, params.rent_move_cost, inputs.rent_growth_rate, year)
            }
            LineItem::RentInvestmentReturns => {
                investment_return(params, inputs.initial_savings, year, history)
            }
            LineItem::Recurring(item) => compound(item.amount, item.growth_rate, year),
        };

        if value.is_finite() { value } else { 0.0 }
    }
}

fn inflated(params: &EnrichedParameters, base: f64, year: u32) -> f64 {
    compound(base.max(0.0), params.inputs.cost_inflation_rate, year)
}

fn mortgage_repayment(params: &EnrichedParameters, year: u32) -> f64 {
    if year >= params.inputs.loan_term_years {
        return 0.0;
    }
    params.annual_repayment
}

/// Moves fall at the end of every `interval` years, i.e. when `(year + 1) % interval == 0`.
/// The averaged policy charges, every year, an even share of the next move's cost grown to
/// the year that move happens.
fn moving_cost(params: &EnrichedParameters, base_cost: f64, growth_rate: f64, year: u32) -> f64 {
    let Some(interval) = params.move_interval() else {
        return 0.0;
    };
    if base_cost <= 0.0 {
        return 0.0;
    }

    let (year_wide, interval_wide) = (u64::from(year), u64::from(interval));
    match params.inputs.move_cost_policy {
        MoveCostPolicy::LumpSum => {
            if (year_wide + 1) % interval_wide == 0 {
                compound(base_cost, growth_rate, year)
            } else {
                0.0
            }
        }
        MoveCostPolicy::Averaged => {
            let move_year = (year_wide / interval_wide + 1) * interval_wide - 1;
            let move_year = u32::try_from(move_year).unwrap_or(u32::MAX);
            compound(base_cost, growth_rate, move_year) / f64::from(interval)
        }
    }
}

/// After-tax return on the invested bucket carried into `year`: the starting amount plus
/// every change the rollup booked to it since. Year 0 is the opening snapshot and earns nothing.
fn investment_return(
    params: &EnrichedParameters,
    start: f64,
    year: u32,
    history: &[YearBreakdown],
) -> f64 {
    if year == 0 {
        return 0.0;
    }
    let inputs = &params.inputs;
    let balance = start
        + history
            .iter()
            .map(|breakdown| breakdown.asset_delta(Asset::InvestedSurplus))
            .sum::<f64>();
    let after_tax_rate =
        inputs.investment_return_rate * (1.0 - inputs.investment_tax_rate.clamp(0.0, 1.0));
    balance.max(0.0) * after_tax_rate
}
