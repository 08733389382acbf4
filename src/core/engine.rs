use std::collections::BTreeMap;

use tracing::{debug, trace};

use super::calculators::{SURPLUS_COLOR, SURPLUS_KEY, SURPLUS_LABEL};
use super::cases::Case;
use super::error::SimulationError;
use super::types::{
    Asset, AssetMap, CalculatorMeta, CaseResult, EnrichedParameters, SimulationResult,
    YearBreakdown,
};

/// Asset bucket the engine books every case's surplus into.
pub const SURPLUS_ASSET: Asset = Asset::InvestedSurplus;

pub fn simulate(
    params: &EnrichedParameters,
    cases: &[Case],
) -> Result<SimulationResult, SimulationError> {
    let registry = build_registry(cases)?;
    let num_years = params.inputs.num_years;
    debug!(num_years, cases = cases.len(), "starting simulation");

    let mut ledgers: Vec<CaseLedger> = cases
        .iter()
        .map(|_| CaseLedger::with_capacity(num_years as usize))
        .collect();

    for year in 0..num_years {
        let mut current: Vec<YearBreakdown> = cases
            .iter()
            .zip(&ledgers)
            .map(|(case, ledger)| evaluate_case_year(params, case, year, &ledger.breakdowns))
            .collect();

        let spent: Vec<f64> = cases
            .iter()
            .zip(&current)
            .map(|(case, breakdown)| cash_spent(case, breakdown))
            .collect();
        let worst_case = normalise_surplus(&spent, &mut current);
        trace!(year, worst_case, "normalised surplus");

        for ((case, ledger), breakdown) in cases.iter().zip(ledgers.iter_mut()).zip(current) {
            ledger.roll_up(params, case, year, breakdown);
        }
    }

    let cases = cases
        .iter()
        .zip(ledgers)
        .map(|(case, ledger)| (case.key.clone(), ledger.into_result(case)))
        .collect::<BTreeMap<_, _>>();
    debug!(num_years, "simulation finished");

    Ok(SimulationResult {
        num_years,
        cases,
        registry,
    })
}

pub fn build_registry(
    cases: &[Case],
) -> Result<BTreeMap<String, CalculatorMeta>, SimulationError> {
    let mut registry = BTreeMap::new();
    let mut owners: BTreeMap<&str, &str> = BTreeMap::new();
    let mut case_keys: Vec<&str> = Vec::with_capacity(cases.len());

    for case in cases {
        if case_keys.contains(&case.key.as_str()) {
            return Err(SimulationError::DuplicateCaseKey(case.key.clone()));
        }
        case_keys.push(&case.key);

        for item in &case.calculators {
            let key = item.key();
            if key == SURPLUS_KEY {
                return Err(SimulationError::ReservedKey {
                    key: key.to_string(),
                    case: case.key.clone(),
                });
            }
            if let Some(first_case) = owners.insert(key, &case.key) {
                return Err(SimulationError::DuplicateCalculatorKey {
                    key: key.to_string(),
                    first_case: first_case.to_string(),
                    second_case: case.key.clone(),
                });
            }
            registry.insert(key.to_string(), item.meta());
        }
    }

    if !cases.is_empty() {
        registry.insert(
            SURPLUS_KEY.to_string(),
            CalculatorMeta {
                key: SURPLUS_KEY.to_string(),
                label: SURPLUS_LABEL.to_string(),
                color: SURPLUS_COLOR.to_string(),
                asset: Some(SURPLUS_ASSET),
            },
        );
    }
    Ok(registry)
}

fn evaluate_case_year(
    params: &EnrichedParameters,
    case: &Case,
    year: u32,
    history: &[YearBreakdown],
) -> YearBreakdown {
    let mut breakdown = YearBreakdown::default();
    for item in &case.calculators {
        let value = item.calculate_for_year(params, year, history);
        breakdown.values.insert(item.key().to_string(), value);
    }
    breakdown
}

fn cash_spent(case: &Case, breakdown: &YearBreakdown) -> f64 {
    case.calculators
        .iter()
        .filter(|item| item.asset().is_none())
        .map(|item| breakdown.get(item.key()))
        .filter(|value| *value < 0.0)
        .sum()
}

/// Credits every case with the gap between its spend and the heaviest spender's.
/// Returns the heaviest spend, which is never above zero.
fn normalise_surplus(spent: &[f64], breakdowns: &mut [YearBreakdown]) -> f64 {
    let worst_case = spent.iter().copied().fold(0.0, f64::min);
    for (spent, breakdown) in spent.iter().zip(breakdowns.iter_mut()) {
        let surplus = spent - worst_case;
        if surplus != 0.0 {
            breakdown.surplus = surplus;
        }
    }
    worst_case
}

struct CaseLedger {
    breakdowns: Vec<YearBreakdown>,
    net_worth: Vec<f64>,
    assets: Vec<AssetMap>,
}

impl CaseLedger {
    fn with_capacity(years: usize) -> Self {
        Self {
            breakdowns: Vec::with_capacity(years),
            net_worth: Vec::with_capacity(years),
            assets: Vec::with_capacity(years),
        }
    }

    fn roll_up(
        &mut self,
        params: &EnrichedParameters,
        case: &Case,
        year: u32,
        mut breakdown: YearBreakdown,
    ) {
        let (assets, net_worth) = match (self.assets.last(), self.net_worth.last()) {
            (Some(previous_assets), Some(previous_net_worth)) if year > 0 => {
                breakdown.asset_deltas = asset_deltas(case, &breakdown);
                let mut assets = previous_assets.clone();
                for (asset, delta) in &breakdown.asset_deltas {
                    *assets.entry(*asset).or_insert(0.0) += delta;
                }
                (assets, previous_net_worth + breakdown.gains())
            }
            _ => (
                (case.starting_assets)(params),
                (case.starting_balance)(params),
            ),
        };

        self.assets.push(assets);
        self.net_worth.push(net_worth);
        self.breakdowns.push(breakdown);
    }

    fn into_result(self, case: &Case) -> CaseResult {
        CaseResult {
            key: case.key.clone(),
            label: case.label.clone(),
            color: case.color.clone(),
            breakdowns: self.breakdowns,
            net_worth: self.net_worth,
            assets: self.assets,
        }
    }
}

fn asset_deltas(case: &Case, breakdown: &YearBreakdown) -> AssetMap {
    let mut deltas = AssetMap::new();
    for item in &case.calculators {
        if let Some(asset) = item.asset() {
            *deltas.entry(asset).or_insert(0.0) += breakdown.get(item.key());
        }
    }
    if breakdown.surplus != 0.0 {
        *deltas.entry(SURPLUS_ASSET).or_insert(0.0) += breakdown.surplus;
    }
    deltas
}
