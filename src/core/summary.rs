use serde::Serialize;

use super::types::SimulationResult;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseStanding {
    pub key: String,
    pub label: String,
    pub final_net_worth: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Comparison {
    pub winner_key: String,
    pub winner_label: String,
    pub margin: f64,
    /// First year from which the winner stays strictly ahead of every other case.
    pub crossover_year: Option<u32>,
    pub standings: Vec<CaseStanding>,
}

pub fn summarize(result: &SimulationResult) -> Option<Comparison> {
    let mut standings: Vec<CaseStanding> = result
        .cases
        .values()
        .filter_map(|case| {
            Some(CaseStanding {
                key: case.key.clone(),
                label: case.label.clone(),
                final_net_worth: case.final_net_worth()?,
            })
        })
        .collect();
    if standings.is_empty() {
        return None;
    }
    standings.sort_by(|a, b| b.final_net_worth.total_cmp(&a.final_net_worth));

    let winner = &standings[0];
    let margin = standings
        .get(1)
        .map(|runner_up| winner.final_net_worth - runner_up.final_net_worth)
        .unwrap_or(0.0);
    let crossover_year = crossover_year(result, &winner.key);

    Some(Comparison {
        winner_key: winner.key.clone(),
        winner_label: winner.label.clone(),
        margin,
        crossover_year,
        standings,
    })
}

fn crossover_year(result: &SimulationResult, winner_key: &str) -> Option<u32> {
    let winner = result.case(winner_key)?;
    let rivals: Vec<&[f64]> = result
        .cases
        .values()
        .filter(|case| case.key != winner_key)
        .map(|case| case.net_worth.as_slice())
        .collect();

    let ahead_in = |year: usize| {
        rivals
            .iter()
            .all(|rival| rival.get(year).is_none_or(|nw| winner.net_worth[year] > *nw))
    };

    let mut crossover = None;
    for year in (0..winner.net_worth.len()).rev() {
        if !ahead_in(year) {
            break;
        }
        crossover = u32::try_from(year).ok();
    }
    crossover
}
