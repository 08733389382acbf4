mod calculators;
mod cases;
mod engine;
mod enrich;
mod error;
mod finance;
mod summary;
mod types;

pub use calculators::{LineItem, RecurringItem, SURPLUS_KEY};
pub use cases::{BUY_KEY, Case, RENT_KEY, buy_case, default_cases, rent_case};
pub use engine::{SURPLUS_ASSET, build_registry, simulate};
pub use enrich::enrich;
pub use error::SimulationError;
pub use finance::{amortised_repayment, lmi_premium, transfer_duty};
pub use summary::{CaseStanding, Comparison, summarize};
pub use types::{
    Asset, AssetMap, CalculatorMeta, CaseResult, EnrichedParameters, Inputs, MoveCostPolicy,
    SimulationResult, YearBreakdown,
};
