use super::finance::{amortised_repayment, lmi_premium, transfer_duty};
use super::types::{EnrichedParameters, Inputs};

const WEEKS_PER_YEAR: f64 = 52.0;

pub fn enrich(inputs: &Inputs) -> EnrichedParameters {
    let price = inputs.property_price.max(0.0);
    let deposit = price * inputs.deposit_rate.clamp(0.0, 1.0);
    let base_loan = (price - deposit).max(0.0);
    let lvr = if price > 0.0 { base_loan / price } else { 0.0 };

    let stamp_duty = transfer_duty(price, inputs.first_home_buyer);
    let lmi = lmi_premium(base_loan, lvr);
    let (loan_amount, lmi_upfront) = if inputs.capitalise_lmi {
        (base_loan + lmi, 0.0)
    } else {
        (base_loan, lmi)
    };
    let upfront_buy_costs = stamp_duty + inputs.legal_costs.max(0.0) + lmi_upfront;
    let annual_repayment =
        amortised_repayment(loan_amount, inputs.interest_rate, inputs.loan_term_years);

    let buy_move_cost = inputs.selling_agent_rate.max(0.0) * price
        + stamp_duty
        + inputs.legal_costs.max(0.0)
        + inputs.removalist_cost.max(0.0);
    let rent_move_cost = inputs.removalist_cost.max(0.0)
        + inputs.rent_overlap_weeks.max(0.0) * inputs.weekly_rent.max(0.0);

    let mut params = EnrichedParameters {
        inputs: inputs.clone(),
        deposit,
        base_loan,
        lvr,
        stamp_duty,
        lmi,
        loan_amount,
        upfront_buy_costs,
        annual_repayment,
        buy_invested_start: inputs.initial_savings - deposit - upfront_buy_costs,
        buy_move_cost,
        rent_move_cost,
        moving_enabled: false,
    };
    params.moving_enabled = params.move_interval().is_some();
    params
}

pub fn annual_rent(inputs: &Inputs) -> f64 {
    inputs.weekly_rent.max(0.0) * WEEKS_PER_YEAR
}
