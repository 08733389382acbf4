
const MONTHS_PER_YEAR: u32 = 12;

// (lower bound, duty at lower bound, marginal rate above it)
const DUTY_BRACKETS: [(f64, f64, f64); 6] = [
    (0.0, 0.0, 0.0125),
    (17_000.0, 212.0, 0.015),
    (36_000.0, 497.0, 0.0175),
    (97_000.0, 1_564.0, 0.035),
    (364_000.0, 10_909.0, 0.045),
    (1_212_000.0, 49_069.0, 0.055),
];

const FIRST_HOME_EXEMPT_LIMIT: f64 = 800_000.0;
const FIRST_HOME_CONCESSION_LIMIT: f64 = 1_000_000.0;

// (upper LVR bound, premium rate on the base loan)
const LMI_BANDS: [(f64, f64); 3] = [(0.85, 0.010), (0.90, 0.020), (0.95, 0.035)];
const LMI_TOP_RATE: f64 = 0.045;
const LMI_FREE_LVR: f64 = 0.80;

pub fn compound(base: f64, rate: f64, year: u32) -> f64 {
    base * (1.0 + rate).powi(year.min(i32::MAX as u32) as i32)
}

pub fn transfer_duty(price: f64, first_home_buyer: bool) -> f64 {
    if !(price > 0.0) || !price.is_finite() {
        return 0.0;
    }

    let full = DUTY_BRACKETS
        .iter()
        .rev()
        .find(|(lower, _, _)| price > *lower)
        .map(|(lower, base, rate)| base + (price - lower) * rate)
        .unwrap_or(0.0);

    if !first_home_buyer || price >= FIRST_HOME_CONCESSION_LIMIT {
        return full;
    }
    if price <= FIRST_HOME_EXEMPT_LIMIT {
        return 0.0;
    }
    full * (price - FIRST_HOME_EXEMPT_LIMIT)
        / (FIRST_HOME_CONCESSION_LIMIT - FIRST_HOME_EXEMPT_LIMIT)
}

pub fn lmi_premium(base_loan: f64, lvr: f64) -> f64 {
    if base_loan <= 0.0 || lvr <= LMI_FREE_LVR + 1e-9 {
        return 0.0;
    }
    let rate = LMI_BANDS
        .iter()
        .find(|(upper, _)| lvr <= *upper + 1e-9)
        .map(|(_, rate)| *rate)
        .unwrap_or(LMI_TOP_RATE);
    base_loan * rate
}

pub fn amortised_repayment(principal: f64, annual_rate: f64, term_years: u32) -> f64 {
    if principal <= 0.0 || term_years == 0 {
        return 0.0;
    }
    let months = f64::from(term_years.saturating_mul(MONTHS_PER_YEAR));
    let monthly_rate = annual_rate / f64::from(MONTHS_PER_YEAR);
    if monthly_rate.abs() < 1e-12 {
        return principal / f64::from(term_years);
    }

    let denom = 1.0 - (1.0 + monthly_rate).powf(-months);
    if denom.abs() < 1e-12 {
        return 0.0;
    }
    principal * monthly_rate / denom * f64::from(MONTHS_PER_YEAR)
}

pub fn loan_balance_after_months(
    principal: f64,
    annual_rate: f64,
    term_years: u32,
    months: u32,
) -> f64 {
    let term_months = term_years.saturating_mul(MONTHS_PER_YEAR);
    if principal <= 0.0 || term_months == 0 || months >= term_months {
        return 0.0;
    }

    let monthly_rate = annual_rate / f64::from(MONTHS_PER_YEAR);
    if monthly_rate.abs() < 1e-12 {
        return principal * (1.0 - f64::from(months) / f64::from(term_months));
    }

    let payment =
        amortised_repayment(principal, annual_rate, term_years) / f64::from(MONTHS_PER_YEAR);
    let growth = (1.0 + monthly_rate).powf(f64::from(months));
    (principal * growth - payment * (growth - 1.0) / monthly_rate).max(0.0)
}

pub fn principal_paid_in_year(principal: f64, annual_rate: f64, term_years: u32, year: u32) -> f64 {
    if year >= term_years {
        return 0.0;
    }
    let start = year.saturating_mul(MONTHS_PER_YEAR);
    let end = start.saturating_add(MONTHS_PER_YEAR);
    let opening = loan_balance_after_months(principal, annual_rate, term_years, start);
    let closing = loan_balance_after_months(principal, annual_rate, term_years, end);
    (opening - closing).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::{prop_assert, proptest};

    const EPS: f64 = 1e-6;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn compound_applies_growth_per_year() {
        assert_approx(compound(100.0, 0.1, 0), 100.0);
        assert_approx(compound(100.0, 0.1, 2), 121.0);
        assert_approx(compound(100.0, -0.5, 1), 50.0);
    }

    #[test]
    fn transfer_duty_follows_brackets() {
        assert_approx(transfer_duty(0.0, false), 0.0);
        assert_approx(transfer_duty(10_000.0, false), 125.0);
        assert_approx(transfer_duty(100_000.0, false), 1_564.0 + 3_000.0 * 0.035);
        assert_approx(transfer_duty(900_000.0, false), 10_909.0 + 536_000.0 * 0.045);
        assert_approx(transfer_duty(1_500_000.0, false), 49_069.0 + 288_000.0 * 0.055);
    }

    #[test]
    fn transfer_duty_first_home_buyer_concession() {
        assert_approx(transfer_duty(750_000.0, true), 0.0);
        assert_approx(transfer_duty(800_000.0, true), 0.0);
        let full = transfer_duty(900_000.0, false);
        assert_approx(transfer_duty(900_000.0, true), full * 0.5);
        assert_approx(
            transfer_duty(1_000_000.0, true),
            transfer_duty(1_000_000.0, false),
        );
    }

    #[test]
    fn lmi_is_free_at_or_below_eighty_percent() {
        assert_approx(lmi_premium(400_000.0, 0.80), 0.0);
        assert_approx(lmi_premium(425_000.0, 0.85), 4_250.0);
        assert_approx(lmi_premium(450_000.0, 0.90), 9_000.0);
        assert_approx(lmi_premium(475_000.0, 0.95), 16_625.0);
        assert_approx(lmi_premium(490_000.0, 0.98), 22_050.0);
    }

    #[test]
    fn amortised_repayment_zero_rate_divides_evenly() {
        assert_approx(amortised_repayment(300_000.0, 0.0, 30), 10_000.0);
        assert_approx(amortised_repayment(0.0, 0.05, 30), 0.0);
        assert_approx(amortised_repayment(100_000.0, 0.05, 0), 0.0);
    }

    #[test]
    fn amortised_repayment_matches_standard_formula() {
        // 500k over 30 years at 6% is about 2,997.75 per month.
        let annual = amortised_repayment(500_000.0, 0.06, 30);
        assert!((annual / 12.0 - 2_997.75).abs() < 0.01, "got {annual}");
    }

    #[test]
    fn balance_reaches_zero_at_end_of_term() {
        assert_approx(loan_balance_after_months(500_000.0, 0.06, 30, 0), 500_000.0);
        assert!(loan_balance_after_months(500_000.0, 0.06, 30, 359) > 0.0);
        assert_approx(loan_balance_after_months(500_000.0, 0.06, 30, 360), 0.0);
        assert_approx(loan_balance_after_months(500_000.0, 0.06, 30, 10_000), 0.0);
    }

    #[test]
    fn principal_after_term_is_zero() {
        assert_approx(principal_paid_in_year(500_000.0, 0.06, 30, 30), 0.0);
        assert_approx(principal_paid_in_year(500_000.0, 0.06, 30, u32::MAX), 0.0);
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(32))]

        #[test]
        fn prop_principal_over_term_sums_to_loan(
            principal in 1_000u32..2_000_000,
            rate_bp in 0u32..1_500,
            term in 1u32..40
        ) {
            let principal = f64::from(principal);
            let rate = f64::from(rate_bp) / 10_000.0;
            let repaid: f64 = (0..term)
                .map(|year| principal_paid_in_year(principal, rate, term, year))
                .sum();
            prop_assert!((repaid - principal).abs() < 1e-3 * principal.max(1.0));

            let annual = amortised_repayment(principal, rate, term);
            for year in 0..term {
                let paid = principal_paid_in_year(principal, rate, term, year);
                prop_assert!(paid <= annual * (1.0 + 1e-9) + 1e-6);
            }
        }
    }
}
