//! Scheduled flows that are not tied to people: houses and mortgages, debts,
//! recurring purchases and other income.

use super::types::{
    Debt, House, HouseStatus, HouseTimelineEntry, Household, OtherIncome, RecurringExpense,
};

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScheduledFlows {
    pub housing: f64,
    pub debt: f64,
    pub recurring: f64,
    pub rental_income: f64,
    pub other_income: f64,
}

pub fn scheduled_flows(
    household: &Household,
    year: i32,
    inflation_rate: f64,
    real_estate_appreciation: f64,
) -> ScheduledFlows {
    let current_year = household.current_year;
    let mut flows = ScheduledFlows::default();

    for house in &household.houses {
        let (costs, rent) = house_flows(house, year, current_year, real_estate_appreciation);
        flows.housing += costs;
        flows.rental_income += rent;
    }

    flows.debt += household
        .debts
        .iter()
        .map(|debt| debt_payment(debt, year))
        .sum::<f64>();

    for expense in &household.recurring_expenses {
        let (cash, financed) = recurring_expense_cost(expense, year, current_year, inflation_rate);
        flows.recurring += cash;
        flows.debt += financed;
    }

    flows.other_income += household
        .other_income
        .iter()
        .map(|income| other_income_amount(income, year, current_year, inflation_rate))
        .sum::<f64>();

    flows
}

/// Level annual payment (twelve monthly instalments) that retires `principal`
/// over `years` at `annual_rate`.
pub fn amortized_annual_payment(principal: f64, annual_rate: f64, years: u32) -> f64 {
    if principal <= 0.0 || years == 0 {
        return 0.0;
    }
    let n = f64::from(years) * 12.0;
    let r = annual_rate / 12.0;
    let monthly = if r.abs() < 1e-12 {
        principal / n
    } else {
        let growth = (1.0 + r).powf(n);
        principal * r * growth / (growth - 1.0)
    };
    monthly * 12.0
}

/// Timeline entry in force for `year`. A house without a timeline is lived in
/// for the whole projection; one whose timeline starts later is not yet owned.
fn house_entry(house: &House, year: i32) -> Option<HouseTimelineEntry> {
    if house.timeline.is_empty() {
        return Some(HouseTimelineEntry {
            year: i32::MIN,
            status: HouseStatus::OwnLive,
            rental_income: 0.0,
        });
    }
    house
        .timeline
        .iter()
        .filter(|entry| entry.year <= year)
        .max_by_key(|entry| entry.year)
        .copied()
}

fn sold_by(house: &House, year: i32) -> bool {
    house
        .timeline
        .iter()
        .any(|entry| entry.status == HouseStatus::Sold && entry.year <= year)
}

/// Returns `(costs, rental_income)` for one house.
pub fn house_flows(
    house: &House,
    year: i32,
    current_year: i32,
    appreciation: f64,
) -> (f64, f64) {
    let Some(entry) = house_entry(house, year) else {
        return (0.0, 0.0);
    };
    if entry.status == HouseStatus::Sold {
        return (0.0, 0.0);
    }

    let value = house.current_value * (1.0 + appreciation).powi(year - current_year);
    let mut costs = value * house.property_tax_rate
        + house.home_insurance
        + value * house.maintenance_rate
        + house.upkeep_costs;

    let mortgage_end = i32::try_from(house.mortgage_years_left)
        .map_or(i32::MAX, |years| current_year.saturating_add(years));
    if year >= current_year && year < mortgage_end && !sold_by(house, year) {
        costs += amortized_annual_payment(
            house.mortgage_balance,
            house.mortgage_rate,
            house.mortgage_years_left,
        );
    }

    let rent = match entry.status {
        HouseStatus::OwnRent => entry.rental_income,
        _ => 0.0,
    };
    (costs, rent)
}

pub fn debt_payment(debt: &Debt, year: i32) -> f64 {
    if (debt.start_year..=debt.end_year).contains(&year) {
        debt.annual_payment
    } else {
        0.0
    }
}

fn occurrence_years(expense: &RecurringExpense, up_to: i32) -> impl Iterator<Item = i32> + '_ {
    let step = expense.frequency_years.max(1) as usize;
    let last = expense.end_year.map_or(up_to, |end| end.min(up_to));
    (expense.start_year..=last).step_by(step)
}

/// Returns `(cash_cost, financed_payment)` for one recurring expense.
pub fn recurring_expense_cost(
    expense: &RecurringExpense,
    year: i32,
    current_year: i32,
    inflation_rate: f64,
) -> (f64, f64) {
    let price_at = |occurrence: i32| {
        if expense.inflation_adjust {
            expense.amount * (1.0 + inflation_rate).powi(occurrence - current_year)
        } else {
            expense.amount
        }
    };

    if expense.financing_years == 0 {
        let due = occurrence_years(expense, year).any(|occurrence| occurrence == year);
        return (if due { price_at(year) } else { 0.0 }, 0.0);
    }

    let term = i32::try_from(expense.financing_years).unwrap_or(i32::MAX);
    let financed = occurrence_years(expense, year)
        .filter(|occurrence| year < occurrence.saturating_add(term))
        .map(|occurrence| {
            amortized_annual_payment(price_at(occurrence), expense.interest_rate, expense.financing_years)
        })
        .sum();
    (0.0, financed)
}

pub fn other_income_amount(
    income: &OtherIncome,
    year: i32,
    current_year: i32,
    inflation_rate: f64,
) -> f64 {
    if year < income.start_year || income.end_year.is_some_and(|end| year > end) {
        return 0.0;
    }
    if income.inflation_adjust {
        income.annual_amount * (1.0 + inflation_rate).powi(year - current_year)
    } else {
        income.annual_amount
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= 1e-6,
            "expected {expected}, got {actual}"
        );
    }

    fn house() -> House {
        House {
            name: "Home".to_string(),
            current_value: 650_000.0,
            property_tax_rate: 0.0092,
            home_insurance: 1_800.0,
            maintenance_rate: 0.015,
            upkeep_costs: 3_000.0,
            mortgage_balance: 0.0,
            mortgage_rate: 0.0,
            mortgage_years_left: 0,
            timeline: Vec::new(),
        }
    }

    #[test]
    fn carrying_costs_match_hand_calculation() {
        let (costs, rent) = house_flows(&house(), 2025, 2025, 0.03);
        assert_approx(costs, 650_000.0 * 0.0092 + 1_800.0 + 650_000.0 * 0.015 + 3_000.0);
        assert_eq!(rent, 0.0);
    }

    #[test]
    fn value_based_costs_appreciate() {
        let h = house();
        let (next, _) = house_flows(&h, 2026, 2025, 0.03);
        let value = 650_000.0 * 1.03;
        assert_approx(next, value * 0.0092 + 1_800.0 + value * 0.015 + 3_000.0);
    }

    #[test]
    fn zero_rate_mortgage_is_straight_line() {
        assert_approx(amortized_annual_payment(120_000.0, 0.0, 10), 12_000.0);
    }

    #[test]
    fn amortized_payment_matches_standard_formula() {
        // 300k at 6% over 30 years is about 1798.65 per month.
        assert!((amortized_annual_payment(300_000.0, 0.06, 30) / 12.0 - 1_798.65).abs() < 0.01);
    }

    #[test]
    fn mortgage_runs_for_years_left_and_stops_on_sale() {
        let mut h = house();
        h.mortgage_balance = 120_000.0;
        h.mortgage_years_left = 10;
        let base = house_flows(&house(), 2030, 2025, 0.0).0;
        assert_approx(house_flows(&h, 2030, 2025, 0.0).0 - base, 12_000.0);
        assert_approx(house_flows(&h, 2035, 2025, 0.0).0, house_flows(&house(), 2035, 2025, 0.0).0);

        h.timeline = vec![
            HouseTimelineEntry {
                year: 2020,
                status: HouseStatus::OwnLive,
                rental_income: 0.0,
            },
            HouseTimelineEntry {
                year: 2028,
                status: HouseStatus::Sold,
                rental_income: 0.0,
            },
        ];
        assert!(house_flows(&h, 2027, 2025, 0.0).0 > base);
        assert_eq!(house_flows(&h, 2028, 2025, 0.0), (0.0, 0.0));
    }

    #[test]
    fn rented_house_reports_rental_income() {
        let mut h = house();
        h.timeline = vec![
            HouseTimelineEntry {
                year: 2020,
                status: HouseStatus::OwnLive,
                rental_income: 0.0,
            },
            HouseTimelineEntry {
                year: 2030,
                status: HouseStatus::OwnRent,
                rental_income: 36_000.0,
            },
        ];
        assert_eq!(house_flows(&h, 2029, 2025, 0.0).1, 0.0);
        assert_eq!(house_flows(&h, 2030, 2025, 0.0).1, 36_000.0);
    }

    #[test]
    fn future_purchase_has_no_costs_until_bought() {
        let mut h = house();
        h.timeline = vec![HouseTimelineEntry {
            year: 2030,
            status: HouseStatus::OwnLive,
            rental_income: 0.0,
        }];
        assert_eq!(house_flows(&h, 2029, 2025, 0.0), (0.0, 0.0));
        assert!(house_flows(&h, 2030, 2025, 0.0).0 > 0.0);
    }

    #[test]
    fn recurring_cash_expense_hits_every_frequency_years() {
        let car = RecurringExpense {
            name: "Car".to_string(),
            amount: 30_000.0,
            frequency_years: 5,
            start_year: 2026,
            end_year: Some(2036),
            inflation_adjust: false,
            financing_years: 0,
            interest_rate: 0.0,
        };
        let hits: Vec<i32> = (2025..2045)
            .filter(|&y| recurring_expense_cost(&car, y, 2025, 0.02).0 > 0.0)
            .collect();
        assert_eq!(hits, vec![2026, 2031, 2036]);
    }

    #[test]
    fn financed_recurring_expense_books_level_payments_as_debt() {
        let car = RecurringExpense {
            name: "Car".to_string(),
            amount: 30_000.0,
            frequency_years: 10,
            start_year: 2025,
            end_year: None,
            inflation_adjust: true,
            financing_years: 3,
            interest_rate: 0.0,
        };
        assert_eq!(recurring_expense_cost(&car, 2025, 2025, 0.02), (0.0, 10_000.0));
        assert_eq!(recurring_expense_cost(&car, 2027, 2025, 0.02), (0.0, 10_000.0));
        assert_eq!(recurring_expense_cost(&car, 2028, 2025, 0.02), (0.0, 0.0));
        let later = recurring_expense_cost(&car, 2035, 2025, 0.02).1;
        assert_approx(later, 10_000.0 * 1.02_f64.powi(10));
    }

    #[test]
    fn other_income_respects_window_and_inflation() {
        let pension = OtherIncome {
            name: "Pension".to_string(),
            annual_amount: 10_000.0,
            start_year: 2030,
            end_year: Some(2040),
            inflation_adjust: true,
        };
        assert_eq!(other_income_amount(&pension, 2029, 2025, 0.02), 0.0);
        assert_approx(other_income_amount(&pension, 2030, 2025, 0.02), 10_000.0 * 1.02_f64.powi(5));
        assert_eq!(other_income_amount(&pension, 2041, 2025, 0.02), 0.0);
    }

    #[test]
    fn debt_payment_is_inclusive_of_both_ends() {
        let loan = Debt {
            name: "Student loan".to_string(),
            annual_payment: 6_000.0,
            start_year: 2025,
            end_year: 2027,
        };
        assert_eq!(debt_payment(&loan, 2024), 0.0);
        assert_eq!(debt_payment(&loan, 2025), 6_000.0);
        assert_eq!(debt_payment(&loan, 2027), 6_000.0);
        assert_eq!(debt_payment(&loan, 2028), 0.0);
    }
}
