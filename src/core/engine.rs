use std::ops::RangeInclusive;

use tracing::{debug, info};

use super::children::{self, ChildCostPolicy};
use super::error::PlanError;
use super::housing;
use super::income::{income_for_year, job_change_in};
use super::social_security::ss_benefit_for_year;
use super::tables;
use super::types::{
    EconomicScenario, ExpenseBreakdown, ExpenseCategory, FamilyExpenses, Household,
    IncomeBreakdown, LIFE_HORIZON_AGE, ScenarioSummary, SpendingStrategy, YearEvent, YearRecord,
};

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct YearFlows {
    pub year: i32,
    pub parent_ages: [i32; 2],
    /// Income excluding the investment return.
    pub income: IncomeBreakdown,
    pub expenses: ExpenseBreakdown,
    pub total_expenses: f64,
    pub events: Vec<YearEvent>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct YearStep {
    pub investment_return: f64,
    pub total_income: f64,
    pub total_expenses: f64,
    pub cashflow: f64,
    pub net_worth: f64,
}

pub fn run_projection(
    household: &Household,
    scenario: &EconomicScenario,
) -> Result<Vec<YearRecord>, PlanError> {
    let flows = build_year_flows(household, scenario)?;
    info!(
        scenario = %scenario.name,
        years = flows.len(),
        "running deterministic projection"
    );

    let rate = scenario.investment_return_rate;
    let steps = fold_years(&flows, household.starting_net_worth, |_| rate);

    let records: Vec<YearRecord> = flows
        .into_iter()
        .zip(steps)
        .map(|(flow, step)| YearRecord {
            year: flow.year,
            parent1_age: flow.parent_ages[0],
            parent2_age: flow.parent_ages[1],
            income: IncomeBreakdown {
                investment_return: step.investment_return,
                ..flow.income
            },
            total_income: step.total_income,
            expenses: flow.expenses,
            total_expenses: step.total_expenses,
            cashflow: step.cashflow,
            net_worth: step.net_worth,
            events: flow.events,
        })
        .collect();

    if let Some(last) = records.last() {
        info!(
            final_year = last.year,
            final_net_worth = last.net_worth,
            "projection complete"
        );
    }
    Ok(records)
}

pub(crate) fn build_year_flows(
    household: &Household,
    scenario: &EconomicScenario,
) -> Result<Vec<YearFlows>, PlanError> {
    validate(household, scenario)?;
    Ok(household
        .years()
        .map(|year| year_flows(household, scenario, year))
        .collect())
}

/// Folds net worth through the years. The first year is the opening position:
/// it reports `starting` and earns no return. From then on the return on the
/// previous balance is both an income line and the growth of net worth.
pub(crate) fn fold_years<F>(flows: &[YearFlows], starting: f64, mut rate_for: F) -> Vec<YearStep>
where
    F: FnMut(usize) -> f64,
{
    let mut steps = Vec::with_capacity(flows.len());
    let mut net_worth = starting;

    for (idx, flow) in flows.iter().enumerate() {
        let investment_return = if idx == 0 {
            0.0
        } else {
            net_worth * rate_for(idx)
        };
        let total_income = flow.income.total() + investment_return;
        let cashflow = total_income - flow.total_expenses;
        if idx > 0 {
            net_worth += cashflow;
        }
        steps.push(YearStep {
            investment_return,
            total_income,
            total_expenses: flow.total_expenses,
            cashflow,
            net_worth,
        });
    }
    steps
}

fn year_flows(household: &Household, scenario: &EconomicScenario, year: i32) -> YearFlows {
    let current_year = household.current_year;
    let [p1, p2] = &household.parents;
    let policy = &household.social_security;
    let scheduled = housing::scheduled_flows(
        household,
        year,
        scenario.inflation_rate,
        scenario.real_estate_appreciation,
    );

    let income = IncomeBreakdown {
        parent1_salary: income_for_year(p1, year, current_year),
        parent2_salary: income_for_year(p2, year, current_year),
        parent1_social_security: ss_benefit_for_year(p1, year, current_year, policy),
        parent2_social_security: ss_benefit_for_year(p2, year, current_year, policy),
        investment_return: 0.0,
        rental: scheduled.rental_income,
        other: scheduled.other_income,
    };

    let mut expenses = family_expenses(household, scenario, year);
    let child_policy = ChildCostPolicy {
        strategy: child_strategy(household, year),
        inflation_rate: scenario.inflation_rate,
        college: household.college_adjustments,
    };
    for child in &household.children {
        expenses += &children::resolve_child_expenses(child, year, current_year, &child_policy);
    }
    expenses.add(
        ExpenseCategory::Healthcare,
        household.healthcare_annual
            * (1.0 + scenario.healthcare_inflation_rate).powi(year - current_year),
    );
    expenses.add(ExpenseCategory::Housing, scheduled.housing);
    expenses.add(ExpenseCategory::Debt, scheduled.debt);
    expenses.add(ExpenseCategory::Recurring, scheduled.recurring);

    YearFlows {
        year,
        parent_ages: [p1.age_in(year, current_year), p2.age_in(year, current_year)],
        income,
        total_expenses: expenses.total(),
        expenses,
        events: year_events(household, year),
    }
}

#[derive(Debug, Clone, Copy)]
enum FamilySelection<'a> {
    Template(&'a str, SpendingStrategy),
    Fixed(f64),
}

/// Family expense selection in force for `year`: the latest relocation at or
/// before it, otherwise the household's base choice.
fn family_selection(household: &Household, year: i32) -> FamilySelection<'_> {
    let relocated = household
        .relocations
        .iter()
        .filter(|r| r.year <= year)
        .max_by_key(|r| r.year);
    match (relocated, &household.family_expenses) {
        (Some(r), _) => FamilySelection::Template(&r.location, r.strategy),
        (None, FamilyExpenses::Template { location, strategy }) => {
            FamilySelection::Template(location, *strategy)
        }
        (None, FamilyExpenses::Fixed { annual }) => FamilySelection::Fixed(*annual),
    }
}

fn family_expenses(household: &Household, scenario: &EconomicScenario, year: i32) -> ExpenseBreakdown {
    let growth = (1.0 + scenario.expense_growth_rate).powi(year - household.current_year);
    match family_selection(household, year) {
        FamilySelection::Template(location, strategy) => {
            tables::family_template(location, strategy).scaled(growth)
        }
        FamilySelection::Fixed(annual) => {
            let mut out = ExpenseBreakdown::zero();
            out.add(ExpenseCategory::Other, annual * growth);
            out
        }
    }
}

fn child_strategy(household: &Household, year: i32) -> SpendingStrategy {
    match family_selection(household, year) {
        FamilySelection::Template(_, strategy) => strategy,
        FamilySelection::Fixed(_) => SpendingStrategy::Average,
    }
}

fn year_events(household: &Household, year: i32) -> Vec<YearEvent> {
    let current_year = household.current_year;
    let mut events = Vec::new();

    for parent in &household.parents {
        if let Some(change) = job_change_in(parent, year) {
            events.push(YearEvent::JobChange {
                parent: parent.name.clone(),
                new_income: change.new_income,
            });
        }
    }

    for child in &household.children {
        if child.age_in(year) == *children::COLLEGE_AGES.start() {
            events.push(YearEvent::CollegeEntry {
                child: child.name.clone(),
            });
        }
    }

    for parent in &household.parents {
        let age = parent.age_in(year, current_year);
        if age == parent.retirement_age && age <= LIFE_HORIZON_AGE {
            events.push(YearEvent::RetirementStart {
                parent: parent.name.clone(),
            });
        }
    }

    let policy = &household.social_security;
    if policy.insolvency_enabled && year == policy.insolvency_year {
        events.push(YearEvent::SsInsolvencyTransition);
    }

    let in_college: Vec<String> = household
        .children
        .iter()
        .filter(|child| children::in_college(child, year))
        .map(|child| child.name.clone())
        .collect();
    if in_college.len() >= 2 {
        events.push(YearEvent::CollegeOverlap {
            children: in_college,
        });
    }

    events
}

pub fn compare_scenarios(
    household: &Household,
    scenarios: &[EconomicScenario],
) -> Result<Vec<ScenarioSummary>, PlanError> {
    scenarios
        .iter()
        .map(|scenario| {
            let records = run_projection(household, scenario)?;
            Ok(summarize(household, scenario, &records))
        })
        .collect()
}

fn summarize(
    household: &Household,
    scenario: &EconomicScenario,
    records: &[YearRecord],
) -> ScenarioSummary {
    let retired_from = household
        .parents
        .iter()
        .map(|p| p.retirement_year(household.current_year))
        .max()
        .unwrap_or(household.current_year);

    let (peak_expense_year, peak_annual_expenses) = records
        .iter()
        .map(|r| (r.year, r.total_expenses))
        .fold((household.current_year, f64::NEG_INFINITY), |best, next| {
            if next.1 > best.1 { next } else { best }
        });

    let summary = ScenarioSummary {
        scenario: scenario.name.clone(),
        ending_net_worth: records.last().map_or(household.starting_net_worth, |r| r.net_worth),
        min_net_worth: records
            .iter()
            .map(|r| r.net_worth)
            .fold(f64::INFINITY, f64::min),
        peak_annual_expenses,
        peak_expense_year,
        retirement_income: records
            .iter()
            .filter(|r| r.year >= retired_from)
            .map(|r| r.total_income)
            .sum(),
    };
    debug!(?summary, "scenario summarised");
    summary
}

const YEAR_RANGE: RangeInclusive<i32> = 1900..=2200;
const MAX_AGE: i32 = 130;
const MAX_TERM_YEARS: u32 = 100;

pub fn validate(household: &Household, scenario: &EconomicScenario) -> Result<(), PlanError> {
    calendar_year(household.current_year, || "currentYear".into())?;

    for (idx, parent) in household.parents.iter().enumerate() {
        let path = format!("parents[{idx}]");
        if parent.current_age < 0 {
            return Err(PlanError::invalid(
                format!("{path}.currentAge"),
                "must not be negative",
            ));
        }
        age_limit(parent.current_age, || format!("{path}.currentAge"))?;
        if parent.retirement_age < 0 {
            return Err(PlanError::invalid(
                format!("{path}.retirementAge"),
                "must not be negative",
            ));
        }
        age_limit(parent.retirement_age, || format!("{path}.retirementAge"))?;
        non_negative(parent.base_income, || format!("{path}.baseIncome"))?;
        growth_rate(parent.raise_rate, || format!("{path}.raiseRate"))?;
        non_negative(parent.ss_monthly_benefit, || format!("{path}.ssMonthlyBenefit"))?;
        for (j, change) in parent.job_changes.iter().enumerate() {
            calendar_year(change.effective_year, || {
                format!("{path}.jobChanges[{j}].effectiveYear")
            })?;
            non_negative(change.new_income, || format!("{path}.jobChanges[{j}].newIncome"))?;
        }
    }

    for (idx, child) in household.children.iter().enumerate() {
        calendar_year(child.birth_year, || format!("children[{idx}].birthYear"))?;
    }

    for (idx, relocation) in household.relocations.iter().enumerate() {
        calendar_year(relocation.year, || format!("relocations[{idx}].year"))?;
    }

    let end_year = household.end_year();
    if end_year < household.current_year {
        return Err(PlanError::InvalidTimeline {
            current_year: household.current_year,
            end_year,
        });
    }

    match &household.family_expenses {
        FamilyExpenses::Fixed { annual } => non_negative(*annual, || "familyExpenses.annual".into())?,
        FamilyExpenses::Template { .. } => {}
    }
    non_negative(household.healthcare_annual, || "healthcareAnnual".into())?;
    if !household.starting_net_worth.is_finite() {
        return Err(PlanError::invalid("startingNetWorth", "must be finite"));
    }

    let ss = &household.social_security;
    calendar_year(ss.insolvency_year, || "socialSecurity.insolvencyYear".into())?;
    if !(0.0..=1.0).contains(&ss.reduction) {
        return Err(PlanError::invalid(
            "socialSecurity.reduction",
            "must be between 0 and 1",
        ));
    }

    for (idx, house) in household.houses.iter().enumerate() {
        let path = format!("houses[{idx}]");
        non_negative(house.current_value, || format!("{path}.currentValue"))?;
        non_negative(house.property_tax_rate, || format!("{path}.propertyTaxRate"))?;
        non_negative(house.home_insurance, || format!("{path}.homeInsurance"))?;
        non_negative(house.maintenance_rate, || format!("{path}.maintenanceRate"))?;
        non_negative(house.upkeep_costs, || format!("{path}.upkeepCosts"))?;
        non_negative(house.mortgage_balance, || format!("{path}.mortgageBalance"))?;
        non_negative(house.mortgage_rate, || format!("{path}.mortgageRate"))?;
        if house.mortgage_balance > 0.0 && house.mortgage_years_left == 0 {
            return Err(PlanError::invalid(
                format!("{path}.mortgageYearsLeft"),
                "must be positive while a balance is owed",
            ));
        }
        term_limit(house.mortgage_years_left, || format!("{path}.mortgageYearsLeft"))?;
        for (j, entry) in house.timeline.iter().enumerate() {
            calendar_year(entry.year, || format!("{path}.timeline[{j}].year"))?;
            non_negative(entry.rental_income, || format!("{path}.timeline[{j}].rentalIncome"))?;
        }
    }

    for (idx, debt) in household.debts.iter().enumerate() {
        non_negative(debt.annual_payment, || format!("debts[{idx}].annualPayment"))?;
        calendar_year(debt.start_year, || format!("debts[{idx}].startYear"))?;
        calendar_year(debt.end_year, || format!("debts[{idx}].endYear"))?;
        year_window(debt.start_year, Some(debt.end_year), || format!("debts[{idx}].endYear"))?;
    }

    for (idx, expense) in household.recurring_expenses.iter().enumerate() {
        let path = format!("recurringExpenses[{idx}]");
        non_negative(expense.amount, || format!("{path}.amount"))?;
        if expense.frequency_years == 0 {
            return Err(PlanError::invalid(
                format!("{path}.frequencyYears"),
                "must be at least 1",
            ));
        }
        term_limit(expense.frequency_years, || format!("{path}.frequencyYears"))?;
        term_limit(expense.financing_years, || format!("{path}.financingYears"))?;
        non_negative(expense.interest_rate, || format!("{path}.interestRate"))?;
        calendar_year(expense.start_year, || format!("{path}.startYear"))?;
        if let Some(end) = expense.end_year {
            calendar_year(end, || format!("{path}.endYear"))?;
        }
        year_window(expense.start_year, expense.end_year, || format!("{path}.endYear"))?;
    }

    for (idx, income) in household.other_income.iter().enumerate() {
        non_negative(income.annual_amount, || format!("otherIncome[{idx}].annualAmount"))?;
        calendar_year(income.start_year, || format!("otherIncome[{idx}].startYear"))?;
        if let Some(end) = income.end_year {
            calendar_year(end, || format!("otherIncome[{idx}].endYear"))?;
        }
        year_window(income.start_year, income.end_year, || format!("otherIncome[{idx}].endYear"))?;
    }

    growth_rate(scenario.investment_return_rate, || "scenario.investmentReturnRate".into())?;
    non_negative(scenario.return_volatility, || "scenario.returnVolatility".into())?;
    growth_rate(scenario.inflation_rate, || "scenario.inflationRate".into())?;
    growth_rate(scenario.expense_growth_rate, || "scenario.expenseGrowthRate".into())?;
    growth_rate(scenario.healthcare_inflation_rate, || {
        "scenario.healthcareInflationRate".into()
    })?;
    growth_rate(scenario.real_estate_appreciation, || {
        "scenario.realEstateAppreciation".into()
    })?;

    Ok(())
}

fn non_negative(value: f64, field: impl FnOnce() -> String) -> Result<(), PlanError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(PlanError::invalid(field(), "must be a non-negative number"))
    }
}

fn growth_rate(value: f64, field: impl FnOnce() -> String) -> Result<(), PlanError> {
    if value.is_finite() && value > -1.0 {
        Ok(())
    } else {
        Err(PlanError::invalid(field(), "must be greater than -100%"))
    }
}

fn calendar_year(year: i32, field: impl FnOnce() -> String) -> Result<(), PlanError> {
    if YEAR_RANGE.contains(&year) {
        Ok(())
    } else {
        Err(PlanError::invalid(
            field(),
            format!("must be between {} and {}", YEAR_RANGE.start(), YEAR_RANGE.end()),
        ))
    }
}

fn age_limit(age: i32, field: impl FnOnce() -> String) -> Result<(), PlanError> {
    if age <= MAX_AGE {
        Ok(())
    } else {
        Err(PlanError::invalid(field(), format!("must be at most {MAX_AGE}")))
    }
}

fn term_limit(years: u32, field: impl FnOnce() -> String) -> Result<(), PlanError> {
    if years <= MAX_TERM_YEARS {
        Ok(())
    } else {
        Err(PlanError::invalid(field(), format!("must be at most {MAX_TERM_YEARS} years")))
    }
}

fn year_window(start: i32, end: Option<i32>, field: impl FnOnce() -> String) -> Result<(), PlanError> {
    match end {
        Some(end) if end < start => Err(PlanError::invalid(field(), "must not be before startYear")),
        _ => Ok(()),
    }
}

pub fn percentile(values: &mut [f64], p: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }

    values.sort_by(|a, b| a.total_cmp(b));

    let n = values.len();
    if n == 1 {
        return values[0];
    }

    let rank = (p / 100.0) * (n as f64 - 1.0);
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;

    if lower == upper {
        values[lower]
    } else {
        let w = rank - lower as f64;
        values[lower] * (1.0 - w) + values[upper] * w
    }
}
