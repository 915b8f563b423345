mod children;
mod engine;
mod error;
mod housing;
mod income;
mod market;
mod monte_carlo;
mod social_security;
mod tables;
mod types;

pub use children::{ChildCostPolicy, resolve_child_expenses};
pub use engine::{compare_scenarios, percentile, run_projection, validate};
pub use error::PlanError;
pub use housing::amortized_annual_payment;
pub use income::income_for_year;
pub use market::{HISTORICAL_ANNUAL_RETURNS, HISTORICAL_FIRST_YEAR, ReturnSampler};
pub use monte_carlo::{MAX_TRIALS, run_monte_carlo};
pub use social_security::ss_benefit_for_year;
pub use tables::{NATIONAL_AVERAGE, locations};
pub use types::{
    Child, CollegeAdjustments, CollegeType, Debt, EconomicScenario, ExpenseBreakdown,
    ExpenseCategory, FamilyExpenses, FinalNetWorth, House, HouseStatus, HouseTimelineEntry,
    Household, IncomeBreakdown, JobChange, LIFE_HORIZON_AGE, MonteCarloResult,
    MonteCarloSettings, OtherIncome, PercentileBand, Person, RecurringExpense, Relocation,
    ReturnModel, SchoolType, ScenarioSummary, SocialSecurityPolicy, SpendingStrategy, YearEvent,
    YearRecord,
};
