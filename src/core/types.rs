use std::ops::{AddAssign, Index, IndexMut};

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

pub const LIFE_HORIZON_AGE: i32 = 100;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum ExpenseCategory {
    Food,
    Clothing,
    Transportation,
    Entertainment,
    PersonalCare,
    Utilities,
    Communications,
    Subscriptions,
    Healthcare,
    Activities,
    Childcare,
    Education,
    Housing,
    Debt,
    Recurring,
    Other,
}

impl ExpenseCategory {
    pub const COUNT: usize = 16;

    pub const ALL: [ExpenseCategory; ExpenseCategory::COUNT] = [
        ExpenseCategory::Food,
        ExpenseCategory::Clothing,
        ExpenseCategory::Transportation,
        ExpenseCategory::Entertainment,
        ExpenseCategory::PersonalCare,
        ExpenseCategory::Utilities,
        ExpenseCategory::Communications,
        ExpenseCategory::Subscriptions,
        ExpenseCategory::Healthcare,
        ExpenseCategory::Activities,
        ExpenseCategory::Childcare,
        ExpenseCategory::Education,
        ExpenseCategory::Housing,
        ExpenseCategory::Debt,
        ExpenseCategory::Recurring,
        ExpenseCategory::Other,
    ];

    pub fn key(self) -> &'static str {
        match self {
            ExpenseCategory::Food => "food",
            ExpenseCategory::Clothing => "clothing",
            ExpenseCategory::Transportation => "transportation",
            ExpenseCategory::Entertainment => "entertainment",
            ExpenseCategory::PersonalCare => "personalCare",
            ExpenseCategory::Utilities => "utilities",
            ExpenseCategory::Communications => "communications",
            ExpenseCategory::Subscriptions => "subscriptions",
            ExpenseCategory::Healthcare => "healthcare",
            ExpenseCategory::Activities => "activities",
            ExpenseCategory::Childcare => "childcare",
            ExpenseCategory::Education => "education",
            ExpenseCategory::Housing => "housing",
            ExpenseCategory::Debt => "debt",
            ExpenseCategory::Recurring => "recurring",
            ExpenseCategory::Other => "other",
        }
    }

    fn slot(self) -> usize {
        self as usize
    }
}

/// Annual amounts for the closed set of expense categories. Every category is
/// always present, unused ones hold zero.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ExpenseBreakdown {
    amounts: [f64; ExpenseCategory::COUNT],
}

impl ExpenseBreakdown {
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn get(&self, category: ExpenseCategory) -> f64 {
        self.amounts[category.slot()]
    }

    pub fn add(&mut self, category: ExpenseCategory, amount: f64) {
        self.amounts[category.slot()] += amount;
    }

    pub fn total(&self) -> f64 {
        self.amounts.iter().sum()
    }

    pub fn scaled(&self, factor: f64) -> Self {
        let mut out = *self;
        for amount in &mut out.amounts {
            *amount *= factor;
        }
        out
    }

    pub fn iter(&self) -> impl Iterator<Item = (ExpenseCategory, f64)> + '_ {
        ExpenseCategory::ALL
            .iter()
            .map(move |&category| (category, self.get(category)))
    }
}

impl Index<ExpenseCategory> for ExpenseBreakdown {
    type Output = f64;

    fn index(&self, category: ExpenseCategory) -> &f64 {
        &self.amounts[category.slot()]
    }
}

impl IndexMut<ExpenseCategory> for ExpenseBreakdown {
    fn index_mut(&mut self, category: ExpenseCategory) -> &mut f64 {
        &mut self.amounts[category.slot()]
    }
}

impl AddAssign<&ExpenseBreakdown> for ExpenseBreakdown {
    fn add_assign(&mut self, other: &ExpenseBreakdown) {
        for (slot, amount) in self.amounts.iter_mut().zip(other.amounts.iter()) {
            *slot += amount;
        }
    }
}

impl Serialize for ExpenseBreakdown {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(ExpenseCategory::COUNT))?;
        for (category, amount) in self.iter() {
            map.serialize_entry(category.key(), &amount)?;
        }
        map.end()
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum SpendingStrategy {
    Conservative,
    Average,
    HighEnd,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SchoolType {
    Public,
    Private,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum CollegeType {
    Public,
    Private,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JobChange {
    pub effective_year: i32,
    pub new_income: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Person {
    pub name: String,
    pub current_age: i32,
    pub base_income: f64,
    pub raise_rate: f64,
    /// Kept in insertion order; for equal years the later entry wins.
    pub job_changes: Vec<JobChange>,
    pub retirement_age: i32,
    pub ss_monthly_benefit: f64,
}

impl Person {
    pub fn age_in(&self, year: i32, current_year: i32) -> i32 {
        self.current_age + (year - current_year)
    }

    pub fn horizon_year(&self, current_year: i32) -> i32 {
        current_year - self.current_age + LIFE_HORIZON_AGE
    }

    pub fn retirement_year(&self, current_year: i32) -> i32 {
        current_year - self.current_age + self.retirement_age
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Child {
    pub name: String,
    pub birth_year: i32,
    pub location: String,
    pub school_type: SchoolType,
    pub college_type: CollegeType,
    pub college_location: String,
}

impl Child {
    pub fn age_in(&self, year: i32) -> i32 {
        year - self.birth_year
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FamilyExpenses {
    Template {
        location: String,
        strategy: SpendingStrategy,
    },
    /// A single annual figure booked under `Other`.
    Fixed { annual: f64 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Relocation {
    pub year: i32,
    pub location: String,
    pub strategy: SpendingStrategy,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EconomicScenario {
    pub name: String,
    pub investment_return_rate: f64,
    pub return_volatility: f64,
    pub inflation_rate: f64,
    pub expense_growth_rate: f64,
    pub healthcare_inflation_rate: f64,
    pub real_estate_appreciation: f64,
}

impl EconomicScenario {
    pub fn conservative() -> Self {
        Self {
            name: "Conservative".to_string(),
            investment_return_rate: 0.04,
            return_volatility: 0.10,
            inflation_rate: 0.03,
            expense_growth_rate: 0.02,
            healthcare_inflation_rate: 0.05,
            real_estate_appreciation: 0.02,
        }
    }

    pub fn moderate() -> Self {
        Self {
            name: "Moderate".to_string(),
            investment_return_rate: 0.06,
            return_volatility: 0.15,
            inflation_rate: 0.025,
            expense_growth_rate: 0.02,
            healthcare_inflation_rate: 0.045,
            real_estate_appreciation: 0.03,
        }
    }

    pub fn aggressive() -> Self {
        Self {
            name: "Aggressive".to_string(),
            investment_return_rate: 0.08,
            return_volatility: 0.20,
            inflation_rate: 0.02,
            expense_growth_rate: 0.02,
            healthcare_inflation_rate: 0.04,
            real_estate_appreciation: 0.04,
        }
    }

    pub fn preset(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "conservative" => Some(Self::conservative()),
            "moderate" => Some(Self::moderate()),
            "aggressive" => Some(Self::aggressive()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SocialSecurityPolicy {
    pub insolvency_enabled: bool,
    pub insolvency_year: i32,
    /// Fraction of the benefit withheld from `insolvency_year` onwards.
    pub reduction: f64,
}

impl Default for SocialSecurityPolicy {
    fn default() -> Self {
        Self {
            insolvency_enabled: true,
            insolvency_year: 2034,
            reduction: 0.30,
        }
    }
}

/// Share of the at-home cost that remains while a child is away at college.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollegeAdjustments {
    pub food: f64,
    pub transportation: f64,
    pub entertainment: f64,
}

impl Default for CollegeAdjustments {
    fn default() -> Self {
        Self {
            food: 0.30,
            transportation: 0.40,
            entertainment: 0.50,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum HouseStatus {
    OwnLive,
    OwnRent,
    Sold,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HouseTimelineEntry {
    pub year: i32,
    pub status: HouseStatus,
    pub rental_income: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct House {
    pub name: String,
    pub current_value: f64,
    pub property_tax_rate: f64,
    pub home_insurance: f64,
    pub maintenance_rate: f64,
    pub upkeep_costs: f64,
    pub mortgage_balance: f64,
    pub mortgage_rate: f64,
    pub mortgage_years_left: u32,
    pub timeline: Vec<HouseTimelineEntry>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Debt {
    pub name: String,
    pub annual_payment: f64,
    pub start_year: i32,
    pub end_year: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecurringExpense {
    pub name: String,
    pub amount: f64,
    pub frequency_years: u32,
    pub start_year: i32,
    pub end_year: Option<i32>,
    pub inflation_adjust: bool,
    pub financing_years: u32,
    pub interest_rate: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OtherIncome {
    pub name: String,
    pub annual_amount: f64,
    pub start_year: i32,
    pub end_year: Option<i32>,
    pub inflation_adjust: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Household {
    pub current_year: i32,
    pub parents: [Person; 2],
    pub children: Vec<Child>,
    pub family_expenses: FamilyExpenses,
    pub relocations: Vec<Relocation>,
    pub healthcare_annual: f64,
    /// Net worth at the close of `current_year`.
    pub starting_net_worth: f64,
    pub houses: Vec<House>,
    pub debts: Vec<Debt>,
    pub recurring_expenses: Vec<RecurringExpense>,
    pub other_income: Vec<OtherIncome>,
    pub social_security: SocialSecurityPolicy,
    pub college_adjustments: CollegeAdjustments,
}

impl Household {
    pub fn end_year(&self) -> i32 {
        self.parents
            .iter()
            .map(|p| p.horizon_year(self.current_year))
            .max()
            .unwrap_or(self.current_year)
    }

    pub fn years(&self) -> std::ops::RangeInclusive<i32> {
        self.current_year..=self.end_year()
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ReturnModel {
    Historical,
    Parametric,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonteCarloSettings {
    pub trials: u32,
    pub return_model: ReturnModel,
    pub seed: Option<u64>,
}

impl Default for MonteCarloSettings {
    fn default() -> Self {
        Self {
            trials: 500,
            return_model: ReturnModel::Historical,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomeBreakdown {
    pub parent1_salary: f64,
    pub parent2_salary: f64,
    pub parent1_social_security: f64,
    pub parent2_social_security: f64,
    pub investment_return: f64,
    pub rental: f64,
    pub other: f64,
}

impl IncomeBreakdown {
    pub fn total(&self) -> f64 {
        self.parent1_salary
            + self.parent2_salary
            + self.parent1_social_security
            + self.parent2_social_security
            + self.investment_return
            + self.rental
            + self.other
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum YearEvent {
    JobChange { parent: String, new_income: f64 },
    CollegeEntry { child: String },
    RetirementStart { parent: String },
    SsInsolvencyTransition,
    CollegeOverlap { children: Vec<String> },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YearRecord {
    pub year: i32,
    pub parent1_age: i32,
    pub parent2_age: i32,
    pub income: IncomeBreakdown,
    pub total_income: f64,
    pub expenses: ExpenseBreakdown,
    pub total_expenses: f64,
    pub cashflow: f64,
    pub net_worth: f64,
    pub events: Vec<YearEvent>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PercentileBand {
    pub year: i32,
    pub p10: f64,
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
    pub p90: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalNetWorth {
    pub p10: f64,
    pub p50: f64,
    pub p90: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonteCarloResult {
    pub years: Vec<i32>,
    pub trials: u32,
    pub seed: u64,
    /// `trials × years` matrices, one row per trial.
    pub net_worth: Vec<Vec<f64>>,
    pub income: Vec<Vec<f64>>,
    pub expenses: Vec<Vec<f64>>,
    pub cashflow: Vec<Vec<f64>>,
    pub net_worth_bands: Vec<PercentileBand>,
    pub income_bands: Vec<PercentileBand>,
    pub expense_bands: Vec<PercentileBand>,
    pub cashflow_bands: Vec<PercentileBand>,
    pub success_rate: f64,
    pub final_net_worth: FinalNetWorth,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioSummary {
    pub scenario: String,
    pub ending_net_worth: f64,
    pub min_net_worth: f64,
    pub peak_annual_expenses: f64,
    pub peak_expense_year: i32,
    pub retirement_income: f64,
}
