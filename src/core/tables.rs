//! Static cost-of-living data. Amounts are annual, in current-year dollars,
//! and scaled per location from a national baseline.

use tracing::debug;

use super::types::{CollegeType, ExpenseBreakdown, ExpenseCategory, SpendingStrategy};

pub const NATIONAL_AVERAGE: &str = "National Average";

pub const DEFAULT_PRIVATE_SCHOOL_TUITION: f64 = 20_000.0;
pub const DEFAULT_PUBLIC_COLLEGE_TUITION: f64 = 12_000.0;
pub const DEFAULT_ROOM_AND_BOARD: f64 = 18_000.0;

const LOCATION_MULTIPLIERS: &[(&str, f64)] = &[
    ("Seattle", 1.15),
    ("San Francisco", 1.45),
    ("Los Angeles", 1.30),
    ("Sacramento", 1.10),
    ("New York", 1.40),
    ("Houston", 0.92),
    ("Austin", 1.00),
    ("Denver", 1.05),
    ("Portland", 1.08),
    (NATIONAL_AVERAGE, 1.00),
];

const PRIVATE_SCHOOL_TUITION: &[(&str, f64)] = &[
    ("Seattle", 20_000.0),
    ("San Francisco", 32_000.0),
    ("Los Angeles", 28_000.0),
    ("Sacramento", 18_000.0),
    ("New York", 35_000.0),
    ("Houston", 15_000.0),
    ("Austin", 17_000.0),
    ("Denver", 18_000.0),
    ("Portland", 19_000.0),
];

const PUBLIC_COLLEGE_TUITION: &[(&str, f64)] = &[
    ("Seattle", 12_000.0),
    ("San Francisco", 14_000.0),
    ("Los Angeles", 13_500.0),
    ("Sacramento", 10_000.0),
    ("New York", 13_000.0),
    ("Houston", 11_000.0),
    ("Austin", 11_500.0),
    ("Denver", 12_500.0),
    ("Portland", 12_000.0),
];

const PRIVATE_COLLEGE_TUITION: &[(&str, f64)] = &[
    ("Seattle", 55_000.0),
    ("San Francisco", 58_000.0),
    ("Los Angeles", 57_000.0),
    ("Sacramento", 50_000.0),
    ("New York", 60_000.0),
    ("Houston", 52_000.0),
    ("Austin", 50_000.0),
    ("Denver", 53_000.0),
    ("Portland", 54_000.0),
];

const ROOM_AND_BOARD: &[(&str, f64)] = &[
    ("Seattle", 18_000.0),
    ("San Francisco", 24_000.0),
    ("Los Angeles", 20_000.0),
    ("Sacramento", 15_000.0),
    ("New York", 25_000.0),
    ("Houston", 14_000.0),
    ("Austin", 15_000.0),
    ("Denver", 16_000.0),
    ("Portland", 17_000.0),
];

const FAMILY_BASELINE: &[(ExpenseCategory, f64)] = &[
    (ExpenseCategory::Food, 12_000.0),
    (ExpenseCategory::Clothing, 2_400.0),
    (ExpenseCategory::Transportation, 10_000.0),
    (ExpenseCategory::Entertainment, 4_000.0),
    (ExpenseCategory::PersonalCare, 3_000.0),
    (ExpenseCategory::Utilities, 4_800.0),
    (ExpenseCategory::Communications, 1_800.0),
    (ExpenseCategory::Subscriptions, 900.0),
    (ExpenseCategory::Other, 5_000.0),
];

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum AgeBand {
    Infant,
    Toddler,
    SchoolAge,
    Teen,
    College,
    YoungAdult,
}

impl AgeBand {
    pub fn for_age(age: i32) -> Option<AgeBand> {
        match age {
            0..=1 => Some(AgeBand::Infant),
            2..=4 => Some(AgeBand::Toddler),
            5..=11 => Some(AgeBand::SchoolAge),
            12..=17 => Some(AgeBand::Teen),
            18..=21 => Some(AgeBand::College),
            22..=30 => Some(AgeBand::YoungAdult),
            _ => None,
        }
    }

    // Columns: food, clothing, healthcare, activities, entertainment,
    // transportation, education, childcare, other.
    fn baseline(self) -> [f64; 9] {
        match self {
            AgeBand::Infant => [
                1_500.0, 600.0, 800.0, 100.0, 200.0, 200.0, 50.0, 20_376.0, 500.0,
            ],
            AgeBand::Toddler => [
                1_800.0, 500.0, 500.0, 200.0, 200.0, 200.0, 50.0, 15_720.0, 500.0,
            ],
            AgeBand::SchoolAge => [
                2_400.0, 600.0, 400.0, 800.0, 300.0, 200.0, 200.0, 0.0, 500.0,
            ],
            AgeBand::Teen => [
                3_000.0, 900.0, 400.0, 1_500.0, 500.0, 1_000.0, 300.0, 0.0, 500.0,
            ],
            AgeBand::College => [
                3_500.0, 1_000.0, 800.0, 800.0, 400.0, 1_000.0, 400.0, 0.0, 500.0,
            ],
            AgeBand::YoungAdult => [
                3_500.0, 1_000.0, 800.0, 800.0, 400.0, 500.0, 0.0, 0.0, 500.0,
            ],
        }
    }
}

const CHILD_COLUMNS: [ExpenseCategory; 9] = [
    ExpenseCategory::Food,
    ExpenseCategory::Clothing,
    ExpenseCategory::Healthcare,
    ExpenseCategory::Activities,
    ExpenseCategory::Entertainment,
    ExpenseCategory::Transportation,
    ExpenseCategory::Education,
    ExpenseCategory::Childcare,
    ExpenseCategory::Other,
];

pub fn strategy_multiplier(strategy: SpendingStrategy) -> f64 {
    match strategy {
        SpendingStrategy::Conservative => 0.7,
        SpendingStrategy::Average => 1.0,
        SpendingStrategy::HighEnd => 1.5,
    }
}

pub fn locations() -> impl Iterator<Item = &'static str> {
    LOCATION_MULTIPLIERS.iter().map(|(name, _)| *name)
}

pub fn location_multiplier(location: &str) -> f64 {
    lookup(LOCATION_MULTIPLIERS, location).unwrap_or_else(|| {
        debug!(location, "unknown location, using national average costs");
        1.0
    })
}

pub fn family_template(location: &str, strategy: SpendingStrategy) -> ExpenseBreakdown {
    let scale = location_multiplier(location) * strategy_multiplier(strategy);
    let mut out = ExpenseBreakdown::zero();
    for &(category, amount) in FAMILY_BASELINE {
        out.add(category, amount * scale);
    }
    out
}

pub fn child_template(location: &str, strategy: SpendingStrategy, band: AgeBand) -> ExpenseBreakdown {
    let scale = location_multiplier(location) * strategy_multiplier(strategy);
    let mut out = ExpenseBreakdown::zero();
    for (category, amount) in CHILD_COLUMNS.iter().zip(band.baseline()) {
        out.add(*category, amount * scale);
    }
    out
}

pub fn private_school_tuition(location: &str) -> f64 {
    lookup(PRIVATE_SCHOOL_TUITION, location).unwrap_or_else(|| {
        debug!(location, "no private school rate, using default");
        DEFAULT_PRIVATE_SCHOOL_TUITION
    })
}

pub fn college_tuition(college_type: CollegeType, location: &str) -> f64 {
    let table = match college_type {
        CollegeType::Public => PUBLIC_COLLEGE_TUITION,
        CollegeType::Private => PRIVATE_COLLEGE_TUITION,
    };
    lookup(table, location).unwrap_or_else(|| {
        debug!(location, ?college_type, "no tuition rate, using default public rate");
        DEFAULT_PUBLIC_COLLEGE_TUITION
    })
}

pub fn room_and_board(location: &str) -> f64 {
    lookup(ROOM_AND_BOARD, location).unwrap_or_else(|| {
        debug!(location, "no room and board rate, using default");
        DEFAULT_ROOM_AND_BOARD
    })
}

fn lookup(table: &[(&str, f64)], key: &str) -> Option<f64> {
    table
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(key))
        .map(|(_, value)| *value)
}
