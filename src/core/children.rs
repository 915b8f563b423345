use std::ops::RangeInclusive;

use super::tables::{self, AgeBand};
use super::types::{
    Child, CollegeAdjustments, ExpenseBreakdown, ExpenseCategory, SchoolType, SpendingStrategy,
};

pub const K12_AGES: RangeInclusive<i32> = 5..=17;
pub const COLLEGE_AGES: RangeInclusive<i32> = 18..=21;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChildCostPolicy {
    pub strategy: SpendingStrategy,
    pub inflation_rate: f64,
    pub college: CollegeAdjustments,
}

pub fn in_college(child: &Child, year: i32) -> bool {
    COLLEGE_AGES.contains(&child.age_in(year))
}

/// Age-appropriate annual cost of one child in `year`, grown by inflation from
/// `current_year`. Outside ages 0..=30 every category is zero.
pub fn resolve_child_expenses(
    child: &Child,
    year: i32,
    current_year: i32,
    policy: &ChildCostPolicy,
) -> ExpenseBreakdown {
    let age = child.age_in(year);
    let Some(band) = AgeBand::for_age(age) else {
        return ExpenseBreakdown::zero();
    };

    let mut expenses = tables::child_template(&child.location, policy.strategy, band);

    if K12_AGES.contains(&age) && child.school_type == SchoolType::Private {
        expenses.add(
            ExpenseCategory::Education,
            tables::private_school_tuition(&child.location),
        );
    }

    if band == AgeBand::College {
        expenses[ExpenseCategory::Education] =
            tables::college_tuition(child.college_type, &child.college_location)
                + tables::room_and_board(&child.college_location);
        expenses[ExpenseCategory::Food] *= policy.college.food;
        expenses[ExpenseCategory::Transportation] *= policy.college.transportation;
        expenses[ExpenseCategory::Entertainment] *= policy.college.entertainment;
    }

    expenses.scaled((1.0 + policy.inflation_rate).powi(year - current_year))
}
