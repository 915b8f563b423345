use super::types::{JobChange, LIFE_HORIZON_AGE, Person};

/// The job change that sets the salary base for `year`: the latest one with
/// `effective_year <= year`, later entries winning ties.
pub fn active_job_change(person: &Person, year: i32) -> Option<&JobChange> {
    let mut active: Option<&JobChange> = None;
    for change in &person.job_changes {
        if change.effective_year > year {
            continue;
        }
        match active {
            Some(current) if change.effective_year < current.effective_year => {}
            _ => active = Some(change),
        }
    }
    active
}

/// Salary for `year`, compounding the raise rate from the most recent base.
/// Zero once the person has reached retirement age or is past the horizon.
pub fn income_for_year(person: &Person, year: i32, current_year: i32) -> f64 {
    let age = person.age_in(year, current_year);
    if age >= person.retirement_age || age > LIFE_HORIZON_AGE {
        return 0.0;
    }

    let (base_year, base_income) = match active_job_change(person, year) {
        Some(change) => (change.effective_year, change.new_income),
        None => (current_year, person.base_income),
    };
    base_income * (1.0 + person.raise_rate).powi(year - base_year)
}

pub fn job_change_in(person: &Person, year: i32) -> Option<&JobChange> {
    person
        .job_changes
        .iter()
        .rev()
        .find(|change| change.effective_year == year)
}
