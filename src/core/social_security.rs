use super::types::{LIFE_HORIZON_AGE, Person, SocialSecurityPolicy};

/// Annual Social Security benefit for `year`. Eligibility starts at the
/// person's retirement age; the insolvency haircut is a step applied from
/// `policy.insolvency_year` onwards.
pub fn ss_benefit_for_year(
    person: &Person,
    year: i32,
    current_year: i32,
    policy: &SocialSecurityPolicy,
) -> f64 {
    let age = person.age_in(year, current_year);
    if age < person.retirement_age || age > LIFE_HORIZON_AGE {
        return 0.0;
    }

    let annual = person.ss_monthly_benefit * 12.0;
    if is_insolvent(year, policy) {
        annual * (1.0 - policy.reduction)
    } else {
        annual
    }
}

pub fn is_insolvent(year: i32, policy: &SocialSecurityPolicy) -> bool {
    policy.insolvency_enabled && year >= policy.insolvency_year
}
