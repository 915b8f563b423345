use axum::{
    Router,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::{Datelike, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::net::TcpListener;
use tracing::{debug, info};

use crate::core::{
    Child, CollegeAdjustments, CollegeType, Debt, EconomicScenario, FamilyExpenses, House,
    HouseStatus, HouseTimelineEntry, Household, JobChange, MonteCarloResult, MonteCarloSettings,
    OtherIncome, Person, PlanError, RecurringExpense, Relocation, ReturnModel, ScenarioSummary,
    SchoolType, SocialSecurityPolicy, SpendingStrategy, YearRecord, compare_scenarios, locations,
    run_monte_carlo, run_projection, validate,
};

const DEFAULT_RETIREMENT_AGE: i32 = 67;
const DEFAULT_RAISE_PERCENT: f64 = 3.0;
const DEFAULT_LOCATION: &str = crate::core::NATIONAL_AVERAGE;

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum CliReturnModel {
    Historical,
    Parametric,
}

impl From<CliReturnModel> for ReturnModel {
    fn from(value: CliReturnModel) -> Self {
        match value {
            CliReturnModel::Historical => ReturnModel::Historical,
            CliReturnModel::Parametric => ReturnModel::Parametric,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum ApiSpendingStrategy {
    #[serde(alias = "frugal")]
    Conservative,
    #[serde(alias = "moderate")]
    Average,
    #[serde(alias = "highEnd", alias = "high_end", alias = "luxury")]
    HighEnd,
}

impl From<ApiSpendingStrategy> for SpendingStrategy {
    fn from(value: ApiSpendingStrategy) -> Self {
        match value {
            ApiSpendingStrategy::Conservative => SpendingStrategy::Conservative,
            ApiSpendingStrategy::Average => SpendingStrategy::Average,
            ApiSpendingStrategy::HighEnd => SpendingStrategy::HighEnd,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum ApiInstitution {
    Public,
    Private,
}

impl From<ApiInstitution> for SchoolType {
    fn from(value: ApiInstitution) -> Self {
        match value {
            ApiInstitution::Public => SchoolType::Public,
            ApiInstitution::Private => SchoolType::Private,
        }
    }
}

impl From<ApiInstitution> for CollegeType {
    fn from(value: ApiInstitution) -> Self {
        match value {
            ApiInstitution::Public => CollegeType::Public,
            ApiInstitution::Private => CollegeType::Private,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum ApiHouseStatus {
    #[serde(alias = "ownLive", alias = "own_live", alias = "Own_Live")]
    OwnLive,
    #[serde(alias = "ownRent", alias = "own_rent", alias = "Own_Rent")]
    OwnRent,
    #[serde(alias = "Sold")]
    Sold,
}

impl From<ApiHouseStatus> for HouseStatus {
    fn from(value: ApiHouseStatus) -> Self {
        match value {
            ApiHouseStatus::OwnLive => HouseStatus::OwnLive,
            ApiHouseStatus::OwnRent => HouseStatus::OwnRent,
            ApiHouseStatus::Sold => HouseStatus::Sold,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum ApiScenarioPreset {
    Conservative,
    Moderate,
    Aggressive,
}

impl From<ApiScenarioPreset> for EconomicScenario {
    fn from(value: ApiScenarioPreset) -> Self {
        match value {
            ApiScenarioPreset::Conservative => EconomicScenario::conservative(),
            ApiScenarioPreset::Moderate => EconomicScenario::moderate(),
            ApiScenarioPreset::Aggressive => EconomicScenario::aggressive(),
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum ApiReturnModel {
    #[serde(alias = "bootstrap")]
    Historical,
    #[serde(alias = "normal")]
    Parametric,
}

impl From<ApiReturnModel> for ReturnModel {
    fn from(value: ApiReturnModel) -> Self {
        match value {
            ApiReturnModel::Historical => ReturnModel::Historical,
            ApiReturnModel::Parametric => ReturnModel::Parametric,
        }
    }
}

/// Request body shared by every planning endpoint and by `nestplan project`.
/// Rates are given in percent.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct PlanPayload {
    current_year: Option<i32>,
    parents: Option<Vec<PersonPayload>>,
    children: Option<Vec<ChildPayload>>,
    family_expenses: Option<FamilyExpensesPayload>,
    relocations: Option<Vec<RelocationPayload>>,
    healthcare_annual: Option<f64>,
    starting_net_worth: Option<f64>,
    houses: Option<Vec<HousePayload>>,
    debts: Option<Vec<DebtPayload>>,
    recurring_expenses: Option<Vec<RecurringExpensePayload>>,
    other_income: Option<Vec<OtherIncomePayload>>,
    social_security: Option<SocialSecurityPayload>,
    college_adjustments: Option<CollegeAdjustmentsPayload>,
    scenario: Option<ScenarioPayload>,
    compare_scenarios: Option<Vec<ScenarioPayload>>,
    monte_carlo: Option<MonteCarloPayload>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct PersonPayload {
    name: Option<String>,
    current_age: Option<i32>,
    base_income: Option<f64>,
    raise_rate: Option<f64>,
    job_changes: Option<Vec<JobChangePayload>>,
    retirement_age: Option<i32>,
    ss_monthly_benefit: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct JobChangePayload {
    effective_year: Option<i32>,
    new_income: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ChildPayload {
    name: Option<String>,
    birth_year: Option<i32>,
    location: Option<String>,
    school_type: Option<ApiInstitution>,
    college_type: Option<ApiInstitution>,
    college_location: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct FamilyExpensesPayload {
    location: Option<String>,
    strategy: Option<ApiSpendingStrategy>,
    fixed_annual: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RelocationPayload {
    year: Option<i32>,
    location: Option<String>,
    strategy: Option<ApiSpendingStrategy>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct HousePayload {
    name: Option<String>,
    current_value: Option<f64>,
    property_tax_rate: Option<f64>,
    home_insurance: Option<f64>,
    maintenance_rate: Option<f64>,
    upkeep_costs: Option<f64>,
    mortgage_balance: Option<f64>,
    mortgage_rate: Option<f64>,
    mortgage_years_left: Option<u32>,
    timeline: Option<Vec<HouseTimelinePayload>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct HouseTimelinePayload {
    year: Option<i32>,
    status: Option<ApiHouseStatus>,
    rental_income: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct DebtPayload {
    name: Option<String>,
    annual_payment: Option<f64>,
    start_year: Option<i32>,
    end_year: Option<i32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RecurringExpensePayload {
    name: Option<String>,
    amount: Option<f64>,
    frequency_years: Option<u32>,
    start_year: Option<i32>,
    end_year: Option<i32>,
    inflation_adjust: Option<bool>,
    financing_years: Option<u32>,
    interest_rate: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct OtherIncomePayload {
    name: Option<String>,
    annual_amount: Option<f64>,
    start_year: Option<i32>,
    end_year: Option<i32>,
    inflation_adjust: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct SocialSecurityPayload {
    insolvency_enabled: Option<bool>,
    insolvency_year: Option<i32>,
    reduction: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct CollegeAdjustmentsPayload {
    food: Option<f64>,
    transportation: Option<f64>,
    entertainment: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ScenarioPayload {
    preset: Option<ApiScenarioPreset>,
    name: Option<String>,
    investment_return_rate: Option<f64>,
    return_volatility: Option<f64>,
    inflation_rate: Option<f64>,
    expense_growth_rate: Option<f64>,
    healthcare_inflation_rate: Option<f64>,
    real_estate_appreciation: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct MonteCarloPayload {
    trials: Option<u32>,
    return_model: Option<ApiReturnModel>,
    seed: Option<u64>,
}

#[derive(Debug, Parser)]
#[command(
    name = "nestplan",
    about = "Household cashflow and net-worth projection with Monte Carlo market scenarios"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Serve the JSON API.
    Serve {
        #[arg(long, default_value_t = 8080)]
        port: u16,
    },
    /// Project a household described in a JSON file and print the result.
    Project(ProjectArgs),
}

#[derive(Debug, Args)]
pub struct ProjectArgs {
    #[arg(long, help = "Household JSON, same shape as the API request body")]
    input: PathBuf,
    #[arg(long, conflicts_with = "compare")]
    monte_carlo: bool,
    #[arg(long, help = "Summarise the household under several scenarios")]
    compare: bool,
    #[arg(long, help = "Monte Carlo trial count, capped at 1000")]
    trials: Option<u32>,
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long, value_enum)]
    return_model: Option<CliReturnModel>,
}

#[derive(Debug)]
struct PlanRequest {
    household: Household,
    scenario: EconomicScenario,
    comparison: Vec<EconomicScenario>,
    monte_carlo: MonteCarloSettings,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProjectionResponse {
    scenario: String,
    current_year: i32,
    end_year: i32,
    years: Vec<YearRecord>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MonteCarloResponse {
    scenario: String,
    #[serde(flatten)]
    result: MonteCarloResult,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CompareResponse {
    scenarios: Vec<ScenarioSummary>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LocationsResponse {
    locations: Vec<&'static str>,
    strategies: [&'static str; 3],
    scenario_presets: [&'static str; 3],
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

pub async fn run(cli: Cli) -> Result<(), String> {
    match cli.command {
        Command::Serve { port } => run_http_server(port)
            .await
            .map_err(|e| format!("Server error: {e}")),
        Command::Project(args) => {
            let output = run_project(&args)?;
            println!("{output}");
            Ok(())
        }
    }
}

fn run_project(args: &ProjectArgs) -> Result<String, String> {
    let json = fs::read_to_string(&args.input)
        .map_err(|e| format!("cannot read {}: {e}", args.input.display()))?;
    let mut request = plan_request_from_json(&json, default_current_year())?;

    if let Some(trials) = args.trials {
        request.monte_carlo.trials = trials;
    }
    if let Some(seed) = args.seed {
        request.monte_carlo.seed = Some(seed);
    }
    if let Some(model) = args.return_model {
        request.monte_carlo.return_model = model.into();
    }

    if args.compare {
        to_json(&compare(&request).map_err(|e| e.to_string())?)
    } else if args.monte_carlo {
        to_json(&monte_carlo(&request).map_err(|e| e.to_string())?)
    } else {
        to_json(&projection(&request).map_err(|e| e.to_string())?)
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|e| format!("cannot encode result: {e}"))
}

fn projection(request: &PlanRequest) -> Result<ProjectionResponse, PlanError> {
    let years = run_projection(&request.household, &request.scenario)?;
    Ok(ProjectionResponse {
        scenario: request.scenario.name.clone(),
        current_year: request.household.current_year,
        end_year: request.household.end_year(),
        years,
    })
}

fn monte_carlo(request: &PlanRequest) -> Result<MonteCarloResponse, PlanError> {
    let result = run_monte_carlo(&request.household, &request.scenario, &request.monte_carlo)?;
    Ok(MonteCarloResponse {
        scenario: request.scenario.name.clone(),
        result,
    })
}

fn compare(request: &PlanRequest) -> Result<CompareResponse, PlanError> {
    Ok(CompareResponse {
        scenarios: compare_scenarios(&request.household, &request.comparison)?,
    })
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = Router::new()
        .route("/api/projection", post(projection_handler))
        .route("/api/monte-carlo", post(monte_carlo_handler))
        .route("/api/compare", post(compare_handler))
        .route("/api/locations", get(locations_handler))
        .fallback(not_found_handler);

    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "nestplan HTTP API listening");

    axum::serve(listener, app).await
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn projection_handler(body: String) -> Response {
    plan_handler_impl(&body, |request| projection(request).map(into_json_ok))
}

async fn monte_carlo_handler(body: String) -> Response {
    plan_handler_impl(&body, |request| monte_carlo(request).map(into_json_ok))
}

async fn compare_handler(body: String) -> Response {
    plan_handler_impl(&body, |request| compare(request).map(into_json_ok))
}

async fn locations_handler() -> Response {
    json_response(
        StatusCode::OK,
        LocationsResponse {
            locations: locations().collect(),
            strategies: ["conservative", "average", "high-end"],
            scenario_presets: ["conservative", "moderate", "aggressive"],
        },
    )
}

fn plan_handler_impl(
    body: &str,
    run: impl FnOnce(&PlanRequest) -> Result<Response, PlanError>,
) -> Response {
    let request = match plan_request_from_json(body, default_current_year()) {
        Ok(request) => request,
        Err(msg) => return error_response(StatusCode::BAD_REQUEST, &msg),
    };
    match run(&request) {
        Ok(response) => response,
        Err(e) => error_response(StatusCode::BAD_REQUEST, &e.to_string()),
    }
}

fn into_json_ok<T: Serialize>(body: T) -> Response {
    json_response(StatusCode::OK, body)
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, axum::Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
    );
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    debug!(status = status.as_u16(), error = msg, "request rejected");
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

fn plan_request_from_json(json: &str, fallback_year: i32) -> Result<PlanRequest, String> {
    let payload = serde_json::from_str::<PlanPayload>(json)
        .map_err(|e| format!("Invalid JSON payload: {e}"))?;
    plan_request_from_payload(payload, fallback_year).map_err(|e| e.to_string())
}

fn plan_request_from_payload(
    payload: PlanPayload,
    fallback_year: i32,
) -> Result<PlanRequest, PlanError> {
    let current_year = payload.current_year.unwrap_or(fallback_year);

    let parents = payload.parents.unwrap_or_default();
    if parents.len() != 2 {
        return Err(PlanError::invalid(
            "parents",
            format!("must list exactly two people, got {}", parents.len()),
        ));
    }
    let parents = parents
        .into_iter()
        .enumerate()
        .map(|(idx, p)| person_from_payload(idx, p))
        .collect::<Result<Vec<_>, _>>()?;
    let parents: [Person; 2] = parents
        .try_into()
        .map_err(|_| PlanError::invalid("parents", "must list exactly two people"))?;

    let family = payload.family_expenses.unwrap_or_default();
    let family_location = family
        .location
        .clone()
        .unwrap_or_else(|| DEFAULT_LOCATION.to_string());
    let family_expenses = match family.fixed_annual {
        Some(annual) => FamilyExpenses::Fixed { annual },
        None => FamilyExpenses::Template {
            location: family_location.clone(),
            strategy: family
                .strategy
                .map(Into::into)
                .unwrap_or(SpendingStrategy::Average),
        },
    };

    let children = payload
        .children
        .unwrap_or_default()
        .into_iter()
        .enumerate()
        .map(|(idx, c)| child_from_payload(idx, c, &family_location))
        .collect::<Result<Vec<_>, _>>()?;

    let relocations = payload
        .relocations
        .unwrap_or_default()
        .into_iter()
        .enumerate()
        .map(|(idx, r)| -> Result<Relocation, PlanError> {
            Ok(Relocation {
                year: required(r.year, || format!("relocations[{idx}].year"))?,
                location: required(r.location, || format!("relocations[{idx}].location"))?,
                strategy: r
                    .strategy
                    .map(Into::into)
                    .unwrap_or(SpendingStrategy::Average),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let houses = payload
        .houses
        .unwrap_or_default()
        .into_iter()
        .enumerate()
        .map(|(idx, h)| house_from_payload(idx, h))
        .collect::<Result<Vec<_>, _>>()?;

    let debts = payload
        .debts
        .unwrap_or_default()
        .into_iter()
        .enumerate()
        .map(|(idx, d)| -> Result<Debt, PlanError> {
            Ok(Debt {
                name: d.name.unwrap_or_else(|| format!("Debt {}", idx + 1)),
                annual_payment: d.annual_payment.unwrap_or(0.0),
                start_year: d.start_year.unwrap_or(current_year),
                end_year: required(d.end_year, || format!("debts[{idx}].endYear"))?,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let recurring_expenses = payload
        .recurring_expenses
        .unwrap_or_default()
        .into_iter()
        .enumerate()
        .map(|(idx, r)| RecurringExpense {
            name: r.name.unwrap_or_else(|| format!("Recurring {}", idx + 1)),
            amount: r.amount.unwrap_or(0.0),
            frequency_years: r.frequency_years.unwrap_or(1),
            start_year: r.start_year.unwrap_or(current_year),
            end_year: r.end_year,
            inflation_adjust: r.inflation_adjust.unwrap_or(false),
            financing_years: r.financing_years.unwrap_or(0),
            interest_rate: r.interest_rate.unwrap_or(0.0) / 100.0,
        })
        .collect();

    let other_income = payload
        .other_income
        .unwrap_or_default()
        .into_iter()
        .enumerate()
        .map(|(idx, o)| OtherIncome {
            name: o.name.unwrap_or_else(|| format!("Income {}", idx + 1)),
            annual_amount: o.annual_amount.unwrap_or(0.0),
            start_year: o.start_year.unwrap_or(current_year),
            end_year: o.end_year,
            inflation_adjust: o.inflation_adjust.unwrap_or(false),
        })
        .collect();

    let ss = payload.social_security.unwrap_or_default();
    let ss_defaults = SocialSecurityPolicy::default();
    let social_security = SocialSecurityPolicy {
        insolvency_enabled: ss.insolvency_enabled.unwrap_or(ss_defaults.insolvency_enabled),
        insolvency_year: ss.insolvency_year.unwrap_or(ss_defaults.insolvency_year),
        reduction: ss
            .reduction
            .map_or(ss_defaults.reduction, |v| v / 100.0),
    };

    let college = payload.college_adjustments.unwrap_or_default();
    let college_defaults = CollegeAdjustments::default();
    let college_adjustments = CollegeAdjustments {
        food: college.food.map_or(college_defaults.food, |v| v / 100.0),
        transportation: college
            .transportation
            .map_or(college_defaults.transportation, |v| v / 100.0),
        entertainment: college
            .entertainment
            .map_or(college_defaults.entertainment, |v| v / 100.0),
    };

    let household = Household {
        current_year,
        parents,
        children,
        family_expenses,
        relocations,
        healthcare_annual: payload.healthcare_annual.unwrap_or(0.0),
        starting_net_worth: payload.starting_net_worth.unwrap_or(0.0),
        houses,
        debts,
        recurring_expenses,
        other_income,
        social_security,
        college_adjustments,
    };

    let scenario = scenario_from_payload(payload.scenario.unwrap_or_default());
    let comparison = match payload.compare_scenarios {
        Some(list) if !list.is_empty() => list.into_iter().map(scenario_from_payload).collect(),
        _ => vec![
            EconomicScenario::conservative(),
            EconomicScenario::moderate(),
            EconomicScenario::aggressive(),
        ],
    };

    let mc = payload.monte_carlo.unwrap_or_default();
    let mc_defaults = MonteCarloSettings::default();
    let monte_carlo = MonteCarloSettings {
        trials: mc.trials.unwrap_or(mc_defaults.trials),
        return_model: mc
            .return_model
            .map(Into::into)
            .unwrap_or(mc_defaults.return_model),
        seed: mc.seed,
    };

    validate(&household, &scenario)?;
    for alternative in &comparison {
        validate(&household, alternative)?;
    }

    Ok(PlanRequest {
        household,
        scenario,
        comparison,
        monte_carlo,
    })
}

fn person_from_payload(idx: usize, payload: PersonPayload) -> Result<Person, PlanError> {
    let job_changes = payload
        .job_changes
        .unwrap_or_default()
        .into_iter()
        .enumerate()
        .map(|(j, change)| -> Result<JobChange, PlanError> {
            Ok(JobChange {
                effective_year: required(change.effective_year, || {
                    format!("parents[{idx}].jobChanges[{j}].effectiveYear")
                })?,
                new_income: required(change.new_income, || {
                    format!("parents[{idx}].jobChanges[{j}].newIncome")
                })?,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Person {
        name: payload
            .name
            .unwrap_or_else(|| format!("Parent {}", idx + 1)),
        current_age: required(payload.current_age, || format!("parents[{idx}].currentAge"))?,
        base_income: payload.base_income.unwrap_or(0.0),
        raise_rate: payload.raise_rate.unwrap_or(DEFAULT_RAISE_PERCENT) / 100.0,
        job_changes,
        retirement_age: payload.retirement_age.unwrap_or(DEFAULT_RETIREMENT_AGE),
        ss_monthly_benefit: payload.ss_monthly_benefit.unwrap_or(0.0),
    })
}

fn child_from_payload(
    idx: usize,
    payload: ChildPayload,
    family_location: &str,
) -> Result<Child, PlanError> {
    let location = payload
        .location
        .unwrap_or_else(|| family_location.to_string());
    Ok(Child {
        name: payload
            .name
            .unwrap_or_else(|| format!("Child {}", idx + 1)),
        birth_year: required(payload.birth_year, || format!("children[{idx}].birthYear"))?,
        school_type: payload
            .school_type
            .map(Into::into)
            .unwrap_or(SchoolType::Public),
        college_type: payload
            .college_type
            .map(Into::into)
            .unwrap_or(CollegeType::Public),
        college_location: payload.college_location.unwrap_or_else(|| location.clone()),
        location,
    })
}

fn house_from_payload(idx: usize, payload: HousePayload) -> Result<House, PlanError> {
    let timeline = payload
        .timeline
        .unwrap_or_default()
        .into_iter()
        .enumerate()
        .map(|(j, entry)| -> Result<HouseTimelineEntry, PlanError> {
            Ok(HouseTimelineEntry {
                year: required(entry.year, || format!("houses[{idx}].timeline[{j}].year"))?,
                status: required(entry.status, || format!("houses[{idx}].timeline[{j}].status"))?
                    .into(),
                rental_income: entry.rental_income.unwrap_or(0.0),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(House {
        name: payload
            .name
            .unwrap_or_else(|| format!("House {}", idx + 1)),
        current_value: payload.current_value.unwrap_or(0.0),
        property_tax_rate: payload.property_tax_rate.unwrap_or(0.0) / 100.0,
        home_insurance: payload.home_insurance.unwrap_or(0.0),
        maintenance_rate: payload.maintenance_rate.unwrap_or(0.0) / 100.0,
        upkeep_costs: payload.upkeep_costs.unwrap_or(0.0),
        mortgage_balance: payload.mortgage_balance.unwrap_or(0.0),
        mortgage_rate: payload.mortgage_rate.unwrap_or(0.0) / 100.0,
        mortgage_years_left: payload.mortgage_years_left.unwrap_or(0),
        timeline,
    })
}

fn scenario_from_payload(payload: ScenarioPayload) -> EconomicScenario {
    let mut scenario = payload
        .preset
        .map(EconomicScenario::from)
        .unwrap_or_else(EconomicScenario::moderate);
    let customised = payload.investment_return_rate.is_some()
        || payload.return_volatility.is_some()
        || payload.inflation_rate.is_some()
        || payload.expense_growth_rate.is_some()
        || payload.healthcare_inflation_rate.is_some()
        || payload.real_estate_appreciation.is_some();

    if let Some(v) = payload.investment_return_rate {
        scenario.investment_return_rate = v / 100.0;
    }
    if let Some(v) = payload.return_volatility {
        scenario.return_volatility = v / 100.0;
    }
    if let Some(v) = payload.inflation_rate {
        scenario.inflation_rate = v / 100.0;
    }
    if let Some(v) = payload.expense_growth_rate {
        scenario.expense_growth_rate = v / 100.0;
    }
    if let Some(v) = payload.healthcare_inflation_rate {
        scenario.healthcare_inflation_rate = v / 100.0;
    }
    if let Some(v) = payload.real_estate_appreciation {
        scenario.real_estate_appreciation = v / 100.0;
    }

    match payload.name {
        Some(name) => scenario.name = name,
        None if customised => scenario.name = format!("{} (custom)", scenario.name),
        None => {}
    }
    scenario
}

fn required<T>(value: Option<T>, field: impl FnOnce() -> String) -> Result<T, PlanError> {
    value.ok_or_else(|| PlanError::invalid(field(), "is required"))
}

fn default_current_year() -> i32 {
    Utc::now().year()
}
