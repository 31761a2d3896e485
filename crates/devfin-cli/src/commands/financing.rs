use clap::Args;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;

use devfin_core::financing::project_state::{self, DevelopmentLocation, ProjectState};
use devfin_core::financing::{
    evaluate_scenario, get_applicable_methods, BoundPolicy, DevelopmentPhase, DevelopmentType,
    FinancingCatalog, FinancingMethod, ScenarioInput,
};

use crate::input;

/// Arguments for listing the cost-of-capital catalog
#[derive(Args)]
pub struct MethodsArgs {
    /// Path to a JSON/YAML catalog replacing the built-in cost ranges
    #[arg(long)]
    pub catalog: Option<String>,
}

/// Arguments for the applicability lookup
#[derive(Args)]
pub struct ApplicableArgs {
    /// Development phase: pre-construction, construction, post-construction
    #[arg(long)]
    pub phase: DevelopmentPhase,

    /// Development type (only used in the construction phase), e.g. bts, btr, hotels
    #[arg(long, default_value = "bts")]
    pub development_type: DevelopmentType,
}

/// Arguments for a financing scenario evaluation
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct EvaluateArgs {
    /// Development phase: pre-construction, construction, post-construction
    #[arg(long)]
    pub phase: Option<DevelopmentPhase>,

    /// Development type (only used in the construction phase), e.g. bts, btr, hotels
    #[arg(long)]
    pub development_type: Option<DevelopmentType>,

    /// Total investment
    #[arg(long)]
    pub investment: Option<Decimal>,

    /// Total revenue
    #[arg(long)]
    pub revenue: Option<Decimal>,

    /// Leverage per method as "Method=fraction" (e.g. "Bank Loan=0.5"); repeatable
    #[arg(long = "leverage", value_name = "METHOD=FRACTION")]
    pub leverage: Vec<String>,

    /// Interest rate override as "Method=rate" (e.g. "Bank Loan=0.05"); repeatable
    #[arg(long = "rate", value_name = "METHOD=RATE")]
    pub rate: Vec<String>,

    /// Clamp out-of-range leverage and rates instead of rejecting them
    #[arg(long)]
    pub clamp: bool,

    /// Path to a JSON/YAML catalog replacing the built-in cost ranges
    #[arg(long)]
    pub catalog: Option<String>,

    /// Path to JSON/YAML request file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for the project-state assessment
#[derive(Args)]
pub struct AssessArgs {
    /// Land has been acquired
    #[arg(long)]
    pub land_acquired: bool,

    /// Share of units pre-sold (e.g. 0.25 for 25%)
    #[arg(long, default_value = "0")]
    pub presales: Decimal,

    /// Share of construction completed
    #[arg(long, default_value = "0")]
    pub construction_progress: Decimal,

    /// Location: urban, suburbs, non-growing
    #[arg(long, default_value = "urban")]
    pub location: DevelopmentLocation,

    /// Path to JSON/YAML project state file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

/// Full scenario request as read from a file or stdin.
#[derive(Debug, Deserialize)]
struct EvaluateRequest {
    phase: DevelopmentPhase,
    #[serde(default)]
    development_type: DevelopmentType,
    total_investment: Decimal,
    total_revenue: Decimal,
    #[serde(default)]
    selections: BTreeMap<FinancingMethod, Decimal>,
    #[serde(default)]
    rate_overrides: BTreeMap<FinancingMethod, Decimal>,
    #[serde(default)]
    bound_policy: BoundPolicy,
}

#[derive(Debug, Serialize)]
struct MethodRow {
    method: FinancingMethod,
    min_rate: Decimal,
    max_rate: Decimal,
    default_rate: Decimal,
}

#[derive(Debug, Serialize)]
struct LimitRow {
    method: FinancingMethod,
    max_leverage: Decimal,
    offered: bool,
}

const DEFAULT_INVESTMENT: Decimal = dec!(500000);
const DEFAULT_REVENUE: Decimal = dec!(1000000);

pub fn run_methods(args: MethodsArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let custom = load_catalog(args.catalog.as_deref())?;
    let catalog = custom.as_ref().unwrap_or_else(|| FinancingCatalog::standard());

    let rows: Vec<MethodRow> = catalog
        .entries()
        .iter()
        .map(|e| MethodRow {
            method: e.method,
            min_rate: e.cost_range.min,
            max_rate: e.cost_range.max,
            default_rate: e.cost_range.midpoint(),
        })
        .collect();
    Ok(serde_json::to_value(rows)?)
}

pub fn run_applicable(args: ApplicableArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let applicable = get_applicable_methods(args.phase, args.development_type);
    let rows: Vec<LimitRow> = applicable
        .limits
        .iter()
        .map(|l| LimitRow {
            method: l.method,
            max_leverage: l.max_leverage,
            offered: applicable.is_offered(l.method),
        })
        .collect();
    Ok(json!({
        "phase": applicable.phase,
        "development_type": applicable.development_type,
        "methods": rows,
    }))
}

pub fn run_evaluate(args: EvaluateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let request: EvaluateRequest = if let Some(ref path) = args.input {
        input::file::read_document(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        data
    } else {
        request_from_flags(&args)?
    };

    let custom = load_catalog(args.catalog.as_deref())?;
    let catalog = custom.as_ref().unwrap_or_else(|| FinancingCatalog::standard());

    let applicable = get_applicable_methods(request.phase, request.development_type);
    let scenario = ScenarioInput {
        total_investment: request.total_investment,
        total_revenue: request.total_revenue,
        selections: request.selections,
        rate_overrides: request.rate_overrides,
        bound_policy: request.bound_policy,
    };

    let result = evaluate_scenario(&applicable, catalog, &scenario)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_assess(args: AssessArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let state: ProjectState = if let Some(ref path) = args.input {
        input::file::read_document(path)?
    } else {
        ProjectState {
            land_acquired: args.land_acquired,
            presales: args.presales,
            construction_progress: args.construction_progress,
            location: args.location,
        }
    };

    let result = project_state::assess_project(&state)?;
    Ok(serde_json::to_value(result)?)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn request_from_flags(args: &EvaluateArgs) -> Result<EvaluateRequest, Box<dyn std::error::Error>> {
    Ok(EvaluateRequest {
        phase: args
            .phase
            .ok_or("--phase is required (or provide --input)")?,
        development_type: args.development_type.unwrap_or_default(),
        total_investment: args.investment.unwrap_or(DEFAULT_INVESTMENT),
        total_revenue: args.revenue.unwrap_or(DEFAULT_REVENUE),
        selections: parse_assignments(&args.leverage)?,
        rate_overrides: parse_assignments(&args.rate)?,
        bound_policy: if args.clamp {
            BoundPolicy::Clamp
        } else {
            BoundPolicy::Reject
        },
    })
}

fn load_catalog(path: Option<&str>) -> Result<Option<FinancingCatalog>, Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            let catalog: FinancingCatalog = input::file::read_document(p)?;
            log::debug!("loaded catalog with {} entries from {p}", catalog.entries().len());
            Ok(Some(catalog))
        }
        None => Ok(None),
    }
}

fn parse_assignments(
    specs: &[String],
) -> Result<BTreeMap<FinancingMethod, Decimal>, Box<dyn std::error::Error>> {
    let mut out = BTreeMap::new();
    for spec in specs {
        let (method, value) = parse_assignment(spec)?;
        if out.insert(method, value).is_some() {
            return Err(format!("'{method}' given more than once").into());
        }
    }
    Ok(out)
}

fn parse_assignment(spec: &str) -> Result<(FinancingMethod, Decimal), Box<dyn std::error::Error>> {
    let (name, value) = spec
        .rsplit_once('=')
        .ok_or_else(|| format!("Expected METHOD=VALUE, got '{spec}'"))?;
    let method: FinancingMethod = name.parse()?;
    let value: Decimal = value
        .trim()
        .parse()
        .map_err(|e| format!("Invalid number '{}' for {method}: {e}", value.trim()))?;
    Ok((method, value))
}
