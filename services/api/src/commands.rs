use crate::infra::{describe_source, load_cabinets, parse_business_hours, parse_timestamp};
use chrono::{DateTime, FixedOffset, Local, SubsecRound};
use clap::Args;
use std::fmt::Write as _;
use std::fs::File;
use std::io;
use std::path::PathBuf;
use store_dr::config::AppConfig;
use store_dr::error::AppError;
use store_dr::unloadability::{
    cabinet_template, write_cabinet_csv, CabinetSnapshot, EvaluationRequest, EvaluationResponse,
    PolicyConfig, PolicySource, PolicyStore, ScoredCabinet, UnloadabilityEngine,
    DEFAULT_POLICY_YAML,
};

#[derive(Args, Debug)]
pub(crate) struct EvaluateArgs {
    /// Cabinet table to score (`.csv`, or a JSON array of cabinets)
    #[arg(long)]
    pub(crate) cabinets: PathBuf,
    /// Policy YAML to use instead of CONFIG_DIR/config.yaml
    #[arg(long)]
    pub(crate) policy: Option<PathBuf>,
    /// Store opening flag: 1 while customers are in the store, 0 when closed
    #[arg(long, default_value = "1", value_parser = parse_business_hours)]
    pub(crate) business_hours: u8,
    /// Store identifier echoed in the response
    #[arg(long, default_value = "S001")]
    pub(crate) store_id: String,
    /// Print the full evaluation response as JSON instead of a table
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug)]
pub(crate) struct TemplateArgs {
    /// Number of refrigerator rows (R-01..)
    #[arg(long, default_value_t = 4)]
    pub(crate) refrigerators: usize,
    /// Number of freezer rows (F-01..)
    #[arg(long, default_value_t = 3)]
    pub(crate) freezers: usize,
    /// Write to this file instead of stdout
    #[arg(long)]
    pub(crate) output: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub(crate) struct PayloadArgs {
    /// Cabinet table to package (`.csv`, or a JSON array of cabinets)
    #[arg(long)]
    pub(crate) cabinets: PathBuf,
    /// Store identifier; blank falls back to S001
    #[arg(long, default_value = "S001")]
    pub(crate) store_id: String,
    /// Store opening flag: 1 while customers are in the store, 0 when closed
    #[arg(long, default_value = "1", value_parser = parse_business_hours)]
    pub(crate) business_hours: u8,
    /// ISO-8601 timestamp with offset; defaults to the local time now
    #[arg(long, value_parser = parse_timestamp)]
    pub(crate) timestamp: Option<DateTime<FixedOffset>>,
    /// Where to write the request JSON
    #[arg(long, default_value = "payload.json")]
    pub(crate) output: PathBuf,
}

#[derive(Args, Debug)]
pub(crate) struct PolicyValidateArgs {
    /// Policy file to check; defaults to CONFIG_DIR/config.yaml
    pub(crate) path: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub(crate) struct PolicyInitArgs {
    /// Overwrite an existing policy file
    #[arg(long)]
    pub(crate) force: bool,
}

pub(crate) fn run_evaluate(args: EvaluateArgs) -> Result<(), AppError> {
    let EvaluateArgs {
        cabinets,
        policy,
        business_hours,
        store_id,
        json,
    } = args;

    let (policy, source) = match policy {
        Some(path) => (PolicyStore::new(&path).load()?, PolicySource::File(path)),
        None => configured_store()?.load_or_default()?,
    };
    let engine = UnloadabilityEngine::new(policy);

    let request = EvaluationRequest {
        store_id,
        timestamp: None,
        business_hours_flag: business_hours,
        cabinets: load_cabinets(&cabinets)?,
    };
    let response = engine.evaluate(request)?;

    if json {
        eprintln!("Policy: {}", describe_source(&source));
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        print!("{}", render_response(&response, &source));
    }

    Ok(())
}

pub(crate) fn run_cabinet_template(args: TemplateArgs) -> Result<(), AppError> {
    let TemplateArgs {
        refrigerators,
        freezers,
        output,
    } = args;

    let rows = cabinet_template(refrigerators, freezers);
    match output {
        Some(path) => {
            write_cabinet_csv(File::create(&path)?, &rows)?;
            println!("Wrote {} cabinet rows to {}", rows.len(), path.display());
        }
        None => write_cabinet_csv(io::stdout().lock(), &rows)?,
    }

    Ok(())
}

pub(crate) fn run_cabinet_payload(args: PayloadArgs) -> Result<(), AppError> {
    let PayloadArgs {
        cabinets,
        store_id,
        business_hours,
        timestamp,
        output,
    } = args;

    let request = build_payload(load_cabinets(&cabinets)?, &store_id, business_hours, timestamp);
    let file = File::create(&output)?;
    serde_json::to_writer_pretty(file, &request)?;

    println!(
        "Wrote request for {} cabinets ({}) to {}",
        request.cabinets.len(),
        request.store_id,
        output.display()
    );
    Ok(())
}

/// Request body for `/api/v1/evaluate`, stamped with the local time when none is given.
pub(crate) fn build_payload(
    cabinets: Vec<CabinetSnapshot>,
    store_id: &str,
    business_hours_flag: u8,
    timestamp: Option<DateTime<FixedOffset>>,
) -> EvaluationRequest {
    let store_id = match store_id.trim() {
        "" => "S001".to_string(),
        trimmed => trimmed.to_string(),
    };
    let timestamp = timestamp.unwrap_or_else(|| Local::now().fixed_offset().trunc_subsecs(0));

    EvaluationRequest {
        store_id,
        timestamp: Some(timestamp),
        business_hours_flag,
        cabinets,
    }
}

pub(crate) fn run_policy_validate(args: PolicyValidateArgs) -> Result<(), AppError> {
    let store = match args.path {
        Some(path) => PolicyStore::new(path),
        None => configured_store()?,
    };

    let policy = store.load()?;
    println!("YAML OK: {}", store.path().display());
    print!("{}", render_policy_summary(&policy));
    Ok(())
}

pub(crate) fn run_policy_init(args: PolicyInitArgs) -> Result<(), AppError> {
    let store = configured_store()?;
    let path = init_policy(&store, args.force)?;
    println!("Wrote built-in policy to {}", path.display());
    Ok(())
}

fn configured_store() -> Result<PolicyStore, AppError> {
    let config = AppConfig::load()?;
    Ok(PolicyStore::new(config.policy.path()))
}

fn init_policy(store: &PolicyStore, force: bool) -> Result<PathBuf, AppError> {
    if store.path().exists() && !force {
        return Err(AppError::Io(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!(
                "{} already exists; pass --force to overwrite",
                store.path().display()
            ),
        )));
    }

    store.save_yaml(DEFAULT_POLICY_YAML)?;
    Ok(store.path().to_path_buf())
}

pub(crate) fn render_response(response: &EvaluationResponse, source: &PolicySource) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Store {} evaluated at {}",
        response.store_id,
        response.evaluated_at.to_rfc3339()
    );
    let _ = writeln!(out, "Policy: {}", describe_source(source));
    let _ = writeln!(
        out,
        "{:>4}  {:<10} {:<13} {:>6}  {:<22} {}",
        "Rank", "Cabinet", "Type", "Score", "Class", "Breached"
    );
    for cabinet in &response.cabinets {
        let _ = writeln!(out, "{}", render_row(cabinet));
    }

    let sheddable = response
        .cabinets
        .iter()
        .filter(|cabinet| cabinet.classification.is_sheddable())
        .count();
    let _ = writeln!(
        out,
        "{sheddable} of {} cabinets may be shed",
        response.cabinets.len()
    );
    out
}

fn render_row(cabinet: &ScoredCabinet) -> String {
    let breached = if cabinet.breached_limits.is_empty() {
        "-".to_string()
    } else {
        cabinet.breached_limits.join(", ")
    };
    format!(
        "{:>4}  {:<10} {:<13} {:>6.3}  {:<22} {}",
        cabinet.rank,
        cabinet.cabinet_id(),
        cabinet.snapshot.cabinet_type.label(),
        cabinet.unloadability_score,
        cabinet.classification.label(),
        breached
    )
}

fn render_policy_summary(policy: &PolicyConfig) -> String {
    let mut out = String::new();
    for (cabinet_type, table) in &policy.thresholds {
        let _ = writeln!(
            out,
            "  {}: air_return_c_max {} rise_c_per_min_max {}",
            cabinet_type.label(),
            table.air_return_c_max,
            table.rise_c_per_min_max
        );
    }
    let _ = writeln!(
        out,
        "  weights total {:.2}, defrost penalty {}",
        policy.weights.total(),
        policy.defrost.penalty_factor
    );
    out
}
