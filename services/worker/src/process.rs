use crate::infra::{build_worker, load_snapshot, parse_date, snapshot_path};
use chrono::{Local, NaiveDate, Utc};
use clap::Args;
use rehab_discharge::config::AppConfig;
use rehab_discharge::error::AppError;
use rehab_discharge::telemetry;
use rehab_discharge::workflows::discharge::{
    parse_activity_list, select_work_items, write_results_csv, IntakeError, IntakeRules,
    WorkItem, WorkItemResult, WorkItemStatus,
};
use std::collections::HashSet;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

#[derive(Args, Debug)]
pub(crate) struct ProcessArgs {
    /// JSON array of queued work items, as written by `queue`
    #[arg(long)]
    pub(crate) items: PathBuf,
    /// Case snapshot to run against (defaults to DISCHARGE_SNAPSHOT_PATH)
    #[arg(long)]
    pub(crate) snapshot: Option<PathBuf>,
    /// Processing date used for task start and due dates (defaults to today)
    #[arg(long, value_parser = parse_date)]
    pub(crate) today: Option<NaiveDate>,
    /// Write one CSV row per work item to this path
    #[arg(long)]
    pub(crate) report_csv: Option<PathBuf>,
    /// Print every change applied to the case snapshot
    #[arg(long)]
    pub(crate) show_mutations: bool,
}

#[derive(Args, Debug)]
pub(crate) struct QueueArgs {
    /// Activity list export (JSON array)
    #[arg(long)]
    pub(crate) activities: PathBuf,
    /// Previously queued work items; their references are not queued again
    #[arg(long)]
    pub(crate) existing: Option<PathBuf>,
    /// Only activities newer than this many days are queued (defaults to DISCHARGE_QUEUE_LOOKBACK_DAYS)
    #[arg(long, value_parser = clap::value_parser!(i64).range(1..))]
    pub(crate) lookback_days: Option<i64>,
    /// Write the selected work items here instead of stdout
    #[arg(long)]
    pub(crate) output: Option<PathBuf>,
}

pub(crate) fn run_process(args: ProcessArgs) -> Result<(), AppError> {
    let ProcessArgs {
        items,
        snapshot,
        today,
        report_csv,
        show_mutations,
    } = args;

    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let path = snapshot_path(snapshot, config.discharge.snapshot_path.as_ref())?;
    let system = load_snapshot(&path)?;
    let items = load_work_items(&items)?;
    let today = today.unwrap_or_else(|| Local::now().date_naive());

    let worker = build_worker(&system, items.len());
    let results = worker.process_batch(&items, today);
    render_results(&results, today);

    if let Some(report_path) = report_csv {
        let file = File::create(&report_path)?;
        write_results_csv(&results, file)?;
        println!("Report written to {}", report_path.display());
    }

    if show_mutations {
        println!();
        println!("Case system changes");
        for mutation in system.mutations() {
            println!(
                "  {}",
                serde_json::to_string(&mutation).map_err(AppError::Output)?
            );
        }
        for event in system.tracked_events() {
            println!("  tracked: {event}");
        }
    }

    Ok(())
}

pub(crate) fn run_queue(args: QueueArgs) -> Result<(), AppError> {
    let QueueArgs {
        activities,
        existing,
        lookback_days,
        output,
    } = args;

    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;
    let rules = IntakeRules::with_lookback_days(
        lookback_days.unwrap_or(config.discharge.queue_lookback_days),
    );

    let entries = parse_activity_list(&fs::read_to_string(&activities)?)?;
    let queued: HashSet<String> = match existing {
        Some(path) => load_work_items(&path)?
            .into_iter()
            .map(|item| item.reference)
            .collect(),
        None => HashSet::new(),
    };

    let items = select_work_items(&entries, Utc::now(), &rules, |reference| {
        queued.contains(reference)
    });
    let rendered = serde_json::to_string_pretty(&items).map_err(AppError::Output)?;

    match output {
        Some(path) => {
            fs::write(&path, rendered)?;
            println!(
                "Queued {} of {} activities into {}",
                items.len(),
                entries.len(),
                path.display()
            );
        }
        None => println!("{rendered}"),
    }

    Ok(())
}

fn load_work_items(path: &Path) -> Result<Vec<WorkItem>, AppError> {
    let raw = fs::read_to_string(path)?;
    let items = serde_json::from_str(&raw).map_err(IntakeError::from)?;
    Ok(items)
}

fn render_results(results: &[WorkItemResult], today: NaiveDate) {
    let completed = results
        .iter()
        .filter(|result| result.status == WorkItemStatus::Completed)
        .count();

    println!("Discharge run for {today}");
    println!(
        "  {} work items, {} completed, {} routed to manual processing",
        results.len(),
        completed,
        results.len() - completed
    );

    for result in results {
        match (&result.report, &result.failure) {
            (Some(report), _) => {
                let outcome = match report.outcome.code() {
                    "" => "discharged",
                    code => code,
                };
                println!(
                    "  - {} citizen {} from {}: {} ({} changes, {} failed sub-operations)",
                    result.reference,
                    report.citizen,
                    report.provider,
                    outcome,
                    report.log.mutation_count(),
                    report.log.failures.len()
                );
            }
            (None, failure) => println!(
                "  - {} FAILED: {}",
                result.reference,
                failure.as_deref().unwrap_or("unknown error")
            ),
        }
    }
}
