use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use tracing::{info, warn};

use crate::filter::DateRange;
use crate::handler;
use crate::providers;
use crate::report::{self, xlsx};
use crate::team::Team;

const DEFAULT_OUTPUT: &str = "Time_Management.xlsx";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Report(ReportArgs),
    Help,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportArgs {
    pub range: DateRange,
    pub teams: Vec<Team>,
    pub output: PathBuf,
    pub input: Option<PathBuf>,
}

/// Parse `workreport` arguments (program name excluded).
///
/// Supported forms:
///   workreport --from 2023-01-01 --to 2023-01-31
///   workreport --from 2023-01-01 --to 2023-01-31 --team cai --team is
///   workreport --from 2023-01-01 --to 2023-01-31 -o january.xlsx --input dump.json
pub fn parse_args(args: &[String]) -> Result<Command> {
    if matches!(args.first().map(String::as_str), None | Some("help" | "-h" | "--help")) {
        return Ok(Command::Help);
    }

    let mut from = None;
    let mut to = None;
    let mut teams: Vec<Team> = Vec::new();
    let mut output = None;
    let mut input = None;
    let mut i = 0;

    while i < args.len() {
        let flag = args[i].as_str();
        let Some(value) = args.get(i + 1) else {
            bail!("Missing value for {flag}");
        };
        match flag {
            "--from" => from = Some(parse_date(value)?),
            "--to" => to = Some(parse_date(value)?),
            "-t" | "--team" => {
                if value.eq_ignore_ascii_case("all") {
                    teams.extend(Team::ALL);
                } else {
                    teams.push(value.parse()?);
                }
            }
            "-o" | "--output" => output = Some(PathBuf::from(value)),
            "-i" | "--input" => input = Some(PathBuf::from(value)),
            other => bail!("Unknown argument: {other}"),
        }
        i += 2;
    }

    let (Some(from), Some(to)) = (from, to) else {
        bail!("Both --from and --to are required");
    };
    if teams.is_empty() {
        teams.extend(Team::ALL);
    }
    let mut seen = Vec::new();
    teams.retain(|team| {
        let fresh = !seen.contains(team);
        seen.push(*team);
        fresh
    });

    Ok(Command::Report(ReportArgs {
        range: DateRange::new(from, to)?,
        teams,
        output: output.unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT)),
        input,
    }))
}

fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{value}', expected YYYY-MM-DD"))
}

/// Collect tasks for every requested team and write the spreadsheet.
pub async fn handle_report(args: ReportArgs) -> Result<()> {
    let source = providers::create_source(args.input.as_deref())?;

    let mut tasks = Vec::new();
    for team in &args.teams {
        info!(team = %team, from = %args.range.from(), to = %args.range.to(), "collecting");
        let collected = handler::collect_tasks(*team, source.as_ref(), &args.range)
            .await
            .with_context(|| format!("Failed to collect tasks for {team}"))?;
        tasks.extend(collected);
    }

    let report = report::build_report(&tasks);
    if !report.incomplete.is_empty() {
        warn!(
            count = report.incomplete.len(),
            "some tasks lack a title or assignee; listed on the Incomplete sheet"
        );
    }
    xlsx::write_workbook(&args.output, &report)?;

    println!(
        "Wrote {}: {} tasks, {} assignees, {} incomplete",
        args.output.display(),
        tasks.len(),
        report.table.rows.len(),
        report.incomplete.len()
    );
    Ok(())
}

pub fn print_help() {
    println!("workreport: share of closed work per assignee and release\n");
    println!("USAGE:");
    println!("  workreport --from <YYYY-MM-DD> --to <YYYY-MM-DD> [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("  -t, --team <cai|is|lingvo|all>  Team to report on (repeatable, default all)");
    println!("  -o, --output <file>             Spreadsheet to write (default {DEFAULT_OUTPUT})");
    println!("  -i, --input <file>              Read work items from a JSON dump instead of the tracker");
    println!();
    println!("CONFIG:");
    println!("  ~/.workreport/config.toml  [tfs] base_url, pat, api_version");
    println!("  WORKREPORT_TFS_URL, WORKREPORT_PAT override the file");
}
