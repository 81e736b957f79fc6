use chrono::NaiveDate;
use clap::Parser;
use polars::prelude::{AnyValue, Column, DataFrame};
use sprint_scheduler::export::{records_to_dataframe, timeline_to_dataframe};
use sprint_scheduler::logging::{LogLevel, init_logging};
use sprint_scheduler::persistence::{load_schedule_from_json, save_schedule_to_json};
use sprint_scheduler::{ProgressNode, Schedule, ScheduleConfig, TaskInput, TimelineScope};
use std::io::{self, Write};
use std::path::PathBuf;
use tracing::{error, info};

#[derive(Debug, Parser)]
#[command(name = "sprint-scheduler", about = "Interactive campaign / sprint / task scheduler")]
struct Args {
    /// Snapshot to load at startup
    #[arg(long)]
    snapshot: Option<PathBuf>,

    /// JSON config used when no snapshot is given
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long, value_enum)]
    log_level: Option<LogLevel>,
}

fn parse_id_list(s: &str) -> Vec<i32> {
    s.split(',')
        .filter_map(|p| p.trim().parse::<i32>().ok())
        .collect()
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

fn cell_text(col: &Column, row_idx: usize) -> String {
    match col.get(row_idx) {
        Ok(AnyValue::Null) | Err(_) => String::new(),
        Ok(AnyValue::Int32(v)) => v.to_string(),
        Ok(AnyValue::Int64(v)) => v.to_string(),
        Ok(AnyValue::String(s)) => s.to_string(),
        Ok(av) => av.to_string(),
    }
}

fn render_df_as_text_table(df: &DataFrame) -> String {
    let columns = df.get_columns();
    let col_names: Vec<String> = columns.iter().map(|c| c.name().to_string()).collect();
    let cells: Vec<Vec<String>> = (0..df.height())
        .map(|row_idx| columns.iter().map(|col| cell_text(col, row_idx)).collect())
        .collect();

    let mut widths: Vec<usize> = col_names.iter().map(|n| n.len()).collect();
    for row in &cells {
        for (ci, s) in row.iter().enumerate() {
            widths[ci] = widths[ci].max(s.len());
        }
    }

    let mut sep = String::from("+");
    for w in &widths {
        sep.push_str(&"-".repeat(*w + 2));
        sep.push('+');
    }

    let push_row = |out: &mut String, values: &[String]| {
        out.push('|');
        for (ci, s) in values.iter().enumerate() {
            out.push(' ');
            out.push_str(s);
            out.push_str(&" ".repeat(widths[ci].saturating_sub(s.len())));
            out.push_str(" |");
        }
        out.push('\n');
    };

    let mut out = String::new();
    out.push_str(&sep);
    out.push('\n');
    push_row(&mut out, &col_names);
    out.push_str(&sep);
    out.push('\n');
    for row in &cells {
        push_row(&mut out, row);
    }
    out.push_str(&sep);
    out.push('\n');
    out
}

fn print_help() {
    println!(
        "Commands:\n  help                                 Show this help\n  campaigns                            List campaigns with progress\n  campaign <name...>                   Add a campaign (owner 1)\n  sprint <campaign_id> <name...>       Add a sprint\n  task <sprint_id> <name> <duration> [preds_csv]\n                                       Add a task\n  preds <task_id> <csv|->              Replace predecessors\n  dur <task_id> <days>                 Set duration\n  start <task_id> <YYYY-MM-DD|->       Set or clear explicit start\n  done <task_id>                       Toggle completion\n  rm <task_id>                         Delete a task\n  clone <campaign_id>                  Copy a campaign\n  progress <campaign|sprint> <id>      Rolled-up progress\n  dates <task_id>                      Effective start/end\n  show [campaign <id>|sprint <id>]     Timeline rows\n  tasks [campaign <id>|sprint <id>]    Task export records\n  json [campaign <id>|sprint <id>]     Timeline rows as chart JSON\n  save <path>                          Write snapshot\n  load <path>                          Read snapshot\n  quit|exit                            Exit"
    );
}

fn parse_scope<'a>(mut parts: impl Iterator<Item = &'a str>) -> Option<TimelineScope> {
    match (parts.next(), parts.next().and_then(|s| s.parse::<i32>().ok())) {
        (None, _) => Some(TimelineScope::All),
        (Some("campaign"), Some(id)) => Some(TimelineScope::Campaign(id)),
        (Some("sprint"), Some(id)) => Some(TimelineScope::Sprint(id)),
        _ => None,
    }
}

fn load_initial(args: &Args) -> Result<Schedule, String> {
    if let Some(path) = &args.snapshot {
        return load_schedule_from_json(path).map_err(|e| e.to_string());
    }
    let config = match &args.config {
        Some(path) => ScheduleConfig::from_json_file(path).map_err(|e| e.to_string())?,
        None => ScheduleConfig::default(),
    };
    Schedule::with_config(config).map_err(|e| e.to_string())
}

fn main() {
    let args = Args::parse();
    if let Err(err) = init_logging(args.log_level) {
        eprintln!("logging disabled: {err}");
    }

    let mut schedule = match load_initial(&args) {
        Ok(schedule) => schedule,
        Err(err) => {
            error!(%err, "could not start");
            std::process::exit(1);
        }
    };
    info!(tasks = schedule.task_count(), "schedule ready");

    println!("Sprint Scheduler (CLI) - type 'help' for commands\n");

    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        print!("> ");
        let _ = io::stdout().flush();
        line.clear();
        match stdin.read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        let mut parts = input.split_whitespace();
        let cmd = parts.next().unwrap_or("");

        match cmd {
            "help" => print_help(),
            "quit" | "exit" => break,
            "campaigns" => {
                for campaign in schedule.campaigns() {
                    let pct = schedule
                        .progress(ProgressNode::Campaign(campaign.id))
                        .unwrap_or(0);
                    println!("{:>4}  {:<30} {:>3}%", campaign.id, campaign.name, pct);
                }
            }
            "campaign" => {
                let name: Vec<&str> = parts.collect();
                if name.is_empty() {
                    println!("Usage: campaign <name...>");
                    continue;
                }
                match schedule.add_campaign(name.join(" "), 1) {
                    Ok(id) => println!("Added campaign id={id}"),
                    Err(e) => println!("Error: {e}"),
                }
            }
            "sprint" => {
                let campaign = parts.next().and_then(|s| s.parse::<i32>().ok());
                let name: Vec<&str> = parts.collect();
                match campaign {
                    Some(campaign) if !name.is_empty() => {
                        match schedule.add_sprint(campaign, name.join(" ")) {
                            Ok(id) => println!("Added sprint id={id}"),
                            Err(e) => println!("Error: {e}"),
                        }
                    }
                    _ => println!("Usage: sprint <campaign_id> <name...>"),
                }
            }
            "task" => {
                let sprint_s = parts.next();
                let name_s = parts.next();
                let dur_s = parts.next();
                let preds_s = parts.next();
                match (sprint_s, name_s, dur_s) {
                    (Some(sprint_s), Some(name), Some(dur_s)) => {
                        let sprint: i32 = match sprint_s.parse() { Ok(v) => v, Err(_) => { println!("Invalid sprint id"); continue; } };
                        let duration: i64 = match dur_s.parse() { Ok(v) => v, Err(_) => { println!("Invalid duration"); continue; } };
                        let preds = preds_s.map(parse_id_list).unwrap_or_default();
                        match schedule.upsert_task(TaskInput::new(sprint, name, duration).after(preds)) {
                            Ok(id) => println!("Added task id={id}"),
                            Err(e) => println!("Error: {e}"),
                        }
                    }
                    _ => println!("Usage: task <sprint_id> <name> <duration> [preds_csv]"),
                }
            }
            "preds" => {
                match (parts.next().and_then(|s| s.parse::<i32>().ok()), parts.next()) {
                    (Some(id), Some(csv)) => {
                        let preds = if csv == "-" { Vec::new() } else { parse_id_list(csv) };
                        match schedule.set_predecessors(id, &preds) {
                            Ok(stored) => println!("Predecessors of {id}: {stored:?}"),
                            Err(e) => println!("Error: {e}"),
                        }
                    }
                    _ => println!("Usage: preds <task_id> <csv|->"),
                }
            }
            "dur" => {
                match (
                    parts.next().and_then(|s| s.parse::<i32>().ok()),
                    parts.next().and_then(|s| s.parse::<i64>().ok()),
                ) {
                    (Some(id), Some(days)) => match schedule.set_task_duration(id, days) {
                        Ok(()) => println!("Duration set."),
                        Err(e) => println!("Error: {e}"),
                    },
                    _ => println!("Usage: dur <task_id> <days>"),
                }
            }
            "start" => {
                match (parts.next().and_then(|s| s.parse::<i32>().ok()), parts.next()) {
                    (Some(id), Some("-")) => match schedule.set_task_start_date(id, None) {
                        Ok(()) => println!("Start cleared."),
                        Err(e) => println!("Error: {e}"),
                    },
                    (Some(id), Some(date_s)) => {
                        let Some(date) = parse_date(date_s) else {
                            println!("Invalid date (YYYY-MM-DD)");
                            continue;
                        };
                        match schedule.set_task_start_date(id, Some(date)) {
                            Ok(()) => println!("Start set."),
                            Err(e) => println!("Error: {e}"),
                        }
                    }
                    _ => println!("Usage: start <task_id> <YYYY-MM-DD|->"),
                }
            }
            "done" => match parts.next().and_then(|s| s.parse::<i32>().ok()) {
                Some(id) => match schedule.toggle_task_completion(id) {
                    Ok(completed) => println!("Task {id} completed={completed}"),
                    Err(e) => println!("Error: {e}"),
                },
                None => println!("Usage: done <task_id>"),
            },
            "rm" => match parts.next().and_then(|s| s.parse::<i32>().ok()) {
                Some(id) => match schedule.delete_task(id) {
                    Ok(()) => println!("Task {id} deleted."),
                    Err(e) => println!("Error: {e}"),
                },
                None => println!("Usage: rm <task_id>"),
            },
            "clone" => match parts.next().and_then(|s| s.parse::<i32>().ok()) {
                Some(id) => match schedule.clone_campaign(id, 1) {
                    Ok(copy) => println!("Cloned campaign {id} as {copy}"),
                    Err(e) => println!("Error: {e}"),
                },
                None => println!("Usage: clone <campaign_id>"),
            },
            "progress" => {
                let node = match (parts.next(), parts.next().and_then(|s| s.parse::<i32>().ok())) {
                    (Some("campaign"), Some(id)) => ProgressNode::Campaign(id),
                    (Some("sprint"), Some(id)) => ProgressNode::Sprint(id),
                    _ => {
                        println!("Usage: progress <campaign|sprint> <id>");
                        continue;
                    }
                };
                match schedule.progress(node) {
                    Ok(pct) => println!("{pct}%"),
                    Err(e) => println!("Error: {e}"),
                }
            }
            "dates" => match parts.next().and_then(|s| s.parse::<i32>().ok()) {
                Some(id) => match schedule.effective_dates(id) {
                    Ok(dates) => match (dates.start, dates.end) {
                        (Some(start), Some(end)) => println!("Task {id}: {start} -> {end}"),
                        _ => println!("Task {id}: unscheduled"),
                    },
                    Err(e) => println!("Error: {e}"),
                },
                None => println!("Usage: dates <task_id>"),
            },
            "show" | "tasks" | "json" => {
                let Some(scope) = parse_scope(parts) else {
                    println!("Usage: {cmd} [campaign <id>|sprint <id>]");
                    continue;
                };
                let rendered = match cmd {
                    "tasks" => schedule
                        .export_records(scope)
                        .map_err(|e| e.to_string())
                        .and_then(|records| {
                            records_to_dataframe(&records).map_err(|e| e.to_string())
                        })
                        .map(|df| render_df_as_text_table(&df)),
                    "json" => schedule
                        .timeline(scope)
                        .map_err(|e| e.to_string())
                        .and_then(|rows| {
                            serde_json::to_string_pretty(&rows).map_err(|e| e.to_string())
                        }),
                    _ => schedule
                        .timeline(scope)
                        .map_err(|e| e.to_string())
                        .and_then(|rows| timeline_to_dataframe(&rows).map_err(|e| e.to_string()))
                        .map(|df| render_df_as_text_table(&df)),
                };
                match rendered {
                    Ok(text) => println!("{text}"),
                    Err(e) => println!("Error: {e}"),
                }
            }
            "save" => match parts.next() {
                Some(path) => match save_schedule_to_json(&schedule, path) {
                    Ok(()) => println!("Saved to {path}"),
                    Err(e) => println!("Error: {e}"),
                },
                None => println!("Usage: save <path>"),
            },
            "load" => match parts.next() {
                Some(path) => match load_schedule_from_json(path) {
                    Ok(loaded) => {
                        schedule = loaded;
                        println!("Loaded {} tasks from {path}", schedule.task_count());
                    }
                    Err(e) => println!("Error: {e}"),
                },
                None => println!("Usage: load <path>"),
            },
            _ => println!("Unknown command. Type 'help'."),
        }
    }
}
