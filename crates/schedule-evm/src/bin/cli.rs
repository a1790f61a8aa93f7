use chrono::{NaiveDate, Weekday};
use polars::prelude::{AnyValue, DataFrame};
#[cfg(feature = "sqlite")]
use site_evm::SnapshotStore;
use site_evm::{
    CostItem, EngineError, LinkChange, ProjectSession, RecomputeOutput, WindowPolicy,
    cash_flow_buckets, load_snapshot_from_csv, load_snapshot_from_json, save_snapshot_to_csv,
    save_snapshot_to_json, task_table,
};
use site_schedule::{ConstraintKind, Relation, RelationType, Task, WorkCalendarConfig};
use std::fs;
use std::io::{self, Write};
use std::str::FromStr;

fn cell_text(av: &AnyValue) -> String {
    match av {
        AnyValue::Null => String::new(),
        AnyValue::Int32(v) => v.to_string(),
        AnyValue::Int64(v) => v.to_string(),
        AnyValue::Float64(v) => format!("{v:.2}"),
        AnyValue::String(s) => s.to_string(),
        _ => av.to_string(),
    }
}

fn render_df_as_text_table(df: &DataFrame) -> String {
    let columns = df.get_columns();
    let col_names: Vec<String> = columns.iter().map(|c| c.name().to_string()).collect();

    let rows: Vec<Vec<String>> = (0..df.height())
        .map(|row_idx| {
            columns
                .iter()
                .map(|col| col.get(row_idx).map(|av| cell_text(&av)).unwrap_or_default())
                .collect()
        })
        .collect();

    let mut widths: Vec<usize> = col_names.iter().map(|n| n.len()).collect();
    for row in &rows {
        for (ci, cell) in row.iter().enumerate() {
            widths[ci] = widths[ci].max(cell.len());
        }
    }

    let mut sep = String::from("+");
    for w in &widths {
        sep.push_str(&"-".repeat(*w + 2));
        sep.push('+');
    }

    let render_row = |cells: &[String]| {
        let mut line = String::from("|");
        for (ci, cell) in cells.iter().enumerate() {
            line.push(' ');
            line.push_str(cell);
            line.push_str(&" ".repeat(widths[ci].saturating_sub(cell.len())));
            line.push_str(" |");
        }
        line
    };

    let mut out = String::new();
    out.push_str(&sep);
    out.push('\n');
    out.push_str(&render_row(&col_names));
    out.push('\n');
    out.push_str(&sep);
    out.push('\n');
    for row in &rows {
        out.push_str(&render_row(row));
        out.push('\n');
    }
    out.push_str(&sep);
    out.push('\n');
    out
}

fn print_help() {
    println!(
        "Commands:\n  help                               Show this help\n  show                               Show the scheduled task table\n  task <id> <name> <duration_days> [milestone|summary]\n                                     Add or update a task\n  delete <id>                        Delete a task, its relations and links\n  pct <id> <float>                   Set percent_complete\n  constraint <id> <kind> [date]      Set a schedule constraint (asap, alap, mso, mfo, snet, snlt, fnet, fnlt)\n  edge <pred> <succ> [FS|SS|FF|SF] [lag]\n                                     Add or replace a precedence relation\n  edge rm <pred> <succ>              Remove a precedence relation\n  parent <id> <parent_id|none>       Move a task under a summary\n  cost <id> <name> <planned> [actual] [pct]\n                                     Add or update a cost item\n  cost rm <id>                       Delete a cost item\n  cost window <id> <start> <finish>  Set a cost item's window\n  link <cost_id> <task_id>           Link a cost item to a task\n  unlink <cost_id>                   Clear a cost item's link\n  meta show                          Show project metadata\n  meta name <text...>                Update project name\n  meta desc <text...>                Update project description\n  meta dates <start> [end]           Update project start/end dates (YYYY-MM-DD)\n  meta asof <date|none>              Update the status date\n  calendar show                      Display calendar configuration summary\n  calendar none                      Count every calendar day\n  calendar weekdays                  Monday to Friday, no holidays\n  calendar set <json_path>           Load calendar config from JSON file\n  calendar save <json_path>          Save current calendar config to JSON file\n  calendar policy <keep|follow_task> Set the cost window policy\n  compute                            Recompute schedule and earned value\n  evm                                Show project and per-task earned value\n  path                               Show the critical path\n  cashflow                           Show monthly planned/earned/actual cost\n  save <json|csv|sqlite> <path>      Persist project to disk\n  load <json|csv|sqlite> <path>      Load project from disk\n  quit|exit                          Exit"
    );
}

fn parse_arg<T: FromStr>(value: Option<&str>, what: &str) -> Option<T> {
    match value.map(str::parse::<T>) {
        Some(Ok(v)) => Some(v),
        Some(Err(_)) => {
            println!("Invalid {what}");
            None
        }
        None => None,
    }
}

fn parse_date(value: Option<&str>) -> Option<NaiveDate> {
    let value = value?;
    match NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        Ok(d) => Some(d),
        Err(_) => {
            println!("Invalid date (YYYY-MM-DD)");
            None
        }
    }
}

fn print_tasks(output: &RecomputeOutput) {
    match task_table(output) {
        Ok(df) => println!("{}", render_df_as_text_table(&df)),
        Err(e) => println!("Error building task table: {}", e),
    }
}

fn print_outcome(result: Result<(), EngineError>, done: &str, session: &ProjectSession) {
    match result {
        Ok(()) => {
            println!("{} ({})", done, session.output().summary().to_cli_summary());
            print_tasks(session.output());
        }
        Err(e) => println!("Error: {}", e),
    }
}

fn print_metadata(session: &ProjectSession) {
    let metadata = &session.snapshot().metadata;
    let optional = |date: Option<NaiveDate>| date.map(|d| d.to_string()).unwrap_or_default();
    println!("Project name       : {}", metadata.project_name);
    println!("Project description: {}", metadata.project_description);
    println!("Project start date : {}", metadata.project_start_date);
    println!("Project end date   : {}", optional(metadata.project_end_date));
    println!("Status date        : {}", optional(metadata.as_of_date));
}

fn print_calendar_info(session: &ProjectSession) {
    let snapshot = session.snapshot();
    println!(
        "Window policy      : {}",
        match snapshot.settings.window_policy {
            WindowPolicy::Keep => "keep",
            WindowPolicy::FollowTask => "follow_task",
        }
    );
    let Some(config) = &snapshot.calendar else {
        println!("Calendar           : every day counts");
        return;
    };
    let working_days = config
        .working_days()
        .iter()
        .map(|wd| wd.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    let holidays = config
        .holidays()
        .iter()
        .map(|d| d.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    println!("Working days       : {}", working_days);
    println!("Holidays           : {}", holidays);
}

fn print_evm(output: &RecomputeOutput) {
    let m = &output.project_metrics;
    println!(
        "Project: BAC={:.2} BCWS={:.2} BCWP={:.2} ACWP={:.2} CPI={:.4} SPI={:.4} CV={:.2} SV={:.2} EAC={:.2} ETC={:.2} VAC={:.2}",
        m.bac, m.bcws, m.bcwp, m.acwp, m.cpi, m.spi, m.cv, m.sv, m.eac, m.etc, m.vac
    );
    let mut flags = Vec::new();
    if m.is_over_budget() {
        flags.push("over budget");
    }
    if m.is_behind_schedule() {
        flags.push("behind schedule");
    }
    if !flags.is_empty() {
        println!("Status: {}", flags.join(", "));
    }
    for (task_id, m) in &output.task_metrics {
        let name = output.task(*task_id).map(|t| t.name.as_str()).unwrap_or("");
        println!(
            "  task {:<4} {:<20} BCWS={:.2} BCWP={:.2} ACWP={:.2} CPI={:.4} SPI={:.4}",
            task_id, name, m.bcws, m.bcwp, m.acwp, m.cpi, m.spi
        );
    }
}

fn print_critical_path(output: &RecomputeOutput) {
    if output.critical_path.is_empty() {
        println!("No critical path.");
        return;
    }
    let chain = output
        .critical_path
        .sequence()
        .iter()
        .map(|id| match output.task(*id) {
            Some(task) => format!("{} ({})", id, task.name),
            None => id.to_string(),
        })
        .collect::<Vec<_>>()
        .join(" -> ");
    println!("Critical path: {}", chain);
}

#[cfg(feature = "sqlite")]
fn sqlite_store(path: &str) -> Result<site_evm::SqliteSnapshotStore, site_evm::PersistenceError> {
    site_evm::SqliteSnapshotStore::new(path)
}

fn save(session: &ProjectSession, fmt: &str, path: &str) -> Result<(), site_evm::PersistenceError> {
    match fmt {
        "json" => save_snapshot_to_json(session.snapshot(), path),
        "csv" => save_snapshot_to_csv(session.snapshot(), path),
        #[cfg(feature = "sqlite")]
        "sqlite" => sqlite_store(path)?.save_snapshot(session.snapshot()),
        other => Err(site_evm::PersistenceError::InvalidData(format!(
            "unsupported format '{other}'"
        ))),
    }
}

fn load(fmt: &str, path: &str) -> Result<site_evm::ProjectSnapshot, site_evm::PersistenceError> {
    match fmt {
        "json" => load_snapshot_from_json(path),
        "csv" => load_snapshot_from_csv(path),
        #[cfg(feature = "sqlite")]
        "sqlite" => sqlite_store(path)?
            .load_snapshot()?
            .ok_or(site_evm::PersistenceError::NotFound),
        other => Err(site_evm::PersistenceError::InvalidData(format!(
            "unsupported format '{other}'"
        ))),
    }
}

fn main() {
    env_logger::init();
    let mut session = ProjectSession::default();

    println!("Site Schedule (CLI) - type 'help' for commands\n");

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
            "show" => print_tasks(session.output()),
            "compute" => match session.refresh() {
                Ok(output) => {
                    println!("Recomputed ({})", output.summary().to_cli_summary());
                    for warning in &output.warnings {
                        println!("  warning: {}", warning);
                    }
                    print_tasks(output);
                }
                Err(e) => println!("Recompute error: {}", e),
            },
            "evm" => print_evm(session.output()),
            "path" => print_critical_path(session.output()),
            "cashflow" => match cash_flow_buckets(session.output()) {
                Ok(df) => println!("{}", render_df_as_text_table(&df)),
                Err(e) => println!("Error building cash flow: {}", e),
            },
            "task" => {
                let id_s = parts.next();
                let name = parts.next();
                let dur_s = parts.next();
                let kind = parts.next();
                let (Some(_), Some(name), Some(_)) = (id_s, name, dur_s) else {
                    println!("Usage: task <id> <name> <duration_days> [milestone|summary]");
                    continue;
                };
                let Some(id) = parse_arg::<i32>(id_s, "id") else {
                    continue;
                };
                let Some(duration_days) = parse_arg::<i64>(dur_s, "duration_days") else {
                    continue;
                };
                let mut task = session
                    .snapshot()
                    .task(id)
                    .cloned()
                    .unwrap_or_else(|| Task::new(id, name, duration_days));
                task.name = name.to_string();
                task.duration_days = duration_days;
                match kind {
                    Some("milestone") => task.is_milestone = true,
                    Some("summary") => task.is_summary = true,
                    Some(other) => {
                        println!("Unknown task kind '{}'. Use milestone or summary.", other);
                        continue;
                    }
                    None => {}
                }
                let result = if session.snapshot().task(id).is_some() {
                    session.update_task(task)
                } else {
                    session.add_task(task)
                };
                print_outcome(result, "Task saved.", &session);
            }
            "delete" => match parse_arg::<i32>(parts.next(), "id") {
                Some(id) => match session.delete_task(id) {
                    Ok(_) => {
                        println!("Deleted task {id}.");
                        print_tasks(session.output());
                    }
                    Err(e) => println!("Error deleting task: {}", e),
                },
                None => println!("Usage: delete <id>"),
            },
            "pct" => {
                let id = parse_arg::<i32>(parts.next(), "id");
                let pct = parse_arg::<f64>(parts.next(), "float");
                let (Some(id), Some(pct)) = (id, pct) else {
                    println!("Usage: pct <id> <float>");
                    continue;
                };
                let Some(mut task) = session.snapshot().task(id).cloned() else {
                    println!("Task {id} not found.");
                    continue;
                };
                task.percent_complete = pct;
                print_outcome(session.update_task(task), "percent_complete set.", &session);
            }
            "constraint" => {
                let id = parse_arg::<i32>(parts.next(), "id");
                let kind = parse_arg::<ConstraintKind>(parts.next(), "constraint kind");
                let date_s = parts.next();
                let (Some(id), Some(kind)) = (id, kind) else {
                    println!("Usage: constraint <id> <kind> [YYYY-MM-DD]");
                    continue;
                };
                let date = parse_date(date_s);
                if date_s.is_some() && date.is_none() {
                    continue;
                }
                let Some(task) = session.snapshot().task(id).cloned() else {
                    println!("Task {id} not found.");
                    continue;
                };
                let task = task.with_constraint(kind, date);
                print_outcome(session.update_task(task), "Constraint set.", &session);
            }
            "edge" => {
                let first = parts.next();
                if first == Some("rm") {
                    let pred = parse_arg::<i32>(parts.next(), "predecessor id");
                    let succ = parse_arg::<i32>(parts.next(), "successor id");
                    let (Some(pred), Some(succ)) = (pred, succ) else {
                        println!("Usage: edge rm <pred> <succ>");
                        continue;
                    };
                    match session.remove_relation(pred, succ) {
                        Ok(Some(_)) => {
                            println!("Relation {pred} -> {succ} removed.");
                            print_tasks(session.output());
                        }
                        Ok(None) => println!("No relation {pred} -> {succ}."),
                        Err(e) => println!("Error: {}", e),
                    }
                    continue;
                }
                let pred = parse_arg::<i32>(first, "predecessor id");
                let succ = parse_arg::<i32>(parts.next(), "successor id");
                let (Some(pred), Some(succ)) = (pred, succ) else {
                    println!("Usage: edge <pred> <succ> [FS|SS|FF|SF] [lag]");
                    continue;
                };
                let type_s = parts.next();
                let relation_type = match type_s {
                    Some(code) => match RelationType::from_str(code) {
                        Ok(t) => t,
                        Err(e) => {
                            println!("{}", e);
                            continue;
                        }
                    },
                    None => RelationType::FinishToStart,
                };
                let lag_s = parts.next();
                let lag_days = match lag_s {
                    Some(_) => match parse_arg::<i64>(lag_s, "lag") {
                        Some(lag) => lag,
                        None => continue,
                    },
                    None => 0,
                };
                let relation = Relation::new(pred, succ, relation_type, lag_days);
                print_outcome(
                    session.add_relation(relation),
                    &format!("Relation {} -> {} set.", relation.notation(), succ),
                    &session,
                );
            }
            "parent" => {
                let id = parse_arg::<i32>(parts.next(), "id");
                let parent_s = parts.next();
                let parent_id = match parent_s {
                    Some("none") => None,
                    Some(_) => match parse_arg::<i32>(parent_s, "parent_id") {
                        Some(p) => Some(p),
                        None => continue,
                    },
                    None => {
                        println!("Usage: parent <id> <parent_id|none>");
                        continue;
                    }
                };
                let Some(id) = id else {
                    println!("Usage: parent <id> <parent_id|none>");
                    continue;
                };
                print_outcome(session.set_parent(id, parent_id), "parent_id set.", &session);
            }
            "cost" => match parts.next() {
                Some("rm") => match parse_arg::<i32>(parts.next(), "cost item id") {
                    Some(id) => match session.delete_cost_item(id) {
                        Ok(item) => println!("Deleted cost item {} ({}).", item.id, item.name),
                        Err(e) => println!("Error: {}", e),
                    },
                    None => println!("Usage: cost rm <id>"),
                },
                Some("window") => {
                    let id = parse_arg::<i32>(parts.next(), "cost item id");
                    let start = parse_date(parts.next());
                    let finish = parse_date(parts.next());
                    let (Some(id), Some(start), Some(finish)) = (id, start, finish) else {
                        println!("Usage: cost window <id> <YYYY-MM-DD> <YYYY-MM-DD>");
                        continue;
                    };
                    let Some(item) = session.snapshot().cost_item(id).cloned() else {
                        println!("Cost item {id} not found.");
                        continue;
                    };
                    match session.update_cost_item(item.with_window(start, finish)) {
                        Ok(()) => println!("Window set for cost item {id}."),
                        Err(e) => println!("Error: {}", e),
                    }
                }
                id_s => {
                    let name = parts.next();
                    let planned_s = parts.next();
                    let (Some(_), Some(name), Some(_)) = (id_s, name, planned_s) else {
                        println!("Usage: cost <id> <name> <planned> [actual] [pct]");
                        continue;
                    };
                    let Some(id) = parse_arg::<i32>(id_s, "cost item id") else {
                        continue;
                    };
                    let Some(planned) = parse_arg::<f64>(planned_s, "planned cost") else {
                        continue;
                    };
                    let actual_s = parts.next();
                    let pct_s = parts.next();
                    let actual = match actual_s {
                        Some(_) => match parse_arg::<f64>(actual_s, "actual cost") {
                            Some(v) => v,
                            None => continue,
                        },
                        None => 0.0,
                    };
                    let pct = match pct_s {
                        Some(_) => match parse_arg::<f64>(pct_s, "percent") {
                            Some(v) => v,
                            None => continue,
                        },
                        None => 0.0,
                    };
                    let existing = session.snapshot().cost_item(id).cloned();
                    let mut item = existing
                        .clone()
                        .unwrap_or_else(|| CostItem::new(id, name, planned));
                    item.name = name.to_string();
                    item.planned_cost = planned;
                    item.actual_cost = actual;
                    item.percent_financial_complete = pct;
                    let result = if existing.is_some() {
                        session.update_cost_item(item)
                    } else {
                        session.add_cost_item(item)
                    };
                    match result {
                        Ok(()) => {
                            println!("Cost item {id} saved.");
                            print_evm(session.output());
                        }
                        Err(e) => println!("Error: {}", e),
                    }
                }
            },
            "link" => {
                let item = parse_arg::<i32>(parts.next(), "cost item id");
                let task = parse_arg::<i32>(parts.next(), "task id");
                let (Some(item), Some(task)) = (item, task) else {
                    println!("Usage: link <cost_id> <task_id>");
                    continue;
                };
                match session.link(item, task) {
                    Ok(LinkChange::Linked) => {
                        println!("Linked cost item {item} to task {task}.");
                        print_evm(session.output());
                    }
                    Ok(LinkChange::Unchanged) => {
                        println!("Cost item {item} is already linked to task {task}.")
                    }
                    Err(e) => println!("Error: {}", e),
                }
            }
            "unlink" => match parse_arg::<i32>(parts.next(), "cost item id") {
                Some(item) => match session.unlink(item) {
                    Ok(Some(task)) => println!("Unlinked cost item {item} from task {task}."),
                    Ok(None) => println!("Cost item {item} was not linked."),
                    Err(e) => println!("Error: {}", e),
                },
                None => println!("Usage: unlink <cost_id>"),
            },
            "meta" => match parts.next() {
                Some("show") | None => print_metadata(&session),
                Some(field @ ("name" | "desc")) => {
                    let rest: Vec<&str> = parts.collect();
                    if rest.is_empty() {
                        println!("Usage: meta {} <text...>", field);
                        continue;
                    }
                    let mut metadata = session.snapshot().metadata.clone();
                    if field == "name" {
                        metadata.project_name = rest.join(" ");
                    } else {
                        metadata.project_description = rest.join(" ");
                    }
                    match session.set_metadata(metadata) {
                        Ok(()) => {
                            println!("Metadata updated.");
                            print_metadata(&session);
                        }
                        Err(e) => println!("Metadata update error: {}", e),
                    }
                }
                Some("dates") => {
                    let start = parse_date(parts.next());
                    let end_s = parts.next();
                    let end = parse_date(end_s);
                    let Some(start) = start else {
                        println!("Usage: meta dates <YYYY-MM-DD> [YYYY-MM-DD]");
                        continue;
                    };
                    if end_s.is_some() && end.is_none() {
                        continue;
                    }
                    let mut metadata = session.snapshot().metadata.clone();
                    metadata.project_start_date = start;
                    metadata.project_end_date = end;
                    match session.set_metadata(metadata) {
                        Ok(()) => {
                            println!(
                                "Metadata dates updated ({}).",
                                session.output().summary().to_cli_summary()
                            );
                            print_metadata(&session);
                        }
                        Err(e) => println!("Metadata update error: {}", e),
                    }
                }
                Some("asof") => {
                    let date_s = parts.next();
                    let as_of = match date_s {
                        Some("none") => None,
                        Some(_) => match parse_date(date_s) {
                            Some(d) => Some(d),
                            None => continue,
                        },
                        None => {
                            println!("Usage: meta asof <YYYY-MM-DD|none>");
                            continue;
                        }
                    };
                    let mut metadata = session.snapshot().metadata.clone();
                    metadata.as_of_date = as_of;
                    match session.set_metadata(metadata) {
                        Ok(()) => {
                            println!("Status date updated.");
                            print_metadata(&session);
                        }
                        Err(e) => println!("Metadata update error: {}", e),
                    }
                }
                Some(other) => {
                    println!("Unknown meta command '{}'.", other);
                    println!("Usage: meta show|name|desc|dates|asof ...");
                }
            },
            "calendar" => match parts.next() {
                Some("show") | None => print_calendar_info(&session),
                Some("none") => match session.set_calendar(None) {
                    Ok(()) => println!("Calendar cleared; every day counts."),
                    Err(e) => println!("Error: {}", e),
                },
                Some("weekdays") => {
                    let weekdays = [
                        Weekday::Mon,
                        Weekday::Tue,
                        Weekday::Wed,
                        Weekday::Thu,
                        Weekday::Fri,
                    ];
                    let result = WorkCalendarConfig::new(weekdays, Vec::<NaiveDate>::new())
                        .map_err(EngineError::from)
                        .and_then(|config| session.set_calendar(Some(config)));
                    match result {
                        Ok(()) => {
                            println!("Calendar set to weekdays.");
                            print_calendar_info(&session);
                        }
                        Err(e) => println!("Error: {}", e),
                    }
                }
                Some("set") => match parts.next() {
                    Some(path) => match fs::read_to_string(path) {
                        Ok(contents) => match serde_json::from_str::<WorkCalendarConfig>(&contents)
                        {
                            Ok(config) => match session.set_calendar(Some(config)) {
                                Ok(()) => {
                                    println!("Calendar updated from {}.", path);
                                    print_calendar_info(&session);
                                }
                                Err(e) => println!("Error applying calendar: {}", e),
                            },
                            Err(e) => println!("Invalid calendar JSON: {}", e),
                        },
                        Err(e) => println!("Error reading {}: {}", path, e),
                    },
                    None => println!("Usage: calendar set <json_path>"),
                },
                Some("save") => match parts.next() {
                    Some(path) => {
                        let config = session.snapshot().calendar.clone().unwrap_or_default();
                        match serde_json::to_string_pretty(&config) {
                            Ok(json) => match fs::write(path, json) {
                                Ok(_) => println!("Calendar saved to {}.", path),
                                Err(e) => println!("Error writing {}: {}", path, e),
                            },
                            Err(e) => println!("Error serializing calendar: {}", e),
                        }
                    }
                    None => println!("Usage: calendar save <json_path>"),
                },
                Some("policy") => {
                    let policy = match parts.next() {
                        Some("keep") => WindowPolicy::Keep,
                        Some("follow_task") => WindowPolicy::FollowTask,
                        _ => {
                            println!("Usage: calendar policy <keep|follow_task>");
                            continue;
                        }
                    };
                    match session.set_window_policy(policy) {
                        Ok(()) => print_calendar_info(&session),
                        Err(e) => println!("Error: {}", e),
                    }
                }
                Some(other) => {
                    println!("Unknown calendar command '{}'.", other);
                    println!(
                        "Usage: calendar show|none|weekdays|set <json_path>|save <json_path>|policy <keep|follow_task>"
                    );
                }
            },
            "save" => match (parts.next(), parts.next()) {
                (Some(fmt), Some(path)) => match save(&session, fmt, path) {
                    Ok(()) => println!("Project saved to {}.", path),
                    Err(e) => println!("Error saving project: {}", e),
                },
                _ => println!("Usage: save <json|csv|sqlite> <path>"),
            },
            "load" => match (parts.next(), parts.next()) {
                (Some(fmt), Some(path)) => match load(fmt, path) {
                    Ok(snapshot) => match session.replace_snapshot(snapshot) {
                        Ok(()) => {
                            println!("Project loaded from {}.", path);
                            print_tasks(session.output());
                        }
                        Err(e) => println!("Loaded project but recompute failed: {}", e),
                    },
                    Err(e) => println!("Error loading project: {}", e),
                },
                _ => println!("Usage: load <json|csv|sqlite> <path>"),
            },
            _ => {
                println!("Unknown command. Type 'help'.");
            }
        }
    }
}
