use anyhow::{Context, Result, anyhow, bail};
use chrono::{Local, NaiveDateTime};
use std::env;
use std::path::PathBuf;

use todo_tracker::config::{self, Config};
use todo_tracker::db::{SqliteTaskStore, TaskStore};
use todo_tracker::models::{Priority, Task, TaskEdit};
use todo_tracker::overdue::{is_overdue, is_overdue_now};
use todo_tracker::query::{self, ViewFilter};
use todo_tracker::repository::TaskRepository;
use todo_tracker::state::{self, ViewState};

/// Run the command named on the command line. Exits the process with
/// status 1 when the command fails.
pub fn handle_cli(config: &Config) {
    let args: Vec<String> = env::args().collect();

    // No command: show the saved list view
    let Some(command) = args.get(1) else {
        run(task_list(config, &[]));
        return;
    };

    let rest = &args[2..];
    match command.as_str() {
        "init" => run(cli_init(config)),
        "list" | "ls" => run(task_list(config, rest)),
        "show" => run(task_show(config, rest)),
        "add" => run(task_add(config, rest)),
        "edit" => run(task_edit(config, rest)),
        "done" => run(task_done(config, rest)),
        "delete" | "rm" => run(task_delete(config, rest)),
        "config" => run(handle_config_command(rest)),
        "help" | "--help" | "-h" => print_help(),
        "--version" | "-V" | "-v" => print_version(),
        _ => {
            eprintln!("Unknown command: {}", command);
            eprintln!("Run 'todo --help' for usage");
            std::process::exit(1);
        }
    }
}

fn run(result: Result<()>) {
    if let Err(e) = result {
        eprintln!("Error: {}", error_message(&e));
        std::process::exit(1);
    }
}

/// Validation problems and argument mistakes are shown as they are;
/// storage and I/O failures only reach the log.
fn error_message(err: &anyhow::Error) -> String {
    match err.downcast_ref::<todo_tracker::Error>() {
        Some(e) if e.is_user_facing() => e.to_string(),
        Some(_) => {
            tracing::error!("{:#}", err);
            "An unexpected error occurred".to_string()
        }
        None => format!("{:#}", err),
    }
}

fn wants_help(args: &[String]) -> bool {
    args.iter().any(|a| a == "--help" || a == "-h")
}

// ============================================================================
// Task Commands
// ============================================================================

fn open_store(config: &Config) -> Result<SqliteTaskStore> {
    Ok(SqliteTaskStore::new(config.resolve_database_path()?))
}

fn open_repository(config: &Config) -> Result<TaskRepository<SqliteTaskStore>> {
    Ok(TaskRepository::open(open_store(config)?)?)
}

fn cli_init(config: &Config) -> Result<()> {
    let store = open_store(config)?;
    store.initialize()?;
    println!("✓ Task database ready: {}", store.path().display());
    Ok(())
}

fn print_list_usage() {
    println!("List tasks

USAGE:
    todo list [OPTIONS]

OPTIONS:
    --active | --done | --all       Which tasks to show (default: active)
    --priority <all|low|medium|high>
    --overdue | --no-overdue        Only show open tasks past their due date
    --sort <priority|date>          (default: priority)
    --order <asc|desc>              (default: desc)
    --reset                         Back to the default view

The chosen view is remembered for the next 'todo list'.");
}

/// Apply `list` options on top of the saved view
fn parse_list_flags(view: &mut ViewState, args: &[String]) -> Result<()> {
    let mut i = 0;
    while i < args.len() {
        let flag = args[i].as_str();
        match flag {
            "--active" => view.filter = ViewFilter::Active,
            "--done" | "--completed" => view.filter = ViewFilter::Completed,
            "--all" => view.filter = ViewFilter::All,
            "--overdue" => view.options.overdue_only = true,
            "--no-overdue" => view.options.overdue_only = false,
            "--reset" => *view = ViewState::default(),
            "--priority" | "-p" => {
                view.options.priority_filter = flag_value(args, &mut i)?.parse().map_err(|e| anyhow!("{}", e))?;
            }
            "--sort" | "-s" => {
                view.options.sort_by = flag_value(args, &mut i)?.parse().map_err(|e| anyhow!("{}", e))?;
            }
            "--order" | "-o" => {
                view.options.sort_order = flag_value(args, &mut i)?.parse().map_err(|e| anyhow!("{}", e))?;
            }
            other => bail!("Unknown list option: {}\nRun 'todo list --help' for usage", other),
        }
        i += 1;
    }
    Ok(())
}

/// Value following the flag at `args[*i]`; advances `i` past it
fn flag_value<'a>(args: &'a [String], i: &mut usize) -> Result<&'a str> {
    let flag = &args[*i];
    *i += 1;
    args.get(*i)
        .map(String::as_str)
        .ok_or_else(|| anyhow!("Missing value for {}", flag))
}

fn task_list(config: &Config, args: &[String]) -> Result<()> {
    if wants_help(args) {
        print_list_usage();
        return Ok(());
    }

    let db_path = config.resolve_database_path()?;
    let state_path = state::get_state_file_path(&db_path);
    let mut view = state::load_state(&state_path).unwrap_or_else(|e| {
        tracing::warn!("Ignoring saved list view {}: {:#}", state_path.display(), e);
        ViewState::default()
    });
    parse_list_flags(&mut view, args)?;

    let now = Local::now().naive_local();
    let mut repo = TaskRepository::new(SqliteTaskStore::new(db_path));
    let visible = repo.load(view.filter.filter_active())?;
    let total = visible.len();
    let tasks = query::apply_filter_and_sort(visible, &view.options, now);

    if let Err(e) = state::save_state(&view, &state_path) {
        tracing::warn!("Failed to save list view: {:#}", e);
    }

    if tasks.is_empty() {
        println!("No tasks found.");
    } else {
        print_task_table(&tasks, now);
    }

    println!(
        "\n{} of {} {} tasks | priority: {} | sort: {} {}{}",
        tasks.len(),
        total,
        view.filter,
        view.options.priority_filter,
        view.options.sort_by,
        view.options.sort_order,
        if view.options.overdue_only { " | overdue only" } else { "" }
    );

    Ok(())
}

fn print_task_table(tasks: &[&Task], now: NaiveDateTime) {
    println!("ID    NAME                                 PRIORITY  DUE         STATUS");
    println!("----  -----------------------------------  --------  ----------  --------");

    for task in tasks {
        println!(
            "{:<4}  {:<35}  {:<8}  {:<10}  {}",
            task.id.unwrap_or_default(),
            truncate(&task.name, 35),
            task.priority,
            task.due_date,
            status_display(task, now)
        );
    }
}

fn status_display(task: &Task, now: NaiveDateTime) -> String {
    if is_overdue(task, now) {
        format!("{} !", task.status)
    } else {
        task.status.to_string()
    }
}

fn parse_id(args: &[String], usage: &str) -> Result<i64> {
    let raw = args
        .first()
        .ok_or_else(|| anyhow!("Missing task ID\nUsage: {}", usage))?;
    raw.parse()
        .map_err(|_| anyhow!("Invalid task ID (must be a number)"))
}

fn require_task<'a>(repo: &'a TaskRepository<SqliteTaskStore>, id: i64) -> Result<&'a Task> {
    repo.find(id).ok_or_else(|| anyhow!("Task {} not found", id))
}

fn task_show(config: &Config, args: &[String]) -> Result<()> {
    let id = parse_id(args, "todo show <id>")?;
    let repo = open_repository(config)?;
    let task = require_task(&repo, id)?;

    println!("Task #{}", id);
    println!("Name: {}", task.name);
    println!("Priority: {}", task.priority);
    println!("Due: {}", task.due_date);
    println!("Status: {}", task.status);
    println!("Overdue: {}", if is_overdue_now(task) { "yes" } else { "no" });
    println!("\nDescription:");
    println!("{}", task.description.as_deref().unwrap_or("-"));

    Ok(())
}

/// Value of an optional flag; a flag given without a value is an error
fn parse_flag(args: &[String], flag: &str) -> Result<Option<String>> {
    match args.iter().position(|s| s == flag) {
        Some(mut i) => flag_value(args, &mut i).map(|v| Some(v.to_string())),
        None => Ok(None),
    }
}

fn parse_priority(args: &[String]) -> Result<Option<Priority>> {
    parse_flag(args, "--priority")?
        .map(|p| p.parse().map_err(|e| anyhow!("{}", e)))
        .transpose()
}

/// Build an unsaved task from `add` options
fn parse_new_task(args: &[String]) -> Result<Task> {
    let name = parse_flag(args, "--name")?.context("Missing --name flag")?;
    let due = parse_flag(args, "--due")?.context("Missing --due flag")?;
    let priority = parse_priority(args)?.unwrap_or_default();

    let mut task = Task::new(name, priority, due);
    if let Some(description) = parse_flag(args, "--description")?.filter(|d| !d.is_empty()) {
        task = task.with_description(description);
    }
    Ok(task)
}

fn parse_edit(args: &[String]) -> Result<TaskEdit> {
    let description = if args.iter().any(|a| a == "--clear-description") {
        Some(None)
    } else {
        parse_flag(args, "--description")?.map(Some)
    };

    Ok(TaskEdit {
        name: parse_flag(args, "--name")?,
        priority: parse_priority(args)?,
        due_date: parse_flag(args, "--due")?,
        description,
    })
}

fn task_add(config: &Config, args: &[String]) -> Result<()> {
    if args.is_empty() || wants_help(args) {
        println!("Usage: todo add --name <name> --due <dd.mm.yyyy> [--priority low|medium|high] [--description <text>]");
        return Ok(());
    }

    let task = parse_new_task(args)?;
    let mut repo = TaskRepository::new(open_store(config)?);
    let id = repo.insert(&task)?;

    println!("Created task #{}: {}", id, task.name);
    Ok(())
}

fn task_edit(config: &Config, args: &[String]) -> Result<()> {
    let usage = "todo edit <id> [--name <name>] [--due <dd.mm.yyyy>] [--priority <p>] [--description <text> | --clear-description]";
    let id = parse_id(args, usage)?;
    let edit = parse_edit(&args[1..])?;

    let mut repo = open_repository(config)?;
    require_task(&repo, id)?;

    if edit.is_empty() {
        println!("No changes made to task #{}", id);
        return Ok(());
    }

    repo.edit(id, edit)?;
    println!("Updated task #{}", id);
    Ok(())
}

fn task_done(config: &Config, args: &[String]) -> Result<()> {
    let id = parse_id(args, "todo done <id>")?;
    let mut repo = open_repository(config)?;

    if !require_task(&repo, id)?.is_open() {
        println!("Task #{} is already done", id);
        return Ok(());
    }

    repo.mark_done(id)?;
    println!("✓ Completed task #{}", id);
    Ok(())
}

fn task_delete(config: &Config, args: &[String]) -> Result<()> {
    let id = parse_id(args, "todo delete <id>")?;
    let mut repo = open_repository(config)?;
    require_task(&repo, id)?;

    repo.delete(id)?;
    println!("Deleted task #{}", id);
    Ok(())
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        format!("{}...", s.chars().take(max_len - 3).collect::<String>())
    }
}

// ============================================================================
// Config Commands
// ============================================================================

fn handle_config_command(args: &[String]) -> Result<()> {
    let Some(option) = args.first() else {
        return config::show_config();
    };

    match option.as_str() {
        "show" => config::show_config(),
        "db" => {
            let path = args
                .get(1)
                .context("Missing path\nUsage: todo config db <path>")?;
            config::set_database_path(PathBuf::from(path))
        }
        "log" => {
            let filter = args
                .get(1)
                .context("Missing filter\nUsage: todo config log <filter>")?;
            config::set_log_filter(filter.clone())
        }
        other => bail!("Unknown config option: {}\nAvailable options: show, db, log", other),
    }
}

fn print_help() {
    println!("todo - personal task tracker\n");
    println!("USAGE:");
    println!("  todo                    Show the task list");
    println!("  todo <command> [args]   Run a command");
    println!("  todo --help             Show this help");
    println!("  todo --version          Show version information\n");

    println!("COMMANDS:");
    println!("  init                    Create the task database if it is missing");
    println!("  list [options]          List tasks (see 'todo list --help')");
    println!("  show <id>               Show one task");
    println!("  add --name <name> --due <dd.mm.yyyy> [--priority <p>] [--description <text>]");
    println!("                          Add an open task");
    println!("  edit <id> [--name] [--due] [--priority] [--description | --clear-description]");
    println!("                          Change a task");
    println!("  done <id>               Mark a task as done");
    println!("  delete <id>             Delete a task");
    println!("  config [show|db <path>|log <filter>]");
    println!("                          Show or change configuration\n");

    println!("Priorities: low, medium, high. Due dates use dd.mm.yyyy.");
    println!("Open tasks past their due date are marked with '!'.\n");

    println!("ENVIRONMENT:");
    println!("  {}                 Database file to use", config::DATABASE_ENV);
    println!("  RUST_LOG                Log filter, e.g. todo_tracker=debug\n");

    println!("EXAMPLES:");
    println!("  todo add --name \"Write report\" --due 15.03.2025 --priority high");
    println!("  todo list --all --sort date --order asc");
    println!("  todo list --overdue");
    println!("  todo done 3");
}

fn print_version() {
    const VERSION: &str = env!("CARGO_PKG_VERSION");
    const NAME: &str = env!("CARGO_PKG_NAME");
    println!("{} {}", NAME, VERSION);
}
