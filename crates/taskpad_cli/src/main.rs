use clap::{CommandFactory, Parser};
use env_logger::Env;
use log::warn;
use std::collections::HashSet;
use std::io::{self, BufRead};
use std::sync::Arc;
use tabled::builder::Builder;
use tabled::settings::Style;
use taskpad_cli::cli::{Cli, Command};
use taskpad_core::config::{self, Config, Palette};
use taskpad_core::error::AppError;
use taskpad_core::model::{Priority, Task};
use taskpad_core::notify::notifier_from_env;
use taskpad_core::ordering::{OrderedTasks, order_tasks};
use taskpad_core::push::{HttpPushGateway, NoopPushGateway, register_device};
use taskpad_core::reminder::{ReminderScheduler, run_reminder_pass};
use taskpad_core::storage::FileStore;
use taskpad_core::store::TaskStore;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

struct App {
    store: TaskStore,
    gateway: Arc<FileStore>,
    config: Config,
    palette: Palette,
}

impl App {
    fn init() -> Result<Self, AppError> {
        let loaded = config::load_config_with_fallback();
        if let Some(err) = loaded.error {
            warn!("using default configuration: {err}");
        }
        let config = loaded.config;
        let palette = config::palette_for_theme(config.theme.as_deref());
        let gateway = Arc::new(FileStore::open_default()?);
        let store = TaskStore::load(gateway.clone());

        Ok(Self {
            store,
            gateway,
            config,
            palette,
        })
    }
}

fn format_millis(millis: i64) -> String {
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(millis) * 1_000_000)
        .ok()
        .and_then(|ts| ts.format(&Rfc3339).ok())
        .unwrap_or_else(|| millis.to_string())
}

fn render_table(tasks: &[Task], palette: &Palette) -> String {
    let mut builder = Builder::default();
    builder.push_record(["ID", "Task", "Priority", "Created"]);
    for task in tasks {
        builder.push_record([
            task.id.clone(),
            task.text.clone(),
            palette.colorize(task.priority, task.priority.as_str()),
            format_millis(task.created_at),
        ]);
    }

    let mut table = builder.build();
    table.with(Style::sharp());
    table.to_string()
}

fn print_view_plain(view: &OrderedTasks, palette: &Palette) {
    if view.is_empty() {
        println!("No tasks yet.");
        return;
    }

    if !view.incomplete.is_empty() {
        println!("{}", render_table(&view.incomplete, palette));
    }

    if let Some(label) = view.separator_label() {
        println!("--- {label} ---");
        println!("{}", render_table(&view.completed, palette));
    }
}

fn print_view_json(view: &OrderedTasks) {
    let payload = serde_json::json!({
        "incomplete": &view.incomplete,
        "separator": view.separator_label(),
        "completed": &view.completed,
    });
    println!("{payload}");
}

fn print_task_json(task: &Task) -> Result<(), AppError> {
    let payload =
        serde_json::to_string(task).map_err(|err| AppError::invalid_data(err.to_string()))?;
    println!("{payload}");
    Ok(())
}

fn run_command(app: &mut App, cli: Cli) -> Result<(), AppError> {
    match cli.command {
        Command::Add { text, priority } => {
            let text = text.unwrap_or_default();
            let priority = Priority::parse(&priority)?;
            let task = app.store.add_task(&text, priority)?;
            if cli.json {
                print_task_json(task)?;
            } else {
                println!("Added task: {} ({})", task.text, task.id);
            }
        }
        Command::Toggle { id } => {
            if !app.store.toggle_completion(&id) {
                if cli.json {
                    println!("{}", serde_json::json!({ "id": id, "found": false }));
                } else {
                    println!("No task with id {id}; nothing to toggle.");
                }
            } else if let Some(task) = app.store.tasks().iter().find(|task| task.id == id) {
                if cli.json {
                    print_task_json(task)?;
                } else if task.completed {
                    println!("Completed task: {} ({})", task.text, task.id);
                } else {
                    println!("Reopened task: {} ({})", task.text, task.id);
                }
            }
        }
        Command::Edit {
            id,
            new_text,
            priority,
        } => {
            let priority = Priority::parse(&priority)?;
            let task = app.store.edit_task(&id, &new_text, priority)?;
            if cli.json {
                print_task_json(task)?;
            } else {
                println!("Updated task: {} ({})", task.text, task.id);
            }
        }
        Command::Delete { id } => {
            let removed = app.store.delete_task(&id);
            if cli.json {
                println!("{}", serde_json::json!({ "id": id, "deleted": removed }));
            } else if removed {
                println!("Deleted task: {id}");
            } else {
                println!("No task with id {id}; nothing to delete.");
            }
        }
        Command::List => {
            let view = order_tasks(app.store.tasks());
            if cli.json {
                print_view_json(&view);
            } else {
                print_view_plain(&view, &app.palette);
            }
        }
        Command::Remind { watch } => {
            let reminder_config = app.config.reminders.to_config();
            let notifier = notifier_from_env(&app.config.display);

            if watch {
                let interval = reminder_config.interval;
                let _scheduler =
                    ReminderScheduler::start(reminder_config, app.gateway.clone(), notifier);
                println!(
                    "Watching for reminders every {}s. Press Ctrl-C to stop.",
                    interval.as_secs()
                );
                loop {
                    std::thread::park();
                }
            }

            let mut seen = HashSet::new();
            let outcome = run_reminder_pass(
                app.gateway.as_ref(),
                notifier.as_ref(),
                &reminder_config,
                &mut seen,
            );
            if cli.json {
                println!("{}", serde_json::json!(&outcome.notified));
            } else {
                for task in &outcome.notified {
                    println!("Reminded task: {} ({})", task.text, task.id);
                }
            }
            for failure in &outcome.failures {
                eprintln!("ERROR: reminder for {} failed: {}", failure.task_id, failure.error);
            }
        }
        Command::RegisterToken { token } => {
            let connected = match app.config.push_endpoint.as_deref() {
                Some(endpoint) => register_device(
                    &HttpPushGateway::new(endpoint),
                    app.gateway.as_ref(),
                    &token,
                ),
                None => {
                    warn!("no push endpoint configured; caching token without registration");
                    register_device(&NoopPushGateway, app.gateway.as_ref(), &token)
                }
            };
            if cli.json {
                println!("{}", serde_json::json!({ "connected": connected }));
            } else if connected {
                println!("Connected");
            } else {
                println!("Disconnected");
            }
        }
    }

    Ok(())
}

fn normalize_parse_error(err: clap::Error) -> AppError {
    let rendered = err.to_string();
    let first_line = rendered.lines().next().unwrap_or("invalid command").trim();
    let message = first_line
        .strip_prefix("error: ")
        .unwrap_or(first_line)
        .to_string();
    AppError::invalid_input(message)
}

fn split_command_line(line: &str) -> Result<Vec<String>, AppError> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut escape = false;

    for ch in line.chars() {
        if escape {
            if ch != '"' && ch != '\\' {
                current.push('\\');
            }
            current.push(ch);
            escape = false;
            continue;
        }

        if in_quotes && ch == '\\' {
            escape = true;
            continue;
        }

        if ch == '"' {
            in_quotes = !in_quotes;
            continue;
        }

        if ch.is_whitespace() && !in_quotes {
            if !current.is_empty() {
                args.push(current.clone());
                current.clear();
            }
            continue;
        }

        current.push(ch);
    }

    if in_quotes {
        return Err(AppError::invalid_input("unterminated quote in command"));
    }

    if !current.is_empty() {
        args.push(current);
    }

    Ok(args)
}

fn print_help() {
    let mut cmd = Cli::command();
    let help = cmd.render_help();
    println!("{help}");
}

// One long-lived TaskStore for the whole session: load once, mutate many,
// re-derive the view on every list.
fn run_interactive(app: &mut App) -> Result<(), AppError> {
    let mut input = String::new();
    let stdin = io::stdin();
    let mut stdin_lock = stdin.lock();

    loop {
        input.clear();
        let bytes = stdin_lock
            .read_line(&mut input)
            .map_err(|err| AppError::io(err.to_string()))?;

        if bytes == 0 {
            break;
        }

        let line = input.trim();
        if line.is_empty() {
            continue;
        }

        if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
            break;
        }

        if line == "help" || line == "?" {
            print_help();
            continue;
        }

        let args = match split_command_line(line) {
            Ok(args) => args,
            Err(err) => {
                eprintln!("ERROR: {err}");
                continue;
            }
        };

        if args.is_empty() {
            continue;
        }

        let mut argv = Vec::with_capacity(args.len() + 1);
        argv.push("taskpad".to_string());
        argv.extend(args);

        let cli = match Cli::try_parse_from(argv) {
            Ok(cli) => cli,
            Err(err) => {
                eprintln!("ERROR: {}", normalize_parse_error(err));
                continue;
            }
        };

        if let Err(err) = run_command(app, cli) {
            eprintln!("ERROR: {err}");
        }
    }

    Ok(())
}

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let mut args = std::env::args_os();
    args.next();
    let interactive = args.next().is_none();

    let mut app = match App::init() {
        Ok(app) => app,
        Err(err) => {
            eprintln!("ERROR: {err}");
            std::process::exit(1);
        }
    };

    if interactive {
        let result = run_interactive(&mut app);
        app.store.flush();
        if let Err(err) = result {
            eprintln!("ERROR: {err}");
            std::process::exit(1);
        }
        return;
    }

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            eprintln!("ERROR: {}", normalize_parse_error(err));
            std::process::exit(1);
        }
    };

    let result = run_command(&mut app, cli);
    app.store.flush();
    if let Err(err) = result {
        eprintln!("ERROR: {err}");
        std::process::exit(1);
    }
}
