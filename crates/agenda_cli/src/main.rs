//! Command-line front end for the Agenda task store.
//!
//! # Responsibility
//! - Map subcommands onto `TaskStore` use cases over the SQLite store.
//! - Keep output line-oriented so it can be piped and diffed.

use agenda_core::{
    day_view, default_log_level, init_logging, Category, FilterPipeline, ImportMode, NewTask,
    NoopReminders, Priority, SqliteKvStore, Task, TaskFilters, TaskPatch, TaskStatus, TaskStore,
    WriteBehindStore,
};
use clap::{Parser, Subcommand};
use log::info;
use std::path::PathBuf;
use std::process::ExitCode;

const DB_PATH_ENV: &str = "AGENDA_DB_PATH";
const DB_FILE_NAME: &str = "agenda.sqlite3";

type CliStore = TaskStore<WriteBehindStore, NoopReminders>;

/// Local task agenda
#[derive(Parser)]
#[command(name = "agenda")]
#[command(about = "Manage a local task agenda", long_about = None)]
#[command(version)]
struct Cli {
    /// SQLite database file (defaults to $AGENDA_DB_PATH, then the temp dir)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Log level: trace|debug|info|warn|error
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Absolute directory for rolling log files; logging is off without it
    #[arg(long, global = true)]
    log_dir: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List tasks, optionally filtered
    List {
        #[arg(long, value_parser = parse_category)]
        category: Option<Category>,

        #[arg(long, value_parser = parse_priority)]
        priority: Option<Priority>,

        #[arg(long, value_parser = parse_status)]
        status: Option<TaskStatus>,

        /// Case-insensitive text over title, description and notes
        #[arg(long)]
        search: Option<String>,

        /// Only tasks due on this date (YYYY-MM-DD)
        #[arg(long)]
        day: Option<String>,
    },

    /// Create a task at the top of the list
    Add {
        title: String,

        #[arg(long)]
        description: Option<String>,

        /// Due timestamp, ISO-8601
        #[arg(long)]
        due: Option<String>,

        #[arg(long, value_parser = parse_priority, default_value = "media")]
        priority: Priority,

        #[arg(long, value_parser = parse_status, default_value = "inicial")]
        status: TaskStatus,

        #[arg(long, value_parser = parse_category, default_value = "personal")]
        category: Category,

        #[arg(long)]
        notes: Option<String>,

        /// Reminder timestamp, ISO-8601
        #[arg(long)]
        reminder: Option<String>,
    },

    /// Edit fields of a task; an empty value clears optional text fields
    Edit {
        id: String,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        description: Option<String>,

        /// Due timestamp, ISO-8601
        #[arg(long)]
        due: Option<String>,

        #[arg(long, value_parser = parse_priority)]
        priority: Option<Priority>,

        #[arg(long, value_parser = parse_status)]
        status: Option<TaskStatus>,

        #[arg(long, value_parser = parse_category)]
        category: Option<Category>,

        #[arg(long)]
        notes: Option<String>,

        /// Reminder timestamp, ISO-8601
        #[arg(long)]
        reminder: Option<String>,
    },

    /// Set or clear the due timestamp of a task
    Reschedule {
        id: String,

        /// New due timestamp; omit to clear
        due: Option<String>,
    },

    /// Flip the completed flag of a task
    Toggle { id: String },

    /// Delete a task
    Delete { id: String },

    /// Move the task at position FROM to position TO
    Move { from: usize, to: usize },

    /// Export all tasks as JSON
    Export {
        /// Output file (defaults to stdout)
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Import tasks from a JSON file
    Import {
        file: PathBuf,

        /// Replace the whole collection instead of prepending
        #[arg(long)]
        replace: bool,
    },

    /// Check core linkage
    Ping,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Some(log_dir) = cli.log_dir.as_deref() {
        let level = cli.log_level.as_deref().unwrap_or(default_log_level());
        if let Err(err) = init_logging(level, log_dir) {
            eprintln!("agenda: {err}");
            return ExitCode::FAILURE;
        }
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("agenda: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), String> {
    if let Commands::Ping = cli.command {
        println!("agenda_core ping={}", agenda_core::ping());
        println!("agenda_core version={}", agenda_core::core_version());
        return Ok(());
    }

    let mut store = open_store(cli.db)?;
    match cli.command {
        Commands::List {
            category,
            priority,
            status,
            search,
            day,
        } => {
            let filters = TaskFilters {
                category,
                priority,
                status,
                term: search.unwrap_or_default(),
            };
            let tasks = match day {
                Some(day) => filters.apply(&day_view(store.list(), &day)),
                None => {
                    let mut pipeline = FilterPipeline::new(store.list().into());
                    pipeline.set_filters(filters);
                    pipeline.filtered().to_vec()
                }
            };
            for (position, task) in tasks.iter().enumerate() {
                println!("{}", format_row(position, task));
            }
        }
        Commands::Add {
            title,
            description,
            due,
            priority,
            status,
            category,
            notes,
            reminder,
        } => {
            let new_task = NewTask {
                title,
                description,
                due_at: due,
                priority,
                status,
                category,
                notes,
                reminder_at: reminder,
            };
            let task = store.create(new_task).map_err(|err| err.to_string())?;
            println!("{}", task.id);
        }
        Commands::Edit {
            id,
            title,
            description,
            due,
            priority,
            status,
            category,
            notes,
            reminder,
        } => {
            let patch = TaskPatch {
                title,
                description: clearable(description),
                due_at: clearable(due),
                priority,
                status,
                category,
                notes: clearable(notes),
                reminder_at: clearable(reminder),
                ..TaskPatch::default()
            };
            let task = store
                .update(&id, patch)
                .map_err(|err| err.to_string())?
                .ok_or_else(|| format!("no task with id `{id}`"))?;
            println!("{}", format_row(0, &task));
        }
        Commands::Reschedule { id, due } => {
            let task = store
                .reschedule(&id, clearable(due).flatten())
                .map_err(|err| err.to_string())?
                .ok_or_else(|| format!("no task with id `{id}`"))?;
            println!("{} {}", task.id, task.due_at.as_deref().unwrap_or("-"));
        }
        Commands::Toggle { id } => {
            let task = store
                .toggle_completed(&id)
                .ok_or_else(|| format!("no task with id `{id}`"))?;
            println!("{} {}", task.id, task.status.as_str());
        }
        Commands::Delete { id } => {
            if !store.delete(&id) {
                info!("event=cli_delete module=cli status=skip reason=not_found");
            }
        }
        Commands::Move { from, to } => {
            store.reorder(from, to).map_err(|err| err.to_string())?;
        }
        Commands::Export { out } => {
            let json = store.export().map_err(|err| err.to_string())?;
            match out {
                Some(path) => std::fs::write(&path, json)
                    .map_err(|err| format!("failed to write `{}`: {err}", path.display()))?,
                None => println!("{json}"),
            }
        }
        Commands::Import { file, replace } => {
            let json = std::fs::read_to_string(&file)
                .map_err(|err| format!("failed to read `{}`: {err}", file.display()))?;
            let summary = store
                .import(&json, ImportMode::from_replace_flag(replace))
                .map_err(|err| err.to_string())?;
            println!("imported {}", summary.inserted);
        }
        Commands::Ping => {}
    }
    Ok(())
}

fn open_store(db: Option<PathBuf>) -> Result<CliStore, String> {
    let path = db.unwrap_or_else(default_db_path);
    let sqlite = SqliteKvStore::open(&path)
        .map_err(|err| format!("failed to open `{}`: {err}", path.display()))?;
    let kv = WriteBehindStore::spawn(sqlite).map_err(|err| err.to_string())?;
    TaskStore::open(kv, NoopReminders).map_err(|err| err.to_string())
}

fn default_db_path() -> PathBuf {
    match std::env::var(DB_PATH_ENV) {
        Ok(raw) if !raw.trim().is_empty() => PathBuf::from(raw.trim()),
        _ => std::env::temp_dir().join(DB_FILE_NAME),
    }
}

fn format_row(position: usize, task: &Task) -> String {
    format!(
        "{position:>3} {mark} {id} {due:<24} {priority:<5} {category:<8} {title}",
        mark = if task.completed() { "[x]" } else { "[ ]" },
        id = task.id,
        due = task.due_at.as_deref().unwrap_or("-"),
        priority = task.priority.as_str(),
        category = task.category.as_str(),
        title = task.title,
    )
}

/// Absent keeps the field, empty clears it.
fn clearable(raw: Option<String>) -> Option<Option<String>> {
    raw.map(|value| Some(value).filter(|value| !value.trim().is_empty()))
}

fn parse_priority(raw: &str) -> Result<Priority, String> {
    Priority::parse(raw).ok_or_else(|| format!("expected baja|media|alta, got `{raw}`"))
}

fn parse_status(raw: &str) -> Result<TaskStatus, String> {
    TaskStatus::parse(raw)
        .ok_or_else(|| format!("expected inicial|en_ejecucion|finalizada, got `{raw}`"))
}

fn parse_category(raw: &str) -> Result<Category, String> {
    Category::parse(raw).ok_or_else(|| format!("expected personal|trabajo|social, got `{raw}`"))
}

#[cfg(test)]
mod tests {
    use super::{clearable, format_row, parse_priority, Cli, Commands};
    use agenda_core::{NewTask, Priority, Task, TaskStatus};
    use clap::Parser;

    #[test]
    fn parses_list_filters() {
        let cli = Cli::try_parse_from([
            "agenda", "list", "--priority", "alta", "--category", "trabajo", "--day",
            "2025-11-11",
        ])
        .expect("list flags should parse");
        match cli.command {
            Commands::List {
                priority,
                day,
                status,
                ..
            } => {
                assert_eq!(priority, Some(Priority::High));
                assert_eq!(day.as_deref(), Some("2025-11-11"));
                assert!(status.is_none());
            }
            _ => panic!("expected list"),
        }
    }

    #[test]
    fn rejects_unknown_enum_values() {
        assert!(parse_priority("urgent").is_err());
        assert!(Cli::try_parse_from(["agenda", "list", "--status", "paused"]).is_err());
    }

    #[test]
    fn add_defaults_match_new_task() {
        let cli = Cli::try_parse_from(["agenda", "add", "Buy milk"])
            .expect("add with defaults should parse");
        match cli.command {
            Commands::Add {
                priority,
                status,
                category,
                ..
            } => {
                let defaults = NewTask::new("Buy milk");
                assert_eq!(priority, defaults.priority);
                assert_eq!(status, defaults.status);
                assert_eq!(category, defaults.category);
            }
            _ => panic!("expected add"),
        }
    }

    #[test]
    fn row_shows_completion_mark() {
        let task = Task::from_new(
            "a",
            NewTask::new("Ship").with_status(TaskStatus::Completed),
        )
        .expect("valid task");
        let row = format_row(0, &task);
        assert!(row.contains("[x]"));
        assert!(row.ends_with("Ship"));
    }

    #[test]
    fn parses_edit_with_partial_fields() {
        let cli = Cli::try_parse_from([
            "agenda", "edit", "abc", "--status", "finalizada", "--notes", "",
        ])
        .expect("edit flags should parse");
        match cli.command {
            Commands::Edit {
                id,
                status,
                notes,
                title,
                ..
            } => {
                assert_eq!(id, "abc");
                assert_eq!(status, Some(TaskStatus::Completed));
                assert_eq!(clearable(notes), Some(None));
                assert!(title.is_none());
            }
            _ => panic!("expected edit"),
        }
    }

    #[test]
    fn reschedule_without_due_clears() {
        let cli = Cli::try_parse_from(["agenda", "reschedule", "abc"])
            .expect("reschedule should parse");
        match cli.command {
            Commands::Reschedule { id, due } => {
                assert_eq!(id, "abc");
                assert_eq!(clearable(due).flatten(), None);
            }
            _ => panic!("expected reschedule"),
        }
    }
}
