//! CLI smoke entry point.
//!
//! # Responsibility
//! - Wire a workspace from environment configuration and print the board.
//! - Keep output deterministic for quick local sanity checks.
//!
//! Usage: `vibeboard_cli [manual|due-date|date-added|priority]`

use std::error::Error;
use std::process::ExitCode;
use std::sync::Arc;
use vibeboard_core::{
    core_version, init_logging, open_record_store, ColumnId, CoreConfig,
    InMemoryIdentityProvider, Priority, SortBy, SystemClock, User, Workspace, WorkspaceOptions,
};

const LOCAL_USER_ID: &str = "local-user";
const LOCAL_USER_EMAIL: &str = "local@vibeboard.invalid";

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("vibeboard_cli error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let sort_by = match std::env::args().nth(1) {
        Some(raw) => SortBy::parse(&raw).ok_or_else(|| format!("unknown sort mode `{raw}`"))?,
        None => SortBy::Manual,
    };

    let config = CoreConfig::from_env()?;
    init_logging(&config.log_level, &config.log_dir)?;
    log::info!(
        "event=cli_start module=cli status=ok storage={} sort_by={}",
        config.storage_mode.as_str(),
        sort_by
    );

    let identity = InMemoryIdentityProvider::signed_in(User {
        id: LOCAL_USER_ID.to_string(),
        email: LOCAL_USER_EMAIL.to_string(),
    });
    let store = open_record_store(&config)?;
    let options = WorkspaceOptions::from_config(&config).with_clock(Arc::new(SystemClock));
    let mut workspace = Workspace::open(&identity, store, options)?;

    if workspace.tasks().tasks().is_empty() {
        let tasks = workspace.tasks_mut();
        tasks.add("Sketch the board", ColumnId::Todo, None, Priority::High, None);
        tasks.add("Wire drag and drop", ColumnId::Todo, None, Priority::Urgent, None);
        tasks.add("Write release notes", ColumnId::Todo, None, Priority::Low, None);
    }

    println!("vibeboard_core version={}", core_version());
    for column_id in ColumnId::ALL {
        let column = workspace.tasks().column(column_id, sort_by, None);
        println!("{} ({})", column_id.title(), column.len());
        for task in column {
            println!("  [{}] {} ({})", task.order, task.title, task.priority.as_str());
        }
    }
    println!("todos remaining={}", workspace.todos().remaining_count());
    println!("notes={}", workspace.notes().notes().len());

    let stats = workspace.close()?;
    println!("sync applied={} failed={}", stats.applied, stats.failed);
    Ok(())
}
