//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `crudbase_core` linkage and run one CRUD cycle against an
//!   in-memory database.
//! - Keep output deterministic for quick local sanity checks.
//! - Route repository events to a rolling log under the system temp dir.

use crudbase_core::db::open_db_in_memory;
use crudbase_core::{
    default_log_level, init_logging, Input, Model, SkillCreate, SkillRepository, SkillUpdate,
};
use std::error::Error;
use std::process::ExitCode;

const LOG_DIR_NAME: &str = "crudbase_cli_logs";

fn main() -> ExitCode {
    println!("crudbase_core ping={}", crudbase_core::ping());
    println!("crudbase_core version={}", crudbase_core::core_version());

    // A missing logger only loses events; the smoke cycle still runs.
    let log_dir = std::env::temp_dir().join(LOG_DIR_NAME);
    match init_logging(default_log_level(), &log_dir.to_string_lossy()) {
        Ok(()) => println!("crudbase_core log_dir={}", log_dir.display()),
        Err(err) => eprintln!("crudbase_core logging=disabled error={err}"),
    }

    match run_smoke_cycle() {
        Ok(summary) => {
            println!("crudbase_core smoke={summary}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("crudbase_core smoke=failed error={err}");
            ExitCode::FAILURE
        }
    }
}

fn run_smoke_cycle() -> Result<String, Box<dyn Error>> {
    let conn = open_db_in_memory()?;
    let repo = SkillRepository::new();
    let input = Input::Schema(SkillCreate {
        name: "smoke".to_string(),
        description: None,
    });

    let created = repo.create(&conn, &input, None)?;
    let reused = repo.get_or_create(&conn, &input, None)?;
    let updated = repo.update(
        &conn,
        created,
        &Input::Schema(SkillUpdate {
            name: None,
            description: Some(Some("updated".to_string())),
        }),
        None,
    )?;
    let id = updated.id().ok_or("created row has no id")?;
    repo.delete(&conn, id)?;
    let live = repo.count(&conn, &repo.base_query())?;

    Ok(format!(
        "ok id={id} reused={} live_after_delete={live}",
        reused.and_then(|skill| skill.id()) == Some(id)
    ))
}
