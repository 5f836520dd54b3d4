//! Seeding entry point.
//!
//! # Responsibility
//! - Parse configuration, start logging and open the database.
//! - Seed demo data once and print every user's roles.

use clap::Parser;
use log::info;
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;
use userroles_core::db::{open_db, open_db_in_memory};
use userroles_core::{
    core_version, default_log_level, init_logging, normalize_level, normalize_log_dir,
    seed_demo_data, CrudRepository, QuerySpec, RelationshipRepository, SortSpec,
    SqliteRoleRepository, SqliteUserRepository, UserToRoleRelationshipRepository, ROLES_FIELD,
};

/// Seeds the user/role demo data and prints each user's roles
#[derive(Parser, Debug)]
#[command(name = "userroles")]
#[command(version, about = "Seed demo users and roles, then list role assignments")]
struct Cli {
    /// SQLite database file; an in-memory database is used when unset
    #[arg(long, env = "USERROLES_DB_PATH", value_parser = parse_db_path)]
    db_path: Option<PathBuf>,

    /// Log level: trace, debug, info, warn or error
    #[arg(long, env = "USERROLES_LOG_LEVEL", value_parser = normalize_level)]
    log_level: Option<&'static str>,

    /// Absolute log directory; file logging stays off when unset
    #[arg(long, env = "USERROLES_LOG_DIR", value_parser = normalize_log_dir)]
    log_dir: Option<PathBuf>,
}

impl Cli {
    fn log_level(&self) -> &'static str {
        self.log_level.unwrap_or_else(default_log_level)
    }
}

fn parse_db_path(value: &str) -> Result<PathBuf, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err("db_path cannot be empty".to_string());
    }
    Ok(PathBuf::from(trimmed))
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("userroles: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), Box<dyn Error>> {
    if let Some(log_dir) = cli.log_dir.as_ref() {
        init_logging(cli.log_level(), &log_dir.to_string_lossy())?;
    }
    info!("event=cli_start module=cli status=ok version={}", core_version());

    let conn = match cli.db_path.as_ref() {
        Some(path) => open_db(path)?,
        None => open_db_in_memory()?,
    };
    let users = SqliteUserRepository::try_new(&conn)?;
    let roles = SqliteRoleRepository::try_new(&conn)?;

    seed_demo_data(&users, &roles)?;

    let relationship = UserToRoleRelationshipRepository::new(&users, &roles);
    let by_name = QuerySpec::default().sort_by(SortSpec::asc("name"));
    for user in users.find_all()? {
        let names: Vec<String> = relationship
            .find_many_targets(user.id, ROLES_FIELD, &by_name)?
            .into_iter()
            .map(|role| role.name)
            .collect();
        println!("{}: {}", user.username, names.join(", "));
    }

    Ok(())
}
