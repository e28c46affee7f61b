// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use std::process::ExitCode;

use monthbook::config::AppConfig;
use monthbook::{cli, commands, db, errors, logging};

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            match err.downcast_ref::<errors::Error>() {
                Some(e) => eprintln!("error[{}]: {}", e.code(), e),
                None => eprintln!("error: {:#}", err),
            }
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let matches = cli::build_cli().get_matches();
    let config = AppConfig::from_matches(&matches)?;
    logging::init(config.verbosity);

    let mut conn = db::open_or_init(&config.db_path)?;

    match matches.subcommand() {
        Some(("init", sub)) => {
            if sub.get_flag("seed") {
                let today = chrono::Local::now().date_naive();
                let report = db::seed_defaults(&mut conn, today)?;
                println!(
                    "Seeded {} categories, {} accounts, {} months, {} settings",
                    report.categories, report.accounts, report.months, report.settings
                );
            }
            println!("Database initialized at {}", config.db_path.display());
        }
        Some(("account", sub)) => commands::accounts::handle(&mut conn, sub)?,
        Some(("category", sub)) => commands::categories::handle(&conn, sub)?,
        Some(("month", sub)) => commands::months::handle(&conn, sub)?,
        Some(("tx", sub)) => commands::transactions::handle(&mut conn, sub)?,
        Some(("budget", sub)) => commands::budgets::handle(&conn, sub)?,
        Some(("dashboard", sub)) => commands::dashboard::handle(&conn, sub)?,
        Some(("analytics", sub)) => commands::analytics::handle(&conn, sub)?,
        Some(("debt", sub)) => commands::debts::handle(&conn, sub)?,
        Some(("savings", sub)) => commands::savings::handle(&conn, sub)?,
        Some(("settings", sub)) => commands::settings::handle(&mut conn, sub)?,
        Some(("export", sub)) => commands::exporter::handle(&conn, sub)?,
        Some(("doctor", sub)) => commands::doctor::handle(&conn, sub)?,
        Some(("health", _)) => {
            commands::doctor::health(&conn)?;
            println!("ok");
        }
        _ => {
            cli::build_cli().print_help()?;
            println!();
        }
    }
    Ok(())
}
