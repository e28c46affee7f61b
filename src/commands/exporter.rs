// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::transactions::{TransactionDetail, TransactionFilter, list_transactions};
use anyhow::{Result, bail};
use rusqlite::Connection;
use serde_json::json;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("transactions", sub)) => export_transactions(conn, sub),
        _ => Ok(()),
    }
}

fn export_transactions(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let fmt = sub.get_one::<String>("format").unwrap().to_lowercase();
    let out = sub.get_one::<String>("out").unwrap();
    let month_id = sub
        .get_one::<String>("month")
        .map(|s| crate::utils::parse_id(s))
        .transpose()?;

    let mut rows = list_transactions(
        conn,
        &TransactionFilter {
            month_id,
            ..Default::default()
        },
    )?;
    // Exports read oldest first.
    rows.reverse();

    match fmt.as_str() {
        "csv" => {
            let mut wtr = csv::Writer::from_path(out)?;
            wtr.write_record([
                "id", "date", "month", "account", "category", "type", "name", "amount", "note",
            ])?;
            for r in &rows {
                let t = &r.transaction;
                wtr.write_record([
                    t.id.to_string(),
                    t.date.to_string(),
                    r.month_name.clone(),
                    r.account_name.clone(),
                    r.category_name.clone(),
                    t.kind.to_string(),
                    t.name.clone(),
                    t.amount.to_string(),
                    t.note.clone().unwrap_or_default(),
                ])?;
            }
            wtr.flush()?;
        }
        "json" => {
            let items: Vec<_> = rows.iter().map(export_item).collect();
            std::fs::write(out, serde_json::to_string_pretty(&items)?)?;
        }
        other => bail!("Unknown format: {} (use csv|json)", other),
    }
    tracing::info!(path = %out, rows = rows.len(), format = %fmt, "exported transactions");
    println!("Exported {} transactions to {}", rows.len(), out);
    Ok(())
}

fn export_item(r: &TransactionDetail) -> serde_json::Value {
    let t = &r.transaction;
    json!({
        "id": t.id,
        "date": t.date.to_string(),
        "month": r.month_name,
        "account": r.account_name,
        "category": r.category_name,
        "type": t.kind.as_str(),
        "name": t.name,
        "amount": t.amount.to_string(),
        "note": t.note,
    })
}
