// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::errors::{Error, Result};
use crate::utils::{maybe_print_json, pretty_table};
use anyhow::Context;
use rusqlite::{Connection, OptionalExtension, TransactionBehavior, params};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

const DEFAULT_CURRENCY: &str = "IDR";

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> anyhow::Result<()> {
    match m.subcommand() {
        Some(("get", sub)) => {
            let all = load_all(conn)?;
            if let Some(key) = sub.get_one::<String>("key") {
                match all.get(key.trim()) {
                    Some(v) => println!("{}", v),
                    None => anyhow::bail!("Setting '{}' is not set", key.trim()),
                }
            } else if !maybe_print_json(sub.get_flag("json"), &all)? {
                let rows = all.into_iter().map(|(k, v)| vec![k, v]).collect();
                println!("{}", pretty_table(&["Key", "Value"], rows));
            }
        }
        Some(("set", sub)) => {
            let mut obj = Map::new();
            for pair in sub.get_many::<String>("pair").into_iter().flatten() {
                let (k, v) = pair
                    .split_once('=')
                    .with_context(|| format!("Expected KEY=VALUE, got '{}'", pair))?;
                obj.insert(k.trim().to_string(), Value::String(v.trim().to_string()));
            }
            if let Some(raw) = sub.get_one::<String>("from-json") {
                let parsed: Map<String, Value> =
                    serde_json::from_str(raw).context("Settings must be a JSON object")?;
                obj.extend(parsed);
            }
            let saved = save_all(conn, &obj)?;
            println!("Saved {} setting(s)", saved);
        }
        _ => {}
    }
    Ok(())
}

pub fn get_setting(conn: &Connection, key: &str) -> Result<Option<String>> {
    Ok(conn
        .query_row(
            "SELECT value FROM settings WHERE key=?1",
            params![key],
            |r| r.get(0),
        )
        .optional()?)
}

pub fn set_setting(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO settings(key, value) VALUES(?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        params![key, value],
    )?;
    Ok(())
}

/// All settings as a flat key to string map.
pub fn load_all(conn: &Connection) -> Result<BTreeMap<String, String>> {
    let mut stmt = conn.prepare("SELECT key, value FROM settings ORDER BY key")?;
    let rows = stmt.query_map([], |r| Ok((r.get(0)?, r.get(1)?)))?;
    Ok(rows.collect::<rusqlite::Result<BTreeMap<_, _>>>()?)
}

/// Upsert every entry of a JSON object in one SQL transaction. Values are stored as
/// strings: `true` becomes `"true"`, numbers keep their literal form.
pub fn save_all(conn: &mut Connection, values: &Map<String, Value>) -> Result<usize> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    for (key, value) in values {
        if key.is_empty() {
            return Err(Error::Invalid("setting key cannot be empty".into()));
        }
        set_setting(&tx, key, &coerce(value))?;
    }
    tx.commit()?;
    tracing::info!(count = values.len(), "settings saved");
    Ok(values.len())
}

fn coerce(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Currency code used to label money in tables.
pub fn display_currency(conn: &Connection) -> Result<String> {
    Ok(get_setting(conn, "currency")?.unwrap_or_else(|| DEFAULT_CURRENCY.to_string()))
}
