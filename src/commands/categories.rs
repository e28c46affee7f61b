// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::errors::{Error, Result};
use crate::models::{Category, EntryType, NewCategory};
use crate::utils::{maybe_print_json, pretty_table};
use rusqlite::{Connection, OptionalExtension, Row, params};

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> anyhow::Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let kind = match sub.get_one::<String>("type") {
                Some(s) => Some(s.parse::<EntryType>().map_err(anyhow::Error::msg)?),
                None => None,
            };
            let new = NewCategory {
                name: sub.get_one::<String>("name").unwrap().trim().to_string(),
                emoji: sub.get_one::<String>("emoji").cloned(),
                kind,
                active: None,
            };
            let cat = create_category(conn, &new)?;
            if !maybe_print_json(sub.get_flag("json"), &cat)? {
                println!("Added category '{}' ({})", cat.name, cat.kind);
            }
        }
        Some(("list", sub)) => {
            let cats = list_categories(conn)?;
            if !maybe_print_json(sub.get_flag("json"), &cats)? {
                let rows = cats
                    .into_iter()
                    .map(|c| {
                        vec![
                            c.id.to_string(),
                            format!("{} {}", c.emoji, c.name),
                            c.kind.to_string(),
                            if c.active { "yes".into() } else { "no".into() },
                        ]
                    })
                    .collect();
                println!(
                    "{}",
                    pretty_table(&["ID", "Category", "Type", "Active"], rows)
                );
            }
        }
        _ => {}
    }
    Ok(())
}

fn map_category(r: &Row<'_>) -> rusqlite::Result<Category> {
    Ok(Category {
        id: r.get(0)?,
        name: r.get(1)?,
        emoji: r.get(2)?,
        kind: r.get(3)?,
        active: r.get(4)?,
    })
}

pub fn create_category(conn: &Connection, new: &NewCategory) -> Result<Category> {
    if new.name.is_empty() {
        return Err(Error::Invalid("category name cannot be empty".into()));
    }
    conn.execute(
        "INSERT INTO categories(name, emoji, type, active)
         VALUES (?1, COALESCE(?2, '📁'), ?3, ?4)",
        params![
            new.name,
            new.emoji,
            new.kind.unwrap_or(EntryType::Expense),
            new.active.unwrap_or(true)
        ],
    )?;
    let cat = get_category(conn, conn.last_insert_rowid())?;
    tracing::info!(category_id = cat.id, name = %cat.name, "category created");
    Ok(cat)
}

pub fn list_categories(conn: &Connection) -> Result<Vec<Category>> {
    let mut stmt =
        conn.prepare("SELECT id, name, emoji, type, active FROM categories ORDER BY name")?;
    let rows = stmt.query_map([], map_category)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

pub fn get_category(conn: &Connection, id: i64) -> Result<Category> {
    conn.query_row(
        "SELECT id, name, emoji, type, active FROM categories WHERE id=?1",
        params![id],
        map_category,
    )
    .optional()?
    .ok_or_else(|| Error::not_found("category", id))
}
