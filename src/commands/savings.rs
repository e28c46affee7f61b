// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::errors::{Error, Result};
use crate::models::{NewSavingsGoal, SavingsGoal, SavingsPatch};
use crate::utils::{
    decimal_at, fmt_money, fmt_percent, maybe_print_json, parse_date, parse_decimal, parse_id,
    pretty_table,
};
use rusqlite::{Connection, OptionalExtension, Row, params};
use rust_decimal::Decimal;

const GOAL_COLS: &str = "id, name, target_amt, saved_amt, monthly_amt, deadline, icon, color";

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> anyhow::Result<()> {
    let opt_decimal = |sub: &clap::ArgMatches, key: &str| -> anyhow::Result<Option<Decimal>> {
        sub.get_one::<String>(key)
            .map(|s| parse_decimal(s))
            .transpose()
    };
    match m.subcommand() {
        Some(("add", sub)) => {
            let new = NewSavingsGoal {
                name: sub.get_one::<String>("name").unwrap().trim().to_string(),
                target_amt: parse_decimal(sub.get_one::<String>("target").unwrap())?,
                saved_amt: opt_decimal(sub, "saved")?.unwrap_or(Decimal::ZERO),
                monthly_amt: opt_decimal(sub, "monthly")?.unwrap_or(Decimal::ZERO),
                deadline: parse_date(sub.get_one::<String>("deadline").unwrap())?,
                icon: sub.get_one::<String>("icon").cloned(),
                color: sub.get_one::<String>("color").cloned(),
            };
            let goal = create_goal(conn, &new)?;
            if !maybe_print_json(sub.get_flag("json"), &goal)? {
                println!("Added savings goal '{}' (id {})", goal.name, goal.id);
            }
        }
        Some(("list", sub)) => {
            let goals = list_goals(conn)?;
            if !maybe_print_json(sub.get_flag("json"), &goals)? {
                let ccy = super::settings::display_currency(conn)?;
                let rows = goals
                    .iter()
                    .map(|g| -> Result<Vec<String>> {
                        Ok(vec![
                            g.id.to_string(),
                            format!("{} {}", g.icon, g.name),
                            fmt_money(&g.saved_amt, &ccy),
                            fmt_money(&g.target_amt, &ccy),
                            g.deadline.to_string(),
                            fmt_percent(&g.progress()?),
                        ])
                    })
                    .collect::<Result<Vec<_>>>()?;
                println!(
                    "{}",
                    pretty_table(
                        &["ID", "Goal", "Saved", "Target", "Deadline", "Progress"],
                        rows
                    )
                );
            }
        }
        Some(("deposit", sub)) => {
            let id = parse_id(sub.get_one::<String>("id").unwrap())?;
            let amount = parse_decimal(sub.get_one::<String>("amount").unwrap())?;
            let goal = deposit(conn, id, amount)?;
            if !maybe_print_json(sub.get_flag("json"), &goal)? {
                println!(
                    "Saved {} towards '{}' ({} of {})",
                    amount, goal.name, goal.saved_amt, goal.target_amt
                );
            }
        }
        Some(("edit", sub)) => {
            let id = parse_id(sub.get_one::<String>("id").unwrap())?;
            let patch = SavingsPatch {
                name: sub.get_one::<String>("name").map(|s| s.trim().to_string()),
                target_amt: opt_decimal(sub, "target")?,
                saved_amt: opt_decimal(sub, "saved")?,
                monthly_amt: opt_decimal(sub, "monthly")?,
            };
            let goal = update_goal(conn, id, &patch)?;
            if !maybe_print_json(sub.get_flag("json"), &goal)? {
                println!("Updated savings goal '{}'", goal.name);
            }
        }
        Some(("rm", sub)) => {
            let id = parse_id(sub.get_one::<String>("id").unwrap())?;
            delete_goal(conn, id)?;
            println!("Removed savings goal {}", id);
        }
        _ => {}
    }
    Ok(())
}

fn map_goal(r: &Row<'_>) -> rusqlite::Result<SavingsGoal> {
    Ok(SavingsGoal {
        id: r.get(0)?,
        name: r.get(1)?,
        target_amt: decimal_at(r, 2)?,
        saved_amt: decimal_at(r, 3)?,
        monthly_amt: decimal_at(r, 4)?,
        deadline: r.get(5)?,
        icon: r.get(6)?,
        color: r.get(7)?,
    })
}

pub fn create_goal(conn: &Connection, new: &NewSavingsGoal) -> Result<SavingsGoal> {
    if new.target_amt <= Decimal::ZERO {
        return Err(Error::InvalidAmount(new.target_amt));
    }
    conn.execute(
        "INSERT INTO savings_goals(name, target_amt, saved_amt, monthly_amt, deadline, icon, color)
         VALUES (?1, ?2, ?3, ?4, ?5, COALESCE(?6, '🐷'), COALESCE(?7, '#00d9a6'))",
        params![
            new.name,
            new.target_amt.to_string(),
            new.saved_amt.to_string(),
            new.monthly_amt.to_string(),
            new.deadline,
            new.icon,
            new.color
        ],
    )?;
    let goal = get_goal(conn, conn.last_insert_rowid())?;
    tracing::info!(goal_id = goal.id, target = %goal.target_amt, "savings goal created");
    Ok(goal)
}

/// Goals ordered by deadline, soonest first.
pub fn list_goals(conn: &Connection) -> Result<Vec<SavingsGoal>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM savings_goals ORDER BY deadline, id",
        GOAL_COLS
    ))?;
    let rows = stmt.query_map([], map_goal)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

pub fn get_goal(conn: &Connection, id: i64) -> Result<SavingsGoal> {
    conn.query_row(
        &format!("SELECT {} FROM savings_goals WHERE id=?1", GOAL_COLS),
        params![id],
        map_goal,
    )
    .optional()?
    .ok_or_else(|| Error::not_found("savings goal", id))
}

/// Add to the saved counter. Does not move money between accounts.
pub fn deposit(conn: &Connection, id: i64, amount: Decimal) -> Result<SavingsGoal> {
    if amount <= Decimal::ZERO {
        return Err(Error::InvalidAmount(amount));
    }
    let changed = conn.execute(
        "UPDATE savings_goals SET saved_amt = dec_add(saved_amt, ?1) WHERE id = ?2",
        params![amount.to_string(), id],
    )?;
    if changed == 0 {
        return Err(Error::not_found("savings goal", id));
    }
    let goal = get_goal(conn, id)?;
    tracing::info!(goal_id = id, amount = %amount, saved = %goal.saved_amt, "savings deposit");
    Ok(goal)
}

pub fn update_goal(conn: &Connection, id: i64, patch: &SavingsPatch) -> Result<SavingsGoal> {
    let changed = conn.execute(
        "UPDATE savings_goals SET
            name = COALESCE(?1, name),
            target_amt = COALESCE(?2, target_amt),
            saved_amt = COALESCE(?3, saved_amt),
            monthly_amt = COALESCE(?4, monthly_amt)
         WHERE id = ?5",
        params![
            patch.name,
            patch.target_amt.map(|d| d.to_string()),
            patch.saved_amt.map(|d| d.to_string()),
            patch.monthly_amt.map(|d| d.to_string()),
            id
        ],
    )?;
    if changed == 0 {
        return Err(Error::not_found("savings goal", id));
    }
    get_goal(conn, id)
}

pub fn delete_goal(conn: &Connection, id: i64) -> Result<()> {
    if conn.execute("DELETE FROM savings_goals WHERE id=?1", params![id])? == 0 {
        return Err(Error::not_found("savings goal", id));
    }
    tracing::info!(goal_id = id, "savings goal deleted");
    Ok(())
}
