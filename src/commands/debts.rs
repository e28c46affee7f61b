// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Debts are tracked as plain counters. Payments bump `paid_amount` directly and never
//! touch the transaction ledger.

use crate::errors::{Error, Result};
use crate::models::{Debt, DebtPatch, NewDebt};
use crate::utils::{
    decimal_at, fmt_money, fmt_percent, maybe_print_json, parse_decimal, parse_id, pretty_table,
};
use rusqlite::{Connection, OptionalExtension, Row, params};
use rust_decimal::Decimal;

const DEBT_COLS: &str = "id, name, lender, total_amount, paid_amount, monthly_pay, icon, color";

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> anyhow::Result<()> {
    let opt_decimal = |sub: &clap::ArgMatches, key: &str| -> anyhow::Result<Option<Decimal>> {
        sub.get_one::<String>(key)
            .map(|s| parse_decimal(s))
            .transpose()
    };
    match m.subcommand() {
        Some(("add", sub)) => {
            let new = NewDebt {
                name: sub.get_one::<String>("name").unwrap().trim().to_string(),
                lender: sub.get_one::<String>("lender").unwrap().trim().to_string(),
                total_amount: parse_decimal(sub.get_one::<String>("total").unwrap())?,
                paid_amount: opt_decimal(sub, "paid")?.unwrap_or(Decimal::ZERO),
                monthly_pay: opt_decimal(sub, "monthly")?.unwrap_or(Decimal::ZERO),
                icon: sub.get_one::<String>("icon").cloned(),
                color: sub.get_one::<String>("color").cloned(),
            };
            let debt = create_debt(conn, &new)?;
            if !maybe_print_json(sub.get_flag("json"), &debt)? {
                println!("Added debt '{}' to {} (id {})", debt.name, debt.lender, debt.id);
            }
        }
        Some(("list", sub)) => {
            let debts = list_debts(conn)?;
            if !maybe_print_json(sub.get_flag("json"), &debts)? {
                let ccy = super::settings::display_currency(conn)?;
                let rows = debts
                    .iter()
                    .map(|d| -> Result<Vec<String>> {
                        Ok(vec![
                            d.id.to_string(),
                            format!("{} {}", d.icon, d.name),
                            d.lender.clone(),
                            fmt_money(&d.paid_amount, &ccy),
                            fmt_money(&d.total_amount, &ccy),
                            fmt_money(&d.monthly_pay, &ccy),
                            fmt_percent(&d.progress()?),
                        ])
                    })
                    .collect::<Result<Vec<_>>>()?;
                println!(
                    "{}",
                    pretty_table(
                        &["ID", "Debt", "Lender", "Paid", "Total", "Monthly", "Progress"],
                        rows
                    )
                );
            }
        }
        Some(("pay", sub)) => {
            let id = parse_id(sub.get_one::<String>("id").unwrap())?;
            let amount = parse_decimal(sub.get_one::<String>("amount").unwrap())?;
            let debt = record_payment(conn, id, amount)?;
            if !maybe_print_json(sub.get_flag("json"), &debt)? {
                println!(
                    "Paid {} on '{}': {} remaining",
                    amount,
                    debt.name,
                    debt.remaining()?
                );
            }
        }
        Some(("edit", sub)) => {
            let id = parse_id(sub.get_one::<String>("id").unwrap())?;
            let patch = DebtPatch {
                name: sub.get_one::<String>("name").map(|s| s.trim().to_string()),
                lender: sub.get_one::<String>("lender").map(|s| s.trim().to_string()),
                total_amount: opt_decimal(sub, "total")?,
                paid_amount: opt_decimal(sub, "paid")?,
                monthly_pay: opt_decimal(sub, "monthly")?,
            };
            let debt = update_debt(conn, id, &patch)?;
            if !maybe_print_json(sub.get_flag("json"), &debt)? {
                println!("Updated debt '{}'", debt.name);
            }
        }
        Some(("rm", sub)) => {
            let id = parse_id(sub.get_one::<String>("id").unwrap())?;
            delete_debt(conn, id)?;
            println!("Removed debt {}", id);
        }
        _ => {}
    }
    Ok(())
}

fn map_debt(r: &Row<'_>) -> rusqlite::Result<Debt> {
    Ok(Debt {
        id: r.get(0)?,
        name: r.get(1)?,
        lender: r.get(2)?,
        total_amount: decimal_at(r, 3)?,
        paid_amount: decimal_at(r, 4)?,
        monthly_pay: decimal_at(r, 5)?,
        icon: r.get(6)?,
        color: r.get(7)?,
    })
}

pub fn create_debt(conn: &Connection, new: &NewDebt) -> Result<Debt> {
    if new.total_amount <= Decimal::ZERO {
        return Err(Error::InvalidAmount(new.total_amount));
    }
    conn.execute(
        "INSERT INTO debts(name, lender, total_amount, paid_amount, monthly_pay, icon, color)
         VALUES (?1, ?2, ?3, ?4, ?5, COALESCE(?6, '📋'), COALESCE(?7, '#00c2ff'))",
        params![
            new.name,
            new.lender,
            new.total_amount.to_string(),
            new.paid_amount.to_string(),
            new.monthly_pay.to_string(),
            new.icon,
            new.color
        ],
    )?;
    let debt = get_debt(conn, conn.last_insert_rowid())?;
    tracing::info!(debt_id = debt.id, total = %debt.total_amount, "debt created");
    Ok(debt)
}

pub fn list_debts(conn: &Connection) -> Result<Vec<Debt>> {
    let mut stmt = conn.prepare(&format!("SELECT {} FROM debts ORDER BY id", DEBT_COLS))?;
    let rows = stmt.query_map([], map_debt)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

pub fn get_debt(conn: &Connection, id: i64) -> Result<Debt> {
    conn.query_row(
        &format!("SELECT {} FROM debts WHERE id=?1", DEBT_COLS),
        params![id],
        map_debt,
    )
    .optional()?
    .ok_or_else(|| Error::not_found("debt", id))
}

/// Add a payment to the paid counter.
pub fn record_payment(conn: &Connection, id: i64, amount: Decimal) -> Result<Debt> {
    if amount <= Decimal::ZERO {
        return Err(Error::InvalidAmount(amount));
    }
    let changed = conn.execute(
        "UPDATE debts SET paid_amount = dec_add(paid_amount, ?1) WHERE id = ?2",
        params![amount.to_string(), id],
    )?;
    if changed == 0 {
        return Err(Error::not_found("debt", id));
    }
    let debt = get_debt(conn, id)?;
    tracing::info!(debt_id = id, amount = %amount, paid = %debt.paid_amount, "debt payment");
    Ok(debt)
}

pub fn update_debt(conn: &Connection, id: i64, patch: &DebtPatch) -> Result<Debt> {
    let changed = conn.execute(
        "UPDATE debts SET
            name = COALESCE(?1, name),
            lender = COALESCE(?2, lender),
            total_amount = COALESCE(?3, total_amount),
            paid_amount = COALESCE(?4, paid_amount),
            monthly_pay = COALESCE(?5, monthly_pay)
         WHERE id = ?6",
        params![
            patch.name,
            patch.lender,
            patch.total_amount.map(|d| d.to_string()),
            patch.paid_amount.map(|d| d.to_string()),
            patch.monthly_pay.map(|d| d.to_string()),
            id
        ],
    )?;
    if changed == 0 {
        return Err(Error::not_found("debt", id));
    }
    get_debt(conn, id)
}

pub fn delete_debt(conn: &Connection, id: i64) -> Result<()> {
    if conn.execute("DELETE FROM debts WHERE id=?1", params![id])? == 0 {
        return Err(Error::not_found("debt", id));
    }
    tracing::info!(debt_id = id, "debt deleted");
    Ok(())
}
