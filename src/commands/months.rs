// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Month periods: creation, editing, the one-way active → closed lifecycle, and the
//! months overview.

use super::budgets::list_budgets;
use super::transactions::{month_transactions, sum_by_type};
use crate::errors::{Error, Result};
use crate::models::{Budget, Month, MonthPatch, MonthStatus, NewMonth, Transaction};
use crate::utils::{
    decimal_at, fmt_money, maybe_print_json, month_label, parse_decimal, parse_id, pretty_table,
};
use rusqlite::{Connection, ErrorCode, OptionalExtension, Row, params};
use rust_decimal::Decimal;
use serde::Serialize;

const MONTH_COLS: &str = "id, name, year, month, start_balance, budget_limit, status";

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> anyhow::Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("list", sub)) => {
            let months = months_overview(conn)?;
            if !maybe_print_json(sub.get_flag("json"), &months)? {
                let ccy = super::settings::display_currency(conn)?;
                let rows = months
                    .iter()
                    .map(|s| {
                        vec![
                            s.month.id.to_string(),
                            s.month.name.clone(),
                            s.month.status.to_string(),
                            fmt_money(&s.income, &ccy),
                            fmt_money(&s.expense, &ccy),
                            fmt_money(&s.month.budget_limit, &ccy),
                        ]
                    })
                    .collect();
                println!(
                    "{}",
                    pretty_table(
                        &["ID", "Month", "Status", "Income", "Expense", "Budget"],
                        rows
                    )
                );
            }
        }
        Some(("show", sub)) => {
            let id = parse_id(sub.get_one::<String>("id").unwrap())?;
            let detail = month_detail(conn, id)?;
            if !maybe_print_json(sub.get_flag("json"), &detail)? {
                let m = &detail.month;
                println!(
                    "{} [{}] start {} limit {} ({} transactions, {} budgets)",
                    m.name,
                    m.status,
                    m.start_balance,
                    m.budget_limit,
                    detail.transactions.len(),
                    detail.budgets.len()
                );
            }
        }
        Some(("edit", sub)) => {
            let id = parse_id(sub.get_one::<String>("id").unwrap())?;
            let patch = MonthPatch {
                name: sub.get_one::<String>("name").map(|s| s.trim().to_string()),
                start_balance: sub
                    .get_one::<String>("start-balance")
                    .map(|s| parse_decimal(s))
                    .transpose()?,
                budget_limit: sub
                    .get_one::<String>("budget-limit")
                    .map(|s| parse_decimal(s))
                    .transpose()?,
            };
            let month = update_month(conn, id, &patch)?;
            if !maybe_print_json(sub.get_flag("json"), &month)? {
                println!("Updated {}", month.name);
            }
        }
        Some(("close", sub)) => {
            let id = parse_id(sub.get_one::<String>("id").unwrap())?;
            let month = close_month(conn, id)?;
            println!("Closed {}", month.name);
        }
        Some(("rm", sub)) => {
            let id = parse_id(sub.get_one::<String>("id").unwrap())?;
            delete_month(conn, id)?;
            println!("Removed month {}", id);
        }
        _ => {}
    }
    Ok(())
}

fn add(conn: &Connection, sub: &clap::ArgMatches) -> anyhow::Result<()> {
    let year: i32 = sub.get_one::<String>("year").unwrap().trim().parse()?;
    let month: u32 = sub.get_one::<String>("month").unwrap().trim().parse()?;
    let opt_decimal = |key: &str| -> anyhow::Result<Decimal> {
        match sub.get_one::<String>(key) {
            Some(s) => parse_decimal(s),
            None => Ok(Decimal::ZERO),
        }
    };
    let new = NewMonth {
        name: sub.get_one::<String>("name").map(|s| s.trim().to_string()),
        year,
        month,
        start_balance: opt_decimal("start-balance")?,
        budget_limit: opt_decimal("budget-limit")?,
    };
    let created = create_month(conn, &new)?;
    if !maybe_print_json(sub.get_flag("json"), &created)? {
        println!("Created {} (id {})", created.name, created.id);
    }
    Ok(())
}

pub(crate) fn map_month(r: &Row<'_>) -> rusqlite::Result<Month> {
    Ok(Month {
        id: r.get(0)?,
        name: r.get(1)?,
        year: r.get(2)?,
        month: r.get(3)?,
        start_balance: decimal_at(r, 4)?,
        budget_limit: decimal_at(r, 5)?,
        status: r.get(6)?,
    })
}

/// Open a new active period. Fails with [`Error::DuplicateMonth`] when the
/// `(year, month)` pair already exists.
pub fn create_month(conn: &Connection, new: &NewMonth) -> Result<Month> {
    if !(1..=12).contains(&new.month) {
        return Err(Error::Invalid(format!(
            "month must be between 1 and 12, got {}",
            new.month
        )));
    }
    if new.budget_limit < Decimal::ZERO {
        return Err(Error::Invalid("budget limit cannot be negative".into()));
    }
    let name = new
        .name
        .clone()
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| month_label(new.year, new.month));
    let inserted = conn.execute(
        "INSERT INTO months(name, year, month, start_balance, budget_limit, status)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            name,
            new.year,
            new.month,
            new.start_balance.to_string(),
            new.budget_limit.to_string(),
            MonthStatus::Active
        ],
    );
    match inserted {
        Ok(_) => {}
        Err(rusqlite::Error::SqliteFailure(e, _)) if e.code == ErrorCode::ConstraintViolation => {
            tracing::warn!(year = new.year, month = new.month, "duplicate month rejected");
            return Err(Error::DuplicateMonth {
                year: new.year,
                month: new.month,
            });
        }
        Err(e) => return Err(e.into()),
    }
    let month = get_month(conn, conn.last_insert_rowid())?;
    tracing::info!(month_id = month.id, name = %month.name, "month created");
    Ok(month)
}

pub fn get_month(conn: &Connection, id: i64) -> Result<Month> {
    conn.query_row(
        &format!("SELECT {} FROM months WHERE id=?1", MONTH_COLS),
        params![id],
        map_month,
    )
    .optional()?
    .ok_or_else(|| Error::not_found("month", id))
}

/// Most recently created month.
pub fn latest_month(conn: &Connection) -> Result<Option<Month>> {
    Ok(conn
        .query_row(
            &format!("SELECT {} FROM months ORDER BY id DESC LIMIT 1", MONTH_COLS),
            [],
            map_month,
        )
        .optional()?)
}

/// Month that may receive new transactions.
pub(crate) fn ensure_open(conn: &Connection, month_id: i64) -> Result<Month> {
    match get_month(conn, month_id) {
        Ok(month) if month.is_open() => Ok(month),
        Ok(_) | Err(Error::NotFound { .. }) => {
            tracing::warn!(month_id, "month closed or missing");
            Err(Error::MonthClosed { month_id })
        }
        Err(e) => Err(e),
    }
}

pub fn update_month(conn: &Connection, id: i64, patch: &MonthPatch) -> Result<Month> {
    if patch.budget_limit.is_some_and(|l| l < Decimal::ZERO) {
        return Err(Error::Invalid("budget limit cannot be negative".into()));
    }
    let changed = conn.execute(
        "UPDATE months SET
            name = COALESCE(?1, name),
            start_balance = COALESCE(?2, start_balance),
            budget_limit = COALESCE(?3, budget_limit)
         WHERE id = ?4",
        params![
            patch.name,
            patch.start_balance.map(|d| d.to_string()),
            patch.budget_limit.map(|d| d.to_string()),
            id
        ],
    )?;
    if changed == 0 {
        return Err(Error::not_found("month", id));
    }
    get_month(conn, id)
}

/// Close a month. There is no way back; closing twice is a no-op.
pub fn close_month(conn: &Connection, id: i64) -> Result<Month> {
    let changed = conn.execute(
        "UPDATE months SET status=?1 WHERE id=?2",
        params![MonthStatus::Closed, id],
    )?;
    if changed == 0 {
        return Err(Error::not_found("month", id));
    }
    tracing::info!(month_id = id, "month closed");
    get_month(conn, id)
}

/// Delete a month without transactions. Its budget rows go with it.
pub fn delete_month(conn: &Connection, id: i64) -> Result<()> {
    let used: i64 = conn.query_row(
        "SELECT COUNT(*) FROM transactions WHERE month_id=?1",
        params![id],
        |r| r.get(0),
    )?;
    if used > 0 {
        return Err(Error::InUse { entity: "month", id });
    }
    if conn.execute("DELETE FROM months WHERE id=?1", params![id])? == 0 {
        return Err(Error::not_found("month", id));
    }
    tracing::info!(month_id = id, "month deleted");
    Ok(())
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthDetail {
    #[serde(flatten)]
    pub month: Month,
    pub transactions: Vec<Transaction>,
    pub budgets: Vec<Budget>,
}

pub fn month_detail(conn: &Connection, id: i64) -> Result<MonthDetail> {
    let month = get_month(conn, id)?;
    Ok(MonthDetail {
        transactions: month_transactions(conn, id)?,
        budgets: list_budgets(conn, id)?,
        month,
    })
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthSummary {
    #[serde(flatten)]
    pub month: Month,
    pub income: Decimal,
    pub expense: Decimal,
}

/// Every month, newest period first, with income and expense summed from its ledger.
pub fn months_overview(conn: &Connection) -> Result<Vec<MonthSummary>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM months ORDER BY year DESC, month DESC",
        MONTH_COLS
    ))?;
    let months = stmt
        .query_map([], map_month)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    let mut out = Vec::with_capacity(months.len());
    for month in months {
        let (income, expense) = sum_by_type(&month_transactions(conn, month.id)?)?;
        out.push(MonthSummary {
            month,
            income,
            expense,
        });
    }
    Ok(out)
}
