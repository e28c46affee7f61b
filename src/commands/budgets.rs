// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::categories::{get_category, list_categories};
use super::months::get_month;
use super::transactions::month_transactions;
use crate::errors::{Error, Result};
use crate::models::{Budget, EntryType, Transaction};
use crate::utils::{
    add_checked, decimal_at, fmt_money, fmt_percent, maybe_print_json, parse_decimal, parse_id,
    percentage, pretty_table, resolve_category,
};
use rusqlite::{Connection, params};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> anyhow::Result<()> {
    match m.subcommand() {
        Some(("set", sub)) => {
            let month_id = parse_id(sub.get_one::<String>("month").unwrap())?;
            let category_id = resolve_category(conn, sub.get_one::<String>("category").unwrap())?;
            let limit = parse_decimal(sub.get_one::<String>("limit").unwrap())?;
            let budget = set_budget(conn, month_id, category_id, limit)?;
            if !maybe_print_json(sub.get_flag("json"), &budget)? {
                println!(
                    "Budget for category {} in month {} set to {}",
                    budget.category_id, budget.month_id, budget.limit
                );
            }
        }
        Some(("report", sub)) => {
            let month_id = parse_id(sub.get_one::<String>("month").unwrap())?;
            let lines = budget_view(conn, month_id)?;
            if !maybe_print_json(sub.get_flag("json"), &lines)? {
                let ccy = super::settings::display_currency(conn)?;
                let rows = lines
                    .iter()
                    .map(|l| {
                        vec![
                            format!("{} {}", l.emoji, l.name),
                            fmt_money(&l.limit, &ccy),
                            fmt_money(&l.spent, &ccy),
                            fmt_percent(&l.percentage),
                        ]
                    })
                    .collect();
                println!(
                    "{}",
                    pretty_table(&["Category", "Limit", "Spent", "Used"], rows)
                );
            }
        }
        _ => {}
    }
    Ok(())
}

/// Insert or replace the limit for a (month, category) pair.
pub fn set_budget(
    conn: &Connection,
    month_id: i64,
    category_id: i64,
    limit: Decimal,
) -> Result<Budget> {
    if limit < Decimal::ZERO {
        return Err(Error::Invalid(format!("budget limit {} is negative", limit)));
    }
    get_month(conn, month_id)?;
    get_category(conn, category_id)?;
    let budget = conn.query_row(
        "INSERT INTO budgets(month_id, category_id, limit_amount) VALUES (?1, ?2, ?3)
         ON CONFLICT(month_id, category_id) DO UPDATE SET limit_amount=excluded.limit_amount
         RETURNING id, month_id, category_id, limit_amount",
        params![month_id, category_id, limit.to_string()],
        map_budget,
    )?;
    tracing::info!(month_id, category_id, limit = %limit, "budget set");
    Ok(budget)
}

fn map_budget(r: &rusqlite::Row<'_>) -> rusqlite::Result<Budget> {
    Ok(Budget {
        id: r.get(0)?,
        month_id: r.get(1)?,
        category_id: r.get(2)?,
        limit: decimal_at(r, 3)?,
    })
}

pub fn list_budgets(conn: &Connection, month_id: i64) -> Result<Vec<Budget>> {
    let mut stmt = conn.prepare(
        "SELECT id, month_id, category_id, limit_amount FROM budgets
         WHERE month_id=?1 ORDER BY category_id",
    )?;
    let rows = stmt.query_map(params![month_id], map_budget)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

/// Expense totals per category id.
pub fn spent_by_category(txs: &[Transaction]) -> Result<HashMap<i64, Decimal>> {
    let mut spent = HashMap::new();
    for t in txs.iter().filter(|t| t.kind == EntryType::Expense) {
        let total = spent.entry(t.category_id).or_insert(Decimal::ZERO);
        *total = add_checked(*total, t.amount, "category spend")?;
    }
    Ok(spent)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetLine {
    pub id: i64,
    pub name: String,
    pub emoji: String,
    pub limit: Decimal,
    pub spent: Decimal,
    /// `spent / limit * 100`, uncapped; zero when no limit is set.
    pub percentage: Decimal,
}

/// Budget usage for every category in a month, including categories without a limit.
pub fn budget_view(conn: &Connection, month_id: i64) -> Result<Vec<BudgetLine>> {
    get_month(conn, month_id)?;
    let limits: HashMap<i64, Decimal> = list_budgets(conn, month_id)?
        .into_iter()
        .map(|b| (b.category_id, b.limit))
        .collect();
    let spent = spent_by_category(&month_transactions(conn, month_id)?)?;

    let mut categories = list_categories(conn)?;
    categories.sort_by_key(|c| c.id);
    tracing::debug!(month_id, categories = categories.len(), "budget view");

    categories
        .into_iter()
        .map(|c| -> Result<BudgetLine> {
            let limit = limits.get(&c.id).copied().unwrap_or(Decimal::ZERO);
            let spent = spent.get(&c.id).copied().unwrap_or(Decimal::ZERO);
            Ok(BudgetLine {
                id: c.id,
                name: c.name,
                emoji: c.emoji,
                limit,
                spent,
                percentage: percentage(spent, limit)?,
            })
        })
        .collect()
}
