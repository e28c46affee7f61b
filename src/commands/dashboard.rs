// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::accounts::total_balance;
use super::budgets::{list_budgets, spent_by_category};
use super::categories::get_category;
use super::months::get_month;
use super::transactions::{
    TransactionDetail, TransactionFilter, list_transactions, month_transactions, sum_by_type,
};
use crate::errors::Result;
use crate::models::Month;
use crate::utils::{
    fmt_money, fmt_percent, maybe_print_json, parse_id, percentage, pretty_table, sub_checked,
};
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::Serialize;

const RECENT_LIMIT: usize = 5;

pub fn handle(conn: &Connection, sub: &clap::ArgMatches) -> anyhow::Result<()> {
    let month_id = parse_id(sub.get_one::<String>("month").unwrap())?;
    let view = dashboard_view(conn, month_id)?;
    if maybe_print_json(sub.get_flag("json"), &view)? {
        return Ok(());
    }

    let ccy = super::settings::display_currency(conn)?;
    println!(
        "{}",
        pretty_table(
            &["Month", "Total balance", "Income", "Expense", "Remaining", "Used"],
            vec![vec![
                view.month.name.clone(),
                fmt_money(&view.total_balance, &ccy),
                fmt_money(&view.income, &ccy),
                fmt_money(&view.expense, &ccy),
                fmt_money(&view.remaining_budget, &ccy),
                fmt_percent(&view.usage_perc),
            ]],
        )
    );
    let recent = view
        .recent_transactions
        .iter()
        .map(|r| {
            vec![
                r.transaction.date.to_string(),
                r.transaction.name.clone(),
                r.transaction.kind.to_string(),
                fmt_money(&r.transaction.amount, &ccy),
                r.category_name.clone(),
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(&["Date", "Name", "Type", "Amount", "Category"], recent)
    );
    if !view.category_usage.is_empty() {
        let usage = view
            .category_usage
            .iter()
            .map(|u| {
                vec![
                    format!("{} {}", u.emoji, u.category_name),
                    fmt_money(&u.limit, &ccy),
                    fmt_money(&u.spent, &ccy),
                    fmt_percent(&u.percentage),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["Category", "Limit", "Spent", "Used"], usage)
        );
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryUsage {
    pub id: i64,
    pub month_id: i64,
    pub category_id: i64,
    pub category_name: String,
    pub emoji: String,
    pub limit: Decimal,
    pub spent: Decimal,
    pub percentage: Decimal,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    pub month: Month,
    /// Across all accounts, independent of the month.
    pub total_balance: Decimal,
    pub income: Decimal,
    pub expense: Decimal,
    /// `budgetLimit - expense` when a limit is set, otherwise zero. May go negative.
    pub remaining_budget: Decimal,
    pub usage_perc: Decimal,
    pub recent_transactions: Vec<TransactionDetail>,
    /// One entry per budget row of the month.
    pub category_usage: Vec<CategoryUsage>,
}

pub fn dashboard_view(conn: &Connection, month_id: i64) -> Result<DashboardView> {
    let month = get_month(conn, month_id)?;
    let txs = month_transactions(conn, month_id)?;
    let (income, expense) = sum_by_type(&txs)?;
    let spent = spent_by_category(&txs)?;

    let mut category_usage = Vec::new();
    for b in list_budgets(conn, month_id)? {
        let category = get_category(conn, b.category_id)?;
        let spent = spent.get(&b.category_id).copied().unwrap_or(Decimal::ZERO);
        category_usage.push(CategoryUsage {
            id: b.id,
            month_id: b.month_id,
            category_id: b.category_id,
            category_name: category.name,
            emoji: category.emoji,
            limit: b.limit,
            spent,
            percentage: percentage(spent, b.limit)?,
        });
    }

    let remaining_budget = if month.budget_limit > Decimal::ZERO {
        sub_checked(month.budget_limit, expense, "remaining budget")?
    } else {
        Decimal::ZERO
    };
    let recent_transactions = list_transactions(
        conn,
        &TransactionFilter {
            month_id: Some(month_id),
            kind: None,
            limit: Some(RECENT_LIMIT),
        },
    )?;
    tracing::debug!(month_id, transactions = txs.len(), "dashboard view");

    Ok(DashboardView {
        total_balance: total_balance(conn)?,
        income,
        expense,
        remaining_budget,
        usage_perc: percentage(expense, month.budget_limit)?,
        recent_transactions,
        category_usage,
        month,
    })
}
