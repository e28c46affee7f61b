// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Per-month analytics, always recomputed from the ledger.

use super::categories::list_categories;
use super::months::{get_month, latest_month, map_month};
use super::transactions::{month_transactions, sum_by_type};
use crate::errors::{Error, Result};
use crate::models::{EntryType, Month, Transaction};
use crate::utils::{
    WEEK_BUCKETS, add_checked, days_in_month, fmt_money, fmt_percent, maybe_print_json, parse_id,
    percentage, pretty_table, sub_checked, week_bucket,
};
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;

/// How many periods the month-over-month comparison covers.
pub const COMPARISON_MONTHS: usize = 6;

pub fn handle(conn: &Connection, sub: &clap::ArgMatches) -> anyhow::Result<()> {
    let month_id = sub
        .get_one::<String>("month")
        .map(|s| parse_id(s))
        .transpose()?;
    let view = analytics_view(conn, month_id)?;
    if maybe_print_json(sub.get_flag("json"), &view)? {
        return Ok(());
    }

    let ccy = super::settings::display_currency(conn)?;
    println!("Analytics for {}", view.month.name);
    let top = view
        .top_categories
        .iter()
        .map(|c| vec![format!("{} {}", c.emoji, c.name), fmt_money(&c.amount, &ccy)])
        .collect();
    println!("{}", pretty_table(&["Category", "Spent"], top));
    let weeks = view
        .weekly_data
        .iter()
        .map(|w| vec![w.week.clone(), fmt_money(&w.amount, &ccy)])
        .collect();
    println!("{}", pretty_table(&["Week", "Spent"], weeks));
    let months = view
        .monthly_comparison
        .iter()
        .map(|m| {
            vec![
                m.month.clone(),
                fmt_money(&m.income, &ccy),
                fmt_money(&m.expense, &ccy),
            ]
        })
        .collect();
    println!("{}", pretty_table(&["Month", "Income", "Expense"], months));
    let s = &view.stats;
    println!(
        "{}",
        pretty_table(
            &["Daily avg", "Top category", "Expenses", "Savings rate"],
            vec![vec![
                fmt_money(&s.daily_avg, &ccy),
                format!("{} ({})", s.top_category, fmt_money(&s.top_category_amount, &ccy)),
                s.transaction_count.to_string(),
                fmt_percent(&s.savings_rate),
            ]],
        )
    );
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryTotal {
    pub category_id: i64,
    pub name: String,
    pub emoji: String,
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekTotal {
    pub week: String,
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthComparison {
    pub month_id: i64,
    /// First word of the month name, e.g. `Maret`.
    pub month: String,
    pub income: Decimal,
    pub expense: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsStats {
    /// Expense divided by the calendar length of the month.
    pub daily_avg: Decimal,
    pub top_category: String,
    pub top_category_amount: Decimal,
    /// Number of expense transactions in the month.
    pub transaction_count: usize,
    /// `(income - expense) / income * 100`, floored at zero.
    pub savings_rate: Decimal,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsView {
    pub month: Month,
    pub top_categories: Vec<CategoryTotal>,
    pub weekly_data: Vec<WeekTotal>,
    pub monthly_comparison: Vec<MonthComparison>,
    pub stats: AnalyticsStats,
}

/// Analytics for `month_id`, or for the most recently created month when `None`.
pub fn analytics_view(conn: &Connection, month_id: Option<i64>) -> Result<AnalyticsView> {
    let month = match month_id {
        Some(id) => get_month(conn, id)?,
        None => latest_month(conn)?.ok_or(Error::NoData("months"))?,
    };
    let txs = month_transactions(conn, month.id)?;
    tracing::debug!(month_id = month.id, transactions = txs.len(), "analytics view");

    let top_categories = top_categories(conn, &txs)?;
    let weekly_data = weekly_totals(&txs)?
        .into_iter()
        .enumerate()
        .map(|(i, amount)| WeekTotal {
            week: format!("Week {}", i + 1),
            amount,
        })
        .collect();
    let monthly_comparison = monthly_comparison(conn)?;

    let (income, expense) = sum_by_type(&txs)?;
    let days = days_in_month(month.year, month.month)
        .ok_or_else(|| Error::Invalid(format!("invalid period {}-{}", month.year, month.month)))?;
    let stats = AnalyticsStats {
        daily_avg: expense
            .checked_div(Decimal::from(days))
            .ok_or(Error::Overflow("daily average"))?,
        top_category: top_categories
            .first()
            .map(|c| c.name.clone())
            .unwrap_or_else(|| "N/A".to_string()),
        top_category_amount: top_categories
            .first()
            .map(|c| c.amount)
            .unwrap_or(Decimal::ZERO),
        transaction_count: txs.iter().filter(|t| t.kind == EntryType::Expense).count(),
        savings_rate: savings_rate(income, expense)?,
    };

    Ok(AnalyticsView {
        month,
        top_categories,
        weekly_data,
        monthly_comparison,
        stats,
    })
}

/// Expense per category, largest first. Equal amounts keep category id order.
fn top_categories(conn: &Connection, txs: &[Transaction]) -> Result<Vec<CategoryTotal>> {
    let spent = super::budgets::spent_by_category(txs)?;
    let categories: HashMap<i64, _> = list_categories(conn)?
        .into_iter()
        .map(|c| (c.id, c))
        .collect();
    let mut totals: Vec<CategoryTotal> = spent
        .into_iter()
        .map(|(category_id, amount)| {
            let (name, emoji) = categories
                .get(&category_id)
                .map(|c| (c.name.clone(), c.emoji.clone()))
                .unwrap_or_else(|| ("Unknown".to_string(), "📁".to_string()));
            CategoryTotal {
                category_id,
                name,
                emoji,
                amount,
            }
        })
        .collect();
    totals.sort_by(|a, b| {
        b.amount
            .cmp(&a.amount)
            .then_with(|| a.category_id.cmp(&b.category_id))
    });
    Ok(totals)
}

/// Expense per fixed 4-bucket week of the month; days 22 and later share the last bucket.
pub fn weekly_totals(txs: &[Transaction]) -> Result<[Decimal; WEEK_BUCKETS]> {
    let mut weeks = [Decimal::ZERO; WEEK_BUCKETS];
    for t in txs.iter().filter(|t| t.kind == EntryType::Expense) {
        let bucket = week_bucket(t.date);
        weeks[bucket] = add_checked(weeks[bucket], t.amount, "weekly total")?;
    }
    Ok(weeks)
}

/// Income and expense for the most recently created months, oldest first.
pub fn monthly_comparison(conn: &Connection) -> Result<Vec<MonthComparison>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, year, month, start_balance, budget_limit, status
         FROM months ORDER BY id DESC LIMIT ?1",
    )?;
    let recent = stmt
        .query_map([COMPARISON_MONTHS as i64], map_month)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let mut out = Vec::with_capacity(recent.len());
    for m in recent.into_iter().rev() {
        let (income, expense) = sum_by_type(&month_transactions(conn, m.id)?)?;
        out.push(MonthComparison {
            month_id: m.id,
            month: m.name.split_whitespace().next().unwrap_or_default().to_string(),
            income,
            expense,
        });
    }
    Ok(out)
}

/// `(income - expense) / income * 100`, floored at zero; zero without income.
pub fn savings_rate(income: Decimal, expense: Decimal) -> Result<Decimal> {
    if income <= Decimal::ZERO {
        return Ok(Decimal::ZERO);
    }
    let saved = sub_checked(income, expense, "savings rate")?;
    Ok(percentage(saved, income)?.max(Decimal::ZERO))
}
