// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::accounts::list_accounts;
use crate::errors::Result;
use crate::utils::{add_checked, decimal_at, maybe_print_json, pretty_table};
use chrono::{Datelike, NaiveDate};
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    pub kind: &'static str,
    pub detail: String,
}

pub fn handle(conn: &Connection, sub: &clap::ArgMatches) -> anyhow::Result<()> {
    let issues = check(conn)?;
    if maybe_print_json(sub.get_flag("json"), &issues)? {
        return Ok(());
    }
    if issues.is_empty() {
        println!("doctor: no issues found");
    } else {
        let rows = issues
            .into_iter()
            .map(|i| vec![i.kind.to_string(), i.detail])
            .collect();
        println!("{}", pretty_table(&["Issue", "Detail"], rows));
    }
    Ok(())
}

/// Scan for ledger inconsistencies.
///
/// 1) account balances that drifted from base balance plus signed transaction sum
/// 2) transactions dated outside the calendar month they are filed under
pub fn check(conn: &Connection) -> Result<Vec<Issue>> {
    let mut issues = Vec::new();

    let mut stmt = conn.prepare("SELECT account_id, type, amount FROM transactions")?;
    let mut net: HashMap<i64, Decimal> = HashMap::new();
    let mut cur = stmt.query([])?;
    while let Some(r) = cur.next()? {
        let account_id: i64 = r.get(0)?;
        let kind: crate::models::EntryType = r.get(1)?;
        let amount = decimal_at(r, 2)?;
        let sum = net.entry(account_id).or_insert(Decimal::ZERO);
        *sum = add_checked(*sum, kind.signed(amount), "ledger net")?;
    }
    for a in list_accounts(conn)? {
        let expected = add_checked(
            a.base_balance,
            net.get(&a.id).copied().unwrap_or(Decimal::ZERO),
            "expected balance",
        )?;
        if expected != a.balance {
            tracing::warn!(account_id = a.id, %expected, actual = %a.balance, "balance drift");
            issues.push(Issue {
                kind: "balance_drift",
                detail: format!(
                    "account {} '{}': balance {} but ledger says {}",
                    a.id, a.name, a.balance, expected
                ),
            });
        }
    }

    let mut stmt2 = conn.prepare(
        "SELECT t.id, t.date, m.year, m.month, m.name
         FROM transactions t JOIN months m ON t.month_id = m.id
         ORDER BY t.id",
    )?;
    let mut cur2 = stmt2.query([])?;
    while let Some(r) = cur2.next()? {
        let id: i64 = r.get(0)?;
        let date: NaiveDate = r.get(1)?;
        let year: i32 = r.get(2)?;
        let month: u32 = r.get(3)?;
        if date.year() != year || date.month() != month {
            let name: String = r.get(4)?;
            issues.push(Issue {
                kind: "date_outside_month",
                detail: format!("transaction {} dated {} is filed under {}", id, date, name),
            });
        }
    }

    Ok(issues)
}

/// Storage liveness check.
pub fn health(conn: &Connection) -> Result<()> {
    conn.query_row("SELECT 1", [], |r| r.get::<_, i64>(0))?;
    Ok(())
}
