// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Ledger mutations. Every create, update and delete changes the transaction row and the
//! owning account's balance inside one immediate SQLite transaction, so an account's
//! balance always equals its base balance plus the signed sum of its transactions.

use super::accounts::{adjust_balance, get_account};
use super::categories::get_category;
use super::months::ensure_open;
use crate::errors::{Error, Result};
use crate::models::{EntryType, NewTransaction, Transaction, TransactionPatch};
use crate::utils::{
    add_checked, decimal_at, fmt_money, maybe_print_json, parse_date, parse_decimal, parse_id,
    pretty_table, resolve_account, resolve_category,
};
use rusqlite::{Connection, OptionalExtension, Row, TransactionBehavior, params};
use rust_decimal::Decimal;
use serde::Serialize;

const TX_COLS: &str = "id, name, amount, type, note, date, month_id, account_id, category_id";

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> anyhow::Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("edit", sub)) => edit(conn, sub)?,
        Some(("rm", sub)) => {
            let id = parse_id(sub.get_one::<String>("id").unwrap())?;
            let removed = delete_transaction(conn, id)?;
            println!("Deleted transaction {} ('{}')", removed.id, removed.name);
        }
        Some(("show", sub)) => {
            let id = parse_id(sub.get_one::<String>("id").unwrap())?;
            let t = get_transaction(conn, id)?;
            if !maybe_print_json(sub.get_flag("json"), &t)? {
                println!(
                    "#{} {} {} {} {} (month {}, account {}, category {})",
                    t.id, t.date, t.kind, t.amount, t.name, t.month_id, t.account_id, t.category_id
                );
            }
        }
        Some(("list", sub)) => list(conn, sub)?,
        _ => {}
    }
    Ok(())
}

fn add(conn: &mut Connection, sub: &clap::ArgMatches) -> anyhow::Result<()> {
    let new = NewTransaction {
        name: sub.get_one::<String>("name").unwrap().trim().to_string(),
        amount: parse_decimal(sub.get_one::<String>("amount").unwrap())?,
        kind: sub
            .get_one::<String>("type")
            .unwrap()
            .parse()
            .map_err(anyhow::Error::msg)?,
        date: parse_date(sub.get_one::<String>("date").unwrap())?,
        month_id: parse_id(sub.get_one::<String>("month").unwrap())?,
        account_id: resolve_account(conn, sub.get_one::<String>("account").unwrap())?,
        category_id: resolve_category(conn, sub.get_one::<String>("category").unwrap())?,
        note: sub.get_one::<String>("note").map(|s| s.to_string()),
    };
    let created = create_transaction(conn, &new)?;
    if !maybe_print_json(sub.get_flag("json"), &created)? {
        println!(
            "Recorded {} {} '{}' on {} (id {})",
            created.kind, created.amount, created.name, created.date, created.id
        );
    }
    Ok(())
}

fn edit(conn: &mut Connection, sub: &clap::ArgMatches) -> anyhow::Result<()> {
    let id = parse_id(sub.get_one::<String>("id").unwrap())?;
    let patch = TransactionPatch {
        name: sub.get_one::<String>("name").map(|s| s.trim().to_string()),
        amount: sub
            .get_one::<String>("amount")
            .map(|s| parse_decimal(s))
            .transpose()?,
        kind: sub
            .get_one::<String>("type")
            .map(|s| s.parse::<EntryType>().map_err(anyhow::Error::msg))
            .transpose()?,
        date: sub
            .get_one::<String>("date")
            .map(|s| parse_date(s))
            .transpose()?,
        account_id: sub
            .get_one::<String>("account")
            .map(|s| resolve_account(conn, s))
            .transpose()?,
        category_id: sub
            .get_one::<String>("category")
            .map(|s| resolve_category(conn, s))
            .transpose()?,
        // An empty `--note ""` clears the note.
        note: sub
            .get_one::<String>("note")
            .map(|s| Some(s.trim().to_string()).filter(|n| !n.is_empty())),
    };
    let updated = update_transaction(conn, id, &patch)?;
    if !maybe_print_json(sub.get_flag("json"), &updated)? {
        println!("Updated transaction {}", updated.id);
    }
    Ok(())
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> anyhow::Result<()> {
    let filter = filter_from_args(sub)?;
    let rows = list_transactions(conn, &filter)?;
    if !maybe_print_json(sub.get_flag("json"), &rows)? {
        let ccy = super::settings::display_currency(conn)?;
        let data = rows
            .iter()
            .map(|r| {
                vec![
                    r.transaction.id.to_string(),
                    r.transaction.date.to_string(),
                    r.transaction.name.clone(),
                    r.transaction.kind.to_string(),
                    fmt_money(&r.transaction.amount, &ccy),
                    format!("{} {}", r.category_emoji, r.category_name),
                    r.account_name.clone(),
                    r.transaction.note.clone().unwrap_or_default(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["ID", "Date", "Name", "Type", "Amount", "Category", "Account", "Note"],
                data,
            )
        );
    }
    Ok(())
}

/// Build a list filter from `tx list` arguments. A type of `all` means no type filter.
pub fn filter_from_args(sub: &clap::ArgMatches) -> anyhow::Result<TransactionFilter> {
    let month_id = sub
        .get_one::<String>("month")
        .map(|s| parse_id(s))
        .transpose()?;
    let kind = match sub.get_one::<String>("type").map(|s| s.trim()) {
        None | Some("all") => None,
        Some(s) => Some(s.parse::<EntryType>().map_err(anyhow::Error::msg)?),
    };
    Ok(TransactionFilter {
        month_id,
        kind,
        limit: sub.get_one::<usize>("limit").copied(),
    })
}

pub(crate) fn map_transaction(r: &Row<'_>) -> rusqlite::Result<Transaction> {
    Ok(Transaction {
        id: r.get(0)?,
        name: r.get(1)?,
        amount: decimal_at(r, 2)?,
        kind: r.get(3)?,
        note: r.get(4)?,
        date: r.get(5)?,
        month_id: r.get(6)?,
        account_id: r.get(7)?,
        category_id: r.get(8)?,
    })
}

fn ensure_positive(amount: Decimal) -> Result<()> {
    if amount <= Decimal::ZERO {
        return Err(Error::InvalidAmount(amount));
    }
    Ok(())
}

/// Record a transaction against an active month and apply its balance effect.
///
/// Fails with [`Error::MonthClosed`] when the month is closed or missing; nothing is
/// written in that case.
pub fn create_transaction(conn: &mut Connection, new: &NewTransaction) -> Result<Transaction> {
    ensure_positive(new.amount)?;

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    ensure_open(&tx, new.month_id)?;
    get_account(&tx, new.account_id)?;
    get_category(&tx, new.category_id)?;

    tx.execute(
        "INSERT INTO transactions(name, amount, type, note, date, month_id, account_id, category_id)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            new.name,
            new.amount.to_string(),
            new.kind,
            new.note,
            new.date,
            new.month_id,
            new.account_id,
            new.category_id
        ],
    )?;
    let created = get_transaction(&tx, tx.last_insert_rowid())?;
    let balance = adjust_balance(&tx, created.account_id, created.balance_effect(), false)?;
    tx.commit()?;

    tracing::info!(
        transaction_id = created.id,
        account_id = created.account_id,
        amount = %created.amount,
        kind = %created.kind,
        balance = %balance,
        "transaction created"
    );
    Ok(created)
}

/// Rewrite a transaction: reverse its old effect on the old account, update the row, then
/// apply the new effect on the (possibly different) new account.
pub fn update_transaction(
    conn: &mut Connection,
    id: i64,
    patch: &TransactionPatch,
) -> Result<Transaction> {
    if let Some(amount) = patch.amount {
        ensure_positive(amount)?;
    }

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let old = get_transaction(&tx, id)?;
    adjust_balance(&tx, old.account_id, -old.balance_effect(), false)?;

    if let Some(category_id) = patch.category_id {
        get_category(&tx, category_id)?;
    }
    if let Some(account_id) = patch.account_id {
        get_account(&tx, account_id)?;
    }
    tx.execute(
        "UPDATE transactions SET
            name = COALESCE(?1, name),
            amount = COALESCE(?2, amount),
            type = COALESCE(?3, type),
            note = CASE WHEN ?9 THEN ?4 ELSE note END,
            date = COALESCE(?5, date),
            account_id = COALESCE(?6, account_id),
            category_id = COALESCE(?7, category_id)
         WHERE id = ?8",
        params![
            patch.name,
            patch.amount.map(|a| a.to_string()),
            patch.kind,
            patch.note.clone().flatten(),
            patch.date,
            patch.account_id,
            patch.category_id,
            id,
            patch.note.is_some()
        ],
    )?;
    let updated = get_transaction(&tx, id)?;
    let balance = adjust_balance(&tx, updated.account_id, updated.balance_effect(), false)?;
    tx.commit()?;

    tracing::info!(
        transaction_id = id,
        old_account_id = old.account_id,
        account_id = updated.account_id,
        old_effect = %old.balance_effect(),
        effect = %updated.balance_effect(),
        balance = %balance,
        "transaction updated"
    );
    Ok(updated)
}

/// Reverse a transaction's balance effect and remove it. Returns the deleted row.
pub fn delete_transaction(conn: &mut Connection, id: i64) -> Result<Transaction> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let old = get_transaction(&tx, id)?;
    let balance = adjust_balance(&tx, old.account_id, -old.balance_effect(), false)?;
    tx.execute("DELETE FROM transactions WHERE id=?1", params![id])?;
    tx.commit()?;

    tracing::info!(
        transaction_id = id,
        account_id = old.account_id,
        balance = %balance,
        "transaction deleted"
    );
    Ok(old)
}

pub fn get_transaction(conn: &Connection, id: i64) -> Result<Transaction> {
    conn.query_row(
        &format!("SELECT {} FROM transactions WHERE id=?1", TX_COLS),
        params![id],
        map_transaction,
    )
    .optional()?
    .ok_or_else(|| Error::not_found("transaction", id))
}

/// Every transaction of a month, newest first.
pub fn month_transactions(conn: &Connection, month_id: i64) -> Result<Vec<Transaction>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM transactions WHERE month_id=?1 ORDER BY date DESC, id DESC",
        TX_COLS
    ))?;
    let rows = stmt.query_map(params![month_id], map_transaction)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

/// `(income, expense)` totals of a set of transactions.
pub fn sum_by_type(txs: &[Transaction]) -> Result<(Decimal, Decimal)> {
    txs.iter()
        .try_fold((Decimal::ZERO, Decimal::ZERO), |(inc, exp), t| match t.kind {
            EntryType::Income => Ok((add_checked(inc, t.amount, "income total")?, exp)),
            EntryType::Expense => Ok((inc, add_checked(exp, t.amount, "expense total")?)),
        })
}

#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    pub month_id: Option<i64>,
    pub kind: Option<EntryType>,
    pub limit: Option<usize>,
}

/// A transaction joined with the names a client displays next to it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionDetail {
    #[serde(flatten)]
    pub transaction: Transaction,
    pub account_name: String,
    pub category_name: String,
    pub category_emoji: String,
    pub month_name: String,
}

pub fn list_transactions(
    conn: &Connection,
    filter: &TransactionFilter,
) -> Result<Vec<TransactionDetail>> {
    let mut stmt = conn.prepare(
        "SELECT t.id, t.name, t.amount, t.type, t.note, t.date, t.month_id, t.account_id,
                t.category_id, a.name, c.name, c.emoji, m.name
         FROM transactions t
         JOIN accounts a ON a.id = t.account_id
         JOIN categories c ON c.id = t.category_id
         JOIN months m ON m.id = t.month_id
         WHERE (?1 IS NULL OR t.month_id = ?1)
           AND (?2 IS NULL OR t.type = ?2)
         ORDER BY t.date DESC, t.id DESC
         LIMIT ?3",
    )?;
    let limit = filter
        .limit
        .and_then(|l| i64::try_from(l).ok())
        .unwrap_or(-1);
    let rows = stmt.query_map(params![filter.month_id, filter.kind, limit], |r| {
        Ok(TransactionDetail {
            transaction: map_transaction(r)?,
            account_name: r.get(9)?,
            category_name: r.get(10)?,
            category_emoji: r.get(11)?,
            month_name: r.get(12)?,
        })
    })?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}
