// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::errors::{Error, Result};
use crate::models::{Account, AccountKind, AccountPatch, NewAccount, TransferRequest};
use crate::utils::{
    decimal_at, fmt_money, maybe_print_json, parse_decimal, pretty_table, resolve_account,
    sum_checked,
};
use rusqlite::{Connection, OptionalExtension, Row, TransactionBehavior, params};
use rust_decimal::Decimal;
use serde::Serialize;

const ACCOUNT_COLS: &str = "id, name, type, balance, base_balance, icon, color";

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> anyhow::Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        Some(("show", sub)) => {
            let id = resolve_account(conn, sub.get_one::<String>("id").unwrap())?;
            let account = get_account(conn, id)?;
            if !maybe_print_json(sub.get_flag("json"), &account)? {
                print_table(conn, &[account])?;
            }
        }
        Some(("edit", sub)) => edit(conn, sub)?,
        Some(("rm", sub)) => {
            let id = resolve_account(conn, sub.get_one::<String>("id").unwrap())?;
            delete_account(conn, id)?;
            println!("Removed account {}", id);
        }
        Some(("transfer", sub)) => transfer_cmd(conn, sub)?,
        _ => {}
    }
    Ok(())
}

fn add(conn: &Connection, sub: &clap::ArgMatches) -> anyhow::Result<()> {
    let kind: AccountKind = sub
        .get_one::<String>("type")
        .unwrap()
        .parse()
        .map_err(anyhow::Error::msg)?;
    let balance = match sub.get_one::<String>("balance") {
        Some(s) => parse_decimal(s)?,
        None => Decimal::ZERO,
    };
    let new = NewAccount {
        name: sub.get_one::<String>("name").unwrap().trim().to_string(),
        kind,
        balance,
        icon: sub.get_one::<String>("icon").cloned(),
        color: sub.get_one::<String>("color").cloned(),
    };
    let account = create_account(conn, &new)?;
    if !maybe_print_json(sub.get_flag("json"), &account)? {
        println!(
            "Added account '{}' ({}, opening {})",
            account.name, account.kind, account.balance
        );
    }
    Ok(())
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> anyhow::Result<()> {
    let accounts = list_accounts(conn)?;
    if !maybe_print_json(sub.get_flag("json"), &accounts)? {
        print_table(conn, &accounts)?;
        let ccy = super::settings::display_currency(conn)?;
        println!("Total: {}", fmt_money(&total_balance(conn)?, &ccy));
    }
    Ok(())
}

fn print_table(conn: &Connection, accounts: &[Account]) -> anyhow::Result<()> {
    let ccy = super::settings::display_currency(conn)?;
    let rows = accounts
        .iter()
        .map(|a| {
            vec![
                a.id.to_string(),
                format!("{} {}", a.icon, a.name),
                a.kind.to_string(),
                fmt_money(&a.balance, &ccy),
            ]
        })
        .collect();
    println!("{}", pretty_table(&["ID", "Account", "Type", "Balance"], rows));
    Ok(())
}

fn edit(conn: &Connection, sub: &clap::ArgMatches) -> anyhow::Result<()> {
    let id = resolve_account(conn, sub.get_one::<String>("id").unwrap())?;
    let kind = match sub.get_one::<String>("type") {
        Some(s) => Some(s.parse::<AccountKind>().map_err(anyhow::Error::msg)?),
        None => None,
    };
    let patch = AccountPatch {
        name: sub.get_one::<String>("name").map(|s| s.trim().to_string()),
        kind,
        icon: sub.get_one::<String>("icon").cloned(),
        color: sub.get_one::<String>("color").cloned(),
    };
    let account = update_account(conn, id, &patch)?;
    if !maybe_print_json(sub.get_flag("json"), &account)? {
        print_table(conn, &[account])?;
    }
    Ok(())
}

fn transfer_cmd(conn: &mut Connection, sub: &clap::ArgMatches) -> anyhow::Result<()> {
    let req = TransferRequest {
        from_account_id: resolve_account(conn, sub.get_one::<String>("from").unwrap())?,
        to_account_id: resolve_account(conn, sub.get_one::<String>("to").unwrap())?,
        amount: parse_decimal(sub.get_one::<String>("amount").unwrap())?,
    };
    let outcome = transfer(conn, &req)?;
    if !maybe_print_json(sub.get_flag("json"), &outcome)? {
        print_table(conn, &[outcome.from_account, outcome.to_account])?;
    }
    Ok(())
}

pub(crate) fn map_account(r: &Row<'_>) -> rusqlite::Result<Account> {
    Ok(Account {
        id: r.get(0)?,
        name: r.get(1)?,
        kind: r.get(2)?,
        balance: decimal_at(r, 3)?,
        base_balance: decimal_at(r, 4)?,
        icon: r.get(5)?,
        color: r.get(6)?,
    })
}

pub fn create_account(conn: &Connection, new: &NewAccount) -> Result<Account> {
    if new.name.is_empty() {
        return Err(Error::Invalid("account name cannot be empty".into()));
    }
    let opening = new.balance.to_string();
    conn.execute(
        "INSERT INTO accounts(name, type, balance, base_balance, icon, color)
         VALUES (?1, ?2, ?3, ?3, COALESCE(?4, '💰'), COALESCE(?5, '#7c2dff'))",
        params![new.name, new.kind, opening, new.icon, new.color],
    )?;
    let account = get_account(conn, conn.last_insert_rowid())?;
    tracing::info!(account_id = account.id, balance = %account.balance, "account created");
    Ok(account)
}

pub fn list_accounts(conn: &Connection) -> Result<Vec<Account>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM accounts ORDER BY name",
        ACCOUNT_COLS
    ))?;
    let rows = stmt.query_map([], map_account)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

pub fn get_account(conn: &Connection, id: i64) -> Result<Account> {
    conn.query_row(
        &format!("SELECT {} FROM accounts WHERE id=?1", ACCOUNT_COLS),
        params![id],
        map_account,
    )
    .optional()?
    .ok_or_else(|| Error::not_found("account", id))
}

/// Edit descriptive fields. The balance is owned by the ledger and cannot be set here.
pub fn update_account(conn: &Connection, id: i64, patch: &AccountPatch) -> Result<Account> {
    let changed = conn.execute(
        "UPDATE accounts SET
            name = COALESCE(?1, name),
            type = COALESCE(?2, type),
            icon = COALESCE(?3, icon),
            color = COALESCE(?4, color)
         WHERE id = ?5",
        params![patch.name, patch.kind, patch.icon, patch.color, id],
    )?;
    if changed == 0 {
        return Err(Error::not_found("account", id));
    }
    get_account(conn, id)
}

/// Delete an account that no transaction references.
pub fn delete_account(conn: &Connection, id: i64) -> Result<()> {
    let used: i64 = conn.query_row(
        "SELECT COUNT(*) FROM transactions WHERE account_id=?1",
        params![id],
        |r| r.get(0),
    )?;
    if used > 0 {
        return Err(Error::InUse {
            entity: "account",
            id,
        });
    }
    if conn.execute("DELETE FROM accounts WHERE id=?1", params![id])? == 0 {
        return Err(Error::not_found("account", id));
    }
    tracing::info!(account_id = id, "account deleted");
    Ok(())
}

/// Sum of every account's current balance.
pub fn total_balance(conn: &Connection) -> Result<Decimal> {
    let mut stmt = conn.prepare("SELECT balance FROM accounts")?;
    let balances = stmt
        .query_map([], |r| decimal_at(r, 0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    sum_checked(balances, "total balance")
}

/// Add `delta` to an account's balance in one statement and return the new balance.
///
/// With `shift_base` the non-ledger part of the balance moves as well; transfers use it,
/// ledger transactions do not.
pub(crate) fn adjust_balance(
    conn: &Connection,
    account_id: i64,
    delta: Decimal,
    shift_base: bool,
) -> Result<Decimal> {
    conn.query_row(
        "UPDATE accounts SET
            balance = dec_add(balance, ?1),
            base_balance = CASE WHEN ?2 THEN dec_add(base_balance, ?1) ELSE base_balance END
         WHERE id = ?3
         RETURNING balance",
        params![delta.to_string(), shift_base, account_id],
        |r| decimal_at(r, 0),
    )
    .optional()?
    .ok_or_else(|| Error::not_found("account", account_id))
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferOutcome {
    pub from_account: Account,
    pub to_account: Account,
}

/// Move money between two accounts. No ledger rows are written, so transfers never show
/// up in category or monthly aggregates.
pub fn transfer(conn: &mut Connection, req: &TransferRequest) -> Result<TransferOutcome> {
    if req.from_account_id == req.to_account_id {
        tracing::warn!(account_id = req.from_account_id, "rejected self transfer");
        return Err(Error::InvalidTransfer(
            "cannot transfer to the same account".into(),
        ));
    }
    if req.amount <= Decimal::ZERO {
        tracing::warn!(amount = %req.amount, "rejected non-positive transfer");
        return Err(Error::InvalidTransfer(format!(
            "amount {} must be greater than zero",
            req.amount
        )));
    }

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    adjust_balance(&tx, req.from_account_id, -req.amount, true).map_err(endpoint)?;
    adjust_balance(&tx, req.to_account_id, req.amount, true).map_err(endpoint)?;
    let outcome = TransferOutcome {
        from_account: get_account(&tx, req.from_account_id)?,
        to_account: get_account(&tx, req.to_account_id)?,
    };
    tx.commit()?;

    tracing::info!(
        from = req.from_account_id,
        to = req.to_account_id,
        amount = %req.amount,
        "transfer committed"
    );
    Ok(outcome)
}

fn endpoint(e: Error) -> Error {
    match e {
        Error::NotFound { id, .. } => {
            Error::InvalidTransfer(format!("account {} does not exist", id))
        }
        other => other,
    }
}
