// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use monthbook::commands::{accounts, categories, doctor, months, transactions};
use monthbook::db;
use monthbook::errors::Error;
use monthbook::models::{
    AccountKind, AccountPatch, EntryType, NewAccount, NewCategory, NewMonth, NewTransaction,
    TransferRequest,
};
use rusqlite::Connection;
use rust_decimal::Decimal;
use std::thread;
use tempfile::tempdir;

fn setup() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    db::init_schema(&conn).unwrap();
    for (name, kind, balance) in [
        ("Dompet", AccountKind::Cash, 1_000_000),
        ("BCA", AccountKind::Bank, 250_000),
    ] {
        accounts::create_account(
            &conn,
            &NewAccount {
                name: name.into(),
                kind,
                balance: Decimal::from(balance),
                icon: None,
                color: None,
            },
        )
        .unwrap();
    }
    conn
}

fn req(from: i64, to: i64, amount: i64) -> TransferRequest {
    TransferRequest {
        from_account_id: from,
        to_account_id: to,
        amount: Decimal::from(amount),
    }
}

fn balances(conn: &Connection) -> Vec<Decimal> {
    accounts::list_accounts(conn)
        .unwrap()
        .into_iter()
        .map(|a| a.balance)
        .collect()
}

#[test]
fn self_transfer_is_rejected() {
    let mut conn = setup();
    let err = accounts::transfer(&mut conn, &req(1, 1, 1000)).unwrap_err();
    assert!(matches!(err, Error::InvalidTransfer(_)));
    assert_eq!(err.code(), "INVALID_TRANSFER");
}

#[test]
fn zero_and_negative_amounts_are_rejected() {
    let mut conn = setup();
    for amount in [0, -10] {
        let err = accounts::transfer(&mut conn, &req(1, 2, amount)).unwrap_err();
        assert!(matches!(err, Error::InvalidTransfer(_)));
    }
}

#[test]
fn missing_endpoint_changes_nothing() {
    let mut conn = setup();
    let before = balances(&conn);
    let err = accounts::transfer(&mut conn, &req(1, 99, 500)).unwrap_err();
    assert!(matches!(err, Error::InvalidTransfer(ref m) if m.contains("99")));
    assert_eq!(balances(&conn), before);

    let err = accounts::transfer(&mut conn, &req(42, 2, 500)).unwrap_err();
    assert!(matches!(err, Error::InvalidTransfer(_)));
    assert_eq!(balances(&conn), before);
}

#[test]
fn transfer_moves_money_without_ledger_rows() {
    let mut conn = setup();
    let out = accounts::transfer(&mut conn, &req(1, 2, 300_000)).unwrap();
    assert_eq!(out.from_account.balance, Decimal::from(700_000));
    assert_eq!(out.to_account.balance, Decimal::from(550_000));
    // Base balances follow transfers so the ledger invariant still holds.
    assert_eq!(out.from_account.base_balance, Decimal::from(700_000));
    assert_eq!(out.to_account.base_balance, Decimal::from(550_000));
    assert_eq!(
        accounts::total_balance(&conn).unwrap(),
        Decimal::from(1_250_000)
    );

    let rows: i64 = conn
        .query_row("SELECT COUNT(*) FROM transactions", [], |r| r.get(0))
        .unwrap();
    assert_eq!(rows, 0);
    assert!(doctor::check(&conn).unwrap().is_empty());
}

#[test]
fn transfer_may_overdraw() {
    let mut conn = setup();
    let out = accounts::transfer(&mut conn, &req(2, 1, 400_000)).unwrap();
    assert_eq!(out.from_account.balance, Decimal::from(-150_000));
}

#[test]
fn account_edit_keeps_balance_and_defaults() {
    let conn = setup();
    let a = accounts::get_account(&conn, 2).unwrap();
    assert_eq!(a.icon, "💰");
    assert_eq!(a.color, "#7c2dff");

    let edited = accounts::update_account(
        &conn,
        2,
        &AccountPatch {
            name: Some("BCA Tabungan".into()),
            kind: Some(AccountKind::EWallet),
            ..Default::default()
        },
    )
    .unwrap();
    assert_eq!(edited.name, "BCA Tabungan");
    assert_eq!(edited.kind, AccountKind::EWallet);
    assert_eq!(edited.balance, Decimal::from(250_000));

    let json = serde_json::to_value(&edited).unwrap();
    assert_eq!(json["type"], "E-Wallet");
    assert_eq!(json["baseBalance"], "250000");
}

#[test]
fn unknown_account_is_not_found() {
    let conn = setup();
    let err = accounts::get_account(&conn, 7).unwrap_err();
    assert!(matches!(err, Error::NotFound { entity: "account", id: 7 }));
    assert!(matches!(
        accounts::delete_account(&conn, 7),
        Err(Error::NotFound { .. })
    ));
}

#[test]
fn concurrent_writers_on_separate_connections_keep_balances_exact() {
    const OPS: usize = 50;
    let dir = tempdir().unwrap();
    let path = dir.path().join("ledger.sqlite");

    let conn = db::open_or_init(&path).unwrap();
    let account = |name: &str| {
        accounts::create_account(
            &conn,
            &NewAccount {
                name: name.into(),
                kind: AccountKind::Cash,
                balance: Decimal::ZERO,
                icon: None,
                color: None,
            },
        )
        .unwrap()
        .id
    };
    let shared = account("Bersama");
    let source = account("Sumber");
    let food = categories::create_category(
        &conn,
        &NewCategory {
            name: "Makanan".into(),
            emoji: None,
            kind: Some(EntryType::Expense),
            active: None,
        },
    )
    .unwrap()
    .id;
    let month = months::create_month(
        &conn,
        &NewMonth {
            name: None,
            year: 2026,
            month: 3,
            start_balance: Decimal::ZERO,
            budget_limit: Decimal::ZERO,
        },
    )
    .unwrap()
    .id;
    drop(conn);

    // Two threads spend 1 from the shared account, two move 2 into it.
    let workers: Vec<_> = (0..4)
        .map(|i| {
            let path = path.clone();
            thread::spawn(move || {
                let mut conn = db::open_or_init(&path).unwrap();
                for n in 0..OPS {
                    if i % 2 == 0 {
                        transactions::create_transaction(
                            &mut conn,
                            &NewTransaction {
                                name: format!("jajan {}-{}", i, n),
                                amount: Decimal::ONE,
                                kind: EntryType::Expense,
                                date: NaiveDate::from_ymd_opt(2026, 3, 10).unwrap(),
                                month_id: month,
                                account_id: shared,
                                category_id: food,
                                note: None,
                            },
                        )
                        .unwrap();
                    } else {
                        accounts::transfer(&mut conn, &req(source, shared, 2)).unwrap();
                    }
                }
            })
        })
        .collect();
    for w in workers {
        w.join().unwrap();
    }

    let conn = db::open_or_init(&path).unwrap();
    assert_eq!(
        accounts::get_account(&conn, shared).unwrap().balance,
        Decimal::from(100)
    );
    assert_eq!(
        accounts::get_account(&conn, source).unwrap().balance,
        Decimal::from(-200)
    );
    let rows: i64 = conn
        .query_row("SELECT COUNT(*) FROM transactions", [], |r| r.get(0))
        .unwrap();
    assert_eq!(rows, 2 * OPS as i64);
    assert!(doctor::check(&conn).unwrap().is_empty());
}
