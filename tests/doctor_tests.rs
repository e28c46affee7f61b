// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use monthbook::commands::{doctor, transactions};
use monthbook::db;
use monthbook::errors::Error;
use monthbook::models::{EntryType, NewTransaction};
use rusqlite::Connection;
use rust_decimal::Decimal;

fn seeded() -> Connection {
    let mut conn = Connection::open_in_memory().unwrap();
    db::init_schema(&conn).unwrap();
    db::seed_defaults(&mut conn, NaiveDate::from_ymd_opt(2026, 3, 1).unwrap()).unwrap();
    transactions::create_transaction(
        &mut conn,
        &NewTransaction {
            name: "Bensin".into(),
            amount: Decimal::from(40_000),
            kind: EntryType::Expense,
            date: NaiveDate::from_ymd_opt(2026, 3, 9).unwrap(),
            month_id: 1,
            account_id: 1,
            category_id: 2,
            note: None,
        },
    )
    .unwrap();
    conn
}

#[test]
fn clean_ledger_has_no_issues() {
    let conn = seeded();
    assert!(doctor::check(&conn).unwrap().is_empty());
    doctor::health(&conn).unwrap();
}

#[test]
fn detects_balance_drift() {
    let conn = seeded();
    conn.execute("UPDATE accounts SET balance='5' WHERE id=1", [])
        .unwrap();
    let issues = doctor::check(&conn).unwrap();
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].kind, "balance_drift");
    assert!(issues[0].detail.contains("960000"));
}

#[test]
fn detects_dates_outside_their_month() {
    let mut conn = seeded();
    transactions::create_transaction(
        &mut conn,
        &NewTransaction {
            name: "Salah bulan".into(),
            amount: Decimal::from(1),
            kind: EntryType::Income,
            date: NaiveDate::from_ymd_opt(2026, 5, 1).unwrap(),
            month_id: 1,
            account_id: 1,
            category_id: 8,
            note: None,
        },
    )
    .unwrap();
    let issues = doctor::check(&conn).unwrap();
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].kind, "date_outside_month");
}

#[test]
fn storage_errors_map_to_500() {
    let conn = seeded();
    let err: Error = conn
        .execute("INSERT INTO nowhere VALUES (1)", [])
        .unwrap_err()
        .into();
    assert_eq!(err.code(), "STORAGE_ERROR");
    assert_eq!(err.status_code(), 500);
    assert_eq!(err.body()["error"], err.to_string());
}
