// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use monthbook::commands::{accounts, categories, months, transactions};
use monthbook::db;
use monthbook::errors::Error;
use monthbook::models::{
    AccountKind, EntryType, NewAccount, NewCategory, NewMonth, NewTransaction, TransactionPatch,
};
use rusqlite::Connection;
use rust_decimal::Decimal;

fn d(s: &str) -> Decimal {
    s.parse().unwrap()
}

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

struct Fixture {
    conn: Connection,
    wallet: i64,
    bank: i64,
    spare: i64,
    food: i64,
    salary: i64,
    month: i64,
}

fn setup() -> Fixture {
    let conn = Connection::open_in_memory().unwrap();
    db::init_schema(&conn).unwrap();
    let account = |name: &str, balance: &str| {
        accounts::create_account(
            &conn,
            &NewAccount {
                name: name.into(),
                kind: AccountKind::Cash,
                balance: d(balance),
                icon: None,
                color: None,
            },
        )
        .unwrap()
        .id
    };
    let wallet = account("Wallet", "1000000");
    let bank = account("Bank", "500000");
    let spare = account("Spare", "42");
    let category = |name: &str, kind: EntryType| {
        categories::create_category(
            &conn,
            &NewCategory {
                name: name.into(),
                emoji: None,
                kind: Some(kind),
                active: None,
            },
        )
        .unwrap()
        .id
    };
    let food = category("Makanan", EntryType::Expense);
    let salary = category("Gaji", EntryType::Income);
    let month = months::create_month(
        &conn,
        &NewMonth {
            name: None,
            year: 2026,
            month: 3,
            start_balance: d("1000000"),
            budget_limit: Decimal::ZERO,
        },
    )
    .unwrap()
    .id;
    Fixture {
        conn,
        wallet,
        bank,
        spare,
        food,
        salary,
        month,
    }
}

fn new_tx(f: &Fixture, amount: &str, kind: EntryType, account_id: i64) -> NewTransaction {
    NewTransaction {
        name: "Lunch".into(),
        amount: d(amount),
        kind,
        date: date("2026-03-10"),
        month_id: f.month,
        account_id,
        category_id: if kind == EntryType::Income { f.salary } else { f.food },
        note: None,
    }
}

fn balance(f: &Fixture, id: i64) -> Decimal {
    accounts::get_account(&f.conn, id).unwrap().balance
}

fn tx_count(conn: &Connection) -> i64 {
    conn.query_row("SELECT COUNT(*) FROM transactions", [], |r| r.get(0))
        .unwrap()
}

#[test]
fn expense_lowers_and_income_raises_balance() {
    let mut f = setup();
    let expense = new_tx(&f, "50000", EntryType::Expense, f.wallet);
    transactions::create_transaction(&mut f.conn, &expense).unwrap();
    assert_eq!(balance(&f, f.wallet), d("950000"));

    let income = new_tx(&f, "250000.50", EntryType::Income, f.wallet);
    transactions::create_transaction(&mut f.conn, &income).unwrap();
    assert_eq!(balance(&f, f.wallet), d("1200000.50"));
}

#[test]
fn create_then_delete_restores_balance_exactly() {
    let mut f = setup();
    let before = balance(&f, f.wallet);
    let t = new_tx(&f, "12345.67", EntryType::Expense, f.wallet);
    let created = transactions::create_transaction(&mut f.conn, &t).unwrap();
    assert_ne!(balance(&f, f.wallet), before);

    let removed = transactions::delete_transaction(&mut f.conn, created.id).unwrap();
    assert_eq!(removed.id, created.id);
    assert_eq!(balance(&f, f.wallet), before);
    assert_eq!(tx_count(&f.conn), 0);
}

#[test]
fn amount_update_applies_only_the_difference() {
    let mut f = setup();
    let expense = new_tx(&f, "100", EntryType::Expense, f.wallet);
    let e = transactions::create_transaction(&mut f.conn, &expense).unwrap();
    assert_eq!(balance(&f, f.wallet), d("999900"));
    let patch = TransactionPatch {
        amount: Some(d("150")),
        ..Default::default()
    };
    transactions::update_transaction(&mut f.conn, e.id, &patch).unwrap();
    assert_eq!(balance(&f, f.wallet), d("999850"));

    let income = new_tx(&f, "100", EntryType::Income, f.bank);
    let i = transactions::create_transaction(&mut f.conn, &income).unwrap();
    assert_eq!(balance(&f, f.bank), d("500100"));
    transactions::update_transaction(&mut f.conn, i.id, &patch).unwrap();
    assert_eq!(balance(&f, f.bank), d("500150"));
}

#[test]
fn type_flip_reverses_sign() {
    let mut f = setup();
    let t = new_tx(&f, "1000", EntryType::Expense, f.wallet);
    let created = transactions::create_transaction(&mut f.conn, &t).unwrap();
    let patch = TransactionPatch {
        kind: Some(EntryType::Income),
        category_id: Some(f.salary),
        ..Default::default()
    };
    let updated = transactions::update_transaction(&mut f.conn, created.id, &patch).unwrap();
    assert_eq!(updated.kind, EntryType::Income);
    assert_eq!(balance(&f, f.wallet), d("1001000"));
}

#[test]
fn moving_a_transaction_between_accounts() {
    let mut f = setup();
    let t = new_tx(&f, "20000", EntryType::Expense, f.wallet);
    let created = transactions::create_transaction(&mut f.conn, &t).unwrap();
    let spare_before = balance(&f, f.spare);

    let patch = TransactionPatch {
        account_id: Some(f.bank),
        ..Default::default()
    };
    let moved = transactions::update_transaction(&mut f.conn, created.id, &patch).unwrap();
    assert_eq!(moved.account_id, f.bank);
    assert_eq!(balance(&f, f.wallet), d("1000000"));
    assert_eq!(balance(&f, f.bank), d("480000"));
    assert_eq!(balance(&f, f.spare), spare_before);
}

#[test]
fn invariant_holds_after_mixed_operations() {
    let mut f = setup();
    let mut ids = Vec::new();
    for (amount, kind, account) in [
        ("100", EntryType::Expense, f.wallet),
        ("2500", EntryType::Income, f.wallet),
        ("75.25", EntryType::Expense, f.bank),
        ("10", EntryType::Expense, f.wallet),
    ] {
        let t = new_tx(&f, amount, kind, account);
        ids.push(transactions::create_transaction(&mut f.conn, &t).unwrap().id);
    }
    let patch = TransactionPatch {
        amount: Some(d("300")),
        account_id: Some(f.bank),
        ..Default::default()
    };
    transactions::update_transaction(&mut f.conn, ids[0], &patch).unwrap();
    transactions::delete_transaction(&mut f.conn, ids[3]).unwrap();

    for a in accounts::list_accounts(&f.conn).unwrap() {
        let ledger: Decimal = transactions::list_transactions(&f.conn, &Default::default())
            .unwrap()
            .iter()
            .filter(|r| r.transaction.account_id == a.id)
            .map(|r| r.transaction.balance_effect())
            .sum();
        assert_eq!(a.balance, a.base_balance + ledger, "account {}", a.name);
    }
    assert_eq!(balance(&f, f.wallet), d("1002500"));
    assert_eq!(balance(&f, f.bank), d("499624.75"));
}

#[test]
fn closed_month_rejects_new_transactions() {
    let mut f = setup();
    months::close_month(&f.conn, f.month).unwrap();
    let t = new_tx(&f, "5000", EntryType::Expense, f.wallet);
    let err = transactions::create_transaction(&mut f.conn, &t).unwrap_err();
    assert!(matches!(err, Error::MonthClosed { month_id } if month_id == f.month));
    assert_eq!(tx_count(&f.conn), 0);
    assert_eq!(balance(&f, f.wallet), d("1000000"));
}

#[test]
fn missing_month_is_reported_as_closed() {
    let mut f = setup();
    let mut t = new_tx(&f, "5000", EntryType::Expense, f.wallet);
    t.month_id = 999;
    let err = transactions::create_transaction(&mut f.conn, &t).unwrap_err();
    assert_eq!(err.code(), "MONTH_CLOSED");
}

#[test]
fn closed_month_transactions_can_still_be_edited() {
    let mut f = setup();
    let t = new_tx(&f, "5000", EntryType::Expense, f.wallet);
    let created = transactions::create_transaction(&mut f.conn, &t).unwrap();
    months::close_month(&f.conn, f.month).unwrap();
    let patch = TransactionPatch {
        amount: Some(d("6000")),
        ..Default::default()
    };
    transactions::update_transaction(&mut f.conn, created.id, &patch).unwrap();
    assert_eq!(balance(&f, f.wallet), d("994000"));
    transactions::delete_transaction(&mut f.conn, created.id).unwrap();
    assert_eq!(balance(&f, f.wallet), d("1000000"));
}

#[test]
fn non_positive_amounts_are_rejected() {
    let mut f = setup();
    for amount in ["0", "-5"] {
        let t = new_tx(&f, amount, EntryType::Expense, f.wallet);
        let err = transactions::create_transaction(&mut f.conn, &t).unwrap_err();
        assert!(matches!(err, Error::InvalidAmount(_)));
    }
    assert_eq!(tx_count(&f.conn), 0);
}

#[test]
fn unknown_references_fail_without_side_effects() {
    let mut f = setup();
    let mut t = new_tx(&f, "10", EntryType::Expense, 404);
    let err = transactions::create_transaction(&mut f.conn, &t).unwrap_err();
    assert!(matches!(err, Error::NotFound { entity: "account", id: 404 }));

    t.account_id = f.wallet;
    t.category_id = 77;
    let err = transactions::create_transaction(&mut f.conn, &t).unwrap_err();
    assert!(matches!(err, Error::NotFound { entity: "category", .. }));
    assert_eq!(tx_count(&f.conn), 0);
    assert_eq!(balance(&f, f.wallet), d("1000000"));

    let err = transactions::delete_transaction(&mut f.conn, 12).unwrap_err();
    assert_eq!(err.status_code(), 404);
}

#[test]
fn failed_update_rolls_back_the_reversal() {
    let mut f = setup();
    let t = new_tx(&f, "700", EntryType::Expense, f.wallet);
    let created = transactions::create_transaction(&mut f.conn, &t).unwrap();
    let patch = TransactionPatch {
        account_id: Some(9999),
        ..Default::default()
    };
    assert!(transactions::update_transaction(&mut f.conn, created.id, &patch).is_err());
    assert_eq!(balance(&f, f.wallet), d("999300"));
    let stored = transactions::get_transaction(&f.conn, created.id).unwrap();
    assert_eq!(stored.account_id, f.wallet);
}

#[test]
fn list_filters_and_orders_newest_first() {
    let mut f = setup();
    for (day, kind) in [
        ("2026-03-01", EntryType::Expense),
        ("2026-03-05", EntryType::Income),
        ("2026-03-05", EntryType::Expense),
    ] {
        let mut t = new_tx(&f, "10", kind, f.wallet);
        t.date = date(day);
        transactions::create_transaction(&mut f.conn, &t).unwrap();
    }
    let all = transactions::list_transactions(&f.conn, &Default::default()).unwrap();
    let ids: Vec<i64> = all.iter().map(|r| r.transaction.id).collect();
    assert_eq!(ids, vec![3, 2, 1]);
    assert_eq!(all[0].category_name, "Makanan");
    assert_eq!(all[0].month_name, "Maret 2026");

    let expenses = transactions::list_transactions(
        &f.conn,
        &transactions::TransactionFilter {
            month_id: Some(f.month),
            kind: Some(EntryType::Expense),
            limit: Some(1),
        },
    )
    .unwrap();
    assert_eq!(expenses.len(), 1);
    assert_eq!(expenses[0].transaction.id, 3);
}

#[test]
fn request_bodies_use_camel_case() {
    let body = r#"{
        "name": "Kopi",
        "amount": "25000",
        "type": "expense",
        "date": "2026-03-02",
        "monthId": 1,
        "accountId": 1,
        "categoryId": 1
    }"#;
    let parsed: NewTransaction = serde_json::from_str(body).unwrap();
    assert_eq!(parsed.amount, d("25000"));
    assert_eq!(parsed.kind, EntryType::Expense);
    assert!(parsed.note.is_none());

    let patch: TransactionPatch = serde_json::from_str(r#"{"accountId": 2}"#).unwrap();
    assert_eq!(patch.account_id, Some(2));
    assert!(patch.amount.is_none());
}

#[test]
fn note_is_kept_unless_explicitly_cleared() {
    let mut f = setup();
    let mut t = new_tx(&f, "25000", EntryType::Expense, f.wallet);
    t.note = Some("makan siang".into());
    let created = transactions::create_transaction(&mut f.conn, &t).unwrap();

    let rename = TransactionPatch {
        name: Some("Makan siang".into()),
        ..Default::default()
    };
    let kept = transactions::update_transaction(&mut f.conn, created.id, &rename).unwrap();
    assert_eq!(kept.note.as_deref(), Some("makan siang"));

    let patch: TransactionPatch = serde_json::from_str(r#"{"note": null}"#).unwrap();
    assert_eq!(patch.note, Some(None));
    let cleared = transactions::update_transaction(&mut f.conn, created.id, &patch).unwrap();
    assert_eq!(cleared.note, None);
    assert_eq!(cleared.name, "Makan siang");

    let absent: TransactionPatch = serde_json::from_str(r#"{"name": "Bakso"}"#).unwrap();
    assert_eq!(absent.note, None);
}
