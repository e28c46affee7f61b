// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use monthbook::commands::{accounts, analytics, categories, months, transactions};
use monthbook::db;
use monthbook::errors::Error;
use monthbook::models::{
    AccountKind, EntryType, NewAccount, NewCategory, NewMonth, NewTransaction,
};
use monthbook::utils::week_bucket;
use rusqlite::Connection;
use rust_decimal::Decimal;

struct Ids {
    account: i64,
    food: i64,
    transport: i64,
    salary: i64,
}

fn setup() -> (Connection, Ids) {
    let conn = Connection::open_in_memory().unwrap();
    db::init_schema(&conn).unwrap();
    let account = accounts::create_account(
        &conn,
        &NewAccount {
            name: "Dompet".into(),
            kind: AccountKind::Cash,
            balance: Decimal::ZERO,
            icon: None,
            color: None,
        },
    )
    .unwrap()
    .id;
    let cat = |name: &str, emoji: &str, kind: EntryType| {
        categories::create_category(
            &conn,
            &NewCategory {
                name: name.into(),
                emoji: Some(emoji.into()),
                kind: Some(kind),
                active: None,
            },
        )
        .unwrap()
        .id
    };
    let ids = Ids {
        account,
        food: cat("Makanan", "🍔", EntryType::Expense),
        transport: cat("Transport", "🚗", EntryType::Expense),
        salary: cat("Gaji", "💼", EntryType::Income),
    };
    (conn, ids)
}

fn month(conn: &Connection, year: i32, m: u32) -> i64 {
    months::create_month(
        conn,
        &NewMonth {
            name: None,
            year,
            month: m,
            start_balance: Decimal::ZERO,
            budget_limit: Decimal::ZERO,
        },
    )
    .unwrap()
    .id
}

fn record(
    conn: &mut Connection,
    ids: &Ids,
    month_id: i64,
    date: NaiveDate,
    kind: EntryType,
    category: i64,
    amount: i64,
) {
    transactions::create_transaction(
        conn,
        &NewTransaction {
            name: "entry".into(),
            amount: Decimal::from(amount),
            kind,
            date,
            month_id,
            account_id: ids.account,
            category_id: category,
            note: None,
        },
    )
    .unwrap();
}

fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn comparison_covers_last_six_months_oldest_first() {
    let (mut conn, ids) = setup();
    let mut created = Vec::new();
    // Seven months so the oldest one drops out of the window.
    for m in 1..=7 {
        let id = month(&conn, 2026, m);
        record(&mut conn, &ids, id, ymd(2026, m, 1), EntryType::Income, ids.salary, 1_000_000);
        record(&mut conn, &ids, id, ymd(2026, m, 2), EntryType::Expense, ids.food, 800_000);
        created.push(id);
    }

    let comparison = analytics::monthly_comparison(&conn).unwrap();
    assert_eq!(comparison.len(), analytics::COMPARISON_MONTHS);
    let ids_seen: Vec<i64> = comparison.iter().map(|c| c.month_id).collect();
    assert_eq!(ids_seen, created[1..].to_vec());
    assert_eq!(comparison[0].month, "Februari");
    assert_eq!(comparison[5].month, "Juli");
    for c in &comparison {
        assert_eq!(c.income, Decimal::from(1_000_000));
        assert_eq!(c.expense, Decimal::from(800_000));
    }
}

#[test]
fn savings_rate_is_floored_at_zero() {
    assert_eq!(
        analytics::savings_rate(Decimal::from(1_000_000), Decimal::from(1_200_000)).unwrap(),
        Decimal::ZERO
    );
    assert_eq!(
        analytics::savings_rate(Decimal::from(1_000_000), Decimal::from(800_000)).unwrap(),
        Decimal::from(20)
    );
    assert_eq!(
        analytics::savings_rate(Decimal::ZERO, Decimal::from(5)).unwrap(),
        Decimal::ZERO
    );
}

#[test]
fn savings_rate_out_of_range_is_reported() {
    let income: Decimal = "0.000001".parse().unwrap();
    let expense: Decimal = "1e23".parse().unwrap();
    assert!(matches!(
        analytics::savings_rate(income, expense),
        Err(Error::Overflow(_))
    ));
}

#[test]
fn late_days_share_the_last_week_bucket() {
    assert_eq!(week_bucket(ymd(2026, 4, 25)), 3);
    assert_eq!(week_bucket(ymd(2026, 3, 31)), 3);
    assert_eq!(week_bucket(ymd(2026, 3, 22)), 3);
    assert_eq!(week_bucket(ymd(2026, 3, 21)), 2);
    assert_eq!(week_bucket(ymd(2026, 3, 1)), 0);
    assert_eq!(week_bucket(ymd(2026, 3, 8)), 1);
}

#[test]
fn view_for_selected_month() {
    let (mut conn, ids) = setup();
    let march = month(&conn, 2026, 3);
    let april = month(&conn, 2026, 4);
    record(&mut conn, &ids, march, ymd(2026, 3, 1), EntryType::Income, ids.salary, 4_000_000);
    record(&mut conn, &ids, march, ymd(2026, 3, 3), EntryType::Expense, ids.food, 100_000);
    record(&mut conn, &ids, march, ymd(2026, 3, 10), EntryType::Expense, ids.transport, 60_000);
    record(&mut conn, &ids, march, ymd(2026, 3, 25), EntryType::Expense, ids.food, 150_000);
    record(&mut conn, &ids, april, ymd(2026, 4, 2), EntryType::Expense, ids.transport, 999_000);

    let view = analytics::analytics_view(&conn, Some(march)).unwrap();
    assert_eq!(view.month.id, march);

    let top: Vec<(&str, Decimal)> = view
        .top_categories
        .iter()
        .map(|c| (c.name.as_str(), c.amount))
        .collect();
    assert_eq!(
        top,
        vec![
            ("Makanan", Decimal::from(250_000)),
            ("Transport", Decimal::from(60_000))
        ]
    );

    let weeks: Vec<Decimal> = view.weekly_data.iter().map(|w| w.amount).collect();
    assert_eq!(
        weeks,
        vec![
            Decimal::from(100_000),
            Decimal::from(60_000),
            Decimal::ZERO,
            Decimal::from(150_000)
        ]
    );
    assert_eq!(view.weekly_data[0].week, "Week 1");

    // March has 31 days.
    assert_eq!(view.stats.daily_avg, Decimal::from(10_000));
    assert_eq!(view.stats.top_category, "Makanan");
    assert_eq!(view.stats.top_category_amount, Decimal::from(250_000));
    assert_eq!(view.stats.transaction_count, 3);
    assert_eq!(
        view.stats.savings_rate.round_dp(2),
        "92.25".parse::<Decimal>().unwrap()
    );
}

#[test]
fn default_view_uses_latest_month() {
    let (mut conn, ids) = setup();
    month(&conn, 2026, 5);
    let june = month(&conn, 2026, 6);
    record(&mut conn, &ids, june, ymd(2026, 6, 12), EntryType::Expense, ids.food, 30_000);

    let view = analytics::analytics_view(&conn, None).unwrap();
    assert_eq!(view.month.id, june);
    // June has 30 days.
    assert_eq!(view.stats.daily_avg, Decimal::from(1_000));
    assert_eq!(view.stats.savings_rate, Decimal::ZERO);

    let json = serde_json::to_value(&view).unwrap();
    assert_eq!(json["stats"]["topCategory"], "Makanan");
    assert_eq!(json["weeklyData"].as_array().unwrap().len(), 4);
    assert_eq!(json["monthlyComparison"].as_array().unwrap().len(), 2);
}

#[test]
fn empty_month_has_placeholder_stats() {
    let (conn, _) = setup();
    let feb = month(&conn, 2028, 2);
    let view = analytics::analytics_view(&conn, Some(feb)).unwrap();
    assert!(view.top_categories.is_empty());
    assert_eq!(view.stats.top_category, "N/A");
    assert_eq!(view.stats.daily_avg, Decimal::ZERO);
    assert_eq!(view.stats.transaction_count, 0);
}

#[test]
fn no_months_is_no_data() {
    let (conn, _) = setup();
    let err = analytics::analytics_view(&conn, None).unwrap_err();
    assert!(matches!(err, Error::NoData("months")));
    assert_eq!(err.status_code(), 404);
    assert!(matches!(
        analytics::analytics_view(&conn, Some(3)),
        Err(Error::NotFound { entity: "month", id: 3 })
    ));
}
