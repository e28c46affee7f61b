// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate};
use directories::ProjectDirs;
use once_cell::sync::Lazy;
use rusqlite::functions::{Context as FnContext, FunctionFlags};
use rusqlite::{Connection, TransactionBehavior, params};
use rust_decimal::Decimal;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::utils::month_label;

static APP: Lazy<(&str, &str, &str)> =
    Lazy::new(|| ("com.alphavelocity", "Monthbook", "monthbook"));

const DEFAULT_CATEGORIES: &[(&str, &str, &str)] = &[
    ("Makanan", "🍔", "expense"),
    ("Transport", "🚗", "expense"),
    ("Belanja", "🛒", "expense"),
    ("Tagihan", "⚡", "expense"),
    ("Hiburan", "🎬", "expense"),
    ("Kesehatan", "💊", "expense"),
    ("Pendidikan", "📚", "expense"),
    ("Gaji", "💼", "income"),
    ("Investasi", "📈", "income"),
    ("Lainnya", "📦", "expense"),
];

pub fn default_db_path() -> Result<PathBuf> {
    let proj = ProjectDirs::from(APP.0, APP.1, APP.2)
        .context("Could not determine platform-specific data dir")?;
    let data_dir = proj.data_dir();
    fs::create_dir_all(data_dir).context("Failed to create data dir")?;
    Ok(data_dir.join("monthbook.sqlite"))
}

pub fn open_or_init(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Create directory {}", parent.display()))?;
    }
    let conn =
        Connection::open(path).with_context(|| format!("Open DB at {}", path.display()))?;
    // Concurrent writers wait for the write lock instead of failing immediately.
    conn.busy_timeout(Duration::from_secs(5))?;
    init_schema(&conn)?;
    tracing::debug!(path = %path.display(), "database ready");
    Ok(conn)
}

/// `dec_add(a, b)`: exact decimal addition over TEXT columns, so balance updates can be a
/// single `UPDATE ... SET balance = dec_add(balance, ?)` statement.
fn decimal_add(ctx: &FnContext<'_>) -> rusqlite::Result<String> {
    let parse = |idx: usize| -> rusqlite::Result<Decimal> {
        let raw: String = ctx.get(idx)?;
        raw.parse::<Decimal>()
            .map_err(|e| rusqlite::Error::UserFunctionError(Box::new(e)))
    };
    let sum = parse(0)?
        .checked_add(parse(1)?)
        .ok_or_else(|| rusqlite::Error::UserFunctionError("decimal overflow".into()))?;
    Ok(sum.to_string())
}

pub fn register_functions(conn: &Connection) -> rusqlite::Result<()> {
    conn.create_scalar_function(
        "dec_add",
        2,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        decimal_add,
    )
}

/// Register SQL functions and create every table. Safe to call on an existing database.
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    register_functions(conn)?;
    conn.execute_batch(
        r#"
    PRAGMA foreign_keys = ON;

    CREATE TABLE IF NOT EXISTS settings(
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS accounts(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE,
        type TEXT NOT NULL CHECK(type IN ('Cash','Bank','E-Wallet')),
        balance TEXT NOT NULL DEFAULT '0',
        base_balance TEXT NOT NULL DEFAULT '0',
        icon TEXT NOT NULL DEFAULT '💰',
        color TEXT NOT NULL DEFAULT '#7c2dff',
        created_at TEXT NOT NULL DEFAULT (datetime('now'))
    );

    CREATE TABLE IF NOT EXISTS categories(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE,
        emoji TEXT NOT NULL DEFAULT '📁',
        type TEXT NOT NULL DEFAULT 'expense' CHECK(type IN ('income','expense')),
        active INTEGER NOT NULL DEFAULT 1
    );

    CREATE TABLE IF NOT EXISTS months(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        year INTEGER NOT NULL,
        month INTEGER NOT NULL CHECK(month BETWEEN 1 AND 12),
        start_balance TEXT NOT NULL DEFAULT '0',
        budget_limit TEXT NOT NULL DEFAULT '0',
        status TEXT NOT NULL DEFAULT 'active' CHECK(status IN ('active','closed')),
        created_at TEXT NOT NULL DEFAULT (datetime('now')),
        UNIQUE(year, month)
    );

    CREATE TABLE IF NOT EXISTS transactions(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        amount TEXT NOT NULL,
        type TEXT NOT NULL CHECK(type IN ('income','expense')),
        note TEXT,
        date TEXT NOT NULL,
        month_id INTEGER NOT NULL,
        account_id INTEGER NOT NULL,
        category_id INTEGER NOT NULL,
        created_at TEXT NOT NULL DEFAULT (datetime('now')),
        FOREIGN KEY(month_id) REFERENCES months(id) ON DELETE RESTRICT,
        FOREIGN KEY(account_id) REFERENCES accounts(id) ON DELETE RESTRICT,
        FOREIGN KEY(category_id) REFERENCES categories(id) ON DELETE RESTRICT
    );
    CREATE INDEX IF NOT EXISTS idx_transactions_month ON transactions(month_id);
    CREATE INDEX IF NOT EXISTS idx_transactions_account ON transactions(account_id);
    CREATE INDEX IF NOT EXISTS idx_transactions_date ON transactions(date);

    CREATE TABLE IF NOT EXISTS budgets(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        month_id INTEGER NOT NULL,
        category_id INTEGER NOT NULL,
        limit_amount TEXT NOT NULL,
        UNIQUE(month_id, category_id),
        FOREIGN KEY(month_id) REFERENCES months(id) ON DELETE CASCADE,
        FOREIGN KEY(category_id) REFERENCES categories(id) ON DELETE CASCADE
    );

    CREATE TABLE IF NOT EXISTS debts(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        lender TEXT NOT NULL,
        total_amount TEXT NOT NULL,
        paid_amount TEXT NOT NULL DEFAULT '0',
        monthly_pay TEXT NOT NULL DEFAULT '0',
        icon TEXT NOT NULL DEFAULT '📋',
        color TEXT NOT NULL DEFAULT '#00c2ff'
    );

    CREATE TABLE IF NOT EXISTS savings_goals(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        target_amt TEXT NOT NULL,
        saved_amt TEXT NOT NULL DEFAULT '0',
        monthly_amt TEXT NOT NULL DEFAULT '0',
        deadline TEXT NOT NULL,
        icon TEXT NOT NULL DEFAULT '🐷',
        color TEXT NOT NULL DEFAULT '#00d9a6'
    );
    "#,
    )
}

/// Rows actually inserted by [`seed_defaults`]; rows that already existed are skipped.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub categories: usize,
    pub accounts: usize,
    pub months: usize,
    pub settings: usize,
}

/// Idempotently seed the default categories, a first cash account, the month containing
/// `today`, and the display currency.
pub fn seed_defaults(conn: &mut Connection, today: NaiveDate) -> crate::errors::Result<SeedReport> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let mut report = SeedReport::default();

    for (name, emoji, kind) in DEFAULT_CATEGORIES {
        report.categories += tx.execute(
            "INSERT OR IGNORE INTO categories(name, emoji, type) VALUES (?1, ?2, ?3)",
            params![name, emoji, kind],
        )?;
    }

    report.accounts += tx.execute(
        "INSERT OR IGNORE INTO accounts(id, name, type, balance, base_balance, icon, color)
         VALUES (1, 'Dompet Utama', 'Cash', '1000000', '1000000', '👛', '#7c2dff')",
        [],
    )?;

    report.months += tx.execute(
        "INSERT OR IGNORE INTO months(name, year, month, start_balance, budget_limit, status)
         VALUES (?1, ?2, ?3, '1000000', '0', 'active')",
        params![
            month_label(today.year(), today.month()),
            today.year(),
            today.month()
        ],
    )?;

    report.settings += tx.execute(
        "INSERT OR IGNORE INTO settings(key, value) VALUES ('currency', 'IDR')",
        [],
    )?;

    tx.commit()?;
    tracing::info!(?report, "seeded defaults");
    Ok(report)
}
