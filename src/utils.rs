// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::errors::Error;
use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate};
use comfy_table::{Cell, Table, presets::UTF8_FULL};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, params};
use rust_decimal::Decimal;

const MONTH_NAMES: [&str; 12] = [
    "Januari",
    "Februari",
    "Maret",
    "April",
    "Mei",
    "Juni",
    "Juli",
    "Agustus",
    "September",
    "Oktober",
    "November",
    "Desember",
];

/// Number of analytics week buckets; the last one absorbs days 22 onwards.
pub const WEEK_BUCKETS: usize = 4;

pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", s))
}

pub fn parse_decimal(s: &str) -> Result<Decimal> {
    s.trim()
        .parse::<Decimal>()
        .with_context(|| format!("Invalid decimal '{}'", s))
}

pub fn parse_id(s: &str) -> Result<i64> {
    s.trim()
        .parse::<i64>()
        .with_context(|| format!("Invalid id '{}'", s))
}

/// Read a TEXT column holding a decimal.
pub fn decimal_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Decimal> {
    let s: String = row.get(idx)?;
    s.parse::<Decimal>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

pub fn fmt_money(d: &Decimal, ccy: &str) -> String {
    format!("{} {}", ccy, d.round_dp(2))
}

pub fn fmt_percent(d: &Decimal) -> String {
    format!("{}%", d.round_dp(1))
}

pub fn pretty_table(headers: &[&str], rows: Vec<Vec<String>>) -> Table {
    let mut t = Table::new();
    t.load_preset(UTF8_FULL);
    t.set_header(headers.iter().map(|h| Cell::new(*h)));
    for r in rows {
        t.add_row(r.into_iter().map(Cell::new));
    }
    t
}

pub fn maybe_print_json<T: serde::Serialize>(json_flag: bool, v: &T) -> Result<bool> {
    if json_flag {
        println!("{}", serde_json::to_string_pretty(v)?);
        return Ok(true);
    }
    Ok(false)
}

/// Accept either a numeric account id or an account name.
pub fn resolve_account(conn: &Connection, key: &str) -> Result<i64> {
    let key = key.trim();
    if let Ok(id) = key.parse::<i64>() {
        return Ok(id);
    }
    let id: Option<i64> = conn
        .query_row("SELECT id FROM accounts WHERE name=?1", params![key], |r| {
            r.get(0)
        })
        .optional()?;
    id.with_context(|| format!("Account '{}' not found", key))
}

/// Accept either a numeric category id or a category name.
pub fn resolve_category(conn: &Connection, key: &str) -> Result<i64> {
    let key = key.trim();
    if let Ok(id) = key.parse::<i64>() {
        return Ok(id);
    }
    let id: Option<i64> = conn
        .query_row(
            "SELECT id FROM categories WHERE name=?1",
            params![key],
            |r| r.get(0),
        )
        .optional()?;
    id.with_context(|| format!("Category '{}' not found", key))
}

/// `a + b`, or [`Error::Overflow`] naming the quantity being computed.
pub fn add_checked(
    a: Decimal,
    b: Decimal,
    what: &'static str,
) -> crate::errors::Result<Decimal> {
    a.checked_add(b).ok_or(Error::Overflow(what))
}

/// `a - b`, or [`Error::Overflow`].
pub fn sub_checked(
    a: Decimal,
    b: Decimal,
    what: &'static str,
) -> crate::errors::Result<Decimal> {
    a.checked_sub(b).ok_or(Error::Overflow(what))
}

pub fn sum_checked<I>(items: I, what: &'static str) -> crate::errors::Result<Decimal>
where
    I: IntoIterator<Item = Decimal>,
{
    items
        .into_iter()
        .try_fold(Decimal::ZERO, |acc, d| add_checked(acc, d, what))
}

/// `part / whole * 100`, or zero when `whole` is not positive. Never clamped.
pub fn percentage(part: Decimal, whole: Decimal) -> crate::errors::Result<Decimal> {
    if whole <= Decimal::ZERO {
        return Ok(Decimal::ZERO);
    }
    part.checked_div(whole)
        .and_then(|q| q.checked_mul(Decimal::ONE_HUNDRED))
        .ok_or(Error::Overflow("percentage"))
}

pub fn days_in_month(year: i32, month: u32) -> Option<u32> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    u32::try_from(next.signed_duration_since(first).num_days()).ok()
}

/// Week bucket for a date: `(day - 1) / 7`, capped at the last bucket.
pub fn week_bucket(date: NaiveDate) -> usize {
    ((date.day() as usize - 1) / 7).min(WEEK_BUCKETS - 1)
}

/// Display name for a period, e.g. `Maret 2026`.
pub fn month_label(year: i32, month: u32) -> String {
    let idx = month.clamp(1, 12) as usize - 1;
    format!("{} {}", MONTH_NAMES[idx], year)
}
