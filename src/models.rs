// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Income or expense. Tags both categories and transactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    Income,
    Expense,
}

impl EntryType {
    pub fn as_str(self) -> &'static str {
        match self {
            EntryType::Income => "income",
            EntryType::Expense => "expense",
        }
    }

    /// Balance effect of an amount of this type: income adds, expense subtracts.
    pub fn signed(self, amount: Decimal) -> Decimal {
        match self {
            EntryType::Income => amount,
            EntryType::Expense => -amount,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountKind {
    Cash,
    Bank,
    #[serde(rename = "E-Wallet")]
    EWallet,
}

impl AccountKind {
    pub fn as_str(self) -> &'static str {
        match self {
            AccountKind::Cash => "Cash",
            AccountKind::Bank => "Bank",
            AccountKind::EWallet => "E-Wallet",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MonthStatus {
    Active,
    Closed,
}

impl MonthStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            MonthStatus::Active => "active",
            MonthStatus::Closed => "closed",
        }
    }
}

impl FromStr for EntryType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "income" => Ok(EntryType::Income),
            "expense" => Ok(EntryType::Expense),
            other => Err(format!("unknown entry type '{}', expected income|expense", other)),
        }
    }
}

impl FromStr for AccountKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cash" => Ok(AccountKind::Cash),
            "bank" => Ok(AccountKind::Bank),
            "e-wallet" | "ewallet" => Ok(AccountKind::EWallet),
            other => Err(format!(
                "unknown account type '{}', expected Cash|Bank|E-Wallet",
                other
            )),
        }
    }
}

impl FromStr for MonthStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "active" => Ok(MonthStatus::Active),
            "closed" => Ok(MonthStatus::Closed),
            other => Err(format!("unknown month status '{}'", other)),
        }
    }
}

macro_rules! text_enum_sql {
    ($($ty:ty),*) => {
        $(
            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(self.as_str())
                }
            }

            impl ToSql for $ty {
                fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                    Ok(ToSqlOutput::from(self.as_str()))
                }
            }

            impl FromSql for $ty {
                fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                    value
                        .as_str()?
                        .parse()
                        .map_err(|e: String| FromSqlError::Other(e.into()))
                }
            }
        )*
    };
}

text_enum_sql!(EntryType, AccountKind, MonthStatus);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: AccountKind,
    pub balance: Decimal,
    /// Opening balance plus net transfers: the part of `balance` not explained by the ledger.
    pub base_balance: Decimal,
    pub icon: String,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub emoji: String,
    #[serde(rename = "type")]
    pub kind: EntryType,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Month {
    pub id: i64,
    pub name: String,
    pub year: i32,
    pub month: u32,
    pub start_balance: Decimal,
    pub budget_limit: Decimal,
    pub status: MonthStatus,
}

impl Month {
    pub fn is_open(&self) -> bool {
        self.status == MonthStatus::Active
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: i64,
    pub name: String,
    /// Always positive; the sign comes from `kind`.
    pub amount: Decimal,
    #[serde(rename = "type")]
    pub kind: EntryType,
    pub note: Option<String>,
    pub date: NaiveDate,
    pub month_id: i64,
    pub account_id: i64,
    pub category_id: i64,
}

impl Transaction {
    /// Delta this transaction has applied to its account's balance.
    pub fn balance_effect(&self) -> Decimal {
        self.kind.signed(self.amount)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Budget {
    pub id: i64,
    pub month_id: i64,
    pub category_id: i64,
    pub limit: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Debt {
    pub id: i64,
    pub name: String,
    pub lender: String,
    pub total_amount: Decimal,
    pub paid_amount: Decimal,
    pub monthly_pay: Decimal,
    pub icon: String,
    pub color: String,
}

impl Debt {
    pub fn remaining(&self) -> crate::errors::Result<Decimal> {
        crate::utils::sub_checked(self.total_amount, self.paid_amount, "remaining debt")
    }

    pub fn progress(&self) -> crate::errors::Result<Decimal> {
        crate::utils::percentage(self.paid_amount, self.total_amount)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavingsGoal {
    pub id: i64,
    pub name: String,
    pub target_amt: Decimal,
    pub saved_amt: Decimal,
    pub monthly_amt: Decimal,
    pub deadline: NaiveDate,
    pub icon: String,
    pub color: String,
}

impl SavingsGoal {
    pub fn progress(&self) -> crate::errors::Result<Decimal> {
        crate::utils::percentage(self.saved_amt, self.target_amt)
    }
}

// Request bodies. Optional fields left out of a patch keep their stored value.

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTransaction {
    pub name: String,
    pub amount: Decimal,
    #[serde(rename = "type")]
    pub kind: EntryType,
    pub date: NaiveDate,
    pub month_id: i64,
    pub account_id: i64,
    pub category_id: i64,
    #[serde(default)]
    pub note: Option<String>,
}

/// Distinguishes an absent field (`None`) from an explicit `null` (`Some(None)`).
fn present<'de, D, T>(d: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(d).map(Some)
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionPatch {
    pub name: Option<String>,
    pub amount: Option<Decimal>,
    #[serde(rename = "type")]
    pub kind: Option<EntryType>,
    pub date: Option<NaiveDate>,
    pub account_id: Option<i64>,
    pub category_id: Option<i64>,
    /// `None` keeps the note, `Some(None)` clears it.
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub note: Option<Option<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    pub from_account_id: i64,
    pub to_account_id: i64,
    pub amount: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAccount {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: AccountKind,
    #[serde(default)]
    pub balance: Decimal,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountPatch {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<AccountKind>,
    pub icon: Option<String>,
    pub color: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCategory {
    pub name: String,
    #[serde(default)]
    pub emoji: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: Option<EntryType>,
    #[serde(default)]
    pub active: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMonth {
    #[serde(default)]
    pub name: Option<String>,
    pub year: i32,
    pub month: u32,
    #[serde(default)]
    pub start_balance: Decimal,
    #[serde(default)]
    pub budget_limit: Decimal,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthPatch {
    pub name: Option<String>,
    pub start_balance: Option<Decimal>,
    pub budget_limit: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDebt {
    pub name: String,
    pub lender: String,
    pub total_amount: Decimal,
    #[serde(default)]
    pub paid_amount: Decimal,
    #[serde(default)]
    pub monthly_pay: Decimal,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebtPatch {
    pub name: Option<String>,
    pub lender: Option<String>,
    pub total_amount: Option<Decimal>,
    pub paid_amount: Option<Decimal>,
    pub monthly_pay: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSavingsGoal {
    pub name: String,
    pub target_amt: Decimal,
    #[serde(default)]
    pub saved_amt: Decimal,
    #[serde(default)]
    pub monthly_amt: Decimal,
    pub deadline: NaiveDate,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavingsPatch {
    pub name: Option<String>,
    pub target_amt: Option<Decimal>,
    pub saved_amt: Option<Decimal>,
    pub monthly_amt: Option<Decimal>,
}
