// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod accounts;
pub mod analytics;
pub mod budgets;
pub mod categories;
pub mod dashboard;
pub mod debts;
pub mod doctor;
pub mod exporter;
pub mod months;
pub mod savings;
pub mod settings;
pub mod transactions;
