// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use std::path::PathBuf;

pub const DB_ENV: &str = "MONTHBOOK_DB";

/// Runtime settings resolved from the command line and environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub verbosity: u8,
}

impl AppConfig {
    /// `--db` wins over `MONTHBOOK_DB`, which wins over the platform data dir.
    pub fn from_matches(m: &clap::ArgMatches) -> Result<Self> {
        let env_path = std::env::var_os(DB_ENV)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);
        Self::resolve(
            m.get_one::<String>("db").map(PathBuf::from),
            env_path,
            m.get_count("verbose"),
        )
    }

    pub fn resolve(
        flag_path: Option<PathBuf>,
        env_path: Option<PathBuf>,
        verbosity: u8,
    ) -> Result<Self> {
        let db_path = match flag_path.or(env_path) {
            Some(p) => p,
            None => crate::db::default_db_path()?,
        };
        Ok(Self { db_path, verbosity })
    }
}
