// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{Arg, ArgAction, Command, value_parser};

fn req(name: &'static str) -> Arg {
    Arg::new(name).long(name).required(true)
}

fn opt(name: &'static str) -> Arg {
    Arg::new(name).long(name)
}

fn json() -> Arg {
    Arg::new("json")
        .long("json")
        .action(ArgAction::SetTrue)
        .help("Print JSON instead of a table")
}

fn id() -> Arg {
    req("id").help("Row id")
}

pub fn build_cli() -> Command {
    Command::new("monthbook")
        .about("Monthly budgeting ledger: accounts, months, transactions, budgets and analytics")
        .version(clap::crate_version!())
        .arg(
            Arg::new("db")
                .long("db")
                .global(true)
                .help("SQLite file to use (overrides MONTHBOOK_DB)"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .global(true)
                .action(ArgAction::Count)
                .help("Increase log verbosity (-v info, -vv debug)"),
        )
        .subcommand(
            Command::new("init").about("Initialize the database").arg(
                Arg::new("seed")
                    .long("seed")
                    .action(ArgAction::SetTrue)
                    .help("Insert default categories, a cash account and the current month"),
            ),
        )
        .subcommand(account_cmd())
        .subcommand(
            Command::new("category")
                .about("Manage categories")
                .subcommand(
                    Command::new("add")
                        .arg(req("name"))
                        .arg(opt("type").value_parser(["income", "expense"]))
                        .arg(opt("emoji"))
                        .arg(json()),
                )
                .subcommand(Command::new("list").arg(json())),
        )
        .subcommand(month_cmd())
        .subcommand(tx_cmd())
        .subcommand(
            Command::new("budget")
                .about("Per-category monthly limits")
                .subcommand(
                    Command::new("set")
                        .arg(req("month"))
                        .arg(req("category").help("Category id or name"))
                        .arg(req("limit"))
                        .arg(json()),
                )
                .subcommand(Command::new("report").arg(req("month")).arg(json())),
        )
        .subcommand(
            Command::new("dashboard")
                .about("Month summary with recent transactions and category usage")
                .arg(req("month"))
                .arg(json()),
        )
        .subcommand(
            Command::new("analytics")
                .about("Spending analytics; defaults to the latest month")
                .arg(opt("month"))
                .arg(json()),
        )
        .subcommand(debt_cmd())
        .subcommand(savings_cmd())
        .subcommand(
            Command::new("settings")
                .about("Key/value preferences")
                .subcommand(Command::new("get").arg(opt("key")).arg(json()))
                .subcommand(
                    Command::new("set")
                        .arg(
                            Arg::new("pair")
                                .num_args(0..)
                                .action(ArgAction::Append)
                                .help("KEY=VALUE"),
                        )
                        .arg(opt("from-json").help("JSON object of settings")),
                ),
        )
        .subcommand(
            Command::new("export").about("Export data").subcommand(
                Command::new("transactions")
                    .arg(req("format").help("csv|json"))
                    .arg(req("out"))
                    .arg(opt("month")),
            ),
        )
        .subcommand(
            Command::new("doctor")
                .about("Check ledger consistency")
                .arg(json()),
        )
        .subcommand(Command::new("health").about("Check that storage is reachable"))
}

fn account_cmd() -> Command {
    Command::new("account")
        .about("Manage accounts and transfers")
        .subcommand(
            Command::new("add")
                .arg(req("name"))
                .arg(req("type").value_parser(["Cash", "Bank", "E-Wallet"]))
                .arg(opt("balance").help("Opening balance"))
                .arg(opt("icon"))
                .arg(opt("color"))
                .arg(json()),
        )
        .subcommand(Command::new("list").arg(json()))
        .subcommand(Command::new("show").arg(req("id").help("Account id or name")).arg(json()))
        .subcommand(
            Command::new("edit")
                .arg(req("id").help("Account id or name"))
                .arg(opt("name"))
                .arg(opt("type").value_parser(["Cash", "Bank", "E-Wallet"]))
                .arg(opt("icon"))
                .arg(opt("color"))
                .arg(json()),
        )
        .subcommand(Command::new("rm").arg(req("id").help("Account id or name")))
        .subcommand(
            Command::new("transfer")
                .about("Move money between two accounts")
                .arg(req("from"))
                .arg(req("to"))
                .arg(req("amount"))
                .arg(json()),
        )
}

fn month_cmd() -> Command {
    Command::new("month")
        .about("Monthly periods")
        .subcommand(
            Command::new("add")
                .arg(req("year"))
                .arg(req("month").help("1-12"))
                .arg(opt("name"))
                .arg(opt("start-balance"))
                .arg(opt("budget-limit"))
                .arg(json()),
        )
        .subcommand(Command::new("list").arg(json()))
        .subcommand(Command::new("show").arg(id()).arg(json()))
        .subcommand(
            Command::new("edit")
                .arg(id())
                .arg(opt("name"))
                .arg(opt("start-balance"))
                .arg(opt("budget-limit"))
                .arg(json()),
        )
        .subcommand(Command::new("close").arg(id()))
        .subcommand(Command::new("rm").arg(id()))
}

fn tx_cmd() -> Command {
    Command::new("tx")
        .about("Income and expense transactions")
        .subcommand(
            Command::new("add")
                .arg(req("name"))
                .arg(req("amount"))
                .arg(req("type").value_parser(["income", "expense"]))
                .arg(req("date").help("YYYY-MM-DD"))
                .arg(req("month"))
                .arg(req("account").help("Account id or name"))
                .arg(req("category").help("Category id or name"))
                .arg(opt("note"))
                .arg(json()),
        )
        .subcommand(
            Command::new("edit")
                .arg(id())
                .arg(opt("name"))
                .arg(opt("amount"))
                .arg(opt("type").value_parser(["income", "expense"]))
                .arg(opt("date"))
                .arg(opt("account"))
                .arg(opt("category"))
                .arg(opt("note"))
                .arg(json()),
        )
        .subcommand(Command::new("rm").arg(id()))
        .subcommand(Command::new("show").arg(id()).arg(json()))
        .subcommand(
            Command::new("list")
                .arg(opt("month"))
                .arg(opt("type").value_parser(["all", "income", "expense"]))
                .arg(opt("limit").value_parser(value_parser!(usize)))
                .arg(json()),
        )
}

fn debt_cmd() -> Command {
    Command::new("debt")
        .about("Track debts and repayments")
        .subcommand(
            Command::new("add")
                .arg(req("name"))
                .arg(req("lender"))
                .arg(req("total"))
                .arg(opt("paid"))
                .arg(opt("monthly"))
                .arg(opt("icon"))
                .arg(opt("color"))
                .arg(json()),
        )
        .subcommand(Command::new("list").arg(json()))
        .subcommand(Command::new("pay").arg(id()).arg(req("amount")).arg(json()))
        .subcommand(
            Command::new("edit")
                .arg(id())
                .arg(opt("name"))
                .arg(opt("lender"))
                .arg(opt("total"))
                .arg(opt("paid"))
                .arg(opt("monthly"))
                .arg(json()),
        )
        .subcommand(Command::new("rm").arg(id()))
}

fn savings_cmd() -> Command {
    Command::new("savings")
        .about("Savings goals")
        .subcommand(
            Command::new("add")
                .arg(req("name"))
                .arg(req("target"))
                .arg(req("deadline").help("YYYY-MM-DD"))
                .arg(opt("saved"))
                .arg(opt("monthly"))
                .arg(opt("icon"))
                .arg(opt("color"))
                .arg(json()),
        )
        .subcommand(Command::new("list").arg(json()))
        .subcommand(Command::new("deposit").arg(id()).arg(req("amount")).arg(json()))
        .subcommand(
            Command::new("edit")
                .arg(id())
                .arg(opt("name"))
                .arg(opt("target"))
                .arg(opt("saved"))
                .arg(opt("monthly"))
                .arg(json()),
        )
        .subcommand(Command::new("rm").arg(id()))
}
