//! CLI binary for recording and browsing ledger entries.

use std::io::{self, Write as _};
use std::path::PathBuf;
use std::process::ExitCode;

use budget_ledger::config::TableConfig;
use budget_ledger::error::LedgerError;
use budget_ledger::ledger_table::{LedgerQuery, LedgerTable, SaveAction, SaveOutput};
use budget_ledger::models::{
    AccountId, Decimal, Ledger, LedgerPayload, NaiveDate, NaiveDateTime, SortKeyParts,
    TransactionType, format_timestamp, month_of, parse_timestamp,
};
use budget_ledger::storage::{FileTable, QueryOutput, Table};
use clap::{Args, Parser, Subcommand};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color};
use owo_colors::OwoColorize;

/// Budget ledger CLI: record, edit and list transactions per account.
#[derive(Debug, Parser)]
#[command(name = "budget-ledger", version, about)]
struct Cli {
    /// Override the storage directory (default: XDG data dir).
    #[arg(long, global = true, value_name = "DIR")]
    data_dir: Option<PathBuf>,
    /// Subcommand to execute.
    #[command(subcommand)]
    command: Command,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
enum Command {
    /// Record a new entry.
    Add(AddArgs),
    /// Change an existing entry, moving it if its key changes.
    Edit(EditArgs),
    /// List entries by category, month and transaction type.
    List(ListArgs),
}

/// Arguments for the `add` subcommand.
#[derive(Debug, Args)]
struct AddArgs {
    /// Account the entry belongs to.
    #[arg(long)]
    account: String,
    /// Budget category.
    #[arg(long)]
    category: String,
    /// Transaction type: spend, fund or inflow.
    #[arg(long = "type", value_parser = parse_transaction_type)]
    transaction_type: TransactionType,
    /// Decimal amount, e.g. `12.50`.
    #[arg(long)]
    amount: String,
    /// Free-text description.
    #[arg(long, default_value = "")]
    description: String,
    /// ISO-8601 date or date-time (default: now).
    #[arg(long)]
    date: Option<String>,
}

/// Arguments for the `edit` subcommand.
#[derive(Debug, Args)]
struct EditArgs {
    /// Account the entry belongs to.
    #[arg(long)]
    account: String,
    /// Current sort key of the entry.
    #[arg(long)]
    sk: String,
    /// New category.
    #[arg(long)]
    category: Option<String>,
    /// New transaction type.
    #[arg(long = "type", value_parser = parse_transaction_type)]
    transaction_type: Option<TransactionType>,
    /// New month (`YYYY-MM`). Defaults to the month of `--date` if given.
    #[arg(long, value_parser = parse_month)]
    month: Option<String>,
    /// New decimal amount.
    #[arg(long, value_parser = parse_amount)]
    amount: Option<Decimal>,
    /// New description.
    #[arg(long)]
    description: Option<String>,
    /// New ISO-8601 date or date-time.
    #[arg(long, value_parser = parse_date)]
    date: Option<NaiveDateTime>,
}

/// Arguments for the `list` subcommand.
#[derive(Debug, Args)]
struct ListArgs {
    /// Account to list.
    #[arg(long)]
    account: String,
    /// Restrict to a category.
    #[arg(long)]
    category: Option<String>,
    /// Restrict to a month (`YYYY-MM`); requires `--category`.
    #[arg(long, value_parser = parse_month)]
    month: Option<String>,
    /// Restrict to a transaction type.
    #[arg(long = "type", value_parser = parse_transaction_type)]
    transaction_type: Option<TransactionType>,
    /// Print entries as JSON payloads instead of a table.
    #[arg(long)]
    json: bool,
}

// ── Argument parsers ────────────────────────────────────────────────────

/// Parses a transaction type name, ignoring case.
fn parse_transaction_type(s: &str) -> Result<TransactionType, String> {
    s.to_uppercase().parse().map_err(|err| format!("{err}"))
}

/// Parses an exact decimal amount.
fn parse_amount(s: &str) -> Result<Decimal, String> {
    Decimal::from_str_exact(s.trim()).map_err(|err| format!("{err}"))
}

/// Parses an ISO-8601 date or date-time.
fn parse_date(s: &str) -> Result<NaiveDateTime, String> {
    parse_timestamp(s).ok_or_else(|| format!("invalid date: {s}"))
}

/// Validates a `YYYY-MM` month.
fn parse_month(s: &str) -> Result<String, String> {
    NaiveDate::parse_from_str(&format!("{s}-01"), "%Y-%m-%d")
        .map(|_| s.to_owned())
        .map_err(|err| format!("invalid month {s}: {err}"))
}

// ── Setup ───────────────────────────────────────────────────────────────

/// Runs the CLI, returning an appropriate exit code.
fn run() -> io::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let _dotenv = dotenvy::dotenv();

    let cli = Cli::parse();

    let config = match TableConfig::from_env() {
        Ok(config) => config,
        Err(err) => return report_error("invalid configuration", &err),
    };

    let table = match create_table(cli.data_dir, config.clone()) {
        Ok(table) => table,
        Err(err) => return report_error("failed to initialize storage", &err),
    };

    let ledger_table = match LedgerTable::builder().table(table).config(config).build() {
        Ok(ledger_table) => ledger_table,
        Err(err) => return report_error("failed to open ledger", &err),
    };

    dispatch(&ledger_table, cli.command)
}

/// Creates the file table, using `data_dir` if provided or the default
/// XDG data directory otherwise.
fn create_table(
    data_dir: Option<PathBuf>,
    config: TableConfig,
) -> budget_ledger::error::Result<FileTable> {
    let dir = match data_dir {
        Some(dir) => dir,
        None => FileTable::default_dir()?,
    };
    FileTable::new(dir, config)
}

/// Prints an error line and returns a failing exit code.
fn report_error(context: &str, err: &LedgerError) -> io::Result<ExitCode> {
    writeln!(
        io::stderr().lock(),
        "{} {context}: {err}",
        "error:".red().bold()
    )?;
    Ok(ExitCode::FAILURE)
}

/// Dispatches to the appropriate subcommand handler.
fn dispatch<T: Table>(ledger_table: &LedgerTable<T>, command: Command) -> io::Result<ExitCode> {
    match command {
        Command::Add(args) => cmd_add(ledger_table, args),
        Command::Edit(args) => cmd_edit(ledger_table, args),
        Command::List(args) => cmd_list(ledger_table, args),
    }
}

// ── Subcommands ─────────────────────────────────────────────────────────

/// Executes the `add` subcommand: decodes the arguments as a payload and
/// inserts the entry.
fn cmd_add<T: Table>(ledger_table: &LedgerTable<T>, args: AddArgs) -> io::Result<ExitCode> {
    let payload = LedgerPayload {
        category: args.category,
        transaction_type: args.transaction_type.name().to_owned(),
        date: args
            .date
            .unwrap_or_else(|| format_timestamp(&chrono::Local::now().naive_local())),
        amount: args.amount,
        description: args.description,
        sk: None,
    };
    let mut entry = match Ledger::from_payload(AccountId::new(args.account), payload) {
        Ok(entry) => entry,
        Err(err) => return report_error("invalid entry", &err),
    };
    match ledger_table.save(&mut entry) {
        Ok(output) => {
            print_saved(&entry, &output)?;
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => report_error("save failed", &err),
    }
}

/// Executes the `edit` subcommand: loads the entry by sort key, applies
/// the changes and saves it.
fn cmd_edit<T: Table>(ledger_table: &LedgerTable<T>, args: EditArgs) -> io::Result<ExitCode> {
    let account = AccountId::new(args.account);
    let mut entry = match load_entry(ledger_table, &account, &args.sk) {
        Ok(Some(entry)) => entry,
        Ok(None) => {
            writeln!(
                io::stderr().lock(),
                "{} no entry with sort key {}",
                "error:".red().bold(),
                args.sk.bold()
            )?;
            return Ok(ExitCode::FAILURE);
        }
        Err(err) => return report_error("failed to load entry", &err),
    };

    if let Some(category) = args.category {
        entry.set_category(category);
    }
    if let Some(transaction_type) = args.transaction_type {
        entry.set_transaction_type(transaction_type);
    }
    if let Some(amount) = args.amount {
        entry.set_amount(amount);
    }
    if let Some(description) = args.description {
        entry.set_description(description);
    }
    if let Some(date) = args.date {
        entry.set_date(date);
    }
    if let Some(month) = args.month.or_else(|| args.date.as_ref().map(month_of)) {
        entry.set_month(month);
    }

    match ledger_table.save(&mut entry) {
        Ok(output) => {
            print_saved(&entry, &output)?;
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => report_error("save failed", &err),
    }
}

/// Finds the entry stored under `sort_key` through the
/// category + month + type query its key encodes.
fn load_entry<T: Table>(
    ledger_table: &LedgerTable<T>,
    account: &AccountId,
    sort_key: &str,
) -> budget_ledger::error::Result<Option<Ledger>> {
    let parts = SortKeyParts::parse(sort_key)?;
    let found = ledger_table.by_category_month_transaction_type(
        account,
        &parts.category,
        &parts.month,
        parts.transaction_type,
    )?;
    Ok(found
        .items
        .into_iter()
        .find(|entry| entry.sort_key() == sort_key))
}

/// Executes the `list` subcommand: routes the filters to a query and
/// prints the matching entries.
fn cmd_list<T: Table>(ledger_table: &LedgerTable<T>, args: ListArgs) -> io::Result<ExitCode> {
    let query = match LedgerQuery::from_fields(args.category, args.month, args.transaction_type) {
        Ok(query) => query,
        Err(err) => return report_error("invalid filters", &err),
    };
    match ledger_table.query(&AccountId::new(args.account), &query) {
        Ok(output) if args.json => {
            print_entries_json(&output.items)?;
            Ok(ExitCode::SUCCESS)
        }
        Ok(output) => {
            print_entries_table(&output)?;
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => report_error("query failed", &err),
    }
}

// ── Output ──────────────────────────────────────────────────────────────

/// Prints the outcome of a save.
fn print_saved(entry: &Ledger, output: &SaveOutput) -> io::Result<()> {
    let mut out = io::stdout().lock();
    let verb = match output.action {
        SaveAction::Inserted => "Inserted",
        SaveAction::Updated => "Updated",
    };
    writeln!(out, "{} {}", verb.green().bold(), entry.sort_key())?;
    if let Some(replaced) = &output.replaced_sort_key {
        writeln!(out, "  {} {replaced}", "replaced:".cyan())?;
    }
    writeln!(
        out,
        "  {} {:.1} units on {}",
        "consumed:".dimmed(),
        output.write.consumed_capacity.capacity_units,
        output.write.consumed_capacity.table_name
    )?;
    Ok(())
}

/// Prints entries as a JSON array of payloads.
fn print_entries_json(entries: &[Ledger]) -> io::Result<()> {
    let payloads: Vec<LedgerPayload> = entries.iter().map(Ledger::to_payload).collect();
    let mut out = io::stdout().lock();
    serde_json::to_writer_pretty(&mut out, &payloads).map_err(io::Error::from)?;
    writeln!(out)?;
    Ok(())
}

/// Prints entries in a table, followed by the consumed capacity.
fn print_entries_table(output: &QueryOutput<Ledger>) -> io::Result<()> {
    let mut out = io::stdout().lock();
    if output.items.is_empty() {
        writeln!(out, "{}", "No entries found.".dimmed())?;
        return Ok(());
    }

    let mut table = comfy_table::Table::new();
    _ = table.load_preset(UTF8_FULL);
    _ = table.set_header(vec![
        Cell::new("Date").fg(Color::Cyan),
        Cell::new("Category").fg(Color::Cyan),
        Cell::new("Type").fg(Color::Cyan),
        Cell::new("Amount").fg(Color::Cyan),
        Cell::new("Description").fg(Color::Cyan),
        Cell::new("Sort key").fg(Color::Cyan),
    ]);

    for entry in &output.items {
        let amount_color = match entry.transaction_type() {
            TransactionType::Spend => Color::Red,
            TransactionType::Fund | TransactionType::Inflow => Color::Green,
        };
        _ = table.add_row(vec![
            Cell::new(entry.date().format("%Y-%m-%d %H:%M")),
            Cell::new(entry.category()),
            Cell::new(entry.transaction_type()),
            Cell::new(entry.amount()).fg(amount_color),
            Cell::new(entry.description()),
            Cell::new(entry.sort_key()).fg(Color::DarkGrey),
        ]);
    }

    writeln!(
        out,
        "{} {}",
        "Entries".green().bold(),
        format_args!("({})", output.count).dimmed()
    )?;
    writeln!(out)?;
    writeln!(out, "{table}")?;
    writeln!(
        out,
        "{} {:.1} units on {}",
        "consumed:".dimmed(),
        output.consumed_capacity.capacity_units,
        output.consumed_capacity.table_name
    )?;
    Ok(())
}

/// Entry point.
fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => {
            // stderr itself may be gone; nothing left to report to.
            let _ignored = writeln!(io::stderr(), "fatal I/O error: {err}");
            ExitCode::FAILURE
        }
    }
}
