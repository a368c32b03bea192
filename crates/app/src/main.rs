use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tally::{
    partition_by_flow, AppConfig, CategoryTotal, CorrectionOutcome, Flow, Session, Transaction,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tally", version, about = "Categorize bank statements with learned keyword rules")]
struct Cli {
    /// Config file (defaults to the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Rules file, overriding the config
    #[arg(long, global = true)]
    rules: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List categories in match order
    Categories,
    /// Add an empty category
    AddCategory { name: String },
    /// Add a keyword to a category
    AddKeyword { category: String, keyword: String },
    /// Print a statement with categories assigned
    Classify {
        file: PathBuf,
        #[arg(long, value_enum)]
        flow: Option<FlowArg>,
    },
    /// Print category totals for a statement
    Summary {
        file: PathBuf,
        #[arg(long, value_enum)]
        flow: Option<FlowArg>,
    },
    /// Re-categorize one row (1-based, as listed by `classify`) and learn from it
    Correct {
        file: PathBuf,
        row: usize,
        category: String,
        #[arg(long, value_enum)]
        flow: Option<FlowArg>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum FlowArg {
    Debit,
    Credit,
}

impl From<FlowArg> for Flow {
    fn from(arg: FlowArg) -> Self {
        match arg {
            FlowArg::Debit => Flow::Debit,
            FlowArg::Credit => Flow::Credit,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref()).context("Failed to load config")?;
    if let Some(rules) = cli.rules {
        config.rules_path = rules;
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let mut session = Session::open(&config)
        .with_context(|| format!("Failed to open rules at {}", config.rules_path.display()))?;

    match cli.command {
        Command::Categories => {
            for name in session.list_categories() {
                let count = session.rules().keywords(&name).map_or(0, <[String]>::len);
                println!("{name} ({count} keywords)");
            }
        }
        Command::AddCategory { name } => match session.add_category(&name) {
            Ok(()) => println!("Added category '{}'", name.trim()),
            Err(e) if e.is_warning() => eprintln!("warning: {e}"),
            Err(e) => return Err(e.into()),
        },
        Command::AddKeyword { category, keyword } => {
            match session.add_keyword(&category, &keyword) {
                Ok(()) => println!("Added '{}' to '{category}'", keyword.trim()),
                Err(e) if e.is_warning() => eprintln!("warning: {e}"),
                Err(e) => return Err(e.into()),
            }
        }
        Command::Classify { file, flow } => {
            let txs = select_flow(load_classified(&session, &file)?, flow.map(Flow::from));
            print_transactions(&txs, &config.currency);
        }
        Command::Summary { file, flow } => {
            let txs = load_classified(&session, &file)?;
            let summary = match flow {
                Some(flow) => session.summarize_flow(&txs, flow.into()),
                None => session.summarize(&txs),
            }
            .context("Failed to summarize statement")?;
            print_summary(&summary, &config.currency);
        }
        Command::Correct {
            file,
            row,
            category,
            flow,
        } => {
            let txs = select_flow(load_classified(&session, &file)?, flow.map(Flow::from));
            let Some(tx) = row.checked_sub(1).and_then(|idx| txs.get(idx)) else {
                bail!("Row {row} is out of range (statement has {} rows)", txs.len());
            };
            let outcome = session
                .correct_category(tx, &category)
                .with_context(|| format!("Could not move row {row} to '{category}'"))?;
            match outcome {
                CorrectionOutcome::Unchanged => println!("Row {row} is already '{category}'"),
                CorrectionOutcome::RuleAdded => {
                    println!("'{}' will now be categorized as '{category}'", tx.description)
                }
                CorrectionOutcome::AlreadyKnown => {
                    println!("'{category}' already matches '{}'", tx.description)
                }
                CorrectionOutcome::NotRecorded => {
                    println!("Row {row} moved to '{category}'; no rule recorded")
                }
            }
        }
    }

    Ok(())
}

fn load_classified(session: &Session, file: &Path) -> anyhow::Result<Vec<Transaction>> {
    let bytes =
        std::fs::read(file).with_context(|| format!("Failed to read {}", file.display()))?;
    let txs = session
        .load_statement(&bytes)
        .with_context(|| format!("Error loading {}", file.display()))?;
    Ok(session.classify(&txs))
}

/// The debit or credit view of a statement. Row numbers printed by
/// `classify --flow X` refer to this view, as does `correct --flow X`.
fn select_flow(txs: Vec<Transaction>, flow: Option<Flow>) -> Vec<Transaction> {
    match flow {
        None => txs,
        Some(flow) => {
            let (debits, credits) = partition_by_flow(&txs);
            match flow {
                Flow::Debit => debits,
                Flow::Credit => credits,
            }
        }
    }
}

fn print_transactions(txs: &[Transaction], currency: &str) {
    for (idx, tx) in txs.iter().enumerate() {
        println!(
            "{:>4}  {}  {:<32}  {:>12} {currency}  {:<6}  {}",
            idx + 1,
            tx.date.format("%d/%m/%Y"),
            tx.description,
            tx.amount.to_string(),
            tx.flow.to_string(),
            tx.category
        );
    }
}

fn print_summary(summary: &[CategoryTotal], currency: &str) {
    for entry in summary {
        println!(
            "{:<24}  {:>12} {currency}",
            entry.category,
            entry.total.to_string()
        );
    }
}
