use cardtx::application::engine::CardEngine;
use cardtx::application::recorder::ErrorRecorder;
use cardtx::application::report::ReportGenerator;
use cardtx::domain::card::Amount;
use cardtx::domain::ports::{ErrorStoreBox, NotifierBox, UserStore, UserStoreBox};
use cardtx::domain::user::User;
use cardtx::infrastructure::fs_sink::FsReportSink;
use cardtx::infrastructure::in_memory::{
    InMemoryCardStore, InMemoryErrorStore, InMemoryTransactionStore, InMemoryUserStore,
};
use cardtx::infrastructure::notify::{DiscardNotifier, JsonlNotifier};
use cardtx::infrastructure::score::ThreadRngScore;
use cardtx::interfaces::queue;
use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};
use rust_decimal::Decimal;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long, env = "CARDTX_DB_PATH")]
    db_path: Option<PathBuf>,

    /// Directory backing the report object store.
    #[arg(long, env = "CARDTX_REPORTS_DIR", default_value = "reports")]
    reports_dir: PathBuf,

    /// Bucket name reports are uploaded under.
    #[arg(long, env = "CARDTX_REPORTS_BUCKET", default_value = "card-reports")]
    reports_bucket: String,

    /// Append notification events to this JSONL file instead of discarding them.
    #[arg(long, env = "CARDTX_EVENTS_LOG")]
    events_log: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Seed a user record (users are owned by an external identity system).
    AddUser {
        #[arg(long)]
        user_id: Option<Uuid>,
        #[arg(long)]
        document: String,
        #[arg(long)]
        email: String,
    },
    /// Create a card for a user (DEBIT unless --card-type says otherwise).
    CreateCard {
        #[arg(long)]
        user_id: Uuid,
        #[arg(long)]
        card_type: Option<String>,
    },
    /// Activate a user's card once it has enough purchases.
    Activate {
        #[arg(long)]
        user_id: Uuid,
    },
    /// Record a purchase against a card.
    Purchase {
        #[arg(long)]
        card_id: Uuid,
        #[arg(long)]
        merchant: String,
        #[arg(long)]
        amount: Decimal,
    },
    /// Deposit funds onto a debit card.
    Save {
        #[arg(long)]
        card_id: Uuid,
        #[arg(long)]
        merchant: String,
        #[arg(long)]
        amount: Decimal,
    },
    /// Pay down a credit card balance.
    Pay {
        #[arg(long)]
        card_id: Uuid,
        #[arg(long)]
        merchant: String,
        #[arg(long)]
        amount: Decimal,
    },
    /// Generate an activity report over an inclusive ISO-8601 date range.
    Report {
        #[arg(long)]
        card_id: Uuid,
        #[arg(long)]
        start: String,
        #[arg(long)]
        end: String,
    },
    /// Process a file of newline-delimited {"userId", "request"} envelopes,
    /// dead-lettering failures.
    ProcessQueue { input: PathBuf },
}

struct Services {
    engine: CardEngine,
    reports: ReportGenerator,
    users: UserStoreBox,
    errors: ErrorStoreBox,
}

fn notifier(cli: &Cli) -> NotifierBox {
    match &cli.events_log {
        Some(path) => Box::new(JsonlNotifier::new(path)),
        None => Box::new(DiscardNotifier),
    }
}

fn in_memory_services(cli: &Cli) -> Services {
    let cards = InMemoryCardStore::new();
    let transactions = InMemoryTransactionStore::new();
    let users = InMemoryUserStore::new();
    let errors = InMemoryErrorStore::new();
    let sink = FsReportSink::new(&cli.reports_dir);

    let engine = CardEngine::new(
        Box::new(cards.clone()),
        Box::new(transactions.clone()),
        Box::new(users.clone()),
        notifier(cli),
        Box::new(ThreadRngScore),
        ErrorRecorder::new(Box::new(errors.clone())),
    );
    let reports = ReportGenerator::new(
        Box::new(cards),
        Box::new(transactions),
        Box::new(users.clone()),
        Box::new(sink),
        notifier(cli),
        ErrorRecorder::new(Box::new(errors.clone())),
        cli.reports_bucket.clone(),
    );

    Services {
        engine,
        reports,
        users: Box::new(users),
        errors: Box::new(errors),
    }
}

#[cfg(feature = "storage-rocksdb")]
fn rocksdb_services(cli: &Cli, path: &std::path::Path) -> Result<Services> {
    use cardtx::infrastructure::rocksdb::RocksDBStore;

    let store = RocksDBStore::open(path).into_diagnostic()?;
    let sink = FsReportSink::new(&cli.reports_dir);

    let engine = CardEngine::new(
        Box::new(store.clone()),
        Box::new(store.clone()),
        Box::new(store.clone()),
        notifier(cli),
        Box::new(ThreadRngScore),
        ErrorRecorder::new(Box::new(store.clone())),
    );
    let reports = ReportGenerator::new(
        Box::new(store.clone()),
        Box::new(store.clone()),
        Box::new(store.clone()),
        Box::new(sink),
        notifier(cli),
        ErrorRecorder::new(Box::new(store.clone())),
        cli.reports_bucket.clone(),
    );

    Ok(Services {
        engine,
        reports,
        users: Box::new(store.clone()),
        errors: Box::new(store),
    })
}

#[cfg(feature = "storage-rocksdb")]
fn build_services(cli: &Cli) -> Result<Services> {
    match &cli.db_path {
        Some(path) => rocksdb_services(cli, path),
        None => Ok(in_memory_services(cli)),
    }
}

#[cfg(not(feature = "storage-rocksdb"))]
fn build_services(cli: &Cli) -> Result<Services> {
    if cli.db_path.is_some() {
        eprintln!(
            "WARNING: Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to In-Memory storage."
        );
    }
    Ok(in_memory_services(cli))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let services = build_services(&cli)?;

    run(cli.command, services).await
}

async fn run(command: Command, services: Services) -> Result<()> {
    match command {
        Command::AddUser {
            user_id,
            document,
            email,
        } => {
            let user = User {
                uuid: user_id.unwrap_or_else(Uuid::new_v4),
                document,
                email,
            };
            services.users.put(user.clone()).await.into_diagnostic()?;
            print_json(&user)
        }
        Command::CreateCard { user_id, card_type } => {
            let card = services
                .engine
                .create_card(user_id, card_type.as_deref())
                .await
                .into_diagnostic()?;
            print_json(&card)
        }
        Command::Activate { user_id } => {
            let card = services
                .engine
                .activate_card(user_id)
                .await
                .into_diagnostic()?;
            print_json(&card)
        }
        Command::Purchase {
            card_id,
            merchant,
            amount,
        } => {
            let amount = Amount::new(amount).into_diagnostic()?;
            let tx = services
                .engine
                .purchase(card_id, &merchant, amount)
                .await
                .into_diagnostic()?;
            print_json(&tx)
        }
        Command::Save {
            card_id,
            merchant,
            amount,
        } => {
            let amount = Amount::new(amount).into_diagnostic()?;
            let tx = services
                .engine
                .save(card_id, &merchant, amount)
                .await
                .into_diagnostic()?;
            print_json(&tx)
        }
        Command::Pay {
            card_id,
            merchant,
            amount,
        } => {
            let amount = Amount::new(amount).into_diagnostic()?;
            let tx = services
                .engine
                .pay_credit(card_id, &merchant, amount)
                .await
                .into_diagnostic()?;
            print_json(&tx)
        }
        Command::Report {
            card_id,
            start,
            end,
        } => {
            let location = services
                .reports
                .generate(card_id, &start, &end)
                .await
                .into_diagnostic()?;
            print_json(&serde_json::json!({
                "bucket": location.bucket,
                "key": location.key,
            }))
        }
        Command::ProcessQueue { input } => {
            let file = File::open(&input).into_diagnostic()?;
            let outcome = queue::drain(
                &services.engine,
                services.errors.as_ref(),
                BufReader::new(file),
            )
            .await
            .into_diagnostic()?;
            println!(
                "processed {} message(s), dead-lettered {}",
                outcome.processed, outcome.dead_lettered
            );
            Ok(())
        }
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(value).into_diagnostic()?
    );
    Ok(())
}
