//! fin4-client: command-line access to a Fin4 deployment
//!
//! Every command registers the Fin4 contracts from the configured `Fin4Main`
//! address first. State updates are printed to stdout as JSON lines, one per
//! update; logs go to stderr (`RUST_LOG`, default `info`).
//!
//! ## Example Usage
//!
//! ```bash
//! export FIN4_MAIN_ADDRESS=0x...
//! export FIN4_DEFAULT_ACCOUNT=0x...
//!
//! # Register the satellite and curation contracts
//! fin4-client bootstrap
//!
//! # Fetch one collection
//! fin4-client fetch tokens
//!
//! # Dry-run then submit a transaction
//! fin4-client call Fin4Claiming submitClaim 0xTOKEN 1 "planted a tree" --label "Claim TREE"
//!
//! # Export claim history
//! fin4-client export-collection GRN
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use alloy_primitives::{Address, U256};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use fin4_client::ClientConfig;
use fin4_core::{
    bootstrap::bootstrap, CallArg, SubmitOutcome, SubmitRequest, TransactionOrchestrator,
};
use fin4_state_fetcher::{CsvExporter, StateFetcher};
use fin4_transport::PendingStatus;
use fin4_types::{ChannelDispatcher, StateUpdate};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "fin4-client",
    author,
    version,
    about = "Fin4 transaction orchestration and state fetching",
    long_about = "Registers the Fin4 contracts, fetches application state as JSON state \
                  updates, submits dry-run-checked transactions and exports claim history."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// JSON-RPC endpoint (default: FIN4_RPC_ENDPOINT or a local node)
    #[arg(long, global = true)]
    rpc_url: Option<String>,

    /// Directory of compiled-contract artifacts (default: FIN4_ARTIFACTS_DIR)
    #[arg(long, global = true)]
    artifacts_dir: Option<PathBuf>,

    /// Address of the Fin4Main contract (default: FIN4_MAIN_ADDRESS)
    #[arg(long = "main", global = true)]
    main_address: Option<Address>,

    /// Sender for reads and submissions (default: FIN4_DEFAULT_ACCOUNT)
    #[arg(long, global = true)]
    account: Option<Address>,

    /// Directory exports are written to (default: FIN4_EXPORT_DIR)
    #[arg(long, global = true)]
    export_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Register the satellite and token curation contracts
    Bootstrap,

    /// Fetch one collection and print its state updates
    Fetch {
        #[arg(value_enum)]
        collection: Collection,
    },

    /// Dry-run a contract method, then submit it
    Call {
        /// Registered contract name, e.g. Fin4Claiming
        contract: String,
        method: String,
        /// Arguments, parsed against the method's parameter types
        args: Vec<String>,
        /// Display label for the pending transaction
        #[arg(long)]
        label: Option<String>,
        /// Submit without a dry run
        #[arg(long)]
        skip_dry_run: bool,
    },

    /// Show which voting period a curation poll is in
    PollStatus { poll_id: U256 },

    /// Export every claim on one token as CSV
    ExportToken { symbol: String },

    /// Export every claim on every token of a collection as CSV
    ExportCollection { identifier: String },
}

#[derive(Clone, Copy, ValueEnum)]
enum Collection {
    Tokens,
    Claims,
    Collections,
    Underlyings,
    VerifierTypes,
    Submissions,
    Messages,
    Balances,
    Parameters,
    Opats,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn resolve_config(cli: &Cli) -> ClientConfig {
    let mut config = ClientConfig::from_env();
    if let Some(url) = &cli.rpc_url {
        config = config.with_rpc_endpoint(url.clone());
    }
    if let Some(dir) = &cli.artifacts_dir {
        config = config.with_artifacts_dir(dir.clone());
    }
    if let Some(main) = cli.main_address {
        config = config.with_main_address(main);
    }
    if let Some(account) = cli.account {
        config = config.with_default_account(account);
    }
    if let Some(dir) = &cli.export_dir {
        config = config.with_export_dir(dir.clone());
    }
    config
}

/// Print every state update as one JSON line until all senders are gone.
async fn print_updates(mut rx: UnboundedReceiver<StateUpdate>) -> Result<()> {
    while let Some(update) = rx.recv().await {
        println!("{}", serde_json::to_string(&update)?);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = resolve_config(&cli);

    let (dispatcher, rx) = ChannelDispatcher::new();
    let printer = tokio::spawn(print_updates(rx));

    // The session owns the only sender; dropping it ends the printer.
    let result = run(cli.command, &config, Arc::new(dispatcher)).await;
    printer.await.context("update printer panicked")??;
    result
}

async fn run(command: Commands, config: &ClientConfig, dispatcher: Arc<ChannelDispatcher>) -> Result<()> {
    let ledger = Arc::new(config.ledger());
    let stack = ledger.stack();
    let session = config.session(ledger, dispatcher)?;
    let main_address = config.main_address()?;
    bootstrap(&session, main_address)
        .await
        .context("Failed to register Fin4 contracts")?;
    info!(contracts = session.registry().len(), "contracts registered");

    let fetcher = StateFetcher::new(&session, config.underlyings_active);
    match command {
        Commands::Bootstrap => {
            for name in session.registry().names() {
                eprintln!("{name}");
            }
        }
        Commands::Fetch { collection } => fetch(&fetcher, collection).await?,
        Commands::Call {
            contract,
            method,
            args,
            label,
            skip_dry_run,
        } => {
            config.default_account()?;
            let params: Vec<CallArg> = args.into_iter().map(CallArg::from).collect();
            let mut request = SubmitRequest::new(contract, method)
                .params(params)
                .skip_simulation(skip_dry_run);
            if let Some(label) = label {
                request = request.display(label);
            }
            let report = TransactionOrchestrator::new(&session).submit(request).await?;
            eprintln!("{}", serde_json::to_string_pretty(&report)?);

            // Submission is fire-and-forget; stay alive until the node answers.
            if let SubmitOutcome::Submitted { stack_id } = report.outcome {
                match stack.settled(stack_id).await {
                    Some(PendingStatus::Sent { tx_hash }) => {
                        eprintln!("Transaction {} sent: {tx_hash}", stack_id.0)
                    }
                    Some(PendingStatus::Rejected { reason }) => {
                        anyhow::bail!("node rejected transaction {}: {reason}", stack_id.0)
                    }
                    Some(PendingStatus::Queued) | None => {}
                }
            }
        }
        Commands::PollStatus { poll_id } => {
            let status = fetcher.poll_status(poll_id).await?;
            eprintln!("{}", serde_json::to_string_pretty(&status)?);
        }
        Commands::ExportToken { symbol } => {
            fetcher.fetch_tokens().await?;
            let path = fetcher
                .export_token(&symbol, &CsvExporter::new(&config.export_dir))
                .await?;
            eprintln!("Exported {}", path.display());
        }
        Commands::ExportCollection { identifier } => {
            fetcher.fetch_tokens().await?;
            match fetcher
                .export_collection(&identifier, &CsvExporter::new(&config.export_dir))
                .await?
            {
                Some(path) => eprintln!("Exported {}", path.display()),
                None => eprintln!("No tokens in collection {identifier}"),
            }
        }
    }
    Ok(())
}

async fn fetch(fetcher: &StateFetcher<'_>, collection: Collection) -> Result<()> {
    match collection {
        Collection::Tokens => {
            fetcher.fetch_tokens().await?;
        }
        Collection::Claims => {
            fetcher.fetch_claims().await?;
        }
        Collection::Collections => {
            fetcher.fetch_collections().await?;
        }
        Collection::Underlyings => {
            fetcher.fetch_underlyings().await?;
        }
        Collection::VerifierTypes => {
            fetcher.fetch_verifier_types().await?;
        }
        Collection::Submissions => {
            fetcher.fetch_submissions().await?;
        }
        Collection::Messages => {
            fetcher.fetch_messages().await?;
        }
        Collection::Balances => {
            fetcher.fetch_balances().await?;
            fetcher.fetch_governance_balances().await?;
        }
        Collection::Parameters => {
            fetcher.fetch_system_parameters().await?;
            fetcher.fetch_parameterizer_params().await?;
        }
        Collection::Opats => {
            fetcher.fetch_opats().await?;
        }
    }
    Ok(())
}
