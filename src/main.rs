//! Pair Sniper CLI
//!
//! Command-line interface for running the new-pair trading agent.

use alloy::primitives::Address;
use clap::{Parser, Subcommand};
use pair_sniper::audit::AuditLog;
use pair_sniper::chain::{ChainReader, EventSource, RpcChain};
use pair_sniper::sentiment::AnthropicModel;
use pair_sniper::wallet::{LiveExecutor, SecureWallet};
use pair_sniper::{
    Agent, Config, Decision, Error, Execution, PositionStore, Result, RpcConfig, SentimentGate,
    TradingMode,
};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "pair-sniper")]
#[command(about = "Sentiment-gated Uniswap V2 new-pair trading agent")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the trading agent until Ctrl-C
    Run {
        /// Force monitoring mode - positions are simulated, nothing is signed
        #[arg(long)]
        dry_run: bool,
    },

    /// Ask the sentiment model about a token
    Score {
        /// Token name
        #[arg(long)]
        name: String,

        /// Token symbol
        #[arg(long)]
        symbol: String,
    },

    /// Read a pair's reserves and spot price
    Reserves {
        /// Uniswap V2 pair address
        #[arg(long)]
        pool: String,
    },

    /// Show current configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (ignore if not found)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    let registry = tracing_subscriber::registry().with(filter);
    if cli.json_logs {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }

    let mut config = if let Some(config_path) = cli.config {
        let content = std::fs::read_to_string(&config_path)
            .map_err(|e| Error::Config(format!("{}: {}", config_path.display(), e)))?;
        serde_json::from_str(&content).map_err(|e| Error::Config(e.to_string()))?
    } else {
        Config::default()
    };
    config.apply_env()?;

    match cli.command {
        Commands::Run { dry_run } => {
            run_agent(config, dry_run).await?;
        }
        Commands::Score { name, symbol } => {
            run_score(config, name, symbol).await?;
        }
        Commands::Reserves { pool } => {
            run_reserves(config, pool).await?;
        }
        Commands::Config => {
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
    }

    Ok(())
}

async fn run_agent(mut config: Config, dry_run: bool) -> Result<()> {
    if dry_run {
        config.mode = TradingMode::Monitoring;
    }
    config.validate()?;

    tracing::info!(
        network = config.network.name(),
        mode = ?config.mode,
        factory = %config.factory(),
        "Starting pair sniper"
    );

    let rpc = RpcConfig::from_env(config.network);
    let reader = RpcChain::connect(&rpc)?;
    let provider = reader.provider().clone();
    let chain: Arc<dyn ChainReader> = Arc::new(reader);

    let model = AnthropicModel::from_env(config.sentiment.clone())?;
    let gate = SentimentGate::new(Box::new(model));

    let execution = match config.mode {
        TradingMode::Monitoring => Execution::Monitoring,
        TradingMode::Live => {
            let wallet = SecureWallet::from_env()?;
            tracing::info!(address = %wallet.address(), "Loaded wallet from PRIVATE_KEY");
            let executor = LiveExecutor::connect(&rpc, &wallet, config.router())?;
            Execution::Live(Arc::new(executor))
        }
    };

    let store = match &config.state_file {
        Some(path) => PositionStore::load_or_default(path).await?,
        None => PositionStore::new(),
    };

    let mut agent = Agent::new(&config, chain, gate, execution).with_store(store);
    if let Some(path) = &config.audit_log_path {
        agent = agent.with_audit(AuditLog::new(path));
    }

    let (pairs_tx, pairs_rx) = mpsc::channel(config.event_buffer);
    let (blocks_tx, blocks_rx) = mpsc::channel(config.event_buffer);
    let tasks = EventSource::new(provider, config.factory())
        .spawn(pairs_tx, blocks_tx)
        .await?;

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Cannot listen for Ctrl-C, running until the streams end");
            std::future::pending::<()>().await;
        }
    };

    let result = agent.run(pairs_rx, blocks_rx, shutdown).await;
    tasks.abort();

    let swept = agent.shutdown().await;
    tracing::info!(
        swept,
        open_positions = agent.store().len(),
        "Pair sniper stopped"
    );

    result
}

async fn run_score(config: Config, name: String, symbol: String) -> Result<()> {
    let model = AnthropicModel::from_env(config.sentiment)?;
    let gate = SentimentGate::new(Box::new(model));

    match gate.decide(&name, &symbol).await? {
        Decision::Reject => println!("{} ({}): REJECT", name, symbol),
        Decision::Enter { confidence } => {
            println!("{} ({}): ENTER with confidence {}", name, symbol, confidence)
        }
    }
    Ok(())
}

async fn run_reserves(config: Config, pool: String) -> Result<()> {
    let pool = Address::from_str(&pool)
        .map_err(|e| Error::InvalidArgument(format!("pool: {}", e)))?;

    let rpc = RpcConfig::from_env(config.network);
    let chain = RpcChain::connect(&rpc)?;
    let reserves = chain.get_reserves(pool).await?;

    println!("Pool:            {}", pool);
    println!("Base reserve:    {}", reserves.base);
    println!("Counter reserve: {}", reserves.counter);
    match reserves.spot_price() {
        Some(price) => println!("Spot price:      {}", price),
        None => println!("Spot price:      undefined (empty pool)"),
    }
    Ok(())
}
