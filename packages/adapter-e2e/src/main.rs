//! Swap adapter conformance CLI
//!
//! - adapter-e2e run    -> full conformance catalogue against a forked node
//! - adapter-e2e slots  -> balance-mapping slot check for every configured token
//! - adapter-e2e status -> configuration and node health

use clap::{Parser, Subcommand};
use color_eyre::eyre::Result;
use tracing_subscriber::EnvFilter;

use adapter_e2e::{
    run_conformance, run_slot_checks, AnvilClient, HarnessConfig, Selection, TestFixture,
    TestSuite,
};

#[derive(Parser)]
#[command(name = "adapter-e2e")]
#[command(about = "Conformance harness for swap adapters on a forked chain", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the conformance tests
    Run {
        /// Run only a specific test
        #[arg(short, long)]
        test: Option<String>,

        /// Quick mode (sanity tests only, no swap sweeps)
        #[arg(long)]
        quick: bool,
    },

    /// Verify the balance-mapping slot of every configured token
    Slots,

    /// Show configuration and node status
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = HarnessConfig::from_env()?;

    match cli.command {
        Commands::Run { test, quick } => {
            let selection = match (test, quick) {
                (Some(name), _) => {
                    tracing::info!("Running single test: {}", name);
                    Selection::Single(name)
                }
                (None, true) => {
                    tracing::info!("Quick mode: sanity tests only");
                    Selection::Quick
                }
                (None, false) => Selection::All,
            };

            let fixture = TestFixture::bootstrap(&config).await?;
            let suite = run_conformance(&fixture, &config.sweep, &selection).await;
            finish(suite);
        }

        Commands::Slots => {
            let fixture = TestFixture::bootstrap(&config).await?;
            let suite = run_slot_checks(&fixture).await;
            finish(suite);
        }

        Commands::Status => {
            println!("Configuration");
            println!("----------------------------------------");
            println!("RPC URL:     {}", config.evm.rpc_url);
            println!("Chain ID:    {}", config.evm.chain_id);
            match &config.fork.url {
                // Fork URLs usually carry an API key in the path
                Some(url) => println!(
                    "Fork:        {} @ block {}",
                    url.host_str().unwrap_or("<no host>"),
                    config.fork.block_number
                ),
                None => println!("Fork:        <none>"),
            }
            println!("Dex:         {}", config.adapter.dex);
            match (&config.adapter.address, &config.adapter.artifact) {
                (Some(address), _) => println!("Adapter:     {}", address),
                (None, Some(path)) => println!("Adapter:     deploy {}", path.display()),
                (None, None) => println!("Adapter:     <not configured>"),
            }
            println!("Tokens:      {}", config.sweep.symbols.join(", "));

            println!();
            println!("Node");
            println!("----------------------------------------");
            let node = AnvilClient::new(config.evm.rpc_url.as_str());
            if node.is_healthy().await {
                println!("Anvil:       \x1b[32mOK\x1b[0m");
                println!("Chain ID:    {}", node.chain_id().await?);
                println!("Block:       {}", node.block_number().await?);
            } else {
                println!("Anvil:       \x1b[31mNOT RESPONDING\x1b[0m");
            }
        }
    }

    Ok(())
}

fn finish(suite: TestSuite) {
    suite.print_summary();

    if let Some(reason) = suite.abort_reason() {
        tracing::error!(reason, "Run aborted");
    }

    if suite.failed() > 0 || suite.is_aborted() {
        std::process::exit(1);
    }
}
