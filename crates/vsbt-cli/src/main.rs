// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// VSTB CLI - Deploy, verify and inspect the VODA soul-bound token
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use clap::{Parser, Subcommand};
use colored::*;
use std::path::PathBuf;
use vsbt_core::NetworkKind;

mod commands;

use commands::verify::VerifyOptions;

#[derive(Parser)]
#[command(name = "vsbt-cli")]
#[command(about = "VODA SBT - deployment and verification tooling", long_about = None)]
#[command(version)]
struct Cli {
    /// Collection config (TOML). Built-in defaults when omitted.
    #[arg(short, long, env = "VSBT_CONFIG")]
    config: Option<PathBuf>,

    /// Local chain state file
    #[arg(short, long, env = "VSBT_STATE", default_value = "vsbt-chain.json")]
    state: PathBuf,

    /// Target network: testnet or mainnet
    #[arg(short, long, env = "VSBT_NETWORK", default_value_t = NetworkKind::default())]
    network: NetworkKind,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the constructor arguments and their ABI encoding
    Args,

    /// Deploy the contract, then verify it on the block explorer
    Deploy {
        /// Deployer address (becomes contract owner)
        #[arg(short, long)]
        from: String,

        /// Skip block explorer verification
        #[arg(long, default_value = "false")]
        skip_verify: bool,

        #[command(flatten)]
        verify: VerifyOptions,
    },

    /// Verify an already-deployed contract on the block explorer
    Verify {
        /// Contract address
        #[arg(short, long)]
        address: String,

        #[command(flatten)]
        verify: VerifyOptions,
    },

    /// Show the on-chain state of a deployed contract
    Info {
        /// Contract address (defaults to contract_address from config)
        #[arg(short, long)]
        address: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    print_banner();

    let config = commands::common::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Args => commands::args::handle(&config),
        Commands::Deploy {
            from,
            skip_verify,
            verify,
        } => {
            let request = commands::deploy::DeployRequest {
                from,
                skip_verify,
                verify,
            };
            commands::deploy::handle(&config, cli.network, &cli.state, request).await?
        }
        Commands::Verify { address, verify } => {
            let address = commands::common::parse_address(&address)?;
            commands::verify::handle(&config, cli.network, &address, &verify).await?
        }
        Commands::Info { address } => {
            let address = match address {
                Some(a) => commands::common::parse_address(&a)?,
                None => config
                    .contract_address
                    .ok_or("No --address given and contract_address not set in config")?,
            };
            commands::info::handle(&config, cli.network, &cli.state, &address)?
        }
    }

    Ok(())
}

fn print_banner() {
    println!(
        "{}",
        "╔═══════════════════════════════════════════════╗".cyan()
    );
    println!(
        "{}",
        "║        VODA SOUL-BOUND TOKEN (VSTB) CLI       ║"
            .cyan()
            .bold()
    );
    println!(
        "{}",
        "╚═══════════════════════════════════════════════╝".cyan()
    );
    println!();
}

fn print_success(msg: &str) {
    println!("{} {}", "✓".green().bold(), msg);
}

fn print_error(msg: &str) {
    eprintln!("{} {}", "✗".red().bold(), msg);
}

fn print_info(msg: &str) {
    println!("{} {}", "ℹ".blue().bold(), msg);
}

// ─────────────────────────────────────────────────────────────────
// UNIT TESTS
// ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    // ── CLI Argument Parsing ────────────────────────────────────

    #[test]
    fn test_cli_args() {
        let cli = Cli::try_parse_from(["vsbt-cli", "args"]);
        assert!(cli.is_ok(), "Failed to parse: {:?}", cli.err());
        assert!(matches!(cli.unwrap().command, Commands::Args));
    }

    #[test]
    fn test_cli_deploy() {
        let cli = Cli::try_parse_from([
            "vsbt-cli",
            "--network",
            "mainnet",
            "deploy",
            "--from",
            "0x729816eD59Ac14C3Fced1051d80c89eeDA7eF54d",
            "--skip-verify",
        ])
        .unwrap();
        assert_eq!(cli.network, NetworkKind::Mainnet);
        match cli.command {
            Commands::Deploy {
                from, skip_verify, ..
            } => {
                assert_eq!(from, "0x729816eD59Ac14C3Fced1051d80c89eeDA7eF54d");
                assert!(skip_verify);
            }
            _ => panic!("Expected Deploy"),
        }
    }

    #[test]
    fn test_cli_verify_source() {
        let cli = Cli::try_parse_from([
            "vsbt-cli",
            "verify",
            "--address",
            "0x0e5b5603ebc3c1841a0b2ce1e7afc081c50ca310",
        ])
        .unwrap();
        match cli.command {
            Commands::Verify { verify, .. } => {
                assert!(verify.source.is_none());
                assert_eq!(
                    verify.compiler_version,
                    commands::verify::DEFAULT_COMPILER_VERSION
                );
            }
            _ => panic!("Expected Verify"),
        }

        let cli = Cli::try_parse_from([
            "vsbt-cli",
            "verify",
            "--address",
            "0x0e5b5603ebc3c1841a0b2ce1e7afc081c50ca310",
            "--source",
            "build/VODAVSTB.json",
        ])
        .unwrap();
        match cli.command {
            Commands::Verify { verify, .. } => {
                assert_eq!(verify.source, Some(PathBuf::from("build/VODAVSTB.json")))
            }
            _ => panic!("Expected Verify"),
        }
    }

    #[test]
    fn test_cli_info_state_file() {
        let cli = Cli::try_parse_from(["vsbt-cli", "--state", "/tmp/chain.json", "info"]).unwrap();
        assert_eq!(cli.state, PathBuf::from("/tmp/chain.json"));
        assert!(matches!(cli.command, Commands::Info { address: None }));
    }

    #[test]
    fn test_cli_rejects_unknown_network() {
        let cli = Cli::try_parse_from(["vsbt-cli", "--network", "goerli", "args"]);
        assert!(cli.is_err());
    }
}
