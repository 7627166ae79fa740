use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde_json::Value;

use storefront_db::config::load_config;
use storefront_db::connection::{redact_uri, ConnectionManager, TcpDriver, TcpSession};
use storefront_db::http::status_for;

#[derive(Parser)]
#[command(name = "storefront-db-cli")]
#[command(about = "Operations CLI for the storefront database connection", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Query a running service's database health endpoint
    Status {
        #[arg(short, long, default_value = "http://localhost:5000")]
        url: String,
    },
    /// Load config and try one acquisition from this process
    Check {
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Status { url } => {
            let client = reqwest::Client::new();
            let res = client
                .get(format!("{}/api/db-health", url.trim_end_matches('/')))
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Check { config } => {
            let config = load_config(config.as_deref())?;
            println!("Checking {}", redact_uri(&config.database.uri));

            let driver = TcpDriver::new(config.database.max_pool_size);
            let manager = ConnectionManager::new(driver, config.database.clone());
            let result = manager
                .acquire_connection_within(config.database.acquire_timeout())
                .await;

            match result {
                Ok(handle) => {
                    match handle.downcast::<TcpSession>() {
                        Some(session) => println!("Connected: {} ({})", handle.id(), session.peer()),
                        None => println!("Connected: {}", handle.id()),
                    }
                    println!("{}", serde_json::to_string_pretty(&manager.status())?);
                    manager.shutdown().await;
                }
                Err(err) => {
                    eprintln!("Error ({}): {}", status_for(err.kind()), err);
                    eprintln!("{}", serde_json::to_string_pretty(&manager.status())?);
                    manager.shutdown().await;
                    std::process::exit(1);
                }
            }
        }
    }

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if let Some(retry) = res.headers().get(reqwest::header::RETRY_AFTER) {
        eprintln!("Retry-After: {}", retry.to_str().unwrap_or("?"));
    }

    let text = res.text().await?;
    if !status.is_success() {
        eprintln!("Error: database health returned status {}", status);
    }

    match serde_json::from_str::<Value>(&text) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => println!("{}", text),
    }
    Ok(())
}
