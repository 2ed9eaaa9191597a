use std::fs;
use std::path::PathBuf;

use chrono::{TimeDelta, Utc};
use clap::{Parser, Subcommand};
use serde_json::Value;

use ingest_relay::config::loader::ENV_SIGNING_KEY;
use ingest_relay::config::SecretString;
use ingest_relay::ingest::{build_envelope, Provenance};
use ingest_relay::relay::client::{HEADER_BODY_HASH, HEADER_SIGNATURE, HEADER_TIMESTAMP};
use ingest_relay::signing::{SignedEnvelope, Signer};

#[derive(Parser)]
#[command(name = "relay-cli")]
#[command(about = "Operator CLI for the ingestion relay", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Post a JSON submission file to the relay
    Submit { file: PathBuf },
    /// Check that the relay is up
    Health,
    /// Print the signature headers the relay would attach to a submission
    Sign { file: PathBuf },
    /// Check a forwarded body against its signature headers
    Verify {
        file: PathBuf,
        #[arg(long)]
        timestamp: String,
        #[arg(long)]
        body_hash: String,
        #[arg(long)]
        signature: String,
        #[arg(long, default_value_t = 300)]
        max_skew_secs: i64,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    match cli.command {
        Commands::Submit { file } => {
            let body = fs::read(&file)?;
            let res = client
                .post(format!("{}/submit", cli.url))
                .header(reqwest::header::CONTENT_TYPE, "application/json")
                .body(body)
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Health => {
            let res = client.get(format!("{}/health", cli.url)).send().await?;
            print_response(res).await?;
        }
        Commands::Sign { file } => {
            let body = fs::read(&file)?;
            let (envelope, rows) = build_envelope(&body, Provenance::default(), &signer_from_env()?)?;
            println!("rows: {}", rows);
            println!("{}: {}", HEADER_TIMESTAMP, envelope.timestamp);
            println!("{}: {}", HEADER_BODY_HASH, envelope.body_hash);
            println!("{}: {}", HEADER_SIGNATURE, envelope.signature);
            println!("{}", String::from_utf8_lossy(&envelope.body));
        }
        Commands::Verify {
            file,
            timestamp,
            body_hash,
            signature,
            max_skew_secs,
        } => {
            let envelope = SignedEnvelope {
                timestamp,
                body_hash,
                signature,
                body: fs::read(&file)?,
            };
            match signer_from_env()?.verify(&envelope, Utc::now(), TimeDelta::seconds(max_skew_secs)) {
                Ok(()) => println!("valid"),
                Err(e) => {
                    eprintln!("invalid: {}", e);
                    std::process::exit(1);
                }
            }
        }
    }

    Ok(())
}

fn signer_from_env() -> Result<Signer, Box<dyn std::error::Error>> {
    let key = std::env::var(ENV_SIGNING_KEY).map_err(|_| format!("{} is not set", ENV_SIGNING_KEY))?;
    Ok(Signer::new(SecretString::new(key)))
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;
    match serde_json::from_str::<Value>(&text) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => println!("{}", text),
    }
    if !status.is_success() {
        eprintln!("Error: relay returned status {}", status);
    }
    Ok(())
}
