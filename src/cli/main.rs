use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use reqwest::Client;
use serde_json::json;

#[derive(Parser)]
#[command(name = "dhm-cli")]
#[command(about = "Diabetes Health Manager CLI", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    endpoint: String,

    /// User identifier (email) sent with user-scoped commands
    #[arg(short, long, env = "DHM_USER")]
    user: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a risk prediction
    Predict {
        #[arg(long, default_value = "0")]
        pregnancies: u32,

        #[arg(long)]
        glucose: u32,

        #[arg(long)]
        blood_pressure: u32,

        #[arg(long)]
        skin_thickness: u32,

        #[arg(long)]
        insulin: u32,

        #[arg(long)]
        bmi: f64,

        #[arg(long)]
        diabetes_pedigree_function: f64,

        #[arg(long)]
        age: u32,
    },

    /// Show prediction history
    History,

    /// Download prediction history as CSV
    Export {
        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Clear prediction history
    Clear,

    /// Explain a prediction with per-feature attributions
    Explain {
        #[arg(long, default_value = "0")]
        pregnancies: u32,

        #[arg(long)]
        glucose: u32,

        #[arg(long)]
        blood_pressure: u32,

        #[arg(long)]
        skin_thickness: u32,

        #[arg(long)]
        insulin: u32,

        #[arg(long)]
        bmi: f64,

        #[arg(long)]
        diabetes_pedigree_function: f64,

        #[arg(long)]
        age: u32,
    },

    /// Show permutation feature importance
    Importance {
        #[arg(short, long, default_value = "5")]
        n_repeats: usize,
    },

    /// Check server health
    Health,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let client = Client::new();

    match cli.command {
        Commands::Predict {
            pregnancies,
            glucose,
            blood_pressure,
            skin_thickness,
            insulin,
            bmi,
            diabetes_pedigree_function,
            age,
        } => {
            let user = require_user(&cli.user)?;
            let body = json!({
                "pregnancies": pregnancies,
                "glucose": glucose,
                "blood_pressure": blood_pressure,
                "skin_thickness": skin_thickness,
                "insulin": insulin,
                "bmi": bmi,
                "diabetes_pedigree_function": diabetes_pedigree_function,
                "age": age,
            });
            let response = client
                .post(format!("{}/v1/predictions", cli.endpoint))
                .header("x-user-email", &user)
                .json(&body)
                .send()
                .await
                .context("request failed")?;
            print_json(response).await?;
        }

        Commands::History => {
            let user = require_user(&cli.user)?;
            let response = client
                .get(format!("{}/v1/history", cli.endpoint))
                .header("x-user-email", &user)
                .send()
                .await
                .context("request failed")?;
            print_json(response).await?;
        }

        Commands::Export { output } => {
            let user = require_user(&cli.user)?;
            let response = client
                .get(format!("{}/v1/history/export", cli.endpoint))
                .header("x-user-email", &user)
                .send()
                .await
                .context("request failed")?;
            if !response.status().is_success() {
                bail!("server returned {}", response.status());
            }
            let bytes = response.bytes().await?;
            match output {
                Some(path) => {
                    std::fs::write(&path, &bytes)?;
                    println!("History written to {}", path);
                }
                None => print!("{}", String::from_utf8_lossy(&bytes)),
            }
        }

        Commands::Clear => {
            let user = require_user(&cli.user)?;
            let response = client
                .delete(format!("{}/v1/history", cli.endpoint))
                .header("x-user-email", &user)
                .send()
                .await
                .context("request failed")?;
            if response.status().is_success() {
                println!("History cleared.");
            } else {
                bail!("server returned {}", response.status());
            }
        }

        Commands::Explain {
            pregnancies,
            glucose,
            blood_pressure,
            skin_thickness,
            insulin,
            bmi,
            diabetes_pedigree_function,
            age,
        } => {
            let body = json!({
                "pregnancies": pregnancies,
                "glucose": glucose,
                "blood_pressure": blood_pressure,
                "skin_thickness": skin_thickness,
                "insulin": insulin,
                "bmi": bmi,
                "diabetes_pedigree_function": diabetes_pedigree_function,
                "age": age,
            });
            let response = client
                .post(format!("{}/v1/explanations", cli.endpoint))
                .json(&body)
                .send()
                .await
                .context("request failed")?;
            print_json(response).await?;
        }

        Commands::Importance { n_repeats } => {
            let response = client
                .get(format!(
                    "{}/v1/model/importance?n_repeats={}",
                    cli.endpoint, n_repeats
                ))
                .send()
                .await
                .context("request failed")?;
            print_json(response).await?;
        }

        Commands::Health => {
            let response = client
                .get(format!("{}/health", cli.endpoint))
                .send()
                .await
                .context("request failed")?;
            print_json(response).await?;
        }
    }

    Ok(())
}

fn require_user(user: &Option<String>) -> anyhow::Result<String> {
    user.clone()
        .context("a user identifier is required: pass --user or set DHM_USER")
}

async fn print_json(response: reqwest::Response) -> anyhow::Result<()> {
    let status = response.status();
    let value: serde_json::Value = response.json().await.context("invalid JSON response")?;
    println!("{}", serde_json::to_string_pretty(&value)?);
    if !status.is_success() {
        bail!("server returned {}", status);
    }
    Ok(())
}
