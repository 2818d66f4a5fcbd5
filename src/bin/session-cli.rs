use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, ORIGIN};
use serde_json::{json, Map, Value};

#[derive(Parser)]
#[command(name = "session-cli")]
#[command(about = "Smoke-test client for the ChatKit session relay", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    /// Send this Origin header, as a browser would.
    #[arg(short, long)]
    origin: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check relay liveness
    Health,
    /// Request a client secret
    Session {
        #[arg(long)]
        user: String,
        /// Only accepted when the relay runs in client_supplied mode
        #[arg(long)]
        workflow_id: Option<String>,
        #[arg(long)]
        expires_after: Option<i64>,
        #[arg(long)]
        rate_limit: Option<i64>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let mut headers = HeaderMap::new();
    if let Some(origin) = &cli.origin {
        headers.insert(ORIGIN, HeaderValue::from_str(origin)?);
    }

    let base = cli.url.trim_end_matches('/');
    match cli.command {
        Commands::Health => {
            let res = client
                .get(format!("{}/healthz", base))
                .headers(headers)
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Session {
            user,
            workflow_id,
            expires_after,
            rate_limit,
        } => {
            let mut body = Map::new();
            body.insert("user".into(), json!(user));
            if let Some(w) = workflow_id {
                body.insert("workflow_id".into(), json!(w));
            }
            if let Some(s) = expires_after {
                body.insert("expires_after_seconds".into(), json!(s));
            }
            if let Some(r) = rate_limit {
                body.insert("rate_limit_per_minute".into(), json!(r));
            }

            let res = client
                .post(format!("{}/api/chatkit/session", base))
                .headers(headers)
                .json(&Value::Object(body))
                .send()
                .await?;
            print_response(res).await?;
        }
    }

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;
    if !status.is_success() {
        eprintln!("Error: relay returned status {}", status);
        eprintln!("Response: {}", text.trim_end());
        return Ok(());
    }

    match serde_json::from_str::<Value>(&text) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => println!("{}", text.trim_end()),
    }
    Ok(())
}
