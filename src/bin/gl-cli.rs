use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "gl-cli")]
#[command(about = "Publish envelopes and inspect a running gl-processors host", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    /// Transport token, sent as a bearer credential.
    #[arg(short, long, env = "NATS_TOKEN")]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Publish a JSON envelope and print the reply
    Publish {
        /// Subject to publish on, e.g. coburn.gl.broker
        subject: String,
        /// Envelope body
        envelope: String,
    },
    /// Check host status
    Status,
    /// List broker candidates and their health
    Candidates,
    /// List recorded mock responses
    Mocks,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let mut headers = HeaderMap::new();
    if let Some(token) = cli.token.as_deref().filter(|t| !t.is_empty()) {
        headers.insert(AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {token}"))?);
    }

    let res = match cli.command {
        Commands::Publish { subject, envelope } => {
            let body: Value = serde_json::from_str(&envelope)?;
            client
                .post(format!("{}/subjects/{}", cli.url, subject))
                .headers(headers)
                .json(&body)
                .send()
                .await?
        }
        Commands::Status => get(&client, &cli.url, "/admin/status", headers).await?,
        Commands::Candidates => get(&client, &cli.url, "/admin/candidates", headers).await?,
        Commands::Mocks => get(&client, &cli.url, "/admin/mocks", headers).await?,
    };

    print_response(res).await
}

async fn get(
    client: &reqwest::Client,
    base: &str,
    path: &str,
    headers: HeaderMap,
) -> Result<reqwest::Response, reqwest::Error> {
    client.get(format!("{base}{path}")).headers(headers).send().await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: host returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
