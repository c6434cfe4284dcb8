use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, ACCESS_CONTROL_REQUEST_METHOD, ORIGIN};
use serde_json::Value;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "gateway-probe")]
#[command(about = "Probe a running sheets gateway", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:5000")]
    url: String,

    /// Origin header to send with every request.
    #[arg(short, long)]
    origin: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print /health; exits non-zero unless the database is connected
    Health,
    /// Exercise /debug/cookies
    Cookies,
    /// Send a CORS preflight and print the returned headers
    Preflight {
        #[arg(default_value = "/health")]
        path: String,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let mut headers = HeaderMap::new();
    if let Some(origin) = &cli.origin {
        headers.insert(ORIGIN, HeaderValue::from_str(origin)?);
    }

    match cli.command {
        Commands::Health => {
            let res = client
                .get(format!("{}/health", cli.url))
                .headers(headers)
                .send()
                .await?;
            let json = print_response(res).await?;
            let connected = json
                .as_ref()
                .and_then(|v| v.get("database"))
                .and_then(Value::as_str)
                == Some("connected");
            return Ok(if connected { ExitCode::SUCCESS } else { ExitCode::FAILURE });
        }
        Commands::Cookies => {
            let res = client
                .get(format!("{}/debug/cookies", cli.url))
                .headers(headers)
                .send()
                .await?;
            for cookie in res.headers().get_all(reqwest::header::SET_COOKIE) {
                println!("Set-Cookie: {}", cookie.to_str().unwrap_or("<binary>"));
            }
            print_response(res).await?;
        }
        Commands::Preflight { path } => {
            headers.insert(ACCESS_CONTROL_REQUEST_METHOD, HeaderValue::from_static("GET"));
            let res = client
                .request(reqwest::Method::OPTIONS, format!("{}{}", cli.url, path))
                .headers(headers)
                .send()
                .await?;
            println!("Status: {}", res.status());
            for (name, value) in res.headers() {
                if name.as_str().starts_with("access-control-") {
                    println!("{}: {}", name, value.to_str().unwrap_or("<binary>"));
                }
            }
            if !res.status().is_success() {
                return Ok(ExitCode::FAILURE);
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

async fn print_response(res: reqwest::Response) -> Result<Option<Value>, Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: gateway returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(None);
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(Some(json))
}
