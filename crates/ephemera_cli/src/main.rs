//! Command-line client for the ephemera document server.

use clap::{Parser, Subcommand};
use ephemera_core::duration::parse_lifetime;
use ephemera_core::{
    DEFAULT_CLI_SERVER_URL, LIFETIME_HEADER, NAME_CHARSET_HEADER, NAME_LENGTH_HEADER,
};
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "epb", about = "ephemera client", version)]
struct Cli {
    /// Server URL (can also be set via EPB_SERVER env var)
    #[arg(short, long, env = "EPB_SERVER")]
    server: Option<String>,

    /// Request timeout in seconds
    #[arg(long, default_value = "30")]
    timeout: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload stdin (or a file) and print the document name
    Put {
        /// Read the document from this file instead of stdin
        #[arg(short, long)]
        file: Option<PathBuf>,
        /// Lifetime such as 168h or 1h30m (server default when omitted)
        #[arg(short = 't', long, value_parser = validate_lifetime)]
        lifetime: Option<String>,
        /// Number of characters in the generated name
        #[arg(short = 'n', long)]
        length: Option<usize>,
        /// Characters the generated name is drawn from
        #[arg(short = 'c', long)]
        charset: Option<String>,
    },
    /// Write a document to stdout
    Get { name: String },
}

fn validate_lifetime(value: &str) -> Result<String, String> {
    parse_lifetime(value)
        .map(|_| value.trim().to_string())
        .map_err(|err| err.to_string())
}

/// Header overrides for an upload, skipping options that were not given.
fn upload_headers(
    lifetime: Option<String>,
    length: Option<usize>,
    charset: Option<String>,
) -> Vec<(&'static str, String)> {
    let mut headers = Vec::new();
    if let Some(lifetime) = lifetime {
        headers.push((LIFETIME_HEADER, lifetime));
    }
    if let Some(charset) = charset {
        headers.push((NAME_CHARSET_HEADER, charset));
    }
    if let Some(length) = length {
        headers.push((NAME_LENGTH_HEADER, length.to_string()));
    }
    headers
}

fn error_message_for_response(status: reqwest::StatusCode, body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return status
            .canonical_reason()
            .unwrap_or("Request failed")
            .to_string();
    }
    trimmed.to_string()
}

async fn ensure_success_or_exit(res: reqwest::Response, action: &str) -> reqwest::Response {
    let status = res.status();
    if status.is_success() {
        return res;
    }

    let body = match res.text().await {
        Ok(body) => body,
        Err(err) => format!("failed to read error response body: {}", err),
    };
    let message = error_message_for_response(status, &body);
    eprintln!("{} failed ({}): {}", action, status, message);
    std::process::exit(1);
}

fn api_url(server: &str, segments: &[&str]) -> Result<reqwest::Url, String> {
    let mut url = reqwest::Url::parse(server)
        .map_err(|err| format!("Invalid server URL '{}': {}", server, err))?;
    let mut path = url
        .path_segments_mut()
        .map_err(|_| "Server URL cannot be used as an API base".to_string())?;
    path.pop_if_empty();
    for segment in segments {
        path.push(segment);
    }
    drop(path);
    Ok(url)
}

fn api_url_or_exit(server: &str, action: &str, segments: &[&str]) -> reqwest::Url {
    match api_url(server, segments) {
        Ok(url) => url,
        Err(message) => {
            eprintln!("{} failed: {}", action, message);
            std::process::exit(1);
        }
    }
}

fn resolve_server(server: Option<String>) -> String {
    let server = server
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| DEFAULT_CLI_SERVER_URL.to_string());
    let mut normalized = server;
    while normalized.ends_with('/') {
        normalized.pop();
    }
    normalized
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let Cli {
        server,
        timeout,
        command,
    } = Cli::parse();

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout))
        .build()?;
    let server = resolve_server(server);

    match command {
        Commands::Put {
            file,
            lifetime,
            length,
            charset,
        } => {
            let endpoint = api_url_or_exit(&server, "Put", &[""]);
            let content = if let Some(path) = file {
                std::fs::read(path)?
            } else {
                let mut buffer = Vec::new();
                io::stdin().read_to_end(&mut buffer)?;
                buffer
            };

            let mut request = client.post(endpoint).body(content);
            for (name, value) in upload_headers(lifetime, length, charset) {
                request = request.header(name, value);
            }
            let res = ensure_success_or_exit(request.send().await?, "Put").await;
            println!("{}", res.text().await?);
        }
        Commands::Get { name } => {
            let endpoint = api_url_or_exit(&server, "Get", &[name.as_str()]);
            let res = ensure_success_or_exit(client.get(endpoint).send().await?, "Get").await;
            let payload = res.bytes().await?;
            let mut stdout = io::stdout().lock();
            stdout.write_all(&payload)?;
            stdout.flush()?;
        }
    }

    Ok(())
}
