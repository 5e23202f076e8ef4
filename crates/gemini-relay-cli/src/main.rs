//! Gemini Relay - web chat server in front of the Gemini API
//!
//! Usage:
//!     gemini-relay [OPTIONS]
//!
//! Environment Variables:
//!     GOOGLE_API_KEY: Gemini API key (falls back to the env file)
//!     GEMINI_RELAY_HOST: Address to bind (default: 127.0.0.1)
//!     GEMINI_RELAY_PORT: Port to bind (default: 5000)
//!     GEMINI_BASE_URL: OpenAI-compatible API base URL
//!     GEMINI_MODELS: Comma-separated model names, tried in order
//!     GEMINI_RELAY_ENV_FILE: Key-value file consulted for the API key (default: .env)

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use gemini_relay::{
    default_candidates, server, ChatService, CredentialLoader, GeminiProvider, ModelConfig,
    Readiness, DEFAULT_BASE_URL, DEFAULT_ENV_FILE,
};

/// Gemini Relay - chat page and /ask endpoint backed by Gemini
#[derive(Parser, Debug)]
#[command(name = "gemini-relay")]
#[command(about = "Web chat front-end that relays messages to the Gemini API")]
#[command(after_help = r#"Examples:
    # Serve on the default address (http://127.0.0.1:5000)
    gemini-relay

    # Listen on all interfaces
    gemini-relay --host 0.0.0.0 --port 8080

    # Prefer a specific model list
    gemini-relay --models gemini-1.5-pro,gemini-pro
"#)]
struct Cli {
    /// Address to bind
    #[arg(long, env = "GEMINI_RELAY_HOST", default_value = "127.0.0.1")]
    host: IpAddr,

    /// Port to bind
    #[arg(long, env = "GEMINI_RELAY_PORT", default_value = "5000")]
    port: u16,

    /// OpenAI-compatible API base URL
    #[arg(long, env = "GEMINI_BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Model names to try, in order of preference
    #[arg(long, env = "GEMINI_MODELS", value_delimiter = ',', num_args = 1..)]
    models: Option<Vec<String>>,

    /// Key-value file consulted when GOOGLE_API_KEY is not set
    #[arg(long, env = "GEMINI_RELAY_ENV_FILE", default_value = DEFAULT_ENV_FILE)]
    env_file: PathBuf,

    /// Report model-unavailable failures as errors instead of demo replies
    #[arg(long, env = "GEMINI_RELAY_NO_DEMO_FALLBACK")]
    no_demo_fallback: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    gemini_relay::logging::init("info");
    let args = Cli::parse();

    let loader = CredentialLoader::new().with_env_file(&args.env_file);
    let credential = loader.load().map(|(key, _)| key);
    let candidates = args.models.clone().unwrap_or_else(default_candidates);

    let base_url = args.base_url.clone();
    let readiness = Readiness::resolve(credential.as_ref(), &candidates, |key| {
        GeminiProvider::new(&ModelConfig::new(key.clone()).with_base_url(base_url))
    })
    .await;

    println!("\u{1F916} Gemini Relay");
    match &credential {
        Some(key) => println!("\u{1F4CA} API Key loaded: {}", key.masked()),
        None => {
            println!("\u{274C} No API key found!");
            println!(
                "   Set {} or add it to {}.",
                loader.var_name(),
                loader.env_file().display()
            );
        }
    }
    if let Some(model) = readiness.model_name() {
        println!("\u{2705} Using model: {}", model);
    }

    let service = Arc::new(ChatService::new(readiness).with_demo_fallback(!args.no_demo_fallback));
    let addr = SocketAddr::new(args.host, args.port);

    server::serve(addr, service)
        .await
        .with_context(|| format!("Server on {} failed", addr))
}
