//! Gemini Relay connection check
//!
//! Resolves the API key and model the same way the server does, sends one
//! test prompt and reports the outcome. Exits with status 1 on failure.

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use gemini_relay::{
    default_candidates, select_model, Credential, CredentialLoader, CredentialSource,
    GeminiProvider, GenerativeModel, ModelConfig, ModelError, ModelProvider, DEFAULT_BASE_URL,
    DEFAULT_ENV_FILE,
};

const TEST_PROMPT: &str =
    "Hello, just testing the Google Gemini API connection. Reply with 'Google Gemini API test successful'";

/// Check that the Gemini API key and models are usable
#[derive(Parser, Debug)]
#[command(name = "gemini-relay-check")]
#[command(about = "Verify the Gemini API key with a single test request")]
struct Cli {
    /// OpenAI-compatible API base URL
    #[arg(long, env = "GEMINI_BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Model names to try, in order of preference
    #[arg(long, env = "GEMINI_MODELS", value_delimiter = ',', num_args = 1..)]
    models: Option<Vec<String>>,

    /// Key-value file consulted when GOOGLE_API_KEY is not set
    #[arg(long, env = "GEMINI_RELAY_ENV_FILE", default_value = DEFAULT_ENV_FILE)]
    env_file: PathBuf,
}

fn separator() {
    println!("{}", "-".repeat(50));
}

fn report_failure(summary: &str) -> bool {
    separator();
    println!("\u{274C} {}", summary);
    false
}

/// Step 1: the API key must resolve from the environment or the env file
fn check_api_key(loader: &CredentialLoader) -> Option<Credential> {
    print!("1. Checking Google API key... ");
    io::stdout().flush().ok();

    match loader.load() {
        Some((key, source)) => {
            let origin = match source {
                CredentialSource::Environment => "environment".to_string(),
                CredentialSource::EnvFile(path) => path.display().to_string(),
            };
            println!("\u{2705} OK ({} from {})", key.masked(), origin);
            Some(key)
        }
        None => {
            println!("\u{274C} FAILED");
            println!(
                "   Error: {} not found in environment variables or {}",
                loader.var_name(),
                loader.env_file().display()
            );
            println!("   Solution: Add {}=<your key> to your .env file", loader.var_name());
            None
        }
    }
}

/// Step 2: the first usable candidate, with every rejection listed
async fn check_model<P>(provider: &P, candidates: &[String]) -> Option<Arc<dyn GenerativeModel>>
where
    P: ModelProvider + ?Sized,
{
    let selection = select_model(provider, candidates).await;

    for failure in &selection.failures {
        println!(
            "   \u{26A0}\u{FE0F}  Model {} not available: {}",
            failure.model_name, failure.error
        );
    }
    match selection.model {
        Some(model) => {
            println!("   \u{2705} Successfully loaded model: {}", model.name());
            Some(model)
        }
        None => {
            println!("   \u{274C} No available Gemini models found!");
            println!("   Available models may require different API access or billing.");
            None
        }
    }
}

/// Step 3: one prompt through the selected model
async fn check_round_trip(model: &dyn GenerativeModel) -> bool {
    print!("3. Sending test request... ");
    io::stdout().flush().ok();

    match model.generate(TEST_PROMPT).await {
        Ok(reply) => {
            println!("\u{2705} OK");
            println!("   Response: {}", reply.trim());
            true
        }
        Err(e) => {
            println!("\u{274C} FAILED");
            println!("   Error: {}", e.message());
            match e {
                ModelError::Authentication(_) => {
                    println!("   Invalid Google API key. Please check your API key.");
                }
                ModelError::Quota(_) => {
                    println!("   Google API quota exceeded. Please check your billing/usage.");
                }
                ModelError::ModelUnavailable(_) => {
                    println!("   The model rejected the request. Try another --models entry.");
                }
                ModelError::Other(_) => {}
            }
            false
        }
    }
}

/// Model selection followed by the round trip. True when both pass.
async fn run_model_checks<P>(provider: &P, candidates: &[String]) -> bool
where
    P: ModelProvider + ?Sized,
{
    let Some(model) = check_model(provider, candidates).await else {
        return report_failure("Model selection failed.");
    };

    if !check_round_trip(model.as_ref()).await {
        return report_failure("Google Gemini API test failed.");
    }

    separator();
    println!("\u{2705} Google Gemini API Test Successful!");
    true
}

#[tokio::main]
async fn main() -> ExitCode {
    gemini_relay::logging::init("warn");
    let args = Cli::parse();

    println!("\u{1F527} Testing Google Gemini API Connection...");
    separator();

    let loader = CredentialLoader::new().with_env_file(&args.env_file);
    let Some(credential) = check_api_key(&loader) else {
        report_failure("API key check failed.");
        return ExitCode::FAILURE;
    };

    println!("2. Selecting model ({})...", args.base_url);
    let candidates = args.models.clone().unwrap_or_else(default_candidates);
    let provider =
        GeminiProvider::new(&ModelConfig::new(credential).with_base_url(&args.base_url));

    if run_model_checks(&provider, &candidates).await {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
