//! API key resolution from the environment or a local `.env` file

use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::CredentialError;

/// Environment variable holding the Gemini API key
pub const API_KEY_VAR: &str = "GOOGLE_API_KEY";

/// Default key-value file consulted when the variable is not set
pub const DEFAULT_ENV_FILE: &str = ".env";

/// Number of leading characters shown when a key is printed
const VISIBLE_PREFIX: usize = 20;

/// Secret used to authorize calls to the remote model.
///
/// Never empty. `Debug` and [`Credential::masked`] only reveal a prefix.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Wrap a secret, rejecting empty or whitespace-only values
    pub fn new(secret: impl Into<String>) -> Option<Self> {
        let secret = secret.into();
        if secret.trim().is_empty() {
            None
        } else {
            Some(Self(secret))
        }
    }

    /// The raw secret, for handing to the HTTP client
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// First characters of the key followed by `...`
    pub fn masked(&self) -> String {
        let prefix: String = self.0.chars().take(VISIBLE_PREFIX).collect();
        format!("{}...", prefix)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Credential").field(&self.masked()).finish()
    }
}

/// Where the API key came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialSource {
    Environment,
    EnvFile(PathBuf),
}

/// Looks up the API key, first in the environment and then in a
/// key-value file.
#[derive(Debug, Clone)]
pub struct CredentialLoader {
    var_name: String,
    env_file: PathBuf,
}

impl Default for CredentialLoader {
    fn default() -> Self {
        Self {
            var_name: API_KEY_VAR.to_string(),
            env_file: PathBuf::from(DEFAULT_ENV_FILE),
        }
    }
}

impl CredentialLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different key-value file
    pub fn with_env_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.env_file = path.into();
        self
    }

    pub fn env_file(&self) -> &Path {
        &self.env_file
    }

    pub fn var_name(&self) -> &str {
        &self.var_name
    }

    /// Resolve the key against the real process environment
    pub fn load(&self) -> Option<(Credential, CredentialSource)> {
        self.load_with(|name| std::env::var(name).ok())
    }

    /// Resolve the key using `lookup` in place of the process environment.
    ///
    /// A read failure on the env file is logged and treated as "not found".
    pub fn load_with<F>(&self, lookup: F) -> Option<(Credential, CredentialSource)>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(credential) = lookup(&self.var_name).and_then(Credential::new) {
            debug!(var = %self.var_name, "API key found in environment");
            return Some((credential, CredentialSource::Environment));
        }

        match self.read_env_file() {
            Ok(Some(value)) => match Credential::new(value) {
                Some(credential) => {
                    debug!(path = %self.env_file.display(), "API key found in env file");
                    Some((credential, CredentialSource::EnvFile(self.env_file.clone())))
                }
                None => {
                    warn!(path = %self.env_file.display(), var = %self.var_name, "API key is empty in env file");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!("Error reading env file: {}", e);
                None
            }
        }
    }

    /// First `NAME=value` line in the env file, value taken after the first `=`
    fn read_env_file(&self) -> Result<Option<String>, CredentialError> {
        let contents = match fs::read_to_string(&self.env_file) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(CredentialError::EnvFile {
                    path: self.env_file.clone(),
                    source,
                })
            }
        };

        let prefix = format!("{}=", self.var_name);
        Ok(contents
            .lines()
            .find_map(|line| line.strip_prefix(&prefix))
            .map(|value| value.trim().to_string()))
    }
}
