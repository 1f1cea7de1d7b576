//! Facilitator server configuration.
//!
//! Loads configuration from a TOML file with support for environment variable
//! expansion in string values. Variables use `$VAR` or `${VAR}` syntax.
//!
//! # Example Configuration
//!
//! ```toml
//! host = "0.0.0.0"
//! port = 4021
//! recipient = "DE3nhgFvCa7MryXjcdtMyo8m9y7Vnzn4gHSmjNGzgtyp"
//! price = "$0.01"
//! base_url = "https://gatya.example"
//! preflight = true
//!
//! [networks.mainnet-beta]
//! rpc_url = "$HELIUS_MAINNET_URL"
//! ```
//!
//! # Environment Variables
//!
//! - `CONFIG` - Path to configuration file (default: `config.toml`)
//! - `HOST` / `PORT` - Override the bind address
//! - `SOLANA_RPC_MAINNET`, `SOLANA_RPC_DEVNET`, `SOLANA_RPC_TESTNET` - Override
//!   RPC endpoints; the `NEXT_PUBLIC_`-prefixed names take precedence

use std::collections::BTreeMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use s402::amount::{MoneyAmount, MoneyAmountParseError};
use s402_svm::{DEFAULT_RECIPIENT, NetworkTable, SolanaNetwork, UnknownNetwork};
use serde::{Deserialize, Serialize};
use solana_pubkey::Pubkey;
use url::Url;

/// Errors raised while loading the configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file exists but cannot be read.
    #[error("cannot read {path}: {source}")]
    Read {
        /// The file that failed.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The file is not valid TOML for this schema.
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
    /// A `[networks.<name>]` table names an unknown cluster.
    #[error(transparent)]
    UnknownNetwork(#[from] UnknownNetwork),
    /// The recipient is not a base58 public key.
    #[error("invalid recipient address: {0}")]
    InvalidRecipient(String),
    /// The configured price cannot be parsed.
    #[error("invalid price: {0}")]
    InvalidPrice(#[from] MoneyAmountParseError),
}

/// Top-level facilitator configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FacilitatorConfig {
    /// Server bind address (default: `0.0.0.0`).
    #[serde(default = "default_host")]
    pub host: IpAddr,

    /// Server port (default: `4021`).
    #[serde(default = "default_port")]
    pub port: u16,

    /// Base58 address payments are made to.
    #[serde(default = "default_recipient")]
    pub recipient: String,

    /// Price of the demo resource, e.g. `"$0.01"`.
    #[serde(default = "default_price")]
    pub price: String,

    /// Public origin used to build resource URLs. Falls back to the `Host` header.
    #[serde(default)]
    pub base_url: Option<Url>,

    /// Let the RPC node simulate transactions before broadcasting them.
    #[serde(default = "default_preflight")]
    pub preflight: bool,

    /// Per-cluster overrides keyed by cluster name (`mainnet-beta`, `devnet`, `testnet`).
    #[serde(default)]
    pub networks: BTreeMap<String, NetworkOverride>,
}

/// Per-cluster configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NetworkOverride {
    /// JSON-RPC endpoint URL.
    #[serde(default)]
    pub rpc_url: Option<String>,
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

const fn default_port() -> u16 {
    4021
}

fn default_recipient() -> String {
    DEFAULT_RECIPIENT.to_string()
}

fn default_price() -> String {
    "$0.01".to_owned()
}

const fn default_preflight() -> bool {
    true
}

impl Default for FacilitatorConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            recipient: default_recipient(),
            price: default_price(),
            base_url: None,
            preflight: default_preflight(),
            networks: BTreeMap::new(),
        }
    }
}

impl FacilitatorConfig {
    /// Loads configuration from `path`, then applies process environment overrides.
    ///
    /// A missing file is not an error; every key has a default.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed, or if
    /// a value is invalid.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = if path.exists() {
            std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                path: path.to_owned(),
                source,
            })?
        } else {
            tracing::info!(path = %path.display(), "no configuration file, using defaults");
            String::new()
        };
        let lookup = |name: &str| std::env::var(name).ok();
        let mut config = Self::parse(&content, lookup)?;
        config.apply_env(lookup);
        config.validate()?;
        Ok(config)
    }

    /// Parses TOML after expanding `$VAR` references through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] on invalid TOML.
    pub fn parse(content: &str, lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let expanded = expand_env_vars(content, lookup);
        Ok(toml::from_str(&expanded)?)
    }

    /// Applies `HOST`, `PORT` and `SOLANA_RPC_*` overrides.
    ///
    /// Values that do not parse are ignored.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(host) = lookup("HOST").and_then(|h| h.parse().ok()) {
            self.host = host;
        }
        if let Some(port) = lookup("PORT").and_then(|p| p.parse().ok()) {
            self.port = port;
        }
        for network in SolanaNetwork::ALL {
            let suffix = rpc_env_suffix(network);
            let rpc_url = lookup(&format!("NEXT_PUBLIC_SOLANA_RPC_{suffix}"))
                .or_else(|| lookup(&format!("SOLANA_RPC_{suffix}")))
                .filter(|url| !url.is_empty());
            if let Some(rpc_url) = rpc_url {
                self.networks
                    .entry(network.as_str().to_owned())
                    .or_default()
                    .rpc_url = Some(rpc_url);
            }
        }
    }

    /// Checks values that cannot be validated by deserialization alone.
    ///
    /// # Errors
    ///
    /// Returns the first invalid value found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        MoneyAmount::parse(&self.price)?;
        self.recipient_pubkey()?;
        for name in self.networks.keys() {
            SolanaNetwork::from_str(name)?;
        }
        Ok(())
    }

    /// The socket address to bind.
    #[must_use]
    pub const fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    fn recipient_pubkey(&self) -> Result<Pubkey, ConfigError> {
        Pubkey::from_str(&self.recipient)
            .map_err(|_| ConfigError::InvalidRecipient(self.recipient.clone()))
    }

    /// Builds the network table from defaults and configured overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for an invalid recipient or unknown cluster.
    pub fn network_table(&self) -> Result<NetworkTable, ConfigError> {
        let mut table = NetworkTable::new(self.recipient_pubkey()?);
        for (name, entry) in &self.networks {
            let network = SolanaNetwork::from_str(name)?;
            if let Some(rpc_url) = &entry.rpc_url {
                table = table.with_rpc_url(network, rpc_url.clone());
            }
        }
        Ok(table)
    }
}

const fn rpc_env_suffix(network: SolanaNetwork) -> &'static str {
    match network {
        SolanaNetwork::MainnetBeta => "MAINNET",
        SolanaNetwork::Devnet => "DEVNET",
        SolanaNetwork::Testnet => "TESTNET",
    }
}

/// Expands `$VAR` and `${VAR}` patterns through `lookup`.
///
/// Unresolved variables are left as-is.
fn expand_env_vars(input: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '$' {
            result.push(ch);
            continue;
        }
        let braced = chars.next_if_eq(&'{').is_some();

        let mut var_name = String::new();
        let mut closed = false;
        while let Some(&c) = chars.peek() {
            if braced {
                if c == '}' {
                    chars.next();
                    closed = true;
                    break;
                }
            } else if !c.is_ascii_alphanumeric() && c != '_' {
                break;
            }
            var_name.push(c);
            chars.next();
        }

        match lookup(&var_name).filter(|_| !var_name.is_empty()) {
            Some(value) => result.push_str(&value),
            None => {
                result.push('$');
                if braced {
                    result.push('{');
                }
                result.push_str(&var_name);
                if closed {
                    result.push('}');
                }
            }
        }
    }

    result
}
