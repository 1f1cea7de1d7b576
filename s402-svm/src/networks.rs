//! Solana networks, their x402 wire names, and the per-network configuration table.
//!
//! Internally there are three clusters ([`SolanaNetwork`]). On the wire only
//! two names exist: `"solana"` for mainnet-beta and `"solana-devnet"` for the
//! test clusters. Testnet shares devnet's USDC mint and is advertised under
//! the devnet wire name; requirements built for testnet name the cluster in
//! their `extra` so that settlement reaches the testnet endpoint.
//!
//! [`NetworkTable`] is built once at startup and shared read-only afterwards.

use serde::{Deserialize, Serialize};
use solana_pubkey::{Pubkey, pubkey};
use std::fmt;
use std::str::FromStr;

/// Wire name for Solana mainnet-beta.
pub const WIRE_SOLANA: &str = "solana";

/// Wire name for the Solana test clusters.
pub const WIRE_SOLANA_DEVNET: &str = "solana-devnet";

/// USDC mint on mainnet-beta.
// https://solscan.io/token/EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v
pub const USDC_MAINNET: Pubkey = pubkey!("EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v");

/// Circle's test USDC mint, used on devnet and testnet.
// https://explorer.solana.com/address/4zMMC9srt5Ri5X14GAgXhaHii3GnPAEERYPJgZJDncDU?cluster=devnet
pub const USDC_DEVNET: Pubkey = pubkey!("4zMMC9srt5Ri5X14GAgXhaHii3GnPAEERYPJgZJDncDU");

/// Decimal places of USDC on every cluster.
pub const USDC_DECIMALS: u8 = 6;

/// Recipient used when none is configured.
pub const DEFAULT_RECIPIENT: Pubkey = pubkey!("DE3nhgFvCa7MryXjcdtMyo8m9y7Vnzn4gHSmjNGzgtyp");

/// A Solana cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SolanaNetwork {
    /// Production cluster.
    MainnetBeta,
    /// Public development cluster.
    Devnet,
    /// Validator test cluster.
    Testnet,
}

/// The name does not denote a known Solana cluster.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown Solana network: {0}")]
pub struct UnknownNetwork(pub String);

impl SolanaNetwork {
    /// Every supported cluster.
    pub const ALL: [Self; 3] = [Self::MainnetBeta, Self::Devnet, Self::Testnet];

    /// Returns the internal cluster name (`mainnet-beta`, `devnet`, `testnet`).
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::MainnetBeta => "mainnet-beta",
            Self::Devnet => "devnet",
            Self::Testnet => "testnet",
        }
    }

    /// Returns the x402 wire name for this cluster.
    #[must_use]
    pub const fn wire_name(&self) -> &'static str {
        match self {
            Self::MainnetBeta => WIRE_SOLANA,
            Self::Devnet | Self::Testnet => WIRE_SOLANA_DEVNET,
        }
    }

    /// Resolves an x402 wire name.
    ///
    /// Only `"solana"` and `"solana-devnet"` are accepted; anything else is
    /// not a protocol-level network.
    #[must_use]
    pub fn from_wire_name(name: &str) -> Option<Self> {
        match name {
            WIRE_SOLANA => Some(Self::MainnetBeta),
            WIRE_SOLANA_DEVNET => Some(Self::Devnet),
            _ => None,
        }
    }

    /// Resolves a wire name, narrowed to `cluster` when one is given.
    ///
    /// The cluster must be advertised under `name`: `("solana-devnet",
    /// Some(Testnet))` is testnet, `("solana", Some(Testnet))` is rejected.
    #[must_use]
    pub fn resolve_wire_name(name: &str, cluster: Option<Self>) -> Option<Self> {
        let default = Self::from_wire_name(name)?;
        match cluster {
            None => Some(default),
            Some(cluster) if cluster.wire_name() == name => Some(cluster),
            Some(_) => None,
        }
    }

    /// Whether the wire name alone does not identify this cluster.
    #[must_use]
    pub fn shares_wire_name(&self) -> bool {
        Self::from_wire_name(self.wire_name()) != Some(*self)
    }

    /// Parses a user-supplied network hint, defaulting to devnet.
    ///
    /// Accepts internal names with or without a `solana-` prefix, and
    /// `mainnet` as an alias for mainnet-beta.
    #[must_use]
    pub fn from_hint(hint: Option<&str>) -> Self {
        hint.and_then(|raw| {
            let name = raw.trim();
            let name = name.strip_prefix("solana-").unwrap_or(name);
            match name {
                "mainnet" => Some(Self::MainnetBeta),
                other => other.parse().ok(),
            }
        })
        .unwrap_or(Self::Devnet)
    }

    /// Public RPC endpoint operated by Solana Labs for this cluster.
    #[must_use]
    pub const fn default_rpc_url(&self) -> &'static str {
        match self {
            Self::MainnetBeta => "https://api.mainnet-beta.solana.com",
            Self::Devnet => "https://api.devnet.solana.com",
            Self::Testnet => "https://api.testnet.solana.com",
        }
    }

    /// USDC mint on this cluster.
    #[must_use]
    pub const fn usdc_mint(&self) -> Pubkey {
        match self {
            Self::MainnetBeta => USDC_MAINNET,
            Self::Devnet | Self::Testnet => USDC_DEVNET,
        }
    }
}

impl fmt::Display for SolanaNetwork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SolanaNetwork {
    type Err = UnknownNetwork;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mainnet-beta" => Ok(Self::MainnetBeta),
            "devnet" => Ok(Self::Devnet),
            "testnet" => Ok(Self::Testnet),
            other => Err(UnknownNetwork(other.to_owned())),
        }
    }
}

/// Per-cluster settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkConfig {
    /// JSON-RPC endpoint used for transaction submission.
    pub rpc_url: String,
    /// The token mint payments must be made in.
    pub mint: Pubkey,
    /// Decimal places of the mint.
    pub decimals: u8,
}

impl NetworkConfig {
    /// Public endpoint and USDC for the given cluster.
    #[must_use]
    pub fn defaults_for(network: SolanaNetwork) -> Self {
        Self {
            rpc_url: network.default_rpc_url().to_owned(),
            mint: network.usdc_mint(),
            decimals: USDC_DECIMALS,
        }
    }
}

/// Immutable per-deployment configuration: recipient plus one
/// [`NetworkConfig`] per cluster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkTable {
    recipient: Pubkey,
    mainnet_beta: NetworkConfig,
    devnet: NetworkConfig,
    testnet: NetworkConfig,
}

impl Default for NetworkTable {
    fn default() -> Self {
        Self::new(DEFAULT_RECIPIENT)
    }
}

impl NetworkTable {
    /// Builds a table with public endpoints and USDC on every cluster.
    #[must_use]
    pub fn new(recipient: Pubkey) -> Self {
        Self {
            recipient,
            mainnet_beta: NetworkConfig::defaults_for(SolanaNetwork::MainnetBeta),
            devnet: NetworkConfig::defaults_for(SolanaNetwork::Devnet),
            testnet: NetworkConfig::defaults_for(SolanaNetwork::Testnet),
        }
    }

    /// Replaces the RPC endpoint of one cluster.
    #[must_use]
    pub fn with_rpc_url(mut self, network: SolanaNetwork, rpc_url: impl Into<String>) -> Self {
        self.slot_mut(network).rpc_url = rpc_url.into();
        self
    }

    /// Replaces the settings of one cluster.
    #[must_use]
    pub fn with_network(mut self, network: SolanaNetwork, config: NetworkConfig) -> Self {
        *self.slot_mut(network) = config;
        self
    }

    /// The address payments are made out to.
    #[must_use]
    pub const fn recipient(&self) -> &Pubkey {
        &self.recipient
    }

    /// Settings for a cluster.
    #[must_use]
    pub const fn get(&self, network: SolanaNetwork) -> &NetworkConfig {
        match network {
            SolanaNetwork::MainnetBeta => &self.mainnet_beta,
            SolanaNetwork::Devnet => &self.devnet,
            SolanaNetwork::Testnet => &self.testnet,
        }
    }

    /// Iterates over every cluster with its settings.
    pub fn iter(&self) -> impl Iterator<Item = (SolanaNetwork, &NetworkConfig)> {
        SolanaNetwork::ALL
            .into_iter()
            .map(move |network| (network, self.get(network)))
    }

    const fn slot_mut(&mut self, network: SolanaNetwork) -> &mut NetworkConfig {
        match network {
            SolanaNetwork::MainnetBeta => &mut self.mainnet_beta,
            SolanaNetwork::Devnet => &mut self.devnet,
            SolanaNetwork::Testnet => &mut self.testnet,
        }
    }
}
