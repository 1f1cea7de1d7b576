//! Payment requirements for the Solana "exact" scheme.
//!
//! A [`SolanaPriceTag`] is the route-level pricing configuration: a
//! human-readable price on one wire network. It is resolved against the
//! [`NetworkTable`] into concrete [`PaymentRequirements`] for every request.

use s402::amount::MoneyAmount;
use s402::proto::v1::{
    DEFAULT_MAX_TIMEOUT_SECONDS, DEFAULT_MIME_TYPE, EXACT_SCHEME, PaymentRequirements,
};
use serde::{Deserialize, Serialize};
use solana_pubkey::Pubkey;
use std::str::FromStr;

use super::{RequirementsError, SupportedPaymentKindExtra};
use crate::networks::{NetworkTable, SolanaNetwork};

/// Price of a protected route.
///
/// # Example
///
/// ```
/// use s402_svm::exact::SolanaPriceTag;
/// use s402_svm::NetworkTable;
///
/// let tag = SolanaPriceTag::new("solana-devnet", "$0.01").with_description("Gatya draw");
/// let requirements = tag
///     .requirements(&NetworkTable::default(), "https://api.example.com/api/gatya")
///     .unwrap();
/// assert_eq!(requirements.max_amount_required, "10000");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolanaPriceTag {
    /// Wire network name (`solana` or `solana-devnet`).
    pub network: String,
    /// Human-readable price such as `"$0.01"`.
    pub price: String,
    /// Recipient override; the table's recipient when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pay_to: Option<String>,
    /// Description shown to the payer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// MIME type of the protected resource.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    /// Cluster to settle on when the wire name is shared by several.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster: Option<SolanaNetwork>,
}

impl SolanaPriceTag {
    /// Creates a price tag for the given wire network.
    pub fn new(network: impl Into<String>, price: impl Into<String>) -> Self {
        Self {
            network: network.into(),
            price: price.into(),
            pay_to: None,
            description: None,
            mime_type: None,
            cluster: None,
        }
    }

    /// Creates a price tag for a cluster, using its wire name.
    ///
    /// Clusters without a wire name of their own are recorded so that the
    /// requirements still settle on them.
    pub fn for_network(network: SolanaNetwork, price: impl Into<String>) -> Self {
        let mut tag = Self::new(network.wire_name(), price);
        tag.cluster = network.shares_wire_name().then_some(network);
        tag
    }

    /// Sets the recipient address.
    #[must_use]
    pub fn with_pay_to(mut self, pay_to: impl Into<String>) -> Self {
        self.pay_to = Some(pay_to.into());
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the MIME type.
    #[must_use]
    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    /// Resolves this tag into requirements for `resource`.
    ///
    /// Deterministic: identical inputs always produce identical output.
    ///
    /// # Errors
    ///
    /// Fails when the network is not a known wire name (or not one the
    /// cluster is advertised under), the price does not parse, or the
    /// recipient is not a valid address.
    pub fn requirements(
        &self,
        table: &NetworkTable,
        resource: &str,
    ) -> Result<PaymentRequirements, RequirementsError> {
        let network = SolanaNetwork::resolve_wire_name(&self.network, self.cluster)
            .ok_or_else(|| RequirementsError::UnknownNetwork(self.network.clone()))?;
        let config = table.get(network);

        let pay_to = match &self.pay_to {
            Some(raw) => Pubkey::from_str(raw)
                .map_err(|_| RequirementsError::InvalidRecipient(raw.clone()))?,
            None => *table.recipient(),
        };

        let amount = MoneyAmount::parse(&self.price)
            .and_then(|money| money.to_token_units(config.decimals))
            .map_err(|source| RequirementsError::InvalidPrice {
                price: self.price.clone(),
                source,
            })?;

        let extra = SupportedPaymentKindExtra {
            fee_payer: pay_to.to_string(),
            cluster: self.cluster,
        };

        Ok(PaymentRequirements {
            scheme: EXACT_SCHEME.to_owned(),
            network: self.network.clone(),
            max_amount_required: amount.to_string(),
            resource: resource.to_owned(),
            description: self.description.clone().unwrap_or_default(),
            mime_type: self
                .mime_type
                .clone()
                .unwrap_or_else(|| DEFAULT_MIME_TYPE.to_owned()),
            output_schema: None,
            pay_to: pay_to.to_string(),
            max_timeout_seconds: DEFAULT_MAX_TIMEOUT_SECONDS,
            asset: config.mint.to_string(),
            extra: serde_json::to_value(extra).ok(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::networks::{DEFAULT_RECIPIENT, USDC_DEVNET, USDC_MAINNET};

    const RESOURCE: &str = "https://api.example.com/api/gatya";

    #[test]
    fn one_cent_on_devnet() {
        let reqs = SolanaPriceTag::new("solana-devnet", "$0.01")
            .requirements(&NetworkTable::default(), RESOURCE)
            .unwrap();
        assert_eq!(reqs.scheme, "exact");
        assert_eq!(reqs.network, "solana-devnet");
        assert_eq!(reqs.max_amount_required, "10000");
        assert_eq!(reqs.asset, USDC_DEVNET.to_string());
        assert_eq!(reqs.pay_to, DEFAULT_RECIPIENT.to_string());
        assert_eq!(reqs.resource, RESOURCE);
        assert_eq!(reqs.mime_type, "application/json");
        assert_eq!(reqs.max_timeout_seconds, 60);
        assert_eq!(
            reqs.extra,
            Some(serde_json::json!({ "feePayer": DEFAULT_RECIPIENT.to_string() }))
        );
    }

    #[test]
    fn mainnet_uses_mainnet_mint() {
        let reqs = SolanaPriceTag::for_network(SolanaNetwork::MainnetBeta, "1.5")
            .requirements(&NetworkTable::default(), RESOURCE)
            .unwrap();
        assert_eq!(reqs.network, "solana");
        assert_eq!(reqs.asset, USDC_MAINNET.to_string());
        assert_eq!(reqs.max_amount_required, "1500000");
    }

    #[test]
    fn testnet_is_advertised_as_devnet() {
        let table = NetworkTable::default().with_network(
            SolanaNetwork::Testnet,
            crate::networks::NetworkConfig {
                rpc_url: "http://127.0.0.1:8899".into(),
                mint: Pubkey::new_from_array([9; 32]),
                decimals: 2,
            },
        );
        let tag = SolanaPriceTag::for_network(SolanaNetwork::Testnet, "$0.01");
        assert_eq!(tag.network, "solana-devnet");
        assert_eq!(tag.cluster, Some(SolanaNetwork::Testnet));

        let reqs = tag.requirements(&table, RESOURCE).unwrap();
        assert_eq!(reqs.network, "solana-devnet");
        assert_eq!(reqs.asset, Pubkey::new_from_array([9; 32]).to_string());
        assert_eq!(reqs.max_amount_required, "1");
        assert_eq!(reqs.extra.unwrap()["cluster"], "testnet");

        let devnet = SolanaPriceTag::for_network(SolanaNetwork::Devnet, "$0.01");
        assert_eq!(devnet.cluster, None);
    }

    #[test]
    fn cluster_must_match_wire_name() {
        let mut tag = SolanaPriceTag::new("solana", "$0.01");
        tag.cluster = Some(SolanaNetwork::Testnet);
        assert!(matches!(
            tag.requirements(&NetworkTable::default(), RESOURCE),
            Err(RequirementsError::UnknownNetwork(name)) if name == "solana"
        ));
    }

    #[test]
    fn sub_unit_prices_truncate() {
        let reqs = SolanaPriceTag::new("solana-devnet", "$0.0000019")
            .requirements(&NetworkTable::default(), RESOURCE)
            .unwrap();
        assert_eq!(reqs.max_amount_required, "1");
    }

    #[test]
    fn deterministic_output() {
        let table = NetworkTable::default();
        let tag = SolanaPriceTag::new("solana-devnet", "$0.25").with_description("Gatya draw");
        let first = serde_json::to_vec(&tag.requirements(&table, RESOURCE).unwrap()).unwrap();
        let second = serde_json::to_vec(&tag.requirements(&table, RESOURCE).unwrap()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn unknown_network_is_an_error() {
        let err = SolanaPriceTag::new("solana-testnet", "$0.01")
            .requirements(&NetworkTable::default(), RESOURCE)
            .unwrap_err();
        assert!(matches!(err, RequirementsError::UnknownNetwork(name) if name == "solana-testnet"));
    }

    #[test]
    fn bad_price_and_recipient() {
        let table = NetworkTable::default();
        assert!(matches!(
            SolanaPriceTag::new("solana", "free").requirements(&table, RESOURCE),
            Err(RequirementsError::InvalidPrice { .. })
        ));
        assert!(matches!(
            SolanaPriceTag::new("solana", "$-1").requirements(&table, RESOURCE),
            Err(RequirementsError::InvalidPrice { .. })
        ));
        assert!(matches!(
            SolanaPriceTag::new("solana", "$1")
                .with_pay_to("not-an-address")
                .requirements(&table, RESOURCE),
            Err(RequirementsError::InvalidRecipient(_))
        ));
    }

    #[test]
    fn survives_json_round_trip() {
        let reqs = SolanaPriceTag::new("solana-devnet", "$0.01")
            .with_description("Gatya draw")
            .requirements(&NetworkTable::default(), RESOURCE)
            .unwrap();
        let json = serde_json::to_string(&reqs).unwrap();
        assert!(json.contains("\"maxAmountRequired\":\"10000\""));
        assert!(json.contains("\"payTo\""));
        let back: PaymentRequirements = serde_json::from_str(&json).unwrap();
        assert_eq!(back, reqs);
    }
}
