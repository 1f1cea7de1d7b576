//! Paywalled "gatya" demo resource.
//!
//! `GET`/`POST /api/gatya` costs one price tag on the network chosen by the
//! `X-Network` header (devnet when absent) and, once paid, draws a message
//! from a weighted table.

use std::sync::Arc;

use axum::{Extension, Json};
use axum::http::{HeaderMap, Uri};
use axum::routing::get;
use rand::{RngExt, rng};
use s402::facilitator::Facilitator;
use s402::proto::SettleResponse;
use s402_http::constants::X_NETWORK_HEADER;
use s402_http::server::X402Middleware;
use s402_svm::exact::SolanaPriceTag;
use s402_svm::{NetworkTable, SolanaNetwork};
use serde::Serialize;
use url::Url;

/// Description advertised in the demo's payment requirements.
pub const GATYA_DESCRIPTION: &str = "Gatya draw";

/// Rarity tier of a drawn message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Rarity {
    /// 80% of draws.
    Common,
    /// 15% of draws.
    Rare,
    /// 5% of draws.
    SuperRare,
}

impl Rarity {
    /// Picks a tier from a roll in `0..100`.
    #[must_use]
    pub const fn from_roll(roll: u32) -> Self {
        match roll {
            0..5 => Self::SuperRare,
            5..20 => Self::Rare,
            _ => Self::Common,
        }
    }

    fn messages(self) -> &'static [GatyaMessage] {
        match self {
            Self::Common => COMMON,
            Self::Rare => RARE,
            Self::SuperRare => SUPER_RARE,
        }
    }
}

/// One entry of the message table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GatyaMessage {
    /// Stable identifier, unique across tiers.
    pub id: u32,
    /// Tier the message belongs to.
    pub rarity: Rarity,
    /// Text shown to the buyer.
    pub message: &'static str,
    /// Decoration shown next to the text.
    pub emoji: &'static str,
}

const fn common(id: u32, message: &'static str, emoji: &'static str) -> GatyaMessage {
    GatyaMessage {
        id,
        rarity: Rarity::Common,
        message,
        emoji,
    }
}

const fn rare(id: u32, message: &'static str, emoji: &'static str) -> GatyaMessage {
    GatyaMessage {
        id,
        rarity: Rarity::Rare,
        message,
        emoji,
    }
}

const fn super_rare(id: u32, message: &'static str, emoji: &'static str) -> GatyaMessage {
    GatyaMessage {
        id,
        rarity: Rarity::SuperRare,
        message,
        emoji,
    }
}

static COMMON: &[GatyaMessage] = &[
    common(1, "Welcome to the world of Solana!", "👋"),
    common(2, "Have an amazing day ahead!", "☀️"),
    common(3, "Your blockchain journey begins now", "🚀"),
    common(4, "Web3 adventurer, march forward!", "⚔️"),
    common(5, "Sail the digital ocean", "⛵"),
    common(6, "Code is poetry, blockchain is music", "🎵"),
    common(7, "Chasing the dream of decentralization", "💫"),
    common(8, "Transaction successful!", "✅"),
    common(9, "Solana is fast, and so are you!", "⚡"),
    common(10, "Experience the 400ms miracle", "⏱️"),
    common(11, "Low gas fees are beautiful", "💰"),
    common(12, "Dive into the NFT world!", "🎨"),
    common(13, "First step to becoming a DeFi master", "📈"),
    common(14, "HODL with conviction", "💎"),
    common(15, "Stake and earn", "🥩"),
    common(16, "Thanks to validators!", "🙏"),
    common(17, "Consensus is beautiful", "🤝"),
    common(18, "The magic of smart contracts", "✨"),
    common(19, "Trust built with Rust", "🦀"),
    common(20, "On-chain truth", "📜"),
    common(21, "Guard your wallet", "👛"),
    common(22, "Keep your seed phrase secret", "🤫"),
    common(23, "Join a DAO today", "🏛️"),
    common(24, "Power of governance tokens", "🗳️"),
    common(25, "Yield farming in progress", "🌾"),
    common(26, "Provide liquidity", "💧"),
    common(27, "Understand how AMMs work", "🔄"),
    common(28, "Watch out for impermanent loss", "⚠️"),
    common(29, "Bridge your assets", "🌉"),
    common(30, "The era of multichain", "🔗"),
    common(31, "Solana: King of Layer 1", "👑"),
    common(32, "TPS makes the difference", "📊"),
    common(33, "Innovation of Proof of History", "📚"),
    common(34, "Security of Tower BFT", "🏰"),
    common(35, "Trust in the cluster", "🌐"),
    common(36, "Hoping for an airdrop", "🪂"),
    common(37, "First come, first mint", "🏃"),
    common(38, "Check the floor price", "📉"),
    common(39, "Seeking rarity", "🔍"),
    common(40, "Joy of a collector", "🖼️"),
    common(41, "Time to change your PFP", "🐵"),
    common(42, "See you in the metaverse", "🌌"),
    common(43, "The age of Play to Earn", "🎮"),
    common(44, "Move to Earn for health", "🏃‍♂️"),
    common(45, "Potential of Social-Fi", "👥"),
    common(46, "Long live the creator economy", "🎭"),
    common(47, "Earn your royalties", "💸"),
    common(48, "To the secondary market", "🏪"),
    common(49, "Win at auction", "🔨"),
    common(50, "Dutch auction starting!", "🇳🇱"),
    common(51, "Whitelist secured!", "📝"),
    common(52, "Earn the OG title", "🏅"),
    common(53, "Gather intel on Discord", "💬"),
    common(54, "Hunt alpha on Twitter", "🐦"),
    common(55, "Always DYOR", "🔬"),
    common(56, "NFA - Not Financial Advice", "📢"),
    common(57, "Beware of rug pulls", "🚨"),
    common(58, "Audits matter", "🔒"),
    common(59, "Hardware wallet recommended", "🔐"),
    common(60, "Watch out for phishing!", "🎣"),
    common(61, "Always verify the URL", "🔗"),
    common(62, "Practice on testnet", "🧪"),
    common(63, "Get devnet SOL", "🚰"),
    common(64, "Faucets are your friend", "💦"),
    common(65, "Support the builders", "👷"),
    common(66, "Power of open source", "📖"),
    common(67, "Star it on GitHub", "⭐"),
    common(68, "Start contributing", "🤲"),
    common(69, "Join a hackathon!", "💻"),
    common(70, "Win that grant", "🎁"),
    common(71, "Grow the ecosystem", "🌱"),
    common(72, "Power of community", "🤜🤛"),
    common(73, "Network at meetups", "🍻"),
    common(74, "Learn at conferences", "🎤"),
    common(75, "Join a workshop", "📝"),
    common(76, "Complete that tutorial", "🏁"),
    common(77, "Read the docs", "📄"),
    common(78, "Build with Anchor", "⚓"),
    common(79, "Write in TypeScript", "📘"),
    common(80, "Keep building!", "🔨"),
];

static RARE: &[GatyaMessage] = &[
    rare(81, "Grateful for this rare encounter!", "💎"),
    rare(82, "You are the chosen one!", "⭐"),
    rare(83, "The gears of fate are turning", "⚙️"),
    rare(84, "Child of the blockchain", "👶"),
    rare(85, "You have the power to shape the future", "🔮"),
    rare(86, "Digital gold acquired", "🥇"),
    rare(87, "Path to becoming a whale unlocked", "🐋"),
    rare(88, "You have alpha hunter potential", "🎯"),
    rare(89, "Diamond hands confirmed", "💎🙌"),
    rare(90, "Find the next unicorn", "🦄"),
    rare(91, "Be a metaverse pioneer", "🌠"),
    rare(92, "Proof of Web3 native", "🎖️"),
    rare(93, "Tokenomics master", "📊"),
    rare(94, "On-chain explorer", "🗺️"),
    rare(95, "Protocol whisperer", "🧠"),
];

static SUPER_RARE: &[GatyaMessage] = &[
    super_rare(96, "Legendary hero, time to awaken!", "🔥"),
    super_rare(97, "The gods have blessed you!", "👑"),
    super_rare(98, "Etch your name in blockchain mythology", "📜"),
    super_rare(99, "Successor of Satoshi's will", "🌟"),
    super_rare(100, "Ultimate decentralization, ultimate freedom", "🦅"),
];

/// Draws from a tier roll in `0..100` and an index roll reduced into the tier.
#[must_use]
pub fn draw_with(tier_roll: u32, index_roll: usize) -> GatyaMessage {
    let messages = Rarity::from_roll(tier_roll).messages();
    messages[index_roll % messages.len()]
}

/// Draws a message with the thread-local RNG.
#[must_use]
pub fn draw() -> GatyaMessage {
    let mut rng = rng();
    draw_with(rng.random_range(0..100), rng.random_range(0..usize::MAX))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GatyaResponse {
    success: bool,
    result: GatyaMessage,
    #[serde(skip_serializing_if = "Option::is_none")]
    transaction_signature: Option<String>,
}

/// Paid handler: runs only after settlement succeeded.
async fn gatya(settlement: Option<Extension<SettleResponse>>) -> Json<GatyaResponse> {
    let transaction_signature = match settlement {
        Some(Extension(SettleResponse::Success { transaction, .. })) => Some(transaction),
        _ => None,
    };
    let result = draw();
    tracing::info!(id = result.id, rarity = ?result.rarity, "gatya drawn");
    Json(GatyaResponse {
        success: true,
        result,
        transaction_signature,
    })
}

/// Builds the `/api/gatya` router behind the payment gate.
///
/// The price tag is resolved per request so the buyer can choose the
/// network through `X-Network`.
pub fn demo_router<F>(
    facilitator: F,
    table: Arc<NetworkTable>,
    price: String,
    base_url: Option<Url>,
) -> axum::Router
where
    F: Facilitator + Clone + Send + Sync + 'static,
{
    let mut x402 = X402Middleware::new(facilitator, table);
    if let Some(base_url) = base_url {
        x402 = x402.with_base_url(base_url);
    }
    let paywall = x402
        .with_dynamic_route(move |headers: &HeaderMap, _uri: &Uri| {
            let network = SolanaNetwork::from_hint(
                headers.get(X_NETWORK_HEADER).and_then(|v| v.to_str().ok()),
            );
            let tag = SolanaPriceTag::for_network(network, price.clone());
            async move { tag }
        })
        .with_description(GATYA_DESCRIPTION);

    axum::Router::new().route("/api/gatya", get(gatya).post(gatya).layer(paywall))
}
