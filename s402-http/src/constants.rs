//! HTTP-specific constants for the x402 protocol.

/// Header carrying the base64 JSON payment payload (client → server).
pub const X_PAYMENT_HEADER: &str = "X-PAYMENT";

/// Header carrying the base64 JSON settlement receipt (server → client).
pub const X_PAYMENT_RESPONSE_HEADER: &str = "X-PAYMENT-RESPONSE";

/// Header flagging a 402 response as an x402 payment request.
pub const X_PAYMENT_REQUIRED_HEADER: &str = "X-Payment-Required";

/// Header a client may use to pick the cluster of a demo resource.
pub const X_NETWORK_HEADER: &str = "X-Network";
