//! Protocol implementations.
//!
//! Only WHOIS is spoken here; the module keeps the wire handling apart from
//! the batching and referral logic in the client.

/// WHOIS protocol implementation
pub mod whois;

pub use whois::{decode_response, extract_referral, WhoisTransport};
