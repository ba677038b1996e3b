//! Inbound wallet URI dispatch.
//!
//! QR scans and deep links deliver the same strings; dispatch is purely
//! on the scheme prefix, so the two entry points share one parser.

use crate::error::SessionError;

/// A scanned or deep-linked URI, classified by protocol.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WalletUri {
    /// `wc:` — WalletConnect pairing URI, handed to the relay.
    WalletConnect(String),
    /// `esr:` / `esr-anchor:` — compressed Antelope signing request.
    SigningRequest(String),
    /// `did:` — identity connect; recognized and routed to the host
    /// app, not a session protocol here.
    Did(String),
}

impl WalletUri {
    pub fn parse(uri: &str) -> Result<Self, SessionError> {
        let trimmed = uri.trim();
        if trimmed.starts_with("wc:") {
            Ok(WalletUri::WalletConnect(trimmed.to_string()))
        } else if trimmed.starts_with("esr:") || trimmed.starts_with("esr-anchor:") {
            Ok(WalletUri::SigningRequest(trimmed.to_string()))
        } else if trimmed.starts_with("did:") {
            Ok(WalletUri::Did(trimmed.to_string()))
        } else {
            Err(SessionError::UnrecognizedUri(
                trimmed.chars().take(32).collect(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schemes_dispatch_by_prefix() {
        assert_eq!(
            WalletUri::parse("wc:topic@2?relay-protocol=irn&symKey=ab").unwrap(),
            WalletUri::WalletConnect("wc:topic@2?relay-protocol=irn&symKey=ab".to_string())
        );
        assert!(matches!(
            WalletUri::parse("esr:gmNgZGA").unwrap(),
            WalletUri::SigningRequest(_)
        ));
        assert!(matches!(
            WalletUri::parse("esr-anchor:gmNgZGA").unwrap(),
            WalletUri::SigningRequest(_)
        ));
        assert!(matches!(
            WalletUri::parse("did:antelope:pangea:alice").unwrap(),
            WalletUri::Did(_)
        ));
    }

    #[test]
    fn surrounding_whitespace_is_tolerated() {
        assert!(matches!(
            WalletUri::parse("  wc:topic@2  ").unwrap(),
            WalletUri::WalletConnect(uri) if uri == "wc:topic@2"
        ));
    }

    #[test]
    fn unknown_schemes_are_rejected() {
        assert!(matches!(
            WalletUri::parse("https://example.com"),
            Err(SessionError::UnrecognizedUri(_))
        ));
        assert!(matches!(
            WalletUri::parse(""),
            Err(SessionError::UnrecognizedUri(_))
        ));
    }
}
