//! TLS client configuration for observational scanning.

use std::sync::Arc;

use rustls::crypto::ring::default_provider;
use rustls::ClientConfig;

use crate::error_handling::InitializationError;
use crate::handshake::AcceptAnyServerCert;

/// Builds the shared `rustls` client configuration.
///
/// Peer certificate verification is disabled: the scanner must complete
/// handshakes with expired, self-signed or otherwise untrusted servers. SNI
/// stays enabled (the `rustls` default) because many hosts select their
/// certificate by server name.
///
/// Supports TLS 1.2 and TLS 1.3.
///
/// # Errors
///
/// Returns `InitializationError::TlsConfigError` if the provider rejects the
/// protocol versions.
pub fn init_tls_config() -> Result<Arc<ClientConfig>, InitializationError> {
    let provider = Arc::new(default_provider());
    let verifier = Arc::new(AcceptAnyServerCert::new(Arc::clone(&provider)));

    let mut config = ClientConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()?
        .dangerous()
        .with_custom_certificate_verifier(verifier)
        .with_no_client_auth();
    config.enable_sni = true;

    Ok(Arc::new(config))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_tls_config_enables_sni() {
        let config = init_tls_config().expect("TLS config should build");
        assert!(config.enable_sni);
    }
}
