// Shared test helpers: certificate chains and local TLS servers.
//
// Every server binds to 127.0.0.1 on an ephemeral port and runs until the
// test's runtime shuts down.

use std::sync::Arc;
use std::time::Duration;

use rcgen::{CertificateParams, DistinguishedName, DnType, KeyPair};
use rustls::pki_types::{CertificateDer, PrivateKeyDer, PrivatePkcs8KeyDer};
use rustls::ServerConfig;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpListener;
use tokio_rustls::TlsAcceptor;

/// A certificate chain (leaf first) plus the leaf's private key.
pub struct TestChain {
    pub certs: Vec<CertificateDer<'static>>,
    pub key: PrivateKeyDer<'static>,
}

/// Subjects of `three_cert_chain`, in order.
#[allow(dead_code)] // Used by other test files
pub const CHAIN_SUBJECTS: [&str; 3] = [
    "CN=localhost,O=Leaf Org,C=US",
    "CN=Test Intermediate CA,O=Test CA,C=BR",
    "CN=Test Root CA,O=Test CA,C=BR",
];

fn self_signed(cn: &str, org: &str, country: &str, san: &str) -> (CertificateDer<'static>, KeyPair) {
    let key_pair = KeyPair::generate().expect("Failed to generate key pair");
    let mut params =
        CertificateParams::new(vec![san.to_string()]).expect("Failed to build certificate params");
    let mut dn = DistinguishedName::new();
    dn.push(DnType::CountryName, country);
    dn.push(DnType::OrganizationName, org);
    dn.push(DnType::CommonName, cn);
    params.distinguished_name = dn;
    let cert = params
        .self_signed(&key_pair)
        .expect("Failed to self-sign certificate");
    (cert.der().clone(), key_pair)
}

/// Leaf for `localhost` followed by two CA certificates.
///
/// The certificates are not signed by each other. The harvester never
/// verifies chains, so only their contents matter.
pub fn three_cert_chain() -> TestChain {
    let (leaf, leaf_key) = self_signed("localhost", "Leaf Org", "US", "localhost");
    let (intermediate, _) = self_signed("Test Intermediate CA", "Test CA", "BR", "ca.test");
    let (root, _) = self_signed("Test Root CA", "Test CA", "BR", "root.test");

    TestChain {
        certs: vec![leaf, intermediate, root],
        key: PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(leaf_key.serialize_der())),
    }
}

fn server_config(chain: &TestChain) -> Arc<ServerConfig> {
    let config = ServerConfig::builder_with_provider(Arc::new(
        rustls::crypto::ring::default_provider(),
    ))
    .with_safe_default_protocol_versions()
    .expect("Failed to select protocol versions")
    .with_no_client_auth()
    .with_single_cert(chain.certs.clone(), chain.key.clone_key())
    .expect("Failed to build server config");
    Arc::new(config)
}

/// Starts a TLS server presenting `chain`. Returns its port.
///
/// `delay` is slept before each handshake so concurrent clients overlap.
#[allow(dead_code)] // Used by other test files
pub async fn spawn_tls_server(chain: &TestChain, delay: Duration) -> u16 {
    let acceptor = TlsAcceptor::from(server_config(chain));
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind TLS server");
    let port = listener.local_addr().expect("local addr").port();

    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            let acceptor = acceptor.clone();
            tokio::spawn(async move {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                if let Ok(mut tls) = acceptor.accept(stream).await {
                    let _ = tls.shutdown().await;
                }
            });
        }
    });

    port
}

/// Starts a server that accepts TCP connections and never answers.
#[allow(dead_code)] // Used by other test files
pub async fn spawn_silent_server() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind silent server");
    let port = listener.local_addr().expect("local addr").port();

    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((stream, _)) = listener.accept().await {
            held.push(stream);
        }
    });

    port
}

/// A port with nothing listening on it.
#[allow(dead_code)] // Used by other test files
pub async fn refused_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind");
    let port = listener.local_addr().expect("local addr").port();
    drop(listener);
    port
}
