//! QUIC endpoint construction.
//!
//! The server authenticates with a PEM certificate/key pair; the client
//! accepts whatever certificate the server presents, matching the
//! development deployment this pairs with: transport encryption without
//! identity verification.

use std::io::BufReader;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use quinn::crypto::rustls::{QuicClientConfig, QuicServerConfig};
use quinn::{ClientConfig, Endpoint, ServerConfig};
use rustls::pki_types::{CertificateDer, PrivateKeyDer};

use crate::error::{Result, StreamError};

/// ALPN token spoken on both ends of the frame stream.
pub const ALPN: &[u8] = b"pointstream";

/// Build a listening server endpoint from PEM certificate and key files.
///
/// Unloadable TLS material is a configuration error; a failed bind is a
/// transport error. Both are fatal at startup.
pub fn server_endpoint(addr: SocketAddr, cert_path: &Path, key_path: &Path) -> Result<Endpoint> {
    let (certs, key) = load_cert_pair(cert_path, key_path)?;

    let mut crypto = rustls::ServerConfig::builder()
        .with_no_client_auth()
        .with_single_cert(certs, key)
        .map_err(|e| StreamError::config(format!("TLS server config: {e}")))?;
    crypto.alpn_protocols = vec![ALPN.to_vec()];

    let quic_crypto = QuicServerConfig::try_from(crypto)
        .map_err(|e| StreamError::config(format!("QUIC server config: {e}")))?;
    let server_config = ServerConfig::with_crypto(Arc::new(quic_crypto));

    Endpoint::server(server_config, addr)
        .map_err(|e| StreamError::transport_with_source(format!("listen on {addr}"), Box::new(e)))
}

/// Build a client endpoint whose certificate verifier accepts any server.
pub fn client_endpoint() -> Result<Endpoint> {
    let mut crypto = rustls::ClientConfig::builder()
        .dangerous()
        .with_custom_certificate_verifier(SkipServerVerification::new())
        .with_no_client_auth();
    crypto.alpn_protocols = vec![ALPN.to_vec()];

    let quic_crypto = QuicClientConfig::try_from(crypto)
        .map_err(|e| StreamError::config(format!("QUIC client config: {e}")))?;

    let bind: SocketAddr = (std::net::Ipv4Addr::UNSPECIFIED, 0).into();
    let mut endpoint = Endpoint::client(bind)
        .map_err(|e| StreamError::transport_with_source("client endpoint bind", Box::new(e)))?;
    endpoint.set_default_client_config(ClientConfig::new(Arc::new(quic_crypto)));
    Ok(endpoint)
}

fn load_cert_pair(
    cert_path: &Path,
    key_path: &Path,
) -> Result<(Vec<CertificateDer<'static>>, PrivateKeyDer<'static>)> {
    let cert_file = std::fs::File::open(cert_path)
        .map_err(|e| StreamError::config(format!("certificate {}: {e}", cert_path.display())))?;
    let certs = rustls_pemfile::certs(&mut BufReader::new(cert_file))
        .collect::<std::io::Result<Vec<_>>>()
        .map_err(|e| StreamError::config(format!("certificate {}: {e}", cert_path.display())))?;
    if certs.is_empty() {
        return Err(StreamError::config(format!(
            "no certificates in {}",
            cert_path.display()
        )));
    }

    let key_file = std::fs::File::open(key_path)
        .map_err(|e| StreamError::config(format!("private key {}: {e}", key_path.display())))?;
    let key = rustls_pemfile::private_key(&mut BufReader::new(key_file))
        .map_err(|e| StreamError::config(format!("private key {}: {e}", key_path.display())))?
        .ok_or_else(|| {
            StreamError::config(format!("no private key in {}", key_path.display()))
        })?;

    Ok((certs, key))
}

/// Certificate verifier that accepts whatever the server presents.
#[derive(Debug)]
struct SkipServerVerification(Arc<rustls::crypto::CryptoProvider>);

impl SkipServerVerification {
    fn new() -> Arc<Self> {
        Arc::new(Self(Arc::new(rustls::crypto::ring::default_provider())))
    }
}

impl rustls::client::danger::ServerCertVerifier for SkipServerVerification {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &rustls::pki_types::ServerName<'_>,
        _ocsp_response: &[u8],
        _now: rustls::pki_types::UnixTime,
    ) -> std::result::Result<rustls::client::danger::ServerCertVerified, rustls::Error> {
        Ok(rustls::client::danger::ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &rustls::DigitallySignedStruct,
    ) -> std::result::Result<rustls::client::danger::HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls12_signature(
            message,
            cert,
            dss,
            &self.0.signature_verification_algorithms,
        )
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &rustls::DigitallySignedStruct,
    ) -> std::result::Result<rustls::client::danger::HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls13_signature(
            message,
            cert,
            dss,
            &self.0.signature_verification_algorithms,
        )
    }

    fn supported_verify_schemes(&self) -> Vec<rustls::SignatureScheme> {
        self.0.signature_verification_algorithms.supported_schemes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_certificate_is_a_configuration_error() {
        let addr: SocketAddr = ([127, 0, 0, 1], 0).into();
        let err = server_endpoint(
            addr,
            Path::new("/nonexistent/cert.pem"),
            Path::new("/nonexistent/key.pem"),
        )
        .unwrap_err();
        assert!(matches!(err, StreamError::Config { .. }));
    }

    #[test]
    fn pem_without_certificates_is_rejected() {
        let dir = tempfile::TempDir::new().unwrap();
        let cert = dir.path().join("empty.pem");
        let key = dir.path().join("key.pem");
        std::fs::write(&cert, "").unwrap();
        std::fs::write(&key, "").unwrap();

        let addr: SocketAddr = ([127, 0, 0, 1], 0).into();
        let err = server_endpoint(addr, &cert, &key).unwrap_err();
        assert!(matches!(err, StreamError::Config { .. }));
    }
}
