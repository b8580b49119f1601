//! Connection management
//!
//! TCP connect with socket tuning, implicit TLS, in-band TLS upgrade, greeting
//! validation and close.

use std::sync::Arc;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_rustls::TlsConnector;
use tokio_rustls::client::TlsStream;
use tokio_rustls::rustls::client::danger::{
    HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier,
};
use tokio_rustls::rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use tokio_rustls::rustls::{ClientConfig, DigitallySignedStruct, RootCertStore, SignatureScheme};
use tracing::{debug, warn};

use super::Session;
use super::state::{AuthState, LifecycleState, TransportState};
use super::stream::MailStream;
use crate::config::{ServerConfig, TlsMode};
use crate::error::{MailError, Result};
use crate::response::Dialect;
use crate::transcript::{Transcript, TranscriptEvent, default_transcript};

/// Certificate verifier that accepts every certificate
///
/// **Security Warning:** Only used when `allow_insecure_tls` is set. It
/// disables all certificate validation.
#[derive(Debug)]
struct DangerousAcceptAnyCertificate;

impl ServerCertVerifier for DangerousAcceptAnyCertificate {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> std::result::Result<ServerCertVerified, tokio_rustls::rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, tokio_rustls::rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn verify_tls13_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, tokio_rustls::rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        vec![
            SignatureScheme::RSA_PKCS1_SHA256,
            SignatureScheme::RSA_PKCS1_SHA384,
            SignatureScheme::RSA_PKCS1_SHA512,
            SignatureScheme::ECDSA_NISTP256_SHA256,
            SignatureScheme::ECDSA_NISTP384_SHA384,
            SignatureScheme::ECDSA_NISTP521_SHA512,
            SignatureScheme::RSA_PSS_SHA256,
            SignatureScheme::RSA_PSS_SHA384,
            SignatureScheme::RSA_PSS_SHA512,
            SignatureScheme::ED25519,
            SignatureScheme::ED448,
        ]
    }
}

/// Build a TLS connector, validating against webpki roots unless insecure
fn tls_connector(allow_insecure_tls: bool) -> TlsConnector {
    use tokio_rustls::rustls::crypto::{CryptoProvider, ring};
    let _ = CryptoProvider::install_default(ring::default_provider());

    let tls_config = if allow_insecure_tls {
        warn!("TLS certificate validation disabled - connection vulnerable to MITM attacks");
        ClientConfig::builder()
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(DangerousAcceptAnyCertificate))
            .with_no_client_auth()
    } else {
        let mut root_store = RootCertStore::empty();
        root_store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
        ClientConfig::builder()
            .with_root_certificates(root_store)
            .with_no_client_auth()
    };

    TlsConnector::from(Arc::new(tls_config))
}

async fn tls_handshake(
    host: &str,
    tcp: TcpStream,
    allow_insecure_tls: bool,
    limit: Duration,
) -> Result<TlsStream<TcpStream>> {
    let connector = tls_connector(allow_insecure_tls);
    let server_name = ServerName::try_from(host)
        .map_err(|e| MailError::Tls(format!("Invalid domain: {}", e)))?
        .to_owned();

    timeout(limit, connector.connect(server_name, tcp))
        .await
        .map_err(|_| MailError::Timeout)?
        .map_err(|e| MailError::Tls(format!("TLS handshake failed: {}", e)))
}

/// Resolve and connect with TCP_NODELAY set
async fn open_tcp(host: &str, port: u16, limit: Duration) -> Result<TcpStream> {
    use socket2::{Domain, Protocol, Socket, Type};

    let socket_addr = tokio::net::lookup_host((host, port))
        .await
        .map_err(|e| MailError::Connect(format!("Failed to resolve {}: {}", host, e)))?
        .next()
        .ok_or_else(|| MailError::Connect(format!("No address resolved for {}", host)))?;

    let domain = if socket_addr.is_ipv4() {
        Domain::IPV4
    } else {
        Domain::IPV6
    };
    let socket = Socket::new(domain, Type::STREAM, Some(Protocol::TCP))
        .map_err(|e| MailError::Connect(format!("socket: {}", e)))?;

    // Request/response traffic: send short command lines immediately
    socket
        .set_nodelay(true)
        .map_err(|e| MailError::Connect(format!("TCP_NODELAY: {}", e)))?;

    // socket2::Socket::connect() is blocking; connect before going non-blocking
    let tcp_stream = timeout(
        limit,
        tokio::task::spawn_blocking(move || -> std::io::Result<std::net::TcpStream> {
            socket.connect(&socket_addr.into())?;
            socket.set_nonblocking(true)?;
            Ok(socket.into())
        }),
    )
    .await
    .map_err(|_| MailError::Timeout)?
    .map_err(|e| MailError::Connect(format!("Task join error: {}", e)))?
    .map_err(|e| MailError::Connect(format!("{}:{}: {}", host, port, e)))?;

    TcpStream::from_std(tcp_stream).map_err(MailError::Io)
}

impl Session {
    /// Connect and read the greeting, logging through `tracing`
    ///
    /// See [`connect_with_transcript`](Self::connect_with_transcript).
    pub async fn connect(config: &ServerConfig, dialect: Dialect) -> Result<Self> {
        Self::connect_with_transcript(config, dialect, default_transcript()).await
    }

    /// Connect to the server and read its greeting
    ///
    /// With [`TlsMode::Implicit`] the TLS handshake completes before the
    /// greeting is read. With [`TlsMode::None`] and [`TlsMode::StartTls`] the
    /// greeting arrives in cleartext; the dialect client performs the upgrade.
    /// Exactly one reply (the greeting) is consumed before returning.
    ///
    /// # Errors
    ///
    /// - [`MailError::Connect`] - DNS resolution or TCP connect failed
    /// - [`MailError::Tls`] - implicit TLS handshake failed
    /// - [`MailError::Timeout`] - connect, handshake or greeting timed out
    /// - [`MailError::Protocol`] - the greeting was negative
    pub async fn connect_with_transcript(
        config: &ServerConfig,
        dialect: Dialect,
        transcript: Arc<dyn Transcript>,
    ) -> Result<Self> {
        debug!(
            "Connecting to {}:{} ({:?}, {:?})",
            config.host, config.port, dialect, config.tls_mode
        );

        let tcp = match open_tcp(&config.host, config.port, config.connect_timeout).await {
            Ok(tcp) => tcp,
            Err(e) => {
                transcript.record(&TranscriptEvent::Error(e.to_string()));
                return Err(e);
            }
        };

        let (stream, transport) = if config.tls_mode == TlsMode::Implicit {
            match tls_handshake(
                &config.host,
                tcp,
                config.allow_insecure_tls,
                config.connect_timeout,
            )
            .await
            {
                Ok(tls) => (MailStream::Tls(Box::new(tls)), TransportState::Tls),
                Err(e) => {
                    transcript.record(&TranscriptEvent::Error(e.to_string()));
                    return Err(e);
                }
            }
        } else {
            (MailStream::Plain(tcp), TransportState::Plain)
        };

        let mut session = Self {
            host: config.host.clone(),
            port: config.port,
            dialect,
            stream,
            pending: Vec::with_capacity(4096),
            lifecycle: LifecycleState::New,
            transport,
            auth: AuthState::Unauthenticated,
            read_timeout: config.read_timeout,
            connect_timeout: config.connect_timeout,
            allow_insecure_tls: config.allow_insecure_tls,
            greeting: String::new(),
            transcript,
        };
        session.record(TranscriptEvent::Connected {
            host: session.host.clone(),
            port: session.port,
        });

        let greeting = session.read_single_line().await?;
        debug!("Server greeting: {}", greeting.line);
        if greeting.is_negative() {
            let error = MailError::protocol("greeting", greeting.line);
            session.abort(&error);
            return Err(error);
        }

        session.greeting = greeting.line;
        session.lifecycle = LifecycleState::Connected;
        Ok(session)
    }

    /// Wrap the existing cleartext stream in TLS
    ///
    /// Valid once, from the connected plaintext state, after the server
    /// accepted `STARTTLS`/`STLS`. Use [`start_tls`](Self::start_tls) to send
    /// the command and upgrade in one step.
    ///
    /// # Errors
    ///
    /// - [`MailError::InvalidState`] - the session is not connected, or the
    ///   stream is already encrypted
    /// - [`MailError::TlsUpgrade`] - the server sent data after accepting the
    ///   upgrade (the session is closed)
    /// - [`MailError::Tls`] - the handshake failed (the session is closed)
    pub async fn upgrade_to_tls(&mut self) -> Result<()> {
        if self.lifecycle != LifecycleState::Connected {
            return Err(MailError::InvalidState(
                "TLS upgrade requires a connected session".to_string(),
            ));
        }
        if self.transport == TransportState::Tls {
            return Err(MailError::InvalidState(
                "connection is already using TLS".to_string(),
            ));
        }

        // Cleartext read ahead of the handshake could be injected by an attacker
        if !self.pending.is_empty() {
            let error = MailError::TlsUpgrade(format!(
                "{} unexpected bytes received before TLS handshake",
                self.pending.len()
            ));
            self.abort(&error);
            return Err(error);
        }

        let tcp = match std::mem::replace(&mut self.stream, MailStream::Detached) {
            MailStream::Plain(tcp) => tcp,
            other => {
                self.stream = other;
                return Err(MailError::InvalidState(
                    "no plaintext stream to upgrade".to_string(),
                ));
            }
        };

        match tls_handshake(&self.host, tcp, self.allow_insecure_tls, self.connect_timeout).await
        {
            Ok(tls) => {
                self.stream = MailStream::Tls(Box::new(tls));
                self.transport = TransportState::Tls;
                debug!("TLS established with {}:{}", self.host, self.port);
                self.record(TranscriptEvent::TlsUpgraded);
                Ok(())
            }
            Err(e) => {
                self.abort(&e);
                Err(e)
            }
        }
    }

    /// Send the dialect's upgrade command and upgrade on acceptance
    ///
    /// # Errors
    ///
    /// - [`MailError::TlsUpgrade`] - the server refused the command; the
    ///   session stays connected in cleartext
    /// - any error of [`upgrade_to_tls`](Self::upgrade_to_tls)
    pub async fn start_tls(&mut self, command: &str) -> Result<()> {
        if self.transport == TransportState::Tls {
            return Err(MailError::InvalidState(
                "connection is already using TLS".to_string(),
            ));
        }

        let response = self.command(command).await?;
        if !response.is_success() {
            let error = MailError::TlsUpgrade(response.line);
            self.record(TranscriptEvent::Error(error.to_string()));
            return Err(error);
        }

        self.upgrade_to_tls().await
    }

    /// Release the connection
    ///
    /// Idempotent. Does not send `QUIT`; the dialect clients do that first.
    pub async fn close(&mut self) -> Result<()> {
        if self.lifecycle == LifecycleState::Closed {
            return Ok(());
        }

        let mut stream = std::mem::replace(&mut self.stream, MailStream::Detached);
        if let Err(e) = stream.shutdown().await {
            debug!("Shutdown of {}:{} failed: {}", self.host, self.port, e);
        }

        self.pending.clear();
        self.lifecycle = LifecycleState::Closed;
        debug!("Closed connection to {}:{}", self.host, self.port);
        self.record(TranscriptEvent::Closed);
        Ok(())
    }
}
