//! RFC 2595 Section 4 - STLS, and POP3 over implicit TLS (RFC 8314)

use crate::common::{MockServer, Reply, ServerTls, local_config, pop3_mailbox};
use mailwire::{
    MailError, MemoryTranscript, Pop3Client, ServerConfig, TranscriptEvent, TransportState,
};

/// Maildrop that also accepts `STLS`
fn stls_mailbox(messages: Vec<Vec<u8>>) -> impl FnMut(&str) -> Reply + Send + 'static {
    let mut mailbox = pop3_mailbox(messages);
    move |command: &str| match command {
        "STLS" => Reply::text("+OK Begin TLS negotiation\r\n"),
        other => mailbox(other),
    }
}

#[tokio::test]
async fn test_implicit_tls_session() {
    let message = b"Subject: over tls\r\n\r\nsecret body\r\n".to_vec();
    let server =
        MockServer::start_with_tls("+OK ready", ServerTls::Implicit, pop3_mailbox(vec![message]))
            .await;
    let config = local_config(ServerConfig::pop3s("ignored", "u", "p"), server.port).insecure();

    let mut client = Pop3Client::connect_and_login(config).await.unwrap();
    assert!(client.is_tls());
    assert_eq!(client.session().transport(), TransportState::Tls);
    assert_eq!(client.session().greeting(), "+OK ready");

    let stat = client.stat().await.unwrap();
    assert_eq!(stat.count, 1);
    let decoded = client.retrieve_message(1).await.unwrap();
    assert_eq!(decoded.body_text.trim_end(), "secret body");

    client.quit().await.unwrap();
    assert_eq!(
        server.finish().await,
        vec!["USER u", "PASS p", "NOOP", "STAT", "NOOP", "RETR 1", "QUIT"]
    );
}

#[tokio::test]
async fn test_stls_upgrades_same_connection() {
    let server =
        MockServer::start_with_tls("+OK ready", ServerTls::Upgrade("STLS"), stls_mailbox(vec![]))
            .await;
    let config =
        local_config(ServerConfig::pop3_starttls("ignored", "u", "p"), server.port).insecure();
    let transcript = MemoryTranscript::new();

    let mut client = Pop3Client::connect_with_transcript(config, transcript.clone())
        .await
        .unwrap();
    assert!(client.is_tls());
    assert_eq!(client.session().transport(), TransportState::Tls);
    assert!(transcript.events().contains(&TranscriptEvent::TlsUpgraded));

    // Credentials only travel after the handshake
    client.authenticate().await.unwrap();
    assert_eq!(client.stat().await.unwrap().count, 0);
    assert_eq!(server.received()[..3], ["STLS", "USER u", "PASS p"]);
}

#[tokio::test]
async fn test_second_upgrade_is_invalid_state() {
    let server =
        MockServer::start_with_tls("+OK ready", ServerTls::Upgrade("STLS"), stls_mailbox(vec![]))
            .await;
    let config =
        local_config(ServerConfig::pop3_starttls("ignored", "u", "p"), server.port).insecure();
    let mut client = Pop3Client::connect(config).await.unwrap();
    assert!(client.is_tls());

    assert!(matches!(
        client.session_mut().upgrade_to_tls().await,
        Err(MailError::InvalidState(_))
    ));
    assert!(matches!(
        client.session_mut().start_tls("STLS").await,
        Err(MailError::InvalidState(_))
    ));

    // Neither attempt touched the wire or the encrypted session
    assert_eq!(client.session().transport(), TransportState::Tls);
    client.authenticate().await.unwrap();
    client.noop().await.unwrap();
    assert_eq!(server.received()[..3], ["STLS", "USER u", "PASS p"]);
}

#[tokio::test]
async fn test_implicit_tls_rejects_plaintext_server() {
    // The server speaks cleartext on what the client believes is a TLS port
    let server = MockServer::start("+OK ready", pop3_mailbox(vec![])).await;
    let config = local_config(ServerConfig::pop3s("ignored", "u", "p"), server.port).insecure();

    match Pop3Client::connect(config).await {
        Err(e) => assert!(e.is_tls_error() || e.is_connection_error(), "got {:?}", e),
        Ok(_) => panic!("handshake with a cleartext server must fail"),
    }
}
