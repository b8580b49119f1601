//! RFC 1939 Section 7 - USER/PASS and the AUTHORIZATION state

use crate::common::{MockServer, Reply, local_config, pop3_mailbox};
use std::sync::Arc;

use mailwire::{
    FileTranscript, MailError, MemoryTranscript, Pop3Client, ServerConfig, TranscriptEvent,
};

fn config(port: u16) -> ServerConfig {
    local_config(ServerConfig::pop3("ignored", "u", "p"), port)
}

#[tokio::test]
async fn test_user_pass_authenticates() {
    let server = MockServer::start("+OK ready", pop3_mailbox(vec![])).await;
    let mut client = Pop3Client::connect(config(server.port)).await.unwrap();

    assert!(!client.is_authenticated());
    assert_eq!(client.session().greeting(), "+OK ready");

    client.login("u", "p").await.unwrap();
    assert!(client.is_authenticated());

    client.quit().await.unwrap();
    assert_eq!(server.finish().await, vec!["USER u", "PASS p", "QUIT"]);
}

#[tokio::test]
async fn test_stat_before_pass_is_not_authenticated() {
    let server = MockServer::start("+OK ready", pop3_mailbox(vec![])).await;
    let mut client = Pop3Client::connect(config(server.port)).await.unwrap();

    assert!(matches!(client.stat().await, Err(MailError::NotAuthenticated)));
    assert!(matches!(client.list().await, Err(MailError::NotAuthenticated)));
    assert!(matches!(
        client.retrieve_headers(1).await,
        Err(MailError::NotAuthenticated)
    ));
    assert!(matches!(
        client.retrieve_message(1).await,
        Err(MailError::NotAuthenticated)
    ));
    assert!(matches!(
        client.delete_message(1).await,
        Err(MailError::NotAuthenticated)
    ));

    // Nothing reached the wire
    assert!(server.received().is_empty());
}

#[tokio::test]
async fn test_wrong_password_keeps_session_usable() {
    let server = MockServer::start("+OK ready", pop3_mailbox(vec![])).await;
    let mut client = Pop3Client::connect(config(server.port)).await.unwrap();

    match client.login("u", "wrong").await {
        Err(MailError::AuthFailed(reply)) => assert_eq!(reply, "-ERR invalid password"),
        other => panic!("expected AuthFailed, got {:?}", other),
    }
    assert!(!client.is_authenticated());
    assert!(!client.session().is_closed());

    // Retry succeeds on the same connection
    client.login("u", "p").await.unwrap();
    assert!(client.is_authenticated());
}

#[tokio::test]
async fn test_second_login_rejected() {
    let server = MockServer::start("+OK ready", pop3_mailbox(vec![])).await;
    let mut client = Pop3Client::connect(config(server.port)).await.unwrap();
    client.authenticate().await.unwrap();

    assert!(matches!(
        client.login("u", "p").await,
        Err(MailError::InvalidState(_))
    ));
}

#[tokio::test]
async fn test_password_never_recorded() {
    let server = MockServer::start("+OK ready", pop3_mailbox(vec![])).await;
    let transcript = MemoryTranscript::new();
    let mut client = Pop3Client::connect_with_transcript(config(server.port), transcript.clone())
        .await
        .unwrap();
    client.login("u", "p").await.unwrap();

    assert_eq!(transcript.sent(), vec!["USER u", "PASS ****"]);
    assert!(transcript.events().contains(&TranscriptEvent::Received(
        "+OK maildrop locked".to_string()
    )));
}

#[tokio::test]
async fn test_connect_and_login() {
    let server = MockServer::start("+OK ready", pop3_mailbox(vec![])).await;
    let client = Pop3Client::connect_and_login(config(server.port)).await.unwrap();
    assert!(client.is_authenticated());
    assert!(!client.is_tls());
}

#[tokio::test]
async fn test_negative_greeting_fails_connect() {
    let server = MockServer::start("-ERR server busy", |_: &str| Reply::Close).await;
    match Pop3Client::connect(config(server.port)).await {
        Err(MailError::Protocol { command, reply }) => {
            assert_eq!(command, "greeting");
            assert_eq!(reply, "-ERR server busy");
        }
        other => panic!("expected Protocol error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_refused_stls_fails_connect() {
    let server = MockServer::start("+OK ready", |command: &str| match command {
        "STLS" => Reply::text("-ERR command not supported\r\n"),
        _ => Reply::text("-ERR\r\n"),
    })
    .await;

    let config = local_config(ServerConfig::pop3_starttls("ignored", "u", "p"), server.port);
    match Pop3Client::connect(config).await {
        Err(MailError::TlsUpgrade(reply)) => assert_eq!(reply, "-ERR command not supported"),
        other => panic!("expected TlsUpgrade, got {:?}", other),
    }
    assert_eq!(server.finish().await, vec!["STLS"]);
}

#[tokio::test]
async fn test_line_break_in_credentials_sends_nothing() {
    let server = MockServer::start("+OK ready", pop3_mailbox(vec![])).await;
    let mut client = Pop3Client::connect(config(server.port)).await.unwrap();

    for (user, pass) in [("u\r\nDELE 1", "p"), ("u", "p\nDELE 1")] {
        assert!(matches!(
            client.login(user, pass).await,
            Err(MailError::InvalidInput(_))
        ));
    }
    assert!(matches!(
        client.session_mut().send_line("NOOP\r\nDELE 1").await,
        Err(MailError::InvalidInput(_))
    ));

    // Rejected before the wire and the session is still usable
    assert!(!client.session().is_closed());
    client.login("u", "p").await.unwrap();
    assert_eq!(server.received(), vec!["USER u", "PASS p"]);
}

#[tokio::test]
async fn test_file_transcript_redacts_password() {
    let dir = tempfile::tempdir().unwrap();
    let server = MockServer::start("+OK ready", pop3_mailbox(vec![])).await;
    let transcript = Arc::new(FileTranscript::create_in(dir.path()).unwrap());

    let mut client = Pop3Client::connect_with_transcript(config(server.port), transcript)
        .await
        .unwrap();
    client.login("u", "p").await.unwrap();
    client.quit().await.unwrap();
    drop(client);

    let path = std::fs::read_dir(dir.path())
        .unwrap()
        .next()
        .unwrap()
        .unwrap()
        .path();
    let contents = std::fs::read_to_string(path).unwrap();

    for line in contents.lines() {
        assert_eq!(&line[..1], "[", "{}", line);
        assert!(
            chrono::NaiveDateTime::parse_from_str(&line[1..20], "%Y-%m-%d %H:%M:%S").is_ok(),
            "{}",
            line
        );
        assert_eq!(&line[20..22], "] ", "{}", line);
    }
    assert!(contents.contains("] CLIENT: USER u\n"));
    assert!(contents.contains("] CLIENT: PASS ****\n"));
    assert!(contents.contains("] SERVER: +OK maildrop locked\n"));
    assert!(!contents.contains("PASS p"));
}
