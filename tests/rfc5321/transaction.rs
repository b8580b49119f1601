//! RFC 5321 Section 3.3 - Mail transactions

use crate::common::{MockServer, Reply, local_config, smtp_server};
use mailwire::{MailError, MemoryTranscript, ServerConfig, SmtpClient, decode_message};

async fn connected() -> (MockServer, SmtpClient) {
    let server = MockServer::start("220 mx.example.com ESMTP", smtp_server(&["PIPELINING", "8BITMIME"])).await;
    let config = local_config(ServerConfig::smtp_plain("ignored", "u", "p"), server.port);
    let client = SmtpClient::connect(config).await.unwrap();
    (server, client)
}

#[tokio::test]
async fn test_successful_submission() {
    let (server, mut client) = connected().await;

    client
        .send_mail("a@example.com", &["b@example.com"], b"Subject: hi\r\n\r\nbody\r\n")
        .await
        .unwrap();
    client.quit().await.unwrap();

    assert_eq!(
        server.finish().await,
        vec![
            "EHLO localhost",
            "MAIL FROM:<a@example.com>",
            "RCPT TO:<b@example.com>",
            "DATA",
            "Subject: hi\r\n\r\nbody\r\n.\r\n",
            "QUIT",
        ]
    );
}

#[tokio::test]
async fn test_rejected_recipient_stops_transaction() {
    let (server, mut client) = connected().await;

    let err = client
        .send_mail("a@example.com", &["nobody@reject.example.com"], b"body")
        .await
        .unwrap_err();
    match err {
        MailError::Protocol { command, reply } => {
            assert_eq!(command, "RCPT TO:<nobody@reject.example.com>");
            assert_eq!(reply, "550 5.1.1 No such user");
        }
        other => panic!("expected Protocol error, got {:?}", other),
    }

    // Nothing after the failing RCPT
    assert_eq!(
        server.received(),
        vec![
            "EHLO localhost",
            "MAIL FROM:<a@example.com>",
            "RCPT TO:<nobody@reject.example.com>",
        ]
    );
    assert!(!client.session().is_closed());
}

#[tokio::test]
async fn test_next_send_resets_failed_transaction() {
    let (server, mut client) = connected().await;

    assert!(client
        .send_mail("a@example.com", &["x@reject.example.com"], b"one")
        .await
        .is_err());
    client
        .send_mail("a@example.com", &["b@example.com"], b"two")
        .await
        .unwrap();
    // A clean transaction needs no reset
    client
        .send_mail("a@example.com", &["c@example.com"], b"three")
        .await
        .unwrap();

    let received = server.received();
    let commands: Vec<&str> = received
        .iter()
        .map(String::as_str)
        .filter(|line| !line.ends_with(".\r\n"))
        .collect();
    assert_eq!(
        commands,
        vec![
            "EHLO localhost",
            "MAIL FROM:<a@example.com>",
            "RCPT TO:<x@reject.example.com>",
            "RSET",
            "MAIL FROM:<a@example.com>",
            "RCPT TO:<b@example.com>",
            "DATA",
            "MAIL FROM:<a@example.com>",
            "RCPT TO:<c@example.com>",
            "DATA",
        ]
    );
}

#[tokio::test]
async fn test_multiple_recipients() {
    let (server, mut client) = connected().await;
    client
        .send_mail("a@example.com", &["b@example.com", "c@example.com"], b"hi")
        .await
        .unwrap();

    let received = server.received();
    assert!(received.contains(&"RCPT TO:<b@example.com>".to_string()));
    assert!(received.contains(&"RCPT TO:<c@example.com>".to_string()));
}

#[tokio::test]
async fn test_payload_is_dot_stuffed() {
    let (server, mut client) = connected().await;
    client
        .send_mail("a@example.com", &["b@example.com"], b"line\n.\n..two\nend")
        .await
        .unwrap();

    let payload = server.received().last().cloned().unwrap();
    assert_eq!(payload, "line\r\n..\r\n...two\r\nend\r\n.\r\n");
}

#[tokio::test]
async fn test_data_rejected() {
    let server = MockServer::start("220 ready", |command: &str| {
        if command == "DATA" {
            Reply::text("554 5.5.1 No valid recipients\r\n")
        } else {
            Reply::text("250 ok\r\n")
        }
    })
    .await;
    let config = local_config(ServerConfig::smtp_plain("ignored", "u", "p"), server.port);
    let mut client = SmtpClient::connect(config).await.unwrap();

    match client.send_mail("a@example.com", &["b@example.com"], b"x").await {
        Err(MailError::Protocol { command, reply }) => {
            assert_eq!(command, "DATA");
            assert_eq!(reply, "554 5.5.1 No valid recipients");
        }
        other => panic!("expected Protocol error, got {:?}", other),
    }
    // The payload was never written
    assert_eq!(server.received().last().map(String::as_str), Some("DATA"));
}

#[tokio::test]
async fn test_send_email_composes_message() {
    let (server, mut client) = connected().await;
    client
        .send_email("a@example.com", "b@example.com", "Привет", "Текст письма")
        .await
        .unwrap();

    let payload = server.received().last().cloned().unwrap();
    let message = payload.strip_suffix(".\r\n").unwrap();
    let decoded = decode_message(message.as_bytes());
    assert_eq!(decoded.headers.subject(), Some("Привет"));
    assert_eq!(decoded.headers.sender(), Some("a@example.com"));
    assert_eq!(decoded.body_text, "Текст письма");
}

#[tokio::test]
async fn test_invalid_address_sends_nothing() {
    let (server, mut client) = connected().await;

    for (from, to) in [("not an address", "b@example.com"), ("a@example.com", "b@localhost")] {
        let err = client.send_email(from, to, "s", "t").await.unwrap_err();
        assert!(matches!(err, MailError::InvalidAddress(_)), "{:?}", err);
    }
    assert!(matches!(
        client.send_mail("a@example.com", &[], b"x").await,
        Err(MailError::InvalidAddress(_))
    ));
    assert_eq!(server.received(), vec!["EHLO localhost"]);
}

#[tokio::test]
async fn test_payload_not_logged() {
    let server = MockServer::start("220 ready", smtp_server(&[])).await;
    let config = local_config(ServerConfig::smtp_plain("ignored", "u", "p"), server.port);
    let transcript = MemoryTranscript::new();
    let mut client = SmtpClient::connect_with_transcript(config, transcript.clone())
        .await
        .unwrap();

    client
        .send_mail("a@example.com", &["b@example.com"], b"secret body")
        .await
        .unwrap();
    let sent = transcript.sent();
    assert!(sent.iter().all(|line| !line.contains("secret body")));
    assert!(sent.contains(&"<16 bytes>".to_string()));
}

#[tokio::test]
async fn test_line_break_in_address_sends_nothing() {
    let (server, mut client) = connected().await;

    for (from, to) in [
        ("a@example.com\r\nRCPT TO:<x@example.com>", "b@example.com"),
        ("a@example.com", "b@example.com>\nDATA"),
    ] {
        match client.send_mail(from, &[to], b"x").await {
            Err(MailError::InvalidAddress(address)) => assert!(address.contains('\n')),
            other => panic!("expected InvalidAddress, got {:?}", other),
        }
    }
    assert!(!client.session().is_closed());
    assert_eq!(server.received(), vec!["EHLO localhost"]);
}
