//! POP3 mailbox example: list, show and optionally delete messages
//!
//! Run with: cargo run --example mailbox
//!
//! Set `RUST_LOG=mailwire=debug` to see the protocol exchange, and
//! `MAIL_TRANSCRIPT_DIR` to also write a session log file.

use std::sync::Arc;

use mailwire::{FileTranscript, Pop3Client, ServerConfig};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // Replace with your actual server credentials
    let host = std::env::var("POP3_HOST").unwrap_or_else(|_| "pop.example.com".to_string());
    let user = std::env::var("POP3_USER").unwrap_or_else(|_| "user".to_string());
    let pass = std::env::var("POP3_PASS").unwrap_or_else(|_| "pass".to_string());
    let mut config = ServerConfig::pop3s(host, user, pass);
    if let Some(port) = std::env::var("POP3_PORT").ok().and_then(|p| p.parse().ok()) {
        config.port = port;
    }

    println!("Connecting to {}:{}...", config.host, config.port);
    let mut client = match std::env::var("MAIL_TRANSCRIPT_DIR") {
        Ok(dir) => {
            let transcript = Arc::new(FileTranscript::create_in(dir)?);
            let mut client = Pop3Client::connect_with_transcript(config, transcript).await?;
            client.authenticate().await?;
            client
        }
        Err(_) => Pop3Client::connect_and_login(config).await?,
    };
    println!("Logged in (TLS: {})", client.is_tls());

    let stat = client.stat().await?;
    println!("{} messages, {} bytes", stat.count, stat.size);

    for summary in client.list_summaries().await? {
        println!(
            "{:>4}  {:>8}  {:<30}  {}",
            summary.index,
            summary.size,
            summary.headers.sender().unwrap_or("(unknown sender)"),
            summary.headers.subject().unwrap_or("(no subject)")
        );
    }

    if let Some(index) = std::env::var("POP3_SHOW").ok().and_then(|i| i.parse().ok()) {
        let message = client.retrieve_message(index).await?;
        println!("\n--- Message {} ---", index);
        for (name, value) in message.headers.iter() {
            println!("{}: {}", name, value);
        }
        println!("\n{}", message.body_text);
    }

    // Deletions take effect when the session ends with QUIT
    if let Some(index) = std::env::var("POP3_DELETE").ok().and_then(|i| i.parse().ok()) {
        client.delete_message(index).await?;
        println!("Marked message {} for deletion", index);
    }

    client.quit().await?;
    println!("Disconnected");

    Ok(())
}
