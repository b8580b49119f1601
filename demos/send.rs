//! SMTP submission example
//!
//! Run with: cargo run --example send
//!
//! Uses port 587 with STARTTLS unless `SMTP_IMPLICIT_TLS` is set.

use mailwire::{OutgoingMessage, ServerConfig, SmtpClient};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // Replace with your actual server credentials
    let host = std::env::var("SMTP_HOST").unwrap_or_else(|_| "smtp.example.com".to_string());
    let user = std::env::var("SMTP_USER").unwrap_or_else(|_| "user@example.com".to_string());
    let pass = std::env::var("SMTP_PASS").unwrap_or_else(|_| "pass".to_string());
    let to = std::env::var("SMTP_TO").unwrap_or_else(|_| user.clone());

    let config = if std::env::var("SMTP_IMPLICIT_TLS").is_ok() {
        ServerConfig::smtps(host, user.clone(), pass)
    } else {
        ServerConfig::submission(host, user.clone(), pass)
    };

    println!("Connecting to {}:{}...", config.host, config.port);
    let mut client = SmtpClient::connect_and_login(config).await?;

    let caps = client.capabilities();
    println!("Server: {}", caps.domain());
    println!("AUTH mechanisms: {:?}", caps.auth_mechanisms());
    if let Some(limit) = caps.max_size() {
        println!("Maximum message size: {} bytes", limit);
    }

    let message = OutgoingMessage::new(
        user.as_str(),
        to.as_str(),
        "Проверка связи",
        "Hello from mailwire.\nПривет!",
    );
    client.send_message(&message).await?;
    println!("Sent to {}", to);

    client.quit().await?;

    Ok(())
}
