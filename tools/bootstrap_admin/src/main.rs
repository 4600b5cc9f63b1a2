use dotenvy::dotenv;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::env;

fn is_dry_run() -> bool {
    !std::env::args().any(|a| a == "--apply")
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RegisterRequest {
    username: String,
    email: String,
    password: String,
    bootstrap_key: String,
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    message: String,
    #[serde(default)]
    data: Option<TokenData>,
}

#[derive(Debug, Deserialize)]
struct TokenData {
    token: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();

    let base_url = env::var("API_BASE_URL").unwrap_or_else(|_| "http://localhost:8080".to_string());
    let request = RegisterRequest {
        username: env::var("ADMIN_USERNAME")?,
        email: env::var("ADMIN_EMAIL")?,
        password: env::var("ADMIN_PASSWORD")?,
        bootstrap_key: env::var("BOOTSTRAP_KEY")?,
    };

    let url = format!(
        "{}/api/v1/auth/register-admin",
        base_url.trim_end_matches('/')
    );

    if is_dry_run() {
        println!(
            "[DRY RUN] Would register admin {} <{}> at {}",
            request.username, request.email, url
        );
        println!("Re-run with --apply to send the request.");
        return Ok(());
    }

    let client = Client::new();
    let res = client.post(&url).json(&request).send().await?;
    let status = res.status();
    let body: Envelope = res.json().await.unwrap_or(Envelope {
        message: String::new(),
        data: None,
    });

    if !status.is_success() {
        return Err(format!("register-admin failed ({}): {}", status, body.message).into());
    }

    match body.data {
        Some(data) => println!(
            "Registered admin {} (token: {}...)",
            request.username,
            data.token.chars().take(8).collect::<String>()
        ),
        None => println!("Registered admin {}", request.username),
    }

    Ok(())
}
