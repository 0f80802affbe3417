//! Reddit Post Submission Script
//!
//! This script publishes a single post to Reddit from the terminal, using the
//! same configuration file and client as the redpost service.

use std::io::{self, Write};

use redpost::{get_config_path, AppConfig, PostRequest, RedditClient};

/// Prints `label`, reads one line from stdin and returns it trimmed.
fn prompt(label: &str) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
    print!("{}", label);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

fn optional(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    println!("📮 Reddit Post Submission Tool");
    println!("==============================");

    let config_path = get_config_path();
    let config = AppConfig::load_or_create(&config_path)?;
    config.validate()?;
    println!("📄 Loaded configuration from {}", config_path);

    let subreddit = prompt(&format!(
        "📍 Subreddit [{}]: ",
        config.default_subreddit
    ))?;
    let subreddit = optional(subreddit).unwrap_or_else(|| config.default_subreddit.clone());

    let title = prompt("📝 Title: ")?;
    if title.is_empty() {
        println!("❌ Title cannot be empty!");
        return Err("Title is required".into());
    }

    let text = optional(prompt("💬 Text (optional): ")?);
    let url = optional(prompt("🔗 Link URL (optional): ")?);
    let media_url = optional(prompt("🖼️  Media URL (optional): ")?);

    let request = PostRequest {
        subreddit,
        title,
        text,
        url,
        media_url,
        ..Default::default()
    };
    println!("🧭 Post kind: {:?}", request.kind());

    let client = RedditClient::new(config.credentials());
    println!("\n🔐 Authenticating as /u/{}...", config.username);
    if !client.authenticate().await {
        println!("❌ Authentication failed, check your credentials");
        return Err("Failed to authenticate with Reddit".into());
    }

    println!("🚀 Publishing...");
    let result = client.submit_post(&request).await;
    if result.success {
        println!("\n🎉 Success! Your post has been published.");
        println!(
            "🆔 {}",
            result.post_name.as_deref().unwrap_or("<unnamed>")
        );
        println!("🔗 {}", result.post_url());
        Ok(())
    } else {
        let error = result.error.unwrap_or_else(|| "unknown error".to_string());
        println!("\n💥 Failed to publish post: {}", error);
        Err(error.into())
    }
}
