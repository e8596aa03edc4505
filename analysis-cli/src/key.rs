use analysis_core::credential::{validate_format, Credential, CredentialStore, StaticCredential};
use analysis_core::providers::gemini::{GeminiConfig, GeminiTextProvider};
use anyhow::Context;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

pub async fn set(
    store: &CredentialStore,
    api_base: &str,
    key: Option<String>,
    no_verify: bool,
) -> anyhow::Result<()> {
    let raw = match key {
        Some(key) => key,
        None => prompt_for_key().await?,
    };

    let credential = if no_verify {
        validate_format(&raw)?
    } else {
        let config = GeminiConfig {
            api_base: api_base.to_string(),
            ..Default::default()
        };
        let provider = GeminiTextProvider::new(config, Arc::new(StaticCredential::default()))?;
        println!("Validating key with Google AI...");
        provider.validate_key(&raw).await?
    };

    store.set_credential(credential)?;
    println!("API key saved to {}", store.path().display());
    Ok(())
}

pub fn status(store: &CredentialStore) -> anyhow::Result<()> {
    match store.get_credential() {
        Some(credential) => println!(
            "API key configured ({}), stored at {}",
            mask(&credential),
            store.path().display()
        ),
        None => println!("No API key configured. Run `dog-health key set` to add one."),
    }
    Ok(())
}

pub fn clear(store: &CredentialStore) -> anyhow::Result<()> {
    store.clear_credential()?;
    println!("API key removed");
    Ok(())
}

async fn prompt_for_key() -> anyhow::Result<String> {
    eprintln!("Google AI API key (get one at https://aistudio.google.com/app/apikey):");
    let mut line = String::new();
    BufReader::new(tokio::io::stdin())
        .read_line(&mut line)
        .await
        .context("Failed to read API key from stdin")?;
    Ok(line)
}

/// `AIza…wxyz`: enough to tell keys apart without revealing them.
fn mask(credential: &Credential) -> String {
    let key = credential.expose();
    let tail: String = key
        .chars()
        .rev()
        .take(4)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    format!("{}…{}", key.chars().take(4).collect::<String>(), tail)
}
