use crate::report::render;
use analysis_core::providers::gemini::GeminiConfig;
use analysis_core::providers::GenerationParams;
use analysis_core::relay::RemoteConfig;
use analysis_core::{AnalysisRelay, Backend, CredentialStore, HealthProfile, RetryConfig};
use anyhow::{bail, Context};
use std::path::Path;
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use validator::Validate;

/// Where the analysis runs.
pub enum Target {
    Direct { api_base: String },
    Relay { url: String, token: Option<String> },
}

impl Target {
    pub fn new(relay_url: Option<String>, relay_token: Option<String>, api_base: &str) -> Self {
        match relay_url {
            Some(url) => Target::Relay {
                url,
                token: relay_token,
            },
            None => Target::Direct {
                api_base: api_base.to_string(),
            },
        }
    }

    fn backend(self) -> anyhow::Result<Backend> {
        Ok(match self {
            Target::Direct { api_base } => {
                tracing::debug!(%api_base, "Calling Gemini directly");
                Backend::Direct {
                    gemini: GeminiConfig {
                        api_base,
                        ..Default::default()
                    },
                    params: GenerationParams::default(),
                }
            }
            Target::Relay { url, token } => {
                let token = token.context("--relay-token is required with --relay-url")?;
                tracing::debug!(relay = %url, "Calling the analysis relay");
                Backend::Relayed(RemoteConfig::new(url, token))
            }
        })
    }
}

pub async fn run(
    store: CredentialStore,
    profile_path: &Path,
    target: Target,
    json: bool,
) -> anyhow::Result<()> {
    let profile = load_profile(profile_path).await?;
    if let Err(errors) = profile.validate() {
        bail!("Please fill in all required fields\n{}", errors);
    }

    let relay = AnalysisRelay::from_backend(
        target.backend()?,
        Arc::new(store),
        RetryConfig::default(),
    )?;

    eprintln!("Analyzing {}'s health profile...", profile.name);
    match relay.analyze(&profile).await {
        Ok(result) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print!("{}", render(&result));
            }
            Ok(())
        }
        Err(e) => {
            eprintln!("Analysis Failed");
            bail!(e)
        }
    }
}

async fn load_profile(path: &Path) -> anyhow::Result<HealthProfile> {
    let raw = if path == Path::new("-") {
        let mut raw = String::new();
        tokio::io::stdin()
            .read_to_string(&mut raw)
            .await
            .context("Failed to read profile from stdin")?;
        raw
    } else {
        tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read profile {}", path.display()))?
    };

    parse_profile(&raw)
}

fn parse_profile(raw: &str) -> anyhow::Result<HealthProfile> {
    serde_json::from_str(raw).context("Profile is not a valid health profile")
}
