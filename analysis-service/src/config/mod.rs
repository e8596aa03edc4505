use analysis_core::providers::gemini::{
    CredentialTransport, GeminiConfig, DEFAULT_MODEL, GEMINI_API_BASE,
};
use analysis_core::providers::GenerationParams;
use analysis_core::RetryConfig;
use secrecy::Secret;
use service_core::config::{self as core_config, get_env, get_optional_env, is_production};
use service_core::error::AppError;
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub common: core_config::Config,
    /// Provider key held by the relay. Required in production.
    pub google_api_key: Option<Secret<String>>,
    /// Bearer token clients must present.
    pub operator_token: Secret<String>,
    pub gemini: GeminiConfig,
    pub generation: GenerationParams,
    pub retry: RetryConfig,
    pub otlp_endpoint: Option<String>,
}

impl RelayConfig {
    pub fn load() -> Result<Self, AppError> {
        let common = core_config::Config::load()?;
        let is_prod = is_production();

        let google_api_key = if is_prod {
            Some(get_env("GOOGLE_AI_API_KEY", None, is_prod)?)
        } else {
            get_optional_env("GOOGLE_AI_API_KEY")
        };

        let timeout_secs: u64 = parse_env(
            "GEMINI_TIMEOUT_SECS",
            &get_env("GEMINI_TIMEOUT_SECS", Some("120"), is_prod)?,
        )?;

        Ok(RelayConfig {
            common,
            google_api_key: google_api_key.map(Secret::new),
            operator_token: Secret::new(get_env("RELAY_OPERATOR_TOKEN", None, is_prod)?),
            gemini: GeminiConfig {
                api_base: get_env("GEMINI_API_BASE", Some(GEMINI_API_BASE), is_prod)?,
                model: get_env("GEMINI_MODEL", Some(DEFAULT_MODEL), is_prod)?,
                credential_transport: parse_env::<CredentialTransport>(
                    "GEMINI_CREDENTIAL_TRANSPORT",
                    &get_env("GEMINI_CREDENTIAL_TRANSPORT", Some("header"), is_prod)?,
                )?,
                timeout: Duration::from_secs(timeout_secs),
            },
            generation: GenerationParams::default(),
            retry: RetryConfig::with_max_retries(parse_env(
                "RELAY_MAX_RETRIES",
                &get_env("RELAY_MAX_RETRIES", Some("2"), is_prod)?,
            )?),
            otlp_endpoint: get_optional_env("OTLP_ENDPOINT"),
        })
    }
}

fn parse_env<T>(key: &str, raw: &str) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: Display,
{
    raw.trim().parse().map_err(|e| {
        AppError::ConfigError(anyhow::anyhow!("{} has an invalid value '{}': {}", key, raw, e))
    })
}
