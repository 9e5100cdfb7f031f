use std::{env, io::Write};

use chrono::Duration;
use log::*;
use rand::{distributions::Alphanumeric, thread_rng, Rng};
use serde_json::json;
use sfg_common::{parse_boolean_flag, Secret};
use tempfile::NamedTempFile;

use crate::errors::ServerError;

const DEFAULT_SFG_HOST: &str = "127.0.0.1";
const DEFAULT_SFG_PORT: u16 = 8380;
const DEFAULT_SIGNATURE_TOLERANCE_SECS: i64 = 300;
const MIN_TOKEN_KEY_LEN: usize = 32;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub auth: AuthConfig,
    /// Stripe webhook configuration
    pub stripe: StripeConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_SFG_HOST.to_string(),
            port: DEFAULT_SFG_PORT,
            database_url: String::default(),
            auth: AuthConfig::default(),
            stripe: StripeConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("SFG_HOST").ok().unwrap_or_else(|| DEFAULT_SFG_HOST.into());
        let port = env::var("SFG_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for SFG_PORT. {e} Using the default, {DEFAULT_SFG_PORT}, instead."
                    );
                    DEFAULT_SFG_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_SFG_PORT);
        let database_url = env::var("SFG_DATABASE_URL").ok().unwrap_or_else(|| {
            error!("🪛️ SFG_DATABASE_URL is not set. Please set it to the URL for the storefront database.");
            String::default()
        });
        let auth = AuthConfig::try_from_env().unwrap_or_else(|e| {
            warn!(
                "🪛️ Could not load the authentication configuration from environment variables. {e}. Reverting to \
                 the default configuration."
            );
            AuthConfig::default()
        });
        let stripe = StripeConfig::from_env_or_defaults();
        Self { host, port, database_url, auth, stripe }
    }
}

//-------------------------------------------------  StripeConfig  ----------------------------------------------------
#[derive(Clone, Debug)]
pub struct StripeConfig {
    /// The shared secret used to verify webhook signatures.
    pub webhook_secret: Secret<String>,
    /// If false, webhook signature checks are skipped and every payload is trusted. **DANGER**
    pub signature_checks: bool,
    /// How far a webhook's signature timestamp may drift from the server clock before the event is rejected.
    pub signature_tolerance: Duration,
}

impl Default for StripeConfig {
    fn default() -> Self {
        Self {
            webhook_secret: Secret::default(),
            signature_checks: true,
            signature_tolerance: Duration::seconds(DEFAULT_SIGNATURE_TOLERANCE_SECS),
        }
    }
}

impl StripeConfig {
    pub fn from_env_or_defaults() -> Self {
        let webhook_secret = env::var("SFG_STRIPE_WEBHOOK_SECRET").ok().unwrap_or_else(|| {
            error!(
                "🪛️ SFG_STRIPE_WEBHOOK_SECRET is not set. Please set it to the signing secret for your Stripe \
                 webhook endpoint."
            );
            String::default()
        });
        let webhook_secret = Secret::new(webhook_secret);
        let signature_checks = parse_boolean_flag(env::var("SFG_STRIPE_SIGNATURE_CHECKS").ok(), true);
        if !signature_checks {
            warn!(
                "🚨️ Stripe webhook signature checks are DISABLED. Anyone can mark payments as completed. Do not \
                 run like this in production."
            );
        }
        let signature_tolerance = env::var("SFG_STRIPE_SIGNATURE_TOLERANCE")
            .map_err(|_| {
                info!(
                    "🪛️ SFG_STRIPE_SIGNATURE_TOLERANCE is not set. Using the default value of \
                     {DEFAULT_SIGNATURE_TOLERANCE_SECS}s."
                )
            })
            .and_then(|s| {
                s.parse::<i64>()
                    .map(Duration::seconds)
                    .map_err(|e| warn!("🪛️ Invalid configuration value for SFG_STRIPE_SIGNATURE_TOLERANCE. {e}"))
            })
            .ok()
            .unwrap_or_else(|| Duration::seconds(DEFAULT_SIGNATURE_TOLERANCE_SECS));
        Self { webhook_secret, signature_checks, signature_tolerance }
    }
}

//-------------------------------------------------  AuthConfig  -------------------------------------------------------
#[derive(Clone, Debug)]
pub struct AuthConfig {
    /// The key used to sign and verify access tokens. The identity service issuing customer tokens must hold the
    /// same key.
    pub token_key: Secret<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        let mut tmpfile = NamedTempFile::new().ok().and_then(|f| f.keep().ok());
        warn!(
            "🚨️🚨️🚨️ The access token key has not been set. I'm using a random value for this session. DO NOT \
             operate on production like this since every customer session will be invalidated on restart. 🚨️🚨️🚨️"
        );
        let key: String = thread_rng().sample_iter(&Alphanumeric).take(64).map(char::from).collect();
        match &mut tmpfile {
            Some((f, p)) => {
                let key_data = json!({ "token_key": key }).to_string();
                match writeln!(f, "{key_data}") {
                    Ok(()) => warn!(
                        "🚨️🚨️🚨️ The access token key for this session was written to {}. If this is a production \
                         instance, you are doing it wrong! Set the SFG_AUTH_TOKEN_KEY environment variable instead. \
                         🚨️🚨️🚨️",
                        p.to_str().unwrap_or("???")
                    ),
                    Err(e) => warn!("🪛️ Could not write the access token key to the temporary file. {e}"),
                }
            },
            None => {
                warn!("🪛️ Could not create a temporary file to store the access token key.");
            },
        }
        Self { token_key: Secret::new(key) }
    }
}

impl AuthConfig {
    pub fn try_from_env() -> Result<Self, ServerError> {
        let key =
            env::var("SFG_AUTH_TOKEN_KEY").map_err(|e| ServerError::ConfigurationError(format!("{e} [SFG_AUTH_TOKEN_KEY]")))?;
        if key.len() < MIN_TOKEN_KEY_LEN {
            return Err(ServerError::ConfigurationError(format!(
                "SFG_AUTH_TOKEN_KEY must be at least {MIN_TOKEN_KEY_LEN} characters long."
            )));
        }
        Ok(Self { token_key: Secret::new(key) })
    }
}
