use std::str::FromStr;

use axum::http::HeaderValue;
use refresh_cloud::refresh::{DEFAULT_AUTHORITY_HOST, DEFAULT_REFRESH_SCOPE};
use refresh_core::credential::SecretValue;
use refresh_core::endpoint::EndpointTemplate;
use refresh_pipeline::SecretNames;
use url::Url;

/// Default workspace endpoint pattern.
pub const DEFAULT_ENDPOINT_TEMPLATE: &str = "https://api.powerbi.com/v1.0/myorg/{workspace}";

/// Default key vault base URL pattern.
pub const DEFAULT_VAULT_URL_TEMPLATE: &str = "https://{vault}.vault.azure.net";

/// Default prefix for [`SecretSource::Env`] variables.
pub const DEFAULT_ENV_SECRET_PREFIX: &str = "REFRESH_SECRET_";

/// Vault name reported for the environment secret source.
const ENV_VAULT_NAME: &str = "env";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{var} has invalid value '{value}': {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Log output format (`LOG_FORMAT`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl LogFormat {
    pub fn from_env() -> Self {
        match std::env::var("LOG_FORMAT").as_deref() {
            Ok("json") => Self::Json,
            _ => Self::Text,
        }
    }
}

/// Where the service principal secrets come from.
#[derive(Debug, Clone)]
pub enum SecretSource {
    /// A key vault, read with the host's managed identity.
    KeyVault {
        vault_name: String,
        url_template: EndpointTemplate,
    },
    /// Environment variables, for local development.
    Env { prefix: String },
}

/// Settings for the refresh invoker and its collaborators.
#[derive(Debug, Clone)]
pub struct InvokerConfig {
    pub secret_source: SecretSource,
    pub secret_names: SecretNames,
    pub endpoint_template: EndpointTemplate,
    pub authority_host: Url,
    pub refresh_scope: String,
}

impl InvokerConfig {
    /// Vault name passed to the secret provider.
    pub fn vault_name(&self) -> &str {
        match &self.secret_source {
            SecretSource::KeyVault { vault_name, .. } => vault_name,
            SecretSource::Env { .. } => ENV_VAULT_NAME,
        }
    }
}

/// Server configuration loaded from environment variables.
///
/// All fields except `KEY_VAULT_NAME` have defaults suitable for local
/// development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// How long shutdown waits for in-flight invocations (default: `30`).
    pub shutdown_timeout_secs: u64,
    /// Shared token required in `x-trigger-token`, if set.
    pub trigger_token: Option<SecretValue>,
    /// Reject commands that do not parse as a typed refresh command.
    pub strict_commands: bool,
    pub invoker: InvokerConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                     | Default                                              |
    /// |-----------------------------|------------------------------------------------------|
    /// | `HOST`                      | `0.0.0.0`                                            |
    /// | `PORT`                      | `3000`                                               |
    /// | `CORS_ORIGINS`              | `http://localhost:5173`                              |
    /// | `REQUEST_TIMEOUT_SECS`      | `30`                                                 |
    /// | `SHUTDOWN_TIMEOUT_SECS`     | `30`                                                 |
    /// | `TRIGGER_TOKEN`             | unset                                                |
    /// | `STRICT_COMMAND_VALIDATION` | `false`                                              |
    /// | `SECRET_PROVIDER`           | `keyvault` (or `env`)                                |
    /// | `KEY_VAULT_NAME`            | required for `keyvault`                              |
    /// | `KEY_VAULT_URL_TEMPLATE`    | `https://{vault}.vault.azure.net`                    |
    /// | `ENV_SECRET_PREFIX`         | `REFRESH_SECRET_`                                    |
    /// | `SECRET_NAME_APP_ID`        | `AppId`                                              |
    /// | `SECRET_NAME_APP_SECRET`    | `AppSecret`                                          |
    /// | `SECRET_NAME_TENANT_ID`     | `TenantId`                                           |
    /// | `REFRESH_ENDPOINT_TEMPLATE` | `https://api.powerbi.com/v1.0/myorg/{workspace}`     |
    /// | `AUTHORITY_HOST`            | `https://login.microsoftonline.com`                  |
    /// | `REFRESH_SCOPE`             | `https://analysis.windows.net/powerbi/api/.default`  |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let host = get("HOST", "0.0.0.0");
        let port: u16 = parse("PORT", &get("PORT", "3000"))?;

        let cors_origins: Vec<String> = get("CORS_ORIGINS", "http://localhost:5173")
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        for origin in &cors_origins {
            HeaderValue::from_str(origin).map_err(|e| ConfigError::Invalid {
                var: "CORS_ORIGINS",
                value: origin.clone(),
                reason: e.to_string(),
            })?;
        }

        let request_timeout_secs: u64 =
            parse("REQUEST_TIMEOUT_SECS", &get("REQUEST_TIMEOUT_SECS", "30"))?;
        let shutdown_timeout_secs: u64 =
            parse("SHUTDOWN_TIMEOUT_SECS", &get("SHUTDOWN_TIMEOUT_SECS", "30"))?;

        let trigger_token = lookup("TRIGGER_TOKEN")
            .filter(|t| !t.is_empty())
            .map(SecretValue::new);

        let strict_commands: bool = parse(
            "STRICT_COMMAND_VALIDATION",
            &get("STRICT_COMMAND_VALIDATION", "false"),
        )?;

        let secret_source = match get("SECRET_PROVIDER", "keyvault").as_str() {
            "keyvault" => {
                let vault_name = lookup("KEY_VAULT_NAME")
                    .filter(|v| !v.trim().is_empty())
                    .ok_or(ConfigError::Missing("KEY_VAULT_NAME"))?;
                let raw = get("KEY_VAULT_URL_TEMPLATE", DEFAULT_VAULT_URL_TEMPLATE);
                let url_template =
                    EndpointTemplate::vault(raw.clone()).map_err(|e| ConfigError::Invalid {
                        var: "KEY_VAULT_URL_TEMPLATE",
                        value: raw,
                        reason: e.to_string(),
                    })?;
                SecretSource::KeyVault {
                    vault_name,
                    url_template,
                }
            }
            "env" => SecretSource::Env {
                prefix: get("ENV_SECRET_PREFIX", DEFAULT_ENV_SECRET_PREFIX),
            },
            other => {
                return Err(ConfigError::Invalid {
                    var: "SECRET_PROVIDER",
                    value: other.to_string(),
                    reason: "expected 'keyvault' or 'env'".to_string(),
                })
            }
        };

        let defaults = SecretNames::default();
        let secret_names = SecretNames {
            application_id: get("SECRET_NAME_APP_ID", &defaults.application_id),
            application_secret: get("SECRET_NAME_APP_SECRET", &defaults.application_secret),
            tenant_id: get("SECRET_NAME_TENANT_ID", &defaults.tenant_id),
        };

        let raw_template = get("REFRESH_ENDPOINT_TEMPLATE", DEFAULT_ENDPOINT_TEMPLATE);
        let endpoint_template =
            EndpointTemplate::workspace(raw_template.clone()).map_err(|e| ConfigError::Invalid {
                var: "REFRESH_ENDPOINT_TEMPLATE",
                value: raw_template,
                reason: e.to_string(),
            })?;

        let raw_authority = get("AUTHORITY_HOST", DEFAULT_AUTHORITY_HOST);
        let authority_host = Url::parse(&raw_authority).map_err(|e| ConfigError::Invalid {
            var: "AUTHORITY_HOST",
            value: raw_authority.clone(),
            reason: e.to_string(),
        })?;

        let refresh_scope = get("REFRESH_SCOPE", DEFAULT_REFRESH_SCOPE);

        Ok(Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            trigger_token,
            strict_commands,
            invoker: InvokerConfig {
                secret_source,
                secret_names,
                endpoint_template,
                authority_host,
                refresh_scope,
            },
        })
    }
}

fn parse<T>(var: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        var,
        value: value.to_string(),
        reason: e.to_string(),
    })
}
