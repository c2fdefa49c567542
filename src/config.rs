use tracing::warn;

/// Fallback signing secret for local development only.
pub const DEV_JWT_SECRET: &str = "dev-secret-change-in-production";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    fn parse(raw: Option<&str>) -> anyhow::Result<Self> {
        match raw.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
            None | Some("") | Some("development") | Some("dev") => Ok(Self::Development),
            Some("production") | Some("prod") => Ok(Self::Production),
            Some(other) => anyhow::bail!("unknown APP_ENV {other:?}"),
        }
    }
}

#[derive(Clone)]
pub struct JwtConfig {
    pub secret: String,
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig").field("secret", &"<redacted>").finish()
    }
}

#[derive(Debug, Clone)]
pub struct DynamoConfig {
    pub table_name: String,
    pub region: String,
    pub endpoint: Option<String>,
    pub static_credentials: Option<(String, String)>,
}

#[derive(Debug, Clone)]
pub enum StoreConfig {
    Memory,
    DynamoDb(DynamoConfig),
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: Environment,
    pub host: String,
    pub port: u16,
    pub jwt: JwtConfig,
    pub store: StoreConfig,
    /// New accounts start unverified and cannot log in until confirmed.
    pub require_email_verification: bool,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let environment = Environment::parse(var("APP_ENV").as_deref())?;
        let secret = resolve_jwt_secret(environment, var("JWT_SECRET"))?;

        let store = match var("STORE_BACKEND").as_deref().unwrap_or("memory") {
            "memory" => StoreConfig::Memory,
            "dynamodb" => StoreConfig::DynamoDb(DynamoConfig {
                table_name: var("USERS_TABLE").unwrap_or_else(|| "Users".into()),
                region: var("AWS_REGION").unwrap_or_else(|| "us-east-1".into()),
                endpoint: var("DYNAMODB_ENDPOINT"),
                static_credentials: var("DYNAMODB_ACCESS_KEY").zip(var("DYNAMODB_SECRET_KEY")),
            }),
            other => anyhow::bail!("unknown STORE_BACKEND {other:?}, expected memory or dynamodb"),
        };

        let port = match var("APP_PORT") {
            Some(p) => p
                .parse()
                .map_err(|e| anyhow::anyhow!("invalid APP_PORT {p:?}: {e}"))?,
            None => 8080,
        };

        Ok(Self {
            environment,
            host: var("APP_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port,
            jwt: JwtConfig { secret },
            store,
            require_email_verification: var("REQUIRE_EMAIL_VERIFICATION")
                .map(|v| parse_flag("REQUIRE_EMAIL_VERIFICATION", &v))
                .transpose()?
                .unwrap_or(false),
        })
    }
}

fn parse_flag(name: &str, raw: &str) -> anyhow::Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => anyhow::bail!("invalid {name} {other:?}: expected true or false"),
    }
}

/// Production refuses to start without a real secret; development falls back
/// to [`DEV_JWT_SECRET`] and says so loudly.
pub fn resolve_jwt_secret(env: Environment, raw: Option<String>) -> anyhow::Result<String> {
    let configured = raw.filter(|s| !s.trim().is_empty());
    match (env, configured) {
        (Environment::Production, None) => {
            anyhow::bail!("JWT_SECRET must be set when APP_ENV=production")
        }
        (Environment::Production, Some(s)) if s == DEV_JWT_SECRET => {
            anyhow::bail!("JWT_SECRET is the development default; refusing to start in production")
        }
        (Environment::Development, None) => {
            warn!("JWT_SECRET not set, using the insecure development default; never deploy this");
            Ok(DEV_JWT_SECRET.to_owned())
        }
        (Environment::Development, Some(s)) if s == DEV_JWT_SECRET => {
            warn!("JWT_SECRET is the insecure development default; never deploy this");
            Ok(s)
        }
        (_, Some(s)) => Ok(s),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> anyhow::Result<AppConfig> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|k| vars.get(k).cloned())
    }

    #[test]
    fn defaults_to_memory_store_in_development() {
        let cfg = load(&[]).unwrap();
        assert_eq!(cfg.environment, Environment::Development);
        assert_eq!(cfg.jwt.secret, DEV_JWT_SECRET);
        assert!(matches!(cfg.store, StoreConfig::Memory));
        assert_eq!(cfg.port, 8080);
        assert!(!cfg.require_email_verification);
    }

    #[test]
    fn production_requires_a_real_secret() {
        assert!(load(&[("APP_ENV", "production")]).is_err());
        assert!(load(&[("APP_ENV", "production"), ("JWT_SECRET", DEV_JWT_SECRET)]).is_err());
        let cfg = load(&[("APP_ENV", "production"), ("JWT_SECRET", "s3cr3t")]).unwrap();
        assert_eq!(cfg.jwt.secret, "s3cr3t");
    }

    #[test]
    fn dynamodb_backend_reads_table_settings() {
        let cfg = load(&[
            ("STORE_BACKEND", "dynamodb"),
            ("USERS_TABLE", "Accounts"),
            ("DYNAMODB_ENDPOINT", "http://localhost:8000"),
        ])
        .unwrap();
        match cfg.store {
            StoreConfig::DynamoDb(d) => {
                assert_eq!(d.table_name, "Accounts");
                assert_eq!(d.region, "us-east-1");
                assert_eq!(d.endpoint.as_deref(), Some("http://localhost:8000"));
                assert!(d.static_credentials.is_none());
            }
            StoreConfig::Memory => panic!("expected dynamodb"),
        }
    }

    #[test]
    fn rejects_unknown_values() {
        assert!(load(&[("STORE_BACKEND", "postgres")]).is_err());
        assert!(load(&[("APP_ENV", "staging")]).is_err());
        assert!(load(&[("APP_PORT", "eighty")]).is_err());
    }

    #[test]
    fn verification_flag_ignores_case() {
        let flag = |v: &str| {
            load(&[("REQUIRE_EMAIL_VERIFICATION", v)]).map(|c| c.require_email_verification)
        };
        assert!(flag("TRUE").unwrap());
        assert!(flag(" Yes ").unwrap());
        assert!(flag("1").unwrap());
        assert!(!flag("False").unwrap());
        assert!(!flag("off").unwrap());
        assert!(flag("maybe").is_err());
    }

    #[test]
    fn debug_output_redacts_secret() {
        let cfg = load(&[("JWT_SECRET", "do-not-print")]).unwrap();
        assert!(!format!("{cfg:?}").contains("do-not-print"));
    }
}
