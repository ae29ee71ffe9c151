use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use tracing_subscriber::EnvFilter;
use worksuite_core::AppError;

const DEFAULT_FRONTEND_URL: &str = "http://localhost:3000";
const DEFAULT_DATABASE_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_SESSION_IDLE_MINUTES: u32 = 30;
const MIN_SESSION_SECRET_LENGTH: usize = 32;

/// What the binary does after loading configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiCommand {
    /// Runs migrations, then serves HTTP.
    Serve,
    /// Runs migrations and exits.
    Migrate,
    /// Runs migrations, seeds the development tenant and exits.
    Seed,
}

impl ApiCommand {
    fn parse(argument: Option<&str>) -> Result<Self, AppError> {
        match argument {
            None | Some("serve") => Ok(Self::Serve),
            Some("migrate") => Ok(Self::Migrate),
            Some("seed") => Ok(Self::Seed),
            Some(other) => Err(AppError::Validation(format!(
                "unknown command '{other}', expected 'serve', 'migrate' or 'seed'"
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub command: ApiCommand,
    pub database_url: String,
    pub database_max_connections: u32,
    pub frontend_url: String,
    pub bootstrap_token: String,
    pub api_host: String,
    pub api_port: u16,
    pub cookie_secure: bool,
    pub session_idle_minutes: u32,
}

impl ApiConfig {
    pub fn load() -> Result<Self, AppError> {
        let command = env::args().nth(1);
        Self::from_lookup(command.as_deref(), |name| env::var(name).ok())
    }

    /// Builds the configuration from a variable lookup.
    pub fn from_lookup<F>(command: Option<&str>, lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let command = ApiCommand::parse(command)?;

        let database_url = required_non_empty(&lookup, "DATABASE_URL")?;
        let database_max_connections = positive_or_default(
            &lookup,
            "DATABASE_MAX_CONNECTIONS",
            DEFAULT_DATABASE_MAX_CONNECTIONS,
        )?;

        let frontend_url = lookup("FRONTEND_URL")
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_FRONTEND_URL.to_owned());
        let bootstrap_token = required_non_empty(&lookup, "AUTH_BOOTSTRAP_TOKEN")?;
        let session_secret = required_non_empty(&lookup, "SESSION_SECRET")?;
        if session_secret.len() < MIN_SESSION_SECRET_LENGTH {
            return Err(AppError::Validation(format!(
                "SESSION_SECRET must be at least {MIN_SESSION_SECRET_LENGTH} characters"
            )));
        }

        let api_host = lookup("API_HOST").unwrap_or_else(|| "127.0.0.1".to_owned());
        let api_port = match lookup("API_PORT") {
            Some(value) => value.trim().parse::<u16>().map_err(|error| {
                AppError::Validation(format!("invalid API_PORT '{value}': {error}"))
            })?,
            None => 3001,
        };
        let cookie_secure = lookup("SESSION_COOKIE_SECURE")
            .unwrap_or_else(|| "false".to_owned())
            .eq_ignore_ascii_case("true");
        let session_idle_minutes = positive_or_default(
            &lookup,
            "SESSION_IDLE_MINUTES",
            DEFAULT_SESSION_IDLE_MINUTES,
        )?;

        Ok(Self {
            command,
            database_url,
            database_max_connections,
            frontend_url,
            bootstrap_token,
            api_host,
            api_port,
            cookie_secure,
            session_idle_minutes,
        })
    }

    pub fn socket_address(&self) -> Result<SocketAddr, AppError> {
        let host = IpAddr::from_str(&self.api_host).map_err(|error| {
            AppError::Validation(format!("invalid API_HOST '{}': {error}", self.api_host))
        })?;
        Ok(SocketAddr::from((host, self.api_port)))
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn required_non_empty<F>(lookup: &F, name: &str) -> Result<String, AppError>
where
    F: Fn(&str) -> Option<String>,
{
    let value = lookup(name).ok_or_else(|| AppError::Validation(format!("{name} is required")))?;
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{name} must not be empty")));
    }

    Ok(value)
}

fn positive_or_default<F>(lookup: &F, name: &str, default: u32) -> Result<u32, AppError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(value) = lookup(name) else {
        return Ok(default);
    };

    value
        .trim()
        .parse::<u32>()
        .ok()
        .filter(|parsed| *parsed > 0)
        .ok_or_else(|| {
            AppError::Validation(format!("{name} must be a positive integer, got '{value}'"))
        })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use worksuite_core::AppError;

    use super::{ApiCommand, ApiConfig};

    fn base_env() -> HashMap<&'static str, String> {
        HashMap::from([
            ("DATABASE_URL", "postgres://localhost/worksuite".to_owned()),
            ("AUTH_BOOTSTRAP_TOKEN", "bootstrap".to_owned()),
            ("SESSION_SECRET", "s".repeat(32)),
        ])
    }

    fn load(
        command: Option<&str>,
        vars: &HashMap<&'static str, String>,
    ) -> Result<ApiConfig, AppError> {
        ApiConfig::from_lookup(command, |name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_apply_when_optional_values_are_missing() {
        let Ok(config) = load(None, &base_env()) else {
            panic!("config should load");
        };

        assert_eq!(config.command, ApiCommand::Serve);
        assert_eq!(config.database_max_connections, 10);
        assert_eq!(config.frontend_url, "http://localhost:3000");
        assert_eq!(config.api_port, 3001);
        assert!(!config.cookie_secure);
        assert_eq!(config.session_idle_minutes, 30);
        assert_eq!(
            config
                .socket_address()
                .map(|address| address.to_string())
                .ok(),
            Some("127.0.0.1:3001".to_owned())
        );
    }

    #[test]
    fn short_session_secret_is_rejected() {
        let mut vars = base_env();
        vars.insert("SESSION_SECRET", "too-short".to_owned());

        assert!(matches!(load(None, &vars), Err(AppError::Validation(_))));
    }

    #[test]
    fn missing_database_url_is_rejected() {
        let mut vars = base_env();
        vars.remove("DATABASE_URL");

        let Err(AppError::Validation(message)) = load(None, &vars) else {
            panic!("expected validation error");
        };
        assert!(message.contains("DATABASE_URL"));
    }

    #[test]
    fn invalid_numbers_fail_fast() {
        let mut vars = base_env();
        vars.insert("DATABASE_MAX_CONNECTIONS", "0".to_owned());
        assert!(matches!(load(None, &vars), Err(AppError::Validation(_))));

        let mut vars = base_env();
        vars.insert("SESSION_IDLE_MINUTES", "-5".to_owned());
        assert!(matches!(load(None, &vars), Err(AppError::Validation(_))));

        let mut vars = base_env();
        vars.insert("API_PORT", "http".to_owned());
        assert!(matches!(load(None, &vars), Err(AppError::Validation(_))));
    }

    #[test]
    fn commands_are_parsed() {
        let vars = base_env();
        assert_eq!(
            load(Some("migrate"), &vars)
                .map(|config| config.command)
                .ok(),
            Some(ApiCommand::Migrate)
        );
        assert_eq!(
            load(Some("seed"), &vars).map(|config| config.command).ok(),
            Some(ApiCommand::Seed)
        );
        assert!(matches!(
            load(Some("drop"), &vars),
            Err(AppError::Validation(_))
        ));
    }
}
