use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

const DEFAULT_ARTICLES_PER_PAGE: usize = 12;
const DEFAULT_SEARCH_RESULTS_PER_PAGE: usize = 20;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub portal: PortalConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            portal: PortalConfig::from_env()?,
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Paging sizes and the optional administrator created at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortalConfig {
    pub articles_per_page: usize,
    pub search_results_per_page: usize,
    pub admin: Option<AdminBootstrap>,
}

impl PortalConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let articles_per_page = page_size("PORTAL_ARTICLES_PER_PAGE", DEFAULT_ARTICLES_PER_PAGE)?;
        let search_results_per_page = page_size(
            "PORTAL_SEARCH_RESULTS_PER_PAGE",
            DEFAULT_SEARCH_RESULTS_PER_PAGE,
        )?;

        let admin = match (
            env::var("PORTAL_ADMIN_USERNAME"),
            env::var("PORTAL_ADMIN_EMAIL"),
            env::var("PORTAL_ADMIN_PASSWORD"),
        ) {
            (Ok(username), Ok(email), Ok(password)) => Some(AdminBootstrap {
                username,
                email,
                password,
            }),
            (Err(_), Err(_), Err(_)) => None,
            _ => return Err(ConfigError::IncompleteAdmin),
        };

        Ok(Self {
            articles_per_page,
            search_results_per_page,
            admin,
        })
    }
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            articles_per_page: DEFAULT_ARTICLES_PER_PAGE,
            search_results_per_page: DEFAULT_SEARCH_RESULTS_PER_PAGE,
            admin: None,
        }
    }
}

fn page_size(var: &'static str, default: usize) -> Result<usize, ConfigError> {
    match env::var(var) {
        Ok(raw) => match raw.trim().parse::<usize>() {
            Ok(value) if value > 0 => Ok(value),
            _ => Err(ConfigError::InvalidPageSize { var }),
        },
        Err(_) => Ok(default),
    }
}

/// Credentials for the administrator account ensured at startup.
#[derive(Clone, PartialEq, Eq)]
pub struct AdminBootstrap {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl fmt::Debug for AdminBootstrap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminBootstrap")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidPageSize { var: &'static str },
    IncompleteAdmin,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidPageSize { var } => {
                write!(f, "{var} must be a positive integer")
            }
            ConfigError::IncompleteAdmin => write!(
                f,
                "PORTAL_ADMIN_USERNAME, PORTAL_ADMIN_EMAIL and PORTAL_ADMIN_PASSWORD must be set together"
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidPageSize { .. }
            | ConfigError::IncompleteAdmin => None,
        }
    }
}
