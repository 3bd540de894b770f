use std::env;

use anyhow::Result;
use sqlx::PgPool;
use tracing::warn;

use crate::services::NotificationService;

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub database: String,
    pub ssl_mode: String,
}

impl DatabaseConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            host: env::var("DATABASE_HOST").unwrap_or_else(|_| "localhost".to_string()),
            port: env::var("DATABASE_PORT")
                .unwrap_or_else(|_| "5432".to_string())
                .parse()?,
            username: env::var("DATABASE_USER").unwrap_or_else(|_| "postgres".to_string()),
            password: env::var("DATABASE_PASSWORD")?,
            database: env::var("DATABASE_NAME").unwrap_or_else(|_| "enquiries".to_string()),
            ssl_mode: env::var("DATABASE_SSL_MODE").unwrap_or_else(|_| "prefer".to_string()),
        })
    }

    pub fn connection_string(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}?sslmode={}",
            self.username, self.password, self.host, self.port, self.database, self.ssl_mode
        )
    }
}

/// SMTP settings for the outcome notifier. Optional as a whole: when
/// `SMTP_HOST` is absent the service runs with notifications disabled.
#[derive(Debug, Clone)]
pub struct EmailSettings {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: String,
    pub smtp_password: String,
    pub use_starttls: bool,
    pub sender_email: String,
    pub receiver_emails: Vec<String>,
    pub error_group_emails: Vec<String>,
    pub connection_timeout_secs: u64,
}

impl EmailSettings {
    pub fn from_env() -> Result<Option<Self>> {
        let Ok(smtp_host) = env::var("SMTP_HOST") else {
            return Ok(None);
        };

        let receiver_emails = split_addresses(&env::var("RECEIVER_EMAIL")?);
        // Store failures go to the error-handling group when one is
        // configured, otherwise to the regular receivers.
        let error_group_emails = env::var("ERROR_GROUP_EMAIL")
            .map(|v| split_addresses(&v))
            .unwrap_or_else(|_| receiver_emails.clone());

        Ok(Some(Self {
            smtp_host,
            smtp_port: env::var("SMTP_PORT")
                .unwrap_or_else(|_| "587".to_string())
                .parse()?,
            smtp_username: env::var("SMTP_USERNAME").unwrap_or_default(),
            smtp_password: env::var("SMTP_PASSWORD").unwrap_or_default(),
            use_starttls: env::var("SMTP_USE_STARTTLS")
                .map(|v| v.parse().unwrap_or(true))
                .unwrap_or(true),
            sender_email: env::var("SENDER_EMAIL")?,
            receiver_emails,
            error_group_emails,
            connection_timeout_secs: env::var("SMTP_CONNECTION_TIMEOUT")
                .unwrap_or_else(|_| "30".to_string())
                .parse()?,
        }))
    }
}

fn split_addresses(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_pool: PgPool,
    pub server_host: String,
    pub server_port: u16,
    /// Page size for `/get-limited-records-by-env-variable`, from the LIMIT
    /// environment variable.
    pub record_limit: i64,
    pub notifications: NotificationService,
}

impl AppConfig {
    pub async fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let database_config = DatabaseConfig::from_env()?;
        let database_pool = PgPool::connect(&database_config.connection_string()).await?;

        let notifications = match EmailSettings::from_env()? {
            Some(settings) => NotificationService::new(&settings)?,
            None => {
                warn!("SMTP_HOST not set; outcome notifications are disabled");
                NotificationService::disabled()
            }
        };

        Ok(Self {
            database_pool,
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            server_port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            record_limit: env::var("LIMIT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10),
            notifications,
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}
