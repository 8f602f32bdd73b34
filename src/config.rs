use chrono::FixedOffset;
use secrecy::Secret;
use sqlx::postgres::PgConnectOptions;
use std::time::Duration;

const DEFAULT_LOAN_DURATION_SECS: u64 = 60;
const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 60;

#[derive(Debug, Clone)]
pub struct Config {
    // Database
    pub db_host: String,
    pub db_port: u16,
    pub db_user: String,
    pub db_password: Secret<String>,
    pub db_name: String,

    // HTTP listener
    pub bind_host: String,
    pub port: u16,

    // Loans
    /// Demo value is one minute; real deployments use hours.
    pub loan_duration: Duration,
    pub sweep_interval: Duration,

    /// Offset used when showing times to people, e.g. +05:30 for IST
    pub display_offset: FixedOffset,
}

impl Config {
    pub fn from_env() -> Result<Self, config::ConfigError> {
        // Load .env file if it exists (for local development)
        let _ = dotenvy::dotenv();

        let settings = config::Config::builder()
            .add_source(config::Environment::default().separator("__"))
            .build()?;

        Self::from_settings(&settings)
    }

    pub fn from_settings(config: &config::Config) -> Result<Self, config::ConfigError> {
        Ok(Self {
            db_host: config
                .get("db_host")
                .unwrap_or_else(|_| "localhost".to_string()),
            db_port: config.get("db_port").unwrap_or(5432),
            db_user: config.get("db_user")?,
            db_password: Secret::new(config.get("db_pass")?),
            db_name: config
                .get("db_name")
                .unwrap_or_else(|_| "sports_equipment_db".to_string()),

            bind_host: config
                .get("bind_host")
                .unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: config.get("port").unwrap_or(8080),

            loan_duration: Duration::from_secs(
                config
                    .get("loan_duration_secs")
                    .unwrap_or(DEFAULT_LOAN_DURATION_SECS),
            ),
            sweep_interval: Duration::from_secs(
                config
                    .get("sweep_interval_secs")
                    .unwrap_or(DEFAULT_SWEEP_INTERVAL_SECS),
            ),

            display_offset: display_offset(
                config.get("display_utc_offset_minutes").unwrap_or(0),
            )?,
        })
    }

    pub fn connect_options(&self) -> PgConnectOptions {
        use secrecy::ExposeSecret;

        PgConnectOptions::new()
            .host(&self.db_host)
            .port(self.db_port)
            .username(&self.db_user)
            .password(self.db_password.expose_secret())
            .database(&self.db_name)
    }
}

fn display_offset(minutes: i32) -> Result<FixedOffset, config::ConfigError> {
    minutes
        .checked_mul(60)
        .and_then(FixedOffset::east_opt)
        .ok_or_else(|| {
            config::ConfigError::Message(format!(
                "DISPLAY_UTC_OFFSET_MINUTES out of range: {minutes}"
            ))
        })
}
