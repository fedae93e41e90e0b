use anyhow::Result;
use serde::Deserialize;
use anyhow::anyhow;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub payment: PaymentConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub mail: MailConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub worker_threads: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".into(), port: 8080, worker_threads: Some(4) }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
    #[serde(default = "default_max_lifetime")]
    pub max_lifetime_secs: u64,
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,
    #[serde(default)]
    pub sqlx_logging: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connect_timeout_secs: default_connect_timeout(),
            idle_timeout_secs: default_idle_timeout(),
            max_lifetime_secs: default_max_lifetime(),
            acquire_timeout_secs: default_acquire_timeout(),
            sqlx_logging: false,
        }
    }
}

fn default_max_connections() -> u32 { 10 }
fn default_min_connections() -> u32 { 2 }
fn default_connect_timeout() -> u64 { 30 }
fn default_idle_timeout() -> u64 { 600 }
fn default_max_lifetime() -> u64 { 3600 }
fn default_acquire_timeout() -> u64 { 30 }

/// Payment gateway (Stripe-compatible charges API)
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentConfig {
    #[serde(default = "default_payment_api_base")]
    pub api_base: String,
    /// Usually supplied through `STRIPE_SECRET_KEY`
    #[serde(default)]
    pub secret_key: String,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default = "default_payment_timeout")]
    pub timeout_secs: u64,
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            api_base: default_payment_api_base(),
            secret_key: String::new(),
            currency: default_currency(),
            timeout_secs: default_payment_timeout(),
        }
    }
}

fn default_payment_api_base() -> String { "https://api.stripe.com".into() }
fn default_currency() -> String { "usd".into() }
fn default_payment_timeout() -> u64 { 20 }

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Lifetime of a cached course list page; 15 minutes by default
    #[serde(default = "default_course_list_ttl")]
    pub course_list_ttl_secs: u64,
    #[serde(default = "default_cache_entries")]
    pub max_entries: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { course_list_ttl_secs: default_course_list_ttl(), max_entries: default_cache_entries() }
    }
}

fn default_course_list_ttl() -> u64 { 15 * 60 }
fn default_cache_entries() -> u64 { 1_000 }

#[derive(Debug, Clone, Deserialize)]
pub struct MailConfig {
    #[serde(default = "default_from_address")]
    pub from_address: String,
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self { from_address: default_from_address(), queue_capacity: default_queue_capacity() }
    }
}

fn default_from_address() -> String { "no-reply@learningplatform.com".into() }
fn default_queue_capacity() -> usize { 256 }

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// `"compact"` or `"json"`
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self { Self { format: default_log_format() } }
}

fn default_log_format() -> String { "compact".into() }

pub fn load_default() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    load_from_file(&path)
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    parse(&content)
}

pub fn parse(content: &str) -> Result<AppConfig> {
    let cfg: AppConfig = toml::from_str(content)?;
    Ok(cfg)
}

impl AppConfig {
    /// Load `config.toml` (or `CONFIG_PATH`), falling back to defaults when the file
    /// is missing, then apply environment overrides and validate.
    pub fn load_and_validate() -> Result<Self> {
        let mut cfg = match load_default() {
            Ok(cfg) => cfg,
            Err(e) if is_missing_file(&e) => AppConfig::default(),
            Err(e) => return Err(e),
        };
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.server.normalize()?;
        self.database.normalize_from_env();
        self.database.validate()?;
        self.payment.normalize_from_env();
        self.payment.validate()?;
        self.cache.validate()?;
        self.mail.validate()?;
        Ok(())
    }
}

fn is_missing_file(e: &anyhow::Error) -> bool {
    e.downcast_ref::<std::io::Error>()
        .map(|io| io.kind() == std::io::ErrorKind::NotFound)
        .unwrap_or(false)
}

impl ServerConfig {
    fn normalize(&mut self) -> Result<()> {
        if let Ok(host) = std::env::var("SERVER_HOST") {
            self.host = host;
        }
        if let Some(port) = std::env::var("SERVER_PORT").ok().and_then(|p| p.parse::<u16>().ok()) {
            self.port = port;
        }
        if self.host.trim().is_empty() {
            self.host = "127.0.0.1".to_string();
        }
        if self.port == 0 {
            return Err(anyhow!("server.port must be within 1..=65535"));
        }
        match self.worker_threads {
            Some(0) | None => self.worker_threads = Some(4),
            Some(_) => {}
        }
        Ok(())
    }
}

impl DatabaseConfig {
    pub fn normalize_from_env(&mut self) {
        if self.url.trim().is_empty() {
            if let Ok(url) = std::env::var("DATABASE_URL") {
                self.url = url;
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(anyhow!("database.url is empty; set it in config.toml or DATABASE_URL"));
        }
        let lower = self.url.to_lowercase();
        if !(lower.starts_with("postgresql://") || lower.starts_with("postgres://")) {
            return Err(anyhow!("database.url must start with postgresql:// or postgres://"));
        }
        if self.min_connections == 0 {
            return Err(anyhow!("database.min_connections must be >= 1"));
        }
        if self.max_connections < self.min_connections {
            return Err(anyhow!("database.max_connections must be >= min_connections"));
        }
        if self.connect_timeout_secs == 0 || self.acquire_timeout_secs == 0 {
            return Err(anyhow!("database timeouts must be positive seconds"));
        }
        Ok(())
    }
}

impl PaymentConfig {
    pub fn normalize_from_env(&mut self) {
        if let Ok(key) = std::env::var("STRIPE_SECRET_KEY") {
            self.secret_key = key;
        }
        if let Ok(base) = std::env::var("PAYMENT_API_BASE") {
            self.api_base = base;
        }
        self.api_base = self.api_base.trim_end_matches('/').to_string();
        self.currency = self.currency.to_lowercase();
    }

    pub fn validate(&self) -> Result<()> {
        if self.secret_key.trim().is_empty() {
            return Err(anyhow!("payment.secret_key is empty; set it in config.toml or STRIPE_SECRET_KEY"));
        }
        if !(self.api_base.starts_with("https://") || self.api_base.starts_with("http://")) {
            return Err(anyhow!("payment.api_base must be an http(s) URL"));
        }
        if self.currency.len() != 3 {
            return Err(anyhow!("payment.currency must be a 3-letter ISO code"));
        }
        if self.timeout_secs == 0 {
            return Err(anyhow!("payment.timeout_secs must be positive"));
        }
        Ok(())
    }
}

impl CacheConfig {
    pub fn validate(&self) -> Result<()> {
        if self.course_list_ttl_secs == 0 {
            return Err(anyhow!("cache.course_list_ttl_secs must be positive"));
        }
        if self.max_entries == 0 {
            return Err(anyhow!("cache.max_entries must be positive"));
        }
        Ok(())
    }
}

impl MailConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.from_address.contains('@') {
            return Err(anyhow!("mail.from_address must be an email address"));
        }
        if self.queue_capacity == 0 {
            return Err(anyhow!("mail.queue_capacity must be positive"));
        }
        Ok(())
    }
}
