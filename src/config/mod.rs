use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub security: SecurityConfig,
    pub mail: MailConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    /// External base URL used when building links for outbound mail.
    pub base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// Secret used to sign session JWTs and the one-shot mail tokens.
    pub secret_key: String,
    pub session_expiry_hours: u64,
    pub reset_token_expiry_minutes: u64,
    /// Role assigned to freshly registered accounts.
    pub default_role: String,
    pub enable_cors: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailConfig {
    pub server: String,
    pub port: u16,
    pub use_tls: bool,
    pub username: Option<String>,
    pub password: Option<String>,
    pub default_sender: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Environment presets first, then specific env vars on top.
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        if let Ok(v) = env::var("TUTORHUB_PORT").or_else(|_| env::var("PORT")) {
            self.server.port = v.parse().unwrap_or(self.server.port);
        }
        if let Ok(v) = env::var("TUTORHUB_BASE_URL") {
            self.server.base_url = v;
        }

        if let Ok(v) = env::var("SECRET_KEY") {
            self.security.secret_key = v;
        }
        if let Ok(v) = env::var("SECURITY_SESSION_EXPIRY_HOURS") {
            self.security.session_expiry_hours = v.parse().unwrap_or(self.security.session_expiry_hours);
        }
        if let Ok(v) = env::var("SECURITY_RESET_TOKEN_EXPIRY_MINUTES") {
            self.security.reset_token_expiry_minutes =
                v.parse().unwrap_or(self.security.reset_token_expiry_minutes);
        }
        if let Ok(v) = env::var("SECURITY_DEFAULT_ROLE") {
            self.security.default_role = v;
        }
        if let Ok(v) = env::var("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }

        if let Ok(v) = env::var("MAIL_SERVER") {
            self.mail.server = v;
        }
        if let Ok(v) = env::var("MAIL_PORT") {
            self.mail.port = v.parse().unwrap_or(self.mail.port);
        }
        if let Ok(v) = env::var("MAIL_USE_TLS") {
            self.mail.use_tls = matches!(v.to_lowercase().as_str(), "true" | "1" | "t");
        }
        if let Ok(v) = env::var("MAIL_USERNAME") {
            self.mail.username = Some(v);
        }
        if let Ok(v) = env::var("MAIL_PASSWORD") {
            self.mail.password = Some(v);
        }
        if let Ok(v) = env::var("MAIL_DEFAULT_SENDER") {
            self.mail.default_sender = v;
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                port: 3000,
                base_url: "http://localhost:3000".to_string(),
            },
            security: SecurityConfig {
                secret_key: "dev-secret-change-me".to_string(),
                session_expiry_hours: 24 * 7, // 1 week
                reset_token_expiry_minutes: 30,
                default_role: "Student".to_string(),
                enable_cors: true,
            },
            mail: MailConfig {
                server: "localhost".to_string(),
                port: 1025,
                use_tls: false,
                username: None,
                password: None,
                default_sender: "noreply@example.com".to_string(),
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig {
                port: 3000,
                base_url: "https://staging.example.com".to_string(),
            },
            security: SecurityConfig {
                secret_key: String::new(),
                session_expiry_hours: 24,
                reset_token_expiry_minutes: 30,
                default_role: "Student".to_string(),
                enable_cors: true,
            },
            mail: MailConfig {
                server: "smtp.example.com".to_string(),
                port: 587,
                use_tls: true,
                username: None,
                password: None,
                default_sender: "noreply@example.com".to_string(),
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig {
                port: 3000,
                base_url: "https://app.example.com".to_string(),
            },
            security: SecurityConfig {
                secret_key: String::new(),
                session_expiry_hours: 4,
                reset_token_expiry_minutes: 15,
                default_role: "Student".to_string(),
                enable_cors: true,
            },
            mail: MailConfig {
                server: "smtp.example.com".to_string(),
                port: 587,
                use_tls: true,
                username: None,
                password: None,
                default_sender: "noreply@example.com".to_string(),
            },
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}
