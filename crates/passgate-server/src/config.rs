//! Server configuration.

use std::time::Duration;

use clap::Parser;
use passgate_core::{AuthResult, CookieOptions, SessionOptions};

/// Passgate demo server command line arguments.
#[derive(Debug, Parser)]
#[command(name = "passgate-server")]
#[command(about = "Demo HTTP service for passgate authentication")]
pub struct Args {
    /// Address to listen on for HTTP requests.
    #[arg(short, long, env = "PASSGATE_LISTEN", default_value = "0.0.0.0:8080")]
    pub listen: String,

    /// Secret used to sign session tokens.
    #[arg(long, env = "PASSGATE_SECRET", hide_env_values = true)]
    pub secret: String,

    /// Name of the session cookie.
    #[arg(long, env = "PASSGATE_COOKIE_NAME", default_value = "__session")]
    pub cookie_name: String,

    /// Session token lifetime, e.g. "1h" or "30m".
    #[arg(long, env = "PASSGATE_SESSION_TTL", default_value = "1h", value_parser = humantime::parse_duration)]
    pub session_ttl: Duration,

    /// Issuer claim for session tokens.
    #[arg(long, env = "PASSGATE_ISSUER")]
    pub issuer: Option<String>,

    /// Audience claim for session tokens.
    #[arg(long, env = "PASSGATE_AUDIENCE")]
    pub audience: Option<String>,

    /// Mark the session cookie `Secure`.
    #[arg(long, env = "PASSGATE_SECURE_COOKIES")]
    pub secure_cookies: bool,

    /// Realm advertised in Basic challenges.
    #[arg(long, env = "PASSGATE_REALM", default_value = "passgate")]
    pub realm: String,

    /// Demo accounts as `username:password`.
    #[arg(long = "user", env = "PASSGATE_USERS", value_delimiter = ',', default_value = "alice:wonderland")]
    pub users: Vec<String>,
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to listen on for HTTP requests.
    pub listen_addr: String,
    /// Token signing secret.
    pub secret: String,
    /// Session cookie name.
    pub cookie_name: String,
    /// Session token lifetime.
    pub session_ttl: Duration,
    /// Issuer claim.
    pub issuer: Option<String>,
    /// Audience claim.
    pub audience: Option<String>,
    /// Whether the session cookie is `Secure`.
    pub secure_cookies: bool,
    /// Basic challenge realm.
    pub realm: String,
    /// Demo accounts as `username:password`.
    pub users: Vec<String>,
}

impl ServerConfig {
    /// Session options derived from this configuration.
    pub fn session_options(&self) -> AuthResult<SessionOptions> {
        let mut options = SessionOptions::new(self.secret.clone())
            .with_name(self.cookie_name.clone())
            .with_expires_in(self.session_ttl)
            .with_cookie(CookieOptions::default().with_secure(self.secure_cookies));
        if let Some(issuer) = &self.issuer {
            options = options.with_issuer(issuer.clone());
        }
        if let Some(audience) = &self.audience {
            options = options.with_audience(audience.clone());
        }
        options.validate()?;
        Ok(options)
    }
}

impl From<&Args> for ServerConfig {
    fn from(args: &Args) -> Self {
        Self {
            listen_addr: args.listen.clone(),
            secret: args.secret.clone(),
            cookie_name: args.cookie_name.clone(),
            session_ttl: args.session_ttl,
            issuer: args.issuer.clone(),
            audience: args.audience.clone(),
            secure_cookies: args.secure_cookies,
            realm: args.realm.clone(),
            users: args.users.clone(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".to_string(),
            secret: String::new(),
            cookie_name: "__session".to_string(),
            session_ttl: Duration::from_secs(60 * 60),
            issuer: None,
            audience: None,
            secure_cookies: false,
            realm: "passgate".to_string(),
            users: vec!["alice:wonderland".to_string()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_to_config() {
        let args = Args::parse_from([
            "passgate-server",
            "--secret",
            "s3cret",
            "--session-ttl",
            "30m",
            "--user",
            "alice:a,bob:b",
            "--issuer",
            "passgate",
        ]);
        let config = ServerConfig::from(&args);

        assert_eq!(config.session_ttl, Duration::from_secs(30 * 60));
        assert_eq!(config.users, vec!["alice:a", "bob:b"]);
        assert_eq!(config.issuer.as_deref(), Some("passgate"));
        assert_eq!(config.cookie_name, "__session");
    }

    #[test]
    fn test_session_options_require_secret() {
        assert!(ServerConfig::default().session_options().is_err());

        let config = ServerConfig {
            secret: "s3cret".to_string(),
            issuer: Some("passgate".to_string()),
            ..Default::default()
        };
        let options = config.session_options().unwrap();
        assert_eq!(options.issuer.as_deref(), Some("passgate"));
        assert_eq!(options.expires_in, Duration::from_secs(3600));
    }
}
