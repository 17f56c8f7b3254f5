use anyhow::Context;
use serde::Deserialize;

/// One year.
const MAX_TTL_MINUTES: i64 = 60 * 24 * 365;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub access_secret: String,
    pub access_ttl_minutes: i64,
    pub refresh_secret: String,
    pub refresh_ttl_minutes: i64,
}

impl JwtConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        for (name, minutes) in [
            ("ACCESS_TOKEN_TTL_MINUTES", self.access_ttl_minutes),
            ("REFRESH_TOKEN_TTL_MINUTES", self.refresh_ttl_minutes),
        ] {
            anyhow::ensure!(
                (1..=MAX_TTL_MINUTES).contains(&minutes),
                "{} must be between 1 and {}",
                name,
                MAX_TTL_MINUTES
            );
        }
        anyhow::ensure!(
            self.access_secret != self.refresh_secret,
            "ACCESS_TOKEN_SECRET and REFRESH_TOKEN_SECRET must differ"
        );
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MediaConfig {
    pub endpoint: String,
    pub bucket: String,
    pub access_key: String,
    pub secret_key: String,
    pub region: String,
    /// Base URL that uploaded objects are publicly reachable under.
    pub public_url: String,
    /// Where multipart files are staged before they are handed to the uploader.
    pub temp_dir: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub media: MediaConfig,
    pub cookie_secure: bool,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL")?;
        let jwt = JwtConfig {
            access_secret: std::env::var("ACCESS_TOKEN_SECRET").context("ACCESS_TOKEN_SECRET")?,
            access_ttl_minutes: env_parse("ACCESS_TOKEN_TTL_MINUTES").unwrap_or(60 * 24),
            refresh_secret: std::env::var("REFRESH_TOKEN_SECRET").context("REFRESH_TOKEN_SECRET")?,
            refresh_ttl_minutes: env_parse("REFRESH_TOKEN_TTL_MINUTES").unwrap_or(60 * 24 * 10),
        };
        jwt.validate()?;

        let endpoint = std::env::var("MEDIA_ENDPOINT").context("MEDIA_ENDPOINT")?;
        let bucket = std::env::var("MEDIA_BUCKET").context("MEDIA_BUCKET")?;
        let public_url = std::env::var("MEDIA_PUBLIC_URL")
            .unwrap_or_else(|_| format!("{}/{}", endpoint.trim_end_matches('/'), bucket));
        let media = MediaConfig {
            access_key: std::env::var("MEDIA_ACCESS_KEY").context("MEDIA_ACCESS_KEY")?,
            secret_key: std::env::var("MEDIA_SECRET_KEY").context("MEDIA_SECRET_KEY")?,
            region: std::env::var("MEDIA_REGION").unwrap_or_else(|_| "us-east-1".into()),
            temp_dir: std::env::var("UPLOAD_TEMP_DIR").unwrap_or_else(|_| "./public/temp".into()),
            endpoint,
            bucket,
            public_url,
        };

        let cookie_secure = std::env::var("COOKIE_SECURE")
            .map(|v| v != "false" && v != "0")
            .unwrap_or(true);

        Ok(Self {
            database_url,
            jwt,
            media,
            cookie_secure,
        })
    }
}

fn env_parse(key: &str) -> Option<i64> {
    std::env::var(key).ok().and_then(|v| v.parse::<i64>().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jwt(access_ttl_minutes: i64) -> JwtConfig {
        JwtConfig {
            access_secret: "a".into(),
            access_ttl_minutes,
            refresh_secret: "r".into(),
            refresh_ttl_minutes: 60,
        }
    }

    #[test]
    fn accepts_sane_lifetimes() {
        assert!(jwt(15).validate().is_ok());
        assert!(jwt(MAX_TTL_MINUTES).validate().is_ok());
    }

    #[test]
    fn rejects_lifetimes_out_of_range() {
        assert!(jwt(0).validate().is_err());
        assert!(jwt(-5).validate().is_err());
        assert!(jwt(1_000_000_000_000).validate().is_err());
    }

    #[test]
    fn rejects_shared_secret() {
        let mut cfg = jwt(15);
        cfg.refresh_secret = cfg.access_secret.clone();
        assert!(cfg.validate().is_err());
    }
}
