use std::env;

use anyhow::Context;
use uuid::Uuid;

use crate::domain::pricing::PricingPolicy;

/// Identity used when a request carries no `x-user-id` header.
pub const FALLBACK_DEFAULT_USER_ID: Uuid = Uuid::from_u128(0x0000_0000_0000_4000_8000_0000_0000_0001);

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub default_user_id: Uuid,
    pub pricing: PricingPolicy,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);
        let default_user_id = parse_or(env::var("DEFAULT_USER_ID").ok(), FALLBACK_DEFAULT_USER_ID)
            .context("DEFAULT_USER_ID must be a UUID")?;

        let defaults = PricingPolicy::default();
        let pricing = PricingPolicy {
            free_shipping_threshold: parse_or(
                env::var("FREE_SHIPPING_THRESHOLD").ok(),
                defaults.free_shipping_threshold,
            )
            .context("FREE_SHIPPING_THRESHOLD must be an integer")?,
            shipping_charge: parse_or(env::var("SHIPPING_CHARGE").ok(), defaults.shipping_charge)
                .context("SHIPPING_CHARGE must be an integer")?,
        };

        Ok(Self {
            port,
            database_url,
            host,
            default_user_id,
            pricing,
        })
    }

    /// Configuration pointing at `database_url` with every other setting at its default.
    pub fn with_database_url(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            host: "127.0.0.1".to_string(),
            port: 3000,
            default_user_id: FALLBACK_DEFAULT_USER_ID,
            pricing: PricingPolicy::default(),
        }
    }
}

fn parse_or<T>(raw: Option<String>, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match raw.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
        Some(value) => Ok(value.parse::<T>()?),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_or_blank_values_fall_back_to_default() {
        assert_eq!(parse_or::<i64>(None, 500).unwrap(), 500);
        assert_eq!(parse_or::<i64>(Some("  ".into()), 40).unwrap(), 40);
    }

    #[test]
    fn present_values_are_parsed() {
        assert_eq!(parse_or::<i64>(Some("750".into()), 500).unwrap(), 750);
        let id = Uuid::new_v4();
        assert_eq!(parse_or(Some(id.to_string()), FALLBACK_DEFAULT_USER_ID).unwrap(), id);
    }

    #[test]
    fn malformed_values_are_rejected() {
        assert!(parse_or::<i64>(Some("free".into()), 500).is_err());
        assert!(parse_or(Some("not-a-uuid".into()), FALLBACK_DEFAULT_USER_ID).is_err());
    }
}
