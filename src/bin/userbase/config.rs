use anyhow::{Context, Result};
use std::env;
use userbase::config::driver_from_env;
use userbase::ConnectionParams;

pub fn database_url() -> Option<String> {
    if let Ok(v) = env::var("DATABASE_URL") {
        if !v.is_empty() {
            return Some(v);
        }
    }

    None
}

// DATABASE_URL wins over the separate DATABASE_* variables
pub fn connection() -> Result<(String, ConnectionParams)> {
    match database_url() {
        Some(url) => {
            let (driver, params) =
                ConnectionParams::from_url(&url).context("Couldn't parse DATABASE_URL")?;
            Ok((driver.as_str().to_string(), params))
        }
        None => {
            let params = ConnectionParams::from_env().context("Couldn't read DATABASE_* variables")?;
            Ok((driver_from_env(), params))
        }
    }
}
