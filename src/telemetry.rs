//! Log output setup.
//!
//! `RUST_LOG` picks the filter and defaults to `info`. Load `.env` before
//! calling [`init_tracing`] so a filter set there takes effect.

use anyhow::{anyhow, Result};
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info";

pub fn log_filter(var: impl Fn(&str) -> Option<String>) -> EnvFilter {
    var("RUST_LOG")
        .filter(|directives| !directives.is_empty())
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_FILTER))
}

pub fn init_tracing() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(|name| std::env::var(name).ok()))
        .compact()
        .try_init()
        .map_err(|err| anyhow!(err))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::fs;

    use super::*;

    #[test]
    fn filter_comes_from_an_env_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        fs::write(&path, "RUST_LOG=movie_api=debug\nPORT=9000\n").unwrap();

        let vars: HashMap<String, String> = dotenv::from_path_iter(&path)
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();

        let filter = log_filter(|name| vars.get(name).cloned());
        assert_eq!(filter.to_string(), "movie_api=debug");
    }

    #[test]
    fn missing_or_broken_filter_falls_back_to_info() {
        assert_eq!(log_filter(|_| None).to_string(), "info");
        assert_eq!(log_filter(|_| Some(String::new())).to_string(), "info");
        assert_eq!(
            log_filter(|_| Some("movie_api=loud".to_owned())).to_string(),
            "info"
        );
    }
}
