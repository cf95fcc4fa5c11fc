use crate::options::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use anyhow::{anyhow, Result};
use clap::Parser;
use std::env;

/// kristx - Krist block explorer table
///
/// Paginated, sortable view of the blocks on a Krist node.
/// Configuration priority: CLI args > Environment variables > Defaults
#[derive(Parser, Debug, Default)]
#[command(name = "kristx")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Krist block explorer table", long_about = None)]
pub struct CliArgs {
    /// Krist node base URL
    #[arg(long, env = "KRIST_NODE_URL")]
    pub node_url: Option<String>,

    /// Lookup request timeout in milliseconds (1000-60000)
    #[arg(long, env = "KRIST_TIMEOUT_MS")]
    pub timeout_ms: Option<u64>,

    /// Retry attempts for rate-limited or failed lookups (0-10)
    #[arg(long, env = "KRIST_RETRIES")]
    pub retries: Option<u8>,

    /// Rows per page (1-1000)
    #[arg(long, env = "PAGE_SIZE")]
    pub page_size: Option<u32>,

    /// Target UI rendering FPS (1-120)
    #[arg(long, env = "RENDER_FPS")]
    pub render_fps: Option<u32>,

    /// Re-run the current lookup every N milliseconds (0 disables, otherwise 1000-600000)
    #[arg(long, env = "REFRESH_INTERVAL_MS")]
    pub refresh_interval_ms: Option<u64>,

    /// Abort superseded lookups instead of discarding their results
    #[arg(long, env = "CANCEL_SUPERSEDED")]
    pub cancel_superseded: Option<bool>,

    /// Write logs to this file instead of stderr
    #[arg(long, env = "LOG_FILE")]
    pub log_file: Option<String>,

    /// Diagnostic categories (e.g. "store,settle" or "all")
    #[arg(long, env = "KRISTX_DEBUG")]
    pub debug: Option<String>,

    /// Fetch the first page, print it as JSON and exit
    #[arg(long)]
    pub json: bool,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub node_url: String,
    pub timeout_ms: u64,
    pub retries: u8,
    pub page_size: u32,
    pub render_fps: u32,
    pub refresh_interval_ms: u64,
    pub cancel_superseded: bool,
    pub log_file: Option<String>,
    pub debug: String,
    pub json: bool,
}

/// Validate that a value is within a given range (inclusive)
fn validate_in_range<T>(val: T, min: T, max: T, name: &str) -> Result<T>
where
    T: PartialOrd + std::fmt::Display + Copy,
{
    if val < min || val > max {
        Err(anyhow!("{name} must be in range [{min}, {max}], got {val}"))
    } else {
        Ok(val)
    }
}

/// Load configuration from CLI args and environment variables
/// Priority: CLI args > Environment variables > Defaults
pub fn load() -> Result<Config> {
    from_args(CliArgs::parse())
}

/// Resolve parsed args into a validated config.
///
/// clap already folds the environment into `args`; the `env::var` fallbacks cover
/// callers that build `CliArgs` by hand.
pub fn from_args(args: CliArgs) -> Result<Config> {
    let node_url = args
        .node_url
        .or_else(|| env::var("KRIST_NODE_URL").ok())
        .unwrap_or_else(|| "https://krist.dev".to_string());
    validate_url(&node_url, "KRIST_NODE_URL")?;

    let timeout_ms = args
        .timeout_ms
        .or_else(|| env_parse("KRIST_TIMEOUT_MS"))
        .unwrap_or(8000);
    let timeout_ms = validate_in_range(timeout_ms, 1000, 60000, "KRIST_TIMEOUT_MS")?;

    let retries = args
        .retries
        .or_else(|| env_parse("KRIST_RETRIES"))
        .unwrap_or(2);
    let retries = validate_in_range(retries, 0, 10, "KRIST_RETRIES")?;

    let page_size = args
        .page_size
        .or_else(|| env_parse("PAGE_SIZE"))
        .unwrap_or(DEFAULT_PAGE_SIZE);
    let page_size = validate_in_range(page_size, 1, MAX_PAGE_SIZE, "PAGE_SIZE")?;

    let render_fps = args
        .render_fps
        .or_else(|| env_parse("RENDER_FPS"))
        .unwrap_or(30);
    let render_fps = validate_in_range(render_fps, 1, 120, "RENDER_FPS")?;

    let refresh_interval_ms = args
        .refresh_interval_ms
        .or_else(|| env_parse("REFRESH_INTERVAL_MS"))
        .unwrap_or(0);
    if refresh_interval_ms != 0 {
        validate_in_range(refresh_interval_ms, 1000, 600_000, "REFRESH_INTERVAL_MS")?;
    }

    let cancel_superseded = args
        .cancel_superseded
        .or_else(|| {
            env::var("CANCEL_SUPERSEDED")
                .ok()
                .map(|s| s.to_lowercase() == "true")
        })
        .unwrap_or(true);

    Ok(Config {
        node_url,
        timeout_ms,
        retries,
        page_size,
        render_fps,
        refresh_interval_ms,
        cancel_superseded,
        log_file: args.log_file.or_else(|| env::var("LOG_FILE").ok()),
        debug: args
            .debug
            .or_else(|| env::var("KRISTX_DEBUG").ok())
            .unwrap_or_default(),
        json: args.json,
    })
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|s| s.parse().ok())
}

/// Validate URL format (basic check)
fn validate_url(url: &str, name: &str) -> Result<()> {
    if url.is_empty() {
        return Err(anyhow!("{name} cannot be empty"));
    }

    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(anyhow!("{name} must start with http:// or https://"))
    }
}

/// Print current configuration (useful for debugging)
impl Config {
    pub fn print_summary(&self) {
        eprintln!("kristx Configuration:");
        eprintln!("  Node URL: {}", self.node_url);
        eprintln!("  Timeout: {}ms", self.timeout_ms);
        eprintln!("  Retries: {}", self.retries);
        eprintln!("  Page Size: {}", self.page_size);
        eprintln!("  Render FPS: {}", self.render_fps);
        if self.refresh_interval_ms > 0 {
            eprintln!("  Auto Refresh: every {}ms", self.refresh_interval_ms);
        } else {
            eprintln!("  Auto Refresh: off");
        }
        eprintln!("  Cancel Superseded: {}", self.cancel_superseded);
        if let Some(path) = &self.log_file {
            eprintln!("  Log File: {path}");
        }
        if !self.debug.is_empty() {
            eprintln!("  Debug: {}", self.debug);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> CliArgs {
        // Explicit values so ambient env vars in CI cannot leak in.
        CliArgs {
            node_url: Some("https://krist.dev".into()),
            timeout_ms: Some(8000),
            retries: Some(2),
            page_size: Some(20),
            render_fps: Some(30),
            refresh_interval_ms: Some(0),
            cancel_superseded: Some(true),
            log_file: None,
            debug: Some(String::new()),
            json: false,
        }
    }

    #[test]
    fn accepts_valid_args() {
        let cfg = from_args(args()).unwrap();
        assert_eq!(cfg.node_url, "https://krist.dev");
        assert_eq!(cfg.page_size, 20);
        assert_eq!(cfg.refresh_interval_ms, 0);
        assert!(cfg.cancel_superseded);
    }

    #[test]
    fn rejects_out_of_range_values() {
        let err = from_args(CliArgs { timeout_ms: Some(10), ..args() }).unwrap_err();
        assert!(err.to_string().contains("KRIST_TIMEOUT_MS"));

        assert!(from_args(CliArgs { page_size: Some(0), ..args() }).is_err());
        assert!(from_args(CliArgs { page_size: Some(1001), ..args() }).is_err());
        assert!(from_args(CliArgs { refresh_interval_ms: Some(500), ..args() }).is_err());
        assert!(from_args(CliArgs { refresh_interval_ms: Some(5000), ..args() }).is_ok());
    }

    #[test]
    fn rejects_non_http_url() {
        let err = from_args(CliArgs { node_url: Some("ws://krist.dev".into()), ..args() })
            .unwrap_err();
        assert!(err.to_string().contains("http://"));
    }

    #[test]
    fn cli_parses_flags() {
        let parsed = CliArgs::try_parse_from([
            "kristx",
            "--node-url",
            "http://localhost:8080",
            "--page-size",
            "50",
            "--json",
        ])
        .unwrap();
        assert_eq!(parsed.node_url.as_deref(), Some("http://localhost:8080"));
        assert_eq!(parsed.page_size, Some(50));
        assert!(parsed.json);
    }
}
