use tracing_subscriber::EnvFilter;

pub const DEFAULT_FILTER: &str = "user_auth=debug,sqlx=warn";

/// Install the global `fmt` subscriber. `RUST_LOG` overrides the filter and
/// `LOG_FORMAT=json` switches to JSON lines.
pub fn init_tracing() -> anyhow::Result<()> {
    let env_filter =
        std::env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_FILTER.to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    let builder = tracing_subscriber::fmt().with_env_filter(EnvFilter::new(env_filter));
    if json_logs {
        builder
            .with_target(false)
            .json()
            .try_init()
            .map_err(|e| anyhow::anyhow!(e))?;
    } else {
        builder.try_init().map_err(|e| anyhow::anyhow!(e))?;
    }
    Ok(())
}
