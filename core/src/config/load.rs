use std::path::Path;

use super::types::FluxConfig;

pub const CONFIG_FILE_NAME: &str = "flux-actions.toml";
pub const ENV_MAX_CONCURRENCY: &str = "FLUX_ACTIONS_MAX_CONCURRENCY";
pub const ENV_PERIODIC_INTERVAL_MS: &str = "FLUX_ACTIONS_PERIODIC_INTERVAL_MS";

pub fn load_from_str(s: &str) -> anyhow::Result<FluxConfig> {
    Ok(toml::from_str::<FluxConfig>(s)?)
}

pub fn load_from_path(path: impl AsRef<Path>) -> anyhow::Result<FluxConfig> {
    let path = path.as_ref();
    let s = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("read config {} failed: {e}", path.display()))?;
    load_from_str(&s)
}

/// `./flux-actions.toml` when present, defaults otherwise; environment
/// variables override either.
pub fn load_default() -> anyhow::Result<FluxConfig> {
    let local_config = Path::new(CONFIG_FILE_NAME);

    let cfg = if local_config.exists() {
        load_from_path(local_config)?
    } else {
        FluxConfig::default()
    };

    apply_env_overrides(cfg, |key| std::env::var(key).ok())
}

pub fn apply_env_overrides<F>(mut cfg: FluxConfig, lookup: F) -> anyhow::Result<FluxConfig>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(v) = lookup(ENV_MAX_CONCURRENCY).filter(|v| !v.trim().is_empty()) {
        let max = v
            .trim()
            .parse::<usize>()
            .map_err(|e| anyhow::anyhow!("{ENV_MAX_CONCURRENCY}={v}: {e}"))?;
        cfg.executor.max_concurrency = (max > 0).then_some(max);
    }

    if let Some(v) = lookup(ENV_PERIODIC_INTERVAL_MS).filter(|v| !v.trim().is_empty()) {
        cfg.periodic.default_interval_ms = v
            .trim()
            .parse::<u64>()
            .map_err(|e| anyhow::anyhow!("{ENV_PERIODIC_INTERVAL_MS}={v}: {e}"))?;
    }

    Ok(cfg)
}
