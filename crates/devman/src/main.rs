//! Device manager replay binary.
//!
//! Loads the configuration, builds an in-memory host from a replay script,
//! and feeds every scripted step through the device manager while logging
//! the resulting state.
//!
//! ```text
//! main()
//!  └─ load_config / load_config_from   -- [manager] + [devices]
//!  └─ load_script                      -- tools, displays, steps
//!  └─ --write-config                   -- save the effective config
//!  └─ Session::new                     -- MemoryHost + DeviceManager
//!       └─ Session::run                 -- apply → pump events → log state
//! ```

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use devman::infrastructure::replay::{load_script, Session};
use devman::infrastructure::storage::config::{self, AppConfig};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Replays a device session against the input device manager.
#[derive(Debug, Parser)]
#[command(
    name = "devman",
    about = "Replay input device sessions through the device manager",
    version
)]
struct Cli {
    /// Configuration file.  Defaults to the platform config directory.
    #[arg(long, env = "DEVMAN_CONFIG")]
    config: Option<PathBuf>,

    /// Overrides `[devices] share_tool` from the configuration file.
    #[arg(long, env = "DEVMAN_SHARE_TOOL")]
    share_tool: Option<bool>,

    /// Writes the effective configuration to this path before replaying.
    #[arg(long)]
    write_config: Option<PathBuf>,

    /// Replay script (TOML).
    script: PathBuf,
}

impl Cli {
    /// Loads the configuration file and applies command-line overrides.
    fn load_config(&self) -> anyhow::Result<AppConfig> {
        let mut cfg = match &self.config {
            Some(path) => config::load_config_from(path)
                .with_context(|| format!("failed to load config from {}", path.display()))?,
            None => config::load_config().context("failed to load config")?,
        };
        if let Some(share_tool) = self.share_tool {
            cfg.devices.share_tool = share_tool;
        }
        Ok(cfg)
    }

    /// Saves `cfg` to the `--write-config` path, if one was given.
    fn write_config(&self, cfg: &AppConfig) -> anyhow::Result<()> {
        if let Some(path) = &self.write_config {
            config::save_config(cfg, path)
                .with_context(|| format!("failed to write config to {}", path.display()))?;
            info!(path = %path.display(), "effective config written");
        }
        Ok(())
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = cli.load_config()?;

    // `RUST_LOG` wins over the configured level.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&cfg.manager.log_level)),
        )
        .init();

    cli.write_config(&cfg)?;

    let script = load_script(&cli.script)
        .with_context(|| format!("failed to load script {}", cli.script.display()))?;
    info!(
        script = %cli.script.display(),
        tools = script.tools.len(),
        displays = script.displays.len(),
        steps = script.steps.len(),
        "replay starting"
    );

    let mut session = Session::new(&script, &cfg.devices).context("failed to start session")?;
    session.log_state();
    session.run(&script, Session::log_state).context("replay failed")?;

    info!(
        emitted = session.host().tool_changed_emitted(),
        suppressed = session.host().tool_changed_suppressed(),
        "replay finished"
    );
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_requires_only_script() {
        let cli = Cli::try_parse_from(["devman", "session.toml"]).expect("parse");
        assert_eq!(cli.script, PathBuf::from("session.toml"));
        assert!(cli.config.is_none());
        assert!(cli.share_tool.is_none());
        assert!(cli.write_config.is_none());
    }

    #[test]
    fn test_cli_missing_script_is_error() {
        assert!(Cli::try_parse_from(["devman"]).is_err());
    }

    #[test]
    fn test_share_tool_flag_overrides_config() {
        // Arrange – a config path that does not exist yields defaults
        let cli = Cli::try_parse_from([
            "devman",
            "--config",
            "/nonexistent/devman/config.toml",
            "--share-tool",
            "true",
            "session.toml",
        ])
        .expect("parse");

        // Act
        let cfg = cli.load_config().expect("load");

        // Assert
        assert!(cfg.devices.share_tool);
        assert_eq!(cfg.manager.log_level, "info");
    }

    #[test]
    fn test_write_config_saves_effective_config() {
        // Arrange
        let path = std::env::temp_dir()
            .join(format!("devman_cli_write_config_{}", std::process::id()))
            .join("config.toml");
        let cli = Cli::try_parse_from([
            "devman",
            "--config",
            "/nonexistent/devman/config.toml",
            "--share-tool",
            "true",
            "--write-config",
            path.to_str().expect("utf-8 temp path"),
            "session.toml",
        ])
        .expect("parse");
        let cfg = cli.load_config().expect("load");

        // Act
        cli.write_config(&cfg).expect("write");

        // Assert – the override survives the round trip
        let saved = config::load_config_from(&path).expect("reload");
        assert!(saved.devices.share_tool);
        assert_eq!(saved.manager.log_level, cfg.manager.log_level);
        let _ = std::fs::remove_dir_all(path.parent().expect("parent"));
    }

    #[test]
    fn test_write_config_without_flag_is_noop() {
        let cli = Cli::try_parse_from(["devman", "session.toml"]).expect("parse");
        assert!(cli.write_config(&AppConfig::default()).is_ok());
    }
}
