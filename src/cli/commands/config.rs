//! Config command - show or edit configuration

use crate::cli::args::{ConfigAction, ConfigArgs};
use crate::config::{Config, ConfigManager};
use crate::error::{SwcacheError, SwcacheResult};
use crate::ui::{self, Status, UiContext};
use crate::version::VersionTag;
use std::path::PathBuf;
use url::Url;

/// Keys accepted by `config set`
const VALID_KEYS: &[&str] = &[
    "general.log_format",
    "general.journal",
    "worker.version",
    "worker.scope",
    "worker.manifest",
    "storage.dir",
    "network.user_agent",
    "network.timeout_secs",
    "network.max_body_bytes",
];

/// Execute the config command
pub async fn execute(args: ConfigArgs, config: &Config, manager: &ConfigManager) -> SwcacheResult<()> {
    match args.action {
        None | Some(ConfigAction::Show) => show_config(config)?,
        Some(ConfigAction::Path) => println!("{}", manager.path().display()),
        Some(ConfigAction::Init { force }) => init_config(manager, force).await?,
        Some(ConfigAction::Set { key, value }) => set_value(manager, &key, &value).await?,
    }

    Ok(())
}

fn show_config(config: &Config) -> SwcacheResult<()> {
    println!("{}", toml::to_string_pretty(config)?);
    Ok(())
}

async fn init_config(manager: &ConfigManager, force: bool) -> SwcacheResult<()> {
    let ctx = UiContext::detect();
    let path = manager.path();

    if path.exists() && !force {
        ui::warn_with_hint(
            &ctx,
            &format!("Config already exists at {}", path.display()),
            "Use --force to overwrite",
        );
        return Ok(());
    }

    manager.save(&Config::default()).await?;
    ui::step_with(&ctx, Status::Ok, "Configuration initialized", &path.display().to_string());

    Ok(())
}

async fn set_value(manager: &ConfigManager, key: &str, value: &str) -> SwcacheResult<()> {
    let ctx = UiContext::detect();
    // Edit what is on disk; environment overrides stay out of the file
    let mut config = manager.load_saved().await?;

    if let Err(e) = apply(&mut config, key, value) {
        if !VALID_KEYS.contains(&key) {
            ui::hint(&ctx, "Valid keys:");
            for key in VALID_KEYS {
                eprintln!("  {}", key);
            }
        }
        return Err(e);
    }

    manager.save(&config).await?;
    ui::step(&ctx, Status::Ok, &format!("Set {} = {}", key, value));

    Ok(())
}

/// Apply one dot-separated key to `config`, validating the value
fn apply(config: &mut Config, key: &str, value: &str) -> SwcacheResult<()> {
    let parts: Vec<&str> = key.split('.').collect();

    match parts.as_slice() {
        ["general", "log_format"] => {
            if !matches!(value, "text" | "json") {
                return Err(SwcacheError::User(format!(
                    "Invalid log format: {}. Use text or json",
                    value
                )));
            }
            config.general.log_format = value.to_string();
        }
        ["general", "journal"] => config.general.journal = parse_bool(value)?,

        ["worker", "version"] => {
            config.worker.version = VersionTag::new(value)?.to_string();
        }
        ["worker", "scope"] => {
            Url::parse(value).map_err(|e| SwcacheError::UrlInvalid {
                url: value.to_string(),
                reason: e.to_string(),
            })?;
            config.worker.scope = value.to_string();
        }
        ["worker", "manifest"] => {
            config.worker.manifest = value
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        ["storage", "dir"] => {
            config.storage.dir = if value.is_empty() {
                None
            } else {
                Some(PathBuf::from(value))
            };
        }

        ["network", "user_agent"] => config.network.user_agent = value.to_string(),
        ["network", "timeout_secs"] => {
            config.network.timeout_secs = match value {
                "" | "none" => None,
                n => Some(parse_u64(n)?),
            };
        }
        ["network", "max_body_bytes"] => config.network.max_body_bytes = parse_u64(value)?,

        _ => return Err(SwcacheError::User(format!("Unknown config key: {}", key))),
    }

    Ok(())
}

fn parse_bool(value: &str) -> SwcacheResult<bool> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(SwcacheError::User(format!(
            "Invalid boolean value: {}. Use true/false",
            value
        ))),
    }
}

fn parse_u64(value: &str) -> SwcacheResult<u64> {
    value
        .parse()
        .map_err(|_| SwcacheError::User(format!("Invalid number: {}", value)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_sets_known_keys() {
        let mut config = Config::default();
        apply(&mut config, "worker.version", "scanner40").unwrap();
        apply(&mut config, "general.journal", "no").unwrap();
        apply(&mut config, "network.timeout_secs", "30").unwrap();
        apply(&mut config, "storage.dir", "/tmp/swcache").unwrap();

        assert_eq!(config.worker.version, "scanner40");
        assert!(!config.general.journal);
        assert_eq!(config.network.timeout_secs, Some(30));
        assert_eq!(config.storage.dir, Some(PathBuf::from("/tmp/swcache")));

        apply(&mut config, "network.timeout_secs", "none").unwrap();
        assert_eq!(config.network.timeout_secs, None);
    }

    #[test]
    fn apply_splits_manifest_list() {
        let mut config = Config::default();
        apply(&mut config, "worker.manifest", "./logo.png, ./app.js,,").unwrap();
        assert_eq!(config.worker.manifest, vec!["./logo.png", "./app.js"]);
    }

    #[test]
    fn apply_rejects_invalid_values() {
        let mut config = Config::default();
        assert!(matches!(
            apply(&mut config, "worker.version", "has space"),
            Err(SwcacheError::VersionTagInvalid { .. })
        ));
        assert!(matches!(
            apply(&mut config, "worker.scope", "not a url"),
            Err(SwcacheError::UrlInvalid { .. })
        ));
        assert!(apply(&mut config, "general.log_format", "xml").is_err());
        assert!(apply(&mut config, "general.journal", "maybe").is_err());
        assert!(apply(&mut config, "network.max_body_bytes", "-1").is_err());
    }

    #[test]
    fn apply_rejects_unknown_key() {
        let mut config = Config::default();
        let err = apply(&mut config, "worker.nonexistent", "x").unwrap_err();
        assert!(err.to_string().contains("Unknown config key"));
    }

    #[test]
    fn parse_bool_values() {
        assert!(parse_bool("true").unwrap());
        assert!(parse_bool("YES").unwrap());
        assert!(!parse_bool("0").unwrap());
        assert!(parse_bool("maybe").is_err());
    }
}
