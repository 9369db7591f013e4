//! `tgbridge.toml` discovery and loading.

use std::{
    path::{Path, PathBuf},
    sync::LazyLock,
};

use {
    regex::{Captures, Regex},
    secrecy::Secret,
    serde::{Deserialize, Serialize},
    tgbridge_telegram::TelegramAccountConfig,
    tracing::debug,
};

pub const CONFIG_FILENAME: &str = "tgbridge.toml";

static ENV_PLACEHOLDER: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").ok());

/// Top-level configuration file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Name the account is logged under.
    pub account_id: String,
    pub telegram: TelegramAccountConfig,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            account_id: "telegram".into(),
            telegram: TelegramAccountConfig::default(),
        }
    }
}

/// Replace `${NAME}` with the value `lookup` returns; unknown names stay.
pub fn substitute_env_with(input: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let Some(re) = ENV_PLACEHOLDER.as_ref() else {
        return input.to_string();
    };
    re.replace_all(input, |caps: &Captures<'_>| {
        lookup(&caps[1]).unwrap_or_else(|| caps[0].to_string())
    })
    .into_owned()
}

pub fn parse_config(raw: &str) -> anyhow::Result<BridgeConfig> {
    let raw = substitute_env_with(raw, |name| std::env::var(name).ok());
    Ok(toml::from_str(&raw)?)
}

pub fn load_config(path: &Path) -> anyhow::Result<BridgeConfig> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
    parse_config(&raw).map_err(|e| anyhow::anyhow!("failed to parse {}: {e}", path.display()))
}

/// `./tgbridge.toml`, then `tgbridge.toml` in the user config directory.
pub fn find_config_file(cwd: &Path) -> Option<PathBuf> {
    let local = cwd.join(CONFIG_FILENAME);
    if local.is_file() {
        return Some(local);
    }
    let global = directories::ProjectDirs::from("", "", "tgbridge")?
        .config_dir()
        .join(CONFIG_FILENAME);
    global.is_file().then_some(global)
}

/// Resolve the effective configuration.
///
/// An explicit `path` must exist. Without one the standard locations are
/// searched and defaults apply when nothing is found. A non-empty
/// `token_override` replaces the file's token.
pub fn resolve(
    path: Option<&Path>,
    token_override: Option<String>,
) -> anyhow::Result<(BridgeConfig, Option<PathBuf>)> {
    let source = match path {
        Some(path) => Some(path.to_path_buf()),
        None => find_config_file(&std::env::current_dir()?),
    };

    let mut config = match &source {
        Some(path) => {
            debug!(path = %path.display(), "loading config");
            load_config(path)?
        },
        None => {
            debug!("no config file found, using defaults");
            BridgeConfig::default()
        },
    };

    if let Some(token) = token_override.filter(|t| !t.is_empty()) {
        config.telegram.token = Secret::new(token);
    }
    Ok((config, source))
}
