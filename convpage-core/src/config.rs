use std::env;
use std::path::PathBuf;

use crate::error::{ConvpageError, Result};
use crate::markup::{DEFAULT_MAX_LIST_DEPTH, EmojiPreset, MarkupOptions};
use crate::resolver::AssetMap;

pub const ASSET_MAP_ENV: &str = "CONVPAGE_ASSET_MAP";
pub const ASSET_BASE_ENV: &str = "CONVPAGE_ASSET_BASE";
pub const UPLOADS_DIR_ENV: &str = "CONVPAGE_UPLOADS_DIR";
pub const EMOJI_ENV: &str = "CONVPAGE_EMOJI";
pub const MAX_LIST_DEPTH_ENV: &str = "CONVPAGE_MAX_LIST_DEPTH";

/// Rendering settings. Command line flags are applied on top by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub asset_map: Option<PathBuf>,
    pub asset_base: Option<String>,
    pub uploads_dir: Option<String>,
    pub emoji: EmojiPreset,
    pub max_list_depth: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            asset_map: None,
            asset_base: None,
            uploads_dir: None,
            emoji: EmojiPreset::default(),
            max_list_depth: DEFAULT_MAX_LIST_DEPTH,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let read = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        // Precedence:
        // 1) --assets
        // 2) CONVPAGE_ASSET_MAP
        // 3) no asset map, every asset renders as deleted
        let asset_map = read(ASSET_MAP_ENV).map(PathBuf::from);

        // Precedence:
        // 1) --asset-base
        // 2) CONVPAGE_ASSET_BASE
        // 3) mapped file names used as-is
        let asset_base = read(ASSET_BASE_ENV);

        // Precedence:
        // 1) --uploads
        // 2) CONVPAGE_UPLOADS_DIR
        // 3) attachments resolve only through the asset map
        let uploads_dir = read(UPLOADS_DIR_ENV);

        // Precedence:
        // 1) --emoji
        // 2) CONVPAGE_EMOJI
        // 3) standard preset
        let emoji = read(EMOJI_ENV)
            .map(|value| value.parse::<EmojiPreset>())
            .transpose()?
            .unwrap_or_default();

        let max_list_depth = read(MAX_LIST_DEPTH_ENV)
            .map(|value| parse_depth(&value))
            .transpose()?
            .unwrap_or(DEFAULT_MAX_LIST_DEPTH);

        Ok(Self {
            asset_map,
            asset_base,
            uploads_dir,
            emoji,
            max_list_depth,
        })
    }

    pub fn markup_options(&self) -> MarkupOptions {
        MarkupOptions {
            max_list_depth: self.max_list_depth,
            ..MarkupOptions::default()
        }
        .with_emoji_preset(self.emoji)
    }

    /// Loads the configured asset map, or an empty one when none is set.
    pub fn asset_resolver(&self) -> Result<AssetMap> {
        let mut resolver = match &self.asset_map {
            Some(path) => AssetMap::load(path)?,
            None => AssetMap::default(),
        };
        if let Some(base) = &self.asset_base {
            resolver = resolver.with_base_url(base.clone());
        }
        if let Some(uploads) = &self.uploads_dir {
            resolver = resolver.with_uploads_dir(uploads.clone());
        }
        Ok(resolver)
    }
}

fn parse_depth(value: &str) -> Result<usize> {
    match value.trim().parse::<usize>() {
        Ok(depth) if depth > 0 => Ok(depth),
        _ => Err(ConvpageError::InvalidConfig(format!(
            "{MAX_LIST_DEPTH_ENV} must be a positive integer, got {value:?}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::fs;
    use std::path::PathBuf;

    use tempfile::tempdir;

    use crate::config::Config;
    use crate::markup::{DEFAULT_MAX_LIST_DEPTH, EmojiPreset};
    use crate::resolver::AssetResolver;

    fn config_from(vars: &[(&str, &str)]) -> crate::Result<Config> {
        let vars = vars
            .iter()
            .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
            .collect::<HashMap<_, _>>();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_without_variables() {
        let config = config_from(&[]).expect("config");
        assert_eq!(config, Config::default());
        assert_eq!(config.max_list_depth, DEFAULT_MAX_LIST_DEPTH);
        assert!(config.asset_resolver().expect("resolver").is_empty());
    }

    #[test]
    fn reads_all_variables() {
        let config = config_from(&[
            ("CONVPAGE_ASSET_MAP", "/data/assets.json"),
            ("CONVPAGE_ASSET_BASE", "https://cdn.example"),
            ("CONVPAGE_UPLOADS_DIR", "uploads"),
            ("CONVPAGE_EMOJI", "extended"),
            ("CONVPAGE_MAX_LIST_DEPTH", "4"),
        ])
        .expect("config");

        assert_eq!(config.asset_map, Some(PathBuf::from("/data/assets.json")));
        assert_eq!(config.asset_base.as_deref(), Some("https://cdn.example"));
        assert_eq!(config.emoji, EmojiPreset::Extended);
        assert_eq!(config.markup_options().max_list_depth, 4);
        assert!(config.markup_options().stripped_emoji.contains(&'\u{1F680}'));
    }

    #[test]
    fn blank_values_are_ignored() {
        let config = config_from(&[("CONVPAGE_EMOJI", "  ")]).expect("config");
        assert_eq!(config.emoji, EmojiPreset::Standard);
    }

    #[test]
    fn invalid_values_are_rejected() {
        let err = config_from(&[("CONVPAGE_MAX_LIST_DEPTH", "0")]).expect_err("must fail");
        assert!(format!("{err}").contains("CONVPAGE_MAX_LIST_DEPTH"));
        assert!(config_from(&[("CONVPAGE_EMOJI", "loud")]).is_err());
    }

    #[test]
    fn asset_resolver_loads_map_with_prefix() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("assets.json");
        fs::write(&path, r#"{"file-service://a":"a.png"}"#).expect("write");

        let config = Config {
            asset_map: Some(path),
            asset_base: Some("media".to_string()),
            uploads_dir: Some("uploads".to_string()),
            ..Config::default()
        };
        let resolver = config.asset_resolver().expect("resolver");

        assert_eq!(
            resolver.resolve_asset("file-service://a").as_deref(),
            Some("media/a.png")
        );
        assert_eq!(
            resolver.resolve_attachment("file-x").as_deref(),
            Some("uploads/file-x")
        );
    }
}
