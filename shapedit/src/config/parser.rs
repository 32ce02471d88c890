//! Maps INI keys onto [`ConfigFile`] fields.

use ini::Ini;
use std::str::FromStr;

use super::file::ConfigFileError;
use super::settings::ConfigFile;
use super::size::parse_size;
use crate::render::MAX_CANVAS_SIZE;
use crate::style::Colormap;

/// Overlays the values found in `ini` on the defaults.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    if let Some(section) = ini.section(Some("basemap")) {
        if let Some(v) = section.get("provider") {
            config.basemap.provider = v.parse().map_err(|_| {
                invalid("basemap", "provider", v, "must be one of: arcgis, go2, osm")
            })?;
        }
        if let Some(v) = section.get("enabled") {
            config.basemap.enabled = parse_bool(v)
                .ok_or_else(|| invalid("basemap", "enabled", v, "must be 'true' or 'false'"))?;
        }
        if let Some(v) = section.get("timeout") {
            config.basemap.timeout = v
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| {
                    invalid("basemap", "timeout", v, "must be a positive integer (seconds)")
                })?;
        }
    }

    if let Some(section) = ini.section(Some("cache")) {
        if let Some(v) = section.get("memory_size") {
            config.cache.memory_size = parse_size(v).map_err(|_| {
                invalid(
                    "cache",
                    "memory_size",
                    v,
                    "expected format like '256MB', '1GB' or '1024KB'",
                )
            })?;
        }
    }

    if let Some(section) = ini.section(Some("render")) {
        for (key, slot) in [
            ("width", &mut config.render.width),
            ("height", &mut config.render.height),
        ] {
            if let Some(v) = section.get(key) {
                *slot = v
                    .trim()
                    .parse::<u32>()
                    .ok()
                    .filter(|n| (1..=MAX_CANVAS_SIZE).contains(n))
                    .ok_or_else(|| {
                        invalid(
                            "render",
                            key,
                            v,
                            &format!("must be between 1 and {} pixels", MAX_CANVAS_SIZE),
                        )
                    })?;
            }
        }
        if let Some(v) = section.get("colormap") {
            config.render.colormap = Colormap::from_str(v.trim()).map_err(|_| {
                let names: Vec<&str> = Colormap::ALL.iter().map(|c| c.name()).collect();
                invalid(
                    "render",
                    "colormap",
                    v,
                    &format!("must be one of: {}", names.join(", ")),
                )
            })?;
        }
        if let Some(v) = section.get("opacity") {
            config.render.opacity = v
                .trim()
                .parse::<u8>()
                .ok()
                .filter(|n| *n <= 100)
                .ok_or_else(|| invalid("render", "opacity", v, "must be between 0 and 100"))?;
        }
    }

    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = section.get("file") {
            let v = v.trim();
            if !v.is_empty() {
                config.logging.file = expand_tilde(v);
            }
        }
    }

    Ok(config)
}

fn invalid(section: &str, key: &str, value: &str, reason: &str) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

fn expand_tilde(path: &str) -> std::path::PathBuf {
    match path.strip_prefix("~/") {
        Some(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| rest.into()),
        None => path.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ProviderKind;

    fn parse(text: &str) -> Result<ConfigFile, ConfigFileError> {
        parse_ini(&Ini::load_from_str(text).unwrap())
    }

    #[test]
    fn test_empty_ini_gives_defaults() {
        assert_eq!(parse("").unwrap(), ConfigFile::default());
    }

    #[test]
    fn test_all_sections() {
        let config = parse(
            "[basemap]\nprovider = Google\nenabled = no\ntimeout = 30\n\
             [cache]\nmemory_size = 64MB\n\
             [render]\nwidth = 800\nheight = 600\ncolormap = Reds\nopacity = 40\n\
             [logging]\nfile = /tmp/shapedit-test.log\n",
        )
        .unwrap();

        assert_eq!(config.basemap.provider, ProviderKind::Go2);
        assert!(!config.basemap.enabled);
        assert_eq!(config.basemap.timeout, 30);
        assert_eq!(config.cache.memory_size, 64 * 1024 * 1024);
        assert_eq!(config.render.width, 800);
        assert_eq!(config.render.height, 600);
        assert_eq!(config.render.colormap, Colormap::Reds);
        assert_eq!(config.render.opacity, 40);
        assert_eq!(
            config.logging.file,
            std::path::PathBuf::from("/tmp/shapedit-test.log")
        );
    }

    #[test]
    fn test_invalid_values_name_the_key() {
        let cases = [
            ("[basemap]\nprovider = bing\n", "provider"),
            ("[basemap]\nenabled = maybe\n", "enabled"),
            ("[basemap]\ntimeout = 0\n", "timeout"),
            ("[cache]\nmemory_size = lots\n", "memory_size"),
            ("[render]\nwidth = 0\n", "width"),
            ("[render]\nheight = 100000\n", "height"),
            ("[render]\ncolormap = rainbow\n", "colormap"),
            ("[render]\nopacity = 101\n", "opacity"),
        ];
        for (text, expected_key) in cases {
            match parse(text) {
                Err(ConfigFileError::InvalidValue { key, .. }) => assert_eq!(key, expected_key),
                other => panic!("{} parsed as {:?}", text.trim(), other),
            }
        }
    }

    #[test]
    fn test_tilde_expansion() {
        let config = parse("[logging]\nfile = ~/logs/shapedit.log\n").unwrap();
        assert!(config.logging.file.ends_with("logs/shapedit.log"));
        assert!(!config.logging.file.starts_with("~"));
    }
}
