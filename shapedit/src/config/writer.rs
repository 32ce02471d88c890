//! Serializes a [`ConfigFile`] as the commented INI written by `config init`.

use super::settings::ConfigFile;
use super::size::format_size;
use crate::provider::ProviderKind;
use crate::style::Colormap;

pub(super) fn to_config_string(config: &ConfigFile) -> String {
    let providers: Vec<String> = ProviderKind::ALL
        .iter()
        .map(|kind| format!(";   {:<7}- {}", kind.as_str(), kind.name()))
        .collect();
    let colormaps: Vec<&str> = Colormap::ALL.iter().map(|c| c.name()).collect();

    format!(
        r#"[basemap]
; Imagery drawn under layers in geographic or Web Mercator coordinates:
{}
provider = {}
; Set to false to work offline
enabled = {}
; Timeout in seconds for each tile request (default: 10)
timeout = {}

[cache]
; Memory budget for downloaded tiles (default: 256MB)
; Supports: KB, MB, GB suffixes
memory_size = {}

[render]
; Canvas size in pixels for the editor map and `shapedit render`
width = {}
height = {}
; Initial colormap: {}
colormap = {}
; Initial fill opacity in percent (0-100)
opacity = {}

[logging]
; Log file (the terminal editor owns stdout)
file = {}
"#,
        providers.join("\n"),
        config.basemap.provider.as_str(),
        config.basemap.enabled,
        config.basemap.timeout,
        format_size(config.cache.memory_size),
        config.render.width,
        config.render.height,
        colormaps.join(", "),
        config.render.colormap.name(),
        config.render.opacity,
        config.logging.file.display(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.ini");

        let mut config = ConfigFile::default();
        config.basemap.provider = ProviderKind::Osm;
        config.basemap.enabled = false;
        config.cache.memory_size = 64 * 1024 * 1024;
        config.render.colormap = Colormap::Set1;
        config.render.opacity = 35;
        config.logging.file = temp_dir.path().join("app.log");

        config.save_to(&path).unwrap();
        let loaded = ConfigFile::load_from(&path).unwrap();

        assert_eq!(loaded, config);
    }

    #[test]
    fn test_written_file_lists_choices() {
        let text = to_config_string(&ConfigFile::default());
        assert!(text.contains("provider = arcgis"));
        assert!(text.contains("memory_size = 256MB"));
        assert!(text.contains("viridis, plasma, coolwarm, Reds, Blues, Greens, Set1"));
        assert!(text.contains("osm    - OpenStreetMap"));
    }
}
