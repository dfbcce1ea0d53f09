//! Reading data files: format detection, file discovery, deserialization,
//! and the top-level catalog and world-config loaders.

use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

use gridfab_engine::WorldConfig;

use crate::catalog::Catalog;
use crate::schema::{BuildingData, CatalogData, MobData};

// ===========================================================================
// Errors
// ===========================================================================

/// Errors that can occur while loading data or building entities from it.
#[derive(Debug, thiserror::Error)]
pub enum DataError {
    /// A required data file was not found in the given directory.
    #[error("required file '{file}' not found in {dir}")]
    MissingRequired { file: String, dir: PathBuf },

    /// The file has an extension we don't support.
    #[error("unsupported format for file: {file}")]
    UnsupportedFormat { file: PathBuf },

    /// Two files with the same base name but different formats exist.
    #[error("conflicting formats: {a} and {b}")]
    ConflictingFormats { a: PathBuf, b: PathBuf },

    /// A deserialization error occurred.
    #[error("parse error in {file}: {detail}")]
    Parse { file: PathBuf, detail: String },

    /// A resource name did not match any known resource.
    #[error("unknown resource '{name}' in '{owner}'")]
    UnknownResource { owner: String, name: String },

    /// A definition named a catalog entry that does not exist.
    #[error("unknown {kind} '{name}'")]
    UnknownEntry { kind: &'static str, name: String },

    /// Two definitions share a name.
    #[error("duplicate {kind} '{name}'")]
    DuplicateName { kind: &'static str, name: String },

    /// A definition resolved but describes an impossible value.
    #[error("invalid definition '{owner}': {detail}")]
    Invalid { owner: String, detail: String },

    /// An I/O error occurred.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// ===========================================================================
// Format detection
// ===========================================================================

/// Supported data file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Ron,
    Toml,
    Json,
}

/// Detect the format of a file based on its extension.
pub fn detect_format(path: &Path) -> Result<Format, DataError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("ron") => Ok(Format::Ron),
        Some("toml") => Ok(Format::Toml),
        Some("json") => Ok(Format::Json),
        _ => Err(DataError::UnsupportedFormat {
            file: path.to_path_buf(),
        }),
    }
}

// ===========================================================================
// File discovery
// ===========================================================================

/// Scan a directory for `{base_name}.ron`, `.toml` or `.json`.
///
/// Returns `Ok(None)` if no file is found, or `Err(ConflictingFormats)` if
/// more than one format exists for the same base name.
pub fn find_data_file(dir: &Path, base_name: &str) -> Result<Option<PathBuf>, DataError> {
    let mut found: Option<PathBuf> = None;

    for ext in ["ron", "toml", "json"] {
        let candidate = dir.join(format!("{base_name}.{ext}"));
        if candidate.exists() {
            if let Some(existing) = found {
                return Err(DataError::ConflictingFormats {
                    a: existing,
                    b: candidate,
                });
            }
            found = Some(candidate);
        }
    }

    Ok(found)
}

/// Like [`find_data_file`], but missing is an error.
pub fn require_data_file(dir: &Path, base_name: &str) -> Result<PathBuf, DataError> {
    find_data_file(dir, base_name)?.ok_or_else(|| DataError::MissingRequired {
        file: base_name.to_string(),
        dir: dir.to_path_buf(),
    })
}

// ===========================================================================
// Deserialization
// ===========================================================================

/// Deserialize a string in the given format. `file` is only used in errors.
pub fn deserialize_str<T: DeserializeOwned>(
    content: &str,
    format: Format,
    file: &Path,
) -> Result<T, DataError> {
    let parse_error = |detail: String| DataError::Parse {
        file: file.to_path_buf(),
        detail,
    };
    match format {
        Format::Ron => ron::from_str(content).map_err(|e| parse_error(e.to_string())),
        Format::Json => serde_json::from_str(content).map_err(|e| parse_error(e.to_string())),
        Format::Toml => toml::from_str(content).map_err(|e| parse_error(e.to_string())),
    }
}

/// Read a file and deserialize it according to its extension.
pub fn deserialize_file<T: DeserializeOwned>(path: &Path) -> Result<T, DataError> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;
    deserialize_str(&content, format, path)
}

/// Deserialize a list. TOML files hold the array under `toml_key` in a
/// top-level table; RON and JSON hold it directly.
pub fn deserialize_list<T: DeserializeOwned>(path: &Path, toml_key: &str) -> Result<Vec<T>, DataError> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;

    match format {
        Format::Ron | Format::Json => deserialize_str(&content, format, path),
        Format::Toml => {
            let table: toml::Value = deserialize_str(&content, format, path)?;
            let array = table
                .get(toml_key)
                .ok_or_else(|| DataError::Parse {
                    file: path.to_path_buf(),
                    detail: format!("missing key '{toml_key}' in TOML file"),
                })?
                .clone();
            array.try_into().map_err(|e: toml::de::Error| DataError::Parse {
                file: path.to_path_buf(),
                detail: e.to_string(),
            })
        }
    }
}

// ===========================================================================
// Top-level loaders
// ===========================================================================

/// Load a catalog directory: `buildings.*` is required, `mobs.*` optional.
pub fn load_catalog(dir: &Path) -> Result<Catalog, DataError> {
    let buildings_path = require_data_file(dir, "buildings")?;
    let buildings: Vec<BuildingData> = deserialize_list(&buildings_path, "buildings")?;

    let mobs: Vec<MobData> = match find_data_file(dir, "mobs")? {
        Some(path) => deserialize_list(&path, "mobs")?,
        None => Vec::new(),
    };

    let catalog = Catalog::new(CatalogData { buildings, mobs })?;
    tracing::debug!(
        dir = %dir.display(),
        buildings = catalog.building_names().count(),
        mobs = catalog.mob_names().count(),
        "catalog loaded"
    );
    Ok(catalog)
}

/// Load a single catalog file holding both `buildings` and `mobs`.
pub fn load_catalog_file(path: &Path) -> Result<Catalog, DataError> {
    let data: CatalogData = deserialize_file(path)?;
    Catalog::new(data)
}

/// Load a [`WorldConfig`]. Missing fields take their defaults.
pub fn load_world_config(path: &Path) -> Result<WorldConfig, DataError> {
    let config: WorldConfig = deserialize_file(path)?;
    if config.width == 0 || config.height == 0 {
        return Err(DataError::Invalid {
            owner: path.display().to_string(),
            detail: "world must be at least 1x1".to_string(),
        });
    }
    Ok(config)
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    /// Create a temporary directory with a unique name for test isolation.
    fn make_test_dir(suffix: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "gridfab_data_test_{suffix}_{}",
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn cleanup(dir: &Path) {
        let _ = fs::remove_dir_all(dir);
    }

    // -----------------------------------------------------------------------
    // detect_format
    // -----------------------------------------------------------------------

    #[test]
    fn detect_format_by_extension() {
        assert_eq!(detect_format(Path::new("a.ron")).unwrap(), Format::Ron);
        assert_eq!(detect_format(Path::new("a.toml")).unwrap(), Format::Toml);
        assert_eq!(detect_format(Path::new("a.json")).unwrap(), Format::Json);
    }

    #[test]
    fn detect_format_unsupported() {
        assert!(matches!(
            detect_format(Path::new("a.yaml")),
            Err(DataError::UnsupportedFormat { .. })
        ));
        assert!(matches!(
            detect_format(Path::new("a")),
            Err(DataError::UnsupportedFormat { .. })
        ));
    }

    // -----------------------------------------------------------------------
    // find_data_file
    // -----------------------------------------------------------------------

    #[test]
    fn find_data_file_found_and_missing() {
        let dir = make_test_dir("find");
        assert_eq!(find_data_file(&dir, "buildings").unwrap(), None);

        fs::write(dir.join("buildings.toml"), "").unwrap();
        assert_eq!(
            find_data_file(&dir, "buildings").unwrap(),
            Some(dir.join("buildings.toml"))
        );

        cleanup(&dir);
    }

    #[test]
    fn find_data_file_conflict() {
        let dir = make_test_dir("conflict");
        fs::write(dir.join("mobs.ron"), "[]").unwrap();
        fs::write(dir.join("mobs.json"), "[]").unwrap();

        assert!(matches!(
            find_data_file(&dir, "mobs"),
            Err(DataError::ConflictingFormats { .. })
        ));

        cleanup(&dir);
    }

    #[test]
    fn require_data_file_missing() {
        let dir = make_test_dir("require");
        assert!(matches!(
            require_data_file(&dir, "buildings"),
            Err(DataError::MissingRequired { .. })
        ));
        cleanup(&dir);
    }

    // -----------------------------------------------------------------------
    // deserialize_list
    // -----------------------------------------------------------------------

    #[test]
    fn deserialize_list_toml_uses_key() {
        let dir = make_test_dir("list_toml");
        let path = dir.join("mobs.toml");
        fs::write(
            &path,
            r#"
[[mobs]]
name = "slime"
health = 4

[[mobs]]
name = "zombie"
health = 10
chains = [[{ Walk = { speed = 0.5, reach = 1.0 } }, { Strike = { range = 1.0, damage = 2 } }]]
"#,
        )
        .unwrap();

        let mobs: Vec<MobData> = deserialize_list(&path, "mobs").unwrap();
        assert_eq!(mobs.len(), 2);
        assert_eq!(mobs[1].name, "zombie");
        assert_eq!(mobs[1].chains[0].len(), 2);

        cleanup(&dir);
    }

    #[test]
    fn deserialize_list_toml_missing_key() {
        let dir = make_test_dir("list_toml_key");
        let path = dir.join("mobs.toml");
        fs::write(&path, "[[other]]\nname = \"x\"\n").unwrap();

        let result: Result<Vec<MobData>, _> = deserialize_list(&path, "mobs");
        assert!(matches!(result, Err(DataError::Parse { .. })));

        cleanup(&dir);
    }

    #[test]
    fn deserialize_file_parse_error() {
        let dir = make_test_dir("parse_err");
        let path = dir.join("bad.ron");
        fs::write(&path, "this is not valid RON {{{").unwrap();

        let result: Result<Vec<MobData>, _> = deserialize_file(&path);
        assert!(matches!(result, Err(DataError::Parse { .. })));

        cleanup(&dir);
    }

    // -----------------------------------------------------------------------
    // load_world_config
    // -----------------------------------------------------------------------

    #[test]
    fn world_config_toml_with_defaults() {
        let dir = make_test_dir("config_toml");
        let path = dir.join("world.toml");
        fs::write(
            &path,
            r#"
width = 32
height = 16
seed = 99

[liquid]
displace_below = 4
"#,
        )
        .unwrap();

        let config = load_world_config(&path).unwrap();
        assert_eq!((config.width, config.height, config.seed), (32, 16, 99));
        assert_eq!(config.target_refresh_interval, WorldConfig::default().target_refresh_interval);
        assert_eq!(config.liquid.displace_below, 4);
        assert_eq!(
            config.liquid.displace_margin,
            gridfab_fluid::LiquidConfig::default().displace_margin
        );

        cleanup(&dir);
    }

    #[test]
    fn world_config_ron_and_json() {
        let dir = make_test_dir("config_ron");
        let ron_path = dir.join("world.ron");
        fs::write(&ron_path, "(width: 8, height: 8, target_refresh_interval: 5)").unwrap();
        let json_path = dir.join("world.json");
        fs::write(&json_path, r#"{"width": 8, "height": 8, "target_refresh_interval": 5}"#).unwrap();

        assert_eq!(
            load_world_config(&ron_path).unwrap(),
            load_world_config(&json_path).unwrap()
        );

        cleanup(&dir);
    }

    #[test]
    fn world_config_rejects_empty_world() {
        let dir = make_test_dir("config_empty");
        let path = dir.join("world.json");
        fs::write(&path, r#"{"width": 0}"#).unwrap();

        assert!(matches!(load_world_config(&path), Err(DataError::Invalid { .. })));

        cleanup(&dir);
    }
}
