//! TOML manifest file loading.
use serde::de::DeserializeOwned;
use std::path::Path;

use crate::error::ManifestError;

/// Load and deserialize a TOML manifest file.
///
/// A missing file deserializes from an empty document, so every manifest
/// type must tolerate all of its fields being absent (`#[serde(default)]`).
///
/// # Errors
///
/// Returns [`ManifestError::Io`] if the file exists but cannot be read and
/// [`ManifestError::Parse`] if it is not valid TOML for `T`.
pub fn load_config<T: DeserializeOwned>(path: &Path) -> Result<T, ManifestError> {
    if !path.exists() {
        return toml::from_str("").map_err(|e| ManifestError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        });
    }

    let content = std::fs::read_to_string(path).map_err(|source| ManifestError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    parse_config(path, &content)
}

/// Deserialize TOML `content`, attributing errors to `path`.
///
/// # Errors
///
/// Returns [`ManifestError::Parse`] if `content` is not valid TOML for `T`.
pub fn parse_config<T: DeserializeOwned>(path: &Path, content: &str) -> Result<T, ManifestError> {
    toml::from_str(content).map_err(|e| ManifestError::Parse {
        path: path.to_path_buf(),
        message: e.message().to_string(),
    })
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Default, Deserialize)]
    #[serde(default)]
    struct Sample {
        name: String,
        items: Vec<String>,
    }

    #[test]
    fn missing_file_is_empty_default() {
        let dir = tempfile::tempdir().unwrap();
        let sample: Sample = load_config(&dir.path().join("absent.toml")).unwrap();
        assert!(sample.name.is_empty());
        assert!(sample.items.is_empty());
    }

    #[test]
    fn reads_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.toml");
        std::fs::write(&path, "name = \"demo\"\nitems = [\"a\", \"b\"]\n").unwrap();
        let sample: Sample = load_config(&path).unwrap();
        assert_eq!(sample.name, "demo");
        assert_eq!(sample.items, ["a", "b"]);
    }

    #[test]
    fn parse_error_names_file() {
        let err = parse_config::<Sample>(Path::new("conf/broken.toml"), "name = [").unwrap_err();
        assert!(matches!(err, ManifestError::Parse { .. }));
        assert!(err.to_string().contains("conf/broken.toml"));
    }
}
