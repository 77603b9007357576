use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssetPathError {
    #[error("asset path must not be empty")]
    Empty,
    #[error("asset path must be relative")]
    Absolute,
    #[error("asset path must not contain '\\\\'")]
    Backslash,
    #[error("asset path must not contain '..' segments")]
    ParentTraversal,
    #[error("asset path has an empty segment")]
    EmptySegment,
    #[error("asset path contains invalid character '{character}'")]
    InvalidCharacter { character: char },
}

pub(crate) fn validate_asset_path(path: &str) -> Result<(), AssetPathError> {
    if path.is_empty() {
        return Err(AssetPathError::Empty);
    }
    if path.starts_with('/') {
        return Err(AssetPathError::Absolute);
    }
    if path.contains('\\') {
        return Err(AssetPathError::Backslash);
    }
    for segment in path.split('/') {
        if segment.is_empty() {
            return Err(AssetPathError::EmptySegment);
        }
        if segment == ".." {
            return Err(AssetPathError::ParentTraversal);
        }
    }
    for ch in path.chars() {
        if ch.is_ascii_alphanumeric() || matches!(ch, '_' | '/' | '-' | '.') {
            continue;
        }
        return Err(AssetPathError::InvalidCharacter { character: ch });
    }
    Ok(())
}

pub(crate) fn join_asset_path(root: &Path, path: &str) -> Result<PathBuf, AssetPathError> {
    validate_asset_path(path)?;
    Ok(path.split('/').fold(root.to_path_buf(), |acc, part| acc.join(part)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_relative_asset_paths() {
        for path in ["levels/field.json", "tiles/grass_01.png", "a-b/c_d/E.png", "x"] {
            assert!(validate_asset_path(path).is_ok(), "path={path}");
        }
    }

    #[test]
    fn rejects_escaping_or_malformed_paths() {
        let cases = [
            ("", AssetPathError::Empty),
            ("/etc/passwd", AssetPathError::Absolute),
            (r"tiles\grass.png", AssetPathError::Backslash),
            ("../secret.json", AssetPathError::ParentTraversal),
            ("levels/../../x", AssetPathError::ParentTraversal),
            ("levels//field.json", AssetPathError::EmptySegment),
            ("levels/field json", AssetPathError::InvalidCharacter { character: ' ' }),
        ];
        for (path, expected) in cases {
            assert_eq!(validate_asset_path(path), Err(expected), "path={path}");
        }
    }

    #[test]
    fn join_builds_path_under_root() {
        let joined = join_asset_path(Path::new("/data/assets"), "tiles/grass.png").expect("join");
        assert_eq!(joined, Path::new("/data/assets").join("tiles").join("grass.png"));
    }
}
