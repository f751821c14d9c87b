//! Artifact storage helpers
//!
//! JSON persistence shared by schema, scaler, aggregates and model weights,
//! plus SHA-256 checksums recorded in the artifact manifest.

use std::fs;
use std::path::Path;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sha2::{Digest, Sha256};

use super::error::{CoreError, CoreResult};

/// Save a value as pretty JSON, creating parent directories.
/// Returns the SHA-256 of the written bytes.
pub fn save_json<T: Serialize>(value: &T, path: &Path) -> CoreResult<String> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_vec_pretty(value)?;
    fs::write(path, &json)?;
    Ok(sha256_hex(&json))
}

/// Load a JSON artifact. Any failure is a missing contract.
pub fn load_json<T: DeserializeOwned>(path: &Path) -> CoreResult<T> {
    let data = read_artifact(path)?;
    serde_json::from_slice(&data).map_err(|e| CoreError::contract_missing(display(path), e))
}

/// Load a JSON artifact and verify its checksum first
pub fn load_json_verified<T: DeserializeOwned>(path: &Path, expected_sha256: &str) -> CoreResult<T> {
    let data = read_artifact(path)?;

    let actual = sha256_hex(&data);
    if !actual.eq_ignore_ascii_case(expected_sha256) {
        return Err(CoreError::contract_missing(
            display(path),
            format!("checksum mismatch: expected {}, got {}", expected_sha256, actual),
        ));
    }

    serde_json::from_slice(&data).map_err(|e| CoreError::contract_missing(display(path), e))
}

pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

fn read_artifact(path: &Path) -> CoreResult<Vec<u8>> {
    if !path.exists() {
        return Err(CoreError::contract_missing(display(path), "file not found"));
    }
    fs::read(path).map_err(|e| CoreError::contract_missing(display(path), e))
}

fn display(path: &Path) -> String {
    path.display().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_load_verified() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("values.json");

        let checksum = save_json(&vec![1.0f64, 2.0, 3.0], &path).unwrap();
        let loaded: Vec<f64> = load_json_verified(&path, &checksum).unwrap();
        assert_eq!(loaded, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_checksum_mismatch_is_contract_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("values.json");
        save_json(&vec![1u8], &path).unwrap();

        let result: CoreResult<Vec<u8>> = load_json_verified(&path, "deadbeef");
        assert!(matches!(result, Err(CoreError::SchemaContractMissing { .. })));
    }

    #[test]
    fn test_missing_file_is_contract_missing() {
        let dir = tempfile::tempdir().unwrap();
        let result: CoreResult<Vec<u8>> = load_json(&dir.path().join("absent.json"));
        assert!(matches!(result, Err(CoreError::SchemaContractMissing { .. })));
    }
}
