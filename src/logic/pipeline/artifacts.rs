//! Frozen artifact bundle
//!
//! Schema, scaler, reference aggregates and model weights are persisted
//! together with a manifest of SHA-256 checksums. Loading verifies every
//! checksum and every layout binding; any failure is `SchemaContractMissing`.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

use crate::constants::{
    AGGREGATES_FILE, APP_VERSION, MANIFEST_FILE, MODEL_FILE, SCALER_FILE, SCHEMA_FILE,
};
use crate::logic::error::{CoreError, CoreResult};
use crate::logic::features::ReferenceAggregates;
use crate::logic::model::{AttentionPooledClassifier, ModelArtifact};
use crate::logic::scaler::ScalerState;
use crate::logic::schema::{validate_binding, validate_schema, FeatureSchema};
use crate::logic::storage::{load_json, load_json_verified, save_json};

// ============================================================================
// MANIFEST
// ============================================================================

/// Checksums of every file in an artifact directory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactManifest {
    pub app_version: String,
    pub layout_hash: u32,
    pub created_at: i64, // Unix timestamp
    /// File name → SHA-256 hex
    pub files: BTreeMap<String, String>,
}

impl ArtifactManifest {
    fn checksum(&self, file: &str) -> CoreResult<&str> {
        self.files
            .get(file)
            .map(String::as_str)
            .ok_or_else(|| CoreError::contract_missing(file, "not listed in manifest"))
    }
}

// ============================================================================
// ARTIFACT SET
// ============================================================================

/// Everything the serving path reads, validated as one unit
#[derive(Debug, Clone)]
pub struct ArtifactSet {
    pub schema: Arc<FeatureSchema>,
    pub scaler: Arc<ScalerState>,
    pub aggregates: Arc<ReferenceAggregates>,
    pub model: Arc<AttentionPooledClassifier>,
}

impl ArtifactSet {
    /// Bundle fitted artifacts, checking they agree with each other
    pub fn new(
        schema: Arc<FeatureSchema>,
        scaler: Arc<ScalerState>,
        aggregates: Arc<ReferenceAggregates>,
        model: Arc<AttentionPooledClassifier>,
    ) -> CoreResult<Self> {
        let set = Self {
            schema,
            scaler,
            aggregates,
            model,
        };
        set.validate()?;
        Ok(set)
    }

    pub fn validate(&self) -> CoreResult<()> {
        validate_schema(&self.schema)?;
        self.scaler.validate(&self.schema)?;
        self.aggregates
            .validate()
            .map_err(|e| CoreError::contract_missing("aggregates", e))?;
        if self.model.input_dim() != self.schema.len() {
            return Err(CoreError::contract_missing(
                "model",
                format!(
                    "expects {} features, schema has {}",
                    self.model.input_dim(),
                    self.schema.len()
                ),
            ));
        }
        Ok(())
    }

    pub fn layout_hash(&self) -> u32 {
        self.schema.layout_hash
    }

    /// Persist all artifacts plus the manifest
    pub fn save(&self, dir: &Path) -> CoreResult<ArtifactManifest> {
        let mut files = BTreeMap::new();

        let model = self.model.to_artifact(self.layout_hash())?;

        files.insert(SCHEMA_FILE.to_string(), save_json(self.schema.as_ref(), &dir.join(SCHEMA_FILE))?);
        files.insert(SCALER_FILE.to_string(), save_json(self.scaler.as_ref(), &dir.join(SCALER_FILE))?);
        files.insert(
            AGGREGATES_FILE.to_string(),
            save_json(self.aggregates.as_ref(), &dir.join(AGGREGATES_FILE))?,
        );
        files.insert(MODEL_FILE.to_string(), save_json(&model, &dir.join(MODEL_FILE))?);

        let manifest = ArtifactManifest {
            app_version: APP_VERSION.to_string(),
            layout_hash: self.layout_hash(),
            created_at: Utc::now().timestamp(),
            files,
        };
        save_json(&manifest, &dir.join(MANIFEST_FILE))?;

        log::info!(
            "Saved artifacts to {} (layout {:08x})",
            dir.display(),
            manifest.layout_hash
        );
        Ok(manifest)
    }

    /// Load and verify a saved artifact directory
    pub fn load(dir: &Path) -> CoreResult<Self> {
        let manifest: ArtifactManifest = load_json(&dir.join(MANIFEST_FILE))?;

        let schema: FeatureSchema =
            load_json_verified(&dir.join(SCHEMA_FILE), manifest.checksum(SCHEMA_FILE)?)?;
        validate_schema(&schema).map_err(|e| CoreError::contract_missing(SCHEMA_FILE, e))?;
        validate_binding(&schema, MANIFEST_FILE, manifest.layout_hash)?;

        let scaler: ScalerState =
            load_json_verified(&dir.join(SCALER_FILE), manifest.checksum(SCALER_FILE)?)?;
        let aggregates: ReferenceAggregates =
            load_json_verified(&dir.join(AGGREGATES_FILE), manifest.checksum(AGGREGATES_FILE)?)?;
        let artifact: ModelArtifact =
            load_json_verified(&dir.join(MODEL_FILE), manifest.checksum(MODEL_FILE)?)?;

        validate_binding(&schema, MODEL_FILE, artifact.layout_hash)?;
        let model = AttentionPooledClassifier::from_artifact(artifact)
            .map_err(|e| CoreError::contract_missing(MODEL_FILE, e))?;

        let set = Self {
            schema: Arc::new(schema),
            scaler: Arc::new(scaler),
            aggregates: Arc::new(aggregates),
            model: Arc::new(model),
        };
        set.validate().map_err(|e| match e {
            CoreError::SchemaContractMissing { .. } => e,
            other => CoreError::contract_missing(dir.display().to_string(), other),
        })?;

        log::info!(
            "Loaded artifacts from {}: {} columns, {} sources, window {}",
            dir.display(),
            set.schema.len(),
            set.aggregates.source_count(),
            set.model.window()
        );
        Ok(set)
    }
}

// ============================================================================
// PROCESS-WIDE ARTIFACTS
// ============================================================================

/// Write-once artifact store shared read-only by every request
static ARTIFACTS: OnceCell<ArtifactSet> = OnceCell::new();

/// Install the process-wide artifacts. A second install is an error.
pub fn install(set: ArtifactSet) -> CoreResult<&'static ArtifactSet> {
    set.validate()?;
    ARTIFACTS
        .set(set)
        .map_err(|_| CoreError::AlreadyInstalled("artifact set"))?;
    log::info!("Process-wide artifacts installed");
    current()
}

/// The installed artifacts
pub fn current() -> CoreResult<&'static ArtifactSet> {
    ARTIFACTS
        .get()
        .ok_or_else(|| CoreError::contract_missing("artifact set", "not installed"))
}

/// Load from disk and install; fatal for startup on failure
pub fn load_and_install(dir: &Path) -> CoreResult<&'static ArtifactSet> {
    let set = ArtifactSet::load(dir).map_err(|e| {
        log::error!("Failed to load artifacts from {}: {}", dir.display(), e);
        e
    })?;
    install(set)
}
