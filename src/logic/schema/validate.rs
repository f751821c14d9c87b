use crate::logic::error::{CoreError, CoreResult};
use crate::logic::features::layout::{hash_columns, FEATURE_VERSION};
use super::types::FeatureSchema;

/// Validate a persisted schema against the running engine
pub fn validate_schema(schema: &FeatureSchema) -> CoreResult<()> {
    let actual_hash = hash_columns(schema.version, &schema.columns);

    if schema.version != FEATURE_VERSION || actual_hash != schema.layout_hash {
        return Err(CoreError::LayoutMismatch {
            expected_version: FEATURE_VERSION,
            expected_hash: schema.layout_hash,
            actual_version: schema.version,
            actual_hash,
        });
    }

    if schema.is_empty() {
        return Err(CoreError::contract_missing("feature schema", "schema has no columns"));
    }

    Ok(())
}

/// Check that an artifact was fitted against this schema
pub fn validate_binding(schema: &FeatureSchema, artifact: &str, layout_hash: u32) -> CoreResult<()> {
    if layout_hash != schema.layout_hash {
        return Err(CoreError::contract_missing(
            artifact,
            format!(
                "bound to layout {:08x}, schema is {:08x}",
                layout_hash, schema.layout_hash
            ),
        ));
    }
    Ok(())
}
