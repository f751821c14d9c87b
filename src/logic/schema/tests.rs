//! Schema alignment tests

#[cfg(test)]
mod alignment_tests {
    use std::sync::Arc;

    use ndarray::array;

    use crate::logic::error::{CoreError, RecoveredIssue};
    use crate::logic::features::{FeatureFrame, FeatureVector};
    use crate::logic::schema::{validate_schema, FeatureSchema, SchemaAligner};

    fn schema(columns: &[&str]) -> Arc<FeatureSchema> {
        Arc::new(FeatureSchema::new(columns.iter().map(|s| s.to_string()).collect()))
    }

    /// Three missing columns are filled with 0.0, the rest keep their values
    #[test]
    fn test_missing_columns_filled() {
        let aligner = SchemaAligner::new(schema(&["a", "b", "c", "d", "e"]));
        let input = FeatureVector::from_pairs([("d", 4.0), ("a", 1.0)]);

        let (aligned, report) = aligner.align(&input).unwrap();

        assert_eq!(aligned.columns(), &["a", "b", "c", "d", "e"].map(String::from));
        assert_eq!(aligned.values(), &[1.0, 0.0, 0.0, 4.0, 0.0]);
        assert_eq!(report.added, vec!["b", "c", "e"]);
        assert!(report.reordered);
        assert_eq!(report.issues.len(), 3);
        assert!(matches!(report.issues[0], RecoveredIssue::MissingColumn { .. }));
    }

    #[test]
    fn test_extra_columns_dropped() {
        let aligner = SchemaAligner::new(schema(&["a", "b"]));
        let input = FeatureVector::from_pairs([("a", 1.0), ("label", 1.0), ("b", 2.0)]);

        let (aligned, report) = aligner.align(&input).unwrap();

        assert_eq!(aligned.len(), 2);
        assert_eq!(report.dropped, vec!["label"]);
        assert!(!report.reordered);
        assert!(report.added.is_empty());
    }

    #[test]
    fn test_align_is_idempotent() {
        let aligner = SchemaAligner::new(schema(&["a", "b", "c"]));
        let input = FeatureVector::from_pairs([("c", 3.0), ("x", 9.0), ("a", 1.0)]);

        let (once, _) = aligner.align(&input).unwrap();
        let (twice, report) = aligner.align(&once).unwrap();

        assert_eq!(once, twice);
        assert!(report.is_clean());
    }

    #[test]
    fn test_no_schema_is_contract_missing() {
        let aligner = SchemaAligner::default();
        let result = aligner.align(&FeatureVector::new());
        assert!(matches!(result, Err(CoreError::SchemaContractMissing { .. })));
    }

    #[test]
    fn test_align_frame() {
        let aligner = SchemaAligner::new(schema(&["a", "b", "c"]));
        let frame = FeatureFrame::new(
            vec!["c".into(), "a".into(), "z".into()],
            array![[3.0, 1.0, 0.0], [f64::NAN, 2.0, 0.0]],
        )
        .unwrap();

        let (aligned, report) = aligner.align_frame(&frame).unwrap();

        assert_eq!(aligned.shape(), (2, 3));
        assert_eq!(aligned.data(), &array![[1.0, 0.0, 3.0], [2.0, 0.0, 0.0]]);
        assert_eq!(report.added, vec!["b"]);
        assert_eq!(report.dropped, vec!["z"]);
        assert!(report
            .issues
            .iter()
            .any(|i| matches!(i, RecoveredIssue::NonFinite { count: 1, .. })));

        // Vector and frame paths agree
        let (row, _) = aligner.align(&frame.row_vector(0).unwrap()).unwrap();
        assert_eq!(row, aligned.row_vector(0).unwrap());
    }

    #[test]
    fn test_align_vector_replaces_non_finite() {
        let aligner = SchemaAligner::new(schema(&["a", "b", "c"]));
        let input = FeatureVector::from_pairs([("a", f64::INFINITY), ("b", 2.0), ("c", f64::NAN)]);

        let (aligned, report) = aligner.align(&input).unwrap();

        assert_eq!(aligned.values(), &[0.0, 2.0, 0.0]);
        let flagged: Vec<_> = report
            .issues
            .iter()
            .filter_map(|i| match i {
                RecoveredIssue::NonFinite { column, count: 1 } => Some(column.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(flagged, vec!["a", "c"]);
    }

    #[test]
    fn test_capture_excludes_label() {
        let frame = FeatureFrame::new(vec!["a".into(), "label".into()], array![[1.0, 0.0]]).unwrap();
        let captured = FeatureSchema::capture(&frame);

        assert_eq!(captured.columns, vec!["a"]);
        assert!(validate_schema(&captured).is_ok());
    }

    #[test]
    fn test_tampered_schema_rejected() {
        let mut tampered = (*schema(&["a", "b"])).clone();
        tampered.columns.swap(0, 1);

        assert!(matches!(
            validate_schema(&tampered),
            Err(CoreError::LayoutMismatch { .. })
        ));
    }
}
