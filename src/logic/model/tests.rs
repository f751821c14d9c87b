//! Integration Tests for the sequence classifier
//!
//! Gradient check of the hand-derived backward pass, the state machine,
//! training on a separable toy problem and artifact round trips.

#[cfg(test)]
mod classifier_tests {
    use ndarray::{Array1, Array2};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use crate::logic::config::{ModelConfig, TrainConfig};
    use crate::logic::error::CoreError;
    use crate::logic::model::{
        AttentionPooledClassifier, Classifier, ClassifierInput, ClassifierOutput, ModelState, Sequence,
        SequenceWindower, Trainer,
    };

    fn tiny_config() -> ModelConfig {
        ModelConfig {
            hidden_units: 3,
            dense_units: 4,
            dropout: 0.0,
        }
    }

    fn random_window(rng: &mut StdRng, rows: usize, cols: usize) -> Array2<f64> {
        Array2::from_shape_simple_fn((rows, cols), || rng.gen_range(-1.0..1.0))
    }

    /// Windows whose mean of column 0 decides the label
    fn toy_dataset(n: usize, window: usize, cols: usize, seed: u64) -> Vec<Sequence> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..n)
            .map(|i| {
                let label = (i % 2) as f64;
                let mut x = random_window(&mut rng, window, cols) * 0.3;
                x.column_mut(0).mapv_inplace(|v| v + if label > 0.5 { 1.0 } else { -1.0 });
                Sequence::new(x, window, Some(label)).unwrap()
            })
            .collect()
    }

    /// Central finite differences agree with the analytic gradient
    #[test]
    fn test_gradient_check() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut model = AttentionPooledClassifier::new(3, 4, tiny_config(), 17).unwrap();
        let x = random_window(&mut rng, 4, 3);
        let target = 1.0;

        let (_, analytic) = model.loss_and_gradients(x.view(), target).unwrap();
        let analytic: Vec<Vec<f64>> = analytic.tensors().iter().map(|t| t.iter().copied().collect()).collect();

        let h = 1e-5;
        let mut checked = 0;
        for (k, grad) in analytic.iter().enumerate() {
            // A few entries per tensor keeps the test fast
            for idx in (0..grad.len()).step_by((grad.len() / 4).max(1)) {
                let original = {
                    let mut tensors = model.weights_for_training().unwrap().tensors_mut();
                    let slot = tensors[k].iter_mut().nth(idx).unwrap();
                    let v = *slot;
                    *slot = v + h;
                    v
                };
                let (plus, _) = model.loss_and_gradients(x.view(), target).unwrap();

                {
                    let mut tensors = model.weights_for_training().unwrap().tensors_mut();
                    *tensors[k].iter_mut().nth(idx).unwrap() = original - h;
                }
                let (minus, _) = model.loss_and_gradients(x.view(), target).unwrap();

                {
                    let mut tensors = model.weights_for_training().unwrap().tensors_mut();
                    *tensors[k].iter_mut().nth(idx).unwrap() = original;
                }

                let numeric = (plus - minus) / (2.0 * h);
                let diff = (numeric - grad[idx]).abs();
                let scale = numeric.abs().max(grad[idx].abs()).max(1e-4);
                assert!(
                    diff / scale < 1e-3,
                    "tensor {} index {}: numeric {} analytic {}",
                    k,
                    idx,
                    numeric,
                    grad[idx]
                );
                checked += 1;
            }
        }
        assert!(checked > 12);
    }

    #[test]
    fn test_state_machine() {
        let mut model = AttentionPooledClassifier::new(2, 3, tiny_config(), 1).unwrap();
        let x = Array2::zeros((3, 2));

        assert_eq!(model.state(), ModelState::Untrained);
        assert!(matches!(model.predict_window(x.view()), Err(CoreError::ModelNotTrained)));
        assert!(matches!(model.freeze(), Err(CoreError::ModelNotTrained)));

        let data = toy_dataset(4, 3, 2, 1);
        let trainer = Trainer::new(TrainConfig {
            epochs: 1,
            batch_size: 2,
            ..Default::default()
        })
        .unwrap();
        trainer.fit(&mut model, &data, None).unwrap();
        assert_eq!(model.state(), ModelState::Trained);
        assert!(model.predict_window(x.view()).is_ok());

        model.freeze().unwrap();
        assert_eq!(model.state(), ModelState::Serving);
        assert!(matches!(
            trainer.fit(&mut model, &data, None),
            Err(CoreError::ModelFrozen)
        ));
    }

    #[test]
    fn test_training_learns_separable_problem() {
        let window = 5;
        let train = toy_dataset(64, window, 3, 2);
        let test = toy_dataset(32, window, 3, 3);

        let mut model = AttentionPooledClassifier::new(3, window, tiny_config(), 7).unwrap();
        let trainer = Trainer::new(TrainConfig {
            epochs: 40,
            batch_size: 8,
            learning_rate: 1e-2,
            ..Default::default()
        })
        .unwrap();

        let history = trainer.fit(&mut model, &train, Some(&test)).unwrap();
        let losses = history.losses();

        assert_eq!(losses.len(), 40);
        assert!(losses[39] < losses[0]);
        let last = history.last().unwrap();
        let validation = last.validation.unwrap();
        assert!(validation.accuracy > 0.9, "validation accuracy {}", validation.accuracy);
        assert!(validation.auc > 0.9);
    }

    #[test]
    fn test_attention_weights_sum_to_one() {
        let mut model = AttentionPooledClassifier::new(3, 6, tiny_config(), 3).unwrap();
        let data = toy_dataset(4, 6, 3, 4);
        Trainer::new(TrainConfig { epochs: 1, ..Default::default() })
            .unwrap()
            .fit(&mut model, &data, None)
            .unwrap();

        let mut rng = StdRng::seed_from_u64(9);
        for _ in 0..5 {
            let x = random_window(&mut rng, 6, 3) * 10.0;
            let weights = model.attention_weights(x.view()).unwrap();
            assert_eq!(weights.len(), 6);
            assert!(weights.iter().all(|w| *w >= 0.0));
            assert!((weights.sum() - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_probability_bounds_and_batch_summary() {
        let mut model = AttentionPooledClassifier::new(2, 4, tiny_config(), 5).unwrap();
        let data = toy_dataset(10, 4, 2, 5);
        Trainer::new(TrainConfig { epochs: 2, ..Default::default() })
            .unwrap()
            .fit(&mut model, &data, None)
            .unwrap();

        let (predictions, summary) = model.predict_batch(&data, 3).unwrap();

        assert_eq!(summary.sequence_count, 10);
        assert_eq!(
            summary.positive_count,
            predictions.iter().filter(|p| p.label == 1).count()
        );
        for p in &predictions {
            assert!(p.probability > 0.0 && p.probability < 1.0);
            assert_eq!(p.label, u8::from(p.probability > 0.5));
        }
        assert_eq!(model.status().inference_count, 10);
    }

    #[test]
    fn test_classifier_trait_contract() {
        let mut model = AttentionPooledClassifier::new(2, 3, tiny_config(), 5).unwrap();
        let data = toy_dataset(4, 3, 2, 6);
        Trainer::new(TrainConfig { epochs: 1, ..Default::default() })
            .unwrap()
            .fit(&mut model, &data, None)
            .unwrap();

        let classifier: &dyn Classifier = &model;
        let out = classifier.predict(ClassifierInput::Sequence(data[0].data())).unwrap();
        assert!(matches!(out, ClassifierOutput::Sequence { .. }));

        let row = Array1::zeros(2);
        assert!(matches!(
            classifier.predict(ClassifierInput::Row(row.view())),
            Err(CoreError::UnsupportedInput(_))
        ));
    }

    #[test]
    fn test_wrong_window_shape_rejected() {
        let mut model = AttentionPooledClassifier::new(2, 3, tiny_config(), 5).unwrap();
        let data = toy_dataset(4, 3, 2, 6);
        Trainer::new(TrainConfig { epochs: 1, ..Default::default() })
            .unwrap()
            .fit(&mut model, &data, None)
            .unwrap();

        let result = model.predict_window(Array2::zeros((4, 2)).view());
        assert!(matches!(result, Err(CoreError::ShapeMismatch { .. })));
    }

    #[test]
    fn test_artifact_round_trip_serves() {
        let mut model = AttentionPooledClassifier::new(2, 3, tiny_config(), 8).unwrap();
        let data = toy_dataset(6, 3, 2, 8);
        Trainer::new(TrainConfig { epochs: 2, ..Default::default() })
            .unwrap()
            .fit(&mut model, &data, None)
            .unwrap();

        let artifact = model.to_artifact(0xdead_beef).unwrap();
        let json = serde_json::to_string(&artifact).unwrap();
        let restored = AttentionPooledClassifier::from_artifact(serde_json::from_str(&json).unwrap()).unwrap();

        assert_eq!(restored.state(), ModelState::Serving);
        for sequence in &data {
            let a = model.predict(sequence).unwrap();
            let b = restored.predict(sequence).unwrap();
            assert!((a.probability - b.probability).abs() < 1e-9);
        }
    }

    #[test]
    fn test_non_finite_artifact_rejected() {
        let mut model = AttentionPooledClassifier::new(2, 3, tiny_config(), 8).unwrap();
        let data = toy_dataset(4, 3, 2, 8);
        Trainer::new(TrainConfig { epochs: 1, ..Default::default() })
            .unwrap()
            .fit(&mut model, &data, None)
            .unwrap();

        let mut artifact = model.to_artifact(1).unwrap();
        artifact.weights.head.b1[0] = f64::NAN;
        assert!(matches!(
            AttentionPooledClassifier::from_artifact(artifact),
            Err(CoreError::SchemaContractMissing { .. })
        ));
    }

    /// Windower output feeds the classifier end to end
    #[test]
    fn test_windower_to_classifier() {
        let rows = 25;
        let matrix = Array2::from_shape_fn((rows, 2), |(i, j)| ((i + j) % 7) as f64 / 7.0);
        let labels = Array1::from_shape_fn(rows, |i| (i % 3 == 0) as u8 as f64);
        let windower = SequenceWindower::new(20).unwrap();
        let sequences = windower.sequences(matrix.view(), Some(labels.view())).unwrap();
        assert_eq!(sequences.len(), 5);

        let mut model = AttentionPooledClassifier::new(2, 20, tiny_config(), 2).unwrap();
        Trainer::new(TrainConfig { epochs: 1, ..Default::default() })
            .unwrap()
            .fit(&mut model, &sequences, None)
            .unwrap();
        let (_, summary) = model.predict_batch(&sequences, 64).unwrap();
        assert_eq!(summary.sequence_count, 5);
    }
}
