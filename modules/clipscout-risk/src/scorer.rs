//! The scoring front-end.
//!
//! `RiskScorer` owns the eligibility gate, lazy model initialization, and
//! batching. The model loads at most once per process, and only if at least
//! one text actually passes the gate. Ineligible texts score 0.0 without a
//! forward pass.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::debug;

use crate::error::RiskResult;
use crate::gate::is_meaningful_text;
use crate::model::{OrtRiskModel, RiskModel};

/// Score assigned to texts that never reach the model.
const EMPTY_SCORE: f64 = 0.0;

type ModelLoader = Box<dyn Fn() -> RiskResult<Arc<dyn RiskModel>> + Send + Sync>;

pub struct RiskScorer {
    model: OnceCell<Arc<dyn RiskModel>>,
    loader: ModelLoader,
    batch_size: usize,
}

impl RiskScorer {
    /// Scorer backed by an ONNX classifier on disk. Nothing is read from
    /// `model_dir` until the first eligible text arrives.
    pub fn new(model_dir: PathBuf, class_override: Option<usize>, batch_size: usize) -> Self {
        Self {
            model: OnceCell::new(),
            loader: Box::new(move || {
                OrtRiskModel::load(&model_dir, class_override)
                    .map(|m| Arc::new(m) as Arc<dyn RiskModel>)
            }),
            batch_size: batch_size.max(1),
        }
    }

    /// Scorer over an already-built model. Used by tests.
    pub fn with_model(model: Arc<dyn RiskModel>, batch_size: usize) -> Self {
        Self {
            model: OnceCell::new_with(Some(model)),
            loader: Box::new(|| unreachable!("model pre-seeded")),
            batch_size: batch_size.max(1),
        }
    }

    /// Score a slice of texts, one probability per input, order preserved.
    ///
    /// Gated-out texts get [`EMPTY_SCORE`]; only the eligible remainder is
    /// batched through the model. If everything is gated out, the model is
    /// never loaded.
    pub async fn score_texts(&self, texts: &[&str]) -> RiskResult<Vec<f64>> {
        let mut scores = vec![EMPTY_SCORE; texts.len()];

        let eligible: Vec<(usize, &str)> = texts
            .iter()
            .enumerate()
            .filter(|(_, t)| is_meaningful_text(t))
            .map(|(i, t)| (i, *t))
            .collect();
        if eligible.is_empty() {
            return Ok(scores);
        }

        let model = self
            .model
            .get_or_try_init(|| async { (self.loader)() })
            .await?;

        for chunk in eligible.chunks(self.batch_size) {
            let batch: Vec<&str> = chunk.iter().map(|(_, t)| *t).collect();
            debug!(batch_len = batch.len(), "scoring batch");
            let probs = model.classify(&batch)?;
            for ((index, _), prob) in chunk.iter().zip(probs) {
                scores[*index] = prob;
            }
        }
        Ok(scores)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::error::RiskResult;

    /// Records every batch it sees and scores text by its length.
    struct CountingModel {
        batches: Mutex<Vec<usize>>,
    }

    impl CountingModel {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                batches: Mutex::new(Vec::new()),
            })
        }

        fn batch_sizes(&self) -> Vec<usize> {
            self.batches.lock().unwrap().clone()
        }
    }

    impl RiskModel for CountingModel {
        fn classify(&self, texts: &[&str]) -> RiskResult<Vec<f64>> {
            self.batches.lock().unwrap().push(texts.len());
            Ok(texts.iter().map(|t| t.len() as f64 / 100.0).collect())
        }
    }

    #[tokio::test]
    async fn gated_texts_never_reach_the_model() {
        let model = CountingModel::new();
        let scorer = RiskScorer::with_model(model.clone(), 16);

        let scores = scorer
            .score_texts(&["", "none", "!!!", "ab"])
            .await
            .unwrap();
        assert_eq!(scores, vec![0.0, 0.0, 0.0, 0.0]);
        assert!(model.batch_sizes().is_empty());
    }

    #[tokio::test]
    async fn scores_keep_input_order_and_length() {
        let model = CountingModel::new();
        let scorer = RiskScorer::with_model(model.clone(), 16);

        let scores = scorer
            .score_texts(&["feeling down today", "", "a longer meaningful sentence"])
            .await
            .unwrap();
        assert_eq!(scores.len(), 3);
        assert_eq!(scores[0], 18.0 / 100.0);
        assert_eq!(scores[1], 0.0);
        assert_eq!(scores[2], 28.0 / 100.0);
    }

    #[tokio::test]
    async fn eligible_texts_are_chunked_by_batch_size() {
        let model = CountingModel::new();
        let scorer = RiskScorer::with_model(model.clone(), 16);

        let texts: Vec<String> = (0..40).map(|i| format!("meaningful text {i}")).collect();
        let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
        let scores = scorer.score_texts(&refs).await.unwrap();

        assert_eq!(scores.len(), 40);
        assert_eq!(model.batch_sizes(), vec![16, 16, 8]);
    }

    #[tokio::test]
    async fn mixed_batch_scatters_back_to_original_positions() {
        let model = CountingModel::new();
        let scorer = RiskScorer::with_model(model.clone(), 2);

        let scores = scorer
            .score_texts(&["nan", "hello there", "1234", "another real text"])
            .await
            .unwrap();
        assert_eq!(scores[0], 0.0);
        assert!(scores[1] > 0.0);
        assert_eq!(scores[2], 0.0);
        assert!(scores[3] > 0.0);
        assert_eq!(model.batch_sizes(), vec![2]);
    }
}
