//! Classifier backend.
//!
//! `RiskModel` is the seam: the scorer's gating and batching logic runs
//! against any backend, and tests use counting stubs. `OrtRiskModel` is the
//! real one: a HuggingFace-exported sequence classifier loaded from a
//! directory holding `model.onnx`, `tokenizer.json`, and `config.json`.

use std::path::Path;
use std::sync::Mutex;

use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::{Tensor, Value};
use tokenizers::{PaddingParams, Tokenizer, TruncationParams};
use tracing::{info, warn};

use crate::error::{RiskError, RiskResult};

/// Maximum token length per text, matching the classifier's training.
const MAX_TOKENS: usize = 512;

/// Label names conventionally used for the positive/risk class.
const POSITIVE_LABELS: &[&str] = &["suicide", "suicidal", "risk", "label_1", "1"];

pub trait RiskModel: Send + Sync {
    /// Risk-class probability (0–1) per input text, order preserved.
    fn classify(&self, texts: &[&str]) -> RiskResult<Vec<f64>>;
}

pub struct OrtRiskModel {
    session: Mutex<Session>,
    tokenizer: Tokenizer,
    risk_index: usize,
    logits_output: String,
    wants_token_type_ids: bool,
}

impl OrtRiskModel {
    /// Load the classifier. `class_override`, when set, skips label-name
    /// resolution entirely.
    pub fn load(model_dir: &Path, class_override: Option<usize>) -> RiskResult<Self> {
        let config: serde_json::Value =
            serde_json::from_slice(&std::fs::read(model_dir.join("config.json"))?)?;
        let risk_index = resolve_risk_index(&config, class_override);

        let mut tokenizer = Tokenizer::from_file(model_dir.join("tokenizer.json"))
            .map_err(|e| RiskError::Tokenizer(e.to_string()))?;
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: MAX_TOKENS,
                ..Default::default()
            }))
            .map_err(|e| RiskError::Tokenizer(e.to_string()))?;
        tokenizer.with_padding(Some(PaddingParams::default()));

        let model_bytes = std::fs::read(model_dir.join("model.onnx"))?;
        let session = Session::builder()
            .map_err(|e| RiskError::ModelLoad(e.to_string()))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| RiskError::ModelLoad(e.to_string()))?
            .commit_from_memory(&model_bytes)
            .map_err(|e| RiskError::ModelLoad(e.to_string()))?;

        let logits_output = session
            .outputs
            .first()
            .map(|o| o.name.clone())
            .ok_or_else(|| RiskError::ModelLoad("model declares no outputs".to_string()))?;
        let wants_token_type_ids = session
            .inputs
            .iter()
            .any(|i| i.name == "token_type_ids");

        info!(
            model_dir = %model_dir.display(),
            risk_index,
            "risk classifier loaded"
        );

        Ok(Self {
            session: Mutex::new(session),
            tokenizer,
            risk_index,
            logits_output,
            wants_token_type_ids,
        })
    }
}

impl RiskModel for OrtRiskModel {
    fn classify(&self, texts: &[&str]) -> RiskResult<Vec<f64>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let encodings = self
            .tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| RiskError::Tokenizer(e.to_string()))?;

        let batch = encodings.len();
        let seq = encodings
            .first()
            .map(|e| e.get_ids().len())
            .unwrap_or_default();

        let mut ids = Vec::with_capacity(batch * seq);
        let mut mask = Vec::with_capacity(batch * seq);
        let mut type_ids = Vec::with_capacity(batch * seq);
        for enc in &encodings {
            ids.extend(enc.get_ids().iter().map(|&v| v as i64));
            mask.extend(enc.get_attention_mask().iter().map(|&v| v as i64));
            type_ids.extend(enc.get_type_ids().iter().map(|&v| v as i64));
        }

        let shape = vec![batch, seq];
        let ids_t = tensor(shape.clone(), ids)?;
        let mask_t = tensor(shape.clone(), mask)?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| RiskError::Inference("session poisoned".to_string()))?;

        let outputs = if self.wants_token_type_ids {
            let type_t = tensor(shape, type_ids)?;
            session
                .run(ort::inputs![
                    "input_ids" => ids_t,
                    "attention_mask" => mask_t,
                    "token_type_ids" => type_t,
                ])
                .map_err(|e| RiskError::Inference(e.to_string()))?
        } else {
            session
                .run(ort::inputs![
                    "input_ids" => ids_t,
                    "attention_mask" => mask_t,
                ])
                .map_err(|e| RiskError::Inference(e.to_string()))?
        };

        let (_, logits) = outputs
            .get(self.logits_output.as_str())
            .ok_or_else(|| RiskError::Inference("model returned no logits".to_string()))?
            .try_extract_tensor::<f32>()
            .map_err(|e| RiskError::Inference(e.to_string()))?;

        let num_labels = logits.len() / batch;
        if self.risk_index >= num_labels {
            return Err(RiskError::Inference(format!(
                "risk class index {} out of range for {num_labels} labels",
                self.risk_index
            )));
        }

        let scores = (0..batch)
            .map(|row| {
                let row_logits = &logits[row * num_labels..(row + 1) * num_labels];
                softmax(row_logits)[self.risk_index] as f64
            })
            .collect();
        Ok(scores)
    }
}

fn tensor(shape: Vec<usize>, data: Vec<i64>) -> RiskResult<Value> {
    Tensor::from_array((shape, data.into_boxed_slice()))
        .map(Value::from)
        .map_err(|e| RiskError::Inference(e.to_string()))
}

fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|&v| (v - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

/// Resolve which logit index is the risk class.
///
/// Order: explicit override, `label2id` lookup by known positive names,
/// `id2label` scan, then the binary positive-class convention (index 1).
/// The final fallback is a heuristic, so it logs a warning rather than
/// passing silently.
pub fn resolve_risk_index(config: &serde_json::Value, class_override: Option<usize>) -> usize {
    if let Some(index) = class_override {
        info!(index, "risk class index set by configuration");
        return index;
    }

    if let Some(label2id) = config.get("label2id").and_then(|v| v.as_object()) {
        for (label, id) in label2id {
            if POSITIVE_LABELS.contains(&label.to_lowercase().as_str()) {
                if let Some(index) = id.as_u64() {
                    return index as usize;
                }
            }
        }
    }

    if let Some(id2label) = config.get("id2label").and_then(|v| v.as_object()) {
        for (id, label) in id2label {
            let name = label.as_str().unwrap_or_default().to_lowercase();
            if POSITIVE_LABELS.contains(&name.as_str()) {
                if let Ok(index) = id.parse() {
                    return index;
                }
            }
        }
    }

    warn!(
        "no risk label matched in model config; assuming positive class at index 1 \
         (set CLIPSCOUT_RISK_CLASS_INDEX if this model's convention differs)"
    );
    1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn override_beats_everything() {
        let config = serde_json::json!({"label2id": {"suicide": 0}});
        assert_eq!(resolve_risk_index(&config, Some(3)), 3);
    }

    #[test]
    fn label2id_match_wins() {
        let config = serde_json::json!({"label2id": {"non-suicide": 0, "suicide": 1}});
        assert_eq!(resolve_risk_index(&config, None), 1);

        let config = serde_json::json!({"label2id": {"RISK": 0, "safe": 1}});
        assert_eq!(resolve_risk_index(&config, None), 0);
    }

    #[test]
    fn id2label_scan_when_label2id_misses() {
        let config = serde_json::json!({
            "label2id": {"a": 0, "b": 1},
            "id2label": {"0": "calm", "1": "SUICIDAL"}
        });
        assert_eq!(resolve_risk_index(&config, None), 1);
    }

    #[test]
    fn defaults_to_binary_positive_class() {
        let config = serde_json::json!({});
        assert_eq!(resolve_risk_index(&config, None), 1);
    }

    #[test]
    fn softmax_rows_are_probabilities() {
        let probs = softmax(&[0.0, 0.0]);
        assert!((probs[0] - 0.5).abs() < 1e-6);
        assert!((probs[1] - 0.5).abs() < 1e-6);
    }
}
