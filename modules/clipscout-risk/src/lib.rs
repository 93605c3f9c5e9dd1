//! Text risk scoring.
//!
//! A gated, batched front-end over an ONNX sequence classifier. Texts with
//! no semantic content are scored 0.0 without touching the model; the model
//! itself loads lazily, once per process.

pub mod annotate;
pub mod error;
pub mod gate;
pub mod model;
pub mod scorer;

pub use annotate::add_risk_columns;
pub use error::{RiskError, RiskResult};
pub use gate::is_meaningful_text;
pub use model::{OrtRiskModel, RiskModel};
pub use scorer::RiskScorer;
