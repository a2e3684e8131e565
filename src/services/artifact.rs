//! Serialized model artifacts and their evaluators.
//!
//! Artifacts are JSON documents tagged by `kind`. Each one deserializes into a
//! concrete estimator behind the [`Estimator`] trait, so the rest of the crate
//! only ever sees `predict` / `predict_proba`.

use std::path::{Path, PathBuf};

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use statrs::function::logistic::logistic;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to parse artifact: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid artifact: {0}")]
    Invalid(String),

    #[error("expected {expected} features, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("{0} does not support predict_proba")]
    ProbaUnsupported(&'static str),
}

/// Raw output of `predict`.
#[derive(Debug, Clone, PartialEq)]
pub enum RawOutput {
    Scalar(f64),
    Label(String),
}

/// A loaded, read-only model.
pub trait Estimator: Send + Sync {
    fn kind(&self) -> &'static str;

    fn n_features(&self) -> usize;

    /// Column names embedded in the artifact, if it was fitted on named data.
    fn feature_names(&self) -> Option<&[String]>;

    /// Class labels in output order; `None` for regressors.
    fn classes(&self) -> Option<&[String]> {
        None
    }

    fn predict(&self, x: &[f64]) -> Result<RawOutput, ArtifactError>;

    fn predict_proba(&self, x: &[f64]) -> Result<Vec<f64>, ArtifactError>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelArtifact {
    LinearRegression(LinearRegression),
    LogisticRegression(LogisticRegression),
    DecisionTree(DecisionTree),
}

impl ModelArtifact {
    /// Parses and validates an artifact document.
    pub fn from_json(json: &str) -> Result<Box<dyn Estimator>, ArtifactError> {
        let artifact: ModelArtifact = serde_json::from_str(json)?;
        artifact.validate()?;
        Ok(artifact.into_estimator())
    }

    pub fn load(path: &Path) -> Result<Box<dyn Estimator>, ArtifactError> {
        let json = std::fs::read_to_string(path).map_err(|source| ArtifactError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json).map_err(|e| match e {
            ArtifactError::Json(source) => ArtifactError::Parse {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })
    }

    pub fn validate(&self) -> Result<(), ArtifactError> {
        match self {
            ModelArtifact::LinearRegression(model) => model.validate(),
            ModelArtifact::LogisticRegression(model) => model.validate(),
            ModelArtifact::DecisionTree(model) => model.validate(),
        }
    }

    fn into_estimator(self) -> Box<dyn Estimator> {
        match self {
            ModelArtifact::LinearRegression(model) => Box::new(model),
            ModelArtifact::LogisticRegression(model) => Box::new(model),
            ModelArtifact::DecisionTree(model) => Box::new(model),
        }
    }
}

fn check_width(expected: usize, x: &[f64]) -> Result<(), ArtifactError> {
    if x.len() != expected {
        return Err(ArtifactError::DimensionMismatch {
            expected,
            actual: x.len(),
        });
    }
    Ok(())
}

fn check_feature_names(names: &Option<Vec<String>>, width: usize) -> Result<(), ArtifactError> {
    match names {
        Some(names) if names.len() != width => Err(ArtifactError::Invalid(format!(
            "{} feature names for {} coefficients",
            names.len(),
            width
        ))),
        _ => Ok(()),
    }
}

/// Index of the largest probability; ties go to the lower index.
fn argmax(probs: &[f64]) -> usize {
    probs
        .iter()
        .enumerate()
        .fold((0, f64::NEG_INFINITY), |best, (i, &p)| if p > best.1 { (i, p) } else { best })
        .0
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearRegression {
    pub coefficients: Vec<f64>,
    pub intercept: f64,
    #[serde(default)]
    pub feature_names: Option<Vec<String>>,
}

impl LinearRegression {
    fn validate(&self) -> Result<(), ArtifactError> {
        if self.coefficients.is_empty() {
            return Err(ArtifactError::Invalid("linear regression has no coefficients".into()));
        }
        check_feature_names(&self.feature_names, self.coefficients.len())
    }
}

impl Estimator for LinearRegression {
    fn kind(&self) -> &'static str {
        "linear_regression"
    }

    fn n_features(&self) -> usize {
        self.coefficients.len()
    }

    fn feature_names(&self) -> Option<&[String]> {
        self.feature_names.as_deref()
    }

    fn predict(&self, x: &[f64]) -> Result<RawOutput, ArtifactError> {
        check_width(self.n_features(), x)?;
        let weights = DVector::from_column_slice(&self.coefficients);
        let features = DVector::from_column_slice(x);
        Ok(RawOutput::Scalar(weights.dot(&features) + self.intercept))
    }

    fn predict_proba(&self, _x: &[f64]) -> Result<Vec<f64>, ArtifactError> {
        Err(ArtifactError::ProbaUnsupported(self.kind()))
    }
}

/// Binary (one coefficient row, sigmoid) or multinomial (softmax) logistic
/// regression.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticRegression {
    pub classes: Vec<String>,
    pub coefficients: Vec<Vec<f64>>,
    pub intercept: Vec<f64>,
    #[serde(default)]
    pub feature_names: Option<Vec<String>>,
}

impl LogisticRegression {
    fn is_binary(&self) -> bool {
        self.classes.len() == 2 && self.coefficients.len() == 1
    }

    fn validate(&self) -> Result<(), ArtifactError> {
        if self.classes.len() < 2 {
            return Err(ArtifactError::Invalid("logistic regression needs at least two classes".into()));
        }
        let rows = if self.is_binary() { 1 } else { self.classes.len() };
        if self.coefficients.len() != rows || self.intercept.len() != rows {
            return Err(ArtifactError::Invalid(format!(
                "expected {} coefficient rows and intercepts for {} classes, got {} and {}",
                rows,
                self.classes.len(),
                self.coefficients.len(),
                self.intercept.len()
            )));
        }
        let width = self.n_features();
        if width == 0 || self.coefficients.iter().any(|row| row.len() != width) {
            return Err(ArtifactError::Invalid("ragged or empty coefficient rows".into()));
        }
        check_feature_names(&self.feature_names, width)
    }

    fn logits(&self, x: &[f64]) -> DVector<f64> {
        let weights = DMatrix::from_row_iterator(
            self.coefficients.len(),
            self.n_features(),
            self.coefficients.iter().flatten().copied(),
        );
        weights * DVector::from_column_slice(x) + DVector::from_column_slice(&self.intercept)
    }
}

impl Estimator for LogisticRegression {
    fn kind(&self) -> &'static str {
        "logistic_regression"
    }

    fn n_features(&self) -> usize {
        self.coefficients.first().map_or(0, Vec::len)
    }

    fn feature_names(&self) -> Option<&[String]> {
        self.feature_names.as_deref()
    }

    fn classes(&self) -> Option<&[String]> {
        Some(&self.classes)
    }

    fn predict(&self, x: &[f64]) -> Result<RawOutput, ArtifactError> {
        let probs = self.predict_proba(x)?;
        Ok(RawOutput::Label(self.classes[argmax(&probs)].clone()))
    }

    fn predict_proba(&self, x: &[f64]) -> Result<Vec<f64>, ArtifactError> {
        check_width(self.n_features(), x)?;
        let logits = self.logits(x);
        if self.is_binary() {
            let positive = logistic(logits[0]);
            return Ok(vec![1.0 - positive, positive]);
        }
        // shift by the max logit so exp() cannot overflow
        let max = logits.max();
        let exps = logits.map(|z| (z - max).exp());
        let total = exps.sum();
        Ok(exps.iter().map(|e| e / total).collect())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeNode {
    pub feature: i64,
    pub threshold: f64,
    pub left: i64,
    pub right: i64,
    pub value: Vec<f64>,
}

impl TreeNode {
    fn is_leaf(&self) -> bool {
        self.left < 0
    }
}

/// A fitted classification tree in flattened form; node 0 is the root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    pub classes: Vec<String>,
    pub n_features: usize,
    pub nodes: Vec<TreeNode>,
    #[serde(default)]
    pub feature_names: Option<Vec<String>>,
}

impl DecisionTree {
    fn validate(&self) -> Result<(), ArtifactError> {
        if self.classes.len() < 2 || self.nodes.is_empty() {
            return Err(ArtifactError::Invalid("decision tree needs classes and nodes".into()));
        }
        let n_nodes = self.nodes.len() as i64;
        for (i, node) in self.nodes.iter().enumerate() {
            if node.is_leaf() {
                if node.value.len() != self.classes.len() || node.value.iter().sum::<f64>() <= 0.0 {
                    return Err(ArtifactError::Invalid(format!("leaf {} has unusable class weights", i)));
                }
                continue;
            }
            let in_range = |child: i64| child > i as i64 && child < n_nodes;
            if !in_range(node.left) || !in_range(node.right) {
                return Err(ArtifactError::Invalid(format!("node {} has out-of-range children", i)));
            }
            if node.feature < 0 || node.feature as usize >= self.n_features {
                return Err(ArtifactError::Invalid(format!("node {} splits on unknown feature {}", i, node.feature)));
            }
        }
        check_feature_names(&self.feature_names, self.n_features)
    }

    fn leaf(&self, x: &[f64]) -> &TreeNode {
        let mut node = &self.nodes[0];
        while !node.is_leaf() {
            let next = if x[node.feature as usize] <= node.threshold {
                node.left
            } else {
                node.right
            };
            node = &self.nodes[next as usize];
        }
        node
    }
}

impl Estimator for DecisionTree {
    fn kind(&self) -> &'static str {
        "decision_tree"
    }

    fn n_features(&self) -> usize {
        self.n_features
    }

    fn feature_names(&self) -> Option<&[String]> {
        self.feature_names.as_deref()
    }

    fn classes(&self) -> Option<&[String]> {
        Some(&self.classes)
    }

    fn predict(&self, x: &[f64]) -> Result<RawOutput, ArtifactError> {
        let probs = self.predict_proba(x)?;
        Ok(RawOutput::Label(self.classes[argmax(&probs)].clone()))
    }

    fn predict_proba(&self, x: &[f64]) -> Result<Vec<f64>, ArtifactError> {
        check_width(self.n_features, x)?;
        let weights = &self.leaf(x).value;
        let total: f64 = weights.iter().sum();
        Ok(weights.iter().map(|w| w / total).collect())
    }
}

/// Versioned list of the columns a model was trained on, shipped next to the
/// artifact as `<stem>.schema.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpectedSchema {
    pub version: String,
    pub columns: Vec<String>,
}

impl ExpectedSchema {
    pub fn sidecar_path(artifact_path: &Path) -> PathBuf {
        artifact_path.with_extension("schema.json")
    }

    /// Reads the sidecar for `artifact_path`; `Ok(None)` when none is shipped.
    pub fn load_sidecar(artifact_path: &Path) -> Result<Option<Self>, ArtifactError> {
        let path = Self::sidecar_path(artifact_path);
        if !path.exists() {
            return Ok(None);
        }
        let json = std::fs::read_to_string(&path).map_err(|source| ArtifactError::Io {
            path: path.clone(),
            source,
        })?;
        let schema: ExpectedSchema =
            serde_json::from_str(&json).map_err(|source| ArtifactError::Parse { path, source })?;
        Ok(Some(schema))
    }
}

#[cfg(test)]
mod tests {
    use assert_float_eq::*;

    use super::*;

    fn linear() -> Box<dyn Estimator> {
        ModelArtifact::from_json(
            r#"{"kind": "linear_regression", "coefficients": [0.5, -1.0, 2.0], "intercept": 1.5}"#,
        )
        .unwrap()
    }

    fn binary_logistic() -> LogisticRegression {
        LogisticRegression {
            classes: vec!["0".into(), "1".into()],
            coefficients: vec![vec![1.0, -1.0]],
            intercept: vec![0.0],
            feature_names: Some(vec!["won".into(), "lost".into()]),
        }
    }

    fn tree() -> DecisionTree {
        DecisionTree {
            classes: vec!["0".into(), "1".into()],
            n_features: 2,
            nodes: vec![
                TreeNode { feature: 1, threshold: 80.0, left: 1, right: 2, value: vec![10.0, 5.0] },
                TreeNode { feature: -2, threshold: -2.0, left: -1, right: -1, value: vec![9.0, 1.0] },
                TreeNode { feature: -2, threshold: -2.0, left: -1, right: -1, value: vec![1.0, 3.0] },
            ],
            feature_names: None,
        }
    }

    #[test]
    fn test_linear_regression_predict() {
        let model = linear();
        assert_eq!(model.kind(), "linear_regression");
        assert_eq!(model.n_features(), 3);
        match model.predict(&[2.0, 1.0, 0.5]).unwrap() {
            RawOutput::Scalar(value) => assert_float_absolute_eq!(value, 2.5, 1e-12),
            other => panic!("unexpected output {:?}", other),
        }
        assert!(matches!(model.predict_proba(&[0.0; 3]), Err(ArtifactError::ProbaUnsupported(_))));
    }

    #[test]
    fn test_dimension_mismatch_is_rejected() {
        let err = linear().predict(&[1.0, 2.0]).unwrap_err();
        assert!(matches!(err, ArtifactError::DimensionMismatch { expected: 3, actual: 2 }));
    }

    #[test]
    fn test_binary_logistic_proba() {
        let model = binary_logistic();
        let probs = model.predict_proba(&[2.0, 2.0]).unwrap();
        assert_float_absolute_eq!(probs[1], 0.5, 1e-12);

        let probs = model.predict_proba(&[3.0, 1.0]).unwrap();
        assert_float_absolute_eq!(probs[1], 1.0 / (1.0 + (-2.0f64).exp()), 1e-12);
        assert_float_absolute_eq!(probs[0] + probs[1], 1.0, 1e-12);
        assert_eq!(model.predict(&[3.0, 1.0]).unwrap(), RawOutput::Label("1".into()));
    }

    #[test]
    fn test_multinomial_logistic_label() {
        let model = LogisticRegression {
            classes: vec!["A".into(), "D".into(), "H".into()],
            coefficients: vec![vec![-1.0, 1.0], vec![0.0, 0.0], vec![1.0, -1.0]],
            intercept: vec![0.0, 0.5, 0.0],
            feature_names: None,
        };
        model.validate().unwrap();
        assert_eq!(model.predict(&[3.0, 0.0]).unwrap(), RawOutput::Label("H".into()));
        assert_eq!(model.predict(&[0.0, 3.0]).unwrap(), RawOutput::Label("A".into()));
        assert_eq!(model.predict(&[0.0, 0.0]).unwrap(), RawOutput::Label("D".into()));

        let probs = model.predict_proba(&[1.0, 2.0]).unwrap();
        assert_float_absolute_eq!(probs.iter().sum::<f64>(), 1.0, 1e-12);
    }

    #[test]
    fn test_logistic_validation() {
        let mut model = binary_logistic();
        model.coefficients = vec![vec![1.0], vec![1.0, 2.0]];
        assert!(model.validate().is_err());

        let mut model = binary_logistic();
        model.feature_names = Some(vec!["won".into()]);
        assert!(model.validate().is_err());
    }

    #[test]
    fn test_decision_tree_proba() {
        let model = tree();
        model.validate().unwrap();
        let probs = model.predict_proba(&[0.0, 50.0]).unwrap();
        assert_float_absolute_eq!(probs[1], 0.1, 1e-12);
        let probs = model.predict_proba(&[0.0, 89.0]).unwrap();
        assert_float_absolute_eq!(probs[1], 0.75, 1e-12);
        assert_eq!(model.predict(&[0.0, 89.0]).unwrap(), RawOutput::Label("1".into()));
    }

    #[test]
    fn test_decision_tree_rejects_cycles() {
        let mut model = tree();
        model.nodes[0].right = 0;
        assert!(model.validate().is_err());
    }

    #[test]
    fn test_tagged_json_roundtrip_kind() {
        let json = serde_json::to_string(&ModelArtifact::DecisionTree(tree())).unwrap();
        assert!(json.contains(r#""kind":"decision_tree""#));
        assert_eq!(ModelArtifact::from_json(&json).unwrap().n_features(), 2);
    }

    #[test]
    fn test_from_json_validates_the_tree() {
        let mut broken = tree();
        broken.nodes[0].right = 7;
        let json = serde_json::to_string(&ModelArtifact::DecisionTree(broken)).unwrap();
        assert!(matches!(ModelArtifact::from_json(&json), Err(ArtifactError::Invalid(_))));
        assert!(matches!(ModelArtifact::from_json("{\"kind\": 3}"), Err(ArtifactError::Json(_))));
    }

    #[test]
    fn test_classes_only_for_classifiers() {
        assert_eq!(linear().classes(), None);
        assert_eq!(tree().classes().map(<[String]>::len), Some(2));
    }

    #[test]
    fn test_sidecar_path() {
        let path = ExpectedSchema::sidecar_path(Path::new("League Winner/league_model.json"));
        assert_eq!(path, PathBuf::from("League Winner/league_model.schema.json"));
    }

    #[test]
    fn test_missing_artifact_is_io_error() {
        let err = ModelArtifact::load(Path::new("does/not/exist.json")).err().unwrap();
        assert!(matches!(err, ArtifactError::Io { .. }));
        assert!(ExpectedSchema::load_sidecar(Path::new("does/not/exist.json")).unwrap().is_none());
    }
}
