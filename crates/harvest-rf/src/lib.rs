//! Bagged decision-tree classification: train, evaluate, predict.
//!
//! Grows binary decision trees by recursive entropy-based splitting on
//! numeric features, bags them into an ensemble trained on bootstrap
//! resamples in parallel via rayon, and predicts by majority vote. Labels
//! are any `Clone + PartialEq` type. Out-of-bag scoring, hold-out
//! evaluation, classification reports, and feature standardization round
//! out the workflow.

mod config;
mod error;
mod eval;
mod forest;
mod node;
mod oob;
mod predict;
mod report;
mod scale;
mod split;
mod tree;
mod vote;

pub use config::{BaggingConfig, OobMode};
pub use error::{ErrorCategory, RfError};
pub use eval::{Holdout, HoldoutEvaluation, TrainTestSplit};
pub use forest::BaggedEnsemble;
pub use node::{FeatureIndex, Node};
pub use oob::OobScore;
pub use report::{AverageMetrics, ClassMetrics, ClassificationReport};
pub use scale::StandardScaler;
pub use split::{entropy, information_gain, label_entropy};
pub use tree::{DecisionTree, DecisionTreeConfig};
pub use vote::VoteTally;
