//! Training pipeline: cleaning, fitting and evaluation

pub mod evaluation;
pub mod imputation;
pub mod logistic;
pub mod pipeline;
pub mod split;

pub use evaluation::ClassificationReport;
pub use imputation::{ImputationPlan, ImputationStrategy};
pub use logistic::{FitReport, LogisticParams, LogisticRegression};
pub use pipeline::{TrainingOutcome, TrainingPipeline, TrainingSettings};
pub use split::{train_test_split, SplitIndices};
