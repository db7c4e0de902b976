pub mod batch;
pub mod ground_truth;
pub mod reports;
