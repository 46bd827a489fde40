pub mod database_ops;
pub mod marketplace;
pub mod matching;
pub mod normalization;
pub mod reconcile;
pub mod tracing;

pub mod util {
    pub mod env;
}
