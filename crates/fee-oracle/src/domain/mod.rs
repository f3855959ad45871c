pub mod estimator;
pub mod eth;
pub mod fee;

pub use self::estimator::{Estimator, Snapshot, UpdatePolicy};
