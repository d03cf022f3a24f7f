pub use crate::bucket::{AdmissionDecision, BucketConfig, BucketStore, MemoryBucketStore};
pub use crate::controller::{Admission, AdmissionController};
pub use crate::errors::AdmissionError;
