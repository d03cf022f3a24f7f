pub use crate::fingerprint::{fingerprint, Fingerprint};
pub use crate::table::InFlightTable;
