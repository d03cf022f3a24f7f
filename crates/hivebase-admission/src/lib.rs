pub mod bucket;
pub mod controller;
pub mod errors;
pub mod prelude;
