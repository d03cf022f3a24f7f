pub mod id;
pub mod principal;
pub mod tier;
pub mod time;
pub mod prelude;
