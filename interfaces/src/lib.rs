pub mod baseline;
pub mod contracts;
pub mod defs;
