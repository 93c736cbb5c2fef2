pub mod lightning;
pub mod serialize;
