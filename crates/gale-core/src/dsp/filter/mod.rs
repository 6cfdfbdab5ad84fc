pub mod bank;
pub mod filter_trait;
pub mod svf;
