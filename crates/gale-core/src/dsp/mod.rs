pub mod filter;
pub mod noise;
