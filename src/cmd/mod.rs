pub mod identity;
pub mod resolve;
