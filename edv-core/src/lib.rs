pub mod consolidated;
pub mod error;
pub mod filter;
pub mod scenario;
pub mod sector;
pub mod selection;
pub mod td_loss;
pub mod units;
