pub mod disposal;
pub mod worker;

pub use disposal::{Disposer, DisposalSummary};
pub use worker::{ConversionPolicy, ConversionWorker};
