//! Transaction lifecycle module: gas sizing, signing, submission, confirmation

mod gas;
mod submitter;

pub use gas::GasPolicy;
pub use submitter::{SubmitterConfig, TransactionSubmitter};
