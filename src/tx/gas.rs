//! Gas sizing for submitted transactions

use rand::Rng;

/// Samples the max gas amount for each transaction
///
/// Randomized within a configured inclusive range so submissions from
/// different wallets do not share an identical gas fingerprint. The range
/// is normalized (ascending, bounds >= 1) at configuration load.
#[derive(Debug, Clone)]
pub struct GasPolicy {
    range: [u64; 2],
    unit_price: u64,
}

impl GasPolicy {
    pub fn new(range: [u64; 2], unit_price: u64) -> Self {
        Self { range, unit_price }
    }

    /// Sample a max gas amount from the inclusive range
    pub fn sample_max_gas(&self) -> u64 {
        rand::thread_rng().gen_range(self.range[0]..=self.range[1])
    }

    /// Fixed gas unit price attached to every transaction
    pub fn unit_price(&self) -> u64 {
        self.unit_price
    }
}
