use serde::{Deserialize, Serialize};

/// Point-in-time view of the gate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateStats {
    pub capacity: usize,
    pub available: usize,
    pub in_use: usize,
    pub closed: bool,
}
