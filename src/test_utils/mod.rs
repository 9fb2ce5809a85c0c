//! Shared test utilities: a tiny builder for deterministic random streams
//! so scenarios stay readable at the call site.

use crate::randgen::RandGen;

/// Random stream over fixed values.
pub fn rgen(values: &[u32]) -> RandGen {
    RandGen::from_values(values.to_vec())
}
