//! Phone intake and classification: column detection, normalization, country
//! inference, and the dedup-aware pipeline that feeds the store.

pub mod columns;
pub mod country;
pub mod normalize;
pub mod pipeline;
