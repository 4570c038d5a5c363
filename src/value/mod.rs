//! @ai:module:intent Score value shapes and their decomposition into named sub-values
//! @ai:module:layer domain
//! @ai:module:public_api Scalar, Value, ValueShape, Score, SampleScore, SampleId, decompose

pub mod decompose;
pub mod score;

pub use decompose::{decompose, Component};
pub use score::{SampleId, SampleScore, Scalar, Score, Value, ValueShape};
