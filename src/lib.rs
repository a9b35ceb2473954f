//! Union-Find decoding for quantum error-correcting codes: cluster growth
//! over the Tanner graph followed by linear-time peeling reconstruction.

pub mod cluster;
pub mod code;
pub mod codes;
pub mod decoder;
pub mod error;
pub mod gf2;
pub mod peeling;
pub mod sampling;
pub mod stats;
pub mod tanner_graph;
pub mod union_find;

pub use cluster::GrowthPolicy;
pub use code::Code;
pub use decoder::{DecoderOptions, DecodingResult, UfDecoder};
pub use error::{DecodingError, Result};
pub use stats::DecodingRunInformation;
