pub mod decode;
pub mod dtype;
pub mod fixtures;

pub use decode::{
    dequantize_mxfp4_blocks, dequantize_mxfp4_blocks_chunked, scale_by_pow2, DecodeError,
    TensorView, DEFAULT_ROWS_PER_CHUNK,
};
pub use dtype::{MxFp4, ScaleE8M0, FP4_VALUES};
pub use fixtures::ExpectedManifest;
