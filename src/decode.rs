// file: src/decode.rs
// description: Chunked MXFP4 block dequantization with exact power-of-two scaling.
// author: cipher-rc5
// created: 2026-02-21
// modified: 2026-02-21

use thiserror::Error;
use tracing::debug;

use crate::dtype::{ScaleE8M0, FP4_VALUES};

/// Upper bound on rows decoded per chunk iteration. Purely a peak-memory
/// knob; output is bit-identical for any positive value.
pub const DEFAULT_ROWS_PER_CHUNK: usize = 16384 * 512;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("blocks shape {blocks:?} does not match scales shape {scales:?}")]
    ShapeMismatch {
        blocks: Vec<usize>,
        scales: Vec<usize>,
    },
    #[error("buffer holds {actual} bytes but shape {shape:?} requires {expected}")]
    LengthMismatch {
        expected: usize,
        actual: usize,
        shape: Vec<usize>,
    },
}

/// Read-only byte tensor: a borrowed flat buffer plus its logical shape.
/// Construction checks that the buffer length matches the shape, so decode
/// itself only has the block/scale shape agreement left to verify.
#[derive(Debug, Clone)]
pub struct TensorView<'a> {
    data: &'a [u8],
    shape: Vec<usize>,
}

impl<'a> TensorView<'a> {
    pub fn new(data: &'a [u8], shape: &[usize]) -> Result<Self, DecodeError> {
        let expected = shape.iter().product::<usize>();
        if data.len() != expected {
            return Err(DecodeError::LengthMismatch {
                expected,
                actual: data.len(),
                shape: shape.to_vec(),
            });
        }
        Ok(Self {
            data,
            shape: shape.to_vec(),
        })
    }

    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }
}

/// Multiplies `x` by 2^n exactly, scalbnf style: every factor is built
/// directly from its exponent field, so the result matches ldexpf
/// bit-for-bit, including underflow to signed zero/subnormals and overflow
/// to infinity. Never goes through powf or similar.
pub fn scale_by_pow2(x: f32, n: i32) -> f32 {
    let mut y = x;
    let mut n = n;
    if n > 127 {
        y *= f32::from_bits(0x7f00_0000); // 2^127
        n -= 127;
        if n > 127 {
            y *= f32::from_bits(0x7f00_0000);
            n -= 127;
            if n > 127 {
                n = 127;
            }
        }
    } else if n < -126 {
        // Step by 2^-102 so intermediates stay normal; a subnormal
        // intermediate would double-round.
        y *= f32::from_bits(0x0c80_0000); // 2^-102
        n += 102;
        if n < -126 {
            y *= f32::from_bits(0x0c80_0000);
            n += 102;
            if n < -126 {
                n = -126;
            }
        }
    }
    y * f32::from_bits(((127 + n) as u32) << 23)
}

/// Decodes MXFP4 blocks to dense f32 with the default chunk size.
///
/// `blocks` has logical shape `(*prefix, G, B)` where each byte packs two
/// 4-bit codes; `scales` has shape `(*prefix, G)` of biased exponent bytes.
/// The output holds `2 * blocks.len()` values in logical shape
/// `(*prefix, G * 2 * B)`.
pub fn dequantize_mxfp4_blocks(
    blocks: &TensorView<'_>,
    scales: &TensorView<'_>,
) -> Result<Vec<f32>, DecodeError> {
    dequantize_mxfp4_blocks_chunked(blocks, scales, DEFAULT_ROWS_PER_CHUNK)
}

/// Same as [`dequantize_mxfp4_blocks`] with an explicit `rows_per_chunk`.
/// Rows decode independently, so chunk boundaries never change output bits.
pub fn dequantize_mxfp4_blocks_chunked(
    blocks: &TensorView<'_>,
    scales: &TensorView<'_>,
    rows_per_chunk: usize,
) -> Result<Vec<f32>, DecodeError> {
    assert!(rows_per_chunk > 0, "rows_per_chunk must be positive");

    let block_shape = blocks.shape();
    if block_shape.is_empty() || block_shape[..block_shape.len() - 1] != *scales.shape() {
        return Err(DecodeError::ShapeMismatch {
            blocks: block_shape.to_vec(),
            scales: scales.shape().to_vec(),
        });
    }

    // Flatten (*prefix, G, B) to (rows_total, B); one row per scale group.
    let bytes_per_row = block_shape[block_shape.len() - 1];
    let rows_total = scales.data().len();
    let block_data = blocks.data();
    let scale_data = scales.data();

    let mut out = vec![0.0f32; rows_total * bytes_per_row * 2];
    debug!(
        rows_total,
        bytes_per_row, rows_per_chunk, "dequantizing mxfp4 blocks"
    );

    let mut r0 = 0;
    while r0 < rows_total {
        let r1 = (r0 + rows_per_chunk).min(rows_total);
        for row in r0..r1 {
            let exp = ScaleE8M0::new(scale_data[row]).exponent();
            let src = &block_data[row * bytes_per_row..(row + 1) * bytes_per_row];
            let dst = &mut out[row * bytes_per_row * 2..(row + 1) * bytes_per_row * 2];
            for (byte, pair) in src.iter().zip(dst.chunks_exact_mut(2)) {
                pair[0] = scale_by_pow2(FP4_VALUES[(byte & 0x0F) as usize], exp);
                pair[1] = scale_by_pow2(FP4_VALUES[(byte >> 4) as usize], exp);
            }
        }
        r0 = r1;
    }

    Ok(out)
}
