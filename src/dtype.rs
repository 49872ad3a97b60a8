// file: src/dtype.rs
// description: MXFP4 scalar types: packed 4-bit E2M1 codes and E8M0 block scales.
// author: cipher-rc5
// created: 2026-02-21
// modified: 2026-02-21
use bytemuck::{Pod, Zeroable};
use std::fmt;

/// Canonical decoded value for each of the 16 E2M1 codes. Codes 8..=15 are
/// the sign-flipped mirror of 0..=7 (bit 3 is the sign bit).
pub const FP4_VALUES: [f32; 16] = [
    0.0, 0.5, 1.0, 1.5, 2.0, 3.0, 4.0, 6.0, //
    -0.0, -0.5, -1.0, -1.5, -2.0, -3.0, -4.0, -6.0,
];

/// One 4-bit E2M1 code, stored in the low nibble.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
pub struct MxFp4(u8);

impl MxFp4 {
    pub fn new(code: u8) -> Self {
        Self(code & 0x0F)
    }

    pub fn code(self) -> u8 {
        self.0
    }

    pub fn to_f32(self) -> f32 {
        FP4_VALUES[(self.0 & 0x0F) as usize]
    }

    pub fn pack_pair(low: MxFp4, high: MxFp4) -> u8 {
        (low.0 & 0x0F) | ((high.0 & 0x0F) << 4)
    }

    /// Splits a packed byte into (low nibble, high nibble). The low nibble
    /// decodes to the even output position, the high nibble to the odd
    /// position immediately after it.
    pub fn unpack_pair(packed: u8) -> (MxFp4, MxFp4) {
        (MxFp4(packed & 0x0F), MxFp4((packed >> 4) & 0x0F))
    }
}

/// Shared per-block scale: an 8-bit exponent biased by 127, IEEE754
/// single-precision style. Raw byte 127 means exponent 0.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
pub struct ScaleE8M0(u8);

impl ScaleE8M0 {
    pub const BIAS: i32 = 127;

    pub fn new(raw: u8) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u8 {
        self.0
    }

    pub fn exponent(self) -> i32 {
        self.0 as i32 - Self::BIAS
    }
}

impl fmt::Display for MxFp4 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_f32())
    }
}

impl fmt::Display for ScaleE8M0 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "2^{}", self.exponent())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_table_decode() {
        assert_eq!(MxFp4::new(0).to_f32(), 0.0);
        assert_eq!(MxFp4::new(1).to_f32(), 0.5);
        assert_eq!(MxFp4::new(7).to_f32(), 6.0);
        assert_eq!(MxFp4::new(8).to_f32().to_bits(), (-0.0f32).to_bits());
        assert_eq!(MxFp4::new(15).to_f32(), -6.0);
    }

    #[test]
    fn sign_bit_mirrors_magnitudes() {
        for code in 0u8..8 {
            let pos = MxFp4::new(code).to_f32();
            let neg = MxFp4::new(code | 0x08).to_f32();
            assert_eq!(neg.to_bits(), (-pos).to_bits(), "code {code}");
        }
    }

    #[test]
    fn pack_unpack_roundtrip() {
        for low in 0u8..16 {
            for high in 0u8..16 {
                let byte = MxFp4::pack_pair(MxFp4::new(low), MxFp4::new(high));
                let (a, b) = MxFp4::unpack_pair(byte);
                assert_eq!(a.code(), low);
                assert_eq!(b.code(), high);
            }
        }
    }

    #[test]
    fn scale_bias() {
        assert_eq!(ScaleE8M0::new(127).exponent(), 0);
        assert_eq!(ScaleE8M0::new(128).exponent(), 1);
        assert_eq!(ScaleE8M0::new(0).exponent(), -127);
        assert_eq!(ScaleE8M0::new(255).exponent(), 128);
    }
}
