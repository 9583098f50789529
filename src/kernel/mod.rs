//! Byte-level coding kernel: `out = k * in` and `out ^= k * in` over GF(2^8)
//!
//! Both operations work on equal-length byte windows that the coder has
//! already offset into the shard buffers. The scalar implementation is the
//! normative reference; the SIMD paths (PSHUFB on x86_64, NEON table lookups
//! on aarch64) must produce byte-identical output and are selected once per
//! process by runtime feature detection.
//!
//! The SIMD strategy is the split-nybble lookup from James Plank's
//! "Screaming Fast Galois Field Arithmetic Using Intel SIMD Instructions"
//! (FAST 2013): `k * x == mul_low[k][x & 0x0F] ^ mul_high[k][x >> 4]`, which
//! a 16-entry byte shuffle evaluates for 16 lanes at once.

pub mod scalar;

#[cfg(target_arch = "aarch64")]
mod neon;
#[cfg(target_arch = "x86_64")]
mod pshufb;

use std::sync::OnceLock;

/// Vectorisation level selected for this process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimdLevel {
    None,
    Ssse3,
    Avx2,
    Neon,
}

/// Runtime detection of CPU SIMD features.
pub fn detect_simd_support() -> SimdLevel {
    #[cfg(target_arch = "x86_64")]
    {
        if is_x86_feature_detected!("avx2") {
            return SimdLevel::Avx2;
        }
        if is_x86_feature_detected!("ssse3") {
            return SimdLevel::Ssse3;
        }
    }
    #[cfg(target_arch = "aarch64")]
    {
        if std::arch::is_aarch64_feature_detected!("neon") {
            return SimdLevel::Neon;
        }
    }
    SimdLevel::None
}

fn simd_level() -> SimdLevel {
    static LEVEL: OnceLock<SimdLevel> = OnceLock::new();
    *LEVEL.get_or_init(detect_simd_support)
}

/// `output[i] = k * input[i]` for every byte of the window.
///
/// Total function: no failure modes for any coefficient or window length.
/// `input` and `output` must be the same length.
pub fn multiply(k: u8, input: &[u8], output: &mut [u8]) {
    debug_assert_eq!(input.len(), output.len());
    match simd_level() {
        #[cfg(target_arch = "x86_64")]
        // SAFETY: the matching CPU feature was detected at startup.
        SimdLevel::Avx2 => unsafe { pshufb::multiply_avx2(k, input, output) },
        #[cfg(target_arch = "x86_64")]
        // SAFETY: SSSE3 was detected at startup.
        SimdLevel::Ssse3 => unsafe { pshufb::multiply_ssse3(k, input, output) },
        #[cfg(target_arch = "aarch64")]
        // SAFETY: NEON was detected at startup.
        SimdLevel::Neon => unsafe { neon::multiply_neon(k, input, output) },
        _ => scalar::multiply(k, input, output),
    }
}

/// `output[i] ^= k * input[i]` for every byte of the window.
///
/// Total function: no failure modes for any coefficient or window length.
/// `input` and `output` must be the same length.
pub fn multiply_xor(k: u8, input: &[u8], output: &mut [u8]) {
    debug_assert_eq!(input.len(), output.len());
    match simd_level() {
        #[cfg(target_arch = "x86_64")]
        // SAFETY: the matching CPU feature was detected at startup.
        SimdLevel::Avx2 => unsafe { pshufb::multiply_xor_avx2(k, input, output) },
        #[cfg(target_arch = "x86_64")]
        // SAFETY: SSSE3 was detected at startup.
        SimdLevel::Ssse3 => unsafe { pshufb::multiply_xor_ssse3(k, input, output) },
        #[cfg(target_arch = "aarch64")]
        // SAFETY: NEON was detected at startup.
        SimdLevel::Neon => unsafe { neon::multiply_xor_neon(k, input, output) },
        _ => scalar::multiply_xor(k, input, output),
    }
}
