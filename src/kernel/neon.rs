//! NEON split-nybble kernels for aarch64
//!
//! Same technique as the x86 PSHUFB path, using `vqtbl1q_u8` for the
//! 16-entry lookups. NEON has a true per-byte shift, so the high nybble
//! needs no mask, and unaligned 128-bit accesses are free on aarch64, so
//! there is no head/body split.

use crate::galois;
use std::arch::aarch64::*;

/// NEON `output[i] = k * input[i]`, 16 bytes per iteration.
///
/// # Safety
/// - The CPU must support NEON; callers must check before calling.
/// - `input` and `output` must be the same length and must not alias.
#[target_feature(enable = "neon")]
pub unsafe fn multiply_neon(k: u8, input: &[u8], output: &mut [u8]) {
    let len = input.len().min(output.len());
    let tables = galois::tables();
    let body = len & !15;

    let low_table = vld1q_u8(tables.mul_low_row(k).as_ptr());
    let high_table = vld1q_u8(tables.mul_high_row(k).as_ptr());
    let mask = vdupq_n_u8(0x0F);
    let mut i = 0;
    while i < body {
        let x = vld1q_u8(input.as_ptr().add(i));
        let low_parts = vqtbl1q_u8(low_table, vandq_u8(x, mask));
        let high_parts = vqtbl1q_u8(high_table, vshrq_n_u8::<4>(x));
        vst1q_u8(output.as_mut_ptr().add(i), veorq_u8(low_parts, high_parts));
        i += 16;
    }

    super::scalar::multiply(k, &input[body..len], &mut output[body..len]);
}

/// NEON `output[i] ^= k * input[i]`, 16 bytes per iteration.
///
/// # Safety
/// - The CPU must support NEON; callers must check before calling.
/// - `input` and `output` must be the same length and must not alias.
#[target_feature(enable = "neon")]
pub unsafe fn multiply_xor_neon(k: u8, input: &[u8], output: &mut [u8]) {
    let len = input.len().min(output.len());
    let tables = galois::tables();
    let body = len & !15;

    let low_table = vld1q_u8(tables.mul_low_row(k).as_ptr());
    let high_table = vld1q_u8(tables.mul_high_row(k).as_ptr());
    let mask = vdupq_n_u8(0x0F);
    let mut i = 0;
    while i < body {
        let x = vld1q_u8(input.as_ptr().add(i));
        let initial = vld1q_u8(output.as_ptr().add(i));
        let low_parts = vqtbl1q_u8(low_table, vandq_u8(x, mask));
        let high_parts = vqtbl1q_u8(high_table, vshrq_n_u8::<4>(x));
        let product = veorq_u8(low_parts, high_parts);
        vst1q_u8(output.as_mut_ptr().add(i), veorq_u8(initial, product));
        i += 16;
    }

    super::scalar::multiply_xor(k, &input[body..len], &mut output[body..len]);
}
