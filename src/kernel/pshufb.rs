//! PSHUFB split-nybble kernels for x86_64 (SSSE3 and AVX2)
//!
//! The SSSE3 path follows the classic layout: a scalar head until the output
//! pointer reaches 16-byte alignment, a `_mm_shuffle_epi8` body with aligned
//! stores, and a scalar tail. Input loads stay unaligned; the input has one
//! load where the output has a load and a store, so alignment goes to the
//! output. The AVX2 path processes 32 bytes per iteration with the nybble
//! tables broadcast into both 128-bit lanes and uses unaligned accesses
//! throughout, which cost nothing on AVX2-era cores.

use crate::galois;
use std::arch::x86_64::*;

/// SSSE3 `output[i] = k * input[i]`.
///
/// # Safety
/// - The CPU must support SSSE3; callers must check before calling.
/// - `input` and `output` must be the same length and must not alias.
#[target_feature(enable = "ssse3")]
pub unsafe fn multiply_ssse3(k: u8, input: &[u8], output: &mut [u8]) {
    let len = input.len().min(output.len());
    let tables = galois::tables();
    let mul = tables.mul_row(k);

    let head = output.as_ptr().align_offset(16).min(len);
    let body = (len - head) & !15;

    for i in 0..head {
        output[i] = mul[input[i] as usize];
    }

    let low_table = _mm_loadu_si128(tables.mul_low_row(k).as_ptr() as *const __m128i);
    let high_table = _mm_loadu_si128(tables.mul_high_row(k).as_ptr() as *const __m128i);
    let mask = _mm_set1_epi8(0x0F);
    let mut i = head;
    while i < head + body {
        let x = _mm_loadu_si128(input.as_ptr().add(i) as *const __m128i);
        let low_indices = _mm_and_si128(x, mask);
        let high_indices = _mm_and_si128(_mm_srli_epi32(x, 4), mask);
        let low_parts = _mm_shuffle_epi8(low_table, low_indices);
        let high_parts = _mm_shuffle_epi8(high_table, high_indices);
        let product = _mm_xor_si128(low_parts, high_parts);
        _mm_store_si128(output.as_mut_ptr().add(i) as *mut __m128i, product);
        i += 16;
    }

    for i in head + body..len {
        output[i] = mul[input[i] as usize];
    }
}

/// SSSE3 `output[i] ^= k * input[i]`.
///
/// # Safety
/// - The CPU must support SSSE3; callers must check before calling.
/// - `input` and `output` must be the same length and must not alias.
#[target_feature(enable = "ssse3")]
pub unsafe fn multiply_xor_ssse3(k: u8, input: &[u8], output: &mut [u8]) {
    let len = input.len().min(output.len());
    let tables = galois::tables();
    let mul = tables.mul_row(k);

    let head = output.as_ptr().align_offset(16).min(len);
    let body = (len - head) & !15;

    for i in 0..head {
        output[i] ^= mul[input[i] as usize];
    }

    let low_table = _mm_loadu_si128(tables.mul_low_row(k).as_ptr() as *const __m128i);
    let high_table = _mm_loadu_si128(tables.mul_high_row(k).as_ptr() as *const __m128i);
    let mask = _mm_set1_epi8(0x0F);
    let mut i = head;
    while i < head + body {
        let x = _mm_loadu_si128(input.as_ptr().add(i) as *const __m128i);
        let initial = _mm_load_si128(output.as_ptr().add(i) as *const __m128i);
        let low_indices = _mm_and_si128(x, mask);
        let high_indices = _mm_and_si128(_mm_srli_epi32(x, 4), mask);
        let low_parts = _mm_shuffle_epi8(low_table, low_indices);
        let high_parts = _mm_shuffle_epi8(high_table, high_indices);
        let product = _mm_xor_si128(low_parts, high_parts);
        _mm_store_si128(
            output.as_mut_ptr().add(i) as *mut __m128i,
            _mm_xor_si128(initial, product),
        );
        i += 16;
    }

    for i in head + body..len {
        output[i] ^= mul[input[i] as usize];
    }
}

/// AVX2 `output[i] = k * input[i]`, 32 bytes per iteration.
///
/// # Safety
/// - The CPU must support AVX2; callers must check before calling.
/// - `input` and `output` must be the same length and must not alias.
#[target_feature(enable = "avx2")]
pub unsafe fn multiply_avx2(k: u8, input: &[u8], output: &mut [u8]) {
    let len = input.len().min(output.len());
    let tables = galois::tables();
    let body = len & !31;

    let low_table = _mm256_broadcastsi128_si256(_mm_loadu_si128(
        tables.mul_low_row(k).as_ptr() as *const __m128i,
    ));
    let high_table = _mm256_broadcastsi128_si256(_mm_loadu_si128(
        tables.mul_high_row(k).as_ptr() as *const __m128i,
    ));
    let mask = _mm256_set1_epi8(0x0F);
    let mut i = 0;
    while i < body {
        let x = _mm256_loadu_si256(input.as_ptr().add(i) as *const __m256i);
        let low_indices = _mm256_and_si256(x, mask);
        let high_indices = _mm256_and_si256(_mm256_srli_epi32(x, 4), mask);
        let low_parts = _mm256_shuffle_epi8(low_table, low_indices);
        let high_parts = _mm256_shuffle_epi8(high_table, high_indices);
        let product = _mm256_xor_si256(low_parts, high_parts);
        _mm256_storeu_si256(output.as_mut_ptr().add(i) as *mut __m256i, product);
        i += 32;
    }

    super::scalar::multiply(k, &input[body..len], &mut output[body..len]);
}

/// AVX2 `output[i] ^= k * input[i]`, 32 bytes per iteration.
///
/// # Safety
/// - The CPU must support AVX2; callers must check before calling.
/// - `input` and `output` must be the same length and must not alias.
#[target_feature(enable = "avx2")]
pub unsafe fn multiply_xor_avx2(k: u8, input: &[u8], output: &mut [u8]) {
    let len = input.len().min(output.len());
    let tables = galois::tables();
    let body = len & !31;

    let low_table = _mm256_broadcastsi128_si256(_mm_loadu_si128(
        tables.mul_low_row(k).as_ptr() as *const __m128i,
    ));
    let high_table = _mm256_broadcastsi128_si256(_mm_loadu_si128(
        tables.mul_high_row(k).as_ptr() as *const __m128i,
    ));
    let mask = _mm256_set1_epi8(0x0F);
    let mut i = 0;
    while i < body {
        let x = _mm256_loadu_si256(input.as_ptr().add(i) as *const __m256i);
        let initial = _mm256_loadu_si256(output.as_ptr().add(i) as *const __m256i);
        let low_indices = _mm256_and_si256(x, mask);
        let high_indices = _mm256_and_si256(_mm256_srli_epi32(x, 4), mask);
        let low_parts = _mm256_shuffle_epi8(low_table, low_indices);
        let high_parts = _mm256_shuffle_epi8(high_table, high_indices);
        let product = _mm256_xor_si256(low_parts, high_parts);
        _mm256_storeu_si256(
            output.as_mut_ptr().add(i) as *mut __m256i,
            _mm256_xor_si256(initial, product),
        );
        i += 32;
    }

    super::scalar::multiply_xor(k, &input[body..len], &mut output[body..len]);
}
