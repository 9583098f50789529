//! Galois Field GF(2^8) arithmetic for Reed-Solomon erasure coding
//!
//! ## Generating Polynomial
//!
//! This module implements 8-bit Galois Field arithmetic using the generating
//! polynomial **0x11D** (x⁸ + x⁴ + x³ + x² + 1), the same field used by the
//! Backblaze family of Reed-Solomon erasure coders. Changing the polynomial
//! would change every parity byte ever written, so it is fixed.
//!
//! ## Tables
//!
//! All multiplication is table-driven. Besides the classic log/exp pair, the
//! table set includes the full 256x256 product table and the split-nybble
//! tables (`mul_low`/`mul_high`) that the SIMD kernels feed into 16-lane
//! byte-shuffle lookups:
//!
//! ```text
//! mul[a][b] == mul_low[a][b & 0x0F] ^ mul_high[a][b >> 4]
//! ```
//!
//! The exp table is stored twice back to back so `exp[log[a] + log[b]]` never
//! needs a modular reduction.

use std::ops::{Add, AddAssign, Mul, MulAssign, Sub, SubAssign};
use std::sync::OnceLock;
use thiserror::Error;

/// GF(2^8) generating polynomial x⁸ + x⁴ + x³ + x² + 1 (low byte 0x1D)
const GENERATOR: u16 = 0x11D;
const FIELD_SIZE: usize = 256;
/// Order of the multiplicative group
const ORDER: usize = FIELD_SIZE - 1;

/// Attempted division by the zero element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("division by zero in GF(2^8)")]
pub struct DivisionByZero;

/// Galois Field lookup tables, built once per process.
pub struct GfTables {
    /// `log[0]` is an unused sentinel; for x != 0, `log[x]` is in `[0, 254]`.
    pub log: [u8; 256],
    /// Duplicated so `exp[a + b]` is valid for any two logs without reduction.
    pub exp: [u8; 510],
    mul: Box<[[u8; 256]]>,
    mul_low: Box<[[u8; 16]]>,
    mul_high: Box<[[u8; 16]]>,
}

impl GfTables {
    fn new() -> Self {
        let mut log = [0u8; 256];
        let mut b: u16 = 1;
        for l in 0..ORDER {
            log[b as usize] = l as u8;
            b <<= 1;
            if b & FIELD_SIZE as u16 != 0 {
                b ^= GENERATOR;
            }
        }

        let mut exp = [0u8; 510];
        for x in 1..FIELD_SIZE {
            let l = log[x] as usize;
            exp[l] = x as u8;
            exp[l + ORDER] = x as u8;
        }

        let product = |a: usize, b: usize| -> u8 {
            if a == 0 || b == 0 {
                0
            } else {
                exp[log[a] as usize + log[b] as usize]
            }
        };

        let mut mul = vec![[0u8; 256]; FIELD_SIZE].into_boxed_slice();
        for a in 0..FIELD_SIZE {
            for b in 0..FIELD_SIZE {
                mul[a][b] = product(a, b);
            }
        }

        let mut mul_low = vec![[0u8; 16]; FIELD_SIZE].into_boxed_slice();
        let mut mul_high = vec![[0u8; 16]; FIELD_SIZE].into_boxed_slice();
        for a in 0..FIELD_SIZE {
            for n in 0..16 {
                mul_low[a][n] = mul[a][n];
                mul_high[a][n] = mul[a][n << 4];
            }
        }

        GfTables {
            log,
            exp,
            mul,
            mul_low,
            mul_high,
        }
    }

    /// Products of `k` with every field element.
    #[inline]
    pub fn mul_row(&self, k: u8) -> &[u8; 256] {
        &self.mul[k as usize]
    }

    /// Products of `k` with the sixteen low-nybble values.
    #[inline]
    pub fn mul_low_row(&self, k: u8) -> &[u8; 16] {
        &self.mul_low[k as usize]
    }

    /// Products of `k` with the sixteen high-nybble values (`n << 4`).
    #[inline]
    pub fn mul_high_row(&self, k: u8) -> &[u8; 16] {
        &self.mul_high[k as usize]
    }
}

/// Process-wide tables, shared immutably by all threads.
pub fn tables() -> &'static GfTables {
    static TABLES: OnceLock<GfTables> = OnceLock::new();
    TABLES.get_or_init(GfTables::new)
}

/// Element of GF(2^8).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, bytemuck::Pod, bytemuck::Zeroable,
)]
#[repr(transparent)]
pub struct Gf8(u8);

impl Gf8 {
    pub const ZERO: Self = Self(0);
    pub const ONE: Self = Self(1);

    #[inline]
    pub const fn new(value: u8) -> Self {
        Self(value)
    }

    #[inline]
    pub const fn value(self) -> u8 {
        self.0
    }

    #[inline]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Division that reports a zero divisor as an error value.
    #[inline]
    pub fn div(self, rhs: Self) -> Result<Self, DivisionByZero> {
        self.checked_div(rhs).ok_or(DivisionByZero)
    }

    /// Division that returns `None` for a zero divisor.
    /// Use this in matrix elimination where singular pivots must be detected.
    #[inline]
    pub fn checked_div(self, rhs: Self) -> Option<Self> {
        if rhs.0 == 0 {
            return None;
        }
        if self.0 == 0 {
            return Some(Self::ZERO);
        }
        let t = tables();
        let diff =
            (t.log[self.0 as usize] as i32 - t.log[rhs.0 as usize] as i32 + ORDER as i32)
                % ORDER as i32;
        Some(Self(t.exp[diff as usize]))
    }

    /// Power operation: `self` raised to `n`.
    pub fn pow(self, n: usize) -> Self {
        if n == 0 {
            return Self::ONE;
        }
        if self.0 == 0 {
            return Self::ZERO;
        }
        let t = tables();
        let log = (t.log[self.0 as usize] as usize * n) % ORDER;
        Self(t.exp[log])
    }
}

// Addition (XOR in Galois fields)
impl Add for Gf8 {
    type Output = Self;

    #[allow(clippy::suspicious_arithmetic_impl)] // XOR is addition in Galois fields
    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 ^ rhs.0)
    }
}

impl AddAssign for Gf8 {
    #[allow(clippy::suspicious_op_assign_impl)] // XOR is addition in Galois fields
    fn add_assign(&mut self, rhs: Self) {
        self.0 ^= rhs.0;
    }
}

// Subtraction (same as addition in GF(2^n))
impl Sub for Gf8 {
    type Output = Self;

    #[allow(clippy::suspicious_arithmetic_impl)] // XOR is subtraction in Galois fields
    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 ^ rhs.0)
    }
}

impl SubAssign for Gf8 {
    #[allow(clippy::suspicious_op_assign_impl)] // XOR is subtraction in Galois fields
    fn sub_assign(&mut self, rhs: Self) {
        self.0 ^= rhs.0;
    }
}

// Multiplication using log tables
impl Mul for Gf8 {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        if self.0 == 0 || rhs.0 == 0 {
            return Self::ZERO;
        }
        let t = tables();
        Self(t.exp[t.log[self.0 as usize] as usize + t.log[rhs.0 as usize] as usize])
    }
}

impl MulAssign for Gf8 {
    fn mul_assign(&mut self, rhs: Self) {
        *self = *self * rhs;
    }
}

impl From<u8> for Gf8 {
    fn from(value: u8) -> Self {
        Self(value)
    }
}

impl From<Gf8> for u8 {
    fn from(val: Gf8) -> Self {
        val.0
    }
}

impl std::fmt::Display for Gf8 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
