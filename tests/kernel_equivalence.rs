//! Kernel equivalence tests
//!
//! The scalar kernel is the normative reference: whatever vectorised path
//! the running CPU selects must produce byte-identical output for every
//! coefficient, every window length (multiples of the vector width or not)
//! and every input/output alignment combination.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use reed_solomon_8::kernel::{self, scalar};

const LENGTHS: &[usize] = &[0, 1, 5, 15, 16, 17, 31, 32, 33, 77, 256, 4096, 4097];
const MISALIGNMENTS: &[usize] = &[0, 1, 3, 7, 15];

#[test]
fn multiply_matches_scalar_for_every_coefficient() {
    let mut rng = StdRng::seed_from_u64(0xC0DE);
    let mut backing = vec![0u8; LENGTHS.iter().max().unwrap() + 16];
    rng.fill(&mut backing[..]);

    for k in 0..=255u8 {
        for &len in LENGTHS {
            for &misalign in MISALIGNMENTS {
                let input = &backing[misalign..misalign + len];

                let mut expected = vec![0u8; len];
                scalar::multiply(k, input, &mut expected);

                let mut output = vec![0u8; len];
                kernel::multiply(k, input, &mut output);
                assert_eq!(
                    output, expected,
                    "multiply k={} len={} misalign={}",
                    k, len, misalign
                );
            }
        }
    }
}

#[test]
fn multiply_xor_matches_scalar_for_every_coefficient() {
    let mut rng = StdRng::seed_from_u64(0xACC0);
    let mut backing = vec![0u8; LENGTHS.iter().max().unwrap() + 16];
    rng.fill(&mut backing[..]);
    let mut seed_output = vec![0u8; *LENGTHS.iter().max().unwrap()];
    rng.fill(&mut seed_output[..]);

    for k in 0..=255u8 {
        for &len in LENGTHS {
            for &misalign in MISALIGNMENTS {
                let input = &backing[misalign..misalign + len];

                let mut expected = seed_output[..len].to_vec();
                scalar::multiply_xor(k, input, &mut expected);

                let mut output = seed_output[..len].to_vec();
                kernel::multiply_xor(k, input, &mut output);
                assert_eq!(
                    output, expected,
                    "multiply_xor k={} len={} misalign={}",
                    k, len, misalign
                );
            }
        }
    }
}

#[test]
fn misaligned_output_windows_match_scalar() {
    // Drive the head/tail split directly: the output window starts at every
    // possible offset within a 16-byte granule.
    let mut rng = StdRng::seed_from_u64(7);
    let mut input_backing = vec![0u8; 256];
    rng.fill(&mut input_backing[..]);

    for k in [2u8, 29, 171] {
        for out_misalign in 0..16usize {
            let len = 200;
            let input = &input_backing[..len];

            let mut out_backing = vec![0u8; len + 16];
            rng.fill(&mut out_backing[..]);
            let mut expected_backing = out_backing.clone();

            kernel::multiply(k, input, &mut out_backing[out_misalign..out_misalign + len]);
            scalar::multiply(
                k,
                input,
                &mut expected_backing[out_misalign..out_misalign + len],
            );
            assert_eq!(
                out_backing, expected_backing,
                "k={} out_misalign={}",
                k, out_misalign
            );

            kernel::multiply_xor(k, input, &mut out_backing[out_misalign..out_misalign + len]);
            scalar::multiply_xor(
                k,
                input,
                &mut expected_backing[out_misalign..out_misalign + len],
            );
            assert_eq!(
                out_backing, expected_backing,
                "xor k={} out_misalign={}",
                k, out_misalign
            );
        }
    }
}

#[test]
fn detection_reports_a_level() {
    // Not much to assert portably, but detection must not panic and must be
    // stable across calls.
    let first = kernel::detect_simd_support();
    let second = kernel::detect_simd_support();
    assert_eq!(first, second);
}
