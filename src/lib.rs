#![deny(clippy::all)]
#![warn(clippy::nursery)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::inline_always)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::similar_names)]
#![warn(clippy::clone_on_ref_ptr)]
#![warn(clippy::dbg_macro)]
#![warn(clippy::exit)]
#![warn(clippy::if_then_some_else_none)]
#![warn(clippy::map_err_ignore)]
#![warn(clippy::mem_forget)]
#![warn(clippy::mod_module_files)]
#![warn(clippy::multiple_inherent_impl)]
#![warn(clippy::rest_pat_in_fully_bound_structs)]
#![warn(clippy::same_name_method)]
#![warn(clippy::str_to_string)]
#![warn(clippy::undocumented_unsafe_blocks)]
#![warn(clippy::unnecessary_self_imports)]
#![warn(clippy::unneeded_field_pattern)]
#![warn(clippy::use_debug)]

//! RGB(A) to luma conversion, written once per execution strategy.
//!
//! Every strategy computes `Y = 0.299 R + 0.587 G + 0.114 B` in fixed point
//! over a flat interleaved source buffer and a flat luma buffer, with the
//! same signature so a driver can time them side by side:
//!
//! - [`serial`]: single-threaded reference
//! - [`range`]: work-stealing over the flat pixel range, as a stateful worker
//!   or as a closure
//! - [`tile`]: work-stealing over 2D tiles
//! - [`vector`]: 128-bit SIMD, three variants
//! - [`hybrid`]: work-stealing ranges running the SIMD kernel
//! - [`offload`]: data-parallel work items on an accelerator
//!
//! All of them produce byte-identical output, except
//! [`vector::convert_reduced`], which trades up to [`REDUCED_MAX_ERROR`] luma
//! levels for speed.
//!
//! # Example
//! ```
//! use lumabench::{Context, ContextConfig, Dimensions, STRATEGIES};
//!
//! let context = Context::new(&ContextConfig::default()).unwrap();
//! let dims = Dimensions::rgba(4, 2).unwrap();
//! let source = vec![255u8; dims.source_len()];
//! let mut luma = vec![0u8; dims.pixel_count()];
//!
//! for strategy in STRATEGIES.iter().filter(|s| s.supports(dims)) {
//!     strategy.run(&context, &source, &mut luma, dims);
//! }
//! ```

mod dims;
mod errors;
mod registry;
mod scheduler;
mod weights;

pub mod hybrid;
pub mod offload;
pub mod range;
pub mod serial;
pub mod tile;
pub mod vector;

pub use crate::dims::{Dimensions, VECTOR_BYTES, VECTOR_PIXELS};
pub use crate::errors::LumaError;
pub use crate::offload::{
    enumerate_accelerators, AcceleratorInfo, EmulatedAccelerator, Offloadable,
};
pub use crate::registry::{
    strategy, AcceleratorPreference, Context, ContextConfig, KernelFn, Precision, Strategy,
    STRATEGIES,
};
pub use crate::scheduler::{Scheduler, SchedulerConfig};
pub use crate::weights::{LumaWeights, FULL_PRECISION, REDUCED_MAX_ERROR, REDUCED_PRECISION};

#[cfg(test)]
mod tests {
    use interpolate_name::interpolate_test;
    use rand::Rng;

    use super::*;

    // luma of `pattern_8x8`, worked out by hand from the fixed-point formula
    const PATTERN_8X8_LUMA: [u8; 64] = [
        39, 103, 167, 80, 144, 208, 122, 109, 173, 87, 151, 215, 128, 192, 29, 93, 157, 71, 135,
        199, 112, 100, 164, 77, 141, 205, 119, 183, 20, 84, 147, 61, 125, 189, 103, 90, 154, 67,
        131, 195, 109, 173, 160, 74, 138, 51, 115, 179, 93, 80, 144, 58, 151, 215, 128, 192, 180,
        93, 157, 71, 135, 199, 112, 100,
    ];

    fn pattern_8x8() -> Vec<u8> {
        (0..64usize)
            .flat_map(|i| {
                [
                    (i * 37) as u8,
                    (i * 91 + 17) as u8,
                    255u8.wrapping_sub((i * 5) as u8),
                    i as u8,
                ]
            })
            .collect()
    }

    fn context() -> Context {
        Context::new(&ContextConfig {
            scheduler: SchedulerConfig {
                num_threads: 4,
                ..Default::default()
            },
            ..Default::default()
        })
        .unwrap()
    }

    fn assert_matches(strategy: &Strategy, expected: &[u8], actual: &[u8]) {
        match strategy.precision {
            Precision::Exact => assert_eq!(expected, actual, "{}", strategy.label),
            Precision::Approximate => {
                for (i, (e, a)) in expected.iter().zip(actual).enumerate() {
                    assert!(
                        e.abs_diff(*a) <= REDUCED_MAX_ERROR,
                        "{}: pixel {i} expected about {e}, got {a}",
                        strategy.label
                    );
                }
            }
        }
    }

    #[interpolate_test(serial, "Serial")]
    #[interpolate_test(range_worker, "Range worker")]
    #[interpolate_test(range_closure, "Range closure")]
    #[interpolate_test(tiles, "Tiles")]
    #[interpolate_test(simd_unpack, "SIMD unpack")]
    #[interpolate_test(simd_hadd, "SIMD hadd")]
    #[interpolate_test(simd_reduced, "SIMD reduced")]
    #[interpolate_test(range_simd, "Range SIMD")]
    #[interpolate_test(offload, "Offload")]
    fn end_to_end_8x8(label: &str) {
        let strategy = strategy(label).unwrap();
        let dims = Dimensions::rgba(8, 8).unwrap();
        let source = pattern_8x8();
        let mut luma = vec![0u8; 64];
        strategy.run(&context(), &source, &mut luma, dims);
        assert_matches(&strategy, &PATTERN_8X8_LUMA, &luma);
    }

    #[interpolate_test(serial, "Serial")]
    #[interpolate_test(range_worker, "Range worker")]
    #[interpolate_test(range_closure, "Range closure")]
    #[interpolate_test(tiles, "Tiles")]
    #[interpolate_test(simd_unpack, "SIMD unpack")]
    #[interpolate_test(simd_hadd, "SIMD hadd")]
    #[interpolate_test(simd_reduced, "SIMD reduced")]
    #[interpolate_test(range_simd, "Range SIMD")]
    #[interpolate_test(offload, "Offload")]
    fn matches_serial_on_random_rgba(label: &str) {
        let strategy = strategy(label).unwrap();
        let context = context();
        let mut rng = rand::thread_rng();
        for (width, height) in [(2, 2), (64, 48), (320, 17)] {
            let dims = Dimensions::rgba(width, height).unwrap();
            let mut source = vec![0u8; dims.source_len()];
            rng.fill(&mut source[..]);

            let mut expected = vec![0u8; dims.pixel_count()];
            let mut luma = vec![0u8; dims.pixel_count()];
            serial::convert(&source, &mut expected, dims);
            strategy.run(&context, &source, &mut luma, dims);
            assert_matches(&strategy, &expected, &luma);
        }
    }

    #[test]
    fn long_and_narrow_images_match_serial() {
        let context = context();
        let mut rng = rand::thread_rng();
        for (width, height) in [(4, 1), (1, 4), (1, 12), (2048, 3), (12345, 4)] {
            let dims = Dimensions::rgba(width, height).unwrap();
            let mut source = vec![0u8; dims.source_len()];
            rng.fill(&mut source[..]);
            let mut expected = vec![0u8; dims.pixel_count()];
            serial::convert(&source, &mut expected, dims);

            for strategy in STRATEGIES.iter().filter(|s| s.supports(dims)) {
                let mut luma = vec![0u8; dims.pixel_count()];
                strategy.run(&context, &source, &mut luma, dims);
                assert_matches(strategy, &expected, &luma);
            }
        }
    }

    #[test]
    fn scalar_strategies_accept_any_shape() {
        let context = context();
        let mut rng = rand::thread_rng();
        for (width, height, stride) in [(1, 1, 3), (7, 3, 3), (5, 9, 4), (33, 1, 3)] {
            let dims = Dimensions::new(width, height, stride).unwrap();
            let mut source = vec![0u8; dims.source_len()];
            rng.fill(&mut source[..]);
            let mut expected = vec![0u8; dims.pixel_count()];
            serial::convert(&source, &mut expected, dims);

            for strategy in STRATEGIES.iter().filter(|s| !s.vector_only) {
                let mut luma = vec![0u8; dims.pixel_count()];
                strategy.run(&context, &source, &mut luma, dims);
                assert_eq!(expected, luma, "{} on {width}x{height}x{stride}", strategy.label);
            }
        }
    }

    #[test]
    fn white_is_255_and_black_is_0() {
        let context = context();
        let dims = Dimensions::rgba(4, 4).unwrap();
        let source: Vec<u8> = (0..16)
            .flat_map(|i| if i % 2 == 0 { [255; 4] } else { [0; 4] })
            .collect();

        for strategy in &STRATEGIES {
            let mut luma = vec![1u8; 16];
            strategy.run(&context, &source, &mut luma, dims);
            for (i, y) in luma.iter().enumerate() {
                let expected = match (i % 2, strategy.precision) {
                    (1, _) => 0,
                    (_, Precision::Exact) => 255,
                    (_, Precision::Approximate) => 253,
                };
                assert_eq!(*y, expected, "{} pixel {i}", strategy.label);
            }
        }
    }

    #[test]
    fn repeated_calls_give_the_same_output() {
        let context = context();
        let dims = Dimensions::rgba(40, 10).unwrap();
        let mut source = vec![0u8; dims.source_len()];
        rand::thread_rng().fill(&mut source[..]);

        for strategy in &STRATEGIES {
            let mut luma = vec![0u8; dims.pixel_count()];
            strategy.run(&context, &source, &mut luma, dims);
            let first = luma.clone();
            luma.iter_mut().for_each(|y| *y = !*y);
            strategy.run(&context, &source, &mut luma, dims);
            assert_eq!(first, luma, "{}", strategy.label);
        }
    }

    #[test]
    fn strategies_run_concurrently_on_disjoint_buffers() {
        let context = context();
        let dims = Dimensions::rgba(64, 64).unwrap();
        let mut source = vec![0u8; dims.source_len()];
        rand::thread_rng().fill(&mut source[..]);
        let mut expected = vec![0u8; dims.pixel_count()];
        serial::convert(&source, &mut expected, dims);

        let outputs: Vec<Vec<u8>> = std::thread::scope(|scope| {
            let handles: Vec<_> = STRATEGIES
                .into_iter()
                .filter(|s| s.precision == Precision::Exact)
                .map(|strategy| {
                    let (context, source) = (&context, &source);
                    scope.spawn(move || {
                        let mut luma = vec![0u8; dims.pixel_count()];
                        strategy.run(context, source, &mut luma, dims);
                        luma
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        for luma in outputs {
            assert_eq!(expected, luma);
        }
    }
}
