//! Range-parallel conversion over the flat pixel index space.
//!
//! The index space `[0, width * height)` is split recursively and the pieces
//! are handed to the workers of a [`Scheduler`]; rayon decides adaptively how
//! far splitting goes, so there is no hand-tuned grain size. Each piece owns
//! a disjoint slice of the destination, and reads the shared source at
//! `range.start * stride`.

use std::ops::Range;

use rayon::iter::ParallelIterator;

use crate::{weights::convert_span, Dimensions, Scheduler};

/// Work applied to one sub-range of the pixel index space.
///
/// `luma` is the destination slice covering exactly `range`. The trait is
/// implemented both by [`LumaRangeConverter`] and by any
/// `Fn(Range<usize>, &mut [u8]) + Sync` closure, so the stateful worker and
/// the closure are two ways of building the same thing.
pub trait RangeBody: Sync {
    fn apply(&self, range: Range<usize>, luma: &mut [u8]);
}

impl<F> RangeBody for F
where
    F: Fn(Range<usize>, &mut [u8]) + Sync,
{
    #[inline]
    fn apply(&self, range: Range<usize>, luma: &mut [u8]) {
        self(range, luma);
    }
}

/// Reusable worker holding the source image and its stride.
#[derive(Debug, Clone, Copy)]
pub struct LumaRangeConverter<'a> {
    source: &'a [u8],
    stride: usize,
}

impl<'a> LumaRangeConverter<'a> {
    #[must_use]
    pub const fn new(source: &'a [u8], dims: Dimensions) -> Self {
        Self {
            source,
            stride: dims.stride(),
        }
    }
}

impl RangeBody for LumaRangeConverter<'_> {
    #[inline]
    fn apply(&self, range: Range<usize>, luma: &mut [u8]) {
        convert_span(&self.source[range.start * self.stride..], luma, self.stride);
    }
}

struct Span<'a> {
    begin: usize,
    luma: &'a mut [u8],
    granule: usize,
}

impl<'a> Span<'a> {
    // Halves the span, keeping both halves a whole number of granules.
    fn split(self) -> (Self, Option<Self>) {
        let mid = self.luma.len() / 2 / self.granule * self.granule;
        if mid == 0 {
            return (self, None);
        }

        let Span {
            begin,
            luma,
            granule,
        } = self;
        let (left, right) = luma.split_at_mut(mid);
        (
            Span {
                begin,
                luma: left,
                granule,
            },
            Some(Span {
                begin: begin + mid,
                luma: right,
                granule,
            }),
        )
    }
}

/// Applies `body` to every pixel of `luma`, in parallel on `scheduler`.
///
/// Sub-range boundaries are always multiples of `granule` pixels. Blocks
/// until every sub-range has been processed.
pub fn parallel_for<B>(scheduler: &Scheduler, luma: &mut [u8], granule: usize, body: &B)
where
    B: RangeBody + ?Sized,
{
    debug_assert!(granule > 0);

    let root = Span {
        begin: 0,
        luma,
        granule,
    };
    scheduler.install(|| {
        rayon::iter::split(root, Span::split).for_each(|span| {
            let end = span.begin + span.luma.len();
            body.apply(span.begin..end, span.luma);
        });
    });
}

/// Range-parallel conversion using the reusable [`LumaRangeConverter`].
pub fn convert_worker(scheduler: &Scheduler, source: &[u8], luma: &mut [u8], dims: Dimensions) {
    debug_assert!(dims.check_buffers(source, luma).is_ok());

    let worker = LumaRangeConverter::new(source, dims);
    parallel_for(scheduler, luma, 1, &worker);
}

/// Range-parallel conversion with the body written inline as a closure.
pub fn convert_closure(scheduler: &Scheduler, source: &[u8], luma: &mut [u8], dims: Dimensions) {
    debug_assert!(dims.check_buffers(source, luma).is_ok());

    let stride = dims.stride();
    parallel_for(
        scheduler,
        luma,
        1,
        &|range: Range<usize>, out: &mut [u8]| {
            convert_span(&source[range.start * stride..], out, stride);
        },
    );
}
