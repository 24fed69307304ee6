//! Volume profile: traded volume summed per price bin.
//!
//! The close-price range is split into `bins` equal-width intervals. Intervals
//! are right-closed `(lower, upper]`; the lowest edge is pushed down by 0.1% of
//! the range so the minimum close lands in the first bin. A flat series is
//! widened by 0.1% of its price on each side (or 0.001 absolute at zero).
//!
//! Used as support/resistance context, not as a trading signal.

use crate::domain::candle::Candle;

pub const DEFAULT_BINS: usize = 20;

#[derive(Debug, Clone, PartialEq)]
pub struct VolumeBin {
    pub lower: f64,
    pub upper: f64,
    pub volume: f64,
}

impl VolumeBin {
    pub fn midpoint(&self) -> f64 {
        (self.lower + self.upper) / 2.0
    }
}

/// Bins in ascending price order. Empty when there are no finite closes or
/// `bins` is zero.
pub fn calculate_volume_profile(candles: &[Candle], bins: usize) -> Vec<VolumeBin> {
    let priced: Vec<&Candle> = candles.iter().filter(|c| c.close.is_finite()).collect();
    if bins == 0 || priced.is_empty() {
        return Vec::new();
    }

    let edges = bin_edges(&priced, bins);
    let mut volumes = vec![0.0; bins];

    for candle in &priced {
        let idx = edges
            .partition_point(|&edge| edge < candle.close)
            .saturating_sub(1)
            .min(bins - 1);
        volumes[idx] += candle.volume;
    }

    volumes
        .into_iter()
        .enumerate()
        .map(|(i, volume)| VolumeBin {
            lower: edges[i],
            upper: edges[i + 1],
            volume,
        })
        .collect()
}

fn bin_edges(candles: &[&Candle], bins: usize) -> Vec<f64> {
    let mut lo = candles.iter().map(|c| c.close).fold(f64::INFINITY, f64::min);
    let mut hi = candles
        .iter()
        .map(|c| c.close)
        .fold(f64::NEG_INFINITY, f64::max);

    let flat = lo == hi;
    if flat {
        lo -= if lo != 0.0 { 0.001 * lo.abs() } else { 0.001 };
        hi += if hi != 0.0 { 0.001 * hi.abs() } else { 0.001 };
    }

    let width = (hi - lo) / bins as f64;
    let mut edges: Vec<f64> = (0..=bins).map(|i| lo + width * i as f64).collect();
    edges[bins] = hi;
    if !flat {
        edges[0] -= (hi - lo) * 0.001;
    }
    edges
}

/// The bin holding the most volume (first one on ties).
pub fn point_of_control(profile: &[VolumeBin]) -> Option<&VolumeBin> {
    profile
        .iter()
        .reduce(|best, bin| if bin.volume > best.volume { bin } else { best })
}
