//! Stage 2: pixel-statistics scoring of a decoded raster.

use image::{DynamicImage, GenericImageView};
use imageproc::gradients::sobel_gradients;

#[derive(Debug, Clone, Copy, Default)]
pub struct PixelStats {
    pub entropy: f64,
    pub distinct_colors: usize,
    pub edge_mean: f64,
    pub grey_variance: f64,
    pub histogram_peaks: usize,
    pub dominant_5_ratio: f64,
}

/// Decode `blob` and compute [`PixelStats`]. Returns `None` if the bytes
/// don't decode as a supported raster format.
#[must_use]
pub fn decode_and_measure(blob: &[u8]) -> Option<PixelStats> {
    let img = image::load_from_memory(blob).ok()?;
    Some(measure(&img))
}

#[must_use]
pub fn measure(img: &DynamicImage) -> PixelStats {
    let gray = img.to_luma8();
    let (w, h) = gray.dimensions();
    let total_pixels = (w as u64 * h as u64).max(1);

    let mut histogram = [0u64; 256];
    for px in gray.pixels() {
        histogram[px.0[0] as usize] += 1;
    }

    let entropy = shannon_entropy(&histogram, total_pixels);
    let distinct_colors = count_distinct_colors(img);
    let (edge_mean, _edge_variance) = edge_stats(&gray);
    let grey_variance = variance(&histogram, total_pixels);
    let histogram_peaks = count_peaks(&histogram, total_pixels);
    let dominant_5_ratio = dominant_5_ratio(&histogram, total_pixels);

    PixelStats {
        entropy,
        distinct_colors,
        edge_mean,
        grey_variance,
        histogram_peaks,
        dominant_5_ratio,
    }
}

fn shannon_entropy(histogram: &[u64; 256], total: u64) -> f64 {
    let mut h = 0.0;
    for &count in histogram {
        if count == 0 {
            continue;
        }
        #[allow(clippy::cast_precision_loss)]
        let p = count as f64 / total as f64;
        h -= p * p.log2();
    }
    h
}

fn variance(histogram: &[u64; 256], total: u64) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    let total_f = total as f64;
    #[allow(clippy::cast_precision_loss)]
    let mean: f64 = histogram
        .iter()
        .enumerate()
        .map(|(v, &c)| v as f64 * c as f64)
        .sum::<f64>()
        / total_f;
    #[allow(clippy::cast_precision_loss)]
    let var: f64 = histogram
        .iter()
        .enumerate()
        .map(|(v, &c)| {
            let d = v as f64 - mean;
            d * d * c as f64
        })
        .sum::<f64>()
        / total_f;
    var
}

/// Local maxima of the histogram whose bin holds at least 2% of all
/// pixels, counted as "peaks" per the greyscale histogram shape.
fn count_peaks(histogram: &[u64; 256], total: u64) -> usize {
    #[allow(clippy::cast_precision_loss)]
    let threshold = (total as f64 * 0.02) as u64;
    let mut peaks = 0;
    for i in 0..histogram.len() {
        let v = histogram[i];
        if v < threshold {
            continue;
        }
        let left_ok = i == 0 || histogram[i - 1] <= v;
        let right_ok = i == histogram.len() - 1 || histogram[i + 1] <= v;
        if left_ok && right_ok {
            peaks += 1;
        }
    }
    peaks
}

fn dominant_5_ratio(histogram: &[u64; 256], total: u64) -> f64 {
    let mut sorted = *histogram;
    sorted.sort_unstable_by(|a, b| b.cmp(a));
    let top5: u64 = sorted[..5].iter().sum();
    #[allow(clippy::cast_precision_loss)]
    {
        top5 as f64 / total as f64
    }
}

/// Distinct RGB triples, capped at 100 000 — counting stops early once
/// the cap is reached since the scorer only needs to distinguish "many"
/// from "few" colours.
fn count_distinct_colors(img: &DynamicImage) -> usize {
    use std::collections::HashSet;
    const CAP: usize = 100_000;
    let rgb = img.to_rgb8();
    let mut seen: HashSet<[u8; 3]> = HashSet::new();
    for px in rgb.pixels() {
        seen.insert(px.0);
        if seen.len() >= CAP {
            break;
        }
    }
    seen.len()
}

fn edge_stats(gray: &image::GrayImage) -> (f64, f64) {
    if gray.width() < 3 || gray.height() < 3 {
        return (0.0, 0.0);
    }
    let edges = sobel_gradients(gray);
    let total = u64::from(edges.width()) * u64::from(edges.height());
    #[allow(clippy::cast_precision_loss)]
    let mean: f64 = edges.pixels().map(|p| f64::from(p.0[0])).sum::<f64>() / total as f64;
    #[allow(clippy::cast_precision_loss)]
    let variance: f64 = edges
        .pixels()
        .map(|p| {
            let d = f64::from(p.0[0]) - mean;
            d * d
        })
        .sum::<f64>()
        / total as f64;
    (mean, variance)
}

/// Turn [`PixelStats`] into the 0-9 score from the scoring table. An image
/// is content iff this is ≥ 4.
#[must_use]
pub fn score(stats: &PixelStats) -> u8 {
    let mut total = 0u8;
    total += if stats.entropy >= 5.0 {
        3
    } else if stats.entropy >= 4.0 {
        2
    } else if stats.entropy >= 3.0 {
        1
    } else {
        0
    };
    total += if stats.distinct_colors >= 1000 {
        3
    } else if stats.distinct_colors >= 200 {
        2
    } else if stats.distinct_colors >= 50 {
        1
    } else {
        0
    };
    total += if stats.edge_mean >= 20.0 {
        2
    } else if stats.edge_mean >= 10.0 {
        1
    } else {
        0
    };
    total += if stats.grey_variance >= 2000.0 {
        2
    } else if stats.grey_variance >= 500.0 {
        1
    } else {
        0
    };
    if stats.histogram_peaks >= 5 {
        total += 1;
    }
    if stats.dominant_5_ratio < 0.5 {
        total += 1;
    }
    total
}
