//! Two-stage content-vs-decoration filter for embedded images.

use crate::context::ImageContext;
use crate::pixel;

/// Minimum non-empty-paragraph count before any image is eligible.
const MIN_PARAGRAPHS_SEEN: usize = 20;
/// Fraction of the document's blocks excluded at the start and end.
const EDGE_FRACTION_LOW: f64 = 0.08;
const EDGE_FRACTION_HIGH: f64 = 0.95;

const MIN_DIM_EMU: i64 = 300_000;
const MAX_WIDTH_EMU: i64 = 7_000_000;
const MAX_HEIGHT_EMU: i64 = 9_000_000;

const MIN_ASPECT: f64 = 0.06;
const MAX_ASPECT: f64 = 15.0;
const NEAR_SQUARE_LOW: f64 = 0.8;
const NEAR_SQUARE_HIGH: f64 = 1.2;
/// Paragraph text shorter than this is "short surrounding text" for the
/// near-square rejection rule.
const SHORT_TEXT_CHARS: usize = 50;

const CONTENT_SCORE_THRESHOLD: u8 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Content,
    Decorative,
    /// The raster bytes didn't decode at all — the caller should log this
    /// as a degraded image, distinct from an ordinary decorative reject.
    Undecodable,
}

/// Run both stages and classify one embedded image.
#[must_use]
pub fn classify(ctx: &ImageContext, blob: &[u8]) -> Classification {
    if !metadata_gate(ctx) {
        return Classification::Decorative;
    }
    match pixel::decode_and_measure(blob) {
        Some(stats) => {
            if pixel::score(&stats) >= CONTENT_SCORE_THRESHOLD {
                Classification::Content
            } else {
                Classification::Decorative
            }
        }
        None => Classification::Undecodable,
    }
}

/// Stage 1. Returns `true` iff the image survives to stage 2.
#[must_use]
pub fn metadata_gate(ctx: &ImageContext) -> bool {
    if ctx.width_emu == 0 || ctx.height_emu == 0 {
        return false;
    }
    if ctx.width_emu < MIN_DIM_EMU && ctx.height_emu < MIN_DIM_EMU {
        return false;
    }
    if ctx.width_emu > MAX_WIDTH_EMU || ctx.height_emu > MAX_HEIGHT_EMU {
        return false;
    }

    if ctx.in_front_matter || ctx.is_disqualifying_style() || ctx.has_decorative_marker() {
        return false;
    }

    if ctx.paragraphs_seen < MIN_PARAGRAPHS_SEEN {
        return false;
    }

    #[allow(clippy::cast_precision_loss)]
    if ctx.total_blocks > 0 {
        let position = ctx.block_index as f64 / ctx.total_blocks as f64;
        if position < EDGE_FRACTION_LOW || position > EDGE_FRACTION_HIGH {
            return false;
        }
    }

    #[allow(clippy::cast_precision_loss)]
    let aspect = ctx.width_emu as f64 / ctx.height_emu as f64;
    if !ctx.is_aspect_whitelisted() {
        if !(MIN_ASPECT..=MAX_ASPECT).contains(&aspect) {
            return false;
        }
        let near_square = (NEAR_SQUARE_LOW..=NEAR_SQUARE_HIGH).contains(&aspect);
        let short_text = ctx.paragraph_text.trim().chars().count() < SHORT_TEXT_CHARS;
        if near_square && short_text && !ctx.looks_like_citation() {
            return false;
        }
    }

    if ctx.repeated_logo_count() >= 2 {
        return false;
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_ctx() -> ImageContext<'static> {
        ImageContext {
            width_emu: 2_000_000,
            height_emu: 1_500_000,
            owning_style: "Normal",
            paragraph_text: "A figure follows below with plenty of surrounding prose text.",
            in_front_matter: false,
            paragraphs_seen: 25,
            total_blocks: 200,
            block_index: 100,
            previously_seen_dims: &[],
        }
    }

    #[test]
    fn rejects_zero_dimension() {
        let mut ctx = base_ctx();
        ctx.width_emu = 0;
        assert!(!metadata_gate(&ctx));
    }

    #[test]
    fn rejects_oversized_image() {
        let mut ctx = base_ctx();
        ctx.width_emu = 8_000_000;
        assert!(!metadata_gate(&ctx));
    }

    #[test]
    fn rejects_front_matter_images() {
        let mut ctx = base_ctx();
        ctx.in_front_matter = true;
        assert!(!metadata_gate(&ctx));
    }

    #[test]
    fn rejects_disqualifying_style() {
        let mut ctx = base_ctx();
        ctx.owning_style = "Title";
        assert!(!metadata_gate(&ctx));
    }

    #[test]
    fn rejects_decorative_marker_text() {
        let mut ctx = base_ctx();
        ctx.paragraph_text = "Company LOGO shown here";
        assert!(!metadata_gate(&ctx));
    }

    #[test]
    fn rejects_before_minimum_paragraph_count() {
        let mut ctx = base_ctx();
        ctx.paragraphs_seen = 5;
        assert!(!metadata_gate(&ctx));
    }

    #[test]
    fn rejects_near_document_edges() {
        let mut ctx = base_ctx();
        ctx.block_index = 2;
        ctx.total_blocks = 200;
        assert!(!metadata_gate(&ctx));
    }

    #[test]
    fn rejects_near_square_with_short_text_and_no_citation() {
        let mut ctx = base_ctx();
        ctx.width_emu = 1_000_000;
        ctx.height_emu = 1_000_000;
        ctx.paragraph_text = "short caption";
        assert!(!metadata_gate(&ctx));
    }

    #[test]
    fn accepts_near_square_with_citation_signal() {
        let mut ctx = base_ctx();
        ctx.width_emu = 1_000_000;
        ctx.height_emu = 1_000_000;
        ctx.paragraph_text = "short caption 2021.";
        assert!(metadata_gate(&ctx));
    }

    #[test]
    fn whitelist_style_bypasses_aspect_checks() {
        let mut ctx = base_ctx();
        ctx.width_emu = 500_000;
        ctx.height_emu = 10_000_000; // far outside [0.06, 15] ratio bound if not whitelisted
        ctx.owning_style = "Image";
        assert!(!metadata_gate(&ctx)); // still rejected: exceeds MAX_HEIGHT_EMU
        ctx.height_emu = 8_500_000;
        assert!(metadata_gate(&ctx));
    }

    #[test]
    fn rejects_repeated_logo_dimensions() {
        let mut ctx = base_ctx();
        let dims = vec![(2_010_000, 1_490_000), (1_990_000, 1_510_000)];
        ctx.previously_seen_dims = &dims;
        assert!(!metadata_gate(&ctx));
    }

    #[test]
    fn classify_reports_undecodable_for_bad_bytes() {
        let ctx = base_ctx();
        assert_eq!(classify(&ctx, b"not a real image"), Classification::Undecodable);
    }
}
