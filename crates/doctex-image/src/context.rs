//! The metadata gate's view of the surrounding document — everything it
//! needs that isn't the raster bytes themselves.

/// Style names that disqualify an image outright in stage 1 (front-matter
/// chrome, cover pages, decorative headings).
pub const DISQUALIFYING_STYLES: &[&str] = &[
    "Title",
    "Subtitle",
    "Heading 1",
    "Abstract",
    "Cover Page",
    "Title Page",
];

/// Style names that bypass the aspect-ratio/near-square rejection — the
/// author already marked this paragraph as an image carrier.
pub const ASPECT_WHITELIST_STYLES: &[&str] = &["Image", "FigureCaption"];

/// Case-folded substrings whose presence in the owning paragraph's text
/// marks the image as decorative regardless of its pixel content.
pub const DECORATIVE_TEXT_MARKERS: &[&str] = &[
    "abstract",
    "acknowledgment",
    "acknowledgement",
    "portrait",
    "logo",
    "icon",
    "artist profile",
];

/// Everything the metadata gate (stage 1) consults about the image's
/// position in the document, independent of its pixel content.
pub struct ImageContext<'a> {
    pub width_emu: i64,
    pub height_emu: i64,
    /// Named style of the owning paragraph.
    pub owning_style: &'a str,
    /// Plain text of the owning paragraph (for decorative-marker and
    /// citation-signal checks).
    pub paragraph_text: &'a str,
    /// True while the walker is still in the pre-body region (pre-title,
    /// title, abstract, or keywords).
    pub in_front_matter: bool,
    /// Count of non-empty paragraphs seen so far in the walk.
    pub paragraphs_seen: usize,
    pub total_blocks: usize,
    pub block_index: usize,
    /// (width, height) in EMU of every previously accepted-for-scoring
    /// image, in walk order — used for the repeated-logo check.
    pub previously_seen_dims: &'a [(i64, i64)],
}

impl ImageContext<'_> {
    #[must_use]
    pub fn is_disqualifying_style(&self) -> bool {
        DISQUALIFYING_STYLES.contains(&self.owning_style)
    }

    #[must_use]
    pub fn has_decorative_marker(&self) -> bool {
        let lower = self.paragraph_text.to_lowercase();
        DECORATIVE_TEXT_MARKERS.iter().any(|m| lower.contains(m))
    }

    #[must_use]
    pub fn is_aspect_whitelisted(&self) -> bool {
        ASPECT_WHITELIST_STYLES.contains(&self.owning_style)
    }

    /// True if the surrounding paragraph reads like a citation: a 4-digit
    /// year and at least two dots.
    #[must_use]
    pub fn looks_like_citation(&self) -> bool {
        let has_year = self
            .paragraph_text
            .as_bytes()
            .windows(4)
            .any(|w| w.iter().all(u8::is_ascii_digit));
        let dot_count = self.paragraph_text.matches('.').count();
        has_year && dot_count >= 2
    }

    #[must_use]
    pub fn repeated_logo_count(&self) -> usize {
        self.previously_seen_dims
            .iter()
            .filter(|(w, h)| {
                (w - self.width_emu).abs() <= 50_000 && (h - self.height_emu).abs() <= 50_000
            })
            .count()
    }
}
