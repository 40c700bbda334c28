//! Fixed paragraph-style-name → action table.
//!
//! `word/styles.xml` resolves a paragraph's `w:pStyle` id to a display name
//! (e.g. `"Heading 1"`); this table then resolves that name to what the
//! walker and the semantic classifier do about it. Unrecognised names fall
//! through to content-based heuristics in the walker.

/// What a recognised paragraph style means to the converter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StyleAction {
    /// `\section`/`\subsection`/... at the given nesting level (1-4).
    Section(u8),
    Title,
    Subtitle,
    /// Metadata paragraph with no LaTeX output of its own (TOC headings,
    /// CCS concepts, keyword-metadata blocks, ORCID lines).
    Drop,
    Abstract,
    Bibliography,
    DisplayEquation,
    AcmAuthor,
}

/// Resolve a named paragraph style (already looked up from `styles.xml`) to
/// its action, if the table has an opinion about it.
#[must_use]
pub fn lookup_style(name: &str) -> Option<StyleAction> {
    match name {
        "Heading 1" => Some(StyleAction::Section(1)),
        "Heading 2" => Some(StyleAction::Section(2)),
        "Heading 3" => Some(StyleAction::Section(3)),
        "Heading 4" => Some(StyleAction::Section(4)),
        "Title" => Some(StyleAction::Title),
        "Subtitle" => Some(StyleAction::Subtitle),
        "TOC Heading" | "CCS" | "Keywords-metadata" | "ORCID" => Some(StyleAction::Drop),
        "Abstract" => Some(StyleAction::Abstract),
        "Bibliography" | "References" => Some(StyleAction::Bibliography),
        "Equation" | "Display Equation" => Some(StyleAction::DisplayEquation),
        "Author" | "ACM Author" => Some(StyleAction::AcmAuthor),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_heading_levels() {
        assert_eq!(lookup_style("Heading 1"), Some(StyleAction::Section(1)));
        assert_eq!(lookup_style("Heading 4"), Some(StyleAction::Section(4)));
    }

    #[test]
    fn resolves_drop_styles() {
        assert_eq!(lookup_style("TOC Heading"), Some(StyleAction::Drop));
        assert_eq!(lookup_style("ORCID"), Some(StyleAction::Drop));
    }

    #[test]
    fn unknown_style_falls_through() {
        assert_eq!(lookup_style("Normal"), None);
        assert_eq!(lookup_style("Quirky Custom Style"), None);
    }
}
