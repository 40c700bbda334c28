//! Region finite-state machine: files each emitted fragment into the
//! pre-title, title, abstract, keywords, or body buffer.
//!
//! Bibliography is not a step in this ordinal: it is tracked as an
//! independent flag that opens and closes atop `Body` (see
//! [`SemanticClassifier::bibliography_open`]), so the region itself still
//! only ever moves forward.

use crate::styles::StyleAction;
use doctex_core::model::{Alignment, Paragraph};
use once_cell::sync::Lazy;
use regex::Regex;

const TITLE_PREDICATE_BLOCK_WINDOW: usize = 10;
const ABSTRACT_SAFETY_VALVE: u32 = 10;
const KEYWORDS_SAFETY_VALVE: u32 = 3;

/// Logical region a fragment is filed under, in strictly increasing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Region {
    PreTitle,
    Title,
    Abstract,
    Keywords,
    Body,
}

static ABSTRACT_LABEL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*(?:[ivxlcdm]+\.|\d+\.)?\s*(abstract|tóm tắt)\b").unwrap());

static KEYWORDS_LABEL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(?:[ivxlcdm]+\.|\d+\.)?\s*(keywords|index terms|từ khóa)\b").unwrap()
});

static BODY_START_LABEL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(?:i\.|1\.)?\s*(introduction|giới thiệu|chapter\s+1)\b|^\s*i\.\s").unwrap()
});

/// Region/bibliography state carried across the whole document walk.
#[derive(Debug, Clone)]
pub struct SemanticClassifier {
    region: Region,
    abstract_paragraphs: u32,
    keywords_paragraphs: u32,
    bibliography_open: bool,
}

impl Default for SemanticClassifier {
    fn default() -> Self {
        Self {
            region: Region::PreTitle,
            abstract_paragraphs: 0,
            keywords_paragraphs: 0,
            bibliography_open: false,
        }
    }
}

impl SemanticClassifier {
    #[must_use]
    pub fn region(&self) -> Region {
        self.region
    }

    #[must_use]
    pub fn bibliography_open(&self) -> bool {
        self.bibliography_open
    }

    fn satisfies_title_predicate(para: &Paragraph, block_index: usize) -> bool {
        if block_index >= TITLE_PREDICATE_BLOCK_WINDOW {
            return false;
        }
        if !para.all_bold() {
            return false;
        }
        let centred = para.alignment == Alignment::Center;
        let large = para.max_font_size_pt().is_some_and(|pt| pt >= 14.0);
        centred || large
    }

    /// Feed one paragraph through the machine and return the region its
    /// fragment belongs in. A paragraph that triggers a transition is
    /// itself filed under the region it transitions into (e.g. the title
    /// paragraph's own text becomes the title).
    pub fn advance(
        &mut self,
        para: &Paragraph,
        style_action: Option<StyleAction>,
        block_index: usize,
    ) -> Region {
        let text = para.plain_text();
        let trimmed = text.trim();

        match self.region {
            Region::PreTitle => {
                if matches!(style_action, Some(StyleAction::Title))
                    || Self::satisfies_title_predicate(para, block_index)
                {
                    self.region = Region::Title;
                }
            }
            Region::Title => {
                if matches!(style_action, Some(StyleAction::Abstract))
                    || ABSTRACT_LABEL_RE.is_match(trimmed)
                {
                    self.region = Region::Abstract;
                    self.abstract_paragraphs = 0;
                }
            }
            Region::Abstract => {
                self.abstract_paragraphs += 1;
                if KEYWORDS_LABEL_RE.is_match(trimmed) {
                    self.region = Region::Keywords;
                    self.keywords_paragraphs = 0;
                } else if BODY_START_LABEL_RE.is_match(trimmed)
                    || self.abstract_paragraphs > ABSTRACT_SAFETY_VALVE
                {
                    self.region = Region::Body;
                }
            }
            Region::Keywords => {
                self.keywords_paragraphs += 1;
                if BODY_START_LABEL_RE.is_match(trimmed)
                    || self.keywords_paragraphs > KEYWORDS_SAFETY_VALVE
                {
                    self.region = Region::Body;
                }
            }
            Region::Body => {}
        }

        if self.region == Region::Body {
            self.bibliography_open = matches!(style_action, Some(StyleAction::Bibliography));
        }

        self.region
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use doctex_core::model::{Inline, Run, RunFormatting};

    fn para(text: &str, alignment: Alignment, bold: bool, size_half_points: Option<u32>) -> Paragraph {
        Paragraph {
            index: 0,
            style: "Normal".to_string(),
            numbering: None,
            alignment,
            children: vec![Inline::Run(Run {
                text: text.to_string(),
                formatting: RunFormatting {
                    bold,
                    size_half_points,
                    ..Default::default()
                },
            })],
        }
    }

    #[test]
    fn centred_bold_paragraph_within_window_becomes_title() {
        let mut fsm = SemanticClassifier::default();
        let p = para("A Great Paper", Alignment::Center, true, None);
        assert_eq!(fsm.advance(&p, None, 0), Region::Title);
    }

    #[test]
    fn large_bold_font_becomes_title_even_if_left_aligned() {
        let mut fsm = SemanticClassifier::default();
        let p = para("A Great Paper", Alignment::Left, true, Some(32));
        assert_eq!(fsm.advance(&p, None, 1), Region::Title);
    }

    #[test]
    fn title_predicate_ignored_past_block_window() {
        let mut fsm = SemanticClassifier::default();
        let p = para("A Great Paper", Alignment::Center, true, None);
        assert_eq!(fsm.advance(&p, None, 10), Region::PreTitle);
    }

    #[test]
    fn full_fsm_walk_through_every_region() {
        let mut fsm = SemanticClassifier::default();
        fsm.advance(&para("My Title", Alignment::Center, true, None), None, 0);
        assert_eq!(fsm.region(), Region::Title);

        fsm.advance(&para("Abstract", Alignment::Left, false, None), None, 1);
        assert_eq!(fsm.region(), Region::Abstract);

        fsm.advance(&para("Some abstract text.", Alignment::Left, false, None), None, 2);
        assert_eq!(fsm.region(), Region::Abstract);

        fsm.advance(&para("Keywords: foo, bar", Alignment::Left, false, None), None, 3);
        assert_eq!(fsm.region(), Region::Keywords);

        fsm.advance(&para("Introduction", Alignment::Left, false, None), None, 4);
        assert_eq!(fsm.region(), Region::Body);
    }

    #[test]
    fn abstract_safety_valve_forces_body_after_ten_paragraphs() {
        let mut fsm = SemanticClassifier::default();
        fsm.advance(&para("My Title", Alignment::Center, true, None), None, 0);
        fsm.advance(&para("Abstract", Alignment::Left, false, None), None, 1);
        for _ in 0..11 {
            fsm.advance(&para("filler text with no label", Alignment::Left, false, None), None, 5);
        }
        assert_eq!(fsm.region(), Region::Body);
    }

    #[test]
    fn keywords_safety_valve_forces_body_after_three_paragraphs() {
        let mut fsm = SemanticClassifier::default();
        fsm.advance(&para("My Title", Alignment::Center, true, None), None, 0);
        fsm.advance(&para("Abstract", Alignment::Left, false, None), None, 1);
        fsm.advance(&para("Keywords: foo", Alignment::Left, false, None), None, 2);
        for _ in 0..4 {
            fsm.advance(&para("more filler", Alignment::Left, false, None), None, 5);
        }
        assert_eq!(fsm.region(), Region::Body);
    }

    #[test]
    fn bibliography_toggles_on_and_off_without_regressing_region() {
        let mut fsm = SemanticClassifier::default();
        fsm.advance(&para("My Title", Alignment::Center, true, None), None, 0);
        fsm.advance(&para("Abstract", Alignment::Left, false, None), None, 1);
        fsm.advance(&para("Introduction", Alignment::Left, false, None), None, 2);
        assert_eq!(fsm.region(), Region::Body);
        assert!(!fsm.bibliography_open());

        fsm.advance(
            &para("Smith, J. (2020).", Alignment::Left, false, None),
            Some(StyleAction::Bibliography),
            6,
        );
        assert_eq!(fsm.region(), Region::Body);
        assert!(fsm.bibliography_open());

        fsm.advance(&para("Back to normal text.", Alignment::Left, false, None), None, 7);
        assert_eq!(fsm.region(), Region::Body);
        assert!(!fsm.bibliography_open());
    }

    #[test]
    fn region_ordinal_is_monotonic() {
        assert!(Region::PreTitle < Region::Title);
        assert!(Region::Title < Region::Abstract);
        assert!(Region::Abstract < Region::Keywords);
        assert!(Region::Keywords < Region::Body);
    }
}
