//! Modern (OMML) and legacy (MTEF) math translation to LaTeX.
//!
//! This crate owns the shared AST ([`ast::MathNode`]) and renderer
//! ([`render::render`]) both translators build on, plus the lookup
//! tables (`tables`) they both draw from. Callers that already have the
//! math XML or the equation-object bytes in hand use [`omml::translate`]
//! or [`mtef::translate`] directly; [`translate_run`] exists for callers
//! that want one entry point for either kind of embedded math.

pub mod ast;
pub mod mtef;
pub mod omml;
pub mod render;
pub mod tables;
pub mod xmltree;

pub use ast::MathNode;
pub use omml::ExternalMathConverter;

/// One piece of embedded math as found walking a document body.
pub enum MathSource<'a> {
    /// Raw OMML XML text of an `m:oMath`/`m:oMathPara` element.
    Omml(&'a str),
    /// Raw bytes of an OLE compound-file equation object (the legacy
    /// `oleObject`'s binary data).
    LegacyOle(&'a [u8]),
}

/// Translate either kind of embedded math to a LaTeX string, degrading to
/// an empty string (never panicking) if translation fails.
#[must_use]
pub fn translate_run(source: &MathSource, external: Option<&dyn ExternalMathConverter>) -> String {
    match source {
        MathSource::Omml(xml) => omml::translate(xml, external),
        MathSource::LegacyOle(blob) => mtef::translate(blob),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translate_run_dispatches_omml() {
        let xml = r#"<m:oMath><m:r><m:t>x</m:t></m:r></m:oMath>"#;
        let out = translate_run(&MathSource::Omml(xml), None);
        assert_eq!(out, "x");
    }

    #[test]
    fn translate_run_degrades_on_bad_legacy_blob() {
        let out = translate_run(&MathSource::LegacyOle(b"garbage"), None);
        assert_eq!(out, "");
    }
}
