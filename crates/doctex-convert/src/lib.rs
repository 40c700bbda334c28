//! Orchestration crate: OOXML container reading, document walking, and
//! LaTeX emission. Exposes a single entry point, [`convert_document`],
//! the way `docling-backend` exposes one `convert` function per format.

pub mod container;
pub mod content;
pub mod parser;
pub mod semantic;
pub mod styles;
pub mod table;
pub mod template;
pub mod walker;

use doctex_core::error::Result;

/// One non-template asset (an image extracted for a figure or an inline
/// equation-adjacent image) that the caller must write alongside the
/// emitted `.tex` file.
#[derive(Debug, Clone)]
pub struct ConvertedAsset {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// The result of converting one document: the final LaTeX text, ready to
/// write out, plus the assets it references.
#[derive(Debug, Clone)]
pub struct ConvertedDocument {
    pub latex: String,
    pub assets: Vec<ConvertedAsset>,
}

/// Convert a `.docx` container's bytes, injecting the result into
/// `template_text`, into a finished LaTeX document and its asset list.
///
/// # Errors
/// Returns [`doctex_core::error::DoctexError::ContainerError`] if `docx_bytes`
/// isn't a well-formed OOXML package, or
/// [`doctex_core::error::DoctexError::XmlError`] if the main document part
/// can't be parsed.
pub fn convert_document(docx_bytes: &[u8], template_text: &str) -> Result<ConvertedDocument> {
    let pkg = container::open_package(docx_bytes)?;
    let doc = parser::parse_document(&pkg)?;
    let walked = walker::walk(&doc);
    let latex = template::inject(template_text, &walked);

    let assets = walked
        .figure_assets
        .into_iter()
        .map(|(filename, bytes)| ConvertedAsset { filename, bytes })
        .collect();

    Ok(ConvertedDocument { latex, assets })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    fn minimal_docx_bytes(document_xml: &str) -> Vec<u8> {
        let mut buf = Vec::new();
        {
            let mut writer = zip::ZipWriter::new(std::io::Cursor::new(&mut buf));

            writer
                .start_file("[Content_Types].xml", SimpleFileOptions::default())
                .unwrap();
            writer
                .write_all(
                    br#"<?xml version="1.0"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#,
                )
                .unwrap();

            writer
                .start_file("word/document.xml", SimpleFileOptions::default())
                .unwrap();
            writer.write_all(document_xml.as_bytes()).unwrap();

            writer
                .start_file("word/_rels/document.xml.rels", SimpleFileOptions::default())
                .unwrap();
            writer
                .write_all(
                    br#"<?xml version="1.0"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"/>"#,
                )
                .unwrap();

            writer.finish().unwrap();
        }
        buf
    }

    #[test]
    fn converts_minimal_paragraph_document() {
        let xml = r#"<?xml version="1.0"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:body>
    <w:p><w:r><w:t>Hello world.</w:t></w:r></w:p>
  </w:body>
</w:document>"#;
        let bytes = minimal_docx_bytes(xml);
        let template = "\\documentclass{article}\n\\begin{document}\n%%CONTENT%%\n\\end{document}";
        let result = convert_document(&bytes, template).unwrap();
        assert!(result.latex.contains("Hello world."));
        assert!(result.assets.is_empty());
    }

    #[test]
    fn malformed_container_is_a_container_error() {
        let err = convert_document(b"not a zip file", "%%CONTENT%%").unwrap_err();
        assert!(matches!(err, doctex_core::error::DoctexError::ContainerError(_)));
    }
}
