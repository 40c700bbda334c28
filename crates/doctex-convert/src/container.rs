//! Open a ZIP-shaped OOXML container and, if it's macro-enabled, rewrite it
//! in-memory before handing parts to the XML parser.

use doctex_core::error::{DoctexError, Result};
use regex::Regex;
use std::collections::HashMap;
use std::io::{Cursor, Read, Write};
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

const VBA_PROJECT: &str = "word/vbaProject.bin";
const VBA_DATA: &str = "word/vbaData.xml";
const MACRO_MIME: &str = "application/vnd.ms-word.document.macroEnabled.main+xml";
const PLAIN_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml";

/// Every part this converter needs out of the package, already resolved
/// into plain in-memory maps.
pub struct OpcPackage {
    pub document_xml: String,
    pub styles_xml: Option<String>,
    /// `r:id` → target, from `word/_rels/document.xml.rels`.
    pub relationships: HashMap<String, String>,
    /// Part path (e.g. `"word/media/image1.png"`) → bytes.
    pub media: HashMap<String, Vec<u8>>,
    /// Part path (e.g. `"word/embeddings/oleObject1.bin"`) → bytes.
    pub embeddings: HashMap<String, Vec<u8>>,
}

/// Open `bytes` as an OOXML package, stripping macro parts first if the
/// manifest declares a macro-enabled main part.
pub fn open_package(bytes: &[u8]) -> Result<OpcPackage> {
    let stripped = strip_macros(bytes)?;
    let mut archive = ZipArchive::new(Cursor::new(stripped))
        .map_err(|e| DoctexError::ContainerError(format!("not a valid ZIP archive: {e}")))?;

    let document_xml = read_part(&mut archive, "word/document.xml")?.ok_or_else(|| {
        DoctexError::ContainerError("missing word/document.xml".to_string())
    })?;
    let document_xml = String::from_utf8_lossy(&document_xml).into_owned();

    let styles_xml = read_part(&mut archive, "word/styles.xml")?
        .map(|b| String::from_utf8_lossy(&b).into_owned());

    let relationships = read_part(&mut archive, "word/_rels/document.xml.rels")?
        .map(|b| parse_relationships(&String::from_utf8_lossy(&b)))
        .unwrap_or_default();

    let mut media = HashMap::new();
    let mut embeddings = HashMap::new();
    let names: Vec<String> = archive.file_names().map(str::to_string).collect();
    for name in names {
        if let Some(bytes) = read_part(&mut archive, &name)? {
            if name.starts_with("word/media/") {
                media.insert(name, bytes);
            } else if name.starts_with("word/embeddings/") {
                embeddings.insert(name, bytes);
            }
        }
    }

    Ok(OpcPackage {
        document_xml,
        styles_xml,
        relationships,
        media,
        embeddings,
    })
}

fn read_part(archive: &mut ZipArchive<Cursor<Vec<u8>>>, name: &str) -> Result<Option<Vec<u8>>> {
    match archive.by_name(name) {
        Ok(mut file) => {
            let mut buf = Vec::new();
            file.read_to_end(&mut buf)?;
            Ok(Some(buf))
        }
        Err(zip::result::ZipError::FileNotFound) => Ok(None),
        Err(e) => Err(DoctexError::ContainerError(format!(
            "failed reading part {name}: {e}"
        ))),
    }
}

/// `r:id` → `Target` attribute, from a `.rels` part.
fn parse_relationships(xml: &str) -> HashMap<String, String> {
    let mut out = HashMap::new();
    if let Some(tree) = doctex_math::xmltree::parse_fragment(xml) {
        for rel in tree.children_named("Relationship") {
            if let (Some(id), Some(target)) = (rel.attr("Id"), rel.attr("Target")) {
                out.insert(id.to_string(), target.to_string());
            }
        }
    }
    out
}

/// Resolve a `.rels` `Target` (relative to `word/`) to a package part path.
#[must_use]
pub fn resolve_part_path(target: &str) -> String {
    if let Some(stripped) = target.strip_prefix('/') {
        stripped.to_string()
    } else {
        format!("word/{target}")
    }
}

/// If the manifest declares a macro-enabled main part, rewrite the
/// container in-memory: drop the VBA parts, patch the content-type
/// manifest and every relationships part. Returns the input bytes
/// unchanged for a macro-free container.
pub fn strip_macros(bytes: &[u8]) -> Result<Vec<u8>> {
    let mut archive = ZipArchive::new(Cursor::new(bytes.to_vec()))
        .map_err(|e| DoctexError::ContainerError(format!("not a valid ZIP archive: {e}")))?;
    let names: Vec<String> = archive.file_names().map(str::to_string).collect();
    let has_macro = names.iter().any(|n| n == VBA_PROJECT || n == VBA_DATA);
    if !has_macro {
        return Ok(bytes.to_vec());
    }

    tracing::debug!("macro-enabled container detected; stripping VBA parts");
    let mut out_buf = Vec::new();
    {
        let mut writer = ZipWriter::new(Cursor::new(&mut out_buf));
        for name in &names {
            if name == VBA_PROJECT || name == VBA_DATA {
                continue;
            }
            let mut file = archive.by_name(name).map_err(|e| {
                DoctexError::ContainerError(format!("failed reading part {name}: {e}"))
            })?;
            let mut buf = Vec::new();
            file.read_to_end(&mut buf)?;

            writer
                .start_file(name, SimpleFileOptions::default())
                .map_err(|e| DoctexError::ContainerError(e.to_string()))?;
            if name == "[Content_Types].xml" {
                let patched = patch_content_types(&String::from_utf8_lossy(&buf));
                writer.write_all(patched.as_bytes())?;
            } else if name.ends_with(".rels") {
                let patched = patch_rels(&String::from_utf8_lossy(&buf));
                writer.write_all(patched.as_bytes())?;
            } else {
                writer.write_all(&buf)?;
            }
        }
        writer
            .finish()
            .map_err(|e| DoctexError::ContainerError(e.to_string()))?;
    }
    Ok(out_buf)
}

static CONTENT_TYPES_OVERRIDE_RE: once_cell::sync::Lazy<Regex> = once_cell::sync::Lazy::new(|| {
    Regex::new(r#"<Override[^>]*PartName="[^"]*vba(Project|Data)[^"]*"[^>]*/>"#).unwrap()
});

static RELS_MACRO_RE: once_cell::sync::Lazy<Regex> = once_cell::sync::Lazy::new(|| {
    Regex::new(r#"<Relationship[^>]*Target="[^"]*vba(Project|Data)[^"]*"[^>]*/>"#).unwrap()
});

fn patch_content_types(xml: &str) -> String {
    let stripped = CONTENT_TYPES_OVERRIDE_RE.replace_all(xml, "");
    stripped.replace(MACRO_MIME, PLAIN_MIME)
}

fn patch_rels(xml: &str) -> String {
    RELS_MACRO_RE.replace_all(xml, "").into_owned()
}
