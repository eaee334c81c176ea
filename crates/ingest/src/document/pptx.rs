//! Slide-deck extraction from the `.pptx` zip container.

use std::io::{Cursor, Read};

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use quickprep_core::{Block, TextRun};
use regex::Regex;

use super::ExtractionError;

type Archive = zip::ZipArchive<Cursor<Vec<u8>>>;

fn read_part(archive: &mut Archive, name: &str) -> Option<String> {
    let mut file = archive.by_name(name).ok()?;
    let mut xml = String::new();
    file.read_to_string(&mut xml).ok()?;
    Some(xml)
}

/// Slide part names in presentation order.
///
/// Order comes from `p:sldIdLst` in `ppt/presentation.xml` resolved through its
/// relationships. If that is missing or resolves nothing, slides are ordered
/// by the number in `ppt/slides/slideN.xml`.
fn slide_order(archive: &mut Archive) -> Vec<String> {
    let from_presentation = match (
        read_part(archive, "ppt/presentation.xml"),
        read_part(archive, "ppt/_rels/presentation.xml.rels"),
    ) {
        (Some(pres), Some(rels)) => ordered_from_presentation(&pres, &rels).unwrap_or_else(|e| {
            tracing::warn!("Unreadable presentation order, using slide numbers: {}", e);
            Vec::new()
        }),
        _ => Vec::new(),
    };

    let ordered: Vec<String> = from_presentation
        .into_iter()
        .filter(|name| archive.by_name(name).is_ok())
        .collect();
    if !ordered.is_empty() {
        return ordered;
    }

    numeric_slide_order(archive.file_names())
}

/// Unescaped value of attribute `key` (qualified name, e.g. `r:id`).
fn attr(e: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == key)
        .and_then(|a| a.unescape_value().ok())
        .map(|v| v.into_owned())
}

/// Every start or empty tag named `name`, in document order.
fn elements(xml: &str, name: &[u8]) -> Result<Vec<BytesStart<'static>>, quick_xml::Error> {
    let mut reader = Reader::from_str(xml);
    let mut found = Vec::new();
    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) if e.name().as_ref() == name => {
                found.push(e.into_owned())
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(found)
}

fn ordered_from_presentation(presentation: &str, rels: &str) -> Result<Vec<String>, quick_xml::Error> {
    let targets: Vec<(String, String)> = elements(rels, b"Relationship")?
        .iter()
        .filter_map(|e| Some((attr(e, b"Id")?, resolve_target(&attr(e, b"Target")?))))
        .collect();

    Ok(elements(presentation, b"p:sldId")?
        .iter()
        .filter_map(|e| {
            let rid = attr(e, b"r:id")?;
            targets
                .iter()
                .find(|(id, _)| *id == rid)
                .map(|(_, target)| target.clone())
        })
        .collect())
}

/// Relationship targets are relative to `ppt/` unless absolute.
fn resolve_target(target: &str) -> String {
    match target.strip_prefix('/') {
        Some(abs) => abs.to_string(),
        None => format!("ppt/{}", target.trim_start_matches("./")),
    }
}

fn numeric_slide_order<'a>(names: impl Iterator<Item = &'a str>) -> Vec<String> {
    let Ok(re) = Regex::new(r"^ppt/slides/slide(\d+)\.xml$") else {
        return Vec::new();
    };
    let mut slides: Vec<(u32, String)> = names
        .filter_map(|name| {
            let n = re.captures(name)?.get(1)?.as_str().parse().ok()?;
            Some((n, name.to_string()))
        })
        .collect();
    slides.sort_by_key(|(n, _)| *n);
    slides.into_iter().map(|(_, name)| name).collect()
}

/// Walk state for one slide part.
#[derive(Default)]
struct SlideWalk {
    stack: Vec<Vec<u8>>,
    in_text_body: bool,
    paragraph: Option<Vec<TextRun>>,
    run: Option<TextRun>,
    in_t: bool,
    blocks: Vec<Block>,
}

impl SlideWalk {
    fn open(&mut self, e: &BytesStart<'_>) {
        match e.name().as_ref() {
            b"p:txBody" if self.is_top_level_shape() => self.in_text_body = true,
            b"a:p" if self.in_text_body => self.paragraph = Some(Vec::new()),
            b"a:r" | b"a:fld" if self.paragraph.is_some() => self.run = Some(TextRun::default()),
            b"a:rPr" => {
                if let Some(run) = self.run.as_mut() {
                    run.bold = matches!(attr(e, b"b").as_deref(), Some("1") | Some("true"));
                    run.font_size = attr(e, b"sz")
                        .and_then(|sz| sz.parse::<f32>().ok())
                        .map(|hundredths| hundredths / 100.0);
                }
            }
            b"a:t" if self.run.is_some() => self.in_t = true,
            b"a:br" => {
                if let Some(p) = self.paragraph.as_mut() {
                    p.push(TextRun::plain("\n"));
                }
            }
            _ => {}
        }
    }

    fn close(&mut self, name: &[u8]) {
        match name {
            b"a:t" => self.in_t = false,
            b"a:r" | b"a:fld" => {
                if let (Some(run), Some(p)) = (self.run.take(), self.paragraph.as_mut()) {
                    p.push(run);
                }
            }
            b"a:p" => {
                if let Some(runs) = self.paragraph.take() {
                    self.blocks.push(Block::new(runs));
                }
            }
            b"p:txBody" => self.in_text_body = false,
            _ => {}
        }
        self.stack.pop();
    }

    fn text(&mut self, text: &str) {
        if self.in_t {
            if let Some(run) = self.run.as_mut() {
                run.text.push_str(text);
            }
        }
    }

    fn is_top_level_shape(&self) -> bool {
        matches!(self.stack.as_slice(), [.., parent, shape] if parent == b"p:spTree" && shape == b"p:sp")
    }
}

/// Paragraphs of every top-level text shape on a slide, in document order.
///
/// Shapes nested in groups and tables are not visited. Each `a:r` and `a:fld`
/// becomes a run carrying `b` and `sz` from its `a:rPr`; `a:br` becomes a
/// newline run.
pub(crate) fn slide_blocks(xml: &str) -> Result<Vec<Block>, quick_xml::Error> {
    let mut reader = Reader::from_str(xml);
    let mut walk = SlideWalk::default();

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                walk.open(&e);
                walk.stack.push(e.name().as_ref().to_vec());
            }
            Event::Empty(e) => walk.open(&e),
            Event::End(e) => walk.close(e.name().as_ref()),
            Event::Text(e) => walk.text(&e.unescape()?),
            Event::CData(e) => walk.text(&String::from_utf8_lossy(&e)),
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(walk.blocks)
}

/// Extract paragraph blocks from every slide of a `.pptx`, in slide order.
pub fn extract_pptx(bytes: &[u8]) -> Result<Vec<Block>, ExtractionError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes.to_vec()))
        .map_err(|e| ExtractionError::PptxError(format!("Invalid PPTX archive: {e}")))?;

    let slides = slide_order(&mut archive);
    if slides.is_empty() {
        return Err(ExtractionError::PptxError("No slides found in PPTX".into()));
    }

    let mut blocks = Vec::new();
    for name in &slides {
        let Some(xml) = read_part(&mut archive, name) else {
            tracing::warn!(slide = %name, "Skipping unreadable slide");
            continue;
        };
        match slide_blocks(&xml) {
            Ok(slide) => blocks.extend(slide),
            Err(e) => tracing::warn!(slide = %name, "Skipping malformed slide: {}", e),
        }
    }

    tracing::debug!(slides = slides.len(), blocks = blocks.len(), "Parsed slide deck");
    Ok(blocks)
}
