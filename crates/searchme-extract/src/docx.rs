//! Word documents: paragraph count and text from `word/document.xml`.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::ExtractError;
use crate::text::truncate_bytes;

const DOCUMENT_PART: &str = "word/document.xml";

#[derive(Debug, Default, Clone, PartialEq)]
pub struct DocxInfo {
    pub paragraph_count: u32,
    /// Paragraph texts joined by newlines
    pub content: String,
}

pub fn probe(path: &Path, max_text_bytes: u64) -> Result<DocxInfo, ExtractError> {
    let file = File::open(path).map_err(|source| ExtractError::Unreadable {
        path: path.to_path_buf(),
        source,
    })?;
    let mut archive = zip::ZipArchive::new(file).map_err(|e| ExtractError::failed(path, e))?;
    let mut part = archive
        .by_name(DOCUMENT_PART)
        .map_err(|e| ExtractError::failed(path, e))?;

    let mut xml = String::new();
    part.read_to_string(&mut xml)
        .map_err(|e| ExtractError::failed(path, e))?;

    let mut info = parse_document(&xml).map_err(|e| ExtractError::failed(path, e))?;
    info.content = truncate_bytes(info.content, max_text_bytes);
    Ok(info)
}

fn parse_document(xml: &str) -> Result<DocxInfo, quick_xml::Error> {
    let mut reader = Reader::from_str(xml);
    let mut paragraphs: Vec<String> = Vec::new();
    let mut current: Option<String> = None;
    let mut in_text = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.name().as_ref() {
                b"w:p" => current = Some(String::new()),
                b"w:t" => in_text = true,
                _ => {}
            },
            Event::Empty(e) => match e.name().as_ref() {
                b"w:p" => paragraphs.push(String::new()),
                b"w:tab" => {
                    if let Some(p) = current.as_mut() {
                        p.push('\t');
                    }
                }
                _ => {}
            },
            Event::Text(t) if in_text => {
                if let Some(p) = current.as_mut() {
                    p.push_str(&t.unescape()?);
                }
            }
            Event::End(e) => match e.name().as_ref() {
                b"w:t" => in_text = false,
                b"w:p" => paragraphs.extend(current.take()),
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(DocxInfo {
        paragraph_count: paragraphs.len() as u32,
        content: paragraphs.join("\n"),
    })
}
