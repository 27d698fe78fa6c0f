use std::io::{Cursor, Read};

use quick_xml::Reader;
use quick_xml::events::Event;

const DOCUMENT_PART: &str = "word/document.xml";

pub fn paragraphs(data: &[u8]) -> Result<String, String> {
    let mut archive = zip::ZipArchive::new(Cursor::new(data))
        .map_err(|err| format!("not a valid document archive: {err}"))?;

    let mut xml = String::new();

    archive.by_name(DOCUMENT_PART)
        .map_err(|err| format!("missing {DOCUMENT_PART}: {err}"))?
        .read_to_string(&mut xml)
        .map_err(|err| format!("failed to read {DOCUMENT_PART}: {err}"))?;

    from_xml(&xml)
}

fn from_xml(xml: &str) -> Result<String, String> {
    let mut reader = Reader::from_str(xml);
    let mut lines: Vec<String> = Vec::new();
    // open paragraphs, innermost last. textboxes nest a paragraph inside a
    // run of the outer one
    let mut open: Vec<String> = Vec::new();
    let mut in_text = false;

    loop {
        let event = reader.read_event()
            .map_err(|err| format!("malformed document xml at {}: {err}", reader.buffer_position()))?;

        match event {
            Event::Start(e) => match e.local_name().as_ref() {
                b"p" => open.push(String::new()),
                b"t" => in_text = true,
                _ => {}
            },
            Event::Empty(e) => match (e.local_name().as_ref(), open.last_mut()) {
                (b"p", _) => lines.push(String::new()),
                (b"tab", Some(current)) => current.push('\t'),
                (b"br" | b"cr", Some(current)) => current.push('\n'),
                _ => {}
            },
            Event::Text(t) if in_text => {
                let text = t.unescape()
                    .map_err(|err| format!("bad text in document xml: {err}"))?;

                if let Some(current) = open.last_mut() {
                    current.push_str(&text);
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"p" => {
                    if let Some(done) = open.pop() {
                        lines.push(done);
                    }
                }
                b"t" => in_text = false,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(lines.join("\n"))
}
