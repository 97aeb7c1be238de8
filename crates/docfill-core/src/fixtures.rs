//! In-memory DOCX builder for tests
//!
//! Produces the smallest package Word accepts: content types, package
//! relationships, the main document and optional default header/footer.

use std::io::{Cursor, Read, Write};

use quick_xml::escape::escape;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

const NAMESPACES: &str = r#"xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships""#;
const REL_BASE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

#[derive(Debug, Clone, Default)]
pub struct DocxBuilder {
    body: Vec<String>,
    header: Option<String>,
    footer: Option<String>,
}

impl DocxBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Body paragraph with a single run
    pub fn paragraph(self, text: &str) -> Self {
        self.runs(&[text])
    }

    /// Body paragraph with one run per entry
    pub fn runs(mut self, runs: &[&str]) -> Self {
        self.body.push(paragraph_xml(runs));
        self
    }

    /// Body table, one inner vector per row
    pub fn table(mut self, rows: Vec<Vec<&str>>) -> Self {
        let cols = rows.iter().map(Vec::len).max().unwrap_or(0);
        let mut xml = String::from("<w:tbl><w:tblPr/><w:tblGrid>");
        for _ in 0..cols {
            xml.push_str("<w:gridCol/>");
        }
        xml.push_str("</w:tblGrid>");
        for row in rows {
            xml.push_str("<w:tr>");
            for cell in row {
                xml.push_str("<w:tc>");
                xml.push_str(&paragraph_xml(&[cell]));
                xml.push_str("</w:tc>");
            }
            xml.push_str("</w:tr>");
        }
        xml.push_str("</w:tbl>");
        self.body.push(xml);
        self
    }

    /// Verbatim WordprocessingML appended to the body
    pub fn raw_body(mut self, xml: &str) -> Self {
        self.body.push(xml.to_string());
        self
    }

    /// Default header (relationship id `rIdHeader1`)
    pub fn header(mut self, text: &str) -> Self {
        self.header = Some(text.to_string());
        self
    }

    /// Default footer (relationship id `rIdFooter1`)
    pub fn footer(mut self, text: &str) -> Self {
        self.footer = Some(text.to_string());
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        let mut add = |name: &str, content: &str| {
            writer.start_file(name, options).unwrap();
            writer.write_all(content.as_bytes()).unwrap();
        };

        add("[Content_Types].xml", &self.content_types());
        add(
            "_rels/.rels",
            &relationships(&[("rId1", "officeDocument", "word/document.xml")]),
        );
        add("word/document.xml", &self.document());
        add("word/_rels/document.xml.rels", &self.document_rels());
        if let Some(text) = &self.header {
            add("word/header1.xml", &story_xml("hdr", text));
        }
        if let Some(text) = &self.footer {
            add("word/footer1.xml", &story_xml("ftr", text));
        }

        writer.finish().unwrap().into_inner()
    }

    /// Raw bytes of a part of a built (or filled) package
    pub fn part(docx: &[u8], name: &str) -> Option<Vec<u8>> {
        let mut archive = ZipArchive::new(Cursor::new(docx)).ok()?;
        let mut file = archive.by_name(name).ok()?;
        let mut data = Vec::new();
        file.read_to_end(&mut data).ok()?;
        Some(data)
    }

    /// The main document XML of a package, as a string
    pub fn document_xml(docx: &[u8]) -> String {
        Self::part(docx, "word/document.xml")
            .map(|data| String::from_utf8_lossy(&data).into_owned())
            .unwrap_or_default()
    }

    fn content_types(&self) -> String {
        let mut xml = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>"#,
        );
        if self.header.is_some() {
            xml.push_str(r#"<Override PartName="/word/header1.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.header+xml"/>"#);
        }
        if self.footer.is_some() {
            xml.push_str(r#"<Override PartName="/word/footer1.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.footer+xml"/>"#);
        }
        xml.push_str("</Types>");
        xml
    }

    fn document(&self) -> String {
        let mut sect = String::from("<w:sectPr>");
        if self.header.is_some() {
            sect.push_str(r#"<w:headerReference w:type="default" r:id="rIdHeader1"/>"#);
        }
        if self.footer.is_some() {
            sect.push_str(r#"<w:footerReference w:type="default" r:id="rIdFooter1"/>"#);
        }
        sect.push_str(r#"<w:pgSz w:w="11906" w:h="16838"/></w:sectPr>"#);

        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document {NAMESPACES}><w:body>{}{sect}</w:body></w:document>"#,
            self.body.concat()
        )
    }

    fn document_rels(&self) -> String {
        let mut rels = Vec::new();
        if self.header.is_some() {
            rels.push(("rIdHeader1", "header", "header1.xml"));
        }
        if self.footer.is_some() {
            rels.push(("rIdFooter1", "footer", "footer1.xml"));
        }
        relationships(&rels)
    }
}

fn paragraph_xml(runs: &[&str]) -> String {
    let mut xml = String::from("<w:p>");
    for run in runs {
        xml.push_str(r#"<w:r><w:t xml:space="preserve">"#);
        xml.push_str(&escape(*run));
        xml.push_str("</w:t></w:r>");
    }
    xml.push_str("</w:p>");
    xml
}

fn story_xml(root: &str, text: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:{root} {NAMESPACES}>{}</w:{root}>"#,
        paragraph_xml(&[text])
    )
}

fn relationships(rels: &[(&str, &str, &str)]) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    );
    for (id, kind, target) in rels {
        xml.push_str(&format!(
            r#"<Relationship Id="{id}" Type="{REL_BASE}/{kind}" Target="{target}"/>"#
        ));
    }
    xml.push_str("</Relationships>");
    xml
}
