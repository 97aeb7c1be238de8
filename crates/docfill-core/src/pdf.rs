//! PDF text backend built on `lopdf`

use lopdf::Document;
use tracing::{debug, warn};

use crate::backend::PdfBackend;
use crate::error::DocfillError;

/// Page-by-page text extraction with lopdf
#[derive(Debug, Default, Clone, Copy)]
pub struct LopdfBackend;

impl PdfBackend for LopdfBackend {
    fn name(&self) -> &'static str {
        "lopdf"
    }

    fn page_texts(&self, bytes: &[u8]) -> Result<Vec<Option<String>>, DocfillError> {
        let doc = Document::load_mem(bytes).map_err(|e| DocfillError::ReadError(e.to_string()))?;

        if doc.is_encrypted() {
            return Err(DocfillError::ReadError(
                "PDF is encrypted; text cannot be extracted".to_string(),
            ));
        }

        let pages = doc.get_pages();
        debug!("Extracting text from {} PDF pages", pages.len());

        // get_pages is keyed by 1-based page number, so iteration is page order
        let texts = pages
            .keys()
            .map(|&page| match doc.extract_text(&[page]) {
                Ok(text) => {
                    let text = text.trim_end_matches(['\r', '\n']);
                    if text.trim().is_empty() {
                        None
                    } else {
                        Some(text.to_string())
                    }
                }
                Err(e) => {
                    warn!("No text extracted from page {}: {}", page, e);
                    None
                }
            })
            .collect();

        Ok(texts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Object, Stream};

    /// PDF whose pages show the given strings; `None` leaves a page blank
    fn create_test_pdf(pages: &[Option<&str>]) -> Vec<u8> {
        let mut doc = Document::with_version("1.7");
        let pages_id = doc.new_object_id();

        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut page_ids = Vec::new();
        for text in pages {
            let operations = match text {
                Some(text) => vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 12.into()]),
                    Operation::new("Td", vec![100.into(), 700.into()]),
                    Operation::new("Tj", vec![Object::string_literal(*text)]),
                    Operation::new("ET", vec![]),
                ],
                None => vec![],
            };
            let content = Content { operations };
            let content_id = doc.add_object(Stream::new(
                lopdf::Dictionary::new(),
                content.encode().unwrap(),
            ));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
                "Contents" => content_id,
                "Resources" => resources_id,
            });
            page_ids.push(page_id);
        }

        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Count" => page_ids.len() as i64,
                "Kids" => page_ids.iter().map(|id| Object::Reference(*id)).collect::<Vec<_>>(),
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buffer = Vec::new();
        doc.save_to(&mut buffer).unwrap();
        buffer
    }

    #[test]
    fn test_pages_in_order() {
        let pdf = create_test_pdf(&[Some("Primeira"), Some("Segunda")]);
        let texts = LopdfBackend.page_texts(&pdf).unwrap();
        assert_eq!(texts.len(), 2);
        assert!(texts[0].as_deref().unwrap().contains("Primeira"));
        assert!(texts[1].as_deref().unwrap().contains("Segunda"));
    }

    #[test]
    fn test_blank_page_is_none() {
        let pdf = create_test_pdf(&[Some("nome: Ana"), None]);
        let texts = LopdfBackend.page_texts(&pdf).unwrap();
        assert_eq!(texts.len(), 2);
        assert!(texts[0].is_some());
        assert_eq!(texts[1], None);
    }

    #[test]
    fn test_garbage_is_read_error() {
        let err = LopdfBackend.page_texts(b"not a pdf").unwrap_err();
        assert!(matches!(err, DocfillError::ReadError(_)));
    }
}
