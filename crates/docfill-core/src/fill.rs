//! `{{key}}` substitution in DOCX templates
//!
//! Each reachable paragraph is handled as a single string: the text of all of
//! its runs is concatenated, every known placeholder is replaced, and the
//! paragraph is rewritten only when the text changed. Rewriting collapses the
//! paragraph to one plain run, so placeholders split across runs are found
//! but run-level formatting of rewritten paragraphs is not kept.

use std::collections::BTreeSet;

use serde::Serialize;
use tracing::{debug, info};

use crate::backend::Backends;
use crate::error::DocfillError;
use crate::keyvalue::KeyValues;
use crate::placeholder::{find_placeholders, placeholder};

/// What a fill pass did to the template
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FillReport {
    pub visited_paragraphs: usize,
    pub rewritten_paragraphs: usize,
    /// Placeholder occurrences replaced across all paragraphs
    pub replacements: usize,
    /// Keys of `{{...}}` markers left in the document, sorted
    pub unresolved_placeholders: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct TemplateFiller {
    backends: Backends,
}

impl TemplateFiller {
    pub fn new(backends: Backends) -> Self {
        Self { backends }
    }

    pub fn fill(&self, template: &[u8], values: &KeyValues) -> Result<Vec<u8>, DocfillError> {
        self.fill_with_report(template, values).map(|(bytes, _)| bytes)
    }

    pub fn fill_with_report(
        &self,
        template: &[u8],
        values: &KeyValues,
    ) -> Result<(Vec<u8>, FillReport), DocfillError> {
        let mut document = self.backends.document.open(template)?;

        let markers: Vec<(String, &str)> = values
            .iter()
            .map(|(key, value)| (placeholder(key), value))
            .collect();

        let mut report = FillReport::default();
        let mut unresolved = BTreeSet::new();

        let rewritten = document.rewrite_paragraphs(&mut |original| {
            report.visited_paragraphs += 1;
            let (text, replaced) = substitute(original, &markers);
            report.replacements += replaced;
            unresolved.extend(find_placeholders(&text));

            (text != original).then_some(text)
        });

        report.rewritten_paragraphs = rewritten;
        report.unresolved_placeholders = unresolved.into_iter().collect();

        let bytes = document.save()?;

        info!(
            "Filled template: {} of {} paragraphs rewritten, {} replacements",
            report.rewritten_paragraphs, report.visited_paragraphs, report.replacements
        );
        if !report.unresolved_placeholders.is_empty() {
            debug!("Unresolved placeholders: {:?}", report.unresolved_placeholders);
        }

        Ok((bytes, report))
    }
}

/// Apply every marker in key order; returns the new text and the number of
/// occurrences replaced
fn substitute(text: &str, markers: &[(String, &str)]) -> (String, usize) {
    let mut current = text.to_string();
    let mut replaced = 0;

    for (marker, value) in markers {
        let count = current.matches(marker.as_str()).count();
        if count > 0 {
            current = current.replace(marker.as_str(), value);
            replaced += count;
        }
    }

    (current, replaced)
}

/// Fill `template` with `values` using the given backends
pub fn fill_template(
    backends: &Backends,
    template: &[u8],
    values: &KeyValues,
) -> Result<Vec<u8>, DocfillError> {
    TemplateFiller::new(backends.clone()).fill(template, values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{DocumentBackend, DocumentModel};
    use pretty_assertions::assert_eq;
    use std::sync::{Arc, Mutex};

    /// Paragraph list that records rewrites, shared with the test through a mutex
    #[derive(Clone, Default)]
    struct MemoryDocument {
        paragraphs: Arc<Mutex<Vec<String>>>,
    }

    impl DocumentModel for MemoryDocument {
        fn paragraph_texts(&self) -> Vec<String> {
            self.paragraphs.lock().unwrap().clone()
        }

        fn table_cell_texts(&self) -> Vec<String> {
            Vec::new()
        }

        fn rewrite_paragraphs(&mut self, edit: &mut dyn FnMut(&str) -> Option<String>) -> usize {
            let mut paragraphs = self.paragraphs.lock().unwrap();
            let mut count = 0;
            for paragraph in paragraphs.iter_mut() {
                if let Some(updated) = edit(paragraph) {
                    *paragraph = updated;
                    count += 1;
                }
            }
            count
        }

        fn save(&mut self) -> Result<Vec<u8>, DocfillError> {
            Ok(self.paragraphs.lock().unwrap().join("\n").into_bytes())
        }
    }

    struct MemoryBackend(MemoryDocument);

    impl DocumentBackend for MemoryBackend {
        fn name(&self) -> &'static str {
            "memory"
        }

        fn open(&self, _bytes: &[u8]) -> Result<Box<dyn DocumentModel>, DocfillError> {
            Ok(Box::new(self.0.clone()))
        }
    }

    fn memory_filler(paragraphs: &[&str]) -> TemplateFiller {
        let document = MemoryDocument {
            paragraphs: Arc::new(Mutex::new(
                paragraphs.iter().map(|p| p.to_string()).collect(),
            )),
        };
        TemplateFiller::new(Backends::unavailable().with_document(Arc::new(MemoryBackend(document))))
    }

    fn values(entries: &[(&str, &str)]) -> KeyValues {
        entries.iter().copied().collect()
    }

    #[test]
    fn test_substitute_counts_occurrences() {
        let markers = vec![("{{a}}".to_string(), "1")];
        assert_eq!(substitute("{{a}} e {{a}}", &markers), ("1 e 1".to_string(), 2));
        assert_eq!(substitute("nada", &markers), ("nada".to_string(), 0));
    }

    #[test]
    fn test_report_counts() {
        let filler = memory_filler(&["Olá {{nome}}", "sem marcador", "{{nome}} {{cargo}}"]);
        let (bytes, report) = filler
            .fill_with_report(b"", &values(&[("nome", "Ana")]))
            .unwrap();

        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            "Olá Ana\nsem marcador\nAna {{cargo}}"
        );
        assert_eq!(
            report,
            FillReport {
                visited_paragraphs: 3,
                rewritten_paragraphs: 2,
                replacements: 2,
                unresolved_placeholders: vec!["cargo".to_string()],
            }
        );
    }

    #[test]
    fn test_unchanged_paragraphs_not_rewritten() {
        let filler = memory_filler(&["{{outro}}"]);
        let (_, report) = filler
            .fill_with_report(b"", &values(&[("nome", "Ana")]))
            .unwrap();
        assert_eq!(report.rewritten_paragraphs, 0);
        assert_eq!(report.unresolved_placeholders, vec!["outro"]);
    }

    #[test]
    fn test_keys_applied_in_order() {
        // "a" runs before "b", so a marker produced by "a" is replaced by "b"
        let filler = memory_filler(&["{{a}}"]);
        let bytes = filler
            .fill(b"", &values(&[("a", "{{b}}"), ("b", "fim")]))
            .unwrap();
        assert_eq!(bytes, b"fim");
    }

    #[test]
    fn test_missing_document_backend() {
        let filler = TemplateFiller::new(Backends::unavailable());
        let err = filler.fill(b"PK", &values(&[("a", "1")])).unwrap_err();
        assert!(matches!(err, DocfillError::MissingDependency(_)));
    }

    #[cfg(feature = "ooxml")]
    mod docx {
        use super::*;
        use crate::extract::extract_text;
        use crate::fixtures::DocxBuilder;
        use crate::ooxml::WordDocument;
        use pretty_assertions::assert_eq;

        fn fill_docx(bytes: &[u8], pairs: &[(&str, &str)]) -> Vec<u8> {
            fill_template(&Backends::default(), bytes, &values(pairs)).unwrap()
        }

        fn text_of(bytes: &[u8]) -> String {
            extract_text(&Backends::default(), bytes, "docx").unwrap()
        }

        #[test]
        fn test_fill_round_trip() {
            let template = DocxBuilder::new()
                .paragraph("Hello {{name}}, your id is {{id}}.")
                .build();
            let filled = fill_docx(&template, &[("name", "Ana"), ("id", "42")]);
            assert_eq!(text_of(&filled), "Hello Ana, your id is 42.");
        }

        #[test]
        fn test_unknown_placeholders_left_verbatim() {
            let template = DocxBuilder::new()
                .paragraph("{{name}} / {{unknown}}")
                .build();
            let filled = fill_docx(&template, &[("name", "Ana")]);
            assert_eq!(text_of(&filled), "Ana / {{unknown}}");
        }

        #[test]
        fn test_placeholder_split_across_runs() {
            let template = DocxBuilder::new()
                .runs(&["Cliente: {{no", "me}}"])
                .build();
            let filled = fill_docx(&template, &[("nome", "Ana")]);
            assert_eq!(text_of(&filled), "Cliente: Ana");
        }

        #[test]
        fn test_fill_twice_is_noop() {
            let template = DocxBuilder::new()
                .paragraph("{{a}} e {{b}}")
                .table(vec![vec!["{{a}}", "fixo"]])
                .build();
            let pairs = [("a", "1"), ("b", "2")];
            let once = fill_docx(&template, &pairs);
            let twice = fill_docx(&once, &pairs);
            assert_eq!(text_of(&once), text_of(&twice));
        }

        #[test]
        fn test_fills_table_cells_headers_and_footers() {
            let template = DocxBuilder::new()
                .paragraph("corpo {{x}}")
                .table(vec![vec!["celula {{x}}"]])
                .header("cabecalho {{x}}")
                .footer("rodape {{x}}")
                .build();
            let (filled, report) = TemplateFiller::default()
                .fill_with_report(&template, &values(&[("x", "ok")]))
                .unwrap();

            assert_eq!(report.rewritten_paragraphs, 4);
            assert_eq!(report.replacements, 4);
            assert_eq!(text_of(&filled), "corpo ok\ncelula ok");

            let doc = WordDocument::open(&filled).unwrap();
            assert_eq!(doc.header_footer_texts(), vec!["cabecalho ok", "rodape ok"]);
        }

        #[test]
        fn test_merged_cell_filled_once() {
            let template = DocxBuilder::new()
                .raw_body(
                    r#"<w:tbl><w:tblGrid><w:gridCol/><w:gridCol/></w:tblGrid><w:tr>
                    <w:tc><w:tcPr><w:gridSpan w:val="2"/></w:tcPr><w:p><w:r><w:t>{{x}}</w:t></w:r></w:p></w:tc>
                    </w:tr></w:tbl>"#,
                )
                .build();
            let (filled, report) = TemplateFiller::default()
                .fill_with_report(&template, &values(&[("x", "1")]))
                .unwrap();
            assert_eq!(report.visited_paragraphs, 1);
            assert_eq!(text_of(&filled), "1\n1");
        }

        #[test]
        fn test_untouched_paragraph_keeps_formatting() {
            let template = DocxBuilder::new()
                .raw_body(
                    r#"<w:p><w:r><w:rPr><w:b/></w:rPr><w:t>negrito</w:t></w:r></w:p>
                    <w:p><w:r><w:rPr><w:i/></w:rPr><w:t>{{x}}</w:t></w:r></w:p>"#,
                )
                .build();
            let filled = fill_docx(&template, &[("x", "1")]);

            let document = DocxBuilder::document_xml(&filled);
            assert!(document.contains("<w:r><w:rPr><w:b/></w:rPr><w:t>negrito</w:t></w:r>"));
            assert!(!document.contains("<w:i/>"));
        }

        #[test]
        fn test_other_parts_copied_unchanged() {
            let template = DocxBuilder::new().paragraph("{{x}}").build();
            let filled = fill_docx(&template, &[("x", "1")]);
            assert_eq!(
                DocxBuilder::part(&filled, "[Content_Types].xml"),
                DocxBuilder::part(&template, "[Content_Types].xml")
            );
        }

        #[test]
        fn test_value_with_markup_and_newline() {
            let template = DocxBuilder::new().paragraph("{{endereco}}").build();
            let filled = fill_docx(&template, &[("endereco", "Rua A & B\nApto <3>")]);
            assert_eq!(text_of(&filled), "Rua A & B\nApto <3>");
        }
    }
}
