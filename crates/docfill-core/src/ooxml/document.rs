//! WordprocessingML document model
//!
//! Loads the main document part and the default header/footer parts of every
//! section, exposes paragraph and table-cell text, and writes modified parts
//! back into the package.

use std::collections::{HashMap, HashSet};

use tracing::{debug, warn};

use super::package::{rels_part_name, resolve_target, Package};
use super::paragraph::{paragraph_text, set_paragraph_text};
use super::xml::{XmlElement, XmlTree};
use crate::backend::DocumentModel;
use crate::error::DocfillError;

const OFFICE_DOCUMENT_REL: &str = "/officeDocument";
const DEFAULT_MAIN_PART: &str = "word/document.xml";

#[derive(Debug, Clone)]
struct LoadedPart {
    name: String,
    tree: XmlTree,
    dirty: bool,
}

/// An opened `.docx` file
#[derive(Debug, Clone)]
pub struct WordDocument {
    package: Package,
    main: LoadedPart,
    /// Default headers then footers, each part once, in section order
    headers_footers: Vec<LoadedPart>,
}

impl WordDocument {
    pub fn open(bytes: &[u8]) -> Result<Self, DocfillError> {
        let package = Package::from_bytes(bytes)?;
        let main_name = main_part_name(&package)?;

        let main_bytes = package.part(&main_name).ok_or_else(|| {
            DocfillError::ReadError(format!("Main document part {} is missing", main_name))
        })?;
        let main_tree = XmlTree::parse(main_bytes)?;
        if main_tree.root().child(b"body").is_none() {
            return Err(DocfillError::ReadError(
                "Document part has no w:body element".to_string(),
            ));
        }

        let relationships = load_relationships(&package, &main_name)?;
        let mut headers_footers = Vec::new();
        for target in section_header_footer_targets(&main_tree, &relationships) {
            let part_name = resolve_target(&main_name, &target);
            match package.part(&part_name) {
                Some(bytes) => headers_footers.push(LoadedPart {
                    name: part_name,
                    tree: XmlTree::parse(bytes)?,
                    dirty: false,
                }),
                None => warn!("Header/footer part {} referenced but missing", part_name),
            }
        }

        debug!(
            "Opened DOCX: main part {}, {} header/footer parts",
            main_name,
            headers_footers.len()
        );

        Ok(Self {
            package,
            main: LoadedPart {
                name: main_name,
                tree: main_tree,
                dirty: false,
            },
            headers_footers,
        })
    }

    fn body(&self) -> Option<&XmlElement> {
        self.main.tree.root().child(b"body")
    }

    /// Names of the header and footer parts visited when filling
    pub fn header_footer_parts(&self) -> impl Iterator<Item = &str> {
        self.headers_footers.iter().map(|p| p.name.as_str())
    }

    /// Text of every direct paragraph of each default header/footer part
    pub fn header_footer_texts(&self) -> Vec<String> {
        self.headers_footers
            .iter()
            .flat_map(|part| part.tree.root().children_named(b"p").map(paragraph_text))
            .collect()
    }
}

impl DocumentModel for WordDocument {
    fn paragraph_texts(&self) -> Vec<String> {
        self.body()
            .map(|body| body.children_named(b"p").map(paragraph_text).collect())
            .unwrap_or_default()
    }

    fn table_cell_texts(&self) -> Vec<String> {
        let Some(body) = self.body() else {
            return Vec::new();
        };

        let mut texts = Vec::new();
        for table in body.children_named(b"tbl") {
            for (row, col) in grid_cell_positions(table) {
                if let Some(cell) = cell_at(table, row, col) {
                    texts.push(cell_text(cell));
                }
            }
        }
        texts
    }

    fn rewrite_paragraphs(&mut self, edit: &mut dyn FnMut(&str) -> Option<String>) -> usize {
        let mut rewritten = 0;

        if let Some(body) = self.main.tree.root_mut().child_mut(b"body") {
            for paragraph in body.child_elements_mut().filter(|el| el.is(b"p")) {
                if rewrite(paragraph, edit) {
                    rewritten += 1;
                }
            }

            for table in body.child_elements_mut().filter(|el| el.is(b"tbl")) {
                rewritten += rewrite_table(table, edit);
            }
        }
        if rewritten > 0 {
            self.main.dirty = true;
        }

        for part in &mut self.headers_footers {
            let mut part_rewritten = 0;
            for paragraph in part
                .tree
                .root_mut()
                .child_elements_mut()
                .filter(|el| el.is(b"p"))
            {
                if rewrite(paragraph, edit) {
                    part_rewritten += 1;
                }
            }
            if part_rewritten > 0 {
                part.dirty = true;
                rewritten += part_rewritten;
            }
        }

        rewritten
    }

    fn save(&mut self) -> Result<Vec<u8>, DocfillError> {
        for part in std::iter::once(&self.main).chain(self.headers_footers.iter()) {
            if part.dirty {
                self.package.set_part(&part.name, part.tree.to_bytes()?);
            }
        }
        self.package.to_bytes()
    }
}

fn rewrite(paragraph: &mut XmlElement, edit: &mut dyn FnMut(&str) -> Option<String>) -> bool {
    let original = paragraph_text(paragraph);
    match edit(&original) {
        Some(updated) if updated != original => {
            set_paragraph_text(paragraph, &updated);
            true
        }
        _ => false,
    }
}

fn rewrite_table(table: &mut XmlElement, edit: &mut dyn FnMut(&str) -> Option<String>) -> usize {
    let mut seen = HashSet::new();
    let positions: Vec<(usize, usize)> = grid_cell_positions(table)
        .into_iter()
        .filter(|pos| seen.insert(*pos))
        .collect();

    let mut rewritten = 0;
    for (row, col) in positions {
        let Some(cell) = cell_at_mut(table, row, col) else {
            continue;
        };
        for paragraph in cell.child_elements_mut().filter(|el| el.is(b"p")) {
            if rewrite(paragraph, edit) {
                rewritten += 1;
            }
        }
    }
    rewritten
}

/// Cell text: its direct paragraphs joined by newlines
fn cell_text(cell: &XmlElement) -> String {
    cell.children_named(b"p")
        .map(paragraph_text)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Grid cells of a table as `(row, cell)` indices, row-major.
///
/// A cell spanning several grid columns appears once per column; a vertically
/// merged continuation cell resolves to the cell one grid row above. A span
/// never reaches past the last `tblGrid` column, and is ignored when the table
/// declares no grid.
fn grid_cell_positions(table: &XmlElement) -> Vec<(usize, usize)> {
    let col_count = table
        .child(b"tblGrid")
        .map(|grid| grid.children_named(b"gridCol").count())
        .unwrap_or(0);

    let mut cells: Vec<(usize, usize)> = Vec::new();
    for (row_idx, row) in table.children_named(b"tr").enumerate() {
        let mut grid_col = 0;
        for (cell_idx, cell) in row.children_named(b"tc").enumerate() {
            let props = cell.child(b"tcPr");
            let span = props
                .and_then(|p| p.child(b"gridSpan"))
                .and_then(|g| g.attribute(b"val"))
                .and_then(|v| v.parse::<usize>().ok())
                .unwrap_or(1)
                .min(col_count.saturating_sub(grid_col))
                .max(1);
            let continues = props
                .and_then(|p| p.child(b"vMerge"))
                .map(|m| m.attribute(b"val").as_deref() != Some("restart"))
                .unwrap_or(false);

            for span_idx in 0..span {
                if continues && col_count > 0 && cells.len() >= col_count {
                    cells.push(cells[cells.len() - col_count]);
                } else if span_idx > 0 {
                    cells.push(cells[cells.len() - 1]);
                } else {
                    cells.push((row_idx, cell_idx));
                }
            }
            grid_col += span;
        }
    }
    cells
}

fn cell_at(table: &XmlElement, row: usize, col: usize) -> Option<&XmlElement> {
    table
        .children_named(b"tr")
        .nth(row)?
        .children_named(b"tc")
        .nth(col)
}

fn cell_at_mut(table: &mut XmlElement, row: usize, col: usize) -> Option<&mut XmlElement> {
    table
        .child_elements_mut()
        .filter(|el| el.is(b"tr"))
        .nth(row)?
        .child_elements_mut()
        .filter(|el| el.is(b"tc"))
        .nth(col)
}

/// Locate the main document part through the package relationships
fn main_part_name(package: &Package) -> Result<String, DocfillError> {
    let relationships = load_relationships(package, "")?;
    let from_rels = relationships
        .values()
        .find(|rel| rel.kind.ends_with(OFFICE_DOCUMENT_REL))
        .map(|rel| resolve_target("", &rel.target));

    Ok(from_rels.unwrap_or_else(|| DEFAULT_MAIN_PART.to_string()))
}

#[derive(Debug, Clone)]
struct Relationship {
    kind: String,
    target: String,
}

/// Internal relationships of a part, keyed by id. A missing rels part is empty.
fn load_relationships(
    package: &Package,
    source_part: &str,
) -> Result<HashMap<String, Relationship>, DocfillError> {
    let Some(bytes) = package.part(&rels_part_name(source_part)) else {
        return Ok(HashMap::new());
    };

    let tree = XmlTree::parse(bytes)?;
    let mut relationships = HashMap::new();
    for rel in tree.root().children_named(b"Relationship") {
        if rel.attribute(b"TargetMode").as_deref() == Some("External") {
            continue;
        }
        let (Some(id), Some(target)) = (rel.attribute(b"Id"), rel.attribute(b"Target")) else {
            continue;
        };
        relationships.insert(
            id,
            Relationship {
                kind: rel.attribute(b"Type").unwrap_or_default(),
                target,
            },
        );
    }
    Ok(relationships)
}

/// Relationship targets of each section's default header and footer.
///
/// A section without its own default reference inherits the previous
/// section's. Each target is listed once; headers come before footers.
fn section_header_footer_targets(
    main: &XmlTree,
    relationships: &HashMap<String, Relationship>,
) -> Vec<String> {
    let Some(body) = main.root().child(b"body") else {
        return Vec::new();
    };

    let sections: Vec<&XmlElement> = body
        .child_elements()
        .filter_map(|el| {
            if el.is(b"sectPr") {
                Some(el)
            } else if el.is(b"p") {
                el.child(b"pPr").and_then(|ppr| ppr.child(b"sectPr"))
            } else {
                None
            }
        })
        .collect();

    let mut targets = Vec::new();
    for reference in [&b"headerReference"[..], &b"footerReference"[..]] {
        let mut inherited: Option<String> = None;
        for section in &sections {
            let own = section
                .children_named(reference)
                .find(|r| r.attribute(b"type").as_deref() == Some("default"))
                .and_then(|r| r.attribute(b"id"));
            if let Some(id) = own {
                inherited = Some(id);
            }

            let target = inherited
                .as_ref()
                .and_then(|id| relationships.get(id))
                .map(|rel| rel.target.clone());
            if let Some(target) = target {
                if !targets.contains(&target) {
                    targets.push(target);
                }
            }
        }
    }
    targets
}
