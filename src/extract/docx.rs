//! Word document text extraction
//!
//! Body paragraphs come first, then the rows of every top-level table with
//! their non-empty cells joined by ` | `. A cell spanning several grid
//! columns appears once per column, and a vertically merged cell repeats the
//! text of the cell where the merge starts.

use std::io::{Read, Seek};

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use super::{attribute, ExtractError, Package};

const DOCUMENT_PART: &str = "word/document.xml";

/// Extract the text of a Word document package
pub fn read_docx<R: Read + Seek>(reader: R) -> Result<String, ExtractError> {
    let mut package = Package::new(reader)?;
    let xml = package.read_part(DOCUMENT_PART)?;
    parse_document_xml(&xml)
}

/// An open element we are collecting text for, with the stack depth it
/// was opened at
struct Open<T> {
    depth: usize,
    value: T,
}

/// A table cell being read
#[derive(Default)]
struct CellState {
    paragraphs: Vec<String>,
    /// Layout-grid columns covered (`w:gridSpan`)
    span: usize,
    /// Continuation of a vertical merge (`w:vMerge` other than `restart`)
    continues: bool,
}

/// A table row being read
#[derive(Default)]
struct RowState {
    /// Empty grid columns before the first cell (`w:gridBefore`)
    grid_before: usize,
    cells: Vec<GridCell>,
}

impl RowState {
    fn next_column(&self) -> usize {
        self.grid_before + self.cells.iter().map(|cell| cell.span).sum::<usize>()
    }

    /// Cell texts as a table reader sees them: one entry per grid column
    /// covered, with vertical continuations showing the cell above
    fn line(&self) -> Option<String> {
        let texts: Vec<&str> = self
            .cells
            .iter()
            .filter(|cell| !cell.text.is_empty())
            .flat_map(|cell| std::iter::repeat(cell.text.as_str()).take(cell.repeat))
            .collect();
        if texts.is_empty() {
            None
        } else {
            Some(texts.join(" | "))
        }
    }
}

/// A finished cell placed on the layout grid
#[derive(Debug, Clone)]
struct GridCell {
    column: usize,
    span: usize,
    /// How many times the text repeats in the row line
    repeat: usize,
    text: String,
}

/// Place a finished cell on the grid, resolving a vertical continuation to
/// the cell that starts at the same column in the row above
fn place_cell(state: CellState, row: &RowState, above: &[GridCell]) -> GridCell {
    let column = row.next_column();
    let span = state.span.max(1);

    if state.continues {
        if let Some(origin) = above.iter().find(|cell| cell.column == column) {
            return GridCell {
                column,
                span,
                repeat: origin.repeat,
                text: origin.text.clone(),
            };
        }
    }

    GridCell {
        column,
        span,
        repeat: span,
        text: state.paragraphs.join("\n").trim().to_string(),
    }
}

/// Parse the `w:val` of a grid count such as `w:gridSpan`
fn grid_count(element: &BytesStart) -> Result<usize, ExtractError> {
    Ok(attribute(element, b"val")?
        .and_then(|val| val.trim().parse::<usize>().ok())
        .unwrap_or(1))
}

/// True when the element path below a paragraph is a run, or a run inside a
/// hyperlink. Text in drawings, text boxes and field codes is not part of the
/// paragraph's own text.
fn is_paragraph_run(path_below_paragraph: &[Vec<u8>]) -> bool {
    match path_below_paragraph {
        [run] => run.as_slice() == b"r",
        [link, run] => link.as_slice() == b"hyperlink" && run.as_slice() == b"r",
        _ => false,
    }
}

/// Parse the main document part into plain text
///
/// # Arguments
///
/// * `xml` - Contents of `word/document.xml`
///
/// # Returns
///
/// Non-blank body paragraphs followed by one line per non-empty table row,
/// joined with newlines
pub fn parse_document_xml(xml: &str) -> Result<String, ExtractError> {
    let mut reader = Reader::from_str(xml);

    let mut stack: Vec<Vec<u8>> = Vec::new();
    let mut lines: Vec<String> = Vec::new();
    let mut table_lines: Vec<String> = Vec::new();

    let mut table_depth = 0usize;
    let mut paragraph: Option<Open<String>> = None;
    let mut cell: Option<Open<CellState>> = None;
    let mut row: Option<Open<RowState>> = None;
    let mut row_above: Vec<GridCell> = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let name = e.local_name().as_ref().to_vec();
                let depth = stack.len();
                let parent = stack.last().map(Vec::as_slice);

                match name.as_slice() {
                    b"tbl" => {
                        table_depth += 1;
                        if table_depth == 1 {
                            row_above.clear();
                        }
                    }
                    b"tr" if table_depth == 1 => row = Some(Open { depth, value: RowState::default() }),
                    b"tc" if table_depth == 1 && row.is_some() => {
                        cell = Some(Open {
                            depth,
                            value: CellState { span: 1, ..CellState::default() },
                        })
                    }
                    b"p" if paragraph.is_none() => {
                        let top_level = parent == Some(b"body".as_slice()) && table_depth == 0;
                        let in_cell = parent == Some(b"tc".as_slice())
                            && cell.as_ref().map_or(false, |c| c.depth + 1 == depth);
                        if top_level || in_cell {
                            paragraph = Some(Open { depth, value: String::new() });
                        }
                    }
                    _ => {}
                }

                stack.push(name);
            }
            Event::Empty(e) => {
                let name = e.local_name();
                if let Some(open) = paragraph.as_mut() {
                    if is_paragraph_run(&stack[open.depth + 1..]) {
                        match name.as_ref() {
                            b"tab" => open.value.push('\t'),
                            b"br" | b"cr" => open.value.push('\n'),
                            _ => {}
                        }
                    }
                } else if let Some(open) = cell.as_mut() {
                    // Cell properties sit directly under the cell
                    if stack.len() == open.depth + 2 && stack[open.depth + 1].as_slice() == b"tcPr" {
                        match name.as_ref() {
                            b"gridSpan" => open.value.span = grid_count(&e)?,
                            b"vMerge" => {
                                open.value.continues = attribute(&e, b"val")?.as_deref() != Some("restart")
                            }
                            _ => {}
                        }
                    }
                } else if let Some(open) = row.as_mut() {
                    if stack.len() == open.depth + 1 && name.as_ref() == b"tc" {
                        let placed = place_cell(
                            CellState { span: 1, ..CellState::default() },
                            &open.value,
                            &row_above,
                        );
                        open.value.cells.push(placed);
                    } else if stack.len() == open.depth + 2
                        && stack[open.depth + 1].as_slice() == b"trPr"
                        && name.as_ref() == b"gridBefore"
                    {
                        open.value.grid_before = grid_count(&e)?;
                    }
                }
            }
            Event::Text(t) => {
                if let Some(open) = paragraph.as_mut() {
                    let in_text = stack.last().map_or(false, |name| name.as_slice() == b"t");
                    if in_text && is_paragraph_run(&stack[open.depth + 1..stack.len() - 1]) {
                        open.value.push_str(&t.unescape()?);
                    }
                }
            }
            Event::End(_) => {
                let name = stack.pop().unwrap_or_default();
                let depth = stack.len();

                match name.as_slice() {
                    b"p" if paragraph.as_ref().map_or(false, |p| p.depth == depth) => {
                        if let Some(Open { value: text, .. }) = paragraph.take() {
                            match cell.as_mut() {
                                Some(open) => open.value.paragraphs.push(text),
                                None if !text.trim().is_empty() => lines.push(text),
                                None => {}
                            }
                        }
                    }
                    b"tc" if cell.as_ref().map_or(false, |c| c.depth == depth) => {
                        if let (Some(open), Some(current_row)) = (cell.take(), row.as_mut()) {
                            let placed = place_cell(open.value, &current_row.value, &row_above);
                            current_row.value.cells.push(placed);
                        }
                    }
                    b"tr" if row.as_ref().map_or(false, |r| r.depth == depth) => {
                        if let Some(open) = row.take() {
                            if let Some(line) = open.value.line() {
                                table_lines.push(line);
                            }
                            row_above = open.value.cells;
                        }
                    }
                    b"tbl" => table_depth = table_depth.saturating_sub(1),
                    _ => {}
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    lines.extend(table_lines);
    Ok(lines.join("\n"))
}
