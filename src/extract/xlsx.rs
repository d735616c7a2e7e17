//! Excel workbook text extraction
//!
//! Every worksheet is emitted as a `=== Sheet: <name> ===` header followed by
//! one line per row, holding the cached values of the row's cells joined by
//! ` | `. Cells without a value are skipped; an empty string is still a value.
//! Formulas are never evaluated.

use std::collections::HashMap;
use std::io::{Read, Seek};

use chrono::{Duration, NaiveDate, NaiveTime};
use lazy_static::lazy_static;
use log::{debug, warn};
use quick_xml::events::Event;
use quick_xml::Reader;
use regex::Regex;

use super::{attribute, ExtractError, Package};

const WORKBOOK_PART: &str = "xl/workbook.xml";
const WORKBOOK_RELS_PART: &str = "xl/_rels/workbook.xml.rels";
const SHARED_STRINGS_PART: &str = "xl/sharedStrings.xml";
const STYLES_PART: &str = "xl/styles.xml";

/// A sheet as listed in the workbook part
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetEntry {
    pub name: String,
    pub relationship_id: String,
}

/// Workbook-level facts needed to render cell values
#[derive(Debug, Clone, Default)]
pub struct Workbook {
    pub sheets: Vec<SheetEntry>,
    /// Dates are counted from 1904-01-01 instead of 1899-12-30
    pub date1904: bool,
}

/// Shared strings plus the style information used to recognise dates
#[derive(Debug, Clone, Default)]
pub struct CellContext {
    pub shared_strings: Vec<String>,
    /// For every cell format index, whether it renders numbers as dates
    pub date_styles: Vec<bool>,
    pub date1904: bool,
}

/// Extract the text of an Excel workbook package
pub fn read_xlsx<R: Read + Seek>(reader: R) -> Result<String, ExtractError> {
    let mut package = Package::new(reader)?;

    let workbook = parse_workbook(&package.read_part(WORKBOOK_PART)?)?;
    let targets = match package.read_optional_part(WORKBOOK_RELS_PART)? {
        Some(xml) => parse_relationships(&xml)?,
        None => HashMap::new(),
    };
    let shared_strings = match package.read_optional_part(SHARED_STRINGS_PART)? {
        Some(xml) => parse_shared_strings(&xml)?,
        None => Vec::new(),
    };
    let date_styles = match package.read_optional_part(STYLES_PART)? {
        Some(xml) => parse_date_styles(&xml)?,
        None => Vec::new(),
    };

    let context = CellContext {
        shared_strings,
        date_styles,
        date1904: workbook.date1904,
    };

    let mut content = Vec::new();
    for (index, sheet) in workbook.sheets.iter().enumerate() {
        content.push(format!("\n=== Sheet: {} ===", sheet.name));

        let part = targets
            .get(&sheet.relationship_id)
            .map(|target| resolve_target(target))
            .unwrap_or_else(|| format!("xl/worksheets/sheet{}.xml", index + 1));

        match package.read_optional_part(&part)? {
            Some(xml) => {
                let rows = parse_sheet(&xml, &context)?;
                debug!("Sheet {} has {} non-empty rows", sheet.name, rows.len());
                content.extend(rows);
            }
            None => warn!("Sheet {} points at missing part {}", sheet.name, part),
        }
    }

    Ok(content.join("\n"))
}

/// Relationship targets are relative to `xl/` unless absolute
fn resolve_target(target: &str) -> String {
    match target.strip_prefix('/') {
        Some(absolute) => absolute.to_string(),
        None => format!("xl/{}", target),
    }
}

/// Read sheet names, their relationship ids and the date system
pub fn parse_workbook(xml: &str) -> Result<Workbook, ExtractError> {
    let mut reader = Reader::from_str(xml);
    let mut workbook = Workbook::default();

    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) => match e.local_name().as_ref() {
                b"sheet" => {
                    let name = attribute(&e, b"name")?.unwrap_or_default();
                    let relationship_id = attribute(&e, b"id")?.unwrap_or_default();
                    workbook.sheets.push(SheetEntry { name, relationship_id });
                }
                b"workbookPr" => {
                    workbook.date1904 = matches!(
                        attribute(&e, b"date1904")?.as_deref(),
                        Some("1") | Some("true")
                    );
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(workbook)
}

/// Map relationship ids to their targets
pub fn parse_relationships(xml: &str) -> Result<HashMap<String, String>, ExtractError> {
    let mut reader = Reader::from_str(xml);
    let mut targets = HashMap::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"Relationship" => {
                if let (Some(id), Some(target)) = (attribute(&e, b"Id")?, attribute(&e, b"Target")?) {
                    targets.insert(id, target);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(targets)
}

/// Collect rich or plain text from `<t>` elements, skipping phonetic runs.
///
/// Shared string items and inline strings share this layout. The reader must
/// be positioned just after the opening tag named `end`.
fn read_string_item(reader: &mut Reader<&[u8]>, end: &[u8]) -> Result<String, ExtractError> {
    let mut text = String::new();
    let mut in_text = false;
    let mut phonetic_depth = 0usize;

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"t" => in_text = true,
                b"rPh" => phonetic_depth += 1,
                _ => {}
            },
            Event::Text(t) if in_text && phonetic_depth == 0 => text.push_str(&t.unescape()?),
            Event::End(e) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"rPh" => phonetic_depth = phonetic_depth.saturating_sub(1),
                name if name == end => break,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(text)
}

/// Read the shared string table
pub fn parse_shared_strings(xml: &str) -> Result<Vec<String>, ExtractError> {
    let mut reader = Reader::from_str(xml);
    let mut strings = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) if e.local_name().as_ref() == b"si" => {
                strings.push(read_string_item(&mut reader, b"si")?);
            }
            Event::Empty(e) if e.local_name().as_ref() == b"si" => strings.push(String::new()),
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(strings)
}

/// Built-in number formats that display dates or times
fn is_builtin_date_format(id: u32) -> bool {
    matches!(id, 14..=22 | 27..=36 | 45..=47 | 50..=58)
}

lazy_static! {
    static ref QUOTED_OR_BRACKETED: Regex = Regex::new(r#""[^"]*"|\[[^\]]*\]|\\."#).unwrap();
    static ref DATE_TOKENS: Regex = Regex::new(r"(?i)[dmyhs]").unwrap();
}

/// Whether a custom format code renders a date or time
pub fn is_date_format_code(code: &str) -> bool {
    if code.eq_ignore_ascii_case("general") {
        return false;
    }
    let stripped = QUOTED_OR_BRACKETED.replace_all(code, "");
    DATE_TOKENS.is_match(&stripped)
}

/// For every entry of `cellXfs`, whether its number format is a date
pub fn parse_date_styles(xml: &str) -> Result<Vec<bool>, ExtractError> {
    let mut reader = Reader::from_str(xml);
    let mut custom_formats: HashMap<u32, bool> = HashMap::new();
    let mut date_styles = Vec::new();
    let mut in_cell_xfs = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) => match e.local_name().as_ref() {
                b"numFmt" => {
                    let id = attribute(&e, b"numFmtId")?.and_then(|id| id.parse::<u32>().ok());
                    let code = attribute(&e, b"formatCode")?.unwrap_or_default();
                    if let Some(id) = id {
                        custom_formats.insert(id, is_date_format_code(&code));
                    }
                }
                b"cellXfs" => in_cell_xfs = true,
                b"xf" if in_cell_xfs => {
                    let id = attribute(&e, b"numFmtId")?
                        .and_then(|id| id.parse::<u32>().ok())
                        .unwrap_or(0);
                    let is_date = custom_formats
                        .get(&id)
                        .copied()
                        .unwrap_or_else(|| is_builtin_date_format(id));
                    date_styles.push(is_date);
                }
                _ => {}
            },
            Event::End(e) if e.local_name().as_ref() == b"cellXfs" => in_cell_xfs = false,
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(date_styles)
}

/// Render a numeric cell the way a spreadsheet library would print it:
/// integers without a decimal point, integral floats with one
pub fn format_number(raw: &str) -> String {
    let raw = raw.trim();
    if !raw.contains(['.', 'e', 'E']) {
        if let Ok(value) = raw.parse::<i64>() {
            return value.to_string();
        }
    }
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e16 => {
            format!("{:.1}", value)
        }
        Ok(value) if value.is_finite() => value.to_string(),
        _ => raw.to_string(),
    }
}

/// Convert an Excel serial date to `YYYY-MM-DD HH:MM:SS`
///
/// Serials below one day with no whole-day part are times of day and render
/// as `HH:MM:SS`.
pub fn format_serial_date(serial: f64, date1904: bool) -> Option<String> {
    // 2958466 is 9999-12-31
    if !serial.is_finite() || !(0.0..2_958_466.0).contains(&serial) {
        return None;
    }

    let days = serial.trunc() as i64;
    let seconds = ((serial - serial.trunc()) * 86_400.0).round() as i64;

    if days == 0 && seconds < 86_400 {
        let time = NaiveTime::from_num_seconds_from_midnight_opt(seconds as u32, 0)?;
        return Some(time.format("%H:%M:%S").to_string());
    }

    let epoch = if date1904 {
        NaiveDate::from_ymd_opt(1904, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(1899, 12, 30)?
    };
    // Serials before the phantom 1900-02-29 are shifted by one day
    let days = if !date1904 && serial < 60.0 { days + 1 } else { days };

    let datetime = epoch.and_hms_opt(0, 0, 0)? + Duration::days(days) + Duration::seconds(seconds);
    Some(datetime.format("%Y-%m-%d %H:%M:%S").to_string())
}

/// Resolve the display value of a single cell
fn cell_value(cell_type: &str, style: Option<usize>, raw: &str, context: &CellContext) -> String {
    match cell_type {
        "s" => raw
            .trim()
            .parse::<usize>()
            .ok()
            .and_then(|index| context.shared_strings.get(index))
            .cloned()
            .unwrap_or_default(),
        "b" => (if raw.trim() == "1" { "True" } else { "False" }).to_string(),
        "str" | "e" | "inlineStr" => raw.to_string(),
        _ => {
            let is_date = style
                .and_then(|index| context.date_styles.get(index))
                .copied()
                .unwrap_or(false);
            if is_date {
                if let Some(date) = raw
                    .trim()
                    .parse::<f64>()
                    .ok()
                    .and_then(|serial| format_serial_date(serial, context.date1904))
                {
                    return date;
                }
            }
            format_number(raw)
        }
    }
}

/// Parse a worksheet into one line per non-empty row
pub fn parse_sheet(xml: &str, context: &CellContext) -> Result<Vec<String>, ExtractError> {
    let mut reader = Reader::from_str(xml);
    let mut rows = Vec::new();
    let mut row: Vec<String> = Vec::new();

    let mut cell_type = String::new();
    let mut cell_style: Option<usize> = None;
    let mut cell_raw: Option<String> = None;
    let mut in_value = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"row" => row.clear(),
                b"c" => {
                    cell_type = attribute(&e, b"t")?.unwrap_or_else(|| "n".to_string());
                    cell_style = attribute(&e, b"s")?.and_then(|s| s.parse().ok());
                    cell_raw = None;
                }
                b"v" => in_value = true,
                b"is" => cell_raw = Some(read_string_item(&mut reader, b"is")?),
                _ => {}
            },
            Event::Text(t) if in_value => {
                cell_raw.get_or_insert_with(String::new).push_str(&t.unescape()?);
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"v" => in_value = false,
                b"c" => {
                    // A cell with a value is kept even when that value is an empty string
                    if let Some(raw) = cell_raw.take() {
                        row.push(cell_value(&cell_type, cell_style, &raw, context));
                    }
                }
                b"row" => {
                    if !row.is_empty() {
                        rows.push(row.join(" | "));
                    }
                    row.clear();
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(rows)
}
