use anyhow::Context;
use rusqlite::Connection;
use std::io::{Cursor, Write};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::store::{self, Student};

/// Fixed module order for the report sheets; the combined multi-marker
/// sheet always comes last.
pub const MODULES: [&str; 6] = ["App", "Web", "ML", "Cyber", "Design", "CP"];

pub const MULTI_SHEET_NAME: &str = "Multiple Markers";

const HEADER: [&str; 4] = ["Sl.No", "Email ID", "Student Name", "Markers"];
const COLS: [&str; 4] = ["A", "B", "C", "D"];

/// Build the full student report workbook: one sheet per module holding
/// its single-marker students, then one sheet of all multi-marker
/// students. Non-marker students are never exported.
pub fn build_report(conn: &Connection) -> anyhow::Result<Vec<u8>> {
    let mut sheets: Vec<(String, Vec<Student>)> = Vec::with_capacity(MODULES.len() + 1);
    for module in MODULES {
        let students = store::list_by_marker(conn, module)?;
        sheets.push((format!("{} Only", module), students));
    }
    sheets.push((MULTI_SHEET_NAME.to_string(), store::list_multi_marker(conn)?));
    write_workbook(&sheets)
}

/// Serialize sheets into an XLSX container (a zip of OOXML parts).
///
/// Strings are written inline per cell, so no shared-string table is
/// needed and each worksheet part is self-contained.
fn write_workbook(sheets: &[(String, Vec<Student>)]) -> anyhow::Result<Vec<u8>> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let opts = FileOptions::default().compression_method(CompressionMethod::Deflated);

    zip.start_file("[Content_Types].xml", opts)
        .context("failed to start content-types entry")?;
    zip.write_all(content_types_xml(sheets.len()).as_bytes())
        .context("failed to write content-types entry")?;

    zip.start_file("_rels/.rels", opts)
        .context("failed to start package rels entry")?;
    zip.write_all(PACKAGE_RELS.as_bytes())
        .context("failed to write package rels entry")?;

    zip.start_file("xl/workbook.xml", opts)
        .context("failed to start workbook entry")?;
    zip.write_all(workbook_xml(sheets).as_bytes())
        .context("failed to write workbook entry")?;

    zip.start_file("xl/_rels/workbook.xml.rels", opts)
        .context("failed to start workbook rels entry")?;
    zip.write_all(workbook_rels_xml(sheets.len()).as_bytes())
        .context("failed to write workbook rels entry")?;

    for (i, (_, students)) in sheets.iter().enumerate() {
        zip.start_file(format!("xl/worksheets/sheet{}.xml", i + 1), opts)
            .with_context(|| format!("failed to start worksheet entry {}", i + 1))?;
        zip.write_all(worksheet_xml(students).as_bytes())
            .with_context(|| format!("failed to write worksheet entry {}", i + 1))?;
    }

    let cursor = zip.finish().context("failed to finalize workbook")?;
    Ok(cursor.into_inner())
}

const PACKAGE_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#;

fn content_types_xml(sheet_count: usize) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>"#,
    );
    for i in 1..=sheet_count {
        xml.push_str(&format!(
            r#"<Override PartName="/xl/worksheets/sheet{}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#,
            i
        ));
    }
    xml.push_str("</Types>");
    xml
}

fn workbook_xml(sheets: &[(String, Vec<Student>)]) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets>"#,
    );
    for (i, (name, _)) in sheets.iter().enumerate() {
        xml.push_str(&format!(
            r#"<sheet name="{}" sheetId="{}" r:id="rId{}"/>"#,
            xml_escape(name),
            i + 1,
            i + 1
        ));
    }
    xml.push_str("</sheets></workbook>");
    xml
}

fn workbook_rels_xml(sheet_count: usize) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    );
    for i in 1..=sheet_count {
        xml.push_str(&format!(
            r#"<Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet{}.xml"/>"#,
            i, i
        ));
    }
    xml.push_str("</Relationships>");
    xml
}

fn worksheet_xml(students: &[Student]) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>"#,
    );

    xml.push_str(r#"<row r="1">"#);
    for (col, title) in COLS.iter().copied().zip(HEADER) {
        xml.push_str(&inline_str_cell(col, 1, title));
    }
    xml.push_str("</row>");

    for (i, s) in students.iter().enumerate() {
        let row = i + 2;
        xml.push_str(&format!(r#"<row r="{}">"#, row));
        xml.push_str(&format!(r#"<c r="A{}"><v>{}</v></c>"#, row, s.sl_no));
        xml.push_str(&inline_str_cell("B", row, &s.email_id));
        xml.push_str(&inline_str_cell("C", row, &s.student_name));
        xml.push_str(&inline_str_cell("D", row, &s.markers.join(", ")));
        xml.push_str("</row>");
    }

    xml.push_str("</sheetData></worksheet>");
    xml
}

fn inline_str_cell(col: &str, row: usize, text: &str) -> String {
    format!(
        r#"<c r="{}{}" t="inlineStr"><is><t>{}</t></is></c>"#,
        col,
        row,
        xml_escape(text)
    )
}

fn xml_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(ch),
        }
    }
    out
}
