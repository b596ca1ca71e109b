use rosterd::{db, export, store};
use rusqlite::Connection;
use std::io::{Cursor, Read};
use tempfile::TempDir;
use zip::ZipArchive;

fn open_temp_db() -> (TempDir, Connection) {
    let dir = tempfile::tempdir().expect("create temp dir");
    let conn = db::open_db(dir.path()).expect("open db");
    (dir, conn)
}

fn entry_text(archive: &mut ZipArchive<Cursor<Vec<u8>>>, name: &str) -> String {
    let mut text = String::new();
    archive
        .by_name(name)
        .unwrap_or_else(|_| panic!("workbook missing entry {}", name))
        .read_to_string(&mut text)
        .expect("read entry");
    text
}

#[test]
fn workbook_has_module_sheets_then_combined_sheet() {
    let (_dir, conn) = open_temp_db();
    let bytes = export::build_report(&conn).expect("build report");
    // XLSX is a zip container.
    assert!(bytes.starts_with(b"PK\x03\x04"));

    let mut archive = ZipArchive::new(Cursor::new(bytes)).expect("open archive");
    for name in [
        "[Content_Types].xml",
        "_rels/.rels",
        "xl/workbook.xml",
        "xl/_rels/workbook.xml.rels",
    ] {
        assert!(archive.by_name(name).is_ok(), "missing {}", name);
    }

    let workbook = entry_text(&mut archive, "xl/workbook.xml");
    let mut last = 0usize;
    for module in export::MODULES {
        let needle = format!("name=\"{} Only\"", module);
        let pos = workbook.find(&needle).unwrap_or_else(|| {
            panic!("sheet {} missing from workbook.xml", needle)
        });
        assert!(pos > last, "module sheets out of order at {}", module);
        last = pos;
    }
    let multi_pos = workbook
        .find(&format!("name=\"{}\"", export::MULTI_SHEET_NAME))
        .expect("combined sheet present");
    assert!(multi_pos > last, "combined sheet must come last");

    // One worksheet part per module plus the combined sheet.
    for i in 1..=export::MODULES.len() + 1 {
        let name = format!("xl/worksheets/sheet{}.xml", i);
        assert!(archive.by_name(&name).is_ok(), "missing {}", name);
    }
}

#[test]
fn sheets_carry_only_their_single_marker_students() {
    let (_dir, conn) = open_temp_db();
    store::create(&conn, "alice@x.com", "Alice", "Web").expect("create alice");
    store::create(&conn, "bob@x.com", "Bob", "Web").expect("create bob");
    store::add_marker(&conn, "bob@x.com", "App").expect("tag bob");
    store::create(&conn, "carol@x.com", "Carol", "ML").expect("create carol");
    store::remove_marker(&conn, "carol@x.com", "ML").expect("untag carol");

    let bytes = export::build_report(&conn).expect("build report");
    let mut archive = ZipArchive::new(Cursor::new(bytes)).expect("open archive");

    // Web is the second module, so its sheet is sheet2.xml.
    let web_sheet = entry_text(&mut archive, "xl/worksheets/sheet2.xml");
    assert!(web_sheet.contains("alice@x.com"));
    assert!(web_sheet.contains("<v>1</v>"), "sl_no cell should be numeric");
    assert!(!web_sheet.contains("bob@x.com"), "multi-marker student leaked");

    let multi_sheet = entry_text(&mut archive, "xl/worksheets/sheet7.xml");
    assert!(multi_sheet.contains("bob@x.com"));
    assert!(multi_sheet.contains("App, Web") || multi_sheet.contains("Web, App"));

    // Non-marker students are never exported.
    for i in 1..=7 {
        let sheet = entry_text(&mut archive, &format!("xl/worksheets/sheet{}.xml", i));
        assert!(!sheet.contains("carol@x.com"), "non-marker leaked into sheet{}", i);
    }
}

#[test]
fn cell_text_is_xml_escaped() {
    let (_dir, conn) = open_temp_db();
    store::create(&conn, "amp@x.com", "Alice <\"A&B\">", "App").expect("create");

    let bytes = export::build_report(&conn).expect("build report");
    let mut archive = ZipArchive::new(Cursor::new(bytes)).expect("open archive");

    let app_sheet = entry_text(&mut archive, "xl/worksheets/sheet1.xml");
    assert!(app_sheet.contains("Alice &lt;&quot;A&amp;B&quot;&gt;"));
    assert!(!app_sheet.contains("A&B"), "raw ampersand must not appear");
}
