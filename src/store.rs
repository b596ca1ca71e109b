use anyhow::Context;
use rusqlite::{Connection, OptionalExtension};
use serde::Serialize;
use std::collections::HashMap;
use uuid::Uuid;

/// Label for the combined more-than-one-marker reporting bucket.
pub const MULTIPLE_CATEGORY: &str = "Multiple";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: String,
    pub sl_no: i64,
    pub email_id: String,
    pub student_name: String,
    pub markers: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryCount {
    pub category: String,
    pub count: i64,
}

/// Reporting category of a student, derived from the marker set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category<'a> {
    NonMarker,
    Single(&'a str),
    Multiple,
}

/// Derived, never stored; keeps classification from diverging from data.
pub fn category(markers: &[String]) -> Category<'_> {
    match markers {
        [] => Category::NonMarker,
        [only] => Category::Single(only.as_str()),
        _ => Category::Multiple,
    }
}

type RawRow = (String, i64, String, String, String);

const SELECT_COLS: &str = "id, sl_no, email_id, student_name, markers";

fn decode(raw: RawRow) -> anyhow::Result<Student> {
    let (id, sl_no, email_id, student_name, markers_doc) = raw;
    let markers: Vec<String> = serde_json::from_str(&markers_doc)
        .with_context(|| format!("corrupt markers document for {}", email_id))?;
    Ok(Student {
        id,
        sl_no,
        email_id,
        student_name,
        markers,
    })
}

fn select_all(conn: &Connection) -> anyhow::Result<Vec<Student>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM students ORDER BY sl_no ASC",
        SELECT_COLS
    ))?;
    let raw = stmt
        .query_map([], |r| {
            Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?, r.get(4)?))
        })?
        .collect::<Result<Vec<RawRow>, _>>()?;
    raw.into_iter().map(decode).collect()
}

/// All students ordered by sequence number.
pub fn list_all(conn: &Connection) -> anyhow::Result<Vec<Student>> {
    select_all(conn)
}

pub fn find_by_email(conn: &Connection, email: &str) -> anyhow::Result<Option<Student>> {
    let raw = conn
        .query_row(
            &format!("SELECT {} FROM students WHERE email_id = ?", SELECT_COLS),
            [email],
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?, r.get(4)?)),
        )
        .optional()?;
    raw.map(decode).transpose()
}

/// Insert a new student tagged with a single marker.
///
/// The sequence number is (current max)+1, read in a separate statement
/// from the insert. Two concurrent creators can therefore collide on
/// sl_no; that is an accepted property of the design, not a guarantee.
pub fn create(conn: &Connection, email: &str, name: &str, marker: &str) -> anyhow::Result<Student> {
    let max: Option<i64> = conn.query_row("SELECT MAX(sl_no) FROM students", [], |r| r.get(0))?;
    let student = Student {
        id: Uuid::new_v4().to_string(),
        sl_no: max.unwrap_or(0) + 1,
        email_id: email.to_string(),
        student_name: name.to_string(),
        markers: vec![marker.to_string()],
    };
    conn.execute(
        "INSERT INTO students(id, sl_no, email_id, student_name, markers)
         VALUES(?, ?, ?, ?, ?)",
        (
            &student.id,
            student.sl_no,
            &student.email_id,
            &student.student_name,
            serde_json::to_string(&student.markers)?,
        ),
    )?;
    Ok(student)
}

/// Add `marker` to the student's set. Already-present markers and unknown
/// emails are both silent no-ops.
pub fn add_marker(conn: &Connection, email: &str, marker: &str) -> anyhow::Result<()> {
    let Some(mut student) = find_by_email(conn, email)? else {
        return Ok(());
    };
    if student.markers.iter().any(|m| m == marker) {
        return Ok(());
    }
    student.markers.push(marker.to_string());
    write_markers(conn, &student.id, &student.markers)
}

/// Remove `marker` from the student's set; no-op if absent either way.
pub fn remove_marker(conn: &Connection, email: &str, marker: &str) -> anyhow::Result<()> {
    let Some(mut student) = find_by_email(conn, email)? else {
        return Ok(());
    };
    let before = student.markers.len();
    student.markers.retain(|m| m != marker);
    if student.markers.len() == before {
        return Ok(());
    }
    write_markers(conn, &student.id, &student.markers)
}

fn write_markers(conn: &Connection, id: &str, markers: &[String]) -> anyhow::Result<()> {
    conn.execute(
        "UPDATE students SET markers = ? WHERE id = ?",
        (serde_json::to_string(markers)?, id),
    )?;
    Ok(())
}

/// Students whose marker set is exactly `{marker}`, by sequence number.
pub fn list_by_marker(conn: &Connection, marker: &str) -> anyhow::Result<Vec<Student>> {
    let mut students = select_all(conn)?;
    students.retain(|s| category(&s.markers) == Category::Single(marker));
    Ok(students)
}

/// Students carrying more than one marker, by sequence number.
pub fn list_multi_marker(conn: &Connection) -> anyhow::Result<Vec<Student>> {
    let mut students = select_all(conn)?;
    students.retain(|s| category(&s.markers) == Category::Multiple);
    Ok(students)
}

/// Students with an empty marker set, by sequence number.
pub fn list_non_markers(conn: &Connection) -> anyhow::Result<Vec<Student>> {
    let mut students = select_all(conn)?;
    students.retain(|s| category(&s.markers) == Category::NonMarker);
    Ok(students)
}

/// Delete every student with an empty marker set; returns the count.
///
/// Deletion selects through the same decoded `category` classification
/// as the non-marker listing, so the two can never disagree on which
/// rows qualify.
pub fn delete_non_markers(conn: &Connection) -> anyhow::Result<usize> {
    let non_markers = list_non_markers(conn)?;
    for student in &non_markers {
        conn.execute("DELETE FROM students WHERE id = ?", [&student.id])?;
    }
    Ok(non_markers.len())
}

/// Per sole-marker counts plus one combined bucket for multi-marker
/// students. Zero-count categories are omitted; ordering is unspecified.
///
/// SQLite has no aggregation pipeline, so this is a grouping pass over
/// the (small) collection.
pub fn category_wise_counts(conn: &Connection) -> anyhow::Result<Vec<CategoryCount>> {
    let mut singles: HashMap<String, i64> = HashMap::new();
    let mut multiple = 0i64;
    for student in select_all(conn)? {
        match category(&student.markers) {
            Category::Single(m) => *singles.entry(m.to_string()).or_insert(0) += 1,
            Category::Multiple => multiple += 1,
            Category::NonMarker => {}
        }
    }

    let mut counts: Vec<CategoryCount> = singles
        .into_iter()
        .map(|(category, count)| CategoryCount { category, count })
        .collect();
    if multiple > 0 {
        counts.push(CategoryCount {
            category: MULTIPLE_CATEGORY.to_string(),
            count: multiple,
        });
    }
    Ok(counts)
}
