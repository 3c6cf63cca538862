use bson::Bson;
use std::fmt::Write as _;
use std::io::Write;

use super::Dataset;
use crate::errors::ExportError;
use crate::query::{render, to_json};

pub fn write_csv(ds: &Dataset) -> Result<Vec<u8>, ExportError> {
    write_delimited(ds, b',')
}

pub fn write_tsv(ds: &Dataset) -> Result<Vec<u8>, ExportError> {
    write_delimited(ds, b'\t')
}

fn write_delimited(ds: &Dataset, delimiter: u8) -> Result<Vec<u8>, ExportError> {
    let mut w = csv::WriterBuilder::new().delimiter(delimiter).from_writer(Vec::new());
    if !ds.headers.is_empty() {
        w.write_record(&ds.headers)?;
    }
    for row in &ds.rows {
        w.write_record(row.iter().map(render))?;
    }
    w.into_inner().map_err(|e| ExportError::Io(e.to_string()))
}

fn row_object(headers: &[String], row: &[Bson]) -> serde_json::Value {
    let map = headers.iter().cloned().zip(row.iter().map(to_json)).collect::<serde_json::Map<_, _>>();
    serde_json::Value::Object(map)
}

pub fn write_json(ds: &Dataset) -> Result<Vec<u8>, ExportError> {
    let rows: Vec<serde_json::Value> = ds.rows.iter().map(|r| row_object(&ds.headers, r)).collect();
    Ok(serde_json::to_vec(&rows)?)
}

pub fn write_ndjson(ds: &Dataset) -> Result<Vec<u8>, ExportError> {
    let mut out = Vec::new();
    for r in &ds.rows {
        serde_json::to_writer(&mut out, &row_object(&ds.headers, r))?;
        out.write_all(b"\n")?;
    }
    Ok(out)
}

pub fn write_html(ds: &Dataset) -> Result<Vec<u8>, ExportError> {
    let mut s = String::from("<table>\n");
    if !ds.headers.is_empty() {
        s.push_str("<thead>\n<tr>");
        for h in &ds.headers {
            let _ = write!(s, "<th>{}</th>", escape_markup(h));
        }
        s.push_str("</tr>\n</thead>\n");
    }
    s.push_str("<tbody>\n");
    for row in &ds.rows {
        s.push_str("<tr>");
        for cell in row {
            let _ = write!(s, "<td>{}</td>", escape_markup(&render(cell)));
        }
        s.push_str("</tr>\n");
    }
    s.push_str("</tbody>\n</table>\n");
    Ok(s.into_bytes())
}

/// Excel 2003 XML spreadsheet, the single-sheet `.xls` form Excel and
/// LibreOffice open directly.
pub fn write_xls(ds: &Dataset) -> Result<Vec<u8>, ExportError> {
    let mut s = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <?mso-application progid=\"Excel.Sheet\"?>\n\
         <Workbook xmlns=\"urn:schemas-microsoft-com:office:spreadsheet\" \
         xmlns:ss=\"urn:schemas-microsoft-com:office:spreadsheet\">\n\
         <Worksheet ss:Name=\"Sheet1\">\n<Table>\n",
    );
    if !ds.headers.is_empty() {
        s.push_str("<Row>");
        for h in &ds.headers {
            let _ = write!(s, "<Cell><Data ss:Type=\"String\">{}</Data></Cell>", escape_markup(h));
        }
        s.push_str("</Row>\n");
    }
    for row in &ds.rows {
        s.push_str("<Row>");
        for cell in row {
            match cell {
                Bson::Null | Bson::Undefined => s.push_str("<Cell/>"),
                Bson::Double(f) if !f.is_finite() => {
                    let _ = write!(s, "<Cell><Data ss:Type=\"String\">{}</Data></Cell>", render(cell));
                }
                Bson::Int32(_) | Bson::Int64(_) | Bson::Double(_) => {
                    let _ = write!(s, "<Cell><Data ss:Type=\"Number\">{}</Data></Cell>", render(cell));
                }
                Bson::Boolean(b) => {
                    let _ = write!(s, "<Cell><Data ss:Type=\"Boolean\">{}</Data></Cell>", u8::from(*b));
                }
                other => {
                    let _ = write!(
                        s,
                        "<Cell><Data ss:Type=\"String\">{}</Data></Cell>",
                        escape_markup(&render(other))
                    );
                }
            }
        }
        s.push_str("</Row>\n");
    }
    s.push_str("</Table>\n</Worksheet>\n</Workbook>\n");
    Ok(s.into_bytes())
}

/// Office Open XML workbook with a bold header row.
pub fn write_xlsx(ds: &Dataset) -> Result<Vec<u8>, ExportError> {
    use rust_xlsxwriter::{Format, Workbook};
    let mut workbook = Workbook::new();
    {
        let sheet = workbook.add_worksheet();
        let bold = Format::new().set_bold();
        let offset = u32::from(!ds.headers.is_empty());
        for (c, h) in ds.headers.iter().enumerate() {
            sheet.write_string_with_format(0, col_num(c)?, h.as_str(), &bold)?;
        }
        for (r, row) in ds.rows.iter().enumerate() {
            let r = u32::try_from(r)
                .ok()
                .and_then(|r| r.checked_add(offset))
                .ok_or_else(|| ExportError::Internal("too many rows for xlsx".into()))?;
            for (c, cell) in row.iter().enumerate() {
                let c = col_num(c)?;
                match cell {
                    Bson::Null | Bson::Undefined => {}
                    Bson::Int32(i) => {
                        sheet.write_number(r, c, f64::from(*i))?;
                    }
                    #[allow(clippy::cast_precision_loss)]
                    Bson::Int64(i) => {
                        sheet.write_number(r, c, *i as f64)?;
                    }
                    Bson::Double(f) if f.is_finite() => {
                        sheet.write_number(r, c, *f)?;
                    }
                    Bson::Boolean(b) => {
                        sheet.write_boolean(r, c, *b)?;
                    }
                    other => {
                        sheet.write_string(r, c, render(other).as_str())?;
                    }
                }
            }
        }
    }
    Ok(workbook.save_to_buffer()?)
}

fn col_num(c: usize) -> Result<u16, ExportError> {
    u16::try_from(c).map_err(|_| ExportError::Internal("too many columns for xlsx".into()))
}

/// Escapes markup metacharacters and drops control characters XML 1.0 cannot
/// carry (everything below U+0020 except tab, LF and CR).
pub(crate) fn escape_markup(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '\t' | '\n' | '\r' => out.push(ch),
            c if c < '\u{20}' => {}
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;
    use crate::document::Document;

    fn sample() -> Dataset {
        let docs = vec![
            Document::new(doc! {"name": "foo", "qty": 3i64, "ok": true}),
            Document::new(doc! {"name": "a,\"b\"", "qty": 2.5}),
        ];
        Dataset::from_documents(&docs, None)
    }

    #[test]
    fn csv_quotes_and_blanks() {
        let s = String::from_utf8(write_csv(&sample()).unwrap()).unwrap();
        let lines: Vec<&str> = s.lines().collect();
        assert_eq!(lines[0], "name,qty,ok");
        assert_eq!(lines[1], "foo,3,true");
        assert_eq!(lines[2], "\"a,\"\"b\"\"\",2.5,");
    }

    #[test]
    fn tsv_uses_tabs() {
        let s = String::from_utf8(write_tsv(&sample()).unwrap()).unwrap();
        assert_eq!(s.lines().next(), Some("name\tqty\tok"));
    }

    #[test]
    fn json_and_ndjson_keep_types() {
        let v: serde_json::Value = serde_json::from_slice(&write_json(&sample()).unwrap()).unwrap();
        assert_eq!(v[0]["qty"], serde_json::json!(3));
        assert_eq!(v[1]["ok"], serde_json::Value::Null);
        let nd = String::from_utf8(write_ndjson(&sample()).unwrap()).unwrap();
        assert_eq!(nd.lines().count(), 2);
    }

    #[test]
    fn html_escapes_cells() {
        let s = String::from_utf8(write_html(&sample()).unwrap()).unwrap();
        assert!(s.contains("<th>name</th>"));
        assert!(s.contains("<td>a,&quot;b&quot;</td>"));
    }

    #[test]
    fn xls_types_cells() {
        let s = String::from_utf8(write_xls(&sample()).unwrap()).unwrap();
        assert!(s.contains("<Data ss:Type=\"Number\">3</Data>"));
        assert!(s.contains("<Data ss:Type=\"Boolean\">1</Data>"));
        assert!(s.contains("<Cell/>"));
    }

    #[test]
    fn xls_keeps_non_finite_numbers_and_control_chars_out_of_number_cells() {
        let docs = vec![Document::new(doc! {"x": f64::NAN, "y": f64::INFINITY, "s": "a\u{1}b\tc"})];
        let s = String::from_utf8(write_xls(&Dataset::from_documents(&docs, None)).unwrap()).unwrap();
        assert!(!s.contains("Type=\"Number\">NaN"));
        assert!(s.contains("<Data ss:Type=\"String\">NaN</Data>"));
        assert!(s.contains("<Data ss:Type=\"String\">inf</Data>"));
        assert!(s.contains(">ab\tc<"));
        assert!(!s.contains('\u{1}'));
    }

    #[test]
    fn html_drops_control_chars() {
        assert_eq!(escape_markup("x\u{0}<y>\u{1b}\n"), "x&lt;y&gt;\n");
    }

    #[test]
    fn xlsx_writes_non_finite_numbers_as_text() {
        let docs = vec![Document::new(doc! {"x": f64::NAN})];
        let bytes = write_xlsx(&Dataset::from_documents(&docs, None)).unwrap();
        assert_eq!(&bytes[..2], b"PK");
    }

    #[test]
    fn xlsx_is_a_zip_container() {
        let bytes = write_xlsx(&sample()).unwrap();
        assert_eq!(&bytes[..2], b"PK");
    }
}
