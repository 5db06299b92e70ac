use crate::error::{ReportError, Result};
use serde::Serialize;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use tabled::{settings::Style, Table, Tabled};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| ReportError::io(parent, e))?;
    }
    Ok(())
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    ensure_parent(path)?;
    let s = serde_json::to_string_pretty(value)?;
    fs::write(path, s).map_err(|e| ReportError::io(path, e))?;
    Ok(())
}

/// Write a header row and string records, prefixed with a UTF-8 BOM so
/// spreadsheet tools pick up the Korean headers.
pub fn write_records<H, R, I>(path: &Path, headers: H, rows: I) -> Result<usize>
where
    H: IntoIterator,
    H::Item: AsRef<[u8]>,
    I: IntoIterator<Item = R>,
    R: IntoIterator,
    R::Item: AsRef<[u8]>,
{
    ensure_parent(path)?;
    let mut file = File::create(path).map_err(|e| ReportError::io(path, e))?;
    file.write_all(UTF8_BOM).map_err(|e| ReportError::io(path, e))?;

    let mut wtr = csv::Writer::from_writer(file);
    wtr.write_record(headers).map_err(|e| ReportError::csv(path, e))?;
    let mut n = 0;
    for r in rows {
        wtr.write_record(r).map_err(|e| ReportError::csv(path, e))?;
        n += 1;
    }
    wtr.flush().map_err(|e| ReportError::io(path, e))?;
    Ok(n)
}

pub fn preview_table_rows<T>(title: &str, rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    println!("\n{}\n", title);
    let slice: Vec<T> = rows.iter().cloned().take(max_rows).collect();
    if slice.is_empty() {
        println!("(no rows)\n");
        return;
    }
    let table_str = Table::new(slice).with(Style::markdown()).to_string();
    println!("{}", table_str);
    if rows.len() > max_rows {
        println!("... {} more rows", rows.len() - max_rows);
    }
    println!();
}
