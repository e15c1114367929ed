//! JSONL (JSON Lines) read/write support.
//!
//! Each line in a JSONL file is a complete JSON object representing one
//! [`FormSchema`].

use std::io::{BufRead, Write};

use forms_core::schema::FormSchema;

use crate::error::{Result, StorageError};

/// Writes schemas as JSONL to the given writer.
pub fn write_jsonl<W: Write>(writer: &mut W, schemas: &[FormSchema]) -> Result<()> {
    for schema in schemas {
        serde_json::to_writer(&mut *writer, schema)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}

/// Returns an iterator that reads schemas from a JSONL reader.
///
/// Empty lines are skipped.
pub fn read_jsonl<R: BufRead>(reader: R) -> JsonlIter<R> {
    JsonlIter {
        reader,
        line_number: 0,
    }
}

/// Iterator over JSONL-encoded schemas.
pub struct JsonlIter<R> {
    reader: R,
    line_number: usize,
}

impl<R: BufRead> Iterator for JsonlIter<R> {
    type Item = Result<FormSchema>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut line = String::new();
        loop {
            line.clear();
            match self.reader.read_line(&mut line) {
                Ok(0) => return None,
                Ok(_) => {
                    self.line_number += 1;
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    return Some(serde_json::from_str(trimmed).map_err(|e| {
                        StorageError::Json {
                            line: self.line_number,
                            source: e,
                        }
                    }));
                }
                Err(e) => return Some(Err(StorageError::Io(e))),
            }
        }
    }
}
