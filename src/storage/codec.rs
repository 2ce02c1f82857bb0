//! Row encoding: `username,id,title,tags,xmin,ymin,xmax,ymax`
//!
//! Coordinates use the shortest representation that parses back to the same
//! `f64`, so a rewrite followed by a reload reproduces every box exactly.

use super::{FIELD_COUNT, FIELD_SEPARATOR};
use crate::compute::validation::validate_bbox;
use crate::error::{MediaTreeError, Result};
use crate::registry::UserName;
use mediatree_types::{BoundingBox, Record};

/// Encode one record as a row, without the trailing newline.
pub fn encode_row(user: &UserName, record: &Record) -> String {
    let bbox = record.bbox();
    let sep = FIELD_SEPARATOR;
    format!(
        "{user}{sep}{}{sep}{}{sep}{}{sep}{}{sep}{}{sep}{}{sep}{}",
        record.id(),
        record.title(),
        record.tags(),
        bbox.xmin,
        bbox.ymin,
        bbox.xmax,
        bbox.ymax,
    )
}

/// Decode one row. `line` is the 1-based line number used in errors.
pub fn decode_row(line: usize, row: &str) -> Result<(UserName, Record)> {
    let row = row.strip_suffix('\r').unwrap_or(row);
    let fields: Vec<&str> = row.split(FIELD_SEPARATOR).collect();
    if fields.len() != FIELD_COUNT {
        return Err(malformed(
            line,
            format!("expected {} fields, found {}", FIELD_COUNT, fields.len()),
        ));
    }

    let user = UserName::parse(fields[0]).map_err(|e| malformed(line, e.to_string()))?;
    let id = fields[1]
        .trim()
        .parse::<i64>()
        .map_err(|e| malformed(line, format!("invalid id '{}': {}", fields[1], e)))?;

    let mut coords = [0.0f64; 4];
    for (slot, raw) in coords.iter_mut().zip(&fields[4..]) {
        *slot = raw
            .trim()
            .parse::<f64>()
            .map_err(|e| malformed(line, format!("invalid coordinate '{}': {}", raw, e)))?;
    }
    let bbox = BoundingBox::new(coords[0], coords[1], coords[2], coords[3]);
    validate_bbox(&bbox).map_err(|e| malformed(line, e.to_string()))?;

    Ok((user, Record::new(id, fields[2], fields[3], bbox)))
}

fn malformed(line: usize, reason: String) -> MediaTreeError {
    MediaTreeError::MalformedRow { line, reason }
}
