//! Validation for boxes and record fields entering the library.
//!
//! The index itself accepts any box; these checks guard what gets stored.

use crate::error::{MediaTreeError, Result};
use crate::storage::FIELD_SEPARATOR;
use mediatree_types::{BoundingBox, Record};

/// Validates that a box has finite coordinates and ordered corners.
///
/// # Examples
///
/// ```
/// use mediatree::compute::validation::validate_bbox;
/// use mediatree::BoundingBox;
///
/// assert!(validate_bbox(&BoundingBox::new(0.0, 0.0, 10.0, 10.0)).is_ok());
///
/// // Inverted x range
/// assert!(validate_bbox(&BoundingBox::new(10.0, 0.0, 0.0, 10.0)).is_err());
///
/// // Non-finite coordinate
/// assert!(validate_bbox(&BoundingBox::new(0.0, 0.0, f64::INFINITY, 1.0)).is_err());
/// ```
pub fn validate_bbox(bbox: &BoundingBox) -> Result<()> {
    match bbox_problem(bbox) {
        Some(reason) => Err(MediaTreeError::InvalidInput(reason)),
        None => Ok(()),
    }
}

fn bbox_problem(bbox: &BoundingBox) -> Option<String> {
    if !bbox.is_finite() {
        return Some(format!(
            "Bounding box coordinates must be finite, got: {}",
            bbox
        ));
    }

    if bbox.xmin > bbox.xmax {
        return Some(format!("xmin must not exceed xmax: {}", bbox));
    }

    if bbox.ymin > bbox.ymax {
        return Some(format!("ymin must not exceed ymax: {}", bbox));
    }

    None
}

/// Validates a free-text field that will be written as one storage column.
pub fn validate_text_field(name: &str, value: &str) -> Result<()> {
    if value.contains(FIELD_SEPARATOR) {
        return Err(MediaTreeError::InvalidInput(format!(
            "{} cannot contain '{}'",
            name, FIELD_SEPARATOR
        )));
    }

    if value.contains(['\n', '\r']) {
        return Err(MediaTreeError::InvalidInput(format!(
            "{} cannot contain line breaks",
            name
        )));
    }

    Ok(())
}

/// Validates a record before it is inserted and persisted.
pub fn validate_record(record: &Record) -> Result<()> {
    validate_text_field("Title", record.title())?;
    validate_text_field("Tags", record.tags())?;
    match bbox_problem(record.bbox()) {
        Some(reason) => Err(MediaTreeError::InvalidInput(format!(
            "Record {}: {}",
            record.id(),
            reason
        ))),
        None => Ok(()),
    }
}
