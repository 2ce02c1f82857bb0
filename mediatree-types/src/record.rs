use crate::bbox::BoundingBox;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A multimedia metadata entry positioned by a bounding box.
///
/// Records are immutable once created. The `id` is supplied by the caller and
/// is not required to be unique.
///
/// # Examples
///
/// ```
/// use mediatree_types::bbox::BoundingBox;
/// use mediatree_types::record::Record;
///
/// let record = Record::new(7, "Lecture", "video;math", BoundingBox::new(0.0, 0.0, 4.0, 3.0));
/// assert_eq!(record.id(), 7);
/// assert_eq!(
///     record.to_string(),
///     "ID: 7, Title: Lecture, Tags: video;math, Bounding Box: [0, 0, 4, 3]"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    id: i64,
    title: String,
    tags: String,
    bbox: BoundingBox,
}

impl Record {
    pub fn new(id: i64, title: impl Into<String>, tags: impl Into<String>, bbox: BoundingBox) -> Self {
        Self {
            id,
            title: title.into(),
            tags: tags.into(),
            bbox,
        }
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn tags(&self) -> &str {
        &self.tags
    }

    pub fn bbox(&self) -> &BoundingBox {
        &self.bbox
    }
}

/// Human-readable form used in search reports.
impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ID: {}, Title: {}, Tags: {}, Bounding Box: {}",
            self.id, self.title, self.tags, self.bbox
        )
    }
}
