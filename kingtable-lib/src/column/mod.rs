//! Table columns
//!
//! Columns are built once from an inferred [`ObjectSchema`](crate::schema::ObjectSchema)
//! by layering attribute sets; see [`assemble`].

mod assemble;
mod attributes;
mod registry;

use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

pub use assemble::assemble;
pub use assemble::sort_columns;
pub use attributes::ColumnAttributes;
pub use registry::DefaultRegistry;
use serde::Serialize;

/// Process-unique column identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ColumnId(usize);

impl ColumnId {
    pub(crate) fn new() -> Self {
        static COUNTER: AtomicUsize = AtomicUsize::new(0);
        Self(COUNTER.fetch_add(1, Ordering::SeqCst))
    }
}

impl std::fmt::Display for ColumnId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "col{}", self.0)
    }
}

/// A fully resolved table column.
///
/// Identity is the field [`name`](Self::name). [`position`](Self::position)
/// is only authoritative after [`sort_columns`] has run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    pub cid: ColumnId,
    /// Field name in the row objects.
    pub name: String,
    /// Value type.
    #[serde(rename = "type")]
    pub kind: String,
    /// Header text.
    pub display_name: String,
    pub position: Option<usize>,
    pub sortable: bool,
    pub groupable: bool,
    pub resizable: bool,
    /// Whether the column takes part in search.
    pub allow_search: bool,
    /// Cell template with the field name already substituted.
    pub template: String,
    pub hidden: bool,
    pub secret: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

impl Column {
    /// Returns `true` if the column should be drawn.
    pub fn is_visible(&self) -> bool {
        !self.hidden && !self.secret
    }
}
