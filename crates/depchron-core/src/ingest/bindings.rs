use std::io;
use std::path::Path;

use tracing::{debug, info, instrument};

use super::{InputKind, LoadError, Loaded, column, csv_reader, field, open, read_rows};
use crate::model::ArtifactId;

/// Locator value used by the project list for "no repository known".
pub const ABSENT_LOCATOR: &str = "NOT FOUND";

/// Column layout of the project → repository list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingLayout {
    pub delimiter: u8,
    pub project_column: String,
    pub locator_column: String,
}

impl Default for BindingLayout {
    fn default() -> Self {
        Self {
            delimiter: b';',
            project_column: "Project".to_string(),
            locator_column: "Github Link".to_string(),
        }
    }
}

/// One project → repository row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingRecord {
    pub artifact: ArtifactId,
    pub locator: String,
}

/// Read the project list. Rows whose locator is empty or
/// [`ABSENT_LOCATOR`] are dropped without a warning: they are well formed,
/// they just carry no binding.
///
/// # Errors
///
/// Returns [`LoadError::MissingColumn`] if a layout column is absent, or
/// [`LoadError::Read`] on an I/O failure.
pub fn read_bindings<R: io::Read>(
    input: R,
    layout: &BindingLayout,
) -> Result<Loaded<BindingRecord>, LoadError> {
    let mut reader = csv_reader(input, true, layout.delimiter);
    let project_idx = column(&mut reader, InputKind::Bindings, &layout.project_column)?;
    let locator_idx = column(&mut reader, InputKind::Bindings, &layout.locator_column)?;

    read_rows(reader, InputKind::Bindings, |record| {
        let project = field(record, project_idx, "project")?;
        let locator = record.get(locator_idx).unwrap_or_default();
        if locator.is_empty() || locator == ABSENT_LOCATOR {
            debug!(project, "no repository bound");
            return Ok(None);
        }
        Ok(Some(BindingRecord {
            artifact: ArtifactId::new(project),
            locator: locator.to_string(),
        }))
    })
}

/// Open and read the project list at `path`.
///
/// # Errors
///
/// Returns [`LoadError`] if the file cannot be opened, lacks a column, or
/// cannot be read.
#[instrument(skip(layout))]
pub fn load_bindings(path: &Path, layout: &BindingLayout) -> Result<Loaded<BindingRecord>, LoadError> {
    info!("parsing repository bindings");
    let loaded = read_bindings(open(path)?, layout)?;
    info!(
        bindings = loaded.records.len(),
        skipped = loaded.warnings.len(),
        "repository bindings parsed"
    );
    Ok(loaded)
}
