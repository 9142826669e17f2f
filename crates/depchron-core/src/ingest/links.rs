use std::io;
use std::path::Path;

use tracing::{info, instrument};

use super::{InputKind, LoadError, Loaded, csv_reader, field, open, read_rows};
use crate::model::ArtifactTag;

/// One `from depends on to` row of the link snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkRecord {
    pub from: ArtifactTag,
    pub to: ArtifactTag,
}

/// Read a headerless two-column link file.
///
/// Node labels are kept verbatim; self-loops are not rejected here (the
/// graph builder does that).
///
/// # Errors
///
/// Returns [`LoadError::Read`] on an I/O failure mid-stream.
pub fn read_links<R: io::Read>(input: R) -> Result<Loaded<LinkRecord>, LoadError> {
    read_rows(csv_reader(input, false, b','), InputKind::Links, |record| {
        let from = field(record, 0, "from")?;
        let to = field(record, 1, "to")?;
        Ok(Some(LinkRecord {
            from: ArtifactTag::new(from),
            to: ArtifactTag::new(to),
        }))
    })
}

/// Open and read the link file at `path`.
///
/// # Errors
///
/// Returns [`LoadError`] if the file cannot be opened or read.
#[instrument]
pub fn load_links(path: &Path) -> Result<Loaded<LinkRecord>, LoadError> {
    info!("parsing dependency links");
    let loaded = read_links(open(path)?)?;
    info!(
        links = loaded.records.len(),
        skipped = loaded.warnings.len(),
        "dependency links parsed"
    );
    Ok(loaded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quoted_and_bare_rows() {
        let data = "\"x:a:1\",\"y:b:1\"\ny:b:1,z:c:1\n";
        let loaded = read_links(data.as_bytes()).unwrap();
        assert_eq!(loaded.records.len(), 2);
        assert!(loaded.warnings.is_empty());
        assert_eq!(loaded.records[0].from.as_str(), "x:a:1");
        assert_eq!(loaded.records[1].to.as_str(), "z:c:1");
    }

    #[test]
    fn short_rows_become_warnings() {
        let data = "x:a:1,y:b:1\nlonely\n,y:b:1\nz:c:1,x:a:1\n";
        let loaded = read_links(data.as_bytes()).unwrap();
        assert_eq!(loaded.records.len(), 2);
        assert_eq!(loaded.warnings.len(), 2);
        assert_eq!(loaded.warnings[0].line, 2);
        assert_eq!(loaded.warnings[0].reason, "missing to field");
        assert_eq!(loaded.warnings[1].line, 3);
        assert_eq!(loaded.warnings[1].reason, "missing from field");
    }

    #[test]
    fn whitespace_is_trimmed() {
        let loaded = read_links(" x:a:1 , y:b:1 \n".as_bytes()).unwrap();
        assert_eq!(loaded.records[0].from.as_str(), "x:a:1");
        assert_eq!(loaded.records[0].to.as_str(), "y:b:1");
    }
}
