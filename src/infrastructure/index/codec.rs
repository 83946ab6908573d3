//! Binary layout of a persisted [`VectorIndex`].
//!
//! ```text
//! magic      4 bytes  "FAQX"
//! version    u32
//! metric     u8       DistanceMetric::id()
//! dimension  u32
//! rows       u64
//! model_len  u16
//! model      model_len bytes, UTF-8 embedding model name
//! rows × { entry_id u64, dimension × f32 }
//! ```
//! All integers and floats are little-endian.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use tempfile::NamedTempFile;

use super::VectorIndex;
use crate::domain::{DistanceMetric, DomainError, Embedding, IndexRow};

pub const MAGIC: &[u8; 4] = b"FAQX";
pub const FORMAT_VERSION: u32 = 2;

/// Refuses headers claiming more rows than this before reading them.
const MAX_ROWS: u64 = 10_000_000;
const MAX_DIMENSION: u32 = 65_536;
const MAX_MODEL_NAME: usize = 1_024;
/// Upper bound on the row capacity reserved from the header alone.
const PREALLOCATED_ROWS: u64 = 4_096;

/// An index as read back from disk, with the embedding model that produced its vectors.
#[derive(Debug)]
pub struct PersistedIndex {
    pub index: VectorIndex,
    pub embedding_model: String,
}

pub fn write_index<W: Write>(
    index: &VectorIndex,
    embedding_model: &str,
    w: &mut W,
) -> Result<(), DomainError> {
    let dimension = u32::try_from(index.dimension())
        .map_err(|_| DomainError::internal("index dimension does not fit the format"))?;
    if embedding_model.is_empty() || embedding_model.len() > MAX_MODEL_NAME {
        return Err(DomainError::internal(format!(
            "embedding model name must be 1 to {MAX_MODEL_NAME} bytes"
        )));
    }

    write_bytes(w, MAGIC)?;
    write_bytes(w, &FORMAT_VERSION.to_le_bytes())?;
    write_bytes(w, &[index.metric().id()])?;
    write_bytes(w, &dimension.to_le_bytes())?;
    write_bytes(w, &(index.row_count() as u64).to_le_bytes())?;
    write_bytes(w, &(embedding_model.len() as u16).to_le_bytes())?;
    write_bytes(w, embedding_model.as_bytes())?;

    for row in index.rows() {
        write_bytes(w, &row.entry_id.to_le_bytes())?;
        for value in row.embedding.as_slice() {
            write_bytes(w, &value.to_le_bytes())?;
        }
    }
    w.flush()
        .map_err(|e| DomainError::internal(format!("failed to flush index: {e}")))
}

pub fn read_index<R: Read>(r: &mut R) -> Result<PersistedIndex, DomainError> {
    let mut magic = [0u8; 4];
    read_exact(r, &mut magic)?;
    if &magic != MAGIC {
        return Err(DomainError::corrupt("index blob has an unknown magic number"));
    }

    let version = read_u32(r)?;
    if version != FORMAT_VERSION {
        return Err(DomainError::IncompatibleIndexVersion {
            found: version,
            supported: FORMAT_VERSION,
        });
    }

    let metric_id = read_u8(r)?;
    let metric = DistanceMetric::from_id(metric_id)
        .ok_or_else(|| DomainError::corrupt(format!("unknown metric id {metric_id}")))?;

    let dimension = read_u32(r)?;
    if dimension == 0 || dimension > MAX_DIMENSION {
        return Err(DomainError::corrupt(format!(
            "implausible index dimension {dimension}"
        )));
    }
    let row_count = read_u64(r)?;
    if row_count > MAX_ROWS {
        return Err(DomainError::corrupt(format!(
            "implausible row count {row_count}"
        )));
    }

    let model_len = read_u16(r)? as usize;
    if model_len == 0 || model_len > MAX_MODEL_NAME {
        return Err(DomainError::corrupt(format!(
            "implausible embedding model name length {model_len}"
        )));
    }
    let mut model = vec![0u8; model_len];
    read_exact(r, &mut model)?;
    let embedding_model = String::from_utf8(model)
        .map_err(|_| DomainError::corrupt("embedding model name is not UTF-8"))?;

    let dimension = dimension as usize;
    let mut rows = Vec::with_capacity(row_count.min(PREALLOCATED_ROWS) as usize);
    for _ in 0..row_count {
        let entry_id = read_u64(r)?;
        let mut values = Vec::with_capacity(dimension);
        for _ in 0..dimension {
            values.push(read_f32(r)?);
        }
        rows.push(IndexRow::new(entry_id, Embedding::new(values)));
    }

    let mut trailing = [0u8; 1];
    match r.read(&mut trailing) {
        Ok(0) => {}
        Ok(_) => return Err(DomainError::corrupt("index blob has trailing bytes")),
        Err(e) => return Err(DomainError::corrupt(e.to_string())),
    }

    Ok(PersistedIndex {
        index: VectorIndex::build(rows, metric)?,
        embedding_model,
    })
}

/// Writes to a temporary file beside `path` and renames it into place, so readers see
/// either the previous blob or the complete new one.
pub fn save(index: &VectorIndex, embedding_model: &str, path: &Path) -> Result<(), DomainError> {
    let dir = match path.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(parent) => {
            std::fs::create_dir_all(parent).map_err(|e| {
                DomainError::internal(format!("cannot create {}: {e}", parent.display()))
            })?;
            parent
        }
        None => Path::new("."),
    };

    let mut staged = NamedTempFile::new_in(dir).map_err(|e| {
        DomainError::internal(format!("cannot stage index in {}: {e}", dir.display()))
    })?;
    write_index(index, embedding_model, &mut BufWriter::new(staged.as_file_mut()))?;
    staged
        .as_file()
        .sync_all()
        .map_err(|e| DomainError::internal(format!("failed to sync index: {e}")))?;
    staged.persist(path).map_err(|e| {
        DomainError::internal(format!("cannot replace {}: {}", path.display(), e.error))
    })?;
    Ok(())
}

pub fn load(path: &Path) -> Result<PersistedIndex, DomainError> {
    let file = File::open(path)
        .map_err(|e| DomainError::corrupt(format!("cannot open {}: {e}", path.display())))?;
    read_index(&mut BufReader::new(file))
}

// ===== Low-level helpers =====

fn write_bytes<W: Write>(w: &mut W, bytes: &[u8]) -> Result<(), DomainError> {
    w.write_all(bytes)
        .map_err(|e| DomainError::internal(format!("failed to write index: {e}")))
}

fn read_exact<R: Read>(r: &mut R, buf: &mut [u8]) -> Result<(), DomainError> {
    r.read_exact(buf)
        .map_err(|e| DomainError::corrupt(format!("truncated index blob: {e}")))
}

fn read_u8<R: Read>(r: &mut R) -> Result<u8, DomainError> {
    let mut buf = [0u8; 1];
    read_exact(r, &mut buf)?;
    Ok(buf[0])
}

fn read_u16<R: Read>(r: &mut R) -> Result<u16, DomainError> {
    let mut buf = [0u8; 2];
    read_exact(r, &mut buf)?;
    Ok(u16::from_le_bytes(buf))
}

fn read_u32<R: Read>(r: &mut R) -> Result<u32, DomainError> {
    let mut buf = [0u8; 4];
    read_exact(r, &mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

fn read_u64<R: Read>(r: &mut R) -> Result<u64, DomainError> {
    let mut buf = [0u8; 8];
    read_exact(r, &mut buf)?;
    Ok(u64::from_le_bytes(buf))
}

fn read_f32<R: Read>(r: &mut R) -> Result<f32, DomainError> {
    let mut buf = [0u8; 4];
    read_exact(r, &mut buf)?;
    Ok(f32::from_le_bytes(buf))
}

#[cfg(test)]
mod tests {
    use super::*;

    const MODEL: &str = "test-model";

    fn sample() -> VectorIndex {
        VectorIndex::build(
            vec![
                IndexRow::new(1, Embedding::new(vec![0.5, -1.25, 3.0])),
                IndexRow::new(2, Embedding::new(vec![0.0, 1.0, 0.0])),
            ],
            DistanceMetric::Euclidean,
        )
        .unwrap()
    }

    fn encoded() -> Vec<u8> {
        let mut buf = Vec::new();
        write_index(&sample(), MODEL, &mut buf).unwrap();
        buf
    }

    #[test]
    fn test_header_layout() {
        let buf = encoded();
        assert_eq!(&buf[0..4], b"FAQX");
        assert_eq!(u32::from_le_bytes(buf[4..8].try_into().unwrap()), 2);
        assert_eq!(buf[8], DistanceMetric::Euclidean.id());
        assert_eq!(u32::from_le_bytes(buf[9..13].try_into().unwrap()), 3);
        assert_eq!(u64::from_le_bytes(buf[13..21].try_into().unwrap()), 2);
        assert_eq!(u16::from_le_bytes(buf[21..23].try_into().unwrap()), 10);
        assert_eq!(&buf[23..33], MODEL.as_bytes());
        assert_eq!(buf.len(), 33 + 2 * (8 + 3 * 4));
    }

    #[test]
    fn test_read_restores_rows_metric_and_model() {
        let buf = encoded();
        let persisted = read_index(&mut buf.as_slice()).unwrap();
        assert_eq!(persisted.index.metric(), DistanceMetric::Euclidean);
        assert_eq!(persisted.index.rows(), sample().rows());
        assert_eq!(persisted.embedding_model, MODEL);
    }

    #[test]
    fn test_write_requires_model_name() {
        let mut buf = Vec::new();
        assert!(matches!(
            write_index(&sample(), "", &mut buf),
            Err(DomainError::Internal(_))
        ));
    }

    #[test]
    fn test_version_mismatch_is_incompatible() {
        for found in [1u32, 3] {
            let mut buf = encoded();
            buf[4..8].copy_from_slice(&found.to_le_bytes());
            assert_eq!(
                read_index(&mut buf.as_slice()).unwrap_err(),
                DomainError::IncompatibleIndexVersion {
                    found,
                    supported: 2
                }
            );
        }
    }

    #[test]
    fn test_bad_magic_metric_and_truncation_are_corrupt() {
        let mut bad_magic = encoded();
        bad_magic[0] = b'X';
        assert!(matches!(
            read_index(&mut bad_magic.as_slice()),
            Err(DomainError::CorruptKnowledgeBase(_))
        ));

        let mut bad_metric = encoded();
        bad_metric[8] = 42;
        assert!(matches!(
            read_index(&mut bad_metric.as_slice()),
            Err(DomainError::CorruptKnowledgeBase(_))
        ));

        let mut bad_model = encoded();
        bad_model[23] = 0xff;
        assert!(matches!(
            read_index(&mut bad_model.as_slice()),
            Err(DomainError::CorruptKnowledgeBase(_))
        ));

        let full = encoded();
        let truncated = &full[..full.len() - 3];
        assert!(matches!(
            read_index(&mut &truncated[..]),
            Err(DomainError::CorruptKnowledgeBase(_))
        ));

        let mut trailing = encoded();
        trailing.push(0);
        assert!(matches!(
            read_index(&mut trailing.as_slice()),
            Err(DomainError::CorruptKnowledgeBase(_))
        ));
    }

    #[test]
    fn test_inflated_row_count_is_corrupt_not_allocated() {
        let mut header = encoded()[..33].to_vec();
        header[13..21].copy_from_slice(&MAX_ROWS.to_le_bytes());
        assert!(matches!(
            read_index(&mut header.as_slice()),
            Err(DomainError::CorruptKnowledgeBase(msg)) if msg.contains("truncated")
        ));
    }

    #[test]
    fn test_save_replaces_existing_blob() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("faq.index");
        std::fs::write(&path, b"stale").unwrap();

        save(&sample(), MODEL, &path).unwrap();

        let persisted = load(&path).unwrap();
        assert_eq!(persisted.index.rows(), sample().rows());
        let leftovers = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(leftovers, 1);
    }
}
