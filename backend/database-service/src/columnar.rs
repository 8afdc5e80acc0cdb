//! Column-oriented file format
//!
//! Layout:
//!
//! ```text
//! magic "PCOL" | version u16 LE | bincode(row_count u64, columns)
//! ```
//!
//! `columns` holds one vector per field, all `row_count` long, rows in
//! insertion order. The file is always written whole.

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

pub const MAGIC: [u8; 4] = *b"PCOL";
pub const FORMAT_VERSION: u16 = 1;

const HEADER_LEN: usize = MAGIC.len() + 2;

#[derive(Debug, Error)]
pub enum ColumnarError {
    #[error("missing columnar header")]
    BadMagic,

    #[error("unsupported format version {0}")]
    UnsupportedVersion(u16),

    #[error("column {column} has {actual} values, expected {expected}")]
    RaggedColumn {
        column: &'static str,
        actual: usize,
        expected: usize,
    },

    #[error("codec error: {0}")]
    Codec(#[from] bincode::Error),
}

/// A row type that can be split into, and rebuilt from, columns
pub trait ColumnarRecord: Sized {
    type Columns: Serialize + DeserializeOwned;

    fn to_columns(rows: &[Self]) -> Self::Columns;

    /// Rebuild `rows` rows. Implementations check every column length with
    /// [`check_len`] first.
    fn from_columns(columns: Self::Columns, rows: usize) -> Result<Vec<Self>, ColumnarError>;
}

pub fn check_len<T>(column: &'static str, values: &[T], expected: usize) -> Result<(), ColumnarError> {
    if values.len() != expected {
        return Err(ColumnarError::RaggedColumn {
            column,
            actual: values.len(),
            expected,
        });
    }
    Ok(())
}

pub fn encode<R: ColumnarRecord>(rows: &[R]) -> Result<Vec<u8>, ColumnarError> {
    let mut out = Vec::with_capacity(HEADER_LEN + rows.len() * 64);
    out.extend_from_slice(&MAGIC);
    out.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
    bincode::serialize_into(&mut out, &(rows.len() as u64, R::to_columns(rows)))?;
    Ok(out)
}

pub fn decode<R: ColumnarRecord>(data: &[u8]) -> Result<Vec<R>, ColumnarError> {
    if data.len() < HEADER_LEN || data[..MAGIC.len()] != MAGIC {
        return Err(ColumnarError::BadMagic);
    }

    let version = u16::from_le_bytes([data[4], data[5]]);
    if version != FORMAT_VERSION {
        return Err(ColumnarError::UnsupportedVersion(version));
    }

    let (rows, columns): (u64, R::Columns) = bincode::deserialize(&data[HEADER_LEN..])?;
    R::from_columns(columns, rows as usize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq)]
    struct Point {
        x: i32,
        label: String,
    }

    #[derive(Serialize, Deserialize)]
    struct PointColumns {
        x: Vec<i32>,
        label: Vec<String>,
    }

    impl ColumnarRecord for Point {
        type Columns = PointColumns;

        fn to_columns(rows: &[Self]) -> PointColumns {
            PointColumns {
                x: rows.iter().map(|p| p.x).collect(),
                label: rows.iter().map(|p| p.label.clone()).collect(),
            }
        }

        fn from_columns(columns: PointColumns, rows: usize) -> Result<Vec<Self>, ColumnarError> {
            check_len("x", &columns.x, rows)?;
            check_len("label", &columns.label, rows)?;
            Ok(columns
                .x
                .into_iter()
                .zip(columns.label)
                .map(|(x, label)| Point { x, label })
                .collect())
        }
    }

    fn points() -> Vec<Point> {
        (0..3)
            .map(|i| Point {
                x: i * 10,
                label: format!("p{i}"),
            })
            .collect()
    }

    #[test]
    fn test_header_and_order() {
        let data = encode(&points()).unwrap();
        assert_eq!(&data[..4], b"PCOL");
        assert_eq!(u16::from_le_bytes([data[4], data[5]]), FORMAT_VERSION);
        assert_eq!(decode::<Point>(&data).unwrap(), points());
    }

    #[test]
    fn test_empty_table() {
        let data = encode::<Point>(&[]).unwrap();
        assert!(decode::<Point>(&data).unwrap().is_empty());
    }

    #[test]
    fn test_rejects_foreign_bytes() {
        assert!(matches!(
            decode::<Point>(b"PAR1 not ours"),
            Err(ColumnarError::BadMagic)
        ));
        assert!(matches!(decode::<Point>(b""), Err(ColumnarError::BadMagic)));

        let mut data = encode(&points()).unwrap();
        data[4] = 9;
        assert!(matches!(
            decode::<Point>(&data),
            Err(ColumnarError::UnsupportedVersion(9))
        ));
    }

    #[test]
    fn test_ragged_columns_rejected() {
        let mut data = Vec::new();
        data.extend_from_slice(&MAGIC);
        data.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
        let columns = PointColumns {
            x: vec![1, 2],
            label: vec!["only one".to_string()],
        };
        bincode::serialize_into(&mut data, &(2u64, columns)).unwrap();

        assert!(matches!(
            decode::<Point>(&data),
            Err(ColumnarError::RaggedColumn { column: "label", .. })
        ));
    }

    #[test]
    fn test_truncated_body() {
        let data = encode(&points()).unwrap();
        assert!(matches!(
            decode::<Point>(&data[..data.len() - 3]),
            Err(ColumnarError::Codec(_))
        ));
    }
}
