//! Columnar chunk decoding (the self-describing shape).
//!
//! One pass per vector produces a typed column; one assembly pass zips the
//! columns into pre-sized row tuples, moving the values (no per-cell
//! clones). Constant vectors decode their scalar once and project it.
//! A vector whose payload does not match its declared type decodes to a
//! column of nulls — a chunk never fails to decode.

use tracing::warn;

use e6r_schemas::{Chunk, Vector, VectorData, VectorType};

use crate::decimal::decimal_from_binary;
use crate::temporal::{date_from_micros, datetime_from_micros, zoned_from_micros};
use crate::value::Value;

/// Project a chunk into `chunk.size` rows; row `i`'s `j`-th element comes
/// from `chunk.vectors[j]`. An empty chunk returns no rows without touching
/// any vector payload.
pub fn decode_chunk(chunk: &Chunk) -> Vec<Vec<Value>> {
    let size = usize::try_from(chunk.size).unwrap_or(0);
    if size == 0 {
        return Vec::new();
    }

    // Pass 1: one typed column per vector.
    let columns: Vec<Vec<Value>> = chunk
        .vectors
        .iter()
        .map(|v| decode_vector(v, size))
        .collect();

    // Pass 2: transpose into rows, moving values out of the columns.
    let mut cursors: Vec<std::vec::IntoIter<Value>> =
        columns.into_iter().map(Vec::into_iter).collect();
    let mut rows = Vec::with_capacity(size);
    for _ in 0..size {
        let mut row = Vec::with_capacity(cursors.len());
        for cursor in &mut cursors {
            row.push(cursor.next().unwrap_or(Value::Null));
        }
        rows.push(row);
    }
    rows
}

fn decode_vector(vector: &Vector, size: usize) -> Vec<Value> {
    if vector.constant {
        // One decode, projected across every row. A one-element null mask
        // set to true nulls the whole column regardless of the payload.
        if vector.null_at(0) {
            return vec![Value::Null; size];
        }
        let scalar = decode_constant(vector);
        let mut column = Vec::with_capacity(size);
        for _ in 0..size {
            column.push(scalar.clone());
        }
        column
    } else {
        let mut column = Vec::with_capacity(size);
        for i in 0..size {
            if vector.null_at(i) {
                column.push(Value::Null);
            } else {
                column.push(decode_cell(vector, i));
            }
        }
        column
    }
}

/// Row `i` of a per-row vector. Any mismatch between the declared type and
/// the payload (or an out-of-range temporal) yields null.
fn decode_cell(vector: &Vector, i: usize) -> Value {
    match (vector.vtype, &vector.data) {
        (VectorType::Long, VectorData::Long { values }) => {
            values.get(i).map_or(Value::Null, |v| Value::Int(*v))
        }
        (VectorType::Integer, VectorData::Int32 { values }) => {
            values.get(i).map_or(Value::Null, |v| Value::Int(i64::from(*v)))
        }
        (VectorType::Double, VectorData::Double { values }) => {
            values.get(i).map_or(Value::Null, |v| Value::Float(*v))
        }
        (VectorType::Float, VectorData::Float32 { values }) => values
            .get(i)
            .map_or(Value::Null, |v| Value::Float(f64::from(*v))),
        (VectorType::Boolean, VectorData::Bool { values }) => {
            values.get(i).map_or(Value::Null, |v| Value::Bool(*v))
        }
        (
            VectorType::String | VectorType::Array | VectorType::Map | VectorType::Struct,
            VectorData::Utf8 { values },
        ) => values
            .get(i)
            .map_or(Value::Null, |v| Value::Str(v.clone())),
        (VectorType::Binary, VectorData::Binary { values }) => values
            .get(i)
            .map_or(Value::Null, |v| Value::Bytes(v.clone())),
        (VectorType::Date, VectorData::Long { values }) => values
            .get(i)
            .and_then(|m| date_from_micros(*m))
            .map_or(Value::Null, Value::Date),
        (VectorType::DateTime, VectorData::Long { values }) => values
            .get(i)
            .and_then(|m| datetime_from_micros(*m))
            .map_or(Value::Null, Value::DateTime),
        (VectorType::TimestampTz, VectorData::TimestampTz { micros, zones }) => {
            let zone = zones.get(i).map(String::as_str).unwrap_or(&vector.zone);
            micros
                .get(i)
                .and_then(|m| zoned_from_micros(*m, zone))
                .map_or(Value::Null, Value::Zoned)
        }
        (VectorType::Decimal128, VectorData::Decimal128 { values }) => values
            .get(i)
            .map_or(Value::Null, |raw| Value::Decimal(decimal_from_binary(raw))),
        (VectorType::Null, _) => Value::Null,
        (vtype, _) => {
            if i == 0 {
                warn!(?vtype, "vector payload does not match declared type; column decodes as null");
            }
            Value::Null
        }
    }
}

/// The scalar of a constant vector. Constant payloads arrive widened
/// (integers as `i64`, floats as `f64`) regardless of the column type.
fn decode_constant(vector: &Vector) -> Value {
    match (vector.vtype, &vector.data) {
        (VectorType::Long | VectorType::Integer, VectorData::ConstLong(v)) => Value::Int(*v),
        (VectorType::Double | VectorType::Float, VectorData::ConstDouble(v)) => Value::Float(*v),
        (VectorType::Boolean, VectorData::ConstBool(v)) => Value::Bool(*v),
        (
            VectorType::String | VectorType::Array | VectorType::Map | VectorType::Struct,
            VectorData::ConstUtf8(v),
        ) => Value::Str(v.clone()),
        (VectorType::Binary, VectorData::ConstBinary(v)) => Value::Bytes(v.clone()),
        (VectorType::Date, VectorData::ConstLong(m)) => {
            date_from_micros(*m).map_or(Value::Null, Value::Date)
        }
        (VectorType::DateTime, VectorData::ConstLong(m)) => {
            datetime_from_micros(*m).map_or(Value::Null, Value::DateTime)
        }
        (VectorType::TimestampTz, VectorData::ConstTimestampTz { micros, zone }) => {
            zoned_from_micros(*micros, zone).map_or(Value::Null, Value::Zoned)
        }
        (VectorType::Decimal128, VectorData::ConstDecimal128(raw)) => {
            Value::Decimal(decimal_from_binary(raw))
        }
        (VectorType::Null, _) => Value::Null,
        (vtype, _) => {
            warn!(?vtype, "constant payload does not match declared type; column decodes as null");
            Value::Null
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn plain_vector(vtype: VectorType, nulls: Vec<bool>, data: VectorData) -> Vector {
        Vector {
            size: nulls.len() as i32,
            vtype,
            nulls,
            constant: false,
            zone: String::new(),
            format: String::new(),
            data,
        }
    }

    fn const_vector(size: i32, vtype: VectorType, nulls: Vec<bool>, data: VectorData) -> Vector {
        Vector {
            size,
            vtype,
            nulls,
            constant: true,
            zone: String::new(),
            format: String::new(),
            data,
        }
    }

    #[test]
    fn empty_chunk_decodes_to_no_rows() {
        let chunk = Chunk {
            size: 0,
            vectors: vec![plain_vector(
                VectorType::Long,
                vec![],
                // Deliberately inconsistent payload: an empty chunk must not
                // look at it.
                VectorData::Utf8 { values: vec![] },
            )],
        };
        assert!(decode_chunk(&chunk).is_empty());
    }

    #[test]
    fn mixed_nulls_and_constant_project_together() {
        let chunk = Chunk {
            size: 3,
            vectors: vec![
                plain_vector(
                    VectorType::Long,
                    vec![false, true, false],
                    VectorData::Long { values: vec![7, 8, 9] },
                ),
                const_vector(
                    3,
                    VectorType::String,
                    vec![false],
                    VectorData::ConstUtf8("x".to_string()),
                ),
            ],
        };
        let rows = decode_chunk(&chunk);
        assert_eq!(
            rows,
            vec![
                vec![Value::Int(7), Value::Str("x".to_string())],
                vec![Value::Null, Value::Str("x".to_string())],
                vec![Value::Int(9), Value::Str("x".to_string())],
            ]
        );
    }

    #[test]
    fn all_null_vector_ignores_payload_length() {
        let chunk = Chunk {
            size: 3,
            vectors: vec![plain_vector(
                VectorType::Long,
                vec![true, true, true],
                // Payload shorter than the row count: must be ignored.
                VectorData::Long { values: vec![1] },
            )],
        };
        let rows = decode_chunk(&chunk);
        assert_eq!(rows.len(), 3);
        assert!(rows.iter().all(|r| r[0] == Value::Null));
    }

    #[test]
    fn constant_null_vector_nulls_every_row() {
        let chunk = Chunk {
            size: 2,
            vectors: vec![const_vector(
                2,
                VectorType::String,
                vec![true],
                VectorData::ConstUtf8("ignored".to_string()),
            )],
        };
        let rows = decode_chunk(&chunk);
        assert_eq!(rows, vec![vec![Value::Null], vec![Value::Null]]);
    }

    #[test]
    fn mismatched_payload_decodes_as_null_column() {
        let chunk = Chunk {
            size: 2,
            vectors: vec![plain_vector(
                VectorType::Long,
                vec![false, false],
                VectorData::Utf8 {
                    values: vec!["7".to_string(), "8".to_string()],
                },
            )],
        };
        let rows = decode_chunk(&chunk);
        assert_eq!(rows, vec![vec![Value::Null], vec![Value::Null]]);
    }

    #[test]
    fn temporal_columns_render_in_utc() {
        let chunk = Chunk {
            size: 1,
            vectors: vec![
                plain_vector(
                    VectorType::Date,
                    vec![false],
                    VectorData::Long { values: vec![1_688_472_000_000_000] },
                ),
                plain_vector(
                    VectorType::DateTime,
                    vec![false],
                    VectorData::Long { values: vec![1_688_472_000_123_000] },
                ),
            ],
        };
        let rows = decode_chunk(&chunk);
        assert_eq!(rows[0][0].to_string(), "2023-07-04");
        assert_eq!(rows[0][1].to_string(), "2023-07-04T12:00:00.123");
    }

    #[test]
    fn timestamp_tz_uses_per_row_zone() {
        let chunk = Chunk {
            size: 2,
            vectors: vec![plain_vector(
                VectorType::TimestampTz,
                vec![false, false],
                VectorData::TimestampTz {
                    micros: vec![0, 0],
                    zones: vec!["America/New_York".to_string(), "UTC".to_string()],
                },
            )],
        };
        let rows = decode_chunk(&chunk);
        assert_eq!(rows[0][0].to_string(), "1969-12-31T19:00:00.000-05:00");
        assert_eq!(rows[1][0].to_string(), "1970-01-01T00:00:00.000+00:00");
    }

    #[test]
    fn negative_epoch_constant_date_lands_on_previous_day() {
        let chunk = Chunk {
            size: 2,
            vectors: vec![const_vector(
                2,
                VectorType::Date,
                vec![false],
                VectorData::ConstLong(-1),
            )],
        };
        let rows = decode_chunk(&chunk);
        assert_eq!(rows[0][0].to_string(), "1969-12-31");
        assert_eq!(rows[1][0], rows[0][0]);
    }

    #[test]
    fn decimal_column_decodes_binary_payloads() {
        let chunk = Chunk {
            size: 2,
            vectors: vec![plain_vector(
                VectorType::Decimal128,
                vec![false, false],
                VectorData::Decimal128 {
                    values: vec![vec![0u8; 16], vec![0u8; 3]],
                },
            )],
        };
        let rows = decode_chunk(&chunk);
        // 16 zero bytes and a wrong-length payload both decode to zero.
        assert_eq!(rows[0][0], Value::Decimal(bigdecimal::BigDecimal::from(0)));
        assert_eq!(rows[1][0], Value::Decimal(bigdecimal::BigDecimal::from(0)));
    }

    #[test]
    fn row_shape_matches_vector_count() {
        let chunk = Chunk {
            size: 2,
            vectors: vec![
                plain_vector(
                    VectorType::Boolean,
                    vec![false, false],
                    VectorData::Bool { values: vec![true, false] },
                ),
                const_vector(2, VectorType::Integer, vec![], VectorData::ConstLong(5)),
                plain_vector(
                    VectorType::Double,
                    vec![false, false],
                    VectorData::Double { values: vec![1.5, -2.5] },
                ),
            ],
        };
        let rows = decode_chunk(&chunk);
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.len() == 3));
        assert_eq!(rows[1], vec![Value::Bool(false), Value::Int(5), Value::Float(-2.5)]);
    }
}
