//! Row-metadata stream encoders (test-side mirror of the decoder).
//!
//! Big-endian throughout: `int64 rowCount`, `int32 fieldCount`, length-
//! prefixed field descriptors, then presence-flagged typed cells.

use bytes::BufMut;

use e6r_schemas::FieldInfo;

/// One encoded cell of a wire row.
#[derive(Debug, Clone)]
pub enum WireCell {
    Null,
    I64(i64),
    I32(i32),
    I16(i16),
    I8(i8),
    F32(f32),
    F64(f64),
    Bool(bool),
    Bytes(Vec<u8>),
    Str(String),
    /// DECIMAL128 travels as decimal text on this wire shape.
    DecimalText(String),
    Int96 { julian_day: i32, nanos: i64 },
}

fn put_utf(out: &mut Vec<u8>, text: &str) {
    out.put_u16(text.len() as u16);
    out.put_slice(text.as_bytes());
}

fn put_fields(out: &mut Vec<u8>, row_count: i64, fields: &[FieldInfo]) {
    out.put_i64(row_count);
    out.put_i32(fields.len() as i32);
    for field in fields {
        put_utf(out, &field.name);
        put_utf(out, &field.field_type);
        put_utf(out, &field.zone);
        put_utf(out, &field.format);
    }
}

/// Header-only blob (the get-result-metadata payload).
pub fn encode_result_meta(row_count: i64, fields: &[FieldInfo]) -> Vec<u8> {
    let mut out = Vec::new();
    put_fields(&mut out, row_count, fields);
    out
}

/// Full batch blob: header plus presence-flagged rows.
pub fn encode_batch(fields: &[FieldInfo], rows: &[Vec<WireCell>]) -> Vec<u8> {
    let mut out = Vec::new();
    put_fields(&mut out, rows.len() as i64, fields);
    for row in rows {
        for cell in row {
            if matches!(cell, WireCell::Null) {
                out.put_i8(0);
                continue;
            }
            out.put_i8(1);
            match cell {
                WireCell::Null => {}
                WireCell::I64(v) => out.put_i64(*v),
                WireCell::I32(v) => out.put_i32(*v),
                WireCell::I16(v) => out.put_i16(*v),
                WireCell::I8(v) => out.put_i8(*v),
                WireCell::F32(v) => out.put_f32(*v),
                WireCell::F64(v) => out.put_f64(*v),
                WireCell::Bool(v) => out.put_u8(u8::from(*v)),
                WireCell::Bytes(v) => {
                    out.put_u16(v.len() as u16);
                    out.put_slice(v);
                }
                WireCell::Str(v) | WireCell::DecimalText(v) => put_utf(&mut out, v),
                WireCell::Int96 { julian_day, nanos } => {
                    out.put_i32(*julian_day);
                    out.put_i64(*nanos);
                }
            }
        }
    }
    out
}
