//! Field data model: scalar types, vector widths, on-disk layout and codec.

use crate::error::{Error, Result};

/// The scalar element type of a field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScalarType {
    /// Signed 8-bit integer.
    Int8,
    /// Unsigned 8-bit integer.
    Uint8,
    /// Signed 16-bit integer.
    Int16,
    /// Unsigned 16-bit integer.
    Uint16,
    /// Signed 32-bit integer.
    Int32,
    /// Unsigned 32-bit integer.
    Uint32,
    /// Signed 64-bit integer.
    Int64,
    /// Unsigned 64-bit integer.
    Uint64,
    /// IEEE-754 single precision float.
    Float32,
    /// IEEE-754 double precision float.
    Float64,
}

impl ScalarType {
    /// Size of one scalar, in bytes.
    pub fn bytes(self) -> usize {
        match self {
            ScalarType::Int8 | ScalarType::Uint8 => 1,
            ScalarType::Int16 | ScalarType::Uint16 => 2,
            ScalarType::Int32 | ScalarType::Uint32 | ScalarType::Float32 => 4,
            ScalarType::Int64 | ScalarType::Uint64 | ScalarType::Float64 => 8,
        }
    }

    /// Parses one of the token names used in the text descriptor
    /// (`int8`, `uint8`, ..., `float64`).
    pub fn parse(s: &str) -> Result<ScalarType> {
        match s {
            "int8" => Ok(ScalarType::Int8),
            "uint8" => Ok(ScalarType::Uint8),
            "int16" => Ok(ScalarType::Int16),
            "uint16" => Ok(ScalarType::Uint16),
            "int32" => Ok(ScalarType::Int32),
            "uint32" => Ok(ScalarType::Uint32),
            "int64" => Ok(ScalarType::Int64),
            "uint64" => Ok(ScalarType::Uint64),
            "float32" => Ok(ScalarType::Float32),
            "float64" => Ok(ScalarType::Float64),
            _ => Err(Error::ParseError(format!("unknown scalar type: {s}"))),
        }
    }

    /// The token name used in the text descriptor.
    pub fn name(self) -> &'static str {
        match self {
            ScalarType::Int8 => "int8",
            ScalarType::Uint8 => "uint8",
            ScalarType::Int16 => "int16",
            ScalarType::Uint16 => "uint16",
            ScalarType::Int32 => "int32",
            ScalarType::Uint32 => "uint32",
            ScalarType::Int64 => "int64",
            ScalarType::Uint64 => "uint64",
            ScalarType::Float32 => "float32",
            ScalarType::Float64 => "float64",
        }
    }
}

/// A scalar type with a component count, e.g. `float64*3` for an xyz vector.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldType {
    /// The element scalar type.
    pub scalar: ScalarType,
    /// Number of components per sample. `1` for a plain scalar field.
    pub components: u32,
}

impl FieldType {
    /// Creates a scalar (single-component) field type.
    pub fn scalar(scalar: ScalarType) -> FieldType {
        FieldType {
            scalar,
            components: 1,
        }
    }

    /// Total size of one sample, in bytes. Always one of `{1, 2, 4, 8, 16}`
    /// for the component counts this format actually sees in practice.
    pub fn bytes(self) -> usize {
        self.scalar.bytes() * self.components as usize
    }
}

/// On-disk sample ordering of a block's payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Layout {
    /// Samples stored in row-major (x fastest) order. The only layout the
    /// write engine emits.
    RowMajor,
    /// Samples stored in HZ-curve order. Readers must accept it even though
    /// nothing in this crate writes it.
    Hz,
}

/// Block payload compression.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Compression {
    /// Invalid/unset tag.
    Invalid,
    /// Payload bytes equal `sample_count * type.bytes()` exactly.
    None,
    /// Raw DEFLATE stream.
    Zip,
    /// JPEG. Recognized, not implemented.
    Jpg,
    /// OpenEXR. Recognized, not implemented.
    Exr,
    /// PNG. Recognized, not implemented.
    Png,
    /// ZFP. Recognized, not implemented.
    Zfp,
}

impl Layout {
    pub(crate) fn from_tag(tag: i32) -> Result<Layout> {
        match tag {
            0 => Ok(Layout::RowMajor),
            1 => Ok(Layout::Hz),
            _ => Err(Error::InvalidFormat),
        }
    }

    pub(crate) fn tag(self) -> i32 {
        match self {
            Layout::RowMajor => 0,
            Layout::Hz => 1,
        }
    }
}

impl Compression {
    pub(crate) fn from_tag(tag: i32) -> Compression {
        match tag {
            1 => Compression::None,
            2 => Compression::Zip,
            3 => Compression::Jpg,
            4 => Compression::Exr,
            5 => Compression::Png,
            6 => Compression::Zfp,
            _ => Compression::Invalid,
        }
    }

    pub(crate) fn tag(self) -> i32 {
        match self {
            Compression::Invalid => 0,
            Compression::None => 1,
            Compression::Zip => 2,
            Compression::Jpg => 3,
            Compression::Exr => 4,
            Compression::Png => 5,
            Compression::Zfp => 6,
        }
    }
}

/// One named field of the dataset.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Field {
    /// The field's name, unique within a descriptor.
    pub name: String,
    /// The scalar/vector type of one sample.
    pub ty: FieldType,
    /// On-disk block layout for this field.
    pub layout: Layout,
    /// The codec applied to this field's block payloads.
    pub compression: Compression,
}

impl Field {
    /// Creates a new field with the default `RowMajor` layout and `None`
    /// compression.
    pub fn new(name: impl Into<String>, ty: FieldType) -> Field {
        Field {
            name: name.into(),
            ty,
            layout: Layout::RowMajor,
            compression: Compression::None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_bytes() {
        assert_eq!(ScalarType::Int8.bytes(), 1);
        assert_eq!(ScalarType::Float64.bytes(), 8);
    }

    #[test]
    fn field_type_bytes() {
        let ty = FieldType {
            scalar: ScalarType::Float64,
            components: 2,
        };
        assert_eq!(ty.bytes(), 16);
    }

    #[test]
    fn parse_roundtrip() {
        for name in ["int8", "uint32", "float64"] {
            assert_eq!(ScalarType::parse(name).unwrap().name(), name);
        }
        assert!(ScalarType::parse("bogus").is_err());
    }

    #[test]
    fn compression_tag_roundtrip() {
        for c in [
            Compression::None,
            Compression::Zip,
            Compression::Jpg,
            Compression::Exr,
            Compression::Png,
            Compression::Zfp,
        ] {
            assert_eq!(Compression::from_tag(c.tag()), c);
        }
    }
}
