use serde::{Deserialize, Serialize};

// ════════════════════════════════════════════════════════════════
//  Column Type
// ════════════════════════════════════════════════════════════════

/// Runtime type of a column value.
///
/// Nullability is not part of the column type: a `Null` value has no
/// column type at all, and whether a parameter may receive it is decided
/// by [`ParamType::nullable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    Bool,
    Int16,
    Int32,
    Int64,
    Float32,
    Float64,
    String,
    Bytes,
}

impl ColumnType {
    /// Lossless numeric widening: `int16 → int32 → int64`, `float32 → float64`.
    ///
    /// Returns `true` when a value of type `from` can be stored in `self`
    /// without loss. Identity is not widening.
    pub fn widens_from(self, from: ColumnType) -> bool {
        matches!(
            (from, self),
            (ColumnType::Int16, ColumnType::Int32)
                | (ColumnType::Int16, ColumnType::Int64)
                | (ColumnType::Int32, ColumnType::Int64)
                | (ColumnType::Float32, ColumnType::Float64)
        )
    }

    /// Rust type used for a column of this type in generated code.
    pub fn rust_type(self) -> &'static str {
        match self {
            ColumnType::Bool => "bool",
            ColumnType::Int16 => "i16",
            ColumnType::Int32 => "i32",
            ColumnType::Int64 => "i64",
            ColumnType::Float32 => "f32",
            ColumnType::Float64 => "f64",
            ColumnType::String => "String",
            ColumnType::Bytes => "Vec<u8>",
        }
    }
}

impl std::fmt::Display for ColumnType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ColumnType::Bool => write!(f, "bool"),
            ColumnType::Int16 => write!(f, "int16"),
            ColumnType::Int32 => write!(f, "int32"),
            ColumnType::Int64 => write!(f, "int64"),
            ColumnType::Float32 => write!(f, "float32"),
            ColumnType::Float64 => write!(f, "float64"),
            ColumnType::String => write!(f, "string"),
            ColumnType::Bytes => write!(f, "bytes"),
        }
    }
}

// ════════════════════════════════════════════════════════════════
//  Param Type
// ════════════════════════════════════════════════════════════════

/// Outcome of checking one column value against one parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compat {
    Accepts,
    /// The only problem is a null value meeting a non-nullable parameter.
    NullIntoNonNullable,
    Rejects,
}

/// Declared type of a constructor parameter (or of a scalar target).
///
/// `i32` is `{ int32, nullable: false }`, `Option<i32>` is
/// `{ int32, nullable: true }`. Both accept an `Int32` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ParamType {
    pub column: ColumnType,
    pub nullable: bool,
}

impl ParamType {
    pub const fn required(column: ColumnType) -> Self {
        Self { column, nullable: false }
    }

    pub const fn nullable(column: ColumnType) -> Self {
        Self { column, nullable: true }
    }

    /// Compatibility table between a parameter and a column value.
    pub fn accepts(&self, value: &Value, widening: bool) -> Compat {
        match value.column_type() {
            None if self.nullable => Compat::Accepts,
            None => Compat::NullIntoNonNullable,
            Some(actual) if actual == self.column => Compat::Accepts,
            Some(actual) if widening && self.column.widens_from(actual) => Compat::Accepts,
            Some(_) => Compat::Rejects,
        }
    }
}

impl std::fmt::Display for ParamType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.nullable {
            write!(f, "{}?", self.column)
        } else {
            write!(f, "{}", self.column)
        }
    }
}

// ════════════════════════════════════════════════════════════════
//  Value
// ════════════════════════════════════════════════════════════════

/// One column value as produced by a row source.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Float32(f32),
    Float64(f64),
    String(String),
    /// Opaque binary data (UUID, BLOB, etc.).
    Bytes(Vec<u8>),
    Null,
}

impl Value {
    /// Runtime type of the value, `None` for `Null`.
    pub fn column_type(&self) -> Option<ColumnType> {
        match self {
            Value::Bool(_) => Some(ColumnType::Bool),
            Value::Int16(_) => Some(ColumnType::Int16),
            Value::Int32(_) => Some(ColumnType::Int32),
            Value::Int64(_) => Some(ColumnType::Int64),
            Value::Float32(_) => Some(ColumnType::Float32),
            Value::Float64(_) => Some(ColumnType::Float64),
            Value::String(_) => Some(ColumnType::String),
            Value::Bytes(_) => Some(ColumnType::Bytes),
            Value::Null => None,
        }
    }
}

macro_rules! value_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v)
                }
            }
        )*
    };
}

value_from! {
    bool => Bool,
    i16 => Int16,
    i32 => Int32,
    i64 => Int64,
    f32 => Float32,
    f64 => Float64,
    String => String,
    Vec<u8> => Bytes,
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boxed_and_primitive_forms_accept_same_value() {
        let v = Value::Int32(7);
        assert_eq!(ParamType::required(ColumnType::Int32).accepts(&v, false), Compat::Accepts);
        assert_eq!(ParamType::nullable(ColumnType::Int32).accepts(&v, false), Compat::Accepts);
    }

    #[test]
    fn null_only_fits_nullable_params() {
        assert_eq!(
            ParamType::nullable(ColumnType::String).accepts(&Value::Null, false),
            Compat::Accepts
        );
        assert_eq!(
            ParamType::required(ColumnType::String).accepts(&Value::Null, false),
            Compat::NullIntoNonNullable
        );
    }

    #[test]
    fn widening_is_opt_in() {
        let v = Value::Int32(1);
        let p = ParamType::required(ColumnType::Int64);
        assert_eq!(p.accepts(&v, false), Compat::Rejects);
        assert_eq!(p.accepts(&v, true), Compat::Accepts);
        // Never narrows.
        let narrow = ParamType::required(ColumnType::Int16);
        assert_eq!(narrow.accepts(&v, true), Compat::Rejects);
    }

    #[test]
    fn option_converts_to_null() {
        assert_eq!(Value::from(None::<i64>), Value::Null);
        assert_eq!(Value::from(Some("x")), Value::String("x".into()));
    }
}
