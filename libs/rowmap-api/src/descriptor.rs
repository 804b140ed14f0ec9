use std::fmt;

use crate::error::ConstructionFailure;
use crate::value::{ColumnType, ParamType, Value};

// ════════════════════════════════════════════════════════════════
//  FromValue
// ════════════════════════════════════════════════════════════════

/// A Rust type that a single column value converts into.
///
/// `PARAM` is the declared parameter type used by constructor selection;
/// `from_value` performs the conversion at invocation time. Conversion also
/// accepts lossless numeric widening, since the selector already decided
/// whether widening is permitted for the call.
pub trait FromValue: Sized {
    const PARAM: ParamType;

    fn from_value(value: Value, column: usize) -> Result<Self, ConstructionFailure>;
}

fn mismatch(value: &Value, column: usize, expected: ColumnType) -> ConstructionFailure {
    match value.column_type() {
        Some(actual) => ConstructionFailure::TypeMismatch {
            column,
            expected,
            actual,
        },
        None => ConstructionFailure::NullColumn { column, expected },
    }
}

macro_rules! from_value {
    ($ty:ty, $column:ident, $($variant:ident),+) => {
        impl FromValue for $ty {
            const PARAM: ParamType = ParamType::required(ColumnType::$column);

            fn from_value(value: Value, column: usize) -> Result<Self, ConstructionFailure> {
                match value {
                    $(Value::$variant(v) => Ok(v.into()),)+
                    other => Err(mismatch(&other, column, ColumnType::$column)),
                }
            }
        }
    };
}

from_value!(bool, Bool, Bool);
from_value!(i16, Int16, Int16);
from_value!(i32, Int32, Int32, Int16);
from_value!(i64, Int64, Int64, Int32, Int16);
from_value!(f32, Float32, Float32);
from_value!(f64, Float64, Float64, Float32);
from_value!(String, String, String);
from_value!(Vec<u8>, Bytes, Bytes);

impl<T: FromValue> FromValue for Option<T> {
    const PARAM: ParamType = ParamType::nullable(T::PARAM.column);

    fn from_value(value: Value, column: usize) -> Result<Self, ConstructionFailure> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other, column).map(Some),
        }
    }
}

// ════════════════════════════════════════════════════════════════
//  Args
// ════════════════════════════════════════════════════════════════

/// Row values handed to a constructor, consumed left to right.
pub struct Args {
    values: std::vec::IntoIter<Value>,
    column: usize,
    total: usize,
}

impl Args {
    pub fn new(values: Vec<Value>) -> Self {
        let total = values.len();
        Self {
            values: values.into_iter(),
            column: 0,
            total,
        }
    }

    /// Convert the next column into `A`.
    pub fn take<A: FromValue>(&mut self) -> Result<A, ConstructionFailure> {
        let column = self.column;
        let value = self.values.next().ok_or(ConstructionFailure::Arity {
            expected: column + 1,
            actual: self.total,
        })?;
        self.column += 1;
        A::from_value(value, column)
    }
}

// ════════════════════════════════════════════════════════════════
//  Constructor
// ════════════════════════════════════════════════════════════════

type Invoke<T> = Box<dyn Fn(&mut Args) -> Result<T, ConstructionFailure> + Send + Sync>;

/// One way to build `T` from a row: ordered parameter types + invocation.
pub struct Constructor<T> {
    name: String,
    params: Vec<ParamType>,
    invoke: Invoke<T>,
}

impl<T> Constructor<T> {
    pub fn new<F>(name: impl Into<String>, params: Vec<ParamType>, invoke: F) -> Self
    where
        F: Fn(&mut Args) -> Result<T, ConstructionFailure> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            params,
            invoke: Box::new(invoke),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &[ParamType] {
        &self.params
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// Call the constructor with one value per declared parameter.
    pub fn invoke(&self, values: Vec<Value>) -> Result<T, ConstructionFailure> {
        if values.len() != self.params.len() {
            return Err(ConstructionFailure::Arity {
                expected: self.params.len(),
                actual: values.len(),
            });
        }
        let mut args = Args::new(values);
        (self.invoke)(&mut args)
    }
}

impl<T> fmt::Debug for Constructor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Constructor")
            .field("name", &self.name)
            .field("params", &self.params)
            .finish()
    }
}

impl<T> fmt::Display for Constructor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        for (i, p) in self.params.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{p}")?;
        }
        f.write_str(")")
    }
}

// ════════════════════════════════════════════════════════════════
//  TypeDescriptor
// ════════════════════════════════════════════════════════════════

struct Scalar<T> {
    param: ParamType,
    convert: fn(Value, usize) -> Result<T, ConstructionFailure>,
}

/// Everything the engine knows about a mapping target.
///
/// - `scalar`: set for leaf types whose single-column value is used as-is.
/// - `constructors`: declaration order. This order is the tie-break when
///   several constructors accept the same row.
pub struct TypeDescriptor<T> {
    type_name: String,
    scalar: Option<Scalar<T>>,
    constructors: Vec<Constructor<T>>,
}

impl<T> TypeDescriptor<T> {
    pub fn builder(type_name: impl Into<String>) -> TypeDescriptorBuilder<T> {
        TypeDescriptorBuilder {
            descriptor: TypeDescriptor {
                type_name: type_name.into(),
                scalar: None,
                constructors: Vec::new(),
            },
        }
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn scalar_param(&self) -> Option<ParamType> {
        self.scalar.as_ref().map(|s| s.param)
    }

    pub fn constructors(&self) -> &[Constructor<T>] {
        &self.constructors
    }

    /// Use a single column value as the instance, no constructor involved.
    pub fn convert_direct(&self, value: Value) -> Result<T, ConstructionFailure> {
        match &self.scalar {
            Some(scalar) => (scalar.convert)(value, 0),
            None => Err(ConstructionFailure::rejected(format!(
                "{} is not a scalar type",
                self.type_name
            ))),
        }
    }
}

impl<T: FromValue> TypeDescriptor<T> {
    /// Descriptor of a scalar leaf type: no constructors, direct passthrough.
    pub fn scalar(type_name: impl Into<String>) -> Self {
        Self::builder(type_name).scalar().build()
    }
}

impl<T> fmt::Debug for TypeDescriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("type_name", &self.type_name)
            .field("scalar", &self.scalar_param())
            .field("constructors", &self.constructors)
            .finish()
    }
}

pub struct TypeDescriptorBuilder<T> {
    descriptor: TypeDescriptor<T>,
}

impl<T> TypeDescriptorBuilder<T> {
    /// Append a constructor. Call order is declaration order.
    pub fn constructor<F>(mut self, name: impl Into<String>, params: Vec<ParamType>, invoke: F) -> Self
    where
        F: Fn(&mut Args) -> Result<T, ConstructionFailure> + Send + Sync + 'static,
    {
        self.descriptor
            .constructors
            .push(Constructor::new(name, params, invoke));
        self
    }

    pub fn build(self) -> TypeDescriptor<T> {
        self.descriptor
    }
}

impl<T: FromValue> TypeDescriptorBuilder<T> {
    /// Mark the type scalar-compatible with its own `FromValue::PARAM`.
    pub fn scalar(mut self) -> Self {
        self.descriptor.scalar = Some(Scalar {
            param: T::PARAM,
            convert: T::from_value,
        });
        self
    }
}

// ════════════════════════════════════════════════════════════════
//  MapTarget
// ════════════════════════════════════════════════════════════════

/// A type rows can be materialized into.
///
/// Implemented by `#[derive(MapTarget)]` for structs, by hand through
/// [`TypeDescriptor::builder`], and below for the scalar leaf types.
pub trait MapTarget: Sized + 'static {
    fn descriptor() -> TypeDescriptor<Self>;
}

macro_rules! scalar_target {
    ($($ty:ty),* $(,)?) => {
        $(
            impl MapTarget for $ty {
                fn descriptor() -> TypeDescriptor<Self> {
                    TypeDescriptor::scalar(stringify!($ty))
                }
            }

            impl MapTarget for Option<$ty> {
                fn descriptor() -> TypeDescriptor<Self> {
                    TypeDescriptor::scalar(concat!("Option<", stringify!($ty), ">"))
                }
            }
        )*
    };
}

scalar_target!(bool, i16, i32, i64, f32, f64, String, Vec<u8>);
