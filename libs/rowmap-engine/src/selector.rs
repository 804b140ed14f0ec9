use rowmap_api::descriptor::{Constructor, TypeDescriptor};
use rowmap_api::error::ConstructionFailure;
use rowmap_api::row::Row;
use rowmap_api::value::{Compat, ParamType, Value};

use crate::error::{MappingError, DIRECT};

/// How one row will be turned into an instance.
#[derive(Debug)]
pub enum Selection<'d, T> {
    /// Single scalar column used as the instance itself.
    Direct,
    /// Declared constructor, with its position in declaration order.
    Constructor {
        index: usize,
        constructor: &'d Constructor<T>,
    },
}

impl<T> Selection<'_, T> {
    pub fn name(&self) -> &str {
        match self {
            Selection::Direct => DIRECT,
            Selection::Constructor { constructor, .. } => constructor.name(),
        }
    }
}

/// Result of checking a whole row against one parameter list.
enum RowCompat {
    Accepts,
    /// First column where a null met a non-nullable parameter; all other
    /// columns were acceptable.
    OnlyNulls { column: usize, param: ParamType },
    Rejects,
}

fn row_compat(params: &[ParamType], values: &[Value], widening: bool) -> RowCompat {
    let mut first_null = None;
    for (column, (param, value)) in params.iter().zip(values).enumerate() {
        match param.accepts(value, widening) {
            Compat::Accepts => {}
            Compat::NullIntoNonNullable if first_null.is_none() => {
                first_null = Some((column, *param));
            }
            Compat::NullIntoNonNullable => {}
            Compat::Rejects => return RowCompat::Rejects,
        }
    }
    match first_null {
        Some((column, param)) => RowCompat::OnlyNulls { column, param },
        None => RowCompat::Accepts,
    }
}

/// Pick how `row` becomes a `T`.
///
/// 1. One column accepted by the scalar parameter → `Direct`.
/// 2. Constructors with arity == column count whose every parameter accepts
///    its column. One match → selected; several → first in declaration order.
/// 3. No match, but some candidate failed only on null columns → construction
///    error with `NullColumn`, raised before any constructor runs.
/// 4. Otherwise → `NoMatchingConstructor`.
pub fn select<'d, T>(
    descriptor: &'d TypeDescriptor<T>,
    row: &Row,
    widening: bool,
) -> Result<Selection<'d, T>, MappingError> {
    let values = row.values();
    let mut null_only: Option<(String, usize, ParamType)> = None;

    if values.len() == 1 {
        if let Some(param) = descriptor.scalar_param() {
            match row_compat(&[param], values, widening) {
                RowCompat::Accepts => return Ok(Selection::Direct),
                RowCompat::OnlyNulls { column, param } => {
                    null_only = Some((DIRECT.to_string(), column, param));
                }
                RowCompat::Rejects => {}
            }
        }
    }

    let mut matches = descriptor
        .constructors()
        .iter()
        .enumerate()
        .filter(|(_, c)| c.arity() == values.len())
        .filter(|(_, c)| match row_compat(c.params(), values, widening) {
            RowCompat::Accepts => true,
            RowCompat::OnlyNulls { column, param } => {
                if null_only.is_none() {
                    null_only = Some((c.name().to_string(), column, param));
                }
                false
            }
            RowCompat::Rejects => false,
        });

    if let Some((index, constructor)) = matches.next() {
        let competing = matches.count();
        if competing > 0 {
            tracing::debug!(
                target_type = %descriptor.type_name(),
                constructor = %constructor,
                competing,
                "several constructors accept the row, using the first declared"
            );
        }
        return Ok(Selection::Constructor { index, constructor });
    }

    if let Some((constructor, column, param)) = null_only {
        return Err(MappingError::Construction {
            type_name: descriptor.type_name().to_string(),
            constructor,
            cause: ConstructionFailure::NullColumn {
                column,
                expected: param.column,
            },
        });
    }

    Err(MappingError::NoMatchingConstructor {
        type_name: descriptor.type_name().to_string(),
        arity: values.len(),
        column_types: row.column_types(),
    })
}
