use rowmap_api::descriptor::TypeDescriptor;
use rowmap_api::row::Row;
use rowmap_api::value::Value;

use crate::error::{MappingError, DIRECT};
use crate::selector::Selection;

/// Materialize `row` through the selected constructor.
///
/// `Direct` returns the single column value itself. Any failure is wrapped
/// as `MappingError::Construction` with the original cause preserved.
pub fn instantiate<T>(
    descriptor: &TypeDescriptor<T>,
    selection: &Selection<'_, T>,
    row: Row,
) -> Result<T, MappingError> {
    let construction_error = |constructor: &str, cause| MappingError::Construction {
        type_name: descriptor.type_name().to_string(),
        constructor: constructor.to_string(),
        cause,
    };

    match selection {
        Selection::Direct => {
            let value = row.into_values().into_iter().next().unwrap_or(Value::Null);
            descriptor
                .convert_direct(value)
                .map_err(|cause| construction_error(DIRECT, cause))
        }
        Selection::Constructor { constructor, .. } => constructor
            .invoke(row.into_values())
            .map_err(|cause| construction_error(constructor.name(), cause)),
    }
}
