use serde::{Deserialize, Serialize};

use crate::value::{ColumnType, ParamType};

/// Metadata of one result column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMeta {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    #[serde(default)]
    pub nullable: bool,
}

impl ColumnMeta {
    pub fn new(name: impl Into<String>, column_type: ColumnType, nullable: bool) -> Self {
        Self {
            name: name.into(),
            column_type,
            nullable,
        }
    }

    /// Shortcut: non-nullable column.
    pub fn required(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self::new(name, column_type, false)
    }

    /// Shortcut: nullable column.
    pub fn nullable(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self::new(name, column_type, true)
    }

    /// Parameter type a constructor needs to accept every value of this column.
    pub fn param_type(&self) -> ParamType {
        ParamType {
            column: self.column_type,
            nullable: self.nullable,
        }
    }
}

/// Ordered column metadata of a table or result set.
///
/// Column position is the position of the value in a `Row`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowSchema {
    pub columns: Vec<ColumnMeta>,
}

impl RowSchema {
    pub fn new(columns: Vec<ColumnMeta>) -> Self {
        Self { columns }
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}
