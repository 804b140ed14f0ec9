use std::collections::VecDeque;

use crate::error::SourceError;
use crate::value::{ColumnType, Value};

/// One query result row: positional column values.
///
/// A scalar query result is a row of exactly one column.
#[derive(Debug, Clone, PartialEq)]
pub struct Row(Vec<Value>);

impl Row {
    pub fn new(values: Vec<Value>) -> Self {
        Self(values)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn values(&self) -> &[Value] {
        &self.0
    }

    pub fn into_values(self) -> Vec<Value> {
        self.0
    }

    /// Runtime type per column, `None` for null columns.
    pub fn column_types(&self) -> Vec<Option<ColumnType>> {
        self.0.iter().map(Value::column_type).collect()
    }
}

impl From<Value> for Row {
    fn from(v: Value) -> Self {
        Row(vec![v])
    }
}

impl From<Vec<Value>> for Row {
    fn from(values: Vec<Value>) -> Self {
        Row(values)
    }
}

/// Build a [`Row`] from heterogeneous values: `row![1, "Peter Muster"]`.
#[macro_export]
macro_rules! row {
    ($($v:expr),* $(,)?) => {
        $crate::row::Row::new(vec![$($crate::value::Value::from($v)),*])
    };
}

/// Producer of rows for an already executed query.
///
/// The mapping engine only pulls rows; cursor, connection and transaction
/// handling belong to the implementor.
pub trait RowSource {
    /// Next row, or `None` once the result is exhausted.
    fn next_row(&mut self) -> Result<Option<Row>, SourceError>;
}

impl<S: RowSource + ?Sized> RowSource for &mut S {
    fn next_row(&mut self) -> Result<Option<Row>, SourceError> {
        (**self).next_row()
    }
}

impl<S: RowSource + ?Sized> RowSource for Box<S> {
    fn next_row(&mut self) -> Result<Option<Row>, SourceError> {
        (**self).next_row()
    }
}

// ═══════════════════════════════════════════════════════════════
//  MemoryRowSource
// ═══════════════════════════════════════════════════════════════

/// Rows held in memory, yielded front to back.
#[derive(Debug, Default)]
pub struct MemoryRowSource {
    rows: VecDeque<Row>,
}

impl MemoryRowSource {
    pub fn new(rows: Vec<Row>) -> Self {
        Self { rows: rows.into() }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// One single-column row per value.
    pub fn scalars<V: Into<Value>>(values: impl IntoIterator<Item = V>) -> Self {
        Self {
            rows: values.into_iter().map(|v| Row::from(v.into())).collect(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.rows.len()
    }
}

impl RowSource for MemoryRowSource {
    fn next_row(&mut self) -> Result<Option<Row>, SourceError> {
        Ok(self.rows.pop_front())
    }
}

// ═══════════════════════════════════════════════════════════════
//  IterRowSource
// ═══════════════════════════════════════════════════════════════

/// Adapts any iterator of fallible rows (e.g. a driver cursor).
pub struct IterRowSource<I> {
    iter: I,
}

impl<I> IterRowSource<I>
where
    I: Iterator<Item = Result<Row, SourceError>>,
{
    pub fn new(iter: I) -> Self {
        Self { iter }
    }
}

impl<I> RowSource for IterRowSource<I>
where
    I: Iterator<Item = Result<Row, SourceError>>,
{
    fn next_row(&mut self) -> Result<Option<Row>, SourceError> {
        self.iter.next().transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_source_yields_in_order_then_none() {
        let mut src = MemoryRowSource::new(vec![row![1, "a"], row![2, "b"]]);
        assert_eq!(src.next_row().unwrap(), Some(row![1, "a"]));
        assert_eq!(src.next_row().unwrap(), Some(row![2, "b"]));
        assert_eq!(src.next_row().unwrap(), None);
        assert_eq!(src.next_row().unwrap(), None);
    }

    #[test]
    fn scalars_become_single_column_rows() {
        let mut src = MemoryRowSource::scalars([10_i64, 20]);
        let row = src.next_row().unwrap().unwrap();
        assert_eq!(row.len(), 1);
        assert_eq!(row.values(), &[Value::Int64(10)]);
    }

    #[test]
    fn iter_source_surfaces_errors() {
        let items = vec![Ok(row![1]), Err(SourceError::new("cursor closed"))];
        let mut src = IterRowSource::new(items.into_iter());
        assert!(src.next_row().unwrap().is_some());
        let err = src.next_row().unwrap_err();
        assert_eq!(err.message(), "cursor closed");
        assert!(src.next_row().unwrap().is_none());
    }

    #[test]
    fn column_types_report_null_as_none() {
        let row = row![1, None::<String>];
        assert_eq!(row.column_types(), vec![Some(ColumnType::Int32), None]);
    }
}
