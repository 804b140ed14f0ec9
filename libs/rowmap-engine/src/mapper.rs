use std::iter::FusedIterator;
use std::sync::Arc;

use rowmap_api::descriptor::{MapTarget, TypeDescriptor};
use rowmap_api::row::{Row, RowSource};

use crate::config::MapperConfig;
use crate::error::MappingError;
use crate::instantiate::instantiate;
use crate::resolver::{self, DescriptorCache};
use crate::selector::select;

/// Maps query result rows onto typed instances.
///
/// Holds no per-call state: every `map_*` call owns its traversal of the row
/// source. Resolved descriptors are shared through an internal cache when
/// `cache_descriptors` is enabled.
#[derive(Debug, Default)]
pub struct ResultMapper {
    config: MapperConfig,
    cache: DescriptorCache,
}

impl ResultMapper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: MapperConfig) -> Self {
        Self {
            config,
            cache: DescriptorCache::new(),
        }
    }

    /// Resolve the descriptor of `T`, through the cache if enabled.
    pub fn descriptor<T: MapTarget>(&self) -> Result<Arc<TypeDescriptor<T>>, MappingError> {
        if self.config.cache_descriptors {
            self.cache.get_or_resolve::<T>()
        } else {
            resolver::resolve::<T>().map(Arc::new)
        }
    }

    /// Lazily map every row of `source`, in row order.
    ///
    /// Resolution errors are returned before any row is read. The returned
    /// iterator owns `source` and yields one item per row.
    pub fn map_all<T, S>(&self, source: S) -> Result<MappedRows<T, S>, MappingError>
    where
        T: MapTarget,
        S: RowSource,
    {
        let descriptor = self.descriptor::<T>()?;
        Ok(MappedRows {
            descriptor,
            source,
            widening: self.config.numeric_widening,
            columns: None,
            rows: 0,
            done: false,
        })
    }

    /// Map every row into a `Vec`. Stops at the first error.
    pub fn list<T, S>(&self, source: S) -> Result<Vec<T>, MappingError>
    where
        T: MapTarget,
        S: RowSource,
    {
        self.map_all(source)?.collect()
    }

    /// Map the only row of `source`.
    ///
    /// Reads at most two rows: none → `NoResult`, a second one →
    /// `NonUniqueResult`.
    pub fn map_unique<T, S>(&self, mut source: S) -> Result<T, MappingError>
    where
        T: MapTarget,
        S: RowSource,
    {
        let descriptor = self.descriptor::<T>()?;
        let type_name = || descriptor.type_name().to_string();

        let Some(row) = source.next_row()? else {
            return Err(MappingError::NoResult {
                type_name: type_name(),
            });
        };
        if source.next_row()?.is_some() {
            return Err(MappingError::NonUniqueResult {
                type_name: type_name(),
            });
        }
        drop(source);

        map_row(&descriptor, row, self.config.numeric_widening)
    }

    /// Same as [`map_unique`](Self::map_unique).
    pub fn unique_result<T, S>(&self, source: S) -> Result<T, MappingError>
    where
        T: MapTarget,
        S: RowSource,
    {
        self.map_unique(source)
    }
}

fn map_row<T>(descriptor: &TypeDescriptor<T>, row: Row, widening: bool) -> Result<T, MappingError> {
    let selection = select(descriptor, &row, widening)?;
    tracing::trace!(
        target_type = %descriptor.type_name(),
        constructor = %selection.name(),
        columns = row.len(),
        "mapping row"
    );
    instantiate(descriptor, &selection, row)
}

/// One-shot iterator over mapped rows. See [`ResultMapper::map_all`].
pub struct MappedRows<T, S> {
    descriptor: Arc<TypeDescriptor<T>>,
    source: S,
    widening: bool,
    /// Column count of the first row.
    columns: Option<usize>,
    rows: usize,
    done: bool,
}

impl<T, S> MappedRows<T, S> {
    /// Rows read from the source so far.
    pub fn rows_read(&self) -> usize {
        self.rows
    }
}

impl<T, S: RowSource> Iterator for MappedRows<T, S> {
    type Item = Result<T, MappingError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let row = match self.source.next_row() {
            Ok(Some(row)) => row,
            Ok(None) => {
                self.done = true;
                tracing::debug!(
                    target_type = %self.descriptor.type_name(),
                    rows = self.rows,
                    "row source exhausted"
                );
                return None;
            }
            Err(e) => {
                self.done = true;
                return Some(Err(e.into()));
            }
        };
        self.rows += 1;

        let expected = *self.columns.get_or_insert(row.len());
        if row.len() != expected {
            return Some(Err(MappingError::ColumnCountChanged {
                type_name: self.descriptor.type_name().to_string(),
                expected,
                actual: row.len(),
            }));
        }

        Some(map_row(&self.descriptor, row, self.widening))
    }
}

impl<T, S: RowSource> FusedIterator for MappedRows<T, S> {}

#[cfg(test)]
mod tests {
    use rowmap_api::error::SourceError;
    use rowmap_api::row;
    use rowmap_api::row::{IterRowSource, MemoryRowSource};

    use std::sync::atomic::{AtomicUsize, Ordering};

    use rowmap_api::descriptor::FromValue;
    use rowmap_api::error::ConstructionFailure;
    use rowmap_api::value::{ParamType, Value};

    use super::*;

    /// Counts pulls so tests can check how far a call read.
    struct CountingSource {
        inner: MemoryRowSource,
        pulls: usize,
    }

    impl RowSource for CountingSource {
        fn next_row(&mut self) -> Result<Option<Row>, rowmap_api::error::SourceError> {
            self.pulls += 1;
            self.inner.next_row()
        }
    }

    #[test]
    fn map_unique_reads_at_most_two_rows() {
        let mut source = CountingSource {
            inner: MemoryRowSource::scalars([1_i64, 2, 3]),
            pulls: 0,
        };
        let err = ResultMapper::new().map_unique::<i64, _>(&mut source).unwrap_err();
        assert!(matches!(err, MappingError::NonUniqueResult { .. }));
        assert_eq!(source.pulls, 2);
    }

    #[test]
    fn map_all_is_lazy() {
        let mut source = CountingSource {
            inner: MemoryRowSource::scalars([1_i64, 2, 3]),
            pulls: 0,
        };
        let mapper = ResultMapper::new();
        let mut rows = mapper.map_all::<i64, _>(&mut source).unwrap();
        assert_eq!(rows.next().unwrap().unwrap(), 1);
        assert_eq!(rows.rows_read(), 1);
        drop(rows);
        assert_eq!(source.pulls, 1);
    }

    static CELSIUS_CALLS: AtomicUsize = AtomicUsize::new(0);

    /// Scalar-compatible type that also declares a one-argument constructor.
    #[derive(Debug, PartialEq)]
    struct Celsius(f64);

    impl FromValue for Celsius {
        const PARAM: ParamType = f64::PARAM;

        fn from_value(value: Value, column: usize) -> Result<Self, ConstructionFailure> {
            f64::from_value(value, column).map(Celsius)
        }
    }

    impl MapTarget for Celsius {
        fn descriptor() -> TypeDescriptor<Self> {
            TypeDescriptor::builder("Celsius")
                .scalar()
                .constructor("from_fahrenheit", vec![f64::PARAM], |args| {
                    CELSIUS_CALLS.fetch_add(1, Ordering::SeqCst);
                    let f: f64 = args.take()?;
                    Ok(Celsius((f - 32.0) / 1.8))
                })
                .build()
        }
    }

    #[test]
    fn scalar_rows_skip_constructors() {
        let mapper = ResultMapper::new();
        let temps: Vec<Celsius> = mapper.list(MemoryRowSource::scalars([21.5_f64, 0.0])).unwrap();
        assert_eq!(temps, vec![Celsius(21.5), Celsius(0.0)]);
        assert_eq!(CELSIUS_CALLS.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn column_count_change_is_reported() {
        let source = MemoryRowSource::new(vec![row![1], row![1, 2]]);
        let mapper = ResultMapper::new();
        let results: Vec<_> = mapper.map_all::<i32, _>(source).unwrap().collect();
        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        assert!(matches!(
            results[1],
            Err(MappingError::ColumnCountChanged { expected: 1, actual: 2, .. })
        ));
    }

    #[test]
    fn source_error_ends_iteration() {
        let items = vec![Ok(row![1_i64]), Err(SourceError::new("connection reset")), Ok(row![2_i64])];
        let mapper = ResultMapper::new();
        let mut rows = mapper
            .map_all::<i64, _>(IterRowSource::new(items.into_iter()))
            .unwrap();
        assert_eq!(rows.next().unwrap().unwrap(), 1);
        assert!(matches!(rows.next(), Some(Err(MappingError::Source(_)))));
        assert!(rows.next().is_none());
    }

    #[test]
    fn uncached_mapper_leaves_cache_empty() {
        let mapper = ResultMapper::with_config(MapperConfig {
            cache_descriptors: false,
            ..MapperConfig::default()
        });
        let out: Vec<i64> = mapper.list(MemoryRowSource::scalars([5_i64])).unwrap();
        assert_eq!(out, vec![5]);
        assert!(mapper.cache.is_empty());
    }

    #[test]
    fn cached_mapper_reuses_descriptor() {
        let mapper = ResultMapper::new();
        let a = mapper.descriptor::<String>().unwrap();
        let b = mapper.descriptor::<String>().unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }
}
