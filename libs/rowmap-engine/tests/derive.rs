use rowmap_api::MapTarget;
use rowmap_api::descriptor::{FromValue, MapTarget as _};
use rowmap_api::error::ConstructionFailure;
use rowmap_api::row;
use rowmap_api::row::MemoryRowSource;
use rowmap_api::value::{ColumnType, ParamType};
use rowmap_engine::{MappingError, ResultMapper};

#[derive(Debug, PartialEq, MapTarget)]
#[map_target(constructor(from_label, String))]
struct Tagged {
    label: String,
}

impl Tagged {
    fn from_label(label: String) -> Self {
        Self {
            label: format!("from_label:{label}"),
        }
    }
}

#[derive(Debug, PartialEq, MapTarget)]
#[map_target(try_constructor(parse, String))]
#[map_target(skip_fields)]
struct Email(String);

impl Email {
    fn parse(raw: String) -> Result<Self, String> {
        if raw.contains('@') {
            Ok(Email(raw))
        } else {
            Err(format!("'{raw}' is not an email address"))
        }
    }
}

mod build {
    use super::Point;

    pub fn origin_offset(x: i64) -> Point {
        Point { x, y: 0 }
    }
}

#[derive(Debug, PartialEq, MapTarget)]
#[map_target(constructor(build::origin_offset, i64))]
struct Point {
    x: i64,
    y: i64,
}

#[test]
fn field_constructor_comes_first() {
    let d = Tagged::descriptor();
    let names: Vec<_> = d.constructors().iter().map(|c| c.name()).collect();
    assert_eq!(names, ["fields", "from_label"]);
    assert_eq!(d.type_name(), "Tagged");
    assert!(d.scalar_param().is_none());
}

#[test]
fn field_params_follow_field_types() {
    let d = Point::descriptor();
    assert_eq!(
        d.constructors()[0].params(),
        &[ParamType::required(ColumnType::Int64), ParamType::required(ColumnType::Int64)]
    );
    assert_eq!(d.constructors()[1].name(), "build::origin_offset");
    assert_eq!(d.constructors()[1].params(), &[i64::PARAM]);
}

#[test]
fn tie_break_uses_declaration_order() {
    // Both `fields` and `from_label` accept one string column.
    let mapper = ResultMapper::new();
    let t: Tagged = mapper.map_unique(MemoryRowSource::new(vec![row!["x"]])).unwrap();
    assert_eq!(t.label, "x");
}

#[test]
fn path_constructor_is_called_as_written() {
    let mapper = ResultMapper::new();
    let p: Point = mapper.map_unique(MemoryRowSource::scalars([5_i64])).unwrap();
    assert_eq!(p, Point { x: 5, y: 0 });
    let p: Point = mapper.map_unique(MemoryRowSource::new(vec![row![1_i64, 2_i64]])).unwrap();
    assert_eq!(p, Point { x: 1, y: 2 });
}

#[test]
fn try_constructor_rejection_is_construction_error() {
    let mapper = ResultMapper::new();
    let ok: Email = mapper
        .map_unique(MemoryRowSource::new(vec![row!["peter@example.org"]]))
        .unwrap();
    assert_eq!(ok, Email("peter@example.org".into()));

    let err = mapper
        .map_unique::<Email, _>(MemoryRowSource::new(vec![row!["peter"]]))
        .unwrap_err();
    match err {
        MappingError::Construction {
            constructor,
            cause: ConstructionFailure::Rejected(inner),
            ..
        } => {
            assert_eq!(constructor, "parse");
            assert_eq!(inner.to_string(), "'peter' is not an email address");
        }
        other => panic!("unexpected error: {other}"),
    }
}
