//! Result-struct generation from table metadata.
//!
//! Renders one `#[derive(MapTarget)]` struct per table, with one field per
//! column in column order, so the derived `fields` constructor matches a
//! `SELECT` of every column in schema order.

use std::collections::HashSet;
use std::fmt::{self, Write};
use std::path::Path;

use serde::Deserialize;

use rowmap_api::schema::{ColumnMeta, RowSchema};

use crate::error::MappingError;

/// One table of a schema file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TableSchema {
    pub name: String,
    #[serde(flatten)]
    pub schema: RowSchema,
}

/// Root of a schema file.
///
/// ```toml
/// [[tables]]
/// name = "EMPLOYEE"
/// columns = [
///     { name = "ID", type = "int32" },
///     { name = "NAME", type = "string", nullable = true },
/// ]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SchemaFile {
    #[serde(default)]
    pub tables: Vec<TableSchema>,
}

#[derive(Debug, Clone, Default)]
pub struct GenOptions {
    /// Appended to the PascalCase table name (e.g. `"TO"` → `EmployeeTO`).
    pub suffix: String,
}

/// Rendered source of one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    pub table: String,
    pub struct_name: String,
    pub file_name: String,
    pub source: String,
}

// ---------------------------------------------------------------------------
// Schema file parsers, selected by file extension
// ---------------------------------------------------------------------------

pub trait SchemaParser {
    fn extensions(&self) -> &[&str];
    fn parse(&self, content: &str) -> Result<SchemaFile, MappingError>;
}

pub struct TomlSchemaParser;

impl SchemaParser for TomlSchemaParser {
    fn extensions(&self) -> &[&str] {
        &["toml"]
    }

    fn parse(&self, content: &str) -> Result<SchemaFile, MappingError> {
        toml::from_str(content).map_err(|e| MappingError::Config(e.to_string()))
    }
}

pub struct JsonSchemaParser;

impl SchemaParser for JsonSchemaParser {
    fn extensions(&self) -> &[&str] {
        &["json"]
    }

    fn parse(&self, content: &str) -> Result<SchemaFile, MappingError> {
        serde_json::from_str(content).map_err(|e| MappingError::Config(e.to_string()))
    }
}

const PARSERS: &[&dyn SchemaParser] = &[&TomlSchemaParser, &JsonSchemaParser];

/// Load a schema file; the parser is chosen by extension.
pub fn load_schema(path: &Path) -> Result<SchemaFile, MappingError> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or_default();
    let parser = PARSERS
        .iter()
        .find(|p| p.extensions().contains(&ext))
        .ok_or_else(|| {
            MappingError::Config(format!(
                "{}: unsupported schema format '{ext}' (expected toml or json)",
                path.display()
            ))
        })?;
    let content = std::fs::read_to_string(path)?;
    parser
        .parse(&content)
        .map_err(|e| e.with_context(path.display()))
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// Render a result struct named `PascalCase(type_name) + suffix`.
pub fn generate_struct(
    type_name: &str,
    schema: &RowSchema,
    options: &GenOptions,
) -> Result<String, MappingError> {
    let struct_name = struct_name(type_name, options)?;
    if schema.is_empty() {
        return Err(MappingError::Config(format!(
            "table '{type_name}' has no columns"
        )));
    }

    let mut seen = HashSet::new();
    let mut fields = Vec::with_capacity(schema.len());
    for column in &schema.columns {
        let field = field_name(&column.name);
        if !seen.insert(field.clone()) {
            return Err(MappingError::Config(format!(
                "table '{type_name}': columns map to duplicate field '{field}'"
            )));
        }
        fields.push((field, field_type(column)));
    }

    let mut out = String::new();
    render_struct(&mut out, type_name, &struct_name, &fields)
        .map_err(|e| MappingError::Config(format!("table '{type_name}': {e}")))?;

    tracing::debug!(
        table = %type_name,
        struct_name = %struct_name,
        fields = fields.len(),
        "generated result struct"
    );
    Ok(out)
}

fn render_struct(
    out: &mut String,
    type_name: &str,
    struct_name: &str,
    fields: &[(String, String)],
) -> fmt::Result {
    writeln!(out, "// Generated by rowmap-gen from table `{type_name}`.")?;
    writeln!(out)?;
    writeln!(out, "use rowmap_api::MapTarget;")?;
    writeln!(out)?;
    writeln!(out, "#[derive(Debug, Clone, PartialEq, MapTarget)]")?;
    writeln!(out, "#[map_target(name = {type_name:?})]")?;
    writeln!(out, "pub struct {struct_name} {{")?;
    for (field, ty) in fields {
        writeln!(out, "    pub {field}: {ty},")?;
    }
    writeln!(out, "}}")
}

/// Render every table of `file`, or only those named in `only`.
pub fn generate_tables(
    file: &SchemaFile,
    options: &GenOptions,
    only: &[String],
) -> Result<Vec<GeneratedFile>, MappingError> {
    for name in only {
        if !file.tables.iter().any(|t| &t.name == name) {
            return Err(MappingError::Config(format!(
                "table '{name}' not found in schema"
            )));
        }
    }

    let mut generated: Vec<GeneratedFile> = Vec::new();
    for table in file
        .tables
        .iter()
        .filter(|t| only.is_empty() || only.contains(&t.name))
    {
        let struct_name = struct_name(&table.name, options)?;
        if let Some(other) = generated.iter().find(|g| g.struct_name == struct_name) {
            return Err(MappingError::Config(format!(
                "tables '{}' and '{}' map to the same struct '{struct_name}'",
                other.table, table.name
            )));
        }
        let source = generate_struct(&table.name, &table.schema, options)?;
        generated.push(GeneratedFile {
            table: table.name.clone(),
            file_name: format!("{}.rs", words(&struct_name).join("_")),
            struct_name,
            source,
        });
    }
    Ok(generated)
}

fn struct_name(type_name: &str, options: &GenOptions) -> Result<String, MappingError> {
    let base: String = words(type_name)
        .iter()
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect();
    if base.is_empty() {
        return Err(MappingError::Config(format!(
            "table name '{type_name}' has no usable characters"
        )));
    }
    let name = format!("{base}{}", options.suffix);
    if name.starts_with(|c: char| c.is_ascii_digit()) {
        return Ok(format!("T{name}"));
    }
    if name == "Self" {
        return Ok("Self_".to_string());
    }
    Ok(name)
}

/// Strict and reserved keywords, written as raw identifiers.
const KEYWORDS: &[&str] = &[
    "abstract", "as", "async", "await", "become", "box", "break", "const", "continue", "do", "dyn",
    "else", "enum", "extern", "false", "final", "fn", "for", "gen", "if", "impl", "in", "let",
    "loop", "macro", "match", "mod", "move", "mut", "override", "priv", "pub", "ref", "return",
    "static", "struct", "trait", "true", "try", "type", "typeof", "unsafe", "unsized", "use",
    "virtual", "where", "while", "yield",
];

/// Keywords that cannot be raw identifiers.
const RESERVED: &[&str] = &["crate", "self", "super"];

fn field_name(column: &str) -> String {
    let name = words(column).join("_");
    if name.is_empty() {
        return "_column".to_string();
    }
    if name.starts_with(|c: char| c.is_ascii_digit()) {
        return format!("_{name}");
    }
    if KEYWORDS.contains(&name.as_str()) {
        return format!("r#{name}");
    }
    if RESERVED.contains(&name.as_str()) {
        return format!("{name}_");
    }
    name
}

fn field_type(column: &ColumnMeta) -> String {
    let param = column.param_type();
    let ty = param.column.rust_type();
    if param.nullable {
        format!("Option<{ty}>")
    } else {
        ty.to_string()
    }
}

/// Lowercase words of an identifier: `FIRST_NAME`, `firstName` and
/// `first-name` all give `["first", "name"]`.
fn words(ident: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut prev_lower = false;
    for c in ident.chars() {
        if !c.is_alphanumeric() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            prev_lower = false;
            continue;
        }
        if c.is_uppercase() && prev_lower && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
        prev_lower = c.is_lowercase() || c.is_ascii_digit();
        current.extend(c.to_lowercase());
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}
