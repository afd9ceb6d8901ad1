//! Schema document loader
//!
//! Schema files are JSON or YAML documents describing one file's package,
//! imports, messages, enums and services. Syntax errors are reported with
//! their line and column; structural problems are reported against the
//! element they concern.

use crate::{Error, Result};
use dset_diagnostics::{Diagnostics, TextPosition};
use dset_ir::descriptor::to_json_name;
use dset_ir::metadata::{
    ENUM_VALUE, FILE_ENUM, FILE_MESSAGE, FILE_SERVICE, MESSAGE_ENUM, MESSAGE_FIELD,
    MESSAGE_NESTED, SERVICE_METHOD,
};
use dset_ir::{
    EnumDescriptor, EnumValueDescriptor, FieldDescriptor, FieldLabel, FileDescriptor, Location,
    LogicalName, MessageDescriptor, MethodDescriptor, ServiceDescriptor, SourceCodeInfo,
};
use regex::Regex;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;
use std::sync::LazyLock;
use tracing::trace;

/// Largest field number a message may declare
pub const MAX_FIELD_NUMBER: i64 = 536_870_911;

static IDENTIFIER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier pattern is valid")
});

static PACKAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)*$")
        .expect("package pattern is valid")
});

static TYPE_REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\.?[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)*$")
        .expect("type reference pattern is valid")
});

/// Serializable schema format for loading from files
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SchemaDocument {
    #[serde(default)]
    package: Option<String>,
    #[serde(default)]
    imports: Vec<String>,
    #[serde(default)]
    options: BTreeMap<String, String>,
    #[serde(default)]
    messages: Vec<MessageDocument>,
    #[serde(default)]
    enums: Vec<EnumDocument>,
    #[serde(default)]
    services: Vec<ServiceDocument>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct MessageDocument {
    name: String,
    #[serde(default)]
    doc: Option<String>,
    #[serde(default)]
    fields: Vec<FieldDocument>,
    #[serde(default)]
    messages: Vec<MessageDocument>,
    #[serde(default)]
    enums: Vec<EnumDocument>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FieldDocument {
    name: String,
    number: i64,
    #[serde(rename = "type")]
    type_name: String,
    #[serde(default)]
    label: FieldLabel,
    #[serde(default)]
    json_name: Option<String>,
    #[serde(default)]
    doc: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct EnumDocument {
    name: String,
    #[serde(default)]
    doc: Option<String>,
    #[serde(default)]
    values: Vec<EnumValueDocument>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct EnumValueDocument {
    name: String,
    number: i32,
    #[serde(default)]
    doc: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ServiceDocument {
    name: String,
    #[serde(default)]
    doc: Option<String>,
    #[serde(default)]
    methods: Vec<MethodDocument>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct MethodDocument {
    name: String,
    input: String,
    output: String,
    #[serde(default)]
    doc: Option<String>,
}

/// Text format of a schema document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaFormat {
    Json,
    Yaml,
}

impl SchemaFormat {
    /// YAML for `.yaml`/`.yml`, JSON otherwise
    pub fn from_path(path: &Path) -> Self {
        if path
            .extension()
            .map(|e| e == "yaml" || e == "yml")
            .unwrap_or(false)
        {
            Self::Yaml
        } else {
            Self::Json
        }
    }
}

/// A parsed and checked schema document
#[derive(Debug, Clone)]
pub struct LoadedSchema {
    /// Full content, JSON names included, no source info
    pub descriptor: FileDescriptor,
    /// Imports in declaration order, duplicates removed
    pub imports: Vec<LogicalName>,
    /// Documentation of every element that carried a `doc`
    pub source_code_info: SourceCodeInfo,
}

/// Where the text being loaded came from
#[derive(Debug, Clone, Copy)]
enum Origin<'a> {
    File(&'a LogicalName),
    Anonymous,
}

impl Origin<'_> {
    fn source(&self) -> &str {
        match self {
            Origin::File(name) => name.as_str(),
            Origin::Anonymous => dset_diagnostics::STREAM_SOURCE,
        }
    }
}

/// Parses schema documents into descriptors
#[derive(Debug, Default, Clone, Copy)]
pub struct SchemaLoader;

impl SchemaLoader {
    pub fn new() -> Self {
        Self
    }

    /// Load the text of a named schema file
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidFormat`] on syntax errors and
    /// [`Error::Validation`] on structural errors, after reporting them.
    pub fn load_file(
        &self,
        name: &LogicalName,
        path: &Path,
        text: &str,
        diagnostics: &mut Diagnostics,
    ) -> Result<LoadedSchema> {
        trace!("Loading schema {} from {:?}", name, path);
        self.load(Origin::File(name), text, SchemaFormat::from_path(path), diagnostics)
    }

    /// Load schema text that has no file behind it
    ///
    /// # Errors
    ///
    /// As [`load_file`](Self::load_file); syntax errors are reported as
    /// anonymous stream errors.
    pub fn load_from_str(
        &self,
        text: &str,
        format: SchemaFormat,
        diagnostics: &mut Diagnostics,
    ) -> Result<LoadedSchema> {
        self.load(Origin::Anonymous, text, format, diagnostics)
    }

    fn load(
        &self,
        origin: Origin<'_>,
        text: &str,
        format: SchemaFormat,
        diagnostics: &mut Diagnostics,
    ) -> Result<LoadedSchema> {
        let document = parse_document(origin, text, format, diagnostics)?;

        let errors_before = diagnostics.error_count();
        let mut builder = Builder {
            file: origin.source(),
            diagnostics,
            locations: Vec::new(),
        };
        let loaded = builder.build(origin, document);
        let errors = builder.diagnostics.error_count() - errors_before;

        if errors > 0 {
            return Err(Error::Validation {
                file: origin.source().to_string(),
                errors,
            });
        }
        Ok(loaded)
    }
}

fn parse_document(
    origin: Origin<'_>,
    text: &str,
    format: SchemaFormat,
    diagnostics: &mut Diagnostics,
) -> Result<SchemaDocument> {
    let parsed = match format {
        SchemaFormat::Json => serde_json::from_str::<SchemaDocument>(text).map_err(|e| {
            let position = (e.line() > 0).then(|| TextPosition::from_one_based(e.line(), e.column()));
            (position, e.to_string())
        }),
        SchemaFormat::Yaml => serde_yaml::from_str::<SchemaDocument>(text).map_err(|e| {
            let position = e
                .location()
                .map(|l| TextPosition::from_one_based(l.line(), l.column()));
            (position, e.to_string())
        }),
    };

    parsed.map_err(|(position, message)| {
        match (origin, position) {
            (Origin::Anonymous, Some(p)) => {
                diagnostics.add_stream_error(p.line, p.column, message.clone());
            }
            _ => diagnostics.add_error(origin.source(), position, message.clone()),
        }
        Error::invalid_format(origin.source(), message)
    })
}

/// Converts a document into descriptors while checking it
struct Builder<'a> {
    file: &'a str,
    diagnostics: &'a mut Diagnostics,
    locations: Vec<Location>,
}

impl Builder<'_> {
    fn build(&mut self, origin: Origin<'_>, document: SchemaDocument) -> LoadedSchema {
        let mut descriptor = FileDescriptor::new(self.file);

        if let Some(package) = document.package.as_deref() {
            if !PACKAGE.is_match(package) {
                self.error(package, format!("\"{package}\" is not a valid package name."));
            }
        }
        descriptor.package = document.package;
        descriptor.options = document.options;

        let imports = self.check_imports(origin, document.imports);
        descriptor.dependencies = imports.iter().map(ToString::to_string).collect();

        let scope = descriptor.package.clone().unwrap_or_default();
        for (i, message) in document.messages.into_iter().enumerate() {
            let path = vec![FILE_MESSAGE, index(i)];
            descriptor.messages.push(self.message(message, path, &scope));
        }
        for (i, enumeration) in document.enums.into_iter().enumerate() {
            let path = vec![FILE_ENUM, index(i)];
            descriptor.enums.push(self.enumeration(enumeration, path, &scope));
        }
        for (i, service) in document.services.into_iter().enumerate() {
            let path = vec![FILE_SERVICE, index(i)];
            descriptor.services.push(self.service(service, path, &scope));
        }

        LoadedSchema {
            descriptor,
            imports,
            source_code_info: SourceCodeInfo {
                locations: std::mem::take(&mut self.locations),
            },
        }
    }

    fn check_imports(&mut self, origin: Origin<'_>, raw: Vec<String>) -> Vec<LogicalName> {
        let mut seen = HashSet::new();
        let mut imports = Vec::with_capacity(raw.len());
        for import in raw {
            let name = match LogicalName::new(import.as_str()) {
                Ok(name) => name,
                Err(e) => {
                    self.error(&import, format!("Import \"{import}\" is not a valid file name: {e}"));
                    continue;
                }
            };
            if matches!(origin, Origin::File(own) if *own == name) {
                self.error(&import, format!("Import \"{import}\" refers to the importing file."));
                continue;
            }
            if !seen.insert(name.clone()) {
                self.warning(&import, format!("Import \"{import}\" was listed twice."));
                continue;
            }
            imports.push(name);
        }
        imports
    }

    fn message(&mut self, doc: MessageDocument, path: Vec<i32>, scope: &str) -> MessageDescriptor {
        let full_name = qualify(scope, &doc.name);
        self.identifier(&doc.name, &full_name);
        self.document(&path, doc.doc);

        let mut numbers: HashMap<i64, String> = HashMap::new();
        let mut names = HashSet::new();
        let mut fields = Vec::with_capacity(doc.fields.len());
        for (i, field) in doc.fields.into_iter().enumerate() {
            let field_name = qualify(&full_name, &field.name);
            self.identifier(&field.name, &field_name);
            if !TYPE_REFERENCE.is_match(&field.type_name) {
                self.error(
                    &field_name,
                    format!("\"{}\" is not a valid type name.", field.type_name),
                );
            }
            if !names.insert(field.name.clone()) {
                self.error(
                    &field_name,
                    format!("\"{}\" is already defined in \"{full_name}\".", field.name),
                );
            }
            if !(1..=MAX_FIELD_NUMBER).contains(&field.number) {
                self.error(
                    &field_name,
                    format!("Field numbers must be between 1 and {MAX_FIELD_NUMBER}."),
                );
            } else if let Some(other) = numbers.get(&field.number) {
                let message = format!(
                    "Field number {} has already been used in \"{full_name}\" by field \"{other}\".",
                    field.number
                );
                self.error(&field_name, message);
            } else {
                numbers.insert(field.number, field.name.clone());
            }

            let mut field_path = path.clone();
            field_path.extend([MESSAGE_FIELD, index(i)]);
            self.document(&field_path, field.doc);

            let json_name = field.json_name.unwrap_or_else(|| to_json_name(&field.name));
            fields.push(FieldDescriptor {
                // Out-of-range numbers were reported above
                number: u32::try_from(field.number).unwrap_or(0),
                name: field.name,
                type_name: field.type_name,
                label: field.label,
                json_name: Some(json_name),
            });
        }

        let mut messages = Vec::with_capacity(doc.messages.len());
        for (i, nested) in doc.messages.into_iter().enumerate() {
            let mut nested_path = path.clone();
            nested_path.extend([MESSAGE_NESTED, index(i)]);
            messages.push(self.message(nested, nested_path, &full_name));
        }

        let mut enums = Vec::with_capacity(doc.enums.len());
        for (i, nested) in doc.enums.into_iter().enumerate() {
            let mut nested_path = path.clone();
            nested_path.extend([MESSAGE_ENUM, index(i)]);
            enums.push(self.enumeration(nested, nested_path, &full_name));
        }

        MessageDescriptor {
            name: doc.name,
            fields,
            messages,
            enums,
        }
    }

    fn enumeration(&mut self, doc: EnumDocument, path: Vec<i32>, scope: &str) -> EnumDescriptor {
        let full_name = qualify(scope, &doc.name);
        self.identifier(&doc.name, &full_name);
        self.document(&path, doc.doc);

        if doc.values.is_empty() {
            self.error(&full_name, "Enums must contain at least one value.");
        }

        let mut numbers: HashMap<i32, String> = HashMap::new();
        let mut values = Vec::with_capacity(doc.values.len());
        for (i, value) in doc.values.into_iter().enumerate() {
            let value_name = qualify(scope, &value.name);
            self.identifier(&value.name, &value_name);
            if let Some(other) = numbers.get(&value.number) {
                let message = format!(
                    "\"{}\" reuses number {} already used by \"{other}\" in \"{full_name}\".",
                    value.name, value.number
                );
                self.warning(&value_name, message);
            } else {
                numbers.insert(value.number, value.name.clone());
            }

            let mut value_path = path.clone();
            value_path.extend([ENUM_VALUE, index(i)]);
            self.document(&value_path, value.doc);

            values.push(EnumValueDescriptor {
                name: value.name,
                number: value.number,
            });
        }

        EnumDescriptor {
            name: doc.name,
            values,
        }
    }

    fn service(&mut self, doc: ServiceDocument, path: Vec<i32>, scope: &str) -> ServiceDescriptor {
        let full_name = qualify(scope, &doc.name);
        self.identifier(&doc.name, &full_name);
        self.document(&path, doc.doc);

        let mut methods = Vec::with_capacity(doc.methods.len());
        for (i, method) in doc.methods.into_iter().enumerate() {
            let method_name = qualify(&full_name, &method.name);
            self.identifier(&method.name, &method_name);
            for type_name in [&method.input, &method.output] {
                if !TYPE_REFERENCE.is_match(type_name) {
                    self.error(&method_name, format!("\"{type_name}\" is not a valid type name."));
                }
            }

            let mut method_path = path.clone();
            method_path.extend([SERVICE_METHOD, index(i)]);
            self.document(&method_path, method.doc);

            methods.push(MethodDescriptor {
                name: method.name,
                input_type: method.input,
                output_type: method.output,
            });
        }

        ServiceDescriptor {
            name: doc.name,
            methods,
        }
    }

    fn identifier(&mut self, name: &str, element: &str) {
        if !IDENTIFIER.is_match(name) {
            self.error(element, format!("\"{name}\" is not a valid identifier."));
        }
    }

    fn document(&mut self, path: &[i32], doc: Option<String>) {
        if let Some(comment) = doc {
            self.locations.push(Location::with_leading(path.to_vec(), comment));
        }
    }

    fn error(&mut self, element: &str, message: impl Into<String>) {
        self.diagnostics.add_element_error(self.file, element, message);
    }

    fn warning(&mut self, element: &str, message: impl Into<String>) {
        self.diagnostics.add_element_warning(self.file, element, message);
    }
}

fn qualify(scope: &str, name: &str) -> String {
    if scope.is_empty() {
        name.to_string()
    } else {
        format!("{scope}.{name}")
    }
}

fn index(i: usize) -> i32 {
    i32::try_from(i).unwrap_or(i32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dset_diagnostics::Severity;

    const ORDER_YAML: &str = r#"
package: shop.v1
imports:
  - common/money.yaml
options:
  java_package: com.example.shop
  go_package: example.com/shop
messages:
  - name: Order
    doc: A customer order.
    fields:
      - name: order_id
        number: 1
        type: string
        doc: Unique id.
      - name: total
        number: 2
        type: common.Money
      - name: line_items
        number: 3
        type: Line
        label: repeated
        json_name: items
    messages:
      - name: Line
        fields:
          - { name: sku, number: 1, type: string }
enums:
  - name: Status
    values:
      - { name: STATUS_UNKNOWN, number: 0 }
      - { name: STATUS_OPEN, number: 1, doc: Still open. }
services:
  - name: Shop
    methods:
      - { name: Place, input: Order, output: Order }
"#;

    fn name(s: &str) -> LogicalName {
        LogicalName::new(s).unwrap()
    }

    fn load_yaml(file: &str, text: &str, diags: &mut Diagnostics) -> Result<LoadedSchema> {
        SchemaLoader::new().load_file(&name(file), Path::new(file), text, diags)
    }

    #[test]
    fn test_load_yaml_document() {
        let mut diags = Diagnostics::new();
        let loaded = load_yaml("shop/order.yaml", ORDER_YAML, &mut diags).unwrap();
        assert!(!diags.has_errors());

        let file = &loaded.descriptor;
        assert_eq!(file.name, "shop/order.yaml");
        assert_eq!(file.package.as_deref(), Some("shop.v1"));
        assert_eq!(file.dependencies, vec!["common/money.yaml"]);
        assert_eq!(loaded.imports, vec![name("common/money.yaml")]);
        let keys: Vec<&str> = file.options.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["go_package", "java_package"]);

        let order = &file.messages[0];
        assert_eq!(order.fields.len(), 3);
        assert_eq!(order.fields[0].json_name.as_deref(), Some("orderId"));
        assert_eq!(order.fields[2].json_name.as_deref(), Some("items"));
        assert_eq!(order.fields[2].label, FieldLabel::Repeated);
        assert_eq!(order.messages[0].name, "Line");
        assert_eq!(file.enums[0].values.len(), 2);
        assert_eq!(file.services[0].methods[0].input_type, "Order");
    }

    #[test]
    fn test_docs_become_source_locations() {
        let mut diags = Diagnostics::new();
        let loaded = load_yaml("shop/order.yaml", ORDER_YAML, &mut diags).unwrap();
        let info = &loaded.source_code_info;

        let paths: Vec<&[i32]> = info.locations.iter().map(|l| l.path.as_slice()).collect();
        assert_eq!(
            paths,
            vec![
                &[FILE_MESSAGE, 0][..],
                &[FILE_MESSAGE, 0, MESSAGE_FIELD, 0][..],
                &[FILE_ENUM, 0, ENUM_VALUE, 1][..],
            ]
        );
        assert_eq!(
            info.find(&[FILE_MESSAGE, 0]).unwrap().leading_comments.as_deref(),
            Some("A customer order.")
        );
    }

    #[test]
    fn test_load_json_document() {
        let json = r#"{"package": "common", "messages": [{"name": "Money", "fields": [
            {"name": "currency_code", "number": 1, "type": "string"},
            {"name": "units", "number": 2, "type": "int64"}]}]}"#;
        let mut diags = Diagnostics::new();
        let loaded = SchemaLoader::new()
            .load_file(&name("common/money.json"), Path::new("common/money.json"), json, &mut diags)
            .unwrap();
        assert_eq!(loaded.descriptor.messages[0].fields[0].json_name.as_deref(), Some("currencyCode"));
        assert!(loaded.source_code_info.is_empty());
    }

    #[test]
    fn test_json_syntax_error_has_position() {
        let mut diags = Diagnostics::new();
        let text = "{\n  \"package\": \"a\",\n  \"messages\": [\n}";
        let err = SchemaLoader::new()
            .load_file(&name("a.json"), Path::new("a.json"), text, &mut diags)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidFormat { .. }));

        let record = &diags.records()[0];
        assert_eq!(record.source, "a.json");
        assert_eq!(record.position.map(|p| p.line), Some(3));
        assert!(record.to_string().starts_with("a.json:4:"));
    }

    #[test]
    fn test_yaml_syntax_error_has_position() {
        let mut diags = Diagnostics::new();
        let err = load_yaml("bad.yaml", "package: a\nmessages: [\n", &mut diags).unwrap_err();
        assert!(matches!(err, Error::InvalidFormat { .. }));
        assert!(diags.records()[0].position.is_some());
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        let mut diags = Diagnostics::new();
        let result = load_yaml("a.yaml", "package: a\nmesages: []\n", &mut diags);
        assert!(result.is_err());
        assert!(diags.records()[0].message.contains("mesages"));
    }

    #[test]
    fn test_anonymous_text_reports_stream_errors() {
        let mut diags = Diagnostics::new();
        let result = SchemaLoader::new().load_from_str("{ not json", SchemaFormat::Json, &mut diags);
        assert!(result.is_err());
        let record = &diags.records()[0];
        assert_eq!(record.source, "input");
        assert!(record.position.is_some());
    }

    #[test]
    fn test_structural_errors_name_elements() {
        let text = r#"
package: shop
messages:
  - name: Order
    fields:
      - { name: id, number: 1, type: string }
      - { name: other_id, number: 1, type: string }
      - { name: id, number: 2, type: string }
      - { name: bad, number: 0, type: string }
      - { name: 9lives, number: 3, type: "not a type" }
"#;
        let mut diags = Diagnostics::new();
        let err = load_yaml("a.yaml", text, &mut diags).unwrap_err();
        match err {
            Error::Validation { errors, .. } => assert_eq!(errors, 5),
            other => panic!("expected validation error, got {other:?}"),
        }

        let elements: Vec<&str> = diags.errors().filter_map(|r| r.element.as_deref()).collect();
        assert_eq!(
            elements,
            vec![
                "shop.Order.other_id",
                "shop.Order.id",
                "shop.Order.bad",
                "shop.Order.9lives",
                "shop.Order.9lives",
            ]
        );
        assert!(diags.records()[0].message.contains("already been used"));
    }

    #[test]
    fn test_import_checks() {
        let text = "imports: [b.yaml, b.yaml, a.yaml, ../up.yaml]\n";
        let mut diags = Diagnostics::new();
        let result = load_yaml("a.yaml", text, &mut diags);
        assert!(result.is_err());

        let warnings: Vec<String> = diags.warnings().map(|r| r.message.clone()).collect();
        assert_eq!(warnings, vec!["Import \"b.yaml\" was listed twice."]);
        assert_eq!(diags.error_count(), 2);
    }

    #[test]
    fn test_reused_enum_number_is_a_warning() {
        let text = r#"
enums:
  - name: Mode
    values:
      - { name: MODE_A, number: 1 }
      - { name: MODE_ALIAS, number: 1 }
"#;
        let mut diags = Diagnostics::new();
        let loaded = load_yaml("mode.yaml", text, &mut diags).unwrap();
        assert_eq!(loaded.descriptor.enums[0].values.len(), 2);
        assert!(!diags.has_errors());
        assert_eq!(diags.records()[0].severity, Severity::Warning);
    }

    #[test]
    fn test_empty_enum_is_an_error() {
        let mut diags = Diagnostics::new();
        let result = load_yaml("e.yaml", "enums:\n  - name: Empty\n", &mut diags);
        assert!(result.is_err());
        assert_eq!(diags.records()[0].element.as_deref(), Some("Empty"));
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(SchemaFormat::from_path(Path::new("a.yaml")), SchemaFormat::Yaml);
        assert_eq!(SchemaFormat::from_path(Path::new("a.yml")), SchemaFormat::Yaml);
        assert_eq!(SchemaFormat::from_path(Path::new("a.json")), SchemaFormat::Json);
        assert_eq!(SchemaFormat::from_path(Path::new("a")), SchemaFormat::Json);
    }
}
