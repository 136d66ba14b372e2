//! Construct table: grammar node type -> extraction rule.
//!
//! Node type names are close to disjoint across the bundled grammars, so one
//! table covers every language. Supporting another grammar means adding rows
//! here, not new traversal code.

use once_cell::sync::Lazy;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy)]
pub(crate) enum Construct {
    Import(ImportRule),
    Function(FunctionRule),
    Class(ClassRule),
}

#[derive(Debug, Clone, Copy)]
pub(crate) enum ImportRule {
    /// Module specifier held under a field, searched through nested clauses.
    Field(&'static str),
    /// Like `Field`, but most nodes of this type are not imports
    /// (`export { a }` without a `from` clause).
    OptionalField(&'static str),
    /// `field` when present, otherwise one import per direct child under
    /// `each` (Python `import os, sys` shares the node type with JS imports).
    FieldOrEach {
        field: &'static str,
        each: &'static str,
    },
    /// `require("x")` / `import("x")` calls.
    Call {
        callees: &'static [&'static str],
    },
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct FunctionRule {
    pub name_field: &'static str,
    pub params: ParamsSource,
    /// Names dropped when they are the first parameter.
    pub receivers: &'static [&'static str],
}

#[derive(Debug, Clone, Copy)]
pub(crate) enum ParamsSource {
    /// Parameter list is a direct field of the node.
    Field(&'static str),
    /// The node binds a name to a function value (`const f = (a) => a`);
    /// nodes whose value is not one of `kinds` are not functions.
    Value {
        field: &'static str,
        kinds: &'static [&'static str],
    },
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct ClassRule {
    pub name_field: &'static str,
}

const FUNCTION_VALUES: &[&str] = &[
    "arrow_function",
    "function_expression",
    "function",
    "generator_function",
];

/// TypeScript `this` parameters annotate the receiver type.
const TS_RECEIVERS: &[&str] = &["this"];
const PYTHON_RECEIVERS: &[&str] = &["self", "cls"];

const fn declared(name_field: &'static str, receivers: &'static [&'static str]) -> Construct {
    Construct::Function(FunctionRule {
        name_field,
        params: ParamsSource::Field("parameters"),
        receivers,
    })
}

const fn bound(name_field: &'static str) -> Construct {
    Construct::Function(FunctionRule {
        name_field,
        params: ParamsSource::Value {
            field: "value",
            kinds: FUNCTION_VALUES,
        },
        receivers: &[],
    })
}

const fn class(name_field: &'static str) -> Construct {
    Construct::Class(ClassRule { name_field })
}

static CONSTRUCTS: Lazy<HashMap<&'static str, Construct>> = Lazy::new(|| {
    HashMap::from([
        // Imports
        (
            "import_statement",
            Construct::Import(ImportRule::FieldOrEach {
                field: "source",
                each: "name",
            }),
        ),
        (
            "export_statement",
            Construct::Import(ImportRule::OptionalField("source")),
        ),
        (
            "import_from_statement",
            Construct::Import(ImportRule::Field("module_name")),
        ),
        ("use_declaration", Construct::Import(ImportRule::Field("argument"))),
        (
            "call_expression",
            Construct::Import(ImportRule::Call {
                callees: &["require", "import"],
            }),
        ),
        // Functions
        ("function_declaration", declared("name", TS_RECEIVERS)),
        ("generator_function_declaration", declared("name", TS_RECEIVERS)),
        ("function_signature", declared("name", TS_RECEIVERS)),
        ("method_definition", declared("name", TS_RECEIVERS)),
        ("method_signature", declared("name", TS_RECEIVERS)),
        ("abstract_method_signature", declared("name", TS_RECEIVERS)),
        // Python
        ("function_definition", declared("name", PYTHON_RECEIVERS)),
        // Rust receivers are `self_parameter` nodes, skipped below.
        ("function_item", declared("name", &[])),
        ("function_signature_item", declared("name", &[])),
        ("variable_declarator", bound("name")),
        ("public_field_definition", bound("name")),
        ("field_definition", bound("property")),
        // Classes
        ("class_declaration", class("name")),
        ("abstract_class_declaration", class("name")),
        ("class_definition", class("name")),
        ("interface_declaration", class("name")),
        ("struct_item", class("name")),
        ("enum_item", class("name")),
        ("trait_item", class("name")),
    ])
});

pub(crate) fn lookup(kind: &str) -> Option<Construct> {
    CONSTRUCTS.get(kind).copied()
}

/// Fields that hold the bound name inside a parameter wrapper, in lookup order.
pub(crate) const PARAM_NAME_FIELDS: &[&str] = &["pattern", "name", "left"];

/// Parameter node types that are the name itself.
pub(crate) const PARAM_IDENTIFIERS: &[&str] = &[
    "identifier",
    "shorthand_property_identifier_pattern",
    "this",
];

/// Parameter node types rendered verbatim (rest/splat and destructuring).
pub(crate) const PARAM_VERBATIM: &[&str] = &[
    "rest_pattern",
    "list_splat_pattern",
    "dictionary_splat_pattern",
    "object_pattern",
    "array_pattern",
    "tuple_pattern",
];

/// Nodes inside a parameter list that never name a parameter.
pub(crate) const PARAM_SKIP: &[&str] = &[
    "decorator",
    "accessibility_modifier",
    "override_modifier",
    "readonly",
    "type_annotation",
    "comment",
    "self_parameter",
    "keyword_separator",
    "positional_separator",
    "attribute_item",
    "mutable_specifier",
];

/// Node types accepted as a declared name.
pub(crate) const NAME_KINDS: &[&str] = &[
    "identifier",
    "type_identifier",
    "property_identifier",
    "private_property_identifier",
    "field_identifier",
    "string",
    "computed_property_name",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_supported_family_has_rows() {
        assert!(matches!(lookup("import_statement"), Some(Construct::Import(_))));
        assert!(matches!(lookup("use_declaration"), Some(Construct::Import(_))));
        assert!(matches!(lookup("function_definition"), Some(Construct::Function(_))));
        assert!(matches!(lookup("function_item"), Some(Construct::Function(_))));
        assert!(matches!(lookup("class_definition"), Some(Construct::Class(_))));
        assert!(matches!(lookup("struct_item"), Some(Construct::Class(_))));
        assert!(lookup("identifier").is_none());
    }
}
