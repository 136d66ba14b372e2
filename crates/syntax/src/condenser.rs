use crate::ast::GenericAstNode;
use crate::constructs::{
    lookup, ClassRule, Construct, FunctionRule, ImportRule, ParamsSource, NAME_KINDS,
    PARAM_IDENTIFIERS, PARAM_NAME_FIELDS, PARAM_SKIP, PARAM_VERBATIM,
};
use codebrief_protocol::{CondensedAst, CondensedClass, CondensedFunction, ImportInsight};

/// Fields of a parameter wrapper that hold types or defaults, never the name.
const NON_NAME_FIELDS: &[&str] = &["type", "value", "default", "return_type"];

/// Reduce a syntax tree to its imports, functions and classes.
///
/// Total over any tree: constructs without a usable name or source are
/// skipped with a debug diagnostic. Output order follows source order.
pub fn condense(root: &GenericAstNode) -> CondensedAst {
    let mut condensed = CondensedAst::default();

    for node in root.descendants() {
        let Some(construct) = lookup(&node.kind) else {
            continue;
        };
        match construct {
            Construct::Import(rule) => collect_imports(node, rule, &mut condensed.imports),
            Construct::Function(rule) => {
                if let Some(function) = extract_function(node, rule) {
                    condensed.functions.push(function);
                }
            }
            Construct::Class(rule) => {
                if let Some(class) = extract_class(node, rule) {
                    condensed.classes.push(class);
                }
            }
        }
    }

    condensed
}

fn collect_imports(node: &GenericAstNode, rule: ImportRule, out: &mut Vec<ImportInsight>) {
    match rule {
        ImportRule::Field(field) => match node.find_field(field).and_then(source_text) {
            Some(source) => out.push(ImportInsight::new(source)),
            None => skipped(node, "import without a module source"),
        },
        ImportRule::OptionalField(field) => {
            if let Some(source) = node.child_by_field(field).and_then(source_text) {
                out.push(ImportInsight::new(source));
            }
        }
        ImportRule::FieldOrEach { field, each } => {
            if let Some(source) = node.find_field(field).and_then(source_text) {
                out.push(ImportInsight::new(source));
                return;
            }
            let before = out.len();
            for child in node.children_by_field(each) {
                // `import numpy as np` keeps the module under the alias node's name.
                let module = child.child_by_field("name").unwrap_or(child);
                if let Some(source) = source_text(module) {
                    out.push(ImportInsight::new(source));
                }
            }
            if out.len() == before {
                skipped(node, "import without a module source");
            }
        }
        ImportRule::Call { callees } => {
            let Some(callee) = node.child_by_field("function") else {
                return;
            };
            if !callees.contains(&callee.text.trim()) {
                return;
            }
            let argument = node
                .child_by_field("arguments")
                .and_then(|args| args.named_children().next());
            match argument {
                Some(arg) if is_string_literal(arg) => match source_text(arg) {
                    Some(source) => out.push(ImportInsight::new(source)),
                    None => skipped(node, "empty module specifier"),
                },
                _ => skipped(node, "dynamic module specifier"),
            }
        }
    }
}

fn extract_function(node: &GenericAstNode, rule: FunctionRule) -> Option<CondensedFunction> {
    let params_node = match rule.params {
        ParamsSource::Field(field) => node.child_by_field(field),
        ParamsSource::Value { field, kinds } => {
            let value = node.child_by_field(field)?;
            if !kinds.contains(&value.kind.as_str()) {
                return None;
            }
            // `x => x` keeps its single parameter under `parameter`.
            value
                .child_by_field("parameters")
                .or_else(|| value.child_by_field("parameter"))
        }
    };

    let Some(name) = declared_name(node, rule.name_field) else {
        skipped(node, "function without a name");
        return None;
    };

    let params = match params_node {
        Some(list) if list.kind.contains("parameters") => parameter_names(list, rule.receivers),
        Some(single) => param_name(single).into_iter().collect(),
        None => Vec::new(),
    };

    Some(CondensedFunction { name, params })
}

fn extract_class(node: &GenericAstNode, rule: ClassRule) -> Option<CondensedClass> {
    match declared_name(node, rule.name_field) {
        Some(name) => Some(CondensedClass { name }),
        None => {
            skipped(node, "class without a name");
            None
        }
    }
}

fn declared_name(node: &GenericAstNode, field: &str) -> Option<String> {
    let name = node.child_by_field(field)?;
    if !NAME_KINDS.contains(&name.kind.as_str()) {
        return None;
    }
    let text = dequote(&name.text);
    (!text.is_empty()).then(|| text.to_string())
}

fn parameter_names(list: &GenericAstNode, receivers: &[&str]) -> Vec<String> {
    let mut names: Vec<String> = list
        .named_children()
        .filter(|child| !PARAM_SKIP.contains(&child.kind.as_str()))
        .filter_map(param_name)
        .collect();
    if names
        .first()
        .is_some_and(|first| receivers.contains(&first.as_str()))
    {
        names.remove(0);
    }
    names
}

/// Unwrap parameter wrappers down to the bound name.
fn param_name(node: &GenericAstNode) -> Option<String> {
    let kind = node.kind.as_str();
    if PARAM_SKIP.contains(&kind) {
        return None;
    }
    if PARAM_IDENTIFIERS.contains(&kind) {
        return Some(node.text.trim().to_string()).filter(|s| !s.is_empty());
    }
    if PARAM_VERBATIM.contains(&kind) {
        let collapsed = node.text.split_whitespace().collect::<Vec<_>>().join(" ");
        return Some(collapsed).filter(|s| !s.is_empty());
    }

    if let Some(inner) = PARAM_NAME_FIELDS
        .iter()
        .find_map(|field| node.child_by_field(field))
    {
        return param_name(inner);
    }

    node.named_children()
        .filter(|child| {
            child
                .field_name
                .as_deref()
                .map_or(true, |field| !NON_NAME_FIELDS.contains(&field))
        })
        .find_map(param_name)
}

fn source_text(node: &GenericAstNode) -> Option<String> {
    let text = dequote(&node.text);
    (!text.is_empty()).then(|| text.to_string())
}

fn is_string_literal(node: &GenericAstNode) -> bool {
    matches!(node.kind.as_str(), "string" | "template_string")
}

/// Strip one layer of matching quotes.
pub fn dequote(raw: &str) -> &str {
    let trimmed = raw.trim();
    let mut chars = trimmed.chars();
    match (chars.next(), chars.next_back()) {
        (Some(open), Some(close))
            if open == close && matches!(open, '"' | '\'' | '`') && trimmed.len() >= 2 =>
        {
            &trimmed[1..trimmed.len() - 1]
        }
        _ => trimmed,
    }
}

fn skipped(node: &GenericAstNode, reason: &str) {
    log::debug!(
        "condense: skipping {} at {}:{} ({reason})",
        node.kind,
        node.start_position.row + 1,
        node.start_position.column + 1
    );
}
