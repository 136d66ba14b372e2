use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Reduced syntax tree handed to the model: imports, functions, classes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CondensedAst {
    pub imports: Vec<ImportInsight>,
    pub functions: Vec<CondensedFunction>,
    pub classes: Vec<CondensedClass>,
}

impl CondensedAst {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.imports.is_empty() && self.functions.is_empty() && self.classes.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CondensedFunction {
    pub name: String,
    pub params: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CondensedClass {
    pub name: String,
}

/// Validated structural summary of one file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[schemars(description = "Structural summary of a single source file")]
pub struct CodeInsights {
    /// Functions and methods declared in the file
    pub functions: Vec<FunctionInsight>,

    /// Classes and class-like declarations (interfaces, structs, traits)
    pub classes: Vec<ClassInsight>,

    /// Modules imported by the file
    pub imports: Vec<ImportInsight>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct FunctionInsight {
    /// Function or method name
    pub name: String,

    /// Parameter names in declaration order
    pub parameters: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ClassInsight {
    /// Class name
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ImportInsight {
    /// Module specifier exactly as written, without quotes
    pub source: String,
}

impl ImportInsight {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
        }
    }
}
