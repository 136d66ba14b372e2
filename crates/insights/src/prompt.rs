use codebrief_protocol::{
    ClassInsight, CodeInsights, CondensedAst, CondensedClass, CondensedFunction, FunctionInsight,
    ImportInsight,
};
use once_cell::sync::Lazy;
use serde_json::Value;

use crate::completion::schema_value;

pub const INSIGHTS_SCHEMA_NAME: &str = "code_insights";

const INSTRUCTIONS: &str = "\
Analyze the condensed syntax tree of one source file and report its structure.
Rules:
- List every function and method under \"functions\" with its parameter names, in source order.
- List every class, interface, struct, enum or trait under \"classes\".
- List every imported module under \"imports\" using the module specifier exactly as written.
- Do not invent entries that are not present in the input.
- Answer with JSON only.";

static INSIGHTS_SCHEMA: Lazy<Value> = Lazy::new(schema_value::<CodeInsights>);

/// JSON schema sent with every insight request.
pub fn insights_schema() -> &'static Value {
    &INSIGHTS_SCHEMA
}

fn example_input() -> CondensedAst {
    CondensedAst {
        imports: vec![ImportInsight::new("./db")],
        functions: vec![CondensedFunction {
            name: "findUser".to_string(),
            params: vec!["id".to_string()],
        }],
        classes: vec![CondensedClass {
            name: "UserService".to_string(),
        }],
    }
}

fn example_output() -> CodeInsights {
    CodeInsights {
        functions: vec![FunctionInsight {
            name: "findUser".to_string(),
            parameters: vec!["id".to_string()],
        }],
        classes: vec![ClassInsight {
            name: "UserService".to_string(),
        }],
        imports: vec![ImportInsight::new("./db")],
    }
}

/// Build the insight prompt for one file from its compact condensed tree.
pub fn build_prompt(file_path: &str, payload: &str) -> Result<String, serde_json::Error> {
    let schema = serde_json::to_string_pretty(insights_schema())?;
    let example_in = serde_json::to_string(&example_input())?;
    let example_out = serde_json::to_string(&example_output())?;

    Ok(format!(
        "{INSTRUCTIONS}\n\n\
         Output schema:\n{schema}\n\n\
         Example input:\n{example_in}\n\
         Example output:\n{example_out}\n\n\
         File: {file_path}\n\
         Input:\n{payload}\n"
    ))
}
