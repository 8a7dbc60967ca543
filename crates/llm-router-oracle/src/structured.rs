//! Rendering of instructions into chat prompts and parsing of the
//! structured `<output>` block the model is asked to reply with.

use serde_json::Value;
use tracing::debug;

use crate::{Instruction, OracleError, OracleFields, Signature};

const OUTPUT_OPEN: &str = "<output>";
const OUTPUT_CLOSE: &str = "</output>";

/// System and user message pair for one instruction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuredPrompt {
    pub system: String,
    pub user: String,
}

impl StructuredPrompt {
    pub fn build(instruction: &Instruction) -> Self {
        let signature = instruction.signature();

        let system = format!(
            "You are a precise assistant performing the '{}' operation. \
             Always answer with a single JSON object wrapped in {} tags, \
             containing exactly the requested string fields and nothing else.",
            signature.operation, OUTPUT_OPEN
        );

        let mut user = String::new();
        user.push_str(signature.instructions);
        user.push_str("\n\n## Inputs\n");

        for field in signature.inputs {
            let value = instruction.input(field.name).unwrap_or_default();
            user.push_str(&format!(
                "\n### {name}\n_{desc}_\n\n{value}\n",
                name = field.name,
                desc = field.desc,
                value = value,
            ));
        }

        user.push_str("\n## Required Response Format\n\n");
        for field in signature.outputs {
            user.push_str(&format!("- `{}`: {}\n", field.name, field.desc));
        }

        let skeleton = signature
            .outputs
            .iter()
            .map(|field| format!("\"{}\": \"...\"", field.name))
            .collect::<Vec<_>>()
            .join(", ");
        user.push_str(&format!(
            "\n{}\n{{{}}}\n{}",
            OUTPUT_OPEN, skeleton, OUTPUT_CLOSE
        ));

        Self { system, user }
    }
}

/// Parse the model's reply into the signature's output fields.
///
/// Prefers an `<output>` block; falls back to the outermost JSON object in
/// the reply.
pub fn parse_fields(raw: &str, signature: &Signature) -> Result<OracleFields, OracleError> {
    let json_str = extract_json(raw)?;
    debug!(
        operation = %signature.operation,
        json_len = json_str.len(),
        "Parsing oracle output"
    );

    let value: Value = serde_json::from_str(json_str)
        .map_err(|e| OracleError::MalformedResponse(format!("JSON parse error: {}", e)))?;
    let object = value.as_object().ok_or_else(|| {
        OracleError::MalformedResponse("Oracle output is not a JSON object".to_string())
    })?;

    let mut fields = OracleFields::new(signature.operation);
    for name in signature.output_names() {
        let found = object.get(name).or_else(|| {
            object
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(name))
                .map(|(_, v)| v)
        });

        match found {
            Some(Value::String(s)) => fields.insert(name, s.clone()),
            Some(Value::Null) | None => {
                return Err(OracleError::MissingField {
                    operation: signature.operation.to_string(),
                    field: name.to_string(),
                })
            }
            Some(other) => fields.insert(name, other.to_string()),
        }
    }

    Ok(fields)
}

fn extract_json(raw: &str) -> Result<&str, OracleError> {
    let block_start = raw.find(OUTPUT_OPEN);
    let block_end = raw.rfind(OUTPUT_CLOSE);

    let body = match (block_start, block_end) {
        (Some(start), Some(end)) if start < end => &raw[start + OUTPUT_OPEN.len()..end],
        (Some(_), Some(_)) => {
            return Err(OracleError::MalformedResponse(
                "Malformed output block".to_string(),
            ))
        }
        _ => raw,
    };

    match (body.find('{'), body.rfind('}')) {
        (Some(start), Some(end)) if start < end => Ok(body[start..=end].trim()),
        _ => Err(OracleError::MalformedResponse(
            "No JSON object found in oracle output".to_string(),
        )),
    }
}
