use serde::{Deserialize, Serialize};

use crate::OracleError;

/// The operation kinds the oracle understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Classify,
    Explain,
    Translate,
    Summarize,
    Evaluate,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Classify => "classify",
            Operation::Explain => "explain",
            Operation::Translate => "translate",
            Operation::Summarize => "summarize",
            Operation::Evaluate => "evaluate",
        }
    }

    pub fn signature(&self) -> &'static Signature {
        match self {
            Operation::Classify => &CLASSIFY,
            Operation::Explain => &EXPLAIN,
            Operation::Translate => &TRANSLATE,
            Operation::Summarize => &SUMMARIZE,
            Operation::Evaluate => &EVALUATE,
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named input or output field with its description
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub desc: &'static str,
}

/// Static description of one oracle operation: what it does, what it reads,
/// and which fields it must return
#[derive(Debug, PartialEq, Eq)]
pub struct Signature {
    pub operation: Operation,
    pub instructions: &'static str,
    pub inputs: &'static [FieldSpec],
    pub outputs: &'static [FieldSpec],
}

impl Signature {
    pub fn output_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.outputs.iter().map(|field| field.name)
    }

    /// First declared output; the text-producing operations have exactly one
    pub fn primary_output(&self) -> &'static str {
        self.outputs[0].name
    }
}

const USER_INPUT: &str = "user_input";

pub static CLASSIFY: Signature = Signature {
    operation: Operation::Classify,
    instructions: "Route user input to appropriate task: Explain, Translate, Summarize, or None",
    inputs: &[FieldSpec {
        name: USER_INPUT,
        desc: "User's request",
    }],
    outputs: &[FieldSpec {
        name: "task",
        desc: "Exactly one word: Explain (for explanations of concepts), Translate (for translation requests), Summarize (for summarization requests), or None (if it doesn't fit any category)",
    }],
};

pub static EXPLAIN: Signature = Signature {
    operation: Operation::Explain,
    instructions: "Provide clear explanations for concepts, topics, or questions",
    inputs: &[FieldSpec {
        name: USER_INPUT,
        desc: "What the user wants explained",
    }],
    outputs: &[FieldSpec {
        name: "explanation",
        desc: "Clear, helpful explanation",
    }],
};

pub static TRANSLATE: Signature = Signature {
    operation: Operation::Translate,
    instructions: "Translate English text to German",
    inputs: &[FieldSpec {
        name: USER_INPUT,
        desc: "English text to translate",
    }],
    outputs: &[FieldSpec {
        name: "translation",
        desc: "German translation",
    }],
};

pub static SUMMARIZE: Signature = Signature {
    operation: Operation::Summarize,
    instructions: "Summarize text concisely while preserving key information",
    inputs: &[FieldSpec {
        name: USER_INPUT,
        desc: "Text to summarize",
    }],
    outputs: &[FieldSpec {
        name: "summary",
        desc: "Concise summary",
    }],
};

pub static EVALUATE: Signature = Signature {
    operation: Operation::Evaluate,
    instructions: "Evaluate if a solution correctly performs the requested task and is helpful",
    inputs: &[
        FieldSpec {
            name: "task",
            desc: "The task type (explain, translate, summarize)",
        },
        FieldSpec {
            name: USER_INPUT,
            desc: "Original user request",
        },
        FieldSpec {
            name: "solution",
            desc: "Generated solution to evaluate",
        },
    ],
    outputs: &[
        FieldSpec {
            name: "is_relevant",
            desc: "yes or no - whether solution actually performs the requested task correctly",
        },
        FieldSpec {
            name: "feedback",
            desc: "Detailed feedback focusing on task completion accuracy",
        },
    ],
};

/// One structured request: an operation plus its labeled input values
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Instruction {
    operation: Operation,
    inputs: Vec<(String, String)>,
}

impl Instruction {
    pub fn new(operation: Operation) -> Self {
        Self {
            operation,
            inputs: Vec::new(),
        }
    }

    /// Set an input field, replacing any earlier value with the same name
    pub fn with_input(mut self, name: &str, value: impl Into<String>) -> Self {
        let value = value.into();
        match self.inputs.iter_mut().find(|(n, _)| n == name) {
            Some(slot) => slot.1 = value,
            None => self.inputs.push((name.to_string(), value)),
        }
        self
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    pub fn signature(&self) -> &'static Signature {
        self.operation.signature()
    }

    pub fn input(&self, name: &str) -> Option<&str> {
        self.inputs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Check that every declared input is present and nothing undeclared is
    pub fn validate(&self) -> Result<(), OracleError> {
        let signature = self.signature();

        for field in signature.inputs {
            if self.input(field.name).is_none() {
                return Err(OracleError::InvalidInstruction(format!(
                    "'{}' requires input '{}'",
                    self.operation, field.name
                )));
            }
        }

        for (name, _) in &self.inputs {
            if !signature.inputs.iter().any(|field| field.name == name) {
                return Err(OracleError::InvalidInstruction(format!(
                    "'{}' does not accept input '{}'",
                    self.operation, name
                )));
            }
        }

        Ok(())
    }
}
