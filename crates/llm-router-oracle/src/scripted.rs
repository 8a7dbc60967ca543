use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use crate::{Instruction, Operation, Oracle, OracleError, OracleFields};

type Reply = Result<OracleFields, OracleError>;

/// Deterministic oracle that replays queued replies per operation and
/// records every instruction it receives.
///
/// ```rust,ignore
/// let oracle = ScriptedOracle::new()
///     .respond(Operation::Classify, &[("task", "Translate")])
///     .respond(Operation::Translate, &[("translation", "Guten Morgen")])
///     .respond(Operation::Evaluate, &[("is_relevant", "yes"), ("feedback", "Correct.")]);
/// ```
#[derive(Default)]
pub struct ScriptedOracle {
    replies: Mutex<HashMap<Operation, VecDeque<Reply>>>,
    calls: Mutex<Vec<Instruction>>,
}

impl ScriptedOracle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful reply for the next call of `operation`
    pub fn respond(self, operation: Operation, fields: &[(&str, &str)]) -> Self {
        self.push(operation, Ok(OracleFields::from_pairs(operation, fields)))
    }

    /// Queue a failure for the next call of `operation`
    pub fn fail(self, operation: Operation, error: OracleError) -> Self {
        self.push(operation, Err(error))
    }

    fn push(self, operation: Operation, reply: Reply) -> Self {
        if let Ok(mut replies) = self.replies.lock() {
            replies.entry(operation).or_default().push_back(reply);
        }
        self
    }

    /// Every instruction received so far, in call order
    pub fn calls(&self) -> Vec<Instruction> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    /// Instructions received for one operation, in call order
    pub fn calls_for(&self, operation: Operation) -> Vec<Instruction> {
        self.calls()
            .into_iter()
            .filter(|call| call.operation() == operation)
            .collect()
    }

    /// Number of queued replies not yet consumed
    pub fn remaining(&self) -> usize {
        self.replies
            .lock()
            .map(|replies| replies.values().map(VecDeque::len).sum())
            .unwrap_or(0)
    }
}

#[async_trait]
impl Oracle for ScriptedOracle {
    fn name(&self) -> &str {
        "Scripted"
    }

    fn model(&self) -> &str {
        "scripted"
    }

    async fn predict(&self, instruction: &Instruction) -> Result<OracleFields, OracleError> {
        instruction.validate()?;

        if let Ok(mut calls) = self.calls.lock() {
            calls.push(instruction.clone());
        }

        let reply = self
            .replies
            .lock()
            .ok()
            .and_then(|mut replies| {
                replies
                    .get_mut(&instruction.operation())
                    .and_then(VecDeque::pop_front)
            })
            .ok_or_else(|| OracleError::Unscripted(instruction.operation().to_string()))?;

        let fields = reply?;
        for name in instruction.signature().output_names() {
            fields.require(name)?;
        }
        Ok(fields)
    }
}
