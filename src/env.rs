use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::parser::Operand;

/// Integer variables set by `set` and updated by `add`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Env {
    vars: HashMap<String, i64>,
}

impl Env {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: &str, value: i64) {
        self.vars.insert(name.to_string(), value);
    }

    pub fn get(&self, name: &str) -> Result<i64> {
        self.vars
            .get(name)
            .copied()
            .ok_or_else(|| Error::UndefinedVariable(name.to_string()))
    }

    pub fn resolve(&self, op: &Operand) -> Result<i64> {
        match op {
            Operand::Int(v) => Ok(*v),
            Operand::Name(name) => self.get(name),
            Operand::Other(text) => Err(Error::InvalidValue(text.clone())),
        }
    }

    /// Increment an existing variable; returns the new value.
    pub fn add(&mut self, name: &str, delta: i64) -> Result<i64> {
        let slot = self
            .vars
            .get_mut(name)
            .ok_or_else(|| Error::UndefinedVariable(name.to_string()))?;
        *slot = slot
            .checked_add(delta)
            .ok_or_else(|| Error::Overflow(name.to_string()))?;
        Ok(*slot)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Variables sorted by name, for display.
    pub fn list(&self) -> Vec<(String, i64)> {
        let mut out: Vec<(String, i64)> = self.vars.iter().map(|(k, v)| (k.clone(), *v)).collect();
        out.sort_by(|a, b| a.0.cmp(&b.0));
        out
    }
}
