//! Numeric formulas over the per-point variables `x`, `y` and the progress `t`.
//!
//! The dialect has arithmetic, comparisons and logic yielding 0 or 1, the `c ? a : b`
//! conditional, the constants `_pi` and `_e`, and the usual math functions including the
//! variadic `min`, `max`, `sum` and `avg`. Source text is lexed, parsed, lowered to stack code
//! and run by a small interpreter that keeps its stack between calls.

pub(crate) mod ast;
pub(crate) mod bytecode;
pub(crate) mod error;
pub(crate) mod lexer;
pub(crate) mod lower;
pub(crate) mod parser;
pub(crate) mod vm;

use crate::foundation::error::{SsbError, SsbResult};
use bytecode::BytecodeProgram;

/// A compiled formula.
#[derive(Debug, Clone)]
pub struct Formula {
    source: String,
    program: BytecodeProgram,
    stack: Vec<f64>,
}

impl Formula {
    /// Compile `src`. Syntax errors, unknown names and wrong argument counts are parse errors.
    pub fn compile(src: &str) -> SsbResult<Self> {
        let ast = parser::parse_expr(src)?;
        let program = lower::lower_to_bytecode(&ast)?;
        Ok(Self {
            source: src.to_owned(),
            program,
            stack: Vec::new(),
        })
    }

    /// The text this formula was compiled from.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Evaluate with `x`, `y` and `t` bound. Non-finite results are errors.
    pub fn eval(&mut self, x: f64, y: f64, t: f64) -> SsbResult<f64> {
        let v = vm::eval_program_with_stack(&self.program, &mut self.stack, &[x, y, t])?;
        if v.is_finite() {
            Ok(v)
        } else {
            Err(SsbError::degenerate(format!(
                "formula \"{}\" evaluated to {v}",
                self.source
            )))
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/expression/formula.rs"]
mod tests;
