use crate::expression::ast::Expr;
use crate::expression::bytecode::{BytecodeProgram, Func, Op, Var, constant};
use crate::expression::error::FormulaError;

/// Compile `expr` to stack code, resolving names and checking call arity.
pub(crate) fn lower_to_bytecode(expr: &Expr) -> Result<BytecodeProgram, FormulaError> {
    let mut lowering = Lowering::default();
    lowering.expr(expr)?;
    Ok(BytecodeProgram {
        ops: lowering.ops,
        max_depth: lowering.max_depth,
    })
}

#[derive(Default)]
struct Lowering {
    ops: Vec<Op>,
    depth: usize,
    max_depth: usize,
}

impl Lowering {
    fn emit(&mut self, op: Op, stack_delta: isize) {
        self.ops.push(op);
        self.depth = self.depth.saturating_add_signed(stack_delta);
        self.max_depth = self.max_depth.max(self.depth);
    }

    fn here(&self) -> u32 {
        u32::try_from(self.ops.len()).unwrap_or(u32::MAX)
    }

    fn patch(&mut self, at: usize) {
        let target = self.here();
        match &mut self.ops[at] {
            Op::JumpIfZero(t) | Op::Jump(t) => *t = target,
            _ => {}
        }
    }

    fn expr(&mut self, e: &Expr) -> Result<(), FormulaError> {
        match e {
            Expr::Num(v) => self.emit(Op::Const(*v), 1),
            Expr::Name { name, at } => {
                if let Some(var) = Var::lookup(name) {
                    self.emit(Op::Load(var), 1);
                } else if let Some(v) = constant(name) {
                    self.emit(Op::Const(v), 1);
                } else {
                    return Err(FormulaError::new(*at, format!("unknown name \"{name}\"")));
                }
            }
            Expr::Neg(inner) => {
                self.expr(inner)?;
                self.emit(Op::Neg, 0);
            }
            Expr::Binary { op, left, right } => {
                self.expr(left)?;
                self.expr(right)?;
                self.emit(Op::Binary(*op), -1);
            }
            Expr::Cond { test, then, other } => {
                self.expr(test)?;
                let to_other = self.ops.len();
                self.emit(Op::JumpIfZero(0), -1);
                self.expr(then)?;
                let to_end = self.ops.len();
                self.emit(Op::Jump(0), 0);
                // Only one branch runs; its value is counted once.
                self.depth = self.depth.saturating_sub(1);
                self.patch(to_other);
                self.expr(other)?;
                self.patch(to_end);
            }
            Expr::Call { func, args, at } => {
                let f = Func::lookup(func)
                    .ok_or_else(|| FormulaError::new(*at, format!("unknown function \"{func}\"")))?;
                let argc = u8::try_from(args.len())
                    .ok()
                    .filter(|&n| f.arity().accepts(usize::from(n)))
                    .ok_or_else(|| {
                        FormulaError::new(*at, format!("wrong argument count {} for {func}", args.len()))
                    })?;
                for arg in args {
                    self.expr(arg)?;
                }
                self.emit(Op::Call { func: f, argc }, 1 - isize::from(argc));
            }
        }
        Ok(())
    }
}
