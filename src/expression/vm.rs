use crate::expression::bytecode::{BytecodeProgram, Op};
use crate::foundation::error::{SsbError, SsbResult};

fn underflow() -> SsbError {
    SsbError::degenerate("formula stack underflow")
}

/// Run `p` with `vars` bound to `[x, y, t]`, reusing `stack` as scratch space.
pub(crate) fn eval_program_with_stack(
    p: &BytecodeProgram,
    stack: &mut Vec<f64>,
    vars: &[f64; 3],
) -> SsbResult<f64> {
    stack.clear();
    stack.reserve(p.max_depth);

    let mut pc = 0usize;
    while let Some(&op) = p.ops.get(pc) {
        pc += 1;
        match op {
            Op::Const(v) => stack.push(v),
            Op::Load(var) => stack.push(vars[var as usize]),
            Op::Neg => {
                let v = stack.last_mut().ok_or_else(underflow)?;
                *v = -*v;
            }
            Op::Binary(bin) => {
                let b = stack.pop().ok_or_else(underflow)?;
                let a = stack.last_mut().ok_or_else(underflow)?;
                *a = bin.apply(*a, b);
            }
            Op::Call { func, argc } => {
                let base = stack
                    .len()
                    .checked_sub(usize::from(argc))
                    .ok_or_else(underflow)?;
                let v = func.apply(&stack[base..]);
                stack.truncate(base);
                stack.push(v);
            }
            Op::JumpIfZero(target) => {
                if stack.pop().ok_or_else(underflow)? == 0.0 {
                    pc = target as usize;
                }
            }
            Op::Jump(target) => pc = target as usize,
        }
    }

    match stack.as_slice() {
        [v] => Ok(*v),
        _ => Err(SsbError::degenerate("formula left an unbalanced stack")),
    }
}
