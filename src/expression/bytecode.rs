use crate::expression::ast::BinaryOp;

/// Variables bound per evaluation, in slot order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Var {
    X = 0,
    Y = 1,
    T = 2,
}

impl Var {
    pub(crate) fn lookup(name: &str) -> Option<Self> {
        match name {
            "x" => Some(Self::X),
            "y" => Some(Self::Y),
            "t" => Some(Self::T),
            _ => None,
        }
    }
}

/// Named constants.
pub(crate) fn constant(name: &str) -> Option<f64> {
    match name {
        "_pi" | "pi" => Some(std::f64::consts::PI),
        "_e" | "e" => Some(std::f64::consts::E),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Arity {
    Exactly(usize),
    AtLeast(usize),
}

impl Arity {
    pub(crate) fn accepts(self, n: usize) -> bool {
        match self {
            Self::Exactly(k) => n == k,
            Self::AtLeast(k) => n >= k,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Func {
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Sinh,
    Cosh,
    Tanh,
    Asinh,
    Acosh,
    Atanh,
    Log2,
    Log10,
    Ln,
    Exp,
    Sqrt,
    Sign,
    Rint,
    Abs,
    Floor,
    Ceil,
    Atan2,
    Pow,
    Min,
    Max,
    Sum,
    Avg,
}

impl Func {
    pub(crate) fn lookup(name: &str) -> Option<Self> {
        Some(match name {
            "sin" => Self::Sin,
            "cos" => Self::Cos,
            "tan" => Self::Tan,
            "asin" => Self::Asin,
            "acos" => Self::Acos,
            "atan" => Self::Atan,
            "sinh" => Self::Sinh,
            "cosh" => Self::Cosh,
            "tanh" => Self::Tanh,
            "asinh" => Self::Asinh,
            "acosh" => Self::Acosh,
            "atanh" => Self::Atanh,
            "log2" => Self::Log2,
            "log10" | "log" => Self::Log10,
            "ln" => Self::Ln,
            "exp" => Self::Exp,
            "sqrt" => Self::Sqrt,
            "sign" => Self::Sign,
            "rint" | "round" => Self::Rint,
            "abs" => Self::Abs,
            "floor" => Self::Floor,
            "ceil" => Self::Ceil,
            "atan2" => Self::Atan2,
            "pow" => Self::Pow,
            "min" => Self::Min,
            "max" => Self::Max,
            "sum" => Self::Sum,
            "avg" => Self::Avg,
            _ => return None,
        })
    }

    pub(crate) fn arity(self) -> Arity {
        match self {
            Self::Atan2 | Self::Pow => Arity::Exactly(2),
            Self::Min | Self::Max | Self::Sum | Self::Avg => Arity::AtLeast(1),
            _ => Arity::Exactly(1),
        }
    }

    /// Apply to `args`, whose length has been checked against [`Func::arity`].
    pub(crate) fn apply(self, args: &[f64]) -> f64 {
        let a = args.first().copied().unwrap_or(f64::NAN);
        let b = args.get(1).copied().unwrap_or(f64::NAN);
        match self {
            Self::Sin => a.sin(),
            Self::Cos => a.cos(),
            Self::Tan => a.tan(),
            Self::Asin => a.asin(),
            Self::Acos => a.acos(),
            Self::Atan => a.atan(),
            Self::Sinh => a.sinh(),
            Self::Cosh => a.cosh(),
            Self::Tanh => a.tanh(),
            Self::Asinh => a.asinh(),
            Self::Acosh => a.acosh(),
            Self::Atanh => a.atanh(),
            Self::Log2 => a.log2(),
            Self::Log10 => a.log10(),
            Self::Ln => a.ln(),
            Self::Exp => a.exp(),
            Self::Sqrt => a.sqrt(),
            Self::Sign => {
                if a == 0.0 {
                    0.0
                } else {
                    a.signum()
                }
            }
            Self::Rint => a.round_ties_even(),
            Self::Abs => a.abs(),
            Self::Floor => a.floor(),
            Self::Ceil => a.ceil(),
            Self::Atan2 => a.atan2(b),
            Self::Pow => a.powf(b),
            Self::Min => args.iter().copied().fold(f64::INFINITY, f64::min),
            Self::Max => args.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            Self::Sum => args.iter().sum(),
            Self::Avg => args.iter().sum::<f64>() / args.len() as f64,
        }
    }
}

/// Stack machine instruction. Jump targets are absolute op indices.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Op {
    Const(f64),
    Load(Var),
    Neg,
    Binary(BinaryOp),
    Call { func: Func, argc: u8 },
    /// Pop; jump when the value is zero.
    JumpIfZero(u32),
    Jump(u32),
}

#[derive(Debug, Clone, Default)]
pub(crate) struct BytecodeProgram {
    pub(crate) ops: Vec<Op>,
    /// Deepest stack the program reaches.
    pub(crate) max_depth: usize,
}
