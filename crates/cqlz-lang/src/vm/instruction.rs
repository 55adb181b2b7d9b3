//! Instruction set of the cost VM and the program container.

use std::fmt;

/// One step of a cost program.
///
/// Operands are embedded, a program never refers to weights symbolically.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Instruction {
    PushConstant(f64),
    /// Pops two values, pushes their sum.
    Add,
    /// Pops two values, pushes their product.
    Multiply,
    /// Pops `x`, pushes `1 - x`.
    NegateProbability,
    /// Pops `x`, pushes `min(x, 1)`.
    Clamp1,
}

impl Instruction {
    /// Number of operands popped from the stack.
    pub const fn arity(&self) -> usize {
        match self {
            Instruction::PushConstant(_) => 0,
            Instruction::Add | Instruction::Multiply => 2,
            Instruction::NegateProbability | Instruction::Clamp1 => 1,
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::PushConstant(value) => write!(f, "PUSH {value}"),
            Instruction::Add => write!(f, "ADD"),
            Instruction::Multiply => write!(f, "MUL"),
            Instruction::NegateProbability => write!(f, "NEG"),
            Instruction::Clamp1 => write!(f, "CLAMP1"),
        }
    }
}

/// A straight-line sequence of instructions.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    instructions: Vec<Instruction>,
}

impl Program {
    pub fn new() -> Self {
        Self::with_capacity(64)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            instructions: Vec::with_capacity(capacity),
        }
    }

    /// Appends an instruction and returns its program counter.
    pub fn push(&mut self, instruction: Instruction) -> usize {
        self.instructions.push(instruction);
        self.instructions.len() - 1
    }

    #[inline(always)]
    pub fn get(&self, pc: usize) -> Option<&Instruction> {
        self.instructions.get(pc)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Instruction> {
        self.instructions.iter()
    }

    pub fn as_slice(&self) -> &[Instruction] {
        &self.instructions
    }
}

impl From<Vec<Instruction>> for Program {
    fn from(instructions: Vec<Instruction>) -> Self {
        Self { instructions }
    }
}

impl FromIterator<Instruction> for Program {
    fn from_iter<T: IntoIterator<Item = Instruction>>(iter: T) -> Self {
        Self {
            instructions: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (pc, instruction) in self.instructions.iter().enumerate() {
            writeln!(f, "{pc:04} {instruction}")?;
        }
        Ok(())
    }
}
