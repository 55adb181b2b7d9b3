//! Stack machine evaluating cost programs.
//!
//! Execution is strictly sequential, there are no jumps. Each [`Vm`] owns its
//! stack, so separate instances can run concurrently without coordination.

pub mod error;
pub mod instruction;

pub use error::VmError;
pub use instruction::{Instruction, Program};

#[derive(Debug, Clone, Default)]
pub struct Vm {
    stack: Vec<f64>,
}

impl Vm {
    pub fn new() -> Self {
        Self {
            stack: Vec::with_capacity(32),
        }
    }

    /// Executes `program` on a fresh stack and returns the value on top.
    pub fn run(&mut self, program: &Program) -> Result<f64, VmError> {
        self.reset();
        self.execute(program)?;
        self.peek()
    }

    /// Executes `program` on the current stack.
    pub fn execute(&mut self, program: &Program) -> Result<(), VmError> {
        for (pc, instruction) in program.iter().enumerate() {
            self.step(pc, *instruction)?;
        }
        Ok(())
    }

    fn step(&mut self, pc: usize, instruction: Instruction) -> Result<(), VmError> {
        let required = instruction.arity();
        if self.stack.len() < required {
            return Err(VmError::StackUnderflow {
                pc,
                instruction,
                required,
                found: self.stack.len(),
            });
        }

        match instruction {
            Instruction::PushConstant(value) => self.stack.push(value),
            Instruction::Add => {
                let (a, b) = self.pop2()?;
                self.stack.push(a + b);
            }
            Instruction::Multiply => {
                let (a, b) = self.pop2()?;
                self.stack.push(a * b);
            }
            Instruction::NegateProbability => {
                let x = self.pop()?;
                self.stack.push(1.0 - x);
            }
            Instruction::Clamp1 => {
                let x = self.pop()?;
                self.stack.push(x.min(1.0));
            }
        }

        Ok(())
    }

    fn pop2(&mut self) -> Result<(f64, f64), VmError> {
        let b = self.pop()?;
        let a = self.pop()?;
        Ok((a, b))
    }

    pub fn pop(&mut self) -> Result<f64, VmError> {
        self.stack.pop().ok_or(VmError::EmptyStack)
    }

    pub fn peek(&self) -> Result<f64, VmError> {
        self.stack.last().copied().ok_or(VmError::EmptyStack)
    }

    pub fn stack(&self) -> &[f64] {
        &self.stack
    }

    pub fn reset(&mut self) {
        self.stack.clear();
    }
}

/// Runs `program` on a new VM.
pub fn run(program: &Program) -> Result<f64, VmError> {
    Vm::new().run(program)
}
