use thiserror::Error;

use super::instruction::Instruction;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum VmError {
    #[error("Stack underflow at {pc:04}: `{instruction}` needs {required} operand(s), found {found}")]
    StackUnderflow {
        pc: usize,
        instruction: Instruction,
        required: usize,
        found: usize,
    },
    #[error("Empty stack")]
    EmptyStack,
}
