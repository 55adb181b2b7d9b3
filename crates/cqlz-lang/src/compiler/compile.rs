use crate::ast::node::{
    AttVal, OnePosition, Query, RgAltVal, RgChar, WsTermArgs, is_small_cardinality_attr,
};
use crate::ast::{NodeKind, NodeRef, Visitor, walk};
use crate::vm::{Instruction, Program};

use super::error::CompileError;
use super::weights::{Combine, WeightSlot, Weights};
use super::wildcard::wildcard_run_probability;

/// Values a node currently holds on the VM stack.
#[derive(Debug)]
struct Frame {
    kind: NodeKind,
    values: usize,
    /// Consecutive `.` wildcards of an `RgSimple` not emitted yet.
    pending_any: usize,
    seeded: bool,
}

/// Emits the cost program of one query in a single pre-order walk.
pub struct Compiler<'w> {
    weights: &'w Weights,
    program: Program,
    frames: Vec<Frame>,
    results: usize,
}

impl<'w> Compiler<'w> {
    pub fn new(weights: &'w Weights) -> Self {
        Self {
            weights,
            program: Program::new(),
            frames: Vec::with_capacity(32),
            results: 0,
        }
    }

    pub fn compile(mut self, query: &Query) -> Result<Program, CompileError> {
        walk(query, &mut self);

        if self.results == 0 {
            return Err(CompileError::EmptyQuery);
        }

        tracing::trace!(instructions = self.program.len(), "compiled query");
        Ok(self.program)
    }

    fn push_weight(&mut self, slot: WeightSlot) {
        self.program
            .push(Instruction::PushConstant(self.weights.get(slot)));
    }

    fn scale(&mut self, slot: WeightSlot) {
        self.push_weight(slot);
        self.program.push(Instruction::Multiply);
    }

    /// Emits the pending wildcard run of the innermost frame as one constant.
    fn flush_wildcard_run(&mut self) {
        let Some(frame) = self.frames.last_mut() else {
            return;
        };
        if frame.pending_any == 0 {
            return;
        }

        let value =
            self.weights.get(WeightSlot::RgAny) * wildcard_run_probability(frame.pending_any);
        frame.pending_any = 0;
        frame.values += 1;
        self.program.push(Instruction::PushConstant(value));
    }

    /// `true` when the `RgAny` being entered sits directly in an `RgSimple`.
    fn in_wildcard_run(&self) -> bool {
        self.frames.len() >= 2 && self.frames[self.frames.len() - 2].kind == NodeKind::RgSimple
    }
}

impl<'a> Visitor<'a> for Compiler<'_> {
    fn enter(&mut self, _parent: Option<NodeRef<'a>>, node: NodeRef<'a>) {
        let kind = node.kind();

        if self
            .frames
            .last()
            .is_some_and(|top| top.kind == NodeKind::RgSimple)
            && !matches!(node, NodeRef::RgChar(RgChar::Any(_)))
        {
            self.flush_wildcard_run();
        }

        if kind == NodeKind::RgAny && self.in_wildcard_run() {
            let simple = self.frames.len() - 2;
            self.frames[simple].pending_any += 1;
            self.frames.push(Frame {
                kind,
                values: 0,
                pending_any: 0,
                seeded: true,
            });
            return;
        }

        let constant = constant_slot(node);
        self.frames.push(Frame {
            kind,
            values: usize::from(constant.is_some()),
            pending_any: 0,
            seeded: constant.is_some(),
        });
        if let Some(slot) = constant {
            self.push_weight(slot);
        }
    }

    fn leave(&mut self, _parent: Option<NodeRef<'a>>, node: NodeRef<'a>) {
        if node.kind() == NodeKind::RgSimple {
            self.flush_wildcard_run();
        }

        let Some(frame) = self.frames.pop() else {
            return;
        };
        if frame.values == 0 {
            return;
        }

        let rule = frame.kind.rule();
        let combine = match rule.combine {
            Combine::Add => Instruction::Add,
            Combine::Multiply => Instruction::Multiply,
        };
        for _ in 1..frame.values {
            self.program.push(combine);
        }
        if rule.clamp {
            self.program.push(Instruction::Clamp1);
        }
        if !frame.seeded {
            if let Some(slot) = rule.scale {
                self.scale(slot);
            }
        }

        if let NodeRef::AttVal(att_val) = node {
            if att_val.att_name().is_some_and(is_small_cardinality_attr) {
                self.scale(WeightSlot::SmallCardAttr);
            }
            // 1 - p only reads as a probability when p is at most 1, so the
            // value is capped first. RgGrouped is the only other clamp site.
            if att_val.is_negation() {
                self.program.push(Instruction::Clamp1);
                self.program.push(Instruction::NegateProbability);
            }
        }

        match self.frames.last_mut() {
            Some(parent) => parent.values += 1,
            None => self.results += 1,
        }
    }
}

/// The constant a node pushes on entry, refined by its variant.
fn constant_slot(node: NodeRef<'_>) -> Option<WeightSlot> {
    match node {
        NodeRef::OnePosition(OnePosition::AttValList(None)) => Some(WeightSlot::AnyPosition),
        NodeRef::OnePosition(OnePosition::MuKeyword) => Some(WeightSlot::MuPart),
        NodeRef::RepOpt(rep_opt) if !rep_opt.is_unbounded() => Some(WeightSlot::BoundedRepOpt),
        NodeRef::AttVal(
            AttVal::PosNum(_)
            | AttVal::PosNumRange { .. }
            | AttVal::WsTerm {
                args: WsTermArgs::Numbers(..),
                ..
            },
        ) => Some(WeightSlot::AttVal),
        NodeRef::RgChar(RgChar::Literal {
            unicode_class: true,
            ..
        }) => Some(WeightSlot::UnicodeClass),
        NodeRef::RgChar(RgChar::Literal { .. }) => Some(WeightSlot::RgChar),
        NodeRef::RgAltVal(RgAltVal::Escaped(_) | RgAltVal::Range { .. }) => {
            Some(WeightSlot::RgAltVal)
        }
        _ => node.kind().rule().constant,
    }
}
