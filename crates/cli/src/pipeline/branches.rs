//! Branch construction from configuration.

use contracts::{BranchConfig, BranchMode, BranchOp};
use flow::{Source, Stage, TransformStage};
use fork::Participant;

/// Apply a line operation. `None` drops the line.
pub fn apply_op(op: BranchOp, arg: Option<&str>, line: String) -> Option<String> {
    let arg = arg.unwrap_or_default();
    match op {
        BranchOp::Identity => Some(line),
        BranchOp::Upper => Some(line.to_uppercase()),
        BranchOp::Lower => Some(line.to_lowercase()),
        BranchOp::Reverse => Some(line.chars().rev().collect()),
        BranchOp::Prefix => Some(format!("{arg}{line}")),
        BranchOp::Grep => line.contains(arg).then_some(line),
        BranchOp::Length => Some(line.chars().count().to_string()),
    }
}

fn branch_stage(branch: &BranchConfig, label: bool, capacity: usize) -> TransformStage<String, String> {
    let op = branch.op;
    let arg = branch.arg.clone();
    let tag = label.then(|| format!("[{}] ", branch.name));

    TransformStage::new(branch.name.clone(), move |line: String| {
        let out = apply_op(op, arg.as_deref(), line);
        Ok(match &tag {
            Some(tag) => out.map(|l| format!("{tag}{l}")),
            None => out,
        })
    })
    .with_capacity(capacity)
}

/// Build the participant for one configured branch
pub fn branch_participant(
    branch: &BranchConfig,
    label: bool,
    capacity: usize,
) -> Participant<String, String> {
    let stage = branch_stage(branch, label, capacity);
    match branch.mode {
        BranchMode::Stage => Participant::stage(stage),
        BranchMode::Callback => Participant::callback(move |source: &Source<String>| {
            Box::new(stage).connect(source.tap())
        }),
    }
}
