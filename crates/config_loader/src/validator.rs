//! 配置校验模块
//!
//! 校验规则：
//! - fork 配置合法 (name、容量)
//! - 至少包含一个 branch
//! - branch 名称非空且唯一
//! - `prefix` / `grep` 必须带 `arg`

use std::collections::HashSet;

use contracts::{ConfigError, ForkBlueprint};

/// 校验 ForkBlueprint 配置
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(blueprint: &ForkBlueprint) -> Result<(), ConfigError> {
    blueprint.fork.validate()?;
    validate_not_empty(blueprint)?;
    validate_branch_names(blueprint)?;
    validate_branch_args(blueprint)?;
    Ok(())
}

fn validate_not_empty(blueprint: &ForkBlueprint) -> Result<(), ConfigError> {
    if blueprint.branch_count() == 0 {
        return Err(ConfigError::validation(
            "batches",
            "at least one branch is required",
        ));
    }
    Ok(())
}

/// 校验 branch 名称唯一性 (跨所有 batch)
fn validate_branch_names(blueprint: &ForkBlueprint) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();
    for (batch_idx, batch) in blueprint.batches.iter().enumerate() {
        for branch in &batch.branches {
            if branch.name.trim().is_empty() {
                return Err(ConfigError::validation(
                    format!("batches[{batch_idx}].branches.name"),
                    "branch name cannot be empty",
                ));
            }
            if !seen.insert(branch.name.as_str()) {
                return Err(ConfigError::validation(
                    format!("batches[{batch_idx}].branches[name={}]", branch.name),
                    "duplicate branch name",
                ));
            }
        }
    }
    Ok(())
}

fn validate_branch_args(blueprint: &ForkBlueprint) -> Result<(), ConfigError> {
    for (batch_idx, batch) in blueprint.batches.iter().enumerate() {
        for branch in &batch.branches {
            let missing = branch.arg.as_deref().is_none_or(str::is_empty);
            if branch.op.requires_arg() && missing {
                return Err(ConfigError::validation(
                    format!("batches[{batch_idx}].branches[{}].arg", branch.name),
                    format!("op '{:?}' requires an arg", branch.op).to_lowercase(),
                ));
            }
        }
    }
    Ok(())
}
