//! Which insights a user keeps on their dashboard.

use crate::error::{InsightError, Result};
use crate::models::Role;
use crate::output::InsightSize;
use crate::registry::InsightRegistry;

/// Adds `name` to the enabled list, keeping one entry per insight.
pub fn enable(registry: &InsightRegistry, current: &[String], name: &str) -> Result<Vec<String>> {
    if registry.get(name).is_none() {
        return Err(InsightError::NotFound(name.to_string()));
    }

    let mut enabled = current.to_vec();
    if !enabled.iter().any(|existing| existing == name) {
        enabled.push(name.to_string());
    }
    Ok(enabled)
}

/// Removes `name` from the enabled list. Absent names are left alone.
pub fn disable(registry: &InsightRegistry, current: &[String], name: &str) -> Result<Vec<String>> {
    if registry.get(name).is_none() {
        return Err(InsightError::NotFound(name.to_string()));
    }

    Ok(current
        .iter()
        .filter(|existing| existing.as_str() != name)
        .cloned()
        .collect())
}

/// Every insight `role` may view, in registry order.
pub fn defaults_for(registry: &InsightRegistry, role: Role) -> Vec<String> {
    registry
        .visible_to(role)
        .map(|definition| definition.name.to_string())
        .collect()
}

/// Splits enabled insights into the small and default layout rows.
/// Names the registry no longer knows are dropped.
pub fn partition_by_size(registry: &InsightRegistry, enabled: &[String]) -> (Vec<String>, Vec<String>) {
    let mut small = Vec::new();
    let mut default = Vec::new();

    for name in enabled {
        match registry.get(name).map(|definition| definition.size) {
            Some(InsightSize::Small) => small.push(name.clone()),
            Some(InsightSize::Default) => default.push(name.clone()),
            None => tracing::debug!(insight = %name, "dropping unknown insight from dashboard"),
        }
    }

    (small, default)
}
