//! Consistency validation for project contexts
//!
//! Pure functions over a context snapshot. Enforced invariants:
//! - every symbolic entry carries a non-empty name;
//! - parent/child/related symbolic ids resolve within the same
//!   context's `symbolic_data` map (dangling references are violations,
//!   not crashes);
//! - every symbolic reference carries a non-empty name and type, and its
//!   `symbolic_name` is a key of `symbolic_data`;
//! - the context has a project id, `version >= 1`, and
//!   `created_at <= updated_at`;
//! - `version_history.len() == version - 1` and
//!   `update_history.len() == version_history.len()`.
//!
//! Checks always run in the same order so diagnostics are reproducible;
//! every diagnostic names the offending entity id.
//!
//! The update-application routine lives here too, shared by
//! [`ConsistencyValidator::validate_update`] and the context engine so
//! that what gets validated is exactly what would be committed.

#![deny(unsafe_code)]

use chrono::Utc;
use specflow_types::{ContextUpdate, ProjectContext, UpdatePayload, VersionRecord};
use std::collections::BTreeMap;

/// Validates structural and relational invariants over a context
#[derive(Clone, Copy, Debug, Default)]
pub struct ConsistencyValidator;

impl ConsistencyValidator {
    pub fn new() -> Self {
        Self
    }

    /// Whether the context currently satisfies every invariant
    pub fn is_consistent(&self, context: &ProjectContext) -> bool {
        self.find_inconsistencies(context).is_empty()
    }

    /// All violated invariants, in stable order. Empty means consistent.
    pub fn find_inconsistencies(&self, context: &ProjectContext) -> Vec<String> {
        let mut violations = Vec::new();
        self.check_symbolic_data(context, &mut violations);
        self.check_symbolic_references(context, &mut violations);
        self.check_cross_references(context, &mut violations);
        self.check_data_integrity(context, &mut violations);
        self.check_version_consistency(context, &mut violations);
        violations
    }

    /// Validate a batch of proposed updates without touching the
    /// original: the updates are applied to a deep copy and the copy is
    /// re-validated.
    pub fn validate_update(
        &self,
        context: &ProjectContext,
        updates: &[ContextUpdate],
    ) -> Vec<String> {
        let mut candidate = context.clone();
        apply_updates(&mut candidate, updates);
        self.find_inconsistencies(&candidate)
    }

    // ── Individual check families ────────────────────────────────────

    fn check_symbolic_data(&self, context: &ProjectContext, violations: &mut Vec<String>) {
        for (symbolic_id, data) in &context.symbolic_data {
            if data.symbolic_name.is_empty() {
                violations.push(format!("symbolic data {} missing name", symbolic_id));
            }

            if let Some(parent_id) = &data.parent_symbolic_id {
                if !context.symbolic_data.contains_key(parent_id) {
                    violations.push(format!(
                        "symbolic data {} references non-existent parent {}",
                        symbolic_id, parent_id
                    ));
                }
            }

            for child_id in &data.child_symbolic_ids {
                if !context.symbolic_data.contains_key(child_id) {
                    violations.push(format!(
                        "symbolic data {} references non-existent child {}",
                        symbolic_id, child_id
                    ));
                }
            }
        }
    }

    fn check_symbolic_references(&self, context: &ProjectContext, violations: &mut Vec<String>) {
        for (reference_id, reference) in &context.symbolic_references {
            if reference.symbolic_name.is_empty() {
                violations.push(format!("symbolic reference {} missing name", reference_id));
            }
            if reference.reference_type.is_empty() {
                violations.push(format!("symbolic reference {} missing type", reference_id));
            }
        }
    }

    fn check_cross_references(&self, context: &ProjectContext, violations: &mut Vec<String>) {
        for (reference_id, reference) in &context.symbolic_references {
            if !reference.symbolic_name.is_empty()
                && !context.symbolic_data.contains_key(&reference.symbolic_name)
            {
                violations.push(format!(
                    "symbolic reference {} references non-existent symbolic data {}",
                    reference_id, reference.symbolic_name
                ));
            }
        }

        for (symbolic_id, data) in &context.symbolic_data {
            for related_id in &data.related_symbolic_ids {
                if !context.symbolic_data.contains_key(related_id) {
                    violations.push(format!(
                        "symbolic data {} references non-existent related data {}",
                        symbolic_id, related_id
                    ));
                }
            }
        }
    }

    fn check_data_integrity(&self, context: &ProjectContext, violations: &mut Vec<String>) {
        if context.project_id.as_str().is_empty() {
            violations.push(format!("context {} missing project id", context.id));
        }

        if context.version < 1 {
            violations.push(format!(
                "context {} has invalid version {}",
                context.id, context.version
            ));
        }

        if context.created_at > context.updated_at {
            violations.push(format!(
                "context {} created timestamp is after updated timestamp",
                context.id
            ));
        }
    }

    fn check_version_consistency(&self, context: &ProjectContext, violations: &mut Vec<String>) {
        let expected_history = (context.version.max(1) - 1) as usize;
        if context.version_history.len() != expected_history {
            violations.push(format!(
                "context {} version history length {} does not match version {}",
                context.id,
                context.version_history.len(),
                context.version
            ));
        }

        if context.update_history.len() != context.version_history.len() {
            violations.push(format!(
                "context {} update history length {} does not match version history length {}",
                context.id,
                context.update_history.len(),
                context.version_history.len()
            ));
        }
    }
}

/// Apply a batch of updates to a context, in order.
///
/// Each update merges its payload into the targeted map (shallow merge
/// by key, later updates win), bumps the version, and appends to both
/// histories so the length invariants keep holding.
pub fn apply_updates(context: &mut ProjectContext, updates: &[ContextUpdate]) {
    for update in updates {
        match &update.payload {
            UpdatePayload::Requirements(data) => merge_values(&mut context.requirements, data),
            UpdatePayload::Specifications(data) => merge_values(&mut context.specifications, data),
            UpdatePayload::Architecture(data) => merge_values(&mut context.architecture, data),
            UpdatePayload::Implementation(data) => merge_values(&mut context.implementation, data),
            UpdatePayload::SymbolicData(data) => {
                for (key, value) in data {
                    context.symbolic_data.insert(key.clone(), value.clone());
                }
            }
            UpdatePayload::SymbolicReferences(data) => {
                for (key, value) in data {
                    context
                        .symbolic_references
                        .insert(key.clone(), value.clone());
                }
            }
        }

        context.updated_at = Utc::now();
        context.version += 1;
        context.version_history.push(VersionRecord {
            version: context.version,
            update_id: update.id.clone(),
            recorded_at: context.updated_at,
        });
        context.update_history.push(update.id.clone());
    }
}

fn merge_values(
    target: &mut BTreeMap<String, serde_json::Value>,
    data: &BTreeMap<String, serde_json::Value>,
) {
    for (key, value) in data {
        target.insert(key.clone(), value.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use specflow_types::{
        ProjectId, SymbolicData, SymbolicKind, SymbolicReference, UpdateSource,
    };

    fn make_context() -> ProjectContext {
        let mut ctx = ProjectContext::new(ProjectId::new("p1"), "Context for Acme");
        ctx.symbolic_data.insert(
            "project_requirements".to_string(),
            SymbolicData::new(
                SymbolicKind::Requirements,
                "Acme",
                json!({"requirements": []}),
                json!({"type": "requirements"}),
            ),
        );
        ctx.symbolic_references.insert(
            "requirements_ref".to_string(),
            SymbolicReference::new("requirements_ref", "project_requirements", "project_requirements"),
        );
        ctx
    }

    fn requirements_update(ctx: &ProjectContext, key: &str) -> ContextUpdate {
        ContextUpdate::requirements(
            ctx.id.clone(),
            BTreeMap::from([(key.to_string(), json!("x"))]),
        )
    }

    #[test]
    fn test_fresh_context_is_consistent() {
        let validator = ConsistencyValidator::new();
        let ctx = make_context();
        assert!(validator.is_consistent(&ctx));
        assert!(validator.find_inconsistencies(&ctx).is_empty());
    }

    #[test]
    fn test_missing_symbolic_name() {
        let validator = ConsistencyValidator::new();
        let mut ctx = make_context();
        ctx.symbolic_data
            .get_mut("project_requirements")
            .unwrap()
            .symbolic_name = String::new();

        let violations = validator.find_inconsistencies(&ctx);
        assert!(violations
            .iter()
            .any(|v| v.contains("project_requirements") && v.contains("missing name")));
    }

    #[test]
    fn test_dangling_parent_and_child() {
        let validator = ConsistencyValidator::new();
        let mut ctx = make_context();
        {
            let entry = ctx.symbolic_data.get_mut("project_requirements").unwrap();
            entry.parent_symbolic_id = Some("ghost-parent".to_string());
            entry.child_symbolic_ids.push("ghost-child".to_string());
        }

        let violations = validator.find_inconsistencies(&ctx);
        assert!(violations
            .iter()
            .any(|v| v.contains("non-existent parent ghost-parent")));
        assert!(violations
            .iter()
            .any(|v| v.contains("non-existent child ghost-child")));
    }

    #[test]
    fn test_dangling_related() {
        let validator = ConsistencyValidator::new();
        let mut ctx = make_context();
        ctx.symbolic_data
            .get_mut("project_requirements")
            .unwrap()
            .related_symbolic_ids
            .push("ghost-related".to_string());

        let violations = validator.find_inconsistencies(&ctx);
        assert!(violations
            .iter()
            .any(|v| v.contains("non-existent related data ghost-related")));
    }

    #[test]
    fn test_reference_missing_fields() {
        let validator = ConsistencyValidator::new();
        let mut ctx = make_context();
        ctx.symbolic_references.insert(
            "bad_ref".to_string(),
            SymbolicReference::new("bad_ref", "", ""),
        );

        let violations = validator.find_inconsistencies(&ctx);
        assert!(violations
            .iter()
            .any(|v| v.contains("bad_ref") && v.contains("missing name")));
        assert!(violations
            .iter()
            .any(|v| v.contains("bad_ref") && v.contains("missing type")));
    }

    #[test]
    fn test_reference_to_missing_symbolic_data() {
        let validator = ConsistencyValidator::new();
        let mut ctx = make_context();
        ctx.symbolic_references.insert(
            "orphan_ref".to_string(),
            SymbolicReference::new("orphan_ref", "requirement", "no_such_entry"),
        );

        let violations = validator.find_inconsistencies(&ctx);
        assert!(violations
            .iter()
            .any(|v| v.contains("orphan_ref") && v.contains("no_such_entry")));
    }

    #[test]
    fn test_data_integrity_checks() {
        let validator = ConsistencyValidator::new();
        let mut ctx = make_context();
        ctx.project_id = ProjectId::new("");
        ctx.version = 0;
        ctx.updated_at = ctx.created_at - chrono::Duration::seconds(5);

        let violations = validator.find_inconsistencies(&ctx);
        assert!(violations.iter().any(|v| v.contains("missing project id")));
        assert!(violations.iter().any(|v| v.contains("invalid version 0")));
        assert!(violations
            .iter()
            .any(|v| v.contains("created timestamp is after updated timestamp")));
    }

    #[test]
    fn test_version_history_length_mismatch() {
        let validator = ConsistencyValidator::new();
        let mut ctx = make_context();
        ctx.version = 3; // but both histories are empty

        let violations = validator.find_inconsistencies(&ctx);
        assert!(violations
            .iter()
            .any(|v| v.contains("version history length 0 does not match version 3")));
    }

    #[test]
    fn test_update_history_length_mismatch() {
        let validator = ConsistencyValidator::new();
        let mut ctx = make_context();
        let update = requirements_update(&ctx, "new_req");
        apply_updates(&mut ctx, std::slice::from_ref(&update));
        ctx.update_history.clear();

        let violations = validator.find_inconsistencies(&ctx);
        assert!(violations
            .iter()
            .any(|v| v.contains("update history length 0")));
    }

    #[test]
    fn test_apply_updates_maintains_histories() {
        let mut ctx = make_context();
        let first = requirements_update(&ctx, "a");
        let second = requirements_update(&ctx, "b");
        apply_updates(&mut ctx, &[first.clone(), second.clone()]);

        assert_eq!(ctx.version, 3);
        assert_eq!(ctx.version_history.len(), 2);
        assert_eq!(ctx.update_history, vec![first.id, second.id]);
        assert_eq!(ctx.requirements["a"], json!("x"));
        assert_eq!(ctx.requirements["b"], json!("x"));

        let validator = ConsistencyValidator::new();
        assert!(validator.is_consistent(&ctx));
    }

    #[test]
    fn test_later_updates_overwrite_earlier_keys() {
        let mut ctx = make_context();
        let first = ContextUpdate::requirements(
            ctx.id.clone(),
            BTreeMap::from([("key".to_string(), json!("old"))]),
        );
        let second = ContextUpdate::requirements(
            ctx.id.clone(),
            BTreeMap::from([("key".to_string(), json!("new"))]),
        );
        apply_updates(&mut ctx, &[first, second]);
        assert_eq!(ctx.requirements["key"], json!("new"));
    }

    #[test]
    fn test_validate_update_never_mutates_original() {
        let validator = ConsistencyValidator::new();
        let ctx = make_context();
        let before_version = ctx.version;

        let bad = ContextUpdate::new(
            ctx.id.clone(),
            specflow_types::UpdatePayload::SymbolicData(BTreeMap::from([(
                "broken".to_string(),
                SymbolicData::new(
                    SymbolicKind::GenericData,
                    "broken",
                    json!({}),
                    json!({}),
                )
                .with_child("missing-child"),
            )])),
            UpdateSource::System,
        );

        let violations = validator.validate_update(&ctx, &[bad]);
        assert!(!violations.is_empty());
        assert_eq!(ctx.version, before_version);
        assert!(!ctx.symbolic_data.contains_key("broken"));
    }

    #[test]
    fn test_symbolic_update_payloads_merge() {
        let mut ctx = make_context();
        let data_update = ContextUpdate::new(
            ctx.id.clone(),
            specflow_types::UpdatePayload::SymbolicData(BTreeMap::from([(
                "api_spec".to_string(),
                SymbolicData::new(
                    SymbolicKind::ApiSpecification,
                    "Payments API",
                    json!({"openapi": "3.0.0"}),
                    json!({"type": "api_specification"}),
                ),
            )])),
            UpdateSource::User("maria".to_string()),
        );
        let reference_update = ContextUpdate::new(
            ctx.id.clone(),
            specflow_types::UpdatePayload::SymbolicReferences(BTreeMap::from([(
                "api_ref".to_string(),
                SymbolicReference::new("api_ref", "api_spec", "api_spec"),
            )])),
            UpdateSource::System,
        );

        apply_updates(&mut ctx, &[data_update, reference_update]);
        assert_eq!(ctx.version, 3);
        assert!(ctx.symbolic_data.contains_key("api_spec"));
        assert!(ConsistencyValidator::new().is_consistent(&ctx));
    }

}
