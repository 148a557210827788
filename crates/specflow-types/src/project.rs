//! Projects: the external unit of work a workflow is started for
//!
//! The orchestration core reads project fields and binds a context id
//! back onto the project when its first workflow starts; everything else
//! about a project is owned by the caller.

use crate::{ContextId, ProjectId, WorkflowId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Validation errors raised when constructing a project
#[derive(Debug, thiserror::Error)]
pub enum ProjectValidationError {
    #[error("project name must not be empty")]
    EmptyName,
}

/// Project priority
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

/// A development project coordinated by the workflow core
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    /// URL-friendly identifier derived from the name
    pub slug: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub business_case: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stakeholders: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_owner: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub technical_constraints: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub non_functional_requirements: Vec<String>,
    /// Bound by the orchestrator when the first workflow starts;
    /// the caller is responsible for persisting it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_id: Option<ContextId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workflow_id: Option<WorkflowId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    pub priority: Priority,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    /// Create a new project.
    ///
    /// Fails fast on an empty name; no partially-constructed project is
    /// ever observable.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Result<Self, ProjectValidationError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ProjectValidationError::EmptyName);
        }
        let slug = slugify(&name);
        let now = Utc::now();
        Ok(Self {
            id: ProjectId::generate(),
            name,
            slug,
            description: description.into(),
            business_case: None,
            stakeholders: Vec::new(),
            product_owner: None,
            technical_constraints: Vec::new(),
            non_functional_requirements: Vec::new(),
            context_id: None,
            workflow_id: None,
            tags: Vec::new(),
            priority: Priority::default(),
            created_at: now,
            updated_at: now,
        })
    }

    pub fn with_stakeholder(mut self, stakeholder: impl Into<String>) -> Self {
        self.stakeholders.push(stakeholder.into());
        self
    }

    pub fn with_technical_constraint(mut self, constraint: impl Into<String>) -> Self {
        self.technical_constraints.push(constraint.into());
        self
    }

    pub fn with_business_case(mut self, case: impl Into<String>) -> Self {
        self.business_case = Some(case.into());
        self
    }

    pub fn with_product_owner(mut self, owner: impl Into<String>) -> Self {
        self.product_owner = Some(owner.into());
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }
}

fn slugify(name: &str) -> String {
    name.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_project() {
        let project = Project::new("Acme Portal", "Customer portal rewrite")
            .unwrap()
            .with_stakeholder("Bob")
            .with_technical_constraint("PostgreSQL only")
            .with_priority(Priority::High);

        assert_eq!(project.slug, "acme-portal");
        assert_eq!(project.stakeholders, vec!["Bob"]);
        assert_eq!(project.priority, Priority::High);
        assert!(project.context_id.is_none());
        assert!(project.created_at <= project.updated_at);
    }

    #[test]
    fn test_empty_name_rejected() {
        assert!(matches!(
            Project::new("", "desc"),
            Err(ProjectValidationError::EmptyName)
        ));
        assert!(matches!(
            Project::new("   ", "desc"),
            Err(ProjectValidationError::EmptyName)
        ));
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("My  Big Project"), "my-big-project");
        assert_eq!(slugify("single"), "single");
    }
}
