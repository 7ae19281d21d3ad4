use std::collections::{BTreeMap, HashSet};
use std::time::Instant;

use serde::Serialize;

use crate::error::{InsightError, Result};
use crate::filter::Filter;
use crate::insights::InsightKind;
use crate::models::Role;
use crate::output::{InsightComponent, InsightOutput, InsightSize};
use crate::store::InsightStore;

/// Metadata and computation of one insight. Built once, never mutated.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightDefinition {
    pub name: &'static str,
    pub display_name: &'static str,
    pub description: &'static str,
    pub roles: &'static [Role],
    pub component: InsightComponent,
    pub size: InsightSize,
    #[serde(skip)]
    pub kind: InsightKind,
}

const PROFESSOR_ONLY: &[Role] = &[Role::Professor];

pub static INSIGHTS: [InsightDefinition; 7] = [
    InsightDefinition {
        name: "TotalStudents",
        display_name: "Total Students",
        description: "What is the total number of students that are enrolled in the course?",
        roles: PROFESSOR_ONLY,
        component: InsightComponent::SimpleDisplay,
        size: InsightSize::Small,
        kind: InsightKind::TotalStudents,
    },
    InsightDefinition {
        name: "TotalQuestionsAsked",
        display_name: "Total Questions",
        description: "How many questions have been asked in total?",
        roles: PROFESSOR_ONLY,
        component: InsightComponent::SimpleDisplay,
        size: InsightSize::Small,
        kind: InsightKind::TotalQuestionsAsked,
    },
    InsightDefinition {
        name: "MedianWaitTime",
        display_name: "Median Wait Time",
        description: "What is the median wait time for a student to get help in the queue?",
        roles: PROFESSOR_ONLY,
        component: InsightComponent::SimpleDisplay,
        size: InsightSize::Small,
        kind: InsightKind::MedianWaitTime,
    },
    InsightDefinition {
        name: "QuestionTypeBreakdown",
        display_name: "Question Type Breakdown",
        description: "What is the distribution of student-selected question-types on the question form?",
        roles: PROFESSOR_ONLY,
        component: InsightComponent::BarChart,
        size: InsightSize::Default,
        kind: InsightKind::QuestionTypeBreakdown,
    },
    InsightDefinition {
        name: "MostActiveStudents",
        display_name: "Most Active Students",
        description: "Who are the students who have asked the most questions in Office Hours? (limit 75)",
        roles: PROFESSOR_ONLY,
        component: InsightComponent::SimpleTable,
        size: InsightSize::Default,
        kind: InsightKind::MostActiveStudents,
    },
    InsightDefinition {
        name: "QuestionToStudentRatio",
        display_name: "Questions per Student",
        description: "How many questions were asked per student?",
        roles: PROFESSOR_ONLY,
        component: InsightComponent::SimpleDisplay,
        size: InsightSize::Small,
        kind: InsightKind::QuestionToStudentRatio,
    },
    InsightDefinition {
        name: "MedianHelpingTime",
        display_name: "Median Helping Time",
        description: "What is the median duration that a TA helps a student on a call?",
        roles: PROFESSOR_ONLY,
        component: InsightComponent::SimpleDisplay,
        size: InsightSize::Small,
        kind: InsightKind::MedianHelpingTime,
    },
];

/// A computed insight together with the metadata a renderer needs.
#[derive(Debug, Serialize)]
pub struct ComputedInsight {
    #[serde(flatten)]
    pub definition: &'static InsightDefinition,
    pub output: InsightOutput,
}

/// Read-only lookup over the registered insights.
#[derive(Debug, Clone, Copy)]
pub struct InsightRegistry {
    definitions: &'static [InsightDefinition],
}

impl InsightRegistry {
    /// Validates `definitions` and wraps them. Fails on duplicate names or an
    /// insight no role may view.
    pub fn new(definitions: &'static [InsightDefinition]) -> Result<Self> {
        let mut seen = HashSet::new();
        for definition in definitions {
            if !seen.insert(definition.name) {
                return Err(InsightError::Configuration(format!(
                    "insight '{}' registered twice",
                    definition.name
                )));
            }
            if definition.roles.is_empty() {
                return Err(InsightError::Configuration(format!(
                    "insight '{}' has no permitted roles",
                    definition.name
                )));
            }
        }
        Ok(Self { definitions })
    }

    /// The insights shipped with this crate.
    pub fn builtin() -> Result<Self> {
        Self::new(&INSIGHTS)
    }

    pub fn get(&self, name: &str) -> Option<&'static InsightDefinition> {
        self.definitions.iter().find(|definition| definition.name == name)
    }

    /// Registered insights in registration order.
    pub fn definitions(&self) -> &'static [InsightDefinition] {
        self.definitions
    }

    /// Name to metadata for every insight. Computes nothing.
    pub fn list_all(&self) -> BTreeMap<&'static str, &'static InsightDefinition> {
        self.definitions
            .iter()
            .map(|definition| (definition.name, definition))
            .collect()
    }

    pub fn visible_to(&self, role: Role) -> impl Iterator<Item = &'static InsightDefinition> {
        self.definitions
            .iter()
            .filter(move |definition| definition.roles.contains(&role))
    }

    /// Resolves `name`, checks `role` and computes the insight.
    ///
    /// The role check happens before any query runs.
    pub async fn compute(
        &self,
        store: &dyn InsightStore,
        name: &str,
        role: Role,
        filters: &[Filter],
    ) -> Result<ComputedInsight> {
        let definition = self
            .get(name)
            .ok_or_else(|| InsightError::NotFound(name.to_string()))?;

        if !definition.roles.contains(&role) {
            tracing::warn!(insight = name, %role, "role may not view insight");
            return Err(InsightError::Forbidden {
                insight: name.to_string(),
                role,
            });
        }

        let started = Instant::now();
        let output = definition.kind.compute(store, filters).await?;

        if output.component() != definition.component {
            return Err(InsightError::Configuration(format!(
                "insight '{}' declares {:?} but produced {:?}",
                name,
                definition.component,
                output.component()
            )));
        }

        tracing::info!(
            insight = name,
            component = ?definition.component,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "computed insight"
        );

        Ok(ComputedInsight { definition, output })
    }
}
