//! Decision records and the decision log

use super::analysis::Readability;
use crate::task::{Task, TaskKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Minimum length of a stakeholder explanation
pub const MIN_EXPLANATION_LEN: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImplementationStatus {
    #[default]
    Pending,
    Implemented,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    #[default]
    Pending,
    Verified,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionMetadata {
    pub decision_date: DateTime<Utc>,
    pub decision_maker: String,
    pub kind: TaskKind,
    pub criticality: Option<String>,
    pub implementation_status: ImplementationStatus,
    pub verification_status: VerificationStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DecisionRationale {
    pub expertise_references: Vec<String>,
    pub considerations: Vec<String>,
}

/// A tracked decision
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionRecord {
    pub id: String,
    pub task_id: String,
    pub title: String,
    pub description: String,
    /// The decision itself: an option id or a synthesized text
    pub decision: String,
    /// `"weighted_vote"`, `"unanimous"`, `"conflict_resolution_synthesis"`, ...
    pub method: String,
    pub metadata: DecisionMetadata,
    pub voting_results: Option<Value>,
    pub rationale: DecisionRationale,
    pub stakeholder_explanation: String,
    pub readability_score: Readability,
    pub implemented: bool,
    pub implementation_timestamp: Option<DateTime<Utc>>,
    pub implementation_details: Option<Map<String, Value>>,
}

impl DecisionRecord {
    pub fn new(
        task_id: impl Into<String>,
        task: &Task,
        decision: impl Into<String>,
        method: impl Into<String>,
        decision_maker: impl Into<String>,
    ) -> Self {
        Self {
            id: String::new(),
            task_id: task_id.into(),
            title: task.label().to_string(),
            description: task.description.clone(),
            decision: decision.into(),
            method: method.into(),
            metadata: DecisionMetadata {
                decision_date: Utc::now(),
                decision_maker: decision_maker.into(),
                kind: task.kind,
                criticality: task.criticality.clone(),
                implementation_status: ImplementationStatus::Pending,
                verification_status: VerificationStatus::Pending,
            },
            voting_results: None,
            rationale: DecisionRationale::default(),
            stakeholder_explanation: String::new(),
            readability_score: Readability::default(),
            implemented: false,
            implementation_timestamp: None,
            implementation_details: None,
        }
    }

    pub fn with_rationale(mut self, rationale: DecisionRationale) -> Self {
        self.rationale = rationale;
        self
    }

    pub fn with_voting_results(mut self, results: Value) -> Self {
        self.voting_results = Some(results);
        self
    }

    /// Attach a stakeholder explanation built from `how` and `details`
    pub fn with_explanation(mut self, how: &str, details: &[String]) -> Self {
        let explanation = stakeholder_explanation(&self.title, &self.decision, how, details);
        self.readability_score = Readability::of(&explanation);
        self.stakeholder_explanation = explanation;
        self
    }
}

/// Plain-language summary of a decision for people outside the team
///
/// Always at least [`MIN_EXPLANATION_LEN`] characters long.
pub fn stakeholder_explanation(
    title: &str,
    decision: &str,
    how: &str,
    details: &[String],
) -> String {
    let mut text = format!("Decision summary for '{}': {} ", title, how.trim());
    text.push_str(&format!("The decision is: {}. ", decision.trim().trim_end_matches('.')));
    for detail in details {
        let detail = detail.trim().trim_end_matches('.');
        if !detail.is_empty() {
            text.push_str(detail);
            text.push_str(". ");
        }
    }
    let grade = Readability::of(&text).flesch_kincaid_grade;
    text.push_str(&format!(
        "This explanation is written at about a grade {:.1} reading level. ",
        grade.max(0.0)
    ));
    text.push_str(
        "Next steps: implement the decision and monitor outcomes. \
         Questions or concerns about this decision go to the team lead.",
    );
    text
}

/// Filter for [`DecisionLog::query`]; unset fields match everything
#[derive(Debug, Clone, Default)]
pub struct DecisionQuery {
    pub kind: Option<TaskKind>,
    pub criticality: Option<String>,
    pub implementation_status: Option<ImplementationStatus>,
    pub verification_status: Option<VerificationStatus>,
    pub date_range: Option<(DateTime<Utc>, DateTime<Utc>)>,
}

impl DecisionQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_kind(mut self, kind: TaskKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn with_criticality(mut self, criticality: impl Into<String>) -> Self {
        self.criticality = Some(criticality.into());
        self
    }

    pub fn with_implementation_status(mut self, status: ImplementationStatus) -> Self {
        self.implementation_status = Some(status);
        self
    }

    pub fn with_verification_status(mut self, status: VerificationStatus) -> Self {
        self.verification_status = Some(status);
        self
    }

    pub fn with_date_range(mut self, from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        self.date_range = Some((from, to));
        self
    }

    pub fn matches(&self, record: &DecisionRecord) -> bool {
        let meta = &record.metadata;
        self.kind.is_none_or(|k| k == meta.kind)
            && self
                .criticality
                .as_deref()
                .is_none_or(|c| {
                    meta.criticality
                        .as_deref()
                        .is_some_and(|m| m.eq_ignore_ascii_case(c))
                })
            && self
                .implementation_status
                .is_none_or(|s| s == meta.implementation_status)
            && self
                .verification_status
                .is_none_or(|s| s == meta.verification_status)
            && self
                .date_range
                .is_none_or(|(from, to)| meta.decision_date >= from && meta.decision_date <= to)
    }
}

/// Every decision the team has made, in tracking order
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DecisionLog {
    records: BTreeMap<String, DecisionRecord>,
    order: Vec<String>,
}

impl DecisionLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a record and return its id
    ///
    /// Ids have the form `decision-<task id>-<n>`, `n` counting from 1.
    pub fn track(&mut self, mut record: DecisionRecord) -> String {
        let id = format!("decision-{}-{}", record.task_id, self.order.len() + 1);
        record.id = id.clone();
        self.records.insert(id.clone(), record);
        self.order.push(id.clone());
        id
    }

    pub fn get(&self, id: &str) -> Option<&DecisionRecord> {
        self.records.get(id)
    }

    /// Most recent decision for a task
    pub fn latest_for_task(&self, task_id: &str) -> Option<&DecisionRecord> {
        self.order
            .iter()
            .rev()
            .filter_map(|id| self.records.get(id))
            .find(|r| r.task_id == task_id)
    }

    pub fn mark_implemented(&mut self, id: &str) -> bool {
        let Some(record) = self.records.get_mut(id) else {
            return false;
        };
        record.implemented = true;
        record.implementation_timestamp = Some(Utc::now());
        record.metadata.implementation_status = ImplementationStatus::Implemented;
        true
    }

    pub fn add_implementation_details(&mut self, id: &str, details: Map<String, Value>) -> bool {
        let Some(record) = self.records.get_mut(id) else {
            return false;
        };
        record.implementation_details = Some(details);
        true
    }

    pub fn mark_verified(&mut self, id: &str) -> bool {
        let Some(record) = self.records.get_mut(id) else {
            return false;
        };
        record.metadata.verification_status = VerificationStatus::Verified;
        true
    }

    pub fn query(&self, query: &DecisionQuery) -> Vec<&DecisionRecord> {
        self.order
            .iter()
            .filter_map(|id| self.records.get(id))
            .filter(|r| query.matches(r))
            .collect()
    }

    /// A decision is documented once it states what was decided and how it was implemented
    pub fn has_documentation(&self, id: &str) -> bool {
        self.records.get(id).is_some_and(|r| {
            !r.decision.trim().is_empty()
                && r.implementation_details.as_ref().is_some_and(|d| !d.is_empty())
        })
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DecisionRecord> {
        self.order.iter().filter_map(|id| self.records.get(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use serde_json::json;

    fn record(task: &Task) -> DecisionRecord {
        DecisionRecord::new(task.id.clone(), task, "a", "weighted_vote", "team vote")
            .with_explanation("The team voted.", &["Three agents took part".to_string()])
    }

    #[test]
    fn test_explanation_is_long_enough() {
        let text = stakeholder_explanation("t", "x", "", &[]);
        assert!(text.len() >= MIN_EXPLANATION_LEN);
        assert!(text.starts_with("Decision summary for 't'"));
    }

    #[test]
    fn test_track_and_get() {
        let task = Task::new("Pick a store").with_id("t1");
        let mut log = DecisionLog::new();
        let id = log.track(record(&task));

        assert_eq!(id, "decision-t1-1");
        let stored = log.get(&id).unwrap();
        assert!(!stored.implemented);
        assert!(stored.stakeholder_explanation.len() >= MIN_EXPLANATION_LEN);
        assert!(stored.readability_score.words_per_sentence > 0.0);
        assert_eq!(log.latest_for_task("t1").unwrap().id, id);
    }

    #[test]
    fn test_implementation_lifecycle() {
        let task = Task::new("Pick a store").with_id("t1");
        let mut log = DecisionLog::new();
        let id = log.track(record(&task));

        assert!(!log.has_documentation(&id));
        assert!(log.mark_implemented(&id));
        let details = json!({"pr": 42}).as_object().cloned().unwrap();
        assert!(log.add_implementation_details(&id, details));
        assert!(log.has_documentation(&id));

        let stored = log.get(&id).unwrap();
        assert!(stored.implemented);
        assert_eq!(
            stored.metadata.implementation_status,
            ImplementationStatus::Implemented
        );

        assert!(!log.mark_implemented("missing"));
        assert!(!log.add_implementation_details("missing", Map::new()));
        assert!(!log.has_documentation("missing"));
    }

    #[test]
    fn test_query() {
        let critical = Task::new("Auth scheme")
            .with_id("c")
            .with_kind(TaskKind::CriticalDecision)
            .with_criticality("high");
        let routine = Task::new("Log format").with_id("r");

        let mut log = DecisionLog::new();
        let critical_id = log.track(record(&critical));
        log.track(record(&routine));
        log.mark_implemented(&critical_id);

        let by_kind = log.query(&DecisionQuery::new().with_kind(TaskKind::CriticalDecision));
        assert_eq!(by_kind.len(), 1);
        assert_eq!(by_kind[0].task_id, "c");

        let by_criticality = log.query(&DecisionQuery::new().with_criticality("HIGH"));
        assert_eq!(by_criticality.len(), 1);

        let pending = log.query(
            &DecisionQuery::new().with_implementation_status(ImplementationStatus::Pending),
        );
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].task_id, "r");

        let now = Utc::now();
        let recent = log.query(
            &DecisionQuery::new()
                .with_date_range(now - Duration::minutes(5), now + Duration::minutes(5)),
        );
        assert_eq!(recent.len(), 2);
        let old = log.query(
            &DecisionQuery::new()
                .with_date_range(now - Duration::days(2), now - Duration::days(1)),
        );
        assert!(old.is_empty());
    }
}
