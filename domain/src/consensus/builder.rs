//! Conflict-aware consensus building

use super::analysis::{concerns, extract_topic, key_points};
use super::conflict::{Conflict, ConflictKind, text_conflict};
use super::decision::{DecisionLog, DecisionQuery, DecisionRationale, DecisionRecord};
use super::opinion::{Opinion, Solution, Stance};
use crate::agent::{Agent, TeamRoster};
use crate::core::text::{truncate, word_set};
use crate::task::{Task, task_key};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};

/// Severity of an option conflict when either side holds a strong stance
const STRONG_OPTION_SEVERITY: f64 = 0.8;
const OPTION_SEVERITY: f64 = 0.5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionStep {
    pub description: String,
    pub outcome: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionProcess {
    pub steps: Vec<ResolutionStep>,
}

impl ResolutionProcess {
    fn push(&mut self, description: impl Into<String>, outcome: impl Into<String>) {
        self.steps.push(ResolutionStep {
            description: description.into(),
            outcome: outcome.into(),
        });
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsensusDocumentation {
    pub summary: String,
    pub detailed_process: String,
    pub lessons_learned: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsensusResult {
    pub task_id: String,
    pub identified_conflicts: Vec<Conflict>,
    pub resolution_process: ResolutionProcess,
    pub agent_reasoning: BTreeMap<String, String>,
    pub key_concerns: Vec<String>,
    pub addressed_concerns: Vec<String>,
    /// Option id when an option won, otherwise the synthesized text
    pub consensus_decision: String,
    pub selected_option: Option<String>,
    pub synthesis: Option<String>,
    pub documentation: ConsensusDocumentation,
    /// `"unanimous"`, `"conflict_resolution_synthesis"` or `"no_positions"`
    pub method: String,
    pub decision_id: Option<String>,
}

impl ConsensusResult {
    pub fn is_unanimous(&self) -> bool {
        self.method == "unanimous"
    }
}

/// Collects solutions and opinions per task and turns them into a decision
///
/// Keeps the team's decision log: every consensus it builds is tracked, and
/// other components (voting) can track theirs through [`track_decision`].
///
/// [`track_decision`]: ConsensusBuilder::track_decision
///
/// # Example
///
/// ```
/// use edrr_domain::{Agent, ConsensusBuilder, Stance, Task, TaskOption, TeamRoster};
///
/// let roster = TeamRoster::with_agents([Agent::new("a"), Agent::new("b")]).unwrap();
/// let task = Task::new("Pick a store")
///     .with_id("store")
///     .with_options([TaskOption::new("pg", "Postgres"), TaskOption::new("sq", "SQLite")]);
///
/// let mut builder = ConsensusBuilder::new();
/// builder.set_agent_opinion("store", "a", "pg", Stance::Favor);
/// builder.set_agent_opinion("store", "b", "pg", Stance::StronglyFavor);
///
/// let result = builder.build_consensus(&task, &roster);
/// assert_eq!(result.consensus_decision, "pg");
/// assert!(result.identified_conflicts.is_empty());
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConsensusBuilder {
    solutions: BTreeMap<String, Vec<Solution>>,
    opinions: BTreeMap<String, BTreeMap<String, Opinion>>,
    decisions: DecisionLog,
}

impl ConsensusBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_solution(&mut self, task_id: &str, solution: Solution) {
        self.solutions
            .entry(task_id.to_string())
            .or_default()
            .push(solution);
    }

    /// Record an agent's stance on an option, replacing any earlier stance
    pub fn set_agent_opinion(
        &mut self,
        task_id: &str,
        agent: &str,
        option_id: &str,
        stance: Stance,
    ) {
        let opinion = self.opinion_entry(task_id, agent);
        opinion.option_id = Some(option_id.to_string());
        opinion.stance = stance;
        opinion.timestamp = chrono::Utc::now();
    }

    /// Record an agent's free-text opinion, replacing any earlier text
    pub fn add_opinion(&mut self, task_id: &str, agent: &str, text: &str, rationale: &str) {
        let opinion = self.opinion_entry(task_id, agent);
        opinion.opinion = text.to_string();
        opinion.rationale = rationale.to_string();
        opinion.timestamp = chrono::Utc::now();
    }

    fn opinion_entry(&mut self, task_id: &str, agent: &str) -> &mut Opinion {
        self.opinions
            .entry(task_id.to_string())
            .or_default()
            .entry(agent.to_string())
            .or_insert_with(|| Opinion::new(agent))
    }

    pub fn opinions(&self, task_id: &str) -> Vec<&Opinion> {
        self.opinions
            .get(task_id)
            .map(|m| m.values().collect())
            .unwrap_or_default()
    }

    pub fn solutions(&self, task_id: &str) -> &[Solution] {
        self.solutions.get(task_id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Forget collected solutions and opinions for a task
    pub fn clear_task(&mut self, task_id: &str) {
        self.solutions.remove(task_id);
        self.opinions.remove(task_id);
    }

    /// Build a consensus from everything collected for `task`
    pub fn build_consensus(&mut self, task: &Task, roster: &TeamRoster) -> ConsensusResult {
        let key = task_key(task);
        let opinions: Vec<Opinion> = self.opinions(&key).into_iter().cloned().collect();
        let solutions = self.solutions(&key).to_vec();

        let keywords = consensus_keywords(task);
        let weight_of = |agent: &str| {
            roster
                .get(agent)
                .map(|a| expertise_weight(a, &keywords))
                .unwrap_or(0.5)
        };

        let statements = statements(&opinions, &solutions);
        let agent_reasoning = agent_reasoning(&opinions, &solutions);

        let positions: BTreeMap<&str, &str> = opinions
            .iter()
            .filter_map(|o| o.favored_option().map(|opt| (o.agent.as_str(), opt)))
            .collect();
        let mut favored: Vec<&str> = positions.values().copied().collect();
        favored.sort_by_key(|o| option_rank(task, o));
        favored.dedup();

        let mut conflicts = option_conflicts(&favored, &opinions);
        conflicts.extend(text_conflicts(&statements));
        for (i, conflict) in conflicts.iter_mut().enumerate() {
            conflict.id = format!("conflict-{}", i + 1);
        }

        let mut process = ResolutionProcess::default();
        let mut result = if conflicts.is_empty() {
            let (decision, selected, method) = if let Some(option) = favored.first() {
                (option.to_string(), Some(option.to_string()), "unanimous")
            } else if solutions.len() == 1 {
                (solutions[0].content.clone(), None, "unanimous")
            } else if !statements.is_empty() {
                (synthesize(None, task, &statements, &weight_of, &[]), None, "unanimous")
            } else {
                (String::new(), None, "no_positions")
            };

            let outcome = if decision.is_empty() {
                "No positions recorded".to_string()
            } else {
                format!("Team agrees on {}", decision_label(task, &decision))
            };
            process.push("No conflicts identified", outcome);

            let documentation = ConsensusDocumentation {
                summary: format!(
                    "Consensus on '{}': {}",
                    task.label(),
                    decision_label(task, &decision)
                ),
                detailed_process: describe_process(&process),
                lessons_learned: vec!["The team agreed without conflicts".to_string()],
            };

            ConsensusResult {
                task_id: key.clone(),
                identified_conflicts: Vec::new(),
                resolution_process: process,
                agent_reasoning,
                key_concerns: Vec::new(),
                addressed_concerns: Vec::new(),
                consensus_decision: decision,
                selected_option: selected,
                synthesis: None,
                documentation,
                method: method.to_string(),
                decision_id: None,
            }
        } else {
            let high = conflicts.iter().filter(|c| c.is_high()).count();
            process.push(
                format!("Identified {} conflict(s)", conflicts.len()),
                format!("{} high severity", high),
            );

            let leading = leading_option(task, &opinions, &positions, &weight_of);
            process.push(
                "Weighed positions by expertise",
                match &leading {
                    Some(option) => format!("leading option {}", option),
                    None => "no option preferences recorded".to_string(),
                },
            );

            let key_concerns = key_concerns(
                task,
                leading.as_deref(),
                &opinions,
                &positions,
                &conflicts,
                &statements,
            );
            process.push(
                "Extracted key concerns from minority positions",
                format!("{} concern(s)", key_concerns.len()),
            );

            let synthesis = synthesize(
                leading.as_deref(),
                task,
                &statements,
                &weight_of,
                &key_concerns,
            );
            let decision = leading.clone().unwrap_or_else(|| synthesis.clone());
            process.push("Synthesized decision", truncate(&synthesis, 200));

            let synthesis_lower = synthesis.to_lowercase();
            let addressed_concerns: Vec<String> = key_concerns
                .iter()
                .filter(|c| synthesis_lower.contains(&c.to_lowercase()))
                .cloned()
                .collect();

            let mut lessons = vec![format!(
                "Resolved {} conflict(s) through synthesis",
                conflicts.len()
            )];
            lessons.extend(
                conflicts
                    .iter()
                    .filter(|c| c.is_high())
                    .map(|c| {
                        format!(
                            "High-severity conflict between {}: {}",
                            c.agents.join(" and "),
                            c.reason
                        )
                    }),
            );

            let documentation = ConsensusDocumentation {
                summary: format!(
                    "Consensus on '{}': {}",
                    task.label(),
                    decision_label(task, &decision)
                ),
                detailed_process: describe_process(&process),
                lessons_learned: lessons,
            };

            ConsensusResult {
                task_id: key.clone(),
                identified_conflicts: conflicts,
                resolution_process: process,
                agent_reasoning,
                key_concerns,
                addressed_concerns,
                consensus_decision: decision,
                selected_option: leading,
                synthesis: Some(synthesis),
                documentation,
                method: "conflict_resolution_synthesis".to_string(),
                decision_id: None,
            }
        };

        if !result.consensus_decision.is_empty() {
            let record = self.consensus_record(&key, task, roster, &keywords, &result);
            result.decision_id = Some(self.decisions.track(record));
        }
        result
    }

    fn consensus_record(
        &self,
        key: &str,
        task: &Task,
        roster: &TeamRoster,
        keywords: &BTreeSet<String>,
        result: &ConsensusResult,
    ) -> DecisionRecord {
        let expertise_references = roster
            .iter()
            .filter(|a| expertise_weight(a, keywords) > 0.5)
            .map(|a| {
                let expertise: Vec<&str> = a.expertise.iter().map(String::as_str).collect();
                format!("{} ({})", a.name, expertise.join(", "))
            })
            .collect();
        let mut considerations = result.key_concerns.clone();
        considerations.extend(result.identified_conflicts.iter().map(|c| c.reason.clone()));

        let (how, details) = if result.identified_conflicts.is_empty() {
            ("The team reached agreement without conflicts.".to_string(), Vec::new())
        } else {
            (
                format!(
                    "After weighing {} conflicting perspectives, the team reached a \
                     synthesis-based decision.",
                    result.identified_conflicts.len()
                ),
                result
                    .synthesis
                    .iter()
                    .map(|s| format!("Key points: {}", truncate(s, 300)))
                    .collect(),
            )
        };

        DecisionRecord::new(
            key,
            task,
            result.consensus_decision.clone(),
            result.method.clone(),
            "team consensus",
        )
        .with_rationale(DecisionRationale {
            expertise_references,
            considerations,
        })
        .with_explanation(&how, &details)
    }

    pub fn track_decision(&mut self, record: DecisionRecord) -> String {
        self.decisions.track(record)
    }

    pub fn decision_log(&self) -> &DecisionLog {
        &self.decisions
    }

    pub fn get_tracked_decision(&self, decision_id: &str) -> Option<&DecisionRecord> {
        self.decisions.get(decision_id)
    }

    pub fn latest_decision_for(&self, task_id: &str) -> Option<&DecisionRecord> {
        self.decisions.latest_for_task(task_id)
    }

    pub fn mark_decision_implemented(&mut self, decision_id: &str) -> bool {
        self.decisions.mark_implemented(decision_id)
    }

    pub fn add_decision_implementation_details(
        &mut self,
        decision_id: &str,
        details: Map<String, Value>,
    ) -> bool {
        self.decisions.add_implementation_details(decision_id, details)
    }

    pub fn query_decisions(&self, query: &DecisionQuery) -> Vec<&DecisionRecord> {
        self.decisions.query(query)
    }

    pub fn has_decision_documentation(&self, decision_id: &str) -> bool {
        self.decisions.has_documentation(decision_id)
    }
}

/// Weight of an agent's view: `0.5 + 0.5 × overlap`, 0.5 when nothing to compare
///
/// Overlap is the share of task keywords covered by the agent's expertise words.
pub fn expertise_weight(agent: &Agent, keywords: &BTreeSet<String>) -> f64 {
    let expertise: BTreeSet<String> = agent.expertise.iter().flat_map(|e| word_set(e)).collect();
    if expertise.is_empty() || keywords.is_empty() {
        return 0.5;
    }
    let overlap = expertise.intersection(keywords).count() as f64 / keywords.len() as f64;
    0.5 + 0.5 * overlap
}

fn consensus_keywords(task: &Task) -> BTreeSet<String> {
    let mut keywords = task.keywords();
    for expertise in task.required_expertise.iter().flatten() {
        keywords.extend(word_set(expertise));
    }
    if let Some(domain) = &task.domain {
        keywords.extend(word_set(domain));
    }
    keywords
}

/// Free-text statements: opinion texts, then solutions of agents with no text
fn statements(opinions: &[Opinion], solutions: &[Solution]) -> Vec<(String, String)> {
    let mut out: Vec<(String, String)> = opinions
        .iter()
        .filter(|o| o.has_text())
        .map(|o| (o.agent.clone(), o.opinion.clone()))
        .collect();
    for solution in solutions {
        if !out.iter().any(|(agent, _)| agent == &solution.agent)
            && !solution.content.trim().is_empty()
        {
            out.push((solution.agent.clone(), solution.content.clone()));
        }
    }
    out
}

fn agent_reasoning(opinions: &[Opinion], solutions: &[Solution]) -> BTreeMap<String, String> {
    let mut reasoning = BTreeMap::new();
    for opinion in opinions {
        let text = if !opinion.rationale.trim().is_empty() {
            opinion.rationale.clone()
        } else if opinion.has_text() {
            opinion.opinion.clone()
        } else if let Some(option) = &opinion.option_id {
            format!("{} {}", opinion.stance.as_str().replace('_', " "), option)
        } else {
            continue;
        };
        reasoning.insert(opinion.agent.clone(), text);
    }
    for solution in solutions {
        reasoning
            .entry(solution.agent.clone())
            .or_insert_with(|| format!("Proposed: {}", truncate(&solution.content, 200)));
    }
    reasoning
}

fn option_rank(task: &Task, option: &str) -> (usize, String) {
    let index = task
        .options
        .iter()
        .position(|o| o.id == option)
        .unwrap_or(usize::MAX);
    (index, option.to_string())
}

fn decision_label(task: &Task, decision: &str) -> String {
    match task.option(decision) {
        Some(option) if option.name != option.id => format!("{} ({})", option.name, option.id),
        _ => decision.to_string(),
    }
}

fn option_conflicts(favored: &[&str], opinions: &[Opinion]) -> Vec<Conflict> {
    let mut conflicts = Vec::new();
    for (i, first) in favored.iter().enumerate() {
        for second in &favored[i + 1..] {
            let backers: Vec<&Opinion> = opinions
                .iter()
                .filter(|o| {
                    matches!(o.favored_option(), Some(opt) if opt == *first || opt == *second)
                })
                .collect();
            let severity = if backers.iter().any(|o| o.stance == Stance::StronglyFavor) {
                STRONG_OPTION_SEVERITY
            } else {
                OPTION_SEVERITY
            };
            conflicts.push(Conflict::new(
                ConflictKind::OptionPreference,
                backers.iter().map(|o| o.agent.clone()).collect(),
                vec![first.to_string(), second.to_string()],
                format!("agents favor different options: {} vs {}", first, second),
                severity,
            ));
        }
    }
    conflicts
}

fn text_conflicts(statements: &[(String, String)]) -> Vec<Conflict> {
    let mut conflicts = Vec::new();
    for (i, (agent_a, text_a)) in statements.iter().enumerate() {
        for (agent_b, text_b) in &statements[i + 1..] {
            if agent_a == agent_b {
                continue;
            }
            if let Some((severity, reason)) = text_conflict(text_a, text_b) {
                conflicts.push(Conflict::new(
                    ConflictKind::Opinion,
                    vec![agent_a.clone(), agent_b.clone()],
                    Vec::new(),
                    reason,
                    severity,
                ));
            }
        }
    }
    conflicts
}

/// Option with the highest stance × expertise score
///
/// Ties go to the option with more supporters, then to the earlier option.
fn leading_option(
    task: &Task,
    opinions: &[Opinion],
    positions: &BTreeMap<&str, &str>,
    weight_of: &dyn Fn(&str) -> f64,
) -> Option<String> {
    let mut scores: BTreeMap<&str, f64> = BTreeMap::new();
    for opinion in opinions {
        if let Some(option) = &opinion.option_id {
            *scores.entry(option.as_str()).or_default() +=
                opinion.stance.score() * weight_of(&opinion.agent);
        }
    }
    let supporters = |option: &str| positions.values().filter(|o| **o == option).count();

    scores
        .into_iter()
        .filter(|(option, _)| supporters(option) > 0)
        .max_by(|(a, score_a), (b, score_b)| {
            score_a
                .total_cmp(score_b)
                .then_with(|| supporters(a).cmp(&supporters(b)))
                .then_with(|| option_rank(task, b).cmp(&option_rank(task, a)))
        })
        .map(|(option, _)| option.to_string())
}

fn key_concerns(
    task: &Task,
    leading: Option<&str>,
    opinions: &[Opinion],
    positions: &BTreeMap<&str, &str>,
    conflicts: &[Conflict],
    statements: &[(String, String)],
) -> Vec<String> {
    let mut minority: BTreeSet<&str> = BTreeSet::new();
    for opinion in opinions {
        let dissents = match (leading, positions.get(opinion.agent.as_str())) {
            (Some(lead), Some(favored)) => *favored != lead,
            (Some(lead), None) => {
                opinion.option_id.as_deref() == Some(lead) && opinion.stance.score() < 0.0
            }
            (None, _) => false,
        };
        if dissents {
            minority.insert(&opinion.agent);
        }
    }
    for conflict in conflicts.iter().filter(|c| c.kind == ConflictKind::Opinion) {
        for agent in &conflict.agents {
            let backs_leader =
                leading.is_some_and(|lead| positions.get(agent.as_str()) == Some(&lead));
            if !backs_leader {
                minority.insert(agent);
            }
        }
    }

    let mut out: Vec<String> = Vec::new();
    for agent in minority {
        let mut raised: Vec<String> = statements
            .iter()
            .filter(|(a, _)| a == agent)
            .flat_map(|(_, text)| concerns(text))
            .collect();
        if raised.is_empty()
            && let Some(opinion) = opinions.iter().find(|o| o.agent == agent)
            && let Some(option) = &opinion.option_id
        {
            let verb = if opinion.stance.is_positive() { "prefers" } else { "opposes" };
            raised.push(format!("{} {} {}", agent, verb, decision_label(task, option)));
        }
        for concern in raised {
            if !out.contains(&concern) {
                out.push(concern);
            }
        }
    }
    out
}

/// Decision text: the adopted option, weighted key points, acknowledged concerns
fn synthesize(
    leading: Option<&str>,
    task: &Task,
    statements: &[(String, String)],
    weight_of: &dyn Fn(&str) -> f64,
    key_concerns: &[String],
) -> String {
    let mut parts = Vec::new();
    if let Some(option) = leading {
        parts.push(format!("Adopt {}", decision_label(task, option)));
    }

    let mut ranked: Vec<(f64, &str, &str)> = statements
        .iter()
        .map(|(agent, text)| (weight_of(agent), agent.as_str(), text.as_str()))
        .collect();
    ranked.sort_by(|a, b| b.0.total_cmp(&a.0).then_with(|| a.1.cmp(b.1)));

    let mut topics = BTreeSet::new();
    for (_, _, text) in ranked {
        for point in key_points(text) {
            if topics.insert(extract_topic(&point)) {
                parts.push(point);
            }
        }
    }

    if !key_concerns.is_empty() {
        parts.push(format!("Acknowledged concerns: {}", key_concerns.join("; ")));
    }
    parts.join(". ")
}

fn describe_process(process: &ResolutionProcess) -> String {
    process
        .steps
        .iter()
        .enumerate()
        .map(|(i, s)| format!("{}. {}: {}", i + 1, s.description, s.outcome))
        .collect::<Vec<_>>()
        .join("\n")
}
