use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::config::settings::SummaryPolicy;
use crate::model::arc::{ArcLogEntry, ArcOutcome};
use crate::model::narrative_event::EventKind;

const FIRST_ARC_INSTRUCTION: &str =
    "This is the first narrative arc. Be creative and set a strong opening tone.";
const CLOSING_DIRECTIVE: &str =
    "Create a structurally different arc from the previous ones and surprise the player";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UsageCount {
    pub kind: EventKind,
    pub count: usize,
}

/// An adjacent pair of event types inside one arc.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transition {
    pub from: EventKind,
    pub to: EventKind,
    pub count: usize,
}

impl Transition {
    pub fn pattern(&self) -> String {
        format!("{} → {}", self.from, self.to)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecentArc {
    pub name: String,
    pub events: Vec<EventKind>,
    pub outcome: ArcOutcome,
    pub start_day: u64,
}

/// Usage statistics over past arcs, fed back to the decision provider.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArcHistorySummary {
    pub total_arcs: usize,
    pub recent_arcs: Vec<RecentArc>,
    pub overused_events: Vec<UsageCount>,
    pub overused_openers: Vec<UsageCount>,
    pub underused_events: Vec<EventKind>,
    pub dominant_transition: Option<Transition>,
    pub instruction: String,
}

impl ArcHistorySummary {
    pub fn is_first_arc(&self) -> bool {
        self.total_arcs == 0
    }

    pub fn dominant_pattern_text(&self) -> String {
        match (&self.dominant_transition, self.total_arcs) {
            (_, 0) => "none, this is the first arc".to_string(),
            (Some(t), _) => format!("{} (occurred {}x)", t.pattern(), t.count),
            (None, _) => "no dominant pattern yet".to_string(),
        }
    }
}

pub fn summarize<'a, I>(log: I, all_known: &[EventKind]) -> ArcHistorySummary
where
    I: IntoIterator<Item = &'a ArcLogEntry>,
{
    summarize_with(log, all_known, &SummaryPolicy::default())
}

pub fn summarize_with<'a, I>(
    log: I,
    all_known: &[EventKind],
    policy: &SummaryPolicy,
) -> ArcHistorySummary
where
    I: IntoIterator<Item = &'a ArcLogEntry>,
{
    let log: Vec<&ArcLogEntry> = log.into_iter().collect();

    if log.is_empty() {
        return ArcHistorySummary {
            total_arcs: 0,
            recent_arcs: Vec::new(),
            overused_events: Vec::new(),
            overused_openers: Vec::new(),
            underused_events: all_known.to_vec(),
            dominant_transition: None,
            instruction: FIRST_ARC_INSTRUCTION.to_string(),
        };
    }

    let mut occurrences: BTreeMap<&EventKind, usize> = BTreeMap::new();
    let mut arcs_containing: BTreeMap<&EventKind, usize> = BTreeMap::new();
    let mut openers: BTreeMap<&EventKind, usize> = BTreeMap::new();
    let mut transitions: BTreeMap<(&EventKind, &EventKind), usize> = BTreeMap::new();

    for entry in &log {
        let Some(opener) = entry.events.first() else {
            continue;
        };
        *openers.entry(opener).or_default() += 1;

        for kind in &entry.events {
            *occurrences.entry(kind).or_default() += 1;
        }
        let distinct: BTreeSet<&EventKind> = entry.events.iter().collect();
        for kind in distinct {
            *arcs_containing.entry(kind).or_default() += 1;
        }

        for pair in entry.events.windows(2) {
            *transitions.entry((&pair[0], &pair[1])).or_default() += 1;
        }
    }

    let threshold = policy.min_overuse_threshold.max(log.len() / 2);
    let overused_events = ranked(&arcs_containing, |count| count >= threshold);
    let overused_openers = ranked(&openers, |count| count > 1);

    let underused_events = all_known
        .iter()
        .filter(|kind| occurrences.get(kind).copied().unwrap_or(0) <= 1)
        .cloned()
        .collect();

    // Highest count wins; ties go to the first pair in canonical order.
    let dominant_transition = transitions
        .iter()
        .fold(None, |best: Option<(&(&EventKind, &EventKind), usize)>, (pair, &count)| {
            match best {
                Some((_, best_count)) if best_count >= count => best,
                _ => Some((pair, count)),
            }
        })
        .filter(|(_, count)| *count >= 2)
        .map(|((from, to), count)| Transition {
            from: (*from).clone(),
            to: (*to).clone(),
            count,
        });

    let skip = log.len().saturating_sub(policy.recent_arcs);
    let recent_arcs = log[skip..]
        .iter()
        .map(|entry| RecentArc {
            name: entry.name.clone(),
            events: entry.events.clone(),
            outcome: entry.outcome,
            start_day: entry.start_time.days(),
        })
        .collect();

    let mut summary = ArcHistorySummary {
        total_arcs: log.len(),
        recent_arcs,
        overused_events,
        overused_openers,
        underused_events,
        dominant_transition,
        instruction: String::new(),
    };
    summary.instruction = build_instruction(&summary, policy);
    summary
}

/// Entries passing `keep`, highest count first.
fn ranked(counts: &BTreeMap<&EventKind, usize>, keep: impl Fn(usize) -> bool) -> Vec<UsageCount> {
    let mut out: Vec<UsageCount> = counts
        .iter()
        .filter(|(_, &count)| keep(count))
        .map(|(kind, &count)| UsageCount {
            kind: (*kind).clone(),
            count,
        })
        .collect();
    out.sort_by(|a, b| b.count.cmp(&a.count));
    out
}

fn join_kinds<'a>(kinds: impl Iterator<Item = &'a EventKind>) -> String {
    kinds.map(EventKind::def_name).collect::<Vec<_>>().join(", ")
}

fn build_instruction(summary: &ArcHistorySummary, policy: &SummaryPolicy) -> String {
    let mut parts = Vec::new();

    if !summary.overused_openers.is_empty() {
        parts.push(format!(
            "Do NOT open with: {}",
            join_kinds(summary.overused_openers.iter().map(|u| &u.kind))
        ));
    }

    if !summary.overused_events.is_empty() {
        parts.push(format!(
            "Reduce usage of: {}",
            join_kinds(summary.overused_events.iter().map(|u| &u.kind))
        ));
    }

    if !summary.underused_events.is_empty() {
        parts.push(format!(
            "Consider using: {}",
            join_kinds(
                summary
                    .underused_events
                    .iter()
                    .take(policy.underused_suggestions)
            )
        ));
    }

    if let Some(transition) = &summary.dominant_transition {
        parts.push(format!("Avoid the pattern: {}", transition.pattern()));
    }

    parts.push(CLOSING_DIRECTIVE.to_string());
    format!("{}.", parts.join(". "))
}
