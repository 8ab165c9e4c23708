use serde::{Deserialize, Serialize};

use crate::model::narrative_event::EventKind;

/// Every policy constant the engine uses. All sections default independently,
/// so a config file only needs the values it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub queue: QueuePolicy,
    pub arcs: ArcPolicy,
    pub cooldown: CooldownPolicy,
    pub calls: CallPolicy,
    pub summary: SummaryPolicy,
    pub history: HistoryPolicy,
    pub pacing: PacingLimits,
    pub fallbacks: FallbackLists,
    pub provider: ProviderSettings,
    pub difficulty_refresh_ticks: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            queue: QueuePolicy::default(),
            arcs: ArcPolicy::default(),
            cooldown: CooldownPolicy::default(),
            calls: CallPolicy::default(),
            summary: SummaryPolicy::default(),
            history: HistoryPolicy::default(),
            pacing: PacingLimits::default(),
            fallbacks: FallbackLists::default(),
            provider: ProviderSettings::default(),
            difficulty_refresh_ticks: 2_500,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueuePolicy {
    /// Same-type events closer than this are treated as conflicting.
    pub conflict_window_hours: f32,
}

impl Default for QueuePolicy {
    fn default() -> Self {
        Self {
            conflict_window_hours: 4.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArcPolicy {
    pub min_spacing_hours: f32,
    pub log_cap: usize,
    pub max_cooldown_events_per_arc: usize,
}

impl Default for ArcPolicy {
    fn default() -> Self {
        Self {
            min_spacing_hours: 2.0,
            log_cap: 50,
            max_cooldown_events_per_arc: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CooldownPolicy {
    pub days: u64,
}

impl Default for CooldownPolicy {
    fn default() -> Self {
        Self { days: 25 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CallPolicy {
    /// Wall-clock minimum between provider calls.
    pub min_wall_interval_secs: u64,
    pub first_call_delay_days: f32,
    pub default_next_call_days: f32,
    pub min_next_call_days: f32,
    pub max_next_call_days: f32,
    /// Floor applied to the next call after a proposal starts an arc.
    pub min_days_after_arc_start: f32,
}

impl Default for CallPolicy {
    fn default() -> Self {
        Self {
            min_wall_interval_secs: 30,
            first_call_delay_days: 3.0,
            default_next_call_days: 3.0,
            min_next_call_days: 2.0,
            max_next_call_days: 7.0,
            min_days_after_arc_start: 5.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryPolicy {
    pub min_overuse_threshold: usize,
    pub underused_suggestions: usize,
    pub recent_arcs: usize,
}

impl Default for SummaryPolicy {
    fn default() -> Self {
        Self {
            min_overuse_threshold: 2,
            underused_suggestions: 5,
            recent_arcs: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryPolicy {
    pub cap: usize,
    pub recent_in_request: usize,
    pub do_not_repeat: usize,
}

impl Default for HistoryPolicy {
    fn default() -> Self {
        Self {
            cap: 30,
            recent_in_request: 10,
            do_not_repeat: 3,
        }
    }
}

/// Inclusive floor/ceiling for one cadence pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Limit {
    pub floor: f32,
    pub ceiling: f32,
}

impl Limit {
    pub const fn new(floor: f32, ceiling: f32) -> Self {
        Self { floor, ceiling }
    }

    /// Unlike `f32::clamp`, an inverted limit does not panic; the ceiling wins.
    pub fn clamp(&self, value: f32) -> f32 {
        value.max(self.floor).min(self.ceiling)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PacingLimits {
    pub minor_hours: Limit,
    pub major_days: Limit,
    pub narrative_days: Limit,
}

impl Default for PacingLimits {
    fn default() -> Self {
        Self {
            minor_hours: Limit::new(6.0, 72.0),
            major_days: Limit::new(1.0, 14.0),
            narrative_days: Limit::new(2.0, 15.0),
        }
    }
}

/// Substitute candidates, by event class, as canonical or alias names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FallbackLists {
    pub background: Vec<String>,
    pub significant: Vec<String>,
}

impl FallbackLists {
    pub fn background_kinds(&self) -> Vec<EventKind> {
        self.background.iter().map(|s| EventKind::canonicalize(s)).collect()
    }

    pub fn significant_kinds(&self) -> Vec<EventKind> {
        self.significant.iter().map(|s| EventKind::canonicalize(s)).collect()
    }
}

impl Default for FallbackLists {
    fn default() -> Self {
        let names = |list: &[&str]| -> Vec<String> { list.iter().map(|s| s.to_string()).collect() };
        Self {
            background: names(&[
                "ShipChunkDrop",
                "ResourcePodCrash",
                "WandererJoin",
                "TraderCaravanArrival",
                "VisitorGroup",
                "TravelerGroup",
                "OrbitalTraderArrival",
                "SelfTame",
            ]),
            significant: names(&[
                "RaidEnemy",
                "TraderCaravanArrival",
                "ResourcePodCrash",
                "RefugeePodCrash",
                "WandererJoin",
                "TravelerGroup",
            ]),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    pub endpoint: String,
    pub model: String,
    pub api_version: String,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Environment variable holding the API key. Keys are never written to disk.
    pub api_key_env: String,
    pub timeout_secs: u64,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            endpoint: "https://api.anthropic.com/v1/messages".into(),
            model: "claude-sonnet-4-20250514".into(),
            api_version: "2023-06-01".into(),
            max_tokens: 2_000,
            temperature: 1.0,
            api_key_env: "ANTHROPIC_API_KEY".into(),
            timeout_secs: 90,
        }
    }
}
