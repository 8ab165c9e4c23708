use std::fmt;

use serde::{Deserialize, Serialize};

/// Every event type the engine knows how to reason about.
///
/// Provider output is free text, so anything that does not canonicalize to a
/// known type is carried as `Unknown` and still reaches the actuator, which
/// decides whether it can fire.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum EventKind {
    // Threats
    RaidEnemy,
    Infestation,
    DeepDrillInfestation,
    MechCluster,
    ManhunterPack,
    AnimalInsanityMass,
    AnimalInsanitySingle,
    DefoliatorShipPartCrash,
    PsychicEmanatorShipPartCrash,
    PsychicDrone,

    // Weather and environment
    ColdSnap,
    HeatWave,
    ToxicFallout,
    VolcanicWinter,
    Flashstorm,
    Eclipse,
    SolarFlare,
    Aurora,

    // Diseases
    DiseasePlague,
    DiseaseFlu,
    DiseaseMalaria,
    DiseaseGutWorms,
    DiseaseFibrousMechanites,
    DiseaseSensoryMechanites,
    DiseaseMuscleParasites,

    // Arrivals and windfalls
    TraderCaravanArrival,
    OrbitalTraderArrival,
    WandererJoin,
    ResourcePodCrash,
    RefugeePodCrash,
    TravelerGroup,
    VisitorGroup,
    SelfTame,
    FarmAnimalsWanderIn,
    ThrumboPasses,
    WildManWandersIn,
    ShipChunkDrop,
    GiveQuest,
    HerdMigration,

    // Misc
    AmbrosiaSprout,
    CropBlight,
    ShortCircuit,
    Alphabeavers,
    PsychicSoothe,
    Party,
    Wedding,

    Unknown(String),
}

/// Alternate spellings seen in provider output, mapped to canonical names.
const ALIASES: &[(&str, &str)] = &[
    ("Disease", "Disease_Plague"),
    ("Plague", "Disease_Plague"),
    ("Flu", "Disease_Flu"),
    ("Malaria", "Disease_Malaria"),
    ("GutWorms", "Disease_GutWorms"),
    ("MuscleParasites", "Disease_MuscleParasites"),
    ("FibrousMechanites", "Disease_FibrousMechanites"),
    ("SensoryMechanites", "Disease_SensoryMechanites"),
    ("Raid", "RaidEnemy"),
    ("EnemyRaid", "RaidEnemy"),
    ("CargoDropPod", "ResourcePodCrash"),
    ("ResourcePod", "ResourcePodCrash"),
    ("WandererJoins", "WandererJoin"),
    ("Wanderer", "WandererJoin"),
    ("TraderArrival", "TraderCaravanArrival"),
    ("TraderCaravan", "TraderCaravanArrival"),
    ("Trader", "TraderCaravanArrival"),
    ("Visitors", "VisitorGroup"),
    ("Traveler", "TravelerGroup"),
    ("OrbitalTrader", "OrbitalTraderArrival"),
    ("Manhunter", "ManhunterPack"),
    ("ManhunterAmbush", "ManhunterPack"),
    ("AnimalInsanity", "AnimalInsanityMass"),
    ("Herd", "HerdMigration"),
    ("FarmAnimals", "FarmAnimalsWanderIn"),
    ("Thrumbo", "ThrumboPasses"),
    ("WildMan", "WildManWandersIn"),
    ("MechanoidCluster", "MechCluster"),
    ("Mechanoid", "MechCluster"),
    ("Defoliator", "DefoliatorShipPartCrash"),
    ("DefoliatorShip", "DefoliatorShipPartCrash"),
    ("PsychicShip", "PsychicEmanatorShipPartCrash"),
    ("PsychicEmanator", "PsychicEmanatorShipPartCrash"),
    ("Blight", "CropBlight"),
    ("Beavers", "Alphabeavers"),
    ("RefugeePod", "RefugeePodCrash"),
    ("Refugee", "RefugeePodCrash"),
    ("TransportPodCrash", "RefugeePodCrash"),
    ("EscapeShuttleCrash", "RefugeePodCrash"),
    ("Quest", "GiveQuest"),
    ("QuestOffer", "GiveQuest"),
];

/// Every known kind, in canonical order.
static KNOWN_KINDS: &[EventKind] = &[
    EventKind::RaidEnemy,
    EventKind::Infestation,
    EventKind::DeepDrillInfestation,
    EventKind::MechCluster,
    EventKind::ManhunterPack,
    EventKind::AnimalInsanityMass,
    EventKind::AnimalInsanitySingle,
    EventKind::DefoliatorShipPartCrash,
    EventKind::PsychicEmanatorShipPartCrash,
    EventKind::PsychicDrone,
    EventKind::ColdSnap,
    EventKind::HeatWave,
    EventKind::ToxicFallout,
    EventKind::VolcanicWinter,
    EventKind::Flashstorm,
    EventKind::Eclipse,
    EventKind::SolarFlare,
    EventKind::Aurora,
    EventKind::DiseasePlague,
    EventKind::DiseaseFlu,
    EventKind::DiseaseMalaria,
    EventKind::DiseaseGutWorms,
    EventKind::DiseaseFibrousMechanites,
    EventKind::DiseaseSensoryMechanites,
    EventKind::DiseaseMuscleParasites,
    EventKind::TraderCaravanArrival,
    EventKind::OrbitalTraderArrival,
    EventKind::WandererJoin,
    EventKind::ResourcePodCrash,
    EventKind::RefugeePodCrash,
    EventKind::TravelerGroup,
    EventKind::VisitorGroup,
    EventKind::SelfTame,
    EventKind::FarmAnimalsWanderIn,
    EventKind::ThrumboPasses,
    EventKind::WildManWandersIn,
    EventKind::ShipChunkDrop,
    EventKind::GiveQuest,
    EventKind::HerdMigration,
    EventKind::AmbrosiaSprout,
    EventKind::CropBlight,
    EventKind::ShortCircuit,
    EventKind::Alphabeavers,
    EventKind::PsychicSoothe,
    EventKind::Party,
    EventKind::Wedding,
];

impl EventKind {
    pub fn all_known() -> Vec<EventKind> {
        KNOWN_KINDS.to_vec()
    }

    /// Maps a provider-supplied name to a kind: exact canonical names first,
    /// then the alias table, both case-insensitive.
    pub fn canonicalize(raw: &str) -> EventKind {
        let name = raw.trim();
        if let Some(kind) = Self::from_def_name(name) {
            return kind;
        }

        ALIASES
            .iter()
            .find(|(alias, _)| alias.eq_ignore_ascii_case(name))
            .and_then(|(_, canonical)| Self::from_def_name(canonical))
            .unwrap_or_else(|| EventKind::Unknown(name.to_string()))
    }

    fn from_def_name(name: &str) -> Option<EventKind> {
        KNOWN_KINDS
            .iter()
            .find(|kind| kind.def_name().eq_ignore_ascii_case(name))
            .cloned()
    }

    pub fn def_name(&self) -> &str {
        use EventKind::*;
        match self {
            RaidEnemy => "RaidEnemy",
            Infestation => "Infestation",
            DeepDrillInfestation => "DeepDrillInfestation",
            MechCluster => "MechCluster",
            ManhunterPack => "ManhunterPack",
            AnimalInsanityMass => "AnimalInsanityMass",
            AnimalInsanitySingle => "AnimalInsanitySingle",
            DefoliatorShipPartCrash => "DefoliatorShipPartCrash",
            PsychicEmanatorShipPartCrash => "PsychicEmanatorShipPartCrash",
            PsychicDrone => "PsychicDrone",
            ColdSnap => "ColdSnap",
            HeatWave => "HeatWave",
            ToxicFallout => "ToxicFallout",
            VolcanicWinter => "VolcanicWinter",
            Flashstorm => "Flashstorm",
            Eclipse => "Eclipse",
            SolarFlare => "SolarFlare",
            Aurora => "Aurora",
            DiseasePlague => "Disease_Plague",
            DiseaseFlu => "Disease_Flu",
            DiseaseMalaria => "Disease_Malaria",
            DiseaseGutWorms => "Disease_GutWorms",
            DiseaseFibrousMechanites => "Disease_FibrousMechanites",
            DiseaseSensoryMechanites => "Disease_SensoryMechanites",
            DiseaseMuscleParasites => "Disease_MuscleParasites",
            TraderCaravanArrival => "TraderCaravanArrival",
            OrbitalTraderArrival => "OrbitalTraderArrival",
            WandererJoin => "WandererJoin",
            ResourcePodCrash => "ResourcePodCrash",
            RefugeePodCrash => "RefugeePodCrash",
            TravelerGroup => "TravelerGroup",
            VisitorGroup => "VisitorGroup",
            SelfTame => "SelfTame",
            FarmAnimalsWanderIn => "FarmAnimalsWanderIn",
            ThrumboPasses => "ThrumboPasses",
            WildManWandersIn => "WildManWandersIn",
            ShipChunkDrop => "ShipChunkDrop",
            GiveQuest => "GiveQuest",
            HerdMigration => "HerdMigration",
            AmbrosiaSprout => "AmbrosiaSprout",
            CropBlight => "CropBlight",
            ShortCircuit => "ShortCircuit",
            Alphabeavers => "Alphabeavers",
            PsychicSoothe => "PsychicSoothe",
            Party => "Party",
            Wedding => "Wedding",
            Unknown(raw) => raw,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, EventKind::Unknown(_))
    }

    /// Cooldown class: subject to a hard minimum recurrence interval.
    pub fn is_cooldown_class(&self) -> bool {
        use EventKind::*;
        matches!(
            self,
            DiseasePlague
                | DiseaseFlu
                | DiseaseMalaria
                | DiseaseGutWorms
                | DiseaseFibrousMechanites
                | DiseaseSensoryMechanites
                | DiseaseMuscleParasites
        )
    }

    /// Anything hostile enough to be switched off by a threat-free difficulty.
    pub fn is_threat(&self) -> bool {
        use EventKind::*;
        matches!(
            self,
            RaidEnemy
                | Infestation
                | DeepDrillInfestation
                | MechCluster
                | ManhunterPack
                | DefoliatorShipPartCrash
                | PsychicEmanatorShipPartCrash
                | PsychicDrone
                | ToxicFallout
                | ColdSnap
                | HeatWave
                | Flashstorm
                | DiseasePlague
                | DiseaseFlu
                | DiseaseMalaria
                | DiseaseGutWorms
        )
    }

    pub fn is_major_threat(&self) -> bool {
        use EventKind::*;
        matches!(
            self,
            RaidEnemy | Infestation | MechCluster | DefoliatorShipPartCrash
        )
    }

    pub fn is_weather(&self) -> bool {
        use EventKind::*;
        matches!(
            self,
            ColdSnap | HeatWave | ToxicFallout | VolcanicWinter | Flashstorm | Eclipse | SolarFlare | Aurora
        )
    }

    pub fn is_positive(&self) -> bool {
        use EventKind::*;
        matches!(
            self,
            TraderCaravanArrival
                | OrbitalTraderArrival
                | WandererJoin
                | ResourcePodCrash
                | RefugeePodCrash
                | TravelerGroup
                | VisitorGroup
                | SelfTame
                | FarmAnimalsWanderIn
                | ThrumboPasses
                | WildManWandersIn
                | ShipChunkDrop
                | GiveQuest
        )
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.def_name())
    }
}

impl From<String> for EventKind {
    fn from(raw: String) -> Self {
        EventKind::canonicalize(&raw)
    }
}

impl From<&str> for EventKind {
    fn from(raw: &str) -> Self {
        EventKind::canonicalize(raw)
    }
}

impl From<EventKind> for String {
    fn from(kind: EventKind) -> Self {
        kind.def_name().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aliases_resolve_case_insensitively() {
        assert_eq!(EventKind::canonicalize("raid"), EventKind::RaidEnemy);
        assert_eq!(EventKind::canonicalize("Plague"), EventKind::DiseasePlague);
        assert_eq!(EventKind::canonicalize("disease_flu"), EventKind::DiseaseFlu);
        assert_eq!(
            EventKind::canonicalize(" TraderCaravan "),
            EventKind::TraderCaravanArrival
        );
    }

    #[test]
    fn unrecognised_names_are_kept_verbatim() {
        let kind = EventKind::canonicalize("MeteoriteImpact");
        assert_eq!(kind, EventKind::Unknown("MeteoriteImpact".into()));
        assert_eq!(kind.def_name(), "MeteoriteImpact");
        assert!(!kind.is_known());
        assert!(!kind.is_threat());
    }

    #[test]
    fn def_names_round_trip_through_canonicalize() {
        for kind in EventKind::all_known() {
            assert_eq!(EventKind::canonicalize(kind.def_name()), kind);
        }
    }

    #[test]
    fn known_table_is_distinct_and_matches_lowercase_names() {
        let known = EventKind::all_known();
        let distinct: std::collections::BTreeSet<_> = known.iter().collect();
        assert_eq!(distinct.len(), known.len());
        assert!(known.iter().all(EventKind::is_known));

        for kind in KNOWN_KINDS {
            let lower = kind.def_name().to_lowercase();
            assert_eq!(&EventKind::canonicalize(&lower), kind);
        }
    }

    #[test]
    fn serializes_as_canonical_name() {
        let json = serde_json::to_string(&EventKind::DiseaseMalaria).unwrap();
        assert_eq!(json, "\"Disease_Malaria\"");

        let parsed: EventKind = serde_json::from_str("\"Wanderer\"").unwrap();
        assert_eq!(parsed, EventKind::WandererJoin);
    }

    #[test]
    fn only_diseases_are_cooldown_class() {
        let cooldown: Vec<_> = EventKind::all_known()
            .into_iter()
            .filter(EventKind::is_cooldown_class)
            .collect();
        assert_eq!(cooldown.len(), 7);
        assert!(cooldown.iter().all(|k| k.def_name().starts_with("Disease_")));
    }
}
