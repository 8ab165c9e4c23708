use serde::{Deserialize, Serialize};

/// World figures captured when an arc is finalized.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WorldMetrics {
    pub population: u32,
    pub wealth: f32,
    pub phase: String,
    pub narrative_state: String,
}

/// Difficulty constraints the world imposes on what the engine may fire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DifficultyPolicy {
    pub label: String,
    pub allow_threats: bool,
    pub allow_major_threats: bool,
    pub min_intensity: f32,
    pub max_intensity: f32,
}

impl DifficultyPolicy {
    pub fn clamp_intensity(&self, intensity: f32) -> f32 {
        let (lo, hi) = if self.min_intensity <= self.max_intensity {
            (self.min_intensity, self.max_intensity)
        } else {
            (self.max_intensity, self.min_intensity)
        };
        if intensity.is_nan() {
            return lo;
        }
        intensity.clamp(lo, hi)
    }
}

impl Default for DifficultyPolicy {
    fn default() -> Self {
        Self {
            label: "unrestricted".into(),
            allow_threats: true,
            allow_major_threats: true,
            min_intensity: 0.1,
            max_intensity: 3.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intensity_is_clamped_into_policy_range() {
        let policy = DifficultyPolicy {
            min_intensity: 0.5,
            max_intensity: 1.2,
            ..DifficultyPolicy::default()
        };
        assert_eq!(policy.clamp_intensity(2.0), 1.2);
        assert_eq!(policy.clamp_intensity(0.1), 0.5);
        assert_eq!(policy.clamp_intensity(0.8), 0.8);
        assert_eq!(policy.clamp_intensity(f32::NAN), 0.5);
    }
}
