//! Static lookup tables: part and damage taxonomies, model class maps,
//! damage-to-severity defaults and the per-level repair rules.
//!
//! Loaded once at process start and shared read-only (`Arc<Taxonomy>`).
use crate::data_model::{CostRange, DamageType, PartName, SeverityLevel};
use crate::error::ConfigError;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Cost and duration for one severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityRule {
    pub cost_range: CostRange,
    pub repair_days: u32,
}

/// Rule used when the table has neither the requested level nor `moderate`
const FALLBACK_RULE: SeverityRule = SeverityRule {
    cost_range: CostRange(500, 3000),
    repair_days: 3,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Taxonomy {
    /// Vehicle parts
    pub parts: Vec<String>,
    /// Damage categories
    pub damage_types: Vec<String>,
    /// Damage model class id -> damage label
    pub damage_classes: BTreeMap<u32, String>,
    /// Part model class id -> part label
    pub part_classes: BTreeMap<u32, String>,
    /// Damage label -> default severity
    pub damage_severity: BTreeMap<String, SeverityLevel>,
    /// Severity level -> cost range and repair days
    pub severity_rules: BTreeMap<SeverityLevel, SeverityRule>,
}

static BUILTIN: Lazy<Taxonomy> = Lazy::new(Taxonomy::build_builtin);

const PARTS: &[&str] = &[
    "front_bumper",
    "rear_bumper",
    "hood",
    "trunk",
    "left_door",
    "right_door",
    "left_fender",
    "right_fender",
    "windshield",
    "rear_window",
    "side_windows",
    "left_headlight",
    "right_headlight",
    "tail_lights",
    "front_left_wheel",
    "front_right_wheel",
    "rear_left_wheel",
    "rear_right_wheel",
];

const DAMAGE_CLASSES: &[(u32, &str, SeverityLevel)] = &[
    (0, "car-part-crack", SeverityLevel::Moderate),
    (1, "detachment", SeverityLevel::Severe),
    (2, "glass-crack", SeverityLevel::Major),
    (3, "lamp-crack", SeverityLevel::Moderate),
    (4, "minor-deformation", SeverityLevel::Minor),
    (5, "moderate-deformation", SeverityLevel::Moderate),
    (6, "paint-chips", SeverityLevel::Minor),
    (7, "scratches", SeverityLevel::Minor),
    (8, "severe-deformation", SeverityLevel::Severe),
    (9, "side-mirror-crack", SeverityLevel::Moderate),
    (10, "flat-tire", SeverityLevel::Moderate),
];

const DAMAGE_TYPES: &[(&str, SeverityLevel)] = &[
    ("scratch", SeverityLevel::Minor),
    ("dent", SeverityLevel::Moderate),
    ("crack", SeverityLevel::Major),
    ("shatter", SeverityLevel::Major),
    ("missing", SeverityLevel::Severe),
    ("bent", SeverityLevel::Moderate),
    ("paint_damage", SeverityLevel::Minor),
];

const PART_CLASSES: &[&str] = &[
    "back_bumper",
    "back_door",
    "back_glass",
    "back_left_door",
    "back_left_light",
    "back_light",
    "back_right_door",
    "back_right_light",
    "front_bumper",
    "front_door",
    "front_glass",
    "front_left_door",
    "front_left_light",
    "front_light",
    "front_right_door",
    "front_right_light",
    "hood",
    "left_mirror",
    "object",
    "right_mirror",
    "tailgate",
    "trunk",
    "wheel",
];

const SEVERITY_RULES: &[(SeverityLevel, u32, u32, u32)] = &[
    (SeverityLevel::Minor, 100, 500, 1),
    (SeverityLevel::Moderate, 500, 3000, 3),
    (SeverityLevel::Major, 3000, 10000, 7),
    (SeverityLevel::Severe, 10000, 30000, 14),
];

impl Taxonomy {
    /// Built-in tables matching the bundled damage and part models
    pub fn builtin() -> &'static Taxonomy {
        &BUILTIN
    }

    fn build_builtin() -> Self {
        let mut damage_types: Vec<String> =
            DAMAGE_TYPES.iter().map(|(l, _)| l.to_string()).collect();
        damage_types.extend(DAMAGE_CLASSES.iter().map(|(_, l, _)| l.to_string()));

        let damage_severity = DAMAGE_TYPES
            .iter()
            .copied()
            .chain(DAMAGE_CLASSES.iter().map(|(_, l, s)| (*l, *s)))
            .map(|(label, level)| (label.to_string(), level))
            .collect();

        Self {
            parts: PARTS.iter().map(|p| p.to_string()).collect(),
            damage_types,
            damage_classes: DAMAGE_CLASSES
                .iter()
                .map(|(id, label, _)| (*id, label.to_string()))
                .collect(),
            part_classes: PART_CLASSES
                .iter()
                .enumerate()
                .map(|(id, label)| (id as u32, label.to_string()))
                .collect(),
            damage_severity,
            severity_rules: SEVERITY_RULES
                .iter()
                .map(|(level, low, high, days)| {
                    (
                        *level,
                        SeverityRule {
                            cost_range: CostRange(*low, *high),
                            repair_days: *days,
                        },
                    )
                })
                .collect(),
        }
    }

    /// Load tables from YAML and validate them
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let taxonomy: Taxonomy = serde_yaml::from_str(yaml)?;
        taxonomy.validate()?;
        Ok(taxonomy)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml(&yaml)
    }

    /// Rejects inverted cost ranges. Damage types without a severity entry
    /// are only reported: lookups fall back to `moderate`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (level, rule) in &self.severity_rules {
            if rule.cost_range.low() > rule.cost_range.high() {
                return Err(ConfigError::Invalid(format!(
                    "severity rule '{}' has cost range [{}, {}]",
                    level,
                    rule.cost_range.low(),
                    rule.cost_range.high()
                )));
            }
        }

        for label in &self.damage_types {
            if !self.damage_severity.contains_key(label) {
                tracing::warn!(
                    damage_type = %label,
                    "damage type has no severity mapping, will default to moderate"
                );
            }
        }

        Ok(())
    }

    /// Label for a damage-model class id; `unknown_damage` when unmapped
    pub fn damage_label(&self, class_id: u32) -> DamageType {
        self.damage_classes
            .get(&class_id)
            .map(|label| DamageType::new(label.as_str()))
            .unwrap_or_else(DamageType::unknown_damage)
    }

    /// Label for a part-model class id; `unknown_part` when unmapped
    pub fn part_label(&self, class_id: u32) -> PartName {
        self.part_classes
            .get(&class_id)
            .map(|label| PartName::new(label.as_str()))
            .unwrap_or_else(PartName::unknown)
    }

    /// Default severity of a damage type. Total: unknown types are `moderate`.
    pub fn severity_for(&self, damage_type: &DamageType) -> SeverityLevel {
        self.damage_severity
            .get(damage_type.as_str())
            .copied()
            .unwrap_or(SeverityLevel::Moderate)
    }

    /// Repair rule for a level, falling back to the `moderate` rule
    pub fn rule_for(&self, level: SeverityLevel) -> SeverityRule {
        self.severity_rules
            .get(&level)
            .or_else(|| self.severity_rules.get(&SeverityLevel::Moderate))
            .copied()
            .unwrap_or(FALLBACK_RULE)
    }
}

impl Default for Taxonomy {
    fn default() -> Self {
        Self::builtin().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_severity_defaults() {
        let t = Taxonomy::builtin();
        assert_eq!(t.severity_for(&"scratch".into()), SeverityLevel::Minor);
        assert_eq!(t.severity_for(&"crack".into()), SeverityLevel::Major);
        assert_eq!(t.severity_for(&"missing".into()), SeverityLevel::Severe);
        assert_eq!(t.severity_for(&"not-a-damage".into()), SeverityLevel::Moderate);
    }

    #[test]
    fn test_every_damage_type_is_mapped() {
        let t = Taxonomy::builtin();
        for label in &t.damage_types {
            assert!(t.damage_severity.contains_key(label), "{} unmapped", label);
        }
    }

    #[test]
    fn test_class_labels() {
        let t = Taxonomy::builtin();
        assert_eq!(t.damage_label(7).as_str(), "scratches");
        assert_eq!(t.damage_label(99).as_str(), "unknown_damage");
        assert_eq!(t.part_label(8).as_str(), "front_bumper");
        assert_eq!(t.part_label(22).as_str(), "wheel");
        assert_eq!(t.part_label(500).as_str(), "unknown_part");
    }

    #[test]
    fn test_rule_fallback() {
        let mut t = Taxonomy::builtin().clone();
        assert_eq!(t.rule_for(SeverityLevel::Major).cost_range, CostRange(3000, 10000));

        t.severity_rules.remove(&SeverityLevel::Severe);
        assert_eq!(t.rule_for(SeverityLevel::Severe).repair_days, 3);

        t.severity_rules.clear();
        assert_eq!(t.rule_for(SeverityLevel::Minor), FALLBACK_RULE);
    }

    #[test]
    fn test_yaml_round_trip_of_builtin() {
        let yaml = serde_yaml::to_string(Taxonomy::builtin()).unwrap();
        let parsed = Taxonomy::from_yaml(&yaml).unwrap();
        assert_eq!(&parsed, Taxonomy::builtin());
    }

    #[test]
    fn test_inverted_cost_range_rejected() {
        let yaml = r#"
parts: [hood]
damage_types: [dent]
damage_classes: {0: dent}
part_classes: {0: hood}
damage_severity: {dent: moderate}
severity_rules:
  moderate: { cost_range: [3000, 500], repair_days: 3 }
"#;
        let err = Taxonomy::from_yaml(yaml).unwrap_err();
        assert!(err.to_string().starts_with("CONFIG/INVALID"));
    }
}
