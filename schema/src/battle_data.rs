use crate::ElementType;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Who an ability is aimed at. Only the side matters to the battle engine,
/// the finer categories are kept so presentation layers can target correctly.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    /// The caster itself.
    User,
    /// The caster's side.
    Ally,
    /// A single opposing monster.
    Opponent,
    /// Every opposing monster on the field.
    AllOpponents,
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let display_name = match self {
            TargetKind::User => "self",
            TargetKind::Ally => "ally",
            TargetKind::Opponent => "opponent",
            TargetKind::AllOpponents => "all opponents",
        };
        write!(f, "{}", display_name)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AbilityData {
    pub cost: u32,
    pub element: ElementType,
    /// Damage multiplier applied to the caster's attack stat.
    /// Negative values heal instead of damage.
    pub amount: f32,
    pub target: TargetKind,
    #[serde(default)]
    pub animation: Option<String>,
}

impl AbilityData {
    pub fn is_healing(&self) -> bool {
        self.amount < 0.0
    }
}
