use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ElementType {
    Normal,
    Fire,
    Water,
    Plant,
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ElementType::Normal => "normal",
            ElementType::Fire => "fire",
            ElementType::Water => "water",
            ElementType::Plant => "plant",
        };
        write!(f, "{}", name)
    }
}

impl ElementType {
    /// Damage multiplier for an attacking element against a defending element.
    /// Returns: 2.0 = Super Effective, 1.0 = Normal, 0.5 = Not Very Effective
    pub fn effectiveness(attacking: ElementType, defending: ElementType) -> f32 {
        use ElementType::*;

        match (attacking, defending) {
            (Fire, Plant) | (Water, Fire) | (Plant, Water) => 2.0,
            (Fire, Water) | (Water, Plant) | (Plant, Fire) => 0.5,
            _ => 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_triangle() {
        assert_eq!(ElementType::effectiveness(ElementType::Fire, ElementType::Plant), 2.0);
        assert_eq!(ElementType::effectiveness(ElementType::Water, ElementType::Fire), 2.0);
        assert_eq!(ElementType::effectiveness(ElementType::Plant, ElementType::Water), 2.0);

        assert_eq!(ElementType::effectiveness(ElementType::Plant, ElementType::Fire), 0.5);
        assert_eq!(ElementType::effectiveness(ElementType::Fire, ElementType::Water), 0.5);
        assert_eq!(ElementType::effectiveness(ElementType::Water, ElementType::Plant), 0.5);
    }

    #[test]
    fn test_normal_is_neutral() {
        for defending in [ElementType::Normal, ElementType::Fire, ElementType::Water, ElementType::Plant] {
            assert_eq!(ElementType::effectiveness(ElementType::Normal, defending), 1.0);
            assert_eq!(ElementType::effectiveness(defending, ElementType::Normal), 1.0);
        }
    }
}
