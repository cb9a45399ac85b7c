use serde::{Deserialize, Serialize};

/// A thesis/internship topic open for selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paper {
    pub id: i64,
    pub title: String,
    pub max_selections: u32,
    pub current_selections: u32,
    #[serde(default)]
    pub achievement_types: Vec<String>,
}

impl Paper {
    pub fn remaining_slots(&self) -> u32 {
        self.max_selections.saturating_sub(self.current_selections)
    }

    pub fn is_full(&self) -> bool {
        self.remaining_slots() == 0
    }

    pub fn display_capacity(&self) -> String {
        format!("{}/{}", self.current_selections, self.max_selections)
    }

    pub fn offers_achievement(&self, achievement_type: &str) -> bool {
        self.achievement_types.iter().any(|a| a == achievement_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_paper() {
        let json = r#"{"id":7,"title":"Edge caching for campus networks","maxSelections":3,"currentSelections":1,"achievementTypes":["PAPER","SOFTWARE"]}"#;
        let paper: Paper = serde_json::from_str(json).unwrap();
        assert_eq!(paper.id, 7);
        assert_eq!(paper.remaining_slots(), 2);
        assert!(!paper.is_full());
        assert_eq!(paper.display_capacity(), "1/3");
        assert!(paper.offers_achievement("SOFTWARE"));
        assert!(!paper.offers_achievement("PATENT"));
    }

    #[test]
    fn test_overbooked_paper_is_full() {
        let paper = Paper {
            id: 1,
            title: "t".to_string(),
            max_selections: 2,
            current_selections: 3,
            achievement_types: vec![],
        };
        assert_eq!(paper.remaining_slots(), 0);
        assert!(paper.is_full());
    }
}
