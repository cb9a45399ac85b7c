use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SelectionType {
    Individual,
    Group,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamMemberParam {
    pub student_id: i64,
    pub responsibility: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamApplicationParam {
    pub reason: String,
    pub members: Vec<TeamMemberParam>,
}

/// Body of the selection application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplySelectionParams {
    pub thesis_id: i64,
    pub achievement_type: String,
    pub selection_type: SelectionType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_application: Option<TeamApplicationParam>,
}

impl ApplySelectionParams {
    pub fn individual(thesis_id: i64, achievement_type: impl Into<String>) -> Self {
        Self {
            thesis_id,
            achievement_type: achievement_type.into(),
            selection_type: SelectionType::Individual,
            team_application: None,
        }
    }

    pub fn group(
        thesis_id: i64,
        achievement_type: impl Into<String>,
        team: TeamApplicationParam,
    ) -> Self {
        Self {
            thesis_id,
            achievement_type: achievement_type.into(),
            selection_type: SelectionType::Group,
            team_application: Some(team),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamMember {
    pub name: String,
    pub responsibility: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamInfo {
    pub reason: String,
    #[serde(default)]
    pub members: Vec<TeamMember>,
}

/// Confirmation shown after a successful application.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionDetail {
    pub student_name: String,
    pub is_group: bool,
    pub advisor_name: String,
    pub achievement_type: String,
    pub thesis_title: String,
    #[serde(default)]
    pub team_info: Option<TeamInfo>,
}
