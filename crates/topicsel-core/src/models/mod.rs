//! Data models for the topic-selection backend.
//!
//! - `LoginParams`, `Captcha`: authentication partition
//! - `Paper`: thesis/internship topics offered for selection
//! - `Student`: students who have not picked a topic yet
//! - Selection types: `ApplySelectionParams`, `SelectionDetail`, etc.

pub mod security;
pub mod selection;
pub mod student;
pub mod thesis;

pub use security::{Captcha, LoginParams};
pub use selection::{
    ApplySelectionParams, SelectionDetail, SelectionType, TeamApplicationParam, TeamInfo,
    TeamMember, TeamMemberParam,
};
pub use student::Student;
pub use thesis::Paper;
