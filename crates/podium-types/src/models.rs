use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Speaker {
    pub id: u32,
    pub name: String,
    pub title: String,
    pub bio: String,
    pub topic: String,
    pub image: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgramSession {
    pub id: String,
    pub title: String,
    pub time: String,
}

/// One slot in the event program. `session` names the [`ProgramSession`] the
/// slot belongs to; `speaker_id` is absent for breaks and ceremonies.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgramItem {
    pub id: u32,
    pub time: String,
    pub title: String,
    pub description: String,
    pub session: String,
    pub speaker_id: Option<u32>,
    pub order: u32,
}
