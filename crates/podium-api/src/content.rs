//! Static event content: speakers and program, loaded once from JSON files
//! at startup and served read-only. Edited out-of-band, not through the API.

use std::path::Path;

use anyhow::{Context, Result, bail};
use axum::{Json, extract::State};
use serde::de::DeserializeOwned;
use tracing::info;

use podium_types::api::ProgramItemResponse;
use podium_types::models::{ProgramItem, ProgramSession, Speaker};

use crate::state::AppState;

#[derive(Debug)]
pub struct EventContent {
    pub speakers: Vec<Speaker>,
    pub sessions: Vec<ProgramSession>,
    pub items: Vec<ProgramItem>,
}

impl EventContent {
    pub fn load(dir: &Path) -> Result<Self> {
        let speakers: Vec<Speaker> = read_json(&dir.join("speakers.json"))?;
        let sessions: Vec<ProgramSession> = read_json(&dir.join("sessions.json"))?;
        let mut items: Vec<ProgramItem> = read_json(&dir.join("program.json"))?;
        items.sort_by_key(|item| item.order);

        // Content is authored by hand; refuse to start on a dangling reference.
        for item in &items {
            if !sessions.iter().any(|s| s.id == item.session) {
                bail!(
                    "program item {} references unknown session '{}'",
                    item.id,
                    item.session
                );
            }
            if let Some(speaker_id) = item.speaker_id {
                if !speakers.iter().any(|s| s.id == speaker_id) {
                    bail!(
                        "program item {} references unknown speaker {}",
                        item.id,
                        speaker_id
                    );
                }
            }
        }

        info!(
            speakers = speakers.len(),
            sessions = sessions.len(),
            items = items.len(),
            "Event content loaded"
        );
        Ok(Self {
            speakers,
            sessions,
            items,
        })
    }

    pub fn speaker(&self, id: u32) -> Option<&Speaker> {
        self.speakers.iter().find(|s| s.id == id)
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
}

// -- Handlers --

pub async fn list_speakers(State(state): State<AppState>) -> Json<Vec<Speaker>> {
    Json(state.content.speakers.clone())
}

pub async fn list_sessions(State(state): State<AppState>) -> Json<Vec<ProgramSession>> {
    Json(state.content.sessions.clone())
}

/// Program items with the matching speaker embedded (or null), sorted by
/// `order` at load time.
pub async fn list_program_items(State(state): State<AppState>) -> Json<Vec<ProgramItemResponse>> {
    let items = state
        .content
        .items
        .iter()
        .map(|item| ProgramItemResponse {
            id: item.id,
            time: item.time.clone(),
            title: item.title.clone(),
            description: item.description.clone(),
            session: item.session.clone(),
            speaker: item
                .speaker_id
                .and_then(|id| state.content.speaker(id))
                .cloned(),
            order: item.order,
        })
        .collect();
    Json(items)
}
