use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::config::{AgeGroup, AspectRatio, ContentRequest, DurationClass, Language, Tone};
use crate::error::{Result, StudioError};

/// Schema-validated payload of one text-generation call.
#[derive(Debug, Clone, Deserialize)]
pub struct ContentDraft {
    pub script: String,
    pub titles: Vec<String>,
    #[serde(rename = "imagePrompts")]
    pub image_prompts: Vec<String>,
    #[serde(rename = "ttsScript")]
    pub tts_script: String,
}

/// Sparse per-scene asset storage. Keys are dense 0-based scene indices,
/// always within `[0, scene_count)`; inserting at an occupied index replaces
/// the previous asset.
#[derive(Debug, Clone)]
pub struct SceneAssets {
    scene_count: usize,
    entries: BTreeMap<usize, Vec<u8>>,
}

impl SceneAssets {
    pub fn new(scene_count: usize) -> Self {
        Self {
            scene_count,
            entries: BTreeMap::new(),
        }
    }

    pub fn scene_count(&self) -> usize {
        self.scene_count
    }

    pub fn insert(&mut self, scene: usize, bytes: Vec<u8>) -> Result<()> {
        if scene >= self.scene_count {
            return Err(StudioError::Precondition(format!(
                "scene index {scene} out of range (0..{})",
                self.scene_count
            )));
        }
        self.entries.insert(scene, bytes);
        Ok(())
    }

    pub fn contains(&self, scene: usize) -> bool {
        self.entries.contains_key(&scene)
    }

    pub fn get(&self, scene: usize) -> Option<&[u8]> {
        self.entries.get(&scene).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Ascending scene order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &[u8])> {
        self.entries.iter().map(|(i, b)| (*i, b.as_slice()))
    }
}

/// One completed generation, kept in memory for the session and mutated in
/// place as image/video/audio assets come back.
#[derive(Debug, Clone)]
pub struct Project {
    pub id: Uuid,
    pub genre_name: String,
    pub genre_icon: String,
    pub language: Language,
    pub duration: DurationClass,
    pub tone: Tone,
    pub age_group: AgeGroup,
    pub created_at: DateTime<Utc>,
    pub script: String,
    pub titles: Vec<String>,
    pub image_prompts: Vec<String>,
    pub tts_script: String,
    pub visual_style: String,
    pub aspect_ratio: AspectRatio,
    pub images: SceneAssets,
    pub videos: SceneAssets,
    /// Raw base64 PCM payload as returned by speech synthesis.
    pub audio_data: Option<String>,
}

impl Project {
    pub fn from_draft(request: &ContentRequest, draft: ContentDraft) -> Self {
        let scene_count = draft.image_prompts.len();
        Self {
            id: Uuid::new_v4(),
            genre_name: request.genre_name.clone(),
            genre_icon: request.genre_icon.clone(),
            language: request.language,
            duration: request.duration,
            tone: request.tone,
            age_group: request.age_group,
            created_at: Utc::now(),
            script: draft.script,
            titles: draft.titles,
            image_prompts: draft.image_prompts,
            tts_script: draft.tts_script,
            visual_style: request.visual_style.clone(),
            aspect_ratio: request.aspect_ratio,
            images: SceneAssets::new(scene_count),
            videos: SceneAssets::new(scene_count),
            audio_data: None,
        }
    }

    pub fn scene_count(&self) -> usize {
        self.image_prompts.len()
    }
}
