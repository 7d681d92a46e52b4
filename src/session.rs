//! Per-session workflow state around one project: which operation kinds are
//! currently in flight, and the preconditions a request must clear before
//! any network call goes out.
//!
//! The guards are cooperative double-submission checks for a single logical
//! thread of control, not locks.

use crate::content::Project;
use crate::error::{Result, StudioError};

#[derive(Debug)]
pub struct Session {
    pub project: Project,
    image_batch_running: bool,
    speech_running: bool,
    /// Scene index of the one video job allowed in flight.
    video_in_flight: Option<usize>,
}

impl Session {
    pub fn new(project: Project) -> Self {
        Self {
            project,
            image_batch_running: false,
            speech_running: false,
            video_in_flight: None,
        }
    }

    pub fn begin_image_batch(&mut self) -> Result<()> {
        if self.image_batch_running {
            return Err(StudioError::Busy("image batch"));
        }
        self.image_batch_running = true;
        Ok(())
    }

    pub fn finish_image_batch(&mut self) {
        self.image_batch_running = false;
    }

    /// Attach an image to a specific scene, replacing whatever was there.
    /// The target scene travels with the call; there is no ambient "current
    /// upload" state.
    pub fn attach_scene_image(&mut self, scene: usize, bytes: Vec<u8>) -> Result<()> {
        self.project.images.insert(scene, bytes)
    }

    /// Clear a scene's video job for submission. Checked before any network
    /// call: the scene must have a conditioning image and no other video job
    /// may be running.
    pub fn begin_video(&mut self, scene: usize) -> Result<()> {
        if let Some(running) = self.video_in_flight {
            return Err(StudioError::Busy(if running == scene {
                "video generation for this scene"
            } else {
                "video generation"
            }));
        }
        if scene >= self.project.scene_count() {
            return Err(StudioError::Precondition(format!(
                "scene index {scene} out of range (0..{})",
                self.project.scene_count()
            )));
        }
        if !self.project.images.contains(scene) {
            return Err(StudioError::Precondition(format!(
                "scene {} has no image to animate; generate or upload one first",
                scene + 1
            )));
        }
        self.video_in_flight = Some(scene);
        Ok(())
    }

    pub fn complete_video(&mut self, scene: usize, bytes: Vec<u8>) -> Result<()> {
        self.project.videos.insert(scene, bytes)?;
        self.video_in_flight = None;
        Ok(())
    }

    /// Release the video slot after a failed or abandoned job.
    pub fn abort_video(&mut self) {
        self.video_in_flight = None;
    }

    pub fn begin_speech(&mut self) -> Result<()> {
        if self.speech_running {
            return Err(StudioError::Busy("speech synthesis"));
        }
        self.speech_running = true;
        Ok(())
    }

    pub fn finish_speech(&mut self, audio_data: Option<String>) {
        self.speech_running = false;
        if audio_data.is_some() {
            self.project.audio_data = audio_data;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{
        AgeGroup, AspectRatio, ContentRequest, DurationClass, Language, Tone, find_genre,
    };
    use crate::content::ContentDraft;

    fn project(scenes: usize) -> Project {
        let request = ContentRequest::new(
            find_genre("education").unwrap(),
            "space exploration",
            Language::Korean,
            DurationClass::Short,
            Tone::Friendly,
            AgeGroup::Twenties,
            50,
            "Photorealistic",
            AspectRatio::Shorts,
            scenes,
        )
        .unwrap();
        let draft = ContentDraft {
            script: "script".to_string(),
            titles: vec!["t1".into(), "t2".into(), "t3".into(), "t4".into(), "t5".into()],
            image_prompts: (0..scenes).map(|i| format!("prompt {i}")).collect(),
            tts_script: "narration".to_string(),
        };
        Project::from_draft(&request, draft)
    }

    #[test]
    fn video_without_an_image_fails_before_submission() {
        let mut session = Session::new(project(3));
        let err = session.begin_video(1).unwrap_err();
        assert!(matches!(err, StudioError::Precondition(_)));
    }

    #[test]
    fn second_video_job_is_rejected_while_one_is_in_flight() {
        let mut session = Session::new(project(3));
        session.attach_scene_image(0, vec![1]).unwrap();
        session.attach_scene_image(1, vec![2]).unwrap();

        session.begin_video(0).unwrap();
        let err = session.begin_video(1).unwrap_err();
        assert!(matches!(err, StudioError::Busy(_)));

        session.complete_video(0, vec![0xAB]).unwrap();
        session.begin_video(1).unwrap();
    }

    #[test]
    fn aborting_a_video_frees_the_slot_without_storing_anything() {
        let mut session = Session::new(project(2));
        session.attach_scene_image(0, vec![1]).unwrap();
        session.begin_video(0).unwrap();
        session.abort_video();
        assert!(session.project.videos.is_empty());
        session.begin_video(0).unwrap();
    }

    #[test]
    fn completed_video_implies_a_conditioning_image_was_present() {
        let mut session = Session::new(project(2));
        session.attach_scene_image(1, vec![7]).unwrap();
        session.begin_video(1).unwrap();
        session.complete_video(1, vec![0xCD]).unwrap();
        for (scene, _) in session.project.videos.iter() {
            assert!(session.project.images.contains(scene));
        }
    }

    #[test]
    fn image_batch_and_speech_guards_reject_double_submission() {
        let mut session = Session::new(project(2));
        session.begin_image_batch().unwrap();
        assert!(matches!(session.begin_image_batch(), Err(StudioError::Busy(_))));
        session.finish_image_batch();
        session.begin_image_batch().unwrap();

        session.begin_speech().unwrap();
        assert!(matches!(session.begin_speech(), Err(StudioError::Busy(_))));
        session.finish_speech(Some("cGNt".to_string()));
        assert_eq!(session.project.audio_data.as_deref(), Some("cGNt"));
    }

    #[test]
    fn failed_speech_keeps_existing_text_content() {
        let mut session = Session::new(project(2));
        session.begin_speech().unwrap();
        session.finish_speech(None);
        assert!(session.project.audio_data.is_none());
        assert_eq!(session.project.script, "script");
    }
}
