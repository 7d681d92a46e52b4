use std::fmt;

use clap::ValueEnum;

use crate::error::{Result, StudioError};

/// Number of title suggestions a content draft must carry.
pub const TITLE_COUNT: usize = 5;
/// A storyboard needs at least an opening and a closing scene.
pub const MIN_IMAGE_COUNT: usize = 2;
/// Substituted when the user leaves the subject blank.
pub const DEFAULT_SUBJECT: &str = "the latest trending topic";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Language {
    Korean,
    English,
}

impl Language {
    pub fn code(&self) -> &'static str {
        match self {
            Language::Korean => "kr",
            Language::English => "en",
        }
    }

    pub fn prompt_label(&self) -> &'static str {
        match self {
            Language::Korean => "Korean",
            Language::English => "English",
        }
    }

    /// Prebuilt provider voice keyed by target language.
    pub fn voice_name(&self) -> &'static str {
        match self {
            Language::Korean => "Kore",
            Language::English => "Zephyr",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Language::Korean => "korean",
            Language::English => "english",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DurationClass {
    Short,
    Long,
}

impl DurationClass {
    pub fn prompt_label(&self) -> &'static str {
        match self {
            DurationClass::Short => "Short-form (under 1 minute)",
            DurationClass::Long => "Long-form (around 10 minutes)",
        }
    }
}

impl fmt::Display for DurationClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DurationClass::Short => "short",
            DurationClass::Long => "long",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Tone {
    Friendly,
    Professional,
    Humorous,
    Emotional,
}

impl Tone {
    pub fn prompt_label(&self) -> &'static str {
        match self {
            Tone::Friendly => "friendly",
            Tone::Professional => "professional",
            Tone::Humorous => "humorous",
            Tone::Emotional => "emotional",
        }
    }
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prompt_label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AgeGroup {
    #[value(name = "teens")]
    Teens,
    #[value(name = "20s")]
    Twenties,
    #[value(name = "30s+")]
    ThirtiesPlus,
}

impl AgeGroup {
    pub fn prompt_label(&self) -> &'static str {
        match self {
            AgeGroup::Teens => "teenagers",
            AgeGroup::Twenties => "people in their 20s",
            AgeGroup::ThirtiesPlus => "people in their 30s and older",
        }
    }
}

impl fmt::Display for AgeGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AgeGroup::Teens => "teens",
            AgeGroup::Twenties => "20s",
            AgeGroup::ThirtiesPlus => "30s+",
        };
        f.write_str(s)
    }
}

/// Target aspect ratios accepted by the image and video models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AspectRatio {
    #[value(name = "9:16")]
    Shorts,
    #[value(name = "16:9")]
    Wide,
    #[value(name = "1:1")]
    Square,
    #[value(name = "4:3")]
    Standard,
    #[value(name = "3:4")]
    Portrait,
}

impl AspectRatio {
    pub fn as_str(&self) -> &'static str {
        match self {
            AspectRatio::Shorts => "9:16",
            AspectRatio::Wide => "16:9",
            AspectRatio::Square => "1:1",
            AspectRatio::Standard => "4:3",
            AspectRatio::Portrait => "3:4",
        }
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Genre {
    pub id: &'static str,
    pub name: &'static str,
    pub icon: &'static str,
}

pub const GENRES: &[Genre] = &[
    Genre { id: "horror", name: "Horror", icon: "👻" },
    Genre { id: "romance", name: "Romance", icon: "💕" },
    Genre { id: "comedy", name: "Comedy", icon: "😂" },
    Genre { id: "education", name: "Education", icon: "📚" },
    Genre { id: "gaming", name: "Gaming", icon: "🎮" },
    Genre { id: "cooking", name: "Cooking", icon: "🍳" },
    Genre { id: "travel", name: "Travel", icon: "✈️" },
    Genre { id: "review", name: "Review", icon: "⭐" },
    Genre { id: "asmr", name: "ASMR", icon: "🎧" },
    Genre { id: "vlog", name: "Vlog", icon: "📹" },
    Genre { id: "tech", name: "Tech", icon: "💻" },
    Genre { id: "fitness", name: "Fitness", icon: "💪" },
];

pub fn find_genre(id: &str) -> Option<&'static Genre> {
    GENRES.iter().find(|g| g.id == id)
}

/// Fully assembled text-generation request. Pure data; building one performs
/// no network traffic.
#[derive(Debug, Clone)]
pub struct ContentRequest {
    pub genre_name: String,
    pub genre_icon: String,
    pub subject: String,
    pub language: Language,
    pub duration: DurationClass,
    pub tone: Tone,
    pub age_group: AgeGroup,
    /// 0-100 verbosity weight for the script.
    pub script_length: u8,
    pub visual_style: String,
    pub aspect_ratio: AspectRatio,
    pub image_count: usize,
}

impl ContentRequest {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        genre: &Genre,
        subject: &str,
        language: Language,
        duration: DurationClass,
        tone: Tone,
        age_group: AgeGroup,
        script_length: u8,
        visual_style: &str,
        aspect_ratio: AspectRatio,
        image_count: usize,
    ) -> Result<Self> {
        if image_count < MIN_IMAGE_COUNT {
            return Err(StudioError::Precondition(format!(
                "at least {MIN_IMAGE_COUNT} scene images are required, got {image_count}"
            )));
        }
        let subject = if subject.trim().is_empty() {
            DEFAULT_SUBJECT.to_string()
        } else {
            subject.trim().to_string()
        };
        Ok(Self {
            genre_name: genre.name.to_string(),
            genre_icon: genre.icon.to_string(),
            subject,
            language,
            duration,
            tone,
            age_group,
            script_length: script_length.min(100),
            visual_style: visual_style.to_string(),
            aspect_ratio,
            image_count,
        })
    }

    pub fn system_instruction(&self) -> String {
        format!(
            "You are a master YouTube content creator.\n\
             Rules you must follow:\n\
             1. Write every piece of text (script, titles, narration script) in {language}, without exception.\n\
             2. Fully reflect the configured tone ({tone}) and target audience ({age}).\n\
             3. Write the image generation prompts in English only, matched to the visual style ({style}).",
            language = self.language.prompt_label(),
            tone = self.tone.prompt_label(),
            age = self.age_group.prompt_label(),
            style = self.visual_style,
        )
    }

    pub fn user_prompt(&self) -> String {
        format!(
            "Content plan request:\n\
             - Genre: {genre}\n\
             - Subject: {subject}\n\
             - Format: {format}\n\
             - Image style: {style}\n\
             - Number of images to generate: {count}\n\
             - Script length preference: {length}/100\n\n\
             Deliverables:\n\
             - Script: a full script with an intro, development and ending\n\
             - Titles: {titles} click-worthy title suggestions\n\
             - Image prompts: {count} detailed prompts, one per scene (English)\n\
             - TTS script: the narration rewritten in a conversational register",
            genre = self.genre_name,
            subject = self.subject,
            format = self.duration.prompt_label(),
            style = self.visual_style,
            count = self.image_count,
            length = self.script_length,
            titles = TITLE_COUNT,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(subject: &str, image_count: usize) -> Result<ContentRequest> {
        ContentRequest::new(
            find_genre("education").unwrap(),
            subject,
            Language::Korean,
            DurationClass::Short,
            Tone::Friendly,
            AgeGroup::Twenties,
            50,
            "Photorealistic",
            AspectRatio::Shorts,
            image_count,
        )
    }

    #[test]
    fn blank_subject_falls_back_to_trending() {
        let req = request("   ", 4).unwrap();
        assert_eq!(req.subject, DEFAULT_SUBJECT);
        assert!(req.user_prompt().contains(DEFAULT_SUBJECT));
    }

    #[test]
    fn subject_is_trimmed_not_replaced() {
        let req = request("  space exploration ", 4).unwrap();
        assert_eq!(req.subject, "space exploration");
    }

    #[test]
    fn too_few_images_is_rejected() {
        let err = request("space", 1).unwrap_err();
        assert!(matches!(err, StudioError::Precondition(_)));
    }

    #[test]
    fn prompt_carries_scene_count_and_genre() {
        let req = request("space", 6).unwrap();
        let prompt = req.user_prompt();
        assert!(prompt.contains("Number of images to generate: 6"));
        assert!(prompt.contains("Genre: Education"));
        assert!(req.system_instruction().contains("Korean"));
    }

    #[test]
    fn genre_lookup() {
        assert_eq!(find_genre("horror").unwrap().name, "Horror");
        assert!(find_genre("opera").is_none());
    }
}
