use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Course document representing a generated course
/// Structure: course -> units -> chapters, where each chapter carries its own
/// generation record (status, video, summary, quiz)
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Course {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub course_topic: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub units: Vec<Unit>,
    #[serde(default)]
    pub is_public: bool,
    /// True while any chapter generation is in flight for this course
    #[serde(default)]
    pub loading: bool,
    pub created_at: Option<mongodb::bson::DateTime>,
    pub updated_at: Option<mongodb::bson::DateTime>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Unit {
    pub id: String,
    pub title: String,
    pub chapters: Vec<Chapter>,
}

/// Per-chapter generation status. `status` is the single source of truth;
/// there is no separate loading flag at the chapter level.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ChapterStatus {
    #[default]
    Idle,
    Loading,
    Success,
    Error,
}

impl ChapterStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChapterStatus::Idle => "idle",
            ChapterStatus::Loading => "loading",
            ChapterStatus::Success => "success",
            ChapterStatus::Error => "error",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Chapter {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub status: ChapterStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quiz: Option<Quiz>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Quiz {
    pub title: String,
    pub questions: Vec<QuizQuestion>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct QuizQuestion {
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: usize,
}

impl Course {
    pub fn new(course_topic: String, description: Option<String>, units: Vec<Unit>) -> Self {
        let now = mongodb::bson::DateTime::now();
        Self {
            id: None,
            course_topic,
            description,
            units,
            is_public: false,
            loading: false,
            created_at: Some(now),
            updated_at: Some(now),
        }
    }

    pub fn find_chapter(&self, unit_id: &str, chapter_id: &str) -> Option<&Chapter> {
        self.units
            .iter()
            .find(|u| u.id == unit_id)?
            .chapters
            .iter()
            .find(|c| c.id == chapter_id)
    }

    pub fn find_unit(&self, unit_id: &str) -> Option<&Unit> {
        self.units.iter().find(|u| u.id == unit_id)
    }

    pub fn chapter_count(&self) -> usize {
        self.units.iter().map(|u| u.chapters.len()).sum()
    }
}

impl Unit {
    pub fn new(title: String, chapters: Vec<Chapter>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title,
            chapters,
        }
    }
}

impl Chapter {
    pub fn new(title: String, description: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title,
            description,
            status: ChapterStatus::Idle,
            video_id: None,
            summary: None,
            quiz: None,
            error: None,
        }
    }

    /// Reset the generation record and enter the loading state. Clears the
    /// outputs of any earlier run so a finished regeneration only carries
    /// fields produced by the run that finished.
    pub fn begin_generation(&mut self) {
        self.status = ChapterStatus::Loading;
        self.video_id = None;
        self.summary = None;
        self.quiz = None;
        self.error = None;
    }

    pub fn complete(&mut self, video_id: String, summary: String, quiz: Quiz) {
        self.status = ChapterStatus::Success;
        self.video_id = Some(video_id);
        self.summary = Some(summary);
        self.quiz = Some(quiz);
        self.error = None;
    }

    /// Record a failed generation. Fields already set by completed stages of
    /// the current run are kept so the record shows how far the run got.
    pub fn fail(&mut self, message: impl Into<String>) {
        self.status = ChapterStatus::Error;
        self.error = Some(message.into());
    }
}

impl Quiz {
    /// Fallback quiz substituted when model output cannot be parsed.
    /// A quiz is an enrichment; its absence must not fail the chapter.
    pub fn fallback() -> Self {
        Self {
            title: "Knowledge Check".to_string(),
            questions: vec![QuizQuestion {
                question: "What is the main topic discussed in this chapter?".to_string(),
                options: vec![
                    "Option A".to_string(),
                    "Option B".to_string(),
                    "Option C".to_string(),
                    "Option D".to_string(),
                ],
                correct_answer: 0,
            }],
        }
    }

    pub fn is_valid(&self) -> bool {
        !self.questions.is_empty() && self.questions.iter().all(QuizQuestion::is_valid)
    }
}

impl QuizQuestion {
    pub fn is_valid(&self) -> bool {
        self.options.len() == 4 && self.correct_answer < self.options.len()
    }
}
