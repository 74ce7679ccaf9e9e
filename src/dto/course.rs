use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::course::{Chapter, Course, Quiz, QuizQuestion, Unit};
use crate::services::generation::{ChapterOutcome, GenerationReport};

/// Course DTOs. Responses carry string ids and statuses so the wire format
/// stays independent of the bson storage shapes.

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateCourseRequest {
    pub topic: String,
    /// Optional unit titles; the outline model fills in the rest
    #[serde(default)]
    pub units: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CourseResponse {
    pub id: String,
    pub course_topic: String,
    pub description: Option<String>,
    pub units: Vec<UnitResponse>,
    pub is_public: bool,
    pub loading: bool,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UnitResponse {
    pub id: String,
    pub title: String,
    pub chapters: Vec<ChapterResponse>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ChapterResponse {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub status: String,
    pub video_id: Option<String>,
    pub summary: Option<String>,
    pub quiz: Option<QuizResponse>,
    pub error: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct QuizResponse {
    pub title: String,
    pub questions: Vec<QuizQuestionResponse>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct QuizQuestionResponse {
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: usize,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CourseListResponse {
    pub courses: Vec<CourseResponse>,
    pub total_count: usize,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct GenerationReportResponse {
    pub course_id: String,
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub chapters: Vec<ChapterOutcomeResponse>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ChapterOutcomeResponse {
    pub unit_id: String,
    pub chapter_id: String,
    pub success: bool,
    pub error: Option<String>,
}

impl CourseResponse {
    pub fn from_model(course: &Course) -> Self {
        Self {
            id: course.id.map(|id| id.to_hex()).unwrap_or_default(),
            course_topic: course.course_topic.clone(),
            description: course.description.clone(),
            units: course.units.iter().map(UnitResponse::from_model).collect(),
            is_public: course.is_public,
            loading: course.loading,
            created_at: course.created_at.map(|dt| dt.to_string()),
            updated_at: course.updated_at.map(|dt| dt.to_string()),
        }
    }
}

impl UnitResponse {
    fn from_model(unit: &Unit) -> Self {
        Self {
            id: unit.id.clone(),
            title: unit.title.clone(),
            chapters: unit
                .chapters
                .iter()
                .map(ChapterResponse::from_model)
                .collect(),
        }
    }
}

impl ChapterResponse {
    fn from_model(chapter: &Chapter) -> Self {
        Self {
            id: chapter.id.clone(),
            title: chapter.title.clone(),
            description: chapter.description.clone(),
            status: chapter.status.as_str().to_string(),
            video_id: chapter.video_id.clone(),
            summary: chapter.summary.clone(),
            quiz: chapter.quiz.as_ref().map(QuizResponse::from_model),
            error: chapter.error.clone(),
        }
    }
}

impl QuizResponse {
    fn from_model(quiz: &Quiz) -> Self {
        Self {
            title: quiz.title.clone(),
            questions: quiz
                .questions
                .iter()
                .map(|q: &QuizQuestion| QuizQuestionResponse {
                    question: q.question.clone(),
                    options: q.options.clone(),
                    correct_answer: q.correct_answer,
                })
                .collect(),
        }
    }
}

impl GenerationReportResponse {
    pub fn from_report(report: &GenerationReport) -> Self {
        Self {
            course_id: report.course_id.clone(),
            total: report.chapters.len(),
            succeeded: report.succeeded(),
            failed: report.failed(),
            chapters: report
                .chapters
                .iter()
                .map(ChapterOutcomeResponse::from_outcome)
                .collect(),
        }
    }
}

impl ChapterOutcomeResponse {
    pub fn from_outcome(outcome: &ChapterOutcome) -> Self {
        Self {
            unit_id: outcome.unit_id.clone(),
            chapter_id: outcome.chapter_id.clone(),
            success: outcome.success,
            error: outcome.error.clone(),
        }
    }
}
