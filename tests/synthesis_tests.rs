use std::sync::Arc;

use async_trait::async_trait;

use coursegen::models::course::ChapterStatus;
use coursegen::services::llm::{LanguageModel, LlmError};
use coursegen::services::synthesis::SynthesisService;

/// Fake model that always answers with one canned response, or always fails
struct StaticLlm {
    response: Option<String>,
}

impl StaticLlm {
    fn answering(text: &str) -> Self {
        Self {
            response: Some(text.to_string()),
        }
    }

    fn failing() -> Self {
        Self { response: None }
    }
}

#[async_trait]
impl LanguageModel for StaticLlm {
    async fn complete(&self, _prompt: &str) -> Result<String, LlmError> {
        match &self.response {
            Some(text) => Ok(text.clone()),
            None => Err(LlmError::Request("service down".to_string())),
        }
    }
}

fn synthesis(llm: StaticLlm) -> SynthesisService {
    SynthesisService::new(Arc::new(llm))
}

#[tokio::test]
async fn test_draft_outline_builds_idle_chapters() {
    let outline = r#"Here is your course outline:
    {
        "description": "A short course on testing.",
        "units": [
            {
                "title": "Basics",
                "chapters": [
                    {"title": "Unit tests", "description": "Testing single pieces"},
                    {"title": "Integration tests"}
                ]
            },
            {
                "title": "Practices",
                "chapters": [
                    {"title": "Mocking"}
                ]
            }
        ]
    }
    Enjoy!"#;

    let service = synthesis(StaticLlm::answering(outline));
    let course = service
        .draft_outline("Intro to Testing", &["Basics".to_string()])
        .await
        .unwrap();

    assert_eq!(course.course_topic, "Intro to Testing");
    assert_eq!(course.description.as_deref(), Some("A short course on testing."));
    assert_eq!(course.units.len(), 2);
    assert_eq!(course.units[0].title, "Basics");
    assert_eq!(course.units[0].chapters.len(), 2);
    assert_eq!(course.units[0].chapters[0].title, "Unit tests");
    assert_eq!(
        course.units[0].chapters[0].description.as_deref(),
        Some("Testing single pieces")
    );

    // Every drafted chapter starts idle with an id assigned
    for unit in &course.units {
        assert!(!unit.id.is_empty());
        for chapter in &unit.chapters {
            assert!(!chapter.id.is_empty());
            assert_eq!(chapter.status, ChapterStatus::Idle);
            assert!(chapter.video_id.is_none());
        }
    }
}

#[tokio::test]
async fn test_draft_outline_rejects_prose_only_output() {
    let service = synthesis(StaticLlm::answering(
        "I would be happy to help you plan a course!",
    ));
    let result = service.draft_outline("Intro to Testing", &[]).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_draft_outline_rejects_empty_units() {
    let service = synthesis(StaticLlm::answering(r#"{"units": []}"#));
    let result = service.draft_outline("Intro to Testing", &[]).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_chapter_summary_uses_model_text() {
    let service = synthesis(StaticLlm::answering("  A tidy summary.  "));
    let summary = service
        .chapter_summary("Rust", "Fundamentals", "Ownership", Some("transcript text"))
        .await
        .unwrap();
    assert_eq!(summary, "A tidy summary.");
}

#[tokio::test]
async fn test_chapter_summary_propagates_model_failure() {
    let service = synthesis(StaticLlm::failing());
    let result = service
        .chapter_summary("Rust", "Fundamentals", "Ownership", None)
        .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_chapter_quiz_survives_model_failure() {
    let service = synthesis(StaticLlm::failing());
    let quiz = service.chapter_quiz("Ownership", Some("transcript")).await;

    // Fallback quiz, never an error
    assert_eq!(quiz.questions.len(), 1);
    assert!(quiz.is_valid());
}

#[tokio::test]
async fn test_chapter_quiz_parses_fenced_output() {
    let fenced = r#"```json
{
    "title": "Knowledge Check",
    "questions": [
        {"question": "Q1", "options": ["a", "b", "c", "d"], "correctAnswer": 3}
    ]
}
```"#;
    let service = synthesis(StaticLlm::answering(fenced));
    let quiz = service.chapter_quiz("Ownership", None).await;

    assert_eq!(quiz.title, "Knowledge Check");
    assert_eq!(quiz.questions.len(), 1);
    assert_eq!(quiz.questions[0].correct_answer, 3);
}
