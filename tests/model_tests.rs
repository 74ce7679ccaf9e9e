use coursegen::models::course::{Chapter, ChapterStatus, Course, Quiz, QuizQuestion, Unit};

fn sample_quiz() -> Quiz {
    Quiz {
        title: "Knowledge Check".to_string(),
        questions: vec![QuizQuestion {
            question: "What is ownership?".to_string(),
            options: vec![
                "A type system".to_string(),
                "A memory discipline".to_string(),
                "A garbage collector".to_string(),
                "A linter".to_string(),
            ],
            correct_answer: 1,
        }],
    }
}

#[test]
fn test_course_creation() {
    let chapters = vec![
        Chapter::new("Unit tests".to_string(), None),
        Chapter::new("Integration tests".to_string(), None),
    ];
    let unit = Unit::new("Basics".to_string(), chapters);
    let course = Course::new("Intro to Testing".to_string(), None, vec![unit]);

    assert_eq!(course.course_topic, "Intro to Testing");
    assert_eq!(course.units.len(), 1);
    assert_eq!(course.chapter_count(), 2);
    assert!(!course.loading);
    assert!(!course.is_public);
    assert!(course.created_at.is_some());
}

#[test]
fn test_new_chapter_is_idle() {
    let chapter = Chapter::new("Ownership".to_string(), Some("Moves and borrows".to_string()));

    assert_eq!(chapter.status, ChapterStatus::Idle);
    assert!(chapter.video_id.is_none());
    assert!(chapter.summary.is_none());
    assert!(chapter.quiz.is_none());
    assert!(chapter.error.is_none());
}

#[test]
fn test_find_chapter() {
    let chapter = Chapter::new("Ownership".to_string(), None);
    let chapter_id = chapter.id.clone();
    let unit = Unit::new("Fundamentals".to_string(), vec![chapter]);
    let unit_id = unit.id.clone();
    let course = Course::new("Rust".to_string(), None, vec![unit]);

    assert!(course.find_chapter(&unit_id, &chapter_id).is_some());
    assert!(course.find_chapter(&unit_id, "missing").is_none());
    assert!(course.find_chapter("missing", &chapter_id).is_none());
}

#[test]
fn test_begin_generation_clears_previous_run() {
    let mut chapter = Chapter::new("Ownership".to_string(), None);
    chapter.complete("vid123".to_string(), "A summary".to_string(), sample_quiz());
    assert_eq!(chapter.status, ChapterStatus::Success);

    chapter.begin_generation();

    assert_eq!(chapter.status, ChapterStatus::Loading);
    assert!(chapter.video_id.is_none());
    assert!(chapter.summary.is_none());
    assert!(chapter.quiz.is_none());
    assert!(chapter.error.is_none());
}

#[test]
fn test_complete_clears_stale_error() {
    let mut chapter = Chapter::new("Ownership".to_string(), None);
    chapter.fail("No suitable video found");
    assert_eq!(chapter.status, ChapterStatus::Error);
    assert_eq!(chapter.error.as_deref(), Some("No suitable video found"));

    chapter.begin_generation();
    chapter.complete("vid123".to_string(), "A summary".to_string(), sample_quiz());

    assert_eq!(chapter.status, ChapterStatus::Success);
    assert!(chapter.error.is_none());
    assert_eq!(chapter.video_id.as_deref(), Some("vid123"));
    assert!(chapter.quiz.is_some());
}

#[test]
fn test_fail_keeps_fields_from_completed_stages() {
    let mut chapter = Chapter::new("Ownership".to_string(), None);
    chapter.begin_generation();
    chapter.video_id = Some("vid123".to_string());

    chapter.fail("Summary generation failed");

    assert_eq!(chapter.status, ChapterStatus::Error);
    assert_eq!(chapter.video_id.as_deref(), Some("vid123"));
    assert!(chapter.summary.is_none());
}

#[test]
fn test_fallback_quiz_shape() {
    let quiz = Quiz::fallback();

    assert_eq!(quiz.title, "Knowledge Check");
    assert_eq!(quiz.questions.len(), 1);
    assert_eq!(
        quiz.questions[0].question,
        "What is the main topic discussed in this chapter?"
    );
    assert_eq!(quiz.questions[0].options.len(), 4);
    assert_eq!(quiz.questions[0].correct_answer, 0);
    assert!(quiz.is_valid());
}

#[test]
fn test_quiz_question_validity() {
    let mut question = QuizQuestion {
        question: "Q".to_string(),
        options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
        correct_answer: 3,
    };
    assert!(question.is_valid());

    question.correct_answer = 4;
    assert!(!question.is_valid());

    question.correct_answer = 0;
    question.options.pop();
    assert!(!question.is_valid());
}

#[test]
fn test_quiz_validity_requires_questions() {
    let quiz = Quiz {
        title: "Empty".to_string(),
        questions: vec![],
    };
    assert!(!quiz.is_valid());
}

#[test]
fn test_chapter_status_serializes_lowercase() {
    assert_eq!(
        serde_json::to_value(ChapterStatus::Loading).unwrap(),
        serde_json::json!("loading")
    );
    assert_eq!(
        serde_json::to_value(ChapterStatus::Success).unwrap(),
        serde_json::json!("success")
    );

    let parsed: ChapterStatus = serde_json::from_value(serde_json::json!("error")).unwrap();
    assert_eq!(parsed, ChapterStatus::Error);
}
