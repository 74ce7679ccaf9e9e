use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::models::course::{Chapter, Course, Quiz, QuizQuestion, Unit};
use crate::services::llm::{LanguageModel, LlmError};

/// Drives the language model to produce course artifacts: the unit/chapter
/// outline at creation time, and the per-chapter write-up and quiz during
/// generation.
///
/// Each artifact has a transcript-grounded prompt and a title-only fallback
/// used when the resolved video has no captions.
pub struct SynthesisService {
    llm: Arc<dyn LanguageModel>,
}

// Wire shapes the model is instructed to emit. Kept separate from the
// storage models: the quiz answer index arrives as camelCase `correctAnswer`.
#[derive(Debug, Deserialize)]
struct OutlineDraft {
    #[serde(default)]
    description: Option<String>,
    units: Vec<OutlineUnit>,
}

#[derive(Debug, Deserialize)]
struct OutlineUnit {
    title: String,
    chapters: Vec<OutlineChapter>,
}

#[derive(Debug, Deserialize)]
struct OutlineChapter {
    title: String,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct QuizDraft {
    title: String,
    questions: Vec<QuizQuestionDraft>,
}

#[derive(Debug, Deserialize)]
struct QuizQuestionDraft {
    question: String,
    options: Vec<String>,
    #[serde(rename = "correctAnswer")]
    correct_answer: usize,
}

#[derive(Debug, thiserror::Error)]
enum QuizParseError {
    #[error("no JSON object in model output")]
    MissingJson,
    #[error("quiz JSON did not parse: {0}")]
    Malformed(String),
    #[error("quiz contained no well-formed questions")]
    NoValidQuestions,
}

impl SynthesisService {
    pub fn new(llm: Arc<dyn LanguageModel>) -> Self {
        Self { llm }
    }

    /// Draft a course outline from a topic and optional unit titles.
    /// Chapters are created idle; generation fills them in later.
    pub async fn draft_outline(
        &self,
        course_topic: &str,
        unit_titles: &[String],
    ) -> anyhow::Result<Course> {
        let valid_titles: Vec<&String> = unit_titles
            .iter()
            .filter(|t| !t.trim().is_empty())
            .collect();

        let prompt = if valid_titles.is_empty() {
            format!(
                "Create a comprehensive course on \"{}\". Generate 4-5 units and 3-5 chapters \
                 per unit with brief descriptions. Also provide a short one-sentence course \
                 description that summarizes the course. The course should be educational and \
                 well-structured.\n\n{}",
                course_topic, OUTLINE_FORMAT_INSTRUCTIONS
            )
        } else {
            let units_string = valid_titles
                .iter()
                .enumerate()
                .map(|(i, title)| format!("Unit {}: {}", i + 1, title))
                .collect::<Vec<_>>()
                .join("\n");
            format!(
                "Create a course on \"{}\" with the following units:\n{}\n\nFor each unit, \
                 generate 3-5 chapters with brief descriptions. Keep the unit titles exactly as \
                 given. Also provide a short one-sentence course description that summarizes the \
                 course. The course should be educational and well-structured.\n\n{}",
                course_topic, units_string, OUTLINE_FORMAT_INSTRUCTIONS
            )
        };

        let text = self.llm.complete(&prompt).await?;
        let json = extract_json_object(&text)
            .ok_or_else(|| anyhow::anyhow!("model returned no JSON outline"))?;
        let draft: OutlineDraft = serde_json::from_str(json)
            .map_err(|e| anyhow::anyhow!("malformed outline from model: {}", e))?;

        if draft.units.is_empty() {
            anyhow::bail!("model outline contained no units");
        }

        let units = draft
            .units
            .into_iter()
            .map(|unit| {
                let chapters = unit
                    .chapters
                    .into_iter()
                    .map(|c| Chapter::new(c.title, c.description))
                    .collect();
                Unit::new(unit.title, chapters)
            })
            .collect();

        debug!("Drafted outline for course {:?}", course_topic);
        Ok(Course::new(
            course_topic.to_string(),
            draft.description,
            units,
        ))
    }

    /// Long-form explanatory write-up for one chapter. Transcript-grounded
    /// when captions are available, title-only otherwise.
    pub async fn chapter_summary(
        &self,
        course_topic: &str,
        unit_title: &str,
        chapter_title: &str,
        transcript: Option<&str>,
    ) -> Result<String, LlmError> {
        let prompt = match transcript {
            Some(transcript) => format!(
                "The following is a transcript of an educational video for a chapter titled \
                 \"{}\" in a unit called \"{}\" of a course on \"{}\".\n\nTranscript: {}\n\n\
                 Summarize the video in 250 words or less. Do not mention sponsors or anything \
                 unrelated to the main topic, and do not introduce what the summary is about.",
                chapter_title, unit_title, course_topic, transcript
            ),
            None => format!(
                "Create educational content for a chapter titled \"{}\" which is part of a unit \
                 called \"{}\" in a course on \"{}\". No video transcript is available for this \
                 chapter, so rely on the titles alone. The content should be comprehensive, \
                 well-structured, and around 500-800 words. Include key points, explanations, \
                 and real-world examples where relevant.",
                chapter_title, unit_title, course_topic
            ),
        };

        let text = self.llm.complete(&prompt).await?;
        let summary = text.trim().to_string();
        if summary.is_empty() {
            return Err(LlmError::EmptyResponse);
        }
        Ok(summary)
    }

    /// Multiple-choice quiz for one chapter. Never fails: malformed model
    /// output degrades to the fallback quiz, because a quiz is an enrichment
    /// and must not fail the chapter.
    pub async fn chapter_quiz(&self, chapter_title: &str, transcript: Option<&str>) -> Quiz {
        let prompt = match transcript {
            Some(transcript) => format!(
                "Create a quiz based on the following video transcript. The quiz should have 5 \
                 multiple-choice questions with 4 options each. Each question should test \
                 understanding of key concepts from the transcript. The correct answer should be \
                 clearly indicated.\n\nTranscript: {}\n\nChapter Title: {}\n\n{}",
                transcript, chapter_title, QUIZ_FORMAT_INSTRUCTIONS
            ),
            None => format!(
                "Create a quiz for a chapter titled \"{}\". No video transcript is available, so \
                 base the questions on what a chapter with this title would teach. The quiz \
                 should have 5 multiple-choice questions with 4 options each. The correct answer \
                 should be clearly indicated.\n\n{}",
                chapter_title, QUIZ_FORMAT_INSTRUCTIONS
            ),
        };

        let text = match self.llm.complete(&prompt).await {
            Ok(text) => text,
            Err(e) => {
                warn!("Quiz generation failed for {:?}: {}", chapter_title, e);
                return Quiz::fallback();
            }
        };

        match parse_quiz(&text) {
            Ok(quiz) => quiz,
            Err(e) => {
                warn!("Discarding quiz for {:?}: {}", chapter_title, e);
                Quiz::fallback()
            }
        }
    }
}

const OUTLINE_FORMAT_INSTRUCTIONS: &str = r#"Important: respond with a single JSON object in exactly this shape, with no surrounding prose:
{
  "description": "One-sentence course description",
  "units": [
    {
      "title": "Unit title",
      "chapters": [
        {"title": "Chapter title", "description": "Brief description of what this chapter covers"}
      ]
    }
  ]
}"#;

const QUIZ_FORMAT_INSTRUCTIONS: &str = r#"Format the response as a JSON object with the following structure:
{
  "title": "Knowledge Check",
  "questions": [
    {
      "question": "Question text",
      "options": ["Option 1", "Option 2", "Option 3", "Option 4"],
      "correctAnswer": 0
    }
  ]
}"#;

/// Models wrap JSON in prose or code fences; take the substring between the
/// first `{` and the last `}` before parsing.
fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&text[start..=end])
}

fn parse_quiz(text: &str) -> Result<Quiz, QuizParseError> {
    let json = extract_json_object(text).ok_or(QuizParseError::MissingJson)?;
    let draft: QuizDraft =
        serde_json::from_str(json).map_err(|e| QuizParseError::Malformed(e.to_string()))?;

    let questions: Vec<QuizQuestion> = draft
        .questions
        .into_iter()
        .map(|q| QuizQuestion {
            question: q.question,
            options: q.options,
            correct_answer: q.correct_answer,
        })
        .filter(|q| {
            let valid = q.is_valid();
            if !valid {
                warn!("Dropping malformed quiz question: {:?}", q.question);
            }
            valid
        })
        .collect();

    if questions.is_empty() {
        return Err(QuizParseError::NoValidQuestions);
    }

    Ok(Quiz {
        title: draft.title,
        questions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_json_between_braces() {
        let text = "Sure! Here is your quiz:\n```json\n{\"title\": \"Q\"}\n```\nEnjoy!";
        assert_eq!(extract_json_object(text), Some("{\"title\": \"Q\"}"));
        assert_eq!(extract_json_object("no json here"), None);
        assert_eq!(extract_json_object("} backwards {"), None);
    }

    #[test]
    fn parses_well_formed_quiz() {
        let text = r#"{
            "title": "Knowledge Check",
            "questions": [
                {"question": "Q1", "options": ["a", "b", "c", "d"], "correctAnswer": 2}
            ]
        }"#;
        let quiz = parse_quiz(text).unwrap();
        assert_eq!(quiz.title, "Knowledge Check");
        assert_eq!(quiz.questions.len(), 1);
        assert_eq!(quiz.questions[0].correct_answer, 2);
        assert!(quiz.is_valid());
    }

    #[test]
    fn drops_questions_with_bad_shape() {
        let text = r#"{
            "title": "Knowledge Check",
            "questions": [
                {"question": "ok", "options": ["a", "b", "c", "d"], "correctAnswer": 0},
                {"question": "three options", "options": ["a", "b", "c"], "correctAnswer": 0},
                {"question": "answer out of range", "options": ["a", "b", "c", "d"], "correctAnswer": 4}
            ]
        }"#;
        let quiz = parse_quiz(text).unwrap();
        assert_eq!(quiz.questions.len(), 1);
        assert_eq!(quiz.questions[0].question, "ok");
    }

    #[test]
    fn rejects_quiz_with_no_valid_questions() {
        let text = r#"{"title": "Knowledge Check", "questions": []}"#;
        assert!(parse_quiz(text).is_err());
        assert!(parse_quiz("not json at all").is_err());
    }
}
