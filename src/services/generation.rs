use std::sync::Arc;

use futures::future::join_all;
use serde::Serialize;
use tracing::{debug, error, warn};

use crate::services::store::{CourseStore, StoreError};
use crate::services::synthesis::SynthesisService;
use crate::services::transcript::TranscriptSource;
use crate::services::youtube::VideoSearch;

/// Settled result of one chapter pipeline run. A pipeline never rejects;
/// failures are folded into this record and the chapter document.
#[derive(Debug, Clone, Serialize)]
pub struct ChapterOutcome {
    pub unit_id: String,
    pub chapter_id: String,
    pub success: bool,
    pub error: Option<String>,
}

impl ChapterOutcome {
    fn succeeded(unit_id: &str, chapter_id: &str) -> Self {
        Self {
            unit_id: unit_id.to_string(),
            chapter_id: chapter_id.to_string(),
            success: true,
            error: None,
        }
    }

    fn failed(unit_id: &str, chapter_id: &str, message: impl Into<String>) -> Self {
        Self {
            unit_id: unit_id.to_string(),
            chapter_id: chapter_id.to_string(),
            success: false,
            error: Some(message.into()),
        }
    }
}

/// Aggregate result of a full course run
#[derive(Debug, Clone, Serialize)]
pub struct GenerationReport {
    pub course_id: String,
    pub chapters: Vec<ChapterOutcome>,
}

impl GenerationReport {
    pub fn succeeded(&self) -> usize {
        self.chapters.iter().filter(|c| c.success).count()
    }

    pub fn failed(&self) -> usize {
        self.chapters.len() - self.succeeded()
    }
}

const NO_VIDEO_FOUND: &str = "No suitable video found";

/// Orchestrates course generation: fans one chapter pipeline out per chapter,
/// lets them all settle, and tracks course-level progress in the store.
///
/// Every collaborator sits behind a trait so a run can be assembled against
/// fakes; nothing here talks to ambient globals.
pub struct GenerationService {
    store: Arc<dyn CourseStore>,
    video_search: Arc<dyn VideoSearch>,
    transcripts: Arc<dyn TranscriptSource>,
    synthesis: Arc<SynthesisService>,
}

impl GenerationService {
    pub fn new(
        store: Arc<dyn CourseStore>,
        video_search: Arc<dyn VideoSearch>,
        transcripts: Arc<dyn TranscriptSource>,
        synthesis: Arc<SynthesisService>,
    ) -> Self {
        Self {
            store,
            video_search,
            transcripts,
            synthesis,
        }
    }

    /// Generate every chapter of a course concurrently and wait for all of
    /// them to settle. One chapter failing never aborts its siblings; the
    /// course-level loading flag drops only after the last pipeline settles.
    pub async fn generate_course(&self, course_id: &str) -> Result<GenerationReport, StoreError> {
        debug!("Starting course generation for {}", course_id);

        let course = self.store.get_course(course_id).await?;
        self.store.set_loading(course_id, true).await?;

        let targets: Vec<(String, String)> = course
            .units
            .iter()
            .flat_map(|unit| {
                unit.chapters
                    .iter()
                    .map(|chapter| (unit.id.clone(), chapter.id.clone()))
            })
            .collect();

        let pipelines = targets
            .iter()
            .map(|(unit_id, chapter_id)| self.process_chapter(course_id, unit_id, chapter_id));
        let chapters = join_all(pipelines).await;

        self.store.set_loading(course_id, false).await?;
        debug!(
            "All chapters settled for {}: {} ok, {} failed",
            course_id,
            chapters.iter().filter(|c| c.success).count(),
            chapters.iter().filter(|c| !c.success).count()
        );

        Ok(GenerationReport {
            course_id: course_id.to_string(),
            chapters,
        })
    }

    /// Re-run the pipeline for a single chapter. User-triggered; does not
    /// touch the course-level loading flag.
    pub async fn regenerate_chapter(
        &self,
        course_id: &str,
        unit_id: &str,
        chapter_id: &str,
    ) -> ChapterOutcome {
        self.process_chapter(course_id, unit_id, chapter_id).await
    }

    /// One chapter, settled. Converts any escaped error into a best-effort
    /// error write on the chapter document so an exception can never take
    /// down the orchestrator's join.
    async fn process_chapter(
        &self,
        course_id: &str,
        unit_id: &str,
        chapter_id: &str,
    ) -> ChapterOutcome {
        debug!("Starting generation for chapter {}", chapter_id);

        match self.run_chapter(course_id, unit_id, chapter_id).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("Error generating chapter {}: {:#}", chapter_id, e);
                let message = e.to_string();
                self.write_failure(course_id, unit_id, chapter_id, &message)
                    .await;
                ChapterOutcome::failed(unit_id, chapter_id, message)
            }
        }
    }

    async fn run_chapter(
        &self,
        course_id: &str,
        unit_id: &str,
        chapter_id: &str,
    ) -> anyhow::Result<ChapterOutcome> {
        // Work from a fresh read; sibling pipelines mutate the same course.
        let course = self.store.get_course(course_id).await?;
        let chapter = course
            .find_chapter(unit_id, chapter_id)
            .ok_or_else(|| anyhow::anyhow!("Chapter not found"))?;
        let unit_title = course
            .find_unit(unit_id)
            .map(|u| u.title.clone())
            .unwrap_or_default();
        let chapter_title = chapter.title.clone();

        // Step 1: make the loading state visible before any slow work
        let mut record = chapter.clone();
        record.begin_generation();
        self.store
            .update_chapter(course_id, unit_id, chapter_id, &record)
            .await?;

        // Step 2: resolve a video, broadening the query with the course
        // topic before giving up
        let mut video_id = self.video_search.search(&chapter_title).await;
        if video_id.is_none() {
            warn!(
                "No video found for {:?}, trying with course topic",
                chapter_title
            );
            let broadened = format!("{} {}", course.course_topic, chapter_title);
            video_id = self.video_search.search(&broadened).await;
        }

        let Some(video_id) = video_id else {
            error!(
                "No video found for chapter {:?} in course {:?}",
                chapter_title, course.course_topic
            );
            record.fail(NO_VIDEO_FOUND);
            self.store
                .update_chapter(course_id, unit_id, chapter_id, &record)
                .await?;
            return Ok(ChapterOutcome::failed(unit_id, chapter_id, NO_VIDEO_FOUND));
        };

        // Step 3: transcript. Missing captions are common; fall through to
        // title-only synthesis instead of failing the chapter.
        let transcript = self.transcripts.fetch(&video_id).await;
        let transcript_text = if transcript.ok && !transcript.text.trim().is_empty() {
            Some(transcript.text)
        } else {
            debug!(
                "No transcript for {}; using title-only synthesis",
                video_id
            );
            None
        };

        // Step 4: synthesize the write-up and quiz
        let summary = self
            .synthesis
            .chapter_summary(
                &course.course_topic,
                &unit_title,
                &chapter_title,
                transcript_text.as_deref(),
            )
            .await?;
        let quiz = self
            .synthesis
            .chapter_quiz(&chapter_title, transcript_text.as_deref())
            .await;

        // Step 5: final patch; clears any stale error from an earlier run
        record.complete(video_id, summary, quiz);
        self.store
            .update_chapter(course_id, unit_id, chapter_id, &record)
            .await?;

        debug!("Generation complete for chapter {}", chapter_id);
        Ok(ChapterOutcome::succeeded(unit_id, chapter_id))
    }

    /// Best-effort error write; a store failure here is logged and swallowed
    /// so the settled outcome still reaches the orchestrator.
    async fn write_failure(&self, course_id: &str, unit_id: &str, chapter_id: &str, message: &str) {
        let course = match self.store.get_course(course_id).await {
            Ok(course) => course,
            Err(e) => {
                error!("Could not load course for error write: {}", e);
                return;
            }
        };

        let Some(chapter) = course.find_chapter(unit_id, chapter_id) else {
            error!("Chapter {} vanished during error write", chapter_id);
            return;
        };

        let mut record = chapter.clone();
        record.fail(message);
        if let Err(e) = self
            .store
            .update_chapter(course_id, unit_id, chapter_id, &record)
            .await
        {
            error!("Failed to record chapter error for {}: {}", chapter_id, e);
        }
    }
}
