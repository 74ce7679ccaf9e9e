use std::collections::HashMap;

use async_trait::async_trait;
use futures::stream::StreamExt;
use mongodb::bson::{doc, oid::ObjectId};
use mongodb::options::UpdateOptions;
use tokio::sync::RwLock;

use crate::models::course::{Chapter, Course};
use crate::services::database::Database;

/// Errors surfaced by the course store. Callers branch on `NotFound`;
/// everything else is reported as an opaque backend failure.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("course not found: {0}")]
    NotFound(String),
    #[error("invalid course id: {0}")]
    InvalidId(String),
    #[error("store backend error: {0}")]
    Backend(String),
}

impl From<mongodb::error::Error> for StoreError {
    fn from(err: mongodb::error::Error) -> Self {
        StoreError::Backend(err.to_string())
    }
}

/// Document-store boundary for course records.
///
/// Chapter writes are targeted: `update_chapter` replaces exactly one chapter
/// subdocument, so concurrent pipelines working on sibling chapters of the
/// same course never overwrite each other's progress.
#[async_trait]
pub trait CourseStore: Send + Sync {
    async fn get_course(&self, course_id: &str) -> Result<Course, StoreError>;
    async fn insert_course(&self, course: &Course) -> Result<String, StoreError>;
    async fn list_public_courses(&self) -> Result<Vec<Course>, StoreError>;
    async fn set_loading(&self, course_id: &str, loading: bool) -> Result<(), StoreError>;
    async fn set_public(&self, course_id: &str, public: bool) -> Result<(), StoreError>;
    async fn update_chapter(
        &self,
        course_id: &str,
        unit_id: &str,
        chapter_id: &str,
        chapter: &Chapter,
    ) -> Result<(), StoreError>;
}

/// MongoDB-backed course store
#[derive(Clone)]
pub struct MongoCourseStore {
    db: Database,
}

impl MongoCourseStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    fn parse_id(course_id: &str) -> Result<ObjectId, StoreError> {
        ObjectId::parse_str(course_id).map_err(|_| StoreError::InvalidId(course_id.to_string()))
    }
}

#[async_trait]
impl CourseStore for MongoCourseStore {
    async fn get_course(&self, course_id: &str) -> Result<Course, StoreError> {
        let object_id = Self::parse_id(course_id)?;

        self.db
            .courses()
            .find_one(doc! {"_id": object_id}, None)
            .await?
            .ok_or_else(|| StoreError::NotFound(course_id.to_string()))
    }

    async fn insert_course(&self, course: &Course) -> Result<String, StoreError> {
        let result = self.db.courses().insert_one(course, None).await?;
        let inserted_id = result
            .inserted_id
            .as_object_id()
            .ok_or_else(|| StoreError::Backend("inserted id is not an ObjectId".to_string()))?;

        tracing::info!("Created course: {}", course.course_topic);
        Ok(inserted_id.to_hex())
    }

    async fn list_public_courses(&self) -> Result<Vec<Course>, StoreError> {
        let mut courses = Vec::new();
        let mut cursor = self
            .db
            .courses()
            .find(doc! {"is_public": true}, None)
            .await?;

        while let Some(result) = cursor.next().await {
            match result {
                Ok(course) => courses.push(course),
                Err(e) => {
                    tracing::error!("Error processing course document: {}", e);
                    continue;
                }
            }
        }

        Ok(courses)
    }

    async fn set_loading(&self, course_id: &str, loading: bool) -> Result<(), StoreError> {
        let object_id = Self::parse_id(course_id)?;

        let result = self
            .db
            .courses()
            .update_one(
                doc! {"_id": object_id},
                doc! {"$set": {"loading": loading, "updated_at": mongodb::bson::DateTime::now()}},
                None,
            )
            .await?;

        if result.matched_count == 0 {
            return Err(StoreError::NotFound(course_id.to_string()));
        }
        Ok(())
    }

    async fn set_public(&self, course_id: &str, public: bool) -> Result<(), StoreError> {
        let object_id = Self::parse_id(course_id)?;

        let result = self
            .db
            .courses()
            .update_one(
                doc! {"_id": object_id},
                doc! {"$set": {"is_public": public, "updated_at": mongodb::bson::DateTime::now()}},
                None,
            )
            .await?;

        if result.matched_count == 0 {
            return Err(StoreError::NotFound(course_id.to_string()));
        }
        Ok(())
    }

    async fn update_chapter(
        &self,
        course_id: &str,
        unit_id: &str,
        chapter_id: &str,
        chapter: &Chapter,
    ) -> Result<(), StoreError> {
        let object_id = Self::parse_id(course_id)?;
        let chapter_bson =
            mongodb::bson::to_bson(chapter).map_err(|e| StoreError::Backend(e.to_string()))?;

        // Array filters pin the write to one chapter subdocument, keeping
        // sibling chapter writes from clobbering each other.
        let options = UpdateOptions::builder()
            .array_filters(vec![doc! {"u.id": unit_id}, doc! {"c.id": chapter_id}])
            .build();

        let result = self
            .db
            .courses()
            .update_one(
                doc! {"_id": object_id},
                doc! {"$set": {
                    "units.$[u].chapters.$[c]": chapter_bson,
                    "updated_at": mongodb::bson::DateTime::now(),
                }},
                options,
            )
            .await?;

        if result.matched_count == 0 {
            return Err(StoreError::NotFound(format!(
                "{}/{}/{}",
                course_id, unit_id, chapter_id
            )));
        }
        Ok(())
    }
}

/// In-memory course store used by tests and local development without a
/// running MongoDB instance.
#[derive(Default)]
pub struct InMemoryCourseStore {
    courses: RwLock<HashMap<String, Course>>,
}

impl InMemoryCourseStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CourseStore for InMemoryCourseStore {
    async fn get_course(&self, course_id: &str) -> Result<Course, StoreError> {
        self.courses
            .read()
            .await
            .get(course_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(course_id.to_string()))
    }

    async fn insert_course(&self, course: &Course) -> Result<String, StoreError> {
        let mut stored = course.clone();
        let id = stored.id.unwrap_or_else(ObjectId::new);
        stored.id = Some(id);

        let key = id.to_hex();
        self.courses.write().await.insert(key.clone(), stored);
        Ok(key)
    }

    async fn list_public_courses(&self) -> Result<Vec<Course>, StoreError> {
        Ok(self
            .courses
            .read()
            .await
            .values()
            .filter(|c| c.is_public)
            .cloned()
            .collect())
    }

    async fn set_loading(&self, course_id: &str, loading: bool) -> Result<(), StoreError> {
        let mut courses = self.courses.write().await;
        let course = courses
            .get_mut(course_id)
            .ok_or_else(|| StoreError::NotFound(course_id.to_string()))?;
        course.loading = loading;
        course.updated_at = Some(mongodb::bson::DateTime::now());
        Ok(())
    }

    async fn set_public(&self, course_id: &str, public: bool) -> Result<(), StoreError> {
        let mut courses = self.courses.write().await;
        let course = courses
            .get_mut(course_id)
            .ok_or_else(|| StoreError::NotFound(course_id.to_string()))?;
        course.is_public = public;
        course.updated_at = Some(mongodb::bson::DateTime::now());
        Ok(())
    }

    async fn update_chapter(
        &self,
        course_id: &str,
        unit_id: &str,
        chapter_id: &str,
        chapter: &Chapter,
    ) -> Result<(), StoreError> {
        let mut courses = self.courses.write().await;
        let course = courses
            .get_mut(course_id)
            .ok_or_else(|| StoreError::NotFound(course_id.to_string()))?;

        let slot = course
            .units
            .iter_mut()
            .find(|u| u.id == unit_id)
            .and_then(|u| u.chapters.iter_mut().find(|c| c.id == chapter_id))
            .ok_or_else(|| {
                StoreError::NotFound(format!("{}/{}/{}", course_id, unit_id, chapter_id))
            })?;

        *slot = chapter.clone();
        course.updated_at = Some(mongodb::bson::DateTime::now());
        Ok(())
    }
}
