use std::time::Duration;

use moka::future::Cache;
use uuid::Uuid;

use crate::db::Db;
use crate::models::{Course, CreateCourseReq, UpdateCourseReq};

pub async fn create_course(db: &Db, req: &CreateCourseReq) -> sqlx::Result<Course> {
    sqlx::query_as::<_, Course>(
        r#"
        INSERT INTO courses
            (id, title, mentor_id, price_display, video_count, assignment_count, quiz_count)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(&req.title)
    .bind(&req.mentor_id)
    .bind(&req.price)
    .bind(req.video_count)
    .bind(req.assignment_count)
    .bind(req.quiz_count)
    .fetch_one(db)
    .await
}

pub async fn update_course(
    db: &Db,
    course_id: &str,
    req: &UpdateCourseReq,
) -> sqlx::Result<Option<Course>> {
    sqlx::query_as::<_, Course>(
        r#"
        UPDATE courses
        SET title = COALESCE($2, title),
            price_display = COALESCE($3, price_display),
            video_count = COALESCE($4, video_count),
            assignment_count = COALESCE($5, assignment_count),
            quiz_count = COALESCE($6, quiz_count)
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(course_id)
    .bind(&req.title)
    .bind(&req.price)
    .bind(req.video_count)
    .bind(req.assignment_count)
    .bind(req.quiz_count)
    .fetch_optional(db)
    .await
}

pub async fn get_course(db: &Db, course_id: &str) -> sqlx::Result<Option<Course>> {
    sqlx::query_as::<_, Course>("SELECT * FROM courses WHERE id = $1")
        .bind(course_id)
        .fetch_optional(db)
        .await
}

pub async fn list_courses(db: &Db) -> sqlx::Result<Vec<Course>> {
    sqlx::query_as::<_, Course>("SELECT * FROM courses ORDER BY created_at DESC")
        .fetch_all(db)
        .await
}

/// Read-through course cache. TTL is a constructor parameter; writers
/// invalidate explicitly.
#[derive(Clone)]
pub struct CourseCache {
    by_id: Cache<String, Course>,
}

impl CourseCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            by_id: Cache::builder()
                .time_to_live(ttl)
                .max_capacity(1_000)
                .build(),
        }
    }

    pub async fn get(&self, db: &Db, course_id: &str) -> sqlx::Result<Option<Course>> {
        if let Some(course) = self.by_id.get(course_id).await {
            return Ok(Some(course));
        }
        let course = get_course(db, course_id).await?;
        if let Some(course) = &course {
            self.by_id.insert(course_id.to_string(), course.clone()).await;
        }
        Ok(course)
    }

    pub async fn invalidate(&self, course_id: &str) {
        self.by_id.invalidate(course_id).await;
    }
}
