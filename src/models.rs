use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(sqlx::Type, Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "enrollment_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum EnrollmentStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(sqlx::Type, Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "notification_kind", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(sqlx::Type, Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[sqlx(type_name = "progress_kind", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ProgressKind {
    Video,
    Assignment,
    Quiz,
}

#[derive(sqlx::FromRow, Serialize, Deserialize, Debug, Clone)]
pub struct Course {
    pub id: String,
    pub title: String,
    pub mentor_id: String,
    pub price_display: Option<String>,
    pub video_count: i32,
    pub assignment_count: i32,
    pub quiz_count: i32,
    pub created_at: DateTime<Utc>,
}

impl Course {
    /// total curriculum items, the denominator of the progress percentage
    pub fn total_items(&self) -> i64 {
        self.video_count as i64 + self.assignment_count as i64 + self.quiz_count as i64
    }
}

#[derive(sqlx::FromRow, Serialize, Deserialize, Debug, Clone)]
pub struct Enrollment {
    pub id: String, // "{student_id}_{course_id}"
    pub student_id: String,
    pub student_name: String,
    pub course_id: String,
    pub course_name: String,
    pub course_price: f64,
    pub mentor_id: String,
    pub payment_proof_key: String, // opaque storage key, never a raw URL
    pub status: EnrollmentStatus,
    pub progress: i32,
    pub completed: bool,
    pub rejection_reason: Option<String>,
    pub enrolled_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub approved_at: Option<DateTime<Utc>>,
    pub rejected_at: Option<DateTime<Utc>>,
}

/// An enrollment together with its merged progress maps, as the player reads it.
#[derive(Serialize, Debug, Clone)]
pub struct EnrollmentDetail {
    #[serde(flatten)]
    pub enrollment: Enrollment,
    pub completed_videos: Vec<String>,
    pub assignment_submissions: HashMap<String, String>,
    pub quiz_scores: HashMap<String, i32>,
}

#[derive(sqlx::FromRow, Serialize, Deserialize, Debug, Clone)]
pub struct StudentCourse {
    pub student_id: String,
    pub course_id: String,
    pub progress: i32,
    pub enrolled_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow, Serialize, Deserialize, Debug, Clone)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: String,
    pub title: String,
    pub message: String,
    pub kind: NotificationKind,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CreateCourseReq {
    pub title: String,
    pub mentor_id: String,
    pub price: Option<String>,
    #[serde(default)]
    pub video_count: i32,
    #[serde(default)]
    pub assignment_count: i32,
    #[serde(default)]
    pub quiz_count: i32,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct UpdateCourseReq {
    pub title: Option<String>,
    pub price: Option<String>,
    pub video_count: Option<i32>,
    pub assignment_count: Option<i32>,
    pub quiz_count: Option<i32>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CreateEnrollmentReq {
    pub student_id: String,
    pub course_id: String,
    pub mentor_id: String,
    pub payment_proof_key: String,
    pub student_name: String,
    pub course_name: String,
    pub course_price: Option<String>, // display string, e.g. "$19.99"
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RejectReq {
    pub reason: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct ProgressUpdateReq {
    #[serde(default)]
    pub completed_videos: Vec<String>,
    #[serde(default)]
    pub assignment_submissions: HashMap<String, String>,
    #[serde(default)]
    pub quiz_scores: HashMap<String, i32>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct MentorEnrollmentsQuery {
    pub status: EnrollmentStatus,
}
