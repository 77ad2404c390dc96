use axum::http::StatusCode;
use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;

use crate::access::{AccessDecision, CourseAccessState};
use crate::catalog::{self, CourseCache};
use crate::db::Db;
use crate::enrollment::{self, EnrollError};
use crate::models::*;
use crate::notify;

#[derive(Clone)]
pub struct AppState {
    pub db: Db,
    pub courses: CourseCache,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        // catalog
        .route("/api/courses", post(create_course).get(list_courses))
        .route(
            "/api/courses/:course_id",
            get(get_course).put(update_course),
        )
        // enrollment lifecycle
        .route("/api/enrollments", post(create_enrollment))
        .route(
            "/api/enrollments/:student_id/:course_id",
            get(get_enrollment),
        )
        .route(
            "/api/enrollments/:student_id/:course_id/progress",
            post(update_progress),
        )
        .route("/api/access/:student_id/:course_id", get(course_access))
        // mentor approval surface
        .route("/api/mentors/:mentor_id/enrollments", get(mentor_enrollments))
        .route("/api/approvals/:enrollment_id/approve", post(approve_enrollment))
        .route("/api/approvals/:enrollment_id/reject", post(reject_enrollment))
        // student + notifications
        .route("/api/students/:student_id/courses", get(student_courses))
        .route("/api/users/:user_id/notifications", get(user_notifications))
        .route(
            "/api/notifications/:notification_id/read",
            post(mark_notification_read),
        )
        .with_state(state)
}

// --- catalog ---

async fn create_course(
    State(state): State<AppState>,
    Json(req): Json<CreateCourseReq>,
) -> Result<Json<Course>, (StatusCode, String)> {
    if req.title.trim().is_empty() {
        return Err(e400("title is required"));
    }
    let course = catalog::create_course(&state.db, &req).await.map_err(e500)?;
    Ok(Json(course))
}

async fn update_course(
    State(state): State<AppState>,
    Path(course_id): Path<String>,
    Json(req): Json<UpdateCourseReq>,
) -> Result<Json<Course>, (StatusCode, String)> {
    let updated = catalog::update_course(&state.db, &course_id, &req)
        .await
        .map_err(e500)?
        .ok_or_else(|| e404("course not found"))?;
    state.courses.invalidate(&course_id).await;
    Ok(Json(updated))
}

async fn get_course(
    State(state): State<AppState>,
    Path(course_id): Path<String>,
) -> Result<Json<Course>, (StatusCode, String)> {
    let course = state
        .courses
        .get(&state.db, &course_id)
        .await
        .map_err(e500)?
        .ok_or_else(|| e404("course not found"))?;
    Ok(Json(course))
}

async fn list_courses(
    State(state): State<AppState>,
) -> Result<Json<Vec<Course>>, (StatusCode, String)> {
    let courses = catalog::list_courses(&state.db).await.map_err(e500)?;
    Ok(Json(courses))
}

// --- enrollment lifecycle ---

async fn create_enrollment(
    State(state): State<AppState>,
    Json(req): Json<CreateEnrollmentReq>,
) -> Result<Json<Enrollment>, (StatusCode, String)> {
    if req.student_id.is_empty() || req.course_id.is_empty() {
        return Err(e400("student_id and course_id are required"));
    }
    if req.payment_proof_key.is_empty() {
        return Err(e400("payment_proof_key is required"));
    }

    let enrollment = enrollment::create_enrollment(&state.db, &req)
        .await
        .map_err(|e| match e {
            EnrollError::Duplicate => e409("enrollment already exists"),
            EnrollError::Db(err) => e500(err),
        })?;
    Ok(Json(enrollment))
}

/// Absence is a plain null, not an error; the player treats "no record yet"
/// as open access.
async fn get_enrollment(
    State(state): State<AppState>,
    Path((student_id, course_id)): Path<(String, String)>,
) -> Result<Json<Option<EnrollmentDetail>>, (StatusCode, String)> {
    let detail = enrollment::get_enrollment_detail(&state.db, &student_id, &course_id)
        .await
        .map_err(e500)?;
    Ok(Json(detail))
}

async fn update_progress(
    State(state): State<AppState>,
    Path((student_id, course_id)): Path<(String, String)>,
    Json(req): Json<ProgressUpdateReq>,
) -> Result<Json<Enrollment>, (StatusCode, String)> {
    let course = state
        .courses
        .get(&state.db, &course_id)
        .await
        .map_err(e500)?
        .ok_or_else(|| e404("course not found"))?;

    let updated =
        enrollment::update_progress(&state.db, &student_id, &course_id, &req, course.total_items())
            .await
            .map_err(e500)?
            .ok_or_else(|| e404("enrollment not found"))?;
    Ok(Json(updated))
}

async fn course_access(
    State(state): State<AppState>,
    Path((student_id, course_id)): Path<(String, String)>,
) -> Result<Json<AccessDecision>, (StatusCode, String)> {
    let record = enrollment::get_enrollment(&state.db, &student_id, &course_id)
        .await
        .map_err(e500)?;
    Ok(Json(CourseAccessState::evaluate(record.as_ref()).into()))
}

// --- mentor approval surface ---

async fn mentor_enrollments(
    State(state): State<AppState>,
    Path(mentor_id): Path<String>,
    Query(query): Query<MentorEnrollmentsQuery>,
) -> Result<Json<Vec<Enrollment>>, (StatusCode, String)> {
    let enrollments = enrollment::list_for_mentor(&state.db, &mentor_id, query.status)
        .await
        .map_err(e500)?;
    Ok(Json(enrollments))
}

async fn approve_enrollment(
    State(state): State<AppState>,
    Path(enrollment_id): Path<String>,
) -> Json<serde_json::Value> {
    // failures surface as ok=false; the mentor UI shows a generic message
    let ok = enrollment::approve(&state.db, &enrollment_id)
        .await
        .unwrap_or_else(|e| {
            tracing::error!(error=%e, enrollment=%enrollment_id, "approve failed");
            false
        });
    Json(serde_json::json!({ "ok": ok }))
}

async fn reject_enrollment(
    State(state): State<AppState>,
    Path(enrollment_id): Path<String>,
    Json(req): Json<RejectReq>,
) -> Json<serde_json::Value> {
    let ok = enrollment::reject(&state.db, &enrollment_id, &req.reason)
        .await
        .unwrap_or_else(|e| {
            tracing::error!(error=%e, enrollment=%enrollment_id, "reject failed");
            false
        });
    Json(serde_json::json!({ "ok": ok }))
}

// --- student + notifications ---

async fn student_courses(
    State(state): State<AppState>,
    Path(student_id): Path<String>,
) -> Result<Json<Vec<StudentCourse>>, (StatusCode, String)> {
    let courses = enrollment::list_student_courses(&state.db, &student_id)
        .await
        .map_err(e500)?;
    Ok(Json(courses))
}

async fn user_notifications(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<Notification>>, (StatusCode, String)> {
    let notifications = notify::list_for_user(&state.db, &user_id)
        .await
        .map_err(e500)?;
    Ok(Json(notifications))
}

async fn mark_notification_read(
    State(state): State<AppState>,
    Path(notification_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    let ok = notify::mark_read(&state.db, notification_id)
        .await
        .map_err(e500)?;
    Ok(Json(serde_json::json!({ "ok": ok })))
}

// --- helpers ---

fn e400<T: Into<String>>(msg: T) -> (StatusCode, String) {
    (StatusCode::BAD_REQUEST, msg.into())
}

fn e404<T: Into<String>>(msg: T) -> (StatusCode, String) {
    (StatusCode::NOT_FOUND, msg.into())
}

fn e409<T: Into<String>>(msg: T) -> (StatusCode, String) {
    (StatusCode::CONFLICT, msg.into())
}

fn e500<E: std::fmt::Display>(e: E) -> (StatusCode, String) {
    tracing::error!(error=%e, "internal error");
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}
