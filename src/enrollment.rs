use std::collections::HashMap;

use thiserror::Error;

use crate::db::Db;
use crate::models::{
    CreateEnrollmentReq, Enrollment, EnrollmentDetail, EnrollmentStatus, NotificationKind,
    ProgressKind, ProgressUpdateReq, StudentCourse,
};
use crate::notify;

#[derive(Error, Debug)]
pub enum EnrollError {
    #[error("enrollment already exists")]
    Duplicate,
    #[error(transparent)]
    Db(#[from] sqlx::Error),
}

/// Deterministic composite key; one record per (student, course) pair.
pub fn enrollment_key(student_id: &str, course_id: &str) -> String {
    format!("{student_id}_{course_id}")
}

/// Parse a display price such as "$19.99" into an amount. Missing or
/// non-numeric input becomes 0.
pub fn parse_price_display(price: Option<&str>) -> f64 {
    price
        .map(|p| p.trim().trim_start_matches('$'))
        .and_then(|p| p.parse::<f64>().ok())
        .unwrap_or(0.0)
}

/// Percent of curriculum items completed, rounded, clamped to [0, 100].
/// A course with no items reports 0.
pub fn progress_percent(completed_count: i64, total_items: i64) -> i32 {
    if total_items <= 0 {
        return 0;
    }
    let pct = (completed_count as f64 / total_items as f64 * 100.0).round() as i32;
    pct.clamp(0, 100)
}

pub fn approval_message(course_name: &str) -> String {
    format!("Your enrollment for {course_name} has been approved.")
}

pub fn rejection_message(course_name: &str, reason: &str) -> String {
    format!("Your enrollment for {course_name} was rejected. Reason: {reason}")
}

pub async fn create_enrollment(
    db: &Db,
    req: &CreateEnrollmentReq,
) -> Result<Enrollment, EnrollError> {
    let id = enrollment_key(&req.student_id, &req.course_id);

    // double-submission guard; the pre-check is advisory (the primary key
    // decides if it cannot run or two submissions race past it)
    match sqlx::query("SELECT 1 FROM enrollments WHERE id = $1")
        .bind(&id)
        .fetch_optional(db)
        .await
    {
        Ok(Some(_)) => return Err(EnrollError::Duplicate),
        Ok(None) => {}
        Err(e) => tracing::warn!(error=%e, enrollment=%id, "duplicate check failed, proceeding"),
    }

    let price = parse_price_display(req.course_price.as_deref());

    let enrollment = sqlx::query_as::<_, Enrollment>(
        r#"
        INSERT INTO enrollments
            (id, student_id, student_name, course_id, course_name, course_price,
             mentor_id, payment_proof_key, status)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 'pending')
        RETURNING *
        "#,
    )
    .bind(&id)
    .bind(&req.student_id)
    .bind(&req.student_name)
    .bind(&req.course_id)
    .bind(&req.course_name)
    .bind(price)
    .bind(&req.mentor_id)
    .bind(&req.payment_proof_key)
    .fetch_one(db)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => EnrollError::Duplicate,
        other => EnrollError::Db(other),
    })?;

    // independent denormalized write; must not fail the enrollment
    if let Err(e) = sqlx::query(
        r#"
        INSERT INTO student_courses (student_id, course_id, progress)
        VALUES ($1, $2, 0)
        ON CONFLICT (student_id, course_id) DO NOTHING
        "#,
    )
    .bind(&req.student_id)
    .bind(&req.course_id)
    .execute(db)
    .await
    {
        tracing::warn!(error=%e, enrollment=%enrollment.id, "student course stub write failed");
    }

    Ok(enrollment)
}

pub async fn get_enrollment(
    db: &Db,
    student_id: &str,
    course_id: &str,
) -> sqlx::Result<Option<Enrollment>> {
    sqlx::query_as::<_, Enrollment>("SELECT * FROM enrollments WHERE id = $1")
        .bind(enrollment_key(student_id, course_id))
        .fetch_optional(db)
        .await
}

#[derive(sqlx::FromRow)]
struct ProgressItemRow {
    kind: ProgressKind,
    item_id: String,
    submission_key: Option<String>,
    score: Option<i32>,
}

/// Point lookup plus the merged progress maps the player renders from.
pub async fn get_enrollment_detail(
    db: &Db,
    student_id: &str,
    course_id: &str,
) -> sqlx::Result<Option<EnrollmentDetail>> {
    let Some(enrollment) = get_enrollment(db, student_id, course_id).await? else {
        return Ok(None);
    };

    let items = sqlx::query_as::<_, ProgressItemRow>(
        "SELECT kind, item_id, submission_key, score FROM progress_items WHERE enrollment_id = $1",
    )
    .bind(&enrollment.id)
    .fetch_all(db)
    .await?;

    let mut completed_videos = Vec::new();
    let mut assignment_submissions = HashMap::new();
    let mut quiz_scores = HashMap::new();
    for item in items {
        match item.kind {
            ProgressKind::Video => completed_videos.push(item.item_id),
            ProgressKind::Assignment => {
                assignment_submissions
                    .insert(item.item_id, item.submission_key.unwrap_or_default());
            }
            ProgressKind::Quiz => {
                quiz_scores.insert(item.item_id, item.score.unwrap_or(0));
            }
        }
    }

    Ok(Some(EnrollmentDetail {
        enrollment,
        completed_videos,
        assignment_submissions,
        quiz_scores,
    }))
}

pub async fn list_for_mentor(
    db: &Db,
    mentor_id: &str,
    status: EnrollmentStatus,
) -> sqlx::Result<Vec<Enrollment>> {
    sqlx::query_as::<_, Enrollment>("SELECT * FROM enrollments WHERE mentor_id = $1 AND status = $2")
        .bind(mentor_id)
        .bind(status)
        .fetch_all(db)
        .await
}

pub async fn list_student_courses(db: &Db, student_id: &str) -> sqlx::Result<Vec<StudentCourse>> {
    sqlx::query_as::<_, StudentCourse>("SELECT * FROM student_courses WHERE student_id = $1")
        .bind(student_id)
        .fetch_all(db)
        .await
}

/// Merge newly completed items into the record and recompute the progress
/// percentage against `total_items` from the course catalog. Returns the
/// updated record, or None when no enrollment exists for the pair.
pub async fn update_progress(
    db: &Db,
    student_id: &str,
    course_id: &str,
    req: &ProgressUpdateReq,
    total_items: i64,
) -> sqlx::Result<Option<Enrollment>> {
    let id = enrollment_key(student_id, course_id);

    let exists = sqlx::query("SELECT 1 FROM enrollments WHERE id = $1")
        .bind(&id)
        .fetch_optional(db)
        .await?
        .is_some();
    if !exists {
        return Ok(None);
    }

    for video_id in &req.completed_videos {
        sqlx::query(
            r#"
            INSERT INTO progress_items (enrollment_id, kind, item_id)
            VALUES ($1, 'video', $2)
            ON CONFLICT (enrollment_id, kind, item_id)
            DO UPDATE SET updated_at = now()
            "#,
        )
        .bind(&id)
        .bind(video_id)
        .execute(db)
        .await?;
    }

    for (assignment_id, submission_key) in &req.assignment_submissions {
        sqlx::query(
            r#"
            INSERT INTO progress_items (enrollment_id, kind, item_id, submission_key)
            VALUES ($1, 'assignment', $2, $3)
            ON CONFLICT (enrollment_id, kind, item_id)
            DO UPDATE SET submission_key = EXCLUDED.submission_key, updated_at = now()
            "#,
        )
        .bind(&id)
        .bind(assignment_id)
        .bind(submission_key)
        .execute(db)
        .await?;
    }

    for (quiz_id, score) in &req.quiz_scores {
        sqlx::query(
            r#"
            INSERT INTO progress_items (enrollment_id, kind, item_id, score)
            VALUES ($1, 'quiz', $2, $3)
            ON CONFLICT (enrollment_id, kind, item_id)
            DO UPDATE SET score = EXCLUDED.score, updated_at = now()
            "#,
        )
        .bind(&id)
        .bind(quiz_id)
        .bind(score)
        .execute(db)
        .await?;
    }

    let completed_count =
        sqlx::query_scalar::<_, i64>("SELECT count(*) FROM progress_items WHERE enrollment_id = $1")
            .bind(&id)
            .fetch_one(db)
            .await?;

    let progress = progress_percent(completed_count, total_items);
    let completed = progress == 100;

    let updated = sqlx::query_as::<_, Enrollment>(
        r#"
        UPDATE enrollments
        SET progress = $2, completed = $3, updated_at = now()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(&id)
    .bind(progress)
    .bind(completed)
    .fetch_one(db)
    .await?;

    Ok(Some(updated))
}

/// pending -> approved. Missing or already-terminal records return false and
/// produce no notification.
pub async fn approve(db: &Db, enrollment_id: &str) -> sqlx::Result<bool> {
    let Some(updated) = sqlx::query_as::<_, Enrollment>(
        r#"
        UPDATE enrollments
        SET status = 'approved', approved_at = now(), updated_at = now()
        WHERE id = $1 AND status = 'pending'
        RETURNING *
        "#,
    )
    .bind(enrollment_id)
    .fetch_optional(db)
    .await?
    else {
        return Ok(false);
    };

    // fire-and-forget; the transition stands even if the notification fails
    if let Err(e) = notify::create(
        db,
        &updated.student_id,
        "Enrollment Approved",
        &approval_message(&updated.course_name),
        NotificationKind::Success,
    )
    .await
    {
        tracing::warn!(error=%e, enrollment=%updated.id, "approval notification failed");
    }

    Ok(true)
}

/// pending -> rejected, with the mentor's reason stored on the record.
pub async fn reject(db: &Db, enrollment_id: &str, reason: &str) -> sqlx::Result<bool> {
    let Some(updated) = sqlx::query_as::<_, Enrollment>(
        r#"
        UPDATE enrollments
        SET status = 'rejected', rejection_reason = $2, rejected_at = now(), updated_at = now()
        WHERE id = $1 AND status = 'pending'
        RETURNING *
        "#,
    )
    .bind(enrollment_id)
    .bind(reason)
    .fetch_optional(db)
    .await?
    else {
        return Ok(false);
    };

    if let Err(e) = notify::create(
        db,
        &updated.student_id,
        "Enrollment Rejected",
        &rejection_message(&updated.course_name, reason),
        NotificationKind::Error,
    )
    .await
    {
        tracing::warn!(error=%e, enrollment=%updated.id, "rejection notification failed");
    }

    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn composite_key_is_deterministic() {
        assert_eq!(enrollment_key("S1", "C1"), "S1_C1");
        assert_eq!(enrollment_key("S1", "C1"), enrollment_key("S1", "C1"));
    }

    #[test]
    fn price_strips_currency_symbol() {
        assert_eq!(parse_price_display(Some("$19.99")), 19.99);
        assert_eq!(parse_price_display(Some("12.5")), 12.5);
    }

    #[test]
    fn price_defaults_to_zero() {
        assert_eq!(parse_price_display(None), 0.0);
        assert_eq!(parse_price_display(Some("")), 0.0);
        assert_eq!(parse_price_display(Some("Free")), 0.0);
    }

    #[test]
    fn progress_rounds_to_nearest_percent() {
        assert_eq!(progress_percent(1, 3), 33);
        assert_eq!(progress_percent(2, 3), 67);
        assert_eq!(progress_percent(5, 10), 50);
    }

    #[test]
    fn progress_clamps_to_valid_range() {
        // more completed items than the catalog counts must not exceed 100
        assert_eq!(progress_percent(15, 10), 100);
        assert_eq!(progress_percent(0, 10), 0);
    }

    #[test]
    fn empty_course_reports_zero_progress() {
        assert_eq!(progress_percent(0, 0), 0);
        assert_eq!(progress_percent(3, 0), 0);
    }

    #[test]
    fn full_completion_is_exactly_one_hundred() {
        assert_eq!(progress_percent(10, 10), 100);
        assert_eq!(progress_percent(9, 10), 90);
    }

    #[test]
    fn approval_message_names_the_course() {
        assert_eq!(
            approval_message("Complete Python Bootcamp"),
            "Your enrollment for Complete Python Bootcamp has been approved."
        );
    }

    #[test]
    fn rejection_message_embeds_reason_verbatim() {
        let message = rejection_message("Machine Learning A-Z", "screenshot is blurry");
        assert_eq!(
            message,
            "Your enrollment for Machine Learning A-Z was rejected. Reason: screenshot is blurry"
        );
        assert!(message.contains("screenshot is blurry"));
    }
}
