// Read-time gate deciding whether the course player may render media.

use serde::Serialize;

use crate::models::{Enrollment, EnrollmentStatus};

/// Access state of a (student, course) pair, derived from the enrollment
/// record at read time. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CourseAccessState {
    /// no enrollment flow entered; courses default open
    NoRecord,
    Pending,
    Approved,
    Rejected(String),
}

impl CourseAccessState {
    pub fn evaluate(enrollment: Option<&Enrollment>) -> Self {
        match enrollment {
            None => CourseAccessState::NoRecord,
            Some(e) => match e.status {
                EnrollmentStatus::Pending => CourseAccessState::Pending,
                EnrollmentStatus::Approved => CourseAccessState::Approved,
                EnrollmentStatus::Rejected => {
                    CourseAccessState::Rejected(e.rejection_reason.clone().unwrap_or_default())
                }
            },
        }
    }

    pub fn allowed(&self) -> bool {
        matches!(
            self,
            CourseAccessState::NoRecord | CourseAccessState::Approved
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CourseAccessState::NoRecord => "no-record",
            CourseAccessState::Pending => "pending",
            CourseAccessState::Approved => "approved",
            CourseAccessState::Rejected(_) => "rejected",
        }
    }
}

/// Wire form of the gate decision. A locked state exposes only the status
/// string and, if rejected, the stored reason.
#[derive(Serialize, Debug, Clone)]
pub struct AccessDecision {
    pub allowed: bool,
    pub state: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl From<CourseAccessState> for AccessDecision {
    fn from(state: CourseAccessState) -> Self {
        let allowed = state.allowed();
        let reason = match &state {
            CourseAccessState::Rejected(reason) => Some(reason.clone()),
            _ => None,
        };
        AccessDecision {
            allowed,
            state: state.as_str(),
            reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn enrollment_with(status: EnrollmentStatus, reason: Option<&str>) -> Enrollment {
        Enrollment {
            id: "s1_c1".into(),
            student_id: "s1".into(),
            student_name: "Avery Lee".into(),
            course_id: "c1".into(),
            course_name: "Complete Python Bootcamp".into(),
            course_price: 19.99,
            mentor_id: "m1".into(),
            payment_proof_key: "payments/s1/screenshots/proof.png".into(),
            status,
            progress: 0,
            completed: false,
            rejection_reason: reason.map(|r| r.to_string()),
            enrolled_at: Utc::now(),
            updated_at: Utc::now(),
            approved_at: None,
            rejected_at: None,
        }
    }

    #[test]
    fn no_record_is_allowed() {
        let state = CourseAccessState::evaluate(None);
        assert_eq!(state, CourseAccessState::NoRecord);
        assert!(state.allowed());
    }

    #[test]
    fn approved_is_allowed() {
        let e = enrollment_with(EnrollmentStatus::Approved, None);
        let state = CourseAccessState::evaluate(Some(&e));
        assert_eq!(state, CourseAccessState::Approved);
        assert!(state.allowed());
    }

    #[test]
    fn pending_is_denied() {
        let e = enrollment_with(EnrollmentStatus::Pending, None);
        let state = CourseAccessState::evaluate(Some(&e));
        assert_eq!(state, CourseAccessState::Pending);
        assert!(!state.allowed());
    }

    #[test]
    fn rejected_is_denied_and_carries_reason() {
        let e = enrollment_with(EnrollmentStatus::Rejected, Some("screenshot unreadable"));
        let state = CourseAccessState::evaluate(Some(&e));
        assert_eq!(
            state,
            CourseAccessState::Rejected("screenshot unreadable".into())
        );
        assert!(!state.allowed());
    }

    #[test]
    fn decision_exposes_only_status_and_reason() {
        let e = enrollment_with(EnrollmentStatus::Rejected, Some("wrong amount"));
        let decision = AccessDecision::from(CourseAccessState::evaluate(Some(&e)));
        assert!(!decision.allowed);
        assert_eq!(decision.state, "rejected");
        assert_eq!(decision.reason.as_deref(), Some("wrong amount"));

        let decision = AccessDecision::from(CourseAccessState::evaluate(None));
        assert!(decision.allowed);
        assert_eq!(decision.state, "no-record");
        assert_eq!(decision.reason, None);
    }
}
