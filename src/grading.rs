use crate::models::{Materi, Submission};
use chrono::{DateTime, Utc};

/// User-facing grading state, derived purely from the submission record and
/// the materi's grading configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GradingStatus {
    /// No submission on record.
    NoSubmission,
    /// Submitted; grade and feedback both still absent.
    PendingGrading,
    /// Graded below the materi's passing grade (KKM).
    NeedsImprovement,
    /// Graded at or above the KKM, or graded on a materi with no KKM.
    Passed,
}

impl GradingStatus {
    pub fn label(&self) -> &'static str {
        match self {
            GradingStatus::NoSubmission => "Belum Dikerjakan",
            GradingStatus::PendingGrading => "Menunggu Penilaian",
            GradingStatus::NeedsImprovement => "Perlu Perbaikan",
            GradingStatus::Passed => "Selesai",
        }
    }
}

pub fn classify(submission: Option<&Submission>, materi: &Materi) -> GradingStatus {
    let Some(submission) = submission else {
        return GradingStatus::NoSubmission;
    };

    if submission.is_ungraded() {
        return GradingStatus::PendingGrading;
    }

    match (submission.grade, materi.passing_grade) {
        // No KKM configured: any graded submission counts as complete.
        (_, None) => GradingStatus::Passed,
        // Grade equal to the KKM passes.
        (Some(grade), Some(kkm)) if grade >= kkm => GradingStatus::Passed,
        (Some(_), Some(_)) => GradingStatus::NeedsImprovement,
        // Feedback written but grade still missing; not passing until the
        // grade lands.
        (None, Some(_)) => GradingStatus::NeedsImprovement,
    }
}

/// Whether the materi's deadline has passed. No deadline means never.
pub fn past_deadline(materi: &Materi, now: DateTime<Utc>) -> bool {
    materi.deadline.map(|deadline| now > deadline).unwrap_or(false)
}

/// Whether the upload form is available, and in what mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionWindow {
    /// First submission accepted.
    Open,
    /// Graded below the KKM and the deadline has not passed; a revision
    /// replaces the previous submission.
    RevisionOpen,
    /// Deadline passed without a passing submission; show the expiry notice
    /// instead of the form.
    Closed,
    /// A submission is awaiting grading; no new upload until it settles.
    AwaitingGrade,
    /// Passed. A passing submission is not revisable.
    Complete,
}

impl SubmissionWindow {
    pub fn accepts_upload(&self) -> bool {
        matches!(self, SubmissionWindow::Open | SubmissionWindow::RevisionOpen)
    }

    pub fn notice(&self) -> &'static str {
        match self {
            SubmissionWindow::Open => "Silahkan unggah jawaban Anda.",
            SubmissionWindow::RevisionOpen => {
                "Nilai Anda di bawah KKM. Silahkan unggah revisi jawaban Anda."
            }
            SubmissionWindow::Closed => "Waktu pengumpulan tugas telah berakhir.",
            SubmissionWindow::AwaitingGrade => "Jawaban Anda sedang dinilai. Mohon tunggu.",
            SubmissionWindow::Complete => "Tugas telah selesai dinilai.",
        }
    }
}

pub fn submission_window(status: GradingStatus, past_deadline: bool) -> SubmissionWindow {
    match (status, past_deadline) {
        (GradingStatus::Passed, _) => SubmissionWindow::Complete,
        (GradingStatus::PendingGrading, _) => SubmissionWindow::AwaitingGrade,
        (GradingStatus::NoSubmission, false) => SubmissionWindow::Open,
        (GradingStatus::NeedsImprovement, false) => SubmissionWindow::RevisionOpen,
        (GradingStatus::NoSubmission, true) | (GradingStatus::NeedsImprovement, true) => {
            SubmissionWindow::Closed
        }
    }
}
