use crate::api::PortalClient;
use crate::config::Config;
use crate::grading::{self, GradingStatus, SubmissionWindow};
use crate::models::{Materi, MateriDetail, Submission};
use crate::poller::SubmissionWatcher;
use crate::uploader::Uploader;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::path::Path;

/// An assignment together with everything the submission workflow derives
/// from it: grading status, deadline flag, and whether uploads are open.
pub struct AssignmentView {
    pub detail: MateriDetail,
    pub status: GradingStatus,
    pub past_deadline: bool,
    pub window: SubmissionWindow,
}

/// Derive the full view for one assignment at a given instant. Pure; the
/// clock is a parameter so deadline behavior is testable.
pub fn review(detail: MateriDetail, now: DateTime<Utc>) -> AssignmentView {
    let status = grading::classify(detail.my_submission.as_ref(), &detail.materi);
    let past_deadline = grading::past_deadline(&detail.materi, now);
    AssignmentView {
        status,
        past_deadline,
        window: grading::submission_window(status, past_deadline),
        detail,
    }
}

pub async fn load_assignment(client: &PortalClient, slug: &str) -> Result<AssignmentView> {
    let detail = client
        .get_materi(slug)
        .await
        .context(format!("Failed to load materi '{}'", slug))?;
    Ok(review(detail, Utc::now()))
}

/// Read the answer file and submit it. The submission window must be open;
/// callers decide that from the [`AssignmentView`] before getting here, but
/// the gate is enforced again so a stale view cannot slip an upload through.
pub async fn submit_answer(
    client: &PortalClient,
    config: &Config,
    view: &AssignmentView,
    path: &Path,
) -> Result<Submission> {
    if !view.window.accepts_upload() {
        anyhow::bail!("{}", view.window.notice());
    }

    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .context("File name is not valid UTF-8")?
        .to_string();
    let bytes = tokio::fs::read(path)
        .await
        .context(format!("Failed to read {}", path.display()))?;

    let uploader = Uploader::new(client.clone(), config.max_upload_bytes);
    let submission = uploader
        .submit(view.detail.materi.id, &file_name, bytes)
        .await?;
    Ok(submission)
}

/// Poll until the grading process settles the submission, then return the
/// graded record.
pub async fn watch_grading(
    client: &PortalClient,
    config: &Config,
    materi_id: u64,
    submission: Submission,
) -> Result<Submission> {
    let watcher = SubmissionWatcher::new(
        client.clone(),
        materi_id,
        config.poll_interval,
        Some(submission),
    );
    // The portal re-fetched the moment the page came into view; check once
    // right away instead of sitting out the first interval.
    watcher.refresh_handle().refresh();
    let watcher = watcher.run().await;
    watcher
        .submission()
        .cloned()
        .context("Submission was removed while waiting for grading")
}

/// Whether a submission arrived after the materi's deadline.
pub fn is_late(materi: &Materi, submission: &Submission) -> bool {
    materi
        .deadline
        .map(|deadline| submission.submitted_at > deadline)
        .unwrap_or(false)
}

/// Timestamp cell for the admin submission table, flagging late rows.
pub fn submitted_cell(materi: &Materi, submission: &Submission) -> String {
    let stamp = submission.submitted_at.format("%d %b %H:%M").to_string();
    if is_late(materi, submission) {
        format!("{} TERLAMBAT", stamp)
    } else {
        stamp
    }
}
