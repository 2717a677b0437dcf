mod api;
mod config;
mod error;
mod export;
mod fetcher;
mod grading;
mod models;
mod poller;
mod session;
mod uploader;

use anyhow::{Context, Result};
use api::PortalClient;
use clap::{Parser, Subcommand};
use config::Config;
use error::ApiError;
use grading::GradingStatus;
use session::Session;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "materi-fetcher", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Log in to the portal and store the session
    Login {
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Clear the stored session
    Logout,
    /// List learning materials
    Materi,
    /// List assignments you have not done yet
    Tasks,
    /// Show one assignment and your submission status
    Status { slug: String },
    /// Upload an answer file for an assignment
    Submit {
        slug: String,
        file: PathBuf,
        /// Keep polling until the AI grading finishes
        #[arg(long)]
        watch: bool,
    },
    /// Poll an ungraded submission until it is graded
    Watch { slug: String },
    /// (admin) List all submissions for a materi, marking late ones
    Submissions { slug: String },
    /// (admin) Delete a submission, resetting the student's status
    DeleteSubmission { id: u64 },
    /// (admin) List class rooms
    Classes,
    /// Export a class grade recap to CSV
    Recap { class_id: u64 },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("materi_fetcher=info")),
        )
        .init();

    let cli = Cli::parse();

    // Load configuration
    let config = Config::load().context("Failed to load configuration")?;
    let session = Session::load(&config.session_file)?;

    let result = run(&cli.command, &config, session).await;

    // A 401 anywhere means the stored token is dead: drop it so the next
    // invocation starts from the login prompt, like the portal's redirect.
    if let Err(err) = &result {
        let unauthorized = err
            .chain()
            .any(|cause| matches!(cause.downcast_ref::<ApiError>(), Some(ApiError::Unauthorized)));
        if unauthorized {
            Session::clear(&config.session_file)?;
            eprintln!("{}", ApiError::Unauthorized);
            std::process::exit(1);
        }
    }

    result
}

async fn run(command: &Command, config: &Config, session: Option<Session>) -> Result<()> {
    let token = session.as_ref().map(|s| s.token.clone());
    let client = PortalClient::new(config.base_url.clone(), token);

    match command {
        Command::Login { email, password } => {
            let response = client.login(email, password).await?;
            let session = Session {
                token: response.access_token,
                user: response.user,
            };
            session.save(&config.session_file)?;
            println!("Selamat datang kembali, {}", session.user.name);
        }
        Command::Logout => {
            Session::clear(&config.session_file)?;
            println!("Sesi dihapus.");
        }
        Command::Materi => {
            let materis = client.list_materi().await?;
            if materis.is_empty() {
                println!("Belum ada materi pembelajaran yang tersedia.");
                return Ok(());
            }
            for materi in &materis {
                let status = if materi.needs_improvement {
                    "Perlu Perbaikan"
                } else if materi.is_submitted {
                    "Selesai"
                } else {
                    "Belum Dikerjakan"
                };
                let kkm = materi
                    .passing_grade
                    .map(|kkm| format!("  KKM: {}", kkm))
                    .unwrap_or_default();
                println!("{:<30} {:<18} {}{}", materi.slug, status, materi.title, kkm);
            }
        }
        Command::Tasks => {
            let tasks = client.pending_tasks().await?;
            if tasks.is_empty() {
                println!("Tidak ada tugas tertunda.");
                return Ok(());
            }
            println!("{} tugas belum dikerjakan:", tasks.len());
            for task in &tasks {
                let deadline = task
                    .deadline
                    .map(|d| d.format("%d %b %Y %H:%M").to_string())
                    .unwrap_or_else(|| "tanpa tenggat".to_string());
                let kkm = task
                    .passing_grade
                    .map(|kkm| format!("  KKM: {}", kkm))
                    .unwrap_or_default();
                println!("  {:<30} {:<24} deadline: {}{}", task.slug, task.title, deadline, kkm);
            }
        }
        Command::Status { slug } => {
            let view = fetcher::load_assignment(&client, slug).await?;
            print_status(&client, &view);
        }
        Command::Submit { slug, file, watch } => {
            let view = fetcher::load_assignment(&client, slug).await?;
            if !view.window.accepts_upload() {
                println!("{}", view.window.notice());
                return Ok(());
            }
            let submission = fetcher::submit_answer(&client, config, &view, file).await?;
            println!(
                "Jawaban terkirim ({}). Menunggu penilaian.",
                submission.file_name()
            );
            if *watch {
                let graded =
                    fetcher::watch_grading(&client, config, view.detail.materi.id, submission)
                        .await?;
                print_grade(&graded, &view.detail.materi);
            }
        }
        Command::Watch { slug } => {
            let view = fetcher::load_assignment(&client, slug).await?;
            match view.status {
                GradingStatus::NoSubmission => {
                    println!("Belum ada jawaban untuk materi ini.");
                }
                GradingStatus::PendingGrading => {
                    let submission = view
                        .detail
                        .my_submission
                        .clone()
                        .context("Pending status without a submission record")?;
                    println!("Menunggu penilaian...");
                    let graded =
                        fetcher::watch_grading(&client, config, view.detail.materi.id, submission)
                            .await?;
                    print_grade(&graded, &view.detail.materi);
                }
                _ => {
                    if let Some(submission) = view.detail.my_submission.as_ref() {
                        print_grade(submission, &view.detail.materi);
                    }
                }
            }
        }
        Command::Submissions { slug } => {
            // The deadline comes with the materi detail; it decides which
            // rows get the late marker.
            let detail = client.get_materi(slug).await?;
            let materi = &detail.materi;
            let submissions = client.list_submissions(materi.id).await?;
            if submissions.is_empty() {
                println!("Belum ada siswa yang mengumpulkan tugas.");
                return Ok(());
            }
            println!("Materi: {}", materi.title);
            println!(
                "{:<24} {:<12} {:<28} {:<8} file",
                "Siswa", "NISN", "Dikumpulkan", "Nilai"
            );
            for sub in &submissions {
                let (name, nisn) = sub
                    .user
                    .as_ref()
                    .map(|u| (u.name.as_str(), u.nisn.as_deref().unwrap_or("-")))
                    .unwrap_or(("-", "-"));
                let grade = sub
                    .grade
                    .map(|g| g.to_string())
                    .unwrap_or_else(|| "-".to_string());
                println!(
                    "{:<24} {:<12} {:<28} {:<8} {}",
                    name,
                    nisn,
                    fetcher::submitted_cell(materi, sub),
                    grade,
                    client.storage_url(&sub.file_path)
                );
            }
        }
        Command::DeleteSubmission { id } => {
            client.delete_submission(*id).await?;
            println!("Submission {} dihapus. Status siswa direset.", id);
        }
        Command::Classes => {
            let classes = client.class_rooms().await?;
            if classes.is_empty() {
                println!("Belum ada kelas.");
                return Ok(());
            }
            for class in &classes {
                println!("{:<6} {}", class.id, class.name);
            }
        }
        Command::Recap { class_id } => {
            let recap = client.grade_recap(*class_id).await?;
            let path = export::export_grade_recap(&recap)
                .context("Failed to export grade recap")?;
            println!("Rekap nilai kelas {} ditulis ke {}", recap.class_room.name, path.display());
        }
    }

    Ok(())
}

fn print_status(client: &PortalClient, view: &fetcher::AssignmentView) {
    let materi = &view.detail.materi;
    println!("{} ({})", materi.title, materi.slug);
    if let Some(author) = &materi.user {
        let written = materi
            .created_at
            .map(|d| format!(", {}", d.format("%d %b %Y")))
            .unwrap_or_default();
        println!("Ditulis oleh {}{}", author.name, written);
    }
    if !materi.content.is_empty() {
        println!("\n{}\n", materi.content);
    }
    if let Some(kkm) = materi.passing_grade {
        println!("KKM: {}", kkm);
    }
    if let Some(deadline) = materi.deadline {
        let marker = if view.past_deadline { " (terlewat)" } else { "" };
        println!("Deadline: {}{}", deadline.format("%d %b %Y %H:%M"), marker);
    }
    println!("Status: {}", view.status.label());
    if let Some(submission) = &view.detail.my_submission {
        println!("File: {}", client.storage_url(&submission.file_path));
        print_grade(submission, materi);
    }
    println!("{}", view.window.notice());
}

fn print_grade(submission: &models::Submission, materi: &models::Materi) {
    match submission.grade {
        Some(grade) => {
            let verdict = grading::classify(Some(submission), materi);
            println!("Nilai: {} ({})", grade, verdict.label());
        }
        None => println!("Belum dinilai."),
    }
    if let Some(feedback) = submission
        .feedback
        .as_deref()
        .filter(|f| !f.trim().is_empty())
    {
        println!("Feedback: {}", feedback);
    }
}
