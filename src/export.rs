use crate::models::GradeRecap;
use anyhow::{Context, Result};
use chrono::Utc;
use std::path::PathBuf;

/// Export a class grade recap to a CSV file in the working directory.
/// Columns follow the backend's materi order; a missing grade is written as
/// "Belum" (not yet graded/submitted).
pub fn export_grade_recap(recap: &GradeRecap) -> Result<PathBuf> {
    if recap.students.is_empty() {
        anyhow::bail!("No students in this class to export");
    }

    // Generate filename with timestamp
    let timestamp = Utc::now().format("%Y%m%d_%H%M%S");
    let class_name = recap.class_room.name.replace(char::is_whitespace, "_");
    let filename = format!("Rekap_Nilai_{}_{}.csv", class_name, timestamp);
    let filepath = PathBuf::from(&filename);

    // Build CSV headers
    let mut headers = vec!["Nama Siswa".to_string(), "NISN".to_string()];
    headers.extend(recap.materis.iter().map(|m| m.title.clone()));

    let mut wtr = csv::Writer::from_path(&filepath).context("Failed to create CSV file")?;

    wtr.write_record(&headers)
        .context("Failed to write CSV headers")?;

    for student in &recap.students {
        let mut record = vec![
            student.name.clone(),
            student.nisn.clone().unwrap_or_else(|| "-".to_string()),
        ];

        for materi in &recap.materis {
            let cell = student
                .grades
                .get(&materi.id.to_string())
                .copied()
                .flatten()
                .map(|grade| grade.to_string())
                .unwrap_or_else(|| "Belum".to_string());
            record.push(cell);
        }

        wtr.write_record(&record)
            .context("Failed to write CSV record")?;
    }

    wtr.flush().context("Failed to flush CSV writer")?;

    Ok(filepath)
}
