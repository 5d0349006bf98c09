use crate::infra::{assignment_service, open_store};
use clap::Args;
use peer_tutor::assignments::{
    AssignmentDecision, AssignmentRequest, AssignmentServiceError, CatalogImporter,
    ImportSummary, Rejection, RosterSnapshot,
};
use peer_tutor::config::AppConfig;
use peer_tutor::error::AppError;
use std::fmt::Write as _;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub(crate) struct AssignArgs {
    /// Peer tutor first name, matched exactly
    #[arg(long)]
    pub(crate) first_name: String,
    /// Peer tutor last name, matched exactly
    #[arg(long)]
    pub(crate) last_name: String,
    /// Course code to assign, e.g. CS101
    #[arg(long)]
    pub(crate) course_code: String,
}

#[derive(Args, Debug)]
pub(crate) struct RosterArgs {
    /// Course code whose roster should be listed
    #[arg(long)]
    pub(crate) course_code: String,
}

#[derive(Args, Debug)]
pub(crate) struct ImportArgs {
    /// Directory holding courses.csv, students.csv, enrollments.csv, grades.csv, tutors.csv
    #[arg(long)]
    pub(crate) dir: PathBuf,
}

pub(crate) fn run_assign(args: AssignArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let service = assignment_service(&config, open_store(&config)?);
    let request = AssignmentRequest::new(args.first_name, args.last_name, args.course_code);

    let (output, result) = settle_assignment(&request, service.assign(&request));
    print!("{output}");
    result
}

pub(crate) fn run_roster(args: RosterArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let service = assignment_service(&config, open_store(&config)?);
    let roster = service.roster(&args.course_code)?;
    print!("{}", render_roster(&roster));
    Ok(())
}

/// Text to print for an assignment attempt, and whether the command succeeded.
pub(crate) fn settle_assignment(
    request: &AssignmentRequest,
    outcome: Result<AssignmentDecision, AssignmentServiceError>,
) -> (String, Result<(), AppError>) {
    match outcome {
        Ok(AssignmentDecision::Assigned(roster)) => (render_roster(&roster), Ok(())),
        Ok(AssignmentDecision::Rejected(rejection)) => (
            render_rejection(request, &rejection),
            Err(AppError::Rejected(rejection.reason())),
        ),
        Err(err) => (String::new(), Err(err.into())),
    }
}

pub(crate) fn run_import(args: ImportArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let store = open_store(&config)?;
    let summary = CatalogImporter::import_dir(&store, &args.dir)?;
    print!("{}", render_import_summary(&args.dir, &summary));
    Ok(())
}

/// Echo the fields relevant to the failed gate, then the error line.
pub(crate) fn render_rejection(request: &AssignmentRequest, rejection: &Rejection) -> String {
    let mut out = String::new();
    let first_name = request.first_name.trim();
    let last_name = request.last_name.trim();
    let course_code = request.course_code.trim();

    match rejection {
        Rejection::NotRegistered => {
            let _ = writeln!(out, "- Last name: {last_name}");
            let _ = writeln!(out, "- First name: {first_name}");
        }
        Rejection::InvalidCourse => {
            let _ = writeln!(out, "- Course code: {course_code}");
        }
        _ => {
            let _ = writeln!(out, "- Last name: {last_name}");
            let _ = writeln!(out, "- First name: {first_name}");
            let _ = writeln!(out, "- Course code: {course_code}");
        }
    }

    let _ = writeln!(
        out,
        "Error [{}]: {}",
        rejection.reason().code(),
        rejection.summary()
    );
    out
}

pub(crate) fn render_roster(roster: &RosterSnapshot) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Peer tutors for {}", roster.course_code);

    if roster.tutors.is_empty() {
        let _ = writeln!(out, "  (no peer tutors assigned)");
        return out;
    }

    let _ = writeln!(out, "{:>8} | {:<20} | {:<20}", "Tutor ID", "Last Name", "First Name");
    for tutor in &roster.tutors {
        let _ = writeln!(
            out,
            "{:>8} | {:<20} | {:<20}",
            tutor.id.0, tutor.last_name, tutor.first_name
        );
    }
    out
}

fn render_import_summary(dir: &std::path::Path, summary: &ImportSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Imported catalog from {}", dir.display());
    let _ = writeln!(out, "- courses: {}", summary.courses);
    let _ = writeln!(out, "- students: {}", summary.students);
    let _ = writeln!(out, "- enrollments: {}", summary.enrollments);
    let _ = writeln!(out, "- grades: {}", summary.grades);
    let _ = writeln!(out, "- tutors: {}", summary.tutors);
    out
}
