//! Course list and visibility handlers.

use serde::Serialize;
use tabled::Tabled;

use lsdash_core::{Course, CourseId, Session};

use crate::cli::{CoursesArgs, CoursesCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Serialize)]
struct CourseView {
    id: CourseId,
    code: String,
    title: String,
    hidden: bool,
}

#[derive(Tabled)]
struct CourseRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Code")]
    code: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Hidden")]
    hidden: &'static str,
}

fn row(c: &CourseView) -> CourseRow {
    CourseRow {
        id: c.id.to_string(),
        code: c.code.clone(),
        title: c.title.clone(),
        hidden: if c.hidden { "yes" } else { "" },
    }
}

fn view(course: &Course, hidden: bool) -> CourseView {
    CourseView {
        id: course.id.clone(),
        code: course.code.clone(),
        title: course.title.clone(),
        hidden,
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(session: &Session, args: CoursesArgs, global: &GlobalOpts) -> Result<(), CliError> {
    super::synced(session).await?;
    match args.command.unwrap_or(CoursesCommand::List) {
        CoursesCommand::List => {
            let courses = session
                .with_user_data(|d| {
                    d.courses
                        .iter()
                        .map(|c| view(c, false))
                        .chain(d.hidden_courses.iter().map(|c| view(c, true)))
                        .collect::<Vec<_>>()
                })
                .await
                .unwrap_or_default();
            let out = output::render_list(global.output, &courses, row, |c| {
                format!("{}\t{}", c.id, c.title)
            })?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        CoursesCommand::Hide { id } => {
            session.set_course_hidden(&CourseId::from(id.as_str()), true).await?;
            output::status(&format!("Course {id} hidden"), global.quiet);
            Ok(())
        }

        CoursesCommand::Show { id } => {
            session.set_course_hidden(&CourseId::from(id.as_str()), false).await?;
            output::status(&format!("Course {id} visible"), global.quiet);
            Ok(())
        }
    }
}
