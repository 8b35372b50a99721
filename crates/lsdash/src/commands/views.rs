//! Dashboard views: due items, activity, grades, announcements.
//!
//! Each view syncs first, then renders one slice of the model across the
//! visible courses. Dates are shown in the course's time zone.

use serde::Serialize;
use tabled::Tabled;

use lsdash_core::{CourseId, Session, UserData};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

/// Synced model plus the course label lookup every view needs.
async fn load(session: &Session) -> Result<UserData, CliError> {
    super::synced(session).await?;
    session.user_data().await.ok_or(CliError::NotLoggedIn)
}

fn course_label(data: &UserData, id: &CourseId) -> String {
    data.course(id).map_or_else(
        || id.to_string(),
        |c| if c.code.is_empty() { c.title.clone() } else { c.code.clone() },
    )
}

async fn local_date(session: &Session, id: &CourseId, raw: Option<&str>) -> String {
    match raw {
        Some(raw) => session.convert_course_date(id, raw, true).await,
        None => String::new(),
    }
}

// ── Due ─────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct DueItem {
    course_id: CourseId,
    course: String,
    title: String,
    due: String,
    opens: String,
    is_new: bool,
}

#[derive(Tabled)]
struct DueRow {
    #[tabled(rename = "Course")]
    course: String,
    #[tabled(rename = "Item")]
    title: String,
    #[tabled(rename = "Due")]
    due: String,
    #[tabled(rename = "Opens")]
    opens: String,
    #[tabled(rename = "")]
    marker: String,
}

pub async fn due(session: &Session, global: &GlobalOpts) -> Result<(), CliError> {
    let data = load(session).await?;
    if let Some(window) = session.search_window() {
        output::status(
            &format!("Due between {} and {}", window.start, window.end),
            global.quiet,
        );
    }
    let mut items = Vec::new();
    for course in &data.courses {
        for event in data.upcoming_events_for(&course.id) {
            items.push(DueItem {
                course_id: course.id.clone(),
                course: course_label(&data, &course.id),
                title: event.title.clone(),
                due: local_date(session, &course.id, event.due_date().or(event.when.as_deref()))
                    .await,
                opens: local_date(session, &course.id, event.access_start()).await,
                is_new: !event.can_access_before_start() && session.is_new(event.access_start()),
            });
        }
    }

    let color = output::should_color(global.color);
    let out = output::render_list(
        global.output,
        &items,
        |i| DueRow {
            course: i.course.clone(),
            title: i.title.clone(),
            due: i.due.clone(),
            opens: i.opens.clone(),
            marker: output::new_marker(i.is_new, color),
        },
        |i| format!("{}\t{}\t{}", i.course_id, i.due, i.title),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

// ── Activity ────────────────────────────────────────────────────────

#[derive(Serialize)]
struct ActivityItem {
    course_id: CourseId,
    course: String,
    actor: String,
    kind: String,
    title: String,
    posted: String,
    posted_at: String,
    is_new: bool,
}

#[derive(Tabled)]
struct ActivityRow {
    #[tabled(rename = "Course")]
    course: String,
    #[tabled(rename = "Who")]
    actor: String,
    #[tabled(rename = "What")]
    title: String,
    #[tabled(rename = "Posted")]
    posted: String,
    #[tabled(rename = "")]
    marker: String,
}

pub async fn activity(session: &Session, global: &GlobalOpts) -> Result<(), CliError> {
    let data = load(session).await?;
    let mut items = Vec::new();
    for course in &data.courses {
        for h in data.happenings_for(&course.id) {
            items.push(ActivityItem {
                course_id: course.id.clone(),
                course: course_label(&data, &course.id),
                actor: h.actor.title.clone().unwrap_or_default(),
                kind: h.object.object_type.clone().unwrap_or_default(),
                title: h.object.title.clone().unwrap_or_default(),
                posted: local_date(session, &course.id, Some(h.posted_time.as_str())).await,
                is_new: session.is_new(Some(h.posted_time.as_str())),
                posted_at: h.posted_time.clone(),
            });
        }
    }
    items.sort_by(|a, b| b.posted_at.cmp(&a.posted_at));

    let color = output::should_color(global.color);
    let out = output::render_list(
        global.output,
        &items,
        |i| ActivityRow {
            course: i.course.clone(),
            actor: i.actor.clone(),
            title: i.title.clone(),
            posted: i.posted.clone(),
            marker: output::new_marker(i.is_new, color),
        },
        |i| format!("{}\t{}\t{}\t{}", i.course_id, i.posted, i.actor, i.title),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

// ── Grades ──────────────────────────────────────────────────────────

#[derive(Serialize)]
struct GradeItem {
    course_id: CourseId,
    course: String,
    average: f64,
    earned: f64,
    possible: f64,
    extra_credit: f64,
    letter: Option<String>,
}

#[derive(Tabled)]
struct GradeRow {
    #[tabled(rename = "Course")]
    course: String,
    #[tabled(rename = "Average")]
    average: String,
    #[tabled(rename = "Points")]
    points: String,
    #[tabled(rename = "Letter")]
    letter: String,
}

pub async fn grades(session: &Session, global: &GlobalOpts) -> Result<(), CliError> {
    let data = load(session).await?;
    let items: Vec<GradeItem> = data
        .courses
        .iter()
        .filter_map(|course| {
            data.grades_to_date.get(&course.id).map(|g| GradeItem {
                course_id: course.id.clone(),
                course: course_label(&data, &course.id),
                average: g.average,
                earned: g.earned,
                possible: g.possible,
                extra_credit: g.extra_credit,
                letter: g.letter_grade.clone(),
            })
        })
        .collect();

    let out = output::render_list(
        global.output,
        &items,
        |i| GradeRow {
            course: i.course.clone(),
            average: format!("{:.1}%", i.average),
            points: format!("{:.1} / {:.1}", i.earned + i.extra_credit, i.possible),
            letter: i.letter.clone().unwrap_or_default(),
        },
        |i| format!("{}\t{:.1}", i.course_id, i.average),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

// ── Announcements ───────────────────────────────────────────────────

#[derive(Serialize)]
struct NewsItem {
    course_id: CourseId,
    course: String,
    id: String,
    subject: String,
    from: String,
    date: String,
    text: String,
    is_new: bool,
}

#[derive(Tabled)]
struct NewsRow {
    #[tabled(rename = "Course")]
    course: String,
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Subject")]
    subject: String,
    #[tabled(rename = "From")]
    from: String,
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "")]
    marker: String,
}

pub async fn news(session: &Session, global: &GlobalOpts) -> Result<(), CliError> {
    let data = load(session).await?;
    let mut items = Vec::new();
    for course in &data.courses {
        for a in data.announcements_for(&course.id) {
            items.push(NewsItem {
                course_id: course.id.clone(),
                course: course_label(&data, &course.id),
                id: a.id.clone(),
                subject: a.subject.clone(),
                from: a.submitter.clone(),
                date: local_date(session, &course.id, a.start_display_date.as_deref()).await,
                text: a.text.clone(),
                is_new: session.is_new(a.start_display_date.as_deref()),
            });
        }
    }

    let color = output::should_color(global.color);
    let out = output::render_list(
        global.output,
        &items,
        |i| NewsRow {
            course: i.course.clone(),
            id: i.id.clone(),
            subject: i.subject.clone(),
            from: i.from.clone(),
            date: i.date.clone(),
            marker: output::new_marker(i.is_new, color),
        },
        |i| format!("{}\t{}\t{}", i.course_id, i.id, i.subject),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn read(
    session: &Session,
    course_id: &str,
    announcement_id: &str,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    super::signed_in(session).await?;
    session
        .mark_announcement_read(&CourseId::from(course_id), announcement_id)
        .await?;
    output::status("Marked as read", global.quiet);
    Ok(())
}
