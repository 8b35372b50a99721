//! Sync and probe handlers.

use futures_util::StreamExt;
use serde::Serialize;
use tabled::Tabled;
use tracing::debug;

use lsdash_core::{ProbeOutcome, Session, SyncReport};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct CountRow {
    #[tabled(rename = "Category")]
    category: &'static str,
    #[tabled(rename = "New")]
    count: String,
}

fn count_rows(report: &SyncReport, color: bool) -> Vec<CountRow> {
    let d = &report.deltas;
    [
        ("Due items", d.upcoming_events),
        ("Activity", d.happenings),
        ("Announcements", d.announcements),
        ("Grades", d.grades),
    ]
    .into_iter()
    .map(|(category, n)| CountRow {
        category,
        count: output::count(n, color),
    })
    .collect()
}

fn report_detail(report: &SyncReport, color: bool) -> String {
    let since = report.previous_load_time.map_or_else(
        || "first sync, nothing to compare against".to_owned(),
        |t| format!("new since last sync at {}", t.format("%Y-%m-%d %H:%M UTC")),
    );
    let table = tabled::Table::new(count_rows(report, color))
        .with(tabled::settings::Style::rounded())
        .to_string();
    format!("{since}\n{table}")
}

// ── Handlers ────────────────────────────────────────────────────────

pub async fn handle(session: &Session, global: &GlobalOpts) -> Result<(), CliError> {
    // Slice events at debug level while the sync runs.
    let mut events = session.events();
    let watcher = tokio::spawn(async move {
        while let Some(event) = events.next().await {
            debug!(?event, "session event");
        }
    });

    let result = super::synced(session).await;
    watcher.abort();
    let report = result?;

    let color = output::should_color(global.color);
    let courses = session
        .with_user_data(|d| d.courses.len())
        .await
        .unwrap_or_default();
    output::status(&format!("Synced {courses} courses"), global.quiet);
    let out = output::render_single(
        global.output,
        &report,
        |r| report_detail(r, color),
        |r| r.deltas.total().to_string(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

#[derive(Serialize)]
struct ProbeView {
    #[serde(flatten)]
    outcome: ProbeOutcome,
    new_items: usize,
}

pub async fn probe(session: &Session, global: &GlobalOpts) -> Result<(), CliError> {
    let outcome = session.prober().run().await?;
    let view = ProbeView {
        outcome,
        new_items: outcome.new_items(),
    };
    let out = output::render_single(
        global.output,
        &view,
        |v| match v.outcome {
            ProbeOutcome::NewData(r) => format!(
                "{} new: {} due, {} activity, {} announcements",
                r.total(),
                r.upcoming_events,
                r.happenings,
                r.announcements
            ),
            ProbeOutcome::NoData => "Nothing new".into(),
            ProbeOutcome::Skipped { next_probe_at } => format!(
                "Checked recently; next check after {}",
                next_probe_at.format("%Y-%m-%d %H:%M UTC")
            ),
            ProbeOutcome::Failed => "Check failed; will retry next time".into(),
        },
        |v| v.new_items.to_string(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
