use dioxus::prelude::*;
use tracing::{error, info, warn};

use crate::backend::certificate::{Certificate, CertificateExport};
use crate::backend::error::AppError;
use crate::backend::quiz::{QuizRecord, PASSING_SCORE};
use crate::backend::store::Store;
use crate::components::common::{dashboard_route, LoadingPanel};
use crate::components::{AppState, ToastKind};
use crate::Route;

/// The stored attempt for `course_id`. A missing, foreign or unreadable
/// record is a malformed cache.
fn load_record(store: &Store, course_id: &str) -> Result<QuizRecord, AppError> {
    store
        .quiz_record()?
        .filter(|r| r.course_id == course_id)
        .ok_or_else(|| AppError::MalformedCache("quiz results".to_string()))
}

#[component]
pub fn QuizResultsComponent(course_id: String) -> Element {
    let mut app_state = use_context::<AppState>();
    let store = use_context::<Store>();

    let record = use_hook({
        let course_id = course_id.clone();
        move || match load_record(&store, &course_id) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!("No usable results for {course_id}: {e}");
                None
            }
        }
    });
    let mut export = use_signal(|| None::<CertificateExport>);

    // Nothing to show: back to the course
    use_effect({
        let course_id = course_id.clone();
        let missing = record.is_none();
        move || {
            if missing {
                app_state.notify(ToastKind::Error, "Could not load your quiz results.");
                navigator().replace(Route::CoursePlayerComponent { course_id: course_id.clone() });
            }
        }
    });

    let Some(record) = record else {
        return rsx! { LoadingPanel { label: "Loading results...".to_string() } };
    };

    let summary = record.summary();
    let recipient = app_state.session.read().as_ref().map(|s| s.user_name.clone());
    let dashboard = dashboard_route(&app_state);

    let on_certificate = {
        let record = record.clone();
        move |_| {
            if let Some(ready) = certificate_export(&record, recipient.as_deref()) {
                info!("Certificate ready: {}", ready.file_name);
                export.set(Some(ready));
            }
        }
    };

    rsx! {
        div { class: "page-container py-8 animate-fade-in",
            div { class: "page-header",
                h1 { class: "page-title", "Results: {record.course_title}" }
            }

            div { class: "panel text-center mb-6",
                div { class: if summary.passed { "score score-pass" } else { "score score-fail" }, "{summary.score}%" }
                p { class: "text-[var(--text-secondary)]", "{summary.correct} of {summary.total} correct" }
                if summary.passed {
                    p { class: "text-lg font-semibold mt-2", "🎉 Congratulations, you passed!" }
                } else {
                    p { class: "text-lg font-semibold mt-2", "You need {PASSING_SCORE}% to pass. Review the course and try again." }
                }

                div { class: "flex gap-4 justify-center mt-4",
                    if let Some(ready) = export() {
                        a {
                            class: "btn btn-primary",
                            href: "{ready.data_url}",
                            download: "{ready.file_name}",
                            "⬇ Save {ready.file_name}"
                        }
                    } else if summary.passed {
                        button { class: "btn btn-primary", onclick: on_certificate, "🏆 Get certificate" }
                    }
                    if !summary.passed {
                        Link {
                            to: Route::CoursePlayerComponent { course_id: course_id.clone() },
                            class: "btn btn-secondary",
                            "Retake course"
                        }
                    }
                    Link { to: dashboard, class: "btn btn-ghost", "Back to dashboard" }
                }
            }

            div { class: "panel",
                h3 { class: "panel-title mb-3", "Your answers" }
                div { class: "space-y-3",
                    for (i, result) in record.results.iter().enumerate() {
                        div {
                            key: "{i}",
                            class: if result.is_correct { "answer answer-correct" } else { "answer answer-wrong" },
                            p { class: "font-medium", "{i + 1}. {result.question}" }
                            p { class: "text-sm",
                                "Your answer: {result.user_answer.label()}"
                                if !result.is_correct {
                                    " · Correct answer: {result.correct_answer.label()}"
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

/// Export for a passing record. Failures only reach the log.
fn certificate_export(record: &QuizRecord, recipient: Option<&str>) -> Option<CertificateExport> {
    let certificate = Certificate::issue(record, recipient)?;
    match certificate.export() {
        Ok(export) => Some(export),
        Err(e) => {
            error!("Certificate export failed: {e}");
            None
        }
    }
}
