use dioxus::prelude::*;
use dioxus::core::use_drop;
use tokio::sync::mpsc::UnboundedSender;

use crate::backend::{AppCmd, RequestScope};
use crate::components::common::ProgressBar;
use crate::components::AppState;
use crate::Route;

#[component]
pub fn EmployeeComponent() -> Element {
    let app_state = use_context::<AppState>();
    let cmd_tx = use_context::<UnboundedSender<AppCmd>>();

    let fetch_tx = cmd_tx.clone();
    use_hook(move || {
        let _ = fetch_tx.send(AppCmd::FetchMyCourses);
    });

    use_drop(move || {
        let _ = cmd_tx.send(AppCmd::CancelScope(RequestScope::Employee));
    });

    let courses = app_state.my_courses.read().clone();
    let finished = courses.iter().filter(|c| c.completed).count();
    let user_name = app_state
        .session
        .read()
        .as_ref()
        .map(|s| s.user_name.clone())
        .unwrap_or_default();

    rsx! {
        div { class: "page-container py-8 animate-fade-in",
            div { class: "page-header",
                h1 { class: "page-title", "Welcome back, {user_name}" }
                p { class: "text-[var(--text-secondary)] mt-1", "{finished} of {courses.len()} assigned courses completed" }
            }

            if courses.is_empty() {
                div { class: "panel",
                    div { class: "empty-state",
                        div { class: "empty-state-icon", "📚" }
                        p { class: "empty-state-title", "No courses assigned" }
                        p { class: "empty-state-text", "Your administrator has not assigned any training yet." }
                    }
                }
            } else {
                div { class: "grid grid-cols-1 md:grid-cols-2 gap-6",
                    for assigned in courses {
                        div { key: "{assigned.course.id}", class: "panel",
                            div { class: "flex justify-between items-start mb-2",
                                h3 { class: "font-bold text-lg", "{assigned.course.title}" }
                                if assigned.completed {
                                    span { class: "badge badge-verified", "Completed" }
                                }
                            }
                            p { class: "text-sm text-[var(--text-secondary)] mb-3", "{assigned.course.description}" }
                            ProgressBar { percent: assigned.progress_percent as f64 }
                            div { class: "flex justify-between items-center mt-3",
                                span { class: "text-xs text-[var(--text-secondary)]",
                                    "{assigned.progress_percent}% · {assigned.course.slide_count} slides"
                                }
                                Link {
                                    to: Route::CoursePlayerComponent { course_id: assigned.course.id.clone() },
                                    class: "btn btn-primary btn-sm",
                                    if assigned.completed { "Review" } else if assigned.progress_percent > 0 { "Continue" } else { "Start" }
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}
