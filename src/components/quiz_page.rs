use chrono::Utc;
use dioxus::prelude::*;
use tracing::{error, info, warn};

use crate::backend::error::AppError;
use crate::backend::quiz::{summarize, ChoiceKey, QuizRecord, QuizSession};
use crate::backend::store::Store;
use crate::components::common::{LoadingPanel, ProgressBar};
use crate::components::{AppState, ToastKind};
use crate::Route;

/// Loads the stored draft for `course_id`. Anything else is treated as a
/// malformed cache and sends the learner back to the course.
fn load_session(store: &Store, course_id: &str) -> Result<(String, QuizSession), AppError> {
    let draft = store
        .quiz_draft()?
        .filter(|d| d.course_id == course_id)
        .ok_or_else(|| AppError::MalformedCache("quiz".to_string()))?;
    let session = QuizSession::new(draft.questions).map_err(|e| AppError::MalformedCache(e.to_string()))?;
    Ok((draft.course_title, session))
}

#[component]
pub fn QuizComponent(course_id: String) -> Element {
    let mut app_state = use_context::<AppState>();
    let store = use_context::<Store>();

    let loaded = use_hook({
        let store = store.clone();
        let course_id = course_id.clone();
        move || match load_session(&store, &course_id) {
            Ok(loaded) => Some(loaded),
            Err(e) => {
                warn!("No usable quiz for {course_id}: {e}");
                None
            }
        }
    });
    let course_title = loaded.as_ref().map(|(title, _)| title.clone()).unwrap_or_default();
    let mut quiz = use_signal(move || loaded.map(|(_, session)| session));

    // Nothing to answer: back to the course
    use_effect({
        let course_id = course_id.clone();
        move || {
            if quiz.peek().is_none() {
                app_state.notify(ToastKind::Error, "Could not load the quiz. Please finish the course again.");
                navigator().replace(Route::CoursePlayerComponent { course_id: course_id.clone() });
            }
        }
    });

    let on_submit = {
        let course_id = course_id.clone();
        let course_title = course_title.clone();
        move |_| {
            let Some(session) = quiz.read().clone() else {
                return;
            };
            let results = match session.submit() {
                Ok(results) => results,
                Err(e) => {
                    app_state.notify(ToastKind::Error, e.to_string());
                    return;
                }
            };
            let summary = summarize(&results);
            info!("Quiz for {course_id} submitted: {}%", summary.score);
            let record = QuizRecord {
                course_id: course_id.clone(),
                course_title: course_title.clone(),
                completed_at: Utc::now(),
                results,
            };
            if let Err(e) = store.record_quiz_attempt(&record) {
                error!("Failed to store quiz attempt: {e}");
                app_state.notify(ToastKind::Error, e.user_message());
                return;
            }
            navigator().push(Route::QuizResultsComponent { course_id: course_id.clone() });
        }
    };

    let quiz_guard = quiz.read();
    let Some(session) = quiz_guard.as_ref() else {
        return rsx! { LoadingPanel { label: "Loading quiz...".to_string() } };
    };

    let index = session.current_index();
    let total = session.total();
    let question = session.current_question().clone();
    let selected = session.answers().get(index);
    let answered = session.answered_count();
    let is_first = session.is_first();
    let is_last = session.is_last();
    let can_submit = session.can_submit();
    let choices: Vec<(ChoiceKey, String)> = question.choices.iter().map(|(k, t)| (k, t.to_string())).collect();
    let answered_flags: Vec<bool> = (0..total).map(|i| session.answers().get(i).is_some()).collect();
    drop(quiz_guard);

    rsx! {
        div { class: "page-container py-8 animate-fade-in",
            div { class: "page-header",
                h1 { class: "page-title", "Quiz: {course_title}" }
                p { class: "text-[var(--text-secondary)] mt-1", "Question {index + 1} of {total} · {answered} answered" }
                ProgressBar { percent: (index + 1) as f64 * 100.0 / total as f64, class: "mt-2".to_string() }
            }

            div { class: "panel max-w-3xl",
                h2 { class: "text-xl font-semibold mb-4", "{question.question}" }
                div { class: "space-y-2",
                    for (key, text) in choices {
                        button {
                            key: "{key.label()}",
                            class: if selected == Some(key) { "choice choice-selected" } else { "choice" },
                            onclick: move |_| {
                                if let Some(session) = quiz.write().as_mut() {
                                    session.select(key);
                                }
                            },
                            span { class: "choice-key", "{key.label()}" }
                            span { "{text}" }
                        }
                    }
                }

                div { class: "flex justify-between mt-6",
                    button {
                        class: "btn btn-secondary",
                        disabled: is_first,
                        onclick: move |_| {
                            if let Some(session) = quiz.write().as_mut() {
                                session.prev();
                            }
                        },
                        "← Previous"
                    }
                    if is_last {
                        button {
                            class: "btn btn-primary",
                            disabled: !can_submit,
                            onclick: on_submit,
                            "Submit answers"
                        }
                    } else {
                        button {
                            class: "btn btn-primary",
                            disabled: selected.is_none(),
                            onclick: move |_| {
                                if let Some(session) = quiz.write().as_mut() {
                                    session.next();
                                }
                            },
                            "Next →"
                        }
                    }
                }

                div { class: "question-dots",
                    for (i, done) in answered_flags.into_iter().enumerate() {
                        {
                            let dot_class = match (i == index, done) {
                                (true, _) => "dot dot-current",
                                (false, true) => "dot dot-answered",
                                (false, false) => "dot",
                            };
                            rsx! {
                                button {
                                    key: "{i}",
                                    class: "{dot_class}",
                                    onclick: move |_| {
                                        if let Some(session) = quiz.write().as_mut() {
                                            session.go_to(i);
                                        }
                                    },
                                    "{i + 1}"
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::quiz::{Choices, Question, QuizDraft};

    fn draft(course_id: &str, questions: usize) -> QuizDraft {
        QuizDraft {
            course_id: course_id.to_string(),
            course_title: "Data Privacy".to_string(),
            questions: (0..questions)
                .map(|i| Question {
                    question: format!("Question {i}?"),
                    choices: Choices {
                        a: "Yes".into(),
                        b: "No".into(),
                        c: "Maybe".into(),
                        d: "Never".into(),
                    },
                    correct_answer: ChoiceKey::A,
                })
                .collect(),
        }
    }

    #[test]
    fn test_load_session_for_matching_course() {
        let store = Store::new_in_memory().unwrap();
        store.save_quiz_draft(&draft("c1", 3)).unwrap();

        let (title, session) = load_session(&store, "c1").unwrap();
        assert_eq!(title, "Data Privacy");
        assert_eq!(session.total(), 3);
    }

    #[test]
    fn test_load_session_rejects_other_course_and_empty_quiz() {
        let store = Store::new_in_memory().unwrap();
        assert!(matches!(load_session(&store, "c1"), Err(AppError::MalformedCache(_))));

        store.save_quiz_draft(&draft("c2", 3)).unwrap();
        assert!(matches!(load_session(&store, "c1"), Err(AppError::MalformedCache(_))));

        store.save_quiz_draft(&draft("c1", 0)).unwrap();
        assert!(matches!(load_session(&store, "c1"), Err(AppError::MalformedCache(_))));
    }
}
