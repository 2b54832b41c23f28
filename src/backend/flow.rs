//! Network-backed steps of the course flow: loading what the player needs and
//! handing a finished course over to the quiz.

use tracing::{info, warn};

use crate::backend::api::ApiClient;
use crate::backend::error::{AppError, MissingState};
use crate::backend::models::CourseBundle;
use crate::backend::quiz::QuizDraft;
use crate::backend::store::Store;

pub async fn load_course(api: &ApiClient, store: &Store, course_id: &str) -> Result<CourseBundle, AppError> {
    if course_id.trim().is_empty() {
        return Err(AppError::MissingState(MissingState::CourseId));
    }

    let course = api.course(course_id).await?;
    let slides = api.slides(course_id).await?;

    let cached = store.explanations(course_id).unwrap_or_else(|e| {
        warn!("Ignoring explanation cache for {course_id}: {e}");
        None
    });
    let explanations = match cached {
        Some(explanations) => explanations,
        // narration is optional, the course still plays without it
        None => match api.explanations(course_id).await {
            Ok(explanations) => {
                if let Err(e) = store.cache_explanations(course_id, &explanations) {
                    warn!("Failed to cache explanations for {course_id}: {e}");
                }
                explanations
            }
            Err(e) => {
                warn!("No explanations for {course_id}: {e}");
                vec![]
            }
        },
    };

    info!("Loaded course {course_id} with {} slides", slides.len());
    Ok(CourseBundle { course, slides, explanations })
}

/// Material reference for question generation, from the local cache when present.
pub async fn resolve_material_url(api: &ApiClient, store: &Store, course_id: &str) -> Result<String, AppError> {
    match store.material_url(course_id) {
        Ok(Some(url)) => return Ok(url),
        Ok(None) => {}
        Err(e) => warn!("Ignoring material cache for {course_id}: {e}"),
    }

    let material = api.material(course_id).await?;
    if let Err(e) = store.cache_material_url(course_id, &material.url) {
        warn!("Failed to cache material url for {course_id}: {e}");
    }
    Ok(material.url)
}

/// Generates the quiz for a completed course and stores it as the active
/// question set. Any failure aborts the hand-over; nothing is retried.
pub async fn prepare_quiz(
    api: &ApiClient,
    store: &Store,
    course_id: &str,
    course_title: &str,
) -> Result<QuizDraft, AppError> {
    if course_id.trim().is_empty() {
        return Err(AppError::MissingState(MissingState::CourseId));
    }

    let material_url = resolve_material_url(api, store, course_id).await?;
    let questions = api.generate_questions(&material_url).await?;
    if questions.is_empty() {
        return Err(AppError::MalformedCache("generated quiz".to_string()));
    }

    let draft = QuizDraft {
        course_id: course_id.to_string(),
        course_title: course_title.to_string(),
        questions,
    };
    store.save_quiz_draft(&draft)?;
    info!("Prepared {} questions for course {course_id}", draft.questions.len());
    Ok(draft)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::test_support::{fake_config, spawn_server};
    use axum::{
        http::StatusCode,
        routing::{get, post},
        Json, Router,
    };
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn question_json() -> Value {
        json!({
            "question": "When must a conflict of interest be disclosed?",
            "choices": {"a": "Never", "b": "Immediately", "c": "At year end", "d": "Only if asked"},
            "correctAnswer": "b"
        })
    }

    fn course_router(material_hits: Arc<AtomicUsize>, explanation_hits: Arc<AtomicUsize>) -> Router {
        Router::new()
            .route("/api/courses/c1", get(|| async { Json(json!({"id": "c1", "title": "Conflicts of Interest"})) }))
            .route(
                "/api/courses/c1/slides",
                get(|| async {
                    Json(json!([
                        {"id": "s1", "title": "Intro", "content": "Why it matters"},
                        {"id": "s2", "title": "Disclosure", "content": "How to disclose"}
                    ]))
                }),
            )
            .route(
                "/api/courses/c1/explanations",
                get(move || {
                    explanation_hits.fetch_add(1, Ordering::SeqCst);
                    async { Json(json!([{"slide_id": "s1", "text": "Welcome"}])) }
                }),
            )
            .route(
                "/api/courses/c1/material",
                get(move || {
                    material_hits.fetch_add(1, Ordering::SeqCst);
                    async { Json(json!({"url": "https://files/c1.pptx"})) }
                }),
            )
            .route(
                "/ai/generate-mcqs",
                post(|Json(body): Json<Value>| async move {
                    assert_eq!(body["material_url"], "https://files/c1.pptx");
                    Json(json!({"questions": [question_json(), question_json()]}))
                }),
            )
    }

    #[tokio::test]
    async fn test_load_course_caches_explanations() {
        let explanation_hits = Arc::new(AtomicUsize::new(0));
        let router = course_router(Arc::new(AtomicUsize::new(0)), explanation_hits.clone());
        let base = spawn_server(router).await;
        let api = ApiClient::new(&fake_config(&base));
        let store = Store::new_in_memory().unwrap();

        let bundle = load_course(&api, &store, "c1").await.expect("Failed to load course");
        assert_eq!(bundle.course.title, "Conflicts of Interest");
        assert_eq!(bundle.slides.len(), 2);
        assert_eq!(bundle.explanation_for("s1"), Some("Welcome"));
        assert_eq!(bundle.explanation_for("s2"), None);

        load_course(&api, &store, "c1").await.unwrap();
        assert_eq!(explanation_hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_load_course_without_explanations() {
        let router = Router::new()
            .route("/api/courses/c2", get(|| async { Json(json!({"id": "c2", "title": "Safety"})) }))
            .route("/api/courses/c2/slides", get(|| async { Json(json!([{"id": "s1", "title": "Only"}])) }))
            .route("/api/courses/c2/explanations", get(|| async { StatusCode::INTERNAL_SERVER_ERROR }));
        let base = spawn_server(router).await;
        let api = ApiClient::new(&fake_config(&base));
        let store = Store::new_in_memory().unwrap();

        let bundle = load_course(&api, &store, "c2").await.unwrap();
        assert!(bundle.explanations.is_empty());
        assert_eq!(store.explanations("c2").unwrap(), None);
    }

    #[tokio::test]
    async fn test_prepare_quiz_stores_draft_and_caches_material() {
        let material_hits = Arc::new(AtomicUsize::new(0));
        let router = course_router(material_hits.clone(), Arc::new(AtomicUsize::new(0)));
        let base = spawn_server(router).await;
        let api = ApiClient::new(&fake_config(&base));
        let store = Store::new_in_memory().unwrap();

        let draft = prepare_quiz(&api, &store, "c1", "Conflicts of Interest")
            .await
            .expect("Failed to prepare quiz");
        assert_eq!(draft.questions.len(), 2);
        assert_eq!(store.quiz_draft().unwrap(), Some(draft));
        assert_eq!(store.material_url("c1").unwrap().as_deref(), Some("https://files/c1.pptx"));

        prepare_quiz(&api, &store, "c1", "Conflicts of Interest").await.unwrap();
        assert_eq!(material_hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_prepare_quiz_failure_leaves_no_draft() {
        let router = Router::new()
            .route("/api/courses/c3/material", get(|| async { Json(json!({"url": "https://files/c3.pptx"})) }))
            .route("/ai/generate-mcqs", post(|| async { StatusCode::BAD_GATEWAY }));
        let base = spawn_server(router).await;
        let api = ApiClient::new(&fake_config(&base));
        let store = Store::new_in_memory().unwrap();

        let err = prepare_quiz(&api, &store, "c3", "Harassment Prevention").await.unwrap_err();
        assert_eq!(err, AppError::Http { endpoint: "/generate-mcqs".into(), status: 502 });
        assert_eq!(store.quiz_draft().unwrap(), None);
    }

    #[tokio::test]
    async fn test_prepare_quiz_rejects_empty_generation() {
        let router = Router::new()
            .route("/api/courses/c4/material", get(|| async { Json(json!({"url": "u"})) }))
            .route("/ai/generate-mcqs", post(|| async { Json(json!([])) }));
        let base = spawn_server(router).await;
        let api = ApiClient::new(&fake_config(&base));
        let store = Store::new_in_memory().unwrap();

        let err = prepare_quiz(&api, &store, "c4", "Empty").await.unwrap_err();
        assert!(matches!(err, AppError::MalformedCache(_)));
    }

    #[tokio::test]
    async fn test_missing_course_id() {
        let api = ApiClient::new(&fake_config("http://127.0.0.1:9"));
        let store = Store::new_in_memory().unwrap();
        assert_eq!(
            prepare_quiz(&api, &store, " ", "x").await,
            Err(AppError::MissingState(MissingState::CourseId))
        );
    }
}
