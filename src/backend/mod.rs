pub mod api;
pub mod certificate;
pub mod config;
pub mod error;
pub mod flow;
pub mod models;
pub mod player;
pub mod quiz;
pub mod store;
#[cfg(test)]
mod test_support;

use std::collections::HashMap;
use std::future::Future;

use api::ApiClient;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use config::Config;
use error::AppError;
use futures::future::{AbortHandle, Abortable, Aborted, FutureExt, LocalBoxFuture};
use futures::stream::{FuturesUnordered, StreamExt};
use models::{
    AssignedCourse, ContactRequest, Course, CourseBundle, Employee, LoginRequest, NewCourse, NewEmployee,
    NewTenant, Session, Tenant,
};
use store::Store;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// The page on whose behalf a request runs. Leaving the page cancels it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestScope {
    Marketing,
    Login,
    SuperAdmin,
    OrgAdmin,
    Employee,
    Player,
}

#[derive(Debug)]
pub enum AppCmd {
    Login { email: String, password: String },
    Logout,
    FetchTenants,
    CreateTenant(NewTenant),
    FetchTenantCourses { tenant_id: String },
    CreateCourse { tenant_id: String, course: NewCourse },
    FetchEmployees { tenant_id: String },
    AddEmployee { tenant_id: String, employee: NewEmployee },
    AssignCourse { tenant_id: String, course_id: String, employee_ids: Vec<String> },
    FetchMyCourses,
    LoadCourse { course_id: String },
    CompleteCourse { course_id: String, course_title: String },
    Speak { slide_id: String, text: String },
    SubmitContact(ContactRequest),
    CancelScope(RequestScope),
}

#[derive(Debug, Clone)]
pub enum AppEvent {
    LoggedIn(Session),
    LoggedOut,
    TenantsFetched(Vec<Tenant>),
    TenantCreated(Tenant),
    TenantCoursesFetched(Vec<Course>),
    CourseCreated(Course),
    EmployeesFetched(Vec<Employee>),
    EmployeeAdded(Employee),
    CourseAssigned { course_id: String, employee_count: usize },
    MyCoursesFetched(Vec<AssignedCourse>),
    CourseLoaded(CourseBundle),
    QuizReady { course_id: String, question_count: usize },
    SpeechReady { slide_id: String, data_url: String },
    ContactSubmitted,
    RequestFailed { op: &'static str, error: AppError },
}

type Outcome = Result<Result<AppEvent, AppError>, Aborted>;

struct Pending {
    scope: RequestScope,
    op: &'static str,
    handle: AbortHandle,
}

pub struct Backend {
    api: ApiClient,
    store: Store,
    cmd_rx: mpsc::UnboundedReceiver<AppCmd>,
    event_tx: mpsc::UnboundedSender<AppEvent>,
    in_flight: FuturesUnordered<LocalBoxFuture<'static, (u64, Outcome)>>,
    pending: HashMap<u64, Pending>,
    next_request: u64,
}

impl Backend {
    pub fn new(
        config: &Config,
        store: Store,
        cmd_rx: mpsc::UnboundedReceiver<AppCmd>,
        event_tx: mpsc::UnboundedSender<AppEvent>,
    ) -> Self {
        let mut api = ApiClient::new(config);
        match store.session() {
            Ok(Some(session)) => {
                info!("Restored session for {}", session.user_name);
                api.set_token(Some(session.token));
            }
            Ok(None) => {}
            Err(e) => warn!("Ignoring stored session: {e}"),
        }

        Self {
            api,
            store,
            cmd_rx,
            event_tx,
            in_flight: FuturesUnordered::new(),
            pending: HashMap::new(),
            next_request: 0,
        }
    }

    /// Runs until every command sender is gone and no request is in flight.
    pub async fn run(&mut self) {
        let mut commands_open = true;
        loop {
            if !commands_open && self.in_flight.is_empty() {
                break;
            }
            tokio::select! {
                cmd = self.cmd_rx.recv(), if commands_open => {
                    match cmd {
                        Some(cmd) => self.handle_command(cmd),
                        None => commands_open = false,
                    }
                }
                Some((id, outcome)) = self.in_flight.next(), if !self.in_flight.is_empty() => {
                    self.finish(id, outcome);
                }
            }
        }
        debug!("Backend stopped");
    }

    #[cfg(test)]
    fn in_flight_count(&self) -> usize {
        self.pending.len()
    }

    fn handle_command(&mut self, cmd: AppCmd) {
        let api = self.api.clone();
        match cmd {
            AppCmd::CancelScope(scope) => self.cancel_scope(scope),
            AppCmd::Logout => {
                self.cancel_all();
                if let Err(e) = self.store.clear_session() {
                    error!("Failed to clear session: {e}");
                }
                self.api.set_token(None);
                self.emit(AppEvent::LoggedOut);
            }
            AppCmd::Login { email, password } => {
                self.dispatch(RequestScope::Login, "login", async move {
                    api.login(&LoginRequest { email, password }).await.map(AppEvent::LoggedIn)
                });
            }
            AppCmd::FetchTenants => {
                self.dispatch(RequestScope::SuperAdmin, "fetch tenants", async move {
                    api.tenants().await.map(AppEvent::TenantsFetched)
                });
            }
            AppCmd::CreateTenant(tenant) => {
                self.dispatch(RequestScope::SuperAdmin, "create tenant", async move {
                    api.create_tenant(&tenant).await.map(AppEvent::TenantCreated)
                });
            }
            AppCmd::FetchTenantCourses { tenant_id } => {
                self.dispatch(RequestScope::OrgAdmin, "fetch courses", async move {
                    api.tenant_courses(&tenant_id).await.map(AppEvent::TenantCoursesFetched)
                });
            }
            AppCmd::CreateCourse { tenant_id, course } => {
                self.dispatch(RequestScope::OrgAdmin, "create course", async move {
                    api.create_course(&tenant_id, &course).await.map(AppEvent::CourseCreated)
                });
            }
            AppCmd::FetchEmployees { tenant_id } => {
                self.dispatch(RequestScope::OrgAdmin, "fetch employees", async move {
                    api.employees(&tenant_id).await.map(AppEvent::EmployeesFetched)
                });
            }
            AppCmd::AddEmployee { tenant_id, employee } => {
                self.dispatch(RequestScope::OrgAdmin, "add employee", async move {
                    api.add_employee(&tenant_id, &employee).await.map(AppEvent::EmployeeAdded)
                });
            }
            AppCmd::AssignCourse { tenant_id, course_id, employee_ids } => {
                self.dispatch(RequestScope::OrgAdmin, "assign course", async move {
                    api.assign_course(&tenant_id, &course_id, &employee_ids).await?;
                    Ok(AppEvent::CourseAssigned { course_id, employee_count: employee_ids.len() })
                });
            }
            AppCmd::FetchMyCourses => {
                self.dispatch(RequestScope::Employee, "fetch assigned courses", async move {
                    api.my_courses().await.map(AppEvent::MyCoursesFetched)
                });
            }
            AppCmd::LoadCourse { course_id } => {
                let store = self.store.clone();
                self.dispatch(RequestScope::Player, "load course", async move {
                    flow::load_course(&api, &store, &course_id).await.map(AppEvent::CourseLoaded)
                });
            }
            AppCmd::CompleteCourse { course_id, course_title } => {
                let store = self.store.clone();
                self.dispatch(RequestScope::Player, "generate quiz", async move {
                    let draft = flow::prepare_quiz(&api, &store, &course_id, &course_title).await?;
                    Ok(AppEvent::QuizReady { course_id, question_count: draft.questions.len() })
                });
            }
            AppCmd::Speak { slide_id, text } => {
                self.dispatch(RequestScope::Player, "text to speech", async move {
                    let (bytes, mime) = api.synthesize_speech(&text).await?;
                    let data_url = format!("data:{mime};base64,{}", STANDARD.encode(bytes));
                    Ok(AppEvent::SpeechReady { slide_id, data_url })
                });
            }
            AppCmd::SubmitContact(request) => {
                self.dispatch(RequestScope::Marketing, "submit contact form", async move {
                    api.submit_contact(&request).await.map(|_| AppEvent::ContactSubmitted)
                });
            }
        }
    }

    fn dispatch<F>(&mut self, scope: RequestScope, op: &'static str, request: F)
    where
        F: Future<Output = Result<AppEvent, AppError>> + 'static,
    {
        let id = self.next_request;
        self.next_request += 1;

        let (handle, registration) = AbortHandle::new_pair();
        self.pending.insert(id, Pending { scope, op, handle });
        self.in_flight
            .push(Abortable::new(request, registration).map(move |outcome| (id, outcome)).boxed_local());
        debug!("Dispatched {op} ({scope:?}) as request {id}");
    }

    fn cancel_scope(&mut self, scope: RequestScope) {
        for pending in self.pending.values().filter(|p| p.scope == scope) {
            debug!("Cancelling {} for {scope:?}", pending.op);
            pending.handle.abort();
        }
    }

    fn cancel_all(&mut self) {
        for pending in self.pending.values() {
            pending.handle.abort();
        }
    }

    fn finish(&mut self, id: u64, outcome: Outcome) {
        let Some(pending) = self.pending.remove(&id) else {
            return;
        };
        match outcome {
            Err(Aborted) => debug!("Dropped result of cancelled {}", pending.op),
            Ok(Ok(event)) => {
                self.observe(&event);
                self.emit(event);
            }
            Ok(Err(error)) => {
                warn!("{} failed: {error}", pending.op);
                self.emit(AppEvent::RequestFailed { op: pending.op, error });
            }
        }
    }

    /// Backend-side bookkeeping for events that change the session.
    fn observe(&mut self, event: &AppEvent) {
        if let AppEvent::LoggedIn(session) = event {
            info!("Signed in as {} ({:?})", session.user_name, session.role);
            if let Err(e) = self.store.save_session(session) {
                error!("Failed to persist session: {e}");
            }
            self.api.set_token(Some(session.token.clone()));
        }
    }

    fn emit(&self, event: AppEvent) {
        if self.event_tx.send(event).is_err() {
            debug!("Event receiver gone");
        }
    }
}

pub async fn init(
    config: Config,
    store: Store,
    cmd_rx: mpsc::UnboundedReceiver<AppCmd>,
    event_tx: mpsc::UnboundedSender<AppEvent>,
) {
    info!("Backend starting against {}", config.api_base_url);
    let mut backend = Backend::new(&config, store, cmd_rx, event_tx);
    backend.run().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::models::UserRole;
    use crate::backend::test_support::{fake_config, spawn_server};
    use axum::{
        http::{HeaderMap, StatusCode},
        routing::{get, post},
        Json, Router,
    };
    use serde_json::json;
    use std::time::Duration;

    async fn next_event(event_rx: &mut mpsc::UnboundedReceiver<AppEvent>) -> AppEvent {
        match tokio::time::timeout(Duration::from_secs(5), event_rx.recv()).await {
            Ok(Some(event)) => event,
            Ok(None) => panic!("Event channel closed"),
            Err(_) => panic!("Timed out waiting for event"),
        }
    }

    fn login_router() -> Router {
        Router::new()
            .route(
                "/api/auth/login",
                post(|| async {
                    Json(json!({"token": "tok", "user_name": "Sam", "role": "employee", "tenant_id": "t-9"}))
                }),
            )
            .route(
                "/api/me/courses",
                get(|headers: HeaderMap| async move {
                    match headers.get("authorization").and_then(|v| v.to_str().ok()) {
                        Some("Bearer tok") => Ok(Json(json!([{"course": {"id": "c1", "title": "GDPR"}}]))),
                        _ => Err(StatusCode::UNAUTHORIZED),
                    }
                }),
            )
    }

    #[tokio::test]
    async fn test_login_persists_session() {
        let base = spawn_server(login_router()).await;
        let store = Store::new_in_memory().unwrap();
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (event_tx, mut event_rx) = mpsc::unbounded_channel();
        let mut backend = Backend::new(&fake_config(&base), store.clone(), cmd_rx, event_tx);

        let driver = async move {
            cmd_tx.send(AppCmd::Login { email: "sam@acme.test".into(), password: "pw".into() }).unwrap();
            let login = next_event(&mut event_rx).await;

            cmd_tx.send(AppCmd::FetchMyCourses).unwrap();
            let courses = next_event(&mut event_rx).await;
            (login, courses)
        };
        let (_, (login, courses)) = tokio::join!(backend.run(), driver);

        match login {
            AppEvent::LoggedIn(session) => assert_eq!(session.role, UserRole::Employee),
            other => panic!("Expected LoggedIn, got {:?}", other),
        }
        match courses {
            AppEvent::MyCoursesFetched(courses) => assert_eq!(courses[0].course.id, "c1"),
            other => panic!("Expected MyCoursesFetched, got {:?}", other),
        }
        let stored = store.session().unwrap().expect("Session should be stored");
        assert_eq!(stored.token, "tok");
        assert_eq!(store.active_tenant().unwrap().as_deref(), Some("t-9"));
    }

    #[tokio::test]
    async fn test_restored_session_and_logout() {
        let base = spawn_server(login_router()).await;
        let store = Store::new_in_memory().unwrap();
        store
            .save_session(&Session {
                token: "tok".into(),
                user_name: "Sam".into(),
                role: UserRole::Employee,
                tenant_id: None,
            })
            .unwrap();
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (event_tx, mut event_rx) = mpsc::unbounded_channel();
        let mut backend = Backend::new(&fake_config(&base), store.clone(), cmd_rx, event_tx);

        let driver = async move {
            cmd_tx.send(AppCmd::FetchMyCourses).unwrap();
            let courses = next_event(&mut event_rx).await;
            cmd_tx.send(AppCmd::Logout).unwrap();
            let logout = next_event(&mut event_rx).await;
            cmd_tx.send(AppCmd::FetchMyCourses).unwrap();
            let after = next_event(&mut event_rx).await;
            (courses, logout, after)
        };
        let (_, (courses, logout, after)) = tokio::join!(backend.run(), driver);

        assert!(matches!(courses, AppEvent::MyCoursesFetched(_)));
        assert!(matches!(logout, AppEvent::LoggedOut));
        match after {
            AppEvent::RequestFailed { error, .. } => {
                assert_eq!(error, AppError::Http { endpoint: "/me/courses".into(), status: 401 })
            }
            other => panic!("Expected RequestFailed, got {:?}", other),
        }
        assert_eq!(store.session().unwrap(), None);
    }

    #[tokio::test]
    async fn test_cancelled_scope_emits_nothing() {
        let router = Router::new()
            .route(
                "/api/me/courses",
                get(|| async {
                    tokio::time::sleep(Duration::from_millis(400)).await;
                    Json(json!([]))
                }),
            )
            .route("/api/contact", post(|| async { StatusCode::CREATED }));
        let base = spawn_server(router).await;
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (event_tx, mut event_rx) = mpsc::unbounded_channel();
        let mut backend = Backend::new(&fake_config(&base), Store::new_in_memory().unwrap(), cmd_rx, event_tx);

        let driver = async move {
            cmd_tx.send(AppCmd::FetchMyCourses).unwrap();
            cmd_tx.send(AppCmd::CancelScope(RequestScope::Employee)).unwrap();
            cmd_tx.send(AppCmd::SubmitContact(ContactRequest::default())).unwrap();
            let first = next_event(&mut event_rx).await;
            let late = tokio::time::timeout(Duration::from_millis(800), event_rx.recv()).await;
            drop(cmd_tx);
            (first, late)
        };
        let (_, (first, late)) = tokio::join!(backend.run(), driver);

        assert!(matches!(first, AppEvent::ContactSubmitted));
        assert!(!matches!(late, Ok(Some(AppEvent::MyCoursesFetched(_)))));
        assert_eq!(backend.in_flight_count(), 0);
    }

    #[tokio::test]
    async fn test_other_scopes_survive_cancellation() {
        let router = Router::new().route("/api/contact", post(|| async { StatusCode::CREATED }));
        let base = spawn_server(router).await;
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (event_tx, mut event_rx) = mpsc::unbounded_channel();
        let mut backend = Backend::new(&fake_config(&base), Store::new_in_memory().unwrap(), cmd_rx, event_tx);

        let driver = async move {
            cmd_tx.send(AppCmd::SubmitContact(ContactRequest::default())).unwrap();
            cmd_tx.send(AppCmd::CancelScope(RequestScope::Player)).unwrap();
            next_event(&mut event_rx).await
        };
        let (_, event) = tokio::join!(backend.run(), driver);
        assert!(matches!(event, AppEvent::ContactSubmitted));
    }

    #[tokio::test]
    async fn test_complete_course_reports_quiz_ready_or_failure() {
        let router = Router::new()
            .route("/api/courses/c1/material", get(|| async { Json(json!({"url": "https://files/c1.pptx"})) }))
            .route("/api/courses/c2/material", get(|| async { StatusCode::NOT_FOUND }))
            .route(
                "/ai/generate-mcqs",
                post(|| async {
                    Json(json!([{
                        "question": "Q",
                        "choices": {"a": "1", "b": "2", "c": "3", "d": "4"},
                        "correctAnswer": "a"
                    }]))
                }),
            );
        let base = spawn_server(router).await;
        let store = Store::new_in_memory().unwrap();
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (event_tx, mut event_rx) = mpsc::unbounded_channel();
        let mut backend = Backend::new(&fake_config(&base), store.clone(), cmd_rx, event_tx);

        let driver = async move {
            cmd_tx
                .send(AppCmd::CompleteCourse { course_id: "c1".into(), course_title: "Ethics".into() })
                .unwrap();
            let ready = next_event(&mut event_rx).await;
            cmd_tx
                .send(AppCmd::CompleteCourse { course_id: "c2".into(), course_title: "Missing".into() })
                .unwrap();
            let failed = next_event(&mut event_rx).await;
            (ready, failed)
        };
        let (_, (ready, failed)) = tokio::join!(backend.run(), driver);

        match ready {
            AppEvent::QuizReady { course_id, question_count } => {
                assert_eq!(course_id, "c1");
                assert_eq!(question_count, 1);
            }
            other => panic!("Expected QuizReady, got {:?}", other),
        }
        match failed {
            AppEvent::RequestFailed { op, error } => {
                assert_eq!(op, "generate quiz");
                assert_eq!(error, AppError::Http { endpoint: "/courses/c2/material".into(), status: 404 });
            }
            other => panic!("Expected RequestFailed, got {:?}", other),
        }
        assert_eq!(store.quiz_draft().unwrap().map(|d| d.course_id).as_deref(), Some("c1"));
    }
}
