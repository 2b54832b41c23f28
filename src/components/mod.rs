pub mod common;
pub mod contact_page;
pub mod course_player_page;
pub mod employee_page;
pub mod home_page;
pub mod login_page;
pub mod nav_bar;
pub mod org_admin_page;
pub mod quiz_page;
pub mod quiz_results_page;
pub mod super_admin_page;

use chrono::{DateTime, Utc};
use dioxus::prelude::*;
use tracing::warn;

use crate::backend::models::{AssignedCourse, Course, CourseBundle, Employee, Session, Tenant};
use crate::backend::error::AppError;
use crate::backend::store::Store;
use crate::backend::AppEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Toast {
    pub id: u64,
    pub kind: ToastKind,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Copy)]
pub struct AppState {
    pub session: Signal<Option<Session>>,
    pub toasts: Signal<Vec<Toast>>,
    pub next_toast_id: Signal<u64>,

    // Super admin
    pub tenants: Signal<Vec<Tenant>>,

    // Org admin
    pub tenant_courses: Signal<Vec<Course>>,
    pub employees: Signal<Vec<Employee>>,

    // Employee
    pub my_courses: Signal<Vec<AssignedCourse>>,

    // Player
    pub course_bundle: Signal<Option<CourseBundle>>,
    pub course_error: Signal<Option<AppError>>,
    pub generating_quiz: Signal<bool>,
    pub quiz_ready: Signal<Option<String>>, // course id
    pub speech: Signal<Option<(String, String)>>, // (slide id, data url)

    pub login_pending: Signal<bool>,
    pub contact_sent: Signal<bool>,
}

impl AppState {
    pub fn new(store: &Store) -> Self {
        let restored = store.session().unwrap_or_else(|e| {
            warn!("Could not restore session: {e}");
            None
        });

        Self {
            session: use_signal(|| restored),
            toasts: use_signal(Vec::new),
            next_toast_id: use_signal(|| 0),
            tenants: use_signal(Vec::new),
            tenant_courses: use_signal(Vec::new),
            employees: use_signal(Vec::new),
            my_courses: use_signal(Vec::new),
            course_bundle: use_signal(|| None),
            course_error: use_signal(|| None),
            generating_quiz: use_signal(|| false),
            quiz_ready: use_signal(|| None),
            speech: use_signal(|| None),
            login_pending: use_signal(|| false),
            contact_sent: use_signal(|| false),
        }
    }

    pub fn notify(&mut self, kind: ToastKind, message: impl Into<String>) {
        let id = (self.next_toast_id)();
        self.next_toast_id.set(id + 1);
        self.toasts.write().push(Toast {
            id,
            kind,
            message: message.into(),
            created_at: Utc::now(),
        });
    }

    pub fn dismiss(&mut self, id: u64) {
        self.toasts.write().retain(|t| t.id != id);
    }

    /// Folds a backend event into UI state.
    pub fn apply(&mut self, event: AppEvent) {
        match event {
            AppEvent::LoggedIn(session) => {
                self.login_pending.set(false);
                self.notify(ToastKind::Success, format!("Welcome, {}", session.user_name));
                self.session.set(Some(session));
            }
            AppEvent::LoggedOut => {
                self.session.set(None);
                self.tenants.write().clear();
                self.tenant_courses.write().clear();
                self.employees.write().clear();
                self.my_courses.write().clear();
                self.course_bundle.set(None);
            }
            AppEvent::TenantsFetched(tenants) => self.tenants.set(tenants),
            AppEvent::TenantCreated(tenant) => {
                self.notify(ToastKind::Success, format!("Organization {} created", tenant.name));
                self.tenants.write().push(tenant);
            }
            AppEvent::TenantCoursesFetched(courses) => self.tenant_courses.set(courses),
            AppEvent::CourseCreated(course) => {
                self.notify(ToastKind::Success, format!("Course {} created", course.title));
                self.tenant_courses.write().push(course);
            }
            AppEvent::EmployeesFetched(employees) => self.employees.set(employees),
            AppEvent::EmployeeAdded(employee) => {
                self.notify(ToastKind::Success, format!("{} added", employee.name));
                self.employees.write().push(employee);
            }
            AppEvent::CourseAssigned { employee_count, .. } => {
                self.notify(ToastKind::Success, format!("Course assigned to {employee_count} employee(s)"));
            }
            AppEvent::MyCoursesFetched(courses) => self.my_courses.set(courses),
            AppEvent::CourseLoaded(bundle) => {
                self.course_error.set(None);
                self.course_bundle.set(Some(bundle));
            }
            AppEvent::QuizReady { course_id, .. } => {
                self.generating_quiz.set(false);
                self.quiz_ready.set(Some(course_id));
            }
            AppEvent::SpeechReady { slide_id, data_url } => self.speech.set(Some((slide_id, data_url))),
            AppEvent::ContactSubmitted => {
                self.contact_sent.set(true);
                self.notify(ToastKind::Success, "Thanks! We'll be in touch shortly.");
            }
            AppEvent::RequestFailed { op, error } => {
                match op {
                    "login" => self.login_pending.set(false),
                    "generate quiz" => self.generating_quiz.set(false),
                    "load course" => self.course_error.set(Some(error.clone())),
                    _ => {}
                }
                self.notify(ToastKind::Error, error.user_message());
            }
        }
    }
}
