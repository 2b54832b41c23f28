use std::collections::BTreeSet;
use dioxus::core::use_drop;

use dioxus::prelude::*;
use tokio::sync::mpsc::UnboundedSender;
use tracing::warn;

use crate::backend::error::{AppError, MissingState};
use crate::backend::models::{NewCourse, NewEmployee};
use crate::backend::store::Store;
use crate::backend::{AppCmd, RequestScope};
use crate::components::common::BlockingError;
use crate::components::{AppState, ToastKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tab {
    Courses,
    Employees,
    Assign,
}

/// The tenant the dashboard works on, as persisted at login.
fn resolve_tenant(store: &Store) -> Result<String, AppError> {
    store
        .active_tenant()?
        .filter(|t| !t.is_empty())
        .ok_or(AppError::MissingState(MissingState::TenantId))
}

#[component]
pub fn OrgAdminComponent() -> Element {
    let app_state = use_context::<AppState>();
    let store = use_context::<Store>();
    let cmd_tx = use_context::<UnboundedSender<AppCmd>>();
    // Re-read whenever the session changes
    let _ = app_state.session.read();
    let tenant = resolve_tenant(&store);

    let fetch_tx = cmd_tx.clone();
    let fetch_tenant = tenant.as_ref().ok().cloned();
    use_hook(move || {
        if let Some(tenant_id) = fetch_tenant {
            let _ = fetch_tx.send(AppCmd::FetchTenantCourses { tenant_id: tenant_id.clone() });
            let _ = fetch_tx.send(AppCmd::FetchEmployees { tenant_id });
        }
    });

    let drop_tx = cmd_tx.clone();
    use_drop(move || {
        let _ = drop_tx.send(AppCmd::CancelScope(RequestScope::OrgAdmin));
    });

    let mut tab = use_signal(|| Tab::Courses);

    let tenant_id = match tenant {
        Ok(tenant_id) => tenant_id,
        Err(error) => {
            warn!("Organization dashboard without a tenant: {error}");
            return rsx! {
                BlockingError { title: "No organization".to_string(), message: error.user_message() }
            };
        }
    };

    let tab_button = |label: &'static str, target: Tab| {
        let class = if tab() == target { "tab tab-active" } else { "tab" };
        rsx! {
            button { class: "{class}", onclick: move |_| tab.set(target), "{label}" }
        }
    };

    rsx! {
        div { class: "page-container py-8 animate-fade-in",
            div { class: "page-header",
                h1 { class: "page-title", "Organization dashboard" }
                p { class: "text-[var(--text-secondary)] mt-1",
                    "{app_state.tenant_courses.read().len()} courses · {app_state.employees.read().len()} employees"
                }
            }
            div { class: "tabs mb-6",
                {tab_button("Courses", Tab::Courses)}
                {tab_button("Employees", Tab::Employees)}
                {tab_button("Assign", Tab::Assign)}
            }
            match tab() {
                Tab::Courses => rsx! { CoursesPanel { tenant_id: tenant_id.clone() } },
                Tab::Employees => rsx! { EmployeesPanel { tenant_id: tenant_id.clone() } },
                Tab::Assign => rsx! { AssignPanel { tenant_id: tenant_id.clone() } },
            }
        }
    }
}

#[component]
fn CoursesPanel(tenant_id: String) -> Element {
    let mut app_state = use_context::<AppState>();
    let cmd_tx = use_context::<UnboundedSender<AppCmd>>();
    let mut title = use_signal(String::new);
    let mut description = use_signal(String::new);
    let mut material_url = use_signal(String::new);

    let courses = app_state.tenant_courses.read().clone();

    let on_create = move |_| {
        let course = NewCourse {
            title: title().trim().to_string(),
            description: description().trim().to_string(),
            material_url: material_url().trim().to_string(),
        };
        if course.title.is_empty() || course.material_url.is_empty() {
            app_state.notify(ToastKind::Error, "A course needs a title and its uploaded material.");
            return;
        }
        let _ = cmd_tx.send(AppCmd::CreateCourse { tenant_id: tenant_id.clone(), course });
        title.set(String::new());
        description.set(String::new());
        material_url.set(String::new());
    };

    rsx! {
        div { class: "grid grid-cols-1 lg:grid-cols-3 gap-6",
            div { class: "panel lg:col-span-2",
                h3 { class: "panel-title mb-3", "Courses" }
                if courses.is_empty() {
                    div { class: "empty-state",
                        div { class: "empty-state-icon", "📚" }
                        p { class: "empty-state-title", "No courses yet" }
                    }
                }
                for course in courses {
                    div { key: "{course.id}", class: "list-row",
                        div {
                            p { class: "font-medium", "{course.title}" }
                            p { class: "text-xs text-[var(--text-secondary)]", "{course.description}" }
                        }
                        span { class: "badge", "{course.slide_count} slides" }
                    }
                }
            }
            div { class: "panel",
                h3 { class: "panel-title mb-3", "New course" }
                div { class: "grid gap-3",
                    input { class: "input", placeholder: "Title", value: "{title}", oninput: move |e| title.set(e.value()) }
                    textarea {
                        class: "input",
                        placeholder: "Description",
                        value: "{description}",
                        oninput: move |e| description.set(e.value())
                    }
                    input {
                        class: "input",
                        placeholder: "Uploaded deck URL",
                        value: "{material_url}",
                        oninput: move |e| material_url.set(e.value())
                    }
                    button { class: "btn btn-primary", onclick: on_create, "Create course" }
                }
            }
        }
    }
}

#[component]
fn EmployeesPanel(tenant_id: String) -> Element {
    let mut app_state = use_context::<AppState>();
    let cmd_tx = use_context::<UnboundedSender<AppCmd>>();
    let mut name = use_signal(String::new);
    let mut email = use_signal(String::new);

    let employees = app_state.employees.read().clone();

    let on_add = move |_| {
        let employee = NewEmployee {
            name: name().trim().to_string(),
            email: email().trim().to_string(),
        };
        if employee.name.is_empty() || !employee.email.contains('@') {
            app_state.notify(ToastKind::Error, "Enter the employee's name and email.");
            return;
        }
        let _ = cmd_tx.send(AppCmd::AddEmployee { tenant_id: tenant_id.clone(), employee });
        name.set(String::new());
        email.set(String::new());
    };

    rsx! {
        div { class: "grid grid-cols-1 lg:grid-cols-3 gap-6",
            div { class: "panel lg:col-span-2",
                h3 { class: "panel-title mb-3", "Employees" }
                if employees.is_empty() {
                    div { class: "empty-state",
                        div { class: "empty-state-icon", "👥" }
                        p { class: "empty-state-title", "No employees yet" }
                    }
                }
                for employee in employees {
                    div { key: "{employee.id}", class: "list-row",
                        p { class: "font-medium", "{employee.name}" }
                        p { class: "text-xs text-[var(--text-secondary)]", "{employee.email}" }
                    }
                }
            }
            div { class: "panel",
                h3 { class: "panel-title mb-3", "Add employee" }
                div { class: "grid gap-3",
                    input { class: "input", placeholder: "Full name", value: "{name}", oninput: move |e| name.set(e.value()) }
                    input {
                        class: "input",
                        "type": "email",
                        placeholder: "Email",
                        value: "{email}",
                        oninput: move |e| email.set(e.value())
                    }
                    button { class: "btn btn-primary", onclick: on_add, "Add employee" }
                }
            }
        }
    }
}

#[component]
fn AssignPanel(tenant_id: String) -> Element {
    let mut app_state = use_context::<AppState>();
    let cmd_tx = use_context::<UnboundedSender<AppCmd>>();
    let mut course_id = use_signal(String::new);
    let mut selected = use_signal(BTreeSet::<String>::new);

    let courses = app_state.tenant_courses.read().clone();
    let employees = app_state.employees.read().clone();

    let on_assign = move |_| {
        let course = course_id();
        let employee_ids: Vec<String> = selected.read().iter().cloned().collect();
        if course.is_empty() || employee_ids.is_empty() {
            app_state.notify(ToastKind::Error, "Pick a course and at least one employee.");
            return;
        }
        let _ = cmd_tx.send(AppCmd::AssignCourse {
            tenant_id: tenant_id.clone(),
            course_id: course,
            employee_ids,
        });
        selected.write().clear();
    };

    rsx! {
        div { class: "panel max-w-2xl",
            h3 { class: "panel-title mb-3", "Assign a course" }
            div { class: "grid gap-4",
                select {
                    class: "input",
                    value: "{course_id}",
                    onchange: move |e| course_id.set(e.value()),
                    option { value: "", "Select a course" }
                    for course in courses {
                        option { key: "{course.id}", value: "{course.id}", "{course.title}" }
                    }
                }
                div { class: "space-y-1",
                    for employee in employees {
                        {
                            let id = employee.id.clone();
                            let checked = selected.read().contains(&id);
                            rsx! {
                                label { key: "{employee.id}", class: "checkbox-row",
                                    input {
                                        "type": "checkbox",
                                        checked,
                                        onchange: move |_| {
                                            let mut set = selected.write();
                                            if !set.remove(&id) {
                                                set.insert(id.clone());
                                            }
                                        }
                                    }
                                    span { "{employee.name} ({employee.email})" }
                                }
                            }
                        }
                    }
                }
                button { class: "btn btn-primary", onclick: on_assign, "Assign" }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::models::{Session, UserRole};

    fn session(tenant: Option<&str>) -> Session {
        Session {
            token: "tok".to_string(),
            user_name: "Priya".to_string(),
            role: UserRole::OrgAdmin,
            tenant_id: tenant.map(str::to_string),
        }
    }

    #[test]
    fn test_tenant_comes_from_store() {
        let store = Store::new_in_memory().unwrap();
        store.save_session(&session(Some("t1"))).unwrap();
        assert_eq!(resolve_tenant(&store).unwrap(), "t1");
    }

    #[test]
    fn test_missing_tenant_blocks() {
        let store = Store::new_in_memory().unwrap();
        assert!(matches!(
            resolve_tenant(&store),
            Err(AppError::MissingState(MissingState::TenantId))
        ));

        store.save_session(&session(None)).unwrap();
        assert!(resolve_tenant(&store).is_err());

        store.save_session(&session(Some("t1"))).unwrap();
        store.clear_session().unwrap();
        let err = resolve_tenant(&store).unwrap_err();
        assert_eq!(err.recovery(), crate::backend::error::Recovery::Blocking);
    }
}
