use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    #[serde(alias = "superadmin", alias = "super-admin")]
    SuperAdmin,
    #[serde(alias = "admin", alias = "org-admin")]
    OrgAdmin,
    #[serde(alias = "user")]
    Employee,
}

impl UserRole {
    pub fn label(&self) -> &'static str {
        match self {
            UserRole::SuperAdmin => "Super Admin",
            UserRole::OrgAdmin => "Organization Admin",
            UserRole::Employee => "Employee",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Session {
    pub token: String,
    pub user_name: String,
    pub role: UserRole,
    #[serde(default)]
    pub tenant_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Tenant {
    pub id: String,
    pub name: String,
    pub admin_email: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewTenant {
    pub name: String,
    pub admin_email: String,
    pub admin_password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Course {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub slide_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewCourse {
    pub title: String,
    pub description: String,
    /// Location of the uploaded deck; conversion happens server-side.
    pub material_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Employee {
    pub id: String,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewEmployee {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AssignedCourse {
    pub course: Course,
    #[serde(default)]
    pub progress_percent: u8,
    #[serde(default)]
    pub completed: bool,
}

/// One unit of course content. Display order is the order received.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Slide {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub content: String,
    /// Set locally once the viewing gate opens; never sent back.
    #[serde(default, skip_serializing)]
    pub completed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Explanation {
    pub slide_id: String,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MaterialRef {
    pub url: String,
}

/// Everything the player needs for one course.
#[derive(Debug, Clone, PartialEq)]
pub struct CourseBundle {
    pub course: Course,
    pub slides: Vec<Slide>,
    pub explanations: Vec<Explanation>,
}

impl CourseBundle {
    pub fn explanation_for(&self, slide_id: &str) -> Option<&str> {
        self.explanations
            .iter()
            .find(|e| e.slide_id == slide_id)
            .map(|e| e.text.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ContactRequest {
    pub name: String,
    pub email: String,
    pub company: String,
    pub message: String,
}

impl ContactRequest {
    pub fn is_complete(&self) -> bool {
        !self.name.trim().is_empty() && self.email.contains('@') && !self.message.trim().is_empty()
    }
}
