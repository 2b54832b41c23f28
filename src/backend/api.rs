use reqwest::{Client, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, warn};

use crate::backend::config::Config;
use crate::backend::error::AppError;
use crate::backend::models::{
    AssignedCourse, ContactRequest, Course, Employee, Explanation, LoginRequest, MaterialRef, NewCourse,
    NewEmployee, NewTenant, Session, Slide, Tenant,
};
use crate::backend::quiz::Question;

/// Client for the course backend and the AI service. One attempt per call;
/// any non-2xx status becomes [`AppError::Http`].
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    api_base: String,
    ai_base: String,
    token: Option<String>,
}

#[derive(Serialize)]
struct AssignmentRequest<'a> {
    employee_ids: &'a [String],
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    material_url: &'a str,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum GenerateResponse {
    Wrapped { questions: Vec<Question> },
    Bare(Vec<Question>),
}

#[derive(Serialize)]
struct SpeechRequest<'a> {
    text: &'a str,
}

impl ApiClient {
    pub fn new(config: &Config) -> Self {
        Self {
            http: Client::new(),
            api_base: config.api_base_url.clone(),
            ai_base: config.ai_base_url.clone(),
            token: None,
        }
    }

    pub fn set_token(&mut self, token: Option<String>) {
        self.token = token;
    }

    fn api(&self, path: &str) -> String {
        format!("{}{}", self.api_base, path)
    }

    fn ai(&self, path: &str) -> String {
        format!("{}{}", self.ai_base, path)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, endpoint: &str, request: RequestBuilder) -> Result<Response, AppError> {
        debug!("Calling {endpoint}");
        let response = self.authorized(request).send().await?;
        let status = response.status();
        if !status.is_success() {
            warn!("{endpoint} failed with status {status}");
            return Err(AppError::Http {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, AppError> {
        let response = self.send(path, self.http.get(self.api(path))).await?;
        Ok(response.json().await?)
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T, AppError> {
        let response = self.send(path, self.http.post(self.api(path)).json(body)).await?;
        Ok(response.json().await?)
    }

    pub async fn login(&self, request: &LoginRequest) -> Result<Session, AppError> {
        self.post_json("/auth/login", request).await
    }

    pub async fn tenants(&self) -> Result<Vec<Tenant>, AppError> {
        self.get_json("/tenants").await
    }

    pub async fn create_tenant(&self, tenant: &NewTenant) -> Result<Tenant, AppError> {
        self.post_json("/tenants", tenant).await
    }

    pub async fn tenant_courses(&self, tenant_id: &str) -> Result<Vec<Course>, AppError> {
        self.get_json(&format!("/tenants/{tenant_id}/courses")).await
    }

    pub async fn create_course(&self, tenant_id: &str, course: &NewCourse) -> Result<Course, AppError> {
        self.post_json(&format!("/tenants/{tenant_id}/courses"), course).await
    }

    pub async fn employees(&self, tenant_id: &str) -> Result<Vec<Employee>, AppError> {
        self.get_json(&format!("/tenants/{tenant_id}/employees")).await
    }

    pub async fn add_employee(&self, tenant_id: &str, employee: &NewEmployee) -> Result<Employee, AppError> {
        self.post_json(&format!("/tenants/{tenant_id}/employees"), employee).await
    }

    pub async fn assign_course(&self, tenant_id: &str, course_id: &str, employee_ids: &[String]) -> Result<(), AppError> {
        let path = format!("/tenants/{tenant_id}/courses/{course_id}/assignments");
        let body = AssignmentRequest { employee_ids };
        self.send(&path, self.http.post(self.api(&path)).json(&body)).await?;
        Ok(())
    }

    pub async fn my_courses(&self) -> Result<Vec<AssignedCourse>, AppError> {
        self.get_json("/me/courses").await
    }

    pub async fn course(&self, course_id: &str) -> Result<Course, AppError> {
        self.get_json(&format!("/courses/{course_id}")).await
    }

    pub async fn slides(&self, course_id: &str) -> Result<Vec<Slide>, AppError> {
        self.get_json(&format!("/courses/{course_id}/slides")).await
    }

    pub async fn explanations(&self, course_id: &str) -> Result<Vec<Explanation>, AppError> {
        self.get_json(&format!("/courses/{course_id}/explanations")).await
    }

    pub async fn material(&self, course_id: &str) -> Result<MaterialRef, AppError> {
        self.get_json(&format!("/courses/{course_id}/material")).await
    }

    pub async fn submit_contact(&self, request: &ContactRequest) -> Result<(), AppError> {
        self.send("/contact", self.http.post(self.api("/contact")).json(request)).await?;
        Ok(())
    }

    pub async fn generate_questions(&self, material_url: &str) -> Result<Vec<Question>, AppError> {
        let endpoint = "/generate-mcqs";
        let request = self.http.post(self.ai(endpoint)).json(&GenerateRequest { material_url });
        let response = self.send(endpoint, request).await?;
        match response.json::<GenerateResponse>().await? {
            GenerateResponse::Wrapped { questions } | GenerateResponse::Bare(questions) => Ok(questions),
        }
    }

    /// Returns the synthesized audio and its content type.
    pub async fn synthesize_speech(&self, text: &str) -> Result<(Vec<u8>, String), AppError> {
        let endpoint = "/tts";
        let request = self.http.post(self.ai(endpoint)).json(&SpeechRequest { text });
        let response = self.send(endpoint, request).await?;
        let mime = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("audio/mpeg")
            .to_string();
        let bytes = response.bytes().await?;
        Ok((bytes.to_vec(), mime))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::models::UserRole;
    use crate::backend::test_support::{fake_config, spawn_server};
    use axum::{
        extract::Path,
        http::{HeaderMap, StatusCode},
        routing::{get, post},
        Json, Router,
    };
    use serde_json::{json, Value};

    #[tokio::test]
    async fn test_login_and_bearer_token() {
        let router = Router::new()
            .route(
                "/api/auth/login",
                post(|Json(body): Json<Value>| async move {
                    assert_eq!(body["email"], "admin@acme.test");
                    Json(json!({"token": "abc", "user_name": "Ada", "role": "admin", "tenant_id": "t-1"}))
                }),
            )
            .route(
                "/api/me/courses",
                get(|headers: HeaderMap| async move {
                    let auth = headers.get("authorization").and_then(|v| v.to_str().ok()).unwrap_or("");
                    if auth != "Bearer abc" {
                        return Err(StatusCode::UNAUTHORIZED);
                    }
                    Ok(Json(json!([{"course": {"id": "c1", "title": "Ethics"}, "progress_percent": 40}])))
                }),
            );
        let base = spawn_server(router).await;
        let mut client = ApiClient::new(&fake_config(&base));

        let session = client
            .login(&LoginRequest { email: "admin@acme.test".into(), password: "pw".into() })
            .await
            .expect("Failed to log in");
        assert_eq!(session.role, UserRole::OrgAdmin);
        assert_eq!(session.tenant_id.as_deref(), Some("t-1"));

        assert_eq!(
            client.my_courses().await,
            Err(AppError::Http { endpoint: "/me/courses".into(), status: 401 })
        );

        client.set_token(Some(session.token));
        let courses = client.my_courses().await.unwrap();
        assert_eq!(courses[0].course.title, "Ethics");
        assert_eq!(courses[0].progress_percent, 40);
    }

    #[tokio::test]
    async fn test_non_success_status_is_http_error() {
        let router = Router::new().route(
            "/api/courses/:id/slides",
            get(|Path(id): Path<String>| async move {
                assert_eq!(id, "c404");
                StatusCode::NOT_FOUND
            }),
        );
        let base = spawn_server(router).await;
        let client = ApiClient::new(&fake_config(&base));
        let err = client.slides("c404").await.unwrap_err();
        assert_eq!(err, AppError::Http { endpoint: "/courses/c404/slides".into(), status: 404 });
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_network_error() {
        let client = ApiClient::new(&fake_config("http://127.0.0.1:9"));
        assert!(matches!(client.tenants().await, Err(AppError::Network(_))));
    }

    #[tokio::test]
    async fn test_generate_questions_accepts_both_shapes() {
        let question = json!({
            "question": "Who approves gifts over $50?",
            "choices": {"a": "Nobody", "b": "Compliance", "c": "Your friend", "d": "The vendor"},
            "correctAnswer": "b"
        });
        let wrapped = question.clone();
        let router = Router::new()
            .route(
                "/ai/generate-mcqs",
                post(move |Json(body): Json<Value>| {
                    let wrapped = wrapped.clone();
                    async move {
                        if body["material_url"] == "bare" {
                            Json(json!([wrapped]))
                        } else {
                            Json(json!({"questions": [wrapped]}))
                        }
                    }
                }),
            );
        let base = spawn_server(router).await;
        let client = ApiClient::new(&fake_config(&base));

        let wrapped = client.generate_questions("https://files/deck.pptx").await.unwrap();
        let bare = client.generate_questions("bare").await.unwrap();
        assert_eq!(wrapped, bare);
        assert_eq!(wrapped.len(), 1);
    }

    #[tokio::test]
    async fn test_synthesize_speech_returns_bytes() {
        let router = Router::new().route(
            "/ai/tts",
            post(|| async { ([("content-type", "audio/wav")], vec![1u8, 2, 3]) }),
        );
        let base = spawn_server(router).await;
        let client = ApiClient::new(&fake_config(&base));
        let (bytes, mime) = client.synthesize_speech("Welcome to the course").await.unwrap();
        assert_eq!(bytes, vec![1, 2, 3]);
        assert_eq!(mime, "audio/wav");
    }

    #[tokio::test]
    async fn test_assign_course_posts_employee_ids() {
        let router = Router::new().route(
            "/api/tenants/:tenant/courses/:course/assignments",
            post(|Path((tenant, course)): Path<(String, String)>, Json(body): Json<Value>| async move {
                assert_eq!(tenant, "t-1");
                assert_eq!(course, "c1");
                assert_eq!(body["employee_ids"], json!(["e1", "e2"]));
                StatusCode::NO_CONTENT
            }),
        );
        let base = spawn_server(router).await;
        let client = ApiClient::new(&fake_config(&base));
        client
            .assign_course("t-1", "c1", &["e1".to_string(), "e2".to_string()])
            .await
            .expect("Failed to assign course");
    }
}
