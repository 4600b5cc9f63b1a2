pub mod dto;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, error, warn};

use crate::error::AppError;
use crate::models::*;
use crate::session::SessionStore;

pub const API_PREFIX: &str = "/api/v1";

#[derive(Clone, Debug)]
pub struct LmsConfig {
    pub base_url: String,
}

impl LmsConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

/// Every call the console makes against the LMS backend.
#[async_trait]
pub trait LmsClient: Send + Sync {
    async fn authenticate(&self, req: &AdminLoginRequest) -> Result<AdminLoginResponse, AppError>;
    async fn register_admin(&self, req: &AdminRegisterRequest) -> Result<AdminLoginResponse, AppError>;

    async fn fetch_courses(&self, tree: bool) -> Result<Vec<Course>, AppError>;
    async fn create_course(&self, req: &CourseRequest) -> Result<Course, AppError>;
    async fn update_course(&self, id: i64, req: &CourseRequest) -> Result<Course, AppError>;
    async fn delete_course(&self, id: i64) -> Result<(), AppError>;

    async fn fetch_chapters(&self) -> Result<Vec<CourseChapter>, AppError>;
    async fn create_chapter(&self, course_id: i64, req: &ChapterRequest) -> Result<CourseChapter, AppError>;
    async fn update_chapter(&self, id: i64, req: &ChapterRequest) -> Result<CourseChapter, AppError>;
    async fn delete_chapter(&self, id: i64) -> Result<(), AppError>;

    async fn fetch_sections(&self, section_type: Option<SectionType>) -> Result<Vec<CourseSection>, AppError>;
    async fn create_section(&self, chapter_id: i64, req: &SectionRequest) -> Result<CourseSection, AppError>;
    async fn update_section(&self, id: i64, req: &SectionRequest) -> Result<CourseSection, AppError>;
    async fn delete_section(&self, id: i64) -> Result<(), AppError>;

    async fn fetch_lessons(&self) -> Result<Vec<CourseLesson>, AppError>;
    async fn create_lesson(&self, section_id: i64, req: &LessonRequest) -> Result<CourseLesson, AppError>;
    async fn update_lesson(&self, id: i64, req: &LessonRequest) -> Result<CourseLesson, AppError>;
    async fn delete_lesson(&self, id: i64) -> Result<(), AppError>;

    async fn fetch_users(&self) -> Result<Vec<UserAccount>, AppError>;
    async fn create_user(&self, req: &CreateUserRequest) -> Result<UserAccount, AppError>;
    async fn update_user(&self, id: i64, req: &UpdateUserRequest) -> Result<UserAccount, AppError>;
    async fn delete_user(&self, id: i64) -> Result<(), AppError>;
}

pub struct LmsHttpClient {
    client: Client,
    config: LmsConfig,
    session: SessionStore,
}

impl LmsHttpClient {
    pub fn new(config: LmsConfig, session: SessionStore) -> Result<Self, AppError> {
        let client = Client::builder()
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build http client: {}", e)))?;
        Ok(Self {
            client,
            config,
            session,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}{}", self.config.base_url, API_PREFIX, path)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, AppError> {
        self.request::<T, ()>(Method::GET, path, None, true).await
    }

    async fn post<T, B>(&self, path: &str, body: &B) -> Result<T, AppError>
    where
        T: DeserializeOwned,
        B: Serialize + Sync,
    {
        self.request(Method::POST, path, Some(body), true).await
    }

    async fn put<T, B>(&self, path: &str, body: &B) -> Result<T, AppError>
    where
        T: DeserializeOwned,
        B: Serialize + Sync,
    {
        self.request(Method::PUT, path, Some(body), true).await
    }

    async fn delete(&self, path: &str) -> Result<(), AppError> {
        self.request::<(), ()>(Method::DELETE, path, None, true).await
    }

    /// The single request helper: bearer auth, envelope unwrapping, typed
    /// errors, and token clearing on 401.
    async fn request<T, B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        auth_required: bool,
    ) -> Result<T, AppError>
    where
        T: DeserializeOwned,
        B: Serialize + Sync,
    {
        let url = self.url(path);
        debug!("{} {}", method, url);

        let mut builder = self
            .client
            .request(method.clone(), &url)
            .header(CONTENT_TYPE, "application/json");

        if auth_required {
            if let Some(token) = self.session.get_token().await? {
                builder = builder.bearer_auth(token);
            }
        }

        if let Some(body) = body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| {
            warn!("{} {} failed: {}", method, url, e);
            AppError::Network(e.to_string())
        })?;

        let status = response.status();
        let body_text = response.text().await.map_err(|e| {
            warn!("{} {} body could not be read: {}", method, url, e);
            AppError::Network(e.to_string())
        })?;
        let envelope = serde_json::from_str::<dto::ApiResponse>(&body_text).ok();

        if !status.is_success() {
            let message = envelope
                .as_ref()
                .and_then(|e| e.message.clone())
                .filter(|m| !m.is_empty())
                .or_else(|| status.canonical_reason().map(str::to_string))
                .unwrap_or_else(|| "Request failed".to_string());

            if status == StatusCode::UNAUTHORIZED && auth_required {
                warn!("{} {} rejected the session, clearing token", method, url);
                self.session.clear_token().await?;
            }

            if let Some(code) = envelope.as_ref().and_then(|e| e.error_code.as_deref()) {
                debug!("LMS error code {} for {} {}", code, method, url);
            }

            return Err(AppError::request(status.as_u16(), message));
        }

        let data = match envelope {
            Some(envelope) => envelope.data,
            None if status == StatusCode::NO_CONTENT => serde_json::Value::Null,
            None => return Err(AppError::request(500, "Invalid empty response")),
        };

        serde_json::from_value(data).map_err(|e| {
            error!("Failed to parse {} {} response: {}", method, url, e);
            AppError::request(500, format!("Failed to parse LMS response: {}", e))
        })
    }
}

#[async_trait]
impl LmsClient for LmsHttpClient {
    async fn authenticate(&self, req: &AdminLoginRequest) -> Result<AdminLoginResponse, AppError> {
        self.request(Method::POST, "/auth/authenticate", Some(req), false)
            .await
    }

    async fn register_admin(&self, req: &AdminRegisterRequest) -> Result<AdminLoginResponse, AppError> {
        self.request(Method::POST, "/auth/register-admin", Some(req), false)
            .await
    }

    async fn fetch_courses(&self, tree: bool) -> Result<Vec<Course>, AppError> {
        self.get(&format!("/courses?tree={}", tree)).await
    }

    async fn create_course(&self, req: &CourseRequest) -> Result<Course, AppError> {
        self.post("/courses", req).await
    }

    async fn update_course(&self, id: i64, req: &CourseRequest) -> Result<Course, AppError> {
        self.put(&format!("/courses/{}", id), req).await
    }

    async fn delete_course(&self, id: i64) -> Result<(), AppError> {
        self.delete(&format!("/courses/{}", id)).await
    }

    async fn fetch_chapters(&self) -> Result<Vec<CourseChapter>, AppError> {
        self.get("/chapters").await
    }

    async fn create_chapter(&self, course_id: i64, req: &ChapterRequest) -> Result<CourseChapter, AppError> {
        self.post(&format!("/courses/{}/chapters", course_id), req).await
    }

    async fn update_chapter(&self, id: i64, req: &ChapterRequest) -> Result<CourseChapter, AppError> {
        self.put(&format!("/chapters/{}", id), req).await
    }

    async fn delete_chapter(&self, id: i64) -> Result<(), AppError> {
        self.delete(&format!("/chapters/{}", id)).await
    }

    async fn fetch_sections(&self, section_type: Option<SectionType>) -> Result<Vec<CourseSection>, AppError> {
        match section_type {
            Some(t) => self.get(&format!("/sections?type={}", t)).await,
            None => self.get("/sections").await,
        }
    }

    async fn create_section(&self, chapter_id: i64, req: &SectionRequest) -> Result<CourseSection, AppError> {
        self.post(&format!("/chapters/{}/sections", chapter_id), req).await
    }

    async fn update_section(&self, id: i64, req: &SectionRequest) -> Result<CourseSection, AppError> {
        self.put(&format!("/sections/{}", id), req).await
    }

    async fn delete_section(&self, id: i64) -> Result<(), AppError> {
        self.delete(&format!("/sections/{}", id)).await
    }

    async fn fetch_lessons(&self) -> Result<Vec<CourseLesson>, AppError> {
        self.get("/lessons").await
    }

    async fn create_lesson(&self, section_id: i64, req: &LessonRequest) -> Result<CourseLesson, AppError> {
        self.post(&format!("/sections/{}/lessons", section_id), req).await
    }

    async fn update_lesson(&self, id: i64, req: &LessonRequest) -> Result<CourseLesson, AppError> {
        self.put(&format!("/lessons/{}", id), req).await
    }

    async fn delete_lesson(&self, id: i64) -> Result<(), AppError> {
        self.delete(&format!("/lessons/{}", id)).await
    }

    async fn fetch_users(&self) -> Result<Vec<UserAccount>, AppError> {
        self.get("/users").await
    }

    async fn create_user(&self, req: &CreateUserRequest) -> Result<UserAccount, AppError> {
        self.post("/users", req).await
    }

    async fn update_user(&self, id: i64, req: &UpdateUserRequest) -> Result<UserAccount, AppError> {
        self.put(&format!("/users/{}", id), req).await
    }

    async fn delete_user(&self, id: i64) -> Result<(), AppError> {
        self.delete(&format!("/users/{}", id)).await
    }
}
