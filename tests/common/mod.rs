#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, Response, header};
use serde_json::Value;

use nihongo_admin::api::router;
use nihongo_admin::cache::QueryCache;
use nihongo_admin::db;
use nihongo_admin::error::AppError;
use nihongo_admin::lms::LmsClient;
use nihongo_admin::models::*;
use nihongo_admin::session::SessionStore;
use nihongo_admin::state::AppState;

pub const FAKE_TOKEN: &str = "fake-admin-token";

#[derive(Default)]
pub struct FakeState {
    pub courses: Vec<Course>,
    pub users: Vec<UserAccount>,
    pub calls: Vec<String>,
    pub chapter_requests: Vec<(i64, ChapterRequest)>,
    pub section_requests: Vec<(i64, SectionRequest)>,
    pub lesson_requests: Vec<(i64, LessonRequest)>,
    pub user_requests: Vec<CreateUserRequest>,
    /// When set, every mutation and login answers with this status/message.
    pub reject_with: Option<(u16, String)>,
}

/// In-memory stand-in for the LMS backend.
#[derive(Default)]
pub struct FakeLms {
    pub state: Mutex<FakeState>,
}

impl FakeLms {
    pub fn with_courses(courses: Vec<Course>) -> Self {
        let lms = FakeLms::default();
        lms.state.lock().unwrap().courses = courses;
        lms
    }

    pub fn reject_with(&self, status: u16, message: &str) {
        self.state.lock().unwrap().reject_with = Some((status, message.to_string()));
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn count(&self, call: &str) -> usize {
        self.calls().iter().filter(|c| c.as_str() == call).count()
    }

    fn record(&self, call: &str) -> Result<(), AppError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(call.to_string());
        Ok(())
    }

    fn mutate(&self, call: &str) -> Result<(), AppError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(call.to_string());
        match &state.reject_with {
            Some((status, message)) => Err(AppError::request(*status, message.clone())),
            None => Ok(()),
        }
    }

    fn chapters(&self) -> Vec<CourseChapter> {
        let state = self.state.lock().unwrap();
        state
            .courses
            .iter()
            .flat_map(|c| c.chapters.iter().cloned())
            .collect()
    }

    fn sections(&self) -> Vec<CourseSection> {
        self.chapters()
            .into_iter()
            .flat_map(|ch| ch.sections.into_iter())
            .collect()
    }
}

#[async_trait]
impl LmsClient for FakeLms {
    async fn authenticate(&self, _req: &AdminLoginRequest) -> Result<AdminLoginResponse, AppError> {
        self.mutate("authenticate")?;
        Ok(AdminLoginResponse {
            token: FAKE_TOKEN.to_string(),
        })
    }

    async fn register_admin(&self, _req: &AdminRegisterRequest) -> Result<AdminLoginResponse, AppError> {
        self.mutate("register_admin")?;
        Ok(AdminLoginResponse {
            token: FAKE_TOKEN.to_string(),
        })
    }

    async fn fetch_courses(&self, _tree: bool) -> Result<Vec<Course>, AppError> {
        self.record("fetch_courses")?;
        Ok(self.state.lock().unwrap().courses.clone())
    }

    async fn create_course(&self, req: &CourseRequest) -> Result<Course, AppError> {
        self.mutate("create_course")?;
        let mut state = self.state.lock().unwrap();
        let id = state.courses.iter().map(|c| c.id).max().unwrap_or(0) + 1;
        let created = course(id, &req.name, vec![]);
        state.courses.push(created.clone());
        Ok(created)
    }

    async fn update_course(&self, id: i64, req: &CourseRequest) -> Result<Course, AppError> {
        self.mutate("update_course")?;
        Ok(course(id, &req.name, vec![]))
    }

    async fn delete_course(&self, id: i64) -> Result<(), AppError> {
        self.mutate("delete_course")?;
        self.state.lock().unwrap().courses.retain(|c| c.id != id);
        Ok(())
    }

    async fn fetch_chapters(&self) -> Result<Vec<CourseChapter>, AppError> {
        self.record("fetch_chapters")?;
        Ok(self.chapters())
    }

    async fn create_chapter(&self, course_id: i64, req: &ChapterRequest) -> Result<CourseChapter, AppError> {
        self.mutate("create_chapter")?;
        self.state
            .lock()
            .unwrap()
            .chapter_requests
            .push((course_id, req.clone()));
        Ok(CourseChapter {
            id: 100,
            course_id,
            title: req.title.clone(),
            description: req.description.clone(),
            chapter_order: req.chapter_order.unwrap_or_default(),
            sections: vec![],
        })
    }

    async fn update_chapter(&self, id: i64, req: &ChapterRequest) -> Result<CourseChapter, AppError> {
        self.mutate("update_chapter")?;
        Ok(chapter(id, 1, req.chapter_order.unwrap_or_default(), vec![]))
    }

    async fn delete_chapter(&self, _id: i64) -> Result<(), AppError> {
        self.mutate("delete_chapter")
    }

    async fn fetch_sections(&self, section_type: Option<SectionType>) -> Result<Vec<CourseSection>, AppError> {
        self.record("fetch_sections")?;
        Ok(self
            .sections()
            .into_iter()
            .filter(|s| section_type.is_none_or(|t| s.section_type == t))
            .collect())
    }

    async fn create_section(&self, chapter_id: i64, req: &SectionRequest) -> Result<CourseSection, AppError> {
        self.mutate("create_section")?;
        self.state
            .lock()
            .unwrap()
            .section_requests
            .push((chapter_id, req.clone()));
        Ok(section(
            200,
            chapter_id,
            req.section_type,
            req.section_order.unwrap_or_default(),
            vec![],
        ))
    }

    async fn update_section(&self, id: i64, req: &SectionRequest) -> Result<CourseSection, AppError> {
        self.mutate("update_section")?;
        Ok(section(id, 1, req.section_type, req.section_order.unwrap_or_default(), vec![]))
    }

    async fn delete_section(&self, _id: i64) -> Result<(), AppError> {
        self.mutate("delete_section")
    }

    async fn fetch_lessons(&self) -> Result<Vec<CourseLesson>, AppError> {
        self.record("fetch_lessons")?;
        Ok(self
            .sections()
            .into_iter()
            .flat_map(|s| s.lessons.into_iter())
            .collect())
    }

    async fn create_lesson(&self, section_id: i64, req: &LessonRequest) -> Result<CourseLesson, AppError> {
        self.mutate("create_lesson")?;
        self.state
            .lock()
            .unwrap()
            .lesson_requests
            .push((section_id, req.clone()));
        Ok(CourseLesson {
            id: 300,
            section_id,
            title: req.title.clone(),
            video_url: req.video_url.clone(),
            pdf_url: req.pdf_url.clone(),
            lesson_order: req.lesson_order.unwrap_or_default(),
        })
    }

    async fn update_lesson(&self, id: i64, req: &LessonRequest) -> Result<CourseLesson, AppError> {
        self.mutate("update_lesson")?;
        Ok(lesson(id, 1, req.lesson_order.unwrap_or_default()))
    }

    async fn delete_lesson(&self, _id: i64) -> Result<(), AppError> {
        self.mutate("delete_lesson")
    }

    async fn fetch_users(&self) -> Result<Vec<UserAccount>, AppError> {
        self.record("fetch_users")?;
        Ok(self.state.lock().unwrap().users.clone())
    }

    async fn create_user(&self, req: &CreateUserRequest) -> Result<UserAccount, AppError> {
        self.mutate("create_user")?;
        let mut state = self.state.lock().unwrap();
        state.user_requests.push(req.clone());
        let created = UserAccount {
            id: state.users.len() as i64 + 1,
            username: req.username.clone(),
            email: req.email.clone(),
            role: req.role.unwrap_or_default(),
            created_at: String::new(),
            updated_at: String::new(),
        };
        state.users.push(created.clone());
        Ok(created)
    }

    async fn update_user(&self, id: i64, req: &UpdateUserRequest) -> Result<UserAccount, AppError> {
        self.mutate("update_user")?;
        Ok(UserAccount {
            id,
            username: req.username.clone().unwrap_or_default(),
            email: req.email.clone().unwrap_or_default(),
            role: req.role.unwrap_or_default(),
            created_at: String::new(),
            updated_at: String::new(),
        })
    }

    async fn delete_user(&self, _id: i64) -> Result<(), AppError> {
        self.mutate("delete_user")
    }
}

pub fn lesson(id: i64, section_id: i64, order: i32) -> CourseLesson {
    CourseLesson {
        id,
        section_id,
        title: format!("Lesson {}", id),
        video_url: None,
        pdf_url: None,
        lesson_order: order,
    }
}

pub fn section(
    id: i64,
    chapter_id: i64,
    section_type: SectionType,
    order: i32,
    lessons: Vec<CourseLesson>,
) -> CourseSection {
    CourseSection {
        id,
        chapter_id,
        section_type,
        title: String::new(),
        section_order: order,
        lessons,
    }
}

pub fn chapter(id: i64, course_id: i64, order: i32, sections: Vec<CourseSection>) -> CourseChapter {
    CourseChapter {
        id,
        course_id,
        title: format!("Chapter {}", id),
        description: None,
        chapter_order: order,
        sections,
    }
}

pub fn course(id: i64, name: &str, chapters: Vec<CourseChapter>) -> Course {
    Course {
        id,
        thumbnail_url: None,
        name: name.to_string(),
        description: None,
        created_at: String::new(),
        updated_at: String::new(),
        chapters,
    }
}

/// Course 1 (N5) with chapters 10 and 11; chapter 10 holds a grammar section
/// (20) with two lessons and a kanji section (21).
pub fn sample_tree() -> Vec<Course> {
    vec![course(
        1,
        "JLPT N5",
        vec![
            chapter(
                10,
                1,
                1,
                vec![
                    section(
                        20,
                        10,
                        SectionType::Grammar,
                        1,
                        vec![lesson(30, 20, 1), lesson(31, 20, 2)],
                    ),
                    section(21, 10, SectionType::Kanji, 2, vec![]),
                ],
            ),
            chapter(11, 1, 2, vec![]),
        ],
    )]
}

pub async fn test_state(lms: Arc<FakeLms>, bypass_auth: bool) -> AppState {
    let pool = db::connect_in_memory().await.expect("in-memory db");
    AppState {
        session: SessionStore::new(pool.clone()),
        db: pool,
        lms,
        cache: QueryCache::new(Duration::from_secs(300), Duration::from_secs(1800)),
        bypass_auth,
    }
}

/// App state with a stored session token.
pub async fn signed_in_state(lms: Arc<FakeLms>) -> AppState {
    let state = test_state(lms, false).await;
    state.session.set_token(FAKE_TOKEN).await.unwrap();
    state
}

pub fn app(state: &AppState) -> Router {
    router(state.clone())
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn location(response: &Response<Body>) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .expect("redirect location")
        .to_str()
        .unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
