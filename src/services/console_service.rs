use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::cache::{QueryCache, QueryKey};
use crate::error::AppError;
use crate::lms::LmsClient;
use crate::models::*;
use crate::projection::{self, RouteSelection};
use crate::views::{self, ChapterBoard, CourseView, LessonBoard, SectionBoard, UserDirectory};

const MIN_USERNAME_LEN: usize = 3;
const MIN_PASSWORD_LEN: usize = 6;

/// Reads go through the query cache; every successful write drops the cached
/// queries it could have affected.
pub struct ConsoleService {
    lms: Arc<dyn LmsClient>,
    cache: QueryCache,
}

impl ConsoleService {
    pub fn new(lms: Arc<dyn LmsClient>, cache: QueryCache) -> Self {
        Self { lms, cache }
    }

    pub async fn course_tree(&self) -> Result<Vec<Course>, AppError> {
        self.cache
            .fetch(QueryKey::Courses, || self.lms.fetch_courses(true))
            .await
    }

    pub async fn chapters(&self) -> Result<Vec<CourseChapter>, AppError> {
        self.cache
            .fetch(QueryKey::Chapters, || self.lms.fetch_chapters())
            .await
    }

    pub async fn sections(&self, section_type: Option<SectionType>) -> Result<Vec<CourseSection>, AppError> {
        self.cache
            .fetch(QueryKey::Sections(section_type), || {
                self.lms.fetch_sections(section_type)
            })
            .await
    }

    pub async fn lessons(&self) -> Result<Vec<CourseLesson>, AppError> {
        self.cache
            .fetch(QueryKey::Lessons, || self.lms.fetch_lessons())
            .await
    }

    pub async fn users(&self) -> Result<Vec<UserAccount>, AppError> {
        self.cache
            .fetch(QueryKey::Users, || self.lms.fetch_users())
            .await
    }

    pub async fn course_view(&self, selection: &RouteSelection) -> Result<CourseView, AppError> {
        debug!("projecting {:?} view", selection.level());
        let courses = self.course_tree().await?;
        let view = projection::project(&courses, selection);
        if let CourseView::NotFound { missing, .. } = &view {
            warn!("route {:?} did not resolve: {:?} missing", selection, missing);
        }
        Ok(view)
    }

    pub async fn section_board(&self, section_type: SectionType) -> Result<SectionBoard, AppError> {
        let sections = self.sections(Some(section_type)).await?;
        let chapters = self.chapters().await?;
        Ok(views::section_board(section_type, sections, &chapters))
    }

    pub async fn lesson_board(&self) -> Result<LessonBoard, AppError> {
        let lessons = self.lessons().await?;
        let sections = self.sections(None).await?;
        Ok(views::lesson_board(lessons, &sections))
    }

    pub async fn chapter_board(&self) -> Result<ChapterBoard, AppError> {
        let chapters = self.chapters().await?;
        let course_names: HashMap<i64, String> = self
            .course_tree()
            .await?
            .into_iter()
            .map(|c| (c.id, c.name))
            .collect();
        Ok(views::chapter_board(chapters, &course_names))
    }

    pub async fn user_directory(&self) -> Result<UserDirectory, AppError> {
        Ok(views::user_directory(self.users().await?))
    }

    async fn content_changed(&self, action: &str) {
        info!("{} succeeded, invalidating content queries", action);
        self.cache.invalidate_content().await;
    }

    async fn users_changed(&self, action: &str) {
        info!("{} succeeded, invalidating user queries", action);
        self.cache.invalidate(QueryKey::Users).await;
    }

    pub async fn create_course(&self, req: CourseRequest) -> Result<Course, AppError> {
        require_text(&req.name, "Course name")?;
        let course = self.lms.create_course(&req).await?;
        self.content_changed("create course").await;
        Ok(course)
    }

    pub async fn update_course(&self, id: i64, req: CourseRequest) -> Result<Course, AppError> {
        require_text(&req.name, "Course name")?;
        let course = self.lms.update_course(id, &req).await?;
        self.content_changed("update course").await;
        Ok(course)
    }

    pub async fn delete_course(&self, id: i64) -> Result<(), AppError> {
        self.lms.delete_course(id).await?;
        self.content_changed("delete course").await;
        Ok(())
    }

    pub async fn create_chapter(&self, course_id: i64, mut req: ChapterRequest) -> Result<CourseChapter, AppError> {
        require_text(&req.title, "Chapter title")?;
        if req.chapter_order.is_none() {
            let courses = self.course_tree().await?;
            req.chapter_order = Some(projection::next_chapter_order(&courses, course_id));
        }
        let chapter = self.lms.create_chapter(course_id, &req).await?;
        self.content_changed("create chapter").await;
        Ok(chapter)
    }

    pub async fn update_chapter(&self, id: i64, req: ChapterRequest) -> Result<CourseChapter, AppError> {
        require_text(&req.title, "Chapter title")?;
        let chapter = self.lms.update_chapter(id, &req).await?;
        self.content_changed("update chapter").await;
        Ok(chapter)
    }

    pub async fn delete_chapter(&self, id: i64) -> Result<(), AppError> {
        self.lms.delete_chapter(id).await?;
        self.content_changed("delete chapter").await;
        Ok(())
    }

    pub async fn create_section(&self, chapter_id: i64, mut req: SectionRequest) -> Result<CourseSection, AppError> {
        if req.section_order.is_none() {
            let courses = self.course_tree().await?;
            req.section_order = Some(projection::next_section_order(&courses, chapter_id));
        }
        let section = self.lms.create_section(chapter_id, &req).await?;
        self.content_changed("create section").await;
        Ok(section)
    }

    pub async fn update_section(&self, id: i64, req: SectionRequest) -> Result<CourseSection, AppError> {
        let section = self.lms.update_section(id, &req).await?;
        self.content_changed("update section").await;
        Ok(section)
    }

    pub async fn delete_section(&self, id: i64) -> Result<(), AppError> {
        self.lms.delete_section(id).await?;
        self.content_changed("delete section").await;
        Ok(())
    }

    pub async fn create_lesson(&self, section_id: i64, mut req: LessonRequest) -> Result<CourseLesson, AppError> {
        require_text(&req.title, "Lesson title")?;
        if req.lesson_order.is_none() {
            let courses = self.course_tree().await?;
            req.lesson_order = Some(projection::next_lesson_order(&courses, section_id));
        }
        let lesson = self.lms.create_lesson(section_id, &req).await?;
        self.content_changed("create lesson").await;
        Ok(lesson)
    }

    pub async fn update_lesson(&self, id: i64, req: LessonRequest) -> Result<CourseLesson, AppError> {
        require_text(&req.title, "Lesson title")?;
        let lesson = self.lms.update_lesson(id, &req).await?;
        self.content_changed("update lesson").await;
        Ok(lesson)
    }

    pub async fn delete_lesson(&self, id: i64) -> Result<(), AppError> {
        self.lms.delete_lesson(id).await?;
        self.content_changed("delete lesson").await;
        Ok(())
    }

    pub async fn create_user(&self, req: CreateUserRequest) -> Result<UserAccount, AppError> {
        let req = CreateUserRequest {
            username: req.username.trim().to_string(),
            email: req.email.trim().to_string(),
            password: req.password,
            role: Some(req.role.unwrap_or_default()),
        };
        check_username(&req.username)?;
        require_text(&req.email, "Email")?;
        check_password(&req.password)?;

        let user = self.lms.create_user(&req).await?;
        self.users_changed("create user").await;
        Ok(user)
    }

    pub async fn update_user(&self, id: i64, req: UpdateUserRequest) -> Result<UserAccount, AppError> {
        let req = UpdateUserRequest {
            username: req.username.map(|u| u.trim().to_string()),
            email: req.email.map(|e| e.trim().to_string()),
            password: req.password,
            role: req.role,
        };
        if let Some(username) = &req.username {
            check_username(username)?;
        }
        if let Some(email) = &req.email {
            require_text(email, "Email")?;
        }
        if let Some(password) = &req.password {
            check_password(password)?;
        }

        let user = self.lms.update_user(id, &req).await?;
        self.users_changed("update user").await;
        Ok(user)
    }

    pub async fn delete_user(&self, id: i64) -> Result<(), AppError> {
        self.lms.delete_user(id).await?;
        self.users_changed("delete user").await;
        Ok(())
    }
}

fn require_text(value: &str, field: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::BadRequest(format!("{} is required", field)));
    }
    Ok(())
}

fn check_username(username: &str) -> Result<(), AppError> {
    if username.trim().chars().count() < MIN_USERNAME_LEN {
        return Err(AppError::BadRequest(format!(
            "Username must be at least {} characters",
            MIN_USERNAME_LEN
        )));
    }
    Ok(())
}

fn check_password(password: &str) -> Result<(), AppError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::BadRequest(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}
