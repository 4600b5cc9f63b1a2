pub mod auth;
pub mod course;
pub mod user;

pub use auth::{AdminLoginRequest, AdminLoginResponse, AdminRegisterRequest};
pub use course::{
    ChapterRequest, Course, CourseChapter, CourseLesson, CourseRequest, CourseSection,
    LessonRequest, SectionRequest, SectionType,
};
pub use user::{CreateUserRequest, UpdateUserRequest, UserAccount, UserRole};
