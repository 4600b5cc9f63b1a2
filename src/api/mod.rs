use axum::extract::{Path, Request, State};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::{post, put};
use axum::{Json, Router, http::StatusCode, routing::get};
use tracing::{info, warn};

use crate::error::AppError;
use crate::models::*;
use crate::projection::RouteSelection;
use crate::state::AppState;
use crate::views::{ChapterBoard, CourseView, LessonBoard, SectionBoard, UserDirectory};

pub const LOGIN_PATH: &str = "/login";
pub const HOME_PATH: &str = "/courses";

pub fn router(state: AppState) -> Router {
    let guarded = Router::new()
        .route("/courses", get(list_courses).post(create_course))
        .route(
            "/courses/{course_id}",
            get(course_detail).put(update_course).delete(delete_course),
        )
        .route("/courses/{course_id}/chapters", post(create_chapter))
        .route("/courses/{course_id}/chapters/{chapter_id}", get(chapter_detail))
        .route(
            "/courses/{course_id}/chapters/{chapter_id}/sections/{section_id}",
            get(section_detail),
        )
        .route("/chapters", get(chapter_board))
        .route("/chapters/{id}", put(update_chapter).delete(delete_chapter))
        .route("/chapters/{id}/sections", post(create_section))
        .route("/grammar", get(grammar_board))
        .route("/vocabulary", get(vocabulary_board))
        .route("/kanji", get(kanji_board))
        .route("/sections/{id}", put(update_section).delete(delete_section))
        .route("/sections/{id}/lessons", post(create_lesson))
        .route("/lessons", get(lesson_board))
        .route("/lessons/{id}", put(update_lesson).delete(delete_lesson))
        .route("/users", get(list_users).post(create_user))
        .route("/users/{id}", put(update_user).delete(delete_user))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_session));

    Router::new()
        .route("/health", get(health))
        .route("/", get(home))
        .route("/login", post(login))
        .route("/register", post(register))
        .route("/logout", post(logout))
        .merge(guarded)
        .fallback(not_found)
        .with_state(state)
}

async fn not_found() -> AppError {
    AppError::NotFound
}

/// Sends visitors without a stored token to the login screen.
async fn require_session(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if state.bypass_auth || state.session.is_authenticated().await? {
        return Ok(next.run(request).await);
    }
    info!("no session for {}, redirecting to login", request.uri().path());
    Ok(Redirect::to(LOGIN_PATH).into_response())
}

async fn health(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    sqlx::query("select 1").execute(&state.db).await?;
    Ok(StatusCode::OK)
}

async fn home(State(state): State<AppState>) -> Redirect {
    if state.bypass_auth {
        Redirect::to(HOME_PATH)
    } else {
        Redirect::to(LOGIN_PATH)
    }
}

async fn login(
    State(state): State<AppState>,
    Json(req): Json<AdminLoginRequest>,
) -> Result<Redirect, AppError> {
    if req.username.trim().is_empty() || req.password.is_empty() {
        return Err(AppError::BadRequest(
            "Username and password are required".to_string(),
        ));
    }
    let response = state.lms.authenticate(&req).await.inspect_err(|e| {
        warn!("login for {} failed: {}", req.username, e);
    })?;
    state.session.set_token(&response.token).await?;
    info!("admin {} signed in", req.username);
    Ok(Redirect::to(HOME_PATH))
}

async fn register(
    State(state): State<AppState>,
    Json(req): Json<AdminRegisterRequest>,
) -> Result<Redirect, AppError> {
    if req.bootstrap_key.trim().is_empty() {
        return Err(AppError::BadRequest("Bootstrap key is required".to_string()));
    }
    let response = state.lms.register_admin(&req).await?;
    state.session.set_token(&response.token).await?;
    info!("bootstrap admin {} registered", req.username);
    Ok(Redirect::to(HOME_PATH))
}

async fn logout(State(state): State<AppState>) -> Result<Redirect, AppError> {
    state.session.clear_token().await?;
    state.cache.clear().await;
    info!("signed out, query cache cleared");
    Ok(Redirect::to(LOGIN_PATH))
}

async fn list_courses(State(state): State<AppState>) -> Result<Json<CourseView>, AppError> {
    let view = state.console().course_view(&RouteSelection::default()).await?;
    Ok(Json(view))
}

async fn course_detail(
    State(state): State<AppState>,
    Path(course_id): Path<String>,
) -> Result<Json<CourseView>, AppError> {
    let selection = RouteSelection::from_segments(Some(&course_id), None, None);
    Ok(Json(state.console().course_view(&selection).await?))
}

async fn chapter_detail(
    State(state): State<AppState>,
    Path((course_id, chapter_id)): Path<(String, String)>,
) -> Result<Json<CourseView>, AppError> {
    let selection = RouteSelection::from_segments(Some(&course_id), Some(&chapter_id), None);
    Ok(Json(state.console().course_view(&selection).await?))
}

async fn section_detail(
    State(state): State<AppState>,
    Path((course_id, chapter_id, section_id)): Path<(String, String, String)>,
) -> Result<Json<CourseView>, AppError> {
    let selection =
        RouteSelection::from_segments(Some(&course_id), Some(&chapter_id), Some(&section_id));
    Ok(Json(state.console().course_view(&selection).await?))
}

async fn create_course(
    State(state): State<AppState>,
    Json(req): Json<CourseRequest>,
) -> Result<(StatusCode, Json<Course>), AppError> {
    let course = state.console().create_course(req).await?;
    Ok((StatusCode::CREATED, Json(course)))
}

async fn update_course(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<CourseRequest>,
) -> Result<Json<Course>, AppError> {
    Ok(Json(state.console().update_course(id, req).await?))
}

async fn delete_course(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    state.console().delete_course(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn chapter_board(State(state): State<AppState>) -> Result<Json<ChapterBoard>, AppError> {
    Ok(Json(state.console().chapter_board().await?))
}

async fn create_chapter(
    State(state): State<AppState>,
    Path(course_id): Path<i64>,
    Json(req): Json<ChapterRequest>,
) -> Result<(StatusCode, Json<CourseChapter>), AppError> {
    let chapter = state.console().create_chapter(course_id, req).await?;
    Ok((StatusCode::CREATED, Json(chapter)))
}

async fn update_chapter(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<ChapterRequest>,
) -> Result<Json<CourseChapter>, AppError> {
    Ok(Json(state.console().update_chapter(id, req).await?))
}

async fn delete_chapter(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    state.console().delete_chapter(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn grammar_board(State(state): State<AppState>) -> Result<Json<SectionBoard>, AppError> {
    Ok(Json(state.console().section_board(SectionType::Grammar).await?))
}

async fn vocabulary_board(State(state): State<AppState>) -> Result<Json<SectionBoard>, AppError> {
    Ok(Json(state.console().section_board(SectionType::Vocabulary).await?))
}

async fn kanji_board(State(state): State<AppState>) -> Result<Json<SectionBoard>, AppError> {
    Ok(Json(state.console().section_board(SectionType::Kanji).await?))
}

async fn create_section(
    State(state): State<AppState>,
    Path(chapter_id): Path<i64>,
    Json(req): Json<SectionRequest>,
) -> Result<(StatusCode, Json<CourseSection>), AppError> {
    let section = state.console().create_section(chapter_id, req).await?;
    Ok((StatusCode::CREATED, Json(section)))
}

async fn update_section(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<SectionRequest>,
) -> Result<Json<CourseSection>, AppError> {
    Ok(Json(state.console().update_section(id, req).await?))
}

async fn delete_section(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    state.console().delete_section(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn lesson_board(State(state): State<AppState>) -> Result<Json<LessonBoard>, AppError> {
    Ok(Json(state.console().lesson_board().await?))
}

async fn create_lesson(
    State(state): State<AppState>,
    Path(section_id): Path<i64>,
    Json(req): Json<LessonRequest>,
) -> Result<(StatusCode, Json<CourseLesson>), AppError> {
    let lesson = state.console().create_lesson(section_id, req).await?;
    Ok((StatusCode::CREATED, Json(lesson)))
}

async fn update_lesson(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<LessonRequest>,
) -> Result<Json<CourseLesson>, AppError> {
    Ok(Json(state.console().update_lesson(id, req).await?))
}

async fn delete_lesson(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    state.console().delete_lesson(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_users(State(state): State<AppState>) -> Result<Json<UserDirectory>, AppError> {
    Ok(Json(state.console().user_directory().await?))
}

async fn create_user(
    State(state): State<AppState>,
    Json(req): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserAccount>), AppError> {
    let user = state.console().create_user(req).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateUserRequest>,
) -> Result<Json<UserAccount>, AppError> {
    Ok(Json(state.console().update_user(id, req).await?))
}

async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    state.console().delete_user(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
