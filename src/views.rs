use std::collections::HashMap;

use serde::Serialize;

use crate::models::{CourseChapter, CourseLesson, CourseSection, SectionType, UserAccount};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewLevel {
    Courses,
    Chapters,
    Sections,
    Lessons,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CourseCard {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub thumbnail_url: Option<String>,
    pub chapter_count: usize,
    pub lesson_count: usize,
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChapterCard {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub chapter_order: i32,
    pub section_count: usize,
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionCard {
    pub id: i64,
    pub section_type: SectionType,
    pub title: String,
    pub section_order: i32,
    pub lesson_count: usize,
    pub path: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingEntity {
    Course,
    Chapter,
    Section,
}

/// What the course manager shows for a given route.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum CourseView {
    Courses {
        courses: Vec<CourseCard>,
        empty_hint: Option<String>,
    },
    Chapters {
        back_path: String,
        course: CourseCard,
        chapters: Vec<ChapterCard>,
        next_chapter_order: i32,
    },
    Sections {
        back_path: String,
        course: CourseCard,
        chapter: ChapterCard,
        sections: Vec<SectionCard>,
        next_section_order: i32,
    },
    Lessons {
        back_path: String,
        course: CourseCard,
        chapter: ChapterCard,
        section: SectionCard,
        lessons: Vec<CourseLesson>,
        next_lesson_order: i32,
    },
    NotFound {
        missing: MissingEntity,
        message: String,
        back_path: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionRow {
    #[serde(flatten)]
    pub section: CourseSection,
    pub chapter_title: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionBoard {
    pub section_type: SectionType,
    pub title: String,
    pub under_development: bool,
    pub sections: Vec<SectionRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LessonRow {
    #[serde(flatten)]
    pub lesson: CourseLesson,
    pub section_title: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LessonBoard {
    pub lessons: Vec<LessonRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChapterRow {
    #[serde(flatten)]
    pub chapter: CourseChapter,
    pub course_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChapterBoard {
    pub chapters: Vec<ChapterRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserDirectory {
    pub users: Vec<UserAccount>,
    pub empty_hint: Option<String>,
}

pub fn section_board(
    section_type: SectionType,
    sections: Vec<CourseSection>,
    chapters: &[CourseChapter],
) -> SectionBoard {
    let chapter_titles: HashMap<i64, &str> = chapters
        .iter()
        .map(|c| (c.id, c.title.as_str()))
        .collect();

    let title = match section_type {
        SectionType::Vocabulary => "Vocabulary",
        SectionType::Grammar => "Grammar",
        SectionType::Kanji => "Kanji",
    };

    SectionBoard {
        section_type,
        title: title.to_string(),
        under_development: section_type == SectionType::Vocabulary,
        sections: sections
            .into_iter()
            .map(|section| SectionRow {
                chapter_title: chapter_titles.get(&section.chapter_id).map(|t| t.to_string()),
                section,
            })
            .collect(),
    }
}

pub fn lesson_board(lessons: Vec<CourseLesson>, sections: &[CourseSection]) -> LessonBoard {
    let section_titles: HashMap<i64, &str> = sections
        .iter()
        .map(|s| (s.id, s.title.as_str()))
        .collect();

    LessonBoard {
        lessons: lessons
            .into_iter()
            .map(|lesson| LessonRow {
                section_title: section_titles.get(&lesson.section_id).map(|t| t.to_string()),
                lesson,
            })
            .collect(),
    }
}

pub fn chapter_board(chapters: Vec<CourseChapter>, course_names: &HashMap<i64, String>) -> ChapterBoard {
    ChapterBoard {
        chapters: chapters
            .into_iter()
            .map(|chapter| ChapterRow {
                course_name: course_names.get(&chapter.course_id).cloned(),
                chapter,
            })
            .collect(),
    }
}

pub fn user_directory(users: Vec<UserAccount>) -> UserDirectory {
    let empty_hint = users
        .is_empty()
        .then(|| "No users found yet.".to_string());
    UserDirectory { users, empty_hint }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn section(id: i64, chapter_id: i64, title: &str) -> CourseSection {
        CourseSection {
            id,
            chapter_id,
            section_type: SectionType::Grammar,
            title: title.to_string(),
            section_order: 1,
            lessons: vec![],
        }
    }

    #[test]
    fn section_board_names_parent_chapters() {
        let chapters = vec![CourseChapter {
            id: 10,
            course_id: 1,
            title: "Particles".to_string(),
            description: None,
            chapter_order: 1,
            sections: vec![],
        }];

        let board = section_board(
            SectionType::Grammar,
            vec![section(1, 10, "wa vs ga"), section(2, 99, "orphan")],
            &chapters,
        );

        assert_eq!(board.title, "Grammar");
        assert!(!board.under_development);
        assert_eq!(board.sections[0].chapter_title.as_deref(), Some("Particles"));
        assert_eq!(board.sections[1].chapter_title, None);
    }

    #[test]
    fn vocabulary_board_is_flagged_under_development() {
        let board = section_board(SectionType::Vocabulary, vec![], &[]);
        assert!(board.under_development);
    }

    #[test]
    fn lesson_board_names_parent_sections() {
        let lessons = vec![CourseLesson {
            id: 5,
            section_id: 1,
            title: "Intro".to_string(),
            video_url: None,
            pdf_url: None,
            lesson_order: 1,
        }];
        let board = lesson_board(lessons, &[section(1, 10, "wa vs ga")]);
        assert_eq!(board.lessons[0].section_title.as_deref(), Some("wa vs ga"));
    }

    #[test]
    fn empty_user_directory_carries_hint() {
        assert_eq!(
            user_directory(vec![]).empty_hint.as_deref(),
            Some("No users found yet.")
        );
    }
}
