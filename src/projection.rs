//! Derives course-manager views from the nested course tree.

use crate::models::{Course, CourseChapter, CourseSection};
use crate::views::{ChapterCard, CourseCard, CourseView, MissingEntity, SectionCard, ViewLevel};

/// Identifiers taken from the console route. Only positive integers count.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RouteSelection {
    pub course_id: Option<i64>,
    pub chapter_id: Option<i64>,
    pub section_id: Option<i64>,
}

impl RouteSelection {
    pub fn from_segments(course: Option<&str>, chapter: Option<&str>, section: Option<&str>) -> Self {
        Self {
            course_id: course.and_then(parse_route_id),
            chapter_id: chapter.and_then(parse_route_id),
            section_id: section.and_then(parse_route_id),
        }
    }

    pub fn level(&self) -> ViewLevel {
        match (self.course_id, self.chapter_id, self.section_id) {
            (None, _, _) => ViewLevel::Courses,
            (Some(_), None, _) => ViewLevel::Chapters,
            (Some(_), Some(_), None) => ViewLevel::Sections,
            (Some(_), Some(_), Some(_)) => ViewLevel::Lessons,
        }
    }
}

pub fn parse_route_id(raw: &str) -> Option<i64> {
    raw.trim().parse::<i64>().ok().filter(|id| *id > 0)
}

pub fn course_path(course_id: i64) -> String {
    format!("/courses/{}", course_id)
}

pub fn chapter_path(course_id: i64, chapter_id: i64) -> String {
    format!("/courses/{}/chapters/{}", course_id, chapter_id)
}

pub fn section_path(course_id: i64, chapter_id: i64, section_id: i64) -> String {
    format!(
        "/courses/{}/chapters/{}/sections/{}",
        course_id, chapter_id, section_id
    )
}

pub fn find_course(courses: &[Course], course_id: i64) -> Option<&Course> {
    courses.iter().find(|c| c.id == course_id)
}

pub fn find_chapter(course: &Course, chapter_id: i64) -> Option<&CourseChapter> {
    course.chapters.iter().find(|c| c.id == chapter_id)
}

pub fn find_section(chapter: &CourseChapter, section_id: i64) -> Option<&CourseSection> {
    chapter.sections.iter().find(|s| s.id == section_id)
}

/// Searches every course for a chapter; chapters are addressed by id alone
/// when creating sections.
pub fn locate_chapter(courses: &[Course], chapter_id: i64) -> Option<&CourseChapter> {
    courses
        .iter()
        .flat_map(|c| c.chapters.iter())
        .find(|ch| ch.id == chapter_id)
}

pub fn locate_section(courses: &[Course], section_id: i64) -> Option<&CourseSection> {
    courses
        .iter()
        .flat_map(|c| c.chapters.iter())
        .flat_map(|ch| ch.sections.iter())
        .find(|s| s.id == section_id)
}

pub fn lesson_count_by_course(course: &Course) -> usize {
    course
        .chapters
        .iter()
        .map(|ch| ch.sections.iter().map(|s| s.lessons.len()).sum::<usize>())
        .sum()
}

fn next_order(orders: impl Iterator<Item = i32>) -> i32 {
    orders.fold(0, i32::max) + 1
}

pub fn next_chapter_order(courses: &[Course], course_id: i64) -> i32 {
    let orders = find_course(courses, course_id)
        .map(|c| c.chapters.iter().map(|ch| ch.chapter_order).collect::<Vec<_>>())
        .unwrap_or_default();
    next_order(orders.into_iter())
}

pub fn next_section_order(courses: &[Course], chapter_id: i64) -> i32 {
    let orders = locate_chapter(courses, chapter_id)
        .map(|ch| ch.sections.iter().map(|s| s.section_order).collect::<Vec<_>>())
        .unwrap_or_default();
    next_order(orders.into_iter())
}

pub fn next_lesson_order(courses: &[Course], section_id: i64) -> i32 {
    let orders = locate_section(courses, section_id)
        .map(|s| s.lessons.iter().map(|l| l.lesson_order).collect::<Vec<_>>())
        .unwrap_or_default();
    next_order(orders.into_iter())
}

fn course_card(course: &Course) -> CourseCard {
    CourseCard {
        id: course.id,
        name: course.name.clone(),
        description: course.description.clone(),
        thumbnail_url: course.thumbnail_url.clone(),
        chapter_count: course.chapters.len(),
        lesson_count: lesson_count_by_course(course),
        path: course_path(course.id),
    }
}

fn chapter_card(course_id: i64, chapter: &CourseChapter) -> ChapterCard {
    ChapterCard {
        id: chapter.id,
        title: chapter.title.clone(),
        description: chapter.description.clone(),
        chapter_order: chapter.chapter_order,
        section_count: chapter.sections.len(),
        path: chapter_path(course_id, chapter.id),
    }
}

fn section_card(course_id: i64, chapter_id: i64, section: &CourseSection) -> SectionCard {
    SectionCard {
        id: section.id,
        section_type: section.section_type,
        title: section.title.clone(),
        section_order: section.section_order,
        lesson_count: section.lessons.len(),
        path: section_path(course_id, chapter_id, section.id),
    }
}

fn not_found(missing: MissingEntity, back_path: String) -> CourseView {
    let message = match missing {
        MissingEntity::Course => "Course not found from this route. Please go back to the course list.",
        MissingEntity::Chapter => "Chapter not found from this route. Please go back to the chapter list.",
        MissingEntity::Section => "Section not found from this route. Please go back to the section list.",
    };
    CourseView::NotFound {
        missing,
        message: message.to_string(),
        back_path,
    }
}

/// Picks the list to render for `selection`. Unresolvable ids produce a
/// `NotFound` view pointing at the nearest parent that did resolve.
pub fn project(courses: &[Course], selection: &RouteSelection) -> CourseView {
    let Some(course_id) = selection.course_id else {
        let empty_hint = courses
            .is_empty()
            .then(|| "No courses yet. Create your first course.".to_string());
        return CourseView::Courses {
            courses: courses.iter().map(course_card).collect(),
            empty_hint,
        };
    };

    let Some(course) = find_course(courses, course_id) else {
        return not_found(MissingEntity::Course, "/courses".to_string());
    };

    let Some(chapter_id) = selection.chapter_id else {
        return CourseView::Chapters {
            back_path: "/courses".to_string(),
            course: course_card(course),
            chapters: course
                .chapters
                .iter()
                .map(|ch| chapter_card(course.id, ch))
                .collect(),
            next_chapter_order: next_chapter_order(courses, course.id),
        };
    };

    let Some(chapter) = find_chapter(course, chapter_id) else {
        return not_found(MissingEntity::Chapter, course_path(course.id));
    };

    let Some(section_id) = selection.section_id else {
        return CourseView::Sections {
            back_path: course_path(course.id),
            course: course_card(course),
            chapter: chapter_card(course.id, chapter),
            sections: chapter
                .sections
                .iter()
                .map(|s| section_card(course.id, chapter.id, s))
                .collect(),
            next_section_order: next_section_order(courses, chapter.id),
        };
    };

    let Some(section) = find_section(chapter, section_id) else {
        return not_found(MissingEntity::Section, chapter_path(course.id, chapter.id));
    };

    CourseView::Lessons {
        back_path: chapter_path(course.id, chapter.id),
        course: course_card(course),
        chapter: chapter_card(course.id, chapter),
        section: section_card(course.id, chapter.id, section),
        lessons: section.lessons.clone(),
        next_lesson_order: next_lesson_order(courses, section.id),
    }
}
