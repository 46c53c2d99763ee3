use derive_new::new;
use serde::{Deserialize, Serialize};
use surrealdb::sql::{Id, Thing};

use super::Timestamp;

pub type CourseId = Thing;

pub fn new_course_id() -> CourseId {
    Thing::from((Course::TABLE.to_string(), Id::uuid()))
}

/// The slice of a course document the aggregator cares about: its view
/// counter.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, new)]
pub struct Course {
    #[new(value = "new_course_id()")]
    pub id: CourseId,
    #[new(default)]
    pub created_at: Timestamp,
    pub title: String,
    pub views: i64,
}

impl Course {
    pub const TABLE: &'static str = "courses";
}
