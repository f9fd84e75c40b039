pub(crate) mod answers;
pub(crate) mod exam_access;
pub(crate) mod exams;
pub(crate) mod questions;
pub(crate) mod sessions;
pub(crate) mod users;
