pub(crate) mod access_policy;
pub(crate) mod grading;
