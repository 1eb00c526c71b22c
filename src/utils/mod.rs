pub mod string_utils;

pub use string_utils::{safe_truncate_boundary, safe_truncate_chars};
