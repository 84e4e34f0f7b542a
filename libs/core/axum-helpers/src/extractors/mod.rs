//! Request extractors with uniform JSON error bodies.
//!
//! Rejections use the same `{"error": {"type", "message"}}` envelope the
//! domain errors emit, so clients see one error shape end to end.

pub mod uuid_path;
pub mod validated_json;

pub use uuid_path::UuidPath;
pub use validated_json::ValidatedJson;
