//! Size limits shared by the API and the upload tool

/// Largest image a content record may hold (5 MB)
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;
