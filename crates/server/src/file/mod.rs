//! Image upload and storage.

pub mod service;
pub mod storage;

pub use service::{
    ALLOWED_IMAGE_TYPES, ImageService, MAX_IMAGE_SIZE, StoredImage, UploadError,
};
pub use storage::{ImageStorage, LocalImageStorage};
