pub mod services;
pub mod staging;

pub use services::{upload_staged, MediaUploader, ObjectStoreUploader, UploadedMedia};
pub use staging::MultipartForm;
