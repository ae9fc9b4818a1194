pub mod approval;
pub mod password;
pub mod uploads;

pub use approval::ApprovalService;
pub use uploads::{PhotoStore, PhotoUpload};
