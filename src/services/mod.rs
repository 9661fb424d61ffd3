//! Business logic services

pub mod evaluation;
pub mod exam_service;
pub mod proctoring_service;
pub mod session_service;
pub mod unlock_service;

pub use exam_service::ExamService;
pub use proctoring_service::ProctoringService;
pub use session_service::SessionService;
pub use unlock_service::UnlockService;
