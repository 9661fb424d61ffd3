//! Database repositories

pub mod exam_repo;
pub mod question_repo;
pub mod session_repo;

pub use exam_repo::ExamRepository;
pub use question_repo::QuestionRepository;
pub use session_repo::SessionRepository;
