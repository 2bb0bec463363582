//! Database repositories
//!
//! Repositories handle all direct database interactions.

pub mod contest_repo;
pub mod participation_repo;
pub mod profile_repo;
pub mod submission_repo;

pub use contest_repo::ContestRepository;
pub use participation_repo::ParticipationRepository;
pub use profile_repo::ProfileRepository;
pub use submission_repo::SubmissionRepository;
