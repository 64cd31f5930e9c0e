//! Repositories
//!
//! One repository per entity. Each holds a pool handle, commits every
//! mutation immediately, and keeps the upsert-by-unique-key skip
//! semantics the pipeline's idempotence rests on.

mod claims;
mod companies;
mod patterns;
mod periods;
mod transcripts;
mod verifications;

pub use claims::ClaimRepo;
pub use companies::CompanyRepo;
pub use patterns::PatternRepo;
pub use periods::PeriodRepo;
pub use transcripts::TranscriptRepo;
pub use verifications::VerificationRepo;
