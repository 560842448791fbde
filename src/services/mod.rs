pub mod audit_recorder;
pub mod cleanup;
pub mod risk_engine;

pub use audit_recorder::AuditRecorder;
pub use cleanup::CleanupService;
pub use risk_engine::{RiskAssessment, RiskEngine, ScoringPoint};
