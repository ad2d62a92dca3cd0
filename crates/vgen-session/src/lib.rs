//! Reviewer processing session: a client-held projection of one seed's
//! generation lifecycle, its in-flight variation batch, and approval
//! decisions.
//!
//! The session is a read-and-display projection, not the system of record.
//! `VariationJob` rows in the store stay authoritative for render status;
//! the session mirrors them as [`VariationVideo`] view-models and is
//! reconciled wholesale from store rows after a reload.

pub mod error;
pub mod session;

pub use error::{SessionError, SessionResult};
pub use session::{
    Approval, ApprovedVideo, JobUpdate, OriginalVideo, ProcessingSession, SessionStage,
    VariationConfigState, VariationVideo,
};
