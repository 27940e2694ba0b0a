//! Easel Session - the editing-session container
//!
//! Owns the live [`easel_graph::CanvasGraph`] for one editing session and
//! serializes every mutation through a single async lock, so validators
//! and classifiers always read a fully materialized snapshot and every
//! change lands atomically. Also drives generation: per-node abort
//! tokens, concurrent variation calls against an external [`Generator`],
//! and additive fan-out merges that never clobber concurrent edits.
//!
//! Persistence is a collaborator, not a member: it watches
//! [`CanvasSession::revision`] on its own debounce and snapshots the
//! graph with [`CanvasSession::snapshot`].

pub mod generate;
pub mod session;

pub use generate::{
    collect_inputs, CollectedInputs, FanOutReport, GenerateError, GenerationRequest, Generator,
};
pub use session::{CanvasSession, SessionError};
