//! # Blocks and candidate assembly
//!
//! A candidate block is assembled in two steps. Selection walks the pending
//! pool in order and keeps transactions that don't double-spend, either
//! against the chain or against each other. Assembly caps the selection,
//! sums the fees and asks the fee strategy for the reward transaction; the
//! result is a [`assembler::BlockWork`] that the director can dispatch, and
//! re-dispatch on retry, without selecting again.
//!
//! The chain constructs the actual [`types::block::CandidateBlock`] from the
//! work, because the target depends on the time of construction.

pub(crate) mod assembler;
pub(crate) mod selector;
pub mod types;
