//! Translates a parsed [`Request`] into a [`Reply`], grounded on
//! `original_source/mpp/lib/hpp/mpp/ReqHandler.hpp`'s
//! `handleReq`/`isSingular` shape.
//!
//! The source resolves `isSingular`/the opposite-form table through a
//! DB-backed lookup constructed per-connection, which stays out of scope
//! here. This crate generalizes that seam into the [`NounLookup`] trait so
//! the wire/connection layers never depend on how the answer is produced.

pub mod dictionary;

use std::fmt;

use crate::error::StatusCode;
use crate::request::{Command, Request};
use crate::reply::Reply;

/// External collaborator supplying the pluralisation predicate/table; kept
/// out of this crate so the wire layer never depends on how the answer is
/// produced.
pub trait NounLookup: fmt::Debug + Send + Sync {
    /// Whether `noun` is grammatically singular.
    fn is_singular(&self, noun: &str) -> bool;

    /// The opposite grammatical-number form of `noun`, or `None` if `noun`
    /// isn't in the table, in which case the reply's status becomes 404.
    fn opposite_form(&self, noun: &str) -> Option<String>;
}

/// Translates a [`Request`] into a [`Reply`] via a [`NounLookup`]. Pure with
/// respect to the wire layer: malformed requests never reach it — the
/// server answers those with a stock reply before the handler is invoked.
///
/// Holds its lookup behind `Box<dyn NounLookup>` rather than a generic
/// parameter so a single concrete `ReqHandler` type can be shared by
/// reference across every `Connection` regardless of which reactor it was
/// assigned to.
#[derive(Debug)]
pub struct ReqHandler {
    lookup: Box<dyn NounLookup>,
}

impl ReqHandler {
    pub fn new(lookup: impl NounLookup + 'static) -> Self {
        Self {
            lookup: Box::new(lookup),
        }
    }

    /// Handles `request`, writing the answer into `reply`.
    pub fn handle(&self, request: &Request, reply: &mut Reply) {
        let noun = String::from_utf8_lossy(&request.noun);
        match request.command {
            Command::Issing => {
                reply.status = StatusCode::Ok;
                let content = if self.lookup.is_singular(&noun) {
                    b"true".to_vec()
                } else {
                    b"false".to_vec()
                };
                reply.set_content(content);
            }
            Command::Fof => match self.lookup.opposite_form(&noun) {
                Some(opposite) => {
                    reply.status = StatusCode::Ok;
                    reply.set_content(opposite.into_bytes());
                }
                None => {
                    reply.status = StatusCode::NounNotFound;
                    reply.set_content(Vec::new());
                }
            },
            Command::Invalid => {
                reply.status = StatusCode::Internal;
                reply.set_content(Vec::new());
            }
        }
    }
}
