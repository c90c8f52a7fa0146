//! ALLOCATE: votes → seats with the configured divisor method.
//!
//! Thin stage wrapper over `cm_algo::apportion`; it only adds tracing and maps
//! engine errors into pipeline buckets.

use std::collections::BTreeMap;

use cm_algo::{apportion, ApportionmentResult};
use cm_core::{errors::EngineError, ids::PartyId, variables::Params};
use tracing::{debug, info};

use crate::PipelineError;

pub fn allocate(votes: &BTreeMap<PartyId, u64>, params: &Params) -> Result<ApportionmentResult, PipelineError> {
    let app = apportion(votes, params).map_err(|e| match e {
        EngineError::ApportionmentIntegrity { .. } => PipelineError::Integrity(e.to_string()),
        other => PipelineError::Allocate(other.to_string()),
    })?;
    for p in app.seated() {
        debug!(party = %p.party_id, votes = p.votes, seats = p.seats, "seat awarded");
    }
    info!(
        method = %app.method,
        seats = app.total_seats,
        votes = app.total_votes,
        seated = app.seated().count(),
        "apportionment complete"
    );
    Ok(app)
}
