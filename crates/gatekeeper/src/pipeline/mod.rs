//! Authorization pipeline.
//!
//! Each operation runs its guards in order, calls the data broker once they
//! pass and translates the result into an [`Outcome`]. Guards return
//! `Result<(), ApiError>` so the pipeline can be exercised without HTTP.

pub mod body;
pub mod guards;
pub mod outcome;
pub mod service;

#[cfg(test)]
pub(crate) mod test_helpers;


pub use outcome::Outcome;
pub use service::Gatekeeper;
