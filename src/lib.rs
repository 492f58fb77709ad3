//! Client for the GymDesk gym-owner dashboard API.
//!
//! [`api::ApiClient`] is the transport: it attaches the stored bearer
//! credential, unwraps JSON bodies and clears the credential on 401.
//! [`gym::GymClient`] puts the query cache in front of it: reads are cached
//! and coalesced per [`cache::QueryKey`], writes invalidate their resource
//! family. [`query::Query`] and [`query::Mutation`] wrap those calls in
//! pollable state for a UI.

pub mod api;
pub mod cache;
pub mod config;
pub mod gym;
pub mod logging;
pub mod query;
pub mod session;
pub mod storage;

pub use api::{ApiClient, ApiError, RequestOptions};
pub use cache::{QueryClient, QueryKey};
pub use config::Config;
pub use gym::GymClient;
