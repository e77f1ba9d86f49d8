//! Domain inputs and query shapes for Protol.
//!
//! - `NewAgent` / `AgentUpdate`: registration and profile edits
//! - `NewAction` / `ActionRating` / `ActionFilter`: recording and listing work
//! - `NewIncident`: failure reports
//! - `SearchQuery`, `LeaderboardEntry`, `EcosystemStats`: discovery
//!
//! Every input type validates itself before the engine touches the store.

pub mod action;
pub mod agent;
pub mod digest;
pub mod error;
pub mod incident;
pub mod query;
pub mod validation;

pub use action::{ActionFilter, ActionRating, NewAction};
pub use agent::{slugify, AgentUpdate, NewAgent};
pub use digest::{canonical_json, hash_bytes, hash_payload, payload_size};
pub use error::{ProtolError, Result, ValidationError};
pub use incident::NewIncident;
pub use query::{EcosystemStats, LeaderboardEntry, SearchPage, SearchQuery, SortBy};
pub use validation::validate_agent_id;
