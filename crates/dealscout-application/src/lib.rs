//! Application services for DealScout.
//!
//! Two cooperating parts: the [`SessionGate`] owns identity state and
//! decides which top-level view is shown; the [`SearchOrchestrator`]
//! owns the search form, the request lifecycle, and the rendered result
//! set. The orchestrator depends on the gate only insofar as its view is
//! unreachable while unauthenticated.

pub mod search_orchestrator;
pub mod session_gate;

pub use search_orchestrator::SearchOrchestrator;
pub use session_gate::SessionGate;
