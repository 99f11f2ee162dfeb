// Registry state managers
// Managers own mutable in-memory state and delegate persistence to the
// database layer.

pub mod download_registry;
