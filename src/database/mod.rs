pub mod event_repo;
pub mod member_repo;
pub mod penalty_registry_repo;
pub mod roster_repo;
pub mod schema;
