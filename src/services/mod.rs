pub mod confirmation_service;
pub mod dates;
pub mod error;
pub mod event_service;
pub mod penalty_service;
pub mod reorder_service;
pub mod roster_order;
pub mod signup_service;
