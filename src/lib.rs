pub mod database;
pub mod models;
pub mod notify;
pub mod services;
pub mod state;
pub mod web;
