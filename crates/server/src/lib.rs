pub mod db;
pub mod orchestrator;
pub mod server;
pub mod web;
