pub mod benchmark_routes;
pub mod run_routes;
