pub mod app;
pub mod cli;
pub mod config;
pub mod controller;
pub mod gateway;
pub mod history;
pub mod models;
pub mod normalize;
pub mod paths;
pub mod uploads;
pub mod util;
pub mod vision;
