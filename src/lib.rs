// src/lib.rs - Tank-drive robot control library
pub mod config;
pub mod controllers;
pub mod dashboard;
pub mod drive;
pub mod hardware;
pub mod ports;
pub mod robot;
pub mod subsystems;
pub mod tools;
