pub mod config;
pub mod dynamics;
pub mod export;
pub mod numerics;
pub mod simulation;
pub mod state;
pub mod view;
