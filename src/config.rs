pub mod overrides;
pub mod run;
pub mod setup;
