pub mod cleanup;
pub mod daemon;
pub mod run;
pub mod status;
