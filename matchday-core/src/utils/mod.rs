pub mod refresh_interval;
