pub mod live_update;
