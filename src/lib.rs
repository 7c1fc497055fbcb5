pub mod config;
pub mod detection;
pub mod events;
pub mod state;
pub mod timefmt;
pub mod tasks {
    pub mod console;
    pub mod monitor;
    pub mod scheduler;
}
