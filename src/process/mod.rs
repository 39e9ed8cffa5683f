// Process module - Lifecycle of the single supervised child

mod controller;
pub mod spawner;
mod types;

pub use controller::ProcessController;
pub use spawner::{spawn_process, SpawnOptions, SpawnedProcess};
pub use types::{ProcessState, SupervisedProcess};
