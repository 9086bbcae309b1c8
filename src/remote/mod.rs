mod client;
mod sync;

pub use client::{DevotionalApi, HttpApi};
pub use sync::{ProgramSource, RemoteSync};
