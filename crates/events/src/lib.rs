//! Event-sourcing mechanics shared by domain modules and infrastructure.

pub mod command;
pub mod envelope;
pub mod event;

pub use command::Command;
pub use envelope::EventEnvelope;
pub use event::Event;
