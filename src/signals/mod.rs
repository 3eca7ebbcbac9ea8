pub mod request_signal;
pub mod user_agent;

pub use request_signal::RequestSignal;
