mod controller;
mod status_poller;

pub use controller::PairingController;
pub use status_poller::StatusPoller;
