mod accept_call_impl;
mod call_command;
mod call_controller;
mod call_event;
mod end_call_impl;
mod handle_signal_impl;
mod initiate_call_impl;
mod renegotiation_impl;
mod run_impl;

pub use call_command::*;
pub use call_controller::*;
pub use call_event::*;
