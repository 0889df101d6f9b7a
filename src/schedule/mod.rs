pub mod duration;
pub mod employee;
pub mod options;
pub mod snapshot;
pub mod time_label;
pub mod transport;
pub mod view;
pub mod week;
