pub mod connection;
pub mod net;
pub mod room;
pub mod session;
