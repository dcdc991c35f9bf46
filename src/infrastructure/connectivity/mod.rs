pub mod monitor;

pub use monitor::{ConnectivityMonitor, TcpProbe};
