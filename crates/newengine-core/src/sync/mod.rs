mod shutdown;

pub use shutdown::ShutdownToken;
