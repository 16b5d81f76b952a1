pub mod api;
pub mod clock;
pub mod config;
pub mod gateway;
pub mod session;
pub mod shutdown;
pub mod storage;
pub mod validation;
pub mod wizard;
pub mod worker;
