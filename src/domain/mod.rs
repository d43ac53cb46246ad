pub mod component;
pub mod endpoint;
pub mod event;
pub mod id;
pub mod iflow;
pub mod layout;
pub mod parameters;
pub mod property;
pub mod resource;
pub mod sequence_flow;

mod iflow_tests;
