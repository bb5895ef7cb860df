pub mod class_config;
pub mod gateway;
pub mod ids;
pub mod listener;
pub mod namespace_map;
pub mod reference_grant;
pub mod route;
