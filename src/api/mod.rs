pub mod attendance;
pub mod view;
