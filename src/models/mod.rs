pub mod module;
pub mod navigation;
pub mod remote;
