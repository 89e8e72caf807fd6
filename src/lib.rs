//! gluebot: a chat bot that turns commands into captioned images and videos.

pub mod attachment;
pub mod bot;
pub mod commands;
pub mod config;
pub mod error;
pub mod imageboard;
pub mod logging;
pub mod numbers;
pub mod protocol;
pub mod render;
pub mod roster;
pub mod session;
pub mod supervisor;
pub mod text;
pub mod upload;

pub use error::{Error, Result};
