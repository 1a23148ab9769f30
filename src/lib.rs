//! docqa library
//!
//! Question answering over a directory of PDF documents. The directory is
//! scanned for new or modified files by content digest, the retrieval index
//! is rebuilt when something changed, and questions are answered from the
//! closest text windows by an external generative model.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod embeddings;
pub mod engine;
pub mod error;
pub mod generation;
pub mod index;
pub mod scanner;
pub mod server;
pub mod service;
pub mod storage;

pub use config::Config;
pub use error::{Error, Result};
