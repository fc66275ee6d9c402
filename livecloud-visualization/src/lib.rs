//! Visualization pipeline for streamed point sets
//! 
//! This crate turns decoded point sets into instanced sphere updates:
//! - Instance synchronization (in-place update or recreate)
//! - Scene graph and instanced sphere storage
//! - Headless rendering of dirty instance buffers
//! - Single-slot mailbox and cooperative frame loop
//! - The streaming viewer that ties messaging, decoding and rendering together

pub mod config;
pub mod scene;
pub mod sync;
pub mod renderer;
pub mod mailbox;
pub mod frame_loop;
pub mod viewer;

pub use config::*;
pub use scene::*;
pub use sync::*;
pub use renderer::*;
pub use mailbox::*;
pub use frame_loop::*;
pub use viewer::*;
