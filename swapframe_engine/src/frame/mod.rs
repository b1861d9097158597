/// Frame module - per-frame resource ring and the frame loop driver

pub mod frame_ring;
pub mod frame_content;
pub mod frame_loop;

pub use frame_ring::*;
pub use frame_content::*;
pub use frame_loop::*;
