//! Property definitions for the Si4x6x configuration space
//!
//! Properties are the chip's configuration registers, addressed by a
//! 16-bit group:offset pair and written through the SET_PROPERTY command
//! with the payload `{group, count, offset, value bytes}`. Each property
//! here carries its address as a `u16` id (`group << 8 | offset`) and its
//! byte packing; [`Device::write_property`](crate::Device::write_property)
//! and [`Device::read_property`](crate::Device::read_property) handle the
//! command framing.

pub mod freq_control;
pub mod modem;
pub mod pa;
pub mod preamble;
pub mod sync;

pub use freq_control::*;
pub use modem::*;
pub use pa::*;
pub use preamble::*;
pub use sync::*;
