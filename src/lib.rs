//! # vip8
//!
//! A CHIP-8 class virtual machine: 4K of RAM, sixteen 8-bit registers, a
//! 16-entry call stack, two countdown timers, a 64x32 XOR framebuffer and
//! a hex keypad, driven by a fetch-decode-execute loop over two-byte
//! big-endian instruction words.
//!
//! ## Design
//!
//! * one [`machine::Machine`] owns the four state containers
//!   ([`memory::AddressSpace`], [`registers::RegisterFile`],
//!   [`framebuffer::FrameBuffer`], [`keys::KeyBuffer`]); no hidden globals
//! * the [`interpreter::Interpreter`] gets them by reference each cycle and
//!   owns every flag and program-counter policy
//! * display and input are collaborators behind narrow seams: the machine
//!   pushes [`framebuffer::Frame`] snapshots into a [`display::FrameSink`]
//!   and takes key events through a cloneable [`machine::MachineHandle`]
//! * the loop thread is the only writer of machine state; the handle's
//!   stop flag and per-key atomics are the whole cross-thread surface
//! * timing is a throttle, not an authentic COSMAC clock: a fixed pause
//!   per cycle, with timer decay per instruction or on a 60 Hz wall clock

pub mod display;
pub mod error;
pub mod framebuffer;
pub mod input;
pub mod interpreter;
pub mod keys;
pub mod machine;
pub mod memory;
pub mod registers;

pub use error::Error;
pub use machine::{Machine, MachineConfig, MachineHandle, TimerCadence};
