//! Bus abstractions connecting the CPU to the rest of the machine.
//!
//! [`Bus`] is the seam the CPU executes against: the production
//! implementation is [`cpu::CpuBus`], a short-lived borrow over the system's
//! components; unit tests run the CPU against [`mock::RamBus`] instead.

use crate::error::Error;

pub mod cpu;
pub mod dma;
pub mod graphics;
pub mod mock;

pub use cpu::CpuBus;
pub use dma::DmaState;
pub use graphics::GraphicsBus;

/// CPU-visible memory interface.
///
/// `read` may have side effects (PPU status, PPUDATA buffering, controller
/// shifting); `peek` must not, so the tracer can safely inspect operands.
/// Writes can fault (stores into PRG ROM outside the reset-vector hole).
pub trait Bus {
    fn read(&mut self, addr: u16) -> u8;
    fn peek(&self, addr: u16) -> u8;
    fn write(&mut self, addr: u16, value: u8) -> Result<(), Error>;
}
