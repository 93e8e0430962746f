//! The paced emulation loop and its thread wrapper.
//!
//! A single cooperative thread owns the [`Nes`]; the front-end talks to it
//! through two atomic booleans (`cancelled`, `paused`) and receives audio
//! through a callback. There is no parallelism inside the core: CPU, PPU,
//! and APU advance sequentially within each step, so every CPU write is
//! visible to the co-processors before they tick.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use famicore_core::Nes;

use crate::audio::SampleClock;
use crate::input::ControllerInputs;

/// Target frame period for the 60 Hz pace (16.667 ms).
const FRAME_PERIOD: Duration = Duration::from_micros(16_667);

/// Poll interval while paused.
const PAUSE_POLL: Duration = Duration::from_millis(1);

/// Faults that terminate the run loop.
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error("emulation fault: {0}")]
    Emulation(#[from] famicore_core::error::Error),
}

/// Resets the machine and runs it until `cancelled` is set or a fatal
/// emulation fault occurs.
///
/// While `paused` is set the loop blocks (polling) without stepping. The
/// pace is self-regulating: after each NMI delivery the loop sleeps out the
/// remainder of the 60 Hz frame period; a slow host simply runs late with no
/// correctness impact. On a fault the loop returns the error the core
/// sequencer already wrote to the error sink, leaving the machine state
/// intact for post-mortem inspection.
pub fn run<F>(
    nes: &mut Nes,
    cancelled: &AtomicBool,
    paused: &AtomicBool,
    inputs: &ControllerInputs,
    mut audio: F,
) -> Result<(), RuntimeError>
where
    F: FnMut(f32),
{
    let mut sampler = SampleClock::new();
    let mut frame_began = Instant::now();

    nes.reset();

    while !cancelled.load(Ordering::Relaxed) {
        if paused.load(Ordering::Acquire) {
            thread::sleep(PAUSE_POLL);
            continue;
        }

        nes.set_controller(0, inputs.get(0));
        nes.set_controller(1, inputs.get(1));

        let outcome = match nes.step_with_audio(|sample| sampler.push(sample, &mut audio)) {
            Ok(outcome) => outcome,
            // Already reported to the error sink by the core sequencer.
            Err(err) => return Err(err.into()),
        };

        if outcome.serviced_nmi {
            let elapsed = frame_began.elapsed();
            if elapsed < FRAME_PERIOD {
                thread::sleep(FRAME_PERIOD - elapsed);
            }
            frame_began = Instant::now();
        }
    }

    Ok(())
}

/// Shared control flags for a spawned runtime thread.
#[derive(Debug, Default)]
struct Flags {
    cancelled: AtomicBool,
    paused: AtomicBool,
    inputs: ControllerInputs,
}

/// Handle to a running emulator thread.
pub struct RuntimeHandle {
    flags: Arc<Flags>,
    thread: JoinHandle<(Nes, Result<(), RuntimeError>)>,
}

impl RuntimeHandle {
    pub fn pause(&self) {
        self.flags.paused.store(true, Ordering::Release);
    }

    pub fn resume(&self) {
        self.flags.paused.store(false, Ordering::Release);
    }

    pub fn is_paused(&self) -> bool {
        self.flags.paused.load(Ordering::Acquire)
    }

    /// Updates a controller snapshot byte seen by the next emulation step.
    pub fn set_controller(&self, index: usize, state: u8) {
        self.flags.inputs.set(index, state);
    }

    /// Requests cancellation and joins, returning the machine for
    /// post-mortem inspection along with the loop's outcome.
    pub fn stop(self) -> (Nes, Result<(), RuntimeError>) {
        self.flags.cancelled.store(true, Ordering::Release);
        self.thread
            .join()
            .expect("emulator thread must not panic")
    }
}

/// Spawns the paced loop on a dedicated thread.
pub fn spawn<F>(nes: Nes, audio: F) -> RuntimeHandle
where
    F: FnMut(f32) + Send + 'static,
{
    let flags = Arc::new(Flags::default());
    let thread_flags = Arc::clone(&flags);
    let thread = thread::Builder::new()
        .name("famicore-runtime".into())
        .spawn(move || {
            let mut nes = nes;
            let result = run(
                &mut nes,
                &thread_flags.cancelled,
                &thread_flags.paused,
                &thread_flags.inputs,
                audio,
            );
            (nes, result)
        })
        .expect("spawning the emulator thread");

    RuntimeHandle { flags, thread }
}
