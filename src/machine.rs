use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, error, warn};

use crate::display::FrameSink;
use crate::error::Error;
use crate::framebuffer::FrameBuffer;
use crate::interpreter::Interpreter;
use crate::keys::{self, KeyBuffer};
use crate::memory::{AddressSpace, CHIP8_PROGRAM_ADDR};
use crate::registers::RegisterFile;

/// pause between cycles; a throttle, not a correctness requirement
pub const DEFAULT_CYCLE_PAUSE: Duration = Duration::from_micros(1200);

/// one 60 Hz timer period
const TIMER_TICK: Duration = Duration::from_micros(16_667);

/// When the delay and sound timers count down.
///
/// `PerCycle` decays them once per executed instruction, which makes
/// emulated timing depend on instruction mix; `Wallclock60Hz` decays them
/// on a fixed 60 Hz wall clock the way the original hardware did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerCadence {
    PerCycle,
    Wallclock60Hz,
}

#[derive(Debug, Clone)]
pub struct MachineConfig {
    pub cycle_pause: Duration,
    pub timer_cadence: TimerCadence,
}

impl Default for MachineConfig {
    fn default() -> Self {
        MachineConfig {
            cycle_pause: DEFAULT_CYCLE_PAUSE,
            timer_cadence: TimerCadence::PerCycle,
        }
    }
}

/// The assembled machine: one owner for the four state containers, the
/// interpreter and the run loop around them.
///
/// The loop thread is the only writer of memory, registers and the
/// framebuffer. The two cross-thread entry points are the running flag and
/// the key buffer, both shared through a [`MachineHandle`].
pub struct Machine {
    memory: AddressSpace,
    registers: RegisterFile,
    framebuffer: FrameBuffer,
    keys: Arc<KeyBuffer>,
    interpreter: Interpreter,
    pc: u16,
    sink: Box<dyn FrameSink + Send>,
    running: Arc<AtomicBool>,
    loaded: bool,
    config: MachineConfig,
    timer_mark: Instant,
}

impl Machine {
    pub fn new(sink: Box<dyn FrameSink + Send>) -> Self {
        Self::with_config(sink, MachineConfig::default())
    }

    pub fn with_config(sink: Box<dyn FrameSink + Send>, config: MachineConfig) -> Self {
        Machine {
            memory: AddressSpace::new(),
            registers: RegisterFile::new(),
            framebuffer: FrameBuffer::new(),
            keys: Arc::new(KeyBuffer::new()),
            interpreter: Interpreter::new(),
            pc: CHIP8_PROGRAM_ADDR,
            sink,
            running: Arc::new(AtomicBool::new(false)),
            loaded: false,
            config,
            timer_mark: Instant::now(),
        }
    }

    /// put every state container back to power-on state
    pub fn reset(&mut self) {
        self.memory.reset();
        self.registers.reset();
        self.framebuffer.clear();
        self.keys.reset();
        self.pc = CHIP8_PROGRAM_ADDR;
        self.loaded = false;
    }

    /// reset, then copy a program in at the load address
    pub fn load_program(&mut self, program: &[u8]) -> Result<(), Error> {
        self.reset();
        self.memory.load(program)?;
        self.loaded = true;
        Ok(())
    }

    /// Run cycles until stopped or a fatal error.
    ///
    /// The stop flag is checked at the top of every iteration, so a
    /// concurrent [`MachineHandle::stop`] is observed within one cycle,
    /// including while a key-wait instruction is spinning.
    pub fn run(&mut self) -> Result<(), Error> {
        if !self.loaded {
            return Err(Error::NoProgram);
        }
        debug!("entering run loop at {:#05x}", self.pc);
        self.running.store(true, Ordering::Release);
        self.timer_mark = Instant::now();

        let outcome = loop {
            if !self.running.load(Ordering::Acquire) {
                break Ok(());
            }
            if let Err(e) = self.cycle() {
                break Err(e);
            }
            spin_sleep::sleep(self.config.cycle_pause);
        };

        self.running.store(false, Ordering::Release);
        match &outcome {
            Ok(()) => debug!("run loop stopped at {:#05x}", self.pc),
            Err(e) => error!("emulation stopped at {:#05x}: {}", self.pc, e),
        }
        outcome
    }

    pub fn stop(&self) {
        self.running.store(false, Ordering::Release);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// a host key went down; unmapped keys are ignored
    pub fn key_down(&self, host_key: char) {
        if let Some(key) = keys::translate(host_key) {
            self.keys.set_key(key, true);
        }
    }

    /// a host key came up; unmapped keys are ignored
    pub fn key_up(&self, host_key: char) {
        if let Some(key) = keys::translate(host_key) {
            self.keys.set_key(key, false);
        }
    }

    /// the cross-thread control surface: stop, is_running and key events
    pub fn handle(&self) -> MachineHandle {
        MachineHandle {
            running: Arc::clone(&self.running),
            keys: Arc::clone(&self.keys),
        }
    }

    /// fetch, execute, notify, decay
    fn cycle(&mut self) -> Result<(), Error> {
        let word = self.memory.read_word(self.pc)?;
        match self.interpreter.execute(
            word,
            &mut self.pc,
            &mut self.memory,
            &mut self.registers,
            &mut self.framebuffer,
            &self.keys,
        ) {
            Ok(true) => self.sink.refresh(&self.framebuffer.snapshot())?,
            Ok(false) => {}
            // the hardware has no defined behaviour here; halting would
            // freeze the loop on every stray word, so log and skip
            Err(Error::UnknownOpcode { opcode, pc }) => {
                warn!("skipping unknown opcode {:#06x} at {:#05x}", opcode, pc);
                self.pc += 2;
            }
            Err(fatal) => return Err(fatal),
        }
        self.decay_timers();
        Ok(())
    }

    fn decay_timers(&mut self) {
        match self.config.timer_cadence {
            TimerCadence::PerCycle => self.registers.decay_timers(),
            TimerCadence::Wallclock60Hz => {
                while self.timer_mark.elapsed() >= TIMER_TICK {
                    self.registers.decay_timers();
                    self.timer_mark += TIMER_TICK;
                }
            }
        }
    }
}

/// Cloneable handle for the two operations that may be called from outside
/// the loop thread: flipping the running flag and key events.
#[derive(Clone)]
pub struct MachineHandle {
    running: Arc<AtomicBool>,
    keys: Arc<KeyBuffer>,
}

impl MachineHandle {
    pub fn stop(&self) {
        self.running.store(false, Ordering::Release);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn key_down(&self, host_key: char) {
        if let Some(key) = keys::translate(host_key) {
            self.keys.set_key(key, true);
        }
    }

    pub fn key_up(&self, host_key: char) {
        if let Some(key) = keys::translate(host_key) {
            self.keys.set_key(key, false);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::NullSink;
    use std::sync::atomic::AtomicUsize;
    use std::thread;

    fn unpaced() -> Machine {
        Machine::with_config(
            Box::new(NullSink),
            MachineConfig {
                cycle_pause: Duration::ZERO,
                timer_cadence: TimerCadence::PerCycle,
            },
        )
    }

    #[test]
    fn test_run_without_a_program_fails() {
        let mut m = unpaced();
        assert!(matches!(m.run(), Err(Error::NoProgram)));
    }

    #[test]
    fn test_failed_load_leaves_machine_unloaded() {
        let mut m = unpaced();
        assert!(m.load_program(&[0u8; 4000]).is_err());
        assert!(matches!(m.run(), Err(Error::NoProgram)));
    }

    #[test]
    fn test_load_points_pc_at_the_program() {
        let mut m = unpaced();
        m.load_program(&[0x00, 0xE0]).unwrap();
        assert_eq!(m.pc, CHIP8_PROGRAM_ADDR);
        m.cycle().unwrap();
        assert_eq!(m.pc, 0x202);
    }

    #[test]
    fn test_timers_decay_once_per_cycle() {
        let mut m = unpaced();
        // V1 = 5; delay timer = V1; jump-to-self
        m.load_program(&[0x61, 0x05, 0xF1, 0x15, 0x12, 0x04]).unwrap();
        m.cycle().unwrap();
        m.cycle().unwrap();
        // set to 5 this cycle, then decayed at the end of it
        assert_eq!(m.registers.delay_timer(), 4);
        m.cycle().unwrap();
        assert_eq!(m.registers.delay_timer(), 3);
    }

    #[test]
    fn test_wallclock_timers_ignore_instruction_rate() {
        let mut m = Machine::with_config(
            Box::new(NullSink),
            MachineConfig {
                cycle_pause: Duration::ZERO,
                timer_cadence: TimerCadence::Wallclock60Hz,
            },
        );
        m.load_program(&[0x61, 0x05, 0xF1, 0x15, 0x12, 0x04]).unwrap();
        m.timer_mark = Instant::now();
        for _ in 0..10 {
            m.cycle().unwrap();
        }
        // ten back-to-back cycles take far less than a 60 Hz tick
        assert_eq!(m.registers.delay_timer(), 5);
    }

    #[test]
    fn test_stop_from_another_thread_halts_run() {
        let mut m = unpaced();
        m.load_program(&[0x12, 0x00]).unwrap(); // jump-to-self
        let handle = m.handle();
        let stopper = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            handle.stop();
        });
        m.run().unwrap();
        assert!(!m.is_running());
        stopper.join().unwrap();
    }

    #[test]
    fn test_stop_interrupts_a_key_wait() {
        let mut m = unpaced();
        m.load_program(&[0xF1, 0x0A]).unwrap();
        let handle = m.handle();
        let stopper = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            handle.stop();
        });
        m.run().unwrap();
        // the wait never saw a key, so the pc is still on it
        assert_eq!(m.pc, CHIP8_PROGRAM_ADDR);
        stopper.join().unwrap();
    }

    #[test]
    fn test_key_event_satisfies_the_wait() {
        let mut m = unpaced();
        // wait for a key, then return on an empty stack to end the run
        m.load_program(&[0xF1, 0x0A, 0x00, 0xEE]).unwrap();
        let handle = m.handle();
        let presser = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            handle.key_down('w');
        });
        assert!(matches!(m.run(), Err(Error::StackUnderflow)));
        assert_eq!(m.registers.v(0x1), 0x5); // 'w' is keypad 5
        presser.join().unwrap();
    }

    #[test]
    fn test_unknown_opcode_is_skipped_not_fatal() {
        let mut m = unpaced();
        // junk word, then a return that fails; reaching the failure proves
        // the pc advanced past the junk
        m.load_program(&[0xFF, 0xFF, 0x00, 0xEE]).unwrap();
        assert!(matches!(m.run(), Err(Error::StackUnderflow)));
        assert!(!m.is_running());
    }

    #[test]
    fn test_fatal_error_stops_the_loop() {
        let mut m = unpaced();
        m.load_program(&[0x00, 0xEE]).unwrap();
        assert!(matches!(m.run(), Err(Error::StackUnderflow)));
        assert!(!m.is_running());
    }

    #[test]
    fn test_running_off_the_end_of_memory_is_fatal() {
        let mut m = unpaced();
        m.load_program(&[0x1F, 0xFE]).unwrap(); // jump to 0xFFE
        m.cycle().unwrap();
        // 0xFFE holds zeroes: unknown, skipped, pc = 0x1000
        m.cycle().unwrap();
        assert!(matches!(
            m.cycle(),
            Err(Error::AddressOutOfRange { addr: 0x1000 })
        ));
    }

    struct CountingSink(Arc<AtomicUsize>);

    impl FrameSink for CountingSink {
        fn refresh(&mut self, _frame: &crate::framebuffer::Frame) -> Result<(), std::io::Error> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[test]
    fn test_refresh_notification_per_drawing_cycle() {
        let frames = Arc::new(AtomicUsize::new(0));
        let mut m = Machine::with_config(
            Box::new(CountingSink(Arc::clone(&frames))),
            MachineConfig {
                cycle_pause: Duration::ZERO,
                timer_cadence: TimerCadence::PerCycle,
            },
        );
        // clear draws, the set does not
        m.load_program(&[0x00, 0xE0, 0x61, 0x05]).unwrap();
        m.cycle().unwrap();
        m.cycle().unwrap();
        assert_eq!(frames.load(Ordering::SeqCst), 1);
    }
}
