use std::fs;
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use clap::Parser;

use vip8::display::TermDisplay;
use vip8::input::TermInput;
use vip8::machine::{Machine, MachineConfig, TimerCadence};

mod logging;

/// CHIP-8 virtual machine in a terminal
#[derive(Parser)]
#[command(version, about)]
struct Args {
    /// ROM file, loaded verbatim at 0x200
    rom: PathBuf,

    /// pause between cycles, in microseconds
    #[arg(long, default_value_t = 1200)]
    cycle_us: u64,

    /// decay the timers on a 60Hz wall clock instead of once per instruction
    #[arg(long)]
    timers_60hz: bool,

    /// log verbosity; repeat for more
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// silence the per-cycle interpreter trace
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    logging::setup_logger(args.verbose, args.quiet)?;

    let rom = fs::read(&args.rom)?;

    let config = MachineConfig {
        cycle_pause: Duration::from_micros(args.cycle_us),
        timer_cadence: if args.timers_60hz {
            TimerCadence::Wallclock60Hz
        } else {
            TimerCadence::PerCycle
        },
    };
    let mut machine = Machine::with_config(Box::new(TermDisplay::new()?), config);
    machine.load_program(&rom)?;

    // the machine loop gets its own thread; this one owns the terminal
    // events and feeds them through the handle
    let handle = machine.handle();
    let mut input = TermInput::new()?;
    let worker = thread::spawn(move || machine.run());

    while !worker.is_finished() {
        input.pump(&handle)?;
    }
    drop(input); // leave raw mode before reporting anything

    worker.join().expect("emulator thread panicked")?;

    // shove some junk on stdout to stop the cli messing up the last frame
    for _ in 0..12 {
        println!();
    }
    Ok(())
}
