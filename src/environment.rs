//! The host side: sets everything up and runs the main loop.
//!
//! Each frame:
//!  * poll the input backend (it may ask us to quit)
//!  * tick the timers once
//!  * run `cycles_per_frame` instructions
//!  * hand the framebuffer to the display
//!  * sleep until the next frame is due
//!
//! so emulated CPU rate and timer/refresh rate are decoupled, with the ratio
//! coming from config rather than being baked into the interpreter.
use crate::config::Chip8Config;
use crate::display::Display;
use crate::error::RuntimeFault;
use crate::input::Input;
use crate::interpreter::Chip8Interpreter;
use spin_sleep::LoopHelper;
use std::io;

/// why the loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    /// the input backend asked to quit
    Quit,
    /// a runtime fault with `halt_on_fault` set
    Fault(RuntimeFault),
    /// a bounded run finished its frames
    FramesElapsed,
}

pub struct Environment<'a, I: Input> {
    interpreter: Chip8Interpreter<I>,
    display: &'a mut dyn Display,
    config: Chip8Config,
    faults: usize,
}

impl<'a, I: Input> Environment<'a, I> {
    pub fn new(
        interpreter: Chip8Interpreter<I>,
        display: &'a mut dyn Display,
        config: Chip8Config,
    ) -> Self {
        Environment {
            interpreter,
            display,
            config,
            faults: 0,
        }
    }

    pub fn interpreter(&self) -> &Chip8Interpreter<I> {
        &self.interpreter
    }

    pub fn interpreter_mut(&mut self) -> &mut Chip8Interpreter<I> {
        &mut self.interpreter
    }

    /// how many faults have been skipped over (or 1 if we halted on one)
    pub fn fault_count(&self) -> usize {
        self.faults
    }

    /// run one frame; Some(exit) if the loop should stop
    pub fn run_frame(&mut self) -> Result<Option<Exit>, io::Error> {
        if !self.interpreter.input_mut().poll()? {
            log::debug!("quit requested");
            return Ok(Some(Exit::Quit));
        }

        self.interpreter.tick_timers();

        let mut exit = None;
        for _ in 0..self.config.cycles_per_frame {
            if let Err(fault) = self.interpreter.step() {
                self.faults += 1;
                log::warn!("{}", fault);
                if self.config.halt_on_fault {
                    exit = Some(Exit::Fault(fault));
                    break;
                }
                self.interpreter.skip_instruction();
            }
        }

        self.display.draw(
            self.interpreter.framebuffer(),
            self.interpreter.sound_active(),
        )?;
        Ok(exit)
    }

    /// run in real time until quit (or a fault, if configured to halt)
    pub fn main_loop(&mut self) -> Result<Exit, io::Error> {
        let mut pacer = LoopHelper::builder()
            .report_interval_s(5.0)
            .build_with_target_rate(self.config.frame_rate_hz as f64);
        log::debug!(
            "running at {} frames/s, {} cycles/frame",
            self.config.frame_rate_hz,
            self.config.cycles_per_frame
        );
        loop {
            pacer.loop_start();
            if let Some(exit) = self.run_frame()? {
                return Ok(exit);
            }
            if let Some(rate) = pacer.report_rate() {
                log::trace!("{:.1} frames/s", rate);
            }
            pacer.loop_sleep();
        }
    }

    /// run up to `frames` frames as fast as possible
    pub fn run_frames(&mut self, frames: usize) -> Result<Exit, io::Error> {
        for _ in 0..frames {
            if let Some(exit) = self.run_frame()? {
                return Ok(exit);
            }
        }
        Ok(Exit::FramesElapsed)
    }
}
