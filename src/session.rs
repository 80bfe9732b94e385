use std::fs;
use std::path::Path;

use tracing::{info, warn};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::parser;
use crate::runtime::{Interpreter, StepOutcome};
use crate::turtle::Turtle;

/// Everything a front end drives: the interpreter with its turtle, plus the
/// play/pause state and the tick counter shown next to the drawing.
#[derive(Debug)]
pub struct Session<T: Turtle> {
    interp: Interpreter<T>,
    playing: bool,
    running: bool,
    ticks: u64,
}

impl<T: Turtle> Session<T> {
    pub fn new(turtle: T, config: &Config) -> Result<Self> {
        Ok(Self {
            interp: Interpreter::with_config(turtle, config)?,
            playing: true,
            running: false,
            ticks: 0,
        })
    }

    /// Read and install a program file, then start playing it. If the file
    /// cannot be read or parsed the loaded program is left as it was.
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let src = fs::read_to_string(path).map_err(|source| {
            warn!(path = %path.display(), "cannot read program");
            Error::Io {
                path: path.to_path_buf(),
                source,
            }
        })?;
        self.load_source(&src)?;
        info!(path = %path.display(), "running program");
        Ok(())
    }

    pub fn load_source(&mut self, src: &str) -> Result<()> {
        let program = parser::load_str(src)?;
        self.interp.load(program);
        self.ticks = 0;
        self.playing = true;
        self.running = true;
        Ok(())
    }

    /// One clock tick. Returns whether the interpreter did any work.
    pub fn tick(&mut self) -> Result<bool> {
        if !self.playing || !self.running {
            return Ok(false);
        }
        self.ticks += 1;
        match self.interp.step() {
            Ok(StepOutcome::Continue) => Ok(true),
            Ok(StepOutcome::Finished) => {
                self.running = false;
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    /// Tick until the program finishes or playback stops, under the same step
    /// budget as [`Interpreter::run_to_end`]. A failing step is handed to
    /// `on_error` with the tick it happened on; returning the error stops the
    /// run, returning `Ok` carries on with the next command.
    pub fn run_to_end<F>(&mut self, max_steps: u64, mut on_error: F) -> Result<u64>
    where
        F: FnMut(u64, Error) -> Result<()>,
    {
        let mut steps = 0u64;
        loop {
            if steps == max_steps && self.interp.has_work() {
                return Err(Error::StepLimit(max_steps));
            }
            match self.tick() {
                Ok(true) => {}
                Ok(false) => return Ok(steps),
                Err(e) => on_error(self.ticks, e)?,
            }
            steps += 1;
        }
    }

    pub fn toggle_play(&mut self) {
        self.playing = !self.playing;
    }

    /// Stop, rewind the program and send the turtle home.
    pub fn reset(&mut self) {
        self.playing = false;
        self.running = false;
        self.ticks = 0;
        self.interp.reset();
        self.interp.turtle_mut().reset();
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn interpreter(&self) -> &Interpreter<T> {
        &self.interp
    }

    pub fn interpreter_mut(&mut self) -> &mut Interpreter<T> {
        &mut self.interp
    }

    pub fn turtle(&self) -> &T {
        self.interp.turtle()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::turtle::{DVec2, PlanarTurtle};

    fn session() -> Session<PlanarTurtle> {
        Session::new(PlanarTurtle::new(), &Config::default()).unwrap()
    }

    #[test]
    fn ticks_until_finished() {
        let mut s = session();
        assert!(!s.tick().unwrap(), "nothing loaded yet");
        s.load_source("left 90\nforward 1").unwrap();
        while s.tick().unwrap() {}
        assert!(!s.is_running());
        // 1 turn, 5 increments of 0.2, then the finishing tick
        assert_eq!(s.ticks(), 7);
        assert!(s.turtle().position().distance(DVec2::new(0.0, 1.0)) < 1e-9);
    }

    #[test]
    fn run_to_end_collects_or_stops_on_errors() {
        let mut s = session();
        s.load_source("left 1\nforward q\nleft 2\nadd q 1").unwrap();
        let mut seen = Vec::new();
        let steps = s
            .run_to_end(10, |tick, e| {
                seen.push((tick, e.to_string()));
                Ok(())
            })
            .unwrap();
        assert_eq!(steps, 4);
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0], (2, "variable 'q' is not defined".to_string()));
        assert!(!s.is_running());

        s.load_source("left 1\nforward q\nleft 2").unwrap();
        let err = s.run_to_end(10, |_, e| Err(e)).unwrap_err();
        assert!(matches!(err, Error::UndefinedVariable(ref n) if n == "q"));
        assert_eq!(s.interpreter().pc(), 2);
    }

    #[test]
    fn run_to_end_budget_matches_interpreter() {
        let mut s = session();
        s.load_source("left 1\nleft 2").unwrap();
        assert_eq!(s.run_to_end(2, |_, e| Err(e)).unwrap(), 2);

        s.load_source("left 1\nleft 2\nleft 3").unwrap();
        assert!(matches!(s.run_to_end(2, |_, e| Err(e)), Err(Error::StepLimit(2))));
        assert!(s.is_running());
    }

    #[test]
    fn paused_session_does_not_step() {
        let mut s = session();
        s.load_source("forward 1").unwrap();
        s.toggle_play();
        assert!(!s.tick().unwrap());
        assert_eq!(s.ticks(), 0);
        s.toggle_play();
        assert!(s.tick().unwrap());
    }

    #[test]
    fn reset_stops_and_rewinds() {
        let mut s = session();
        s.load_source("forward 3").unwrap();
        s.tick().unwrap();
        s.reset();
        assert!(!s.is_playing() && !s.is_running());
        assert_eq!(s.turtle().position(), DVec2::ZERO);
        assert_eq!(s.interpreter().pc(), 0);
        assert_eq!(s.interpreter().program().len(), 1);
    }

    #[test]
    fn missing_file_keeps_program() {
        let mut s = session();
        s.load_source("forward 3\nleft 1").unwrap();
        let err = s.load_file("/definitely/not/here.turtle").unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
        assert_eq!(s.interpreter().program().len(), 2);
    }
}
