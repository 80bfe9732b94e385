use tracing::{debug, info, warn};

use crate::config::Config;
use crate::env::Env;
use crate::error::{Error, Result};
use crate::parser::{self, Command, Fault, Operand, Program};
use crate::turtle::{Stride, Turtle};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Idle,
    Running,
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Continue,
    Finished,
}

/// Saved progress of one active `repeat`.
#[derive(Debug, Clone)]
struct Frame {
    commands: Vec<Command>,
    total: i64,
    iteration: i64,
    index: usize,
}

/// Resumable interpreter: every call to [`Interpreter::step`] does a bounded
/// amount of work and returns, so an external clock can pace the drawing.
#[derive(Debug)]
pub struct Interpreter<T: Turtle> {
    program: Program,
    env: Env,
    frames: Vec<Frame>,
    pc: usize,
    stride: Option<Stride>,
    state: State,
    step_size: f64,
    turtle: T,
}

impl<T: Turtle> Interpreter<T> {
    pub fn new(turtle: T) -> Self {
        Self {
            program: Program::default(),
            env: Env::new(),
            frames: Vec::new(),
            pc: 0,
            stride: None,
            state: State::Idle,
            step_size: crate::config::DEFAULT_STEP_SIZE,
            turtle,
        }
    }

    pub fn with_config(turtle: T, config: &Config) -> Result<Self> {
        config.validate()?;
        let mut interp = Self::new(turtle);
        interp.step_size = config.step_size;
        Ok(interp)
    }

    /// Install a parsed program, discarding the previous one and all variables.
    pub fn load(&mut self, program: Program) {
        self.clear();
        info!(commands = program.len(), "program loaded");
        self.program = program;
        self.state = State::Running;
    }

    /// Parse and install program text. On a syntax error the current program
    /// stays loaded.
    pub fn load_program(&mut self, src: &str) -> Result<()> {
        let program = parser::load_str(src)?;
        self.load(program);
        Ok(())
    }

    /// Rewind to the first command, keeping the program and variables.
    pub fn reset(&mut self) {
        self.frames.clear();
        self.stride = None;
        self.pc = 0;
        self.state = if self.program.is_empty() {
            State::Idle
        } else {
            State::Running
        };
    }

    pub fn clear(&mut self) {
        self.frames.clear();
        self.stride = None;
        self.pc = 0;
        self.program = Program::default();
        self.env = Env::new();
        self.state = State::Idle;
    }

    pub fn step(&mut self) -> Result<StepOutcome> {
        // An animated forward move finishes before anything else runs
        if let Some(stride) = self.stride.as_mut() {
            if let Some(d) = stride.next() {
                let done = stride.is_done();
                self.turtle.forward(d);
                if done {
                    self.stride = None;
                }
                return Ok(StepOutcome::Continue);
            }
            self.stride = None;
        }

        if let Some(frame) = self.frames.last_mut() {
            if frame.iteration >= frame.total {
                // only reachable on the first visit of a `repeat` with count <= 0
                self.frames.pop();
                info!(depth = self.frames.len(), "empty repeat skipped");
            } else if frame.index < frame.commands.len() {
                let cmd = frame.commands[frame.index].clone();
                frame.index += 1;
                self.execute(cmd)?;
            } else {
                frame.iteration += 1;
                if frame.iteration < frame.total {
                    frame.index = 0;
                    debug!(
                        iteration = frame.iteration,
                        total = frame.total,
                        "repeat iteration"
                    );
                } else {
                    self.frames.pop();
                    info!(depth = self.frames.len(), "end repeat block");
                }
            }
            return Ok(StepOutcome::Continue);
        }

        if self.pc < self.program.len() {
            let cmd = self.program.commands[self.pc].clone();
            self.pc += 1;
            self.execute(cmd)?;
            return Ok(StepOutcome::Continue);
        }

        if self.state != State::Finished {
            info!("program finished");
        }
        self.state = State::Finished;
        Ok(StepOutcome::Finished)
    }

    /// Whether the next [`step`](Self::step) does work rather than report
    /// `Finished`.
    pub fn has_work(&self) -> bool {
        self.stride.as_ref().is_some_and(|s| !s.is_done())
            || !self.frames.is_empty()
            || self.pc < self.program.len()
    }

    /// Step until the program finishes; returns the number of steps that did
    /// work. Fails with [`Error::StepLimit`] when work remains after
    /// `max_steps` of them.
    pub fn run_to_end(&mut self, max_steps: u64) -> Result<u64> {
        let mut steps = 0u64;
        loop {
            if steps == max_steps && self.has_work() {
                return Err(Error::StepLimit(max_steps));
            }
            match self.step()? {
                StepOutcome::Continue => steps += 1,
                StepOutcome::Finished => return Ok(steps),
            }
        }
    }

    fn execute(&mut self, cmd: Command) -> Result<()> {
        debug!(command = %cmd, "exec");
        match cmd {
            Command::SetVar(name, value) => self.env.set(&name, value),
            Command::Add(name, delta) => {
                let delta = self.env.resolve(&delta)?;
                self.env.add(&name, delta)?;
            }
            Command::Forward(d) => {
                let d = self.operand(&d)?;
                self.begin_forward(d);
            }
            Command::Left(a) => {
                let a = self.operand(&a)?;
                self.turtle.left(a);
            }
            Command::Right(a) => {
                let a = self.operand(&a)?;
                self.turtle.right(a);
            }
            Command::Up(a) => {
                let a = self.operand(&a)?;
                self.turtle.up(a);
            }
            Command::Down(a) => {
                let a = self.operand(&a)?;
                self.turtle.down(a);
            }
            Command::RollCw(a) => {
                let a = self.operand(&a)?;
                self.turtle.roll_cw(a);
            }
            Command::RollCcw(a) => {
                let a = self.operand(&a)?;
                self.turtle.roll_ccw(a);
            }
            Command::PenUp => self.turtle.penup(),
            Command::PenDown => self.turtle.pendown(),
            Command::Reset => self.turtle.reset(),
            Command::Repeat(count, body) => {
                let total = self.env.resolve(&count)?;
                info!(count = total, depth = self.frames.len() + 1, "repeat");
                self.frames.push(Frame {
                    commands: body,
                    total,
                    iteration: 0,
                    index: 0,
                });
            }
            Command::Malformed { tag, fault } => {
                return Err(match fault {
                    Fault::Arity { expected, found } => Error::Arity {
                        command: tag,
                        expected,
                        found,
                    },
                    Fault::Invalid(text) => Error::InvalidValue(text),
                })
            }
            Command::Unknown(raw) => warn!("unknown command: {}", raw.join(" ")),
        }
        Ok(())
    }

    fn operand(&self, op: &Operand) -> Result<f64> {
        Ok(self.env.resolve(op)? as f64)
    }

    // First increment now, the rest on following steps.
    fn begin_forward(&mut self, distance: f64) {
        let mut stride = Stride::new(distance, self.step_size);
        if let Some(d) = stride.next() {
            self.turtle.forward(d);
        }
        if !stride.is_done() {
            self.stride = Some(stride);
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn pc(&self) -> usize {
        self.pc
    }

    /// Number of active repeat blocks.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// True while a forward move is still being animated.
    pub fn is_moving(&self) -> bool {
        self.stride.is_some()
    }

    pub fn step_size(&self) -> f64 {
        self.step_size
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn env(&self) -> &Env {
        &self.env
    }

    pub fn turtle(&self) -> &T {
        &self.turtle
    }

    /// Direct access for manual, single-shot moves outside the program.
    pub fn turtle_mut(&mut self) -> &mut T {
        &mut self.turtle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::turtle::{DVec2, Path, PlanarTurtle};
    use pretty_assertions::assert_eq;

    /// Records every primitive call instead of moving.
    #[derive(Debug, Default)]
    struct Recorder {
        calls: Vec<String>,
        path: Path<i32>,
    }

    impl Turtle for Recorder {
        type Point = i32;

        fn penup(&mut self) {
            self.calls.push("penup".into());
        }
        fn pendown(&mut self) {
            self.calls.push("pendown".into());
        }
        fn forward(&mut self, distance: f64) {
            self.calls.push(format!("forward {}", distance));
        }
        fn left(&mut self, deg: f64) {
            self.calls.push(format!("left {}", deg));
        }
        fn right(&mut self, deg: f64) {
            self.calls.push(format!("right {}", deg));
        }
        fn up(&mut self, deg: f64) {
            self.calls.push(format!("up {}", deg));
        }
        fn reset(&mut self) {
            self.calls.push("reset".into());
        }
        fn is_pen_down(&self) -> bool {
            true
        }
        fn position(&self) -> i32 {
            0
        }
        fn path(&self) -> &Path<i32> {
            &self.path
        }
    }

    // Step size large enough that every test forward is a single increment.
    fn recorder(src: &str) -> Interpreter<Recorder> {
        let cfg = Config {
            step_size: 1000.0,
            ..Config::default()
        };
        let mut interp = Interpreter::with_config(Recorder::default(), &cfg).unwrap();
        interp.load_program(src).unwrap();
        interp
    }

    fn run(src: &str) -> Vec<String> {
        let mut interp = recorder(src);
        interp.run_to_end(10_000).unwrap();
        interp.turtle().calls.clone()
    }

    #[test]
    fn repeat_runs_body_n_times() {
        assert_eq!(
            run("repeat 3 [\nforward 5\nleft 1\n]"),
            vec![
                "forward 5", "left 1", "forward 5", "left 1", "forward 5", "left 1"
            ]
        );
    }

    #[test]
    fn repeat_zero_or_negative_skips_body() {
        for count in ["0", "-2"] {
            let mut interp = recorder(&format!("repeat {} [\nforward 5\n]\nup 1", count));
            // push the frame
            interp.step().unwrap();
            assert_eq!(interp.depth(), 1);
            // first visit pops it
            interp.step().unwrap();
            assert_eq!(interp.depth(), 0);
            interp.run_to_end(10).unwrap();
            assert_eq!(interp.turtle().calls, vec!["up 1"]);
        }
    }

    #[test]
    fn nested_repeat_is_body_first() {
        let calls = run("repeat 2 [\nrepeat 3 [\nforward 1\n]\nright 9\n]");
        assert_eq!(
            calls,
            vec![
                "forward 1", "forward 1", "forward 1", "right 9", "forward 1", "forward 1",
                "forward 1", "right 9"
            ]
        );
    }

    #[test]
    fn variables_resolve_at_execution_time() {
        let calls = run("set n 2\nset len 10\nrepeat n [\nforward len\nadd len n\n]\nadd n 1\nleft n");
        assert_eq!(calls, vec!["forward 10", "forward 12", "left 3"]);
    }

    #[test]
    fn one_command_per_step() {
        let mut interp = recorder("set n 2\nrepeat n [\npenup\n]\npendown");
        let mut trace = Vec::new();
        loop {
            let outcome = interp.step().unwrap();
            trace.push((interp.pc(), interp.depth(), interp.turtle().calls.len()));
            if outcome == StepOutcome::Finished {
                break;
            }
        }
        assert_eq!(
            trace,
            vec![
                (1, 0, 0), // set
                (2, 1, 0), // repeat pushes
                (2, 1, 1), // penup
                (2, 1, 1), // next iteration
                (2, 1, 2), // penup
                (2, 0, 2), // pop
                (3, 0, 3), // pendown
                (3, 0, 3), // finished
            ]
        );
        assert_eq!(interp.state(), State::Finished);
    }

    #[test]
    fn undefined_variable_fails_without_moving() {
        let mut interp = recorder("forward x\nleft 5");
        let err = interp.step().unwrap_err();
        assert!(matches!(err, Error::UndefinedVariable(ref n) if n == "x"));
        assert!(interp.turtle().calls.is_empty());
        // the failing command is consumed
        interp.run_to_end(10).unwrap();
        assert_eq!(interp.turtle().calls, vec!["left 5"]);
    }

    #[test]
    fn add_needs_a_defined_variable() {
        let mut interp = recorder("add total 3");
        assert!(matches!(interp.step(), Err(Error::UndefinedVariable(_))));
        assert!(interp.env().is_empty());
    }

    #[test]
    fn malformed_commands_fail_when_executed() {
        let mut interp = recorder("forward 1 2\nset x y\nforward 1.5");
        assert!(matches!(
            interp.step(),
            Err(Error::Arity {
                expected: 1,
                found: 2,
                ..
            })
        ));
        assert!(matches!(interp.step(), Err(Error::InvalidValue(ref t)) if t == "y"));
        assert!(matches!(interp.step(), Err(Error::InvalidValue(ref t)) if t == "1.5"));
    }

    #[test]
    fn unknown_commands_are_skipped() {
        assert_eq!(run("jump 3\nforward 2"), vec!["forward 2"]);
        assert_eq!(run("draw [x]\n]\nforward 1"), vec!["forward 1"]);
    }

    #[test]
    fn stray_bracket_argument_fails_on_execution() {
        let mut interp = recorder("forward 10]\nleft 1");
        assert!(matches!(
            interp.step(),
            Err(Error::Arity { ref command, expected: 1, found: 2 }) if command == "forward"
        ));
        assert_eq!(interp.run_to_end(10).unwrap(), 1);
        assert_eq!(interp.turtle().calls, vec!["left 1"]);
    }

    #[test]
    fn empty_repeat_body_takes_one_step_per_pass() {
        // push, then three empty passes, the last one popping the frame
        let mut interp = recorder("repeat 3 [\n]");
        assert_eq!(interp.run_to_end(100).unwrap(), 4);
        assert!(interp.turtle().calls.is_empty());
        assert_eq!(interp.depth(), 0);

        let mut interp = recorder("repeat 3 [\n]\nleft 1");
        assert_eq!(interp.run_to_end(100).unwrap(), 5);
        assert_eq!(interp.turtle().calls, vec!["left 1"]);
    }

    #[test]
    fn reset_and_clear() {
        let mut interp = recorder("set n 1\nrepeat 5 [\nforward 1\n]");
        for _ in 0..4 {
            interp.step().unwrap();
        }
        assert_eq!(interp.depth(), 1);
        interp.reset();
        assert_eq!((interp.pc(), interp.depth()), (0, 0));
        assert_eq!(interp.env().get("n").unwrap(), 1);
        assert_eq!(interp.state(), State::Running);
        interp.clear();
        assert!(interp.program().is_empty());
        assert!(interp.env().is_empty());
        assert_eq!(interp.state(), State::Idle);
        assert_eq!(interp.step().unwrap(), StepOutcome::Finished);
    }

    #[test]
    fn reset_command_keeps_program_position() {
        let mut interp = recorder("forward 1\nreset\nforward 2");
        interp.run_to_end(10).unwrap();
        assert_eq!(interp.turtle().calls, vec!["forward 1", "reset", "forward 2"]);
        assert_eq!(interp.pc(), 3);
    }

    #[test]
    fn syntax_error_keeps_previous_program() {
        let mut interp = recorder("forward 1");
        assert!(matches!(
            interp.load_program("repeat 2 [\nforward 1"),
            Err(Error::Syntax { .. })
        ));
        assert_eq!(interp.program().len(), 1);
    }

    #[test]
    fn forward_is_animated_in_increments() {
        let cfg = Config {
            step_size: 4.0,
            ..Config::default()
        };
        let mut interp = Interpreter::with_config(Recorder::default(), &cfg).unwrap();
        interp.load_program("forward 10\nleft 1").unwrap();
        interp.step().unwrap();
        assert!(interp.is_moving());
        interp.step().unwrap();
        interp.step().unwrap();
        assert!(!interp.is_moving());
        interp.run_to_end(10).unwrap();
        assert_eq!(
            interp.turtle().calls,
            vec!["forward 4", "forward 4", "forward 2", "left 1"]
        );
    }

    #[test]
    fn step_limit_stops_runaway_programs() {
        let mut interp = recorder("repeat 1000 [\nleft 1\n]");
        assert!(matches!(interp.run_to_end(50), Err(Error::StepLimit(50))));
    }

    #[test]
    fn step_limit_allows_an_exact_fit() {
        let mut interp = recorder("left 1");
        assert_eq!(interp.run_to_end(1).unwrap(), 1);
        assert_eq!(interp.state(), State::Finished);

        let mut interp = recorder("left 1\nleft 2");
        assert!(matches!(interp.run_to_end(1), Err(Error::StepLimit(1))));
        assert_eq!(interp.turtle().calls, vec!["left 1"]);
        assert!(interp.has_work());
    }

    #[test]
    fn square_closes() {
        let mut interp = Interpreter::new(PlanarTurtle::new());
        interp
            .load_program("set n 4\npendown\nrepeat n [\n  forward 10\n  right 90\n]")
            .unwrap();
        interp.run_to_end(100_000).unwrap();
        let t = interp.turtle();
        assert!(t.position().distance(DVec2::ZERO) < 1e-9);
        assert!(t.heading().degrees() < 1e-9);
        assert_eq!(t.path().strokes().len(), 1);
        assert_eq!(interp.state(), State::Finished);
    }
}
