//! One interactive cube and every animated operation running on it.
//!
//! The session is driven by [`CubeSession::tick`], called once per frame.
//! Layer turns and whole-cube reorientations advance one integrator step per
//! tick; sequences (reversal, shuffle) are queued steps that start whenever
//! both animation slots are idle.
//!
//! Requests that make no sense in the current state are dropped and return
//! `None`. Accepted requests hand back a [`Completion`] that resolves once
//! the operation reaches its target, or resolves as cancelled if the cube is
//! disposed first.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::f32::consts::{FRAC_PI_2, PI, TAU};
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

use log::{debug, info, trace};
use nalgebra::{Unit, UnitQuaternion, Vector2, Vector3};
use rand::Rng;

use crate::config::EngineConfig;
use crate::coords::{Coord, DirectionKey};
use crate::integrator::{LayerTurnState, step_layer, step_orientation};
use crate::layer::{LAYER_SIZE, Level, select_layer};
use crate::moves::{Direction, Move, MoveLog};
use crate::orientation::{
    LogicalFace, Orientation, PrimaryNormals, recolor_markers, resolve_primary_normals,
};
use crate::scene::Scene;

/// How an operation ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Completed,
    /// The cube was torn down before the operation finished.
    Cancelled,
}

#[derive(Default)]
struct SignalState {
    outcome: Option<Outcome>,
    waker: Option<Waker>,
}

/// Caller side of an operation. Poll it with [`Completion::outcome`] or
/// await it.
pub struct Completion {
    state: Rc<RefCell<SignalState>>,
}

impl Completion {
    pub fn outcome(&self) -> Option<Outcome> {
        self.state.borrow().outcome
    }

    pub fn is_finished(&self) -> bool {
        self.outcome().is_some()
    }
}

impl Future for Completion {
    type Output = Outcome;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Outcome> {
        let mut state = self.state.borrow_mut();
        match state.outcome {
            Some(outcome) => Poll::Ready(outcome),
            None => {
                state.waker = Some(cx.waker().clone());
                Poll::Pending
            }
        }
    }
}

/// Engine side of an operation. Dropping it unresolved resolves the
/// completion as cancelled.
struct Signal {
    state: Rc<RefCell<SignalState>>,
}

impl Signal {
    fn new() -> (Signal, Completion) {
        let state = Rc::new(RefCell::new(SignalState::default()));
        (
            Signal {
                state: Rc::clone(&state),
            },
            Completion { state },
        )
    }

    fn resolve(&self, outcome: Outcome) {
        let waker = {
            let mut state = self.state.borrow_mut();
            if state.outcome.is_some() {
                return;
            }
            state.outcome = Some(outcome);
            state.waker.take()
        };
        if let Some(waker) = waker {
            waker.wake();
        }
    }

    fn complete(self) {
        self.resolve(Outcome::Completed);
    }
}

impl Drop for Signal {
    fn drop(&mut self) {
        self.resolve(Outcome::Cancelled);
    }
}

/// An in-flight whole-cube reorientation.
struct Reorientation {
    target: Orientation,
    velocity: Vector2<f32>,
    signal: Option<Signal>,
}

/// An in-flight layer turn.
struct ActiveTurn {
    /// Cube-space rotation axis, sign of the direction included.
    axis: Unit<Vector3<f32>>,
    state: LayerTurnState,
    signal: Option<Signal>,
}

/// One queued step of a sequence.
#[derive(Clone, Copy, Debug)]
enum Step {
    Reorient(Orientation),
    Turn {
        face: LogicalFace,
        level: Level,
        direction: Direction,
        record: bool,
    },
}

/// A queued sequence of steps with one completion for the whole run.
struct Script {
    steps: VecDeque<Step>,
    signal: Signal,
    clear_highlights_when_done: bool,
}

/// Owns one cube instance and everything that animates it.
pub struct CubeSession {
    config: EngineConfig,
    scene: Option<Scene>,
    orientation: Orientation,
    normals: PrimaryNormals,
    normals_stale: bool,
    reorientation: Option<Reorientation>,
    turn: Option<ActiveTurn>,
    script: Option<Script>,
    log: MoveLog,
    dragging: bool,
}

impl CubeSession {
    /// Creates a session with no cube. Call
    /// [`initialize_cube`](Self::initialize_cube) before issuing requests.
    pub fn new(config: EngineConfig) -> Self {
        let orientation = config.initial_orientation;
        Self {
            config,
            scene: None,
            orientation,
            normals: resolve_primary_normals(&orientation.rotation()),
            normals_stale: false,
            reorientation: None,
            turn: None,
            script: None,
            log: MoveLog::new(),
            dragging: false,
        }
    }

    /// (Re)builds the cube, discarding the previous one and its move log.
    pub fn initialize_cube(&mut self, visible: &[Coord]) {
        self.dispose();
        self.orientation = self.config.initial_orientation;
        self.scene = Some(Scene::new(visible, self.orientation.rotation()));
        self.refresh_normals();
        info!("cube initialised with {} visible pieces", visible.len());
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn scene(&self) -> Option<&Scene> {
        self.scene.as_ref()
    }

    pub fn is_initialized(&self) -> bool {
        self.scene.is_some()
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// Read-only view of the move log.
    pub fn moves(&self) -> &MoveLog {
        &self.log
    }

    pub fn is_turning(&self) -> bool {
        self.turn.is_some()
    }

    pub fn is_reorienting(&self) -> bool {
        self.reorientation.is_some()
    }

    /// Whether anything is animating or queued.
    pub fn is_busy(&self) -> bool {
        self.turn.is_some() || self.reorientation.is_some() || self.script.is_some()
    }

    /// Current front/top/left mapping, refreshed first if stale.
    pub fn primary_normals(&mut self) -> Option<PrimaryNormals> {
        if self.scene.is_none() {
            return None;
        }
        if self.normals_stale {
            self.refresh_normals();
        }
        Some(self.normals)
    }

    /// Physical direction a logical face currently maps to.
    pub fn resolve_face(&mut self, face: LogicalFace) -> Option<DirectionKey> {
        self.primary_normals().map(|normals| normals.get(face))
    }

    fn refresh_normals(&mut self) {
        let Some(scene) = self.scene.as_mut() else {
            return;
        };
        self.normals = resolve_primary_normals(&scene.cube_rotation());
        recolor_markers(scene.markers_mut(), &self.normals);
        self.normals_stale = false;
        trace!(
            "primary normals: front {} top {} left {}",
            self.normals.front, self.normals.top, self.normals.left
        );
    }

    fn set_orientation(&mut self, orientation: Orientation) {
        self.orientation = orientation;
        if let Some(scene) = self.scene.as_mut() {
            scene.set_cube_rotation(orientation.rotation());
        }
        self.normals_stale = true;
    }

    /// Starts a quarter turn of one layer.
    ///
    /// Returns `None` if no cube exists, another turn is in flight or a
    /// sequence is running. Unless
    /// `suppress_log` is set the move is recorded, cancelling against the
    /// previous entry if it is that entry's inverse.
    pub fn request_layer_turn(
        &mut self,
        face: LogicalFace,
        level: Level,
        direction: Direction,
        suppress_log: bool,
    ) -> Option<Completion> {
        if self.script.is_some() {
            debug!("layer turn {face} {} dropped: a sequence is running", level.index());
            return None;
        }
        let (signal, completion) = Signal::new();
        self.start_turn(face, level, direction, !suppress_log, Some(signal))
            .then_some(completion)
    }

    fn start_turn(
        &mut self,
        face: LogicalFace,
        level: Level,
        direction: Direction,
        record: bool,
        signal: Option<Signal>,
    ) -> bool {
        self.clear_highlights();
        if self.turn.is_some() {
            debug!("layer turn {face} {} dropped: a turn is in flight", level.index());
            return false;
        }
        let Some(physical) = self.resolve_face(face) else {
            debug!("layer turn dropped: no cube");
            return false;
        };
        let Some(scene) = self.scene.as_mut() else {
            return false;
        };
        let members = select_layer(scene, physical, level);
        if members.len() != LAYER_SIZE || !scene.detach_layer(&members) {
            debug!("layer turn dropped: could not detach layer");
            return false;
        }

        let mv = Move {
            face,
            level,
            direction,
            rotation: self.orientation,
        };
        if record {
            self.log.push(mv);
        }
        debug!("turning {mv} around {physical}");
        self.turn = Some(ActiveTurn {
            axis: Unit::new_normalize(physical.vector() * direction.sign()),
            state: LayerTurnState::new(),
            signal,
        });
        true
    }

    /// Animates the whole cube to `target`.
    ///
    /// Returns `None` if no cube exists, another reorientation is in flight
    /// or a sequence is running.
    pub fn request_whole_cube_reorientation(&mut self, target: Orientation) -> Option<Completion> {
        if self.reorientation.is_some() {
            debug!("reorientation dropped: another reorientation is in flight");
            return None;
        }
        if self.script.is_some() {
            debug!("reorientation dropped: a sequence is running");
            return None;
        }
        let (signal, completion) = Signal::new();
        self.start_reorientation(target, Some(signal))
            .then_some(completion)
    }

    /// Animates the whole cube back to the configured initial orientation.
    pub fn reset_orientation(&mut self) -> Option<Completion> {
        self.request_whole_cube_reorientation(self.config.initial_orientation)
    }

    fn start_reorientation(&mut self, target: Orientation, signal: Option<Signal>) -> bool {
        if self.scene.is_none() {
            debug!("reorientation dropped: no cube");
            return false;
        }
        if self.reorientation.is_some() {
            return false;
        }
        self.clear_highlights();
        self.reorientation = Some(Reorientation {
            target,
            velocity: Vector2::zeros(),
            signal,
        });
        true
    }

    /// Undoes `moves` newest first without touching the move log.
    ///
    /// Before each inverse turn the cube is brought back to the orientation
    /// the move was issued at, since that is what gave its face a meaning.
    pub fn reverse_moves(&mut self, moves: &[Move]) -> Option<Completion> {
        self.start_script(reversal_steps(moves, false), true)
    }

    /// Reverses the session's own move log. Each inverse turn cancels its
    /// log entry as it starts, leaving the log empty.
    pub fn undo_all(&mut self) -> Option<Completion> {
        let moves = self.log.moves().to_vec();
        self.start_script(reversal_steps(&moves, true), true)
    }

    /// Queues `count` random unlogged turns.
    pub fn shuffle<R: Rng + ?Sized>(&mut self, count: usize, rng: &mut R) -> Option<Completion> {
        let steps = (0..count)
            .map(|_| Step::Turn {
                face: LogicalFace::ALL[rng.random_range(0..LogicalFace::ALL.len())],
                level: Level::ALL[rng.random_range(0..Level::ALL.len())],
                direction: if rng.random_bool(0.5) {
                    Direction::Clockwise
                } else {
                    Direction::CounterClockwise
                },
                record: false,
            })
            .collect();
        self.start_script(steps, false)
    }

    fn start_script(
        &mut self,
        steps: VecDeque<Step>,
        clear_highlights_when_done: bool,
    ) -> Option<Completion> {
        if self.scene.is_none() {
            debug!("sequence dropped: no cube");
            return None;
        }
        if self.script.is_some() {
            debug!("sequence dropped: another sequence is running");
            return None;
        }
        debug!("running sequence of {} steps", steps.len());
        let (signal, completion) = Signal::new();
        self.script = Some(Script {
            steps,
            signal,
            clear_highlights_when_done,
        });
        self.advance_script();
        Some(completion)
    }

    /// Highlights the layer a turn of `face` at `level` would move,
    /// replacing any previous highlight. Ignored while a turn is in flight.
    pub fn highlight_layer(&mut self, face: LogicalFace, level: Level) {
        if self.turn.is_some() {
            return;
        }
        self.clear_highlights();
        let Some(direction) = self.resolve_face(face) else {
            return;
        };
        let Some(scene) = self.scene.as_mut() else {
            return;
        };
        for id in select_layer(scene, direction, level) {
            if let Some(piece) = scene.pieces_mut().get_mut(id) {
                piece.highlight();
            }
        }
    }

    pub fn clear_highlights(&mut self) {
        if let Some(scene) = self.scene.as_mut() {
            for piece in scene.pieces_mut() {
                piece.clear_highlight();
            }
        }
    }

    pub fn begin_drag(&mut self) {
        if self.scene.is_some() {
            self.dragging = true;
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    /// Rotates the whole cube by a pointer movement in pixels.
    ///
    /// Horizontal movement is inverted while the cube is upside down so the
    /// visible face still follows the pointer.
    pub fn drag_by(&mut self, dx: f32, dy: f32) {
        if !self.dragging {
            return;
        }
        let flipped = {
            let x = self.orientation.x.rem_euclid(TAU);
            x > FRAC_PI_2 && x < PI + FRAC_PI_2
        };
        let dx = if flipped { -dx } else { dx };
        let sensitivity = self.config.drag_sensitivity;
        self.set_orientation(Orientation::new(
            self.orientation.x + dy * sensitivity,
            self.orientation.y + dx * sensitivity,
        ));
    }

    /// Ends a drag and refreshes the front/top/left mapping.
    pub fn end_drag(&mut self) {
        if !self.dragging {
            return;
        }
        self.dragging = false;
        self.refresh_normals();
    }

    /// Advances every running operation by one step.
    pub fn tick(&mut self) {
        if self.scene.is_none() {
            return;
        }
        self.tick_reorientation();
        self.tick_turn();
        self.advance_script();
    }

    /// Ticks until nothing is animating or queued, at most `max_ticks`
    /// times. Returns the number of ticks taken.
    pub fn settle(&mut self, max_ticks: usize) -> usize {
        let mut ticks = 0;
        while self.is_busy() && ticks < max_ticks {
            self.tick();
            ticks += 1;
        }
        ticks
    }

    fn tick_reorientation(&mut self) {
        let Some(op) = &self.reorientation else {
            return;
        };
        let step = step_orientation(
            self.orientation,
            op.target,
            op.velocity,
            &self.config.whole_cube,
        );
        self.set_orientation(step.orientation);

        if !step.arrived {
            if let Some(op) = self.reorientation.as_mut() {
                op.velocity = step.velocity;
            }
            return;
        }
        if let Some(op) = self.reorientation.take() {
            self.refresh_normals();
            trace!("reorientation reached {:?}", op.target);
            if let Some(signal) = op.signal {
                signal.complete();
            }
        }
    }

    fn tick_turn(&mut self) {
        let Some(turn) = self.turn.as_mut() else {
            return;
        };
        let step = step_layer(turn.state, &self.config.layer);
        turn.state = step.state;
        let rotation = UnitQuaternion::from_axis_angle(&turn.axis, step.delta);
        if let Some(scene) = self.scene.as_mut() {
            scene.rotate_group(rotation);
            if step.arrived {
                scene.reattach_layer();
            }
        }
        if step.arrived {
            if let Some(turn) = self.turn.take() {
                trace!("layer turn finished");
                if let Some(signal) = turn.signal {
                    signal.complete();
                }
            }
        }
    }

    fn advance_script(&mut self) {
        if self.turn.is_some() || self.reorientation.is_some() {
            return;
        }
        let Some(script) = self.script.as_mut() else {
            return;
        };
        let next = script.steps.pop_front();
        match next {
            Some(Step::Reorient(target)) => {
                self.start_reorientation(target, None);
            }
            Some(Step::Turn {
                face,
                level,
                direction,
                record,
            }) => {
                self.start_turn(face, level, direction, record, None);
            }
            None => {
                if let Some(script) = self.script.take() {
                    if script.clear_highlights_when_done {
                        self.clear_highlights();
                    }
                    debug!("sequence finished");
                    script.signal.complete();
                }
            }
        }
    }

    /// Tears down the cube. Pending completions resolve as cancelled.
    /// Calling it again is a no-op.
    pub fn dispose(&mut self) {
        if self.scene.is_none() {
            return;
        }
        self.script = None;
        self.turn = None;
        self.reorientation = None;
        self.scene = None;
        self.dragging = false;
        self.log.clear();
        info!("cube disposed");
    }
}

fn reversal_steps(moves: &[Move], record: bool) -> VecDeque<Step> {
    moves
        .iter()
        .rev()
        .flat_map(|mv| {
            [
                Step::Reorient(mv.rotation),
                Step::Turn {
                    face: mv.face,
                    level: mv.level,
                    direction: mv.direction.inverse(),
                    record,
                },
            ]
        })
        .collect()
}
