//! Cube tutor: an interactive 3x3x3 cube with turn controls and move
//! reversal, drawn with iced and wgpu.
//!
//! `cubetutor` opens the window; `cubetutor simulate <moves.json>` replays a
//! recorded move list headlessly and checks that reversing it restores the
//! cube.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use iced::widget::{Column, Row, Shader, button, column, container, mouse_area, scrollable, text};
use iced::{Element, Length, Settings, Subscription, Task};
use log::{error, info};
use rand::SeedableRng;
use rand::rngs::StdRng;

use cubetutor::coords::{
    ALL_COORDINATES, Coord, center_coordinates, corner_coordinates, edge_coordinates,
};
use cubetutor::moves::moves_from_json;
use cubetutor::scene::Scene;
use cubetutor::{CubeSession, Direction, EngineConfig, Error, Level, LogicalFace};

mod renderer;
mod shader_widget;

use shader_widget::CubeViewport;

/// Number of random turns queued by the Shuffle button.
const SHUFFLE_TURNS: usize = 20;

/// Tolerance for comparing piece transforms after a replay.
const ARRANGEMENT_EPSILON: f32 = 1e-3;

#[derive(Debug, Parser)]
#[command(version, about = "Interactive cube tutor")]
struct Cli {
    /// JSON file overriding integrator gains and drag sensitivity
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Which pieces the window shows
    #[arg(long, value_enum, default_value_t = PieceSet::All)]
    pieces: PieceSet,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Open the interactive window (default)
    Run,
    /// Replay a move list, reverse it and check the cube is restored
    Simulate {
        /// JSON array of `{face, level, direction, rotation}` moves
        moves: PathBuf,
        /// Tick budget for each animated step
        #[arg(long, default_value_t = 10_000)]
        max_ticks: usize,
    },
}

/// Piece subsets shown by the tutorial chapters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum PieceSet {
    All,
    Centers,
    Edges,
    Corners,
}

impl PieceSet {
    fn coordinates(self) -> Vec<Coord> {
        match self {
            PieceSet::All => ALL_COORDINATES.to_vec(),
            PieceSet::Centers => center_coordinates(),
            PieceSet::Edges => edge_coordinates(),
            PieceSet::Corners => corner_coordinates(),
        }
    }
}

/// Main application state
pub(crate) struct TutorApp {
    session: CubeSession,
    /// Coordinates of the pieces drawn, reused when the cube is rebuilt.
    visible: Vec<Coord>,
    rng: StdRng,
}

/// Messages that the application can receive
#[derive(Debug, Clone)]
pub(crate) enum Message {
    Tick,
    Turn {
        face: LogicalFace,
        level: Level,
        direction: Direction,
    },
    Hover(LogicalFace, Level),
    Unhover,
    DragStarted,
    Dragged {
        dx: f32,
        dy: f32,
    },
    DragEnded {
        floor_button: bool,
    },
    ResetCube,
    ReverseMoves,
    Shuffle,
}

impl TutorApp {
    pub(crate) fn new(config: EngineConfig, visible: Vec<Coord>) -> Self {
        let mut session = CubeSession::new(config);
        session.initialize_cube(&visible);
        Self {
            session,
            visible,
            rng: StdRng::from_os_rng(),
        }
    }

    pub(crate) fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::Tick => self.session.tick(),
            Message::Turn {
                face,
                level,
                direction,
            } => {
                let _ = self.session.request_layer_turn(face, level, direction, false);
            }
            Message::Hover(face, level) => self.session.highlight_layer(face, level),
            Message::Unhover => self.session.clear_highlights(),
            Message::DragStarted => self.session.begin_drag(),
            Message::Dragged { dx, dy } => self.session.drag_by(dx, dy),
            Message::DragEnded { floor_button } => {
                self.session.end_drag();
                if floor_button && !self.session.is_busy() {
                    let _ = self.session.reset_orientation();
                }
            }
            Message::ResetCube => self.session.initialize_cube(&self.visible),
            Message::ReverseMoves => {
                let _ = self.session.undo_all();
            }
            Message::Shuffle => {
                let _ = self.session.shuffle(SHUFFLE_TURNS, &mut self.rng);
            }
        }

        Task::none()
    }

    pub(crate) fn subscription(&self) -> Subscription<Message> {
        iced::window::frames().map(|_| Message::Tick)
    }

    pub(crate) fn view(&self) -> Element<'_, Message> {
        let idle = !self.session.is_busy();

        let grid = LogicalFace::ALL
            .iter()
            .fold(Column::new().spacing(5), |grid, &face| {
                let row = Level::ALL.iter().fold(Row::new().spacing(5), |row, &level| {
                    row.push(self.turn_control(face, level, idle))
                });
                grid.push(row)
            });

        let history = if self.session.moves().is_empty() {
            Column::new().push(text("No moves yet"))
        } else {
            self.session
                .moves()
                .moves()
                .iter()
                .enumerate()
                .fold(Column::new().spacing(2), |list, (i, mv)| {
                    list.push(text(format!("#{} {mv}", i + 1)).size(14))
                })
        };

        let actions = Row::new()
            .spacing(5)
            .push(button("Reset Cube").on_press(Message::ResetCube))
            .push(
                button("Reverse Moves")
                    .on_press_maybe((idle && !self.session.moves().is_empty()).then_some(Message::ReverseMoves)),
            )
            .push(button("Shuffle").on_press_maybe(idle.then_some(Message::Shuffle)));

        let controls = column![
            text("Turn a layer (right click reverses)"),
            grid,
            text(format!("Moves: {}", self.session.moves().len())),
            scrollable(history).height(Length::Fill),
            actions,
        ]
        .spacing(15)
        .width(320);

        let viewport = Shader::new(CubeViewport::new(&self.session))
            .width(Length::Fill)
            .height(Length::Fill);

        Row::new()
            .spacing(10)
            .padding(10)
            .push(container(controls).height(Length::Fill))
            .push(viewport)
            .into()
    }

    fn turn_control(&self, face: LogicalFace, level: Level, idle: bool) -> Element<'_, Message> {
        let label = format!("{} {}", face, level.index() + 1);
        let clockwise = Message::Turn {
            face,
            level,
            direction: Direction::Clockwise,
        };
        let area = mouse_area(
            button(text(label))
                .width(95)
                .on_press_maybe(idle.then_some(clockwise)),
        )
        .on_enter(Message::Hover(face, level))
        .on_exit(Message::Unhover);

        if idle {
            area.on_right_press(Message::Turn {
                face,
                level,
                direction: Direction::CounterClockwise,
            })
            .into()
        } else {
            area.into()
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig, Error> {
    match path {
        Some(path) => EngineConfig::load(path),
        None => Ok(EngineConfig::default()),
    }
}

/// Replays `moves_path` at the orientations it was recorded at, reverses it
/// and compares the result against a solved cube.
fn simulate(config: EngineConfig, moves_path: &Path, max_ticks: usize) -> Result<bool, Error> {
    let json = fs::read_to_string(moves_path).map_err(|source| Error::Io {
        path: moves_path.to_path_buf(),
        source,
    })?;
    let moves = moves_from_json(&json)?;
    info!("replaying {} moves from {}", moves.len(), moves_path.display());

    let mut session = CubeSession::new(config);
    session.initialize_cube(&ALL_COORDINATES);
    let solved = Scene::new(&ALL_COORDINATES, session.orientation().rotation());

    for mv in &moves {
        let _ = session.request_whole_cube_reorientation(mv.rotation);
        session.settle(max_ticks);
        let _ = session.request_layer_turn(mv.face, mv.level, mv.direction, false);
        session.settle(max_ticks);
        println!("{mv}");
    }
    println!("{} moves in log after replay", session.moves().len());

    let _ = session.reverse_moves(&moves);
    let ticks = session.settle(max_ticks.saturating_mul(2 * moves.len().max(1)));
    info!("reversal settled after {ticks} ticks");

    Ok(session
        .scene()
        .is_some_and(|scene| scene.same_arrangement(&solved, ARRANGEMENT_EPSILON)))
}

fn run(config: EngineConfig, visible: Vec<Coord>) -> iced::Result {
    iced::application("Cube Tutor", TutorApp::update, TutorApp::view)
        .subscription(TutorApp::subscription)
        .settings(Settings {
            antialiasing: true,
            ..Settings::default()
        })
        .run_with(move || (TutorApp::new(config, visible), Task::none()))
}

/// Entry point for the cube tutor
fn main() -> ExitCode {
    env_logger::builder().format_timestamp(None).init();

    let cli = Cli::parse();
    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            error!("{err}");
            return ExitCode::FAILURE;
        }
    };

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => match run(config, cli.pieces.coordinates()) {
            Ok(()) => ExitCode::SUCCESS,
            Err(err) => {
                error!("{err}");
                ExitCode::FAILURE
            }
        },
        Command::Simulate { moves, max_ticks } => match simulate(config, &moves, max_ticks) {
            Ok(true) => {
                println!("restored: the reversed replay matches a solved cube");
                ExitCode::SUCCESS
            }
            Ok(false) => {
                println!("not restored: the reversed replay differs from a solved cube");
                ExitCode::FAILURE
            }
            Err(err) => {
                error!("{err}");
                ExitCode::FAILURE
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app() -> TutorApp {
        TutorApp::new(EngineConfig::default(), ALL_COORDINATES.to_vec())
    }

    fn settle(app: &mut TutorApp) {
        for _ in 0..100_000 {
            if !app.session.is_busy() {
                return;
            }
            let _ = app.update(Message::Tick);
        }
    }

    #[test]
    fn floor_button_is_ignored_while_a_reversal_runs() {
        let mut app = app();
        let _ = app.update(Message::Turn {
            face: LogicalFace::Front,
            level: Level::OUTER,
            direction: Direction::Clockwise,
        });
        settle(&mut app);
        let _ = app.update(Message::DragStarted);
        let _ = app.update(Message::Dragged { dx: 120.0, dy: 0.0 });
        let _ = app.update(Message::DragEnded {
            floor_button: false,
        });

        let _ = app.update(Message::ReverseMoves);
        let _ = app.update(Message::Tick);
        let _ = app.update(Message::DragEnded { floor_button: true });
        let _ = app.update(Message::Turn {
            face: LogicalFace::Top,
            level: Level::OUTER,
            direction: Direction::CounterClockwise,
        });
        settle(&mut app);

        assert!(app.session.moves().is_empty());
        let solved = Scene::new(&ALL_COORDINATES, app.session.orientation().rotation());
        assert!(
            app.session
                .scene()
                .unwrap()
                .same_arrangement(&solved, ARRANGEMENT_EPSILON)
        );
    }
}
