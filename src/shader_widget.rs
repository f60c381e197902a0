//! Custom shader widget showing the cube.
//!
//! The widget turns pointer input into drag messages for the session and
//! detects clicks on the floor button. Rendering state lives in the
//! [`Renderer`] kept in the shader storage.

use iced::widget::shader::{self, wgpu};
use iced::{Point, Rectangle, event, mouse};

use cubetutor::camera::{Camera, Projection};
use cubetutor::pick::{PickKind, calculate_mouse_ray, pick_object, scene_pickables};
use cubetutor::session::CubeSession;

use crate::Message;
use crate::renderer::{InstanceRaw, Renderer, generate_instances};

/// Pointer travel, in logical pixels, below which a press and release
/// count as a click rather than a drag.
const CLICK_SLOP: f32 = 4.0;

/// Snapshot of everything the GPU needs for one frame.
#[derive(Debug, Clone)]
pub(crate) struct CubePrimitive {
    instances: Vec<InstanceRaw>,
    camera: Camera,
    projection: Projection,
}

impl shader::Primitive for CubePrimitive {
    fn prepare(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        format: wgpu::TextureFormat,
        storage: &mut shader::Storage,
        bounds: &Rectangle,
        viewport: &shader::Viewport,
    ) {
        let physical_bounds = *bounds * viewport.scale_factor() as f32;
        if !storage.has::<Renderer>() {
            storage.store(Renderer::new(
                device,
                format,
                physical_bounds,
                viewport.physical_size(),
            ));
        }
        let Some(renderer) = storage.get_mut::<Renderer>() else {
            return;
        };
        renderer.resize(device, physical_bounds, viewport.physical_size());
        renderer.update_instances(queue, &self.instances);
        renderer.update_camera(queue, &self.camera, &self.projection);
    }

    fn render(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        storage: &shader::Storage,
        target: &wgpu::TextureView,
        _clip_bounds: &Rectangle<u32>,
    ) {
        if let Some(renderer) = storage.get::<Renderer>() {
            renderer.render(encoder, target);
        }
    }
}

/// Internal state managed by the shader widget
#[derive(Default)]
pub(crate) struct ViewportState {
    camera: Camera,
    projection: Projection,
    pressed: bool,
    last_position: Option<Point>,
    /// Pointer travel since the button went down.
    travel: f32,
}

/// The shader program drawing the session's cube.
pub(crate) struct CubeViewport<'a> {
    session: &'a CubeSession,
}

impl<'a> CubeViewport<'a> {
    pub(crate) fn new(session: &'a CubeSession) -> Self {
        Self { session }
    }
}

impl shader::Program<Message> for CubeViewport<'_> {
    type State = ViewportState;
    type Primitive = CubePrimitive;

    fn update(
        &self,
        state: &mut Self::State,
        event: shader::Event,
        bounds: Rectangle,
        cursor: mouse::Cursor,
        _shell: &mut iced::advanced::Shell<'_, Message>,
    ) -> (event::Status, Option<Message>) {
        if bounds.width > 0.0 && bounds.height > 0.0 {
            state.projection.aspect = bounds.width / bounds.height;
        }

        match event {
            shader::Event::Mouse(mouse_event) => {
                self.handle_mouse_event(state, mouse_event, bounds, cursor)
            }
            _ => (event::Status::Ignored, None),
        }
    }

    fn draw(
        &self,
        state: &Self::State,
        _cursor: mouse::Cursor,
        _bounds: Rectangle,
    ) -> Self::Primitive {
        CubePrimitive {
            instances: generate_instances(self.session.scene()),
            camera: state.camera.clone(),
            projection: state.projection,
        }
    }

    fn mouse_interaction(
        &self,
        state: &Self::State,
        bounds: Rectangle,
        cursor: mouse::Cursor,
    ) -> mouse::Interaction {
        if state.pressed {
            mouse::Interaction::Grabbing
        } else if cursor.is_over(bounds) {
            mouse::Interaction::Grab
        } else {
            mouse::Interaction::default()
        }
    }
}

impl CubeViewport<'_> {
    /// Press starts a drag, movement rotates the cube, release ends the
    /// drag and reports whether it was a click on the floor button.
    fn handle_mouse_event(
        &self,
        state: &mut ViewportState,
        mouse_event: mouse::Event,
        bounds: Rectangle,
        cursor: mouse::Cursor,
    ) -> (event::Status, Option<Message>) {
        match mouse_event {
            mouse::Event::ButtonPressed(mouse::Button::Left) => {
                if let Some(position) = cursor.position() {
                    if cursor.is_over(bounds) {
                        state.pressed = true;
                        state.last_position = Some(position);
                        state.travel = 0.0;
                        return (event::Status::Captured, Some(Message::DragStarted));
                    }
                }
            }
            mouse::Event::CursorMoved { position } => {
                if !state.pressed {
                    return (event::Status::Ignored, None);
                }
                let Some(last) = state.last_position.replace(position) else {
                    return (event::Status::Captured, None);
                };
                let (dx, dy) = (position.x - last.x, position.y - last.y);
                state.travel += dx.hypot(dy);
                return (event::Status::Captured, Some(Message::Dragged { dx, dy }));
            }
            mouse::Event::ButtonReleased(mouse::Button::Left) => {
                if state.pressed {
                    state.pressed = false;
                    state.last_position = None;
                    let floor_button = state.travel < CLICK_SLOP
                        && self.floor_button_under(state, bounds, cursor);
                    return (
                        event::Status::Captured,
                        Some(Message::DragEnded { floor_button }),
                    );
                }
            }
            _ => {}
        }

        (event::Status::Ignored, None)
    }

    fn floor_button_under(
        &self,
        state: &ViewportState,
        bounds: Rectangle,
        cursor: mouse::Cursor,
    ) -> bool {
        let Some(position) = cursor.position_in(bounds) else {
            return false;
        };
        let Some(scene) = self.session.scene() else {
            return false;
        };
        calculate_mouse_ray(position, bounds, &state.camera, &state.projection)
            .and_then(|ray| pick_object(&ray, &scene_pickables(scene), &[PickKind::FloorButton]))
            .is_some()
    }
}
