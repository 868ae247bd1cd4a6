//! Turns raw pointer, wheel, touch and keyboard input into viewer intents.
//!
//! The router only tracks gesture state. It never touches the transform
//! itself; callers apply the returned pan/zoom deltas.

/// Pointer travel (from press) beyond which a press counts as a drag.
pub const DRAG_THRESHOLD_PX: f64 = 3.0;
/// A touch that travels further than this is not a tap.
pub const TAP_MAX_MOVE_PX: f64 = 8.0;
/// A touch held at least this long is not a tap.
pub const TAP_MAX_MS: f64 = 300.0;
/// Single-finger pans move the map faster than the finger.
pub const TOUCH_PAN_MULTIPLIER: f64 = 1.3;
/// Damping on the pinch distance ratio.
pub const PINCH_SENSITIVITY: f64 = 0.33;

const WHEEL_LINE_PX: f64 = 16.0;
const WHEEL_PAGE_LINES: f64 = 24.0;
const WHEEL_CLAMP: f64 = 100.0;

pub type Point = (f64, f64);

/// Unit of a wheel event's `deltaY`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WheelDeltaMode {
    Pixel,
    Line,
    Page,
}

impl WheelDeltaMode {
    /// Map the DOM `deltaMode` code; unknown codes are treated as pixels.
    pub fn from_dom(code: u32) -> Self {
        match code {
            1 => WheelDeltaMode::Line,
            2 => WheelDeltaMode::Page,
            _ => WheelDeltaMode::Pixel,
        }
    }
}

/// Convert one wheel event to a scale delta. Wheel up (negative `deltaY`) zooms in.
pub fn wheel_zoom_delta(delta_y: f64, mode: WheelDeltaMode, zoom_speed: f64) -> f64 {
    let px = match mode {
        WheelDeltaMode::Pixel => delta_y,
        WheelDeltaMode::Line => delta_y * WHEEL_LINE_PX,
        WheelDeltaMode::Page => delta_y * WHEEL_LINE_PX * WHEEL_PAGE_LINES,
    };
    let clamped = px.clamp(-WHEEL_CLAMP, WHEEL_CLAMP);
    -(clamped / WHEEL_CLAMP) * zoom_speed
}

fn distance(a: Point, b: Point) -> f64 {
    (a.0 - b.0).hypot(a.1 - b.1)
}

fn midpoint(a: Point, b: Point) -> Point {
    ((a.0 + b.0) / 2.0, (a.1 + b.1) / 2.0)
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum PointerState {
    Idle,
    Dragging { start: Point, last: Point, moved: bool },
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum TouchMode {
    Idle,
    Pan { last: Point },
    Pinch { last_distance: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct TouchGesture {
    mode: TouchMode,
    start: Point,
    start_ms: f64,
    moved: bool,
    pinched: bool,
}

impl Default for TouchGesture {
    fn default() -> Self {
        Self {
            mode: TouchMode::Idle,
            start: (0.0, 0.0),
            start_ms: 0.0,
            moved: false,
            pinched: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
struct WheelBatch {
    accum: f64,
    anchor: Point,
    pending: bool,
}

/// What a touch move asks the viewer to do.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TouchMove {
    /// Pan by this screen delta (already multiplied).
    Pan { dx: f64, dy: f64 },
    /// Zoom by `delta` anchored at the finger midpoint.
    Zoom { delta: f64, center: Point },
    None,
}

/// Gesture state for one canvas.
#[derive(Debug, Clone, PartialEq)]
pub struct GestureRouter {
    pointer: PointerState,
    suppress_click: bool,
    touch: TouchGesture,
    wheel: WheelBatch,
}

impl Default for GestureRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl GestureRouter {
    pub fn new() -> Self {
        Self {
            pointer: PointerState::Idle,
            suppress_click: false,
            touch: TouchGesture::default(),
            wheel: WheelBatch::default(),
        }
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.pointer, PointerState::Dragging { .. })
    }

    pub fn is_click_suppressed(&self) -> bool {
        self.suppress_click
    }

    // --- mouse ---

    pub fn pointer_down(&mut self, x: f64, y: f64) {
        self.suppress_click = false;
        self.pointer = PointerState::Dragging {
            start: (x, y),
            last: (x, y),
            moved: false,
        };
    }

    /// Returns the pan delta since the previous move while a button is held.
    pub fn pointer_move(&mut self, x: f64, y: f64) -> Option<Point> {
        match &mut self.pointer {
            PointerState::Dragging { start, last, moved } => {
                let delta = (x - last.0, y - last.1);
                *last = (x, y);
                if distance(*start, (x, y)) > DRAG_THRESHOLD_PX {
                    *moved = true;
                }
                Some(delta)
            }
            PointerState::Idle => None,
        }
    }

    /// Ends a drag (button release or the pointer leaving the canvas).
    /// Returns whether the drag moved far enough to swallow the next click.
    pub fn pointer_up(&mut self) -> bool {
        let moved = matches!(self.pointer, PointerState::Dragging { moved: true, .. });
        self.pointer = PointerState::Idle;
        if moved {
            self.suppress_click = true;
        }
        moved
    }

    /// Filters a click. `None` means the click belongs to a drag or a tap
    /// already handled and must be ignored.
    pub fn click(&mut self, x: f64, y: f64) -> Option<Point> {
        if self.is_dragging() {
            return None;
        }
        if self.suppress_click {
            self.suppress_click = false;
            return None;
        }
        Some((x, y))
    }

    /// Called from the host's zero-delay timer after a drag or tap.
    pub fn expire_click_suppression(&mut self) {
        self.suppress_click = false;
    }

    // --- wheel ---

    /// Accumulate a wheel event. Returns `true` when this is the first event
    /// of a batch and the host must request a frame to flush it.
    pub fn wheel(&mut self, delta_y: f64, mode: WheelDeltaMode, x: f64, y: f64, zoom_speed: f64) -> bool {
        self.wheel.accum += wheel_zoom_delta(delta_y, mode, zoom_speed);
        self.wheel.anchor = (x, y);
        let first = !self.wheel.pending;
        self.wheel.pending = true;
        first
    }

    /// Drain the batch: the summed delta and the latest cursor position.
    pub fn take_wheel_zoom(&mut self) -> Option<(f64, Point)> {
        if !self.wheel.pending {
            return None;
        }
        let batch = std::mem::take(&mut self.wheel);
        (batch.accum.abs() > 0.0).then_some((batch.accum, batch.anchor))
    }

    // --- touch ---

    /// `touches` holds every finger currently on the surface.
    pub fn touch_start(&mut self, touches: &[Point], now_ms: f64) {
        self.suppress_click = false;
        match touches {
            [single] => {
                self.touch = TouchGesture {
                    mode: TouchMode::Pan { last: *single },
                    start: *single,
                    start_ms: now_ms,
                    moved: false,
                    pinched: false,
                };
            }
            [a, b, ..] => {
                self.touch.mode = TouchMode::Pinch {
                    last_distance: distance(*a, *b),
                };
                self.touch.pinched = true;
            }
            [] => {}
        }
    }

    pub fn touch_move(&mut self, touches: &[Point]) -> TouchMove {
        match (&mut self.touch.mode, touches) {
            (TouchMode::Pan { last }, [finger]) => {
                let dx = (finger.0 - last.0) * TOUCH_PAN_MULTIPLIER;
                let dy = (finger.1 - last.1) * TOUCH_PAN_MULTIPLIER;
                *last = *finger;
                if distance(self.touch.start, *finger) > TAP_MAX_MOVE_PX {
                    self.touch.moved = true;
                }
                TouchMove::Pan { dx, dy }
            }
            (TouchMode::Pinch { last_distance }, [a, b, ..]) => {
                let current = distance(*a, *b);
                let previous = *last_distance;
                *last_distance = current;
                if previous > 0.0 {
                    TouchMove::Zoom {
                        delta: (current / previous - 1.0) * PINCH_SENSITIVITY,
                        center: midpoint(*a, *b),
                    }
                } else {
                    TouchMove::None
                }
            }
            _ => TouchMove::None,
        }
    }

    /// `remaining` are the fingers still down; `lifted` is the finger that
    /// just left. Returns the tap position when the whole gesture was a tap.
    pub fn touch_end(&mut self, remaining: &[Point], lifted: Option<Point>, now_ms: f64) -> Option<Point> {
        match remaining {
            [] => {
                let gesture = std::mem::take(&mut self.touch);
                let was_tap = !gesture.pinched
                    && !gesture.moved
                    && now_ms - gesture.start_ms < TAP_MAX_MS;
                let tap = lifted.filter(|_| was_tap);
                if tap.is_some() {
                    self.suppress_click = true;
                }
                tap
            }
            [finger] => {
                self.touch.mode = TouchMode::Pan { last: *finger };
                None
            }
            _ => None,
        }
    }

    pub fn touch_cancel(&mut self) {
        self.touch = TouchGesture::default();
    }
}

/// A key press, decoupled from the DOM event type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key<'a> {
    Escape,
    ArrowUp,
    ArrowDown,
    Enter,
    Character(&'a str),
    Other,
}

impl<'a> Key<'a> {
    /// From a DOM `KeyboardEvent.key` value.
    pub fn from_dom(key: &'a str) -> Self {
        match key {
            "Escape" => Key::Escape,
            "ArrowUp" => Key::ArrowUp,
            "ArrowDown" => Key::ArrowDown,
            "Enter" => Key::Enter,
            other if other.chars().count() == 1 => Key::Character(other),
            _ => Key::Other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCommand {
    /// Hide the popup, clear the search and blur the input.
    Dismiss,
    CursorDown,
    CursorUp,
    CommitCursor,
    ZoomIn,
    ZoomOut,
    ResetView,
    FocusSearch,
    ToggleHelp,
}

impl KeyCommand {
    /// Whether the browser default must be suppressed.
    pub fn prevents_default(self) -> bool {
        !matches!(self, KeyCommand::Dismiss)
    }
}

/// Keyboard map. Map shortcuts only apply while the search box is not
/// focused; list navigation only while it is.
pub fn key_command(key: Key<'_>, search_focused: bool) -> Option<KeyCommand> {
    match (key, search_focused) {
        (Key::Escape, _) => Some(KeyCommand::Dismiss),
        (Key::ArrowDown, true) => Some(KeyCommand::CursorDown),
        (Key::ArrowUp, true) => Some(KeyCommand::CursorUp),
        (Key::Enter, true) => Some(KeyCommand::CommitCursor),
        (Key::Character("+" | "="), false) => Some(KeyCommand::ZoomIn),
        (Key::Character("-"), false) => Some(KeyCommand::ZoomOut),
        (Key::Character("0"), false) => Some(KeyCommand::ResetView),
        (Key::Character("/"), false) => Some(KeyCommand::FocusSearch),
        (Key::Character("?"), false) => Some(KeyCommand::ToggleHelp),
        _ => None,
    }
}
