//! # UI Refresh Scheduler
//!
//! Decides what to enqueue onto the UI element stack each refresh cycle.
//!
//! Two independent periodic triggers drive the scheduler as edge signals. A
//! slow edge re-enqueues the static display furniture (legends, labels,
//! reference lines) and restarts the layer cycle with the `Add` drawing
//! operation. Each fast edge recomputes exactly one layer group - never all
//! of them - which caps per-tick work and enqueue volume regardless of how
//! many elements exist in total. Once the cycle first advances past the
//! indicator group, the drawing operation flips to `Rewrite` so re-sent
//! elements replace rather than duplicate on-screen content; the flip happens
//! exactly once per slow-refresh period.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::element::{Color, GraphicElement, GraphicOp, StringElement};
use super::stack::UiStack;

/// Layer of the static furniture
const LAYER_STATIC: u8 = 0;

/// Layer of the capacitor gauge
const LAYER_CAP: u8 = 1;

/// Layer of the gimbal indicators
const LAYER_GIMBAL: u8 = 2;

/// Layer of the launcher indicators
const LAYER_LAUNCHER: u8 = 3;

/// Layer of the chassis indicators
const LAYER_CHASSIS: u8 = 4;

/// Layer of the control-method indicator
const LAYER_CONTROL: u8 = 5;

/// Base stroke width for lines and boxes
const DEFAULT_LINE_WIDTH: u16 = 3;

/// Label font size
const LABEL_FONT_SIZE: u16 = 20;

/// Horizontal start of the right-hand legend rail, as a width fraction
const RIGHT_RAIL_X: f32 = 0.85;

/// Legend line heights, as height fractions, top to bottom
const MODE_LINE_H: [f32; 4] = [0.70, 0.68, 0.66, 0.64];

/// Highlight box vertical extent around a legend line
const BOX_TOP_OFFSET: f32 = 4.0;
const BOX_BOTTOM_OFFSET: f32 = -14.0;

/// Highlight box horizontal spans for the three mode columns, relative to the
/// legend rail
const COLUMN_SPANS: [(f32, f32); 3] = [(54.0, 102.0), (114.0, 162.0), (174.0, 222.0)];

/// Operator display dimensions in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Screen {
    pub width: u16,
    pub height: u16,
}

impl Screen {
    pub fn new(width: u16, height: u16) -> Self {
        Self { width, height }
    }

    fn x(&self, fraction: f32) -> f32 {
        self.width as f32 * fraction
    }

    fn y(&self, fraction: f32) -> f32 {
        self.height as f32 * fraction
    }
}

/// Layer group recomputed on one fast tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerGroup {
    /// Capacitor gauge and mode-selection highlight boxes
    Indicators,

    /// Trigger and friction-wheel gauges
    Launcher,

    /// Chassis heading and chassis-mode box
    Chassis,
}

impl LayerGroup {
    /// The group that follows this one in the refresh cycle
    pub fn next(self) -> Self {
        match self {
            LayerGroup::Indicators => LayerGroup::Launcher,
            LayerGroup::Launcher => LayerGroup::Chassis,
            LayerGroup::Chassis => LayerGroup::Indicators,
        }
    }

    pub fn index(self) -> u8 {
        match self {
            LayerGroup::Indicators => 0,
            LayerGroup::Launcher => 1,
            LayerGroup::Chassis => 2,
        }
    }
}

/// Edge-triggered refresh signal
///
/// Raised from timer context without blocking; consumed in the owning task.
/// A raised edge stays pending until observed - there is no backlog, so
/// edges missed while the consumer is busy collapse into one.
#[derive(Debug, Clone, Default)]
pub struct RefreshSignal(Arc<AtomicBool>);

impl RefreshSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the edge as pending
    pub fn raise(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Consume a pending edge, if any
    pub fn take(&self) -> bool {
        self.0.swap(false, Ordering::AcqRel)
    }
}

/// Gimbal operating mode shown on the legend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GimbalMode {
    #[default]
    Relax,
    Absolute,
    Relative,
}

/// Chassis operating mode shown on the legend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChassisMode {
    #[default]
    FollowGimbal,
    FollowGimbal35,
    Rotor,
}

/// Launcher operating mode shown on the legend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LauncherMode {
    #[default]
    Relax,
    Safe,
    Loaded,
}

/// Fire mode shown on the legend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FireMode {
    #[default]
    Single,
    Burst,
    Continuous,
}

/// Active control method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ControlMethod {
    #[default]
    JoystickSwitch,
    MouseKeyboard,
}

/// Capacitor bank state fed by the power subsystem
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CapacitorStatus {
    pub online: bool,

    /// Remaining charge, 0.0..=1.0
    pub charge: f32,
}

/// Launcher indicator inputs
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LauncherIndicators {
    pub mode: LauncherMode,
    pub fire: FireMode,

    /// Trigger wheel position in radians
    pub trigger_angle: f32,

    /// Friction wheel speeds as a fraction of target, left and right
    pub friction: [f32; 2],
}

/// Chassis indicator inputs
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ChassisIndicators {
    pub mode: ChassisMode,

    /// Gimbal-relative heading in radians
    pub heading: f32,
}

/// Everything the display layer feeds into the refresh cycle
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DisplayInput {
    pub capacitor: CapacitorStatus,
    pub gimbal_mode: GimbalMode,
    pub launcher: LauncherIndicators,
    pub chassis: ChassisIndicators,
    pub control: ControlMethod,
}

/// Outcome of one fast refresh tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FastRefresh {
    /// The single layer group recomputed this tick
    pub group: LayerGroup,

    /// Elements rejected by a full queue
    pub rejected: usize,
}

/// The refresh state machine
///
/// Owns the layer-group cursor and the current drawing operation. All state
/// transitions go through [`LayerGroup::next`]; the side-effecting element
/// construction is independent of the transition itself.
#[derive(Debug)]
pub struct RefreshScheduler {
    group: LayerGroup,
    op: GraphicOp,
    screen: Screen,
}

impl RefreshScheduler {
    pub fn new(screen: Screen) -> Self {
        Self {
            group: LayerGroup::Indicators,
            op: GraphicOp::Add,
            screen,
        }
    }

    /// The group the next fast tick will recompute
    pub fn pending_group(&self) -> LayerGroup {
        self.group
    }

    /// Handle a slow-trigger edge: restart the layer cycle and re-enqueue the
    /// static display furniture
    ///
    /// # Returns
    ///
    /// * `usize` - Elements rejected by a full queue
    pub fn slow_refresh(&mut self, stack: &mut UiStack) -> usize {
        self.group = LayerGroup::Indicators;
        self.op = GraphicOp::Add;

        let rail_x = self.screen.x(RIGHT_RAIL_X) as u16;
        let mut rejected = 0;

        let legends = [
            ("8", 0, "CHAS  FLLW  FL35  ROTR"),
            ("9", 1, "GMBL  RELX  ABSL  RLTV"),
            ("a", 2, "SHOT  RELX  SAFE  LOAD"),
            ("b", 3, "FIRE  SNGL  BRST  CONT"),
        ];
        for (name, line, text) in legends {
            let y = self.screen.y(MODE_LINE_H[line]) as u16;
            self.push_label(stack, &mut rejected, name, rail_x, y, text);
        }

        let mark = GraphicElement::line(
            "c",
            self.op,
            LAYER_STATIC,
            Color::Green,
            DEFAULT_LINE_WIDTH * 3,
            self.screen.x(0.4) as u16,
            self.screen.y(0.2) as u16,
            self.screen.x(0.4) as u16,
            (self.screen.y(0.2) + 50.0) as u16,
        );
        if !stack.push_graphic(mark) {
            rejected += 1;
        }

        self.push_label(
            stack,
            &mut rejected,
            "d",
            rail_x,
            self.screen.y(0.4) as u16,
            "CTRL  JS  KM",
        );
        self.push_label(
            stack,
            &mut rejected,
            "e",
            (self.screen.x(0.6) - 26.0) as u16,
            (self.screen.y(0.2) + 10.0) as u16,
            "CAP",
        );

        rejected
    }

    /// Handle a fast-trigger edge: recompute exactly one layer group and
    /// advance the cycle
    pub fn fast_refresh(&mut self, stack: &mut UiStack, input: &DisplayInput) -> FastRefresh {
        let group = self.group;
        let rejected = match group {
            LayerGroup::Indicators => self.refresh_indicators(stack, input),
            LayerGroup::Launcher => self.refresh_launcher(stack, input),
            LayerGroup::Chassis => self.refresh_chassis(stack, input),
        };

        self.group = group.next();
        if self.op == GraphicOp::Add && self.group == LayerGroup::Launcher {
            self.op = GraphicOp::Rewrite;
        }

        FastRefresh { group, rejected }
    }

    fn refresh_indicators(&self, stack: &mut UiStack, input: &DisplayInput) -> usize {
        let mut rejected = 0;

        let gauge = if input.capacitor.online {
            let sweep = (input.capacitor.charge.clamp(0.0, 1.0) * 360.0) as u16;
            GraphicElement::arc(
                "3",
                self.op,
                LAYER_CAP,
                Color::Green,
                0,
                sweep,
                DEFAULT_LINE_WIDTH * 5,
                self.screen.x(0.6) as u16,
                self.screen.y(0.2) as u16,
                50,
                50,
            )
        } else {
            GraphicElement::arc(
                "3",
                self.op,
                LAYER_CAP,
                Color::Yellow,
                0,
                360,
                DEFAULT_LINE_WIDTH * 5,
                self.screen.x(0.6) as u16,
                self.screen.y(0.2) as u16,
                50,
                50,
            )
        };
        if !stack.push_graphic(gauge) {
            rejected += 1;
        }

        let gimbal_column = match input.gimbal_mode {
            GimbalMode::Relax => 0,
            GimbalMode::Absolute => 1,
            GimbalMode::Relative => 2,
        };
        let launcher_column = match input.launcher.mode {
            LauncherMode::Relax => 0,
            LauncherMode::Safe => 1,
            LauncherMode::Loaded => 2,
        };
        let fire_column = match input.launcher.fire {
            FireMode::Single => 0,
            FireMode::Burst => 1,
            FireMode::Continuous => 2,
        };
        let boxes = [
            ("4", LAYER_GIMBAL, 1, gimbal_column),
            ("5", LAYER_LAUNCHER, 2, launcher_column),
            ("6", LAYER_LAUNCHER, 3, fire_column),
        ];
        for (name, layer, line, column) in boxes {
            if !stack.push_graphic(self.mode_box(name, layer, line, column)) {
                rejected += 1;
            }
        }

        let (left, right) = match input.control {
            ControlMethod::MouseKeyboard => (96.0, 120.0),
            ControlMethod::JoystickSwitch => (56.0, 80.0),
        };
        let control_box = GraphicElement::rectangle(
            "7",
            self.op,
            LAYER_CONTROL,
            Color::Green,
            DEFAULT_LINE_WIDTH,
            (self.screen.x(RIGHT_RAIL_X) + left) as u16,
            (self.screen.y(0.4) + BOX_TOP_OFFSET) as u16,
            (self.screen.x(RIGHT_RAIL_X) + right) as u16,
            (self.screen.y(0.4) + BOX_BOTTOM_OFFSET) as u16,
        );
        if !stack.push_graphic(control_box) {
            rejected += 1;
        }

        rejected
    }

    fn refresh_launcher(&self, stack: &mut UiStack, input: &DisplayInput) -> usize {
        let mut rejected = 0;

        let turn = input.launcher.trigger_angle.rem_euclid(std::f32::consts::TAU);
        let start = (turn / std::f32::consts::TAU * 360.0) as u16;
        let end = (start + 60).min(360);
        let trigger = GraphicElement::arc(
            "f",
            self.op,
            LAYER_LAUNCHER,
            Color::Green,
            start.min(360),
            end,
            DEFAULT_LINE_WIDTH * 5,
            self.screen.x(0.4) as u16,
            self.screen.y(0.1) as u16,
            50,
            50,
        );
        if !stack.push_graphic(trigger) {
            rejected += 1;
        }

        let [left, right] = input.launcher.friction;
        let wheels = if left == 0.0 || right == 0.0 {
            GraphicElement::arc(
                "g",
                self.op,
                LAYER_LAUNCHER,
                Color::Yellow,
                0,
                360,
                DEFAULT_LINE_WIDTH * 5,
                self.screen.x(0.6) as u16,
                self.screen.y(0.1) as u16,
                50,
                50,
            )
        } else {
            GraphicElement::arc(
                "g",
                self.op,
                LAYER_LAUNCHER,
                Color::Green,
                (180.0 - 170.0 * left.clamp(0.0, 1.0)) as u16,
                (180.0 + 170.0 * right.clamp(0.0, 1.0)) as u16,
                DEFAULT_LINE_WIDTH * 5,
                self.screen.x(0.6) as u16,
                self.screen.y(0.1) as u16,
                50,
                50,
            )
        };
        if !stack.push_graphic(wheels) {
            rejected += 1;
        }

        rejected
    }

    fn refresh_chassis(&self, stack: &mut UiStack, input: &DisplayInput) -> usize {
        let mut rejected = 0;

        const NEEDLE_LEN: f32 = 44.0;
        let x0 = self.screen.x(0.4);
        let y0 = self.screen.y(0.2);
        let heading = GraphicElement::line(
            "1",
            self.op,
            LAYER_CHASSIS,
            Color::Green,
            DEFAULT_LINE_WIDTH * 12,
            x0 as u16,
            y0 as u16,
            (x0 + input.chassis.heading.sin() * NEEDLE_LEN) as u16,
            (y0 + input.chassis.heading.cos() * NEEDLE_LEN) as u16,
        );
        if !stack.push_graphic(heading) {
            rejected += 1;
        }

        let column = match input.chassis.mode {
            ChassisMode::FollowGimbal => 0,
            ChassisMode::FollowGimbal35 => 1,
            ChassisMode::Rotor => 2,
        };
        if !stack.push_graphic(self.mode_box("2", LAYER_CHASSIS, 0, column)) {
            rejected += 1;
        }

        rejected
    }

    /// Highlight box around one column of a legend line
    fn mode_box(&self, name: &str, layer: u8, line: usize, column: usize) -> GraphicElement {
        let (left, right) = COLUMN_SPANS[column];
        let rail_x = self.screen.x(RIGHT_RAIL_X);
        let line_y = self.screen.y(MODE_LINE_H[line]);
        GraphicElement::rectangle(
            name,
            self.op,
            layer,
            Color::Green,
            DEFAULT_LINE_WIDTH,
            (rail_x + left) as u16,
            (line_y + BOX_TOP_OFFSET) as u16,
            (rail_x + right) as u16,
            (line_y + BOX_BOTTOM_OFFSET) as u16,
        )
    }

    fn push_label(
        &self,
        stack: &mut UiStack,
        rejected: &mut usize,
        name: &str,
        x: u16,
        y: u16,
        text: &str,
    ) {
        let Ok(label) = StringElement::new(
            name,
            self.op,
            LAYER_STATIC,
            Color::Green,
            LABEL_FONT_SIZE,
            DEFAULT_LINE_WIDTH - 1,
            x,
            y,
            text,
        ) else {
            return;
        };
        if !stack.push_string(label) {
            *rejected += 1;
        }
    }
}
