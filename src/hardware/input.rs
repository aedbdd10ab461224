// src/hardware/input.rs - Driver station input snapshots
use crate::ports::UsbPort;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Named analog axes. Flight joysticks use `X`..`Throttle`, Xbox pads use
/// the stick axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    X,
    Y,
    Z,
    Twist,
    Throttle,
    LeftX,
    LeftY,
    RightX,
    RightY,
    Bumper,
    DpadX,
    DpadY,
}

impl Axis {
    pub const COUNT: usize = 12;

    pub const ALL: [Axis; Axis::COUNT] = [
        Axis::X,
        Axis::Y,
        Axis::Z,
        Axis::Twist,
        Axis::Throttle,
        Axis::LeftX,
        Axis::LeftY,
        Axis::RightX,
        Axis::RightY,
        Axis::Bumper,
        Axis::DpadX,
        Axis::DpadY,
    ];

    const fn index(self) -> usize {
        self as usize
    }
}

impl FromStr for Axis {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "x" => Ok(Axis::X),
            "y" => Ok(Axis::Y),
            "z" => Ok(Axis::Z),
            "twist" => Ok(Axis::Twist),
            "throttle" => Ok(Axis::Throttle),
            "left_x" => Ok(Axis::LeftX),
            "left_y" => Ok(Axis::LeftY),
            "right_x" => Ok(Axis::RightX),
            "right_y" => Ok(Axis::RightY),
            "bumper" => Ok(Axis::Bumper),
            "dpad_x" => Ok(Axis::DpadX),
            "dpad_y" => Ok(Axis::DpadY),
            other => Err(format!("unknown axis '{}'", other)),
        }
    }
}

/// Raw button numbers on an Xbox controller.
pub mod xbox {
    pub const A: u8 = 1;
    pub const B: u8 = 2;
    pub const X: u8 = 3;
    pub const Y: u8 = 4;
    pub const LEFT_BUMPER: u8 = 5;
    pub const RIGHT_BUMPER: u8 = 6;
    pub const BACK: u8 = 7;
    pub const START: u8 = 8;
    pub const LEFT_CLICK: u8 = 9;
    pub const RIGHT_CLICK: u8 = 10;
}

/// Raw button numbers on a flight joystick.
pub mod joystick {
    pub const TRIGGER: u8 = 1;
    pub const STRAIGHTEN: u8 = 3;
    pub const ORIENTATION_NORMAL: u8 = 6;
    pub const ORIENTATION_REVERSED: u8 = 7;
    pub const ELEVATOR_UP: u8 = 10;
    pub const ELEVATOR_DOWN: u8 = 12;
    pub const SHOOTER_MANUAL: u8 = 2;
    pub const SHOOTER_PRESET_1: u8 = 11;
    pub const SHOOTER_PRESET_2: u8 = 9;
    pub const SHOOTER_PRESET_3: u8 = 7;
    pub const ARM_UP: u8 = 3;
    pub const ARM_DOWN: u8 = 4;
    /// Holding both applies the dashboard raw arm power.
    pub const ARM_RAW: (u8, u8) = (5, 6);
}

/// State of one input device for a single cycle.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct InputState {
    axes: [f64; Axis::COUNT],
    buttons: u32,
}

impl InputState {
    pub fn axis(&self, axis: Axis) -> f64 {
        self.axes[axis.index()]
    }

    pub fn set_axis(&mut self, axis: Axis, value: f64) {
        self.axes[axis.index()] = value.clamp(-1.0, 1.0);
    }

    /// Buttons are numbered from 1; anything outside 1..=32 reads as released.
    pub fn button(&self, button: u8) -> bool {
        match button {
            1..=32 => self.buttons & (1 << (button - 1)) != 0,
            _ => false,
        }
    }

    pub fn set_button(&mut self, button: u8, pressed: bool) {
        if !(1..=32).contains(&button) {
            return;
        }
        let mask = 1 << (button - 1);
        if pressed {
            self.buttons |= mask;
        } else {
            self.buttons &= !mask;
        }
    }

    pub fn with_axis(mut self, axis: Axis, value: f64) -> Self {
        self.set_axis(axis, value);
        self
    }

    pub fn with_button(mut self, button: u8) -> Self {
        self.set_button(button, true);
        self
    }
}

/// Every USB slot on the driver station.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Inputs {
    ports: [InputState; UsbPort::COUNT],
}

impl Inputs {
    pub fn port(&self, port: UsbPort) -> &InputState {
        &self.ports[port.index()]
    }

    pub fn port_mut(&mut self, port: UsbPort) -> &mut InputState {
        &mut self.ports[port.index()]
    }

    pub fn with_port(mut self, port: UsbPort, state: InputState) -> Self {
        self.ports[port.index()] = state;
        self
    }
}
