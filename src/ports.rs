// src/ports.rs - Named channels on the robot controller
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum PortError {
    #[error("PWM channel {0} out of range 1..=10")]
    Pwm(u8),
    #[error("digital I/O channel {0} out of range 1..=14")]
    Dio(u8),
    #[error("USB port {0} out of range 1..=4")]
    Usb(u8),
    #[error("analog channel {0} out of range 1..=8")]
    Analog(u8),
}

/// Speed controller output on the digital sidecar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct PwmChannel(u8);

/// General purpose digital input (limit switches, encoder phases).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct DioChannel(u8);

/// Analog input on the analog breakout (ultrasound rangefinder).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct AnalogChannel(u8);

/// Driver station USB slot a joystick or gamepad is plugged into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct UsbPort(u8);

impl PwmChannel {
    pub const fn new(channel: u8) -> Result<Self, PortError> {
        if channel >= 1 && channel <= 10 {
            Ok(Self(channel))
        } else {
            Err(PortError::Pwm(channel))
        }
    }

    pub const fn number(self) -> u8 {
        self.0
    }
}

impl DioChannel {
    pub const fn new(channel: u8) -> Result<Self, PortError> {
        if channel >= 1 && channel <= 14 {
            Ok(Self(channel))
        } else {
            Err(PortError::Dio(channel))
        }
    }

    pub const fn number(self) -> u8 {
        self.0
    }
}

impl AnalogChannel {
    pub const fn new(channel: u8) -> Result<Self, PortError> {
        if channel >= 1 && channel <= 8 {
            Ok(Self(channel))
        } else {
            Err(PortError::Analog(channel))
        }
    }

    pub const fn number(self) -> u8 {
        self.0
    }
}

impl UsbPort {
    pub const COUNT: usize = 4;

    pub const fn new(port: u8) -> Result<Self, PortError> {
        if port >= 1 && port <= 4 {
            Ok(Self(port))
        } else {
            Err(PortError::Usb(port))
        }
    }

    pub const fn number(self) -> u8 {
        self.0
    }

    /// Zero-based slot used to index input snapshots.
    pub const fn index(self) -> usize {
        (self.0 - 1) as usize
    }
}

impl TryFrom<u8> for PwmChannel {
    type Error = PortError;
    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<u8> for DioChannel {
    type Error = PortError;
    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<u8> for AnalogChannel {
    type Error = PortError;
    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<u8> for UsbPort {
    type Error = PortError;
    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PwmChannel> for u8 {
    fn from(value: PwmChannel) -> Self {
        value.0
    }
}

impl From<DioChannel> for u8 {
    fn from(value: DioChannel) -> Self {
        value.0
    }
}

impl From<AnalogChannel> for u8 {
    fn from(value: AnalogChannel) -> Self {
        value.0
    }
}

impl From<UsbPort> for u8 {
    fn from(value: UsbPort) -> Self {
        value.0
    }
}

impl fmt::Display for PwmChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PWM{}", self.0)
    }
}

impl fmt::Display for DioChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DIO{}", self.0)
    }
}

impl fmt::Display for AnalogChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AIN{}", self.0)
    }
}

impl fmt::Display for UsbPort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "USB{}", self.0)
    }
}

pub const PWM1: PwmChannel = PwmChannel(1);
pub const PWM2: PwmChannel = PwmChannel(2);
pub const PWM3: PwmChannel = PwmChannel(3);
pub const PWM4: PwmChannel = PwmChannel(4);
pub const PWM5: PwmChannel = PwmChannel(5);
pub const PWM6: PwmChannel = PwmChannel(6);
pub const PWM7: PwmChannel = PwmChannel(7);
pub const PWM8: PwmChannel = PwmChannel(8);
pub const PWM9: PwmChannel = PwmChannel(9);
pub const PWM10: PwmChannel = PwmChannel(10);

pub const DIO1: DioChannel = DioChannel(1);
pub const DIO2: DioChannel = DioChannel(2);
pub const DIO3: DioChannel = DioChannel(3);
pub const DIO4: DioChannel = DioChannel(4);
pub const DIO6: DioChannel = DioChannel(6);
pub const DIO7: DioChannel = DioChannel(7);
pub const DIO8: DioChannel = DioChannel(8);
pub const DIO9: DioChannel = DioChannel(9);
pub const DIO10: DioChannel = DioChannel(10);

pub const ANALOG1: AnalogChannel = AnalogChannel(1);

pub const USB1: UsbPort = UsbPort(1);
pub const USB2: UsbPort = UsbPort(2);
pub const USB3: UsbPort = UsbPort(3);
pub const USB4: UsbPort = UsbPort(4);
