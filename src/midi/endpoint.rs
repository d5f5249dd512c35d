use std::sync::Arc;

use super::Msg;

#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    #[error("Midi initialization failed")]
    Init(#[from] midir::InitError),

    #[error("Device {0} is unavailable")]
    Unavailable(Arc<str>),

    #[error("Error connecting to {0}")]
    Connection(Arc<str>),

    #[error("Device {0} is not open")]
    NotOpen(Arc<str>),

    #[error("Device {0} can't be used as an input")]
    NotAnInput(Arc<str>),

    #[error("Device {0} can't be used as an output")]
    NotAnOutput(Arc<str>),
}

#[derive(Clone, Debug, thiserror::Error)]
pub enum ForwardError {
    #[error("Can't forward to {0}: device is closed")]
    Closed(Arc<str>),

    #[error("Failed to forward to {name}: {source}")]
    Send {
        name: Arc<str>,
        #[source]
        source: midir::SendError,
    },
}

/// Something which accepts MIDI messages.
///
/// Inputs deliver to a sink from their own thread, hence the `Send` bound.
pub trait MessageSink: Send {
    fn on_message(&mut self, msg: Msg<'_>) -> Result<(), ForwardError>;
}

pub trait Endpoint: Send {
    fn name(&self) -> &Arc<str>;

    fn is_open(&self) -> bool;

    fn open(&mut self) -> Result<(), DeviceError>;

    /// Closes the endpoint. Closing a closed endpoint does nothing.
    fn close(&mut self);
}

/// An endpoint transmitting the messages it receives from its device.
pub trait InputEndpoint: Endpoint {
    /// Registers `sink` as the exclusive receiver of the messages from this input.
    ///
    /// The endpoint must be open.
    fn set_sink(&mut self, sink: Box<dyn MessageSink>) -> Result<(), DeviceError>;
}

/// An endpoint accepting messages for its device.
pub trait OutputEndpoint: Endpoint {
    /// Returns a handle sending messages to this output.
    ///
    /// The endpoint must be open. The handle fails with
    /// [`ForwardError::Closed`] once the endpoint is closed.
    fn receiver(&mut self) -> Result<Box<dyn MessageSink>, DeviceError>;
}

/// Number of transmitters and receivers a device supports, `-1` meaning unlimited.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Capabilities {
    pub max_receivers: i32,
    pub max_transmitters: i32,
}

impl Capabilities {
    pub const INPUT: Capabilities = Capabilities {
        max_receivers: 0,
        max_transmitters: -1,
    };

    pub const OUTPUT: Capabilities = Capabilities {
        max_receivers: -1,
        max_transmitters: 0,
    };

    #[cfg(test)]
    pub const INPUT_OUTPUT: Capabilities = Capabilities {
        max_receivers: -1,
        max_transmitters: -1,
    };

    /// The device can accept messages, i.e. act as an output.
    pub fn can_receive(self) -> bool {
        self.max_receivers != 0
    }

    /// The device can emit messages, i.e. act as an input.
    pub fn can_transmit(self) -> bool {
        self.max_transmitters != 0
    }
}

pub trait Device: Send + Sync {
    fn name(&self) -> &Arc<str>;

    /// Inspects the device. Fails if the device can't be reached.
    fn capabilities(&self) -> Result<Capabilities, DeviceError>;

    /// Returns a new, closed, input endpoint for this device.
    fn input(&self) -> Result<Box<dyn InputEndpoint>, DeviceError>;

    /// Returns a new, closed, output endpoint for this device.
    fn output(&self) -> Result<Box<dyn OutputEndpoint>, DeviceError>;
}

/// A source of MIDI devices.
pub trait Backend {
    fn devices(&self) -> Result<Vec<Arc<dyn Device>>, DeviceError>;
}
