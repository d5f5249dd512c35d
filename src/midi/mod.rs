pub mod endpoint;
pub use endpoint::{
    Backend, Capabilities, Device, DeviceError, Endpoint, ForwardError, InputEndpoint,
    MessageSink, OutputEndpoint,
};

pub mod io;
pub use io::MidirBackend;

#[cfg(test)]
pub mod mock;

pub mod msg;
pub use msg::Msg;

pub mod port;
pub use port::{Directory, PortNb};
