//! In-memory devices standing in for the system MIDI API in tests.

use std::sync::{Arc, Mutex, MutexGuard};

use super::{
    Backend, Capabilities, Device, DeviceError, Endpoint, ForwardError, InputEndpoint,
    MessageSink, Msg, OutputEndpoint,
};

#[derive(Default)]
pub struct MockPort {
    pub is_open: bool,
    pub opens: usize,
    pub closes: usize,
    pub fail_open: bool,
    pub fail_sink: bool,
    pub reject: bool,
    pub sink: Option<Box<dyn MessageSink>>,
    pub received: Vec<(Option<u64>, Vec<u8>)>,
}

pub struct MockDevice {
    name: Arc<str>,
    caps: Option<Capabilities>,
    input: Arc<Mutex<MockPort>>,
    output: Arc<Mutex<MockPort>>,
}

impl MockDevice {
    pub fn new(name: &str, caps: Capabilities) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            caps: Some(caps),
            input: Default::default(),
            output: Default::default(),
        })
    }

    /// A device failing capability inspection.
    pub fn unreachable(name: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            caps: None,
            input: Default::default(),
            output: Default::default(),
        })
    }

    pub fn input_port(&self) -> MutexGuard<'_, MockPort> {
        self.input.lock().unwrap()
    }

    pub fn output_port(&self) -> MutexGuard<'_, MockPort> {
        self.output.lock().unwrap()
    }

    /// Delivers a message as the device would, from the calling thread.
    ///
    /// Panics if no sink is registered.
    pub fn transmit(&self, ts: Option<u64>, bytes: &[u8]) -> Result<(), ForwardError> {
        // Release the port while delivering: the sink may forward to this device.
        let mut sink = self.input_port().sink.take().expect("no sink registered");
        let res = sink.on_message(Msg::new(ts, bytes));

        let mut port = self.input_port();
        if port.is_open {
            port.sink = Some(sink);
        }

        res
    }

    pub fn received(&self) -> Vec<Vec<u8>> {
        self.output_port()
            .received
            .iter()
            .map(|(_, bytes)| bytes.clone())
            .collect()
    }
}

impl Device for MockDevice {
    fn name(&self) -> &Arc<str> {
        &self.name
    }

    fn capabilities(&self) -> Result<Capabilities, DeviceError> {
        self.caps
            .ok_or_else(|| DeviceError::Unavailable(self.name.clone()))
    }

    fn input(&self) -> Result<Box<dyn InputEndpoint>, DeviceError> {
        Ok(Box::new(MockEndpoint {
            name: self.name.clone(),
            port: self.input.clone(),
        }))
    }

    fn output(&self) -> Result<Box<dyn OutputEndpoint>, DeviceError> {
        Ok(Box::new(MockEndpoint {
            name: self.name.clone(),
            port: self.output.clone(),
        }))
    }
}

pub struct MockEndpoint {
    name: Arc<str>,
    port: Arc<Mutex<MockPort>>,
}

impl Endpoint for MockEndpoint {
    fn name(&self) -> &Arc<str> {
        &self.name
    }

    fn is_open(&self) -> bool {
        self.port.lock().unwrap().is_open
    }

    fn open(&mut self) -> Result<(), DeviceError> {
        let mut port = self.port.lock().unwrap();
        if port.fail_open {
            return Err(DeviceError::Unavailable(self.name.clone()));
        }

        port.is_open = true;
        port.opens += 1;

        Ok(())
    }

    fn close(&mut self) {
        let mut port = self.port.lock().unwrap();
        if port.is_open {
            port.is_open = false;
            port.closes += 1;
            port.sink = None;
        }
    }
}

impl InputEndpoint for MockEndpoint {
    fn set_sink(&mut self, sink: Box<dyn MessageSink>) -> Result<(), DeviceError> {
        let mut port = self.port.lock().unwrap();
        if !port.is_open {
            return Err(DeviceError::NotOpen(self.name.clone()));
        }
        if port.fail_sink {
            return Err(DeviceError::Connection(self.name.clone()));
        }

        port.sink = Some(sink);

        Ok(())
    }
}

impl OutputEndpoint for MockEndpoint {
    fn receiver(&mut self) -> Result<Box<dyn MessageSink>, DeviceError> {
        if !self.is_open() {
            return Err(DeviceError::NotOpen(self.name.clone()));
        }

        Ok(Box::new(MockReceiver {
            name: self.name.clone(),
            port: self.port.clone(),
        }))
    }
}

struct MockReceiver {
    name: Arc<str>,
    port: Arc<Mutex<MockPort>>,
}

impl MessageSink for MockReceiver {
    fn on_message(&mut self, msg: Msg<'_>) -> Result<(), ForwardError> {
        let mut port = self.port.lock().unwrap();
        if !port.is_open || port.reject {
            return Err(ForwardError::Closed(self.name.clone()));
        }

        port.received.push((msg.ts, msg.bytes.to_vec()));

        Ok(())
    }
}

pub struct MockBackend {
    devices: Vec<Arc<MockDevice>>,
}

impl MockBackend {
    pub fn new(devices: Vec<Arc<MockDevice>>) -> Self {
        Self { devices }
    }
}

impl Backend for MockBackend {
    fn devices(&self) -> Result<Vec<Arc<dyn Device>>, DeviceError> {
        Ok(self
            .devices
            .iter()
            .map(|device| device.clone() as Arc<dyn Device>)
            .collect())
    }
}
