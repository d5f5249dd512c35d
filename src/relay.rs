use crossbeam_channel as channel;
use std::sync::Arc;

use crate::{
    midi::{
        self, DeviceError, Endpoint, ForwardError, InputEndpoint, MessageSink, OutputEndpoint,
    },
    LogSink,
};

/// Prefix of the lines for messages going from input 1 to output 2.
pub const OUTBOUND_PREFIX: &str = ">>> ";
/// Prefix of the lines for messages going from input 2 to output 1.
pub const INBOUND_PREFIX: &str = "<<< ";

/// A message which couldn't be forwarded while the session was running.
#[derive(Debug, thiserror::Error)]
#[error("Relay {prefix}failed: {err}")]
pub struct Fault {
    pub prefix: Arc<str>,
    #[source]
    pub err: ForwardError,
}

/// Forwards the messages from one input to one output, dumping each message
/// to the log on the way.
pub struct Relay {
    source: Box<dyn InputEndpoint>,
    destination: Box<dyn OutputEndpoint>,
    prefix: Arc<str>,
}

impl Relay {
    /// Wires `source` to `destination`. Both must be open.
    ///
    /// On failure, both endpoints are closed.
    pub fn create(
        mut source: Box<dyn InputEndpoint>,
        prefix: &str,
        mut destination: Box<dyn OutputEndpoint>,
        log: LogSink,
        faults: channel::Sender<Fault>,
    ) -> Result<Self, DeviceError> {
        let prefix: Arc<str> = prefix.into();

        let res = destination.receiver().and_then(|receiver| {
            source.set_sink(Box::new(Tap {
                prefix: prefix.clone(),
                receiver,
                log,
                faults,
                faulted: false,
            }))
        });

        if let Err(err) = res {
            source.close();
            destination.close();
            return Err(err);
        }

        log::debug!(
            "Relaying {} {}{}",
            source.name(),
            prefix,
            destination.name()
        );

        Ok(Self {
            source,
            destination,
            prefix,
        })
    }

    /// Closes the source, then the destination.
    pub fn close(mut self) {
        self.source.close();
        self.destination.close();

        log::debug!("Relay {}closed", self.prefix);
    }
}

/// The sink an input delivers to: dumps, then forwards.
struct Tap {
    prefix: Arc<str>,
    receiver: Box<dyn MessageSink>,
    log: LogSink,
    faults: channel::Sender<Fault>,
    /// Only the first fault is reported: the destination is likely to
    /// reject the following messages too.
    faulted: bool,
}

impl MessageSink for Tap {
    fn on_message(&mut self, msg: midi::Msg<'_>) -> Result<(), ForwardError> {
        self.log.append(&midi::msg::render(&self.prefix, msg.bytes));

        self.receiver.on_message(msg).map_err(|err| {
            if !self.faulted {
                self.faulted = true;
                log::error!("Relay {}failed: {}", self.prefix, err);

                // The session keeps running: the fault is for the user to act upon.
                let _ = self.faults.send(Fault {
                    prefix: self.prefix.clone(),
                    err: err.clone(),
                });
            }

            err
        })
    }
}
