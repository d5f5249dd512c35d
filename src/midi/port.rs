use std::{fmt, sync::Arc};

use super::{Backend, Device, DeviceError, InputEndpoint, OutputEndpoint};

/// Position of a device in a relay pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PortNb {
    One,
    Two,
}

impl fmt::Display for PortNb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl PortNb {
    pub const ALL: [PortNb; 2] = [PortNb::One, PortNb::Two];

    pub fn idx(self) -> usize {
        match self {
            PortNb::One => 0,
            PortNb::Two => 1,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            PortNb::One => "first",
            PortNb::Two => "second",
        }
    }
}

/// Display names for `names`, in the same order.
///
/// A name equal to the one right before it gets a ` (n)` suffix, `n`
/// starting at 2 along a run of identical names. Only consecutive
/// duplicates are told apart: `["A", "B", "A"]` is left untouched.
pub fn display_names<'a>(names: impl IntoIterator<Item = &'a str>) -> Vec<Arc<str>> {
    let mut display_names = Vec::new();
    let mut prev: Option<&str> = None;
    let mut nb = 2;

    for name in names {
        let display_name = if prev == Some(name) {
            let display_name = format!("{} ({})", name, nb);
            nb += 1;
            display_name
        } else {
            nb = 2;
            name.to_string()
        };

        display_names.push(display_name.into());
        prev = Some(name);
    }

    display_names
}

/// Display name of the device at `index` in `names`, `None` if out of bounds.
///
/// Same as [`display_names`] for a single device: lists are named at once
/// when enumerating.
#[cfg(test)]
pub fn name_for<N: AsRef<str>>(index: usize, names: &[N]) -> Option<Arc<str>> {
    if index >= names.len() {
        return None;
    }

    display_names(names.iter().take(index + 1).map(AsRef::as_ref)).pop()
}

/// Devices usable in one direction, in enumeration order.
#[derive(Default)]
pub struct DirectionalDevices {
    list: Vec<Arc<dyn Device>>,
    names: Vec<Arc<str>>,
}

impl DirectionalDevices {
    fn new(list: Vec<Arc<dyn Device>>) -> Self {
        let names = display_names(list.iter().map(|device| device.name().as_ref()));
        Self { list, names }
    }

    /// Display names, disambiguated as per [`display_names`].
    pub fn names(&self) -> &[Arc<str>] {
        &self.names
    }

    pub fn get(&self, idx: usize) -> Option<&Arc<dyn Device>> {
        self.list.get(idx)
    }

    pub fn position(&self, display_name: &str) -> Option<usize> {
        self.names
            .iter()
            .position(|name| name.as_ref() == display_name)
    }
}

/// The devices found on the system, split by capability.
#[derive(Default)]
pub struct Directory {
    pub ins: DirectionalDevices,
    pub outs: DirectionalDevices,
}

impl Directory {
    /// Lists the devices from `backend`.
    ///
    /// A device which can both receive and transmit appears in both lists.
    /// Devices which can't be inspected are skipped.
    pub fn enumerate(backend: &dyn Backend) -> Result<Self, DeviceError> {
        let mut ins = Vec::new();
        let mut outs = Vec::new();

        for device in backend.devices()? {
            let caps = match device.capabilities() {
                Ok(caps) => caps,
                Err(err) => {
                    log::warn!("Skipping device {}: {}", device.name(), err);
                    continue;
                }
            };

            if caps.can_receive() {
                outs.push(device.clone());
            }
            if caps.can_transmit() {
                ins.push(device);
            }
        }

        log::debug!("Found {} input(s), {} output(s)", ins.len(), outs.len());

        Ok(Self {
            ins: DirectionalDevices::new(ins),
            outs: DirectionalDevices::new(outs),
        })
    }

    pub fn input(&self, idx: usize) -> Option<Result<Box<dyn InputEndpoint>, DeviceError>> {
        self.ins.get(idx).map(|device| device.input())
    }

    pub fn output(&self, idx: usize) -> Option<Result<Box<dyn OutputEndpoint>, DeviceError>> {
        self.outs.get(idx).map(|device| device.output())
    }
}
