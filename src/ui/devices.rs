use eframe::egui;
use std::sync::Arc;

use crate::{
    midi::{port::DirectionalDevices, Directory, PortNb},
    session::{Selection, State},
};

const NONE: &str = "(none)";

#[derive(Debug)]
pub enum Response {
    Start(Selection),
    Stop,
    RefreshDevices,
}

/// The four device choices and the session buttons.
pub struct DevicesWidget {
    ins: Vec<Arc<str>>,
    outs: Vec<Arc<str>>,
    selection: Selection,
    state: State,
    /// Names to select on first update, restored from the settings.
    wanted: Option<super::Settings>,
}

impl DevicesWidget {
    pub fn new(settings: &super::Settings) -> Self {
        Self {
            ins: Vec::new(),
            outs: Vec::new(),
            selection: Selection::default(),
            state: State::Idle,
            wanted: Some(settings.clone()),
        }
    }

    #[must_use]
    pub fn show(&mut self, ui: &mut egui::Ui) -> Option<Response> {
        let mut response = None;
        let is_idle = self.state == State::Idle;

        egui::Grid::new("devices").num_columns(4).show(ui, |ui| {
            ui.label("Input 1 >>>");
            ui.label("Output 1 (gets <<<)");
            ui.label("Input 2 <<<");
            ui.label("Output 2 (gets >>>)");
            ui.end_row();

            ui.add_enabled_ui(is_idle, |ui| {
                combo(ui, "input 1", &self.ins, &mut self.selection.ins[0]);
            });
            ui.add_enabled_ui(is_idle, |ui| {
                combo(ui, "output 1", &self.outs, &mut self.selection.outs[0]);
            });
            ui.add_enabled_ui(is_idle, |ui| {
                combo(ui, "input 2", &self.ins, &mut self.selection.ins[1]);
            });
            ui.add_enabled_ui(is_idle, |ui| {
                combo(ui, "output 2", &self.outs, &mut self.selection.outs[1]);
            });
            ui.end_row();
        });

        ui.horizontal(|ui| {
            if ui
                .add_enabled(is_idle, egui::Button::new("Start"))
                .on_hover_text("start transmitting data")
                .clicked()
            {
                response = Some(Response::Start(self.selection));
            }

            if ui
                .add_enabled(!is_idle, egui::Button::new("Stop"))
                .on_hover_text("stop transmitting data")
                .clicked()
            {
                response = Some(Response::Stop);
            }

            if ui
                .add_enabled(is_idle, egui::Button::new("Refresh devices"))
                .clicked()
            {
                response = Some(Response::RefreshDevices);
            }

            ui.label(match self.state {
                State::Idle => "Idle",
                State::Running => "Relaying",
            });
        });

        response
    }

    /// Currently selected device names, to be saved in the settings.
    pub fn selected_names(&self) -> ([Option<String>; 2], [Option<String>; 2]) {
        let name = |list: &[Arc<str>], idx: Option<usize>| {
            idx.and_then(|idx| list.get(idx)).map(ToString::to_string)
        };

        (
            PortNb::ALL.map(|nb| name(&self.ins, self.selection.input(nb))),
            PortNb::ALL.map(|nb| name(&self.outs, self.selection.output(nb))),
        )
    }
}

/// The following functions must be called from the Controller thread,
/// not the UI update thread.
impl DevicesWidget {
    pub fn update(&mut self, directory: &Directory, state: State) {
        let wanted = self.wanted.take().unwrap_or_default();

        for nb in PortNb::ALL {
            let idx = nb.idx();
            self.selection.ins[idx] = reselect(
                self.selection.ins[idx],
                &self.ins,
                wanted.ins[idx].as_deref(),
                &directory.ins,
            );
            self.selection.outs[idx] = reselect(
                self.selection.outs[idx],
                &self.outs,
                wanted.outs[idx].as_deref(),
                &directory.outs,
            );
        }

        self.ins = directory.ins.names().to_vec();
        self.outs = directory.outs.names().to_vec();
        self.state = state;
    }
}

fn combo(ui: &mut egui::Ui, id: &str, names: &[Arc<str>], selected: &mut Option<usize>) {
    let text = selected
        .and_then(|idx| names.get(idx))
        .map_or(NONE, AsRef::as_ref);

    egui::ComboBox::from_id_source(id)
        .width(180f32)
        .selected_text(text)
        .show_ui(ui, |ui| {
            for (idx, name) in names.iter().enumerate() {
                ui.selectable_value(selected, Some(idx), name.as_ref());
            }
        });
}

/// Index of the previously selected device in the refreshed list.
///
/// The same index is kept if it still holds the same name, which keeps
/// the choice among identically named devices. Otherwise the first device
/// with that name is selected. Without a previous selection, `wanted` is
/// looked up by name.
fn reselect(
    selected: Option<usize>,
    prev: &[Arc<str>],
    wanted: Option<&str>,
    devices: &DirectionalDevices,
) -> Option<usize> {
    match selected.and_then(|idx| prev.get(idx).map(|name| (idx, name))) {
        Some((idx, name)) if devices.names().get(idx) == Some(name) => Some(idx),
        Some((_, name)) => devices.position(name),
        None => wanted.and_then(|name| devices.position(name)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::midi::{
        mock::{MockBackend, MockDevice},
        Capabilities,
    };

    fn directory(names: &[&str]) -> Directory {
        Directory::enumerate(&MockBackend::new(
            names
                .iter()
                .map(|name| MockDevice::new(name, Capabilities::INPUT_OUTPUT))
                .collect(),
        ))
        .unwrap()
    }

    fn names(names: &[&str]) -> Vec<Arc<str>> {
        names.iter().map(|&name| name.into()).collect()
    }

    #[test]
    fn keeps_index_among_homonyms() {
        let prev = names(&["Keyboard", "Synth", "Keyboard"]);
        let refreshed = directory(&["Keyboard", "Synth", "Keyboard"]);

        assert_eq!(reselect(Some(2), &prev, None, &refreshed.ins), Some(2));
    }

    #[test]
    fn follows_moved_device() {
        let prev = names(&["Keyboard", "Synth"]);
        let refreshed = directory(&["Pads", "Keyboard", "Synth"]);

        assert_eq!(reselect(Some(1), &prev, None, &refreshed.ins), Some(2));
    }

    #[test]
    fn drops_vanished_device() {
        let prev = names(&["Keyboard", "Synth"]);
        let refreshed = directory(&["Keyboard"]);

        assert_eq!(reselect(Some(1), &prev, Some("Keyboard"), &refreshed.ins), None);
    }

    #[test]
    fn restores_wanted_name() {
        let refreshed = directory(&["Keyboard", "Synth"]);

        assert_eq!(reselect(None, &[], Some("Synth"), &refreshed.ins), Some(1));
        assert_eq!(reselect(None, &[], Some("Pads"), &refreshed.ins), None);
    }

    #[test]
    fn update_restores_settings_then_reselects() {
        let settings = crate::ui::Settings {
            ins: [Some("Pads".to_string()), Some("Keyboard".to_string())],
            outs: [Some("Synth".to_string()), None],
            ..Default::default()
        };
        let mut widget = DevicesWidget::new(&settings);

        widget.update(&directory(&["Keyboard", "Pads", "Synth"]), State::Idle);
        assert_eq!(widget.selection.ins, [Some(1), Some(0)]);
        assert_eq!(widget.selection.outs, [Some(2), None]);

        // Settings only apply once.
        widget.selection.outs[1] = Some(0);
        widget.update(&directory(&["Synth", "Keyboard", "Pads"]), State::Idle);
        assert_eq!(widget.selection.ins, [Some(2), Some(1)]);
        assert_eq!(widget.selection.outs, [Some(0), Some(1)]);

        let (ins, outs) = widget.selected_names();
        assert_eq!(ins, [Some("Pads".to_string()), Some("Keyboard".to_string())]);
        assert_eq!(outs, [Some("Synth".to_string()), Some("Keyboard".to_string())]);
    }
}
