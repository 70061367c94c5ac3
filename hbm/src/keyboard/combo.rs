use embassy_time::Instant;

use super::Keyboard;
use crate::combo::Combo;
use crate::event::KeyboardEvent;
use crate::userspace::Userspace;

impl<'a, U: Userspace, const ROW: usize, const COL: usize, const NUM_LAYER: usize> Keyboard<'a, U, ROW, COL, NUM_LAYER> {
    /// First stage of event processing: collect combo components, pass everything else on
    pub(super) fn process_combo(&mut self, event: KeyboardEvent, time: Instant) {
        if event.pressed {
            self.process_combo_press(event, time);
        } else {
            self.process_combo_release(event, time);
        }
    }

    fn process_combo_press(&mut self, event: KeyboardEvent, time: Instant) {
        let key_action = self.state.keymap.peek_action(event);
        let current_layer = self.state.keymap.get_activated_layer();
        let buffered = self.combo_actions_buffer.len() as u32;

        let is_combo_action = self
            .state
            .keymap
            .combos
            .iter()
            .any(|c| c.keys_pressed() == buffered && c.accepts(&key_action, current_layer));
        if !is_combo_action {
            self.dispatch_combos();
            self.process_inner(event, time, None);
            return;
        }

        for combo in self.state.keymap.combos.iter_mut().filter(|c| !c.is_triggered()) {
            if combo.keys_pressed() == buffered && combo.accepts(&key_action, current_layer) {
                combo.update(key_action, current_layer);
            } else {
                combo.reset();
            }
        }
        if self.combo_actions_buffer.push_back((key_action, event, time)).is_err() {
            error!("Combo actions buffer overflowed! This is a bug and should not happen!");
        }

        // Wait while a longer combo can still complete
        let pending = self.state.keymap.combos.iter().any(|c| c.started() && !c.done());
        match self.done_combo() {
            Some(i) if !pending => self.trigger_combo(i, time),
            _ => {
                let timeout = self.state.keymap.behavior.combo.timeout;
                self.combo_deadline = Some(time + timeout);
            }
        }
    }

    fn process_combo_release(&mut self, event: KeyboardEvent, time: Instant) {
        let triggered = self
            .state
            .keymap
            .combos
            .iter()
            .position(|c| c.held.contains(&event.pos));
        if let Some(i) = triggered {
            let combo = &mut self.state.keymap.combos[i];
            let first_release = combo.held.len() == combo.actions.len();
            let output = combo.output;
            let output_pos = combo.held[0];
            combo.held.retain(|p| *p != event.pos);

            // The output is released with the first component, later releases are swallowed
            if first_release {
                debug!("Combo released: {:?}", output);
                self.process_inner(KeyboardEvent { pressed: false, pos: output_pos }, time, Some(output));
            }
            return;
        }

        if self.combo_actions_buffer.iter().any(|(_, e, _)| e.pos == event.pos) {
            self.dispatch_combos();
        }
        self.process_inner(event, time, None);
    }

    /// Index of the first completed combo
    fn done_combo(&self) -> Option<usize> {
        self.state
            .keymap
            .combos
            .iter()
            .position(|c| !c.is_triggered() && c.done())
    }

    fn trigger_combo(&mut self, index: usize, time: Instant) {
        let combo = &mut self.state.keymap.combos[index];
        combo.held = self.combo_actions_buffer.iter().map(|(_, e, _)| e.pos).collect();
        combo.reset();
        let output = combo.output;
        let Some(&pos) = combo.held.first() else {
            return;
        };
        debug!("Combo triggered: {:?}", output);

        self.combo_actions_buffer.clear();
        self.combo_deadline = None;
        self.reset_combos();
        self.process_inner(KeyboardEvent { pressed: true, pos }, time, Some(output));
    }

    /// Settle the buffered components: trigger a completed combo, or process them as normal keys
    pub(super) fn dispatch_combos(&mut self) {
        self.combo_deadline = None;
        if let Some(i) = self.done_combo() {
            let time = self.state.now;
            self.trigger_combo(i, time);
            return;
        }

        while let Some((action, event, time)) = self.combo_actions_buffer.pop_front() {
            debug!("Dispatching combo action: {:?}", action);
            self.process_inner(event, time, None);
        }
        self.reset_combos();
    }

    fn reset_combos(&mut self) {
        self.state
            .keymap
            .combos
            .iter_mut()
            .filter(|combo| !combo.is_triggered())
            .for_each(Combo::reset);
    }
}
