// 📝 Form state for modal workflows
//
// A Form is a fixed list of fields built once per modal. `reset` brings
// every field back to its construction-time default, which is what the
// modal does on every open.

use crate::cnic;

#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    /// Free text
    Text,
    /// Digits only, capped at 13 (filtered on every keystroke)
    Cnic,
    /// Digits only, no cap
    Number,
    /// One of a list of `(id, label)` choices loaded from the server
    Choice(Vec<(i64, String)>),
    /// Filled by the workflow, not by typing
    ReadOnly,
}

#[derive(Debug, Clone)]
pub struct Field {
    pub key: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub value: String,
    pub selected: Option<usize>,
    default: String,
}

impl Field {
    pub fn new(key: &'static str, label: &'static str, kind: FieldKind) -> Self {
        Field {
            key,
            label,
            kind,
            value: String::new(),
            selected: None,
            default: String::new(),
        }
    }

    pub fn with_default(mut self, value: &str) -> Self {
        self.default = value.to_string();
        self.value = value.to_string();
        self
    }

    fn reset(&mut self) {
        self.value = self.default.clone();
        self.selected = None;
    }

    fn is_editable(&self) -> bool {
        !matches!(self.kind, FieldKind::ReadOnly)
    }

    /// Text shown in the field (the choice label for choice fields)
    pub fn display_value(&self) -> String {
        match &self.kind {
            FieldKind::Choice(choices) => self
                .selected
                .and_then(|i| choices.get(i))
                .map(|(_, label)| label.clone())
                .unwrap_or_default(),
            _ => self.value.clone(),
        }
    }

    /// Id of the selected choice
    pub fn selected_id(&self) -> Option<i64> {
        match &self.kind {
            FieldKind::Choice(choices) => self.selected.and_then(|i| choices.get(i)).map(|(id, _)| *id),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Form {
    fields: Vec<Field>,
    focus: usize,
}

impl Form {
    pub fn new(fields: Vec<Field>) -> Self {
        let mut form = Form { fields, focus: 0 };
        form.focus = form.first_editable();
        form
    }

    fn first_editable(&self) -> usize {
        self.fields.iter().position(Field::is_editable).unwrap_or(0)
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn focus(&self) -> usize {
        self.focus
    }

    /// Reset every field to its default and focus the first editable one
    pub fn reset(&mut self) {
        for field in &mut self.fields {
            field.reset();
        }
        self.focus = self.first_editable();
    }

    /// True when every field holds its default value
    pub fn is_pristine(&self) -> bool {
        self.fields
            .iter()
            .all(|f| f.value == f.default && f.selected.is_none())
    }

    fn field(&self, key: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.key == key)
    }

    fn field_mut(&mut self, key: &str) -> Option<&mut Field> {
        self.fields.iter_mut().find(|f| f.key == key)
    }

    /// Trimmed value of a field ("" for unknown keys)
    pub fn value(&self, key: &str) -> String {
        self.field(key)
            .map(|f| f.value.trim().to_string())
            .unwrap_or_default()
    }

    /// Trimmed value, or None when empty
    pub fn optional(&self, key: &str) -> Option<String> {
        Some(self.value(key)).filter(|v| !v.is_empty())
    }

    pub fn selected_id(&self, key: &str) -> Option<i64> {
        self.field(key).and_then(Field::selected_id)
    }

    /// Set a value programmatically (read-only fields included)
    pub fn set_value(&mut self, key: &str, value: &str) {
        if let Some(field) = self.field_mut(key) {
            field.value = match field.kind {
                FieldKind::Cnic => cnic::filter_input(value),
                _ => value.to_string(),
            };
        }
    }

    /// Replace the choices of a choice field; the selection is cleared
    pub fn set_choices(&mut self, key: &str, choices: Vec<(i64, String)>) {
        if let Some(field) = self.field_mut(key) {
            field.kind = FieldKind::Choice(choices);
            field.selected = None;
            field.value.clear();
        }
    }

    pub fn focus_next(&mut self) {
        let len = self.fields.len();
        for step in 1..=len {
            let i = (self.focus + step) % len;
            if self.fields[i].is_editable() {
                self.focus = i;
                return;
            }
        }
    }

    pub fn focus_previous(&mut self) {
        let len = self.fields.len();
        for step in 1..=len {
            let i = (self.focus + len - step) % len;
            if self.fields[i].is_editable() {
                self.focus = i;
                return;
            }
        }
    }

    /// Type a character into the focused field
    pub fn input_char(&mut self, c: char) {
        let Some(field) = self.fields.get_mut(self.focus) else {
            return;
        };
        match field.kind {
            FieldKind::Text => field.value.push(c),
            FieldKind::Cnic => {
                field.value.push(c);
                field.value = cnic::filter_input(&field.value);
            }
            FieldKind::Number => {
                if c.is_ascii_digit() {
                    field.value.push(c);
                }
            }
            FieldKind::Choice(_) | FieldKind::ReadOnly => {}
        }
    }

    pub fn backspace(&mut self) {
        if let Some(field) = self.fields.get_mut(self.focus) {
            if matches!(field.kind, FieldKind::Text | FieldKind::Cnic | FieldKind::Number) {
                field.value.pop();
            }
        }
    }

    /// Cycle the focused choice field forward (`step` = 1) or back (-1)
    pub fn cycle_choice(&mut self, step: isize) {
        let Some(field) = self.fields.get_mut(self.focus) else {
            return;
        };
        let FieldKind::Choice(choices) = &field.kind else {
            return;
        };
        if choices.is_empty() {
            return;
        }
        let len = choices.len() as isize;
        let next = match field.selected {
            Some(i) => (i as isize + step).rem_euclid(len),
            None if step >= 0 => 0,
            None => len - 1,
        } as usize;
        field.selected = Some(next);
        field.value = choices[next].1.clone();
    }
}
