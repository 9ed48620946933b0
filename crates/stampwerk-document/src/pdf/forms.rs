// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// AcroForm fields — discover the fields of an interactive form and fill them.
//
// Field names are fully qualified (`parent.child`) and matched exactly. After
// a value changes, stale appearance streams are dropped and the form is marked
// `/NeedAppearances` so viewers regenerate what they display.

use lopdf::{Document, Object, ObjectId};
use serde::Serialize;
use stampwerk_core::error::{Result, StampwerkError};
use stampwerk_core::types::FormValue;
use tracing::{debug, instrument};

use crate::pdf::document::{PdfDocument, resolve_dict};
use crate::pdf::text::{encode_text_string, object_text};

const FF_READ_ONLY: i64 = 1;
const FF_RADIO: i64 = 1 << 15;
const FF_PUSHBUTTON: i64 = 1 << 16;
const FF_EDIT: i64 = 1 << 18;

const MAX_FIELD_DEPTH: usize = 32;

/// What kind of value a field holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FieldKind {
    Text,
    Checkbox,
    RadioGroup,
    /// List box or combo box.
    Choice,
    PushButton,
    Signature,
    Unknown,
}

impl FieldKind {
    fn classify(field_type: Option<&[u8]>, flags: i64) -> Self {
        match field_type {
            Some(b"Tx") => Self::Text,
            Some(b"Btn") if flags & FF_PUSHBUTTON != 0 => Self::PushButton,
            Some(b"Btn") if flags & FF_RADIO != 0 => Self::RadioGroup,
            Some(b"Btn") => Self::Checkbox,
            Some(b"Ch") => Self::Choice,
            Some(b"Sig") => Self::Signature,
            _ => Self::Unknown,
        }
    }
}

/// A terminal form field.
#[derive(Debug, Clone, Serialize)]
pub struct FormField {
    /// Fully qualified name.
    pub name: String,
    pub kind: FieldKind,
    /// Current value, if set.
    pub value: Option<String>,
    /// Allowed values: the on-states of a checkbox or radio group, or the
    /// export values of a choice field.
    pub options: Vec<String>,
    pub read_only: bool,
    #[serde(skip)]
    object_id: ObjectId,
    #[serde(skip)]
    widget_ids: Vec<ObjectId>,
    #[serde(skip)]
    editable: bool,
}

/// Attributes a field inherits from its ancestors.
#[derive(Debug, Clone, Default)]
struct Inherited {
    field_type: Option<Vec<u8>>,
    flags: i64,
}

impl PdfDocument {
    /// All terminal fields of the document's AcroForm, in document order.
    ///
    /// A document without a form has no fields.
    pub fn form_fields(&self) -> Vec<FormField> {
        let document = self.inner();
        let Some(acroform) = document
            .catalog()
            .ok()
            .and_then(|catalog| catalog.get(b"AcroForm").ok())
            .and_then(|acroform| resolve_dict(document, acroform))
        else {
            return Vec::new();
        };

        let roots = match acroform.get(b"Fields") {
            Ok(Object::Array(items)) => items.clone(),
            Ok(Object::Reference(id)) => match document.get_object(*id) {
                Ok(Object::Array(items)) => items.clone(),
                _ => Vec::new(),
            },
            _ => Vec::new(),
        };

        let mut fields = Vec::new();
        for root in roots {
            if let Object::Reference(id) = root {
                collect_field(document, id, None, &Inherited::default(), 0, &mut fields);
            }
        }
        fields
    }

    /// Set the value of the field named exactly `name`.
    ///
    /// Fails with `FieldNotFound` when no field has that name and with
    /// `TypeMismatch` when the value does not suit the field.
    #[instrument(skip(self, value), fields(field = name))]
    pub fn set_field_value(&mut self, name: &str, value: &FormValue) -> Result<()> {
        let field = self
            .form_fields()
            .into_iter()
            .find(|field| field.name == name)
            .ok_or_else(|| StampwerkError::FieldNotFound(name.to_string()))?;

        let mismatch = |reason: String| StampwerkError::TypeMismatch {
            field: name.to_string(),
            reason,
        };

        if field.read_only {
            return Err(mismatch("field is read-only".into()));
        }

        match field.kind {
            FieldKind::Text => {
                let text = value_text(value)
                    .ok_or_else(|| mismatch("a text field needs a string value".into()))?;
                self.write_value(&field, encode_text_string(text), None)?;
            }
            FieldKind::Checkbox => {
                let on = checkbox_state(value, &field.options).ok_or_else(|| {
                    mismatch(format!("'{value}' is not a checkbox state"))
                })?;
                let state = if on {
                    field.options.first().map_or("Yes", String::as_str)
                } else {
                    "Off"
                };
                self.write_value(&field, Object::Name(state.as_bytes().to_vec()), Some(state))?;
            }
            FieldKind::RadioGroup => {
                let choice = value_text(value)
                    .ok_or_else(|| mismatch("a radio group needs an option name".into()))?;
                if choice != "Off" && !field.options.iter().any(|option| option == choice) {
                    return Err(mismatch(format!(
                        "'{choice}' is not one of [{}]",
                        field.options.join(", ")
                    )));
                }
                self.write_value(&field, Object::Name(choice.as_bytes().to_vec()), Some(choice))?;
            }
            FieldKind::Choice => {
                let choice = value_text(value)
                    .ok_or_else(|| mismatch("a choice field needs a string value".into()))?;
                if !field.editable
                    && !field.options.is_empty()
                    && !field.options.iter().any(|option| option == choice)
                {
                    return Err(mismatch(format!(
                        "'{choice}' is not one of [{}]",
                        field.options.join(", ")
                    )));
                }
                self.write_value(&field, encode_text_string(choice), None)?;
            }
            FieldKind::PushButton | FieldKind::Signature | FieldKind::Unknown => {
                return Err(mismatch(format!("{:?} fields cannot be filled", field.kind)));
            }
        }

        self.set_need_appearances();
        debug!(kind = ?field.kind, "Field filled");
        Ok(())
    }

    /// Store `value` as the field's `/V` and update its widgets.
    ///
    /// Button fields pass `state`: each widget shows it if it has an
    /// appearance for it, and `Off` otherwise. Other fields lose their cached
    /// appearances.
    fn write_value(&mut self, field: &FormField, value: Object, state: Option<&str>) -> Result<()> {
        let widget_states: Vec<(ObjectId, Option<Vec<u8>>)> = field
            .widget_ids
            .iter()
            .map(|widget| {
                let shown = state.map(|state| {
                    if widget_on_states(self.inner(), *widget).iter().any(|s| s == state) {
                        state.as_bytes().to_vec()
                    } else {
                        b"Off".to_vec()
                    }
                });
                (*widget, shown)
            })
            .collect();

        let document = self.inner_mut();
        match document.get_object_mut(field.object_id) {
            Ok(Object::Dictionary(dict)) => dict.set("V", value),
            _ => {
                return Err(StampwerkError::PdfError(format!(
                    "field object {:?} is not a dictionary",
                    field.object_id
                )));
            }
        }

        for (widget, shown) in widget_states {
            if let Ok(Object::Dictionary(dict)) = document.get_object_mut(widget) {
                match shown {
                    Some(shown) => dict.set("AS", Object::Name(shown)),
                    None => {
                        dict.remove(b"AP");
                    }
                }
            }
        }
        Ok(())
    }

    /// Ask viewers to rebuild field appearances.
    fn set_need_appearances(&mut self) {
        let document = self.inner_mut();
        let acroform_ref = document
            .catalog()
            .ok()
            .and_then(|catalog| catalog.get(b"AcroForm").ok())
            .and_then(|acroform| match acroform {
                Object::Reference(id) => Some(*id),
                _ => None,
            });

        if let Some(id) = acroform_ref {
            if let Ok(Object::Dictionary(acroform)) = document.get_object_mut(id) {
                acroform.set("NeedAppearances", true);
            }
            return;
        }

        let Ok(Object::Reference(root_id)) = document.trailer.get(b"Root").cloned() else {
            return;
        };
        if let Ok(Object::Dictionary(catalog)) = document.get_object_mut(root_id)
            && let Ok(Object::Dictionary(acroform)) = catalog.get_mut(b"AcroForm")
        {
            acroform.set("NeedAppearances", true);
        }
    }
}

/// Walk one node of the field tree, pushing every terminal field below it.
fn collect_field(
    document: &Document,
    id: ObjectId,
    parent_name: Option<&str>,
    inherited: &Inherited,
    depth: usize,
    out: &mut Vec<FormField>,
) {
    if depth > MAX_FIELD_DEPTH {
        return;
    }
    let Ok(dict) = document.get_dictionary(id) else {
        return;
    };

    let partial = dict.get(b"T").ok().and_then(object_text);
    let name = match (parent_name, partial) {
        (Some(parent), Some(partial)) => format!("{parent}.{partial}"),
        (None, Some(partial)) => partial,
        (Some(parent), None) => parent.to_string(),
        (None, None) => return,
    };

    let inherited = Inherited {
        field_type: match dict.get(b"FT") {
            Ok(Object::Name(field_type)) => Some(field_type.clone()),
            _ => inherited.field_type.clone(),
        },
        flags: match dict.get(b"Ff") {
            Ok(Object::Integer(flags)) => *flags,
            _ => inherited.flags,
        },
    };

    let kids: Vec<ObjectId> = match dict.get(b"Kids") {
        Ok(Object::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Object::Reference(kid) => Some(*kid),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    };

    // Kids with a partial name are fields in their own right; the rest are
    // this field's widgets.
    let (child_fields, widgets): (Vec<ObjectId>, Vec<ObjectId>) =
        kids.into_iter().partition(|kid| {
            document
                .get_dictionary(*kid)
                .is_ok_and(|kid_dict| kid_dict.has(b"T"))
        });

    if !child_fields.is_empty() {
        for kid in child_fields {
            collect_field(document, kid, Some(&name), &inherited, depth + 1, out);
        }
        return;
    }

    let widget_ids = if widgets.is_empty() { vec![id] } else { widgets };
    let kind = FieldKind::classify(inherited.field_type.as_deref(), inherited.flags);

    let options = match kind {
        FieldKind::Checkbox | FieldKind::RadioGroup => {
            let mut states = Vec::new();
            for widget in &widget_ids {
                for state in widget_on_states(document, *widget) {
                    if !states.contains(&state) {
                        states.push(state);
                    }
                }
            }
            states
        }
        FieldKind::Choice => choice_options(document, dict.get(b"Opt").ok()),
        _ => Vec::new(),
    };

    out.push(FormField {
        name,
        kind,
        value: dict.get(b"V").ok().and_then(object_text),
        options,
        read_only: inherited.flags & FF_READ_ONLY != 0,
        object_id: id,
        widget_ids,
        editable: inherited.flags & FF_EDIT != 0,
    });
}

/// Appearance states of a button widget other than `Off`.
fn widget_on_states(document: &Document, widget: ObjectId) -> Vec<String> {
    let Ok(dict) = document.get_dictionary(widget) else {
        return Vec::new();
    };
    let normal = dict
        .get(b"AP")
        .ok()
        .and_then(|ap| resolve_dict(document, ap))
        .and_then(|ap| ap.get(b"N").ok())
        .and_then(|normal| resolve_dict(document, normal));

    normal
        .map(|normal| {
            normal
                .iter()
                .map(|(key, _)| String::from_utf8_lossy(key).into_owned())
                .filter(|state| state != "Off")
                .collect()
        })
        .unwrap_or_default()
}

/// Export values of a choice field's `/Opt` array.
fn choice_options(document: &Document, opt: Option<&Object>) -> Vec<String> {
    let items = match opt {
        Some(Object::Array(items)) => items,
        Some(Object::Reference(id)) => match document.get_object(*id) {
            Ok(Object::Array(items)) => items,
            _ => return Vec::new(),
        },
        _ => return Vec::new(),
    };
    items
        .iter()
        .filter_map(|item| match item {
            // [export display] pairs
            Object::Array(pair) => pair.first().and_then(object_text),
            other => object_text(other),
        })
        .collect()
}

fn value_text(value: &FormValue) -> Option<&str> {
    match value {
        FormValue::Text(text) => Some(text),
        FormValue::Option { option } => Some(option),
        FormValue::Bool(_) => None,
    }
}

/// Interpret a value for a checkbox: `Some(true)` to check, `Some(false)` to clear.
fn checkbox_state(value: &FormValue, on_states: &[String]) -> Option<bool> {
    match value {
        FormValue::Bool(on) => Some(*on),
        FormValue::Text(text) | FormValue::Option { option: text } => {
            if on_states.iter().any(|state| state == text) {
                return Some(true);
            }
            match text.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" | "on" | "1" | "x" | "checked" => Some(true),
                "false" | "no" | "off" | "0" | "" | "unchecked" => Some(false),
                _ => None,
            }
        }
    }
}
