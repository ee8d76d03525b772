//! # Field Options
//!
//! Typed form of a field annotation string such as
//! `"name=user_name,required,nullable"`.
//!
//! Items are separated by commas. A bare key switches a boolean option on;
//! `key=true` / `key=false` (case-insensitive) sets it explicitly. Annotation
//! text is written by the type's author, not by end users, so parsing fails
//! open: a malformed item or an unknown key is ignored with a warning and the
//! option keeps its default.

/// Parsed, normalized options of one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldOptions {
    /// Field is left out of the schema (`-`).
    pub omit: bool,
    /// External key; defaults to the lower-cased identifier.
    pub name: Option<String>,
    pub required: bool,
    /// Explicit null is accepted. Never true together with `required`.
    pub nullable: bool,
    /// HTML-escape decoded strings.
    pub escape: bool,
    /// Reject numeric zero unless a non-zero default exists.
    pub non_zero: bool,
    /// Drop coercion failures silently. Never true together with `required`.
    pub skip_on_error: bool,
    /// Decode nested values; when false a raw value of the right shape is
    /// assigned as is, and sequences are checked element by element.
    pub recursive: bool,
    /// Receive the whole parent input instead of a keyed sub-value.
    pub heritage: bool,
    /// Hoist a nested record's fields into the parent's key space. Ignored on
    /// optional records.
    pub flatten: bool,
    /// Stop a collection at its first failing element.
    pub strict: bool,
    /// Descriptive location (`in=query`), rendering only.
    pub location: Option<String>,
    /// Descriptive type label (`type=uuid`), rendering only.
    pub type_label: Option<String>,
}

impl Default for FieldOptions {
    fn default() -> Self {
        Self {
            omit: false,
            name: None,
            required: false,
            nullable: false,
            escape: false,
            non_zero: false,
            skip_on_error: false,
            recursive: true,
            heritage: false,
            flatten: false,
            strict: true,
            location: None,
            type_label: None,
        }
    }
}

impl FieldOptions {
    /// Parses the annotation string of `field`.
    pub fn parse(raw: &str, field: &str) -> Self {
        let mut options = Self::default();

        for item in raw.split(',').map(str::trim).filter(|item| !item.is_empty()) {
            if item == "-" {
                options.omit = true;
                continue;
            }

            let (key, value) = match item.split_once('=') {
                Some((key, value)) => (key.trim(), Some(value.trim())),
                None => (item, None),
            };
            if key.is_empty() {
                tracing::warn!(field, option = item, "ignoring field option without a key");
                continue;
            }

            let key = key.to_ascii_lowercase();
            match key.as_str() {
                "name" => set_text(&mut options.name, field, item, value),
                "in" => set_text(&mut options.location, field, item, value),
                "type" => set_text(&mut options.type_label, field, item, value),
                "required" => set_flag(&mut options.required, field, item, value),
                "nullable" => set_flag(&mut options.nullable, field, item, value),
                "escape" => set_flag(&mut options.escape, field, item, value),
                "non_zero" | "nonzero" => set_flag(&mut options.non_zero, field, item, value),
                "skip_on_error" | "skiponerr" => {
                    set_flag(&mut options.skip_on_error, field, item, value)
                }
                "recursive" => set_flag(&mut options.recursive, field, item, value),
                "heritage" => set_flag(&mut options.heritage, field, item, value),
                "flatten" => set_flag(&mut options.flatten, field, item, value),
                "strict" => set_flag(&mut options.strict, field, item, value),
                _ => tracing::warn!(field, option = item, "ignoring unknown field option"),
            }
        }

        options.normalized()
    }

    /// Applies the precedence rules: `required` switches off `nullable` and `skip_on_error`.
    pub fn normalized(mut self) -> Self {
        if self.required {
            self.nullable = false;
            self.skip_on_error = false;
        }
        self
    }
}

fn set_flag(slot: &mut bool, field: &str, item: &str, value: Option<&str>) {
    match value.map(str::to_ascii_lowercase).as_deref() {
        None | Some("true") => *slot = true,
        Some("false") => *slot = false,
        Some(_) => tracing::warn!(field, option = item, "ignoring non-boolean value for flag option"),
    }
}

fn set_text(slot: &mut Option<String>, field: &str, item: &str, value: Option<&str>) {
    match value {
        Some(text) if !text.is_empty() => *slot = Some(text.to_string()),
        _ => tracing::warn!(field, option = item, "ignoring option without a value"),
    }
}
