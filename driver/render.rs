//! Text rendering of descriptions
//!
//! Objects are printed as an indented tree. Fields holding references are expanded until the
//! requested depth is reached.

use std::fmt::Write;

use ansi_term::{Colour, Style};

use zis_introspect::{Description, FieldValue, Introspector, ObjectDescription, Target};

const INDENT: &str = "  ";

pub struct Styles {
    header: Style,
    value: Style,
    field_name: Style,
    error: Style,
}

impl Styles {
    pub fn coloured() -> Styles {
        Styles {
            header: Colour::Fixed(25).normal(), // DeepSkyBlue4 (#005faf)
            value: Colour::Green.bold(),
            field_name: Colour::Purple.normal(),
            error: Colour::Red.bold(),
        }
    }

    pub fn plain() -> Styles {
        Styles {
            header: Style::new(),
            value: Style::new(),
            field_name: Style::new(),
            error: Style::new(),
        }
    }
}

pub struct Renderer<'i, T: Target> {
    introspector: &'i Introspector<T>,
    styles: Styles,
}

impl<'i, T: Target> Renderer<'i, T> {
    pub fn new(introspector: &'i Introspector<T>, styles: Styles) -> Renderer<'i, T> {
        Renderer {
            introspector,
            styles,
        }
    }

    /// Renders a description with `depth` levels of fields
    pub fn render(&self, description: &Description<'_>, depth: usize) -> String {
        let mut out = String::new();
        self.write_description(&mut out, description, depth, 0);
        out
    }

    /// Renders only the fields of a description, one per line
    pub fn render_fields(&self, description: &Description<'_>, depth: usize) -> String {
        let mut out = String::new();

        match description {
            Description::Object(object) => self.write_fields(&mut out, object, depth, 0),
            other => {
                let _ = writeln!(out, "{} has no fields", other);
            }
        }

        out
    }

    pub fn render_error(&self, err: &zis_introspect::Error) -> String {
        self.styles.error.paint(format!("error: {}", err)).to_string()
    }

    fn paint_error(&self, err: &zis_introspect::Error) -> String {
        self.styles.error.paint(format!("<{}>", err)).to_string()
    }

    fn write_description(
        &self,
        out: &mut String,
        description: &Description<'_>,
        depth: usize,
        level: usize,
    ) {
        let object = match description {
            Description::Object(object) => object,
            other => {
                let _ = writeln!(out, "{}", self.styles.value.paint(other.to_string()));
                return;
            }
        };

        let _ = write!(out, "{}", self.styles.header.paint(object.to_string()));
        match object.value_repr() {
            Ok(Some(value)) => {
                let _ = write!(out, " {}", self.styles.value.paint(value));
            }
            Ok(None) => {}
            Err(err) => {
                let _ = write!(out, " {}", self.paint_error(&err));
            }
        }
        out.push('\n');

        if depth > 0 {
            self.write_fields(out, object, depth, level + 1);
        }
    }

    fn write_fields(
        &self,
        out: &mut String,
        object: &ObjectDescription<'_>,
        depth: usize,
        level: usize,
    ) {
        let indent = INDENT.repeat(level);

        let fields = match object.fields() {
            Ok(fields) => fields,
            Err(err) => {
                let _ = writeln!(out, "{}{}", indent, self.paint_error(&err));
                return;
            }
        };

        for field in fields {
            let name = self.styles.field_name.paint(field.name.as_str());
            let _ = write!(out, "{}{}: ", indent, name);

            match (&field.value, field.value.as_tagged()) {
                (_, Some(tagged)) if tagged.is_reference() && depth > 1 => {
                    match self.introspector.describe_tagged(tagged) {
                        Ok(nested) => self.write_description(out, &nested, depth - 1, level),
                        Err(err) => {
                            let _ = writeln!(out, "{}", self.paint_error(&err));
                        }
                    }
                }
                (FieldValue::Unavailable(_), _) => {
                    let _ = writeln!(out, "{}", self.styles.error.paint(field.value.to_string()));
                }
                (value, _) => {
                    let _ = writeln!(out, "{}", value);
                }
            }
        }
    }
}
