//! Renders a [`GenerationModel`] into Rust source
//!
//! The template is a handlebars template fed with the serialized model.
//! HTML escaping is disabled, the output is Rust code.
//!
//! Available helpers:
//! - `join items sep` joins an array into a string
//! - `prefix pf items` prepends `pf` to every element of an array
//! - `suffix items sf` appends `sf` to every element of an array
//! - `str_lit value` writes a string as a Rust string literal

use crate::{config::TemplateSource, error::Error, model::GenerationModel};
use handlebars::{Handlebars, no_escape};
use helpers::{join, prefix, str_lit, suffix};
use std::fs;

const TEMPLATE_NAME: &str = "container";
const DEFAULT_TEMPLATE: &str = include_str!("../templates/container.rs.hbs");

#[allow(unreachable_pub, missing_debug_implementations)]
mod helpers {
    use handlebars::handlebars_helper;
    use serde_json::Value;

    handlebars_helper!(join: |items: array, separator: str| {
        items.iter()
            .map(value_to_string)
            .collect::<Vec<_>>()
            .join(separator)
    });

    handlebars_helper!(prefix: |pf: str, items: array| {
        items.iter()
            .map(|item| format!("{pf}{}", value_to_string(item)))
            .collect::<Vec<_>>()
    });

    handlebars_helper!(suffix: |items: array, sf: str| {
        items.iter()
            .map(|item| format!("{}{sf}", value_to_string(item)))
            .collect::<Vec<_>>()
    });

    handlebars_helper!(str_lit: |value: str| format!("{value:?}"));

    fn value_to_string(value: &Value) -> String {
        match value {
            Value::String(value) => value.clone(),
            value => value.to_string()
        }
    }
}

/// Renders generation models with a compiled template
#[derive(Debug)]
pub struct Renderer {
    handlebars: Handlebars<'static>
}

impl Renderer {
    /// Compiles the template from the given source
    ///
    /// # Errors
    /// Fails if a template file cannot be read or the template is malformed.
    pub fn new(source: &TemplateSource) -> Result<Self, Error> {
        let mut handlebars = Handlebars::new();
        handlebars.register_escape_fn(no_escape);
        handlebars.register_helper("join", Box::new(join));
        handlebars.register_helper("prefix", Box::new(prefix));
        handlebars.register_helper("suffix", Box::new(suffix));
        handlebars.register_helper("str_lit", Box::new(str_lit));

        match source {
            TemplateSource::Default => handlebars.register_template_string(TEMPLATE_NAME, DEFAULT_TEMPLATE)?,
            TemplateSource::Inline(template) => handlebars.register_template_string(TEMPLATE_NAME, template)?,
            TemplateSource::File(path) => {
                let template = fs::read_to_string(path)?;
                handlebars.register_template_string(TEMPLATE_NAME, template)?
            }
        }

        Ok(Self { handlebars })
    }

    /// Renders the container source
    #[inline]
    pub fn render(&self, model: &GenerationModel) -> Result<String, Error> {
        self.handlebars
            .render(TEMPLATE_NAME, model)
            .map_err(Error::from)
    }
}
