//! Keeps profile values inside the scalars they were written into.
//!
//! Substitution is textual, so a value such as `prod\nuid: other` could add
//! keys to the fragment. The fragment is rendered once with a neutral word in
//! every placeholder, and the real rendering must have the same YAML shape.

use serde_yaml::Value;

use crate::profile::Profile;
use crate::template::TemplateFragment;
use crate::validation::ValidationError;

/// Substituted for every placeholder to recover the fragment's own shape.
const NEUTRAL: &str = "alertgen";

/// YAML node kinds, ignoring scalar contents.
#[derive(Debug, PartialEq)]
enum Shape {
    Scalar,
    Seq(Vec<Shape>),
    Map(Vec<(Shape, Shape)>),
}

impl Shape {
    fn of(value: &Value) -> Self {
        match value {
            Value::Sequence(items) => Shape::Seq(items.iter().map(Shape::of).collect()),
            Value::Mapping(map) => {
                Shape::Map(map.iter().map(|(k, v)| (Shape::of(k), Shape::of(v))).collect())
            }
            Value::Tagged(tagged) => Shape::of(&tagged.value),
            _ => Shape::Scalar,
        }
    }

    fn parse(text: &str) -> Option<Self> {
        serde_yaml::from_str::<Value>(text).ok().map(|v| Shape::of(&v))
    }
}

/// Reject a rendering whose YAML shape differs from the fragment as written.
///
/// Renderings that are not YAML at all are left to the rule body parser,
/// which reports them with the parser's own message.
pub(crate) fn check_structure(
    profile: &Profile,
    fragment: &TemplateFragment,
    rendered: &str,
) -> Result<(), ValidationError> {
    let Some(actual) = Shape::parse(rendered) else {
        return Ok(());
    };
    let Some(expected) = render_with(fragment, |_| None).and_then(|t| Shape::parse(&t)) else {
        return Ok(());
    };
    if actual == expected {
        return Ok(());
    }

    // Substitute one real value at a time to name the one responsible.
    let culprit = fragment.template.variables().into_iter().find(|var| {
        render_with(fragment, |name| (name == *var).then(|| profile.resolve(name)).flatten())
            .and_then(|t| Shape::parse(&t))
            .map_or(true, |shape| shape != expected)
    });

    Err(match culprit {
        Some(var) => ValidationError {
            path: format!("values.{var}"),
            message: format!(
                "{:?} changes the fragment's YAML structure; profile values may only fill a scalar",
                profile.resolve(var).unwrap_or_default()
            ),
            suggestion: None,
        },
        None => ValidationError {
            path: String::new(),
            message: "profile values change the fragment's YAML structure".to_string(),
            suggestion: None,
        },
    })
}

/// Render with `lookup`, using the neutral word wherever it yields nothing.
fn render_with<F>(fragment: &TemplateFragment, lookup: F) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    fragment
        .template
        .render(|name| lookup(name).or_else(|| Some(NEUTRAL.to_string())))
        .ok()
}
