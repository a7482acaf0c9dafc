//! Property types to generated validator expressions.

use indexmap::IndexMap;

use crate::spec::PropertyType;
use super::escape::string_literal;

/// Validator expression for a property type.
///
/// Unknown types map to `z.any()`: an unsupported declaration is accepted
/// permissively instead of failing compilation.
pub fn validator(prop: &PropertyType) -> String {
    match prop {
        PropertyType::String => "z.string()".to_string(),
        PropertyType::Number => "z.number()".to_string(),
        PropertyType::Boolean => "z.boolean()".to_string(),
        PropertyType::Object(fields) => object_validator(fields),
        PropertyType::Unknown(_) => "z.any()".to_string(),
    }
}

/// Validator expression for an object with the given fields.
pub fn object_validator(fields: &IndexMap<String, PropertyType>) -> String {
    if fields.is_empty() {
        return "z.object({})".to_string();
    }
    let body = fields
        .iter()
        .map(|(name, field)| format!("{}: {}", string_literal(name), validator(field)))
        .collect::<Vec<_>>()
        .join(", ");
    format!("z.object({{ {} }})", body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalars() {
        assert_eq!(validator(&PropertyType::String), "z.string()");
        assert_eq!(validator(&PropertyType::Number), "z.number()");
        assert_eq!(validator(&PropertyType::Boolean), "z.boolean()");
    }

    #[test]
    fn test_unknown_accepts_anything() {
        assert_eq!(validator(&PropertyType::Unknown("vector3".into())), "z.any()");
        assert_eq!(validator(&PropertyType::Unknown(String::new())), "z.any()");
    }

    #[test]
    fn test_nested_object() {
        let prop = PropertyType::object([
            ("city", PropertyType::String),
            (
                "coords",
                PropertyType::object([
                    ("lat", PropertyType::Number),
                    ("pos", PropertyType::Unknown("vector3".into())),
                ]),
            ),
        ]);
        assert_eq!(
            validator(&prop),
            r#"z.object({ "city": z.string(), "coords": z.object({ "lat": z.number(), "pos": z.any() }) })"#
        );
    }

    #[test]
    fn test_field_names_are_escaped() {
        let prop = PropertyType::object([("odd \"name\"", PropertyType::Boolean)]);
        assert_eq!(validator(&prop), r#"z.object({ "odd \"name\"": z.boolean() })"#);
    }

    #[test]
    fn test_empty_object() {
        assert_eq!(validator(&PropertyType::object(Vec::<(String, _)>::new())), "z.object({})");
    }
}
