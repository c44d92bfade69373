//! Accessor naming conventions and primitive boxing.

use crate::ast::TypeRef;

/// Accessor prefix a getter was declared with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GetterPrefix {
    Get,
    /// `isEnabled()`, only valid for boolean properties
    Is,
}

/// Split a getter name into its prefix and property name.
/// `getProperty` -> (Get, "property"), `isEnabled` -> (Is, "enabled").
pub fn property_from_getter(getter: &str) -> Option<(GetterPrefix, String)> {
    if let Some(rest) = accessor_suffix(getter, "get") {
        return Some((GetterPrefix::Get, decapitalize(rest)));
    }
    accessor_suffix(getter, "is").map(|rest| (GetterPrefix::Is, decapitalize(rest)))
}

/// `setProperty` -> "property"
pub fn property_from_setter(setter: &str) -> Option<String> {
    accessor_suffix(setter, "set").map(decapitalize)
}

/// Setter paired with a getter: `getProperty` -> `setProperty`
pub fn setter_for_getter(getter: &str) -> Option<String> {
    accessor_suffix(getter, "get")
        .or_else(|| accessor_suffix(getter, "is"))
        .map(|rest| format!("set{rest}"))
}

fn accessor_suffix<'a>(name: &'a str, prefix: &str) -> Option<&'a str> {
    let rest = name.strip_prefix(prefix)?;
    match rest.chars().next() {
        Some(c) if c.is_uppercase() => Some(rest),
        _ => None,
    }
}

/// JavaBeans decapitalisation: `Property` -> `property`, but `URL` stays `URL`
pub fn decapitalize(name: &str) -> String {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return String::new();
    };
    let second_upper = chars.next().is_some_and(char::is_uppercase);
    if first.is_uppercase() && second_upper {
        return name.to_string();
    }
    let mut out = String::with_capacity(name.len());
    out.extend(first.to_lowercase());
    out.push_str(&name[first.len_utf8()..]);
    out
}

/// Boxed class for a primitive keyword
pub fn boxed_primitive(keyword: &str) -> Option<&'static str> {
    let boxed = match keyword {
        "boolean" => "java.lang.Boolean",
        "byte" => "java.lang.Byte",
        "char" => "java.lang.Character",
        "double" => "java.lang.Double",
        "float" => "java.lang.Float",
        "int" => "java.lang.Integer",
        "long" => "java.lang.Long",
        "short" => "java.lang.Short",
        _ => return None,
    };
    Some(boxed)
}

/// Reference form of a type, suitable as a generic type argument.
/// Unknown primitive keywords are returned unchanged.
pub fn boxed(ty: &TypeRef) -> TypeRef {
    match ty {
        TypeRef::Primitive(keyword) => boxed_primitive(keyword)
            .map(TypeRef::class)
            .unwrap_or_else(|| ty.clone()),
        other => other.clone(),
    }
}

pub fn is_boolean(ty: &TypeRef) -> bool {
    match ty {
        TypeRef::Primitive(keyword) => keyword == "boolean",
        TypeRef::Class { name, .. } => name == "java.lang.Boolean" || name == "Boolean",
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_getter_names() {
        assert_eq!(
            property_from_getter("getProperty"),
            Some((GetterPrefix::Get, "property".to_string()))
        );
        assert_eq!(
            property_from_getter("isEnabled"),
            Some((GetterPrefix::Is, "enabled".to_string()))
        );
        assert_eq!(property_from_getter("getter"), None);
        assert_eq!(property_from_getter("get"), None);
        assert_eq!(property_from_getter("island"), None);
    }

    #[test]
    fn test_setter_names() {
        assert_eq!(property_from_setter("setProperty").as_deref(), Some("property"));
        assert_eq!(property_from_setter("settle"), None);
        assert_eq!(setter_for_getter("getProperty").as_deref(), Some("setProperty"));
        assert_eq!(setter_for_getter("isEnabled").as_deref(), Some("setEnabled"));
    }

    #[test]
    fn test_decapitalize_keeps_acronyms() {
        assert_eq!(decapitalize("Property"), "property");
        assert_eq!(decapitalize("URL"), "URL");
        assert_eq!(decapitalize("X"), "x");
        assert_eq!(decapitalize(""), "");
    }

    #[test]
    fn test_boxing() {
        assert_eq!(boxed(&TypeRef::primitive("int")), TypeRef::class("java.lang.Integer"));
        assert_eq!(boxed(&TypeRef::primitive("char")), TypeRef::class("java.lang.Character"));
        assert_eq!(boxed(&TypeRef::string()), TypeRef::string());
        assert_eq!(boxed(&TypeRef::primitive("void")), TypeRef::primitive("void"));
    }
}
