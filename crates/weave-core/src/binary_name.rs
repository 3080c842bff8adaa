//! Conversions between the three binary-name spellings the rest of the
//! workspace juggles: dotted (`pkg.Outer$Inner`, externally facing), internal
//! slash form (`pkg/Outer$Inner`, used inside the engine and the codec), and
//! the single-type descriptor form (`Lpkg/Outer$Inner;`).

/// Convert a dotted binary name to internal (slash) form.
pub fn dotted_to_internal(dotted: &str) -> String {
    dotted.replace('.', "/")
}

/// Convert an internal (slash) binary name to dotted form.
pub fn internal_to_dotted(internal: &str) -> String {
    internal.replace('/', ".")
}

/// Wrap an internal binary name as a single-type descriptor, e.g. `pkg/Foo` -> `Lpkg/Foo;`.
pub fn internal_to_descriptor(internal: &str) -> String {
    format!("L{internal};")
}

/// Strip the `L...;` wrapper from a single-type object descriptor, returning the
/// internal binary name. Returns `None` if `descriptor` is not an object descriptor.
pub fn descriptor_to_internal(descriptor: &str) -> Option<&str> {
    descriptor
        .strip_prefix('L')
        .and_then(|rest| rest.strip_suffix(';'))
}

/// Derive the simple (unqualified, innermost) name from a qualified binary name,
/// accepting either dotted or internal-slash spelling and tolerating `$`-separated
/// inner-class segments.
pub fn simple_name(qualified: &str) -> &str {
    let after_package = qualified
        .rsplit(['/', '.'])
        .next()
        .unwrap_or(qualified);
    after_package.rsplit('$').next().unwrap_or(after_package)
}

/// First-letter-lowercased form of a simple name, used by the Handler Spec
/// Analyzer's accessor/mutator recognition rules (e.g. `Counter` -> `counter`).
pub fn camel_case(simple: &str) -> String {
    let mut chars = simple.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// The outer-class binary name of `inner`, derived from the `$`-separated
/// internal name, or `None` if `inner` is a top-level class.
pub fn outer_of(internal: &str) -> Option<&str> {
    internal.rsplit_once('$').map(|(outer, _)| outer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_dotted_and_internal() {
        let dotted = "com.example.Outer$Inner";
        let internal = dotted_to_internal(dotted);
        assert_eq!(internal, "com/example/Outer$Inner");
        assert_eq!(internal_to_dotted(&internal), dotted);
    }

    #[test]
    fn wraps_and_unwraps_descriptor() {
        let internal = "com/example/Handler";
        let descriptor = internal_to_descriptor(internal);
        assert_eq!(descriptor, "Lcom/example/Handler;");
        assert_eq!(descriptor_to_internal(&descriptor), Some(internal));
    }

    #[test]
    fn descriptor_to_internal_rejects_non_object() {
        assert_eq!(descriptor_to_internal("I"), None);
        assert_eq!(descriptor_to_internal("[Lfoo;"), None);
    }

    #[test]
    fn simple_name_strips_package_and_outer() {
        assert_eq!(simple_name("com/example/Outer$Inner"), "Inner");
        assert_eq!(simple_name("com.example.Outer$Inner"), "Inner");
        assert_eq!(simple_name("Counter"), "Counter");
    }

    #[test]
    fn camel_case_lowercases_first_letter_only() {
        assert_eq!(camel_case("Counter"), "counter");
        assert_eq!(camel_case("XMLParser"), "xMLParser");
        assert_eq!(camel_case(""), "");
    }

    #[test]
    fn outer_of_top_level_is_none() {
        assert_eq!(outer_of("com/example/Outer$Inner"), Some("com/example/Outer"));
        assert_eq!(outer_of("com/example/Top"), None);
    }
}
