//! Parser for the Agent's configuration grammar (§4.5):
//!
//! ```text
//! args  := setup (';' setup)*
//! setup := handler (':' spawner)? ('=' handlee (',' handlee)*)?
//! ```
//!
//! Every handler, spawner, and handlee is a dotted binary name; the spawner
//! additionally encodes a method name as its trailing `.`-separated segment.

use weave_core::binary_name::dotted_to_internal;
use weave_spec::SpawnerRef;

use crate::error::ConfigError;

/// One parsed `setup` clause: a handler interface, an optional spawner
/// override, and the explicit handlees listed after `=`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupConfig {
    pub handler: String,
    pub spawner: Option<SpawnerRef>,
    pub handlees: Vec<String>,
}

fn parse_spawner(dotted: &str) -> Result<SpawnerRef, ConfigError> {
    let (owner, method) = dotted.rsplit_once('.').ok_or_else(|| ConfigError::MalformedSpawnerReference {
        reference: dotted.to_string(),
    })?;
    Ok(SpawnerRef::new(dotted_to_internal(owner), method.to_string()))
}

fn parse_setup(setup: &str) -> Result<SetupConfig, ConfigError> {
    // The no-`=` branch still runs this split; over a string with no `,` it's
    // a no-op that yields one empty segment, filtered away below (§9.1).
    let mut halves = setup.splitn(2, '=');
    let head = halves.next().unwrap_or("");
    let handlee_part = halves.next().unwrap_or("");

    let mut head_halves = head.splitn(2, ':');
    let handler_part = head_halves.next().unwrap_or("");
    if handler_part.is_empty() {
        return Err(ConfigError::MissingHandlerName { setup: setup.to_string() });
    }
    let spawner = head_halves.next().map(parse_spawner).transpose()?;

    let handlees = handlee_part
        .split(',')
        .filter(|s| !s.is_empty())
        .map(dotted_to_internal)
        .collect();

    Ok(SetupConfig { handler: dotted_to_internal(handler_part), spawner, handlees })
}

/// Parse a full configuration string into its `setup` clauses, in order.
pub fn parse(config: &str) -> Result<Vec<SetupConfig>, ConfigError> {
    config.split(';').filter(|s| !s.is_empty()).map(parse_setup).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_handler() {
        let setups = parse("pkg.Counter").unwrap();
        assert_eq!(setups.len(), 1);
        assert_eq!(setups[0].handler, "pkg/Counter");
        assert_eq!(setups[0].spawner, None);
        assert!(setups[0].handlees.is_empty());
    }

    #[test]
    fn no_equals_still_splits_handlee_segment_to_empty_list() {
        let setups = parse("pkg.Counter:pkg.Factory.spawn").unwrap();
        assert_eq!(setups.len(), 1);
        assert!(setups[0].handlees.is_empty());
        assert_eq!(setups[0].spawner, Some(SpawnerRef::new("pkg/Factory", "spawn")));
    }

    #[test]
    fn parses_handler_spawner_and_handlees() {
        let setups = parse("pkg.Counter:pkg.Factory.spawn=pkg.A,pkg.B").unwrap();
        assert_eq!(setups.len(), 1);
        assert_eq!(setups[0].handler, "pkg/Counter");
        assert_eq!(setups[0].spawner, Some(SpawnerRef::new("pkg/Factory", "spawn")));
        assert_eq!(setups[0].handlees, vec!["pkg/A".to_string(), "pkg/B".to_string()]);
    }

    #[test]
    fn parses_multiple_setups_separated_by_semicolon() {
        let setups = parse("pkg.Counter=pkg.A;pkg.Other=pkg.B").unwrap();
        assert_eq!(setups.len(), 2);
        assert_eq!(setups[1].handler, "pkg/Other");
    }

    #[test]
    fn trailing_semicolon_is_tolerated() {
        let setups = parse("pkg.Counter=pkg.A;").unwrap();
        assert_eq!(setups.len(), 1);
    }

    #[test]
    fn rejects_spawner_without_a_dot() {
        let err = parse("pkg.Counter:spawn").unwrap_err();
        assert!(matches!(err, ConfigError::MalformedSpawnerReference { .. }));
    }

    #[test]
    fn empty_config_yields_no_setups() {
        assert_eq!(parse("").unwrap(), Vec::new());
    }
}
