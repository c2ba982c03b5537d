//! Typed, defaulted reads over the fragment state of a navigable context.

use crate::{
    codec::{StateMap, RESERVED_KEY},
    host::NavigableContext,
    value::{parse_float_prefix, parse_int_prefix, CastTo, StateValue},
};

const TRUTHY: [&str; 3] = ["true", "on", "yes"];
const FALSY: [&str; 3] = ["false", "no", "off"];

/// Applies a [`CastTo`] policy to a raw (already decoded) value.
///
/// A missing value still goes through the cast: integers read as `0`, floats as NaN, booleans as
/// `false`, and strings as `None`.
pub fn cast_value(raw: Option<&str>, cast: CastTo) -> Option<StateValue> {
    match cast {
        CastTo::String => raw.map(StateValue::from),
        CastTo::Integer => Some(StateValue::Integer(
            raw.and_then(parse_int_prefix).unwrap_or(0),
        )),
        CastTo::Float => Some(StateValue::Float(raw.map_or(f64::NAN, parse_float_prefix))),
        CastTo::Boolean => {
            let Some(raw) = raw else {
                return Some(StateValue::Boolean(false));
            };
            let lowered = raw.to_lowercase();
            let value = if TRUTHY.contains(&lowered.as_str()) {
                true
            } else if FALSY.contains(&lowered.as_str()) {
                false
            } else {
                !raw.is_empty()
            };
            Some(StateValue::Boolean(value))
        }
    }
}

#[derive(Clone, Copy)]
/// Read view over the state stored in one navigable context's fragment.
pub struct StateReader<'a> {
    context: &'a dyn NavigableContext,
}

impl<'a> StateReader<'a> {
    /// Creates a reader over `context`.
    pub fn new(context: &'a dyn NavigableContext) -> Self {
        Self { context }
    }

    /// Parses the context's current fragment.
    pub fn state_map(&self) -> StateMap {
        StateMap::parse(&self.context.current_fragment())
    }

    /// Returns whether the fragment holds any state besides the timestamp marker.
    pub fn has_any_state(&self) -> bool {
        self.state_map().has_public_entries()
    }

    /// Returns the decoded raw value for a public key.
    pub fn get_raw(&self, key: &str) -> Option<String> {
        if key.is_empty() || key == RESERVED_KEY {
            return None;
        }
        self.state_map().get(key).map(str::to_string)
    }

    /// Reads `key` with the given cast.
    ///
    /// When the key is absent (or is the reserved marker) `default` is returned as-is if given.
    /// Otherwise an absent key follows [`cast_value`] semantics, except that the reserved and
    /// empty keys always read as `None`.
    pub fn get(
        &self,
        key: &str,
        cast: CastTo,
        default: Option<StateValue>,
    ) -> Option<StateValue> {
        let raw = self.get_raw(key);
        if raw.is_none() {
            if default.is_some() {
                return default;
            }
            if key.is_empty() || key == RESERVED_KEY {
                return None;
            }
        }
        cast_value(raw.as_deref(), cast)
    }
}
