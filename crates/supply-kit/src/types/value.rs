//! Decoding of contract return values.
//!
//! Soroban returns values as [`ScVal`], a tagged union that is far larger than
//! what this client needs. [`to_native`] maps the subset the supply-chain
//! contract produces onto [`serde_json::Value`] and degrades on everything
//! else: an unhandled tag becomes the [`UNSUPPORTED_SCVAL`] string instead of
//! an error.
//!
//! | `ScVal` | `Value` |
//! |---|---|
//! | `Bool` | `Bool` |
//! | `String`, `Symbol` | `String` |
//! | `U64`, `I64` | `String` (decimal, no precision loss) |
//! | `Vec` | `Array`, order preserved |
//! | `Map` | `Object`, keys decoded then stringified |
//! | `Void`, empty `Vec`/`Map` body | `Null` |
//! | anything else | `String(UNSUPPORTED_SCVAL)` |

use serde_json::{Map, Value};
use stellar_xdr::curr::{ScMap, ScVal, ScVec};

/// Returned in place of a value whose tag this client does not handle.
pub const UNSUPPORTED_SCVAL: &str = "Unsupported ScVal Type";

/// Decode an optional value. Absent input decodes to `Null`.
pub fn to_native_opt(value: Option<&ScVal>) -> Value {
    value.map_or(Value::Null, to_native)
}

/// Decode a contract value into plain data.
pub fn to_native(value: &ScVal) -> Value {
    match value {
        ScVal::Bool(b) => Value::Bool(*b),
        ScVal::Void => Value::Null,
        ScVal::String(s) => Value::String(s.0.to_utf8_string_lossy()),
        ScVal::Symbol(s) => Value::String(s.0.to_utf8_string_lossy()),
        ScVal::U64(n) => Value::String(n.to_string()),
        ScVal::I64(n) => Value::String(n.to_string()),
        ScVal::Vec(v) => v.as_ref().map_or(Value::Null, vec_to_native),
        ScVal::Map(m) => m.as_ref().map_or(Value::Null, map_to_native),
        _ => Value::String(UNSUPPORTED_SCVAL.to_string()),
    }
}

fn vec_to_native(vec: &ScVec) -> Value {
    Value::Array(vec.0.iter().map(to_native).collect())
}

fn map_to_native(map: &ScMap) -> Value {
    let mut out = Map::new();
    for entry in map.0.iter() {
        let key = match to_native(&entry.key) {
            Value::String(s) => s,
            other => other.to_string(),
        };
        out.insert(key, to_native(&entry.val));
    }
    Value::Object(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use stellar_xdr::curr::{
        ScMapEntry, ScString, ScSymbol, StringM, TimePoint, UInt128Parts,
    };

    fn string(s: &str) -> ScVal {
        ScVal::String(ScString(StringM::try_from(s).unwrap()))
    }

    fn symbol(s: &str) -> ScVal {
        ScVal::Symbol(ScSymbol(StringM::try_from(s).unwrap()))
    }

    fn map(entries: Vec<(ScVal, ScVal)>) -> ScVal {
        let entries: Vec<ScMapEntry> = entries
            .into_iter()
            .map(|(key, val)| ScMapEntry { key, val })
            .collect();
        ScVal::Map(Some(ScMap(entries.try_into().unwrap())))
    }

    #[test]
    fn test_primitives() {
        assert_eq!(to_native(&ScVal::Bool(true)), Value::Bool(true));
        assert_eq!(to_native(&string("Dell Inc.")), Value::from("Dell Inc."));
        assert_eq!(to_native(&symbol("P_COUNT")), Value::from("P_COUNT"));
        assert_eq!(to_native(&ScVal::U64(42)), Value::from("42"));
        assert_eq!(to_native(&ScVal::I64(-7)), Value::from("-7"));
    }

    #[test]
    fn test_u64_keeps_full_precision() {
        assert_eq!(
            to_native(&ScVal::U64(u64::MAX)),
            Value::from("18446744073709551615")
        );
    }

    #[test]
    fn test_absent_and_void_are_null() {
        assert_eq!(to_native_opt(None), Value::Null);
        assert_eq!(to_native(&ScVal::Void), Value::Null);
        assert_eq!(to_native(&ScVal::Vec(None)), Value::Null);
        assert_eq!(to_native(&ScVal::Map(None)), Value::Null);
    }

    #[test]
    fn test_vec_preserves_order() {
        let vec = ScVal::Vec(Some(ScVec(
            vec![ScVal::U64(3), string("b"), ScVal::Bool(false)]
                .try_into()
                .unwrap(),
        )));
        assert_eq!(
            to_native(&vec),
            serde_json::json!(["3", "b", false])
        );
    }

    #[test]
    fn test_map_recurses() {
        let value = map(vec![
            (symbol("name"), string("Laptop XPS 15")),
            (
                symbol("tags"),
                ScVal::Vec(Some(ScVec(vec![symbol("a")].try_into().unwrap()))),
            ),
            (ScVal::U64(1), map(vec![(symbol("inner"), ScVal::Bool(true))])),
        ]);
        assert_eq!(
            to_native(&value),
            serde_json::json!({
                "name": "Laptop XPS 15",
                "tags": ["a"],
                "1": { "inner": true },
            })
        );
    }

    #[test]
    fn test_non_string_keys_use_json_text() {
        let value = map(vec![(ScVal::Bool(true), ScVal::U64(1))]);
        assert_eq!(to_native(&value), serde_json::json!({ "true": "1" }));
    }

    #[test]
    fn test_unhandled_tags_degrade_to_sentinel() {
        let unsupported = [
            ScVal::U32(1),
            ScVal::I32(-1),
            ScVal::U128(UInt128Parts { hi: 0, lo: 1 }),
            ScVal::Timepoint(TimePoint(1_700_000_000)),
            ScVal::LedgerKeyContractInstance,
        ];
        for value in unsupported {
            assert_eq!(to_native(&value), Value::from(UNSUPPORTED_SCVAL));
        }
    }

    #[test]
    fn test_unsupported_inside_containers() {
        let value = map(vec![(symbol("count"), ScVal::U32(5))]);
        assert_eq!(
            to_native(&value),
            serde_json::json!({ "count": UNSUPPORTED_SCVAL })
        );
    }
}
