use serde_json::{Map, Value};

/// Drop `null` fields, and objects left empty once their own `null`s are
/// dropped, at any depth. Arrays and their contents are kept as they are.
pub fn sanitize(value: &mut Value) {
    if let Value::Object(map) = value {
        prune(map);
    }
}

pub fn prune(map: &mut Map<String, Value>) {
    map.retain(|_, value| match value {
        Value::Null => false,
        Value::Object(inner) => {
            prune(inner);
            !inner.is_empty()
        }
        _ => true,
    });
}
