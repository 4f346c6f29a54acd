use std::fmt;

use serde_json::Value;

use super::Entity;

/// A mutation payload: the JSON object of fields sent to the remote.
pub type Payload = serde_json::Map<String, Value>;

/// Error type for payloads that cannot be turned into an entity or an id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadError {
    /// The payload was not a JSON object.
    NotAnObject,
    /// The payload has no identity field.
    MissingId(&'static str),
    /// The identity field does not decode as the entity's id type.
    InvalidId(String),
    /// The payload fields do not form a valid entity.
    Invalid(String),
}

impl fmt::Display for PayloadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PayloadError::NotAnObject => write!(f, "payload must be a JSON object"),
            PayloadError::MissingId(field) => write!(f, "payload is missing `{}`", field),
            PayloadError::InvalidId(msg) => write!(f, "invalid id in payload: {}", msg),
            PayloadError::Invalid(msg) => write!(f, "invalid payload: {}", msg),
        }
    }
}

impl std::error::Error for PayloadError {}

pub(crate) fn into_payload(value: Value) -> Result<Payload, PayloadError> {
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(PayloadError::NotAnObject),
    }
}

pub(crate) fn id_from_payload<E: Entity>(payload: &Payload) -> Result<E::Id, PayloadError> {
    let raw = payload
        .get(E::ID_FIELD)
        .ok_or(PayloadError::MissingId(E::ID_FIELD))?;
    serde_json::from_value(raw.clone()).map_err(|e| PayloadError::InvalidId(e.to_string()))
}

/// Insert `id` into an object payload under the entity's id field.
pub(crate) fn with_id<E: Entity>(id: &E::Id, value: Value) -> Result<Value, PayloadError> {
    let mut payload = into_payload(value)?;
    let id = serde_json::to_value(id).map_err(|e| PayloadError::InvalidId(e.to_string()))?;
    payload.insert(E::ID_FIELD.to_string(), id);
    Ok(Value::Object(payload))
}

/// Build an entity from payload fields, forcing its id to `id`.
pub(crate) fn build<E: Entity>(id: &E::Id, fields: &Payload) -> Result<E, PayloadError> {
    let mut object = fields.clone();
    let id = serde_json::to_value(id).map_err(|e| PayloadError::InvalidId(e.to_string()))?;
    object.insert(E::ID_FIELD.to_string(), id);
    serde_json::from_value(Value::Object(object)).map_err(|e| PayloadError::Invalid(e.to_string()))
}

/// Overlay payload fields on an existing entity. The entity keeps its id.
pub(crate) fn overlay<E: Entity>(existing: &E, patch: &Payload) -> Result<E, PayloadError> {
    let mut object = match serde_json::to_value(existing) {
        Ok(Value::Object(map)) => map,
        Ok(_) => return Err(PayloadError::Invalid(format!("{} is not a JSON object", E::NAME))),
        Err(e) => return Err(PayloadError::Invalid(e.to_string())),
    };

    for (field, value) in patch {
        if field == E::ID_FIELD {
            continue;
        }
        object.insert(field.clone(), value.clone());
    }

    serde_json::from_value(Value::Object(object)).map_err(|e| PayloadError::Invalid(e.to_string()))
}
