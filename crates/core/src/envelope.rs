use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// Uniform outcome of a dispatched request.
///
/// Serialized flat as `{success, result_kind, data}` or `{success, message}`.
#[derive(Clone, Debug, PartialEq)]
pub enum ResultEnvelope {
    Success { result_kind: String, data: Value },
    Failure { message: String },
}

impl ResultEnvelope {
    pub fn success(result_kind: impl Into<String>, data: Value) -> Self {
        Self::Success { result_kind: result_kind.into(), data }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self::Failure { message: message.into() }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn result_kind(&self) -> Option<&str> {
        match self {
            Self::Success { result_kind, .. } => Some(result_kind),
            Self::Failure { .. } => None,
        }
    }

    pub fn data(&self) -> Option<&Value> {
        match self {
            Self::Success { data, .. } => Some(data),
            Self::Failure { .. } => None,
        }
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { message } => Some(message),
        }
    }
}

#[derive(Serialize, Deserialize)]
struct EnvelopeWire {
    success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    result_kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

impl Serialize for ResultEnvelope {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let wire = match self {
            Self::Success { result_kind, data } => EnvelopeWire {
                success: true,
                result_kind: Some(result_kind.clone()),
                data: Some(data.clone()),
                message: None,
            },
            Self::Failure { message } => EnvelopeWire {
                success: false,
                result_kind: None,
                data: None,
                message: Some(message.clone()),
            },
        };
        wire.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ResultEnvelope {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::Error;

        let wire = EnvelopeWire::deserialize(deserializer)?;
        match wire {
            EnvelopeWire { success: true, result_kind: Some(result_kind), data, message: None } => {
                Ok(Self::Success { result_kind, data: data.unwrap_or(Value::Null) })
            }
            EnvelopeWire { success: false, result_kind: None, data: None, message: Some(message) } => {
                Ok(Self::Failure { message })
            }
            _ => Err(D::Error::custom(
                "envelope must carry either result_kind and data, or message",
            )),
        }
    }
}
