use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

pub type Parameters = Map<String, Value>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ServiceTag {
    Calendar,
    Chat,
    InternalApi,
}

impl ServiceTag {
    pub const ALL: [ServiceTag; 3] = [Self::Calendar, Self::Chat, Self::InternalApi];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Calendar => "calendar",
            Self::Chat => "chat",
            Self::InternalApi => "internal_api",
        }
    }
}

impl fmt::Display for ServiceTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnknownServiceTag(pub String);

impl FromStr for ServiceTag {
    type Err = UnknownServiceTag;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "calendar" => Ok(Self::Calendar),
            "chat" | "teams" => Ok(Self::Chat),
            "internal_api" | "api_interna" => Ok(Self::InternalApi),
            _ => Err(UnknownServiceTag(value.to_string())),
        }
    }
}

/// Structured request extracted from free text.
///
/// `service` stays a raw string here: the router owns the decision of
/// whether it names a known integration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Instruction {
    #[serde(rename = "servico", alias = "service")]
    pub service: String,
    #[serde(rename = "acao", alias = "action")]
    pub action: String,
    #[serde(
        rename = "parametros",
        alias = "parameters",
        default,
        deserialize_with = "null_as_empty"
    )]
    pub parameters: Parameters,
}

impl Instruction {
    pub fn new(
        service: impl Into<String>,
        action: impl Into<String>,
        parameters: Parameters,
    ) -> Self {
        Self { service: service.into(), action: action.into(), parameters }
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Parameters, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Parameters>::deserialize(deserializer)?.unwrap_or_default())
}
