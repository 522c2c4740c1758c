use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_start_activity: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_end_activity: bool,
}

impl Activity {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            is_start_activity: false,
            is_end_activity: false,
        }
    }

    pub fn start(mut self) -> Self {
        self.is_start_activity = true;
        self
    }

    pub fn end(mut self) -> Self {
        self.is_end_activity = true;
        self
    }

    pub fn display_name(&self) -> String {
        if self.name.is_empty() {
            format!("Activity #{}", self.id)
        } else {
            self.name.clone()
        }
    }
}

/// A directed transition. `id` is also the node id that conditions and
/// commands are attached to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    pub id: i64,
    pub from_activity_id: i64,
    pub to_activity_id: i64,
    #[serde(default)]
    pub name: Option<String>,
}

impl Edge {
    pub fn new(id: i64, from: i64, to: i64) -> Self {
        Self {
            id,
            from_activity_id: from,
            to_activity_id: to,
            name: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionAnnotation {
    #[serde(default)]
    pub id: Option<i64>,
    pub activity_id: i64,
    pub action_id: i64,
    #[serde(default)]
    pub action_name: Option<String>,
    #[serde(default)]
    pub priority: Option<i64>,
}

pub type InboundAnnotation = ActionAnnotation;
pub type OutboundAnnotation = ActionAnnotation;

impl ActionAnnotation {
    pub fn new(activity_id: i64, action_id: i64, action_name: Option<&str>) -> Self {
        Self {
            id: None,
            activity_id,
            action_id,
            action_name: action_name.map(str::to_string),
            priority: None,
        }
    }

    pub fn display_name(&self) -> String {
        match self.action_name.as_deref() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => format!("Action #{}", self.action_id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeConditionAnnotation {
    pub node_id: i64,
    pub condition_id: i64,
    #[serde(default)]
    pub condition_name: Option<String>,
    #[serde(default)]
    pub priority: Option<i64>,
}

impl NodeConditionAnnotation {
    pub fn display_name(&self) -> String {
        match self.condition_name.as_deref() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => format!("Condition #{}", self.condition_id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeCommandAnnotation {
    #[serde(default)]
    pub id: i64,
    pub node_id: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub route: Option<String>,
    pub node_command_type_id: i64,
    #[serde(default)]
    pub node_command_type_name: Option<String>,
    #[serde(default)]
    pub node_command_type_color: Option<String>,
}

impl NodeCommandAnnotation {
    pub fn display_name(&self) -> String {
        match self.name.as_deref() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => format!("Cmd #{}", self.id),
        }
    }
}

/// Response body of `GET /processes/{id}/graph`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphPayload {
    #[serde(default, deserialize_with = "null_as_default")]
    pub activities: Vec<Activity>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub edges: Vec<Edge>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub inbound: Vec<InboundAnnotation>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub outbound: Vec<OutboundAnnotation>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub node_conditions: Vec<NodeConditionAnnotation>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub node_commands: Vec<NodeCommandAnnotation>,
}

impl GraphPayload {
    pub fn from_json(input: &str) -> serde_json::Result<Self> {
        let value: serde_json::Value = serde_json::from_str(input)?;
        Self::from_value(value)
    }

    /// Accepts the bare payload or a `{ "result": … }` envelope.
    pub fn from_value(mut value: serde_json::Value) -> serde_json::Result<Self> {
        let inner = value
            .get_mut("result")
            .filter(|inner| inner.is_object())
            .map(serde_json::Value::take);
        if let Some(inner) = inner {
            value = inner;
        }
        serde_json::from_value(value)
    }
}

/// Which annotation kinds are requested from the backend and drawn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Toggles {
    pub inbound: bool,
    pub outbound: bool,
    pub node_conditions: bool,
    pub node_commands: bool,
}

impl Toggles {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn all() -> Self {
        Self {
            inbound: true,
            outbound: true,
            node_conditions: true,
            node_commands: true,
        }
    }

    pub fn shows_edge_annotations(&self) -> bool {
        self.node_conditions || self.node_commands
    }

    pub fn query_pairs(&self) -> Vec<(&'static str, &'static str)> {
        let mut pairs = Vec::new();
        if self.inbound {
            pairs.push(("inbound", "1"));
        }
        if self.outbound {
            pairs.push(("outbound", "1"));
        }
        if self.node_conditions {
            pairs.push(("nodeConditions", "1"));
        }
        if self.node_commands {
            pairs.push(("nodeCommands", "1"));
        }
        pairs
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
