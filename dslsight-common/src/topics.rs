//! Topic builders for the plain and discovery namespaces.

/// Default prefix for the plain device namespace.
pub const PLAIN_PREFIX: &str = "modems";

/// Default prefix for the Home Assistant discovery namespace.
pub const DISCOVERY_PREFIX: &str = "homeassistant";

/// Presence channel name in both namespaces.
pub const PRESENCE_CHANNEL: &str = "communicating";

/// Builder for plain-namespace device topics.
///
/// Topics follow the pattern:
/// `<prefix>/<serial>/<metric_path>`
#[derive(Debug, Clone)]
pub struct TopicBuilder {
    prefix: String,
}

impl Default for TopicBuilder {
    fn default() -> Self {
        Self::new(PLAIN_PREFIX)
    }
}

impl TopicBuilder {
    /// Create a builder with a custom prefix.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Build a topic for a specific device and metric.
    ///
    /// # Example
    /// ```
    /// use dslsight_common::topics::TopicBuilder;
    ///
    /// let builder = TopicBuilder::default();
    /// let topic = builder.build("ABC123", "lines/1/rx-rate");
    /// assert_eq!(topic, "modems/ABC123/lines/1/rx-rate");
    /// ```
    pub fn build(&self, serial: &str, metric: &str) -> String {
        format!("{}/{}/{}", self.prefix, serial, metric)
    }

    /// Build the presence topic for a device.
    ///
    /// # Example
    /// ```
    /// use dslsight_common::topics::TopicBuilder;
    ///
    /// let builder = TopicBuilder::default();
    /// assert_eq!(builder.presence("ABC123"), "modems/ABC123/communicating");
    /// ```
    pub fn presence(&self, serial: &str) -> String {
        self.build(serial, PRESENCE_CHANNEL)
    }
}

/// Home Assistant entity component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Component {
    /// Numeric sensor.
    Sensor,
    /// On/off sensor.
    BinarySensor,
}

impl Component {
    /// Get the string used in discovery topics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Component::Sensor => "sensor",
            Component::BinarySensor => "binary_sensor",
        }
    }
}

impl std::fmt::Display for Component {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Builder for discovery-namespace topics.
///
/// Topics follow the pattern:
/// `<prefix>/<component>/<object_id>/{config,state}`
#[derive(Debug, Clone)]
pub struct DiscoveryTopics {
    prefix: String,
    object_prefix: String,
}

impl Default for DiscoveryTopics {
    fn default() -> Self {
        Self::new(DISCOVERY_PREFIX)
    }
}

impl DiscoveryTopics {
    /// Create a builder with a custom discovery prefix.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            object_prefix: "modem".to_string(),
        }
    }

    /// Unique object id for a device channel.
    ///
    /// # Example
    /// ```
    /// use dslsight_common::topics::DiscoveryTopics;
    ///
    /// let topics = DiscoveryTopics::default();
    /// assert_eq!(topics.object_id("ABC123", "l1rxrate"), "modem_ABC123_l1rxrate");
    /// ```
    pub fn object_id(&self, serial: &str, channel: &str) -> String {
        format!("{}_{}_{}", self.object_prefix, serial, channel)
    }

    /// Config topic for a device channel.
    pub fn config(&self, component: Component, serial: &str, channel: &str) -> String {
        format!(
            "{}/{}/{}/config",
            self.prefix,
            component,
            self.object_id(serial, channel)
        )
    }

    /// State topic for a device channel.
    ///
    /// # Example
    /// ```
    /// use dslsight_common::topics::{Component, DiscoveryTopics};
    ///
    /// let topics = DiscoveryTopics::default();
    /// assert_eq!(
    ///     topics.state(Component::BinarySensor, "ABC123", "communicating"),
    ///     "homeassistant/binary_sensor/modem_ABC123_communicating/state"
    /// );
    /// ```
    pub fn state(&self, component: Component, serial: &str, channel: &str) -> String {
        format!(
            "{}/{}/{}/state",
            self.prefix,
            component,
            self.object_id(serial, channel)
        )
    }

    /// State topic of the presence channel, used for availability gating.
    pub fn presence_state(&self, serial: &str) -> String {
        self.state(Component::BinarySensor, serial, PRESENCE_CHANNEL)
    }
}
