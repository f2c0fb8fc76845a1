pub const TOPIC_RELAY_STATE: &str = "gate/relay/state";
pub const TOPIC_DOOR_STATE: &str = "gate/door/state";
pub const TOPIC_DOOR_EVENT: &str = "gate/door/event";

pub const TOPIC_CMD_TRIGGER: &str = "gate/cmnd/trigger";
