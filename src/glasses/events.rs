use serde::{Deserialize, Serialize};

/// Posted by the glasses cloud when a wearer opens the app
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStartEvent {
    pub user_id: String,
    pub session_id: String,
}

/// Posted when the wearer's session ends
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStopEvent {
    pub user_id: String,
    #[serde(default)]
    pub reason: Option<String>,
}

/// Posted for every hardware button press
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ButtonPressEvent {
    pub user_id: String,
    #[serde(default)]
    pub button_id: String,
    /// `long` or `short` (anything else is treated as short)
    pub press_type: String,
}
