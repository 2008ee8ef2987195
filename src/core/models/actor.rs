/// Who performed an audited action.
///
/// `user_id` is absent for system-initiated events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActorContext {
    pub user_id: Option<String>,
    pub user_role: String,
    pub user_name: String,
    pub user_employee_number: Option<String>,
    /// Temporary or substitute staff, signed in without PIN verification.
    pub is_replacement: bool,
    pub session_id: Option<String>,
}

impl ActorContext {
    /// An actor with only a role and a display name.
    pub fn new(user_role: impl Into<String>, user_name: impl Into<String>) -> Self {
        Self {
            user_id: None,
            user_role: user_role.into(),
            user_name: user_name.into(),
            user_employee_number: None,
            is_replacement: false,
            session_id: None,
        }
    }

    /// The actor recorded for operations the tool performs on its own behalf.
    pub fn system() -> Self {
        Self::new("system", "system")
    }
}
