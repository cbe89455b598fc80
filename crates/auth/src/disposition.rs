use serde::{Deserialize, Serialize};

/// Route the UI returns to when the session is no longer valid.
pub const LOGIN_ROUTE: &str = "/login";

/// What the client must do about a failed backend call.
///
/// Errors are classified by HTTP status only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ErrorDisposition {
    /// 401: drop the session and go back to the login screen.
    Logout { redirect_to: String },
    /// 403: keep the session, tell the user the action is not allowed.
    PermissionDenied,
    /// Anything else: show the message (toast/dialog) and carry on.
    Surface,
}

impl ErrorDisposition {
    pub fn forces_logout(&self) -> bool {
        matches!(self, ErrorDisposition::Logout { .. })
    }
}

pub fn classify_status(status: u16) -> ErrorDisposition {
    match status {
        401 => ErrorDisposition::Logout {
            redirect_to: LOGIN_ROUTE.to_string(),
        },
        403 => ErrorDisposition::PermissionDenied,
        _ => ErrorDisposition::Surface,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_401_logs_out() {
        assert!(classify_status(401).forces_logout());
        assert_eq!(classify_status(403), ErrorDisposition::PermissionDenied);
        assert_eq!(classify_status(404), ErrorDisposition::Surface);
        assert_eq!(classify_status(500), ErrorDisposition::Surface);
    }

    #[test]
    fn logout_redirects_to_login() {
        assert_eq!(
            classify_status(401),
            ErrorDisposition::Logout {
                redirect_to: "/login".into()
            }
        );
    }
}
