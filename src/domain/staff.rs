use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaffMember {
    pub username: String,
    pub email: String,
    pub role: String,
}

impl StaffMember {
    /// The backend is inconsistent about role casing, so compare loosely.
    pub fn is_manager(&self) -> bool {
        self.role.eq_ignore_ascii_case("manager")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manager_check_ignores_case() {
        let m = StaffMember {
            username: "alice".into(),
            email: "alice@example.com".into(),
            role: "MANAGER".into(),
        };
        assert!(m.is_manager());

        let s = StaffMember {
            username: "bob".into(),
            email: "bob@example.com".into(),
            role: "Staff".into(),
        };
        assert!(!s.is_manager());
    }
}
