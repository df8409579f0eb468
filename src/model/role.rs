use std::str::FromStr;
use strum::{Display, EnumString};

#[derive(Debug, Copy, Clone, Eq, PartialEq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    Admin,
    Manager,
    Employee,
}

impl Role {
    pub fn parse(value: &str) -> Option<Self> {
        Role::from_str(value).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_roles() {
        assert_eq!(Role::parse("admin"), Some(Role::Admin));
        assert_eq!(Role::parse("manager"), Some(Role::Manager));
        assert_eq!(Role::parse("employee"), Some(Role::Employee));
        assert_eq!(Role::parse("superuser"), None);
    }

    #[test]
    fn displays_as_lowercase() {
        assert_eq!(Role::Manager.to_string(), "manager");
    }
}
