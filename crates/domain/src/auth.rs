use crate::errors::CoreError;
use crate::models::{Actor, Role};

// 角色判定只存在于这里，其他代码一律走这两个门
pub fn assert_moderator(actor: &Actor) -> Result<(), CoreError> {
    if actor.role >= Role::Moderator {
        Ok(())
    } else {
        Err(CoreError::permission(format!(
            "actor {} is not a moderator",
            actor.id
        )))
    }
}

pub fn assert_admin(actor: &Actor) -> Result<(), CoreError> {
    if actor.role == Role::Admin {
        Ok(())
    } else {
        Err(CoreError::permission(format!(
            "actor {} is not an admin",
            actor.id
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actor(role: Role) -> Actor {
        Actor {
            id: "u1".into(),
            role,
        }
    }

    #[test]
    fn moderator_gate() {
        assert!(assert_moderator(&actor(Role::User)).is_err());
        assert!(assert_moderator(&actor(Role::Moderator)).is_ok());
        assert!(assert_moderator(&actor(Role::Admin)).is_ok());
    }

    #[test]
    fn admin_gate() {
        assert!(assert_admin(&actor(Role::Moderator)).is_err());
        assert!(assert_admin(&actor(Role::Admin)).is_ok());
    }
}
