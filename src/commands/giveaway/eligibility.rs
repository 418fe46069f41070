use serenity::model::id::RoleId;

use crate::commands::giveaway::models::Participant;

// Answers role-membership questions during entry registration.
// Implementations must reflect the participant's roles at call time; the
// engine never caches the answer between calls, since membership can
// change between two registrations.
pub trait MembershipCheck: Send + Sync {
    fn has_any_role(&self, participant: &Participant, required: &[RoleId]) -> bool;
}

// A point-in-time snapshot of the roles held by the member invoking the
// command. The command layer rebuilds it on every call.
pub struct MemberRoleSet {
    roles: Vec<RoleId>,
}

impl MemberRoleSet {
    pub fn new(roles: Vec<RoleId>) -> Self {
        MemberRoleSet { roles }
    }
}

impl MembershipCheck for MemberRoleSet {
    fn has_any_role(&self, _participant: &Participant, required: &[RoleId]) -> bool {
        required.iter().any(|role_id| self.roles.contains(role_id))
    }
}
