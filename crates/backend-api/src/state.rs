use std::sync::Arc;

use roster_database::SqliteMemberStore;
use roster_members::MemberService;

#[derive(Clone)]
pub struct AppState {
    members: Arc<MemberService<SqliteMemberStore>>,
}

impl AppState {
    pub fn new(members: Arc<MemberService<SqliteMemberStore>>) -> Self {
        Self { members }
    }

    pub fn members(&self) -> &MemberService<SqliteMemberStore> {
        &self.members
    }
}
