use crate::use_cases::ArenaHandle;

pub struct AppState {
    // The one duel room this process hosts.
    pub arena: ArenaHandle,
}
