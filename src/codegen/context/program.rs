use crate::codegen::oslib::OsLibraryTracker;

/// Context information regarding the entire compilation, across classes
/// (which parts of the bundled OS library need to be emitted).
#[derive(Debug)]
pub struct Context {
    pub os_library: OsLibraryTracker,
}

impl Context {
    pub fn new() -> Self {
        Self {
            os_library: OsLibraryTracker::new(),
        }
    }
}
