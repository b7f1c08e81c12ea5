use std::collections::HashMap;

use phf::phf_map;

use crate::fileio::output::OutputFile;

// region: bundled assets

/// Prebuilt VM payloads for the OS classes, bundled into the binary.
static OS_ASSETS: phf::Map<&'static str, &'static str> = phf_map! {
    "Array" => include_str!("../../resources/os/Array.vm"),
    "Keyboard" => include_str!("../../resources/os/Keyboard.vm"),
    "Math" => include_str!("../../resources/os/Math.vm"),
    "Memory" => include_str!("../../resources/os/Memory.vm"),
    "Output" => include_str!("../../resources/os/Output.vm"),
    "Screen" => include_str!("../../resources/os/Screen.vm"),
    "String" => include_str!("../../resources/os/String.vm"),
    "Sys" => include_str!("../../resources/os/Sys.vm"),
};

// endregion

// region: usage tracker

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum OsUsageNoteOutcome {
    NotPartOfOsLibrary,
    OsClassUsageNoted,
}

/// Track which OS classes the compiled program actually calls into,
/// so only their payloads are copied to the output directory.
#[derive(Debug)]
pub struct OsLibraryTracker(HashMap<&'static str, bool>);

impl OsLibraryTracker {
    pub fn new() -> Self {
        Self(OS_ASSETS.keys().map(|&class_name| (class_name, false)).collect())
    }

    /// Note a call-through to a static receiver. Receivers that are not
    /// OS classes (i.e. other user classes) are reported and ignored.
    pub fn note_usage(&mut self, class_name: &str) -> OsUsageNoteOutcome {
        let Some(used) = self.0.get_mut(class_name) else {
            return OsUsageNoteOutcome::NotPartOfOsLibrary;
        };

        *used = true;

        OsUsageNoteOutcome::OsClassUsageNoted
    }

    /// Produce one output file per used OS class,
    /// in stable (alphabetical) order.
    pub fn collect(&self) -> Vec<OutputFile> {
        let mut used: Vec<_> = self
            .0
            .iter()
            .filter_map(|(&class_name, &used)| used.then_some(class_name))
            .collect();
        used.sort_unstable();

        used.into_iter()
            .map(|class_name| {
                let payload = OS_ASSETS
                    .get(class_name)
                    .expect("tracker keys are seeded from the asset map");

                OutputFile::new(class_name.to_string(), (*payload).to_string())
            })
            .collect()
    }
}

// endregion
