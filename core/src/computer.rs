//! Direct download from dive computers.
//!
//! The native backend is libdivecomputer. Until its bindings land the
//! importer only reports whether the library could be located and never
//! returns dives; [`MockDiveComputerImporter`] stands in for host-side tests.

use std::env::consts::{ARCH, OS};
use std::path::{Path, PathBuf};

use crate::error::ImportResult;
use crate::models::Dive;

/// Link name of the native library, without platform prefix or suffix.
pub const NATIVE_LIBRARY: &str = "divecomputer";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DiveComputerModel {
    pub manufacturer: String,
    pub model: String,
    pub protocol: Option<String>,
}

impl DiveComputerModel {
    pub fn new(manufacturer: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            manufacturer: manufacturer.into(),
            model: model.into(),
            protocol: None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImportScope {
    AllDives,
    NewOnly,
    NotYetImported,
}

pub trait DiveComputerImporter {
    fn import(&mut self, computer: &DiveComputerModel, scope: ImportScope)
        -> ImportResult<Vec<Dive>>;
}

pub trait NativeInterop {
    fn is_supported(&self) -> bool;
}

/// Used when no native library is configured.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopInterop;

impl NativeInterop for NoopInterop {
    fn is_supported(&self) -> bool {
        false
    }
}

/// Looks for the platform build of libdivecomputer under
/// `<base>/runtimes/<rid>/native/`.
#[derive(Clone, Debug)]
pub struct BundledLibrary {
    base_dir: PathBuf,
}

impl BundledLibrary {
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    pub fn candidate(&self) -> PathBuf {
        self.base_dir
            .join("runtimes")
            .join(runtime_id(OS, ARCH))
            .join("native")
            .join(library_file_name(OS))
    }
}

impl NativeInterop for BundledLibrary {
    fn is_supported(&self) -> bool {
        self.candidate().is_file()
    }
}

pub fn library_file_name(os: &str) -> String {
    match os {
        "windows" => format!("lib{NATIVE_LIBRARY}.dll"),
        "macos" => format!("lib{NATIVE_LIBRARY}.dylib"),
        _ => format!("lib{NATIVE_LIBRARY}.so"),
    }
}

/// Runtime identifier in the `<os>-<arch>` form used by bundled native assets.
pub fn runtime_id(os: &str, arch: &str) -> String {
    let os = match os {
        "macos" => "osx",
        "windows" => "win",
        "linux" => "linux",
        _ => return "unknown".to_string(),
    };
    let arch = if arch == "aarch64" { "arm64" } else { "x64" };
    format!("{os}-{arch}")
}

pub struct LibDiveComputerImporter {
    interop: Box<dyn NativeInterop>,
}

impl LibDiveComputerImporter {
    pub fn new(interop: Box<dyn NativeInterop>) -> Self {
        Self { interop }
    }
}

impl Default for LibDiveComputerImporter {
    fn default() -> Self {
        Self::new(Box::new(NoopInterop))
    }
}

impl DiveComputerImporter for LibDiveComputerImporter {
    fn import(
        &mut self,
        computer: &DiveComputerModel,
        scope: ImportScope,
    ) -> ImportResult<Vec<Dive>> {
        if !self.interop.is_supported() {
            tracing::info!(
                manufacturer = %computer.manufacturer,
                model = %computer.model,
                "libdivecomputer not available"
            );
            return Ok(Vec::new());
        }
        // TODO: open the device through libdivecomputer and parse its dives
        // once the FFI bindings exist.
        tracing::debug!(?scope, model = %computer.model, "native download not wired yet");
        Ok(Vec::new())
    }
}

#[derive(Clone, Debug, Default)]
pub struct MockDiveComputerImporter {
    pub dives: Vec<Dive>,
    pub requests: Vec<(DiveComputerModel, ImportScope)>,
}

impl MockDiveComputerImporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mock preloaded with the demo dives.
    pub fn with_sample_data() -> Self {
        Self {
            dives: crate::orchestrator::demo_dives().dives,
            requests: Vec::new(),
        }
    }
}

impl DiveComputerImporter for MockDiveComputerImporter {
    fn import(
        &mut self,
        computer: &DiveComputerModel,
        scope: ImportScope,
    ) -> ImportResult<Vec<Dive>> {
        self.requests.push((computer.clone(), scope));
        Ok(self.dives.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct AlwaysSupported;

    impl NativeInterop for AlwaysSupported {
        fn is_supported(&self) -> bool {
            true
        }
    }

    #[test]
    fn test_native_importer_returns_nothing_yet() {
        let perdix = DiveComputerModel::new("Shearwater", "Perdix AI");
        let mut importer = LibDiveComputerImporter::default();
        assert!(importer.import(&perdix, ImportScope::AllDives).unwrap().is_empty());

        let mut importer = LibDiveComputerImporter::new(Box::new(AlwaysSupported));
        assert!(importer.import(&perdix, ImportScope::NewOnly).unwrap().is_empty());
    }

    #[test]
    fn test_mock_records_requests() {
        let mut mock = MockDiveComputerImporter::with_sample_data();
        let teric = DiveComputerModel {
            protocol: Some("BLE".to_string()),
            ..DiveComputerModel::new("Shearwater", "Teric")
        };
        let dives = mock.import(&teric, ImportScope::NotYetImported).unwrap();
        assert_eq!(dives.len(), 2);
        assert_eq!(mock.requests, vec![(teric, ImportScope::NotYetImported)]);
    }

    #[test]
    fn test_runtime_layout() {
        assert_eq!(runtime_id("macos", "aarch64"), "osx-arm64");
        assert_eq!(runtime_id("linux", "x86_64"), "linux-x64");
        assert_eq!(runtime_id("windows", "x86_64"), "win-x64");
        assert_eq!(runtime_id("freebsd", "x86_64"), "unknown");
        assert_eq!(library_file_name("windows"), "libdivecomputer.dll");
        assert_eq!(library_file_name("macos"), "libdivecomputer.dylib");
        assert_eq!(library_file_name("linux"), "libdivecomputer.so");
    }

    #[test]
    fn test_bundled_library_probe() {
        let dir = tempfile::tempdir().unwrap();
        let bundled = BundledLibrary::new(dir.path());
        assert!(!bundled.is_supported());

        let candidate = bundled.candidate();
        std::fs::create_dir_all(candidate.parent().unwrap()).unwrap();
        std::fs::write(&candidate, b"").unwrap();
        assert!(bundled.is_supported());
    }
}
