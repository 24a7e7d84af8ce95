use std::fmt;

/// Container format of a release artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    TarGz,
    Zip,
}

impl ArchiveFormat {
    /// File extension used in release asset names, without the leading dot
    pub fn extension(&self) -> &'static str {
        match self {
            ArchiveFormat::TarGz => "tar.gz",
            ArchiveFormat::Zip => "zip",
        }
    }
}

impl fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Release targets the webb CLI is published for.
///
/// `GenericLinux` doubles as the fallback for every host the table does not
/// recognise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    X86_64AppleDarwin,
    Aarch64AppleDarwin,
    X86_64PcWindowsMsvc,
    GenericLinux,
}

impl Target {
    pub fn triple(&self) -> &'static str {
        match self {
            Target::X86_64AppleDarwin => "x86_64-apple-darwin",
            Target::Aarch64AppleDarwin => "aarch64-apple-darwin",
            Target::X86_64PcWindowsMsvc => "x86_64-pc-windows-msvc",
            Target::GenericLinux => "x86_64-unknown-linux-musl",
        }
    }

    pub fn archive_format(&self) -> ArchiveFormat {
        match self {
            Target::X86_64PcWindowsMsvc => ArchiveFormat::Zip,
            _ => ArchiveFormat::TarGz,
        }
    }

    /// Map an OS name and machine hardware string to a release target.
    ///
    /// Accepts both `uname -s`/`uname -m` spellings (`Darwin`, `arm64`,
    /// `Windows_NT`, `MINGW64_NT-10.0`) and `std::env::consts` spellings
    /// (`macos`, `aarch64`, `windows`).
    pub fn classify(os: &str, arch: &str) -> Target {
        let os = os.to_ascii_lowercase();
        let arch = arch.to_ascii_lowercase();

        if is_windows_os(&os) {
            return Target::X86_64PcWindowsMsvc;
        }

        match (os.as_str(), arch.as_str()) {
            ("darwin" | "macos", "x86_64") => Target::X86_64AppleDarwin,
            ("darwin" | "macos", "arm64" | "aarch64") => Target::Aarch64AppleDarwin,
            _ => Target::GenericLinux,
        }
    }
}

fn is_windows_os(os: &str) -> bool {
    os == "windows_nt"
        || os == "windows"
        || os.starts_with("mingw")
        || os.starts_with("msys")
        || os.starts_with("cygwin")
}

/// Resolved target triple and archive format for this run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Platform {
    pub target: String,
    pub format: ArchiveFormat,
}

impl Platform {
    /// Detect the platform of the running host
    pub fn detect() -> Self {
        Self::resolve(std::env::consts::OS, std::env::consts::ARCH)
    }

    /// Resolve a platform from host-reported OS and architecture.
    ///
    /// Never fails: unknown hosts get the generic Linux build and will most
    /// likely fail later at extraction or execution time.
    pub fn resolve(os: &str, arch: &str) -> Self {
        let target = Target::classify(os, arch);

        if target == Target::GenericLinux
            && !(os.eq_ignore_ascii_case("linux") && arch == "x86_64")
        {
            tracing::warn!(
                "Unrecognized platform {}/{}; assuming {}",
                os,
                arch,
                target.triple()
            );
        }

        Self {
            target: target.triple().to_string(),
            format: target.archive_format(),
        }
    }

    /// Build a platform from an explicit target triple
    pub fn from_triple(triple: &str) -> Self {
        let format = if triple.contains("windows") {
            ArchiveFormat::Zip
        } else {
            ArchiveFormat::TarGz
        };

        Self {
            target: triple.to_string(),
            format,
        }
    }

    pub fn is_windows(&self) -> bool {
        self.target.contains("windows")
    }

    /// File name of the installed executable
    pub fn binary_name(&self) -> String {
        if self.is_windows() {
            format!("{}.exe", crate::BINARY_NAME)
        } else {
            crate::BINARY_NAME.to_string()
        }
    }
}
