use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Target operating system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Os {
    /// Linux.
    Linux,
    /// macOS.
    Macos,
    /// Windows.
    Windows,
    /// FreeBSD.
    Freebsd,
}

impl fmt::Display for Os {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Linux => write!(f, "linux"),
            Self::Macos => write!(f, "macos"),
            Self::Windows => write!(f, "windows"),
            Self::Freebsd => write!(f, "freebsd"),
        }
    }
}

impl FromStr for Os {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "linux" => Ok(Self::Linux),
            "macos" | "darwin" => Ok(Self::Macos),
            "windows" | "win32" => Ok(Self::Windows),
            "freebsd" => Ok(Self::Freebsd),
            other => Err(format!("unknown operating system: {other}")),
        }
    }
}

/// Target CPU architecture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Arch {
    /// 64-bit x86.
    X86_64,
    /// 32-bit x86.
    X86,
    /// 64-bit ARM.
    Aarch64,
    /// 32-bit ARM.
    Arm,
    /// 64-bit RISC-V.
    Riscv64,
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::X86_64 => write!(f, "x86_64"),
            Self::X86 => write!(f, "x86"),
            Self::Aarch64 => write!(f, "aarch64"),
            Self::Arm => write!(f, "arm"),
            Self::Riscv64 => write!(f, "riscv64"),
        }
    }
}

impl FromStr for Arch {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "x86_64" | "amd64" => Ok(Self::X86_64),
            "x86" | "i686" | "i386" => Ok(Self::X86),
            "aarch64" | "arm64" => Ok(Self::Aarch64),
            "arm" | "armv7" => Ok(Self::Arm),
            "riscv64" => Ok(Self::Riscv64),
            other => Err(format!("unknown architecture: {other}")),
        }
    }
}

/// Target platform descriptor (operating system and CPU architecture).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Platform {
    /// Target operating system.
    pub os: Os,
    /// Target CPU architecture.
    pub arch: Arch,
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.arch, self.os)
    }
}

impl Platform {
    /// Detect the host platform.
    #[must_use]
    pub fn detect() -> Self {
        Self {
            os: Self::detect_os(),
            arch: Self::detect_arch(),
        }
    }

    /// Create a platform with explicit values.
    #[must_use]
    pub const fn new(os: Os, arch: Arch) -> Self {
        Self { os, arch }
    }

    /// Override the detected values with explicit target values.
    #[must_use]
    pub fn with_overrides(self, os: Option<Os>, arch: Option<Arch>) -> Self {
        Self {
            os: os.unwrap_or(self.os),
            arch: arch.unwrap_or(self.arch),
        }
    }

    /// Default header search directories for this platform.
    #[must_use]
    pub fn default_include_paths(&self) -> Vec<PathBuf> {
        match self.os {
            Os::Linux => vec![
                PathBuf::from("/usr/local/include"),
                PathBuf::from("/usr/include"),
                PathBuf::from(format!("/usr/include/{}", self.multiarch_triplet())),
            ],
            Os::Macos => vec![
                PathBuf::from("/usr/local/include"),
                PathBuf::from("/opt/homebrew/include"),
                PathBuf::from("/usr/include"),
            ],
            Os::Freebsd => vec![
                PathBuf::from("/usr/local/include"),
                PathBuf::from("/usr/include"),
            ],
            Os::Windows => Vec::new(),
        }
    }

    /// Default library search directories for this platform.
    #[must_use]
    pub fn default_library_paths(&self) -> Vec<PathBuf> {
        match self.os {
            Os::Linux => vec![
                PathBuf::from("/usr/local/lib"),
                PathBuf::from(format!("/usr/lib/{}", self.multiarch_triplet())),
                PathBuf::from("/usr/lib"),
                PathBuf::from("/lib"),
            ],
            Os::Macos => vec![
                PathBuf::from("/usr/local/lib"),
                PathBuf::from("/opt/homebrew/lib"),
                PathBuf::from("/usr/lib"),
            ],
            Os::Freebsd => vec![PathBuf::from("/usr/local/lib"), PathBuf::from("/usr/lib")],
            Os::Windows => Vec::new(),
        }
    }

    /// File names a library called `name` may have on this platform.
    #[must_use]
    pub fn library_file_names(&self, name: &str) -> Vec<String> {
        match self.os {
            Os::Linux | Os::Freebsd => vec![format!("lib{name}.so"), format!("lib{name}.a")],
            Os::Macos => vec![
                format!("lib{name}.dylib"),
                format!("lib{name}.tbd"),
                format!("lib{name}.a"),
            ],
            Os::Windows => vec![format!("{name}.lib"), format!("lib{name}.a")],
        }
    }

    /// C compiler names to try, most preferred first.
    #[must_use]
    pub const fn c_compiler_candidates(&self) -> &'static [&'static str] {
        match self.os {
            Os::Linux => &["gcc", "clang", "cc"],
            Os::Macos | Os::Freebsd => &["clang", "cc", "gcc"],
            Os::Windows => &["cl", "clang", "gcc"],
        }
    }

    /// C++ compiler names to try, most preferred first.
    #[must_use]
    pub const fn cxx_compiler_candidates(&self) -> &'static [&'static str] {
        match self.os {
            Os::Linux => &["g++", "clang++", "c++"],
            Os::Macos | Os::Freebsd => &["clang++", "c++", "g++"],
            Os::Windows => &["cl", "clang++", "g++"],
        }
    }

    fn multiarch_triplet(&self) -> String {
        match self.arch {
            Arch::Arm => "arm-linux-gnueabihf".to_string(),
            Arch::X86 => "i386-linux-gnu".to_string(),
            arch => format!("{arch}-linux-gnu"),
        }
    }

    fn detect_os() -> Os {
        if cfg!(target_os = "windows") {
            Os::Windows
        } else if cfg!(target_os = "macos") {
            Os::Macos
        } else if cfg!(target_os = "freebsd") {
            Os::Freebsd
        } else {
            // Default to Linux for other Unix-like systems
            Os::Linux
        }
    }

    fn detect_arch() -> Arch {
        if cfg!(target_arch = "aarch64") {
            Arch::Aarch64
        } else if cfg!(target_arch = "x86") {
            Arch::X86
        } else if cfg!(target_arch = "arm") {
            Arch::Arm
        } else if cfg!(target_arch = "riscv64") {
            Arch::Riscv64
        } else {
            Arch::X86_64
        }
    }
}
